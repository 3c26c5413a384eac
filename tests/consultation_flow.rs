//! End-to-end consultation flows through the dialogue engine.
//!
//! Uses the mock oracle and in-memory collaborators; one test swaps in the
//! file-backed session store to check that a consultation resumes after a
//! restart.

use std::sync::Arc;
use std::time::{Duration, Instant};

use symptom_intake::adapters::{
    FileSessionStore, InMemoryConsultationRecorder, InMemoryProfileProvider, InMemorySessionStore,
    MockAIProvider, MockError,
};
use symptom_intake::application::advisory::{AdvisoryGateway, AdvisorySettings};
use symptom_intake::application::dialogue::{
    DialogueEngine, EngineSettings, InputRejection, Reply,
};
use symptom_intake::domain::consultation::{
    ChoiceToken, ConsultationRecord, ConsultationStage, MediaKind, PatientProfile,
    SpecialistRoster, SymptomDuration, SymptomNormalizer, Urgency, UserEvent,
    DEFAULT_FALLBACK_SPECIALIST,
};
use symptom_intake::domain::foundation::UserId;
use symptom_intake::ports::SessionStore;

// =============================================================================
// Test Infrastructure
// =============================================================================

const SUGGESTIONS: &str = r#"{"symptoms": ["dizziness", "light sensitivity"]}"#;
const NEUROLOGIST: &str =
    r#"{"specialist": "Neurologist", "urgency": "medium", "reasoning": "Headache with nausea."}"#;

struct Harness {
    engine: Arc<DialogueEngine>,
    recorder: InMemoryConsultationRecorder,
    user: UserId,
}

struct HarnessBuilder {
    provider: MockAIProvider,
    advisory: AdvisorySettings,
    store: Arc<dyn SessionStore>,
}

impl HarnessBuilder {
    fn new(provider: MockAIProvider) -> Self {
        Self {
            provider,
            advisory: AdvisorySettings::default(),
            store: Arc::new(InMemorySessionStore::new()),
        }
    }

    fn timeout(mut self, timeout: Duration) -> Self {
        self.advisory.timeout = timeout;
        self
    }

    fn store(mut self, store: Arc<dyn SessionStore>) -> Self {
        self.store = store;
        self
    }

    async fn build(self) -> Harness {
        let user = UserId::new("patient-1").unwrap();
        let profiles = InMemoryProfileProvider::new();
        for id in ["patient-1", "patient-2"] {
            let profile = PatientProfile::new().with_age(34).unwrap();
            profiles.insert(UserId::new(id).unwrap(), profile).await;
        }
        let recorder = InMemoryConsultationRecorder::new();
        let gateway = AdvisoryGateway::new(
            Arc::new(self.provider),
            SymptomNormalizer::default(),
            SpecialistRoster::standard(),
            self.advisory,
        );
        let engine = DialogueEngine::new(
            gateway,
            self.store,
            Arc::new(profiles),
            Arc::new(recorder.clone()),
            EngineSettings::default(),
        );
        Harness {
            engine: Arc::new(engine),
            recorder,
            user,
        }
    }
}

impl Harness {
    async fn send(&self, event: UserEvent) -> Reply {
        self.engine.handle(&self.user, event).await.unwrap()
    }

    async fn choose(&self, token: ChoiceToken) -> Reply {
        self.send(UserEvent::choice(token)).await
    }

    async fn stage(&self) -> Option<ConsultationStage> {
        self.engine
            .session(&self.user)
            .await
            .unwrap()
            .map(|s| s.stage())
    }

    /// Start, describe, confirm: leaves the session at duration selection.
    async fn reach_duration(&self, symptoms: &str) {
        self.choose(ChoiceToken::StartConsultation).await;
        self.send(UserEvent::text(symptoms)).await;
        self.choose(ChoiceToken::Confirm).await;
        assert_eq!(self.stage().await, Some(ConsultationStage::SelectingDuration));
    }
}

fn completed(reply: Reply) -> ConsultationRecord {
    match reply {
        Reply::Completed { record, .. } => record,
        other => panic!("expected a completed consultation, got {:?}", other),
    }
}

// =============================================================================
// Fixed workflow
// =============================================================================

#[tokio::test]
async fn selected_suggestion_ends_up_in_the_record() {
    let provider = MockAIProvider::new()
        .with_response(SUGGESTIONS)
        .with_response(NEUROLOGIST);
    let h = HarnessBuilder::new(provider).build().await;

    h.reach_duration("headache, nausea").await;
    h.choose(ChoiceToken::Duration(SymptomDuration::OneToThreeDays)).await;
    assert_eq!(
        h.stage().await,
        Some(ConsultationStage::SelectingAdditionalSymptoms)
    );
    h.choose(ChoiceToken::ToggleSuggestion(0)).await;
    let final_prompt = h.choose(ChoiceToken::Done).await;
    assert!(final_prompt
        .prompt()
        .unwrap()
        .text
        .contains("Additional symptoms: dizziness"));

    let record = completed(h.choose(ChoiceToken::Confirm).await);

    assert_eq!(record.symptoms, ["headache", "nausea", "dizziness"]);
    assert_eq!(record.duration_label(), Some("1-3 days"));
    assert_eq!(record.recommendation.specialist.as_str(), "Neurologist");
    assert_eq!(h.recorder.records_for(&h.user).await, vec![record]);
    assert_eq!(h.stage().await, None);
}

#[tokio::test]
async fn empty_suggestions_skip_additional_selection() {
    let provider = MockAIProvider::new().with_response(r#"{"symptoms": []}"#);
    let h = HarnessBuilder::new(provider).build().await;
    h.reach_duration("sore throat").await;

    let reply = h
        .choose(ChoiceToken::Duration(SymptomDuration::LessThanDay))
        .await;

    assert_eq!(h.stage().await, Some(ConsultationStage::FinalConfirmation));
    assert!(reply.prompt().unwrap().offers(&ChoiceToken::AddMore));
}

#[tokio::test]
async fn add_more_without_suggestions_allows_custom_entry() {
    let provider = MockAIProvider::new()
        .with_response(r#"{"symptoms": []}"#)
        .with_response(r#"{"is_valid": true, "cleaned_text": "hoarse voice"}"#);
    let h = HarnessBuilder::new(provider).build().await;
    h.reach_duration("sore throat").await;
    h.choose(ChoiceToken::Duration(SymptomDuration::LessThanDay))
        .await;

    let reply = h.choose(ChoiceToken::AddMore).await;
    assert_eq!(
        h.stage().await,
        Some(ConsultationStage::SelectingAdditionalSymptoms)
    );
    assert!(reply.prompt().unwrap().offers(&ChoiceToken::Other));

    h.choose(ChoiceToken::Other).await;
    h.send(UserEvent::text("hoarse voice")).await;
    h.choose(ChoiceToken::Done).await;

    let session = h.engine.session(&h.user).await.unwrap().unwrap();
    assert_eq!(session.stage(), ConsultationStage::FinalConfirmation);
    assert_eq!(session.selected_symptoms(), ["hoarse voice"]);
}

#[tokio::test]
async fn suggestion_failure_degrades_to_final_confirmation() {
    let provider = MockAIProvider::new().with_error(MockError::Unavailable {
        message: "overloaded".to_string(),
    });
    let h = HarnessBuilder::new(provider).build().await;
    h.reach_duration("back pain").await;

    h.choose(ChoiceToken::Duration(SymptomDuration::MoreThanWeek))
        .await;

    assert_eq!(h.stage().await, Some(ConsultationStage::FinalConfirmation));
}

#[tokio::test]
async fn recommendation_timeout_falls_back_within_budget() {
    let provider = MockAIProvider::new()
        .with_response(r#"{"symptoms": []}"#)
        .with_response(NEUROLOGIST)
        .with_delay(Duration::from_millis(200));
    let h = HarnessBuilder::new(provider)
        .timeout(Duration::from_millis(50))
        .build()
        .await;
    h.reach_duration("headache").await;
    h.choose(ChoiceToken::Duration(SymptomDuration::OneToThreeDays))
        .await;

    let started = Instant::now();
    let record = completed(h.choose(ChoiceToken::Confirm).await);

    assert!(started.elapsed() < Duration::from_millis(180));
    assert!(record.recommendation.is_fallback);
    assert_eq!(
        record.recommendation.specialist.as_str(),
        DEFAULT_FALLBACK_SPECIALIST
    );
    assert_eq!(record.recommendation.urgency, Urgency::Medium);
}

#[tokio::test]
async fn unknown_specialist_is_coerced_before_persisting() {
    let provider = MockAIProvider::new().with_response(r#"{"symptoms": []}"#).with_response(
        r#"{"specialist": "Astrologer", "urgency": "low", "reasoning": "The stars."}"#,
    );
    let h = HarnessBuilder::new(provider).build().await;
    h.reach_duration("insomnia").await;
    h.choose(ChoiceToken::Duration(SymptomDuration::ThreeToSevenDays))
        .await;

    let record = completed(h.choose(ChoiceToken::Confirm).await);

    let persisted = h.recorder.records().await;
    assert_eq!(persisted.len(), 1);
    assert_eq!(
        persisted[0].recommendation.specialist.as_str(),
        DEFAULT_FALLBACK_SPECIALIST
    );
    assert_eq!(record.recommendation.urgency, Urgency::Low);
}

#[tokio::test]
async fn voice_message_leaves_collection_untouched() {
    let h = HarnessBuilder::new(MockAIProvider::new()).build().await;
    h.choose(ChoiceToken::StartConsultation).await;

    let reply = h.send(UserEvent::MediaInput(MediaKind::Voice)).await;

    assert!(matches!(
        reply,
        Reply::Rejected {
            rejection: InputRejection::UnsupportedInput(MediaKind::Voice),
            ..
        }
    ));
    let session = h.engine.session(&h.user).await.unwrap().unwrap();
    assert_eq!(session.stage(), ConsultationStage::CollectingSymptoms);
    assert!(session.primary_symptoms().is_empty());
}

#[tokio::test]
async fn cancel_then_start_begins_a_fresh_consultation() {
    let h = HarnessBuilder::new(MockAIProvider::new().with_response(SUGGESTIONS))
        .build()
        .await;
    h.reach_duration("headache").await;
    h.choose(ChoiceToken::Duration(SymptomDuration::OneToThreeDays))
        .await;
    h.choose(ChoiceToken::ToggleSuggestion(1)).await;
    let cancelled_id = h.engine.session(&h.user).await.unwrap().unwrap().id();

    let reply = h.choose(ChoiceToken::Cancel).await;
    assert!(matches!(reply, Reply::Cancelled(_)));
    assert_eq!(h.stage().await, None);

    h.choose(ChoiceToken::StartConsultation).await;
    let fresh = h.engine.session(&h.user).await.unwrap().unwrap();
    assert_ne!(fresh.id(), cancelled_id);
    assert_eq!(fresh.stage(), ConsultationStage::CollectingSymptoms);
    assert!(fresh.primary_symptoms().is_empty());
    assert!(fresh.selected_symptoms().is_empty());
}

#[tokio::test]
async fn duration_change_regenerates_suggestions_and_keeps_custom_entries() {
    let provider = MockAIProvider::new()
        .with_response(SUGGESTIONS)
        .with_response(r#"{"is_valid": true, "cleaned_text": "ringing ears"}"#)
        .with_response(r#"{"symptoms": ["neck stiffness"]}"#);
    let h = HarnessBuilder::new(provider).build().await;
    h.reach_duration("headache").await;
    h.choose(ChoiceToken::Duration(SymptomDuration::OneToThreeDays))
        .await;
    h.choose(ChoiceToken::ToggleSuggestion(0)).await;
    h.choose(ChoiceToken::Other).await;
    h.send(UserEvent::text("ringing ears")).await;
    h.choose(ChoiceToken::Done).await;

    h.choose(ChoiceToken::Back).await;
    h.choose(ChoiceToken::Duration(SymptomDuration::MoreThanWeek))
        .await;

    let session = h.engine.session(&h.user).await.unwrap().unwrap();
    assert_eq!(session.duration(), Some(SymptomDuration::MoreThanWeek));
    assert_eq!(session.suggested_symptoms(), ["neck stiffness"]);
    assert_eq!(session.selected_symptoms(), ["ringing ears"]);
}

#[tokio::test]
async fn duration_change_keeps_selection_that_is_offered_again() {
    let provider = MockAIProvider::new()
        .with_response(SUGGESTIONS)
        .with_response(r#"{"symptoms": ["dizziness", "neck stiffness"]}"#);
    let h = HarnessBuilder::new(provider).build().await;
    h.reach_duration("headache").await;
    h.choose(ChoiceToken::Duration(SymptomDuration::OneToThreeDays))
        .await;
    h.choose(ChoiceToken::ToggleSuggestion(0)).await;

    h.choose(ChoiceToken::Back).await;
    h.choose(ChoiceToken::Duration(SymptomDuration::MoreThanWeek))
        .await;

    let session = h.engine.session(&h.user).await.unwrap().unwrap();
    assert_eq!(session.suggested_symptoms(), ["dizziness", "neck stiffness"]);
    assert_eq!(session.selected_symptoms(), ["dizziness"]);
    assert!(session.is_suggestion_selected(0));
}

#[tokio::test]
async fn recorder_failure_does_not_block_the_answer() {
    let provider = MockAIProvider::new()
        .with_response(r#"{"symptoms": []}"#)
        .with_response(NEUROLOGIST);
    let h = HarnessBuilder::new(provider).build().await;
    h.recorder.set_failing(true);
    h.reach_duration("headache").await;
    h.choose(ChoiceToken::Duration(SymptomDuration::LessThanDay))
        .await;

    let reply = h.choose(ChoiceToken::Confirm).await;

    assert!(reply.is_completed());
    assert!(h.recorder.records().await.is_empty());
    assert_eq!(h.stage().await, None);
}

// =============================================================================
// Concurrency
// =============================================================================

#[tokio::test]
async fn cancel_discards_in_flight_recommendation() {
    let provider = MockAIProvider::new()
        .with_response(r#"{"symptoms": []}"#)
        .with_response(NEUROLOGIST)
        .with_delay(Duration::from_millis(100));
    let h = HarnessBuilder::new(provider).build().await;
    h.reach_duration("chest pain").await;
    h.choose(ChoiceToken::Duration(SymptomDuration::LessThanDay))
        .await;

    let in_flight = {
        let engine = h.engine.clone();
        let user = h.user.clone();
        tokio::spawn(async move {
            engine
                .handle(&user, UserEvent::choice(ChoiceToken::Confirm))
                .await
        })
    };
    tokio::time::sleep(Duration::from_millis(30)).await;
    let cancelled = h.choose(ChoiceToken::Cancel).await;

    assert!(matches!(cancelled, Reply::Cancelled(_)));
    assert_eq!(in_flight.await.unwrap().unwrap(), Reply::Superseded);
    assert!(h.recorder.records().await.is_empty());
    assert_eq!(h.stage().await, None);
}

#[tokio::test]
async fn cancel_discards_in_flight_suggestions() {
    let provider = MockAIProvider::new()
        .with_response(SUGGESTIONS)
        .with_delay(Duration::from_millis(100));
    let h = HarnessBuilder::new(provider).build().await;
    h.reach_duration("fever").await;

    let in_flight = {
        let engine = h.engine.clone();
        let user = h.user.clone();
        tokio::spawn(async move {
            let token = ChoiceToken::Duration(SymptomDuration::OneToThreeDays);
            engine.handle(&user, UserEvent::choice(token)).await
        })
    };
    tokio::time::sleep(Duration::from_millis(30)).await;
    h.choose(ChoiceToken::Cancel).await;

    assert_eq!(in_flight.await.unwrap().unwrap(), Reply::Superseded);
    assert_eq!(h.stage().await, None);
}

#[tokio::test]
async fn different_users_progress_independently() {
    let provider = MockAIProvider::new()
        .with_response(r#"{"symptoms": []}"#)
        .with_response(r#"{"symptoms": []}"#);
    let h = HarnessBuilder::new(provider).build().await;
    let other = UserId::new("patient-2").unwrap();

    let run = |user: UserId, text: &'static str| {
        let engine = h.engine.clone();
        tokio::spawn(async move {
            engine
                .handle(&user, UserEvent::choice(ChoiceToken::StartConsultation))
                .await?;
            engine.handle(&user, UserEvent::text(text)).await?;
            engine
                .handle(&user, UserEvent::choice(ChoiceToken::Confirm))
                .await?;
            engine
                .handle(
                    &user,
                    UserEvent::choice(ChoiceToken::Duration(SymptomDuration::LessThanDay)),
                )
                .await
        })
    };

    let (a, b) = tokio::join!(run(h.user.clone(), "headache"), run(other.clone(), "cough"));
    a.unwrap().unwrap();
    b.unwrap().unwrap();

    let first = h.engine.session(&h.user).await.unwrap().unwrap();
    let second = h.engine.session(&other).await.unwrap().unwrap();
    assert_eq!(first.primary_symptoms(), ["headache"]);
    assert_eq!(second.primary_symptoms(), ["cough"]);
    assert_eq!(first.stage(), ConsultationStage::FinalConfirmation);
    assert_eq!(second.stage(), ConsultationStage::FinalConfirmation);
}

// =============================================================================
// Persistence
// =============================================================================

#[tokio::test]
async fn file_store_resumes_after_restart() {
    let dir = tempfile::tempdir().unwrap();

    let first = HarnessBuilder::new(MockAIProvider::new().with_response(SUGGESTIONS))
        .store(Arc::new(FileSessionStore::new(dir.path())))
        .build()
        .await;
    first.reach_duration("headache, nausea").await;
    first
        .choose(ChoiceToken::Duration(SymptomDuration::OneToThreeDays))
        .await;
    first.choose(ChoiceToken::ToggleSuggestion(0)).await;
    drop(first);

    let second = HarnessBuilder::new(MockAIProvider::new().with_response(NEUROLOGIST))
        .store(Arc::new(FileSessionStore::new(dir.path())))
        .build()
        .await;
    let prompt = second.engine.current_prompt(&second.user).await.unwrap();
    assert!(prompt.choices.iter().any(|c| c.label == "[x] dizziness"));

    second.choose(ChoiceToken::Done).await;
    let record = completed(second.choose(ChoiceToken::Confirm).await);
    assert_eq!(record.symptoms, ["headache", "nausea", "dizziness"]);
}
