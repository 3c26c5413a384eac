//! DialogueEngine - drives one consultation per user through its stages.
//!
//! Every event for a user runs under that user's turn lock. Cancellation is
//! the exception: it clears the session without waiting, and a turn still
//! waiting on the oracle finds its consultation gone when it writes back.

use std::sync::Arc;

use tracing::{debug, info, warn};

use super::reply::{InputRejection, Reply};
use super::user_locks::UserLocks;
use crate::application::advisory::AdvisoryGateway;
use crate::domain::consultation::prompt::{
    cancelled_prompt, idle_prompt, recommendation_prompt, registration_required_prompt,
    stage_prompt,
};
use crate::domain::consultation::{
    ChoiceToken, ConsultationRecord, ConsultationSession, ConsultationStage, Prompt,
    Recommendation, UserEvent, WorkflowMode,
};
use crate::domain::foundation::{Timestamp, UserId, ValidationError};
use crate::ports::{
    ConsultationRecorder, ProfileError, ProfileProvider, SessionStore, SessionStoreError,
};

/// Engine behaviour knobs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineSettings {
    /// Workflow for newly started consultations.
    pub workflow: WorkflowMode,
    /// Adaptive workflow: answered questions after which a recommendation
    /// is forced.
    pub max_clarifying_rounds: usize,
    pub idle_timeout_secs: u64,
    /// Run primary symptom text through the oracle's validation.
    pub validate_primary_symptoms: bool,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            workflow: WorkflowMode::Fixed,
            max_clarifying_rounds: 3,
            idle_timeout_secs: 1800,
            validate_primary_symptoms: false,
        }
    }
}

/// Failures the engine cannot turn into a prompt.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("session store error: {0}")]
    Store(#[from] SessionStoreError),

    #[error("profile lookup failed: {0}")]
    Profile(#[from] ProfileError),

    #[error("invalid stage transition: {0}")]
    Transition(#[from] ValidationError),
}

/// Outcome of applying one event to a loaded session.
pub(super) enum Step {
    /// Not valid in this stage; nothing changed.
    Ignore,
    /// Input refused; nothing changed.
    Reject(InputRejection),
    /// Session changed and must be written back.
    Save,
    /// Consultation finished.
    Complete(Recommendation),
    /// The session was cancelled or replaced mid-turn.
    Superseded,
}

pub struct DialogueEngine {
    pub(super) gateway: AdvisoryGateway,
    sessions: Arc<dyn SessionStore>,
    profiles: Arc<dyn ProfileProvider>,
    recorder: Arc<dyn ConsultationRecorder>,
    locks: UserLocks,
    pub(super) settings: EngineSettings,
}

impl DialogueEngine {
    pub fn new(
        gateway: AdvisoryGateway,
        sessions: Arc<dyn SessionStore>,
        profiles: Arc<dyn ProfileProvider>,
        recorder: Arc<dyn ConsultationRecorder>,
        settings: EngineSettings,
    ) -> Self {
        Self {
            gateway,
            sessions,
            profiles,
            recorder,
            locks: UserLocks::new(),
            settings,
        }
    }

    pub fn settings(&self) -> &EngineSettings {
        &self.settings
    }

    /// Handles one event from `user_id`.
    pub async fn handle(&self, user_id: &UserId, event: UserEvent) -> Result<Reply, EngineError> {
        if matches!(event, UserEvent::ButtonChoice(ChoiceToken::Cancel)) {
            return self.cancel(user_id).await;
        }

        let _turn = self.locks.acquire(user_id).await;
        debug!(user_id = %user_id, event = event.kind(), "Handling event");
        self.handle_locked(user_id, event).await
    }

    /// Destroys the user's consultation, whatever stage it is in.
    pub async fn cancel(&self, user_id: &UserId) -> Result<Reply, EngineError> {
        self.sessions.clear(user_id).await?;
        info!(user_id = %user_id, "Consultation cancelled");
        Ok(Reply::Cancelled(cancelled_prompt()))
    }

    /// The user's live session, as stored.
    pub async fn session(
        &self,
        user_id: &UserId,
    ) -> Result<Option<ConsultationSession>, EngineError> {
        Ok(self.sessions.get(user_id).await?)
    }

    /// Prompt to show a returning user.
    pub async fn current_prompt(&self, user_id: &UserId) -> Result<Prompt, EngineError> {
        let _turn = self.locks.acquire(user_id).await;
        Ok(match self.load_active(user_id).await? {
            Some(session) => stage_prompt(&session),
            None => idle_prompt(),
        })
    }

    /// Clears every session idle for longer than the configured timeout.
    ///
    /// Returns the number of sessions removed.
    pub async fn sweep_idle_sessions(&self) -> Result<usize, EngineError> {
        let timeout = self.settings.idle_timeout_secs;
        let mut removed = 0;

        for candidate in self.sessions.list().await? {
            if !candidate.is_idle(&Timestamp::now(), timeout) {
                continue;
            }
            let user_id = candidate.user_id();
            let _turn = self.locks.acquire(user_id).await;
            let Some(session) = self.sessions.get(user_id).await? else {
                continue;
            };
            if session.is_idle(&Timestamp::now(), timeout)
                && self.sessions.clear_if_current(user_id, session.id()).await?
            {
                removed += 1;
            }
        }

        let pruned = self.locks.prune().await;
        if removed > 0 {
            info!(removed, "Swept idle consultations");
        }
        debug!(pruned, "Pruned idle turn locks");
        Ok(removed)
    }

    async fn handle_locked(&self, user_id: &UserId, event: UserEvent) -> Result<Reply, EngineError> {
        if matches!(event, UserEvent::ButtonChoice(ChoiceToken::StartConsultation)) {
            return self.start(user_id).await;
        }

        let Some(mut session) = self.load_active(user_id).await? else {
            return Ok(match event {
                UserEvent::MediaInput(kind) => Reply::Rejected {
                    rejection: InputRejection::UnsupportedInput(kind),
                    prompt: idle_prompt(),
                },
                _ => Reply::NoActiveSession(idle_prompt()),
            });
        };

        let before = session.stage();
        let step = match event {
            UserEvent::MediaInput(kind) => Step::Reject(InputRejection::UnsupportedInput(kind)),
            UserEvent::ButtonChoice(token) if !stage_prompt(&session).offers(&token) => {
                debug!(user_id = %user_id, stage = ?before, choice = ?token, "Ignoring choice");
                Step::Ignore
            }
            event => match session.workflow() {
                WorkflowMode::Fixed => self.fixed_step(&mut session, event).await?,
                WorkflowMode::Adaptive => self.adaptive_step(&mut session, event).await?,
            },
        };

        self.finish(session, before, step).await
    }

    async fn start(&self, user_id: &UserId) -> Result<Reply, EngineError> {
        let Some(profile) = self.profiles.get_profile(user_id).await? else {
            info!(user_id = %user_id, "Consultation refused, no profile");
            return Ok(Reply::RegistrationRequired(registration_required_prompt()));
        };

        let session = ConsultationSession::start(user_id.clone(), profile, self.settings.workflow);
        self.sessions.put(&session).await?;
        info!(
            user_id = %user_id,
            consultation_id = %session.id(),
            workflow = ?session.workflow(),
            "Consultation started"
        );
        Ok(Reply::Prompt(stage_prompt(&session)))
    }

    /// Loads the user's session, expiring it if idle and repairing a
    /// transient stage left behind by an interrupted turn.
    async fn load_active(
        &self,
        user_id: &UserId,
    ) -> Result<Option<ConsultationSession>, EngineError> {
        let Some(mut session) = self.sessions.get(user_id).await? else {
            return Ok(None);
        };

        if session.is_idle(&Timestamp::now(), self.settings.idle_timeout_secs) {
            self.sessions.clear_if_current(user_id, session.id()).await?;
            info!(
                user_id = %user_id,
                consultation_id = %session.id(),
                "Idle consultation expired"
            );
            return Ok(None);
        }

        if session.recover_transient_stage() {
            info!(
                user_id = %user_id,
                consultation_id = %session.id(),
                "Resuming interrupted consultation at duration selection"
            );
        }
        Ok(Some(session))
    }

    async fn finish(
        &self,
        mut session: ConsultationSession,
        before: ConsultationStage,
        step: Step,
    ) -> Result<Reply, EngineError> {
        match step {
            Step::Ignore => Ok(Reply::Prompt(stage_prompt(&session))),
            Step::Reject(rejection) => {
                if !self.is_current(&session).await? {
                    return Ok(superseded(&session));
                }
                debug!(user_id = %session.user_id(), stage = ?before, %rejection, "Input rejected");
                Ok(Reply::Rejected {
                    rejection,
                    prompt: stage_prompt(&session),
                })
            }
            Step::Save => {
                if !self.checkpoint(&mut session).await? {
                    return Ok(superseded(&session));
                }
                if session.stage() != before {
                    debug!(
                        user_id = %session.user_id(),
                        from = ?before,
                        to = ?session.stage(),
                        "Stage transition"
                    );
                }
                Ok(Reply::Prompt(stage_prompt(&session)))
            }
            Step::Complete(recommendation) => self.complete(session, recommendation).await,
            Step::Superseded => Ok(superseded(&session)),
        }
    }

    async fn complete(
        &self,
        session: ConsultationSession,
        recommendation: Recommendation,
    ) -> Result<Reply, EngineError> {
        if !self
            .sessions
            .clear_if_current(session.user_id(), session.id())
            .await?
        {
            return Ok(superseded(&session));
        }

        let record = ConsultationRecord::from_session(&session, recommendation);
        if let Err(e) = self.recorder.record(&record).await {
            warn!(
                user_id = %record.user_id,
                consultation_id = %record.consultation_id,
                error = %e,
                "Failed to record consultation"
            );
        }

        info!(
            user_id = %record.user_id,
            consultation_id = %record.consultation_id,
            specialist = %record.recommendation.specialist,
            urgency = %record.recommendation.urgency,
            fallback = record.recommendation.is_fallback,
            elapsed_secs = Timestamp::now()
                .duration_since(session.created_at())
                .num_seconds(),
            "Consultation completed"
        );
        let prompt = recommendation_prompt(&record.recommendation);
        Ok(Reply::Completed { record, prompt })
    }

    /// Touches and writes back `session` if it is still the user's live one.
    pub(super) async fn checkpoint(
        &self,
        session: &mut ConsultationSession,
    ) -> Result<bool, EngineError> {
        session.touch(Timestamp::now());
        Ok(self.sessions.put_if_current(session).await?)
    }

    async fn is_current(&self, session: &ConsultationSession) -> Result<bool, EngineError> {
        Ok(self
            .sessions
            .get(session.user_id())
            .await?
            .is_some_and(|stored| stored.id() == session.id()))
    }

    /// Turns free text into symptom phrases, optionally asking the oracle
    /// whether it describes symptoms at all.
    ///
    /// A failed validation call accepts the text as entered.
    pub(super) async fn read_symptoms(
        &self,
        session: &ConsultationSession,
        text: &str,
        validate: bool,
    ) -> Result<Vec<String>, InputRejection> {
        let text = text.trim();
        if text.is_empty() {
            return Err(InputRejection::EmptyInput);
        }

        let text = if validate {
            match self.gateway.validate_symptoms(session, text).await {
                Ok(validation) if validation.is_valid => validation.cleaned_text,
                Ok(validation) => {
                    return Err(InputRejection::OffTopic(validation.rejection_reason))
                }
                Err(e) => {
                    warn!(
                        user_id = %session.user_id(),
                        consultation_id = %session.id(),
                        error = %e,
                        "Symptom validation failed, accepting input as entered"
                    );
                    text.to_string()
                }
            }
        } else {
            text.to_string()
        };

        let symptoms = self.gateway.normalizer().split(&text);
        if symptoms.is_empty() {
            return Err(InputRejection::EmptyInput);
        }
        Ok(symptoms)
    }

    /// Asks the oracle for the terminal recommendation; never fails.
    pub(super) async fn recommend_or_fallback(
        &self,
        session: &ConsultationSession,
    ) -> Recommendation {
        match self.gateway.recommend(session).await {
            Ok(recommendation) => recommendation,
            Err(e) => {
                warn!(
                    user_id = %session.user_id(),
                    consultation_id = %session.id(),
                    error = %e,
                    "Recommendation failed, using fallback specialist"
                );
                Recommendation::fallback(self.gateway.roster())
            }
        }
    }
}

fn superseded(session: &ConsultationSession) -> Reply {
    info!(
        user_id = %session.user_id(),
        consultation_id = %session.id(),
        "Discarding turn result, consultation was cancelled or replaced"
    );
    Reply::Superseded
}
