//! Consultation session aggregate.
//!
//! One live session per user. The session is mutated only by the dialogue
//! engine while it holds that user's turn lock, and is removed from the store
//! on completion, cancellation or idle timeout.
//!
//! # Invariants
//!
//! - `stage` moves only along [`ConsultationStage::valid_transitions`]
//! - `selected_symptoms` holds no exact repeats and nothing already covered
//!   by `primary_symptoms`
//! - `suggested_symptoms` is replaced wholesale, never edited in place

use serde::{Deserialize, Serialize};

use super::duration::SymptomDuration;
use super::normalizer::{is_known, merge};
use super::profile::PatientProfile;
use super::stage::{ConsultationStage, WorkflowMode};
use crate::domain::foundation::{ConsultationId, StateMachine, Timestamp, UserId, ValidationError};

/// One clarifying question and the patient's answer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QaPair {
    pub question: String,
    pub answer: String,
}

/// Live state of one user's consultation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConsultationSession {
    id: ConsultationId,
    user_id: UserId,
    workflow: WorkflowMode,
    stage: ConsultationStage,
    primary_symptoms: Vec<String>,
    duration: Option<SymptomDuration>,
    suggested_symptoms: Vec<String>,
    selected_symptoms: Vec<String>,
    qa_history: Vec<QaPair>,
    pending_question: Option<String>,
    profile: PatientProfile,
    created_at: Timestamp,
    last_activity: Timestamp,
}

impl ConsultationSession {
    /// Starts a fresh consultation in `CollectingSymptoms`.
    pub fn start(user_id: UserId, profile: PatientProfile, workflow: WorkflowMode) -> Self {
        let now = Timestamp::now();
        Self {
            id: ConsultationId::new(),
            user_id,
            workflow,
            stage: ConsultationStage::CollectingSymptoms,
            primary_symptoms: Vec::new(),
            duration: None,
            suggested_symptoms: Vec::new(),
            selected_symptoms: Vec::new(),
            qa_history: Vec::new(),
            pending_question: None,
            profile,
            created_at: now,
            last_activity: now,
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Accessors
    // ─────────────────────────────────────────────────────────────────────────

    pub fn id(&self) -> ConsultationId {
        self.id
    }

    pub fn user_id(&self) -> &UserId {
        &self.user_id
    }

    pub fn workflow(&self) -> WorkflowMode {
        self.workflow
    }

    pub fn stage(&self) -> ConsultationStage {
        self.stage
    }

    pub fn primary_symptoms(&self) -> &[String] {
        &self.primary_symptoms
    }

    pub fn duration(&self) -> Option<SymptomDuration> {
        self.duration
    }

    pub fn suggested_symptoms(&self) -> &[String] {
        &self.suggested_symptoms
    }

    pub fn selected_symptoms(&self) -> &[String] {
        &self.selected_symptoms
    }

    pub fn qa_history(&self) -> &[QaPair] {
        &self.qa_history
    }

    pub fn pending_question(&self) -> Option<&str> {
        self.pending_question.as_deref()
    }

    pub fn profile(&self) -> &PatientProfile {
        &self.profile
    }

    pub fn created_at(&self) -> &Timestamp {
        &self.created_at
    }

    pub fn last_activity(&self) -> &Timestamp {
        &self.last_activity
    }

    /// True if `index` points at a suggestion the patient has selected.
    pub fn is_suggestion_selected(&self, index: usize) -> bool {
        self.suggested_symptoms
            .get(index)
            .map(|s| self.selected_symptoms.contains(s))
            .unwrap_or(false)
    }

    /// Primary symptoms followed by the selected additional ones.
    pub fn all_symptoms(&self) -> Vec<String> {
        merge(&self.primary_symptoms, self.selected_symptoms.clone())
    }

    /// Primary symptoms plus free-text additions.
    ///
    /// Selected suggestions are left out so a regenerated list can offer
    /// them again.
    pub fn reported_symptoms(&self) -> Vec<String> {
        let custom = self
            .selected_symptoms
            .iter()
            .filter(|s| !self.suggested_symptoms.contains(s))
            .cloned()
            .collect();
        merge(&self.primary_symptoms, custom)
    }

    /// Number of clarifying questions asked so far, including a pending one.
    pub fn clarifying_rounds(&self) -> usize {
        self.qa_history.len() + usize::from(self.pending_question.is_some())
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Stage
    // ─────────────────────────────────────────────────────────────────────────

    /// Moves to `target` if the stage machine allows it.
    pub fn advance_to(&mut self, target: ConsultationStage) -> Result<(), ValidationError> {
        self.stage = self.stage.transition_to(target)?;
        Ok(())
    }

    /// Clears everything the patient entered and returns to
    /// `CollectingSymptoms`. The consultation id and profile are kept.
    pub fn restart(&mut self) -> Result<(), ValidationError> {
        self.advance_to(ConsultationStage::CollectingSymptoms)?;
        self.primary_symptoms.clear();
        self.duration = None;
        self.suggested_symptoms.clear();
        self.selected_symptoms.clear();
        self.qa_history.clear();
        self.pending_question = None;
        Ok(())
    }

    /// Repairs a session loaded from storage.
    ///
    /// `GeneratingSuggestions` only exists while an oracle call is in flight;
    /// a session persisted in it resumes at `SelectingDuration` so the
    /// patient can pick the duration again.
    pub fn recover_transient_stage(&mut self) -> bool {
        if self.stage == ConsultationStage::GeneratingSuggestions {
            self.stage = ConsultationStage::SelectingDuration;
            return true;
        }
        false
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Symptoms
    // ─────────────────────────────────────────────────────────────────────────

    /// Appends user-authored symptoms, keeping repeats.
    pub fn add_primary_symptoms(&mut self, symptoms: Vec<String>) {
        self.primary_symptoms = merge(&self.primary_symptoms, symptoms);
    }

    /// Records the duration.
    pub fn set_duration(&mut self, duration: SymptomDuration) {
        self.duration = Some(duration);
    }

    /// Replaces the suggestion list.
    ///
    /// Selections that came from the previous suggestions and are not offered
    /// again are dropped; custom entries survive.
    pub fn replace_suggestions(&mut self, suggestions: Vec<String>) {
        let old = std::mem::replace(&mut self.suggested_symptoms, suggestions);
        let current = &self.suggested_symptoms;
        self.selected_symptoms
            .retain(|s| !old.contains(s) || current.contains(s));
    }

    /// Flips membership of the suggestion at `index` in the selection.
    ///
    /// Returns whether the suggestion is selected afterwards.
    pub fn toggle_suggestion(&mut self, index: usize) -> Result<bool, ValidationError> {
        let symptom = self.suggested_symptoms.get(index).cloned().ok_or_else(|| {
            ValidationError::out_of_range(
                "suggestion_index",
                0.0,
                self.suggested_symptoms.len().saturating_sub(1) as f64,
                index as f64,
            )
        })?;

        if let Some(pos) = self.selected_symptoms.iter().position(|s| *s == symptom) {
            self.selected_symptoms.remove(pos);
            Ok(false)
        } else {
            self.selected_symptoms.push(symptom);
            Ok(true)
        }
    }

    /// Empties the selection ("none of these").
    pub fn clear_selection(&mut self) {
        self.selected_symptoms.clear();
    }

    /// Adds free-text symptoms to the selection.
    ///
    /// Entries already covered by primary or selected symptoms are skipped.
    /// An entry naming an offered suggestion selects that suggestion, so a
    /// later toggle removes it. Returns the entries actually added.
    pub fn add_custom_symptoms(&mut self, symptoms: Vec<String>) -> Vec<String> {
        let mut added = Vec::new();
        for symptom in symptoms {
            let known = merge(&self.primary_symptoms, self.selected_symptoms.clone());
            if is_known(&symptom, &known) {
                continue;
            }
            let entry = self
                .suggested_symptoms
                .iter()
                .find(|s| s.eq_ignore_ascii_case(symptom.trim()))
                .cloned()
                .unwrap_or(symptom);
            self.selected_symptoms.push(entry.clone());
            added.push(entry);
        }
        added
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Adaptive workflow
    // ─────────────────────────────────────────────────────────────────────────

    /// Stores the question the patient is now expected to answer.
    pub fn ask(&mut self, question: impl Into<String>) {
        self.pending_question = Some(question.into());
    }

    /// Pairs `answer` with the pending question and appends it to the
    /// history.
    pub fn record_answer(&mut self, answer: impl Into<String>) {
        let question = self.pending_question.take().unwrap_or_default();
        self.qa_history.push(QaPair {
            question,
            answer: answer.into(),
        });
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Activity
    // ─────────────────────────────────────────────────────────────────────────

    /// Marks the session as active at `now`.
    pub fn touch(&mut self, now: Timestamp) {
        self.last_activity = now;
    }

    /// True if the session saw no activity for more than `idle_timeout_secs`.
    pub fn is_idle(&self, now: &Timestamp, idle_timeout_secs: u64) -> bool {
        self.last_activity.plus_secs(idle_timeout_secs).is_before(now)
    }
}
