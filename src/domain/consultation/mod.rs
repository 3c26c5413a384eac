//! Consultation domain.
//!
//! Value objects, the session aggregate and the stage machine of the
//! symptom intake dialogue, plus the pure symptom normalizer.

mod duration;
mod event;
pub mod normalizer;
mod profile;
pub mod prompt;
mod recommendation;
mod record;
mod session;
mod stage;

pub use duration::SymptomDuration;
pub use event::{ChoiceToken, MediaKind, UserEvent};
pub use normalizer::{SuggestionPolicy, SymptomNormalizer};
pub use profile::{Gender, PatientProfile, AGE_RANGE, HEIGHT_RANGE_CM, WEIGHT_RANGE_KG};
pub use prompt::{Choice, Prompt};
pub use recommendation::{
    Recommendation, Specialist, SpecialistRoster, Urgency, DEFAULT_FALLBACK_SPECIALIST,
    DEFAULT_ROSTER,
};
pub use record::{ConsultationRecord, RecordDetails};
pub use session::{ConsultationSession, QaPair};
pub use stage::{ConsultationStage, WorkflowMode};
