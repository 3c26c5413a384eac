//! How long the patient has had the symptoms.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Symptom duration bucket offered to the patient.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SymptomDuration {
    LessThanDay,
    OneToThreeDays,
    ThreeToSevenDays,
    MoreThanWeek,
}

impl SymptomDuration {
    /// All buckets in the order they are offered.
    pub const ALL: [SymptomDuration; 4] = [
        SymptomDuration::LessThanDay,
        SymptomDuration::OneToThreeDays,
        SymptomDuration::ThreeToSevenDays,
        SymptomDuration::MoreThanWeek,
    ];

    /// Human-readable label, also used in prompts and records.
    pub fn label(&self) -> &'static str {
        match self {
            SymptomDuration::LessThanDay => "<24h",
            SymptomDuration::OneToThreeDays => "1-3 days",
            SymptomDuration::ThreeToSevenDays => "3-7 days",
            SymptomDuration::MoreThanWeek => ">7 days",
        }
    }
}

impl fmt::Display for SymptomDuration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}
