//! Specialist recommendation value objects.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::domain::foundation::ValidationError;

/// How soon the patient should seek care.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Urgency {
    Low,
    Medium,
    High,
    Emergency,
}

impl Urgency {
    /// Patient-facing explanation of the urgency level.
    pub fn advice(&self) -> &'static str {
        match self {
            Urgency::Low => "Low - plan a routine visit",
            Urgency::Medium => "Medium - book an appointment soon",
            Urgency::High => "High - see a doctor as soon as possible",
            Urgency::Emergency => "EMERGENCY - call an ambulance now",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Urgency::Low => "low",
            Urgency::Medium => "medium",
            Urgency::High => "high",
            Urgency::Emergency => "emergency",
        }
    }
}

impl fmt::Display for Urgency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Urgency {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "low" => Ok(Urgency::Low),
            "medium" => Ok(Urgency::Medium),
            "high" => Ok(Urgency::High),
            "emergency" => Ok(Urgency::Emergency),
            other => Err(ValidationError::invalid_format(
                "urgency",
                format!("unknown urgency '{}'", other),
            )),
        }
    }
}

/// A specialist name taken from the configured roster.
///
/// Only [`SpecialistRoster`] hands these out, so a `Specialist` is always a
/// roster member.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Specialist(String);

impl Specialist {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Specialist {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Closed list of specialists the engine may recommend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpecialistRoster {
    members: Vec<String>,
    fallback: String,
}

impl SpecialistRoster {
    /// Creates a roster. The fallback is added to the members if missing.
    pub fn new(members: Vec<String>, fallback: impl Into<String>) -> Result<Self, ValidationError> {
        let fallback = fallback.into().trim().to_string();
        if fallback.is_empty() {
            return Err(ValidationError::empty_field("fallback_specialist"));
        }

        let mut cleaned: Vec<String> = Vec::new();
        for member in members {
            let member = member.trim().to_string();
            if !member.is_empty() && !cleaned.iter().any(|m| m.eq_ignore_ascii_case(&member)) {
                cleaned.push(member);
            }
        }
        if !cleaned.iter().any(|m| m.eq_ignore_ascii_case(&fallback)) {
            cleaned.push(fallback.clone());
        }

        Ok(Self {
            members: cleaned,
            fallback,
        })
    }

    /// Looks up a name, ignoring case and surrounding whitespace.
    pub fn find(&self, name: &str) -> Option<Specialist> {
        let name = name.trim();
        self.members
            .iter()
            .find(|m| m.to_lowercase() == name.to_lowercase())
            .map(|m| Specialist(m.clone()))
    }

    /// Resolves an untrusted name, coercing unknown names to the fallback.
    pub fn coerce(&self, name: &str) -> Specialist {
        self.find(name).unwrap_or_else(|| self.fallback())
    }

    /// The specialist used when the oracle cannot be trusted.
    pub fn fallback(&self) -> Specialist {
        Specialist(self.fallback.clone())
    }

    pub fn members(&self) -> &[String] {
        &self.members
    }

    /// Default roster.
    pub fn standard() -> Self {
        Self {
            members: DEFAULT_ROSTER.iter().map(|s| s.to_string()).collect(),
            fallback: DEFAULT_FALLBACK_SPECIALIST.to_string(),
        }
    }
}

impl Default for SpecialistRoster {
    fn default() -> Self {
        Self::standard()
    }
}

/// Specialist used when the oracle output cannot be trusted or obtained.
pub const DEFAULT_FALLBACK_SPECIALIST: &str = "General Practitioner";

/// Default specialist roster.
pub const DEFAULT_ROSTER: &[&str] = &[
    "Cardiologist",
    "Neurologist",
    "Gastroenterologist",
    "Endocrinologist",
    "Pulmonologist",
    "Urologist",
    "Gynecologist",
    "Dermatologist",
    "Ophthalmologist",
    "Otolaryngologist",
    "Orthopedist",
    "Rheumatologist",
    "Allergist",
    "Psychiatrist",
    "Oncologist",
    "Surgeon",
    "Nephrologist",
    DEFAULT_FALLBACK_SPECIALIST,
];

const FALLBACK_REASONING: &str =
    "We could not analyse your symptoms automatically. A general practitioner can examine you and refer you to the right specialist.";

/// Terminal answer of a consultation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recommendation {
    pub specialist: Specialist,
    pub urgency: Urgency,
    pub reasoning: String,
    /// True when the oracle was unavailable or untrusted.
    pub is_fallback: bool,
}

impl Recommendation {
    /// Recommendation used when the oracle fails.
    pub fn fallback(roster: &SpecialistRoster) -> Self {
        Self {
            specialist: roster.fallback(),
            urgency: Urgency::Medium,
            reasoning: FALLBACK_REASONING.to_string(),
            is_fallback: true,
        }
    }
}
