//! Patient profile snapshot.
//!
//! The profile is owned by the external registration flow; the dialogue
//! only reads it. The constructors still enforce the ranges registration
//! accepts, so a snapshot built here is always plausible.

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::domain::foundation::ValidationError;

/// Accepted age range in years.
pub const AGE_RANGE: (u32, u32) = (1, 120);
/// Accepted height range in centimetres.
pub const HEIGHT_RANGE_CM: (u32, u32) = (50, 250);
/// Accepted weight range in kilograms.
pub const WEIGHT_RANGE_KG: (f32, f32) = (20.0, 300.0);

/// Patient gender as recorded at registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    Male,
    Female,
    Other,
}

impl fmt::Display for Gender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Gender::Male => "male",
            Gender::Female => "female",
            Gender::Other => "other",
        };
        write!(f, "{}", s)
    }
}

/// Read-only patient data used to personalise oracle prompts.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PatientProfile {
    birth_date: Option<NaiveDate>,
    age: Option<u32>,
    gender: Option<Gender>,
    height_cm: Option<u32>,
    weight_kg: Option<f32>,
}

impl PatientProfile {
    /// Creates an empty profile (registered, nothing disclosed).
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets an explicit age in years.
    pub fn with_age(mut self, age: u32) -> Result<Self, ValidationError> {
        check_range("age", age as f64, AGE_RANGE.0 as f64, AGE_RANGE.1 as f64)?;
        self.age = Some(age);
        Ok(self)
    }

    /// Sets the birth date; age is then derived from it.
    pub fn with_birth_date(mut self, birth_date: NaiveDate) -> Self {
        self.birth_date = Some(birth_date);
        self
    }

    /// Sets the gender.
    pub fn with_gender(mut self, gender: Gender) -> Self {
        self.gender = Some(gender);
        self
    }

    /// Sets the height in centimetres.
    pub fn with_height_cm(mut self, height_cm: u32) -> Result<Self, ValidationError> {
        check_range(
            "height_cm",
            height_cm as f64,
            HEIGHT_RANGE_CM.0 as f64,
            HEIGHT_RANGE_CM.1 as f64,
        )?;
        self.height_cm = Some(height_cm);
        Ok(self)
    }

    /// Sets the weight in kilograms.
    pub fn with_weight_kg(mut self, weight_kg: f32) -> Result<Self, ValidationError> {
        check_range(
            "weight_kg",
            weight_kg as f64,
            WEIGHT_RANGE_KG.0 as f64,
            WEIGHT_RANGE_KG.1 as f64,
        )?;
        self.weight_kg = Some(weight_kg);
        Ok(self)
    }

    /// Age on the given day: derived from the birth date when known,
    /// otherwise the explicitly recorded age.
    pub fn age_on(&self, today: NaiveDate) -> Option<u32> {
        match self.birth_date {
            Some(birth) if birth <= today => {
                let mut years = today.year() - birth.year();
                if (today.month(), today.day()) < (birth.month(), birth.day()) {
                    years -= 1;
                }
                u32::try_from(years).ok()
            }
            _ => self.age,
        }
    }

    pub fn gender(&self) -> Option<Gender> {
        self.gender
    }

    pub fn height_cm(&self) -> Option<u32> {
        self.height_cm
    }

    pub fn weight_kg(&self) -> Option<f32> {
        self.weight_kg
    }

    /// Renders the profile as prompt context lines.
    pub fn describe(&self, today: NaiveDate) -> String {
        let mut lines = Vec::new();
        if let Some(age) = self.age_on(today) {
            lines.push(format!("Age: {} years", age));
        }
        if let Some(gender) = self.gender {
            lines.push(format!("Gender: {}", gender));
        }
        if let Some(height) = self.height_cm {
            lines.push(format!("Height: {} cm", height));
        }
        if let Some(weight) = self.weight_kg {
            lines.push(format!("Weight: {} kg", weight));
        }

        if lines.is_empty() {
            "No patient information provided".to_string()
        } else {
            lines.join("\n")
        }
    }
}

fn check_range(field: &str, value: f64, min: f64, max: f64) -> Result<(), ValidationError> {
    if value < min || value > max || value.is_nan() {
        return Err(ValidationError::out_of_range(field, min, max, value));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn age_is_derived_from_birth_date() {
        let profile = PatientProfile::new().with_birth_date(day(1990, 6, 15));
        assert_eq!(profile.age_on(day(2024, 6, 14)), Some(33));
        assert_eq!(profile.age_on(day(2024, 6, 15)), Some(34));
    }

    #[test]
    fn birth_date_takes_precedence_over_recorded_age() {
        let profile = PatientProfile::new()
            .with_age(50)
            .unwrap()
            .with_birth_date(day(2000, 1, 1));
        assert_eq!(profile.age_on(day(2024, 1, 1)), Some(24));
    }

    #[test]
    fn out_of_range_values_are_rejected() {
        assert!(PatientProfile::new().with_age(0).is_err());
        assert!(PatientProfile::new().with_age(121).is_err());
        assert!(PatientProfile::new().with_height_cm(49).is_err());
        assert!(PatientProfile::new().with_weight_kg(300.5).is_err());
        assert!(PatientProfile::new().with_weight_kg(f32::NAN).is_err());
    }

    #[test]
    fn describe_lists_known_fields() {
        let profile = PatientProfile::new()
            .with_age(30)
            .unwrap()
            .with_gender(Gender::Female)
            .with_height_cm(170)
            .unwrap();
        let text = profile.describe(day(2024, 1, 1));
        assert!(text.contains("Age: 30 years"));
        assert!(text.contains("Gender: female"));
        assert!(text.contains("Height: 170 cm"));
        assert!(!text.contains("Weight"));
    }

    #[test]
    fn describe_empty_profile() {
        assert_eq!(
            PatientProfile::new().describe(day(2024, 1, 1)),
            "No patient information provided"
        );
    }
}
