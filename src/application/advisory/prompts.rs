//! Prompt texts for the four gateway operations.

use chrono::NaiveDate;

use crate::domain::consultation::{PatientProfile, QaPair, SpecialistRoster, SymptomDuration};

pub const VALIDATE_SYSTEM: &str = "You check whether a message describes medical symptoms or \
complaints. Reject recipes, commands, jokes and other off-topic text. Respond ONLY with JSON: \
{\"is_valid\": true|false, \"cleaned_text\": \"the symptoms, cleaned of noise\", \
\"rejection_reason\": \"why it is not a symptom description, empty when valid\"}";

pub const SUGGEST_SYSTEM: &str = "You are a medical intake assistant. Given the patient's main \
symptoms, propose 8 to 10 additional SYMPTOMS that often accompany them and that a doctor would \
ask about. Each entry is a short phrase of 2 to 4 words. Never name diseases or diagnoses. Do not \
repeat the symptoms the patient already reported. Respond ONLY with JSON: \
{\"symptoms\": [\"...\", \"...\"]}";

const RECOMMEND_SYSTEM_HEAD: &str = "You are an experienced medical assistant who decides which \
specialist a patient should see. Take age, gender, height and weight into account. Classify \
urgency as one of: low, medium, high, emergency. Choose the specialist ONLY from this list:";

const RECOMMEND_FORMAT: &str = "Respond ONLY with JSON: {\"specialist\": \"name from the list\", \
\"urgency\": \"low|medium|high|emergency\", \"reasoning\": \"short explanation\"}";

const ASSESS_FORMAT: &str = "Decide whether one more clarifying question is needed or a \
specialist can already be recommended. Ask one question at a time. Respond ONLY with JSON: \
{\"action\": \"ask_question\" | \"recommend_doctor\", \"question\": \"text, when asking\", \
\"specialist\": \"name from the list, when recommending\", \"urgency\": \
\"low|medium|high|emergency, when recommending\", \"reasoning\": \"short explanation\"}";

fn roster_lines(roster: &SpecialistRoster) -> String {
    roster
        .members()
        .iter()
        .map(|m| format!("- {}", m))
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn recommend_system(roster: &SpecialistRoster) -> String {
    format!("{}\n{}\n\n{}", RECOMMEND_SYSTEM_HEAD, roster_lines(roster), RECOMMEND_FORMAT)
}

pub fn assess_system(roster: &SpecialistRoster) -> String {
    format!("{}\n{}\n\n{}", RECOMMEND_SYSTEM_HEAD, roster_lines(roster), ASSESS_FORMAT)
}

pub fn validate_user(text: &str) -> String {
    format!("Patient message:\n{}", text)
}

pub fn suggest_user(
    primary: &[String],
    duration: Option<SymptomDuration>,
    profile: &PatientProfile,
    today: NaiveDate,
) -> String {
    format!(
        "PATIENT PROFILE:\n{}\n\nMAIN SYMPTOMS:\n{}\n\nDURATION:\n{}",
        profile.describe(today),
        primary.join(", "),
        duration.map(|d| d.label()).unwrap_or("not specified"),
    )
}

pub fn recommend_user(
    symptoms: &[String],
    duration: Option<SymptomDuration>,
    qa_history: &[QaPair],
    profile: &PatientProfile,
    today: NaiveDate,
) -> String {
    let mut text = format!(
        "PATIENT PROFILE:\n{}\n\nSYMPTOMS:\n{}",
        profile.describe(today),
        symptoms.join(", "),
    );
    if let Some(duration) = duration {
        text.push_str(&format!("\n\nDURATION:\n{}", duration.label()));
    }
    if !qa_history.is_empty() {
        text.push_str("\n\nQUESTIONS AND ANSWERS:\n");
        text.push_str(&qa_lines(qa_history));
    }
    text
}

pub fn assess_user(
    symptoms: &[String],
    qa_history: &[QaPair],
    profile: &PatientProfile,
    today: NaiveDate,
) -> String {
    let qa = if qa_history.is_empty() {
        "No clarifying questions yet".to_string()
    } else {
        qa_lines(qa_history)
    };
    format!(
        "PATIENT PROFILE:\n{}\n\nSYMPTOMS:\n{}\n\nQUESTIONS AND ANSWERS:\n{}",
        profile.describe(today),
        symptoms.join(", "),
        qa
    )
}

fn qa_lines(qa_history: &[QaPair]) -> String {
    qa_history
        .iter()
        .enumerate()
        .map(|(i, qa)| format!("{}. Q: {}\n   A: {}", i + 1, qa.question, qa.answer))
        .collect::<Vec<_>>()
        .join("\n")
}
