//! Symptom normalizer.
//!
//! Pure text-to-list transformations: splitting free text into atomic
//! symptom phrases, and filtering oracle-proposed phrases against what the
//! patient already said and against the diagnosis blocklist.

use once_cell::sync::Lazy;

/// Maximum number of suggestions kept after filtering.
pub const MAX_SUGGESTIONS: usize = 10;

/// Default maximum length (in characters) of one suggested phrase.
pub const DEFAULT_MAX_SUGGESTION_LEN: usize = 50;

/// Disease-name keywords that must never appear in a suggested symptom.
pub static DEFAULT_DISEASE_BLOCKLIST: Lazy<Vec<String>> = Lazy::new(|| {
    [
        "disease",
        "syndrome",
        "disorder",
        "infection",
        "influenza",
        "covid",
        "pneumonia",
        "bronchitis",
        "gastritis",
        "arthritis",
        "diabetes",
        "hypertension",
        "migraine",
        "cancer",
        "tumor",
        "ulcer",
        "asthma",
        "allergy",
        "stroke",
        "infarction",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
});

/// Policy applied to oracle-proposed symptoms.
#[derive(Debug, Clone, PartialEq)]
pub struct SuggestionPolicy {
    /// Keywords that mark a phrase as a diagnosis rather than a symptom.
    pub disease_blocklist: Vec<String>,
    /// Longest phrase accepted, in characters.
    pub max_len: usize,
    /// Number of suggestions kept.
    pub max_count: usize,
}

impl Default for SuggestionPolicy {
    fn default() -> Self {
        Self {
            disease_blocklist: DEFAULT_DISEASE_BLOCKLIST.clone(),
            max_len: DEFAULT_MAX_SUGGESTION_LEN,
            max_count: MAX_SUGGESTIONS,
        }
    }
}

/// Splits and filters symptom phrases.
#[derive(Debug, Clone, PartialEq)]
pub struct SymptomNormalizer {
    conjunctions: Vec<String>,
    policy: SuggestionPolicy,
}

impl Default for SymptomNormalizer {
    fn default() -> Self {
        Self::new(vec!["and".to_string()], SuggestionPolicy::default())
    }
}

impl SymptomNormalizer {
    /// Creates a normalizer splitting on the given conjunctions.
    pub fn new(conjunctions: Vec<String>, policy: SuggestionPolicy) -> Self {
        let conjunctions = conjunctions
            .into_iter()
            .map(|c| c.trim().to_lowercase())
            .filter(|c| !c.is_empty())
            .collect();
        Self {
            conjunctions,
            policy,
        }
    }

    /// Returns the suggestion policy in force.
    pub fn policy(&self) -> &SuggestionPolicy {
        &self.policy
    }

    /// Splits free text on commas and on the configured conjunctions.
    ///
    /// Fragments are trimmed, inner whitespace is collapsed, empty fragments
    /// are dropped. Never fails.
    pub fn split(&self, text: &str) -> Vec<String> {
        let mut symptoms = Vec::new();

        for fragment in text.split(',') {
            let mut words: Vec<&str> = Vec::new();
            for word in fragment.split_whitespace() {
                if self.is_conjunction(word) {
                    flush_words(&mut symptoms, &mut words);
                } else {
                    words.push(word);
                }
            }
            flush_words(&mut symptoms, &mut words);
        }

        symptoms
    }

    /// Filters oracle candidates with this normalizer's policy.
    pub fn filter_suggestions(&self, candidates: &[String], already_known: &[String]) -> Vec<String> {
        filter_with_cap(
            candidates,
            already_known,
            &self.policy.disease_blocklist,
            self.policy.max_len,
            self.policy.max_count,
        )
    }

    fn is_conjunction(&self, word: &str) -> bool {
        let word = word.to_lowercase();
        self.conjunctions.iter().any(|c| *c == word)
    }
}

fn flush_words(symptoms: &mut Vec<String>, words: &mut Vec<&str>) {
    if !words.is_empty() {
        symptoms.push(words.join(" "));
        words.clear();
    }
}

/// Appends new symptoms after existing ones, preserving order.
///
/// Repeats are kept: a patient entering the same complaint twice is recorded
/// as written.
pub fn merge(existing: &[String], new: Vec<String>) -> Vec<String> {
    let mut merged = Vec::with_capacity(existing.len() + new.len());
    merged.extend_from_slice(existing);
    merged.extend(new);
    merged
}

/// True if `candidate` matches any known phrase, case-insensitively, with a
/// substring match in either direction.
pub fn is_known(candidate: &str, known: &[String]) -> bool {
    let candidate = candidate.trim().to_lowercase();
    if candidate.is_empty() {
        return false;
    }
    known.iter().any(|k| {
        let k = k.trim().to_lowercase();
        !k.is_empty() && (k.contains(&candidate) || candidate.contains(&k))
    })
}

fn mentions_disease(candidate: &str, blocklist: &[String]) -> bool {
    let candidate = candidate.to_lowercase();
    blocklist.iter().any(|keyword| {
        let keyword = keyword.trim().to_lowercase();
        !keyword.is_empty() && candidate.contains(&keyword)
    })
}

/// Removes candidates that repeat known symptoms, name a disease, or exceed
/// `max_len` characters, keeping at most [`MAX_SUGGESTIONS`] in input order.
pub fn filter_suggestions(
    candidates: &[String],
    already_known: &[String],
    disease_blocklist: &[String],
    max_len: usize,
) -> Vec<String> {
    filter_with_cap(
        candidates,
        already_known,
        disease_blocklist,
        max_len,
        MAX_SUGGESTIONS,
    )
}

fn filter_with_cap(
    candidates: &[String],
    already_known: &[String],
    disease_blocklist: &[String],
    max_len: usize,
    max_count: usize,
) -> Vec<String> {
    let mut kept: Vec<String> = Vec::new();

    for candidate in candidates {
        if kept.len() >= max_count {
            break;
        }
        let candidate = candidate.trim();
        if candidate.is_empty()
            || candidate.chars().count() > max_len
            || is_known(candidate, already_known)
            || mentions_disease(candidate, disease_blocklist)
            || kept.iter().any(|k| k.eq_ignore_ascii_case(candidate))
        {
            continue;
        }
        kept.push(candidate.to_string());
    }

    kept
}
