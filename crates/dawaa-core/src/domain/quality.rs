//! Usefulness filtering for source-returned text.
//!
//! Live label services sometimes answer with boilerplate instead of real
//! usage information ("as directed by the physician", "see package insert").
//! Accepting such a record would short-circuit the fallback chain on junk,
//! so text is screened here before a record may end the chain.

/// Phrases that mark a text field as filler rather than information.
const PLACEHOLDER_INDICATORS: &[&str] = &[
    "not available",
    "condition listed above or as directed by the physician",
    "relief of naturally occurring simple nervous tension",
    "indications condition listed above",
    "as directed by the physician",
    "see package insert",
    "refer to package insert",
    "consult your doctor",
    "ask your doctor",
    "talk to your doctor",
    "follow your doctor's instructions",
    "use as prescribed",
    "use as directed",
    "use according to",
    "use under medical supervision",
    "use under doctor's supervision",
    "use under physician's supervision",
    "use under medical advice",
    "use under doctor's advice",
    "use under medical guidance",
    "use under doctor's guidance",
    "use under medical direction",
    "use under doctor's direction",
    "use under medical care",
    "use under doctor's care",
    "use under medical treatment",
    "use under medical management",
];

/// Vocabulary that carries no drug-specific content. A usage text made
/// mostly of these words is boilerplate regardless of length.
const FILLER_WORDS: &[&str] = &[
    "use",
    "for",
    "relief",
    "of",
    "naturally",
    "occurring",
    "simple",
    "nervous",
    "tension",
    "condition",
    "listed",
    "above",
    "directed",
    "physician",
    "doctor",
    "medical",
    "supervision",
    "advice",
    "guidance",
    "care",
    "treatment",
    "management",
];

/// Usage text shorter than this cannot describe an indication.
const MIN_MEANINGFUL_LEN: usize = 50;

/// Maximum tolerated share of filler vocabulary in a usage text.
const MAX_FILLER_RATIO: f64 = 0.7;

/// True when the text contains any known placeholder phrase.
#[must_use]
pub fn contains_placeholder(text: &str) -> bool {
    let lower = text.to_lowercase();
    PLACEHOLDER_INDICATORS
        .iter()
        .any(|indicator| lower.contains(indicator))
}

/// A substantive field: non-blank after trimming and free of placeholder
/// phrases. Applied to contraindications and ingredient lists, which may be
/// legitimately short.
#[must_use]
pub fn is_substantive(text: &str) -> bool {
    let trimmed = text.trim();
    !trimmed.is_empty() && !contains_placeholder(trimmed)
}

/// Meaningful usage (indications) text: substantive, long enough to say
/// something, and not dominated by filler vocabulary.
#[must_use]
pub fn is_meaningful_usage(text: &str) -> bool {
    let trimmed = text.trim();
    if trimmed.is_empty() || contains_placeholder(trimmed) {
        return false;
    }
    if trimmed.len() < MIN_MEANINGFUL_LEN {
        return false;
    }

    let lower = trimmed.to_lowercase();
    let words: Vec<&str> = lower.split_whitespace().collect();
    if words.is_empty() {
        return false;
    }
    let filler = words
        .iter()
        .filter(|word| FILLER_WORDS.contains(*word))
        .count();
    (filler as f64 / words.len() as f64) <= MAX_FILLER_RATIO
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_and_placeholder_texts_are_rejected() {
        assert!(!is_meaningful_usage(""));
        assert!(!is_meaningful_usage("   "));
        assert!(!is_meaningful_usage("not available"));
        assert!(!is_meaningful_usage(
            "Take this medicine only as directed by the physician."
        ));
        assert!(!is_substantive("Not Available"));
    }

    #[test]
    fn short_usage_text_is_rejected() {
        assert!(!is_meaningful_usage("Treats headaches."));
    }

    #[test]
    fn filler_dominated_text_is_rejected() {
        // Long enough, but nearly every word is generic vocabulary.
        assert!(!is_meaningful_usage(
            "use for relief of condition listed above use for relief of condition listed above"
        ));
    }

    #[test]
    fn real_usage_text_passes() {
        assert!(is_meaningful_usage(
            "Loratadine is used to relieve allergy symptoms such as watery eyes, \
             runny nose, itching eyes/nose, and sneezing."
        ));
    }

    #[test]
    fn short_ingredient_lists_are_substantive() {
        assert!(is_substantive("loratadine 10mg"));
        assert!(!is_substantive(""));
    }
}
