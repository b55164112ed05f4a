//! Fuzzy matching against the known-name universe.

use strsim::{jaro_winkler, normalized_levenshtein};

/// Minimum blended score for a fuzzy candidate to be accepted.
///
/// The blend favors Jaro-Winkler's prefix sensitivity (drug-name typos
/// cluster at word ends) while normalized Levenshtein keeps wholesale
/// rewrites out. 0.86 admits one-character typos of known names
/// ("panadoll", "aspirn") and rejects unrelated strings, which score well
/// below 0.7.
pub const ACCEPT_THRESHOLD: f64 = 0.86;

/// Blended similarity in `[0, 1]`.
#[must_use]
pub fn score(a: &str, b: &str) -> f64 {
    let jw = jaro_winkler(a, b);
    let lev = normalized_levenshtein(a, b);
    jw * 0.6 + lev * 0.4
}

/// Best candidate by blended score. Ties break toward the lexicographically
/// smaller candidate so repeated calls always pick the same name.
#[must_use]
pub fn best_match<'a, I>(query: &str, candidates: I) -> Option<(&'a str, f64)>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut best: Option<(&'a str, f64)> = None;
    for candidate in candidates {
        let candidate_score = score(query, candidate);
        let replace = match best {
            None => true,
            Some((current, current_score)) => {
                candidate_score > current_score
                    || (candidate_score == current_score && candidate < current)
            }
        };
        if replace {
            best = Some((candidate, candidate_score));
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn one_character_typos_clear_the_threshold() {
        assert!(score("panadoll", "panadol") >= ACCEPT_THRESHOLD);
        assert!(score("aspirn", "aspirin") >= ACCEPT_THRESHOLD);
        assert!(score("voltarin", "voltaren") >= ACCEPT_THRESHOLD);
    }

    #[test]
    fn unrelated_strings_fall_well_short() {
        assert!(score("xyzzynonexistent123", "paracetamol") < 0.7);
        assert!(score("hello world", "loratadine") < 0.7);
    }

    #[test]
    fn picks_the_highest_scoring_candidate() {
        let candidates = ["paracetamol", "panadol", "loratadine"];
        let (name, matched_score) =
            best_match("panadoll", candidates.iter().copied()).expect("match");
        assert_eq!(name, "panadol");
        assert!(matched_score >= ACCEPT_THRESHOLD);
    }

    #[test]
    fn empty_candidate_set_yields_none() {
        assert!(best_match("panadol", std::iter::empty()).is_none());
    }
}
