//! Medicine-name resolution.
//!
//! Turns whatever a customer typed into a canonical generic name the usage
//! sources can answer for. The pipeline is a fixed sequence of cheap,
//! table-driven steps over static data, so resolution never touches the
//! network and never fails; the worst case is an [`ResolveConfidence::Unresolved`]
//! passthrough of the cleaned input.
//!
//! Order of attempts:
//!
//! 1. clean: lowercase, drop punctuation, collapse whitespace
//! 2. Arabic: normalize the script and consult the Arabic-to-English table
//! 3. exact: brand-to-generic substitution, release suffixes included
//! 4. dosage strip: retry the exact step without strength and form tokens
//! 5. fuzzy: blended string similarity against every known name
//! 6. passthrough: keep the cleaned text, flagged unresolved

pub mod arabic;
pub mod fuzzy;
pub mod generics;

use std::sync::OnceLock;

use crate::domain::{ResolveConfidence, ResolvedName};

/// Resolve raw user input to a canonical name.
///
/// Total over its input: every string, Arabic or Latin, typo-ridden or
/// empty, comes back as a [`ResolvedName`]. Callers decide what an
/// unresolved passthrough is worth trying against the sources.
#[must_use]
pub fn resolve(raw: &str) -> ResolvedName {
    let cleaned = clean(raw);
    if cleaned.is_empty() {
        return ResolvedName::passthrough(cleaned);
    }

    if arabic::contains_arabic(&cleaned) {
        let normalized = arabic::normalize(&cleaned);
        if let Some(english) = arabic::lookup(&normalized) {
            return exact_match(english)
                .unwrap_or_else(|| ResolvedName::exact(english, None));
        }
        return ResolvedName::passthrough(normalized);
    }

    if let Some(resolved) = exact_match(&cleaned) {
        return resolved;
    }

    let base = generics::strip_dosage_tokens(&cleaned);
    let base = if base.is_empty() { cleaned.clone() } else { base };
    if base != cleaned {
        if let Some(resolved) = exact_match(&base) {
            return resolved;
        }
    }

    if let Some((candidate, score)) = fuzzy::best_match(&base, universe().iter().copied()) {
        if score >= fuzzy::ACCEPT_THRESHOLD {
            if let Some(generic) = generics::lookup(candidate) {
                let brand = (generic != candidate).then(|| candidate.to_owned());
                return ResolvedName::fuzzy(generic, brand);
            }
            return ResolvedName::fuzzy(candidate, None);
        }
    }

    ResolvedName::passthrough(cleaned)
}

/// Lowercase, strip punctuation, and collapse whitespace runs. Hyphens stay
/// because release suffixes need them; Arabic letters survive because they
/// are alphabetic.
fn clean(raw: &str) -> String {
    let lowered = raw.to_lowercase();
    let kept: String = lowered
        .chars()
        .filter(|ch| ch.is_alphanumeric() || ch.is_whitespace() || *ch == '-')
        .collect();
    kept.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Exact resolution of an already-cleaned term: brand table first, then a
/// membership check against the known-name universe so typing a generic
/// verbatim counts as exact rather than a lucky fuzzy hit.
fn exact_match(term: &str) -> Option<ResolvedName> {
    if let Some(generic) = generics::lookup(term) {
        let brand = (generic != term).then(|| term.to_owned());
        return Some(ResolvedName::exact(generic, brand));
    }
    if universe().binary_search(&term).is_ok() {
        return Some(ResolvedName::exact(term, None));
    }
    None
}

/// Every name the resolver can vouch for: English values of the Arabic
/// table plus brand keys and generic values. Sorted and deduplicated once
/// so fuzzy matching iterates a stable order.
fn universe() -> &'static [&'static str] {
    static UNIVERSE: OnceLock<Vec<&'static str>> = OnceLock::new();
    UNIVERSE
        .get_or_init(|| {
            let mut names: Vec<&'static str> = arabic::english_names()
                .chain(generics::known_names())
                .collect();
            names.sort_unstable();
            names.dedup();
            names
        })
        .as_slice()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn arabic_names_resolve_exactly() {
        let resolved = resolve("بانادول");
        assert_eq!(resolved.canonical, "paracetamol");
        assert_eq!(resolved.brand.as_deref(), Some("panadol"));
        assert_eq!(resolved.confidence, ResolveConfidence::Exact);

        let resolved = resolve("كلاريتين");
        assert_eq!(resolved.canonical, "loratadine");
        assert_eq!(resolved.brand.as_deref(), Some("claritin"));
        assert_eq!(resolved.confidence, ResolveConfidence::Exact);
    }

    #[test]
    fn diacritics_do_not_break_arabic_lookup() {
        let resolved = resolve("بَانَادُول");
        assert_eq!(resolved.canonical, "paracetamol");
        assert_eq!(resolved.confidence, ResolveConfidence::Exact);
    }

    #[test]
    fn definite_article_falls_back_to_bare_spelling() {
        // Not in the table with the article; the stripped retry finds it.
        let resolved = resolve("الكلاريتين");
        assert_eq!(resolved.canonical, "loratadine");
        assert_eq!(resolved.confidence, ResolveConfidence::Exact);
    }

    #[test]
    fn unknown_arabic_passes_through_normalized() {
        let resolved = resolve("دواء غير معروف");
        assert_eq!(resolved.confidence, ResolveConfidence::Unresolved);
        assert_eq!(resolved.canonical, "دواء غير معروف");
    }

    #[test]
    fn brand_names_substitute_their_generic() {
        let resolved = resolve("Lipitor");
        assert_eq!(resolved.canonical, "atorvastatin");
        assert_eq!(resolved.brand.as_deref(), Some("lipitor"));
        assert_eq!(resolved.confidence, ResolveConfidence::Exact);
    }

    #[test]
    fn known_generics_resolve_to_themselves() {
        let resolved = resolve("metformin");
        assert_eq!(resolved.canonical, "metformin");
        assert_eq!(resolved.brand, None);
        assert_eq!(resolved.confidence, ResolveConfidence::Exact);
    }

    #[test]
    fn strength_and_form_tokens_are_ignored() {
        let resolved = resolve("Panadol 500mg tablets");
        assert_eq!(resolved.canonical, "paracetamol");
        assert_eq!(resolved.brand.as_deref(), Some("panadol"));
        assert_eq!(resolved.confidence, ResolveConfidence::Exact);
    }

    #[test]
    fn release_suffixes_resolve_to_the_base_brand() {
        let resolved = resolve("Glucophage-XR");
        assert_eq!(resolved.canonical, "metformin");
        assert_eq!(resolved.confidence, ResolveConfidence::Exact);
    }

    #[test]
    fn close_typos_resolve_fuzzily() {
        let resolved = resolve("panadoll");
        assert_eq!(resolved.canonical, "paracetamol");
        assert_eq!(resolved.brand.as_deref(), Some("panadol"));
        assert_eq!(resolved.confidence, ResolveConfidence::Fuzzy);

        let resolved = resolve("aspirn");
        assert_eq!(resolved.canonical, "acetylsalicylic acid");
        assert_eq!(resolved.confidence, ResolveConfidence::Fuzzy);
    }

    #[test]
    fn unknown_names_pass_through_unresolved() {
        let resolved = resolve("notamedicine");
        assert_eq!(resolved.canonical, "notamedicine");
        assert_eq!(resolved.brand, None);
        assert_eq!(resolved.confidence, ResolveConfidence::Unresolved);
    }

    #[test]
    fn empty_input_passes_through() {
        let resolved = resolve("   ");
        assert_eq!(resolved.canonical, "");
        assert_eq!(resolved.confidence, ResolveConfidence::Unresolved);
    }

    #[test]
    fn resolution_is_idempotent() {
        for input in ["كلاريتين", "panadoll", "Lipitor", "totally unknown", "metformin"] {
            let first = resolve(input);
            let second = resolve(&first.canonical);
            assert_eq!(second.canonical, first.canonical, "input {input:?}");
        }
    }
}
