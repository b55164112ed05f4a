//! Arabic medicine-name handling: script detection, normalization, and the
//! static Arabic-to-English table.

use std::collections::HashMap;
use std::sync::OnceLock;

/// Static Arabic-to-English name table. Most entries carry a second spelling
/// with the definite article ("ال") because that is how customers type them.
/// Values are the English names customers know, which may themselves be brand
/// names that the generic table maps further.
const ARABIC_TO_ENGLISH: &[(&str, &str)] = &[
    ("كلاريتين", "claritin"),
    ("بانادول", "panadol"),
    ("البانادول", "panadol"),
    ("ريفو", "rivo"),
    ("الريفو", "rivo"),
    ("فولتارين", "voltaren"),
    ("الفولتارين", "voltaren"),
    ("كونكور", "concor"),
    ("الكونكور", "concor"),
    ("ليبيتور", "lipitor"),
    ("الليبيتور", "lipitor"),
    ("أوجمنتين", "augmentin"),
    ("الأوجمنتين", "augmentin"),
    ("أموكسيسيلين", "amoxicillin"),
    ("الأموكسيسيلين", "amoxicillin"),
    ("لوراتادين", "loratadine"),
    ("اللوراتادين", "loratadine"),
    ("أليجرا", "allegra"),
    ("الأليجرا", "allegra"),
    ("زيرتيك", "zyrtec"),
    ("الزيرتيك", "zyrtec"),
    ("بينادريل", "benadryl"),
    ("البينادريل", "benadryl"),
    ("أسبيرين", "aspirin"),
    ("الأسبيرين", "aspirin"),
    ("أيبوبروفين", "ibuprofen"),
    ("الأيبوبروفين", "ibuprofen"),
    ("أزيثروميسين", "azithromycin"),
    ("الأزيثروميسين", "azithromycin"),
    ("ديكلوفيناك", "diclofenac"),
    ("الديكلوفيناك", "diclofenac"),
    ("سيتريزين", "cetirizine"),
    ("السيتريزين", "cetirizine"),
    ("أوميبرازول", "omeprazole"),
    ("الأوميبرازول", "omeprazole"),
    ("ميتفورمين", "metformin"),
    ("الميتفورمين", "metformin"),
    ("بروزاك", "prozac"),
    ("البروزاك", "prozac"),
    ("بروتاسي", "protasi"),
    ("جروزا", "groza"),
    ("بروماكس", "promax"),
    ("جروزاكس", "grozax"),
];

/// Arabic definite article prefix.
const DEFINITE_ARTICLE: &str = "ال";

fn table() -> &'static HashMap<&'static str, &'static str> {
    static TABLE: OnceLock<HashMap<&'static str, &'static str>> = OnceLock::new();
    TABLE.get_or_init(|| ARABIC_TO_ENGLISH.iter().copied().collect())
}

/// Whether the text contains any Arabic letter.
#[must_use]
pub fn contains_arabic(text: &str) -> bool {
    text.chars()
        .any(|ch| ('\u{0621}'..='\u{064A}').contains(&ch))
}

/// Normalize Arabic input: collapse whitespace runs and strip the harakat
/// diacritics (U+064B..=U+065F) and the dagger alif (U+0670), which vary
/// freely in typed input but never distinguish medicine names.
#[must_use]
pub fn normalize(text: &str) -> String {
    let stripped: String = text
        .chars()
        .filter(|ch| !('\u{064B}'..='\u{065F}').contains(ch) && *ch != '\u{0670}')
        .collect();
    stripped.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Look up a normalized Arabic name. On a miss with the definite article
/// present, retries with the article stripped so spellings absent from the
/// table in article form still resolve.
#[must_use]
pub fn lookup(normalized: &str) -> Option<&'static str> {
    if let Some(english) = table().get(normalized) {
        return Some(english);
    }
    normalized
        .strip_prefix(DEFINITE_ARTICLE)
        .and_then(|bare| table().get(bare).copied())
}

/// All English names the table maps to, for the fuzzy candidate universe.
pub fn english_names() -> impl Iterator<Item = &'static str> {
    ARABIC_TO_ENGLISH.iter().map(|(_, english)| *english)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_arabic_script() {
        assert!(contains_arabic("بانادول"));
        assert!(contains_arabic("panadol بانادول"));
        assert!(!contains_arabic("panadol"));
        assert!(!contains_arabic("123"));
    }

    #[test]
    fn strips_diacritics_and_collapses_whitespace() {
        // The same word with fatha and shadda marks inserted.
        assert_eq!(normalize("بَانَادُول"), "بانادول");
        assert_eq!(normalize("  بانادول   اكسترا "), "بانادول اكسترا");
    }

    #[test]
    fn looks_up_bare_and_article_forms() {
        assert_eq!(lookup("كلاريتين"), Some("claritin"));
        assert_eq!(lookup("البانادول"), Some("panadol"));
        // No article entry exists for this spelling; the strip retry covers it.
        assert_eq!(lookup("البروتاسي"), Some("protasi"));
        assert_eq!(lookup("دواء غير معروف"), None);
    }

    #[test]
    fn every_table_entry_resolves() {
        for (arabic, english) in ARABIC_TO_ENGLISH {
            assert_eq!(lookup(arabic), Some(*english), "entry {arabic}");
        }
    }
}
