//! Static brand-to-generic mapping and dosage-text cleanup.

use std::collections::HashMap;
use std::sync::OnceLock;

/// Trade names mapped to the generic (active ingredient) name queried
/// against the information sources. Identity entries mark names that are
/// already generic so callers can tell "known generic" from "unknown".
const BRAND_TO_GENERIC: &[(&str, &str)] = &[
    // Pain relievers
    ("panadol", "paracetamol"),
    ("tylenol", "paracetamol"),
    ("acetaminophen", "paracetamol"),
    ("advil", "ibuprofen"),
    ("motrin", "ibuprofen"),
    ("aspirin", "acetylsalicylic acid"),
    // Cholesterol
    ("lipitor", "atorvastatin"),
    ("zocor", "simvastatin"),
    ("crestor", "rosuvastatin"),
    // Anticoagulants
    ("plavix", "clopidogrel"),
    ("rivo", "rivaroxaban"),
    ("xarelto", "rivaroxaban"),
    ("eliquis", "apixaban"),
    ("pradaxa", "dabigatran"),
    ("warfarin", "warfarin"),
    ("coumadin", "warfarin"),
    // Antidepressants
    ("zoloft", "sertraline"),
    ("prozac", "fluoxetine"),
    ("protasi", "fluoxetine"),
    ("groza", "fluoxetine"),
    ("promax", "fluoxetine"),
    ("grozax", "fluoxetine"),
    ("paxil", "paroxetine"),
    ("celexa", "citalopram"),
    ("lexapro", "escitalopram"),
    ("wellbutrin", "bupropion"),
    ("effexor", "venlafaxine"),
    ("cymbalta", "duloxetine"),
    // Antipsychotics
    ("zyprexa", "olanzapine"),
    ("abilify", "aripiprazole"),
    ("risperdal", "risperidone"),
    ("seroquel", "quetiapine"),
    ("geodon", "ziprasidone"),
    ("invega", "paliperidone"),
    ("latuda", "lurasidone"),
    ("rexulti", "brexpiprazole"),
    ("vraylar", "cariprazine"),
    ("fanapt", "iloperidone"),
    ("saphris", "asenapine"),
    // Antihistamines
    ("claritine", "loratadine"),
    ("claritin", "loratadine"),
    ("claratyne", "loratadine"),
    ("allegra", "fexofenadine"),
    ("zyrtec", "cetirizine"),
    ("benadryl", "diphenhydramine"),
    // Proton pump inhibitors
    ("prilosec", "omeprazole"),
    ("nexium", "esomeprazole"),
    ("prevacid", "lansoprazole"),
    ("protonix", "pantoprazole"),
    ("aciphex", "rabeprazole"),
    // Diabetes
    ("glucophage", "metformin"),
    ("januvia", "sitagliptin"),
    ("actos", "pioglitazone"),
    ("avandia", "rosiglitazone"),
    ("ozempic", "semaglutide"),
    ("humalog", "insulin lispro"),
    ("lantus", "insulin glargine"),
    ("novolog", "insulin aspart"),
    ("levemir", "insulin detemir"),
    ("tresiba", "insulin degludec"),
    // Blood pressure
    ("lisinopril", "lisinopril"),
    ("amlodipine", "amlodipine"),
    ("metoprolol", "metoprolol"),
    ("atenolol", "atenolol"),
    ("losartan", "losartan"),
    ("valsartan", "valsartan"),
    // Antibiotics
    ("augmentin", "amoxicillin"),
    ("amoxicillin", "amoxicillin"),
    ("azithromycin", "azithromycin"),
    ("cipro", "ciprofloxacin"),
    ("levaquin", "levofloxacin"),
    // Anti-inflammatory
    ("voltaren", "diclofenac"),
    ("celebrex", "celecoxib"),
    ("mobic", "meloxicam"),
];

/// Extended-release and orally-disintegrating marketing suffixes that hide
/// the base brand name.
const RELEASE_SUFFIXES: &[&str] = &[
    "-xr", "-er", "-sr", "-cr", "-odt", "-dt", "-or", "-ir", "-xl",
];

/// Tokens that describe a pharmaceutical form rather than a name.
const FORM_WORDS: &[&str] = &[
    "tablet",
    "tablets",
    "tab",
    "tabs",
    "capsule",
    "capsules",
    "cap",
    "caps",
    "syrup",
    "suspension",
    "cream",
    "gel",
    "ointment",
    "drops",
    "spray",
    "injection",
    "ampoule",
    "ampoules",
    "vial",
    "vials",
    "suppository",
    "suppositories",
    "sachet",
    "sachets",
];

/// Dose units that follow or fuse with a strength number.
const DOSE_UNITS: &[&str] = &["mg", "ml", "g", "mcg", "iu", "units"];

fn table() -> &'static HashMap<&'static str, &'static str> {
    static TABLE: OnceLock<HashMap<&'static str, &'static str>> = OnceLock::new();
    TABLE.get_or_init(|| BRAND_TO_GENERIC.iter().copied().collect())
}

/// Map a lowercased name to its generic. On a miss, retries with a known
/// release suffix stripped ("glucophage-xr" resolves like "glucophage").
#[must_use]
pub fn lookup(name: &str) -> Option<&'static str> {
    if let Some(generic) = table().get(name) {
        return Some(generic);
    }

    for suffix in RELEASE_SUFFIXES {
        if let Some(base) = name.strip_suffix(suffix) {
            if let Some(generic) = table().get(base) {
                return Some(generic);
            }
        }
    }

    None
}

/// Drop strength, form, and pack-count tokens from a lowercased name:
/// "panadol 500mg tablets" becomes "panadol". Name tokens are kept in order;
/// an input made entirely of dosage tokens collapses to an empty string and
/// callers fall back to the uncleaned text.
#[must_use]
pub fn strip_dosage_tokens(name: &str) -> String {
    name.split_whitespace()
        .filter(|token| !is_dosage_token(token))
        .collect::<Vec<_>>()
        .join(" ")
}

fn is_dosage_token(token: &str) -> bool {
    if token.chars().all(|ch| ch.is_ascii_digit() || ch == '.') {
        return true;
    }
    if DOSE_UNITS.contains(&token) {
        return true;
    }
    if FORM_WORDS.contains(&token) {
        return true;
    }

    // Fused strength tokens such as "500mg" or "2.5ml".
    let digits_end = token
        .char_indices()
        .take_while(|(_, ch)| ch.is_ascii_digit() || *ch == '.')
        .count();
    if digits_end > 0 {
        let unit = &token[digits_end..];
        return DOSE_UNITS.contains(&unit);
    }

    false
}

/// Brand keys and generic values, for the fuzzy candidate universe.
pub fn known_names() -> impl Iterator<Item = &'static str> {
    BRAND_TO_GENERIC
        .iter()
        .flat_map(|(brand, generic)| [*brand, *generic])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_brands_to_generics() {
        assert_eq!(lookup("claritin"), Some("loratadine"));
        assert_eq!(lookup("panadol"), Some("paracetamol"));
        assert_eq!(lookup("aspirin"), Some("acetylsalicylic acid"));
        assert_eq!(lookup("concor"), None);
    }

    #[test]
    fn strips_release_suffixes() {
        assert_eq!(lookup("glucophage-xr"), Some("metformin"));
        assert_eq!(lookup("effexor-xr"), Some("venlafaxine"));
        assert_eq!(lookup("unknownol-xr"), None);
    }

    #[test]
    fn strips_strength_and_form_tokens() {
        assert_eq!(strip_dosage_tokens("panadol 500mg tablets"), "panadol");
        assert_eq!(strip_dosage_tokens("voltaren 50 mg"), "voltaren");
        assert_eq!(strip_dosage_tokens("amoxicillin 250 mg capsules"), "amoxicillin");
        assert_eq!(strip_dosage_tokens("insulin glargine"), "insulin glargine");
        assert_eq!(strip_dosage_tokens("500mg"), "");
    }
}
