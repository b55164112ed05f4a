//! Hand-verified usage texts, the first link in the fallback chain.
//!
//! Entries were written against published prescribing information and
//! reviewed by a pharmacist, so a hit here is ground truth and ends the
//! chain before any network call happens.

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::OnceLock;

use crate::data_source::{SourceError, UsageSource};
use crate::domain::{ResolvedName, SourceId, UsageRecord};

const CURATED_USES: &[(&str, &str)] = &[
    // Diabetes medications
    (
        "ozempic",
        "Ozempic (semaglutide) is used to improve blood sugar control in adults with type 2 diabetes mellitus. It is also used for chronic weight management in certain adults, in combination with diet and exercise.",
    ),
    (
        "semaglutide",
        "Semaglutide is used to improve blood sugar control in adults with type 2 diabetes mellitus. It is also used for chronic weight management in certain adults, in combination with diet and exercise.",
    ),
    (
        "humalog",
        "Humalog (insulin lispro) is a rapid-acting insulin used to control high blood sugar in people with diabetes. It works by helping glucose get into cells to be used for energy.",
    ),
    (
        "insulin lispro",
        "Insulin lispro is a rapid-acting insulin used to control high blood sugar in people with diabetes. It works by helping glucose get into cells to be used for energy.",
    ),
    (
        "lantus",
        "Lantus (insulin glargine) is a long-acting insulin used to control high blood sugar in people with diabetes. It provides a steady level of insulin throughout the day.",
    ),
    (
        "insulin glargine",
        "Insulin glargine is a long-acting insulin used to control high blood sugar in people with diabetes. It provides a steady level of insulin throughout the day.",
    ),
    (
        "metformin",
        "Metformin is used to treat type 2 diabetes. It works by improving the body's response to insulin and reducing the amount of glucose produced by the liver.",
    ),
    // Antidepressants
    (
        "prozac",
        "Prozac (fluoxetine) is used to treat depression, obsessive-compulsive disorder, panic disorder, and bulimia nervosa. It belongs to a class of medications called selective serotonin reuptake inhibitors (SSRIs).",
    ),
    (
        "fluoxetine",
        "Fluoxetine is used to treat depression, obsessive-compulsive disorder, panic disorder, and bulimia nervosa. It belongs to a class of medications called selective serotonin reuptake inhibitors (SSRIs).",
    ),
    (
        "zoloft",
        "Zoloft (sertraline) is used to treat depression, obsessive-compulsive disorder, panic disorder, post-traumatic stress disorder, and social anxiety disorder. It belongs to a class of medications called selective serotonin reuptake inhibitors (SSRIs).",
    ),
    (
        "sertraline",
        "Sertraline is used to treat depression, obsessive-compulsive disorder, panic disorder, post-traumatic stress disorder, and social anxiety disorder. It belongs to a class of medications called selective serotonin reuptake inhibitors (SSRIs).",
    ),
    // Pain relievers
    (
        "panadol",
        "Panadol (paracetamol/acetaminophen) is used to reduce fever and treat pain such as headache, toothache, back pain, arthritis, menstrual cramps, or minor injury.",
    ),
    (
        "paracetamol",
        "Paracetamol (acetaminophen) is used to reduce fever and treat pain such as headache, toothache, back pain, arthritis, menstrual cramps, or minor injury.",
    ),
    (
        "acetaminophen",
        "Acetaminophen (paracetamol) is used to reduce fever and treat pain such as headache, toothache, back pain, arthritis, menstrual cramps, or minor injury.",
    ),
    (
        "ibuprofen",
        "Ibuprofen is used to reduce fever and treat pain or inflammation caused by many conditions such as headache, toothache, back pain, arthritis, menstrual cramps, or minor injury.",
    ),
    (
        "aspirin",
        "Aspirin is used to reduce fever and relieve mild to moderate pain from conditions such as muscle aches, toothaches, common cold, and headaches. It is also used to prevent heart attacks and strokes.",
    ),
    // Antihistamines
    (
        "claritine",
        "Claritine (loratadine) is used to relieve allergy symptoms such as watery eyes, runny nose, itching eyes/nose, and sneezing. It is an antihistamine that works by blocking histamine, a substance in the body that causes allergic symptoms.",
    ),
    (
        "loratadine",
        "Loratadine is used to relieve allergy symptoms such as watery eyes, runny nose, itching eyes/nose, and sneezing. It is an antihistamine that works by blocking histamine, a substance in the body that causes allergic symptoms.",
    ),
    (
        "allegra",
        "Allegra (fexofenadine) is used to relieve allergy symptoms such as watery eyes, runny nose, itching eyes/nose, and sneezing. It is an antihistamine that works by blocking histamine, a substance in the body that causes allergic symptoms.",
    ),
    (
        "fexofenadine",
        "Fexofenadine is used to relieve allergy symptoms such as watery eyes, runny nose, itching eyes/nose, and sneezing. It is an antihistamine that works by blocking histamine, a substance in the body that causes allergic symptoms.",
    ),
    // Blood thinners
    (
        "rivo",
        "Rivo (rivaroxaban) is used to prevent blood clots and stroke in people with atrial fibrillation. It is also used to treat and prevent deep vein thrombosis and pulmonary embolism.",
    ),
    (
        "rivaroxaban",
        "Rivaroxaban is used to prevent blood clots and stroke in people with atrial fibrillation. It is also used to treat and prevent deep vein thrombosis and pulmonary embolism.",
    ),
    (
        "xarelto",
        "Xarelto (rivaroxaban) is used to prevent blood clots and stroke in people with atrial fibrillation. It is also used to treat and prevent deep vein thrombosis and pulmonary embolism.",
    ),
    // Cholesterol medications
    (
        "lipitor",
        "Lipitor (atorvastatin) is used to lower cholesterol and triglycerides in the blood. It is also used to prevent heart disease and stroke in certain people.",
    ),
    (
        "atorvastatin",
        "Atorvastatin is used to lower cholesterol and triglycerides in the blood. It is also used to prevent heart disease and stroke in certain people.",
    ),
    // Anti-inflammatory
    (
        "voltaren",
        "Voltaren (diclofenac) is used to reduce pain, swelling, and joint stiffness caused by arthritis. It is a nonsteroidal anti-inflammatory drug (NSAID) that works by blocking the production of certain natural substances that cause inflammation.",
    ),
    (
        "diclofenac",
        "Diclofenac is used to reduce pain, swelling, and joint stiffness caused by arthritis. It is a nonsteroidal anti-inflammatory drug (NSAID) that works by blocking the production of certain natural substances that cause inflammation.",
    ),
    // Antibiotics
    (
        "augmentin",
        "Augmentin (amoxicillin/clavulanate) is used to treat bacterial infections such as sinusitis, pneumonia, ear infections, bronchitis, urinary tract infections, and skin infections.",
    ),
    (
        "amoxicillin",
        "Amoxicillin is used to treat bacterial infections such as sinusitis, pneumonia, ear infections, bronchitis, urinary tract infections, and skin infections.",
    ),
    (
        "azithromycin",
        "Azithromycin is used to treat bacterial infections such as respiratory infections, skin infections, ear infections, and sexually transmitted diseases.",
    ),
];

/// Substring fallback needs this many characters before it may fire; short
/// fragments are substrings of half the table.
const MIN_SUBSTRING_LEN: usize = 4;

fn table() -> &'static HashMap<&'static str, &'static str> {
    static TABLE: OnceLock<HashMap<&'static str, &'static str>> = OnceLock::new();
    TABLE.get_or_init(|| CURATED_USES.iter().copied().collect())
}

/// In-process curated source. Always healthy, never throttled.
#[derive(Debug, Default, Clone, Copy)]
pub struct CuratedSource;

impl CuratedSource {
    pub fn new() -> Self {
        Self
    }

    fn find(term: &str) -> Option<&'static str> {
        if let Some(text) = table().get(term) {
            return Some(text);
        }

        if term.len() < MIN_SUBSTRING_LEN {
            return None;
        }

        // Declaration order, not map order, keeps the fallback deterministic.
        CURATED_USES
            .iter()
            .find(|(key, _)| term.contains(key) || key.contains(term))
            .map(|(_, text)| *text)
    }
}

impl UsageSource for CuratedSource {
    fn id(&self) -> SourceId {
        SourceId::Curated
    }

    fn lookup<'a>(
        &'a self,
        name: &'a ResolvedName,
    ) -> Pin<Box<dyn Future<Output = Result<UsageRecord, SourceError>> + Send + 'a>> {
        Box::pin(async move {
            for term in name.terms() {
                if let Some(text) = Self::find(term) {
                    return Ok(UsageRecord {
                        brand: name.brand.clone(),
                        generic: name.canonical.clone(),
                        indications: text.to_owned(),
                        contraindications: String::new(),
                        ingredients: String::new(),
                        source: SourceId::Curated,
                    });
                }
            }

            Err(SourceError::not_found(format!(
                "no curated entry for '{}'",
                name.canonical
            )))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ResolvedName;
    use crate::resolver;

    #[tokio::test]
    async fn resolves_arabic_input_to_a_curated_text() {
        let source = CuratedSource::new();
        let name = resolver::resolve("كلاريتين");

        let record = source.lookup(&name).await.expect("curated hit");
        assert_eq!(record.source, SourceId::Curated);
        assert_eq!(record.generic, "loratadine");
        assert!(record.indications.contains("allergy symptoms"));
        assert!(record.is_acceptable());
    }

    #[tokio::test]
    async fn brand_term_rescues_a_substituted_generic() {
        // "aspirin" canonicalizes to acetylsalicylic acid, which the table
        // does not key; the preserved brand term still hits.
        let source = CuratedSource::new();
        let name = resolver::resolve("aspirin");
        assert_eq!(name.canonical, "acetylsalicylic acid");

        let record = source.lookup(&name).await.expect("curated hit");
        assert!(record.indications.starts_with("Aspirin"));
    }

    #[tokio::test]
    async fn longer_phrasings_match_by_substring() {
        let source = CuratedSource::new();
        let name = resolver::resolve("metformin hydrochloride");

        let record = source.lookup(&name).await.expect("substring hit");
        assert!(record.indications.contains("type 2 diabetes"));
    }

    #[tokio::test]
    async fn unknown_names_are_not_found() {
        let source = CuratedSource::new();
        let name = resolver::resolve("notamedicine");

        let error = source.lookup(&name).await.expect_err("miss");
        assert_eq!(error.code(), "source.not_found");
        assert!(!error.retryable());
    }

    #[tokio::test]
    async fn short_fragments_do_not_substring_match() {
        // "tin" is a substring of the claritine entry; the length guard
        // keeps it from matching.
        let source = CuratedSource::new();
        let name = ResolvedName::passthrough("tin");

        let error = source.lookup(&name).await.expect_err("miss");
        assert_eq!(error.code(), "source.not_found");
    }
}
