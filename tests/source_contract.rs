use std::sync::Arc;

use dawaa_core::{
    adapters::{CuratedSource, DailymedSource, OpenFdaSource, PriceDirectory, RxnavSource},
    data_source::{HealthState, SourceErrorKind, UsageSource},
    resolver::resolve,
    MedicineQuery, ResolveConfidence, SourceId, UsageRecord,
};

#[tokio::test]
async fn test_curated_source_contract() {
    let source = Arc::new(CuratedSource::new());
    assert_eq!(source.id(), SourceId::Curated);
    assert_eq!(source.health(), HealthState::Healthy);
    assert!(source.rate_available());
}

#[tokio::test]
async fn test_rxnav_adapter_contract() {
    let source = Arc::new(RxnavSource::new());
    assert_eq!(source.id(), SourceId::Rxnav);
    assert_eq!(source.health(), HealthState::Healthy);
    assert!(source.rate_available());
}

#[tokio::test]
async fn test_openfda_adapter_contract() {
    let source = Arc::new(OpenFdaSource::new());
    assert_eq!(source.id(), SourceId::Openfda);
    assert_eq!(source.health(), HealthState::Healthy);
    assert!(source.rate_available());
}

#[tokio::test]
async fn test_dailymed_adapter_contract() {
    let source = Arc::new(DailymedSource::new());
    assert_eq!(source.id(), SourceId::Dailymed);
    assert_eq!(source.health(), HealthState::Healthy);
    assert!(source.rate_available());
}

#[tokio::test]
async fn test_price_directory_starts_healthy() {
    let directory = PriceDirectory::new();
    assert_eq!(directory.health(), HealthState::Healthy);
    assert!(directory.rate_available());
}

#[test]
fn test_arabic_table_names_resolve_exactly() {
    let resolved = resolve("بانادول");
    assert_eq!(resolved.canonical, "paracetamol");
    assert_eq!(resolved.confidence, ResolveConfidence::Exact);

    let resolved = resolve("كلاريتين");
    assert_eq!(resolved.canonical, "loratadine");
    assert_eq!(resolved.confidence, ResolveConfidence::Exact);
}

#[test]
fn test_garbage_input_passes_through_unchanged() {
    let resolved = resolve("xyzzynonexistent123");
    assert_eq!(resolved.canonical, "xyzzynonexistent123");
    assert_eq!(resolved.brand, None);
    assert_eq!(resolved.confidence, ResolveConfidence::Unresolved);
}

#[test]
fn test_placeholder_only_record_is_not_acceptable() {
    let record = UsageRecord {
        brand: None,
        generic: String::from("whatever"),
        indications: String::from("not available"),
        contraindications: String::new(),
        ingredients: String::from("  "),
        source: SourceId::Rxnav,
    };
    assert!(!record.is_acceptable());

    let record = UsageRecord {
        indications: String::from(
            "Used for the relief of mild to moderate pain and the reduction of fever in adults.",
        ),
        ..record
    };
    assert!(record.is_acceptable());
}

#[tokio::test]
async fn test_curated_lookup_answers_arabic_claritin() {
    let source = CuratedSource::new();
    let resolved = resolve("كلاريتين");

    let record = source
        .lookup(&resolved)
        .await
        .expect("curated entry for loratadine");
    assert_eq!(record.generic, "loratadine");
    assert_eq!(record.source, SourceId::Curated);
    assert!(record.is_acceptable());
}

#[tokio::test]
async fn test_curated_miss_is_not_found() {
    let source = CuratedSource::new();
    let resolved = resolve("xyzzynonexistent123");

    let error = source
        .lookup(&resolved)
        .await
        .expect_err("no curated entry for garbage");
    assert_eq!(error.kind(), SourceErrorKind::NotFound);
}

#[tokio::test]
async fn test_sample_mode_lookup_is_deterministic() {
    let source = RxnavSource::new();
    let resolved = resolve("metformin");

    let first = source.lookup(&resolved).await.expect("sample record");
    let second = source.lookup(&resolved).await.expect("sample record");
    assert_eq!(first, second);
    assert_eq!(first.generic, "metformin");
    assert_eq!(first.source, SourceId::Rxnav);
}

#[test]
fn test_blank_queries_are_rejected() {
    assert!(MedicineQuery::new("   ").is_err());
    assert!(MedicineQuery::new("aspirin").is_ok());
}
