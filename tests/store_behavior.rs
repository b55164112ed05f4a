use std::sync::Arc;

use dawaa_core::{
    adapters::LabelStoreSource, routing::UsageRouter, MedicineQuery, SourceId,
};
use dawaa_labelstore::{
    LabelRecord, LabelStore, LabelStoreConfig, MedicineRecord, QueryGuardrails, StoreError,
};
use tempfile::tempdir;

fn open_temp_store(temp: &tempfile::TempDir) -> LabelStore {
    let dawaa_home = temp.path().join("dawaa-home");
    let db_path = dawaa_home.join("store").join("labels.duckdb");
    LabelStore::open(LabelStoreConfig {
        dawaa_home,
        db_path,
        max_pool_size: 2,
    })
    .expect("store open")
}

fn loratadine_label() -> LabelRecord {
    LabelRecord {
        setid: String::from("set-loratadine-1"),
        brand: Some(String::from("Claritine")),
        generic: String::from("loratadine"),
        indications: String::from(
            "Relief of nasal and non-nasal symptoms of seasonal allergic rhinitis.",
        ),
        contraindications: String::from("Hypersensitivity to loratadine."),
        ingredients: String::from("loratadine 10mg"),
    }
}

fn medicine(trade_name: &str, external_id: Option<&str>) -> MedicineRecord {
    MedicineRecord {
        trade_name: trade_name.to_string(),
        generic_name: None,
        reg_no: None,
        applicant: None,
        price: None,
        currency: String::from("EGP"),
        external_id: external_id.map(ToString::to_string),
        last_updated: None,
        source: Some(String::from("test")),
    }
}

#[tokio::test]
async fn test_ingested_labels_match_generic_and_brand() {
    let temp = tempdir().expect("tempdir");
    let store = open_temp_store(&temp);

    let ingested = store
        .ingest_labels("req-ingest-0001", &[loratadine_label()])
        .expect("ingest");
    assert_eq!(ingested, 1);

    let by_generic = store
        .find_label("loratadine")
        .expect("query")
        .expect("generic match");
    assert_eq!(by_generic.setid, "set-loratadine-1");

    let by_brand = store
        .find_label("clarit")
        .expect("query")
        .expect("brand substring match");
    assert_eq!(by_brand.generic, "loratadine");

    assert!(store.find_label("warfarin").expect("query").is_none());
}

#[tokio::test]
async fn test_label_store_answers_through_the_router() {
    let temp = tempdir().expect("tempdir");
    let store = Arc::new(open_temp_store(&temp));
    store
        .ingest_labels("req-ingest-0002", &[loratadine_label()])
        .expect("ingest");

    let router = UsageRouter::new(vec![Arc::new(LabelStoreSource::new(store))]);
    let query = MedicineQuery::new("claritin").expect("valid query");

    let route = router.fetch_usage(&query).await.expect("label store answer");
    assert_eq!(route.selected_source, SourceId::Labels);
    assert_eq!(route.data.generic, "loratadine");
    assert!(route.data.is_acceptable());
}

#[tokio::test]
async fn test_write_statements_require_the_write_flag() {
    let temp = tempdir().expect("tempdir");
    let store = open_temp_store(&temp);

    let denied = store
        .execute_query(
            "DELETE FROM labels",
            QueryGuardrails::default(),
            false,
        )
        .expect_err("read-only mode must reject writes");
    assert!(matches!(denied, StoreError::QueryRejected(_)));

    store
        .execute_query("DELETE FROM labels", QueryGuardrails::default(), true)
        .expect("write mode accepts the statement");
}

#[tokio::test]
async fn test_row_guardrail_truncates_results() {
    let temp = tempdir().expect("tempdir");
    let store = open_temp_store(&temp);

    let rows: Vec<LabelRecord> = (0..5)
        .map(|index| LabelRecord {
            setid: format!("set-{index}"),
            ..loratadine_label()
        })
        .collect();
    store.ingest_labels("req-ingest-0003", &rows).expect("ingest");

    let result = store
        .execute_query(
            "SELECT setid FROM labels ORDER BY setid",
            QueryGuardrails {
                max_rows: 2,
                ..QueryGuardrails::default()
            },
            false,
        )
        .expect("query");

    assert_eq!(result.row_count, 2);
    assert!(result.truncated);
}

#[tokio::test]
async fn test_refresh_targets_need_a_directory_id() {
    let temp = tempdir().expect("tempdir");
    let store = open_temp_store(&temp);

    store
        .upsert_medicines(&[
            medicine("Panadol Extra", Some("9001")),
            medicine("Untracked Syrup", None),
        ])
        .expect("upsert");

    let targets = store.medicines_for_refresh().expect("targets");
    assert_eq!(targets.len(), 1);
    assert_eq!(targets[0].trade_name, "Panadol Extra");
    assert_eq!(targets[0].external_id.as_deref(), Some("9001"));
}

#[tokio::test]
async fn test_recorded_prices_land_on_the_tracked_row() {
    let temp = tempdir().expect("tempdir");
    let store = open_temp_store(&temp);

    store
        .upsert_medicines(&[medicine("Panadol Extra", Some("9001"))])
        .expect("upsert");
    store
        .record_price("Panadol Extra", 48.0, "EGP")
        .expect("price update");

    let result = store
        .execute_query(
            "SELECT price, currency FROM medicines WHERE trade_name = 'Panadol Extra'",
            QueryGuardrails::default(),
            false,
        )
        .expect("query");

    assert_eq!(result.row_count, 1);
    assert_eq!(result.rows[0][0], serde_json::json!(48.0));
    assert_eq!(result.rows[0][1], serde_json::json!("EGP"));
}

#[tokio::test]
async fn test_audit_rows_carry_the_request_id() {
    let temp = tempdir().expect("tempdir");
    let store = open_temp_store(&temp);

    store
        .log_refresh("req-audit-0001", "panadol", "prices", "ok", Some(120))
        .expect("audit insert");
    store
        .log_refresh("req-audit-0001", "rivo", "prices", "miss", None)
        .expect("audit insert");

    let result = store
        .execute_query(
            "SELECT name, status FROM refresh_log \
             WHERE request_id = 'req-audit-0001' ORDER BY name",
            QueryGuardrails::default(),
            false,
        )
        .expect("query");

    assert_eq!(result.row_count, 2);
    assert_eq!(result.rows[0][0], serde_json::json!("panadol"));
    assert_eq!(result.rows[1][1], serde_json::json!("miss"));
}
