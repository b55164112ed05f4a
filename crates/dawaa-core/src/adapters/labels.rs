//! Offline label store as a usage source.
//!
//! Second link in the chain: label text previously ingested into the local
//! DuckDB store answers without any network traffic. An empty or unseeded
//! store is a normal miss, not a failure.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use dawaa_labelstore::LabelStore;

use crate::data_source::{SourceError, UsageSource};
use crate::domain::{ResolvedName, SourceId, UsageRecord};

pub struct LabelStoreSource {
    store: Arc<LabelStore>,
}

impl LabelStoreSource {
    pub fn new(store: Arc<LabelStore>) -> Self {
        Self { store }
    }
}

impl UsageSource for LabelStoreSource {
    fn id(&self) -> SourceId {
        SourceId::Labels
    }

    fn lookup<'a>(
        &'a self,
        name: &'a ResolvedName,
    ) -> Pin<Box<dyn Future<Output = Result<UsageRecord, SourceError>> + Send + 'a>> {
        Box::pin(async move {
            for term in name.terms() {
                match self.store.find_label(term) {
                    Ok(Some(label)) => {
                        let generic = if label.generic.trim().is_empty() {
                            name.canonical.clone()
                        } else {
                            label.generic
                        };
                        return Ok(UsageRecord {
                            brand: label.brand.or_else(|| name.brand.clone()),
                            generic,
                            indications: label.indications,
                            contraindications: label.contraindications,
                            ingredients: label.ingredients,
                            source: SourceId::Labels,
                        });
                    }
                    Ok(None) => {}
                    Err(error) => {
                        return Err(SourceError::internal(format!(
                            "label store query failed: {error}"
                        )))
                    }
                }
            }

            Err(SourceError::not_found(format!(
                "no stored label for '{}'",
                name.canonical
            )))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dawaa_labelstore::{LabelRecord, LabelStoreConfig};
    use tempfile::tempdir;

    fn seeded_store(dir: &std::path::Path) -> Arc<LabelStore> {
        let config = LabelStoreConfig {
            dawaa_home: dir.to_path_buf(),
            db_path: dir.join("labels.duckdb"),
            max_pool_size: 2,
        };
        let store = LabelStore::open(config).expect("open store");
        store.initialize().expect("initialize store");
        store
            .ingest_labels(
                "test-request-1",
                &[LabelRecord {
                    setid: String::from("setid-loratadine-1"),
                    brand: Some(String::from("Claritine")),
                    generic: String::from("loratadine"),
                    indications: String::from(
                        "Relief of symptoms associated with allergic rhinitis such as sneezing, nasal discharge and itching.",
                    ),
                    contraindications: String::from(
                        "Hypersensitivity to loratadine or any component of the formulation.",
                    ),
                    ingredients: String::from("loratadine 10 mg"),
                }],
            )
            .expect("ingest label");
        Arc::new(store)
    }

    #[tokio::test]
    async fn answers_from_ingested_labels() {
        let dir = tempdir().expect("tempdir");
        let source = LabelStoreSource::new(seeded_store(dir.path()));
        let name = crate::resolver::resolve("loratadine");

        let record = source.lookup(&name).await.expect("label hit");
        assert_eq!(record.source, SourceId::Labels);
        assert_eq!(record.generic, "loratadine");
        assert_eq!(record.brand.as_deref(), Some("Claritine"));
        assert!(record.is_acceptable());
    }

    #[tokio::test]
    async fn empty_store_is_a_miss_not_an_error() {
        let dir = tempdir().expect("tempdir");
        let config = LabelStoreConfig {
            dawaa_home: dir.path().to_path_buf(),
            db_path: dir.path().join("labels.duckdb"),
            max_pool_size: 2,
        };
        let store = LabelStore::open(config).expect("open store");
        store.initialize().expect("initialize store");

        let source = LabelStoreSource::new(Arc::new(store));
        let name = crate::resolver::resolve("metformin");

        let error = source.lookup(&name).await.expect_err("miss");
        assert_eq!(error.code(), "source.not_found");
    }
}
