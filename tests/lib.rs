// Test library for source contract and fallback behavior tests
pub use dawaa_core::{
    adapters::{
        CuratedSource, DailymedSource, LabelStoreSource, OpenFdaSource, PriceDirectory,
        RxnavSource,
    },
    data_source::{HealthState, SourceError, SourceErrorKind, UsageSource},
    resolver::resolve,
    routing::{SourceStrategy, UsageRouter, UsageRouterBuilder, DEFAULT_CHAIN},
    MedicineQuery, ResolveConfidence, ResolvedName, SourceId, UsageRecord,
};
pub use dawaa_labelstore::{LabelRecord, LabelStore, LabelStoreConfig, QueryGuardrails};
pub use std::sync::Arc;
