pub mod models;
pub mod quality;

pub use models::{
    MedicineQuery, PriceQuote, ResolveConfidence, ResolvedName, SourceId, UsageRecord,
};
