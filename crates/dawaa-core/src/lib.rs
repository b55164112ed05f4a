//! # Dawaa Core
//!
//! Core contracts and domain types for the dawaa pharmacy-information toolkit.
//!
//! ## Overview
//!
//! This crate provides the foundational components for dawaa:
//!
//! - **Canonical domain models** for medicine queries, resolved names, usage
//!   records, and price quotes
//! - **Name resolution** from Arabic or brand spellings to generic names
//! - **Source identifiers** for the multi-source fallback chain
//! - **Response envelope** with metadata and structured errors
//! - **Usage source trait** for information adapters
//! - **Routing logic** for sequential fallback with short-circuit
//! - **Circuit breaker and throttling** for resilient upstream calls
//!
//! ## Feature Flags
//!
//! | Flag | Description |
//! |------|-------------|
//! | `default` | Standard feature set |
//!
//! ## Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`adapters`] | Usage sources (curated, labels, RxNav, openFDA, DailyMed) and the price directory |
//! | [`circuit_breaker`] | Circuit breaker for resilient calls |
//! | [`data_source`] | Usage source trait and error taxonomy |
//! | [`domain`] | Domain models (MedicineQuery, ResolvedName, UsageRecord, PriceQuote) |
//! | [`envelope`] | Response envelope with metadata |
//! | [`error`] | Core error types |
//! | [`http_client`] | HTTP client abstraction |
//! | [`resolver`] | Arabic / brand / fuzzy name resolution |
//! | [`routing`] | Fallback chain routing and reply composition |
//! | [`throttling`] | Rate limiting and batch pacing |
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use dawaa_core::{MedicineQuery, UsageRouterBuilder};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Sample-mode router: no network, deterministic fixtures
//!     let router = UsageRouterBuilder::new().build();
//!
//!     let query = MedicineQuery::new("بانادول")?;
//!     match router.fetch_usage(&query).await {
//!         Ok(success) => println!("{}", success.data.indications),
//!         Err(failure) => println!("exhausted: {}", failure.error),
//!     }
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────┐
//! │  CLI / Chat     │
//! └────────┬────────┘
//!          │
//!          ▼
//! ┌─────────────────┐     ┌──────────────────┐
//! │  Usage Router   │────▶│  Name Resolver   │
//! └────────┬────────┘     └──────────────────┘
//!          │
//!          ▼
//! ┌─────────────────┐     ┌──────────────────┐
//! │ Usage Source    │────▶│ Circuit Breaker  │
//! │ (Adapter Trait) │     │ + Throttle       │
//! └────────┬────────┘     └──────────────────┘
//!          │
//!          ▼
//! ┌─────────────────┐     ┌──────────────────┐
//! │ HTTP Client     │     │ Label Store      │
//! │ (reqwest/none)  │     │ (DuckDB)         │
//! └─────────────────┘     └──────────────────┘
//! ```
//!
//! ## Error Handling
//!
//! All operations return `Result` types with structured errors:
//!
//! ```rust
//! use dawaa_core::{SourceError, SourceErrorKind};
//!
//! fn handle_error(error: SourceError) {
//!     match error.kind() {
//!         SourceErrorKind::NotFound => {
//!             // Answered miss, try the next source
//!         }
//!         SourceErrorKind::Transient => {
//!             // Outage or bad payload, also next source
//!         }
//!         SourceErrorKind::RateLimited => {
//!             // Wait for the window to roll over
//!         }
//!         _ => {}
//!     }
//! }
//! ```
//!
//! ## Security
//!
//! - The consulted services are public and keyless; nothing secret is logged
//! - Ad-hoc SQL runs read-only with row and statement guardrails
//! - Input validation on all domain types

pub mod adapters;
pub mod circuit_breaker;
pub mod data_source;
pub mod domain;
pub mod envelope;
pub mod error;
pub mod http_client;
pub mod resolver;
pub mod routing;
pub mod throttling;

// Re-export commonly used types at crate root for convenience

// Adapter implementations
pub use adapters::{
    CuratedSource, DailymedSource, LabelStoreSource, OpenFdaSource, PriceDirectory, RxnavSource,
};

// Circuit breaker
pub use circuit_breaker::{CircuitBreaker, CircuitState};

// Usage source trait and error taxonomy
pub use data_source::{HealthState, SourceError, SourceErrorKind, UsageSource};

// Domain models
pub use domain::{
    MedicineQuery, PriceQuote, ResolveConfidence, ResolvedName, SourceId, UsageRecord,
};

// Envelope types
pub use envelope::{Envelope, EnvelopeError, EnvelopeMeta, SCHEMA_VERSION};

// Error types
pub use error::ValidationError;

// Label store (re-exported from dawaa-labelstore)
pub use dawaa_labelstore::{
    LabelRecord, LabelStore, LabelStoreConfig, MedicineRecord, QueryGuardrails, QueryResult,
    SqlColumn, StoreError,
};

// HTTP client types
pub use http_client::{
    HttpClient, HttpError, HttpRequest, HttpResponse, NoopHttpClient, ReqwestHttpClient,
};

// Name resolution
pub use resolver::resolve;

// Routing types
pub use routing::{
    compose_reply, RouteFailure, RouteResult, RouteSuccess, SourceSnapshot, SourceStrategy,
    UsageRouter, UsageRouterBuilder, DEFAULT_CHAIN,
};

// Throttling
pub use throttling::{BatchPacer, SourceThrottle};
