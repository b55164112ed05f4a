//! Usage source trait and error types.
//!
//! This module defines the adapter contract (`UsageSource`) every
//! information source implements, plus the structured error the fallback
//! router keys its decisions on.
//!
//! # Sources
//!
//! | Source | Backing | Description |
//! |--------|---------|-------------|
//! | `curated` | in-process table | Hand-verified usage texts |
//! | `labels` | DuckDB store | Previously ingested label data |
//! | `rxnav` | RxNav REST | RxNorm concept properties |
//! | `openfda` | openFDA REST | Structured product labels |
//! | `dailymed` | DailyMed REST | SPL documents |
//!
//! # Example
//!
//! ```rust,ignore
//! use dawaa_core::{resolver, SourceError, UsageSource};
//!
//! async fn describe(source: &dyn UsageSource) -> Result<(), SourceError> {
//!     let name = resolver::resolve("كلاريتين");
//!     let record = source.lookup(&name).await?;
//!     println!("{}: {}", record.generic, record.indications);
//!     Ok(())
//! }
//! ```

use std::fmt::{Display, Formatter};
use std::future::Future;
use std::pin::Pin;

use serde::{Deserialize, Serialize};

use crate::domain::{ResolvedName, SourceId, UsageRecord};

/// Health state reported by adapters and shown by the `sources` command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HealthState {
    Healthy,
    Degraded,
    Unhealthy,
}

impl HealthState {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Healthy => "healthy",
            Self::Degraded => "degraded",
            Self::Unhealthy => "unhealthy",
        }
    }
}

impl Display for HealthState {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Adapter-level error classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceErrorKind {
    /// The source answered and had nothing for this name.
    NotFound,
    /// Transport or service trouble worth retrying on a later request.
    Transient,
    RateLimited,
    InvalidRequest,
    CircuitOpen,
    Unregistered,
    /// Terminal chain outcome. Only the router constructs this kind.
    Unavailable,
    Internal,
}

/// Structured source error used by router fallback.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceError {
    kind: SourceErrorKind,
    message: String,
    retryable: bool,
}

impl SourceError {
    pub fn not_found(message: impl Into<String>) -> Self {
        Self {
            kind: SourceErrorKind::NotFound,
            message: message.into(),
            retryable: false,
        }
    }

    pub fn transient(message: impl Into<String>) -> Self {
        Self {
            kind: SourceErrorKind::Transient,
            message: message.into(),
            retryable: true,
        }
    }

    pub fn rate_limited(message: impl Into<String>) -> Self {
        Self {
            kind: SourceErrorKind::RateLimited,
            message: message.into(),
            retryable: true,
        }
    }

    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self {
            kind: SourceErrorKind::InvalidRequest,
            message: message.into(),
            retryable: false,
        }
    }

    pub fn circuit_open(source: SourceId) -> Self {
        Self {
            kind: SourceErrorKind::CircuitOpen,
            message: format!("circuit breaker open for source '{source}'"),
            retryable: true,
        }
    }

    pub fn unregistered(source: SourceId) -> Self {
        Self {
            kind: SourceErrorKind::Unregistered,
            message: format!("source '{source}' is not registered"),
            retryable: false,
        }
    }

    pub fn unavailable(message: impl Into<String>) -> Self {
        Self {
            kind: SourceErrorKind::Unavailable,
            message: message.into(),
            retryable: true,
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self {
            kind: SourceErrorKind::Internal,
            message: message.into(),
            retryable: false,
        }
    }

    pub const fn kind(&self) -> SourceErrorKind {
        self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub const fn retryable(&self) -> bool {
        self.retryable
    }

    /// Stable machine code carried into envelope diagnostics.
    pub const fn code(&self) -> &'static str {
        match self.kind {
            SourceErrorKind::NotFound => "source.not_found",
            SourceErrorKind::Transient => "source.transient",
            SourceErrorKind::RateLimited => "source.rate_limited",
            SourceErrorKind::InvalidRequest => "source.invalid_request",
            SourceErrorKind::CircuitOpen => "source.circuit_open",
            SourceErrorKind::Unregistered => "source.unregistered",
            SourceErrorKind::Unavailable => "usage.unavailable",
            SourceErrorKind::Internal => "source.internal",
        }
    }
}

impl Display for SourceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.message, self.code())
    }
}

impl std::error::Error for SourceError {}

/// Source adapter contract.
///
/// Every information source the fallback chain can consult implements this
/// trait. The single lookup method returns a boxed future so adapters stay
/// object safe and the router can hold them behind `Arc<dyn UsageSource>`.
///
/// # Thread Safety
///
/// Implementations must be `Send + Sync`; the router shares them across
/// tasks.
pub trait UsageSource: Send + Sync {
    /// Unique source identifier, also the chain-order key.
    fn id(&self) -> SourceId;

    /// Fetch usage information for a resolved name.
    ///
    /// # Errors
    ///
    /// Returns [`SourceError`] with kind `NotFound` when the source answered
    /// and knows nothing about the name, and `Transient` for transport or
    /// service trouble a later source (or a later request) may get past.
    fn lookup<'a>(
        &'a self,
        name: &'a ResolvedName,
    ) -> Pin<Box<dyn Future<Output = Result<UsageRecord, SourceError>> + Send + 'a>>;

    /// Current health, fed by the adapter's circuit breaker where it has one.
    fn health(&self) -> HealthState {
        HealthState::Healthy
    }

    /// Whether the adapter's rate limiter would admit a request right now.
    /// Probing must not consume quota.
    fn rate_available(&self) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_are_stable() {
        assert_eq!(SourceError::not_found("x").code(), "source.not_found");
        assert_eq!(SourceError::transient("x").code(), "source.transient");
        assert_eq!(SourceError::rate_limited("x").code(), "source.rate_limited");
        assert_eq!(
            SourceError::circuit_open(SourceId::Rxnav).code(),
            "source.circuit_open"
        );
        assert_eq!(
            SourceError::unregistered(SourceId::Labels).code(),
            "source.unregistered"
        );
        assert_eq!(SourceError::unavailable("x").code(), "usage.unavailable");
    }

    #[test]
    fn retryability_follows_kind() {
        assert!(!SourceError::not_found("x").retryable());
        assert!(SourceError::transient("x").retryable());
        assert!(SourceError::rate_limited("x").retryable());
        assert!(SourceError::unavailable("x").retryable());
        assert!(!SourceError::invalid_request("x").retryable());
        assert!(!SourceError::internal("x").retryable());
    }

    #[test]
    fn display_includes_message_and_code() {
        let error = SourceError::transient("connection reset");
        assert_eq!(error.to_string(), "connection reset (source.transient)");
    }
}
