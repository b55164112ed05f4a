use std::fmt::{Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::domain::quality;
use crate::error::ValidationError;

/// Canonical source identifiers used in metadata and envelopes.
///
/// The first five participate in the usage fallback chain, in this priority
/// order. `Prices` belongs to the price domain and is never consulted for
/// usage information.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceId {
    Curated,
    Labels,
    Rxnav,
    Openfda,
    Dailymed,
    Prices,
}

impl SourceId {
    pub const ALL: [Self; 6] = [
        Self::Curated,
        Self::Labels,
        Self::Rxnav,
        Self::Openfda,
        Self::Dailymed,
        Self::Prices,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Curated => "curated",
            Self::Labels => "labels",
            Self::Rxnav => "rxnav",
            Self::Openfda => "openfda",
            Self::Dailymed => "dailymed",
            Self::Prices => "prices",
        }
    }
}

impl Display for SourceId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SourceId {
    type Err = ValidationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "curated" => Ok(Self::Curated),
            "labels" => Ok(Self::Labels),
            "rxnav" => Ok(Self::Rxnav),
            "openfda" => Ok(Self::Openfda),
            "dailymed" => Ok(Self::Dailymed),
            "prices" => Ok(Self::Prices),
            other => Err(ValidationError::InvalidSource {
                value: other.to_owned(),
            }),
        }
    }
}

/// A caller's raw question about one medicine. Immutable once created.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MedicineQuery {
    raw: String,
    session: Option<String>,
}

impl MedicineQuery {
    /// Create a query from raw input.
    ///
    /// # Errors
    /// Returns `EmptyQuery` when the input is blank after trimming.
    pub fn new(raw: impl Into<String>) -> Result<Self, ValidationError> {
        let raw = raw.into();
        if raw.trim().is_empty() {
            return Err(ValidationError::EmptyQuery);
        }
        Ok(Self { raw, session: None })
    }

    /// Attach an opaque user/session identifier.
    #[must_use]
    pub fn with_session(mut self, session: impl Into<String>) -> Self {
        self.session = Some(session.into());
        self
    }

    #[must_use]
    pub fn raw(&self) -> &str {
        &self.raw
    }

    #[must_use]
    pub fn session(&self) -> Option<&str> {
        self.session.as_deref()
    }
}

/// How the resolver arrived at the canonical name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResolveConfidence {
    /// A static table produced the name.
    Exact,
    /// Fuzzy matching against the known-name universe produced the name.
    Fuzzy,
    /// Nothing matched; the cleaned input passed through unchanged.
    Unresolved,
}

/// Output of the name resolver.
///
/// `canonical` is the term sources are queried with. When a brand name was
/// substituted for its generic, the original brand is preserved so sources
/// with brand-keyed data can still match.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedName {
    pub canonical: String,
    pub brand: Option<String>,
    pub confidence: ResolveConfidence,
}

impl ResolvedName {
    #[must_use]
    pub fn exact(canonical: impl Into<String>, brand: Option<String>) -> Self {
        Self {
            canonical: canonical.into(),
            brand,
            confidence: ResolveConfidence::Exact,
        }
    }

    #[must_use]
    pub fn fuzzy(canonical: impl Into<String>, brand: Option<String>) -> Self {
        Self {
            canonical: canonical.into(),
            brand,
            confidence: ResolveConfidence::Fuzzy,
        }
    }

    #[must_use]
    pub fn passthrough(cleaned: impl Into<String>) -> Self {
        Self {
            canonical: cleaned.into(),
            brand: None,
            confidence: ResolveConfidence::Unresolved,
        }
    }

    /// Lookup terms in preference order: canonical first, then the original
    /// brand when one was substituted away.
    pub fn terms(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.canonical.as_str()).chain(self.brand.as_deref())
    }
}

/// The common shape every usage source returns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsageRecord {
    pub brand: Option<String>,
    pub generic: String,
    pub indications: String,
    pub contraindications: String,
    pub ingredients: String,
    pub source: SourceId,
}

impl UsageRecord {
    /// Whether this record carries enough substance to end the fallback
    /// chain: meaningful indications text, or a non-placeholder
    /// contraindications or ingredients field.
    #[must_use]
    pub fn is_acceptable(&self) -> bool {
        quality::is_meaningful_usage(&self.indications)
            || quality::is_substantive(&self.contraindications)
            || quality::is_substantive(&self.ingredients)
    }
}

/// A price observation from the pricing directory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceQuote {
    /// Identifier in the external pricing directory.
    pub external_id: Option<String>,
    /// Marketed trade name as the directory lists it.
    pub trade_name: String,
    /// Listed price, when parseable.
    pub price: Option<f64>,
    /// Currency code; the directory quotes Egyptian pounds.
    pub currency: String,
    /// Manufacturer / marketing company, when listed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub company: Option<String>,
    /// Free-text description, when listed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Active components text, when listed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub components: Option<String>,
}

impl PriceQuote {
    #[must_use]
    pub fn new(trade_name: impl Into<String>) -> Self {
        Self {
            external_id: None,
            trade_name: trade_name.into(),
            price: None,
            currency: String::from("EGP"),
            company: None,
            description: None,
            components: None,
        }
    }
}
