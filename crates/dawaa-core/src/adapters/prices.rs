//! Egyptian pricing directory client.
//!
//! Price data lives in its own domain: the directory is consulted by the
//! `price` command and the batch refresh, never by the usage chain. The
//! wire protocol is a PHP-style envelope, `{error, code, products|product}`,
//! where `error` defaults to true when absent and prices arrive as either
//! numbers or strings.

use std::sync::Arc;

use serde::Deserialize;

use crate::circuit_breaker::CircuitBreaker;
use crate::data_source::{HealthState, SourceError};
use crate::domain::{PriceQuote, SourceId};
use crate::http_client::{HttpClient, HttpRequest, HttpResponse, NoopHttpClient};
use crate::throttling::{BatchPacer, SourceThrottle};

const DEFAULT_BASE_URL: &str = "https://moelshafey.xyz/API/MD";

const RATE_PER_MINUTE: u32 = 30;

/// Detail lookups per search, to stay inside the directory's informal limits.
pub const DETAIL_BATCH_CAP: usize = 5;

#[derive(Clone)]
pub struct PriceDirectory {
    base_url: String,
    http_client: Arc<dyn HttpClient>,
    circuit_breaker: Arc<CircuitBreaker>,
    throttle: SourceThrottle,
    pacer: Arc<BatchPacer>,
    use_real_api: bool,
}

impl Default for PriceDirectory {
    fn default() -> Self {
        Self {
            base_url: String::from(DEFAULT_BASE_URL),
            http_client: Arc::new(NoopHttpClient),
            circuit_breaker: Arc::new(CircuitBreaker::default()),
            throttle: SourceThrottle::per_minute(RATE_PER_MINUTE),
            pacer: Arc::new(BatchPacer::default()),
            use_real_api: false,
        }
    }
}

impl PriceDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_http_client(http_client: Arc<dyn HttpClient>) -> Self {
        let is_real = !http_client.is_mock();
        Self {
            http_client,
            use_real_api: is_real,
            ..Self::default()
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_circuit_breaker(mut self, circuit_breaker: Arc<CircuitBreaker>) -> Self {
        self.circuit_breaker = circuit_breaker;
        self
    }

    pub fn health(&self) -> HealthState {
        self.circuit_breaker.health()
    }

    pub fn rate_available(&self) -> bool {
        self.throttle.available()
    }

    async fn guarded_get(&self, url: String) -> Result<HttpResponse, SourceError> {
        if !self.circuit_breaker.allow() {
            return Err(SourceError::circuit_open(SourceId::Prices));
        }

        if let Err(wait) = self.throttle.try_acquire() {
            return Err(SourceError::rate_limited(format!(
                "price directory quota exhausted; retry in {:.2}s",
                wait.as_secs_f64()
            )));
        }

        let request = HttpRequest::get(url).with_header("accept", "application/json");
        let response = self.http_client.execute(request).await.map_err(|error| {
            self.circuit_breaker.on_failure();
            SourceError::transient(format!(
                "price directory transport error: {}",
                error.message()
            ))
        })?;

        if !response.is_success() {
            self.circuit_breaker.on_failure();
            return Err(SourceError::transient(format!(
                "price directory returned status {}",
                response.status
            )));
        }

        self.circuit_breaker.on_success();
        Ok(response)
    }

    /// Searches the directory by trade name, Arabic or English.
    ///
    /// An answered search with zero products yields an empty vec; a
    /// directory-reported error envelope yields `Transient`.
    pub async fn search(&self, name: &str) -> Result<Vec<PriceQuote>, SourceError> {
        if !self.use_real_api {
            return self.search_sample(name).await;
        }

        let url = format!(
            "{}/search.php?name={}",
            self.base_url,
            urlencoding::encode(name)
        );
        let response = self.guarded_get(url).await?;

        let parsed: SearchEnvelope = serde_json::from_str(&response.body).map_err(|error| {
            self.circuit_breaker.on_failure();
            SourceError::transient(format!("price search payload was not json: {error}"))
        })?;
        check_envelope(parsed.error, parsed.code, parsed.message)?;

        Ok(parsed
            .products
            .into_iter()
            .map(DirectoryProduct::into_quote)
            .collect())
    }

    /// Fetches the detail record for one directory id.
    pub async fn fetch_details(&self, id: &str) -> Result<Option<PriceQuote>, SourceError> {
        let url = format!("{}/info.php?id={}", self.base_url, urlencoding::encode(id));
        if !self.use_real_api {
            self.guarded_get(url).await?;
            return Ok(sample_details(id));
        }
        let response = self.guarded_get(url).await?;

        let parsed: DetailsEnvelope = serde_json::from_str(&response.body).map_err(|error| {
            self.circuit_breaker.on_failure();
            SourceError::transient(format!("price details payload was not json: {error}"))
        })?;
        check_envelope(parsed.error, parsed.code, parsed.message)?;

        Ok(parsed.product.map(DirectoryProduct::into_quote))
    }

    /// Search plus paced detail fetches for the first few hits.
    ///
    /// Detail lookups are capped at [`DETAIL_BATCH_CAP`] and separated by the
    /// batch pacer delay. A failed detail fetch keeps the search-level quote
    /// instead of dropping the product.
    pub async fn search_with_details(&self, name: &str) -> Result<Vec<PriceQuote>, SourceError> {
        let quotes = self.search(name).await?;

        let mut detailed = Vec::with_capacity(quotes.len().min(DETAIL_BATCH_CAP));
        for quote in quotes.into_iter().take(DETAIL_BATCH_CAP) {
            let Some(id) = quote.external_id.clone() else {
                detailed.push(quote);
                continue;
            };

            self.pacer.pace().await;
            match self.fetch_details(&id).await {
                Ok(Some(details)) => detailed.push(merge_quotes(quote, details)),
                Ok(None) | Err(_) => detailed.push(quote),
            }
        }

        Ok(detailed)
    }

    async fn search_sample(&self, name: &str) -> Result<Vec<PriceQuote>, SourceError> {
        let url = format!("{}/search.php", self.base_url);
        self.guarded_get(url).await?;
        Ok(sample_quotes(name))
    }
}

fn check_envelope(error: bool, code: u16, message: Option<String>) -> Result<(), SourceError> {
    if error {
        let detail = message.unwrap_or_else(|| String::from("unspecified directory error"));
        return Err(SourceError::transient(format!(
            "price directory error: {detail}"
        )));
    }
    if code != 200 {
        return Err(SourceError::transient(format!(
            "price directory answered code {code}"
        )));
    }
    Ok(())
}

fn merge_quotes(basic: PriceQuote, details: PriceQuote) -> PriceQuote {
    PriceQuote {
        external_id: details.external_id.or(basic.external_id),
        trade_name: if details.trade_name.is_empty() {
            basic.trade_name
        } else {
            details.trade_name
        },
        price: details.price.or(basic.price),
        currency: basic.currency,
        company: details.company.or(basic.company),
        description: details.description.or(basic.description),
        components: details.components.or(basic.components),
    }
}

type SampleListing = (&'static str, &'static str, &'static str, f64, &'static str);

const SAMPLE_LISTINGS: &[SampleListing] = &[
    ("panadol", "9001", "Panadol Extra 24 Tablets", 48.0, "GlaxoSmithKline"),
    ("panadol", "9002", "Panadol Advance 24 Tablets", 30.0, "GlaxoSmithKline"),
    ("بانادول", "9001", "Panadol Extra 24 Tablets", 48.0, "GlaxoSmithKline"),
    ("rivo", "9101", "Rivo 20 Tablets", 9.0, "Memphis Pharmaceuticals"),
    ("aspirin", "9102", "Aspocid 75mg 30 Tablets", 12.5, "CID Pharma"),
];

fn listing_quote(listing: &SampleListing) -> PriceQuote {
    let (_, id, trade_name, price, company) = listing;
    let mut quote = PriceQuote::new(*trade_name);
    quote.external_id = Some((*id).to_owned());
    quote.price = Some(*price);
    quote.company = Some((*company).to_owned());
    quote
}

fn sample_quotes(name: &str) -> Vec<PriceQuote> {
    let needle = name.trim().to_lowercase();
    SAMPLE_LISTINGS
        .iter()
        .filter(|(key, _, _, _, _)| !needle.is_empty() && needle.contains(key))
        .map(listing_quote)
        .collect()
}

fn sample_details(id: &str) -> Option<PriceQuote> {
    SAMPLE_LISTINGS
        .iter()
        .find(|(_, listing_id, _, _, _)| *listing_id == id)
        .map(|listing| {
            let mut quote = listing_quote(listing);
            quote.description = Some(String::from("Oral tablets, sample catalog entry."));
            quote
        })
}

#[derive(Debug, Deserialize)]
struct SearchEnvelope {
    #[serde(default = "default_error")]
    error: bool,
    #[serde(default)]
    code: u16,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    products: Vec<DirectoryProduct>,
}

#[derive(Debug, Deserialize)]
struct DetailsEnvelope {
    #[serde(default = "default_error")]
    error: bool,
    #[serde(default)]
    code: u16,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    product: Option<DirectoryProduct>,
}

// The directory omits `error` on some malformed replies; treat absence as
// an error, matching the envelope contract.
fn default_error() -> bool {
    true
}

#[derive(Debug, Deserialize)]
struct DirectoryProduct {
    #[serde(default)]
    id: Option<LooseValue>,
    #[serde(default)]
    name: String,
    #[serde(default)]
    price: Option<LooseValue>,
    #[serde(default)]
    company: Option<String>,
    #[serde(default, rename = "desc")]
    description: Option<String>,
    #[serde(default)]
    components: Option<ComponentsField>,
}

impl DirectoryProduct {
    fn into_quote(self) -> PriceQuote {
        let mut quote = PriceQuote::new(self.name);
        quote.external_id = self.id.map(LooseValue::into_text);
        quote.price = self.price.as_ref().and_then(parse_price);
        quote.company = self.company.filter(|text| !text.trim().is_empty());
        quote.description = self.description.filter(|text| !text.trim().is_empty());
        quote.components = self.components.map(ComponentsField::joined);
        quote
    }
}

/// PHP-style field that arrives as either a JSON number or a string.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum LooseValue {
    Number(f64),
    Text(String),
}

impl LooseValue {
    fn into_text(self) -> String {
        match self {
            Self::Number(value) => value.to_string(),
            Self::Text(value) => value,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ComponentsField {
    Many(Vec<String>),
    One(String),
}

impl ComponentsField {
    fn joined(self) -> String {
        match self {
            Self::Many(values) => values
                .iter()
                .map(|value| value.trim())
                .filter(|value| !value.is_empty())
                .collect::<Vec<_>>()
                .join(", "),
            Self::One(value) => value.trim().to_owned(),
        }
    }
}

fn parse_price(value: &LooseValue) -> Option<f64> {
    match value {
        LooseValue::Number(number) => Some(*number),
        LooseValue::Text(text) => {
            let trimmed = text.trim();
            if let Ok(parsed) = trimmed.parse::<f64>() {
                return Some(parsed);
            }
            // Quotes like "29.5 EGP" keep their digits and separator.
            let digits: String = trimmed
                .chars()
                .filter(|c| c.is_ascii_digit() || *c == '.')
                .collect();
            digits.parse::<f64>().ok()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http_client::HttpError;
    use std::future::Future;
    use std::pin::Pin;

    struct FixtureClient {
        routes: Vec<(&'static str, u16, &'static str)>,
    }

    impl HttpClient for FixtureClient {
        fn execute<'a>(
            &'a self,
            request: HttpRequest,
        ) -> Pin<Box<dyn Future<Output = Result<HttpResponse, HttpError>> + Send + 'a>> {
            Box::pin(async move {
                for (fragment, status, body) in &self.routes {
                    if request.url.contains(fragment) {
                        return Ok(HttpResponse {
                            status: *status,
                            body: (*body).to_owned(),
                        });
                    }
                }
                Err(HttpError::new("no fixture for url"))
            })
        }
    }

    const SEARCH_BODY: &str = r#"{
        "error": false,
        "code": 200,
        "products": [
            {
                "id": 5549,
                "name": "Panadol Extra",
                "price": "48",
                "company": "GSK",
                "components": ["Paracetamol", "Caffeine"]
            },
            {
                "id": "5550",
                "name": "Panadol Advance",
                "price": 30.5
            }
        ]
    }"#;

    #[tokio::test]
    async fn search_parses_loose_wire_types() {
        let client = FixtureClient {
            routes: vec![("search.php", 200, SEARCH_BODY)],
        };
        let directory = PriceDirectory::with_http_client(Arc::new(client));

        let quotes = directory.search("panadol").await.expect("search hit");
        assert_eq!(quotes.len(), 2);
        assert_eq!(quotes[0].external_id.as_deref(), Some("5549"));
        assert_eq!(quotes[0].price, Some(48.0));
        assert_eq!(quotes[0].components.as_deref(), Some("Paracetamol, Caffeine"));
        assert_eq!(quotes[0].currency, "EGP");
        assert_eq!(quotes[1].external_id.as_deref(), Some("5550"));
        assert_eq!(quotes[1].price, Some(30.5));
    }

    #[tokio::test]
    async fn directory_error_envelope_is_transient() {
        let client = FixtureClient {
            routes: vec![(
                "search.php",
                200,
                r#"{"error": true, "code": 500, "message": "maintenance window"}"#,
            )],
        };
        let directory = PriceDirectory::with_http_client(Arc::new(client));

        let error = directory.search("panadol").await.expect_err("envelope error");
        assert_eq!(error.code(), "source.transient");
        assert!(error.message().contains("maintenance window"));
    }

    #[tokio::test(start_paused = true)]
    async fn detail_fetches_are_capped_and_survive_failures() {
        let many: String = {
            let items: Vec<String> = (1..=7)
                .map(|n| format!(r#"{{"id": "{n}", "name": "Product {n}", "price": "{n}"}}"#))
                .collect();
            format!(
                r#"{{"error": false, "code": 200, "products": [{}]}}"#,
                items.join(",")
            )
        };
        let many: &'static str = Box::leak(many.into_boxed_str());
        let client = FixtureClient {
            routes: vec![
                ("search.php", 200, many),
                (
                    "info.php?id=1",
                    200,
                    r#"{"error": false, "code": 200, "product": {"id": "1", "name": "Product 1", "price": "1", "desc": "film-coated tablets"}}"#,
                ),
                ("info.php", 200, r#"{"error": true, "code": 500}"#),
            ],
        };
        let directory = PriceDirectory::with_http_client(Arc::new(client));

        let quotes = directory
            .search_with_details("product")
            .await
            .expect("search hit");
        assert_eq!(quotes.len(), DETAIL_BATCH_CAP);
        assert_eq!(quotes[0].description.as_deref(), Some("film-coated tablets"));
        assert!(quotes[1].description.is_none());
        assert_eq!(quotes[4].trade_name, "Product 5");
    }

    #[tokio::test]
    async fn sample_mode_serves_fixture_quotes() {
        let directory = PriceDirectory::new();
        let quotes = directory.search("بانادول").await.expect("sample hit");
        assert!(!quotes.is_empty());
        assert!(quotes.iter().all(|quote| quote.currency == "EGP"));
    }

    #[test]
    fn price_parsing_handles_directory_formats() {
        assert_eq!(parse_price(&LooseValue::Number(29.0)), Some(29.0));
        assert_eq!(parse_price(&LooseValue::Text(String::from("29"))), Some(29.0));
        assert_eq!(
            parse_price(&LooseValue::Text(String::from("29.5 EGP"))),
            Some(29.5)
        );
        assert_eq!(parse_price(&LooseValue::Text(String::from("N/A"))), None);
    }
}
