//! openFDA structured product label source.
//!
//! Single search against `drug/label.json` scoped to the generic name.
//! Prefers the indications section, falls back through the label's other
//! prose sections, and harvests contraindications and ingredient lists
//! when the label carries them.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use serde::Deserialize;

use crate::circuit_breaker::CircuitBreaker;
use crate::data_source::{HealthState, SourceError, UsageSource};
use crate::domain::quality;
use crate::domain::{ResolvedName, SourceId, UsageRecord};
use crate::http_client::{HttpClient, HttpRequest, HttpResponse, NoopHttpClient};
use crate::throttling::SourceThrottle;

const DEFAULT_BASE_URL: &str = "https://api.fda.gov";

/// Unkeyed openFDA allowance.
const RATE_PER_MINUTE: u32 = 40;

#[derive(Clone)]
pub struct OpenFdaSource {
    base_url: String,
    http_client: Arc<dyn HttpClient>,
    circuit_breaker: Arc<CircuitBreaker>,
    throttle: SourceThrottle,
    use_real_api: bool,
}

impl Default for OpenFdaSource {
    fn default() -> Self {
        Self {
            base_url: String::from(DEFAULT_BASE_URL),
            http_client: Arc::new(NoopHttpClient),
            circuit_breaker: Arc::new(CircuitBreaker::default()),
            throttle: SourceThrottle::per_minute(RATE_PER_MINUTE),
            use_real_api: false,
        }
    }
}

impl OpenFdaSource {
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

    async fn guarded_get(&self, url: String) -> Result<HttpResponse, SourceError> {
        if !self.circuit_breaker.allow() {
            return Err(SourceError::circuit_open(SourceId::Openfda));
        }

        if let Err(wait) = self.throttle.try_acquire() {
            return Err(SourceError::rate_limited(format!(
                "openfda quota exhausted; retry in {:.2}s",
                wait.as_secs_f64()
            )));
        }

        let request = HttpRequest::get(url);
        let response = self.http_client.execute(request).await.map_err(|error| {
            self.circuit_breaker.on_failure();
            SourceError::transient(format!("openfda transport error: {}", error.message()))
        })?;

        // openFDA answers no-match searches with a 404 and an error body.
        if response.status == 404 {
            self.circuit_breaker.on_success();
            return Ok(response);
        }

        if !response.is_success() {
            self.circuit_breaker.on_failure();
            return Err(SourceError::transient(format!(
                "openfda returned status {}",
                response.status
            )));
        }

        self.circuit_breaker.on_success();
        Ok(response)
    }

    async fn fetch_label(&self, term: &str) -> Result<Option<LabelResult>, SourceError> {
        let search = format!("openfda.generic_name:\"{term}\"");
        let url = format!(
            "{}/drug/label.json?search={}&limit=1",
            self.base_url,
            urlencoding::encode(&search)
        );

        let response = self.guarded_get(url).await?;
        if response.status == 404 {
            return Ok(None);
        }

        let parsed: LabelSearchResponse = serde_json::from_str(&response.body).map_err(|error| {
            self.circuit_breaker.on_failure();
            SourceError::transient(format!("openfda payload was not json: {error}"))
        })?;

        Ok(parsed.results.into_iter().next())
    }

    async fn lookup_live(&self, name: &ResolvedName) -> Result<UsageRecord, SourceError> {
        for term in name.terms() {
            let Some(label) = self.fetch_label(term).await? else {
                continue;
            };

            let indications = pick_usage_text(&label);
            let contraindications = label.contraindications.first().cloned().unwrap_or_default();
            let ingredients = join_nonempty(&label.active_ingredient, &label.inactive_ingredient);

            if indications.is_empty() && contraindications.is_empty() && ingredients.is_empty() {
                continue;
            }

            let brand = label
                .openfda
                .brand_name
                .first()
                .cloned()
                .or_else(|| name.brand.clone());
            let generic = label
                .openfda
                .generic_name
                .first()
                .map(|value| value.to_lowercase())
                .unwrap_or_else(|| name.canonical.clone());

            return Ok(UsageRecord {
                brand,
                generic,
                indications,
                contraindications,
                ingredients,
                source: SourceId::Openfda,
            });
        }

        Err(SourceError::not_found(format!(
            "openfda has no label for '{}'",
            name.canonical
        )))
    }

    async fn lookup_sample(&self, name: &ResolvedName) -> Result<UsageRecord, SourceError> {
        let url = format!("{}/drug/label.json", self.base_url);
        self.guarded_get(url).await?;

        let (usage, contraindications) = name.terms().find_map(sample_label).ok_or_else(|| {
            SourceError::not_found(format!("openfda has no label for '{}'", name.canonical))
        })?;

        Ok(UsageRecord {
            brand: name.brand.clone(),
            generic: name.canonical.clone(),
            indications: usage.to_owned(),
            contraindications: contraindications.to_owned(),
            ingredients: String::new(),
            source: SourceId::Openfda,
        })
    }
}

impl UsageSource for OpenFdaSource {
    fn id(&self) -> SourceId {
        SourceId::Openfda
    }

    fn lookup<'a>(
        &'a self,
        name: &'a ResolvedName,
    ) -> Pin<Box<dyn Future<Output = Result<UsageRecord, SourceError>> + Send + 'a>> {
        Box::pin(async move {
            if self.use_real_api {
                self.lookup_live(name).await
            } else {
                self.lookup_sample(name).await
            }
        })
    }

    fn health(&self) -> HealthState {
        self.circuit_breaker.health()
    }

    fn rate_available(&self) -> bool {
        self.throttle.available()
    }
}

/// First meaningful prose section, in label preference order; when no
/// section clears the quality bar, the first non-empty one still rides
/// along so diagnostics show what the label said.
fn pick_usage_text(label: &LabelResult) -> String {
    let candidates = [
        &label.indications_and_usage,
        &label.indications,
        &label.clinical_pharmacology,
        &label.description,
    ];

    for field in candidates {
        if let Some(text) = field.first() {
            if quality::is_meaningful_usage(text) {
                return text.clone();
            }
        }
    }

    candidates
        .into_iter()
        .filter_map(|field| field.first())
        .find(|text| !text.trim().is_empty())
        .cloned()
        .unwrap_or_default()
}

fn join_nonempty(active: &[String], inactive: &[String]) -> String {
    let mut parts: Vec<&str> = Vec::new();
    parts.extend(active.iter().map(String::as_str));
    parts.extend(inactive.iter().map(String::as_str));
    parts.retain(|part| !part.trim().is_empty());
    parts.join("; ")
}

fn sample_label(term: &str) -> Option<(&'static str, &'static str)> {
    match term {
        "atorvastatin" => Some((
            "Indicated as an adjunct to diet to reduce elevated total cholesterol and LDL cholesterol in adults with primary hyperlipidemia.",
            "Contraindicated in patients with active liver disease and during pregnancy.",
        )),
        "amoxicillin" => Some((
            "Indicated in the treatment of infections due to susceptible strains of designated microorganisms, including infections of the ear, nose, throat, and lower respiratory tract.",
            "Contraindicated in patients with a history of serious hypersensitivity reactions to penicillins.",
        )),
        "diclofenac" => Some((
            "Indicated for relief of the signs and symptoms of osteoarthritis and rheumatoid arthritis.",
            "Contraindicated in the setting of coronary artery bypass graft surgery.",
        )),
        "cetirizine" => Some((
            "Indicated for the relief of symptoms associated with seasonal and perennial allergic rhinitis and for the treatment of chronic urticaria.",
            "",
        )),
        _ => None,
    }
}

#[derive(Debug, Deserialize)]
struct LabelSearchResponse {
    #[serde(default)]
    results: Vec<LabelResult>,
}

#[derive(Debug, Default, Deserialize)]
struct LabelResult {
    #[serde(default)]
    indications_and_usage: Vec<String>,
    #[serde(default)]
    indications: Vec<String>,
    #[serde(default)]
    clinical_pharmacology: Vec<String>,
    #[serde(default)]
    description: Vec<String>,
    #[serde(default)]
    contraindications: Vec<String>,
    #[serde(default)]
    active_ingredient: Vec<String>,
    #[serde(default)]
    inactive_ingredient: Vec<String>,
    #[serde(default)]
    openfda: OpenFdaMeta,
}

#[derive(Debug, Default, Deserialize)]
struct OpenFdaMeta {
    #[serde(default)]
    brand_name: Vec<String>,
    #[serde(default)]
    generic_name: Vec<String>,
}
