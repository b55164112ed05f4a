//! RxNav (RxNorm) usage source.
//!
//! Two-step flow: `drugs.json` maps a name to its first RxCUI, then
//! `allProperties.json` yields concept properties whose names hint at usage.
//! Supports both real API calls and a deterministic sample mode.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use serde::Deserialize;

use crate::circuit_breaker::CircuitBreaker;
use crate::data_source::{HealthState, SourceError, UsageSource};
use crate::domain::{ResolvedName, SourceId, UsageRecord};
use crate::http_client::{HttpClient, HttpRequest, HttpResponse, NoopHttpClient};
use crate::throttling::SourceThrottle;

const DEFAULT_BASE_URL: &str = "https://rxnav.nlm.nih.gov/REST";

/// Requests per minute against the public RxNav instance.
const RATE_PER_MINUTE: u32 = 60;

/// Property names containing any of these fragments count as usage text.
const USAGE_PROPERTY_HINTS: &[&str] = &["indication", "use", "purpose", "treatment", "therapy"];

#[derive(Clone)]
pub struct RxnavSource {
    base_url: String,
    http_client: Arc<dyn HttpClient>,
    circuit_breaker: Arc<CircuitBreaker>,
    throttle: SourceThrottle,
    use_real_api: bool,
}

impl Default for RxnavSource {
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

impl RxnavSource {
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

    /// One guarded GET: circuit breaker, throttle, transport and status
    /// normalization. A 404 is an answered miss, not upstream trouble.
    async fn guarded_get(&self, url: String) -> Result<HttpResponse, SourceError> {
        if !self.circuit_breaker.allow() {
            return Err(SourceError::circuit_open(SourceId::Rxnav));
        }

        if let Err(wait) = self.throttle.try_acquire() {
            return Err(SourceError::rate_limited(format!(
                "rxnav quota exhausted; retry in {:.2}s",
                wait.as_secs_f64()
            )));
        }

        let request = HttpRequest::get(url).with_header("accept", "application/json");
        let response = self.http_client.execute(request).await.map_err(|error| {
            self.circuit_breaker.on_failure();
            SourceError::transient(format!("rxnav transport error: {}", error.message()))
        })?;

        if response.status == 404 {
            self.circuit_breaker.on_success();
            return Ok(response);
        }

        if !response.is_success() {
            self.circuit_breaker.on_failure();
            return Err(SourceError::transient(format!(
                "rxnav returned status {}",
                response.status
            )));
        }

        self.circuit_breaker.on_success();
        Ok(response)
    }

    async fn fetch_rxcui(&self, term: &str) -> Result<Option<String>, SourceError> {
        let url = format!(
            "{}/drugs.json?name={}",
            self.base_url,
            urlencoding::encode(term)
        );
        let response = self.guarded_get(url).await?;
        if response.status == 404 {
            return Ok(None);
        }

        let parsed: DrugsResponse = serde_json::from_str(&response.body).map_err(|error| {
            self.circuit_breaker.on_failure();
            SourceError::transient(format!("rxnav drugs payload was not json: {error}"))
        })?;

        let rxcui = parsed
            .drug_group
            .unwrap_or_default()
            .concept_groups
            .into_iter()
            .flat_map(|group| group.concept_properties)
            .map(|concept| concept.rxcui)
            .find(|rxcui| !rxcui.is_empty());

        Ok(rxcui)
    }

    async fn fetch_usage_text(&self, rxcui: &str) -> Result<String, SourceError> {
        let url = format!("{}/rxcui/{rxcui}/allProperties.json?prop=all", self.base_url);
        let response = self.guarded_get(url).await?;
        if response.status == 404 {
            return Ok(String::new());
        }

        let parsed: PropertiesResponse = serde_json::from_str(&response.body).map_err(|error| {
            self.circuit_breaker.on_failure();
            SourceError::transient(format!("rxnav properties payload was not json: {error}"))
        })?;

        let mut fragments: Vec<String> = Vec::new();
        for concept in parsed
            .prop_concept_group
            .unwrap_or_default()
            .prop_concepts
        {
            let prop_name = concept.prop_name.to_lowercase();
            let relevant = USAGE_PROPERTY_HINTS
                .iter()
                .any(|hint| prop_name.contains(hint));
            if relevant && !concept.prop_value.is_empty() && !fragments.contains(&concept.prop_value)
            {
                fragments.push(concept.prop_value);
            }
        }

        Ok(fragments.join("; "))
    }

    async fn lookup_live(&self, name: &ResolvedName) -> Result<UsageRecord, SourceError> {
        for term in name.terms() {
            let Some(rxcui) = self.fetch_rxcui(term).await? else {
                continue;
            };

            let usage = self.fetch_usage_text(&rxcui).await?;
            if usage.is_empty() {
                continue;
            }

            return Ok(UsageRecord {
                brand: name.brand.clone(),
                generic: name.canonical.clone(),
                indications: usage,
                contraindications: String::new(),
                ingredients: String::new(),
                source: SourceId::Rxnav,
            });
        }

        Err(SourceError::not_found(format!(
            "rxnav has no usage properties for '{}'",
            name.canonical
        )))
    }

    async fn lookup_sample(&self, name: &ResolvedName) -> Result<UsageRecord, SourceError> {
        // Sample mode still pays the guard costs so throttling and breaker
        // behavior are observable offline.
        let url = format!("{}/drugs.json", self.base_url);
        self.guarded_get(url).await?;

        let text = name.terms().find_map(sample_usage).ok_or_else(|| {
            SourceError::not_found(format!(
                "rxnav has no usage properties for '{}'",
                name.canonical
            ))
        })?;

        Ok(UsageRecord {
            brand: name.brand.clone(),
            generic: name.canonical.clone(),
            indications: text.to_owned(),
            contraindications: String::new(),
            ingredients: String::new(),
            source: SourceId::Rxnav,
        })
    }
}

impl UsageSource for RxnavSource {
    fn id(&self) -> SourceId {
        SourceId::Rxnav
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

fn sample_usage(term: &str) -> Option<&'static str> {
    match term {
        "paracetamol" => Some(
            "Analgesic and antipyretic indicated for the temporary relief of minor aches and pains and the reduction of fever.",
        ),
        "ibuprofen" => Some(
            "Nonsteroidal anti-inflammatory drug indicated for relief of mild to moderate pain, inflammation, and fever.",
        ),
        "loratadine" => Some(
            "Antihistamine indicated for the relief of symptoms of seasonal allergic rhinitis and chronic idiopathic urticaria.",
        ),
        "metformin" => Some(
            "Biguanide antihyperglycemic indicated as an adjunct to diet and exercise to improve glycemic control in adults with type 2 diabetes mellitus.",
        ),
        _ => None,
    }
}

#[derive(Debug, Deserialize)]
struct DrugsResponse {
    #[serde(rename = "drugGroup", default)]
    drug_group: Option<DrugGroup>,
}

#[derive(Debug, Default, Deserialize)]
struct DrugGroup {
    #[serde(rename = "conceptGroup", default)]
    concept_groups: Vec<ConceptGroup>,
}

#[derive(Debug, Deserialize)]
struct ConceptGroup {
    #[serde(rename = "conceptProperties", default)]
    concept_properties: Vec<ConceptProperty>,
}

#[derive(Debug, Deserialize)]
struct ConceptProperty {
    #[serde(default)]
    rxcui: String,
}

#[derive(Debug, Deserialize)]
struct PropertiesResponse {
    #[serde(rename = "propConceptGroup", default)]
    prop_concept_group: Option<PropConceptGroup>,
}

#[derive(Debug, Default, Deserialize)]
struct PropConceptGroup {
    #[serde(rename = "propConcept", default)]
    prop_concepts: Vec<PropConcept>,
}

#[derive(Debug, Deserialize)]
struct PropConcept {
    #[serde(rename = "propName", default)]
    prop_name: String,
    #[serde(rename = "propValue", default)]
    prop_value: String,
}
