//! DailyMed SPL source, the last network link in the chain.
//!
//! Two-step flow: `drugnames.json` finds the first set id for a name, then
//! `spls/{setid}.json` yields the label prose. DailyMed labels repeat what
//! openFDA carries for US products but keep answering when the openFDA
//! search index lags behind.

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

const DEFAULT_BASE_URL: &str = "https://dailymed.nlm.nih.gov/dailymed";

const RATE_PER_MINUTE: u32 = 60;

#[derive(Clone)]
pub struct DailymedSource {
    base_url: String,
    http_client: Arc<dyn HttpClient>,
    circuit_breaker: Arc<CircuitBreaker>,
    throttle: SourceThrottle,
    use_real_api: bool,
}

impl Default for DailymedSource {
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

impl DailymedSource {
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
            return Err(SourceError::circuit_open(SourceId::Dailymed));
        }

        if let Err(wait) = self.throttle.try_acquire() {
            return Err(SourceError::rate_limited(format!(
                "dailymed quota exhausted; retry in {:.2}s",
                wait.as_secs_f64()
            )));
        }

        let request = HttpRequest::get(url).with_header("accept", "application/json");
        let response = self.http_client.execute(request).await.map_err(|error| {
            self.circuit_breaker.on_failure();
            SourceError::transient(format!("dailymed transport error: {}", error.message()))
        })?;

        if response.status == 404 {
            self.circuit_breaker.on_success();
            return Ok(response);
        }

        if !response.is_success() {
            self.circuit_breaker.on_failure();
            return Err(SourceError::transient(format!(
                "dailymed returned status {}",
                response.status
            )));
        }

        self.circuit_breaker.on_success();
        Ok(response)
    }

    async fn fetch_setid(&self, term: &str) -> Result<Option<String>, SourceError> {
        let url = format!(
            "{}/services/v2/drugnames.json?drug_name={}",
            self.base_url,
            urlencoding::encode(term)
        );
        let response = self.guarded_get(url).await?;
        if response.status == 404 {
            return Ok(None);
        }

        let parsed: DrugNamesResponse = serde_json::from_str(&response.body).map_err(|error| {
            self.circuit_breaker.on_failure();
            SourceError::transient(format!("dailymed drugnames payload was not json: {error}"))
        })?;

        Ok(parsed
            .data
            .into_iter()
            .find_map(|entry| entry.setid.filter(|setid| !setid.is_empty())))
    }

    async fn fetch_spl(&self, setid: &str) -> Result<Option<SplDocument>, SourceError> {
        let url = format!("{}/services/v2/spls/{setid}.json", self.base_url);
        let response = self.guarded_get(url).await?;
        if response.status == 404 {
            return Ok(None);
        }

        let parsed: SplsResponse = serde_json::from_str(&response.body).map_err(|error| {
            self.circuit_breaker.on_failure();
            SourceError::transient(format!("dailymed spls payload was not json: {error}"))
        })?;

        Ok(parsed.data.into_iter().next())
    }

    async fn lookup_live(&self, name: &ResolvedName) -> Result<UsageRecord, SourceError> {
        for term in name.terms() {
            let Some(setid) = self.fetch_setid(term).await? else {
                continue;
            };

            let Some(document) = self.fetch_spl(&setid).await? else {
                continue;
            };

            let indications = pick_usage_text(&document);
            if indications.is_empty() {
                continue;
            }

            return Ok(UsageRecord {
                brand: name.brand.clone(),
                generic: name.canonical.clone(),
                indications,
                contraindications: String::new(),
                ingredients: String::new(),
                source: SourceId::Dailymed,
            });
        }

        Err(SourceError::not_found(format!(
            "dailymed has no label for '{}'",
            name.canonical
        )))
    }

    async fn lookup_sample(&self, name: &ResolvedName) -> Result<UsageRecord, SourceError> {
        let url = format!("{}/services/v2/drugnames.json", self.base_url);
        self.guarded_get(url).await?;

        let text = name.terms().find_map(sample_usage).ok_or_else(|| {
            SourceError::not_found(format!("dailymed has no label for '{}'", name.canonical))
        })?;

        Ok(UsageRecord {
            brand: name.brand.clone(),
            generic: name.canonical.clone(),
            indications: text.to_owned(),
            contraindications: String::new(),
            ingredients: String::new(),
            source: SourceId::Dailymed,
        })
    }
}

impl UsageSource for DailymedSource {
    fn id(&self) -> SourceId {
        SourceId::Dailymed
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

fn pick_usage_text(document: &SplDocument) -> String {
    let candidates = [
        &document.indications_and_usage,
        &document.clinical_pharmacology,
        &document.description,
        &document.drug_interactions,
    ];

    for field in candidates {
        if quality::is_meaningful_usage(field) {
            return field.clone();
        }
    }

    candidates
        .into_iter()
        .find(|field| !field.trim().is_empty())
        .cloned()
        .unwrap_or_default()
}

fn sample_usage(term: &str) -> Option<&'static str> {
    match term {
        "sertraline" => Some(
            "Indicated for the treatment of major depressive disorder, obsessive-compulsive disorder, panic disorder, and social anxiety disorder in adults.",
        ),
        "fluoxetine" => Some(
            "Indicated for the acute and maintenance treatment of major depressive disorder, obsessive-compulsive disorder, and bulimia nervosa.",
        ),
        "semaglutide" => Some(
            "Indicated as an adjunct to diet and exercise to improve glycemic control in adults with type 2 diabetes mellitus.",
        ),
        "fexofenadine" => Some(
            "Indicated for the relief of symptoms associated with seasonal allergic rhinitis in adults and children 2 years of age and older.",
        ),
        _ => None,
    }
}

#[derive(Debug, Deserialize)]
struct DrugNamesResponse {
    #[serde(default)]
    data: Vec<DrugNameEntry>,
}

#[derive(Debug, Deserialize)]
struct DrugNameEntry {
    #[serde(default)]
    setid: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SplsResponse {
    #[serde(default)]
    data: Vec<SplDocument>,
}

#[derive(Debug, Default, Deserialize)]
struct SplDocument {
    #[serde(default)]
    indications_and_usage: String,
    #[serde(default)]
    clinical_pharmacology: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    drug_interactions: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http_client::HttpError;
    use crate::resolver;

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

    const DRUGNAMES_BODY: &str = r#"{
        "data": [
            { "drug_name": "SERTRALINE", "setid": "set-123-abc" }
        ]
    }"#;

    const SPLS_BODY: &str = r#"{
        "data": [{
            "indications_and_usage": "Indicated for the treatment of major depressive disorder, obsessive-compulsive disorder, and panic disorder in adults.",
            "description": "Sertraline hydrochloride is a selective serotonin reuptake inhibitor."
        }]
    }"#;

    #[tokio::test]
    async fn two_step_flow_reads_spl_prose() {
        let client = FixtureClient {
            routes: vec![
                ("drugnames.json", 200, DRUGNAMES_BODY),
                ("spls/set-123-abc.json", 200, SPLS_BODY),
            ],
        };
        let source = DailymedSource::with_http_client(Arc::new(client));
        let name = resolver::resolve("zoloft");

        let record = source.lookup(&name).await.expect("spl hit");
        assert_eq!(record.source, SourceId::Dailymed);
        assert!(record.indications.contains("major depressive disorder"));
    }

    #[tokio::test]
    async fn missing_setid_is_not_found() {
        let client = FixtureClient {
            routes: vec![("drugnames.json", 200, r#"{"data":[]}"#)],
        };
        let source = DailymedSource::with_http_client(Arc::new(client));
        let name = resolver::resolve("notamedicine");

        let error = source.lookup(&name).await.expect_err("miss");
        assert_eq!(error.code(), "source.not_found");
    }

    #[tokio::test]
    async fn open_circuit_short_circuits_before_transport() {
        let breaker = Arc::new(CircuitBreaker::default());
        breaker.on_failure();
        breaker.on_failure();
        breaker.on_failure();

        let client = FixtureClient { routes: vec![] };
        let source = DailymedSource::with_http_client(Arc::new(client))
            .with_circuit_breaker(Arc::clone(&breaker));
        let name = resolver::resolve("sertraline");

        let error = source.lookup(&name).await.expect_err("circuit open");
        assert_eq!(error.code(), "source.circuit_open");
    }
}
