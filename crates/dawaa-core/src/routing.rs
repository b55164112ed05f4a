use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::{Duration, Instant};

use dawaa_labelstore::LabelStore;

use crate::adapters::{
    CuratedSource, DailymedSource, LabelStoreSource, OpenFdaSource, RxnavSource,
};
use crate::data_source::{HealthState, SourceError, UsageSource};
use crate::domain::{MedicineQuery, ResolvedName, SourceId, UsageRecord};
use crate::envelope::EnvelopeError;
use crate::http_client::{HttpClient, ReqwestHttpClient};
use crate::resolver;

/// Usage sources in fallback priority order.
///
/// The chain is fixed: cheap and offline first, live APIs last. Sources are
/// consulted sequentially and the first acceptable record wins.
pub const DEFAULT_CHAIN: [SourceId; 5] = [
    SourceId::Curated,
    SourceId::Labels,
    SourceId::Rxnav,
    SourceId::Openfda,
    SourceId::Dailymed,
];

/// Source selection strategy for routing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceStrategy {
    Auto,
    Priority(Vec<SourceId>),
    Strict(SourceId),
}

impl SourceStrategy {
    fn is_strict(&self) -> bool {
        matches!(self, Self::Strict(_))
    }
}

/// Successful routed lookup.
#[derive(Debug, Clone)]
pub struct RouteSuccess<T> {
    pub data: T,
    pub resolved: ResolvedName,
    pub selected_source: SourceId,
    pub source_chain: Vec<SourceId>,
    pub warnings: Vec<String>,
    pub errors: Vec<EnvelopeError>,
    pub latency_ms: u64,
}

/// Failed routed lookup after exhausting the chain.
///
/// `error` is always the `Unavailable` sentinel; per-source failures live in
/// `errors` as diagnostics. Raw adapter errors never reach the caller.
#[derive(Debug, Clone)]
pub struct RouteFailure {
    pub error: SourceError,
    pub resolved: ResolvedName,
    pub source_chain: Vec<SourceId>,
    pub warnings: Vec<String>,
    pub errors: Vec<EnvelopeError>,
    pub latency_ms: u64,
}

pub type RouteResult<T> = Result<RouteSuccess<T>, RouteFailure>;

/// Source snapshot used by the `sources` CLI command.
#[derive(Debug, Clone, Copy)]
pub struct SourceSnapshot {
    pub id: SourceId,
    pub health: HealthState,
    pub rate_available: bool,
}

impl SourceSnapshot {
    pub fn available(self) -> bool {
        self.health != HealthState::Unhealthy
    }

    pub fn status_label(self) -> &'static str {
        if !self.rate_available {
            return "rate_limited";
        }

        match self.health {
            HealthState::Healthy => "healthy",
            HealthState::Degraded => "degraded",
            HealthState::Unhealthy => "unhealthy",
        }
    }
}

/// Source registry and fallback engine for usage lookups.
pub struct UsageRouter {
    sources: HashMap<SourceId, Arc<dyn UsageSource>>,
}

impl Default for UsageRouter {
    fn default() -> Self {
        UsageRouterBuilder::new().build()
    }
}

/// Builder for a `UsageRouter` with the standard source set.
///
/// Without a label store the `Labels` source stays unregistered and the
/// router records a skip diagnostic for it on every lookup. Live adapters
/// default to sample mode; `with_real_clients` switches them to one shared
/// reqwest client.
///
/// # Example
///
/// ```rust,ignore
/// use dawaa_core::routing::UsageRouterBuilder;
///
/// let router = UsageRouterBuilder::new()
///     .with_real_clients()
///     .build();
/// ```
#[derive(Default)]
pub struct UsageRouterBuilder {
    use_real: bool,
    store: Option<Arc<LabelStore>>,
    extra: Vec<Arc<dyn UsageSource>>,
}

impl UsageRouterBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Switch the live adapters to real HTTP clients.
    pub fn with_real_clients(mut self) -> Self {
        self.use_real = true;
        self
    }

    /// Register the offline label store as the `Labels` source.
    pub fn with_label_store(mut self, store: Arc<LabelStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Register an extra source, replacing any standard source with the
    /// same id.
    pub fn with_source(mut self, source: Arc<dyn UsageSource>) -> Self {
        self.extra.push(source);
        self
    }

    pub fn build(self) -> UsageRouter {
        let mut sources: Vec<Arc<dyn UsageSource>> = vec![Arc::new(CuratedSource::new())];

        if let Some(store) = self.store {
            sources.push(Arc::new(LabelStoreSource::new(store)));
        }

        if self.use_real {
            let http_client: Arc<dyn HttpClient> = Arc::new(ReqwestHttpClient::new());
            sources.push(Arc::new(RxnavSource::with_http_client(Arc::clone(
                &http_client,
            ))));
            sources.push(Arc::new(OpenFdaSource::with_http_client(Arc::clone(
                &http_client,
            ))));
            sources.push(Arc::new(DailymedSource::with_http_client(http_client)));
        } else {
            sources.push(Arc::new(RxnavSource::new()));
            sources.push(Arc::new(OpenFdaSource::new()));
            sources.push(Arc::new(DailymedSource::new()));
        }

        sources.extend(self.extra);
        UsageRouter::new(sources)
    }
}

impl UsageRouter {
    /// Build a router from an explicit source list. A later source with a
    /// duplicate id replaces the earlier one.
    pub fn new(sources: Vec<Arc<dyn UsageSource>>) -> Self {
        let sources = sources
            .into_iter()
            .map(|source| (source.id(), source))
            .collect();
        Self { sources }
    }

    pub fn is_registered(&self, id: SourceId) -> bool {
        self.sources.contains_key(&id)
    }

    pub fn snapshot(&self, id: SourceId) -> Option<SourceSnapshot> {
        let source = self.sources.get(&id)?;
        Some(SourceSnapshot {
            id,
            health: source.health(),
            rate_available: source.rate_available(),
        })
    }

    /// Snapshots of every registered chain source, in chain order.
    pub fn snapshots(&self) -> Vec<SourceSnapshot> {
        DEFAULT_CHAIN
            .iter()
            .filter_map(|id| self.snapshot(*id))
            .collect()
    }

    /// Resolve the query once and walk the fallback chain for usage text.
    pub async fn fetch_usage(&self, query: &MedicineQuery) -> RouteResult<UsageRecord> {
        self.fetch_usage_with(query, SourceStrategy::Auto).await
    }

    pub async fn fetch_usage_with(
        &self,
        query: &MedicineQuery,
        strategy: SourceStrategy,
    ) -> RouteResult<UsageRecord> {
        let started = Instant::now();
        let resolved = resolver::resolve(query.raw());
        let planned_chain = plan_sources(&strategy);

        let mut source_chain = Vec::with_capacity(planned_chain.len());
        let mut errors = Vec::new();

        for id in planned_chain {
            source_chain.push(id);
            let Some(source) = self.sources.get(&id) else {
                errors.push(to_envelope_error(id, &SourceError::unregistered(id)));
                if strategy.is_strict() {
                    break;
                }
                continue;
            };

            if source.health() == HealthState::Unhealthy {
                errors.push(to_envelope_error(id, &SourceError::circuit_open(id)));
                if strategy.is_strict() {
                    break;
                }
                continue;
            }

            if !source.rate_available() {
                errors.push(to_envelope_error(
                    id,
                    &SourceError::rate_limited("source has no rate budget available"),
                ));
                if strategy.is_strict() {
                    break;
                }
                continue;
            }

            match source.lookup(&resolved).await {
                Ok(record) if record.is_acceptable() => {
                    let mut warnings = Vec::new();
                    if !errors.is_empty() {
                        warnings.push(format!(
                            "usage fallback succeeded with '{}' after {} skipped or failed source(s)",
                            id.as_str(),
                            errors.len()
                        ));
                    }

                    return Ok(RouteSuccess {
                        data: record,
                        resolved,
                        selected_source: id,
                        source_chain,
                        warnings,
                        errors,
                        latency_ms: elapsed_ms(started),
                    });
                }
                Ok(_) => {
                    errors.push(to_envelope_error(
                        id,
                        &SourceError::not_found("source answered without substantive usage text"),
                    ));
                    if strategy.is_strict() {
                        break;
                    }
                }
                Err(error) => {
                    errors.push(to_envelope_error(id, &error));
                    if strategy.is_strict() {
                        break;
                    }
                }
            }
        }

        let error = SourceError::unavailable(format!(
            "no usage information found for '{}' across {} source(s)",
            resolved.canonical,
            source_chain.len()
        ));
        if errors.is_empty() {
            errors.push(EnvelopeError::from_source_error(
                *source_chain.first().unwrap_or(&SourceId::Curated),
                &error,
            ));
        }

        Err(RouteFailure {
            error,
            resolved,
            source_chain,
            warnings: vec![String::from("all usage sources were exhausted")],
            errors,
            latency_ms: elapsed_ms(started),
        })
    }

    /// Run the whole chain under one budget.
    ///
    /// An elapsed budget yields the same `Unavailable` sentinel shape as
    /// chain exhaustion, never a raw timeout error.
    pub async fn fetch_usage_within(
        &self,
        query: &MedicineQuery,
        budget: Duration,
        strategy: SourceStrategy,
    ) -> RouteResult<UsageRecord> {
        let started = Instant::now();
        match tokio::time::timeout(budget, self.fetch_usage_with(query, strategy)).await {
            Ok(result) => result,
            Err(_) => {
                let resolved = resolver::resolve(query.raw());
                let error = SourceError::unavailable(format!(
                    "usage lookup for '{}' exceeded the {} ms budget",
                    resolved.canonical,
                    budget.as_millis()
                ));
                let diagnostic = EnvelopeError::from_source_error(SourceId::Curated, &error);
                Err(RouteFailure {
                    error,
                    resolved,
                    source_chain: DEFAULT_CHAIN.to_vec(),
                    warnings: vec![String::from("usage lookup budget elapsed")],
                    errors: vec![diagnostic],
                    latency_ms: elapsed_ms(started),
                })
            }
        }
    }
}

fn plan_sources(strategy: &SourceStrategy) -> Vec<SourceId> {
    match strategy {
        SourceStrategy::Auto => DEFAULT_CHAIN.to_vec(),
        SourceStrategy::Priority(priority) => dedupe_chain(priority),
        SourceStrategy::Strict(id) => vec![*id],
    }
}

fn dedupe_chain(chain: &[SourceId]) -> Vec<SourceId> {
    let mut seen = HashSet::new();
    let mut output = Vec::with_capacity(chain.len());

    for id in chain {
        if seen.insert(*id) {
            output.push(*id);
        }
    }

    output
}

fn to_envelope_error(id: SourceId, error: &SourceError) -> EnvelopeError {
    EnvelopeError::from_source_error(id, error)
}

fn elapsed_ms(started: Instant) -> u64 {
    started.elapsed().as_millis().min(u128::from(u64::MAX)) as u64
}

/// Render a routed result as one human sentence.
///
/// Exhaustion never reads as a hard "no information": the reply suggests a
/// next step instead, so a chat layer can hand it to the user verbatim.
pub fn compose_reply(result: &RouteResult<UsageRecord>) -> String {
    match result {
        Ok(success) => {
            let record = &success.data;
            let display = record
                .brand
                .as_deref()
                .filter(|brand| !brand.eq_ignore_ascii_case(&record.generic))
                .map(|brand| format!("{brand} ({})", record.generic))
                .unwrap_or_else(|| record.generic.clone());
            format!(
                "{display}: {} [source: {}]",
                success.data.indications, success.selected_source
            )
        }
        Err(failure) => format!(
            "I could not confirm usage details for '{}' right now. \
             Double-check the spelling or try the trade name printed on the box, \
             and I can still look up its price and availability.",
            failure.resolved.canonical
        ),
    }
}
