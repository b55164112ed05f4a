use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use dawaa_core::{
    adapters::CuratedSource,
    data_source::{SourceError, SourceErrorKind, UsageSource},
    routing::{SourceStrategy, UsageRouter, UsageRouterBuilder},
    MedicineQuery, ResolvedName, SourceId, UsageRecord,
};

#[derive(Clone, Copy)]
enum Behavior {
    Answer(&'static str),
    Miss,
    Outage,
}

struct RecordingSource {
    id: SourceId,
    behavior: Behavior,
    calls: Arc<AtomicUsize>,
}

impl RecordingSource {
    fn new(id: SourceId, behavior: Behavior) -> (Arc<Self>, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        let source = Arc::new(Self {
            id,
            behavior,
            calls: Arc::clone(&calls),
        });
        (source, calls)
    }
}

impl UsageSource for RecordingSource {
    fn id(&self) -> SourceId {
        self.id
    }

    fn lookup<'a>(
        &'a self,
        name: &'a ResolvedName,
    ) -> Pin<Box<dyn Future<Output = Result<UsageRecord, SourceError>> + Send + 'a>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let behavior = self.behavior;
        let id = self.id;
        let generic = name.canonical.clone();

        Box::pin(async move {
            match behavior {
                Behavior::Answer(text) => Ok(UsageRecord {
                    brand: None,
                    generic,
                    indications: text.to_owned(),
                    contraindications: String::new(),
                    ingredients: String::new(),
                    source: id,
                }),
                Behavior::Miss => Err(SourceError::not_found("nothing recorded for this name")),
                Behavior::Outage => Err(SourceError::transient("upstream service buckled")),
            }
        })
    }
}

const GOOD_TEXT: &str =
    "Used for the relief of mild to moderate pain and the reduction of fever in adults.";

fn query(raw: &str) -> MedicineQuery {
    MedicineQuery::new(raw).expect("valid query")
}

#[tokio::test]
async fn test_curated_hit_never_contacts_live_sources() {
    let (rxnav, rxnav_calls) = RecordingSource::new(SourceId::Rxnav, Behavior::Answer(GOOD_TEXT));
    let (openfda, openfda_calls) =
        RecordingSource::new(SourceId::Openfda, Behavior::Answer(GOOD_TEXT));
    let (dailymed, dailymed_calls) =
        RecordingSource::new(SourceId::Dailymed, Behavior::Answer(GOOD_TEXT));

    let router = UsageRouter::new(vec![Arc::new(CuratedSource::new()), rxnav, openfda, dailymed]);

    let route = router
        .fetch_usage(&query("كلاريتين"))
        .await
        .expect("curated answer");

    assert_eq!(route.selected_source, SourceId::Curated);
    assert_eq!(route.data.generic, "loratadine");
    assert_eq!(rxnav_calls.load(Ordering::SeqCst), 0);
    assert_eq!(openfda_calls.load(Ordering::SeqCst), 0);
    assert_eq!(dailymed_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_first_live_answer_stops_the_chain() {
    let (curated, _) = RecordingSource::new(SourceId::Curated, Behavior::Miss);
    let (labels, _) = RecordingSource::new(SourceId::Labels, Behavior::Miss);
    let (rxnav, _) = RecordingSource::new(SourceId::Rxnav, Behavior::Answer(GOOD_TEXT));
    let (openfda, openfda_calls) =
        RecordingSource::new(SourceId::Openfda, Behavior::Answer(GOOD_TEXT));
    let (dailymed, dailymed_calls) =
        RecordingSource::new(SourceId::Dailymed, Behavior::Answer(GOOD_TEXT));

    let router = UsageRouter::new(vec![curated, labels, rxnav, openfda, dailymed]);

    let route = router
        .fetch_usage(&query("aspirin"))
        .await
        .expect("rxnav answer");

    assert_eq!(route.selected_source, SourceId::Rxnav);
    assert_eq!(
        route.source_chain,
        vec![SourceId::Curated, SourceId::Labels, SourceId::Rxnav]
    );
    assert_eq!(openfda_calls.load(Ordering::SeqCst), 0);
    assert_eq!(dailymed_calls.load(Ordering::SeqCst), 0);
    assert_eq!(route.errors.len(), 2);
}

#[tokio::test]
async fn test_exhausted_chain_is_the_unavailable_sentinel() {
    let (curated, _) = RecordingSource::new(SourceId::Curated, Behavior::Miss);
    let (labels, _) = RecordingSource::new(SourceId::Labels, Behavior::Outage);
    let (rxnav, _) = RecordingSource::new(SourceId::Rxnav, Behavior::Miss);
    let (openfda, _) = RecordingSource::new(SourceId::Openfda, Behavior::Outage);
    let (dailymed, _) = RecordingSource::new(SourceId::Dailymed, Behavior::Miss);

    let router = UsageRouter::new(vec![curated, labels, rxnav, openfda, dailymed]);

    let failure = router
        .fetch_usage(&query("xyzzynonexistent123"))
        .await
        .expect_err("no source can answer");

    assert_eq!(failure.error.kind(), SourceErrorKind::Unavailable);
    assert!(failure.error.message().contains("xyzzynonexistent123"));
    assert_eq!(failure.errors.len(), 5);
    assert!(failure
        .errors
        .iter()
        .any(|error| error.code == "source.transient"));
    assert!(failure
        .errors
        .iter()
        .any(|error| error.code == "source.not_found"));
}

#[tokio::test]
async fn test_storeless_builder_reports_labels_as_unregistered() {
    let router = UsageRouterBuilder::new().build();
    assert!(router.snapshot(SourceId::Labels).is_none());

    let failure = router
        .fetch_usage(&query("xyzzynonexistent123"))
        .await
        .expect_err("sample sources know nothing about garbage");

    assert!(failure
        .errors
        .iter()
        .any(|error| error.code == "source.unregistered"));
}

#[tokio::test]
async fn test_strict_strategy_does_not_fall_back() {
    let (curated, _) = RecordingSource::new(SourceId::Curated, Behavior::Miss);
    let (rxnav, rxnav_calls) = RecordingSource::new(SourceId::Rxnav, Behavior::Answer(GOOD_TEXT));

    let router = UsageRouter::new(vec![curated, rxnav]);

    let failure = router
        .fetch_usage_with(&query("aspirin"), SourceStrategy::Strict(SourceId::Curated))
        .await
        .expect_err("strict lookup must not fall back");

    assert_eq!(failure.source_chain, vec![SourceId::Curated]);
    assert_eq!(rxnav_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_repeated_queries_are_idempotent() {
    let router = UsageRouterBuilder::new().build();
    let question = query("بانادول");

    let first = router.fetch_usage(&question).await.expect("curated answer");
    let second = router.fetch_usage(&question).await.expect("curated answer");

    assert_eq!(first.data, second.data);
    assert_eq!(first.selected_source, second.selected_source);
    assert_eq!(first.source_chain, second.source_chain);
    assert_eq!(first.resolved, second.resolved);
}
