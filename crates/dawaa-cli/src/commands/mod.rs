mod price;
mod refresh;
mod resolve;
mod sources;
mod sql;
mod usage;

use std::sync::Arc;
use std::time::Instant;

use dawaa_core::{
    Envelope, EnvelopeError, LabelStore, PriceDirectory, ReqwestHttpClient, SourceId,
    SourceStrategy, UsageRouter, UsageRouterBuilder, DEFAULT_CHAIN,
};
use serde_json::Value;

use crate::cli::{Cli, Command, SourceSelector};
use crate::error::CliError;
use crate::metadata::{Metadata, RequestId};

pub struct CommandResult {
    pub data: Value,
    pub warnings: Vec<String>,
    pub errors: Vec<EnvelopeError>,
    pub latency_ms: u64,
    pub source_chain: Vec<SourceId>,
}

impl CommandResult {
    pub fn ok(data: Value, source_chain: Vec<SourceId>) -> Self {
        Self {
            data,
            warnings: Vec::new(),
            errors: Vec::new(),
            latency_ms: 0,
            source_chain,
        }
    }

    pub fn with_warning(mut self, warning: impl Into<String>) -> Self {
        self.warnings.push(warning.into());
        self
    }

    pub fn with_warnings(mut self, warnings: Vec<String>) -> Self {
        self.warnings.extend(warnings);
        self
    }

    pub fn with_errors(mut self, errors: Vec<EnvelopeError>) -> Self {
        self.errors.extend(errors);
        self
    }

    pub fn with_latency(mut self, latency_ms: u64) -> Self {
        self.latency_ms = latency_ms;
        self
    }
}

pub async fn run(cli: &Cli) -> Result<Envelope<Value>, CliError> {
    let request_id = RequestId::new_v4();

    let command_result = match &cli.command {
        Command::Resolve(args) => resolve::run(args)?,
        Command::Usage(args) => usage::run(args, cli, request_id).await?,
        Command::Price(args) => price::run(args, cli).await?,
        Command::Refresh(args) => refresh::run(args, cli, request_id).await?,
        Command::Sql(args) => sql::run(args)?,
        Command::Sources(args) => sources::run(args, cli)?,
    };

    let CommandResult {
        data,
        warnings,
        errors,
        latency_ms,
        source_chain,
    } = command_result;

    let mut metadata = Metadata::new(request_id, source_chain, latency_ms)?;

    for warning in warnings {
        metadata.push_warning(warning);
    }

    let meta = metadata.into_envelope_meta()?;

    Envelope::with_errors(meta, data, errors).map_err(CliError::from)
}

fn to_source_strategy(source: SourceSelector) -> SourceStrategy {
    match source {
        SourceSelector::Auto => SourceStrategy::Auto,
        SourceSelector::Curated => SourceStrategy::Strict(SourceId::Curated),
        SourceSelector::Labels => SourceStrategy::Strict(SourceId::Labels),
        SourceSelector::Rxnav => SourceStrategy::Strict(SourceId::Rxnav),
        SourceSelector::Openfda => SourceStrategy::Strict(SourceId::Openfda),
        SourceSelector::Dailymed => SourceStrategy::Strict(SourceId::Dailymed),
    }
}

/// Open the default label store, degrading to a storeless run with a
/// warning when the local database is unavailable.
fn open_store() -> (Option<Arc<LabelStore>>, Option<String>) {
    match LabelStore::open_default() {
        Ok(store) => (Some(Arc::new(store)), None),
        Err(error) => (None, Some(format!("label store unavailable: {error}"))),
    }
}

fn build_router(cli: &Cli, store: Option<Arc<LabelStore>>) -> UsageRouter {
    let mut builder = UsageRouterBuilder::new();
    if !cli.sample {
        builder = builder.with_real_clients();
    }
    if let Some(store) = store {
        builder = builder.with_label_store(store);
    }
    builder.build()
}

fn build_directory(cli: &Cli) -> PriceDirectory {
    if cli.sample {
        PriceDirectory::new()
    } else {
        PriceDirectory::with_http_client(Arc::new(ReqwestHttpClient::new()))
    }
}

/// Source chain reported by commands that never consult a usage source.
fn fallback_chain() -> Vec<SourceId> {
    DEFAULT_CHAIN.to_vec()
}

fn elapsed_ms(started: Instant) -> u64 {
    started.elapsed().as_millis().min(u128::from(u64::MAX)) as u64
}
