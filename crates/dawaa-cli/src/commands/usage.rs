use std::time::Duration;

use dawaa_core::{
    compose_reply, EnvelopeError, MedicineQuery, RouteFailure, RouteSuccess, SourceId,
};
use serde_json::json;

use crate::cli::{Cli, UsageArgs};
use crate::error::CliError;
use crate::metadata::RequestId;

use super::{build_router, open_store, to_source_strategy, CommandResult};

pub async fn run(
    args: &UsageArgs,
    cli: &Cli,
    request_id: RequestId,
) -> Result<CommandResult, CliError> {
    let name = args.name.join(" ");
    let query = MedicineQuery::new(name.as_str())?;

    let (store, store_warning) = open_store();
    let router = build_router(cli, store.clone());
    let strategy = to_source_strategy(cli.source);
    let budget = Duration::from_millis(cli.timeout_ms.max(1));

    let outcome = router.fetch_usage_within(&query, budget, strategy).await;
    let reply = compose_reply(&outcome);

    let (audit_source, audit_status, latency_ms) = match &outcome {
        Ok(route) => (route.selected_source.as_str(), "ok", route.latency_ms),
        Err(failure) => ("none", "unavailable", failure.latency_ms),
    };
    let audit_warning = store.as_ref().and_then(|store| {
        store
            .log_refresh(
                &request_id.to_string(),
                &name,
                audit_source,
                audit_status,
                Some(latency_ms),
            )
            .err()
            .map(|error| format!("usage audit log failed: {error}"))
    });

    let mut result = match outcome {
        Ok(RouteSuccess {
            data: record,
            resolved,
            selected_source: _,
            source_chain,
            warnings,
            errors,
            latency_ms,
        }) => {
            let data = json!({
                "query": name,
                "resolved": resolved,
                "record": record,
                "reply": reply,
            });

            CommandResult::ok(data, source_chain)
                .with_errors(errors)
                .with_warnings(warnings)
                .with_latency(latency_ms)
        }
        Err(RouteFailure {
            error,
            resolved,
            source_chain,
            warnings,
            mut errors,
            latency_ms,
        }) => {
            let data = json!({
                "query": name,
                "resolved": resolved,
                "record": null,
                "reply": reply,
            });

            if !errors.iter().any(|diagnostic| diagnostic.code == error.code()) {
                let last_consulted = source_chain.last().copied().unwrap_or(SourceId::Curated);
                errors.insert(0, EnvelopeError::from_source_error(last_consulted, &error));
            }

            CommandResult::ok(data, source_chain)
                .with_errors(errors)
                .with_warnings(warnings)
                .with_latency(latency_ms)
        }
    };

    if let Some(warning) = store_warning {
        result = result.with_warning(warning);
    }
    if let Some(warning) = audit_warning {
        result = result.with_warning(warning);
    }

    Ok(result)
}
