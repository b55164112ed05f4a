use std::time::Instant;

use dawaa_core::{SourceId, SourceSnapshot, DEFAULT_CHAIN};
use serde_json::{json, Value};

use crate::cli::{Cli, SourcesArgs};
use crate::error::CliError;

use super::{build_directory, build_router, elapsed_ms, fallback_chain, open_store, CommandResult};

pub fn run(args: &SourcesArgs, cli: &Cli) -> Result<CommandResult, CliError> {
    let started = Instant::now();

    let (store, store_warning) = open_store();
    let router = build_router(cli, store);
    let directory = build_directory(cli);

    let mut rows: Vec<Value> = Vec::with_capacity(DEFAULT_CHAIN.len() + 1);
    for id in DEFAULT_CHAIN {
        match router.snapshot(id) {
            Some(snapshot) => rows.push(snapshot_row(snapshot, args.verbose)),
            None => rows.push(json!({
                "id": id,
                "status": "unregistered",
                "registered": false,
            })),
        }
    }

    rows.push(snapshot_row(
        SourceSnapshot {
            id: SourceId::Prices,
            health: directory.health(),
            rate_available: directory.rate_available(),
        },
        args.verbose,
    ));

    let data = json!({
        "chain": DEFAULT_CHAIN.to_vec(),
        "sources": rows,
    });

    let mut result = CommandResult::ok(data, fallback_chain()).with_latency(elapsed_ms(started));
    if let Some(warning) = store_warning {
        result = result.with_warning(warning);
    }

    Ok(result)
}

fn snapshot_row(snapshot: SourceSnapshot, verbose: bool) -> Value {
    if verbose {
        json!({
            "id": snapshot.id,
            "status": snapshot.status_label(),
            "registered": true,
            "health": snapshot.health,
            "rate_available": snapshot.rate_available,
        })
    } else {
        json!({
            "id": snapshot.id,
            "status": snapshot.status_label(),
            "registered": true,
        })
    }
}
