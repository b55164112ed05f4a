use std::time::Instant;

use dawaa_core::resolve;
use serde_json::{json, Value};

use crate::cli::ResolveArgs;
use crate::error::CliError;

use super::{elapsed_ms, fallback_chain, CommandResult};

pub fn run(args: &ResolveArgs) -> Result<CommandResult, CliError> {
    let started = Instant::now();

    let resolutions: Vec<Value> = args
        .names
        .iter()
        .map(|input| {
            let resolved = resolve(input);
            json!({
                "input": input,
                "canonical": resolved.canonical,
                "brand": resolved.brand,
                "confidence": resolved.confidence,
            })
        })
        .collect();

    let data = json!({
        "count": resolutions.len(),
        "resolutions": resolutions,
    });

    Ok(CommandResult::ok(data, fallback_chain()).with_latency(elapsed_ms(started)))
}
