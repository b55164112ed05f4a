use std::time::Instant;

use dawaa_core::{LabelStore, QueryGuardrails};

use crate::cli::SqlArgs;
use crate::error::CliError;

use super::{elapsed_ms, fallback_chain, CommandResult};

pub fn run(args: &SqlArgs) -> Result<CommandResult, CliError> {
    let started = Instant::now();
    let store = LabelStore::open_default()?;

    let guardrails = QueryGuardrails {
        max_rows: args.max_rows,
        query_timeout_ms: args.query_timeout_ms,
    };
    let result = store.execute_query(&args.query, guardrails, args.write)?;
    let truncated = result.truncated;

    let data = serde_json::to_value(&result)?;
    let mut command_result =
        CommandResult::ok(data, fallback_chain()).with_latency(elapsed_ms(started));

    if truncated {
        command_result = command_result
            .with_warning(format!("result truncated to the first {} rows", args.max_rows));
    }

    Ok(command_result)
}
