use std::time::Instant;

use dawaa_core::{EnvelopeError, MedicineQuery, SourceId};
use serde_json::json;

use crate::cli::{Cli, PriceArgs};
use crate::error::CliError;

use super::{build_directory, elapsed_ms, CommandResult};

pub async fn run(args: &PriceArgs, cli: &Cli) -> Result<CommandResult, CliError> {
    let started = Instant::now();
    let name = args.name.join(" ");

    // The directory is keyed by trade name, so the raw input is the search
    // term; resolving to a generic first would miss its listings.
    let query = MedicineQuery::new(name.as_str())?;
    let directory = build_directory(cli);

    match directory.search_with_details(query.raw()).await {
        Ok(quotes) => {
            let count = quotes.len();
            let data = json!({
                "query": name,
                "count": count,
                "quotes": quotes,
            });

            let mut result =
                CommandResult::ok(data, vec![SourceId::Prices]).with_latency(elapsed_ms(started));
            if count == 0 {
                result = result.with_warning(format!("no directory products matched '{name}'"));
            }
            Ok(result)
        }
        Err(error) => {
            let data = json!({
                "query": name,
                "count": 0,
                "quotes": [],
            });
            let diagnostic = EnvelopeError::from_source_error(SourceId::Prices, &error);

            Ok(CommandResult::ok(data, vec![SourceId::Prices])
                .with_errors(vec![diagnostic])
                .with_latency(elapsed_ms(started)))
        }
    }
}
