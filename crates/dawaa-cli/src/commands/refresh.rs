use std::time::Instant;

use dawaa_core::{BatchPacer, EnvelopeError, LabelStore, SourceErrorKind, SourceId};
use serde_json::json;

use crate::cli::{Cli, RefreshArgs};
use crate::error::CliError;
use crate::metadata::RequestId;

use super::{build_directory, elapsed_ms, CommandResult};

pub async fn run(
    args: &RefreshArgs,
    cli: &Cli,
    request_id: RequestId,
) -> Result<CommandResult, CliError> {
    let started = Instant::now();
    let store = LabelStore::open_default()?;
    let directory = build_directory(cli);
    let pacer = BatchPacer::default();
    let request_id = request_id.to_string();

    let medicines = store.medicines_for_refresh()?;
    let total = medicines.len();
    let cap = args.limit.unwrap_or(total);

    let mut refreshed = 0usize;
    let mut failed = 0usize;
    let mut warnings = Vec::new();
    let mut errors = Vec::new();

    for medicine in medicines.into_iter().take(cap) {
        let Some(external_id) = medicine.external_id.as_deref() else {
            continue;
        };

        pacer.pace().await;
        let item_started = Instant::now();

        match directory.fetch_details(external_id).await {
            Ok(Some(quote)) => match quote.price {
                Some(price) => {
                    store.record_price(&medicine.trade_name, price, &quote.currency)?;
                    store.log_refresh(
                        &request_id,
                        &medicine.trade_name,
                        SourceId::Prices.as_str(),
                        "ok",
                        Some(elapsed_ms(item_started)),
                    )?;
                    refreshed += 1;
                }
                None => {
                    store.log_refresh(
                        &request_id,
                        &medicine.trade_name,
                        SourceId::Prices.as_str(),
                        "no_price",
                        Some(elapsed_ms(item_started)),
                    )?;
                    failed += 1;
                }
            },
            Ok(None) => {
                store.log_refresh(
                    &request_id,
                    &medicine.trade_name,
                    SourceId::Prices.as_str(),
                    "miss",
                    Some(elapsed_ms(item_started)),
                )?;
                failed += 1;
            }
            Err(error) => {
                store.log_refresh(
                    &request_id,
                    &medicine.trade_name,
                    SourceId::Prices.as_str(),
                    "failed",
                    Some(elapsed_ms(item_started)),
                )?;
                errors.push(EnvelopeError::from_source_error(SourceId::Prices, &error));
                failed += 1;

                if matches!(
                    error.kind(),
                    SourceErrorKind::RateLimited | SourceErrorKind::CircuitOpen
                ) {
                    warnings.push(format!(
                        "stopping refresh early at '{}': {}",
                        medicine.trade_name,
                        error.message()
                    ));
                    break;
                }
            }
        }
    }

    let data = json!({
        "total": total,
        "attempted": refreshed + failed,
        "refreshed": refreshed,
        "failed": failed,
    });

    Ok(CommandResult::ok(data, vec![SourceId::Prices])
        .with_warnings(warnings)
        .with_errors(errors)
        .with_latency(elapsed_ms(started)))
}
