//! Reporting views over the label store.

use ::duckdb::Connection;

/// Create the reporting views.
///
/// - `vw_label_coverage`: label row count per generic name.
/// - `vw_refresh_failures`: failed lookups/refreshes per source.
/// - `vw_price_latest`: most recent price per tracked medicine.
///
/// # Errors
/// Returns an error if the view creation SQL fails to execute.
pub fn create_views(connection: &Connection) -> Result<(), ::duckdb::Error> {
    connection.execute_batch(
        r"
CREATE OR REPLACE VIEW vw_label_coverage AS
SELECT
    LOWER(generic) AS generic,
    COUNT(*) AS label_count,
    MAX(updated_at) AS last_updated
FROM labels
GROUP BY LOWER(generic);

CREATE OR REPLACE VIEW vw_refresh_failures AS
SELECT
    source,
    status,
    COUNT(*) AS occurrences,
    AVG(latency_ms)::DOUBLE AS avg_latency_ms
FROM refresh_log
WHERE status <> 'ok'
GROUP BY source, status;

CREATE OR REPLACE VIEW vw_price_latest AS
SELECT
    trade_name,
    generic_name,
    price,
    currency,
    external_id,
    last_updated
FROM medicines
WHERE price IS NOT NULL;
",
    )?;

    Ok(())
}
