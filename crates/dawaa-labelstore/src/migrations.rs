//! Schema migrations for the label store.

use ::duckdb::Connection;

/// Apply the base schema. Statements are idempotent so the store may be
/// reopened by any process without coordination.
///
/// Tables:
/// - `labels`: one row per regulatory label, keyed by the archive set id.
///   `generic` is the lookup column for the offline usage source.
/// - `medicines`: tracked medicine records with the latest known price and
///   the pricing directory's external id.
/// - `refresh_log`: audit trail of lookups and batch refreshes.
///
/// # Errors
/// Returns an error if any DDL statement fails to execute.
pub fn apply_migrations(connection: &Connection) -> Result<(), ::duckdb::Error> {
    connection.execute_batch(
        r"
CREATE TABLE IF NOT EXISTS labels (
    setid VARCHAR PRIMARY KEY,
    brand VARCHAR,
    generic VARCHAR NOT NULL,
    indications VARCHAR,
    contraindications VARCHAR,
    ingredients VARCHAR,
    updated_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP
);
CREATE INDEX IF NOT EXISTS idx_labels_generic ON labels (generic);

CREATE TABLE IF NOT EXISTS medicines (
    trade_name VARCHAR PRIMARY KEY,
    generic_name VARCHAR,
    reg_no VARCHAR,
    applicant VARCHAR,
    price DOUBLE,
    currency VARCHAR DEFAULT 'EGP',
    external_id VARCHAR,
    last_updated TIMESTAMP,
    source VARCHAR
);

CREATE TABLE IF NOT EXISTS refresh_log (
    request_id VARCHAR NOT NULL,
    name VARCHAR NOT NULL,
    source VARCHAR NOT NULL,
    status VARCHAR NOT NULL,
    latency_ms BIGINT,
    timestamp TIMESTAMP DEFAULT CURRENT_TIMESTAMP
);
",
    )?;

    Ok(())
}
