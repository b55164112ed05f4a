//! # Dawaa Label Store
//!
//! DuckDB-based offline storage for dawaa.
//!
//! ## Overview
//!
//! This crate persists the data the online sources cannot be trusted to
//! always serve: regulatory label text ingested from bulk archives, tracked
//! medicine records with their latest known prices, and an audit log of
//! lookups and refreshes.
//!
//! ### Features
//!
//! - 🔒 **Secure SQL**: parameterized statements for everything user-shaped
//! - 📦 **Offline labels**: generic-name keyed lookups with a brand fallback
//! - ⚡ **Query guardrails**: row limits and timeouts on the ad-hoc surface
//! - 🔄 **Connection pooling**: cheap reuse on the chat lookup path
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use dawaa_labelstore::{LabelStore, QueryGuardrails};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let store = LabelStore::open_default()?;
//!
//!     if let Some(label) = store.find_label("loratadine")? {
//!         println!("{}: {}", label.generic, label.indications);
//!     }
//!
//!     let result = store.execute_query(
//!         "SELECT generic, label_count FROM vw_label_coverage",
//!         QueryGuardrails::default(),
//!         false, // read-only
//!     )?;
//!     println!("{} generics covered", result.row_count);
//!     Ok(())
//! }
//! ```
//!
//! ## Tables
//!
//! | Table | Description |
//! |-------|-------------|
//! | `labels` | Regulatory label text keyed by archive set id |
//! | `medicines` | Tracked medicines with latest price and external id |
//! | `refresh_log` | Lookup / refresh audit trail |
//!
//! ## Views
//!
//! | View | Description |
//! |------|-------------|
//! | `vw_label_coverage` | Label row count per generic name |
//! | `vw_refresh_failures` | Failed lookups grouped by source |
//! | `vw_price_latest` | Most recent price per tracked medicine |

pub mod duckdb;
pub mod migrations;
pub mod views;

use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use ::duckdb::types::Value as DuckValue;
use ::duckdb::Connection;
use ::duckdb::ToSql;
use serde::Serialize;
use serde_json::{Number, Value};
use thiserror::Error;

pub use duckdb::{AccessMode, ConnectionPool, PooledConnection};

/// Errors that can occur during store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// `DuckDB` database error.
    #[error(transparent)]
    DuckDb(#[from] ::duckdb::Error),

    /// I/O error (file system operations).
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Query was rejected by the guardrail policy.
    #[error("query rejected: {0}")]
    QueryRejected(String),

    /// Query execution exceeded its timeout.
    #[error("query timed out after {timeout_ms}ms")]
    QueryTimeout { timeout_ms: u64 },
}

/// Configuration for the label store database.
#[derive(Debug, Clone)]
pub struct LabelStoreConfig {
    /// Root directory for dawaa data.
    pub dawaa_home: PathBuf,
    /// Path to the `DuckDB` database file.
    pub db_path: PathBuf,
    /// Maximum number of pooled connections per access mode.
    pub max_pool_size: usize,
}

impl Default for LabelStoreConfig {
    fn default() -> Self {
        let dawaa_home = resolve_dawaa_home();
        let db_path = dawaa_home.join("store").join("labels.duckdb");
        Self {
            dawaa_home,
            db_path,
            max_pool_size: 4,
        }
    }
}

/// Guardrails for ad-hoc query execution.
#[derive(Debug, Clone, Copy)]
pub struct QueryGuardrails {
    /// Maximum number of rows to return.
    pub max_rows: usize,
    /// Query timeout in milliseconds.
    pub query_timeout_ms: u64,
}

impl Default for QueryGuardrails {
    fn default() -> Self {
        Self {
            max_rows: 10_000,
            query_timeout_ms: 5_000,
        }
    }
}

impl QueryGuardrails {
    fn timeout(self) -> Duration {
        Duration::from_millis(self.query_timeout_ms.max(1))
    }

    fn validate(self) -> Result<(), StoreError> {
        if self.max_rows == 0 {
            return Err(StoreError::QueryRejected(String::from(
                "--max-rows must be greater than zero",
            )));
        }
        if self.query_timeout_ms == 0 {
            return Err(StoreError::QueryRejected(String::from(
                "--query-timeout-ms must be greater than zero",
            )));
        }
        Ok(())
    }
}

/// Column metadata for query results.
#[derive(Debug, Clone, Serialize)]
pub struct SqlColumn {
    /// Column name.
    pub name: String,
    /// Column data type.
    #[serde(rename = "type")]
    pub r#type: String,
}

/// Result of an ad-hoc SQL query.
#[derive(Debug, Clone, Serialize)]
pub struct QueryResult {
    /// Column definitions.
    pub columns: Vec<SqlColumn>,
    /// Row data as JSON values.
    pub rows: Vec<Vec<Value>>,
    /// Number of rows returned.
    pub row_count: usize,
    /// Whether results were truncated by the row limit.
    pub truncated: bool,
}

/// One regulatory label row.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LabelRecord {
    /// Unique identifier assigned by the label archive.
    pub setid: String,
    /// Marketed brand name, if the label carries one.
    pub brand: Option<String>,
    /// Generic (active ingredient) name; the lookup key.
    pub generic: String,
    /// Indications and usage text.
    pub indications: String,
    /// Contraindications text.
    pub contraindications: String,
    /// Ingredient list text.
    pub ingredients: String,
}

/// One tracked medicine record.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MedicineRecord {
    /// Marketed trade name; primary key.
    pub trade_name: String,
    /// Generic name, when known.
    pub generic_name: Option<String>,
    /// Regulatory registration number.
    pub reg_no: Option<String>,
    /// Marketing authorization holder.
    pub applicant: Option<String>,
    /// Latest known price.
    pub price: Option<f64>,
    /// Price currency code.
    pub currency: String,
    /// Identifier in the external pricing directory.
    pub external_id: Option<String>,
    /// RFC 3339 timestamp of the last price update.
    pub last_updated: Option<String>,
    /// Which source produced the record.
    pub source: Option<String>,
}

/// The offline store interface.
#[derive(Clone)]
pub struct LabelStore {
    pool: ConnectionPool,
}

impl LabelStore {
    /// Open the store with default configuration.
    ///
    /// # Errors
    /// Returns an error if the database directory cannot be created or the
    /// schema cannot be applied.
    pub fn open_default() -> Result<Self, StoreError> {
        Self::open(LabelStoreConfig::default())
    }

    /// Open the store at the configured location, applying migrations and
    /// recreating views.
    ///
    /// # Errors
    /// Returns an error if the database directory cannot be created or the
    /// schema cannot be applied.
    pub fn open(config: LabelStoreConfig) -> Result<Self, StoreError> {
        if let Some(parent) = config.db_path.parent() {
            fs::create_dir_all(parent)?;
        }

        let pool = ConnectionPool::new(config.db_path.clone(), config.max_pool_size);
        let store = Self { pool };
        store.initialize()?;
        Ok(store)
    }

    /// Apply schema migrations and recreate views.
    ///
    /// # Errors
    /// Returns an error when DDL execution fails.
    pub fn initialize(&self) -> Result<(), StoreError> {
        let connection = self.pool.acquire(AccessMode::ReadWrite)?;
        migrations::apply_migrations(&connection)?;
        views::create_views(&connection)?;
        Ok(())
    }

    /// Path of the backing database file.
    #[must_use]
    pub fn db_path(&self) -> &Path {
        self.pool.db_path()
    }

    /// Look up a label by name: exact generic match first, then a brand
    /// substring match. Both comparisons are case-insensitive. An empty
    /// store yields `Ok(None)`, never an error.
    ///
    /// # Errors
    /// Returns an error only when the underlying query fails.
    pub fn find_label(&self, name: &str) -> Result<Option<LabelRecord>, StoreError> {
        let needle = name.trim().to_lowercase();
        if needle.is_empty() {
            return Ok(None);
        }

        let connection = self.pool.acquire(AccessMode::ReadOnly)?;
        if let Some(record) = query_label(
            &connection,
            "SELECT setid, brand, generic, indications, contraindications, ingredients \
             FROM labels WHERE LOWER(generic) = ? LIMIT 1",
            &needle,
        )? {
            return Ok(Some(record));
        }

        let pattern = format!("%{needle}%");
        query_label(
            &connection,
            "SELECT setid, brand, generic, indications, contraindications, ingredients \
             FROM labels WHERE brand ILIKE ? LIMIT 1",
            &pattern,
        )
    }

    /// Ingest label rows in one transaction, upserting by set id.
    ///
    /// All values are bound as parameters; a hostile brand name cannot
    /// escape into the statement text.
    ///
    /// # Errors
    /// Returns an error and rolls back if any insert fails.
    pub fn ingest_labels(
        &self,
        request_id: &str,
        rows: &[LabelRecord],
    ) -> Result<usize, StoreError> {
        if rows.is_empty() {
            return Ok(0);
        }

        let connection = self.pool.acquire(AccessMode::ReadWrite)?;
        connection.execute_batch("BEGIN TRANSACTION")?;
        let result = (|| -> Result<usize, StoreError> {
            for row in rows {
                let params: [&dyn ToSql; 6] = [
                    &row.setid,
                    &row.brand,
                    &row.generic,
                    &row.indications,
                    &row.contraindications,
                    &row.ingredients,
                ];
                connection.execute(
                    "INSERT OR REPLACE INTO labels \
                     (setid, brand, generic, indications, contraindications, ingredients, updated_at) \
                     VALUES (?, ?, ?, ?, ?, ?, CURRENT_TIMESTAMP)",
                    params.as_slice(),
                )?;

                let params: [&dyn ToSql; 2] = [&request_id, &row.generic];
                connection.execute(
                    "INSERT INTO refresh_log (request_id, name, source, status, latency_ms, timestamp) \
                     VALUES (?, ?, 'labels', 'ingested', NULL, CURRENT_TIMESTAMP)",
                    params.as_slice(),
                )?;
            }
            Ok(rows.len())
        })();

        finalize_transaction(&connection, result)
    }

    /// Upsert tracked medicine records by trade name.
    ///
    /// # Errors
    /// Returns an error and rolls back if any upsert fails.
    pub fn upsert_medicines(&self, rows: &[MedicineRecord]) -> Result<usize, StoreError> {
        if rows.is_empty() {
            return Ok(0);
        }

        let connection = self.pool.acquire(AccessMode::ReadWrite)?;
        connection.execute_batch("BEGIN TRANSACTION")?;
        let result = (|| -> Result<usize, StoreError> {
            for row in rows {
                let params: [&dyn ToSql; 9] = [
                    &row.trade_name,
                    &row.generic_name,
                    &row.reg_no,
                    &row.applicant,
                    &row.price,
                    &row.currency,
                    &row.external_id,
                    &row.last_updated,
                    &row.source,
                ];
                connection.execute(
                    "INSERT OR REPLACE INTO medicines \
                     (trade_name, generic_name, reg_no, applicant, price, currency, \
                      external_id, last_updated, source) \
                     VALUES (?, ?, ?, ?, ?, ?, ?, TRY_CAST(? AS TIMESTAMP), ?)",
                    params.as_slice(),
                )?;
            }
            Ok(rows.len())
        })();

        finalize_transaction(&connection, result)
    }

    /// Medicines eligible for a batch price refresh: those with a known
    /// external pricing-directory id.
    ///
    /// # Errors
    /// Returns an error when the underlying query fails.
    pub fn medicines_for_refresh(&self) -> Result<Vec<MedicineRecord>, StoreError> {
        let connection = self.pool.acquire(AccessMode::ReadOnly)?;
        let mut statement = connection.prepare(
            "SELECT trade_name, generic_name, reg_no, applicant, price, currency, \
             external_id, CAST(last_updated AS VARCHAR), source \
             FROM medicines WHERE external_id IS NOT NULL ORDER BY trade_name",
        )?;
        let mut rows = statement.query([] as [&dyn ToSql; 0])?;
        let mut records = Vec::new();
        while let Some(row) = rows.next()? {
            records.push(read_medicine(row)?);
        }
        Ok(records)
    }

    /// Store a freshly fetched price for a tracked medicine.
    ///
    /// # Errors
    /// Returns an error when the update fails.
    pub fn record_price(
        &self,
        trade_name: &str,
        price: f64,
        currency: &str,
    ) -> Result<(), StoreError> {
        let connection = self.pool.acquire(AccessMode::ReadWrite)?;
        let params: [&dyn ToSql; 3] = [&price, &currency, &trade_name];
        connection.execute(
            "UPDATE medicines SET price = ?, currency = ?, last_updated = CURRENT_TIMESTAMP \
             WHERE trade_name = ?",
            params.as_slice(),
        )?;
        Ok(())
    }

    /// Append one audit row for a lookup or refresh attempt.
    ///
    /// # Errors
    /// Returns an error when the insert fails.
    pub fn log_refresh(
        &self,
        request_id: &str,
        name: &str,
        source: &str,
        status: &str,
        latency_ms: Option<u64>,
    ) -> Result<(), StoreError> {
        let connection = self.pool.acquire(AccessMode::ReadWrite)?;
        let latency = latency_ms.map(|value| value as i64);
        let params: [&dyn ToSql; 5] = [&request_id, &name, &source, &status, &latency];
        connection.execute(
            "INSERT INTO refresh_log (request_id, name, source, status, latency_ms, timestamp) \
             VALUES (?, ?, ?, ?, ?, CURRENT_TIMESTAMP)",
            params.as_slice(),
        )?;
        Ok(())
    }

    /// Execute an ad-hoc SQL query with guardrails.
    ///
    /// Read-only mode accepts a single SELECT/CTE statement; anything else
    /// requires `allow_write`.
    ///
    /// # Errors
    /// Returns `QueryRejected` for policy violations, `QueryTimeout` when the
    /// guardrail deadline passes, and the underlying error otherwise.
    pub fn execute_query(
        &self,
        sql: &str,
        guardrails: QueryGuardrails,
        allow_write: bool,
    ) -> Result<QueryResult, StoreError> {
        guardrails.validate()?;
        let sql = normalize_sql(sql)?;

        if !allow_write {
            enforce_read_only_query(sql)?;
        }

        let mode = if allow_write {
            AccessMode::ReadWrite
        } else {
            AccessMode::ReadOnly
        };
        let connection = self.pool.acquire(mode)?;
        execute_with_guardrails(&connection, sql, guardrails, allow_write)
    }
}

fn query_label(
    connection: &Connection,
    sql: &str,
    param: &str,
) -> Result<Option<LabelRecord>, StoreError> {
    let mut statement = connection.prepare(sql)?;
    let params: [&dyn ToSql; 1] = [&param];
    let mut rows = statement.query(params.as_slice())?;
    let Some(row) = rows.next()? else {
        return Ok(None);
    };

    Ok(Some(LabelRecord {
        setid: row.get(0)?,
        brand: row.get(1)?,
        generic: row.get(2)?,
        indications: text_or_empty(row.get(3)?),
        contraindications: text_or_empty(row.get(4)?),
        ingredients: text_or_empty(row.get(5)?),
    }))
}

fn read_medicine(row: &::duckdb::Row<'_>) -> Result<MedicineRecord, ::duckdb::Error> {
    Ok(MedicineRecord {
        trade_name: row.get(0)?,
        generic_name: row.get(1)?,
        reg_no: row.get(2)?,
        applicant: row.get(3)?,
        price: row.get(4)?,
        currency: text_or_empty(row.get(5)?),
        external_id: row.get(6)?,
        last_updated: row.get(7)?,
        source: row.get(8)?,
    })
}

fn text_or_empty(value: Option<String>) -> String {
    value.unwrap_or_default()
}

/// Commit on success, roll back on failure.
fn finalize_transaction<T>(
    connection: &Connection,
    result: Result<T, StoreError>,
) -> Result<T, StoreError> {
    match result {
        Ok(value) => {
            connection.execute_batch("COMMIT")?;
            Ok(value)
        }
        Err(error) => {
            let _ = connection.execute_batch("ROLLBACK");
            Err(error)
        }
    }
}

fn execute_with_guardrails(
    connection: &Connection,
    sql: &str,
    guardrails: QueryGuardrails,
    allow_write: bool,
) -> Result<QueryResult, StoreError> {
    let started = Instant::now();
    if is_select_like(sql) {
        execute_select_query(connection, sql, guardrails, started)
    } else if allow_write {
        connection.execute_batch(sql)?;
        ensure_timeout(started, guardrails.timeout())?;
        Ok(QueryResult {
            columns: Vec::new(),
            rows: Vec::new(),
            row_count: 0,
            truncated: false,
        })
    } else {
        Err(StoreError::QueryRejected(String::from(
            "only SELECT/CTE queries are allowed unless --write is provided",
        )))
    }
}

fn execute_select_query(
    connection: &Connection,
    sql: &str,
    guardrails: QueryGuardrails,
    started: Instant,
) -> Result<QueryResult, StoreError> {
    let mut statement = connection.prepare(sql)?;
    let _ = statement.query([] as [&dyn ToSql; 0])?;

    // Column metadata is only populated after execution.
    let column_count = statement.column_count();
    let mut columns = Vec::with_capacity(column_count);
    for index in 0..column_count {
        let name = statement
            .column_name(index)
            .map(ToString::to_string)
            .unwrap_or_else(|_| format!("col_{index}"));
        let dtype = statement.column_type(index);
        columns.push(SqlColumn {
            name,
            r#type: dtype.to_string(),
        });
    }

    let mut rows_cursor = statement.query([] as [&dyn ToSql; 0])?;
    let mut rows = Vec::new();
    let mut truncated = false;

    while let Some(row) = rows_cursor.next()? {
        ensure_timeout(started, guardrails.timeout())?;

        if rows.len() >= guardrails.max_rows {
            truncated = true;
            break;
        }

        rows.push(read_row(row, column_count)?);
    }

    ensure_timeout(started, guardrails.timeout())?;

    Ok(QueryResult {
        columns,
        row_count: rows.len(),
        rows,
        truncated,
    })
}

fn read_row(row: &::duckdb::Row<'_>, column_count: usize) -> Result<Vec<Value>, ::duckdb::Error> {
    let mut output = Vec::with_capacity(column_count);
    for index in 0..column_count {
        let value: DuckValue = row.get(index)?;
        output.push(to_json_value(value));
    }
    Ok(output)
}

fn to_json_value(value: DuckValue) -> Value {
    match value {
        DuckValue::Null => Value::Null,
        DuckValue::Boolean(value) => Value::Bool(value),
        DuckValue::TinyInt(value) => Value::Number(Number::from(value)),
        DuckValue::SmallInt(value) => Value::Number(Number::from(value)),
        DuckValue::Int(value) => Value::Number(Number::from(value)),
        DuckValue::BigInt(value) => Value::Number(Number::from(value)),
        DuckValue::UTinyInt(value) => Value::Number(Number::from(value)),
        DuckValue::USmallInt(value) => Value::Number(Number::from(value)),
        DuckValue::UInt(value) => Value::Number(Number::from(value)),
        DuckValue::UBigInt(value) => Value::Number(Number::from(value)),
        DuckValue::Float(value) => number_from_f64(f64::from(value)),
        DuckValue::Double(value) => number_from_f64(value),
        DuckValue::Text(value) => Value::String(value),
        other => Value::String(format!("{other:?}")),
    }
}

fn number_from_f64(value: f64) -> Value {
    Number::from_f64(value)
        .map(Value::Number)
        .unwrap_or(Value::Null)
}

fn normalize_sql(sql: &str) -> Result<&str, StoreError> {
    let normalized = sql.trim();
    if normalized.is_empty() {
        return Err(StoreError::QueryRejected(String::from(
            "query must not be empty",
        )));
    }
    Ok(normalized.trim_end_matches(';').trim())
}

fn enforce_read_only_query(sql: &str) -> Result<(), StoreError> {
    if !is_select_like(sql) {
        return Err(StoreError::QueryRejected(String::from(
            "read-only mode accepts only SELECT/CTE queries; use --write for write statements",
        )));
    }
    if has_multiple_statements(sql) {
        return Err(StoreError::QueryRejected(String::from(
            "multiple SQL statements are not allowed in read-only mode",
        )));
    }
    Ok(())
}

fn is_select_like(sql: &str) -> bool {
    let first_keyword = sql
        .split_whitespace()
        .next()
        .unwrap_or_default()
        .to_ascii_uppercase();
    matches!(
        first_keyword.as_str(),
        "SELECT" | "WITH" | "EXPLAIN" | "SHOW" | "DESCRIBE"
    )
}

fn has_multiple_statements(sql: &str) -> bool {
    sql.split(';')
        .filter(|part| !part.trim().is_empty())
        .count()
        > 1
}

fn ensure_timeout(started: Instant, timeout: Duration) -> Result<(), StoreError> {
    if started.elapsed() > timeout {
        return Err(StoreError::QueryTimeout {
            timeout_ms: timeout.as_millis().min(u128::from(u64::MAX)) as u64,
        });
    }
    Ok(())
}

/// Resolve the dawaa home directory from environment or default.
fn resolve_dawaa_home() -> PathBuf {
    if let Some(path) = env::var_os("DAWAA_HOME") {
        let path = PathBuf::from(path);
        if !path.as_os_str().is_empty() {
            return path;
        }
    }

    if let Some(home) = env::var_os("HOME") {
        return PathBuf::from(home).join(".dawaa");
    }

    PathBuf::from(".dawaa")
}
