//! CLI argument definitions for dawaa.
//!
//! This module contains the command-line interface structure using Clap.
//! The CLI supports commands for resolving medicine names, walking the
//! usage fallback chain, querying prices, and inspecting the local store.
//!
//! # Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `resolve` | Resolve a medicine name to its generic form |
//! | `usage` | Fetch usage information through the fallback chain |
//! | `price` | Search the pricing directory |
//! | `refresh` | Refresh stored prices from the directory |
//! | `sql` | Query the local DuckDB label store |
//! | `sources` | List usage sources and their health |
//!
//! # Global Options
//!
//! | Option | Default | Description |
//! |--------|---------|-------------|
//! | `--format` | `json` | Output format (json, ndjson, table) |
//! | `--pretty` | `false` | Pretty-print JSON output |
//! | `--strict` | `false` | Treat warnings as errors |
//! | `--source` | `auto` | Source selection strategy |
//! | `--timeout-ms` | `15000` | Chain budget in ms |
//! | `--sample` | `false` | Sample mode, no network calls |
//!
//! # Examples
//!
//! ```bash
//! # Resolve an Arabic name
//! dawaa resolve بانادول
//!
//! # Fetch usage information with pretty JSON
//! dawaa usage claritin --pretty
//!
//! # Query the store
//! dawaa sql "SELECT generic, COUNT(*) FROM labels GROUP BY generic"
//!
//! # Strict mode for CI
//! dawaa usage aspirin --strict --sample
//! ```

use clap::{Args, Parser, Subcommand, ValueEnum};

/// 💊 dawaa - Pharmacy information CLI
///
/// Resolve Arabic and brand medicine names, fetch usage information through a
/// multi-source fallback chain, and track Egyptian market prices.
#[derive(Debug, Parser)]
#[command(
    name = "dawaa",
    author,
    version,
    about = "Pharmacy information CLI",
    long_about = "dawaa answers medicine questions from a chain of information sources. \
Features include:\n\
\n\
  • Arabic and brand-name resolution to generic names\n\
  • Multi-source usage fallback (curated, label store, RxNav, openFDA, DailyMed)\n\
  • Egyptian pricing directory search and batch refresh\n\
  • Local DuckDB label store with guarded SQL access\n\
  • Structured JSON output with metadata\n\
\n\
Use 'dawaa <command> --help' for command-specific help."
)]
pub struct Cli {
    /// Output format for results.
    ///
    /// - json: Single JSON object (default)
    /// - ndjson: One JSON object per line
    /// - table: ASCII table format
    #[arg(long, global = true, value_enum, default_value_t = OutputFormat::Json)]
    pub format: OutputFormat,

    /// Pretty-print JSON output with indentation.
    #[arg(long, global = true, default_value_t = false)]
    pub pretty: bool,

    /// Treat warnings and errors as failures (exit code 5).
    ///
    /// Useful for CI pipelines that need strict validation.
    #[arg(long, global = true, default_value_t = false)]
    pub strict: bool,

    /// Source selection strategy for usage lookups.
    #[arg(long, global = true, value_enum, default_value_t = SourceSelector::Auto)]
    pub source: SourceSelector,

    /// Budget for the whole fallback chain in milliseconds.
    #[arg(long, global = true, default_value_t = 15_000)]
    pub timeout_ms: u64,

    /// Serve deterministic sample data instead of calling live services.
    #[arg(long, global = true, default_value_t = false)]
    pub sample: bool,

    #[command(subcommand)]
    pub command: Command,
}

/// Output format options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// ASCII table format for terminal display.
    Table,
    /// Single JSON object output.
    Json,
    /// Newline-delimited JSON (one object per line).
    Ndjson,
}

/// Source selection strategy.
///
/// Controls which source(s) answer usage lookups.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum SourceSelector {
    /// Walk the full fallback chain in priority order.
    Auto,
    /// Use only the curated table.
    Curated,
    /// Use only the offline label store.
    Labels,
    /// Use only RxNav.
    Rxnav,
    /// Use only openFDA.
    Openfda,
    /// Use only DailyMed.
    Dailymed,
}

/// Available CLI commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// 🧭 Resolve medicine name(s) to their generic form.
    ///
    /// Accepts Arabic spellings, brand names, and dosage-suffixed forms.
    /// Resolution is total: unknown names pass through cleaned.
    ///
    /// # Examples
    ///
    ///   dawaa resolve panadol
    ///   dawaa resolve بانادول كلاريتين --pretty
    Resolve(ResolveArgs),

    /// 💊 Fetch usage information through the fallback chain.
    ///
    /// Consults sources in priority order (curated, labels, RxNav,
    /// openFDA, DailyMed) and returns the first substantive answer.
    ///
    /// # Examples
    ///
    ///   dawaa usage claritin
    ///   dawaa usage الميتفورمين --source rxnav
    ///   dawaa usage aspirin --timeout-ms 5000
    Usage(UsageArgs),

    /// 💰 Search the Egyptian pricing directory.
    ///
    /// Returns matching products with current prices; the first few hits
    /// are enriched with paced detail lookups.
    ///
    /// # Examples
    ///
    ///   dawaa price بانادول
    ///   dawaa price rivo --pretty
    Price(PriceArgs),

    /// 🔄 Refresh stored prices from the directory.
    ///
    /// Walks tracked medicines that carry a directory id and updates their
    /// prices, pacing outbound calls and logging each attempt.
    ///
    /// # Examples
    ///
    ///   dawaa refresh
    ///   dawaa refresh --limit 20
    Refresh(RefreshArgs),

    /// 🗄️ Run SQL queries against the label store.
    ///
    /// Execute SQL against the local DuckDB database.
    /// Default mode is read-only; use --write for data modifications.
    ///
    /// # Security
    ///
    /// All queries are executed with guardrails:
    /// - Row limits (default: 10,000)
    /// - Query timeout (default: 5,000ms)
    /// - Read-only by default
    ///
    /// # Examples
    ///
    ///   dawaa sql "SELECT * FROM labels WHERE generic = 'loratadine'"
    ///   dawaa sql "SELECT * FROM vw_label_coverage" --max-rows 100
    Sql(SqlArgs),

    /// 🔌 List usage sources and their health.
    Sources(SourcesArgs),
}

/// Arguments for the `resolve` command.
#[derive(Debug, Args)]
pub struct ResolveArgs {
    /// One or more medicine names (Arabic or English).
    #[arg(required = true, num_args = 1..)]
    pub names: Vec<String>,
}

/// Arguments for the `usage` command.
#[derive(Debug, Args)]
pub struct UsageArgs {
    /// Medicine name, Arabic or English; multiple words are joined.
    #[arg(required = true, num_args = 1..)]
    pub name: Vec<String>,
}

/// Arguments for the `price` command.
#[derive(Debug, Args)]
pub struct PriceArgs {
    /// Medicine name to search the directory for.
    #[arg(required = true, num_args = 1..)]
    pub name: Vec<String>,
}

/// Arguments for the `refresh` command.
#[derive(Debug, Args)]
pub struct RefreshArgs {
    /// Cap the number of medicines refreshed in this run.
    #[arg(long)]
    pub limit: Option<usize>,
}

/// Arguments for the `sql` command.
#[derive(Debug, Args)]
pub struct SqlArgs {
    /// SQL query to execute.
    pub query: String,

    /// Allow write operations (INSERT, UPDATE, DELETE, CREATE, etc.).
    ///
    /// Without this flag, only SELECT and CTE queries are allowed.
    #[arg(long, default_value_t = false)]
    pub write: bool,

    /// Maximum number of rows to return (prevents memory exhaustion).
    #[arg(long, default_value_t = 10_000)]
    pub max_rows: usize,

    /// Query timeout in milliseconds.
    #[arg(long, default_value_t = 5_000)]
    pub query_timeout_ms: u64,
}

/// Arguments for the `sources` command.
#[derive(Debug, Args)]
pub struct SourcesArgs {
    /// Include health and rate budget detail per source.
    #[arg(long, default_value_t = false)]
    pub verbose: bool,
}
