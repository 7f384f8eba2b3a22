//! High-level runner API for the report loader.
//!
//! This module wraps the fetch, parse and load stages behind one call. It is
//! the primary API for library users and for the CLI.

use anyhow::Result;
use std::time::Instant;
use tracing::{info, warn};

use crate::db::{DbConnection, ensure_tables, load_report};
use crate::formats::parse_lines;
use crate::io::Fetcher;
use crate::report::ReportContext;

pub use crate::config::{DbConfig, DbConfigBuilder, Tables, TlsVerification};
pub use crate::telemetry::IngestStats;

/// Arguments for ingesting one report file
pub struct IngestArgs {
    /// File name relative to the base URL, e.g. `clicks-2024-03-01.json.gz`
    pub report_file: String,
    /// Prefix the file name is appended to (`https://`, `http://` or `file://`)
    pub base_url: String,
    pub tls: TlsVerification,
    pub database: DbConfig,

    // Options
    pub create_tables: bool,
    pub dry_run: bool,

    // Test-only: inject a pre-opened connection (for SQLite testing)
    #[cfg(test)]
    pub test_connection: Option<DbConnection>,
}

/// How an ingest run ended
#[derive(Debug, Clone, PartialEq)]
pub enum IngestOutcome {
    /// The report could not be downloaded or decompressed, or had no lines
    Unavailable,
    /// Parsed but not written (`dry_run`)
    DryRun(IngestStats),
    /// Parsed and committed to both tables
    Loaded(IngestStats),
}

/// Ingest one report file
///
/// Download and decompression failures are not errors: they end the run with
/// [`IngestOutcome::Unavailable`] before any database connection is opened.
/// A bad file name, an unsupported base URL or any database failure is
/// returned as an error, and nothing from the report is committed.
///
/// # Example
///
/// ```no_run
/// use report_loader::runner::{
///     DbConfigBuilder, IngestArgs, IngestOutcome, Tables, TlsVerification, run_ingest,
/// };
///
/// # async fn example() -> anyhow::Result<()> {
/// let database = DbConfigBuilder::default()
///     .dbname("analytics")
///     .user("loader")
///     .tables(Tables {
///         report: "api_reports".to_string(),
///         error: "api_report_errors".to_string(),
///     })
///     .build()?;
///
/// let args = IngestArgs {
///     report_file: "clicks-2024-03-01.json.gz".to_string(),
///     base_url: "https://reports.example.com/daily/".to_string(),
///     tls: TlsVerification::from_env(),
///     database,
///     create_tables: false,
///     dry_run: false,
/// };
///
/// if let IngestOutcome::Loaded(stats) = run_ingest(args).await? {
///     println!("Loaded {} records", stats.records_accepted);
/// }
/// # Ok(())
/// # }
/// ```
pub async fn run_ingest(args: IngestArgs) -> Result<IngestOutcome> {
    let started = Instant::now();

    let context = ReportContext::from_file_name(&args.report_file)?;
    info!(
        report = %context.report_name,
        date = %context.report_date,
        "ingesting report"
    );

    let fetcher = Fetcher::new(args.base_url.as_str(), args.tls)?;
    let lines = fetcher.fetch_lines(&args.report_file).await?;
    if lines.is_empty() {
        warn!(file = %args.report_file, "report unavailable, nothing to load");
        return Ok(IngestOutcome::Unavailable);
    }

    let report = parse_lines(&lines);
    let mut stats = IngestStats::new();
    stats.record_parse(lines.len(), &report);

    if args.dry_run {
        stats.duration = started.elapsed();
        stats.log_summary();
        return Ok(IngestOutcome::DryRun(stats));
    }

    #[cfg(test)]
    let mut conn = match args.test_connection {
        Some(conn) => conn,
        None => DbConnection::connect(&args.database).await?,
    };

    #[cfg(not(test))]
    let mut conn = DbConnection::connect(&args.database).await?;

    let tables = &args.database.tables;
    if args.create_tables {
        ensure_tables(&mut conn, tables).await?;
    }

    let summary = load_report(&mut conn, tables, &report, &context).await?;
    conn.close().await?;

    info!(
        records = summary.records_inserted,
        errors = summary.errors_inserted,
        statements = summary.statements,
        "load committed"
    );

    stats.duration = started.elapsed();
    stats.log_summary();

    Ok(IngestOutcome::Loaded(stats))
}
