use std::process::ExitCode;

use clap::Parser;
use report_loader::runner::{
    DbConfigBuilder, IngestArgs, IngestOutcome, IngestStats, Tables, TlsVerification, run_ingest,
};

/// Load a daily gzip JSON-lines report into PostgreSQL
///
/// Set REPORT_HTTPS_VERIFY to any non-empty value to verify TLS certificates
/// when downloading.
#[derive(Parser, Clone)]
#[command(version)]
struct Args {
    /// Report file name, e.g. clicks-2024-03-01.json.gz
    report_file: String,

    /// URL prefix the report file name is appended to (http, https or file)
    #[arg(long, env = "REPORT_BASE_URL")]
    base_url: String,

    /// Database host
    #[arg(long, env = "REPORT_DB_HOST", default_value = "localhost")]
    db_host: String,

    /// Database port
    #[arg(long, env = "REPORT_DB_PORT", default_value = "5432")]
    db_port: u16,

    /// Database name
    #[arg(long, env = "REPORT_DB_NAME")]
    db_name: String,

    /// Database username
    #[arg(long, env = "REPORT_DB_USER")]
    db_user: String,

    /// Database password
    #[arg(long, env = "REPORT_DB_PASSWORD", hide_env_values = true, default_value = "")]
    db_password: String,

    /// Table for accepted records (schema.table allowed)
    #[arg(long, env = "REPORT_TABLE")]
    report_table: String,

    /// Table for rejected lines (schema.table allowed)
    #[arg(long, env = "REPORT_ERROR_TABLE")]
    error_table: String,

    /// Create both tables if they don't exist
    #[arg(long)]
    create_tables: bool,

    /// Download and validate the report without writing to the database
    #[arg(long)]
    dry_run: bool,

    /// Quiet mode - only warnings and the final message
    #[arg(short, long)]
    quiet: bool,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<ExitCode> {
    let args = Args::parse();

    init_tracing(args.quiet);

    let database = DbConfigBuilder::default()
        .host(args.db_host)
        .port(args.db_port)
        .dbname(args.db_name)
        .user(args.db_user)
        .password(args.db_password)
        .tables(Tables {
            report: args.report_table,
            error: args.error_table,
        })
        .build()?;

    let ingest_args = IngestArgs {
        report_file: args.report_file,
        base_url: args.base_url,
        tls: TlsVerification::from_env(),
        database,
        create_tables: args.create_tables,
        dry_run: args.dry_run,
    };

    match run_ingest(ingest_args).await? {
        IngestOutcome::Unavailable => {
            println!("Unable to load report.");
            Ok(ExitCode::FAILURE)
        }
        IngestOutcome::DryRun(stats) => {
            print_dry_run(&stats);
            Ok(ExitCode::SUCCESS)
        }
        IngestOutcome::Loaded(_) => {
            println!("Success!");
            Ok(ExitCode::SUCCESS)
        }
    }
}

/// Log to stderr so stdout only carries the final message
fn init_tracing(quiet: bool) {
    use tracing_subscriber::{EnvFilter, FmtSubscriber};

    let default_filter = if quiet {
        "report_loader=warn,sqlx=off"
    } else {
        "report_loader=info,sqlx=off"
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .finish();
    let _ = tracing::subscriber::set_global_default(subscriber);
}

fn print_dry_run(stats: &IngestStats) {
    println!("DRY RUN - nothing was written");
    println!();
    println!("Lines read: {}", stats.lines_read);
    println!("Records accepted: {}", stats.records_accepted);
    println!(
        "Records rejected: {} ({:.1}%)",
        stats.records_rejected,
        stats.rejection_rate()
    );
    for (reason, count) in &stats.rejections {
        println!("  {}: {}", reason, count);
    }
    println!("Lines dropped: {}", stats.lines_dropped);
    println!("Duration: {:.2}s", stats.duration.as_secs_f64());
}
