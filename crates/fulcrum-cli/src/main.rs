use std::fs::File;
use std::io::Write;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDate};
use clap::{Args, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use fulcrum_client::{ClientConfig, HttpPageFetcher};
use fulcrum_core::{
    Checkpoint, CsvKeySource, DecoderRegistry, EndpointRegistry, FileCheckpointStore,
    JsonLinesSink, Paginator, QueryParams, SyncError, SyncMode, SyncReport, SyncService,
    SyncTarget, Throttle, ThrottleConfig,
};

#[derive(Parser)]
#[command(
    name = "fulcrum",
    version,
    about = "Resumable extraction of Lever collections to JSON lines"
)]
struct Cli {
    /// Log at debug level
    #[arg(long, global = true, default_value_t = false)]
    debug: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Download every record of one endpoint as JSON lines
    Sync(SyncArgs),

    /// List the endpoints `sync` can download
    Endpoints,
}

#[derive(Args)]
struct SyncArgs {
    /// Endpoint name (see `fulcrum endpoints`)
    #[arg(short, long)]
    endpoint: String,

    /// API token, sent as the Basic auth username
    #[arg(short, long, env = "FULCRUM_API_TOKEN", hide_env_values = true)]
    token: String,

    /// API base URL
    #[arg(
        short,
        long,
        env = "FULCRUM_BASE_URL",
        default_value = "https://api.lever.co/v1/"
    )]
    base_url: String,

    /// CSV file of candidate ids, first column, no header (list-driven endpoints)
    #[arg(short, long)]
    input: Option<PathBuf>,

    /// Write records here instead of stdout
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Only records created at or after this time (epoch ms, YYYY-MM-DD or RFC 3339)
    #[arg(long, value_parser = parse_timestamp)]
    created_at_start: Option<i64>,

    /// Only records archived at or after this time (epoch ms, YYYY-MM-DD or RFC 3339)
    #[arg(long, value_parser = parse_timestamp)]
    archived_at_start: Option<i64>,

    /// Act on behalf of this user id
    #[arg(long)]
    perform_as: Option<String>,

    /// Minimum delay between two requests, in milliseconds
    #[arg(long, default_value_t = 100)]
    rate_limit_ms: u64,

    /// Per-request timeout, in seconds
    #[arg(long, default_value_t = 10)]
    timeout_secs: u64,

    /// Directory holding checkpoint files (defaults to the system temp dir)
    #[arg(long)]
    checkpoint_dir: Option<PathBuf>,

    /// Forget the stored checkpoint and start from the first key
    #[arg(long, default_value_t = false)]
    reset_checkpoint: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    let directive = if cli.debug {
        "fulcrum=debug"
    } else {
        "fulcrum=info"
    };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(directive.parse()?))
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Sync(args) => cmd_sync(args).await?,
        Commands::Endpoints => cmd_endpoints(),
    }

    Ok(())
}

async fn cmd_sync(args: SyncArgs) -> Result<()> {
    let writer: Box<dyn Write> = match &args.output {
        Some(path) => Box::new(
            File::create(path)
                .with_context(|| format!("Failed to create output file: {}", path.display()))?,
        ),
        None => Box::new(std::io::stdout().lock()),
    };
    let report = run_sync(args, writer).await?;
    log_report(&report)?;
    Ok(())
}

/// Run one endpoint to completion, writing JSON lines to `writer`.
async fn run_sync<W: Write>(args: SyncArgs, writer: W) -> Result<SyncReport> {
    let registry = EndpointRegistry::standard();
    let endpoint = *registry.get(&args.endpoint)?;
    // Fail on an unknown decoder before any request goes out.
    let decoders = DecoderRegistry::standard();
    decoders.resolve(endpoint.entity)?;

    let config = ClientConfig::new(
        &args.base_url,
        &args.token,
        Duration::from_secs(args.timeout_secs),
    )?;
    tracing::debug!(?config, "Client configured");
    let fetcher = HttpPageFetcher::new(config)?;
    let throttle = Throttle::new(ThrottleConfig::new(Duration::from_millis(
        args.rate_limit_ms,
    )));
    let service = SyncService::new(Paginator::new(fetcher, throttle, decoders));

    let query = QueryParams {
        created_at_start: args.created_at_start,
        archived_at_start: args.archived_at_start,
        perform_as: args.perform_as,
    };
    let target = SyncTarget::new(endpoint, query);
    let mut sink = JsonLinesSink::new(writer);

    let report = match endpoint.mode {
        SyncMode::Direct => {
            if args.input.is_some() {
                tracing::warn!(endpoint = endpoint.name, "--input is ignored for direct endpoints");
            }
            service.run_direct(target, &mut sink).await?
        }
        SyncMode::ListDriven => {
            let input = args.input.as_deref().ok_or_else(|| {
                SyncError::ConfigError(format!(
                    "endpoint '{}' is list-driven and needs --input <csv of candidate ids>",
                    endpoint.name
                ))
            })?;
            let keys = CsvKeySource::open(input)?;

            let dir = args.checkpoint_dir.unwrap_or_else(std::env::temp_dir);
            let store = FileCheckpointStore::for_entity(&dir, endpoint.entity);
            store.ensure_exists()?;
            tracing::info!(checkpoint = %store.path().display(), "Using checkpoint file");

            let mut checkpoint = Checkpoint::new(store);
            if args.reset_checkpoint {
                checkpoint.clear()?;
                checkpoint.store().ensure_exists()?;
                tracing::info!("Checkpoint cleared");
            }

            let report = service
                .run_list(&target, keys, &mut checkpoint, &mut sink)
                .await?;
            if let Some(key) = checkpoint.last_persisted() {
                tracing::info!(%key, "Checkpoint advanced");
            }
            report
        }
    };

    tracing::debug!(written = sink.written(), "Output flushed");
    sink.into_inner()?;
    Ok(report)
}

fn log_report(report: &SyncReport) -> Result<()> {
    tracing::info!(
        endpoint = %report.endpoint,
        keys_processed = report.keys_processed,
        keys_skipped = report.keys_skipped,
        keys_not_found = report.keys_not_found,
        pages = report.pages,
        records = report.records,
        "Sync complete"
    );
    tracing::debug!(report = %serde_json::to_string(report)?, "Sync report");
    Ok(())
}

fn cmd_endpoints() {
    let registry = EndpointRegistry::standard();
    println!("{:<16} {:<12} {:<30} DESCRIPTION", "NAME", "MODE", "PATH");
    println!("{}", "-".repeat(90));
    for endpoint in registry.iter() {
        println!(
            "{:<16} {:<12} {:<30} {}",
            endpoint.name,
            endpoint.mode,
            endpoint.path.as_str(),
            endpoint.description
        );
    }
}

/// Parse a lower-bound filter: epoch milliseconds, a calendar date (UTC
/// midnight) or an RFC 3339 timestamp.
fn parse_timestamp(raw: &str) -> Result<i64, String> {
    let raw = raw.trim();
    if let Ok(ms) = raw.parse::<i64>() {
        return Ok(ms);
    }
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return date
            .and_hms_opt(0, 0, 0)
            .map(|dt| dt.and_utc().timestamp_millis())
            .ok_or_else(|| format!("invalid date '{raw}'"));
    }
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.timestamp_millis())
        .map_err(|_| {
            format!("'{raw}' is not epoch milliseconds, YYYY-MM-DD or an RFC 3339 timestamp")
        })
}
