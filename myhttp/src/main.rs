//! myhttp CLI Application
//!
//! Fetches every URL given on the command line (or in a file) in parallel and
//! prints `<url> <digest>` for each response body it could hash.

mod ui;

use clap::builder::styling::{AnsiColor, Effects, Styles};
use clap::Parser;
use myhttp_lib::{
    load_env_config, parse_timeout_string, parse_url_list, ConfigManager, FetchHashError,
    HashAlgorithm, Processor, ProcessorConfig, MAX_CONCURRENCY,
};
use std::process;
use std::time::{Duration, Instant};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

const STYLES: Styles = Styles::styled()
    .header(AnsiColor::Yellow.on_default().effects(Effects::BOLD))
    .usage(AnsiColor::Yellow.on_default().effects(Effects::BOLD))
    .literal(AnsiColor::Green.on_default().effects(Effects::BOLD))
    .placeholder(AnsiColor::Cyan.on_default());

/// CLI arguments for myhttp
#[derive(Parser, Debug)]
#[command(name = "myhttp")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Fetch URLs in parallel and print the digest of each response body")]
#[command(
    long_about = "Fetch URLs in parallel and print \"<url> <digest>\" for every response body.\n\nURLs without a scheme get http:// prepended. URLs that are invalid or cannot be fetched are skipped. Output order follows completion, not input."
)]
#[command(styles = STYLES)]
pub struct Args {
    /// URLs to fetch
    #[arg(value_name = "URLS", help_heading = "Input")]
    pub urls: Vec<String>,

    /// File with URLs to fetch (one per line, '#' starts a comment line)
    #[arg(short = 'f', long = "file", value_name = "FILE", help_heading = "Input")]
    pub file: Option<String>,

    /// Number of parallel requests [default: 10]
    #[arg(short = 'p', long = "parallel", value_name = "N", help_heading = "Performance")]
    pub parallel: Option<usize>,

    /// Request timeout such as "5s", "30s", "2m" [default: 5s]
    #[arg(short = 't', long = "timeout", value_name = "DURATION", help_heading = "Performance")]
    pub timeout: Option<String>,

    /// Digest algorithm: md5, sha256, sha512 [default: md5]
    #[arg(
        short = 'a',
        long = "algorithm",
        value_name = "NAME",
        value_parser = parse_algorithm,
        help_heading = "Output"
    )]
    pub algorithm: Option<HashAlgorithm>,

    /// Use specific config file instead of automatic discovery
    #[arg(long = "config", value_name = "FILE", help_heading = "Configuration")]
    pub config: Option<String>,

    /// Print a summary of skipped URLs to stderr
    #[arg(short = 'v', long = "verbose", help_heading = "Configuration")]
    pub verbose: bool,

    /// Log every dropped URL and worker activity to stderr
    #[arg(short = 'd', long = "debug", help_heading = "Configuration")]
    pub debug: bool,
}

fn parse_algorithm(value: &str) -> Result<HashAlgorithm, String> {
    value.parse::<HashAlgorithm>().map_err(|e| e.to_string())
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    init_logging(&args);

    if let Err(e) = validate_args(&args) {
        eprintln!("Error: {}", e);
        process::exit(1);
    }

    if let Err(e) = run_fetch(args).await {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

/// Install the stderr subscriber. `RUST_LOG` wins over the CLI flags.
fn init_logging(args: &Args) {
    let default_level = if args.debug {
        "debug"
    } else if args.verbose {
        "info"
    } else {
        "warn"
    };
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

/// Validate command line arguments
fn validate_args(args: &Args) -> Result<(), String> {
    if let Some(parallel) = args.parallel {
        if parallel == 0 || parallel > MAX_CONCURRENCY {
            return Err(format!(
                "Parallel count must be between 1 and {}",
                MAX_CONCURRENCY
            ));
        }
    }

    if let Some(timeout) = &args.timeout {
        if parse_timeout_string(timeout).is_none() {
            return Err(format!(
                "Invalid timeout '{}'. Use format like '5s', '30s', '2m'",
                timeout
            ));
        }
    }

    Ok(())
}

/// Main fetch-and-hash logic
async fn run_fetch(args: Args) -> Result<(), Box<dyn std::error::Error>> {
    let config = build_config(&args)?;
    let urls = collect_urls(&args)?;

    tracing::info!(
        urls = urls.len(),
        parallel = config.concurrency,
        algorithm = %config.algorithm,
        "myhttp v{} starting",
        env!("CARGO_PKG_VERSION")
    );

    let processor = Processor::with_config(config)?;

    let cancel = CancellationToken::new();
    spawn_signal_handler(cancel.clone());

    let mut stdout = tokio::io::stdout();
    let start_time = Instant::now();

    if args.verbose {
        let (failures_tx, mut failures_rx) = mpsc::unbounded_channel();
        let summary = processor
            .run_reporting(&cancel, &urls, &mut stdout, failures_tx)
            .await;

        let mut stats = ui::FailureStats::default();
        while let Some(failure) = failures_rx.recv().await {
            stats.add(&failure);
        }

        ui::print_run_summary(&summary, start_time.elapsed());
        ui::print_failure_summary(&stats);
    } else {
        processor.run(&cancel, &urls, &mut stdout).await;
    }

    Ok(())
}

/// Build ProcessorConfig with config file integration.
///
/// Precedence order (highest to lowest):
/// 1. CLI arguments
/// 2. Environment variables (MYHTTP_*)
/// 3. Config file (explicit --config / MYHTTP_CONFIG, or discovered)
/// 4. Built-in defaults
fn build_config(args: &Args) -> Result<ProcessorConfig, FetchHashError> {
    let mut config = ProcessorConfig::default();
    let config_manager = ConfigManager::new(args.verbose);
    let env_config = load_env_config();

    // Step 1: config files
    if let Some(explicit_path) = args.config.as_ref().or(env_config.config.as_ref()) {
        tracing::info!(path = %explicit_path, "using explicit config file");
        let file_config = config_manager.load_file(explicit_path)?;
        config = file_config.apply_to(config);
    } else {
        match config_manager.discover_and_load() {
            Ok(file_config) => config = file_config.apply_to(config),
            Err(e) => tracing::warn!(error = %e, "config discovery failed"),
        }
    }

    // Step 2: environment variables
    config = env_config.apply_to(config);

    // Step 3: CLI arguments
    Ok(apply_cli_args_to_config(config, args))
}

fn apply_cli_args_to_config(mut config: ProcessorConfig, args: &Args) -> ProcessorConfig {
    if let Some(parallel) = args.parallel {
        config = config.with_concurrency(parallel);
    }
    if let Some(secs) = args.timeout.as_deref().and_then(parse_timeout_string) {
        config = config.with_timeout(Duration::from_secs(secs));
    }
    if let Some(algorithm) = args.algorithm {
        config = config.with_algorithm(algorithm);
    }
    config
}

/// Positional URLs first, then the list file (--file, or MYHTTP_FILE).
fn collect_urls(args: &Args) -> Result<Vec<String>, FetchHashError> {
    let mut urls = args.urls.clone();

    let file = args.file.clone().or_else(|| load_env_config().file);
    if let Some(path) = file {
        tracing::info!(path = %path, "reading URLs from file");
        urls.extend(read_urls_from_file(&path)?);
    }

    Ok(urls)
}

fn read_urls_from_file(path: &str) -> Result<Vec<String>, FetchHashError> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| FetchHashError::file_error(path, format!("Failed to read URL list: {}", e)))?;
    Ok(parse_url_list(&content))
}

/// Cancel the shared token on Ctrl+C (and SIGTERM on unix).
///
/// The run drains whatever is in flight and returns; nothing is killed
/// outright.
fn spawn_signal_handler(cancel: CancellationToken) {
    tokio::spawn(async move {
        if wait_for_shutdown_signal().await {
            eprintln!("Ctrl+C pressed. Cancelling...");
            cancel.cancel();
        }
    });
}

/// Resolves `true` on a shutdown signal, `false` if no handler could be
/// installed.
async fn wait_for_shutdown_signal() -> bool {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};

        match signal(SignalKind::terminate()) {
            Ok(mut terminate) => tokio::select! {
                result = tokio::signal::ctrl_c() => result.is_ok(),
                received = terminate.recv() => received.is_some(),
            },
            Err(e) => {
                tracing::warn!(error = %e, "failed to install SIGTERM handler");
                tokio::signal::ctrl_c().await.is_ok()
            }
        }
    }

    #[cfg(not(unix))]
    {
        tokio::signal::ctrl_c().await.is_ok()
    }
}
