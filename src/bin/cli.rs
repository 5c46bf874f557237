//! Stockwatch CLI
//!
//! Local execution entry point for one-off and scheduled stock checks.

use std::path::{Path, PathBuf};
use std::time::Duration;

use clap::{Parser, Subcommand};
use stockwatch::{
    error::{AppError, Result},
    models::Config,
    notify::{ConsoleNotifier, Notifier, TelegramNotifier},
    pipeline,
    services::HttpFetcher,
    storage::{JsonLedger, StockLedger},
    utils::http,
};

/// Stockwatch - Retailer Stock Watcher
#[derive(Parser, Debug)]
#[command(
    name = "stockwatch",
    version,
    about = "Watches retailer product pages and announces restocks"
)]
struct Cli {
    /// Path to storage directory containing config, ledger and inventories
    #[arg(short, long, default_value = "storage")]
    storage_dir: PathBuf,

    /// Path to config file (default: {storage_dir}/config.toml)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Check every source once
    Run {
        /// Log notifications instead of sending them
        #[arg(long)]
        dry_run: bool,
    },

    /// Check every source repeatedly
    Watch {
        /// Seconds between the starts of two passes
        #[arg(long, default_value_t = 900)]
        interval_secs: u64,

        /// Log notifications instead of sending them
        #[arg(long)]
        dry_run: bool,
    },

    /// Validate configuration, rules and inventories
    Validate,

    /// Show ledger info
    Info,
}

/// Initialize logging based on verbosity flag.
fn init_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp_secs()
        .init();
}

/// Pick the notification channel for this invocation.
fn build_notifier(config: &Config, client: reqwest::Client, dry_run: bool) -> Box<dyn Notifier> {
    if dry_run {
        log::info!("Dry run: notifications are logged only");
        return Box::new(ConsoleNotifier::new());
    }

    match config.notifier.telegram() {
        Some((token, chat_id)) => Box::new(TelegramNotifier::new(client, token, chat_id)),
        None => {
            log::warn!("Telegram bot token or chat id not configured; logging notifications");
            Box::new(ConsoleNotifier::new())
        }
    }
}

async fn show_info(config: &Config, storage_dir: &Path) -> Result<()> {
    let ledger_path = storage_dir.join(&config.paths.ledger_file);
    log::info!("Storage directory: {}", storage_dir.display());
    log::info!("Ledger: {}", ledger_path.display());

    if !ledger_path.exists() {
        log::info!("No ledger found yet.");
        return Ok(());
    }

    let snapshot = JsonLedger::new(&ledger_path).load().await?;
    for source in &config.sources {
        log::info!(
            "{} ({}): {} in stock at last run",
            source.name,
            source.key,
            snapshot.get(&source.key).len()
        );
    }

    let unknown: Vec<&str> = snapshot
        .keys()
        .filter(|key| !config.sources.iter().any(|s| s.key == *key))
        .collect();
    if !unknown.is_empty() {
        log::info!("Unconfigured sources in ledger: {}", unknown.join(", "));
    }
    Ok(())
}

/// Main entry point for the CLI application.
#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config_path = cli
        .config
        .clone()
        .unwrap_or_else(|| cli.storage_dir.join("config.toml"));
    let mut config = Config::load_or_default(&config_path)?;
    config.apply_env();

    match cli.command {
        Command::Run { dry_run } => {
            let client = http::create_async_client(&config.fetcher)?;
            let fetcher = HttpFetcher::with_client(client.clone());
            let notifier = build_notifier(&config, client, dry_run);

            pipeline::run_check(&config, &cli.storage_dir, &fetcher, notifier.as_ref()).await?;
        }

        Command::Watch {
            interval_secs,
            dry_run,
        } => {
            if interval_secs == 0 {
                return Err(AppError::validation("--interval-secs must be greater than 0"));
            }

            let client = http::create_async_client(&config.fetcher)?;
            let fetcher = HttpFetcher::with_client(client.clone());
            let notifier = build_notifier(&config, client, dry_run);

            log::info!("Watching every {}s", interval_secs);
            pipeline::run_watch(
                &config,
                &cli.storage_dir,
                &fetcher,
                notifier.as_ref(),
                Duration::from_secs(interval_secs),
                None,
            )
            .await;
        }

        Command::Validate => {
            pipeline::run_validate(&config, &cli.storage_dir).await?;
            log::info!("All validations passed!");
        }

        Command::Info => show_info(&config, &cli.storage_dir).await?,
    }

    log::info!("Done!");

    Ok(())
}
