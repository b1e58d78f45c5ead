//! Jira-Harvest main entry point
//!
//! This is the command-line interface for the Jira-Harvest issue scraper.

use anyhow::Context;
use clap::Parser;
use jira_harvest::checkpoint::CheckpointStore;
use jira_harvest::client::JiraClient;
use jira_harvest::config::{load_config_with_hash, Config};
use jira_harvest::scrape::{JsonlSink, ScrapeOrchestrator};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

/// Jira-Harvest: a resumable, rate-limited Jira issue scraper
///
/// Jira-Harvest downloads every issue of the configured projects through the
/// paginated REST API, checkpointing progress so an interrupted run resumes
/// without re-downloading or duplicating records.
#[derive(Parser, Debug)]
#[command(name = "jira-harvest")]
#[command(version = "1.0.0")]
#[command(about = "A resumable, rate-limited Jira issue scraper", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(value_name = "CONFIG")]
    config: PathBuf,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Resume from the existing checkpoint (default behavior)
    #[arg(long, conflicts_with = "fresh")]
    resume: bool,

    /// Discard the checkpoint and start over
    #[arg(long, conflicts_with = "resume")]
    fresh: bool,

    /// Validate config and show what would be scraped without scraping
    #[arg(long, conflicts_with = "status")]
    dry_run: bool,

    /// Show checkpoint progress and exit
    #[arg(long, conflicts_with = "dry_run")]
    status: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    // Load and validate configuration
    tracing::info!("Loading configuration from: {}", cli.config.display());
    let (config, config_hash) =
        load_config_with_hash(&cli.config).context("failed to load configuration")?;
    tracing::info!("Configuration loaded successfully (hash: {})", config_hash);

    if cli.dry_run {
        handle_dry_run(&config);
        return Ok(());
    }
    if cli.status {
        handle_status(&config);
        return Ok(());
    }

    handle_scrape(config, cli.fresh).await
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("jira_harvest=info,warn"),
            1 => EnvFilter::new("jira_harvest=debug,info"),
            2 => EnvFilter::new("jira_harvest=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Handles the --dry-run mode: validates config and shows what would be scraped
fn handle_dry_run(config: &Config) {
    println!("=== Jira-Harvest Dry Run ===\n");

    println!("Service:");
    println!("  Base URL: {}", config.jira.base_url);

    println!("\nLimits:");
    println!(
        "  Rate: {} requests per {}s window",
        config.limits.requests_per_window, config.limits.window_secs
    );
    println!("  Max retries: {}", config.limits.max_retries);
    println!(
        "  Timeouts: {}s connect, {}s request",
        config.limits.connect_timeout_secs, config.limits.request_timeout_secs
    );
    println!("  Page size: {}", config.limits.page_size);
    println!(
        "  Safety cap: {} issues per project per run",
        config.limits.max_issues_per_project
    );

    println!("\nOutput:");
    println!("  Checkpoint: {}", config.output.checkpoint_path);
    println!("  Issues: {}", config.output.issues_path);

    println!("\nProjects ({}):", config.jira.projects.len());
    for key in &config.jira.projects {
        println!("  - {}", key);
    }

    println!("\n✓ Configuration is valid");
}

/// Handles the --status mode: shows checkpoint progress
fn handle_status(config: &Config) {
    let store = CheckpointStore::load(Path::new(&config.output.checkpoint_path));
    let snapshot = store.snapshot();

    println!("Checkpoint: {}\n", config.output.checkpoint_path);
    println!(
        "Last updated: {}",
        snapshot.last_updated.as_deref().unwrap_or("never")
    );
    println!(
        "Current project: {}",
        snapshot.current_project.as_deref().unwrap_or("none")
    );
    println!("Total issues scraped: {}\n", snapshot.total_issues_scraped);

    for key in &config.jira.projects {
        let scraped = snapshot
            .projects
            .get(key)
            .map_or(0, |p| p.scraped_issues.len());
        let state = if snapshot.completed_projects.contains(key) {
            "completed"
        } else if scraped > 0 {
            "in progress"
        } else {
            "not started"
        };
        println!("  {:<12} {:>8} issues  ({})", key, scraped, state);
    }
}

/// Handles the main scrape operation
async fn handle_scrape(config: Config, fresh: bool) -> anyhow::Result<()> {
    let checkpoint_path = PathBuf::from(&config.output.checkpoint_path);

    if fresh {
        tracing::info!("Starting fresh scrape (discarding previous checkpoint)");
        match std::fs::remove_file(&checkpoint_path) {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => return Err(e).context("failed to remove checkpoint"),
        }
    } else {
        tracing::info!("Starting scrape (will resume from checkpoint if present)");
    }

    let checkpoint = Arc::new(CheckpointStore::load(&checkpoint_path));
    let client = JiraClient::new(&config.jira.base_url, &config.limits)
        .context("failed to build API client")?;
    let mut sink = JsonlSink::open(Path::new(&config.output.issues_path))
        .context("failed to open issues output")?;

    // An interrupt lets the current issue finish, then the orchestrator
    // persists the checkpoint and flushes the sink before returning
    let shutdown = Arc::new(AtomicBool::new(false));
    {
        let shutdown = shutdown.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::info!("Interrupt received; finishing current issue then stopping");
                shutdown.store(true, Ordering::Relaxed);
            }
        });
    }

    let orchestrator = ScrapeOrchestrator::new(client, checkpoint.clone(), &config, shutdown);
    let summary = orchestrator.run(&mut sink).await?;

    tracing::info!(
        "Done: {} issues emitted this run, {} scraped overall",
        summary.issues_emitted,
        checkpoint.total_scraped()
    );
    if summary.interrupted {
        tracing::info!("Run was interrupted; re-invoke to resume");
    }

    Ok(())
}
