//! Pagetide main entry point
//!
//! One binary, two roles: started plain it orchestrates every configured
//! section; started with `--section <keyword>` (which the orchestrator does
//! for each spawned worker) it harvests exactly that section.

use anyhow::Context;
use clap::Parser;
use pagetide::config::load_config_with_hash;
use pagetide::{logging, orchestrator, HarvestError};
use std::path::PathBuf;

/// Pagetide: a resilient harvester for paginated listing sites
#[derive(Parser, Debug)]
#[command(name = "pagetide")]
#[command(version = "1.0.0")]
#[command(about = "Harvests keyword sections of a paginated listing source", long_about = None)]
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

    /// Validate config and show what would be harvested without fetching
    #[arg(long)]
    dry_run: bool,

    /// Run a single section worker (used by the orchestrator)
    #[arg(long, value_name = "KEYWORD", hide = true, conflicts_with = "dry_run")]
    section: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let (config, config_hash) = load_config_with_hash(&cli.config)
        .with_context(|| format!("failed to load {}", cli.config.display()))?;

    if let Some(keyword) = cli.section.as_deref() {
        return run_worker(config, keyword, cli.verbose, cli.quiet).await;
    }

    logging::init(cli.verbose, cli.quiet);
    tracing::info!(
        config = %cli.config.display(),
        hash = %config_hash,
        "configuration loaded"
    );

    if cli.dry_run {
        handle_dry_run(&config);
        return Ok(());
    }

    let reports = orchestrator::run_sections(&config, &cli.config).await?;

    println!("All sections finished. Checkpoints:");
    for report in &reports {
        let outcome = if report.completed() {
            "done"
        } else {
            "abandoned"
        };
        println!(
            "  {} [{}] {}",
            report.keyword,
            outcome,
            report.checkpoint_path.display()
        );
    }

    Ok(())
}

/// Runs one section to its terminal state
///
/// Exit code 0 means the section reached `Done`; 2 means it was abandoned
/// (fatal failure or exhausted retry budget). The orchestrator only looks
/// at the exit status.
async fn run_worker(
    config: pagetide::Config,
    keyword: &str,
    verbose: u8,
    quiet: bool,
) -> anyhow::Result<()> {
    logging::init_worker(verbose, quiet, &config.log_path(keyword))
        .context("failed to open section log file")?;

    match orchestrator::run_worker(&config, keyword).await {
        Ok(outcome) => {
            tracing::info!(
                keyword,
                items = outcome.items,
                checkpoint = %outcome.checkpoint_path.display(),
                "section completed"
            );
            Ok(())
        }
        Err(e @ HarvestError::Config(_)) => {
            // Misconfiguration is an operator error, not a harvest outcome
            Err(e.into())
        }
        Err(e) => {
            tracing::error!(keyword, error = %e, "section abandoned");
            std::process::exit(2);
        }
    }
}

/// Handles the --dry-run mode: validates config and shows the plan
fn handle_dry_run(config: &pagetide::Config) {
    println!("=== Pagetide Dry Run ===\n");

    println!("Source:");
    println!("  Base URL: {}", config.source.base_url);
    println!("  Search path: {}", config.source.search_path);
    println!(
        "  Bootstrap: ready '{}', timeout {}s",
        config.source.ready_selector, config.source.bootstrap_timeout_secs
    );

    println!("\nPolicy:");
    println!("  Default page size: {}", config.harvest.default_page_size);
    println!(
        "  Pacing: {}..{} ms",
        config.harvest.pacing_min_ms, config.harvest.pacing_max_ms
    );
    println!(
        "  Restarts: up to {} attempts, {}s backoff",
        config.harvest.max_restart_attempts, config.harvest.restart_backoff_secs
    );
    println!(
        "  Startup cooldown: {}s",
        config.harvest.startup_cooldown_secs
    );
    println!("  Block markers: {:?}", config.harvest.block_markers);

    match &config.egress {
        Some(egress) => println!("\nEgress proxy: {}", egress.host),
        None => println!("\nEgress proxy: none (direct)"),
    }

    println!("\nSections ({}):", config.sections.len());
    for section in &config.sections {
        println!(
            "  - {} (page size {}, proxy port {}) -> {}",
            section.keyword,
            config.page_size_for(section),
            section
                .proxy_port
                .map(|p| p.to_string())
                .unwrap_or_else(|| "-".to_string()),
            config.checkpoint_path(&section.keyword).display()
        );
    }

    println!("\n✓ Configuration is valid");
}
