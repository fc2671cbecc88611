//! Shoal main entry point
//!
//! This is the command-line interface for the Shoal crawler.

use anyhow::Context;
use clap::Parser;
use shoal::config::{load_config_with_hash, Config};
use shoal::crawler::Coordinator;
use shoal::output::{generate_markdown_report, load_report, print_report};
use shoal::url::SiteScope;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

/// Shoal: a bounded, polite, resumable web crawler
///
/// Shoal crawls one site breadth-first from a root URL, records every fetch,
/// visit and extracted link as CSV tables, and checkpoints its progress so an
/// interrupted crawl can be resumed.
#[derive(Parser, Debug)]
#[command(name = "shoal")]
#[command(version = "1.0.0")]
#[command(about = "A bounded, polite, resumable web crawler", long_about = None)]
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

    /// Resume from the last checkpoint (default behavior)
    #[arg(long, conflicts_with = "fresh")]
    resume: bool,

    /// Start a fresh crawl, discarding the checkpoint
    #[arg(long, conflicts_with = "resume")]
    fresh: bool,

    /// Validate config and show what would be crawled without crawling
    #[arg(long, conflicts_with_all = ["stats", "export_summary"])]
    dry_run: bool,

    /// Show the crawl report from the exported tables and exit
    #[arg(long, conflicts_with_all = ["dry_run", "export_summary"])]
    stats: bool,

    /// Write the markdown crawl report from the exported tables and exit
    #[arg(long, conflicts_with_all = ["dry_run", "stats"])]
    export_summary: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    tracing::info!("Loading configuration from: {}", cli.config.display());
    let (config, config_hash) = load_config_with_hash(&cli.config)
        .with_context(|| format!("failed to load configuration {}", cli.config.display()))?;
    tracing::info!("Configuration loaded successfully (hash: {})", config_hash);

    if cli.dry_run {
        handle_dry_run(&config)?;
    } else if cli.stats {
        handle_stats(&config)?;
    } else if cli.export_summary {
        handle_export_summary(&config)?;
    } else {
        handle_crawl(config, cli.fresh, config_hash).await?;
    }

    Ok(())
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("shoal=info,warn"),
            1 => EnvFilter::new("shoal=debug,info"),
            2 => EnvFilter::new("shoal=trace,debug"),
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

fn site_domain(config: &Config) -> anyhow::Result<String> {
    let scope = SiteScope::from_root(
        &config.crawler.root_url,
        config.crawler.site_domain.as_deref(),
    )
    .context("cannot determine site domain")?;
    Ok(scope.domain().to_string())
}

/// Handles the --dry-run mode: validates config and shows what would be crawled
fn handle_dry_run(config: &Config) -> anyhow::Result<()> {
    let crawler = &config.crawler;

    println!("=== Shoal Dry Run ===\n");

    println!("Crawler Configuration:");
    println!("  Root URL: {}", crawler.root_url);
    println!("  Site domain: {} (and subdomains)", site_domain(config)?);
    println!("  Max pages: {}", crawler.max_pages);
    println!("  Max depth: {}", crawler.max_depth);
    println!("  Workers: {}", crawler.worker_count);
    println!("  Politeness delay: {}ms", crawler.politeness_delay);
    println!("  Request timeout: {}ms", crawler.request_timeout);
    println!("  Checkpoint every: {} URLs", crawler.checkpoint_interval);

    println!("\nAllowed Binary Types ({}):", crawler.allowed_types.len());
    for content_type in &crawler.allowed_types {
        println!("  - {}", content_type);
    }

    println!("\nUser Agent:");
    println!("  {}", config.user_agent.header_value());

    println!("\nOutput:");
    println!("  Fetch table: {}", config.output.fetch_table_path().display());
    println!("  Visit table: {}", config.output.visit_table_path().display());
    println!("  Links table: {}", config.output.links_table_path().display());
    println!("  Checkpoint: {}", config.output.checkpoint_path);
    println!("  Report: {}", config.output.report_path);

    println!("\n✓ Configuration is valid");

    Ok(())
}

/// Handles the --stats mode: prints the report from the exported tables
fn handle_stats(config: &Config) -> anyhow::Result<()> {
    println!("Tables: {}\n", config.output.directory);

    let report = load_report(
        &config.output,
        &site_domain(config)?,
        config.crawler.worker_count,
    )
    .context("failed to read output tables")?;

    print_report(&report);

    Ok(())
}

/// Handles the --export-summary mode: writes the markdown report
fn handle_export_summary(config: &Config) -> anyhow::Result<()> {
    println!("=== Exporting Crawl Report ===\n");
    println!("Tables: {}", config.output.directory);
    println!("Output: {}", config.output.report_path);
    println!();

    let report = load_report(
        &config.output,
        &site_domain(config)?,
        config.crawler.worker_count,
    )
    .context("failed to read output tables")?;

    generate_markdown_report(&report, Path::new(&config.output.report_path))
        .context("failed to write report")?;

    println!("✓ Report exported to: {}", config.output.report_path);

    Ok(())
}

/// Handles the main crawl operation
async fn handle_crawl(config: Config, fresh: bool, config_hash: String) -> anyhow::Result<()> {
    if fresh {
        tracing::info!("Starting fresh crawl (ignoring previous checkpoint)");
    } else {
        tracing::info!("Starting crawl (will resume from checkpoint if present)");
    }

    tracing::info!(
        "Root: {}, max pages: {}, max depth: {}",
        config.crawler.root_url,
        config.crawler.max_pages,
        config.crawler.max_depth
    );

    let coordinator = Coordinator::open(config, fresh, Some(config_hash))
        .context("failed to initialize crawl")?;

    match coordinator.run().await {
        Ok(summary) => {
            if summary.halted {
                tracing::warn!(
                    "Crawl stopped early with {} URLs pending; rerun to resume",
                    summary.pending
                );
            } else {
                tracing::info!("Crawl completed successfully");
            }
            Ok(())
        }
        Err(e) => {
            tracing::error!("Crawl failed: {}", e);
            Err(e.into())
        }
    }
}
