//! Backlink Sentinel main entry point
//!
//! This is the command-line interface for ownership-verified backlink
//! discovery and internal link auditing.

use anyhow::{bail, Context};
use backlink_sentinel::config::{load_config_with_hash, Config};
use backlink_sentinel::output::{print_statistics, JsonFileSink, ProgressEvent, ReportSink};
use backlink_sentinel::{Coordinator, CrawlRequest};
use clap::Parser;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Backlink Sentinel: verify a site you own, then map who links to it
///
/// The site must serve a `backlink-sentinel-verify` meta tag whose content is
/// the given token. Once ownership is proven, public search surfaces are
/// queried for backlinks and the landing page's internal links are checked.
#[derive(Parser, Debug)]
#[command(name = "backlink-sentinel")]
#[command(version)]
#[command(about = "Ownership-verified backlink discovery and link auditing", long_about = None)]
struct Cli {
    /// Site to crawl, e.g. example.com or https://www.example.com/
    #[arg(value_name = "SITE")]
    site: String,

    /// Verification token served in the site's meta tag
    #[arg(value_name = "TOKEN")]
    token: String,

    /// Path to TOML configuration file (defaults are used if omitted)
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Write the JSON result to this file
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,

    /// Validate inputs and show what would be probed and queried, without network access
    #[arg(long, conflicts_with = "output")]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    let config = match &cli.config {
        Some(path) => {
            tracing::info!("Loading configuration from: {}", path.display());
            let (config, hash) = load_config_with_hash(path)
                .with_context(|| format!("failed to load {}", path.display()))?;
            tracing::info!("Configuration loaded successfully (hash: {})", hash);
            config
        }
        None => {
            tracing::info!("No configuration file given, using defaults");
            Config::default()
        }
    };

    let request = CrawlRequest::new(cli.site, cli.token);
    let coordinator = Coordinator::new(config).context("failed to initialize crawler")?;

    if cli.dry_run {
        handle_dry_run(&coordinator, &request)
    } else {
        handle_crawl(&coordinator, &request, cli.output).await
    }
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("backlink_sentinel=info,warn"),
            1 => EnvFilter::new("backlink_sentinel=debug,info"),
            2 => EnvFilter::new("backlink_sentinel=trace,debug"),
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

/// Handles the --dry-run mode: validates inputs and shows the crawl plan
fn handle_dry_run(coordinator: &Coordinator, request: &CrawlRequest) -> anyhow::Result<()> {
    let plan = coordinator.plan(request).context("invalid input")?;
    let config = coordinator.config();

    println!("=== Backlink Sentinel Dry Run ===\n");
    println!("Normalized domain: {}", plan.domain);

    println!("\nOrigin variants (probed in order):");
    for variant in &plan.variants {
        println!("  - {}", variant);
    }

    println!("\nRenderer:");
    println!("  Browserless: {}", config.verifier.browserless_url);
    println!("  Navigation timeout: {}s", config.verifier.render_timeout_secs);

    println!("\nSearch surfaces ({}):", plan.searches.len());
    for (name, url) in &plan.searches {
        println!("  - {}: {}", name, url);
    }

    println!("\nLimits:");
    println!(
        "  Executor: {} concurrent, {} attempts, {}ms base backoff",
        config.executor.concurrency,
        config.executor.max_attempts,
        config.executor.retry_base_delay_ms
    );
    println!("  Max backlinks: {}", config.discovery.max_backlinks);
    println!(
        "  Max internal links: {} ({} concurrent)",
        config.audit.max_internal_links, config.audit.concurrency
    );

    println!("\n✓ Inputs and configuration are valid");
    Ok(())
}

/// Handles the main crawl operation
async fn handle_crawl(
    coordinator: &Coordinator,
    request: &CrawlRequest,
    output: Option<PathBuf>,
) -> anyhow::Result<()> {
    let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel::<ProgressEvent>();

    let logger = tokio::spawn(async move {
        while let Some(event) = rx.recv().await {
            match &event {
                ProgressEvent::Error { .. } => tracing::error!("{}", event),
                _ => tracing::info!("{}", event),
            }
        }
    });

    let result = coordinator.run(request, &tx).await;
    drop(tx);
    if let Err(e) = logger.await {
        tracing::warn!("Progress logger stopped: {}", e);
    }

    print_statistics(&result);

    if let Some(path) = output {
        JsonFileSink::new(&path)
            .deliver(&result)
            .with_context(|| format!("failed to write {}", path.display()))?;
        println!("✓ Result written to: {}", path.display());
    }

    if !result.success {
        bail!(
            "crawl failed: {}",
            result.error.as_deref().unwrap_or("unknown error")
        );
    }

    Ok(())
}
