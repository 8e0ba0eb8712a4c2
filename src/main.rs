//! Internship-Scout main entry point
//!
//! This is the command-line interface for the Internship-Scout listing harvester.

use anyhow::Context;
use clap::Parser;
use internship_scout::config::{
    load_config_with_hash, load_input, parse_input, Config, OutputFormat, SearchInput,
};
use internship_scout::crawler::{CrawlController, CrawlReport};
use internship_scout::output::{create_sink, print_statistics, ListingStatistics};
use std::path::{Path, PathBuf};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

/// Internship-Scout: a polite internship listing harvester
///
/// Internship-Scout walks the search result pages for one set of filters,
/// extracting and deduplicating listings until the result or page budget
/// is spent, and writes them as JSON, JSON Lines or CSV.
#[derive(Parser, Debug)]
#[command(name = "internship-scout")]
#[command(version = "1.0.0")]
#[command(about = "A polite internship listing harvester", long_about = None)]
struct Cli {
    /// Path to TOML configuration file (defaults apply when omitted)
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Search input: a JSON file path or inline JSON document
    #[arg(short, long, value_name = "FILE|JSON", env = "SCOUT_INPUT")]
    input: Option<String>,

    /// Output file, overriding the configuration
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,

    /// Output format, overriding the configuration
    #[arg(short, long, value_enum)]
    format: Option<OutputFormat>,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Validate inputs and print the page URLs that would be fetched
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    let mut config = match &cli.config {
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

    if let Some(output) = &cli.output {
        config.output.path = output.display().to_string();
    }
    if let Some(format) = cli.format {
        config.output.format = format;
    }

    let input = read_input(cli.input.as_deref()).context("invalid search input")?;
    let controller = CrawlController::from_config(&config, &input)?;

    if cli.dry_run {
        handle_dry_run(&config, &input, &controller)
    } else {
        handle_crawl(&config, controller, cli.quiet).await
    }
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("internship_scout=info,warn"),
            1 => EnvFilter::new("internship_scout=debug,info"),
            2 => EnvFilter::new("internship_scout=trace,debug"),
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

/// Reads the search input from inline JSON, a file, or the defaults
fn read_input(raw: Option<&str>) -> anyhow::Result<SearchInput> {
    let input = match raw.map(str::trim) {
        None | Some("") => SearchInput::default(),
        Some(json) if json.starts_with('{') => parse_input(json)?,
        Some(path) => load_input(Path::new(path))
            .with_context(|| format!("failed to read input file {}", path))?,
    };
    Ok(input)
}

/// Handles the --dry-run mode: shows what would be fetched
fn handle_dry_run(
    config: &Config,
    input: &SearchInput,
    controller: &CrawlController,
) -> anyhow::Result<()> {
    println!("=== Internship-Scout Dry Run ===\n");

    println!("Search:");
    println!("  Category: {}", input.job_category);
    if input.work_from_home {
        println!("  Location: work from home");
    } else {
        println!("  Location: {}", input.location);
    }
    println!("  Part time: {}", input.part_time);
    if !input.stipend.trim().is_empty() {
        println!("  Minimum stipend: {}", input.stipend);
    }
    println!("  Max results: {}", input.max_results);

    println!("\nFetcher:");
    println!("  Minimum delay: {}ms", config.fetcher.min_delay_ms);
    println!("  Max attempts: {}", config.fetcher.max_attempts);
    println!("  Timeout: {}s", config.fetcher.timeout_secs);
    println!("  Browser fallback: {}", config.fetcher.browser_fallback);

    println!("\nOutput:");
    println!("  {} ({:?})", config.output.path, config.output.format);

    let urls = controller.planned_urls()?;
    println!("\nPages ({}):", urls.len());
    for url in &urls {
        println!("  - {}", url);
    }

    println!("\n✓ Configuration and search input are valid");

    Ok(())
}

/// Handles the main crawl operation
async fn handle_crawl(
    config: &Config,
    controller: CrawlController,
    quiet: bool,
) -> anyhow::Result<()> {
    let cancel = CancellationToken::new();
    let controller = controller.with_cancellation(cancel.clone());

    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupt received, stopping after the current page");
            cancel.cancel();
        }
    });

    let mut sink = create_sink(&config.output)
        .with_context(|| format!("failed to open {}", config.output.path))?;

    let report: CrawlReport = match controller.run_with_sink(sink.as_mut()).await {
        Ok(report) => report,
        Err(e) => {
            tracing::error!("Crawl failed: {}", e);
            return Err(e.into());
        }
    };
    sink.finish()?;

    tracing::info!(
        "Wrote {} records to {}",
        report.records.len(),
        config.output.path
    );

    if !quiet {
        let stats = ListingStatistics::from_records(&report.records);
        print_statistics(&stats, &report);
    }

    Ok(())
}
