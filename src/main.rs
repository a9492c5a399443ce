//! Auto-Harvest main entry point
//!
//! This is the command-line interface for the Auto-Harvest listing scraper.

use anyhow::Context;
use auto_harvest::clean::clean_all;
use auto_harvest::config::{load_config_with_hash, Config};
use auto_harvest::crawler::run_all;
use auto_harvest::output::{print_statistics, TableStatistics};
use auto_harvest::sites::adapter_for;
use auto_harvest::store::{CsvTableStore, TableStore};
use clap::Parser;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Auto-Harvest: a used-car listing scraper
///
/// Auto-Harvest walks the listing pages of the configured classifieds
/// sites, extracts complete car records from their detail pages and
/// appends the new ones to one CSV table per site.
#[derive(Parser, Debug)]
#[command(name = "auto-harvest")]
#[command(version = "1.0.0")]
#[command(about = "A used-car listing scraper", long_about = None)]
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

    /// Only run the source for this site
    #[arg(long, value_name = "NAME")]
    source: Option<String>,

    /// Validate config and show what would be scraped without scraping
    #[arg(long, conflicts_with_all = ["stats", "dedup", "clean"])]
    dry_run: bool,

    /// Show statistics for each persisted table and exit
    #[arg(long, conflicts_with_all = ["dry_run", "dedup", "clean"])]
    stats: bool,

    /// Remove rows whose values repeat an earlier row and exit
    #[arg(long, conflicts_with_all = ["dry_run", "stats", "clean"])]
    dedup: bool,

    /// Write the cleaned, merged dataset and exit
    #[arg(long, conflicts_with_all = ["dry_run", "stats", "dedup"])]
    clean: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    // Load and validate configuration
    tracing::info!("Loading configuration from: {}", cli.config.display());
    let (config, hash) = load_config_with_hash(&cli.config)
        .with_context(|| format!("Failed to load {}", cli.config.display()))?;
    tracing::info!("Configuration loaded successfully (hash: {})", hash);

    // Handle different modes
    if cli.dry_run {
        handle_dry_run(&config);
    } else if cli.stats {
        handle_stats(&config, cli.source.as_deref())?;
    } else if cli.dedup {
        handle_dedup(&config, cli.source.as_deref())?;
    } else if cli.clean {
        handle_clean(&config)?;
    } else {
        handle_scrape(&config, cli.source.as_deref()).await?;
    }

    Ok(())
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("auto_harvest=info,warn"),
            1 => EnvFilter::new("auto_harvest=debug,info"),
            2 => EnvFilter::new("auto_harvest=trace,debug"),
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

/// Stores of the selected sources, paired with the site name
fn selected_stores(
    config: &Config,
    only: Option<&str>,
) -> anyhow::Result<Vec<(String, CsvTableStore)>> {
    let mut stores = Vec::new();
    for source in &config.sources {
        if only.is_some_and(|name| name != source.site.name()) {
            continue;
        }
        let identity = adapter_for(source)?.identity();
        stores.push((
            source.site.name().to_string(),
            CsvTableStore::new(&source.output_path, identity),
        ));
    }

    if let (Some(name), true) = (only, stores.is_empty()) {
        anyhow::bail!("No configured source named '{}'", name);
    }
    Ok(stores)
}

/// Handles the --dry-run mode: validates config and shows what would be scraped
fn handle_dry_run(config: &Config) {
    println!("=== Auto-Harvest Dry Run ===\n");

    println!("Scraper Configuration:");
    println!("  Max pages: {}", config.scraper.max_pages);
    println!("  Target records: {}", config.scraper.target_records);
    println!("  Max batch size: {}", config.scraper.max_batch_size);
    println!("  Workers: {}", config.scraper.workers);
    println!("  Page delay: {}ms", config.scraper.page_delay_ms);

    println!("\nFetcher:");
    println!("  Attempts per URL: {}", config.fetcher.max_retries);
    println!(
        "  Retry delay: {}ms ({:?})",
        config.fetcher.retry_delay_ms, config.fetcher.backoff
    );
    println!("  Timeout: {}s", config.fetcher.timeout_secs);
    println!("  User agent: {}", config.fetcher.user_agent);

    println!("\nSources ({}):", config.sources.len());
    for source in &config.sources {
        let pagination = source
            .pagination
            .unwrap_or_else(|| source.site.default_pagination());
        println!("  - {} ({:?} pagination)", source.site, pagination);
        println!("    * listing: {}", source.base_url);
        println!("    * table: {}", source.output_path);
    }

    println!("\nCleaned dataset: {}", config.output.cleaned_path);

    println!("\n✓ Configuration is valid");
    println!(
        "✓ Would request at most {} listing pages",
        config.scraper.max_pages as usize * config.sources.len()
    );
}

/// Handles the --stats mode: shows statistics for each table
fn handle_stats(config: &Config, only: Option<&str>) -> anyhow::Result<()> {
    for (name, store) in selected_stores(config, only)? {
        println!("Table: {}\n", store.describe());
        let table = store.load()?;
        print_statistics(&name, &TableStatistics::from_table(&table));
    }
    Ok(())
}

/// Handles the --dedup mode: drops repeated rows from each table
fn handle_dedup(config: &Config, only: Option<&str>) -> anyhow::Result<()> {
    for (name, store) in selected_stores(config, only)? {
        let mut table = store.load()?;
        let removed = table.dedup();
        if removed > 0 {
            store.save(&table)?;
        }
        println!(
            "✓ {}: removed {} duplicate rows, {} remain",
            name,
            removed,
            table.len()
        );
    }
    Ok(())
}

/// Handles the --clean mode: writes the cleaned dataset
fn handle_clean(config: &Config) -> anyhow::Result<()> {
    let (input, output) = clean_all(config)?;
    println!(
        "✓ Cleaned {} rows into {} ({} kept)",
        input, config.output.cleaned_path, output
    );
    Ok(())
}

/// Handles the main scrape operation
async fn handle_scrape(config: &Config, only: Option<&str>) -> anyhow::Result<()> {
    tracing::info!(
        "Sources: {}, workers: {}, page budget: {}",
        config.sources.len(),
        config.scraper.workers,
        config.scraper.max_pages
    );

    match run_all(config, only).await {
        Ok(reports) => {
            let accepted: usize = reports.iter().map(|r| r.accepted).sum();
            tracing::info!("Scrape completed: {} new records", accepted);
            Ok(())
        }
        Err(e) => {
            tracing::error!("Scrape failed: {}", e);
            Err(e.into())
        }
    }
}
