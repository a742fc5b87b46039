//! Job-Miner main entry point
//!
//! This is the command-line interface for the Job-Miner job board crawler.

use clap::Parser;
use job_miner::config::{load_config_with_hash, Config};
use job_miner::crawler::Pipeline;
use job_miner::output::{load_statistics, print_crawl_report, print_statistics};
use job_miner::skills::SkillCategorizer;
use job_miner::state::ShutdownSignal;
use job_miner::storage::{open_storage, persist_outcome, JobStore, RunStatus, RunSummary};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing_subscriber::EnvFilter;

/// Job-Miner: a polite job board crawler
///
/// Job-Miner walks every page of a job board's search results, extracts each
/// posting into a structured record, classifies its skills and stores the
/// results in SQLite.
#[derive(Parser, Debug)]
#[command(name = "job-miner")]
#[command(version = "1.0.0")]
#[command(about = "A polite job board crawler", long_about = None)]
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

    /// Validate config and show the effective settings without crawling
    #[arg(long, conflicts_with_all = ["stats", "no_persist"])]
    dry_run: bool,

    /// Show statistics from the database and exit
    #[arg(long, conflicts_with_all = ["dry_run", "no_persist"])]
    stats: bool,

    /// Crawl and print the report without writing to the database
    #[arg(long)]
    no_persist: bool,

    /// Stop the crawl gracefully after this many seconds
    #[arg(long, value_name = "SECS")]
    timeout: Option<u64>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    // Load and validate configuration
    tracing::info!("Loading configuration from: {}", cli.config.display());
    let (config, config_hash) = match load_config_with_hash(&cli.config) {
        Ok((cfg, hash)) => {
            tracing::info!("Configuration loaded successfully (hash: {})", hash);
            (cfg, hash)
        }
        Err(e) => {
            tracing::error!("Failed to load configuration: {}", e);
            return Err(e.into());
        }
    };

    // Handle different modes
    if cli.dry_run {
        handle_dry_run(&config)?;
    } else if cli.stats {
        handle_stats(&config)?;
    } else {
        handle_crawl(&config, &config_hash, !cli.no_persist, cli.timeout).await?;
    }

    Ok(())
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("job_miner=info,warn"),
            1 => EnvFilter::new("job_miner=debug,info"),
            2 => EnvFilter::new("job_miner=trace,debug"),
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

/// Handles the --dry-run mode: shows the effective configuration and taxonomy
fn handle_dry_run(config: &Config) -> Result<(), Box<dyn std::error::Error>> {
    println!("=== Job-Miner Dry Run ===\n");

    println!("Source:");
    println!("  Site: {} ({})", config.source.site, config.source.name);
    println!("  Base URL: {}", config.source.base_url);
    println!("  Search URL: {}", config.source.search_url);
    println!("  Page parameter: {}", config.source.page_param);

    println!("\nCrawler Configuration:");
    println!("  Page size: {}", config.crawler.page_size);
    println!("  Max pages (safety cap): {}", config.crawler.max_pages_safety_cap);
    println!("  Workers: {}", config.crawler.worker_count);
    println!("  Pagination: {:?}", config.crawler.pagination);
    println!(
        "  Delay between listing pages: {}-{}ms",
        config.crawler.polite_delay_min_ms, config.crawler.polite_delay_max_ms
    );

    println!("\nFetching:");
    println!("  Timeout: {}s", config.fetch.timeout_secs);
    println!("  Max retries: {}", config.fetch.max_retries);
    println!("  Base retry delay: {}ms", config.fetch.base_retry_delay_ms);
    println!("  User agent: {}", config.user_agent.value);

    println!("\nOutput:");
    println!("  Database: {}", config.output.database_path);

    let categorizer = SkillCategorizer::from_entries(&config.taxonomy);
    let source = if config.taxonomy.is_empty() {
        "built-in"
    } else {
        "configured"
    };
    println!("\nSkill Taxonomy ({}):", source);
    for category in categorizer.categories() {
        println!(
            "  - {} ({} skills)",
            category,
            categorizer.category_size(category)
        );
    }

    // Building the pipeline checks the site name and its selectors
    Pipeline::new(config)?;

    println!("\n✓ Configuration is valid");
    println!(
        "✓ Would crawl {} with up to {} listing pages",
        config.source.search_url, config.crawler.max_pages_safety_cap
    );

    Ok(())
}

/// Handles the --stats mode: shows statistics from the database
fn handle_stats(config: &Config) -> Result<(), Box<dyn std::error::Error>> {
    println!("Database: {}\n", config.output.database_path);

    let storage = open_storage(Path::new(&config.output.database_path))?;
    let stats = load_statistics(&storage)?;
    print_statistics(&stats);

    Ok(())
}

/// Handles the main crawl operation
async fn handle_crawl(
    config: &Config,
    config_hash: &str,
    persist: bool,
    timeout: Option<u64>,
) -> Result<(), Box<dyn std::error::Error>> {
    let shutdown = ShutdownSignal::new();
    let pipeline = Pipeline::new(config)?.with_shutdown(shutdown.clone());

    let mut storage = if persist {
        Some(open_storage(Path::new(&config.output.database_path))?)
    } else {
        tracing::info!("Persistence disabled; results will only be reported");
        None
    };

    let run_id = match storage.as_mut() {
        Some(store) => Some(store.create_run(config_hash)?),
        None => None,
    };

    {
        let shutdown = shutdown.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::warn!("Received Ctrl-C, finishing in-flight work...");
                shutdown.trigger();
            }
        });
    }

    if let Some(secs) = timeout {
        let shutdown = shutdown.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(secs)).await;
            tracing::warn!("Time limit of {}s reached, stopping crawl", secs);
            shutdown.trigger();
        });
    }

    let outcome = pipeline.run().await;

    let persisted = match storage.as_mut() {
        Some(store) => {
            let report = persist_outcome(store, &outcome);
            if let Some(run_id) = run_id {
                let status = if outcome.interrupted {
                    RunStatus::Interrupted
                } else if outcome.counts.pages_crawled == 0 {
                    RunStatus::Failed
                } else {
                    RunStatus::Completed
                };
                store.complete_run(run_id, status, &RunSummary::from_outcome(&outcome))?;
            }
            Some(report)
        }
        None => None,
    };

    print_crawl_report(&outcome, persisted.as_ref());

    if outcome.interrupted {
        tracing::warn!("Crawl interrupted after {} record(s)", outcome.counts.records);
    } else {
        tracing::info!("Crawl completed with {} record(s)", outcome.counts.records);
    }

    Ok(())
}
