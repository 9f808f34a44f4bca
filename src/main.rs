//! Magnet-Trawl main entry point
//!
//! This is the command-line interface for the Magnet-Trawl catalog crawler.

use anyhow::Context;
use clap::Parser;
use magnet_trawl::config::{compute_config_hash, parse_config_file, validate, Config, ConfigOverrides};
use magnet_trawl::crawler::crawl;
use magnet_trawl::output::print_summary;
use magnet_trawl::url::PageRequest;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Magnet-Trawl: a paginated catalog crawler
///
/// Walks the catalog page by page, resolves a magnet link for every item and
/// stores it together with the cover image in one directory per item.
#[derive(Parser, Debug)]
#[command(name = "magnet-trawl")]
#[command(version)]
#[command(about = "Collects magnet links and covers from a paginated catalog", long_about = None)]
struct Cli {
    /// Optional TOML configuration file; flags override its values
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Number of items processed concurrently [default: 2]
    #[arg(short, long, value_name = "NUM")]
    parallel: Option<u32>,

    /// Request timeout in milliseconds [default: 30000]
    #[arg(short, long, value_name = "MS")]
    timeout: Option<u64>,

    /// Maximum number of items to crawl, 0 for all [default: 0]
    #[arg(short, long, value_name = "NUM")]
    limit: Option<u64>,

    /// Directory receiving one sub-directory per item [default: ~/magnets]
    #[arg(short, long, value_name = "DIR")]
    output: Option<String>,

    /// Only crawl the results of this search keyword
    #[arg(short, long, value_name = "KEYWORD")]
    search: Option<String>,

    /// Custom listing page to start from
    #[arg(short, long, value_name = "URL")]
    base: Option<String>,

    /// Include items without magnets in the listing pages
    #[arg(short, long)]
    all_magnets: bool,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Show the effective configuration and first page URL without crawling
    #[arg(long)]
    dry_run: bool,
}

impl Cli {
    fn overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            parallel: self.parallel,
            timeout_ms: self.timeout,
            limit: self.limit,
            output: self.output.clone(),
            search: self.search.clone(),
            alternate_base: self.base.clone(),
            all_magnets: self.all_magnets,
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    let config = build_config(&cli)?;

    if cli.dry_run {
        handle_dry_run(&config)?;
        return Ok(());
    }

    handle_crawl(config).await
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("magnet_trawl=info,warn"),
            1 => EnvFilter::new("magnet_trawl=debug,info"),
            2 => EnvFilter::new("magnet_trawl=trace,debug"),
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

/// Merges the optional config file with command-line flags and validates
fn build_config(cli: &Cli) -> anyhow::Result<Config> {
    let mut config = match &cli.config {
        Some(path) => {
            tracing::info!("Loading configuration from: {}", path.display());
            let config = parse_config_file(path)
                .with_context(|| format!("Failed to load configuration from {}", path.display()))?;
            let hash = compute_config_hash(path)?;
            tracing::info!("Configuration loaded successfully (hash: {})", hash);
            config
        }
        None => Config::default(),
    };

    config.apply_overrides(cli.overrides());
    validate(&config).context("Invalid configuration")?;
    Ok(config)
}

/// Handles the --dry-run mode: shows what would be crawled
fn handle_dry_run(config: &Config) -> anyhow::Result<()> {
    println!("=== Magnet-Trawl Dry Run ===\n");

    println!("Crawler Configuration:");
    println!("  Parallel items: {}", config.crawler.parallel);
    println!("  Timeout: {:.1}s", config.crawler.timeout_ms as f64 / 1000.0);
    if config.crawler.limit == 0 {
        println!("  Item limit: none");
    } else {
        println!("  Item limit: {}", config.crawler.limit);
    }
    println!("  Page attempts: {}", config.crawler.page_attempts);
    println!("  Max redirects: {}", config.crawler.max_redirects);

    println!("\nSite:");
    println!("  Base URL: {}", config.site.base_url);
    if let Some(search) = &config.site.search {
        println!("  Search: {}", search);
    }
    if let Some(alternate) = &config.site.alternate_base {
        println!("  Alternate base: {}", alternate);
    }
    println!("  Cookie: {}", config.site.magnet_cookie());
    println!("  Resolver: {}", config.site.resolver_path);

    println!("\nOutput:");
    println!("  Directory: {}", config.output.resolved_directory().display());

    let first_page = PageRequest::from_site(&config.site, 1).url()?;
    println!("\n✓ Configuration is valid");
    println!("✓ Would start crawling at {}", first_page);

    Ok(())
}

/// Handles the main crawl operation
async fn handle_crawl(config: Config) -> anyhow::Result<()> {
    tracing::info!("========== Crawling {} ==========", config.site.base_url);
    tracing::info!(
        "Parallel items: {}, timeout: {:.1}s",
        config.crawler.parallel,
        config.crawler.timeout_ms as f64 / 1000.0
    );
    tracing::info!(
        "Saving magnets to: {}",
        config.output.resolved_directory().display()
    );

    // In-flight item work is abandoned when main returns
    match crawl(config).await {
        Ok(summary) => {
            print_summary(&summary);
            Ok(())
        }
        Err(e) => {
            tracing::error!("Crawl halted: {}", e);
            Err(e.into())
        }
    }
}
