//! Crawler module for catalog page probing and item processing
//!
//! This module contains the core crawling logic, including:
//! - HTTP fetching with redirect and timeout handling
//! - Page probing with retry
//! - HTML parsing for item links, metadata and magnets
//! - The per-item pipeline and the bounded worker pool
//! - Overall crawl coordination

mod coordinator;
mod fetcher;
mod parser;
mod pipeline;
mod pool;
mod prober;

pub use coordinator::{run_crawl, Coordinator, CrawlPhase};
pub use fetcher::{build_http_client, classify_error, fetch_text, fetch_url, FetchError, FetchOptions};
pub use parser::{
    extract_item_links, parse_item_metadata, parse_magnet, ItemLink, ItemMetadata,
    MetadataError, ResolvedMagnet,
};
pub use pipeline::ItemPipeline;
pub use pool::{PageReport, WorkerPool};
pub use prober::{PageProber, ProbeOutcome};

use crate::config::Config;
use crate::output::CrawlSummary;
use crate::TrawlError;

/// Runs a complete crawl operation
///
/// This is the main entry point for starting a crawl. It will:
/// 1. Build the HTTP client and item pipeline
/// 2. Probe catalog pages in order until a stop condition holds
/// 3. Run the item pipeline for every dispatched item
/// 4. Return the run summary
///
/// # Returns
///
/// * `Ok(CrawlSummary)` - Crawl completed
/// * `Err(TrawlError)` - Crawl halted
pub async fn crawl(config: Config) -> Result<CrawlSummary, TrawlError> {
    run_crawl(config).await
}
