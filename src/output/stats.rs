//! Run summary built from the final crawl state

use crate::state::CrawlState;
use chrono::{DateTime, Utc};
use std::path::PathBuf;
use std::time::Duration;

/// Crawl statistics summary
#[derive(Debug, Clone)]
pub struct CrawlSummary {
    /// When the crawl loop started
    pub started_at: DateTime<Utc>,

    /// Wall-clock duration of the crawl loop
    pub elapsed: Duration,

    /// Catalog pages whose items were all dispatched
    pub pages_crawled: u32,

    /// Items dispatched to a pipeline
    pub attempted: u64,

    /// Item-level failures, cover failures included
    pub failures: u64,

    /// Items with a written magnet record
    pub saved: u64,

    /// Items the resolver had no magnet for
    pub without_magnet: u64,

    /// The configured item limit was used up
    pub quota_reached: bool,

    /// A search returned exactly one item
    pub search_matched: bool,

    /// Root directory of the artifacts
    pub output_dir: PathBuf,
}

impl CrawlSummary {
    pub fn from_state(
        state: &CrawlState,
        started_at: DateTime<Utc>,
        elapsed: Duration,
        output_dir: PathBuf,
    ) -> Self {
        Self {
            started_at,
            elapsed,
            pages_crawled: state.pages_crawled,
            attempted: state.attempted,
            failures: state.failures,
            saved: state.saved,
            without_magnet: state.without_magnet,
            quota_reached: state.quota.is_exhausted(),
            search_matched: state.search_matched,
            output_dir,
        }
    }

    /// One-line verdict printed at the end of a run
    pub fn headline(&self) -> String {
        if self.quota_reached {
            format!(
                "Attempted {} items, {} failed. Crawl finished.",
                self.attempted, self.failures
            )
        } else {
            format!("Crawl finished, {} failed.", self.failures)
        }
    }
}

/// Prints the summary to stdout in a formatted manner
pub fn print_summary(summary: &CrawlSummary) {
    println!("=== Crawl Summary ===\n");
    println!(
        "  Started: {}",
        summary.started_at.format("%Y-%m-%d %H:%M:%S UTC")
    );
    println!("  Duration: {:.1}s", summary.elapsed.as_secs_f64());
    println!("  Pages crawled: {}", summary.pages_crawled);
    println!("  Items attempted: {}", summary.attempted);
    println!("  Magnets saved: {}", summary.saved);
    println!("  Without magnet: {}", summary.without_magnet);
    println!("  Failures: {}", summary.failures);
    if summary.search_matched {
        println!("  Search matched a single item");
    }
    println!("  Output: {}", summary.output_dir.display());
    println!();
    println!("{}", summary.headline());
}
