//! Crawler coordinator - main crawl orchestration logic
//!
//! This module contains the main crawl loop that coordinates:
//! - Probing catalog pages in increasing index order
//! - Extracting item links and detecting a single search match
//! - Dispatching items to the worker pool
//! - Applying the global stop conditions

use crate::config::Config;
use crate::crawler::fetcher::{build_http_client, FetchOptions};
use crate::crawler::parser::{extract_item_links, ItemLink};
use crate::crawler::pipeline::ItemPipeline;
use crate::crawler::pool::WorkerPool;
use crate::crawler::prober::{PageProber, ProbeOutcome};
use crate::output::CrawlSummary;
use crate::state::CrawlState;
use crate::url::PageRequest;
use crate::TrawlError;
use chrono::Utc;
use std::sync::Arc;
use std::time::{Duration, Instant};
use url::Url;

/// Where the crawl loop currently is
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CrawlPhase {
    Probing,
    Extracting,
    Dispatching,
    Done,
    Halted,
}

/// Main crawler coordinator structure
pub struct Coordinator {
    config: Arc<Config>,
    prober: PageProber,
    pipeline: Arc<ItemPipeline>,
    pool: WorkerPool,
    state: CrawlState,
    phase: CrawlPhase,
}

impl Coordinator {
    /// Creates a new coordinator instance
    ///
    /// # Returns
    ///
    /// * `Ok(Coordinator)` - Successfully created coordinator
    /// * `Err(TrawlError)` - The HTTP client or resolver URL could not be set up
    pub fn new(config: Config) -> Result<Self, TrawlError> {
        let client = build_http_client(&config.site.user_agent)?;

        let page_options = FetchOptions::new(
            Duration::from_millis(config.crawler.timeout_ms),
            config.crawler.max_redirects,
        )
        .with_cookie(config.site.magnet_cookie());

        let prober = PageProber::new(client.clone(), page_options, config.crawler.page_attempts);
        let pipeline = Arc::new(ItemPipeline::new(client, &config)?);
        let pool = WorkerPool::new(config.crawler.parallel as usize);
        let state = CrawlState::new(config.crawler.limit);

        Ok(Self {
            config: Arc::new(config),
            prober,
            pipeline,
            pool,
            state,
            phase: CrawlPhase::Probing,
        })
    }

    pub fn state(&self) -> &CrawlState {
        &self.state
    }

    pub fn phase(&self) -> CrawlPhase {
        self.phase
    }

    /// Runs the main crawl loop
    ///
    /// Pages are probed strictly in order; page N+1 is only probed after every
    /// item dispatched from page N has finished. The loop ends on a 404, an
    /// exhausted quota or a single search match.
    ///
    /// # Returns
    ///
    /// * `Ok(CrawlSummary)` - The crawl reached a normal stop
    /// * `Err(TrawlError)` - A page could not be fetched after all attempts,
    ///   or an artifact could not be written
    pub async fn run(&mut self) -> Result<CrawlSummary, TrawlError> {
        let started_at = Utc::now();
        let start_time = Instant::now();

        loop {
            if self.state.should_stop() {
                tracing::debug!(
                    "Stopping before page {} (quota exhausted: {}, search matched: {})",
                    self.state.page_index,
                    self.state.quota.is_exhausted(),
                    self.state.search_matched
                );
                break;
            }

            let request = PageRequest::from_site(&self.config.site, self.state.page_index);
            let page_url = request.url()?;

            self.enter(CrawlPhase::Probing);
            tracing::info!(
                "Fetching item links from page {} ({})",
                self.state.page_index,
                page_url
            );

            let html = match self.prober.probe(&page_url).await {
                ProbeOutcome::Exists(html) => html,
                ProbeOutcome::NotFound => {
                    tracing::info!("All pages crawled (page {} not found)", self.state.page_index);
                    break;
                }
                ProbeOutcome::Failed(source) => {
                    self.enter(CrawlPhase::Halted);
                    return Err(TrawlError::Probe {
                        page: self.state.page_index,
                        url: page_url.to_string(),
                        source,
                    });
                }
            };

            self.enter(CrawlPhase::Extracting);
            let links = self.extract_links(&request, &page_url, &html);

            self.enter(CrawlPhase::Dispatching);
            let pipeline = Arc::clone(&self.pipeline);
            let result = self
                .pool
                .run_page(links, &mut self.state, move |link| {
                    let pipeline = Arc::clone(&pipeline);
                    async move { pipeline.process_item(link).await }
                })
                .await;

            let report = match result {
                Ok(report) => report,
                Err(e) => {
                    self.enter(CrawlPhase::Halted);
                    return Err(e);
                }
            };

            tracing::info!(
                "===== Page {} done ({} items dispatched) =====",
                self.state.page_index,
                report.dispatched
            );
            self.state.advance_page();
        }

        self.enter(CrawlPhase::Done);
        Ok(CrawlSummary::from_state(
            &self.state,
            started_at,
            start_time.elapsed(),
            self.pipeline.store().root().to_path_buf(),
        ))
    }

    /// Extracts item links and records a single search match
    fn extract_links(&mut self, request: &PageRequest, page_url: &Url, html: &str) -> Vec<ItemLink> {
        let links = extract_item_links(html, page_url, self.state.quota.cap());

        if request.is_search() && links.len() == 1 {
            tracing::info!("Search matched a single item: {}", links[0].id);
            self.state.search_matched = true;
        }

        if links.is_empty() {
            tracing::info!("No items on page {}", self.state.page_index);
        } else {
            let ids: Vec<&str> = links.iter().map(|l| l.id.as_str()).collect();
            tracing::info!("Processing items: {}", ids.join(", "));
        }

        links
    }

    fn enter(&mut self, phase: CrawlPhase) {
        tracing::debug!("Crawl phase {:?} -> {:?}", self.phase, phase);
        self.phase = phase;
    }
}

/// Runs the main crawl operation
///
/// # Example
///
/// ```no_run
/// use magnet_trawl::config::load_config;
/// use magnet_trawl::crawler::run_crawl;
/// use std::path::Path;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let config = load_config(Path::new("trawl.toml"))?;
/// let summary = run_crawl(config).await?;
/// println!("{} items attempted", summary.attempted);
/// # Ok(())
/// # }
/// ```
pub async fn run_crawl(config: Config) -> Result<CrawlSummary, TrawlError> {
    let mut coordinator = Coordinator::new(config)?;
    coordinator.run().await
}
