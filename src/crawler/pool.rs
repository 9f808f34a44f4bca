//! Bounded-concurrency worker pool for item pipelines
//!
//! This module handles:
//! - Global concurrency limiting via a semaphore
//! - Quota accounting at dispatch time
//! - Folding item outcomes into the crawl state as they complete

use crate::crawler::parser::ItemLink;
use crate::state::{CrawlState, ItemOutcome};
use crate::TrawlError;
use std::future::Future;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::{JoinError, JoinSet};

/// What happened while dispatching one page
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageReport {
    /// Items handed to a pipeline
    pub dispatched: usize,
    /// Dispatch stopped because the quota ran out
    pub limit_reached: bool,
}

/// Runs item pipelines with at most `limit` in flight
///
/// Every spawned pipeline holds a semaphore permit until it finishes, so the
/// bound covers all of its network calls.
pub struct WorkerPool {
    semaphore: Arc<Semaphore>,
    limit: usize,
}

impl WorkerPool {
    pub fn new(limit: usize) -> Self {
        let limit = limit.max(1);
        Self {
            semaphore: Arc::new(Semaphore::new(limit)),
            limit,
        }
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    /// Number of pipelines that could start right now
    pub fn available_permits(&self) -> usize {
        self.semaphore.available_permits()
    }

    /// Processes one page worth of links
    ///
    /// Links are dispatched in order. Each dispatch consumes one unit of
    /// quota; once it is gone the remaining links are left alone and the page
    /// completes normally. Completion order is unspecified.
    ///
    /// # Returns
    ///
    /// * `Ok(PageReport)` - Every dispatched pipeline finished
    /// * `Err(TrawlError)` - A pipeline reported a fatal error; pipelines
    ///   still running are aborted
    pub async fn run_page<F, Fut>(
        &self,
        links: Vec<ItemLink>,
        state: &mut CrawlState,
        process: F,
    ) -> Result<PageReport, TrawlError>
    where
        F: Fn(ItemLink) -> Fut,
        Fut: Future<Output = Result<ItemOutcome, TrawlError>> + Send + 'static,
    {
        let mut tasks = JoinSet::new();
        let mut report = PageReport::default();

        for link in links {
            let Ok(permit) = Arc::clone(&self.semaphore).acquire_owned().await else {
                tracing::error!("Worker pool semaphore closed");
                break;
            };

            // Reap whatever finished while we waited for the slot
            while let Some(joined) = tasks.try_join_next() {
                Self::absorb(joined, state)?;
            }

            if !state.dispatch_one() {
                tracing::debug!("Item limit reached, skipping {}", link.id);
                report.limit_reached = true;
                break;
            }

            tracing::debug!("Dispatching {}", link.id);
            let pipeline = process(link);
            tasks.spawn(async move {
                let _permit = permit;
                pipeline.await
            });
            report.dispatched += 1;
        }

        while let Some(joined) = tasks.join_next().await {
            Self::absorb(joined, state)?;
        }

        Ok(report)
    }

    fn absorb(
        joined: Result<Result<ItemOutcome, TrawlError>, JoinError>,
        state: &mut CrawlState,
    ) -> Result<(), TrawlError> {
        match joined {
            Ok(Ok(outcome)) => {
                tracing::debug!("[{}] finished", outcome.item_id());
                state.record(&outcome);
                Ok(())
            }
            Ok(Err(e)) => Err(e),
            Err(e) => {
                tracing::error!("Item task ended abnormally: {}", e);
                state.record_lost();
                Ok(())
            }
        }
    }
}
