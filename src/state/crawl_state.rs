use crate::state::ItemOutcome;

/// Remaining item budget for a run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Quota {
    /// No limit configured
    Unlimited,
    /// Items that may still be dispatched
    Remaining(u64),
}

impl Quota {
    /// Builds a quota from the configured limit, where 0 means unlimited
    pub fn from_limit(limit: u64) -> Self {
        if limit == 0 {
            Self::Unlimited
        } else {
            Self::Remaining(limit)
        }
    }

    pub fn is_exhausted(&self) -> bool {
        matches!(self, Self::Remaining(0))
    }

    /// Maximum number of links worth extracting from the next page
    pub fn cap(&self) -> Option<usize> {
        match self {
            Self::Unlimited => None,
            Self::Remaining(n) => Some(usize::try_from(*n).unwrap_or(usize::MAX)),
        }
    }

    /// Consumes one unit of quota
    ///
    /// Returns false once the quota is exhausted; the caller must not dispatch.
    pub fn take_one(&mut self) -> bool {
        match self {
            Self::Unlimited => true,
            Self::Remaining(0) => false,
            Self::Remaining(n) => {
                *n -= 1;
                true
            }
        }
    }
}

/// Mutable state of a single crawl run
///
/// Owned by the coordinator. Item tasks never see it; their outcomes are
/// folded in through [`CrawlState::record`].
#[derive(Debug, Clone)]
pub struct CrawlState {
    /// 1-based index of the page being crawled
    pub page_index: u32,

    /// Item budget, decremented when an item is dispatched
    pub quota: Quota,

    /// Set once a search page yields exactly one item
    pub search_matched: bool,

    /// Items dispatched so far
    pub attempted: u64,

    /// Item-level failures so far
    pub failures: u64,

    /// Items whose magnet record was written
    pub saved: u64,

    /// Items for which the resolver returned no magnet
    pub without_magnet: u64,

    /// Catalog pages fully dispatched
    pub pages_crawled: u32,
}

impl CrawlState {
    pub fn new(limit: u64) -> Self {
        Self {
            page_index: 1,
            quota: Quota::from_limit(limit),
            search_matched: false,
            attempted: 0,
            failures: 0,
            saved: 0,
            without_magnet: 0,
            pages_crawled: 0,
        }
    }

    /// True when the crawl loop must stop before probing another page
    pub fn should_stop(&self) -> bool {
        self.quota.is_exhausted() || self.search_matched
    }

    /// Reserves quota for one item and counts it as attempted
    pub fn dispatch_one(&mut self) -> bool {
        if !self.quota.take_one() {
            return false;
        }
        self.attempted += 1;
        true
    }

    /// Folds a finished item into the counters
    pub fn record(&mut self, outcome: &ItemOutcome) {
        self.failures += outcome.failure_count();
        match outcome {
            ItemOutcome::Saved { .. } => self.saved += 1,
            ItemOutcome::NoMagnet { .. } => self.without_magnet += 1,
            ItemOutcome::Failed { .. } => {}
        }
    }

    /// Counts an item whose task died without reporting an outcome
    pub fn record_lost(&mut self) {
        self.failures += 1;
    }

    /// Moves on to the next page
    pub fn advance_page(&mut self) {
        self.pages_crawled += 1;
        self.page_index += 1;
    }
}
