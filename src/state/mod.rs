//! State module for tracking crawl progress
//!
//! # Components
//!
//! - `CrawlState`: page index, quota and counters for the current run
//! - `Quota`: remaining item budget, unlimited when configured as 0
//! - `ItemOutcome`: how a single item pipeline ended

mod crawl_state;
mod item_state;

// Re-export main types
pub use crawl_state::{CrawlState, Quota};
pub use item_state::{CoverStatus, ItemOutcome, ItemStage};
