//! Output module for reporting crawl results
//!
//! The artifacts themselves are written by the storage module; this module
//! only summarizes a finished run.

pub mod stats;

pub use stats::{print_summary, CrawlSummary};
