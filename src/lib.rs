//! Magnet-Trawl: a paginated catalog crawler
//!
//! This crate walks a catalog site page by page, resolves a magnet link for every
//! item it finds and stores the link together with the item's cover image.

pub mod config;
pub mod crawler;
pub mod output;
pub mod state;
pub mod storage;
pub mod url;

use thiserror::Error;

/// Main error type for Magnet-Trawl operations
///
/// Only run-level failures end up here. Network and parse problems of a single
/// item are reported as [`state::ItemOutcome`] values instead.
#[derive(Debug, Error)]
pub enum TrawlError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Failed to fetch page {page} ({url}): {source}")]
    Probe {
        page: u32,
        url: String,
        source: crawler::FetchError,
    },

    #[error("Persistence error: {0}")]
    Persistence(#[from] storage::StorageError),

    #[error("URL error: {0}")]
    Url(#[from] UrlError),

    #[error("URL parse error: {0}")]
    UrlParse(#[from] ::url::ParseError),

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),
}

/// URL-specific errors
#[derive(Debug, Error)]
pub enum UrlError {
    #[error("Failed to parse URL: {0}")]
    Parse(String),

    #[error("Invalid URL scheme: {0}")]
    InvalidScheme(String),

    #[error("No item identifier in URL: {0}")]
    MissingIdentifier(String),
}

/// Result type alias for URL operations
pub type UrlResult<T> = std::result::Result<T, UrlError>;

// Re-export commonly used types
pub use config::Config;
pub use crawler::{crawl, Coordinator};
pub use output::CrawlSummary;
pub use state::{CrawlState, ItemOutcome, Quota};
