//! Catalog page existence probing
//!
//! Pagination has no known upper bound, so a 404 is the only end signal.
//! Every other failure is retried up to the attempt ceiling.

use crate::crawler::fetcher::{fetch_text, FetchError, FetchOptions};
use reqwest::Client;
use url::Url;

/// Result of probing one catalog page
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProbeOutcome {
    /// The page exists; carries its markup
    Exists(String),
    /// The server answered 404
    NotFound,
    /// Every attempt failed; carries the last error
    Failed(FetchError),
}

/// Fetches catalog pages with bounded retry
pub struct PageProber {
    client: Client,
    options: FetchOptions,
    max_attempts: u32,
}

impl PageProber {
    pub fn new(client: Client, options: FetchOptions, max_attempts: u32) -> Self {
        Self {
            client,
            options,
            max_attempts: max_attempts.max(1),
        }
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Determines whether a page exists and returns its content
    ///
    /// | Condition        | Action                     |
    /// |------------------|----------------------------|
    /// | 2xx              | `Exists(body)`             |
    /// | 404              | `NotFound`, no more tries  |
    /// | anything else    | retry until the ceiling    |
    pub async fn probe(&self, url: &Url) -> ProbeOutcome {
        let mut last_error = None;

        for attempt in 1..=self.max_attempts {
            match fetch_text(&self.client, url.as_str(), &self.options).await {
                Ok(body) => return ProbeOutcome::Exists(body),
                Err(e) if e.is_not_found() => {
                    tracing::info!("{} returned 404, no more pages", url);
                    return ProbeOutcome::NotFound;
                }
                Err(e) => {
                    tracing::warn!(
                        "Failed to fetch {} (attempt {}/{}): {}",
                        url,
                        attempt,
                        self.max_attempts,
                        e
                    );
                    last_error = Some(e);
                }
            }
        }

        ProbeOutcome::Failed(
            last_error.unwrap_or_else(|| FetchError::network("No fetch attempt was made")),
        )
    }
}
