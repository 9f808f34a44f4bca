//! HTTP fetcher implementation
//!
//! This module handles all HTTP requests for the crawler, including:
//! - Building the shared HTTP client
//! - Per-request timeout, cookie and referer handling
//! - Redirect following with a hop limit
//! - Error classification

use reqwest::{header, redirect::Policy, Client, Response};
use std::time::{Duration, Instant};
use thiserror::Error;
use url::Url;

/// A failed request
///
/// `status` is set when the server answered with a non-success status and is
/// `None` for network-level failures (DNS, connect, timeout, body read).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct FetchError {
    pub status: Option<u16>,
    pub message: String,
}

impl FetchError {
    pub fn http(status: reqwest::StatusCode) -> Self {
        Self {
            status: Some(status.as_u16()),
            message: format!("HTTP {}", status),
        }
    }

    pub fn network(message: impl Into<String>) -> Self {
        Self {
            status: None,
            message: message.into(),
        }
    }

    /// True for a 404 answer, the end-of-pagination signal
    pub fn is_not_found(&self) -> bool {
        self.status == Some(404)
    }
}

/// Per-request settings
#[derive(Debug, Clone)]
pub struct FetchOptions {
    /// Deadline for the whole request including the body
    pub timeout: Duration,
    /// Redirect hops followed before giving up
    pub max_redirects: usize,
    /// Value of the `Cookie` header
    pub cookie: Option<String>,
    /// Value of the `Referer` header
    pub referer: Option<String>,
}

impl FetchOptions {
    pub fn new(timeout: Duration, max_redirects: usize) -> Self {
        Self {
            timeout,
            max_redirects,
            cookie: None,
            referer: None,
        }
    }

    pub fn with_cookie(mut self, cookie: impl Into<String>) -> Self {
        self.cookie = Some(cookie.into());
        self
    }

    pub fn with_referer(mut self, referer: impl Into<String>) -> Self {
        self.referer = Some(referer.into());
        self
    }
}

/// Builds an HTTP client with proper configuration
///
/// Redirects are disabled on the client; [`fetch_url`] follows them itself so
/// the hop limit can differ per request.
///
/// # Example
///
/// ```no_run
/// use magnet_trawl::crawler::build_http_client;
///
/// let client = build_http_client("MagnetTrawl/0.4").unwrap();
/// ```
pub fn build_http_client(user_agent: &str) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(user_agent)
        .connect_timeout(Duration::from_secs(10))
        .redirect(Policy::none())
        .gzip(true)
        .brotli(true)
        .build()
}

/// Performs a single GET request
///
/// # Request Flow
///
/// 1. Send GET with the options' headers and whatever is left of the timeout
/// 2. On 3xx with a `Location` header, follow it (at most `max_redirects` hops)
/// 3. Any terminal status outside 2xx/3xx becomes a [`FetchError`] with status
///
/// The timeout is one deadline for the whole redirect chain. Cookie and
/// Referer are dropped for good once a redirect leaves the starting origin.
///
/// # Returns
///
/// The response, ready for its body to be read or streamed
pub async fn fetch_url(
    client: &Client,
    url: &str,
    options: &FetchOptions,
) -> Result<Response, FetchError> {
    let mut current =
        Url::parse(url).map_err(|e| FetchError::network(format!("Invalid URL {}: {}", url, e)))?;
    let origin = current.origin();
    let mut same_origin = true;
    let deadline = Instant::now() + options.timeout;
    let mut hops = 0;

    loop {
        let remaining = deadline.saturating_duration_since(Instant::now());
        if remaining.is_zero() {
            return Err(FetchError::network("Request timeout"));
        }

        let mut request = client.get(current.clone()).timeout(remaining);
        if same_origin {
            if let Some(cookie) = &options.cookie {
                request = request.header(header::COOKIE, cookie);
            }
            if let Some(referer) = &options.referer {
                request = request.header(header::REFERER, referer);
            }
        }

        let response = request.send().await.map_err(|e| classify_error(&e))?;
        let status = response.status();

        if status.is_redirection() {
            let location = response
                .headers()
                .get(header::LOCATION)
                .and_then(|v| v.to_str().ok())
                .map(str::to_string);

            let Some(location) = location else {
                return Ok(response);
            };

            if hops >= options.max_redirects {
                return Err(FetchError::network(format!(
                    "Too many redirects from {}",
                    url
                )));
            }

            current = current.join(&location).map_err(|e| {
                FetchError::network(format!("Invalid redirect target {}: {}", location, e))
            })?;
            same_origin &= current.origin() == origin;
            hops += 1;
            tracing::trace!("Following redirect {} -> {}", url, current);
            continue;
        }

        if !status.is_success() {
            return Err(FetchError::http(status));
        }

        return Ok(response);
    }
}

/// Fetches a URL and reads the body as text
pub async fn fetch_text(
    client: &Client,
    url: &str,
    options: &FetchOptions,
) -> Result<String, FetchError> {
    let response = fetch_url(client, url, options).await?;
    response.text().await.map_err(|e| classify_error(&e))
}

/// Maps a reqwest error onto a [`FetchError`]
pub fn classify_error(error: &reqwest::Error) -> FetchError {
    let status = error.status().map(|s| s.as_u16());
    let message = if error.is_timeout() {
        "Request timeout".to_string()
    } else if error.is_connect() {
        format!("Connection failed: {}", error)
    } else {
        error.to_string()
    };

    FetchError { status, message }
}
