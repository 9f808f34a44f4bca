use crate::config::SiteConfig;
use crate::{UrlError, UrlResult};
use url::Url;

/// How catalog pages are addressed
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageMode {
    /// `{base}` then `{base}/page/{n}`
    Listing { base: String },
    /// `{base}/search/{term}` then `{base}/search/{term}/{n}`
    Search { base: String, term: String },
    /// `{alternate}` then `{alternate}/{n}`
    Alternate { base: String },
}

/// Identifies one catalog page to probe
///
/// Stateless: a new request is derived for every page index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageRequest {
    pub mode: PageMode,
    pub page_index: u32,
}

impl PageRequest {
    /// Derives the request for `page_index` from the site configuration
    ///
    /// A search keyword takes precedence over an alternate base.
    pub fn from_site(site: &SiteConfig, page_index: u32) -> Self {
        let mode = if let Some(term) = &site.search {
            PageMode::Search {
                base: site.base_url.clone(),
                term: term.clone(),
            }
        } else if let Some(alternate) = &site.alternate_base {
            PageMode::Alternate {
                base: alternate.clone(),
            }
        } else {
            PageMode::Listing {
                base: site.base_url.clone(),
            }
        };

        Self { mode, page_index }
    }

    pub fn is_search(&self) -> bool {
        matches!(self.mode, PageMode::Search { .. })
    }

    /// Computes the absolute URL of this page
    ///
    /// # Examples
    ///
    /// ```
    /// use magnet_trawl::url::{PageMode, PageRequest};
    ///
    /// let request = PageRequest {
    ///     mode: PageMode::Listing { base: "http://example.com".to_string() },
    ///     page_index: 3,
    /// };
    /// assert_eq!(request.url().unwrap().as_str(), "http://example.com/page/3");
    /// ```
    pub fn url(&self) -> UrlResult<Url> {
        let first = self.page_index <= 1;
        let raw = match &self.mode {
            PageMode::Listing { base } => {
                let base = base.trim_end_matches('/');
                if first {
                    format!("{}/", base)
                } else {
                    format!("{}/page/{}", base, self.page_index)
                }
            }
            PageMode::Search { base, term } => {
                let base = base.trim_end_matches('/');
                let term = urlencoding::encode(term.trim());
                if first {
                    format!("{}/search/{}", base, term)
                } else {
                    format!("{}/search/{}/{}", base, term, self.page_index)
                }
            }
            PageMode::Alternate { base } => {
                if first {
                    base.clone()
                } else {
                    format!("{}/{}", base.trim_end_matches('/'), self.page_index)
                }
            }
        };

        let url = Url::parse(&raw).map_err(|e| UrlError::Parse(format!("{}: {}", raw, e)))?;
        match url.scheme() {
            "http" | "https" => Ok(url),
            other => Err(UrlError::InvalidScheme(other.to_string())),
        }
    }
}
