use serde::Deserialize;
use std::path::PathBuf;

/// Default catalog site
pub const DEFAULT_BASE_URL: &str = "http://www.javbus.in";

/// Main configuration structure for Magnet-Trawl
///
/// Every section is optional in the TOML file; missing keys fall back to the
/// defaults documented on each field.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub crawler: CrawlerConfig,
    #[serde(default)]
    pub site: SiteConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

/// Crawler behavior configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct CrawlerConfig {
    /// Maximum number of item pipelines in flight (default: 2)
    #[serde(default = "default_parallel")]
    pub parallel: u32,

    /// Per-request timeout in milliseconds (default: 30000)
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    /// Maximum number of items to dispatch, 0 for no limit
    #[serde(default)]
    pub limit: u64,

    /// Attempts made per catalog page before giving up (default: 3)
    #[serde(default = "default_page_attempts")]
    pub page_attempts: u32,

    /// Redirect hops followed per request (default: 2)
    #[serde(default = "default_max_redirects")]
    pub max_redirects: usize,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            parallel: default_parallel(),
            timeout_ms: default_timeout_ms(),
            limit: 0,
            page_attempts: default_page_attempts(),
            max_redirects: default_max_redirects(),
        }
    }
}

/// Target site configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct SiteConfig {
    /// Root of the catalog, also used for the resolver endpoint
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Search keyword; switches pagination to `{base}/search/{term}`
    #[serde(default)]
    pub search: Option<String>,

    /// Alternate listing root; pages become `{alternate}/{n}`
    #[serde(default)]
    pub alternate_base: Option<String>,

    /// Ask the site for items without magnets too (`existmag=all`)
    #[serde(default)]
    pub all_magnets: bool,

    /// Path of the ajax endpoint that resolves magnet links
    #[serde(default = "default_resolver_path")]
    pub resolver_path: String,

    /// Referer sent to the resolver endpoint, `base_url` when unset
    #[serde(default)]
    pub referer: Option<String>,

    /// Language tag passed to the resolver
    #[serde(default = "default_lang")]
    pub lang: String,

    /// User-Agent header sent with every request
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            search: None,
            alternate_base: None,
            all_magnets: false,
            resolver_path: default_resolver_path(),
            referer: None,
            lang: default_lang(),
            user_agent: default_user_agent(),
        }
    }
}

impl SiteConfig {
    /// Referer header value for resolver requests
    pub fn effective_referer(&self) -> &str {
        self.referer.as_deref().unwrap_or(&self.base_url)
    }

    /// Cookie selecting which items the listing pages include
    pub fn magnet_cookie(&self) -> &'static str {
        if self.all_magnets {
            "existmag=all"
        } else {
            "existmag=mag"
        }
    }
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct OutputConfig {
    /// Root directory holding one sub-directory per item
    #[serde(default = "default_output_directory")]
    pub directory: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            directory: default_output_directory(),
        }
    }
}

impl OutputConfig {
    /// Resolves the configured directory, stripping quotes and expanding `~`
    pub fn resolved_directory(&self) -> PathBuf {
        let cleaned: String = self
            .directory
            .chars()
            .filter(|c| *c != '"' && *c != '\'')
            .collect();

        if let Some(rest) = cleaned.strip_prefix("~/") {
            if let Some(home) = dirs::home_dir() {
                return home.join(rest);
            }
        } else if cleaned == "~" {
            if let Some(home) = dirs::home_dir() {
                return home;
            }
        }

        PathBuf::from(cleaned)
    }
}

fn default_parallel() -> u32 {
    2
}

fn default_timeout_ms() -> u64 {
    30_000
}

fn default_page_attempts() -> u32 {
    3
}

fn default_max_redirects() -> usize {
    2
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_resolver_path() -> String {
    "/ajax/resolve".to_string()
}

fn default_lang() -> String {
    "zh".to_string()
}

fn default_user_agent() -> String {
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36".to_string()
}

fn default_output_directory() -> String {
    "~/magnets".to_string()
}
