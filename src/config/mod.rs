//! Configuration module for Magnet-Trawl
//!
//! Settings come from an optional TOML file, are overridden by command-line
//! flags and are validated once both sources are merged.
//!
//! # Example
//!
//! ```no_run
//! use magnet_trawl::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("trawl.toml")).unwrap();
//! println!("Crawling {}", config.site.base_url);
//! ```

mod overrides;
mod parser;
mod types;
mod validation;

// Re-export types
pub use overrides::ConfigOverrides;
pub use types::{Config, CrawlerConfig, OutputConfig, SiteConfig, DEFAULT_BASE_URL};

// Re-export parser functions
pub use parser::{compute_config_hash, load_config, parse_config_file};
pub use validation::validate;
