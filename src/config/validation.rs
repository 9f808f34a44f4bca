use crate::config::types::{Config, CrawlerConfig, OutputConfig, SiteConfig};
use crate::ConfigError;
use url::Url;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_crawler_config(&config.crawler)?;
    validate_site_config(&config.site)?;
    validate_output_config(&config.output)?;
    Ok(())
}

fn validate_crawler_config(config: &CrawlerConfig) -> Result<(), ConfigError> {
    if config.parallel < 1 || config.parallel > 100 {
        return Err(ConfigError::Validation(format!(
            "parallel must be between 1 and 100, got {}",
            config.parallel
        )));
    }

    if config.timeout_ms < 1 {
        return Err(ConfigError::Validation(
            "timeout-ms must be >= 1".to_string(),
        ));
    }

    if config.page_attempts < 1 {
        return Err(ConfigError::Validation(format!(
            "page-attempts must be >= 1, got {}",
            config.page_attempts
        )));
    }

    Ok(())
}

fn validate_site_config(config: &SiteConfig) -> Result<(), ConfigError> {
    validate_http_url("base-url", &config.base_url)?;

    if let Some(alternate) = &config.alternate_base {
        validate_http_url("alternate-base", alternate)?;
    }

    if let Some(referer) = &config.referer {
        validate_http_url("referer", referer)?;
    }

    if let Some(search) = &config.search {
        if search.trim().is_empty() {
            return Err(ConfigError::Validation(
                "search keyword cannot be empty".to_string(),
            ));
        }
    }

    if !config.resolver_path.starts_with('/') {
        return Err(ConfigError::Validation(format!(
            "resolver-path must start with '/', got '{}'",
            config.resolver_path
        )));
    }

    if config.lang.trim().is_empty() {
        return Err(ConfigError::Validation("lang cannot be empty".to_string()));
    }

    Ok(())
}

fn validate_output_config(config: &OutputConfig) -> Result<(), ConfigError> {
    if config.resolved_directory().as_os_str().is_empty() {
        return Err(ConfigError::Validation(
            "output directory cannot be empty".to_string(),
        ));
    }
    Ok(())
}

/// Checks that a configured URL parses and uses http or https
fn validate_http_url(field: &str, value: &str) -> Result<(), ConfigError> {
    let url = Url::parse(value)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid {} '{}': {}", field, value, e)))?;

    match url.scheme() {
        "http" | "https" => Ok(()),
        other => Err(ConfigError::InvalidUrl(format!(
            "{} must use http or https, got '{}'",
            field, other
        ))),
    }
}
