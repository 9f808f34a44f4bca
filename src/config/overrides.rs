use crate::config::types::Config;

/// Values supplied on the command line that take precedence over the file
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub parallel: Option<u32>,
    pub timeout_ms: Option<u64>,
    pub limit: Option<u64>,
    pub output: Option<String>,
    pub search: Option<String>,
    pub alternate_base: Option<String>,
    pub all_magnets: bool,
}

impl Config {
    /// Applies command-line overrides on top of file or default values
    pub fn apply_overrides(&mut self, overrides: ConfigOverrides) {
        if let Some(parallel) = overrides.parallel {
            self.crawler.parallel = parallel;
        }
        if let Some(timeout_ms) = overrides.timeout_ms {
            self.crawler.timeout_ms = timeout_ms;
        }
        if let Some(limit) = overrides.limit {
            self.crawler.limit = limit;
        }
        if let Some(output) = overrides.output {
            self.output.directory = output;
        }
        if overrides.search.is_some() {
            self.site.search = overrides.search;
        }
        if overrides.alternate_base.is_some() {
            self.site.alternate_base = overrides.alternate_base;
        }
        if overrides.all_magnets {
            self.site.all_magnets = true;
        }
    }
}
