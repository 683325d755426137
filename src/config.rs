use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use crate::error::{DashError, Result};
use crate::source::{CachedSource, FileFetcher, HttpFetcher, JobSource};

const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(30);

/// Where job records come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceConfig {
    /// JSON file holding an array of job rows.
    File { path: PathBuf },
    /// HTTP endpoint returning an array of job rows.
    Http { url: String, timeout: Duration },
}

impl SourceConfig {
    pub fn file(path: impl Into<PathBuf>) -> Self {
        SourceConfig::File { path: path.into() }
    }

    pub fn http(url: impl Into<String>) -> Self {
        SourceConfig::Http {
            url: url.into(),
            timeout: DEFAULT_HTTP_TIMEOUT,
        }
    }

    /// Build a cached source for this configuration.
    pub fn build(&self, max_age: Option<Duration>) -> Result<Arc<dyn JobSource>> {
        let source: Arc<dyn JobSource> = match self {
            SourceConfig::File { path } => {
                Arc::new(CachedSource::new(FileFetcher::new(path.clone())).with_max_age(max_age))
            }
            SourceConfig::Http { url, timeout } => {
                if !(url.starts_with("http://") || url.starts_with("https://")) {
                    return Err(DashError::Config(format!(
                        "job source URL must be http(s): {}",
                        url
                    )));
                }
                Arc::new(
                    CachedSource::new(HttpFetcher::new(url.clone(), *timeout)?)
                        .with_max_age(max_age),
                )
            }
        };
        Ok(source)
    }
}

#[derive(Debug, Clone)]
pub struct DashboardConfig {
    pub listen_addr: SocketAddr,
    pub source: SourceConfig,
    /// Re-fetch cached job data older than this on load. `None` keeps it
    /// until an explicit refresh.
    pub cache_max_age: Option<Duration>,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            listen_addr: SocketAddr::from(([127, 0, 0, 1], 8050)),
            source: SourceConfig::file("jobs.json"),
            cache_max_age: None,
        }
    }
}

impl DashboardConfig {
    pub fn new(listen_addr: SocketAddr, source: SourceConfig) -> Self {
        Self {
            listen_addr,
            source,
            ..Default::default()
        }
    }

    pub fn with_cache_max_age(mut self, max_age: Duration) -> Self {
        self.cache_max_age = Some(max_age);
        self
    }

    pub fn build_source(&self) -> Result<Arc<dyn JobSource>> {
        self.source.build(self.cache_max_age)
    }
}
