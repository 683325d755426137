//! Job data sources.
//!
//! A [`JobSource`] hands out immutable [`Snapshot`]s of the job table. The
//! dashboard never mutates a snapshot; a refresh replaces it wholesale.

pub mod cache;
pub mod file;
pub mod http;

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::Result;
use crate::jobs::JobTable;

pub use cache::CachedSource;
pub use file::FileFetcher;
pub use http::HttpFetcher;

/// Point-in-time copy of the job table.
#[derive(Debug, Clone)]
pub struct Snapshot {
    pub table: JobTable,
    pub fetched_at: DateTime<Utc>,
}

impl Snapshot {
    pub fn new(table: JobTable) -> Self {
        Self {
            table,
            fetched_at: Utc::now(),
        }
    }
}

#[async_trait]
pub trait JobSource: Send + Sync {
    /// Current snapshot, fetching one if none is cached yet.
    async fn load(&self) -> Result<Arc<Snapshot>>;

    /// Fetch from the authoritative source and replace the cached snapshot.
    async fn refresh(&self) -> Result<Arc<Snapshot>>;

    /// Snapshot to use for one dashboard update.
    async fn snapshot(&self, refresh: bool) -> Result<Arc<Snapshot>> {
        if refresh {
            self.refresh().await
        } else {
            self.load().await
        }
    }
}

/// Uncached access to the authoritative job table.
#[async_trait]
pub trait Fetcher: Send + Sync {
    async fn fetch(&self) -> Result<JobTable>;

    /// Human readable origin, used in logs.
    fn origin(&self) -> String;
}
