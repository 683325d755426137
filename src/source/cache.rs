use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::{Mutex, RwLock};

use crate::error::Result;
use crate::source::{Fetcher, JobSource, Snapshot};

/// Keeps the last fetched snapshot and serves it until refreshed.
///
/// With a `max_age`, `load()` also re-fetches once the cached snapshot is
/// older than that. Refreshes are serialized, so the cached snapshot is always
/// the result of the most recently started fetch.
pub struct CachedSource<F> {
    fetcher: F,
    max_age: Option<Duration>,
    cached: RwLock<Option<Arc<Snapshot>>>,
    refresh_lock: Mutex<()>,
}

impl<F: Fetcher> CachedSource<F> {
    pub fn new(fetcher: F) -> Self {
        Self {
            fetcher,
            max_age: None,
            cached: RwLock::new(None),
            refresh_lock: Mutex::new(()),
        }
    }

    pub fn with_max_age(mut self, max_age: Option<Duration>) -> Self {
        self.max_age = max_age;
        self
    }

    pub fn fetcher(&self) -> &F {
        &self.fetcher
    }

    fn is_fresh(&self, snapshot: &Snapshot) -> bool {
        let Some(max_age) = self.max_age else {
            return true;
        };
        // A snapshot stamped in the future (clock skew) counts as fresh.
        match (Utc::now() - snapshot.fetched_at).to_std() {
            Ok(age) => age <= max_age,
            Err(_) => true,
        }
    }
}

#[async_trait]
impl<F: Fetcher> JobSource for CachedSource<F> {
    async fn load(&self) -> Result<Arc<Snapshot>> {
        if let Some(snapshot) = self.cached.read().await.as_ref() {
            if self.is_fresh(snapshot) {
                return Ok(snapshot.clone());
            }
            tracing::debug!(origin = %self.fetcher.origin(), "Cached job snapshot is stale");
        }
        self.refresh().await
    }

    async fn refresh(&self) -> Result<Arc<Snapshot>> {
        // Held across fetch and store so snapshots land in the order fetches start.
        let _guard = self.refresh_lock.lock().await;
        let origin = self.fetcher.origin();
        tracing::info!(origin = %origin, "Fetching job data");

        let table = match self.fetcher.fetch().await {
            Ok(table) => table,
            Err(e) => {
                tracing::error!(origin = %origin, error = %e, "Failed to fetch job data");
                return Err(e);
            }
        };

        let snapshot = Arc::new(Snapshot::new(table));
        tracing::info!(origin = %origin, rows = snapshot.table.len(), "Job data refreshed");
        *self.cached.write().await = Some(snapshot.clone());
        Ok(snapshot)
    }
}
