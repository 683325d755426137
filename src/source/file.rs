use std::path::PathBuf;

use async_trait::async_trait;

use crate::error::Result;
use crate::jobs::JobTable;
use crate::source::Fetcher;

/// Reads the job table from a JSON file holding an array of row objects.
#[derive(Debug, Clone)]
pub struct FileFetcher {
    path: PathBuf,
}

impl FileFetcher {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl Fetcher for FileFetcher {
    async fn fetch(&self) -> Result<JobTable> {
        let bytes = tokio::fs::read(&self.path).await?;
        JobTable::from_json_slice(&bytes)
    }

    fn origin(&self) -> String {
        self.path.display().to_string()
    }
}
