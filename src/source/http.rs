use std::time::Duration;

use async_trait::async_trait;

use crate::error::{DashError, Result};
use crate::jobs::JobTable;
use crate::source::Fetcher;

/// Fetches the job table from an HTTP endpoint returning a JSON array of rows.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: reqwest::Client,
    url: String,
}

impl HttpFetcher {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self::with_client(client, url))
    }

    /// Reuse an existing client (shared connection pool).
    pub fn with_client(client: reqwest::Client, url: impl Into<String>) -> Self {
        Self {
            client,
            url: url.into(),
        }
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self) -> Result<JobTable> {
        let response = self.client.get(&self.url).send().await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(DashError::Upstream {
                status: status.as_u16(),
                body,
            });
        }

        let bytes = response.bytes().await?;
        JobTable::from_json_slice(&bytes)
    }

    fn origin(&self) -> String {
        self.url.clone()
    }
}
