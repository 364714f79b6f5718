use crate::utils::retry::retry_with_backoff;
use async_trait::async_trait;
use bytes::Bytes;
use common::config::FetchConfig;
use common::Result;
use std::time::Duration;
use tracing::debug;

/// Capability to download the bytes behind a URL.
#[async_trait]
pub trait Fetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<Bytes>;
}

/// Plain HTTP GET with bounded retries.
pub struct HttpFetcher {
    client: reqwest::Client,
    attempts: u32,
    delay_ms: u64,
}

impl HttpFetcher {
    pub fn new(config: &FetchConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            attempts: config.retries.max(1),
            delay_ms: config.delay_ms,
        })
    }

    async fn fetch_once(&self, url: &str) -> Result<Bytes> {
        let response = self.client.get(url).send().await?.error_for_status()?;
        Ok(response.bytes().await?)
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<Bytes> {
        debug!(url, attempts = self.attempts, "Fetching");
        // `attempts` counts the first try.
        retry_with_backoff(self.attempts - 1, self.delay_ms, || self.fetch_once(url)).await
    }
}
