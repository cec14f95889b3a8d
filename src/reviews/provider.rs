//! Reviews provider trait and its implementations

use async_trait::async_trait;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

use super::decoder::{self, Page};
use super::errors::{TransportError, TransportResult};
use crate::config::Config;

/// Source of raw review pages.
///
/// Implementations own URLs, headers and any transport-level retry policy;
/// callers only supply the offset of the first review they want.
#[async_trait]
pub trait ReviewsProvider: Send + Sync {
    /// Fetch the raw payload of the page starting at `offset`
    async fn fetch(&self, offset: usize) -> TransportResult<Vec<u8>>;

    /// Short name used in logs
    fn name(&self) -> &str;
}

/// Provider that GETs pages from an HTTP endpoint
#[derive(Debug, Clone)]
pub struct HttpReviewsProvider {
    client: reqwest::Client,
    base_url: String,
    limit: usize,
}

impl HttpReviewsProvider {
    pub fn new(base_url: impl Into<String>, limit: usize, timeout: Duration) -> TransportResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("reviews-feed/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.into(),
            limit,
        })
    }
}

#[async_trait]
impl ReviewsProvider for HttpReviewsProvider {
    async fn fetch(&self, offset: usize) -> TransportResult<Vec<u8>> {
        debug!("GET {} offset={} limit={}", self.base_url, offset, self.limit);

        let response = self
            .client
            .get(&self.base_url)
            .query(&[("offset", offset), ("limit", self.limit)])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(TransportError::StatusError {
                status: status.as_u16(),
                url: response.url().to_string(),
            });
        }

        Ok(response.bytes().await?.to_vec())
    }

    fn name(&self) -> &str {
        "http"
    }
}

/// Provider that serves slices of a complete reviews document kept in memory.
#[derive(Debug, Clone)]
pub struct FixtureReviewsProvider {
    page: Page,
    limit: usize,
}

impl FixtureReviewsProvider {
    pub fn new(page: Page, limit: usize) -> Self {
        Self { page, limit }
    }

    /// Load a `{items, count}` document from disk
    pub async fn from_file(path: impl AsRef<Path>, limit: usize) -> TransportResult<Self> {
        let path = path.as_ref();
        debug!("Loading reviews fixture from: {}", path.display());

        let raw = tokio::fs::read(path).await?;
        let page = decoder::decode(&raw).map_err(|e| {
            TransportError::ProviderError(format!("invalid fixture {}: {}", path.display(), e))
        })?;

        Ok(Self::new(page, limit))
    }

    pub fn total_count(&self) -> usize {
        self.page.total_count
    }
}

#[async_trait]
impl ReviewsProvider for FixtureReviewsProvider {
    async fn fetch(&self, offset: usize) -> TransportResult<Vec<u8>> {
        let start = offset.min(self.page.records.len());
        let end = offset.saturating_add(self.limit).min(self.page.records.len());

        let slice = Page {
            records: self.page.records[start..end].to_vec(),
            total_count: self.page.total_count,
        };

        slice
            .to_bytes()
            .map_err(|e| TransportError::ProviderError(e.to_string()))
    }

    fn name(&self) -> &str {
        "fixture"
    }
}

/// Factory for building the provider named by the configuration
pub struct ProviderFactory;

impl ProviderFactory {
    /// A fixture path wins over a base URL when both are set
    pub async fn create_provider(config: &Config) -> TransportResult<Arc<dyn ReviewsProvider>> {
        if let Some(path) = &config.fixture_path {
            let provider = FixtureReviewsProvider::from_file(path, config.page_size).await?;
            return Ok(Arc::new(provider));
        }

        if let Some(base_url) = &config.base_url {
            let provider =
                HttpReviewsProvider::new(base_url.clone(), config.page_size, config.fetch_timeout())?;
            return Ok(Arc::new(provider));
        }

        Err(TransportError::ProviderError(
            "no reviews source configured; set a fixture path or a base URL".to_string(),
        ))
    }
}
