use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, warn};

use crate::reviews::DEFAULT_PREFETCH_SCREENS;

/// Application configuration
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Reviews requested per page
    pub page_size: usize,

    /// Viewport heights from the end of the list at which the next page is prefetched
    pub prefetch_screens: f64,

    /// Timeout for a single page fetch, in seconds
    pub fetch_timeout_secs: u64,

    /// Lines of review text shown before "Show more..."
    pub collapsed_lines: usize,

    /// Endpoint serving `{items, count}` pages for `offset`/`limit` queries
    pub base_url: Option<String>,

    /// Local JSON document with every review, served page by page
    pub fixture_path: Option<PathBuf>,

    /// Where the interactive viewer writes its log
    pub log_file: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            page_size: 20,
            prefetch_screens: DEFAULT_PREFETCH_SCREENS,
            fetch_timeout_secs: 10,
            collapsed_lines: 3,
            base_url: None,
            fixture_path: None,
            log_file: None,
        }
    }
}

impl Config {
    /// Initialize configuration from the config file and the environment
    pub async fn init() -> Result<Self> {
        debug!("Initializing configuration");

        let mut config = Self::default();

        match Self::load_from_file().await {
            Ok(Some(file_config)) => config.merge_with(file_config),
            Ok(None) => debug!("No configuration file found, using defaults"),
            Err(e) => {
                // Logging is not installed yet when the binary loads its config
                warn!("Ignoring configuration file: {:#}", e);
                eprintln!("Warning: ignoring configuration file: {:#}", e);
            }
        }

        config.load_from_env();

        Ok(config)
    }

    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_secs)
    }

    /// Load configuration from environment variables
    pub fn load_from_env(&mut self) {
        self.apply_vars(|key| std::env::var(key).ok());
    }

    /// Apply `REVIEWS_*` overrides looked up through `lookup`.
    ///
    /// Values that fail to parse are ignored.
    pub fn apply_vars<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(page_size) = lookup("REVIEWS_PAGE_SIZE").and_then(|v| v.parse().ok()) {
            self.page_size = page_size;
        }

        if let Some(screens) = lookup("REVIEWS_PREFETCH_SCREENS").and_then(|v| v.parse().ok()) {
            self.prefetch_screens = screens;
        }

        if let Some(timeout) = lookup("REVIEWS_FETCH_TIMEOUT").and_then(|v| v.parse().ok()) {
            self.fetch_timeout_secs = timeout;
        }

        if let Some(lines) = lookup("REVIEWS_COLLAPSED_LINES").and_then(|v| v.parse().ok()) {
            self.collapsed_lines = lines;
        }

        if let Some(base_url) = lookup("REVIEWS_BASE_URL") {
            self.base_url = Some(base_url);
        }

        if let Some(fixture) = lookup("REVIEWS_FIXTURE") {
            self.fixture_path = Some(PathBuf::from(fixture));
        }

        if let Some(log_file) = lookup("REVIEWS_LOG_FILE") {
            self.log_file = Some(PathBuf::from(log_file));
        }
    }

    /// Load configuration from the first reviews-feed config file found
    pub async fn load_from_file() -> Result<Option<Self>> {
        // 1. ./.reviews-feed.json
        // 2. ./reviews-feed.json
        // 3. $CONFIG_DIR/reviews-feed/config.json
        let mut config_paths = vec![
            PathBuf::from("./.reviews-feed.json"),
            PathBuf::from("./reviews-feed.json"),
        ];

        if let Some(config_dir) = dirs::config_dir() {
            config_paths.push(config_dir.join("reviews-feed").join("config.json"));
        }

        Self::load_first(&config_paths).await
    }

    /// Load the first of `paths` that exists; a file that fails to parse is an error
    pub async fn load_first(paths: &[PathBuf]) -> Result<Option<Self>> {
        for path in paths {
            if path.exists() {
                return Self::load_from_path(path).await.map(Some);
            }
        }
        Ok(None)
    }

    pub async fn load_from_path(path: &Path) -> Result<Self> {
        debug!("Loading configuration from: {}", path.display());
        let content = tokio::fs::read_to_string(path).await?;
        let config: Self = serde_json::from_str(&content)
            .with_context(|| format!("Invalid configuration in {}", path.display()))?;
        Ok(config)
    }

    /// Merge another configuration into this one; fields left at their defaults are skipped
    pub fn merge_with(&mut self, other: Self) {
        let defaults = Self::default();

        if other.page_size != defaults.page_size {
            self.page_size = other.page_size;
        }
        if other.prefetch_screens != defaults.prefetch_screens {
            self.prefetch_screens = other.prefetch_screens;
        }
        if other.fetch_timeout_secs != defaults.fetch_timeout_secs {
            self.fetch_timeout_secs = other.fetch_timeout_secs;
        }
        if other.collapsed_lines != defaults.collapsed_lines {
            self.collapsed_lines = other.collapsed_lines;
        }
        if other.base_url.is_some() {
            self.base_url = other.base_url;
        }
        if other.fixture_path.is_some() {
            self.fixture_path = other.fixture_path;
        }
        if other.log_file.is_some() {
            self.log_file = other.log_file;
        }
    }

    /// Check if a reviews source is configured
    pub fn has_source(&self) -> bool {
        self.fixture_path.is_some() || self.base_url.as_ref().is_some_and(|url| !url.is_empty())
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if !self.has_source() {
            return Err(anyhow::anyhow!(
                "No reviews source configured. Set REVIEWS_FIXTURE or REVIEWS_BASE_URL, or pass --fixture / --url."
            ));
        }

        if self.page_size == 0 {
            return Err(anyhow::anyhow!("page_size must be greater than 0"));
        }

        if !(self.prefetch_screens.is_finite() && self.prefetch_screens > 0.0) {
            return Err(anyhow::anyhow!("prefetch_screens must be a positive number"));
        }

        if self.fetch_timeout_secs == 0 {
            return Err(anyhow::anyhow!("fetch_timeout_secs must be greater than 0"));
        }

        Ok(())
    }
}
