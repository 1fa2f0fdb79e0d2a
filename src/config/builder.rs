//! Type-safe builder for `IngestConfig` using the typestate pattern.
//!
//! Mirrors the teacher's `CrawlConfigBuilder`: a single required field
//! (`database_url`) gates `.build()`, everything else has a sensible default
//! and can be overridden at any builder state.

use std::marker::PhantomData;
use std::path::PathBuf;

use super::types::IngestConfig;

/// Marker: `database_url` has been set.
pub struct Complete;

pub struct IngestConfigBuilder<State = ()> {
    database_url: Option<String>,
    rate_limit_ms: u64,
    worker_count: usize,
    embedding_dim: usize,
    bibliographic_api_key: Option<String>,
    browser_enabled: bool,
    http_timeout_secs: u64,
    browser_nav_timeout_secs: u64,
    chrome_data_dir: Option<PathBuf>,
    _phantom: PhantomData<State>,
}

impl Default for IngestConfigBuilder<()> {
    fn default() -> Self {
        let defaults = IngestConfig::default();
        Self {
            database_url: None,
            rate_limit_ms: defaults.rate_limit_ms,
            worker_count: defaults.worker_count,
            embedding_dim: defaults.embedding_dim,
            bibliographic_api_key: defaults.bibliographic_api_key,
            browser_enabled: defaults.browser_enabled,
            http_timeout_secs: defaults.http_timeout_secs,
            browser_nav_timeout_secs: defaults.browser_nav_timeout_secs,
            chrome_data_dir: defaults.chrome_data_dir,
            _phantom: PhantomData,
        }
    }
}

impl IngestConfig {
    #[must_use]
    pub fn builder() -> IngestConfigBuilder<()> {
        IngestConfigBuilder::default()
    }
}

impl IngestConfigBuilder<()> {
    #[must_use]
    pub fn database_url(self, url: impl Into<String>) -> IngestConfigBuilder<Complete> {
        IngestConfigBuilder {
            database_url: Some(url.into()),
            rate_limit_ms: self.rate_limit_ms,
            worker_count: self.worker_count,
            embedding_dim: self.embedding_dim,
            bibliographic_api_key: self.bibliographic_api_key,
            browser_enabled: self.browser_enabled,
            http_timeout_secs: self.http_timeout_secs,
            browser_nav_timeout_secs: self.browser_nav_timeout_secs,
            chrome_data_dir: self.chrome_data_dir,
            _phantom: PhantomData,
        }
    }
}

impl IngestConfigBuilder<Complete> {
    #[must_use]
    pub fn build(self) -> IngestConfig {
        IngestConfig {
            database_url: self
                .database_url
                .expect("Complete state guarantees database_url is set"),
            rate_limit_ms: self.rate_limit_ms,
            worker_count: self.worker_count,
            embedding_dim: self.embedding_dim,
            bibliographic_api_key: self.bibliographic_api_key,
            browser_enabled: self.browser_enabled,
            http_timeout_secs: self.http_timeout_secs,
            browser_nav_timeout_secs: self.browser_nav_timeout_secs,
            chrome_data_dir: self.chrome_data_dir,
        }
    }
}

// Methods available at any builder state.
impl<State> IngestConfigBuilder<State> {
    #[must_use]
    pub fn rate_limit_ms(mut self, ms: u64) -> Self {
        self.rate_limit_ms = ms;
        self
    }

    #[must_use]
    pub fn worker_count(mut self, n: usize) -> Self {
        self.worker_count = n;
        self
    }

    #[must_use]
    pub fn embedding_dim(mut self, dim: usize) -> Self {
        self.embedding_dim = dim;
        self
    }

    #[must_use]
    pub fn bibliographic_api_key(mut self, key: impl Into<String>) -> Self {
        self.bibliographic_api_key = Some(key.into());
        self
    }

    #[must_use]
    pub fn browser_enabled(mut self, enabled: bool) -> Self {
        self.browser_enabled = enabled;
        self
    }

    #[must_use]
    pub fn http_timeout_secs(mut self, secs: u64) -> Self {
        self.http_timeout_secs = secs;
        self
    }

    #[must_use]
    pub fn browser_nav_timeout_secs(mut self, secs: u64) -> Self {
        self.browser_nav_timeout_secs = secs;
        self
    }

    #[must_use]
    pub fn chrome_data_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.chrome_data_dir = Some(dir.into());
        self
    }
}
