//! Core configuration type for the ingestion pipeline.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Runtime configuration for the harvester, bibliographic client, and orchestrator.
///
/// Built via [`IngestConfig::builder`], which enforces at compile time that a
/// database URL is supplied before `.build()` is callable.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestConfig {
    pub(crate) database_url: String,

    /// Delay between successive HTTP requests to the same domain.
    /// Default: 500ms, matching the source scraper's `rate_limit_seconds`.
    pub(crate) rate_limit_ms: u64,

    /// Number of professors processed concurrently by the orchestrator's worker pool.
    /// Default: 5.
    pub(crate) worker_count: usize,

    /// Dimensionality of embedding vectors produced by the configured `EmbeddingModel`.
    pub(crate) embedding_dim: usize,

    /// API key for the bibliographic client, sent as `x-api-key` when present.
    pub(crate) bibliographic_api_key: Option<String>,

    /// Whether the harvester may fall back to the headless browser renderer (C2).
    /// Disabling this is useful in environments without a Chrome/Chromium binary.
    pub(crate) browser_enabled: bool,

    /// HTTP fetch timeout in seconds. Default: 15.
    pub(crate) http_timeout_secs: u64,

    /// Browser navigation timeout in seconds. Default: 30.
    pub(crate) browser_nav_timeout_secs: u64,

    /// Chrome/Chromium user data directory override. `None` uses a process-ID-scoped
    /// temp directory, matching the teacher's profile-isolation fallback.
    #[serde(skip)]
    pub(crate) chrome_data_dir: Option<PathBuf>,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            database_url: "sqlite://ingest.db".to_string(),
            rate_limit_ms: 500,
            worker_count: 5,
            embedding_dim: 768,
            bibliographic_api_key: None,
            browser_enabled: true,
            http_timeout_secs: 15,
            browser_nav_timeout_secs: 30,
            chrome_data_dir: None,
        }
    }
}

impl IngestConfig {
    #[must_use]
    pub fn database_url(&self) -> &str {
        &self.database_url
    }

    #[must_use]
    pub fn rate_limit(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.rate_limit_ms)
    }

    #[must_use]
    pub fn worker_count(&self) -> usize {
        self.worker_count
    }

    #[must_use]
    pub fn embedding_dim(&self) -> usize {
        self.embedding_dim
    }

    #[must_use]
    pub fn bibliographic_api_key(&self) -> Option<&str> {
        self.bibliographic_api_key.as_deref()
    }

    #[must_use]
    pub fn browser_enabled(&self) -> bool {
        self.browser_enabled
    }

    #[must_use]
    pub fn http_timeout(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.http_timeout_secs)
    }

    #[must_use]
    pub fn browser_nav_timeout(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.browser_nav_timeout_secs)
    }

    #[must_use]
    pub fn chrome_data_dir(&self) -> Option<&PathBuf> {
        self.chrome_data_dir.as_ref()
    }

    /// Load overrides from environment variables, falling back to the current
    /// values for anything unset. Call once at process start after `dotenvy::dotenv()`.
    #[must_use]
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(url) = std::env::var("INGEST_DATABASE_URL") {
            self.database_url = url;
        }
        if let Ok(v) = std::env::var("INGEST_RATE_LIMIT_SECS")
            && let Ok(secs) = v.parse::<f64>()
        {
            self.rate_limit_ms = (secs * 1000.0) as u64;
        }
        if let Ok(v) = std::env::var("INGEST_WORKER_COUNT")
            && let Ok(n) = v.parse::<usize>()
        {
            self.worker_count = n;
        }
        if let Ok(v) = std::env::var("INGEST_EMBEDDING_DIM")
            && let Ok(n) = v.parse::<usize>()
        {
            self.embedding_dim = n;
        }
        if let Ok(key) = std::env::var("SEMANTIC_SCHOLAR_API_KEY") {
            self.bibliographic_api_key = Some(key);
        }
        if let Ok(v) = std::env::var("INGEST_BROWSER_ENABLED")
            && let Ok(b) = v.parse::<bool>()
        {
            self.browser_enabled = b;
        }
        self
    }
}
