//! Crate-wide error taxonomy.
//!
//! Each subsystem gets its own `thiserror` enum so call sites can match on error
//! *kind* rather than string content. Task-boundary functions compose these under
//! `anyhow::Result`.

use std::time::Duration;
use thiserror::Error;

/// Errors surfaced by the HTTP client (C1).
#[derive(Debug, Error)]
pub enum HttpError {
    #[error("request to {url} timed out")]
    Timeout { url: String },
    #[error("request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("server returned {status} for {url}")]
    Status { url: String, status: u16 },
    #[error("rate limited, retry after {retry_after:?}")]
    RateLimited { retry_after: Duration },
}

/// Errors surfaced by the headless browser renderer (C2).
#[derive(Debug, Error)]
pub enum BrowserError {
    #[error("no Chrome/Chromium executable found and managed download failed: {0}")]
    ExecutableUnavailable(String),
    #[error("failed to launch browser: {0}")]
    LaunchFailed(String),
    #[error("navigation to {url} failed: {reason}")]
    NavigationFailed { url: String, reason: String },
    #[error("page evaluation failed: {0}")]
    EvaluationFailed(String),
}

/// Errors surfaced by the bibliographic client (C4).
#[derive(Debug, Error)]
pub enum BibliographicError {
    #[error("request failed: {0}")]
    Request(#[from] HttpError),
    #[error("response body could not be parsed: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("rate limited, retry after {retry_after:?}")]
    RateLimited { retry_after: Duration },
}

/// Errors surfaced by the persistence layer.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Db(#[from] sqlx::Error),
    #[error("unique constraint race on {entity}, re-read found no row")]
    IntegrityRaceUnresolved { entity: &'static str },
}

/// Errors surfaced by the orchestrator (C5) at job granularity. Per-professor
/// and per-paper failures are swallowed inside the task functions themselves
/// (see `orchestrator::tasks`); only roster-level, job-fatal errors reach here.
#[derive(Debug, Error)]
pub enum OrchestratorError {
    #[error("harvester returned zero faculty for {university}")]
    EmptyRoster { university: String },
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Coarse-grained classification used by `search_with_backoff` (C4) to decide
/// whether spending another retry is worth it. Mirrors the teacher's
/// `FailureKind`/`calculate_retry_backoff` pairing, scoped to the failures
/// this pipeline's bibliographic client actually produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// Timeout, connection reset, 5xx — worth retrying.
    Transient,
    /// HTTP 429 — retry after the advertised delay.
    RateLimited,
    /// Malformed JSON, missing expected structure — not worth retrying.
    ParseFailure,
    /// Resource genuinely absent (404) — not worth retrying.
    NotFound,
}

impl FailureKind {
    #[must_use]
    pub const fn is_retryable(self) -> bool {
        matches!(self, Self::Transient | Self::RateLimited)
    }

    /// Classify a bibliographic-client failure for `search_with_backoff`.
    #[must_use]
    pub const fn classify_bibliographic(error: &BibliographicError) -> Self {
        match error {
            BibliographicError::RateLimited { .. } => Self::RateLimited,
            BibliographicError::Decode(_) => Self::ParseFailure,
            BibliographicError::Request(HttpError::Status { status: 404, .. }) => Self::NotFound,
            BibliographicError::Request(HttpError::Status { status, .. }) if *status < 500 => {
                Self::ParseFailure
            }
            BibliographicError::Request(_) => Self::Transient,
        }
    }
}
