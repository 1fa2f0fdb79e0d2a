//! Autonomous faculty directory harvester and publication ingestion pipeline.
//!
//! Given a university's faculty directory URL, the pipeline discovers every
//! listed faculty member (C3), resolves their publications against a
//! bibliographic source (C4), and persists professors/authors/papers plus
//! deterministic embeddings (C5) into a local SQLite store — all behind a
//! single `Orchestrator::enqueue_ingest` / `Orchestrator::job_status` API.

pub mod bibliographic_client;
pub mod browser_renderer;
pub mod config;
pub mod db;
pub mod embeddings;
pub mod error;
pub mod harvester;
pub mod http_client;
pub mod models;
pub mod orchestrator;
pub mod progress;
pub mod rate_limiter;
pub mod utils;

pub use bibliographic_client::{BibliographicSource, PaperCandidate, SemanticScholarClient};
pub use config::IngestConfig;
pub use embeddings::{EmbeddingModel, PlaceholderEmbeddingModel};
pub use error::{BibliographicError, BrowserError, HttpError, OrchestratorError, StoreError};
pub use http_client::HttpClient;
pub use models::{Author, IngestionJob, JobStatus, Paper, PaperAuthorship, PaperEmbedding, Professor};
pub use orchestrator::{JobStatusView, Orchestrator};
pub use progress::{NoOpProgress, ProgressReporter};
