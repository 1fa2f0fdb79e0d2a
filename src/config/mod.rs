//! Configuration for the ingestion pipeline.
//!
//! Provides `IngestConfig` and its type-safe builder for configuring the
//! harvester, bibliographic client, and orchestrator with validation and
//! sensible defaults.

pub mod builder;
pub mod types;

pub use builder::{Complete, IngestConfigBuilder};
pub use types::IngestConfig;
