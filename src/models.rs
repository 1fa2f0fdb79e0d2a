//! Data model for the ingestion pipeline.
//!
//! Field names and uniqueness constraints mirror the SQLAlchemy models this
//! pipeline's schema is derived from: `professors`, `authors`, `papers`,
//! `paper_authors`, `paper_embeddings`, `ingestion_jobs`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Professor {
    pub id: i64,
    pub name: String,
    pub university: String,
    pub department: Option<String>,
    pub email: Option<String>,
    /// Unique. Immutable once set (the harvester dedupes by this field).
    pub profile_url: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Author {
    pub id: i64,
    pub professor_id: i64,
    pub name: String,
    /// Monotone-fillable: null until the bibliographic client resolves a match.
    pub external_author_id: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Paper {
    pub id: i64,
    /// Unique when present. Falls back to `(title, year)` uniqueness otherwise.
    pub external_paper_id: Option<String>,
    pub title: String,
    pub abstract_text: Option<String>,
    pub year: Option<i32>,
    pub citations: i64,
    pub paper_url: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Row of the `paper_authors` association set. `(paper_id, author_id)` is the
/// primary key; inserts are no-ops on conflict.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct PaperAuthorship {
    pub paper_id: i64,
    pub author_id: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct PaperEmbedding {
    pub id: i64,
    /// Unique: exactly one embedding per paper, created once, never updated.
    pub paper_id: i64,
    pub vector: Vec<f32>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "text", rename_all = "lowercase")]
pub enum JobStatus {
    Queued,
    Processing,
    Completed,
    Failed,
}

impl JobStatus {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Queued => "queued",
            Self::Processing => "processing",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }

    #[must_use]
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "queued" => Some(Self::Queued),
            "processing" => Some(Self::Processing),
            "completed" => Some(Self::Completed),
            "failed" => Some(Self::Failed),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct IngestionJob {
    pub id: Uuid,
    pub university: String,
    pub total_faculty: i64,
    pub processed_faculty: i64,
    #[sqlx(try_from = "String")]
    pub status: JobStatusColumn,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Thin wrapper so `sqlx::FromRow` can decode the `status` TEXT column through
/// `JobStatus::from_str` without requiring sqlx's `Type` derive to understand
/// an unconstrained string domain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobStatusColumn(pub JobStatus);

impl TryFrom<String> for JobStatusColumn {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        JobStatus::from_str(&value)
            .map(JobStatusColumn)
            .ok_or_else(|| format!("unknown job status: {value}"))
    }
}

impl IngestionJob {
    #[must_use]
    pub fn progress(&self) -> f64 {
        if self.total_faculty <= 0 {
            0.0
        } else {
            self.processed_faculty as f64 / self.total_faculty as f64
        }
    }
}
