//! Persistence layer: SQLite pool bootstrap and per-entity repository functions.
//!
//! All writes go through idempotent upsert helpers so that re-running an
//! ingestion job (or two workers racing on the same professor) never
//! duplicates rows — see each submodule for the CTE-based upsert pattern.

pub mod authors;
pub mod jobs;
pub mod papers;
pub mod professors;

use anyhow::{Context, Result};
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use sqlx::SqlitePool;
use std::str::FromStr;

const SCHEMA_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS professors (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL,
    university TEXT NOT NULL,
    department TEXT,
    email TEXT,
    profile_url TEXT NOT NULL UNIQUE,
    created_at TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ', 'now'))
);

CREATE TABLE IF NOT EXISTS authors (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    professor_id INTEGER NOT NULL REFERENCES professors(id) ON DELETE CASCADE,
    name TEXT NOT NULL,
    external_author_id TEXT UNIQUE,
    created_at TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ', 'now')),
    UNIQUE(professor_id)
);

CREATE TABLE IF NOT EXISTS papers (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    external_paper_id TEXT UNIQUE,
    title TEXT NOT NULL,
    abstract_text TEXT,
    year INTEGER,
    citations INTEGER NOT NULL DEFAULT 0,
    paper_url TEXT,
    created_at TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ', 'now')),
    UNIQUE(title, year)
);

CREATE TABLE IF NOT EXISTS paper_authors (
    paper_id INTEGER NOT NULL REFERENCES papers(id) ON DELETE CASCADE,
    author_id INTEGER NOT NULL REFERENCES authors(id) ON DELETE CASCADE,
    PRIMARY KEY (paper_id, author_id)
);

CREATE TABLE IF NOT EXISTS paper_embeddings (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    paper_id INTEGER NOT NULL UNIQUE REFERENCES papers(id) ON DELETE CASCADE,
    vector BLOB NOT NULL,
    created_at TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ', 'now'))
);

CREATE TABLE IF NOT EXISTS ingestion_jobs (
    id TEXT PRIMARY KEY,
    university TEXT NOT NULL,
    total_faculty INTEGER NOT NULL DEFAULT 0,
    processed_faculty INTEGER NOT NULL DEFAULT 0,
    status TEXT NOT NULL DEFAULT 'queued',
    created_at TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ', 'now')),
    updated_at TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ', 'now'))
);
"#;

/// Open (creating if absent) the SQLite database at `database_url`, configured
/// with WAL journaling and `synchronous=NORMAL` for concurrent worker access,
/// and run the idempotent schema bootstrap.
pub async fn open(database_url: &str) -> Result<SqlitePool> {
    let options = SqliteConnectOptions::from_str(database_url)
        .context("invalid database URL")?
        .create_if_missing(true)
        .journal_mode(SqliteJournalMode::Wal)
        .synchronous(SqliteSynchronous::Normal)
        .busy_timeout(std::time::Duration::from_secs(30));

    let pool = SqlitePoolOptions::new()
        .max_connections(8)
        .connect_with(options)
        .await
        .context("failed to open SQLite database")?;

    sqlx::query(SCHEMA_SQL)
        .execute(&pool)
        .await
        .context("failed to initialize database schema")?;

    Ok(pool)
}

/// Process-wide write serialization for the embedded-SQLite deployment, held
/// by `Orchestrator` around every write in its dispatched tasks. Postgres
/// deployments would rely on row-level locking instead; this mutex exists
/// because SQLite accepts only one writer at a time even under WAL.
pub type WriteLock = tokio::sync::Mutex<()>;

#[must_use]
pub fn new_write_lock() -> WriteLock {
    tokio::sync::Mutex::new(())
}
