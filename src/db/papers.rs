//! Idempotent Paper upsert, authorship linking, and embedding persistence
//! (spec §3, §4.5.4, §4.5.5).

use crate::error::StoreError;
use crate::models::{Paper, PaperEmbedding};
use sqlx::SqlitePool;

pub struct PaperUpsert {
    pub id: i64,
    pub was_new: bool,
}

/// Input for a single paper selected by the per-professor task.
pub struct PaperInput<'a> {
    pub external_paper_id: Option<&'a str>,
    pub title: &'a str,
    pub abstract_text: Option<&'a str>,
    pub year: Option<i32>,
    pub citations: i64,
    pub paper_url: Option<&'a str>,
}

/// Upsert a paper. Uniqueness is by `external_paper_id` when present, else by
/// `(title, year)` — matching the two `UNIQUE` constraints on the `papers`
/// table (spec §3: "uniqueness by `external_paper_id` when present, else by
/// `(title, year)` composite").
pub async fn upsert(pool: &SqlitePool, input: &PaperInput<'_>) -> Result<PaperUpsert, StoreError> {
    let conflict_clause = if input.external_paper_id.is_some() {
        "ON CONFLICT(external_paper_id) DO NOTHING"
    } else {
        "ON CONFLICT(title, year) DO NOTHING"
    };
    let sql = format!(
        r#"
        WITH ins AS (
            INSERT INTO papers (external_paper_id, title, abstract_text, year, citations, paper_url)
            VALUES (?, ?, ?, ?, ?, ?)
            {conflict_clause}
            RETURNING id
        )
        SELECT id FROM ins
        "#
    );

    let inserted: Option<(i64,)> = sqlx::query_as(&sql)
        .bind(input.external_paper_id)
        .bind(input.title)
        .bind(input.abstract_text)
        .bind(input.year)
        .bind(input.citations)
        .bind(input.paper_url)
        .fetch_optional(pool)
        .await?;

    if let Some((id,)) = inserted {
        return Ok(PaperUpsert { id, was_new: true });
    }

    let existing: Option<(i64,)> = if let Some(ext_id) = input.external_paper_id {
        sqlx::query_as("SELECT id FROM papers WHERE external_paper_id = ?")
            .bind(ext_id)
            .fetch_optional(pool)
            .await?
    } else {
        sqlx::query_as("SELECT id FROM papers WHERE title = ? AND year IS ?")
            .bind(input.title)
            .bind(input.year)
            .fetch_optional(pool)
            .await?
    };

    let (id,) = existing.ok_or(StoreError::IntegrityRaceUnresolved { entity: "papers" })?;
    Ok(PaperUpsert { id, was_new: false })
}

/// Insert a `(paper_id, author_id)` authorship pair; no-op if already present.
pub async fn link_authorship(
    pool: &SqlitePool,
    paper_id: i64,
    author_id: i64,
) -> Result<(), StoreError> {
    sqlx::query("INSERT INTO paper_authors (paper_id, author_id) VALUES (?, ?) ON CONFLICT DO NOTHING")
        .bind(paper_id)
        .bind(author_id)
        .execute(pool)
        .await?;
    Ok(())
}

pub async fn get(pool: &SqlitePool, id: i64) -> Result<Option<Paper>, StoreError> {
    let row = sqlx::query_as::<_, Paper>("SELECT * FROM papers WHERE id = ?")
        .bind(id)
        .fetch_optional(pool)
        .await?;
    Ok(row)
}

pub async fn has_embedding(pool: &SqlitePool, paper_id: i64) -> Result<bool, StoreError> {
    let row: Option<(i64,)> = sqlx::query_as("SELECT id FROM paper_embeddings WHERE paper_id = ?")
        .bind(paper_id)
        .fetch_optional(pool)
        .await?;
    Ok(row.is_some())
}

/// Persist an embedding vector as a little-endian f32 BLOB. No update path:
/// an embedding is created once and never overwritten (spec §3).
pub async fn insert_embedding(
    pool: &SqlitePool,
    paper_id: i64,
    vector: &[f32],
) -> Result<(), StoreError> {
    let bytes = encode_vector(vector);
    sqlx::query(
        "INSERT INTO paper_embeddings (paper_id, vector) VALUES (?, ?) ON CONFLICT(paper_id) DO NOTHING",
    )
    .bind(paper_id)
    .bind(bytes)
    .execute(pool)
    .await?;
    Ok(())
}

pub async fn get_embedding(
    pool: &SqlitePool,
    paper_id: i64,
) -> Result<Option<PaperEmbedding>, StoreError> {
    let row: Option<(i64, i64, Vec<u8>, chrono::DateTime<chrono::Utc>)> = sqlx::query_as(
        "SELECT id, paper_id, vector, created_at FROM paper_embeddings WHERE paper_id = ?",
    )
    .bind(paper_id)
    .fetch_optional(pool)
    .await?;

    Ok(row.map(|(id, paper_id, bytes, created_at)| PaperEmbedding {
        id,
        paper_id,
        vector: decode_vector(&bytes),
        created_at,
    }))
}

fn encode_vector(vector: &[f32]) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(vector.len() * 4);
    for v in vector {
        bytes.extend_from_slice(&v.to_le_bytes());
    }
    bytes
}

fn decode_vector(bytes: &[u8]) -> Vec<f32> {
    bytes
        .chunks_exact(4)
        .map(|chunk| f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn upsert_dedupes_by_external_id() {
        let pool = crate::db::open("sqlite::memory:").await.unwrap();
        let input = PaperInput {
            external_paper_id: Some("ss-1"),
            title: "A Paper",
            abstract_text: None,
            year: Some(2020),
            citations: 10,
            paper_url: None,
        };
        let first = upsert(&pool, &input).await.unwrap();
        let second = upsert(&pool, &input).await.unwrap();
        assert_eq!(first.id, second.id);
        assert!(!second.was_new);
    }

    #[tokio::test]
    async fn upsert_dedupes_by_title_year_when_no_external_id() {
        let pool = crate::db::open("sqlite::memory:").await.unwrap();
        let input = PaperInput {
            external_paper_id: None,
            title: "Untracked Paper",
            abstract_text: None,
            year: Some(2019),
            citations: 0,
            paper_url: None,
        };
        let first = upsert(&pool, &input).await.unwrap();
        let second = upsert(&pool, &input).await.unwrap();
        assert_eq!(first.id, second.id);
    }

    #[tokio::test]
    async fn embedding_insert_is_idempotent() {
        let pool = crate::db::open("sqlite::memory:").await.unwrap();
        let input = PaperInput {
            external_paper_id: Some("ss-2"),
            title: "Another Paper",
            abstract_text: None,
            year: Some(2021),
            citations: 1,
            paper_url: None,
        };
        let paper = upsert(&pool, &input).await.unwrap();

        insert_embedding(&pool, paper.id, &[1.0, 2.0, 3.0])
            .await
            .unwrap();
        insert_embedding(&pool, paper.id, &[9.0, 9.0, 9.0])
            .await
            .unwrap();

        let embedding = get_embedding(&pool, paper.id).await.unwrap().unwrap();
        assert_eq!(embedding.vector, vec![1.0, 2.0, 3.0]);
    }
}
