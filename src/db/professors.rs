//! Idempotent Professor upsert (spec §4.5.3).
//!
//! Grounded on `ferrumyx-ingestion/src/pg_repository.rs::upsert_paper`'s
//! `WITH ins AS (INSERT ... ON CONFLICT DO NOTHING RETURNING id) SELECT id FROM ins`
//! shape, adapted to SQLite's `ON CONFLICT` syntax, and on the source
//! `get_or_create_professor`'s "insert, re-read on conflict" fallback.

use crate::error::StoreError;
use crate::models::Professor;
use sqlx::SqlitePool;

pub struct ProfessorUpsert {
    pub id: i64,
    pub was_new: bool,
}

/// Insert a Professor keyed by `profile_url`, or no-op if one already exists.
/// If the existing row has no email and `email` is provided, backfill it —
/// email is monotone-fillable, never overwritten once set.
pub async fn upsert(
    pool: &SqlitePool,
    name: &str,
    university: &str,
    department: Option<&str>,
    email: Option<&str>,
    profile_url: &str,
) -> Result<ProfessorUpsert, StoreError> {
    let inserted: Option<(i64,)> = sqlx::query_as(
        r#"
        WITH ins AS (
            INSERT INTO professors (name, university, department, email, profile_url)
            VALUES (?, ?, ?, ?, ?)
            ON CONFLICT(profile_url) DO NOTHING
            RETURNING id
        )
        SELECT id FROM ins
        "#,
    )
    .bind(name)
    .bind(university)
    .bind(department)
    .bind(email)
    .bind(profile_url)
    .fetch_optional(pool)
    .await?;

    if let Some((id,)) = inserted {
        return Ok(ProfessorUpsert { id, was_new: true });
    }

    let existing: Option<(i64, Option<String>)> =
        sqlx::query_as("SELECT id, email FROM professors WHERE profile_url = ?")
            .bind(profile_url)
            .fetch_optional(pool)
            .await?;

    let (id, existing_email) = existing.ok_or(StoreError::IntegrityRaceUnresolved {
        entity: "professors",
    })?;

    if existing_email.is_none()
        && let Some(new_email) = email
    {
        sqlx::query("UPDATE professors SET email = ? WHERE id = ? AND email IS NULL")
            .bind(new_email)
            .bind(id)
            .execute(pool)
            .await?;
    }

    Ok(ProfessorUpsert { id, was_new: false })
}

pub async fn get(pool: &SqlitePool, id: i64) -> Result<Option<Professor>, StoreError> {
    let row = sqlx::query_as::<_, Professor>("SELECT * FROM professors WHERE id = ?")
        .bind(id)
        .fetch_optional(pool)
        .await?;
    Ok(row)
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn test_pool() -> SqlitePool {
        let pool = crate::db::open("sqlite::memory:").await.unwrap();
        pool
    }

    #[tokio::test]
    async fn upsert_is_idempotent() {
        let pool = test_pool().await;
        let first = upsert(
            &pool,
            "Jane Smith",
            "Example University",
            None,
            None,
            "https://example.edu/jane",
        )
        .await
        .unwrap();
        assert!(first.was_new);

        let second = upsert(
            &pool,
            "Jane Smith",
            "Example University",
            None,
            Some("jane@example.edu"),
            "https://example.edu/jane",
        )
        .await
        .unwrap();
        assert!(!second.was_new);
        assert_eq!(second.id, first.id);

        let prof = get(&pool, first.id).await.unwrap().unwrap();
        assert_eq!(prof.email.as_deref(), Some("jane@example.edu"));
    }

    #[tokio::test]
    async fn email_never_overwritten_once_set() {
        let pool = test_pool().await;
        let first = upsert(
            &pool,
            "Jane Smith",
            "Example University",
            None,
            Some("jane@example.edu"),
            "https://example.edu/jane",
        )
        .await
        .unwrap();

        upsert(
            &pool,
            "Jane Smith",
            "Example University",
            None,
            Some("other@example.edu"),
            "https://example.edu/jane",
        )
        .await
        .unwrap();

        let prof = get(&pool, first.id).await.unwrap().unwrap();
        assert_eq!(prof.email.as_deref(), Some("jane@example.edu"));
    }
}
