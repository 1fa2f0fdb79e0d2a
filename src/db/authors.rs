//! Idempotent Author upsert, keyed by `professor_id` (one Author per Professor
//! in this core; see spec §3).

use crate::error::StoreError;
use sqlx::SqlitePool;

pub struct AuthorUpsert {
    pub id: i64,
    pub was_new: bool,
}

pub async fn upsert(
    pool: &SqlitePool,
    professor_id: i64,
    name: &str,
    external_author_id: Option<&str>,
) -> Result<AuthorUpsert, StoreError> {
    let inserted: Option<(i64,)> = sqlx::query_as(
        r#"
        WITH ins AS (
            INSERT INTO authors (professor_id, name, external_author_id)
            VALUES (?, ?, ?)
            ON CONFLICT(professor_id) DO NOTHING
            RETURNING id
        )
        SELECT id FROM ins
        "#,
    )
    .bind(professor_id)
    .bind(name)
    .bind(external_author_id)
    .fetch_optional(pool)
    .await?;

    if let Some((id,)) = inserted {
        return Ok(AuthorUpsert { id, was_new: true });
    }

    let existing: Option<(i64, Option<String>)> =
        sqlx::query_as("SELECT id, external_author_id FROM authors WHERE professor_id = ?")
            .bind(professor_id)
            .fetch_optional(pool)
            .await?;

    let (id, existing_external_id) = existing.ok_or(StoreError::IntegrityRaceUnresolved {
        entity: "authors",
    })?;

    if existing_external_id.is_none()
        && let Some(new_id) = external_author_id
    {
        sqlx::query(
            "UPDATE authors SET external_author_id = ? WHERE id = ? AND external_author_id IS NULL",
        )
        .bind(new_id)
        .bind(id)
        .execute(pool)
        .await?;
    }

    Ok(AuthorUpsert { id, was_new: false })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::professors;

    #[tokio::test]
    async fn upsert_is_idempotent_per_professor() {
        let pool = crate::db::open("sqlite::memory:").await.unwrap();
        let prof = professors::upsert(
            &pool,
            "Jane Smith",
            "Example University",
            None,
            None,
            "https://example.edu/jane",
        )
        .await
        .unwrap();

        let a1 = upsert(&pool, prof.id, "Jane Smith", None).await.unwrap();
        let a2 = upsert(&pool, prof.id, "Jane Smith", Some("ext-123"))
            .await
            .unwrap();
        assert_eq!(a1.id, a2.id);
        assert!(!a2.was_new);
    }
}
