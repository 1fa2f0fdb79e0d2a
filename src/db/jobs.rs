//! IngestionJob lifecycle persistence (spec §4.5.1, §4.5.6).

use crate::error::StoreError;
use crate::models::{IngestionJob, JobStatus, JobStatusColumn};
use sqlx::SqlitePool;
use uuid::Uuid;

pub async fn create(pool: &SqlitePool, university: &str) -> Result<Uuid, StoreError> {
    let id = Uuid::new_v4();
    sqlx::query("INSERT INTO ingestion_jobs (id, university, status) VALUES (?, ?, 'queued')")
        .bind(id.to_string())
        .bind(university)
        .execute(pool)
        .await?;
    Ok(id)
}

pub async fn get(pool: &SqlitePool, id: Uuid) -> Result<Option<IngestionJob>, StoreError> {
    let row: Option<(String, String, i64, i64, String, chrono::DateTime<chrono::Utc>, chrono::DateTime<chrono::Utc>)> =
        sqlx::query_as(
            "SELECT id, university, total_faculty, processed_faculty, status, created_at, updated_at FROM ingestion_jobs WHERE id = ?",
        )
        .bind(id.to_string())
        .fetch_optional(pool)
        .await?;

    Ok(row.and_then(
        |(id, university, total_faculty, processed_faculty, status, created_at, updated_at)| {
            JobStatus::from_str(&status).map(|status| IngestionJob {
                id: Uuid::parse_str(&id).unwrap_or_default(),
                university,
                total_faculty,
                processed_faculty,
                status: JobStatusColumn(status),
                created_at,
                updated_at,
            })
        },
    ))
}

pub async fn set_status(
    pool: &SqlitePool,
    id: Uuid,
    status: JobStatus,
) -> Result<(), StoreError> {
    sqlx::query(
        "UPDATE ingestion_jobs SET status = ?, updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now') WHERE id = ?",
    )
    .bind(status.as_str())
    .bind(id.to_string())
    .execute(pool)
    .await?;
    Ok(())
}

pub async fn set_total_faculty(pool: &SqlitePool, id: Uuid, total: i64) -> Result<(), StoreError> {
    sqlx::query(
        "UPDATE ingestion_jobs SET total_faculty = ?, updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now') WHERE id = ?",
    )
    .bind(total)
    .bind(id.to_string())
    .execute(pool)
    .await?;
    Ok(())
}

/// Atomically increment `processed_faculty` at the SQL level (spec §4.5.6 —
/// never a read-modify-write cycle in application code), then read back the
/// fresh counters to let the caller decide on a `Completed` transition.
pub async fn increment_processed(
    pool: &SqlitePool,
    id: Uuid,
) -> Result<(i64, i64), StoreError> {
    sqlx::query(
        "UPDATE ingestion_jobs SET processed_faculty = processed_faculty + 1, updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now') WHERE id = ?",
    )
    .bind(id.to_string())
    .execute(pool)
    .await?;

    let row: (i64, i64) =
        sqlx::query_as("SELECT processed_faculty, total_faculty FROM ingestion_jobs WHERE id = ?")
            .bind(id.to_string())
            .fetch_one(pool)
            .await?;
    Ok(row)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn increment_is_monotone_and_bounded() {
        let pool = crate::db::open("sqlite::memory:").await.unwrap();
        let id = create(&pool, "Example University").await.unwrap();
        set_total_faculty(&pool, id, 3).await.unwrap();

        let (p1, t1) = increment_processed(&pool, id).await.unwrap();
        assert_eq!((p1, t1), (1, 3));
        let (p2, _) = increment_processed(&pool, id).await.unwrap();
        assert_eq!(p2, 2);

        let job = get(&pool, id).await.unwrap().unwrap();
        assert_eq!(job.processed_faculty, 2);
        assert_eq!(job.status.0, JobStatus::Queued);
    }
}
