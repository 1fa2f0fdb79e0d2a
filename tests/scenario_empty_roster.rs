//! Boundary scenario 6: empty roster (spec §8).
//!
//! When the Harvester returns zero candidates, the job must transition
//! `queued -> processing -> failed` without ever dispatching a per-professor
//! task.

use faculty_ingest::bibliographic_client::{BibliographicSource, PaperCandidate};
use faculty_ingest::error::BibliographicError;
use faculty_ingest::models::JobStatus;
use faculty_ingest::{HttpClient, NoOpProgress, Orchestrator, PlaceholderEmbeddingModel};
use std::sync::Arc;
use std::time::Duration;

struct UnreachableSource;

#[async_trait::async_trait]
impl BibliographicSource for UnreachableSource {
    async fn search_author(
        &self,
        _name: &str,
        _affiliation: Option<&str>,
    ) -> Result<(Option<String>, Vec<PaperCandidate>), BibliographicError> {
        panic!("no per-professor task should ever call the bibliographic client");
    }
}

#[tokio::test]
async fn empty_roster_fails_the_job_without_dispatching_professors() {
    let mut server = mockito::Server::new_async().await;
    let _mock = server
        .mock("GET", "/faculty")
        .with_status(200)
        .with_body("<html><body><p>No faculty listing is currently available.</p></body></html>")
        .create_async()
        .await;

    let tmp = tempfile::NamedTempFile::new().unwrap();
    let db_url = format!("sqlite://{}", tmp.path().display());
    let pool = faculty_ingest::db::open(&db_url).await.unwrap();

    let http_client = HttpClient::new(Duration::ZERO, Duration::from_secs(5)).unwrap();
    let orchestrator = Arc::new(Orchestrator::new(
        pool,
        http_client,
        None,
        Arc::new(UnreachableSource),
        Arc::new(PlaceholderEmbeddingModel::new(16)),
        Arc::new(NoOpProgress),
        3,
    ));

    let directory_url = format!("{}/faculty", server.url());
    let job_id = orchestrator
        .enqueue_ingest("Empty University", &directory_url)
        .await
        .unwrap();

    let view = wait_for_terminal(&orchestrator, job_id).await;

    assert_eq!(view.status, JobStatus::Failed);
    assert_eq!(view.total_faculty, 0);
    assert_eq!(view.processed_faculty, 0);
}

async fn wait_for_terminal(
    orchestrator: &Orchestrator,
    job_id: uuid::Uuid,
) -> faculty_ingest::orchestrator::JobStatusView {
    for _ in 0..100 {
        let view = orchestrator.job_status(job_id).await.unwrap().unwrap();
        if matches!(view.status, JobStatus::Completed | JobStatus::Failed) {
            return view;
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
    panic!("job did not reach a terminal state in time");
}
