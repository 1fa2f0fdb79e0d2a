//! Ingestion Orchestrator (C5): job lifecycle, bounded worker pool, and the
//! three per-task algorithms (spec §4.5).
//!
//! Grounded on `original_source/backend/workers/tasks.py` for the task
//! bodies (`ingest_university_faculty`, `fetch_papers_for_professor`,
//! `generate_paper_embedding`) and on `crawl_engine/orchestrator.rs`'s
//! `Arc<Semaphore>` + `tokio::spawn`-with-owned-permit idiom for bounding
//! worker concurrency.

use crate::bibliographic_client::{self, BibliographicSource, PaperCandidate};
use crate::db;
use crate::embeddings::EmbeddingModel;
use crate::error::{OrchestratorError, StoreError};
use crate::harvester;
use crate::http_client::HttpClient;
use crate::models::JobStatus;
use crate::progress::ProgressReporter;
use chrono::Datelike;
use chromiumoxide::browser::Browser;
use sqlx::SqlitePool;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use tracing::{error, info, warn};
use uuid::Uuid;

/// View returned by [`Orchestrator::job_status`] (spec §6).
#[derive(Debug, Clone, serde::Serialize)]
pub struct JobStatusView {
    pub id: Uuid,
    pub university: String,
    pub status: JobStatus,
    pub total_faculty: i64,
    pub processed_faculty: i64,
    pub progress: f64,
}

/// Shared orchestrator state, cheaply cloneable via `Arc<Self>` so spawned
/// tasks can outlive the call that dispatched them.
pub struct Orchestrator {
    pool: SqlitePool,
    http_client: HttpClient,
    browser: Option<Browser>,
    bibliographic: Arc<dyn BibliographicSource>,
    embedding_model: Arc<dyn EmbeddingModel>,
    progress: Arc<dyn ProgressReporter>,
    semaphore: Arc<Semaphore>,
    /// Serializes every write across the dispatched professor/paper tasks.
    /// `busy_timeout` alone makes SQLite's single-writer constraint survive
    /// contention by waiting it out; this lock avoids paying that wait under
    /// the bounded worker pool's normal concurrency.
    write_lock: db::WriteLock,
}

impl Orchestrator {
    #[must_use]
    pub fn new(
        pool: SqlitePool,
        http_client: HttpClient,
        browser: Option<Browser>,
        bibliographic: Arc<dyn BibliographicSource>,
        embedding_model: Arc<dyn EmbeddingModel>,
        progress: Arc<dyn ProgressReporter>,
        worker_count: usize,
    ) -> Self {
        Self {
            pool,
            http_client,
            browser,
            bibliographic,
            embedding_model,
            progress,
            semaphore: Arc::new(Semaphore::new(worker_count.max(1))),
            write_lock: db::new_write_lock(),
        }
    }

    /// Spec §6 `enqueue_ingest`: insert a `queued` job and dispatch the
    /// roster task in the background. Returns the job id immediately.
    pub async fn enqueue_ingest(
        self: &Arc<Self>,
        university: &str,
        dept_url: &str,
    ) -> Result<Uuid, StoreError> {
        let job_id = db::jobs::create(&self.pool, university).await?;
        self.progress.report_job_started(job_id, university);

        let this = Arc::clone(self);
        let university = university.to_string();
        let dept_url = dept_url.to_string();
        tokio::spawn(async move {
            this.ingest_roster(&university, &dept_url, job_id).await;
        });

        Ok(job_id)
    }

    /// Spec §6 `job_status`.
    pub async fn job_status(&self, job_id: Uuid) -> Result<Option<JobStatusView>, StoreError> {
        let job = db::jobs::get(&self.pool, job_id).await?;
        Ok(job.map(|j| JobStatusView {
            id: j.id,
            university: j.university,
            status: j.status.0,
            total_faculty: j.total_faculty,
            processed_faculty: j.processed_faculty,
            progress: j.progress(),
        }))
    }

    /// Top-level task (spec §4.5.2). Never propagates an error out — every
    /// failure path lands the job in `failed` and returns.
    async fn ingest_roster(self: Arc<Self>, university: &str, dept_url: &str, job_id: Uuid) {
        let set_processing = {
            let _guard = self.write_lock.lock().await;
            db::jobs::set_status(&self.pool, job_id, JobStatus::Processing).await
        };
        if let Err(e) = set_processing {
            error!(%job_id, error = %e, "failed to mark job processing");
            return;
        }

        let outcome = harvester::harvest(&self.http_client, self.browser.as_ref(), dept_url).await;
        let faculty = outcome.candidates;
        info!(%job_id, count = faculty.len(), stages = ?outcome.diagnostics.stages_run, "roster harvested");
        self.progress.report_roster_harvested(job_id, faculty.len());

        if faculty.is_empty() {
            warn!(%job_id, university, "empty roster, failing job");
            let _ = {
                let _guard = self.write_lock.lock().await;
                db::jobs::set_status(&self.pool, job_id, JobStatus::Failed).await
            };
            self.progress
                .report_job_failed(job_id, &OrchestratorError::EmptyRoster {
                    university: university.to_string(),
                }.to_string());
            return;
        }

        let set_total = {
            let _guard = self.write_lock.lock().await;
            db::jobs::set_total_faculty(&self.pool, job_id, faculty.len() as i64).await
        };
        if let Err(e) = set_total {
            error!(%job_id, error = %e, "failed to set total_faculty");
            return;
        }

        for candidate in &faculty {
            let prof_id = {
                let _guard = self.write_lock.lock().await;
                db::professors::upsert(
                    &self.pool,
                    &candidate.name,
                    university,
                    None,
                    candidate.email.as_deref(),
                    &candidate.profile_url,
                )
                .await
            };
            let prof_id = match prof_id {
                Ok(upserted) => Some(upserted.id),
                Err(e) => {
                    warn!(%job_id, name = %candidate.name, error = %e, "professor upsert failed, skipping");
                    None
                }
            };

            match prof_id {
                Some(prof_id) => {
                    let this = Arc::clone(&self);
                    let permit = Arc::clone(&this.semaphore);
                    tokio::spawn(async move {
                        let Ok(_permit) = permit.acquire_owned().await else {
                            error!("worker semaphore closed unexpectedly");
                            return;
                        };
                        this.fetch_papers(prof_id, job_id).await;
                    });
                }
                None => {
                    // Upsert itself failed — still advance progress so the
                    // job can reach `completed` (spec §4.5.2 step 6).
                    let _ = self.bump_progress_and_maybe_complete(job_id).await;
                }
            }

            tokio::time::sleep(Duration::from_millis(100)).await;
        }
    }

    /// Per-professor task (spec §4.5.4). Every exit path increments progress
    /// exactly once (Open Question decision #1 in `DESIGN.md`).
    async fn fetch_papers(self: Arc<Self>, professor_id: i64, job_id: Uuid) {
        let professor = match db::professors::get(&self.pool, professor_id).await {
            Ok(Some(p)) => p,
            Ok(None) => {
                let _ = self.bump_progress_and_maybe_complete(job_id).await;
                return;
            }
            Err(e) => {
                warn!(professor_id, error = %e, "professor lookup failed");
                let _ = self.bump_progress_and_maybe_complete(job_id).await;
                return;
            }
        };

        let (external_author_id, papers) = match bibliographic_client::search_with_backoff(
            self.bibliographic.as_ref(),
            &professor.name,
            Some(professor.university.as_str()),
        )
        .await
        {
            Ok(result) => result,
            Err(e) => {
                warn!(professor_id, error = %e, "bibliographic search failed");
                let _ = self.bump_progress_and_maybe_complete(job_id).await;
                return;
            }
        };

        if papers.is_empty() {
            let _ = self.bump_progress_and_maybe_complete(job_id).await;
            return;
        }

        let author_id = {
            let _guard = self.write_lock.lock().await;
            db::authors::upsert(
                &self.pool,
                professor_id,
                &professor.name,
                external_author_id.as_deref(),
            )
            .await
        };
        let author_id = match author_id {
            Ok(a) => a.id,
            Err(e) => {
                warn!(professor_id, error = %e, "author upsert failed");
                let _ = self.bump_progress_and_maybe_complete(job_id).await;
                return;
            }
        };

        for paper in select_papers(papers) {
            let input = db::papers::PaperInput {
                external_paper_id: Some(paper.external_paper_id.as_str()),
                title: paper.title.as_deref().unwrap_or("").trim(),
                abstract_text: paper.abstract_text.as_deref(),
                year: paper.year,
                citations: paper.citations,
                paper_url: paper.paper_url.as_deref(),
            };
            let paper_row = {
                let _guard = self.write_lock.lock().await;
                db::papers::upsert(&self.pool, &input).await
            };
            let paper_row = match paper_row {
                Ok(p) => p,
                Err(e) => {
                    warn!(professor_id, title = %input.title, error = %e, "paper upsert failed, skipping");
                    continue;
                }
            };

            let link_result = {
                let _guard = self.write_lock.lock().await;
                db::papers::link_authorship(&self.pool, paper_row.id, author_id).await
            };
            if let Err(e) = link_result {
                warn!(professor_id, paper_id = paper_row.id, error = %e, "authorship link failed");
            }

            let this = Arc::clone(&self);
            let paper_id = paper_row.id;
            tokio::spawn(async move {
                this.embed(paper_id, job_id).await;
            });
        }

        let _ = self.bump_progress_and_maybe_complete(job_id).await;
    }

    /// Per-paper task (spec §4.5.5). `job_id` is carried only for progress
    /// reporting; the task's own contract depends solely on `paper_id`.
    async fn embed(&self, paper_id: i64, job_id: Uuid) {
        let Ok(Some(paper)) = db::papers::get(&self.pool, paper_id).await else {
            return;
        };
        if paper.title.is_empty() && paper.abstract_text.as_deref().unwrap_or("").is_empty() {
            return;
        }
        match db::papers::has_embedding(&self.pool, paper_id).await {
            Ok(true) => return,
            Err(e) => {
                warn!(paper_id, error = %e, "embedding existence check failed");
                return;
            }
            Ok(false) => {}
        }

        let text = format!("{}. {}", paper.title, paper.abstract_text.as_deref().unwrap_or(""));
        let vector = match self.embedding_model.embed(&text) {
            Ok(v) => v,
            Err(e) => {
                warn!(paper_id, error = %e, "embedding generation failed");
                return;
            }
        };

        let insert_result = {
            let _guard = self.write_lock.lock().await;
            db::papers::insert_embedding(&self.pool, paper_id, &vector).await
        };
        if let Err(e) = insert_result {
            warn!(paper_id, error = %e, "embedding insert failed");
            return;
        }

        self.progress.report_paper_embedded(job_id, paper_id);
    }

    async fn bump_progress_and_maybe_complete(&self, job_id: Uuid) -> Result<(), StoreError> {
        let (processed, total) = {
            let _guard = self.write_lock.lock().await;
            db::jobs::increment_processed(&self.pool, job_id).await?
        };
        self.progress.report_professor_processed(job_id, processed, total);
        if total > 0 && processed >= total {
            {
                let _guard = self.write_lock.lock().await;
                db::jobs::set_status(&self.pool, job_id, JobStatus::Completed).await?;
            }
            self.progress.report_job_completed(job_id);
        }
        Ok(())
    }
}

/// Spec §4.5.4 step 4: top 30 by citations, unioned with every paper from
/// the last five years, deduplicated by `external_paper_id`.
fn select_papers(mut papers: Vec<PaperCandidate>) -> Vec<PaperCandidate> {
    const RECENT_YEARS: i32 = 5;
    let current_year = chrono::Utc::now().year_ce().1 as i32;

    papers.sort_by(|a, b| b.citations.cmp(&a.citations));
    let top_30: Vec<&PaperCandidate> = papers.iter().take(30).collect();
    let recent: Vec<&PaperCandidate> = papers
        .iter()
        .filter(|p| p.year.is_some_and(|y| y >= current_year - RECENT_YEARS))
        .collect();

    let mut seen = HashSet::new();
    let mut out = Vec::new();
    for p in top_30.into_iter().chain(recent) {
        if seen.insert(p.external_paper_id.clone()) {
            out.push(p.clone());
        }
    }
    out
}
