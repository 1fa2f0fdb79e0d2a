//! Progress reporting abstraction for the ingestion pipeline.
//!
//! Defines the `ProgressReporter` trait for job-lifecycle event reporting and
//! provides a no-op implementation for callers that don't need updates.

/// Trait for reporting ingestion progress at key lifecycle events.
///
/// Implementations can send updates to channels, log to console, update a UI,
/// etc. This abstraction lets the orchestrator's core logic stay agnostic of
/// how progress is surfaced to the caller.
pub trait ProgressReporter: Send + Sync {
    /// A roster job has been accepted and is now `processing`.
    fn report_job_started(&self, job_id: uuid::Uuid, university: &str);

    /// The harvester returned its faculty list; `total` is the job's `total_faculty`.
    fn report_roster_harvested(&self, job_id: uuid::Uuid, total: usize);

    /// One professor's per-professor task has finished (success or handled failure).
    fn report_professor_processed(&self, job_id: uuid::Uuid, processed: i64, total: i64);

    /// A paper embedding was written.
    fn report_paper_embedded(&self, job_id: uuid::Uuid, paper_id: i64);

    /// The job reached a terminal state.
    fn report_job_completed(&self, job_id: uuid::Uuid);

    /// The job reached a terminal, failed state.
    fn report_job_failed(&self, job_id: uuid::Uuid, reason: &str);
}

/// Progress reporter that does nothing.
///
/// All methods are no-ops and will be inlined away by the compiler.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOpProgress;

impl ProgressReporter for NoOpProgress {
    #[inline(always)]
    fn report_job_started(&self, _job_id: uuid::Uuid, _university: &str) {}

    #[inline(always)]
    fn report_roster_harvested(&self, _job_id: uuid::Uuid, _total: usize) {}

    #[inline(always)]
    fn report_professor_processed(&self, _job_id: uuid::Uuid, _processed: i64, _total: i64) {}

    #[inline(always)]
    fn report_paper_embedded(&self, _job_id: uuid::Uuid, _paper_id: i64) {}

    #[inline(always)]
    fn report_job_completed(&self, _job_id: uuid::Uuid) {}

    #[inline(always)]
    fn report_job_failed(&self, _job_id: uuid::Uuid, _reason: &str) {}
}
