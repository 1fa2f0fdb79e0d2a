//! Thin CLI entry point over the `Orchestrator` library API (spec §6).
//!
//! Two subcommands:
//!   faculty-ingest ingest <university> <dept_url>
//!   faculty-ingest status <job_id>
//!
//! The real integration surface is `Orchestrator::enqueue_ingest` /
//! `Orchestrator::job_status` themselves; this binary exists so the pipeline
//! is runnable standalone without an out-of-scope RPC façade.

use anyhow::{Context, Result, bail};
use faculty_ingest::{
    HttpClient, IngestConfig, NoOpProgress, Orchestrator, PlaceholderEmbeddingModel,
    SemanticScholarClient, browser_renderer, db,
};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = IngestConfig::builder()
        .database_url("sqlite://ingest.db")
        .build()
        .with_env_overrides();

    let mut args = std::env::args().skip(1);
    let command = args.next().context("usage: faculty-ingest <ingest|status> ...")?;

    let pool = db::open(config.database_url())
        .await
        .context("failed to open database")?;

    match command.as_str() {
        "ingest" => {
            let university = args.next().context("usage: faculty-ingest ingest <university> <dept_url>")?;
            let dept_url = args.next().context("usage: faculty-ingest ingest <university> <dept_url>")?;

            let orchestrator = Arc::new(build_orchestrator(pool, &config).await?);
            let job_id = orchestrator.enqueue_ingest(&university, &dept_url).await?;
            println!("{job_id}");

            // Keep the process alive long enough for the spawned roster task
            // to make progress when run as a one-shot CLI invocation.
            tokio::signal::ctrl_c().await.ok();
        }
        "status" => {
            let job_id_raw = args.next().context("usage: faculty-ingest status <job_id>")?;
            let job_id: Uuid = job_id_raw.parse().context("invalid job id")?;

            let orchestrator = Arc::new(build_orchestrator(pool, &config).await?);
            match orchestrator.job_status(job_id).await? {
                Some(view) => println!("{}", serde_json::to_string_pretty(&view)?),
                None => bail!("no such job: {job_id}"),
            }
        }
        other => bail!("unknown command {other:?}, expected \"ingest\" or \"status\""),
    }

    Ok(())
}

async fn build_orchestrator(pool: sqlx::SqlitePool, config: &IngestConfig) -> Result<Orchestrator> {
    let http_client = HttpClient::new(config.rate_limit(), config.http_timeout())?;

    let browser = if config.browser_enabled() {
        match browser_renderer::launch(config.chrome_data_dir().cloned()).await {
            Ok(browser) => Some(browser),
            Err(e) => {
                tracing::warn!(error = %e, "headless browser unavailable, continuing without C2 fallback");
                None
            }
        }
    } else {
        None
    };

    let bibliographic = Arc::new(SemanticScholarClient::new(
        config.bibliographic_api_key().map(str::to_string),
    )?);
    let embedding_model = Arc::new(PlaceholderEmbeddingModel::new(config.embedding_dim()));

    Ok(Orchestrator::new(
        pool,
        http_client,
        browser,
        bibliographic,
        embedding_model,
        Arc::new(NoOpProgress),
        config.worker_count(),
    ))
}
