//! Bibliographic Client (C4): author-paper search with query fallback, 429
//! handling, and a higher-level backoff decorator (spec §4.4).
//!
//! Core query logic grounded on `original_source/backend/core/semantic_scholar.py`.
//! The trait shape is grounded on `ferrumyx-ingestion/src/sources/europepmc.rs`'s
//! `LiteratureSource` so the Orchestrator never names the concrete client type.

use crate::error::{BibliographicError, FailureKind};
use async_trait::async_trait;
use rand::Rng;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, warn};

const BASE_URL: &str = "https://api.semanticscholar.org/graph/v1";
const PAPER_CAP: usize = 30;
const AUTHOR_CANDIDATES: u32 = 3;

/// A paper returned by a bibliographic source, prior to persistence mapping.
#[derive(Debug, Clone)]
pub struct PaperCandidate {
    pub external_paper_id: String,
    pub title: Option<String>,
    pub abstract_text: Option<String>,
    pub year: Option<i32>,
    pub citations: i64,
    pub paper_url: Option<String>,
}

/// Abstraction over a bibliographic source, so a different provider could be
/// substituted without the Orchestrator naming the concrete type. Only one
/// implementation ships in this core.
#[async_trait]
pub trait BibliographicSource: Send + Sync {
    async fn search_author(
        &self,
        name: &str,
        affiliation: Option<&str>,
    ) -> Result<(Option<String>, Vec<PaperCandidate>), BibliographicError>;
}

#[derive(Debug, Deserialize)]
struct AuthorSearchResponse {
    #[serde(default)]
    data: Vec<AuthorResult>,
}

#[derive(Debug, Deserialize)]
struct AuthorResult {
    #[serde(rename = "authorId")]
    author_id: Option<String>,
    #[serde(default)]
    papers: Vec<PaperResult>,
}

#[derive(Debug, Deserialize)]
struct PaperResult {
    #[serde(rename = "paperId")]
    paper_id: String,
    title: Option<String>,
    #[serde(rename = "abstract")]
    abstract_text: Option<String>,
    year: Option<i32>,
    #[serde(rename = "citationCount")]
    citation_count: Option<i64>,
    url: Option<String>,
}

pub struct SemanticScholarClient {
    client: reqwest::Client,
    api_key: Option<String>,
}

impl SemanticScholarClient {
    pub fn new(api_key: Option<String>) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()?;
        Ok(Self { client, api_key })
    }

    async fn search_once(
        &self,
        query: &str,
    ) -> Result<(Option<String>, Vec<PaperCandidate>), BibliographicError> {
        let url = format!(
            "{BASE_URL}/author/search?query={}&limit={AUTHOR_CANDIDATES}&fields=authorId,name,papers.paperId,papers.title,papers.abstract,papers.year,papers.citationCount,papers.url",
            urlencoding::encode(query)
        );

        let mut request = self.client.get(&url);
        if let Some(key) = &self.api_key {
            request = request.header("x-api-key", key);
        }

        let response = request.send().await.map_err(|source| {
            BibliographicError::Request(crate::error::HttpError::Transport {
                url: url.clone(),
                source,
            })
        })?;

        if response.status().as_u16() == 429 {
            let retry_after = response
                .headers()
                .get("Retry-After")
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.parse::<u64>().ok())
                .map(Duration::from_secs)
                .unwrap_or(Duration::from_secs(10));
            return Err(BibliographicError::RateLimited { retry_after });
        }

        if !response.status().is_success() {
            return Err(BibliographicError::Request(crate::error::HttpError::Status {
                url,
                status: response.status().as_u16(),
            }));
        }

        let body = response.text().await.map_err(|source| {
            BibliographicError::Request(crate::error::HttpError::Transport { url, source })
        })?;
        let parsed: AuthorSearchResponse = serde_json::from_str(&body)?;

        for author in parsed.data {
            if !author.papers.is_empty() {
                let papers = author
                    .papers
                    .into_iter()
                    .take(PAPER_CAP)
                    .map(|p| PaperCandidate {
                        external_paper_id: p.paper_id,
                        title: p.title,
                        abstract_text: p.abstract_text,
                        year: p.year,
                        citations: p.citation_count.unwrap_or(0),
                        paper_url: p.url,
                    })
                    .collect();
                return Ok((author.author_id, papers));
            }
        }
        Ok((None, Vec::new()))
    }
}

#[async_trait]
impl BibliographicSource for SemanticScholarClient {
    /// Spec §4.4: clean the name, try `"{name} {affiliation}"` then `"{name}"`,
    /// up to 2 attempts per strategy, honoring 429 `Retry-After` plus
    /// `5 * attempt` seconds; any other failure sleeps 2s and retries.
    async fn search_author(
        &self,
        name: &str,
        affiliation: Option<&str>,
    ) -> Result<(Option<String>, Vec<PaperCandidate>), BibliographicError> {
        let clean_name = name.split(',').next().unwrap_or(name).trim();
        let queries: Vec<String> = match affiliation {
            Some(aff) if !aff.is_empty() => {
                vec![format!("{clean_name} {aff}"), clean_name.to_string()]
            }
            _ => vec![clean_name.to_string()],
        };

        for query in &queries {
            for attempt in 0..2u64 {
                match self.search_once(query).await {
                    Ok((author_id, papers)) => {
                        if papers.is_empty() {
                            break;
                        }
                        return Ok((author_id, papers));
                    }
                    Err(BibliographicError::RateLimited { retry_after }) => {
                        let delay = retry_after + Duration::from_secs(5 * attempt);
                        debug!(query, attempt, ?delay, "rate limited, backing off");
                        tokio::time::sleep(delay).await;
                    }
                    Err(e) => {
                        warn!(query, attempt, error = %e, "bibliographic search failed");
                        tokio::time::sleep(Duration::from_secs(2)).await;
                    }
                }
            }
        }
        Ok((None, Vec::new()))
    }
}

/// Higher-level backoff decorator (spec §4.4): up to 5 additional retries
/// with delay `0.6 * 2^(attempt-1) + uniform(0, 0.2)` seconds, wrapping
/// whatever `BibliographicSource` the Orchestrator was built with.
pub async fn search_with_backoff(
    source: &dyn BibliographicSource,
    name: &str,
    affiliation: Option<&str>,
) -> Result<(Option<String>, Vec<PaperCandidate>), BibliographicError> {
    const MAX_RETRIES: u32 = 5;
    let mut attempt = 0u32;
    loop {
        match source.search_author(name, affiliation).await {
            Ok(result) => return Ok(result),
            Err(e) => {
                let kind = FailureKind::classify_bibliographic(&e);
                if !kind.is_retryable() || attempt >= MAX_RETRIES {
                    warn!(attempt, error = %e, ?kind, "search_with_backoff giving up");
                    return Err(e);
                }
                attempt += 1;
                let jitter = rand::rng().random_range(0.0..0.2);
                let delay = Duration::from_secs_f64(0.6 * 2f64.powi(attempt as i32 - 1) + jitter);
                warn!(attempt, error = %e, ?kind, ?delay, "search_with_backoff retrying");
                tokio::time::sleep(delay).await;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct AlwaysFails;

    #[async_trait]
    impl BibliographicSource for AlwaysFails {
        async fn search_author(
            &self,
            _name: &str,
            _affiliation: Option<&str>,
        ) -> Result<(Option<String>, Vec<PaperCandidate>), BibliographicError> {
            Err(BibliographicError::RateLimited {
                retry_after: Duration::from_millis(1),
            })
        }
    }

    struct Succeeds;

    #[async_trait]
    impl BibliographicSource for Succeeds {
        async fn search_author(
            &self,
            _name: &str,
            _affiliation: Option<&str>,
        ) -> Result<(Option<String>, Vec<PaperCandidate>), BibliographicError> {
            Ok((Some("a1".to_string()), Vec::new()))
        }
    }

    #[tokio::test]
    async fn backoff_gives_up_after_max_retries() {
        let result = search_with_backoff(&AlwaysFails, "Jane Smith", None).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn backoff_fails_fast_on_non_retryable_kind() {
        let call_count = std::sync::atomic::AtomicUsize::new(0);
        struct Counting<'a>(&'a std::sync::atomic::AtomicUsize);

        #[async_trait]
        impl BibliographicSource for Counting<'_> {
            async fn search_author(
                &self,
                _name: &str,
                _affiliation: Option<&str>,
            ) -> Result<(Option<String>, Vec<PaperCandidate>), BibliographicError> {
                self.0.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
                let decode_err = serde_json::from_str::<serde_json::Value>("{not json")
                    .expect_err("deliberately malformed");
                Err(BibliographicError::Decode(decode_err))
            }
        }

        let result = search_with_backoff(&Counting(&call_count), "Jane Smith", None).await;
        assert!(result.is_err());
        assert_eq!(call_count.load(std::sync::atomic::Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn backoff_returns_first_success() {
        let (author_id, papers) = search_with_backoff(&Succeeds, "Jane Smith", None)
            .await
            .unwrap();
        assert_eq!(author_id.as_deref(), Some("a1"));
        assert!(papers.is_empty());
    }
}
