//! HTTP Client (C1): rate-limited fetch with a persistent session.
//!
//! Grounded on the source scraper's `_fetch` (session headers, pre-request
//! sleep, 15s timeout, never raises) and the teacher's lock-free
//! [`crate::rate_limiter::CrawlRateLimiter`], reused verbatim for per-domain
//! pacing.

use crate::error::HttpError;
use crate::rate_limiter::{CrawlRateLimiter, RateLimitDecision};
use crate::utils::CHROME_USER_AGENT;
use std::time::Duration;
use tracing::{debug, warn};

/// Session-scoped HTTP client. Holds the only mutable state (cookies) shared
/// across a single Harvester run.
pub struct HttpClient {
    client: reqwest::Client,
    rate_limiter: CrawlRateLimiter,
    rate_rps: f64,
    timeout: Duration,
}

impl HttpClient {
    /// Build a client with browser-like headers and a shared cookie jar.
    pub fn new(rate_limit_delay: Duration, timeout: Duration) -> anyhow::Result<Self> {
        let rate_rps = if rate_limit_delay.is_zero() {
            0.0
        } else {
            1.0 / rate_limit_delay.as_secs_f64()
        };

        let client = reqwest::Client::builder()
            .cookie_store(true)
            .user_agent(CHROME_USER_AGENT)
            .timeout(timeout)
            .build()?;

        Ok(Self {
            client,
            rate_limiter: CrawlRateLimiter::new(),
            rate_rps,
            timeout,
        })
    }

    /// Fetch `url`, honoring the per-domain rate limit. Never returns an
    /// `Err` the caller must propagate as fatal — the Harvester treats every
    /// failure here as a signal to fall through to the next strategy.
    pub async fn fetch(&self, url: &str) -> Result<String, HttpError> {
        if let RateLimitDecision::Deny { retry_after } =
            self.rate_limiter.check(url, self.rate_rps).await
        {
            tokio::time::sleep(retry_after).await;
        }

        debug!(url, "fetching");
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|source| {
                if source.is_timeout() {
                    HttpError::Timeout {
                        url: url.to_string(),
                    }
                } else {
                    HttpError::Transport {
                        url: url.to_string(),
                        source,
                    }
                }
            })?;

        let status = response.status();
        if status.as_u16() == 429 {
            let retry_after = response
                .headers()
                .get("Retry-After")
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.parse::<u64>().ok())
                .map(Duration::from_secs)
                .unwrap_or(Duration::from_secs(10));
            return Err(HttpError::RateLimited { retry_after });
        }
        if !status.is_success() {
            return Err(HttpError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        response.text().await.map_err(|source| HttpError::Transport {
            url: url.to_string(),
            source,
        })
    }

    /// POST with the Drupal-AJAX-flavored headers required by the CMS protocol.
    pub async fn post_form(
        &self,
        url: &str,
        referer: &str,
        form: &[(String, String)],
    ) -> Result<reqwest::Response, HttpError> {
        if let RateLimitDecision::Deny { retry_after } =
            self.rate_limiter.check(url, self.rate_rps).await
        {
            tokio::time::sleep(retry_after).await;
        }

        self.client
            .post(url)
            .header("X-Requested-With", "XMLHttpRequest")
            .header("Referer", referer)
            .header("Accept", "application/json, text/javascript, */*; q=0.01")
            .header(
                "Content-Type",
                "application/x-www-form-urlencoded; charset=UTF-8",
            )
            .form(form)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|source| {
                warn!(url, error = %source, "AJAX post failed");
                HttpError::Transport {
                    url: url.to_string(),
                    source,
                }
            })
    }
}
