//! The Fetcher: polite HTTP GET with browser-like headers, retry-with-backoff
//! on 5xx, and content-type gating. Every outcome — success or failure — is
//! reported through [`crate::metrics::Metrics`].

use std::time::{Duration, Instant};

use rand::Rng;
use reqwest::{Client, StatusCode};

use crate::config::Config;
use crate::error::{PageError, PageErrorKind};
use crate::metrics::Metrics;

const ACCEPT_LANGUAGE: &str = "sv-SE,sv;q=0.9,en;q=0.8";
const RETRY_BASE_DELAY_MS: u64 = 1000;
const RETRY_MAX_DELAY_MS: u64 = 8000;
const RETRY_JITTER_MS: u64 = 1000;

/// A successfully fetched HTML page.
pub struct FetchedPage {
    pub url: String,
    pub body: String,
    pub final_url: String,
}

/// Builds the shared `reqwest::Client` used for every fetch, configured with
/// the crawler's bot identity and default timeout.
pub fn build_client(config: &Config) -> reqwest::Result<Client> {
    Client::builder()
        .user_agent(config.bot_name.clone())
        .timeout(config.request_timeout)
        .gzip(true)
        .build()
}

pub struct Fetcher {
    client: Client,
    max_retries: u32,
    metrics: Metrics,
}

impl Fetcher {
    pub fn new(client: Client, max_retries: u32, metrics: Metrics) -> Self {
        Self {
            client,
            max_retries,
            metrics,
        }
    }

    /// Fetches `url`, retrying transient (5xx, connect/timeout) failures with
    /// exponential backoff plus jitter. Never panics; every terminal outcome
    /// is a typed [`PageError`].
    #[tracing::instrument(skip(self), fields(url = %url))]
    pub async fn fetch(&self, url: &str) -> Result<FetchedPage, PageError> {
        let started = Instant::now();
        let host = reqwest::Url::parse(url)
            .ok()
            .and_then(|u| u.host_str().map(str::to_string))
            .unwrap_or_default();

        let mut attempt = 0;
        loop {
            let outcome = self.try_once(url).await;

            match outcome {
                Ok(page) => {
                    self.metrics.record_request("success", &host, started.elapsed());
                    return Ok(page);
                }
                Err(error) if error.kind == PageErrorKind::FetchError && attempt < self.max_retries => {
                    let delay = backoff_delay(attempt);
                    attempt += 1;
                    tracing::debug!(attempt, delay_ms = delay.as_millis() as u64, "retrying fetch");
                    tokio::time::sleep(delay).await;
                    continue;
                }
                Err(error) => {
                    self.metrics
                        .record_request(error.kind.metric_status(), &host, started.elapsed());
                    return Err(error);
                }
            }
        }
    }

    async fn try_once(&self, url: &str) -> Result<FetchedPage, PageError> {
        let response = self
            .client
            .get(url)
            .header("Accept-Language", ACCEPT_LANGUAGE)
            .header("Sec-Fetch-Dest", "document")
            .header("Sec-Fetch-Mode", "navigate")
            .header("Sec-Fetch-Site", "none")
            .send()
            .await
            .map_err(|error| {
                if error.is_timeout() {
                    PageError::new(url, PageErrorKind::Timeout, error.to_string())
                } else {
                    PageError::new(url, PageErrorKind::FetchError, error.to_string())
                }
            })?;

        let final_url = response.url().to_string();
        let status = response.status();

        match status {
            StatusCode::FORBIDDEN | StatusCode::TOO_MANY_REQUESTS => {
                return Err(PageError::new(
                    url,
                    PageErrorKind::Blocked,
                    format!("http {status}"),
                ));
            }
            StatusCode::NOT_FOUND => {
                return Err(PageError::new(
                    url,
                    PageErrorKind::NotFound,
                    format!("http {status}"),
                ));
            }
            s if s.is_server_error() => {
                return Err(PageError::new(
                    url,
                    PageErrorKind::FetchError,
                    format!("http {status}"),
                ));
            }
            s if !s.is_success() => {
                return Err(PageError::new(
                    url,
                    PageErrorKind::FetchError,
                    format!("http {status}"),
                ));
            }
            _ => {}
        }

        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("")
            .to_string();

        if !content_type.contains("text/html") {
            return Err(PageError::new(
                url,
                PageErrorKind::NonHtml,
                format!("content-type: {content_type}"),
            ));
        }

        let body = response
            .text()
            .await
            .map_err(|error| PageError::new(url, PageErrorKind::FetchError, error.to_string()))?;

        Ok(FetchedPage {
            url: url.to_string(),
            body,
            final_url,
        })
    }
}

fn backoff_delay(attempt: u32) -> Duration {
    let base = RETRY_BASE_DELAY_MS.saturating_mul(1u64 << attempt.min(16));
    let capped = base.min(RETRY_MAX_DELAY_MS);
    let jitter = rand::thread_rng().gen_range(0..=RETRY_JITTER_MS);
    Duration::from_millis(capped + jitter)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backoff_delay_starts_at_base_for_first_retry() {
        // The first retry is `attempt=0`: base delay, no doubling yet.
        let d0 = backoff_delay(0).as_millis();
        assert!(d0 >= RETRY_BASE_DELAY_MS as u128);
        assert!(d0 <= (RETRY_BASE_DELAY_MS + RETRY_JITTER_MS) as u128);
    }

    #[test]
    fn backoff_delay_is_capped_and_increasing_until_cap() {
        let d1 = backoff_delay(1).as_millis();
        let d2 = backoff_delay(2).as_millis();
        assert!(d1 >= RETRY_BASE_DELAY_MS as u128 * 2);
        assert!(d2 <= (RETRY_MAX_DELAY_MS + RETRY_JITTER_MS) as u128);
    }

    #[test]
    fn backoff_delay_never_exceeds_cap_plus_jitter() {
        for attempt in 1..10 {
            let delay = backoff_delay(attempt).as_millis();
            assert!(delay <= (RETRY_MAX_DELAY_MS + RETRY_JITTER_MS) as u128);
        }
    }
}
