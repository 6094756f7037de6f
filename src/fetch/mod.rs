//! HTTP fetching with retry, exponential backoff, and redirect resolution.
//!
//! The engine consumes exactly one external capability: fetch raw page
//! content for a URL, or fail. [`Fetch`] is that seam; [`HttpFetcher`] is
//! the reqwest-backed production implementation. Callers never see a
//! partial success: a URL either yields content or a [`FetchError`], and
//! every higher-level operation degrades to its documented empty shape on
//! the error branch.

mod user_agent;

pub use user_agent::{resolve_user_agent, BROWSER_USER_AGENTS};

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use tracing::{debug, warn};

use crate::config::FetchConfig;

/// Errors from the fetch boundary.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("HTTP status {status} for {url}")]
    Status { status: u16, url: String },

    #[error("retries exhausted after {attempts} attempts for {url}")]
    RetriesExhausted { attempts: u32, url: String },
}

/// Whether an HTTP status warrants another attempt.
pub fn is_retryable_status(status: u16) -> bool {
    matches!(status, 429 | 500 | 502 | 503)
}

/// Backoff delay before retrying after the given zero-based attempt:
/// `base * 2^attempt`.
pub fn backoff_delay(base: Duration, attempt: u32) -> Duration {
    base * 2u32.saturating_pow(attempt)
}

/// Page fetching capability consumed by the parsers.
#[async_trait]
pub trait Fetch: Send + Sync {
    /// Fetch a page body as text.
    async fn fetch_text(&self, url: &str) -> Result<String, FetchError>;

    /// Follow redirects and return the terminal URL without reading the
    /// body.
    async fn resolve_final_url(&self, url: &str) -> Result<String, FetchError>;
}

/// HTTP fetcher with a browser-like identity and bounded retries.
#[derive(Clone)]
pub struct HttpFetcher {
    client: Client,
    config: FetchConfig,
}

impl HttpFetcher {
    /// Create a fetcher from the given policy.
    pub fn new(config: FetchConfig) -> Self {
        let user_agent = resolve_user_agent(config.user_agent.as_deref());
        let client = Client::builder()
            .user_agent(user_agent)
            .timeout(Duration::from_secs(config.timeout_secs))
            .gzip(true)
            .brotli(true)
            .cookie_store(true)
            .build()
            .expect("Failed to create HTTP client");

        Self { client, config }
    }

    fn backoff_base(&self) -> Duration {
        Duration::from_millis(self.config.backoff_base_ms)
    }

    /// GET with retries on transient failures.
    ///
    /// Connection/timeout errors and {429, 500, 502, 503} are retried with
    /// doubling backoff up to `max_attempts`; any other non-2xx status
    /// terminates immediately.
    async fn get_with_retry(&self, url: &str) -> Result<reqwest::Response, FetchError> {
        let max_attempts = self.config.max_attempts.max(1);

        for attempt in 0..max_attempts {
            match self.client.get(url).send().await {
                Ok(response) => {
                    let status = response.status();
                    if status.is_success() {
                        if self.config.request_delay_ms > 0 {
                            tokio::time::sleep(Duration::from_millis(
                                self.config.request_delay_ms,
                            ))
                            .await;
                        }
                        return Ok(response);
                    }
                    if !is_retryable_status(status.as_u16()) {
                        return Err(FetchError::Status {
                            status: status.as_u16(),
                            url: url.to_string(),
                        });
                    }
                    debug!(
                        "Retryable status {} from {} (attempt {}/{})",
                        status,
                        url,
                        attempt + 1,
                        max_attempts
                    );
                }
                Err(err) => {
                    if !(err.is_timeout() || err.is_connect()) {
                        return Err(FetchError::Http(err));
                    }
                    debug!(
                        "Request error for {} (attempt {}/{}): {}",
                        url,
                        attempt + 1,
                        max_attempts,
                        err
                    );
                }
            }

            if attempt + 1 < max_attempts {
                let wait = backoff_delay(self.backoff_base(), attempt);
                warn!("Retrying {} in {:?}", url, wait);
                tokio::time::sleep(wait).await;
            }
        }

        Err(FetchError::RetriesExhausted {
            attempts: max_attempts,
            url: url.to_string(),
        })
    }
}

#[async_trait]
impl Fetch for HttpFetcher {
    async fn fetch_text(&self, url: &str) -> Result<String, FetchError> {
        let response = self.get_with_retry(url).await?;
        Ok(response.text().await?)
    }

    async fn resolve_final_url(&self, url: &str) -> Result<String, FetchError> {
        let response = self.get_with_retry(url).await?;
        Ok(response.url().to_string())
    }
}
