use crate::config::ScraperConfig;
use anyhow::Context;
use serde_json::Value;
use std::time::Duration;
use thiserror::Error;
use tokio_retry::strategy::{jitter, ExponentialBackoff};
use tokio_retry::RetryIf;
use tracing::{debug, warn};

/// Fetch failure taxonomy. Transient failures are retried with backoff;
/// everything else fails the identifier immediately.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("HTTP {0}")]
    Status(u16),

    #[error("rate limited (HTTP {0})")]
    RateLimited(u16),

    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("malformed response body: {0}")]
    Body(#[source] serde_json::Error),
}

impl FetchError {
    /// Rate limits, server errors and transport hiccups are worth another
    /// attempt. Other 4xx and unparseable bodies are not.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::RateLimited(_) | Self::Transport(_) => true,
            Self::Status(code) => (500..600).contains(code),
            Self::Body(_) => false,
        }
    }
}

pub struct HttpClient {
    inner: reqwest::Client,
    config: ScraperConfig,
}

impl HttpClient {
    pub fn new(config: &ScraperConfig) -> anyhow::Result<Self> {
        let inner = reqwest::Client::builder()
            .user_agent(&config.user_agent)
            .timeout(Duration::from_secs(config.timeout_secs))
            .gzip(true)
            .cookie_store(true)
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            inner,
            config: config.clone(),
        })
    }

    /// GET a URL and parse the body as JSON, retrying transient failures with
    /// jittered exponential backoff. Surfaces the last error once the retry
    /// budget is exhausted.
    pub async fn get_json(&self, url: &str) -> Result<Value, FetchError> {
        let strategy = ExponentialBackoff::from_millis(2)
            .factor(self.config.retry_base_ms)
            .map(jitter)
            .take(self.config.max_retries as usize);

        let mut attempt = 0u32;
        RetryIf::spawn(
            strategy,
            || {
                attempt += 1;
                self.fetch_once(url, attempt)
            },
            FetchError::is_retryable,
        )
        .await
    }

    async fn fetch_once(&self, url: &str, attempt: u32) -> Result<Value, FetchError> {
        debug!("GET {} (attempt {})", url, attempt);

        let resp = self.inner.get(url).send().await?;
        let status = resp.status().as_u16();

        if status == 429 || status == 503 {
            warn!("Rate limited ({}) on attempt {}", status, attempt);
            return Err(FetchError::RateLimited(status));
        }
        if !(200..300).contains(&status) {
            return Err(FetchError::Status(status));
        }

        let body = resp.text().await?;
        serde_json::from_str(&body).map_err(FetchError::Body)
    }
}
