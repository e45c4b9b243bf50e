//! HTTP fetcher with bounded exponential-backoff retry
//!
//! This module handles all HTTP requests for the sync, including:
//! - Building the HTTP client with a proper user agent string
//! - Classifying transport errors and non-2xx responses as retryable failures
//! - Retrying with a doubling delay and giving up with `FetchExhausted`

use crate::config::{Config, FetchConfig, UserAgentConfig};
use crate::SyncError;
use reqwest::{Client, Response};
use std::future::Future;
use std::time::Duration;
use thiserror::Error;

/// Why a single fetch attempt failed
#[derive(Debug, Error)]
pub enum FetchFailure {
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("HTTP {status} {reason}")]
    Status { status: u16, reason: String },
}

/// Builds an HTTP client with proper configuration
///
/// # Example
///
/// ```no_run
/// use lingbuzz_sync::config::UserAgentConfig;
/// use lingbuzz_sync::sync::build_http_client;
/// use std::time::Duration;
///
/// let config = UserAgentConfig {
///     crawler_name: "lingbuzz-sync".to_string(),
///     crawler_version: "0.1".to_string(),
///     contact_url: "https://example.com/about".to_string(),
///     contact_email: "admin@example.com".to_string(),
/// };
///
/// let client = build_http_client(&config, Duration::from_secs(30)).unwrap();
/// ```
pub fn build_http_client(
    config: &UserAgentConfig,
    timeout: Duration,
) -> Result<Client, reqwest::Error> {
    // Format: CrawlerName/Version (+ContactURL; ContactEmail)
    let user_agent = format!(
        "{}/{} (+{}; {})",
        config.crawler_name, config.crawler_version, config.contact_url, config.contact_email
    );

    Client::builder()
        .user_agent(user_agent)
        .timeout(timeout)
        .connect_timeout(Duration::from_secs(10))
        .gzip(true)
        .brotli(true)
        .build()
}

/// How often and how patiently to retry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Retries after the initial attempt
    pub max_retries: u32,

    /// Delay before the first retry
    pub base_delay: Duration,
}

impl RetryPolicy {
    pub fn from_config(config: &FetchConfig) -> Self {
        Self {
            max_retries: config.max_retries,
            base_delay: Duration::from_millis(config.retry_base_delay_ms),
        }
    }

    /// Delay before the given 1-based retry: `base * 2^(retry - 1)`
    pub fn delay_for(&self, retry: u32) -> Duration {
        let factor = 2u32.saturating_pow(retry.saturating_sub(1));
        self.base_delay.saturating_mul(factor)
    }

    pub fn with_max_retries(self, max_retries: u32) -> Self {
        Self {
            max_retries,
            ..self
        }
    }
}

/// Runs `op` until it succeeds or the policy's retries are used up
///
/// Attempt 0 is the initial try; retry `n` waits `policy.delay_for(n)`
/// first. Delays carry no jitter.
pub async fn with_retry<T, F, Fut>(policy: RetryPolicy, url: &str, mut op: F) -> Result<T, SyncError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, FetchFailure>>,
{
    let mut retry = 0;
    loop {
        match op().await {
            Ok(value) => return Ok(value),
            Err(e) if retry < policy.max_retries => {
                retry += 1;
                let delay = policy.delay_for(retry);
                tracing::warn!(
                    url,
                    attempt = retry,
                    max_retries = policy.max_retries,
                    delay_ms = delay.as_millis() as u64,
                    error = %e,
                    "Fetch failed, retrying"
                );
                tokio::time::sleep(delay).await;
            }
            Err(e) => {
                return Err(SyncError::FetchExhausted {
                    url: url.to_string(),
                    attempts: retry + 1,
                    message: e.to_string(),
                })
            }
        }
    }
}

/// One GET; non-2xx responses count as failures
async fn attempt(client: &Client, url: &str) -> Result<Response, FetchFailure> {
    let response = client.get(url).send().await?;
    let status = response.status();

    if !status.is_success() {
        return Err(FetchFailure::Status {
            status: status.as_u16(),
            reason: status.canonical_reason().unwrap_or("Unknown").to_string(),
        });
    }

    Ok(response)
}

/// Retrying HTTP fetcher shared by every stage of a run
#[derive(Debug, Clone)]
pub struct Fetcher {
    client: Client,
    policy: RetryPolicy,
}

impl Fetcher {
    pub fn new(client: Client, policy: RetryPolicy) -> Self {
        Self { client, policy }
    }

    /// Builds the client and policy from configuration
    pub fn from_config(config: &Config) -> Result<Self, SyncError> {
        let client = build_http_client(
            &config.user_agent,
            Duration::from_secs(config.fetch.request_timeout_secs),
        )?;
        Ok(Self::new(client, RetryPolicy::from_config(&config.fetch)))
    }

    pub fn policy(&self) -> RetryPolicy {
        self.policy
    }

    /// GETs a URL, retrying transport errors and non-2xx statuses
    ///
    /// `max_retries` overrides the configured retry count for this call.
    pub async fn fetch(&self, url: &str, max_retries: Option<u32>) -> Result<Response, SyncError> {
        let policy = match max_retries {
            Some(n) => self.policy.with_max_retries(n),
            None => self.policy,
        };
        let client = &self.client;

        with_retry(policy, url, || attempt(client, url)).await
    }

    /// GETs a URL and reads the body as text
    ///
    /// A body that fails to download is retried like any transport error.
    pub async fn get_text(&self, url: &str) -> Result<String, SyncError> {
        let client = &self.client;

        with_retry(self.policy, url, || async move {
            let response = attempt(client, url).await?;
            Ok::<_, FetchFailure>(response.text().await?)
        })
        .await
    }
}
