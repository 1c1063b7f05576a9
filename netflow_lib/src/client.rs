//! Retrying wrapper around the site client that returns parsed rows.

use std::time::Duration;

use chrono::NaiveDate;
use ebrokerdj_api::types::{BrokerFlowRow, TrustRankRow};
use ebrokerdj_api::{BrokerFlowQuery, Client, Query, TrustRankQuery};
use rand::Rng;
use url::Url;

use crate::error::NetflowError;
use crate::scrape;

/// Backoff settings for page fetches.
///
/// `max_retries` counts retries after the first attempt, so the default of 2
/// allows three attempts in total.
#[derive(Clone, Debug, PartialEq)]
pub struct RetryConfig {
    pub max_retries: usize,
    pub base_delay_ms: u64,
    pub max_delay_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 2,
            base_delay_ms: 1000,
            max_delay_ms: 30000,
        }
    }
}

impl RetryConfig {
    /// Reads `NETFLOW_RETRY_MAX`, `NETFLOW_RETRY_BASE_MS` and
    /// `NETFLOW_RETRY_MAX_MS`, falling back to the defaults.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            max_retries: env_usize("NETFLOW_RETRY_MAX", defaults.max_retries),
            base_delay_ms: env_u64("NETFLOW_RETRY_BASE_MS", defaults.base_delay_ms),
            max_delay_ms: env_u64("NETFLOW_RETRY_MAX_MS", defaults.max_delay_ms),
        }
    }

    fn delay_for_attempt(&self, attempt: usize) -> Duration {
        let shift = (attempt.saturating_sub(1)).min(30) as u32;
        let exp = 1u64 << shift;
        let base = self
            .base_delay_ms
            .saturating_mul(exp)
            .min(self.max_delay_ms);
        let jitter = rand::thread_rng().gen_range(0.8..1.2);
        Duration::from_millis((base as f64 * jitter) as u64)
    }
}

/// Site client that retries transient failures and parses pages into rows.
pub struct FlowClient {
    inner: Client,
    retry: RetryConfig,
}

impl Default for FlowClient {
    fn default() -> Self {
        Self::new()
    }
}

impl FlowClient {
    /// Creates a client for the production site, with retry settings from the environment.
    pub fn new() -> Self {
        Self {
            inner: Client::new(),
            retry: RetryConfig::from_env(),
        }
    }

    /// Creates a client with a custom base URL. Used for testing.
    pub fn with_base_url(base_url: &str) -> Self {
        Self {
            inner: Client::with_base_url(base_url),
            retry: RetryConfig::from_env(),
        }
    }

    pub fn with_retry_config(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    pub fn base_url(&self) -> &str {
        self.inner.base_url()
    }

    async fn with_retry<T, F, Fut>(&self, label: &str, mut f: F) -> Result<T, NetflowError>
    where
        F: FnMut() -> Fut,
        Fut: std::future::Future<Output = Result<T, NetflowError>>,
    {
        let cfg = &self.retry;
        let mut attempt = 0usize;
        loop {
            match f().await {
                Ok(value) => return Ok(value),
                Err(err) => {
                    attempt += 1;
                    if attempt > cfg.max_retries || !is_retryable(&err) {
                        return Err(err);
                    }
                    let delay = cfg.delay_for_attempt(attempt);
                    tracing::warn!(
                        "{} request failed (attempt {}/{}), retrying in {:.1}s",
                        label,
                        attempt,
                        cfg.max_retries,
                        delay.as_secs_f64()
                    );
                    tokio::time::sleep(delay).await;
                }
            }
        }
    }

    /// Fetches and decodes any page of the site.
    pub async fn fetch_html(&self, url: &Url) -> Result<String, NetflowError> {
        self.with_retry("page", || async { Ok(self.inner.fetch(url).await?) })
            .await
    }

    /// Fetches an investment-trust ranking page and parses its rows.
    ///
    /// `today` is the Taipei calendar date used to complete `MM/DD` labels.
    pub async fn trust_rank(
        &self,
        query: &TrustRankQuery,
        today: NaiveDate,
    ) -> Result<Vec<TrustRankRow>, NetflowError> {
        let html = self
            .with_retry("trust ranking", || async {
                Ok(self.inner.get_trust_rank_page(query).await?)
            })
            .await?;
        let rows = scrape::parse_trust_rank_page(&html, today);
        tracing::debug!("Trust ranking ({} day): {} rows", query.day(), rows.len());
        Ok(rows)
    }

    /// Fetches a broker branch flow page and parses its rows.
    pub async fn broker_flow(
        &self,
        query: &BrokerFlowQuery,
    ) -> Result<Vec<BrokerFlowRow>, NetflowError> {
        let html = self
            .with_retry("broker flow", || async {
                Ok(self.inner.get_broker_flow_page(query).await?)
            })
            .await?;
        let rows = scrape::parse_broker_flow_page(&html);
        tracing::debug!("Broker flow ({} day): {} rows", query.day(), rows.len());
        Ok(rows)
    }
}

/// Network errors and non-2xx responses are worth another attempt. A body
/// that cannot be decoded will not improve on retry.
fn is_retryable(err: &NetflowError) -> bool {
    match err {
        NetflowError::Fetch(api_err) => match api_err {
            ebrokerdj_api::Error::RequestFailed => true,
            ebrokerdj_api::Error::HttpStatus { .. } => true,
            ebrokerdj_api::Error::Decode(_) => false,
        },
        _ => false,
    }
}

fn env_u64(key: &str, default: u64) -> u64 {
    std::env::var(key)
        .ok()
        .and_then(|val| val.parse::<u64>().ok())
        .unwrap_or(default)
}

fn env_usize(key: &str, default: usize) -> usize {
    std::env::var(key)
        .ok()
        .and_then(|val| val.parse::<usize>().ok())
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn delay_grows_and_caps() {
        let cfg = RetryConfig {
            max_retries: 5,
            base_delay_ms: 1000,
            max_delay_ms: 3000,
        };
        let first = cfg.delay_for_attempt(1).as_millis();
        assert!((800..=1200).contains(&first));
        let second = cfg.delay_for_attempt(2).as_millis();
        assert!((1600..=2400).contains(&second));
        let capped = cfg.delay_for_attempt(10).as_millis();
        assert!((2400..=3600).contains(&capped));
    }

    #[test]
    fn default_allows_three_attempts() {
        assert_eq!(RetryConfig::default().max_retries, 2);
    }

    #[test]
    fn retryable_errors() {
        assert!(is_retryable(&NetflowError::Fetch(ebrokerdj_api::Error::RequestFailed)));
        assert!(is_retryable(&NetflowError::Fetch(ebrokerdj_api::Error::HttpStatus {
            status: 404,
            body: String::new(),
        })));
        assert!(!is_retryable(&NetflowError::Fetch(ebrokerdj_api::Error::Decode(
            "empty response body".into()
        ))));
        assert!(!is_retryable(&NetflowError::InvalidInput("x".into())));
    }
}
