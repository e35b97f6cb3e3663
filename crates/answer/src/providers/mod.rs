//! External answer providers
//!
//! Two collaborators feed the pipeline:
//! - a web search provider returning ranked snippets for a query
//! - a structured answer engine returning one short answer, or none
//!
//! Calls go through [`call_with_retry`], which bounds every attempt with a
//! timeout and retries transient failures.

mod search;
mod structured;

pub use search::WebSearchClient;
pub use structured::{parse_primary_answer, StructuredEngineClient};

use crate::snippet::Snippet;
use async_trait::async_trait;
use std::future::Future;
use std::time::Duration;
use whoqa_common::errors::{AppError, Result};
use whoqa_common::metrics;

/// Ranked snippets for a text query
#[async_trait]
pub trait SearchProvider: Send + Sync {
    /// Snippets in the provider's relevance order
    async fn search(&self, query: &str) -> Result<Vec<Snippet>>;

    /// Provider name for logs and metrics
    fn name(&self) -> &str {
        "search"
    }

    /// False for the stand-in used when no provider is configured
    fn is_enabled(&self) -> bool {
        true
    }
}

/// A single authoritative answer for a question
#[async_trait]
pub trait StructuredAnswerEngine: Send + Sync {
    /// `Ok(None)` means the engine has no answer, which is not an error
    async fn ask(&self, question: &str) -> Result<Option<String>>;

    fn name(&self) -> &str {
        "structured"
    }

    /// False for the stand-in used when no engine is configured. Outcomes
    /// of a disabled engine are never cached.
    fn is_enabled(&self) -> bool {
        true
    }
}

/// Stand-in used when no search provider is configured
pub struct DisabledSearch;

#[async_trait]
impl SearchProvider for DisabledSearch {
    async fn search(&self, _query: &str) -> Result<Vec<Snippet>> {
        Err(AppError::Configuration {
            message: "search.api_key is not set".to_string(),
        })
    }

    fn name(&self) -> &str {
        "disabled"
    }

    fn is_enabled(&self) -> bool {
        false
    }
}

/// Stand-in used when no structured engine is configured; never has an answer
pub struct DisabledEngine;

#[async_trait]
impl StructuredAnswerEngine for DisabledEngine {
    async fn ask(&self, _question: &str) -> Result<Option<String>> {
        Ok(None)
    }

    fn name(&self) -> &str {
        "disabled"
    }

    fn is_enabled(&self) -> bool {
        false
    }
}

/// Longest pause between two attempts
pub const MAX_RETRY_DELAY: Duration = Duration::from_secs(5);

/// Timeout and retry budget for one external call
#[derive(Debug, Clone, Copy)]
pub struct CallPolicy {
    pub timeout: Duration,
    pub max_retries: u32,
    pub retry_delay: Duration,
}

impl Default for CallPolicy {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(5),
            max_retries: 1,
            retry_delay: Duration::from_millis(100),
        }
    }
}

impl CallPolicy {
    pub fn new(timeout: Duration, max_retries: u32) -> Self {
        Self {
            timeout,
            max_retries,
            ..Self::default()
        }
    }

    /// Pause before retry number `retry` (1-based): exponential, capped at
    /// [`MAX_RETRY_DELAY`]
    pub fn backoff(&self, retry: u32) -> Duration {
        let factor = 2_u32.saturating_pow(retry.saturating_sub(1));
        self.retry_delay.saturating_mul(factor).min(MAX_RETRY_DELAY)
    }
}

/// Run `call` under `policy`, retrying timeouts and transport failures
pub async fn call_with_retry<T, F, Fut>(service: &str, policy: CallPolicy, mut call: F) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let attempts = policy.max_retries.saturating_add(1);
    let mut attempt = 0;

    loop {
        if attempt > 0 {
            tokio::time::sleep(policy.backoff(attempt)).await;
        }
        attempt += 1;

        let outcome = match tokio::time::timeout(policy.timeout, call()).await {
            Ok(outcome) => outcome,
            Err(_) => Err(AppError::Timeout {
                service: service.to_string(),
                timeout_ms: policy.timeout.as_millis() as u64,
            }),
        };
        metrics::record_provider_call(service, outcome.is_ok());

        match outcome {
            Ok(value) => return Ok(value),
            Err(e) if e.is_retryable() && attempt < attempts => {
                tracing::warn!(
                    service,
                    attempt,
                    max_attempts = attempts,
                    error = %e,
                    "Provider call failed, retrying"
                );
            }
            Err(e) => return Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn fast_policy(max_retries: u32) -> CallPolicy {
        CallPolicy {
            timeout: Duration::from_millis(50),
            max_retries,
            retry_delay: Duration::from_millis(1),
        }
    }

    #[test]
    fn test_backoff_doubles_then_caps() {
        let policy = CallPolicy::default();
        assert_eq!(policy.backoff(1), Duration::from_millis(100));
        assert_eq!(policy.backoff(2), Duration::from_millis(200));
        assert_eq!(policy.backoff(4), Duration::from_millis(800));
        assert_eq!(policy.backoff(10), MAX_RETRY_DELAY);
        assert_eq!(policy.backoff(40), MAX_RETRY_DELAY);
        assert_eq!(policy.backoff(u32::MAX), MAX_RETRY_DELAY);
    }

    #[tokio::test]
    async fn test_disabled_stand_ins() {
        assert!(!DisabledEngine.is_enabled());
        assert_eq!(DisabledEngine.ask("Who wrote the Iliad?").await.unwrap(), None);

        assert!(!DisabledSearch.is_enabled());
        assert!(matches!(
            DisabledSearch.search("the iliad").await,
            Err(AppError::Configuration { .. })
        ));
    }

    #[tokio::test]
    async fn test_retries_once_then_succeeds() {
        let counter = AtomicUsize::new(0);
        let calls = &counter;
        let value = call_with_retry("search", fast_policy(1), move || async move {
            if calls.fetch_add(1, Ordering::SeqCst) == 0 {
                Err(AppError::Retrieval {
                    service: "search".into(),
                    message: "connection reset".into(),
                })
            } else {
                Ok(7)
            }
        })
        .await
        .unwrap();

        assert_eq!(value, 7);
        assert_eq!(counter.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_timeout_is_reported_after_retries() {
        let counter = AtomicUsize::new(0);
        let calls = &counter;
        let err = call_with_retry("structured", fast_policy(1), move || async move {
            calls.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(500)).await;
            Ok::<_, AppError>(())
        })
        .await
        .unwrap_err();

        assert!(matches!(err, AppError::Timeout { timeout_ms: 50, .. }));
        assert_eq!(counter.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_non_retryable_errors_fail_immediately() {
        let counter = AtomicUsize::new(0);
        let calls = &counter;
        let err = call_with_retry("search", fast_policy(3), move || async move {
            calls.fetch_add(1, Ordering::SeqCst);
            Err::<(), _>(AppError::InvalidQuestion { token_count: 0 })
        })
        .await
        .unwrap_err();

        assert!(matches!(err, AppError::InvalidQuestion { .. }));
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }
}
