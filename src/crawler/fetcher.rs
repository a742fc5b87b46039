//! HTTP fetcher with pacing and retry
//!
//! This module wraps a `Transport` with:
//! - A randomized pacing delay before every attempt
//! - A fixed per-request timeout
//! - Exponential backoff between failed attempts
//!
//! Failures never escape as errors; callers get a `FetchResult`.

use super::transport::{Transport, TransportError};
use crate::config::FetchConfig;
use rand::Rng;
use std::sync::Arc;
use std::time::Duration;

/// Retry and timing parameters for one fetcher
#[derive(Debug, Clone, Copy)]
pub struct FetchPolicy {
    /// Total attempts per URL
    pub max_retries: u32,
    /// Unit for pacing and backoff; zero disables both
    pub base_delay: Duration,
    /// Per-attempt timeout
    pub timeout: Duration,
}

impl FetchPolicy {
    pub fn from_config(config: &FetchConfig) -> Self {
        Self {
            max_retries: config.max_retries.max(1),
            base_delay: Duration::from_millis(config.base_retry_delay_ms),
            timeout: Duration::from_secs(config.timeout_secs),
        }
    }
}

impl Default for FetchPolicy {
    fn default() -> Self {
        Self::from_config(&FetchConfig::default())
    }
}

/// Result of a fetch operation
#[derive(Debug, Clone)]
pub enum FetchResult {
    /// A 2xx response was received
    Success {
        body: String,
        status_code: u16,
        /// Attempts used, 1-based
        attempts: u32,
    },

    /// Every attempt failed
    Failed {
        attempts: u32,
        /// Description of the last failure
        last_error: String,
    },
}

impl FetchResult {
    pub fn ok(&self) -> bool {
        matches!(self, Self::Success { .. })
    }

    /// `(body, ok)`; the body is empty on failure
    pub fn into_parts(self) -> (String, bool) {
        match self {
            Self::Success { body, .. } => (body, true),
            Self::Failed { .. } => (String::new(), false),
        }
    }
}

/// Random delay in `[base, 2.5 * base]` slept before each attempt
pub fn pacing_delay(base: Duration) -> Duration {
    let low = base.as_millis() as u64;
    if low == 0 {
        return Duration::ZERO;
    }
    let high = low.saturating_mul(5) / 2;
    Duration::from_millis(rand::rng().random_range(low..=high))
}

/// `2^attempt * base`, with `attempt` counted from 0
pub fn backoff_delay(base: Duration, attempt: u32) -> Duration {
    base.saturating_mul(1u32 << attempt.min(16))
}

/// Retrying GET over a shared transport
#[derive(Clone)]
pub struct Fetcher {
    transport: Arc<dyn Transport>,
    policy: FetchPolicy,
}

impl Fetcher {
    pub fn new(transport: Arc<dyn Transport>, policy: FetchPolicy) -> Self {
        Self { transport, policy }
    }

    /// Fetches a URL with pacing, timeout and retry
    ///
    /// # Retry Logic
    ///
    /// | Condition | Action |
    /// |-----------|--------|
    /// | HTTP 2xx | Success |
    /// | Other HTTP status | Retry after backoff |
    /// | Timeout | Retry after backoff |
    /// | Connection / transport error | Retry after backoff |
    /// | Attempts exhausted | Failed, body empty |
    pub async fn fetch(&self, url: &str) -> FetchResult {
        let max_attempts = self.policy.max_retries.max(1);
        let mut last_error = String::new();

        for attempt in 0..max_attempts {
            let pause = pacing_delay(self.policy.base_delay);
            if !pause.is_zero() {
                tokio::time::sleep(pause).await;
            }

            let outcome = match tokio::time::timeout(self.policy.timeout, self.transport.get(url))
                .await
            {
                Ok(result) => result,
                Err(_) => Err(TransportError::Timeout),
            };

            match outcome {
                Ok(response) if response.is_success() => {
                    tracing::debug!("Fetched {} (HTTP {})", url, response.status);
                    return FetchResult::Success {
                        body: response.body,
                        status_code: response.status,
                        attempts: attempt + 1,
                    };
                }
                Ok(response) => last_error = format!("HTTP {}", response.status),
                Err(e) => last_error = e.to_string(),
            }

            if attempt + 1 < max_attempts {
                let backoff = backoff_delay(self.policy.base_delay, attempt);
                tracing::warn!(
                    "Attempt {}/{} for {} failed: {}; retrying in {:?}",
                    attempt + 1,
                    max_attempts,
                    url,
                    last_error,
                    backoff
                );
                if !backoff.is_zero() {
                    tokio::time::sleep(backoff).await;
                }
            }
        }

        tracing::error!(
            "Giving up on {} after {} attempts: {}",
            url,
            max_attempts,
            last_error
        );
        FetchResult::Failed {
            attempts: max_attempts,
            last_error,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crawler::testing::{Scripted, ScriptedTransport};

    const URL: &str = "https://test.pl/page";

    fn fetcher(transport: Arc<ScriptedTransport>, max_retries: u32) -> Fetcher {
        Fetcher::new(
            transport,
            FetchPolicy {
                max_retries,
                base_delay: Duration::ZERO,
                timeout: Duration::from_millis(100),
            },
        )
    }

    #[test]
    fn test_pacing_delay_bounds() {
        let base = Duration::from_millis(200);
        for _ in 0..200 {
            let d = pacing_delay(base);
            assert!(d >= Duration::from_millis(200));
            assert!(d <= Duration::from_millis(500));
        }
        assert_eq!(pacing_delay(Duration::ZERO), Duration::ZERO);
    }

    #[test]
    fn test_backoff_doubles() {
        let base = Duration::from_millis(1000);
        assert_eq!(backoff_delay(base, 0), Duration::from_millis(1000));
        assert_eq!(backoff_delay(base, 1), Duration::from_millis(2000));
        assert_eq!(backoff_delay(base, 2), Duration::from_millis(4000));
    }

    #[test]
    fn test_policy_from_config() {
        let policy = FetchPolicy::default();
        assert_eq!(policy.max_retries, 3);
        assert_eq!(policy.base_delay, Duration::from_secs(1));
        assert_eq!(policy.timeout, Duration::from_secs(30));
    }

    #[tokio::test]
    async fn test_success_first_attempt() {
        let transport = Arc::new(ScriptedTransport::new().route(URL, vec![Scripted::ok("body")]));
        let result = fetcher(transport.clone(), 3).fetch(URL).await;

        assert!(result.ok());
        assert!(matches!(result, FetchResult::Success { attempts: 1, .. }));
        assert_eq!(result.into_parts(), ("body".to_string(), true));
        assert_eq!(transport.call_count(URL), 1);
    }

    #[tokio::test]
    async fn test_retries_until_success() {
        let transport = Arc::new(ScriptedTransport::new().route(
            URL,
            vec![Scripted::status(503), Scripted::ConnectionError, Scripted::ok("late")],
        ));
        let result = fetcher(transport.clone(), 3).fetch(URL).await;

        assert!(matches!(result, FetchResult::Success { attempts: 3, .. }));
        assert_eq!(transport.call_count(URL), 3);
    }

    #[tokio::test]
    async fn test_exhaustion_returns_empty_body() {
        let transport =
            Arc::new(ScriptedTransport::new().route(URL, vec![Scripted::status(500)]));
        let result = fetcher(transport.clone(), 3).fetch(URL).await;

        match &result {
            FetchResult::Failed { attempts, last_error } => {
                assert_eq!(*attempts, 3);
                assert_eq!(last_error, "HTTP 500");
            }
            other => panic!("expected failure, got {:?}", other),
        }
        assert_eq!(result.into_parts(), (String::new(), false));
        assert_eq!(transport.call_count(URL), 3);
    }

    #[tokio::test]
    async fn test_not_found_is_retried() {
        let transport = Arc::new(ScriptedTransport::new());
        let result = fetcher(transport.clone(), 2).fetch(URL).await;
        assert!(!result.ok());
        assert_eq!(transport.call_count(URL), 2);
    }

    #[tokio::test]
    async fn test_timeout_counts_as_failure() {
        let transport = Arc::new(ScriptedTransport::new().route(URL, vec![Scripted::Hang]));
        let result = fetcher(transport, 1).fetch(URL).await;

        match result {
            FetchResult::Failed { last_error, .. } => assert_eq!(last_error, "Request timed out"),
            other => panic!("expected timeout, got {:?}", other),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_paces_and_backs_off_between_attempts() {
        let base = Duration::from_millis(100);
        let transport = Arc::new(ScriptedTransport::new().route(URL, vec![Scripted::status(500)]));
        let fetcher = Fetcher::new(
            transport.clone(),
            FetchPolicy {
                max_retries: 3,
                base_delay: base,
                timeout: Duration::from_secs(5),
            },
        );

        let started = tokio::time::Instant::now();
        let result = fetcher.fetch(URL).await;
        let elapsed = started.elapsed();

        assert!(!result.ok());
        assert_eq!(transport.call_count(URL), 3);

        // Three pacing pauses plus backoff after the first two attempts only
        let backoff = base * (1 + 2);
        assert!(elapsed >= base * 3 + backoff, "elapsed {:?}", elapsed);
        assert!(elapsed <= base * 3 * 5 / 2 + backoff, "elapsed {:?}", elapsed);
    }
}
