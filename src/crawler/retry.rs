//! Bounded retry with exponential backoff
//!
//! | Outcome of an attempt | Action |
//! |-----------------------|--------|
//! | `Success` | Return it |
//! | `FatalFailure` | Return it, no retry |
//! | `RetryableFailure`, attempts left | Back off, try again |
//! | `RetryableFailure`, cap reached | Escalate to `FatalFailure(Exhausted)` |

use crate::config::FetcherConfig;
use crate::crawler::fetcher::PageFetcher;
use crate::crawler::throttle::Clock;
use crate::state::{FailureKind, PageFetchResult};
use std::time::Duration;
use url::Url;

/// How often and how patiently a page is retried
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Attempts per page including the first; at least 1
    pub max_attempts: u32,

    /// Delay after the first failed attempt
    pub base_delay: Duration,

    /// Cap for any single delay
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(30),
        }
    }
}

impl RetryPolicy {
    pub fn from_config(config: &FetcherConfig) -> Self {
        Self {
            max_attempts: config.max_attempts.max(1),
            base_delay: Duration::from_millis(config.backoff_base_ms),
            max_delay: Duration::from_millis(config.backoff_max_ms),
        }
    }

    /// Delay after the `failed_attempt`-th failure: `base * 2^(n-1)`, capped
    pub fn backoff(&self, failed_attempt: u32) -> Duration {
        let exponent = failed_attempt.saturating_sub(1).min(31);
        self.base_delay
            .saturating_mul(1u32 << exponent)
            .min(self.max_delay)
    }
}

/// Final result of fetching one page, with the number of attempts it took
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchOutcome {
    /// Never `RetryableFailure`
    pub result: PageFetchResult,
    pub attempts: u32,
}

/// Fetches `url`, retrying transient failures according to `policy`
pub async fn fetch_with_retry(
    fetcher: &dyn PageFetcher,
    url: &Url,
    policy: &RetryPolicy,
    clock: &dyn Clock,
) -> FetchOutcome {
    let max_attempts = policy.max_attempts.max(1);
    let mut attempts = 0;

    loop {
        attempts += 1;

        match fetcher.fetch(url).await {
            PageFetchResult::RetryableFailure(reason) => {
                if attempts >= max_attempts {
                    tracing::warn!(
                        "Giving up on {} after {} attempts: {}",
                        url,
                        attempts,
                        reason
                    );
                    return FetchOutcome {
                        result: PageFetchResult::fatal(
                            FailureKind::Exhausted,
                            format!("gave up after {} attempts: {}", attempts, reason),
                        ),
                        attempts,
                    };
                }

                let delay = policy.backoff(attempts);
                tracing::debug!(
                    "Attempt {}/{} for {} failed ({}), retrying in {:?}",
                    attempts,
                    max_attempts,
                    url,
                    reason,
                    delay
                );
                clock.sleep(delay).await;
            }
            result => return FetchOutcome { result, attempts },
        }
    }
}
