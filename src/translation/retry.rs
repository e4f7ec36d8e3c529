/*!
 * Retry policy for provider lookups.
 *
 * Fixed retry count and fixed backoff. Timeouts and unavailable providers
 * are always retried; rate limits only when the provider says how long to
 * wait and that wait is acceptable.
 */

use std::time::Duration;

use crate::app_config::TranslationConfig;
use crate::errors::ProviderError;

/// How failed lookups are retried
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Retries after the first attempt
    pub max_retries: u32,
    /// Wait between attempts
    pub backoff: Duration,
    /// Longest retry-after hint that is honored
    pub max_retry_after: Duration,
}

impl RetryPolicy {
    /// Create a policy
    pub fn new(max_retries: u32, backoff: Duration, max_retry_after: Duration) -> Self {
        Self {
            max_retries,
            backoff,
            max_retry_after,
        }
    }

    /// A policy that never retries
    pub fn none() -> Self {
        Self::new(0, Duration::ZERO, Duration::ZERO)
    }

    /// Build from the translation config section
    pub fn from_config(config: &TranslationConfig) -> Self {
        Self::new(
            config.retry_count,
            Duration::from_millis(config.retry_backoff_ms),
            Duration::from_secs(config.max_retry_after_secs),
        )
    }

    /// Wait before the next attempt, or `None` when the failure must be surfaced
    ///
    /// `attempt` counts attempts already made, starting at 1.
    pub fn delay_for(&self, error: &ProviderError, attempt: u32) -> Option<Duration> {
        if attempt > self.max_retries {
            return None;
        }

        match error {
            ProviderError::Timeout(_) | ProviderError::Unavailable(_) => Some(self.backoff),
            ProviderError::RateLimited { .. } => error
                .retry_after()
                .filter(|hint| *hint <= self.max_retry_after)
                .map(|hint| hint.max(self.backoff)),
            ProviderError::InvalidRequest(_) | ProviderError::ParseError(_) => None,
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from_config(&TranslationConfig::default())
    }
}
