//! Retry ceiling, backoff schedule and failure classification for the
//! upload loop.

use crate::errors::{ApiError, FailureClass};
use std::time::Duration;

/// Default number of consecutive idle round-trips tolerated.
pub const DEFAULT_MAX_IDLE_RETRIES: u32 = 10;

/// Default backoff unit; retry `n` waits `n² ×` this.
pub const DEFAULT_BACKOFF_UNIT: Duration = Duration::from_secs(3);

/// Parameters shared by every retry decision in one upload.
#[derive(Clone, Debug)]
pub struct RetryPolicy {
    pub max_idle_retries: u32,
    pub backoff_unit: Duration,
    /// Decides how each failed round-trip is treated.
    pub classifier: fn(&ApiError) -> FailureClass,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_IDLE_RETRIES, DEFAULT_BACKOFF_UNIT)
    }
}

impl RetryPolicy {
    pub fn new(max_idle_retries: u32, backoff_unit: Duration) -> Self {
        Self {
            max_idle_retries,
            backoff_unit,
            classifier: classify_api_error,
        }
    }

    pub fn classify(&self, err: &ApiError) -> FailureClass {
        (self.classifier)(err)
    }

    /// Delay before retry `attempt` (1-based): `attempt² × backoff_unit`.
    ///
    /// Growth is bounded by the idle ceiling, not by a cap here.
    pub fn delay(&self, attempt: u32) -> Duration {
        self.backoff_unit
            .saturating_mul(attempt.saturating_mul(attempt))
    }

    /// Whether `idle_count` consecutive idle round-trips end the upload.
    pub fn exhausted(&self, idle_count: u32) -> bool {
        idle_count > 0 && idle_count >= self.max_idle_retries
    }
}

/// Default classification of remote failures.
///
/// - 404 and 410 mean the session is gone.
/// - 403 (rate-limit flavoured), 408, 429 and the 5xx gateway family are transient.
/// - Connection failures are transient.
/// - Everything else is unclassified and treated as fatal by the engine.
pub fn classify_api_error(err: &ApiError) -> FailureClass {
    match err {
        ApiError::Status { status, .. } => match status {
            404 | 410 => FailureClass::SessionFatal,
            403 | 408 | 429 | 500 | 502 | 503 | 504 => FailureClass::Transient,
            _ => FailureClass::Unclassified,
        },
        ApiError::Connection(_) => FailureClass::Transient,
        ApiError::Decode(_) | ApiError::Protocol(_) => FailureClass::Unclassified,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backoff_is_quadratic_in_attempt() {
        let policy = RetryPolicy::new(5, Duration::from_secs(2));
        assert_eq!(policy.delay(1), Duration::from_secs(2));
        assert_eq!(policy.delay(2), Duration::from_secs(8));
        assert_eq!(policy.delay(3), Duration::from_secs(18));
    }

    #[test]
    fn ceiling_is_reached_at_max_idle_retries() {
        let policy = RetryPolicy::new(3, Duration::from_secs(1));
        assert!(!policy.exhausted(0));
        assert!(!policy.exhausted(2));
        assert!(policy.exhausted(3));
        assert!(policy.exhausted(4));
    }

    #[test]
    fn status_classification() {
        assert_eq!(
            classify_api_error(&ApiError::status(404, "")),
            FailureClass::SessionFatal
        );
        for status in [403, 429, 500, 502, 503, 504] {
            assert_eq!(
                classify_api_error(&ApiError::status(status, "")),
                FailureClass::Transient,
                "status {status}"
            );
        }
        assert_eq!(
            classify_api_error(&ApiError::status(400, "bad request")),
            FailureClass::Unclassified
        );
    }

    #[test]
    fn connection_errors_are_transient_and_decode_errors_are_not() {
        assert_eq!(
            classify_api_error(&ApiError::Connection("reset by peer".into())),
            FailureClass::Transient
        );
        assert_eq!(
            classify_api_error(&ApiError::Decode("eof".into())),
            FailureClass::Unclassified
        );
    }

    #[test]
    fn custom_classifier_is_used() {
        let policy = RetryPolicy {
            classifier: |_| FailureClass::Transient,
            ..RetryPolicy::default()
        };
        assert_eq!(
            policy.classify(&ApiError::status(404, "")),
            FailureClass::Transient
        );
    }
}
