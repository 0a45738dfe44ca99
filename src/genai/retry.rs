//! Retry and status classification for text generation attempts.
//!
//! A quota response (429) burns the current key for the rest of the call, an
//! overload response (503) is retried on the same key after a linear delay,
//! and anything else is an ordinary attempt failure.

use std::time::Duration;

use super::text::TextError;

/// Maximum attempts made with one credential before moving to the next.
pub const MAX_ATTEMPTS_PER_CREDENTIAL: u32 = 2;

/// Base delay before retrying an overloaded credential (2 seconds).
pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_millis(2000);

/// HTTP status code for an exhausted quota.
pub const HTTP_STATUS_TOO_MANY_REQUESTS: u16 = 429;

/// HTTP status code for an overloaded upstream.
pub const HTTP_STATUS_SERVICE_UNAVAILABLE: u16 = 503;

/// Delay before in-place retry number `attempt` (1-based): `base × attempt`.
pub fn overload_delay(attempt: u32, base: Duration) -> Duration {
    base.saturating_mul(attempt.max(1))
}

/// Map a non-success HTTP status to the matching attempt error.
pub fn classify_status(status: u16, message: String) -> TextError {
    match status {
        HTTP_STATUS_TOO_MANY_REQUESTS => TextError::QuotaExceeded { message },
        HTTP_STATUS_SERVICE_UNAVAILABLE => TextError::TransientOverload { message },
        _ => TextError::ApiError { status, message },
    }
}

/// Pull a human readable message out of an error body.
///
/// Both providers wrap failures as `{"error": {"message": "..."}}`; anything
/// else falls back to a message naming the status.
pub fn error_message(status: u16, body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|value| {
            value
                .pointer("/error/message")
                .and_then(|m| m.as_str())
                .map(str::to_string)
        })
        .unwrap_or_else(|| format!("HTTP error! status: {}", status))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_overload_delay_scales_with_attempt() {
        assert_eq!(overload_delay(1, DEFAULT_RETRY_DELAY), Duration::from_millis(2000));
        assert_eq!(overload_delay(2, DEFAULT_RETRY_DELAY), Duration::from_millis(4000));
    }

    #[test]
    fn test_overload_delay_never_zero_for_attempt_zero() {
        assert_eq!(overload_delay(0, DEFAULT_RETRY_DELAY), DEFAULT_RETRY_DELAY);
    }

    #[test]
    fn test_classify_429_as_quota() {
        let err = classify_status(429, "quota".to_string());
        assert!(matches!(err, TextError::QuotaExceeded { .. }));
    }

    #[test]
    fn test_classify_503_as_overload() {
        let err = classify_status(503, "busy".to_string());
        assert!(matches!(err, TextError::TransientOverload { .. }));
    }

    #[test]
    fn test_classify_other_status_as_api_error() {
        match classify_status(400, "bad".to_string()) {
            TextError::ApiError { status, message } => {
                assert_eq!(status, 400);
                assert_eq!(message, "bad");
            }
            other => panic!("Expected ApiError, got {:?}", other),
        }
    }

    #[test]
    fn test_error_message_reads_nested_message() {
        let body = r#"{"error":{"code":429,"message":"Resource has been exhausted"}}"#;
        assert_eq!(error_message(429, body), "Resource has been exhausted");
    }

    #[test]
    fn test_error_message_falls_back_to_status() {
        assert_eq!(error_message(500, "<html>oops</html>"), "HTTP error! status: 500");
    }

    #[test]
    fn test_max_attempts_per_credential_is_two() {
        assert_eq!(MAX_ATTEMPTS_PER_CREDENTIAL, 2);
    }
}
