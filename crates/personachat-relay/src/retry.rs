use std::time::Duration;

use reqwest::Response;

use crate::error::RelayError;

/// Backoff configuration for the non-streaming completion path.
///
/// The streaming relay does not retry; a broken stream surfaces to the
/// caller as an errored body.
#[derive(Debug, Clone)]
pub struct RetryConfig {
    pub max_retries: u32,
    pub initial_delay_ms: u64,
    pub max_delay_ms: u64,
    pub backoff_multiplier: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            initial_delay_ms: 200,
            max_delay_ms: 5_000,
            backoff_multiplier: 2.0,
        }
    }
}

impl RetryConfig {
    pub fn delay_for(&self, attempt: u32, retry_after_secs: Option<u64>) -> Duration {
        if let Some(seconds) = retry_after_secs {
            return Duration::from_secs(seconds);
        }

        let multiplier = self
            .backoff_multiplier
            .powi(attempt.saturating_sub(1) as i32);
        let delay = (self.initial_delay_ms as f64 * multiplier) as u64;
        Duration::from_millis(delay.min(self.max_delay_ms))
    }
}

pub fn parse_retry_after(response: &Response) -> Option<u64> {
    response
        .headers()
        .get("retry-after")
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.parse::<u64>().ok())
}

pub async fn response_to_error(response: Response, provider: &str) -> RelayError {
    let status = response.status().as_u16();
    let retry_after = parse_retry_after(&response);
    let body = response.text().await.unwrap_or_default();

    // Truncate error body to prevent leaking large or sensitive responses.
    const MAX_ERROR_BODY: usize = 512;
    let message = if body.len() > MAX_ERROR_BODY {
        format!(
            "{}... [truncated]",
            truncate_on_char_boundary(&body, MAX_ERROR_BODY)
        )
    } else {
        body
    };

    RelayError::Provider {
        provider: provider.to_string(),
        status,
        message,
        retry_after_secs: retry_after,
    }
}

/// Cut a string at `max` bytes, backing up to the nearest char boundary so a
/// multibyte character straddling the limit never splits.
fn truncate_on_char_boundary(s: &str, max: usize) -> &str {
    if s.len() <= max {
        return s;
    }
    let mut end = max;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    &s[..end]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_delay_progression() {
        let config = RetryConfig::default();
        assert_eq!(config.delay_for(1, None), Duration::from_millis(200));
        assert_eq!(config.delay_for(2, None), Duration::from_millis(400));
        assert_eq!(config.delay_for(3, None), Duration::from_millis(800));
        assert_eq!(config.delay_for(4, None), Duration::from_millis(1600));
        assert_eq!(config.delay_for(5, None), Duration::from_millis(3200));
        assert_eq!(config.delay_for(6, None), Duration::from_millis(5000));
    }

    #[test]
    fn test_retry_after_overrides_backoff() {
        let config = RetryConfig::default();
        assert_eq!(config.delay_for(3, Some(10)), Duration::from_secs(10));
    }

    #[test]
    fn test_provider_error_is_retryable() {
        let retryable = RelayError::Provider {
            provider: "Test".to_string(),
            status: 429,
            message: "rate limit".to_string(),
            retry_after_secs: None,
        };
        let non_retryable = RelayError::Provider {
            provider: "Test".to_string(),
            status: 401,
            message: "unauthorized".to_string(),
            retry_after_secs: None,
        };
        assert!(retryable.is_retryable());
        assert!(!non_retryable.is_retryable());
    }

    #[test]
    fn test_truncate_keeps_char_boundaries() {
        // 'é' starts at byte 511 and spans the 512-byte limit.
        let mut body = "a".repeat(511);
        body.push('é');
        body.push_str("tail");

        let truncated = truncate_on_char_boundary(&body, 512);
        assert_eq!(truncated.len(), 511);
        assert!(truncated.chars().all(|c| c == 'a'));

        // A boundary that falls between chars is kept as-is.
        let ascii = "a".repeat(600);
        assert_eq!(truncate_on_char_boundary(&ascii, 512).len(), 512);
        assert_eq!(truncate_on_char_boundary("short", 512), "short");
    }

    #[test]
    fn test_relay_error_string_fallback() {
        let retryable = RelayError::Relay("rate limit".to_string());
        let non_retryable = RelayError::Relay("bad request".to_string());
        assert!(retryable.is_retryable());
        assert!(!non_retryable.is_retryable());
    }
}
