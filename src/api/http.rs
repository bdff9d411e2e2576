use super::types::ProviderError;
use rand::Rng;
use reqwest::StatusCode;
use std::time::Duration;
use tokio::time::sleep;
use tracing::debug;

/// Retry schedule for request sends: exponential backoff plus up to 25% jitter.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub max_retries: usize,
    pub base_delay: Duration,
}

const RETRY_JITTER_DIVISOR: u128 = 4;

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay: Duration::from_secs(1),
        }
    }
}

impl RetryPolicy {
    fn base_delay_for(&self, attempt: usize) -> Duration {
        let multiplier = 1u32.checked_shl(attempt as u32).unwrap_or(u32::MAX);
        self.base_delay.saturating_mul(multiplier)
    }
}

pub(crate) fn is_retriable_status(status: StatusCode) -> bool {
    matches!(
        status,
        StatusCode::REQUEST_TIMEOUT
            | StatusCode::TOO_MANY_REQUESTS
            | StatusCode::INTERNAL_SERVER_ERROR
            | StatusCode::BAD_GATEWAY
            | StatusCode::SERVICE_UNAVAILABLE
            | StatusCode::GATEWAY_TIMEOUT
    )
}

fn is_retriable_send_error(err: &reqwest::Error) -> bool {
    err.is_timeout() || err.is_connect() || err.is_body()
}

fn add_jitter(delay: Duration) -> Duration {
    let max_jitter_ms = delay.as_millis() / RETRY_JITTER_DIVISOR;
    if max_jitter_ms == 0 {
        return delay;
    }

    let max_jitter_ms = std::cmp::min(max_jitter_ms, u128::from(u64::MAX)) as u64;
    let jitter_ms = rand::thread_rng().gen_range(0..=max_jitter_ms);
    delay + Duration::from_millis(jitter_ms)
}

/// Send a request, retrying transient failures.
///
/// Only the send is retried. A non-success status that is not retriable (or
/// that survives every retry) is returned as `ProviderError::Http` with the
/// response body.
pub(crate) async fn send_with_retry(
    policy: RetryPolicy,
    mut make_request: impl FnMut() -> reqwest::RequestBuilder,
) -> Result<reqwest::Response, ProviderError> {
    let max_attempts = policy.max_retries + 1;
    let mut attempt = 0;

    loop {
        let can_retry = attempt < policy.max_retries;

        match make_request().send().await {
            Ok(response) => {
                let status = response.status();
                if status.is_success() {
                    return Ok(response);
                }

                if is_retriable_status(status) && can_retry {
                    let base_delay = policy.base_delay_for(attempt);
                    let delay = add_jitter(base_delay);
                    debug!(
                        "HTTP request failed with status {}; retrying in {:?} (base {:?}, attempt {}/{})",
                        status,
                        delay,
                        base_delay,
                        attempt + 1,
                        max_attempts
                    );
                    let _ = response.bytes().await;
                    sleep(delay).await;
                    attempt += 1;
                    continue;
                }

                let body = response
                    .text()
                    .await
                    .unwrap_or_else(|_| "Unknown error".to_string());
                return Err(ProviderError::from_status(status.as_u16(), body));
            }
            Err(err) => {
                if is_retriable_send_error(&err) && can_retry {
                    let base_delay = policy.base_delay_for(attempt);
                    let delay = add_jitter(base_delay);
                    debug!(
                        "HTTP request error: {}; retrying in {:?} (base {:?}, attempt {}/{})",
                        err,
                        delay,
                        base_delay,
                        attempt + 1,
                        max_attempts
                    );
                    sleep(delay).await;
                    attempt += 1;
                    continue;
                }

                return Err(ProviderError::Transport(format!(
                    "HTTP request failed after {} attempt(s): {}",
                    attempt + 1,
                    err
                )));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retriable_statuses() {
        assert!(is_retriable_status(StatusCode::TOO_MANY_REQUESTS));
        assert!(is_retriable_status(StatusCode::BAD_GATEWAY));
        assert!(is_retriable_status(StatusCode::REQUEST_TIMEOUT));
        assert!(!is_retriable_status(StatusCode::UNAUTHORIZED));
        assert!(!is_retriable_status(StatusCode::BAD_REQUEST));
    }

    #[test]
    fn test_backoff_doubles() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.base_delay_for(0), Duration::from_secs(1));
        assert_eq!(policy.base_delay_for(1), Duration::from_secs(2));
        assert_eq!(policy.base_delay_for(2), Duration::from_secs(4));
        let none = RetryPolicy {
            max_retries: 0,
            base_delay: Duration::ZERO,
        };
        assert_eq!(none.base_delay_for(5), Duration::ZERO);
    }

    #[test]
    fn test_jitter_is_bounded() {
        let base = Duration::from_secs(4);
        for _ in 0..50 {
            let delay = add_jitter(base);
            assert!(delay >= base);
            assert!(delay <= base + Duration::from_secs(1));
        }
        assert_eq!(add_jitter(Duration::from_millis(3)), Duration::from_millis(3));
    }
}
