//! HTTP retry policy with bounded exponential backoff.
//!
//! Transient failures (connect errors, timeouts, 408/429/5xx) are retried a
//! fixed number of times with down-jittered exponential delays. A
//! `Retry-After` header from the tenant takes precedence over the computed
//! delay. 4xx responses are never retried.

use std::time::Duration;

use reqwest::{RequestBuilder, Response, StatusCode, header::HeaderMap};

/// Retry configuration. Defaults: 3 retries (4 attempts), 500ms initial
/// delay, 8s cap.
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Maximum number of retries (not counting the initial request).
    pub max_retries: u32,
    /// Backoff delay before the first retry.
    pub initial_delay: Duration,
    /// Backoff ceiling.
    pub max_delay: Duration,
    /// Down-jitter factor (0.25 = delay multiplied by a value in [0.75, 1.0]).
    pub jitter_factor: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            initial_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(8),
            jitter_factor: 0.25,
        }
    }
}

/// Whether a response status warrants another attempt.
#[must_use]
pub fn should_retry(status: StatusCode) -> bool {
    matches!(status.as_u16(), 408 | 429 | 500..=599)
}

/// Parse a `Retry-After` value in seconds, accepted only within (0, 60s).
#[must_use]
pub fn parse_retry_after(headers: &HeaderMap) -> Option<Duration> {
    let value = headers.get(reqwest::header::RETRY_AFTER)?.to_str().ok()?;
    let secs = value.trim().parse::<u64>().ok()?;
    let duration = Duration::from_secs(secs);
    (duration > Duration::ZERO && duration < Duration::from_secs(60)).then_some(duration)
}

/// Delay before the next retry.
///
/// `backoff_step` is 0 before the first retry, 1 before the second, and so
/// on. A valid `Retry-After` header wins over the computed backoff.
#[must_use]
pub fn backoff_delay(
    backoff_step: u32,
    config: &RetryConfig,
    headers: Option<&HeaderMap>,
) -> Duration {
    if let Some(headers) = headers
        && let Some(delay) = parse_retry_after(headers)
    {
        return delay;
    }

    let base = config.initial_delay.as_secs_f64() * 2.0_f64.powi(backoff_step as i32);
    let capped = base.min(config.max_delay.as_secs_f64());
    let jitter = 1.0 - rand::random::<f64>() * config.jitter_factor;
    Duration::from_secs_f64(capped * jitter)
}

/// Outcome of a retried request.
///
/// A sum type so callers cannot mistake an exhausted-retries response for a
/// successful one.
#[derive(Debug)]
pub enum RetryOutcome {
    /// 2xx response.
    Success(Response),
    /// Non-2xx response; for retryable statuses, retries were exhausted.
    /// The response is preserved for error-body inspection.
    HttpError(Response),
    /// Transport failure, either non-retryable or after exhausting retries.
    Transport {
        attempts: u32,
        source: reqwest::Error,
    },
}

/// Send a request with automatic retries.
///
/// `build_request` is invoked once per attempt, so the caller can (and the
/// signed client does) stamp each attempt with a fresh authorization header.
pub async fn send_with_retry<F>(build_request: F, config: &RetryConfig) -> RetryOutcome
where
    F: Fn() -> RequestBuilder,
{
    let mut backoff_step = 0u32;
    loop {
        let attempt = backoff_step + 1;
        match build_request().send().await {
            Ok(response) => {
                let status = response.status();
                if status.is_success() {
                    return RetryOutcome::Success(response);
                }
                if !should_retry(status) || backoff_step >= config.max_retries {
                    return RetryOutcome::HttpError(response);
                }
                let delay = backoff_delay(backoff_step, config, Some(response.headers()));
                tracing::debug!(
                    %status,
                    attempt,
                    delay_ms = delay.as_millis(),
                    "retrying after error status"
                );
                tokio::time::sleep(delay).await;
            }
            Err(source) => {
                if !is_retryable_error(&source) || backoff_step >= config.max_retries {
                    return RetryOutcome::Transport { attempts: attempt, source };
                }
                let delay = backoff_delay(backoff_step, config, None);
                tracing::debug!(
                    error = %source,
                    attempt,
                    delay_ms = delay.as_millis(),
                    "retrying after transport error"
                );
                tokio::time::sleep(delay).await;
            }
        }
        backoff_step += 1;
    }
}

fn is_retryable_error(error: &reqwest::Error) -> bool {
    error.is_connect() || error.is_timeout() || error.is_request()
}
