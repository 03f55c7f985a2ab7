// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Retry policy with exponential backoff + jitter for translation calls.
//
// Classifies errors into Transient (retry) and Permanent (give up at once).
// Timeouts, dropped connections, rate limiting and provider 5xx responses
// are transient; everything else is permanent.

use std::time::Duration;

use menuscan_core::config::TranslationConfig;
use menuscan_core::error::MenuscanError;
use menuscan_core::types::ErrorClass;
use tracing::{debug, warn};

/// Retry configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryConfig {
    /// Maximum number of retries after the first attempt.
    pub max_retries: u32,
    /// Base delay between retries (exponential backoff).
    pub base_delay: Duration,
    /// Maximum delay between retries.
    pub max_delay: Duration,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self::from_config(&TranslationConfig::default())
    }
}

impl RetryConfig {
    pub fn from_config(config: &TranslationConfig) -> Self {
        Self {
            max_retries: config.max_retries,
            base_delay: Duration::from_millis(config.retry_base_delay_ms),
            max_delay: Duration::from_millis(config.retry_max_delay_ms),
        }
    }
}

/// Result of evaluating whether to retry.
#[derive(Debug, Clone, PartialEq)]
pub enum RetryDecision {
    /// Retry after this delay.
    RetryAfter(Duration),
    /// Permanent error; do not retry.
    GiveUp,
    /// Maximum retries exhausted.
    Exhausted,
}

/// Classify a `MenuscanError` into an `ErrorClass` for retry decisions.
pub fn classify_error(err: &MenuscanError) -> ErrorClass {
    match err {
        MenuscanError::Timeout(_) => ErrorClass::Transient,
        MenuscanError::Provider { status, .. } => classify_status(*status),
        MenuscanError::Translation(detail) => classify_detail(detail),

        MenuscanError::Io(io_err) => match io_err.kind() {
            std::io::ErrorKind::TimedOut
            | std::io::ErrorKind::ConnectionRefused
            | std::io::ErrorKind::ConnectionReset
            | std::io::ErrorKind::ConnectionAborted
            | std::io::ErrorKind::Interrupted => ErrorClass::Transient,
            _ => ErrorClass::Permanent,
        },

        // Unsupported pair, bad payload, local misconfiguration
        _ => ErrorClass::Permanent,
    }
}

/// 408, 429 and 5xx are worth retrying.
fn classify_status(status: u16) -> ErrorClass {
    match status {
        408 | 429 | 500..=599 => ErrorClass::Transient,
        _ => ErrorClass::Permanent,
    }
}

/// Classify a free-form transport error description.
fn classify_detail(detail: &str) -> ErrorClass {
    let lower = detail.to_ascii_lowercase();
    if lower.contains("timed out")
        || lower.contains("connection")
        || lower.contains("broken pipe")
        || lower.contains("temporarily unavailable")
    {
        ErrorClass::Transient
    } else {
        ErrorClass::Permanent
    }
}

/// Decide whether to retry based on the error class and attempt count.
///
/// `attempt` counts retries already made, starting at 0.
pub fn should_retry(err: &MenuscanError, attempt: u32, config: &RetryConfig) -> RetryDecision {
    match classify_error(err) {
        ErrorClass::Permanent => {
            debug!(error = %err, "permanent translation error, not retrying");
            RetryDecision::GiveUp
        }
        ErrorClass::Transient => {
            if attempt >= config.max_retries {
                warn!(attempt, max = config.max_retries, "retry limit exhausted");
                RetryDecision::Exhausted
            } else {
                let delay = compute_delay(attempt, config);
                debug!(attempt, delay_ms = delay.as_millis() as u64, "scheduling retry");
                RetryDecision::RetryAfter(delay)
            }
        }
    }
}

/// Compute exponential backoff delay with jitter.
///
/// delay = min(base * 2^attempt + jitter, max_delay), jitter in [0, base).
pub fn compute_delay(attempt: u32, config: &RetryConfig) -> Duration {
    let base_ms = config.base_delay.as_millis() as u64;
    let exp_ms = base_ms.saturating_mul(1u64 << attempt.min(10));
    let total_ms = exp_ms.saturating_add(jitter(base_ms, attempt));
    let capped_ms = total_ms.min(config.max_delay.as_millis() as u64);
    Duration::from_millis(capped_ms)
}

/// Deterministic spread over [0, base) derived from the attempt number.
fn jitter(base_ms: u64, attempt: u32) -> u64 {
    let hash = (u64::from(attempt) + 1).wrapping_mul(6364136223846793005);
    (hash >> 33) % base_ms.max(1)
}
