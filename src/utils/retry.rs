//! Retry classification for registration attempts.
//!
//! The policy is a pure function from (error text, attempt count) to a
//! retry/abort decision, decoupled from any I/O so it can be tested directly.

use std::time::Duration;

/// Short backoff for nonce races between concurrent tasks on the same wallet.
pub const NONCE_RETRY_DELAY: Duration = Duration::from_secs(10);
/// Default backoff for unrecognized transient failures.
pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_secs(60);
pub const DEFAULT_MAX_ATTEMPTS: u32 = 5;

/// Cap applied to error text in log lines. Classification always sees the
/// raw message.
const REPORT_MESSAGE_LIMIT: usize = 120;

const NONCE_PATTERNS: [&str; 2] = ["nonce too low", "replacement transaction underpriced"];
const INSUFFICIENT_FUNDS_PATTERN: &str = "insufficient funds";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AbortReason {
    ExhaustedRetries,
    InsufficientFunds,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDecision {
    Retry { delay: Duration },
    Abort(AbortReason),
}

#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub max_attempts: u32,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
        }
    }
}

impl RetryPolicy {
    pub fn new(max_attempts: u32) -> Self {
        Self { max_attempts }
    }

    /// Decides what to do after attempt number `attempt` (1-based) failed with
    /// `message`. Rules are checked in priority order: exhaustion wins over
    /// everything, then nonce races (short backoff), then insufficient funds
    /// (never retried, waiting cannot fix an empty wallet), then the default
    /// long backoff.
    pub fn classify(&self, message: &str, attempt: u32) -> RetryDecision {
        if attempt >= self.max_attempts {
            return RetryDecision::Abort(AbortReason::ExhaustedRetries);
        }

        let lower = message.to_lowercase();
        if NONCE_PATTERNS.iter().any(|p| lower.contains(p)) {
            return RetryDecision::Retry {
                delay: NONCE_RETRY_DELAY,
            };
        }
        if lower.contains(INSUFFICIENT_FUNDS_PATTERN) {
            return RetryDecision::Abort(AbortReason::InsufficientFunds);
        }

        RetryDecision::Retry {
            delay: DEFAULT_RETRY_DELAY,
        }
    }
}

/// Clips an error message for reporting. Never used for classification.
pub fn truncate_message(message: &str) -> String {
    if message.chars().count() > REPORT_MESSAGE_LIMIT {
        let clipped: String = message.chars().take(REPORT_MESSAGE_LIMIT).collect();
        format!("{}...", clipped)
    } else {
        message.to_string()
    }
}
