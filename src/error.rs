//! Typed errors for registration tasks.
//!
//! Every failure a task can hit is caught at the task boundary and classified
//! by the retry policy; nothing here is allowed to escape and kill the batch.

use thiserror::Error;

/// Errors raised while driving a single registration task.
///
/// Nonce conflicts and insufficient funds arrive as raw provider error text
/// inside `ChainCall`/`Transaction` and are recognized by message pattern in
/// the retry policy rather than as dedicated variants.
#[derive(Error, Debug, Clone)]
pub enum TaskError {
    #[error("invalid private key format: expected 64 hex chars")]
    InvalidKeyFormat,

    #[error("invalid configured address for '{field}': {value}")]
    InvalidConfiguredAddress { field: &'static str, value: String },

    #[error("chain call '{call}' failed: {message}")]
    ChainCall {
        call: &'static str,
        message: String,
    },

    #[error("{phase} transaction failed: {message}")]
    Transaction {
        phase: &'static str,
        message: String,
    },
}
