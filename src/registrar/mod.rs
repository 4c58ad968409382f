//! The per-task commit/reveal registration state machine.
//!
//! One task drives one (wallet, label) pair through: key validation →
//! commitment → commit transaction → mandatory commitment-age wait → rent
//! price query → register transaction. Failures are classified by the retry
//! policy; a retried attempt restarts at the commitment with a brand-new
//! secret, since partial progress cannot resume under a stale one.
//!
//! Transaction submission is irreversible and costs funds. A retry after an
//! already-landed but unacknowledged register can pay twice; this mirrors the
//! registrar's actual semantics and is accepted.

pub mod client;
pub mod contract;

use std::sync::Arc;

use ethers::types::Address;
use ethers::utils::format_units;
use rand::rngs::OsRng;
use rand::RngCore;
use tokio::time::sleep;
use tracing::{error, info, warn};

use crate::config::ProtocolConfig;
use crate::error::TaskError;
use crate::utils::retry::{truncate_message, AbortReason, RetryDecision, RetryPolicy};
use crate::utils::wallet_manager::WalletKey;
use client::RegistrarClient;
use contract::CommitmentRequest;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskOutcome {
    Succeeded,
    /// Private key failed the format check; no chain interaction happened.
    SkippedInvalidKey,
    /// Client construction failed (malformed configured address, bad RPC or
    /// proxy URL); no chain interaction happened.
    SkippedInvalidConfig,
    FailedInsufficientFunds,
    FailedExhaustedRetries,
}

impl TaskOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, TaskOutcome::Succeeded)
    }

    pub fn is_skip(&self) -> bool {
        matches!(
            self,
            TaskOutcome::SkippedInvalidKey | TaskOutcome::SkippedInvalidConfig
        )
    }
}

#[derive(Debug, Clone)]
pub struct TaskReport {
    pub index: usize,
    pub label: String,
    /// Derived wallet address, once a client was constructed.
    pub owner: Option<Address>,
    pub outcome: TaskOutcome,
    pub attempts: u32,
}

/// Runs one registration task to a terminal state. `connect` builds the
/// task's own chain client and is only invoked after the key format check
/// passes.
pub async fn run_registration<F>(
    index: usize,
    label: String,
    key: &WalletKey,
    protocol: &ProtocolConfig,
    policy: &RetryPolicy,
    connect: F,
) -> TaskReport
where
    F: FnOnce() -> Result<Arc<dyn RegistrarClient>, TaskError> + Send,
{
    let full_name = format!("{}.{}", label, protocol.tld);

    if !key.is_valid_format() {
        error!("[Task #{}] Invalid private key for domain {}", index, full_name);
        return TaskReport {
            index,
            label,
            owner: None,
            outcome: TaskOutcome::SkippedInvalidKey,
            attempts: 0,
        };
    }

    let client = match connect() {
        Ok(client) => client,
        Err(e) => {
            error!("[Task #{}] {}", index, e);
            return TaskReport {
                index,
                label,
                owner: None,
                outcome: TaskOutcome::SkippedInvalidConfig,
                attempts: 0,
            };
        }
    };
    let owner = client.owner();

    let mut attempts = 0u32;
    loop {
        attempts += 1;
        match run_attempt(index, &label, &full_name, client.as_ref(), protocol).await {
            Ok(()) => {
                return TaskReport {
                    index,
                    label,
                    owner: Some(owner),
                    outcome: TaskOutcome::Succeeded,
                    attempts,
                };
            }
            Err(err) => {
                let message = err.to_string();
                match policy.classify(&message, attempts) {
                    RetryDecision::Retry { delay } => {
                        warn!(
                            "[Task #{}] Error on {}: {} - retrying {}/{} after {}s",
                            index,
                            full_name,
                            truncate_message(&message),
                            attempts,
                            policy.max_attempts,
                            delay.as_secs()
                        );
                        sleep(delay).await;
                    }
                    RetryDecision::Abort(AbortReason::InsufficientFunds) => {
                        error!(
                            "[Task #{}] Insufficient funds for {}: {}",
                            index,
                            full_name,
                            truncate_message(&message)
                        );
                        return TaskReport {
                            index,
                            label,
                            owner: Some(owner),
                            outcome: TaskOutcome::FailedInsufficientFunds,
                            attempts,
                        };
                    }
                    RetryDecision::Abort(AbortReason::ExhaustedRetries) => {
                        error!(
                            "[Task #{}] Failed to register {} after {} attempts: {}",
                            index,
                            full_name,
                            attempts,
                            truncate_message(&message)
                        );
                        return TaskReport {
                            index,
                            label,
                            owner: Some(owner),
                            outcome: TaskOutcome::FailedExhaustedRetries,
                            attempts,
                        };
                    }
                }
            }
        }
    }
}

/// One commit → wait → price → register pass with a fresh secret.
async fn run_attempt(
    index: usize,
    label: &str,
    full_name: &str,
    client: &dyn RegistrarClient,
    protocol: &ProtocolConfig,
) -> Result<(), TaskError> {
    let mut secret = [0u8; 32];
    OsRng.fill_bytes(&mut secret);

    let request = CommitmentRequest {
        label: label.to_string(),
        owner: client.owner(),
        duration: protocol.duration,
        secret,
        resolver: protocol.resolver,
        data: Vec::new(),
        reverse_record: protocol.reverse_record,
        fuses: protocol.fuses,
    };

    info!(
        "[Task #{}] Wallet: {:?}, Domain: {}",
        index, request.owner, full_name
    );

    let commitment = client.make_commitment(&request).await?;
    info!(
        "[Task #{}] Commitment: 0x{}",
        index,
        hex::encode(commitment.as_bytes())
    );

    let confirmation = client.commit(commitment).await?;
    info!(
        "[Task #{}] Commitment sent for {}! Gas Used: {}",
        index, full_name, confirmation.gas_used
    );

    info!(
        "[Task #{}] Waiting {}s for minCommitmentAge...",
        index,
        protocol.commitment_age.as_secs()
    );
    sleep(protocol.commitment_age).await;

    let price = client.rent_price(label, protocol.duration).await?;
    let value = price.total();
    info!(
        "[Task #{}] Price for {}: {} ether",
        index,
        full_name,
        format_units(value, "ether").unwrap_or_else(|_| value.to_string())
    );

    let confirmation = client.register(&request, value).await?;
    info!(
        "[Task #{}] Successfully registered {}, Gas Used: {}",
        index, full_name, confirmation.gas_used
    );

    Ok(())
}
