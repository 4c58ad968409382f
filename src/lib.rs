//! # phrs-register
//!
//! Batch registration of `.phrs` names on an ENS-style commit/reveal
//! registrar, across many wallets and optional rotating proxies.
//!
//! ## Modules
//!
//! - [`config`] - TOML configuration and baked protocol parameters
//! - [`error`] - Typed task errors
//! - [`registrar`] - Contract bindings, chain client, and the per-task
//!   commit/reveal state machine
//! - [`scheduler`] - Bounded-concurrency fan-out across wallet × domain tasks
//! - [`utils`] - Wallets, proxies, retry policy, name generation, logging

pub mod config;
pub mod error;
pub mod registrar;
pub mod scheduler;
pub mod utils;

pub use config::{AppConfig, ProtocolConfig};
pub use error::TaskError;
pub use registrar::client::{HttpRegistrar, RegistrarClient};
pub use registrar::contract::{CommitmentRequest, RentPrice, TxConfirmation};
pub use registrar::{run_registration, TaskOutcome, TaskReport};
pub use scheduler::{BatchSummary, ClientFactory, TaskScheduler};
pub use utils::logger::setup_logger;
pub use utils::names::{generate_label, NameStyle};
pub use utils::proxy_manager::{ProxyEndpoint, ProxyManager};
pub use utils::retry::{
    truncate_message, AbortReason, RetryDecision, RetryPolicy, DEFAULT_RETRY_DELAY,
    NONCE_RETRY_DELAY,
};
pub use utils::wallet_manager::{validate_private_key, WalletKey, WalletManager};
