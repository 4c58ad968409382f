use std::time::Duration;

use anyhow::Result;
use config::{Config, File};
use ethers::types::{Address, U256};
use serde::Deserialize;

use crate::error::TaskError;
use crate::utils::names::NameStyle;

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub rpc_url: String,
    pub chain_id: u64,
    pub controller_address: String,
    pub resolver_address: String,
    #[serde(default = "default_tld")]
    pub tld: String,
    /// Registration duration in seconds. Defaults to one year.
    #[serde(default = "default_duration_secs")]
    pub duration_secs: u64,
    #[serde(default = "default_gas_price_gwei")]
    pub gas_price_gwei: u64,
    #[serde(default = "default_reverse_record")]
    pub reverse_record: bool,
    #[serde(default)]
    pub owner_controlled_fuses: u16,
    /// Number of registration tasks to run in this batch.
    pub domain_count: usize,
    #[serde(default = "default_max_concurrency")]
    pub max_concurrency: usize,
    #[serde(default = "default_key_file")]
    pub key_file: String,
    #[serde(default)]
    pub proxy_file: Option<String>,
    #[serde(default)]
    pub name_style: NameStyle,
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    #[serde(default = "default_receipt_timeout_secs")]
    pub receipt_timeout_secs: u64,
    /// Mirrors the registrar's enforced minimum commitment age.
    #[serde(default = "default_commitment_age_secs")]
    pub commitment_age_secs: u64,
    #[serde(default = "default_probe_url")]
    pub probe_url: String,
    #[serde(default = "default_probe_timeout_secs")]
    pub probe_timeout_secs: u64,
    #[serde(default = "default_restart_delay_secs")]
    pub restart_delay_secs: u64,
}

impl AppConfig {
    pub fn load(path: &str) -> Result<Self> {
        let settings = Config::builder()
            .add_source(File::with_name(path))
            .build()?;

        settings.try_deserialize().map_err(|e| anyhow::anyhow!(e))
    }

    /// Parses the configured addresses and bakes the protocol constants into
    /// the form the registration machine consumes.
    pub fn protocol(&self) -> Result<ProtocolConfig, TaskError> {
        let controller = self.controller_address.parse::<Address>().map_err(|_| {
            TaskError::InvalidConfiguredAddress {
                field: "controller_address",
                value: self.controller_address.clone(),
            }
        })?;
        let resolver = self.resolver_address.parse::<Address>().map_err(|_| {
            TaskError::InvalidConfiguredAddress {
                field: "resolver_address",
                value: self.resolver_address.clone(),
            }
        })?;

        Ok(ProtocolConfig {
            controller,
            resolver,
            duration: U256::from(self.duration_secs),
            reverse_record: self.reverse_record,
            fuses: self.owner_controlled_fuses,
            gas_price: U256::from(self.gas_price_gwei) * U256::exp10(9),
            receipt_timeout: Duration::from_secs(self.receipt_timeout_secs),
            commitment_age: Duration::from_secs(self.commitment_age_secs),
            tld: self.tld.clone(),
        })
    }
}

/// Immutable registrar protocol parameters shared by every task. Passed in
/// explicitly rather than read from ambient state.
#[derive(Debug, Clone)]
pub struct ProtocolConfig {
    pub controller: Address,
    pub resolver: Address,
    pub duration: U256,
    pub reverse_record: bool,
    pub fuses: u16,
    pub gas_price: U256,
    pub receipt_timeout: Duration,
    pub commitment_age: Duration,
    pub tld: String,
}

fn default_tld() -> String {
    "phrs".to_string()
}

fn default_duration_secs() -> u64 {
    60 * 60 * 24 * 365
}

fn default_gas_price_gwei() -> u64 {
    2
}

fn default_reverse_record() -> bool {
    true
}

fn default_max_concurrency() -> usize {
    5
}

fn default_key_file() -> String {
    "accounts.txt".to_string()
}

fn default_max_attempts() -> u32 {
    5
}

fn default_receipt_timeout_secs() -> u64 {
    120
}

fn default_commitment_age_secs() -> u64 {
    60
}

fn default_probe_url() -> String {
    "https://api.ipify.org".to_string()
}

fn default_probe_timeout_secs() -> u64 {
    10
}

fn default_restart_delay_secs() -> u64 {
    60
}
