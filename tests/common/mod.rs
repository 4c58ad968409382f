#![allow(dead_code)]

use std::sync::atomic::{AtomicU32, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use ethers::types::{Address, H256, U256};

use phrs_register::{
    CommitmentRequest, ProtocolConfig, RegistrarClient, RentPrice, TaskError, TxConfirmation,
};

pub const VALID_KEY: &str = "4c0883a69102937d6231471b5dbb6204fe5129617082792ae468d01a3f362318";

pub fn protocol_fixture(commitment_age: Duration) -> ProtocolConfig {
    ProtocolConfig {
        controller: Address::repeat_byte(0xc0),
        resolver: Address::zero(),
        duration: U256::from(31_536_000u64),
        reverse_record: true,
        fuses: 0,
        gas_price: U256::from(2_000_000_000u64),
        receipt_timeout: Duration::from_secs(120),
        commitment_age,
        tld: "phrs".to_string(),
    }
}

/// Tracks how many tasks sit between their first and last chain call.
#[derive(Default)]
pub struct ConcurrencyProbe {
    pub active: AtomicUsize,
    pub peak: AtomicUsize,
}

impl ConcurrencyProbe {
    pub fn enter(&self) {
        let now = self.active.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
    }

    pub fn exit(&self) {
        self.active.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Scriptable stand-in for the chain: records every call and can fail a
/// configured number of commit transactions with a given error message.
#[derive(Default)]
pub struct MockRegistrar {
    pub owner: Address,
    pub calls: Mutex<Vec<&'static str>>,
    pub commitment_secrets: Mutex<Vec<[u8; 32]>>,
    pub register_secrets: Mutex<Vec<[u8; 32]>>,
    pub register_values: Mutex<Vec<U256>>,
    pub commit_failures: AtomicU32,
    pub commit_error: String,
    pub work_delay: Duration,
    pub probe: Option<Arc<ConcurrencyProbe>>,
}

impl MockRegistrar {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_owner(owner: Address) -> Self {
        Self {
            owner,
            ..Default::default()
        }
    }

    pub fn failing_commits(count: u32, error: &str) -> Self {
        Self {
            commit_failures: AtomicU32::new(count),
            commit_error: error.to_string(),
            ..Default::default()
        }
    }
}

#[async_trait]
impl RegistrarClient for MockRegistrar {
    fn owner(&self) -> Address {
        self.owner
    }

    async fn make_commitment(&self, request: &CommitmentRequest) -> Result<H256, TaskError> {
        if let Some(probe) = &self.probe {
            probe.enter();
        }
        self.calls.lock().unwrap().push("makeCommitment");
        self.commitment_secrets.lock().unwrap().push(request.secret);
        Ok(request.commitment_hash())
    }

    async fn commit(&self, _commitment: H256) -> Result<TxConfirmation, TaskError> {
        self.calls.lock().unwrap().push("commit");
        if !self.work_delay.is_zero() {
            tokio::time::sleep(self.work_delay).await;
        }
        if self.commit_failures.load(Ordering::SeqCst) > 0 {
            self.commit_failures.fetch_sub(1, Ordering::SeqCst);
            if let Some(probe) = &self.probe {
                probe.exit();
            }
            return Err(TaskError::Transaction {
                phase: "commit",
                message: self.commit_error.clone(),
            });
        }
        Ok(TxConfirmation {
            tx_hash: H256::repeat_byte(0x01),
            gas_used: U256::from(46_000u64),
        })
    }

    async fn rent_price(&self, _label: &str, _duration: U256) -> Result<RentPrice, TaskError> {
        self.calls.lock().unwrap().push("rentPrice");
        Ok(RentPrice {
            base: U256::from(10u64),
            premium: U256::from(2u64),
        })
    }

    async fn register(
        &self,
        request: &CommitmentRequest,
        value: U256,
    ) -> Result<TxConfirmation, TaskError> {
        self.calls.lock().unwrap().push("register");
        self.register_secrets.lock().unwrap().push(request.secret);
        self.register_values.lock().unwrap().push(value);
        if let Some(probe) = &self.probe {
            probe.exit();
        }
        Ok(TxConfirmation {
            tx_hash: H256::repeat_byte(0x02),
            gas_used: U256::from(280_000u64),
        })
    }
}
