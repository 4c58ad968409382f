use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use ethers::contract::builders::ContractCall;
use ethers::middleware::SignerMiddleware;
use ethers::providers::{Http, Provider};
use ethers::signers::{LocalWallet, Signer};
use ethers::types::{Address, H256, U256, U64};
use reqwest::Client;
use tokio::time::timeout;
use tracing::warn;

use super::contract::{CommitmentRequest, RegistrarController, RentPrice, TxConfirmation};
use crate::config::ProtocolConfig;
use crate::error::TaskError;
use crate::utils::proxy_manager::ProxyEndpoint;
use crate::utils::wallet_manager::WalletKey;

type HttpSigner = SignerMiddleware<Provider<Http>, LocalWallet>;

/// The chain capability a registration task consumes. One instance per task;
/// instances never share connections. `commit` and `register` fold signing,
/// submission, and the bounded receipt wait into a single call and surface
/// raw provider error text so the retry policy can pattern-match it.
#[async_trait]
pub trait RegistrarClient: Send + Sync {
    fn owner(&self) -> Address;

    /// Read-only commitment computation on the controller.
    async fn make_commitment(&self, request: &CommitmentRequest) -> Result<H256, TaskError>;

    /// Publishes the commitment. No payment.
    async fn commit(&self, commitment: H256) -> Result<TxConfirmation, TaskError>;

    async fn rent_price(&self, label: &str, duration: U256) -> Result<RentPrice, TaskError>;

    /// Reveals and pays for the registration. Must carry the same inputs as
    /// the commitment.
    async fn register(
        &self,
        request: &CommitmentRequest,
        value: U256,
    ) -> Result<TxConfirmation, TaskError>;
}

/// Production client: an HTTP provider (optionally routed through a proxy)
/// with a signing middleware and the controller bindings.
pub struct HttpRegistrar {
    contract: RegistrarController<HttpSigner>,
    owner: Address,
    gas_price: U256,
    receipt_timeout: Duration,
}

impl HttpRegistrar {
    pub fn connect(
        protocol: &ProtocolConfig,
        rpc_url: &str,
        chain_id: u64,
        key: &WalletKey,
        proxy: Option<&ProxyEndpoint>,
    ) -> Result<Self, TaskError> {
        let mut builder = Client::builder();
        if let Some(endpoint) = proxy {
            let proxy = endpoint
                .build_proxy()
                .map_err(|e| connect_err(e.to_string()))?;
            builder = builder.proxy(proxy);
        }
        let client = builder.build().map_err(|e| connect_err(e.to_string()))?;

        let url = reqwest::Url::parse(rpc_url).map_err(|e| connect_err(e.to_string()))?;
        let provider = Provider::new(Http::new_with_client(url, client));

        let wallet = key.signer(chain_id)?;
        let owner = wallet.address();
        let middleware = Arc::new(SignerMiddleware::new(provider, wallet));

        Ok(Self {
            contract: RegistrarController::new(protocol.controller, middleware),
            owner,
            gas_price: protocol.gas_price,
            receipt_timeout: protocol.receipt_timeout,
        })
    }

    /// Estimates gas, submits with the configured gas price, and blocks until
    /// a confirmed receipt or the timeout elapses. A reverted or dropped
    /// transaction is a failure.
    async fn send_confirmed(
        &self,
        phase: &'static str,
        call: ContractCall<HttpSigner, ()>,
    ) -> Result<TxConfirmation, TaskError> {
        let call = call.gas_price(self.gas_price);
        let gas = call.estimate_gas().await.map_err(|e| TaskError::ChainCall {
            call: "estimateGas",
            message: e.to_string(),
        })?;
        let call = call.gas(gas);

        let pending = call.send().await.map_err(|e| TaskError::Transaction {
            phase,
            message: e.to_string(),
        })?;

        let receipt = timeout(self.receipt_timeout, pending)
            .await
            .map_err(|_| TaskError::Transaction {
                phase,
                message: format!(
                    "no receipt within {}s",
                    self.receipt_timeout.as_secs()
                ),
            })?
            .map_err(|e| TaskError::Transaction {
                phase,
                message: e.to_string(),
            })?
            .ok_or_else(|| TaskError::Transaction {
                phase,
                message: "transaction dropped from the mempool".to_string(),
            })?;

        if receipt.status != Some(U64::from(1)) {
            return Err(TaskError::Transaction {
                phase,
                message: format!("transaction {:?} reverted", receipt.transaction_hash),
            });
        }

        Ok(TxConfirmation {
            tx_hash: receipt.transaction_hash,
            gas_used: receipt.gas_used.unwrap_or_default(),
        })
    }
}

#[async_trait]
impl RegistrarClient for HttpRegistrar {
    fn owner(&self) -> Address {
        self.owner
    }

    async fn make_commitment(&self, request: &CommitmentRequest) -> Result<H256, TaskError> {
        let value = self
            .contract
            .make_commitment(
                request.label.clone(),
                request.owner,
                request.duration,
                request.secret,
                request.resolver,
                request.data.clone(),
                request.reverse_record,
                request.fuses,
            )
            .call()
            .await
            .map_err(|e| TaskError::ChainCall {
                call: "makeCommitment",
                message: e.to_string(),
            })?;

        let commitment = H256::from(value);
        let local = request.commitment_hash();
        if commitment != local {
            warn!(
                "makeCommitment mismatch for '{}': chain 0x{} vs local 0x{}",
                request.label,
                hex::encode(commitment.as_bytes()),
                hex::encode(local.as_bytes())
            );
        }
        Ok(commitment)
    }

    async fn commit(&self, commitment: H256) -> Result<TxConfirmation, TaskError> {
        let call = self.contract.commit(commitment.to_fixed_bytes());
        self.send_confirmed("commit", call).await
    }

    async fn rent_price(&self, label: &str, duration: U256) -> Result<RentPrice, TaskError> {
        let (base, premium) = self
            .contract
            .rent_price(label.to_string(), duration)
            .call()
            .await
            .map_err(|e| TaskError::ChainCall {
                call: "rentPrice",
                message: e.to_string(),
            })?;
        Ok(RentPrice { base, premium })
    }

    async fn register(
        &self,
        request: &CommitmentRequest,
        value: U256,
    ) -> Result<TxConfirmation, TaskError> {
        let call = self
            .contract
            .register(
                request.label.clone(),
                request.owner,
                request.duration,
                request.secret,
                request.resolver,
                request.data.clone(),
                request.reverse_record,
                request.fuses,
            )
            .value(value);
        self.send_confirmed("register", call).await
    }
}

fn connect_err(message: String) -> TaskError {
    TaskError::ChainCall {
        call: "connect",
        message,
    }
}
