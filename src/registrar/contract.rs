//! Registrar controller bindings and commitment arithmetic.

use ethers::abi::Token;
use ethers::prelude::abigen;
use ethers::types::{Address, Bytes, H256, U256};
use ethers::utils::keccak256;

abigen!(
    RegistrarController,
    r#"[
        function makeCommitment(string name, address owner, uint256 duration, bytes32 secret, address resolver, bytes[] data, bool reverseRecord, uint16 ownerControlledFuses) pure returns (bytes32)
        function commit(bytes32 commitment)
        function rentPrice(string name, uint256 duration) view returns (uint256 base, uint256 premium)
        function register(string name, address owner, uint256 duration, bytes32 secret, address resolver, bytes[] data, bool reverseRecord, uint16 ownerControlledFuses) payable
    ]"#
);

/// The full input set of a commit/reveal attempt. Built once per attempt so
/// the commit and register calls see identical inputs by construction; any
/// divergence would invalidate the on-chain commitment.
#[derive(Debug, Clone)]
pub struct CommitmentRequest {
    pub label: String,
    pub owner: Address,
    pub duration: U256,
    pub secret: [u8; 32],
    pub resolver: Address,
    pub data: Vec<Bytes>,
    pub reverse_record: bool,
    pub fuses: u16,
}

impl CommitmentRequest {
    /// Local mirror of the controller's `makeCommitment`: keccak256 over the
    /// ABI-encoded tuple, with the label hashed first. Deterministic in its
    /// inputs; used to cross-check the chain-computed value.
    pub fn commitment_hash(&self) -> H256 {
        let tokens = [
            Token::FixedBytes(keccak256(self.label.as_bytes()).to_vec()),
            Token::Address(self.owner),
            Token::Uint(self.duration),
            Token::FixedBytes(self.secret.to_vec()),
            Token::Address(self.resolver),
            Token::Array(self.data.iter().map(|d| Token::Bytes(d.to_vec())).collect()),
            Token::Bool(self.reverse_record),
            Token::Uint(U256::from(self.fuses)),
        ];
        H256::from(keccak256(ethers::abi::encode(&tokens)))
    }
}

/// Rent quote for (label, duration), as returned by `rentPrice`.
#[derive(Debug, Clone, Copy, Default)]
pub struct RentPrice {
    pub base: U256,
    pub premium: U256,
}

impl RentPrice {
    /// The payment value a register transaction must carry.
    pub fn total(&self) -> U256 {
        self.base + self.premium
    }
}

/// A confirmed, non-reverted transaction.
#[derive(Debug, Clone, Copy)]
pub struct TxConfirmation {
    pub tx_hash: H256,
    pub gas_used: U256,
}
