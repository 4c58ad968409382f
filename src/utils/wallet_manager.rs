use std::fmt;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use ethers::signers::{LocalWallet, Signer};
use tracing::{error, info};
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::error::TaskError;

/// Raw private key material for one wallet. Zeroized on drop, redacted in
/// `Debug` output.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct WalletKey {
    key: String,
}

impl WalletKey {
    pub fn new(key: impl Into<String>) -> Self {
        Self { key: key.into() }
    }

    /// True iff the key (after stripping an optional `0x` prefix) is exactly
    /// 64 hex characters.
    pub fn is_valid_format(&self) -> bool {
        validate_private_key(&self.key)
    }

    pub fn signer(&self, chain_id: u64) -> Result<LocalWallet, TaskError> {
        let wallet: LocalWallet = self
            .key
            .parse()
            .map_err(|_| TaskError::InvalidKeyFormat)?;
        Ok(wallet.with_chain_id(chain_id))
    }
}

impl fmt::Debug for WalletKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WalletKey")
            .field("key", &"***REDACTED***")
            .finish()
    }
}

pub fn validate_private_key(key: &str) -> bool {
    let hex_part = key.strip_prefix("0x").unwrap_or(key);
    hex_part.len() == 64 && hex_part.chars().all(|c| c.is_ascii_hexdigit())
}

pub struct WalletManager;

impl WalletManager {
    /// Loads private keys from a plain text file, one key per line. Blank
    /// lines and `#` comments are ignored. A missing file is reported and
    /// yields an empty set rather than an error.
    pub fn load_keys(path: &str) -> Result<Vec<WalletKey>> {
        let file = Path::new(path);
        if !file.exists() {
            error!("{} not found. No wallets loaded.", path);
            return Ok(Vec::new());
        }

        let content =
            fs::read_to_string(file).with_context(|| format!("failed to read {}", path))?;

        let keys: Vec<WalletKey> = content
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty() && !line.starts_with('#'))
            .map(WalletKey::new)
            .collect();

        info!("Loaded {} wallets from {}", keys.len(), path);
        Ok(keys)
    }
}
