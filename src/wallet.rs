//! Wallet management module

use anyhow::{Context, Result};
use solana_sdk::{
    pubkey::Pubkey,
    signature::{Keypair, Signer},
};
use std::sync::Arc;
use zeroize::Zeroizing;

/// Primary authority keypair, shared across assemblers
#[derive(Clone)]
pub struct WalletManager {
    keypair: Arc<Keypair>,
}

impl WalletManager {
    /// Load a keypair file, either raw 64 bytes or the JSON byte-array
    /// format written by `solana-keygen`.
    pub fn from_file(path: &str) -> Result<Self> {
        let path = expand_home(path);
        let raw = Zeroizing::new(
            std::fs::read(&path).with_context(|| format!("Failed to read keypair file: {}", path))?,
        );
        Ok(Self::from_keypair(parse_keypair(&raw)?))
    }

    pub fn from_keypair(keypair: Keypair) -> Self {
        Self {
            keypair: Arc::new(keypair),
        }
    }

    pub fn pubkey(&self) -> Pubkey {
        self.keypair.pubkey()
    }

    pub fn keypair(&self) -> &Keypair {
        &self.keypair
    }

    /// Get an Arc reference to the keypair
    pub fn keypair_arc(&self) -> Arc<Keypair> {
        Arc::clone(&self.keypair)
    }
}

impl std::fmt::Debug for WalletManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WalletManager")
            .field("pubkey", &self.pubkey())
            .finish()
    }
}

fn parse_keypair(raw: &[u8]) -> Result<Keypair> {
    let bytes: Zeroizing<Vec<u8>> = if raw.len() == 64 {
        Zeroizing::new(raw.to_vec())
    } else {
        Zeroizing::new(serde_json::from_slice(raw).context("Failed to parse keypair JSON")?)
    };

    if bytes.len() != 64 {
        anyhow::bail!("Invalid keypair length: expected 64 bytes, got {}", bytes.len());
    }
    if bytes.iter().all(|&b| b == 0) {
        anyhow::bail!("Invalid keypair: all-zero key rejected");
    }
    Keypair::try_from(bytes.as_slice()).context("Invalid keypair bytes")
}

fn expand_home(path: &str) -> String {
    match (path.strip_prefix("~/"), std::env::var("HOME")) {
        (Some(rest), Ok(home)) => format!("{}/{}", home.trim_end_matches('/'), rest),
        _ => path.to_string(),
    }
}
