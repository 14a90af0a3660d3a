//! Configuration module
//!
//! Configuration is read from an optional TOML file and then overridden by
//! `TRIAD__<SECTION>__<KEY>` environment variables (a `.env` file is loaded
//! first when present). Every deployment address is injected here; nothing
//! is compiled in except the defaults below.

use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use solana_sdk::{
    commitment_config::{CommitmentConfig, CommitmentLevel},
    pubkey::Pubkey,
};
use thiserror::Error;

/// Default triad program deployment
pub const DEFAULT_PROGRAM_ID: &str = "TRDwq3BN4mP3m9KsuNUWSN6QDff93VKGSwE95Jbr9Ss";
/// SPL Token-2022, which the canonical mint is issued under
pub const DEFAULT_TOKEN_PROGRAM: &str = "TokenzQdBNbLqP5VEhdkAS6EPFLC1PHnBqCXEpPxuEb";
/// Fees are converted into wrapped SOL by default
pub const DEFAULT_SETTLEMENT_MINT: &str = "So11111111111111111111111111111111111111112";

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Missing required setting {0}")]
    Missing(&'static str),

    #[error("Invalid {field}: {reason}")]
    Invalid { field: &'static str, reason: String },
}

/// Main application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub rpc: RpcConfig,
    pub wallet: WalletConfig,
    pub protocol: ProtocolConfig,
    pub swap: SwapConfig,
    pub transaction: TransactionConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RpcConfig {
    pub url: String,

    /// `processed`, `confirmed` or `finalized`
    pub commitment: String,

    /// Request timeout in seconds
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WalletConfig {
    /// Path to keypair file
    pub keypair_path: String,

    /// Co-signer for reward claims
    pub verifier_keypair_path: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProtocolConfig {
    pub program_id: String,

    /// Asset the program trades and stakes in; no default
    pub canonical_mint: String,

    pub token_program: String,

    /// Asset collected fees are swapped into
    pub settlement_mint: String,

    /// Stake administrator, required for stake withdrawals
    pub admin: Option<String>,

    /// Core collection that tickets are minted into
    pub ticket_collection: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SwapConfig {
    pub base_url: String,

    /// Maximum slippage tolerance (basis points)
    pub slippage_bps: u16,

    pub api_key: Option<String>,

    /// Per-request timeout in milliseconds
    pub timeout_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TransactionConfig {
    /// Compute-unit price in micro-lamports
    pub priority_fee_micro_lamports: Option<u64>,

    pub skip_preflight: bool,

    /// Compute budget of the fee collection transaction
    pub fee_swap_compute_unit_limit: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default filter when `RUST_LOG` is unset
    pub level: String,

    pub json: bool,
}

// Default value functions
fn default_rpc_url() -> String { "https://api.mainnet-beta.solana.com".to_string() }
fn default_commitment() -> String { "confirmed".to_string() }
fn default_rpc_timeout() -> u64 { 30 }
fn default_keypair_path() -> String { "~/.config/solana/id.json".to_string() }
fn default_swap_url() -> String { "https://quote-api.jup.ag/v6".to_string() }
fn default_slippage() -> u16 { 100 }
fn default_swap_timeout() -> u64 { 10_000 }
fn default_fee_swap_cu_limit() -> u32 { 500_000 }
fn default_log_level() -> String { "info".to_string() }

impl Default for RpcConfig {
    fn default() -> Self {
        Self {
            url: default_rpc_url(),
            commitment: default_commitment(),
            timeout_secs: default_rpc_timeout(),
        }
    }
}

impl Default for WalletConfig {
    fn default() -> Self {
        Self {
            keypair_path: default_keypair_path(),
            verifier_keypair_path: None,
        }
    }
}

impl Default for ProtocolConfig {
    fn default() -> Self {
        Self {
            program_id: DEFAULT_PROGRAM_ID.to_string(),
            canonical_mint: String::new(),
            token_program: DEFAULT_TOKEN_PROGRAM.to_string(),
            settlement_mint: DEFAULT_SETTLEMENT_MINT.to_string(),
            admin: None,
            ticket_collection: None,
        }
    }
}

impl Default for SwapConfig {
    fn default() -> Self {
        Self {
            base_url: default_swap_url(),
            slippage_bps: default_slippage(),
            api_key: None,
            timeout_ms: default_swap_timeout(),
        }
    }
}

impl Default for TransactionConfig {
    fn default() -> Self {
        Self {
            priority_fee_micro_lamports: None,
            skip_preflight: false,
            fee_swap_compute_unit_limit: default_fee_swap_cu_limit(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

/// Parsed deployment addresses
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProtocolAddresses {
    pub program_id: Pubkey,
    pub canonical_mint: Pubkey,
    pub token_program: Pubkey,
    pub settlement_mint: Pubkey,
    pub admin: Option<Pubkey>,
    pub ticket_collection: Option<Pubkey>,
}

fn parse_key(field: &'static str, value: &str) -> Result<Pubkey, ConfigError> {
    Pubkey::from_str(value.trim()).map_err(|e| ConfigError::Invalid {
        field,
        reason: format!("'{}' is not a valid address: {}", value, e),
    })
}

impl ProtocolConfig {
    pub fn resolve(&self) -> Result<ProtocolAddresses, ConfigError> {
        if self.canonical_mint.trim().is_empty() {
            return Err(ConfigError::Missing("protocol.canonical_mint"));
        }

        Ok(ProtocolAddresses {
            program_id: parse_key("protocol.program_id", &self.program_id)?,
            canonical_mint: parse_key("protocol.canonical_mint", &self.canonical_mint)?,
            token_program: parse_key("protocol.token_program", &self.token_program)?,
            settlement_mint: parse_key("protocol.settlement_mint", &self.settlement_mint)?,
            admin: self
                .admin
                .as_deref()
                .map(|admin| parse_key("protocol.admin", admin))
                .transpose()?,
            ticket_collection: self
                .ticket_collection
                .as_deref()
                .map(|collection| parse_key("protocol.ticket_collection", collection))
                .transpose()?,
        })
    }
}

impl RpcConfig {
    pub fn commitment_config(&self) -> Result<CommitmentConfig, ConfigError> {
        let commitment = CommitmentLevel::from_str(&self.commitment).map_err(|_| ConfigError::Invalid {
            field: "rpc.commitment",
            reason: format!("unknown commitment '{}'", self.commitment),
        })?;
        Ok(CommitmentConfig { commitment })
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Config {
    /// Load configuration from TOML file
    pub fn from_file(path: &str) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    /// Load from an optional file plus `TRIAD__` environment overrides.
    pub fn load(path: Option<&str>) -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let mut builder = config::Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(config::File::with_name(path));
        }
        builder = builder.add_source(
            config::Environment::with_prefix("TRIAD")
                .prefix_separator("__")
                .separator("__"),
        );

        let config: Config = builder.build()?.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Reject settings that would only fail later, at request time.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.protocol.resolve()?;
        self.rpc.commitment_config()?;

        if self.rpc.url.trim().is_empty() {
            return Err(ConfigError::Missing("rpc.url"));
        }
        if self.rpc.timeout_secs == 0 {
            return Err(ConfigError::Invalid {
                field: "rpc.timeout_secs",
                reason: "must be positive".to_string(),
            });
        }
        if self.swap.slippage_bps == 0 || self.swap.slippage_bps > 10_000 {
            return Err(ConfigError::Invalid {
                field: "swap.slippage_bps",
                reason: format!("{} is outside 1..=10000", self.swap.slippage_bps),
            });
        }
        if self.transaction.fee_swap_compute_unit_limit == 0 {
            return Err(ConfigError::Invalid {
                field: "transaction.fee_swap_compute_unit_limit",
                reason: "must be positive".to_string(),
            });
        }
        Ok(())
    }
}
