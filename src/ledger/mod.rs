//! Ledger RPC boundary
//!
//! Everything the client reads from or submits to the network goes through
//! [`LedgerRpc`]. [`SolanaLedger`] is the production implementation over the
//! nonblocking RPC client; tests substitute an in-memory ledger.

pub mod errors;
pub use errors::LedgerError;

use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use solana_account_decoder::UiAccountEncoding;
use solana_client::nonblocking::rpc_client::RpcClient;
use solana_client::rpc_config::{RpcAccountInfoConfig, RpcProgramAccountsConfig, RpcSendTransactionConfig};
use solana_rpc_client_api::filter::{Memcmp, RpcFilterType};
use solana_sdk::{
    commitment_config::CommitmentConfig, hash::Hash, pubkey::Pubkey, signature::Signature,
    transaction::VersionedTransaction,
};
use tracing::{debug, info, instrument, warn};

/// Server-side filter for program account scans
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccountFilter {
    /// Account data at `offset` must equal `bytes`
    Memcmp { offset: usize, bytes: Vec<u8> },
    /// Account data must be exactly this long
    DataSize(u64),
}

impl AccountFilter {
    pub fn memcmp(offset: usize, bytes: impl Into<Vec<u8>>) -> Self {
        Self::Memcmp {
            offset,
            bytes: bytes.into(),
        }
    }

    /// Whether raw account data passes this filter
    pub fn matches(&self, data: &[u8]) -> bool {
        match self {
            Self::Memcmp { offset, bytes } => data
                .get(*offset..offset.saturating_add(bytes.len()))
                .map(|window| window == bytes.as_slice())
                .unwrap_or(false),
            Self::DataSize(size) => data.len() as u64 == *size,
        }
    }

    fn to_rpc(&self) -> RpcFilterType {
        match self {
            Self::Memcmp { offset, bytes } => {
                RpcFilterType::Memcmp(Memcmp::new_raw_bytes(*offset, bytes.clone()))
            }
            Self::DataSize(size) => RpcFilterType::DataSize(*size),
        }
    }
}

/// Network operations the client depends on
#[async_trait]
pub trait LedgerRpc: Send + Sync {
    /// Raw data of the account at `address`; `AccountNotFound` if absent.
    async fn get_account_data(&self, address: &Pubkey) -> Result<Vec<u8>, LedgerError>;

    /// Raw data of each address, `None` where no account exists.
    async fn get_multiple_accounts(
        &self,
        addresses: &[Pubkey],
    ) -> Result<Vec<Option<Vec<u8>>>, LedgerError>;

    /// All accounts owned by `program_id` passing every filter.
    async fn get_program_accounts(
        &self,
        program_id: &Pubkey,
        filters: &[AccountFilter],
    ) -> Result<Vec<(Pubkey, Vec<u8>)>, LedgerError>;

    async fn get_latest_blockhash(&self) -> Result<Hash, LedgerError>;

    /// Submit a signed transaction and wait for confirmation.
    async fn send_and_confirm(
        &self,
        transaction: &VersionedTransaction,
        skip_preflight: bool,
    ) -> Result<Signature, LedgerError>;
}

/// How long a sent transaction may stay unconfirmed, roughly one blockhash lifetime
pub const DEFAULT_CONFIRMATION_TIMEOUT: Duration = Duration::from_secs(60);

const CONFIRMATION_POLL_INTERVAL: Duration = Duration::from_millis(500);

/// [`LedgerRpc`] over a Solana JSON-RPC endpoint
pub struct SolanaLedger {
    client: Arc<RpcClient>,
    commitment: CommitmentConfig,
    confirmation_timeout: Duration,
}

impl SolanaLedger {
    /// `timeout` bounds every individual RPC request.
    pub fn new(url: impl Into<String>, commitment: CommitmentConfig, timeout: Duration) -> Self {
        Self {
            client: Arc::new(RpcClient::new_with_timeout_and_commitment(
                url.into(),
                timeout,
                commitment,
            )),
            commitment,
            confirmation_timeout: DEFAULT_CONFIRMATION_TIMEOUT,
        }
    }

    pub fn from_client(client: Arc<RpcClient>) -> Self {
        let commitment = client.commitment();
        Self {
            client,
            commitment,
            confirmation_timeout: DEFAULT_CONFIRMATION_TIMEOUT,
        }
    }

    pub fn with_confirmation_timeout(mut self, timeout: Duration) -> Self {
        self.confirmation_timeout = timeout;
        self
    }

    pub fn url(&self) -> String {
        self.client.url()
    }
}

impl std::fmt::Debug for SolanaLedger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SolanaLedger")
            .field("url", &self.client.url())
            .field("commitment", &self.commitment)
            .field("confirmation_timeout", &self.confirmation_timeout)
            .finish()
    }
}

#[async_trait]
impl LedgerRpc for SolanaLedger {
    #[instrument(skip(self), fields(address = %address))]
    async fn get_account_data(&self, address: &Pubkey) -> Result<Vec<u8>, LedgerError> {
        let response = self
            .client
            .get_account_with_commitment(address, self.commitment)
            .await
            .map_err(|e| LedgerError::from_client_error(e, "get_account"))?;

        match response.value {
            Some(account) => Ok(account.data),
            None => {
                debug!("Account not found");
                Err(LedgerError::AccountNotFound { address: *address })
            }
        }
    }

    async fn get_multiple_accounts(
        &self,
        addresses: &[Pubkey],
    ) -> Result<Vec<Option<Vec<u8>>>, LedgerError> {
        if addresses.is_empty() {
            return Ok(Vec::new());
        }

        let accounts = self
            .client
            .get_multiple_accounts_with_commitment(addresses, self.commitment)
            .await
            .map_err(|e| LedgerError::from_client_error(e, "get_multiple_accounts"))?
            .value;

        Ok(accounts
            .into_iter()
            .map(|account| account.map(|a| a.data))
            .collect())
    }

    #[instrument(skip(self, filters), fields(program_id = %program_id, filters = filters.len()))]
    async fn get_program_accounts(
        &self,
        program_id: &Pubkey,
        filters: &[AccountFilter],
    ) -> Result<Vec<(Pubkey, Vec<u8>)>, LedgerError> {
        let config = RpcProgramAccountsConfig {
            filters: Some(filters.iter().map(AccountFilter::to_rpc).collect()),
            account_config: RpcAccountInfoConfig {
                encoding: Some(UiAccountEncoding::Base64),
                commitment: Some(self.commitment),
                ..Default::default()
            },
            ..Default::default()
        };

        let accounts = self
            .client
            .get_program_accounts_with_config(program_id, config)
            .await
            .map_err(|e| LedgerError::from_client_error(e, "get_program_accounts"))?;

        debug!(count = accounts.len(), "Fetched program accounts");
        Ok(accounts
            .into_iter()
            .map(|(address, account)| (address, account.data))
            .collect())
    }

    async fn get_latest_blockhash(&self) -> Result<Hash, LedgerError> {
        self.client
            .get_latest_blockhash()
            .await
            .map_err(|e| LedgerError::from_client_error(e, "get_latest_blockhash"))
    }

    #[instrument(skip(self, transaction), fields(skip_preflight))]
    async fn send_and_confirm(
        &self,
        transaction: &VersionedTransaction,
        skip_preflight: bool,
    ) -> Result<Signature, LedgerError> {
        let config = RpcSendTransactionConfig {
            skip_preflight,
            preflight_commitment: Some(self.commitment.commitment),
            ..Default::default()
        };

        let signature = self
            .client
            .send_transaction_with_config(transaction, config)
            .await
            .map_err(|e| LedgerError::from_submission_error(e, None))?;

        self.await_confirmation(&signature).await?;

        info!(signature = %signature, "Transaction confirmed");
        Ok(signature)
    }
}

impl SolanaLedger {
    /// Poll the signature status until it reaches the configured commitment.
    ///
    /// A transaction that landed but failed is a rejection, even though the
    /// node accepted it for processing.
    async fn await_confirmation(&self, signature: &Signature) -> Result<(), LedgerError> {
        let deadline = Instant::now() + self.confirmation_timeout;
        loop {
            let status = self
                .client
                .get_signature_status_with_commitment(signature, self.commitment)
                .await
                .map_err(|e| LedgerError::from_submission_error(e, Some(signature.to_string())))?;

            match status {
                Some(Ok(())) => return Ok(()),
                Some(Err(err)) => {
                    warn!(signature = %signature, error = %err, "Transaction failed on chain");
                    return Err(LedgerError::Rejected {
                        signature: Some(signature.to_string()),
                        message: err.to_string(),
                    });
                }
                None if Instant::now() >= deadline => {
                    return Err(LedgerError::Rpc {
                        operation: "confirm_transaction",
                        message: format!(
                            "{} was not confirmed within {}s",
                            signature,
                            self.confirmation_timeout.as_secs()
                        ),
                        code: None,
                    });
                }
                None => tokio::time::sleep(CONFIRMATION_POLL_INTERVAL).await,
            }
        }
    }
}
