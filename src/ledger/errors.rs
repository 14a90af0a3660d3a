//! Error types for the ledger RPC boundary

use solana_client::client_error::ClientError;
use solana_sdk::pubkey::Pubkey;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LedgerError {
    /// No account exists at the address
    ///
    /// Callers use this as an existence check, so it is not an error
    /// condition by itself.
    #[error("Account not found: {address}")]
    AccountNotFound { address: Pubkey },

    /// The RPC call itself failed (transport, timeout, server error)
    #[error("RPC {operation} failed: {message}")]
    Rpc {
        operation: &'static str,
        message: String,
        /// JSON-RPC error code when the node returned one
        code: Option<i64>,
    },

    /// The ledger refused or failed the submitted transaction
    #[error("Transaction rejected: {message}")]
    Rejected {
        /// Signature of the rejected transaction, if it was sent
        signature: Option<String>,
        message: String,
    },
}

impl LedgerError {
    pub fn is_account_not_found(&self) -> bool {
        matches!(self, Self::AccountNotFound { .. })
    }

    /// Hint for callers that drive their own retry policy
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::AccountNotFound { .. } => false,
            Self::Rejected { message, .. } => {
                let message = message.to_lowercase();
                message.contains("blockhash not found") || message.contains("block height exceeded")
            }
            Self::Rpc { message, code, .. } => {
                let message = message.to_lowercase();
                message.contains("timed out")
                    || message.contains("timeout")
                    || message.contains("rate limit")
                    || message.contains("429")
                    || matches!(code, Some(c) if (500..600).contains(c))
            }
        }
    }

    /// Get the error category for metrics and observability
    pub fn category(&self) -> &'static str {
        match self {
            Self::AccountNotFound { .. } => "account_not_found",
            Self::Rpc { .. } => "rpc",
            Self::Rejected { .. } => "rejected",
        }
    }

    /// Classify a read-path client error
    pub fn from_client_error(err: ClientError, operation: &'static str) -> Self {
        let message = err.to_string();
        let code = message
            .split("code:")
            .nth(1)
            .and_then(|s| s.split(|c: char| !(c == '-' || c.is_ascii_digit())).find(|s| !s.is_empty()))
            .and_then(|s| s.parse::<i64>().ok());

        Self::Rpc {
            operation,
            message,
            code,
        }
    }

    /// Classify a submission or confirmation error
    pub fn from_submission_error(err: ClientError, signature: Option<String>) -> Self {
        let message = err.to_string();
        let lowered = message.to_lowercase();

        if lowered.contains("transaction")
            || lowered.contains("simulation failed")
            || lowered.contains("custom program error")
            || lowered.contains("insufficient")
            || lowered.contains("blockhash not found")
        {
            Self::Rejected { signature, message }
        } else {
            Self::from_client_error(err, "send_transaction")
        }
    }
}
