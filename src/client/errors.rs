//! Error type of the order lifecycle facade

use thiserror::Error;

use crate::config::ConfigError;
use crate::derivation::DerivationError;
use crate::ledger::LedgerError;
use crate::state::FormatError;
use crate::swap::SwapError;
use crate::tx_builder::TransactionBuilderError;

/// Any failure of a facade operation
///
/// A failed stage aborts the whole operation; nothing is submitted after
/// an error and nothing is retried.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ClientError {
    #[error(transparent)]
    Derivation(#[from] DerivationError),

    #[error(transparent)]
    Format(#[from] FormatError),

    #[error(transparent)]
    Swap(#[from] SwapError),

    #[error(transparent)]
    Transaction(TransactionBuilderError),

    #[error(transparent)]
    Ledger(#[from] LedgerError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Caller input rejected before any network access
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

impl From<TransactionBuilderError> for ClientError {
    fn from(err: TransactionBuilderError) -> Self {
        // Keep the originating component visible to callers.
        match err {
            TransactionBuilderError::Derivation(inner) => Self::Derivation(inner),
            TransactionBuilderError::Ledger(inner) => Self::Ledger(inner),
            other => Self::Transaction(other),
        }
    }
}

impl ClientError {
    pub fn invalid_request(reason: impl Into<String>) -> Self {
        Self::InvalidRequest(reason.into())
    }

    /// Hint for callers that drive their own retry policy
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Swap(err) => err.is_retryable(),
            Self::Transaction(err) => err.is_retryable(),
            Self::Ledger(err) => err.is_retryable(),
            Self::Derivation(_) | Self::Format(_) | Self::Config(_) | Self::InvalidRequest(_) => false,
        }
    }

    /// Get the error category for metrics and observability
    pub fn category(&self) -> &'static str {
        match self {
            Self::Derivation(err) => err.category(),
            Self::Format(err) => err.category(),
            Self::Swap(err) => err.category(),
            Self::Transaction(err) => err.category(),
            Self::Ledger(err) => err.category(),
            Self::Config(_) => "config",
            Self::InvalidRequest(_) => "invalid_request",
        }
    }
}
