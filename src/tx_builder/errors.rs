//! Error types for instruction building and transaction assembly

use solana_sdk::pubkey::Pubkey;
use thiserror::Error;

use crate::derivation::DerivationError;
use crate::ledger::LedgerError;

/// Error type for building, compiling, signing and submitting transactions
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransactionBuilderError {
    /// Failed to build an instruction for a specific program
    #[error("Instruction build error (program={program}): {reason}")]
    InstructionBuild {
        /// Program or instruction name that failed to build
        program: String,
        /// Detailed reason for the failure
        reason: String,
    },

    /// An address the instruction needs could not be derived
    #[error("Address derivation failed: {0}")]
    Derivation(#[from] DerivationError),

    /// Instruction segments are out of order
    #[error("Invalid instruction order: {0}")]
    InvalidInstructionOrder(String),

    /// The message requires signatures that were not supplied
    ///
    /// Raised before submission; a transaction is never sent with a
    /// required signature missing.
    #[error("Missing signature for {}", format_keys(.missing))]
    MissingSignature { missing: Vec<Pubkey> },

    /// Signing failed, or a supplied signer is not required by the message
    #[error("Signing failed: {0}")]
    Signing(String),

    /// The v0 message could not be compiled
    #[error("Message compile failed: {0}")]
    Compile(String),

    /// Serialised transaction exceeds the packet size
    #[error("Transaction is {size} bytes, limit is {max}")]
    TransactionTooLarge { size: usize, max: usize },

    /// Failed to fetch a recent blockhash
    #[error("Blockhash error: {0}")]
    Blockhash(String),

    /// Submission or confirmation failed
    #[error("Ledger error: {0}")]
    Ledger(#[from] LedgerError),
}

fn format_keys(keys: &[Pubkey]) -> String {
    keys.iter()
        .map(|key| key.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

impl TransactionBuilderError {
    /// Check if this error is potentially retryable
    ///
    /// Returns `true` if retrying the operation might succeed
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Blockhash(_) => true,
            Self::Ledger(err) => err.is_retryable(),

            Self::InstructionBuild { .. }
            | Self::Derivation(_)
            | Self::InvalidInstructionOrder(_)
            | Self::MissingSignature { .. }
            | Self::Signing(_)
            | Self::Compile(_)
            | Self::TransactionTooLarge { .. } => false,
        }
    }

    /// Get the error category for metrics and observability
    pub fn category(&self) -> &'static str {
        match self {
            Self::InstructionBuild { .. } => "instruction",
            Self::Derivation(err) => err.category(),
            Self::InvalidInstructionOrder(_) => "validation",
            Self::MissingSignature { .. } => "missing_signature",
            Self::Signing(_) => "signing",
            Self::Compile(_) => "compile",
            Self::TransactionTooLarge { .. } => "too_large",
            Self::Blockhash(_) => "blockhash",
            Self::Ledger(err) => err.category(),
        }
    }
}

// Convenience constructors for common error scenarios
impl TransactionBuilderError {
    /// Create an instruction build error for a specific program
    pub fn instruction_failed(program: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InstructionBuild {
            program: program.into(),
            reason: reason.into(),
        }
    }

    /// Create a blockhash error
    pub fn blockhash_unavailable(reason: impl Into<String>) -> Self {
        Self::Blockhash(reason.into())
    }

    /// Create an invalid instruction order error
    pub fn invalid_order(reason: impl Into<String>) -> Self {
        Self::InvalidInstructionOrder(reason.into())
    }
}
