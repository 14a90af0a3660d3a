//! Error types for ledger record decoding and formatting

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FormatError {
    /// Account bytes do not match the expected record layout
    ///
    /// Usually means the deployed program and this client disagree on the
    /// schema (wrong discriminator, truncated data, unknown enum tag).
    #[error("Malformed {kind} account: {reason}")]
    MalformedAccount {
        /// Record kind that was being decoded
        kind: &'static str,
        /// What went wrong
        reason: String,
    },

    /// Text does not fit into its fixed-length field
    #[error("Text is {actual} bytes, field holds at most {max}")]
    TextTooLong { max: usize, actual: usize },

    /// Decimal amount string could not be converted to minor units
    #[error("Invalid amount '{input}': {reason}")]
    InvalidAmount { input: String, reason: String },
}

impl FormatError {
    pub fn malformed(kind: &'static str, reason: impl Into<String>) -> Self {
        Self::MalformedAccount {
            kind,
            reason: reason.into(),
        }
    }

    pub(crate) fn invalid_amount(input: &str, reason: impl Into<String>) -> Self {
        Self::InvalidAmount {
            input: input.to_string(),
            reason: reason.into(),
        }
    }

    /// Get the error category for metrics and observability
    pub fn category(&self) -> &'static str {
        match self {
            Self::MalformedAccount { .. } => "malformed_account",
            Self::TextTooLong { .. } => "text_too_long",
            Self::InvalidAmount { .. } => "invalid_amount",
        }
    }
}
