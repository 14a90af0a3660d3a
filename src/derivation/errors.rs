//! Error types for address derivation

use solana_sdk::pubkey::Pubkey;
use thiserror::Error;

/// Failures of the program-address derivation
///
/// Both variants indicate a programming error in seed composition rather
/// than a runtime condition, so neither is retryable.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DerivationError {
    /// Seed list violates the runtime limits (seed count or per-seed length)
    #[error("Invalid seeds: {0}")]
    InvalidSeeds(String),

    /// Every bump from 255 down to 0 produced an on-curve point
    #[error("No valid bump found for program {program_id}")]
    NoValidBump {
        /// Program the derivation was attempted under
        program_id: Pubkey,
    },
}

impl DerivationError {
    /// Get the error category for metrics and observability
    pub fn category(&self) -> &'static str {
        match self {
            Self::InvalidSeeds(_) => "invalid_seeds",
            Self::NoValidBump { .. } => "no_valid_bump",
        }
    }

    pub(crate) fn seed_too_long(index: usize, len: usize) -> Self {
        Self::InvalidSeeds(format!(
            "seed {} is {} bytes, maximum is {}",
            index,
            len,
            super::MAX_SEED_LEN
        ))
    }

    pub(crate) fn too_many_seeds(count: usize) -> Self {
        Self::InvalidSeeds(format!(
            "{} seeds supplied, maximum is {} (one slot is reserved for the bump)",
            count,
            super::MAX_SEEDS - 1
        ))
    }
}
