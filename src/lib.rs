//! Triad client library
//!
//! Client-side orchestration for the triad prediction-market program:
//! address derivation, account decoding and formatting, swap routing,
//! versioned transaction assembly and the order lifecycle facade built on
//! top of them.
//!
//! ## Modules
//!
//! - **derivation**: program-derived and associated token addresses
//! - **state**: account schemas (both market layouts) and their views
//! - **program**: instruction encoding for the triad program
//! - **swap**: Jupiter quote and swap-instruction adapter
//! - **tx_builder**: instruction plans, v0 compilation, signing, submission
//! - **ledger**: the RPC boundary
//! - **client**: the public operations

pub mod client;
pub mod compat;
pub mod config;
pub mod derivation;
pub mod ledger;
pub mod metrics;
pub mod program;
pub mod state;
pub mod structured_logging;
pub mod swap;
pub mod tx_builder;
pub mod wallet;

pub use client::{
    ClientError, CollectFeeReceipt, NoOpReason, OperationOutcome, RpcOptions, TriadClient,
    FEE_COLLECTION_THRESHOLD,
};
pub use config::Config;

// Re-export commonly used types
pub use solana_sdk::{pubkey::Pubkey, signature::Signature};
