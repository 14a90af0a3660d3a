//! Transaction assembly
//!
//! - **errors**: error taxonomy for building, signing and submission
//! - **instructions**: segment-tagged instruction plans and order checks
//! - **builder**: v0 compilation, multi-signer signing, size limit, submission
//! - **output**: the signed envelope
//!
//! Every operation produces exactly one envelope, so all of its
//! instructions succeed or fail together on the ledger.

pub mod errors;
pub use errors::TransactionBuilderError;

mod builder;
mod instructions;
mod output;

pub use builder::{RpcOptions, TxAssembler};
pub use instructions::{InstructionPlan, Segment};
pub use output::TransactionEnvelope;
