//! Signed transaction envelope
//!
//! The envelope owns a fully signed v0 transaction together with the signer
//! set extracted from its header. It is built, submitted and dropped within
//! a single operation.

use solana_sdk::{
    pubkey::Pubkey, signature::Signature, transaction::VersionedTransaction,
};

#[derive(Debug, Clone)]
pub struct TransactionEnvelope {
    /// Signed transaction ready for submission
    pub transaction: VersionedTransaction,

    /// Accounts the message requires signatures from, payer first
    pub required_signers: Vec<Pubkey>,

    /// Serialised size in bytes
    pub size: usize,
}

impl TransactionEnvelope {
    pub fn new(transaction: VersionedTransaction, size: usize) -> Self {
        let required_signers = crate::compat::get_required_signers(&transaction.message).to_vec();
        Self {
            transaction,
            required_signers,
            size,
        }
    }

    /// Fee payer of the transaction
    pub fn payer(&self) -> Option<&Pubkey> {
        self.required_signers.first()
    }

    /// Transaction id (the payer's signature)
    pub fn signature(&self) -> Option<&Signature> {
        self.transaction.signatures.first()
    }

    pub fn instruction_count(&self) -> usize {
        self.transaction.message.instructions().len()
    }

    /// Whether `signer` is required by the message
    pub fn requires_signer(&self, signer: &Pubkey) -> bool {
        self.required_signers.contains(signer)
    }
}
