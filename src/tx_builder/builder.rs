//! Transaction assembly: compile, sign, size-check, submit
//!
//! The assembler never inspects instruction payloads. It orders nothing
//! itself beyond appending the priority-fee instruction last; the plan it is
//! given is already in execution order.

use std::sync::Arc;

use solana_sdk::{
    compute_budget::ComputeBudgetInstruction,
    message::{v0::Message as MessageV0, AddressLookupTableAccount, VersionedMessage},
    packet::PACKET_DATA_SIZE,
    pubkey::Pubkey,
    signature::{Keypair, Signature, Signer},
    transaction::VersionedTransaction,
};
use tracing::{debug, info, warn};

use crate::compat;
use crate::ledger::LedgerRpc;
use crate::metrics::{metrics, Timer};
use crate::tx_builder::errors::TransactionBuilderError;
use crate::tx_builder::instructions::InstructionPlan;
use crate::tx_builder::output::TransactionEnvelope;

/// Per-call submission options
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RpcOptions {
    pub skip_preflight: bool,
    /// Compute-unit price in micro-lamports; no fee instruction when unset or zero
    pub priority_fee_micro_lamports: Option<u64>,
}

/// Compiles instruction plans into signed v0 transactions for one payer
#[derive(Clone)]
pub struct TxAssembler {
    ledger: Arc<dyn LedgerRpc>,
    payer: Arc<Keypair>,
}

impl TxAssembler {
    pub fn new(ledger: Arc<dyn LedgerRpc>, payer: Arc<Keypair>) -> Self {
        Self { ledger, payer }
    }

    pub fn payer(&self) -> Pubkey {
        self.payer.pubkey()
    }

    /// Build a signed envelope from `plan`.
    ///
    /// The payer signs first, then `extra_signers` in the order given. Every
    /// signer the message requires must be covered, and every extra signer
    /// must be required.
    pub async fn assemble(
        &self,
        plan: InstructionPlan,
        lookup_tables: &[AddressLookupTableAccount],
        extra_signers: &[&Keypair],
        priority_fee_micro_lamports: Option<u64>,
    ) -> Result<TransactionEnvelope, TransactionBuilderError> {
        let timer = Timer::new();
        plan.validate()?;

        let mut instructions = plan.into_instructions();
        if let Some(price) = priority_fee_micro_lamports.filter(|p| *p > 0) {
            instructions.push(ComputeBudgetInstruction::set_compute_unit_price(price));
        }

        let blockhash = self
            .ledger
            .get_latest_blockhash()
            .await
            .map_err(|e| TransactionBuilderError::blockhash_unavailable(e.to_string()))?;

        let payer = self.payer.pubkey();
        let message = MessageV0::try_compile(&payer, &instructions, lookup_tables, blockhash)
            .map_err(|e| TransactionBuilderError::Compile(e.to_string()))?;
        let message = VersionedMessage::V0(message);

        let mut signers: Vec<&Keypair> = Vec::with_capacity(1 + extra_signers.len());
        signers.push(self.payer.as_ref());
        signers.extend_from_slice(extra_signers);

        let signer_keys: Vec<Pubkey> = signers.iter().map(|s| s.pubkey()).collect();
        let missing = compat::missing_signers(&message, &signer_keys);
        if !missing.is_empty() {
            warn!(missing = ?missing, "Required signers not supplied");
            return Err(TransactionBuilderError::MissingSignature { missing });
        }

        let required = compat::get_required_signers(&message);
        if let Some(unexpected) = signer_keys.iter().find(|key| !required.contains(key)) {
            return Err(TransactionBuilderError::Signing(format!(
                "signer {} is not required by the message",
                unexpected
            )));
        }

        // Signatures must follow the header's signer order, not ours.
        let ordered: Vec<&Keypair> = required
            .iter()
            .filter_map(|key| signers.iter().copied().find(|s| s.pubkey() == *key))
            .collect();

        let transaction = VersionedTransaction::try_new(message, ordered.as_slice())
            .map_err(|e| TransactionBuilderError::Signing(e.to_string()))?;

        let size = bincode::serialize(&transaction)
            .map_err(|e| TransactionBuilderError::Compile(e.to_string()))?
            .len();
        if size > PACKET_DATA_SIZE {
            return Err(TransactionBuilderError::TransactionTooLarge {
                size,
                max: PACKET_DATA_SIZE,
            });
        }

        timer.observe_duration(&metrics().assembly_latency);
        debug!(
            size,
            instructions = instructions.len(),
            lookup_tables = lookup_tables.len(),
            signers = ordered.len(),
            "Transaction assembled"
        );

        Ok(TransactionEnvelope::new(transaction, size))
    }

    /// Submit a signed envelope and wait for confirmation.
    pub async fn submit(
        &self,
        envelope: &TransactionEnvelope,
        skip_preflight: bool,
    ) -> Result<Signature, TransactionBuilderError> {
        let timer = Timer::new();
        let signature = self
            .ledger
            .send_and_confirm(&envelope.transaction, skip_preflight)
            .await?;
        timer.observe_duration(&metrics().submission_latency);

        info!(signature = %signature, size = envelope.size, "Transaction submitted");
        Ok(signature)
    }

    /// Assemble and submit in one step.
    pub async fn execute(
        &self,
        plan: InstructionPlan,
        lookup_tables: &[AddressLookupTableAccount],
        extra_signers: &[&Keypair],
        options: RpcOptions,
    ) -> Result<Signature, TransactionBuilderError> {
        let envelope = self
            .assemble(plan, lookup_tables, extra_signers, options.priority_fee_micro_lamports)
            .await?;
        self.submit(&envelope, options.skip_preflight).await
    }
}

impl std::fmt::Debug for TxAssembler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TxAssembler")
            .field("payer", &self.payer.pubkey())
            .finish_non_exhaustive()
    }
}
