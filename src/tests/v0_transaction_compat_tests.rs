//! V0 Transaction Tests
//!
//! Envelopes are always versioned (v0) messages:
//! - Lookup tables shrink account-heavy transactions under the packet limit
//! - Oversized transactions are refused before submission
//! - The priority-fee instruction is always the last one

use std::sync::Arc;

use solana_sdk::{
    compute_budget::{self, ComputeBudgetInstruction},
    hash::Hash,
    instruction::{AccountMeta, Instruction},
    message::{AddressLookupTableAccount, VersionedMessage},
    packet::PACKET_DATA_SIZE,
    pubkey::Pubkey,
    signature::Keypair,
};

use super::test_helpers::{instruction_summary, MockLedger};
use crate::compat;
use crate::ledger::LedgerRpc;
use crate::tx_builder::{InstructionPlan, TransactionBuilderError, TxAssembler};

fn assembler(ledger: &Arc<MockLedger>) -> TxAssembler {
    TxAssembler::new(ledger.clone() as Arc<dyn LedgerRpc>, Arc::new(Keypair::new()))
}

/// One core instruction touching `accounts` writable accounts
fn wide_plan(accounts: &[Pubkey]) -> InstructionPlan {
    let metas = accounts.iter().map(|key| AccountMeta::new(*key, false)).collect();
    let mut plan = InstructionPlan::new();
    plan.push_core(Instruction::new_with_bytes(Pubkey::new_unique(), &[3, 1, 4], metas));
    plan
}

fn fresh_keys(count: usize) -> Vec<Pubkey> {
    (0..count).map(|_| Pubkey::new_unique()).collect()
}

#[tokio::test]
async fn test_envelope_is_a_v0_message_with_fresh_blockhash() {
    let ledger = MockLedger::new();
    let envelope = assembler(&ledger)
        .assemble(wide_plan(&fresh_keys(2)), &[], &[], None)
        .await
        .unwrap();

    match &envelope.transaction.message {
        VersionedMessage::V0(message) => {
            assert_eq!(message.recent_blockhash, Hash::new_from_array([7u8; 32]));
            assert!(message.address_table_lookups.is_empty());
        }
        other => panic!("expected a v0 message, got {:?}", other),
    }
    assert_eq!(envelope.instruction_count(), 1);
    assert!(envelope.size <= PACKET_DATA_SIZE);
}

#[tokio::test]
async fn test_too_many_static_accounts_is_refused() {
    let ledger = MockLedger::new();
    let err = assembler(&ledger)
        .assemble(wide_plan(&fresh_keys(40)), &[], &[], None)
        .await
        .unwrap_err();

    match err {
        TransactionBuilderError::TransactionTooLarge { size, max } => {
            assert_eq!(max, PACKET_DATA_SIZE);
            assert!(size > max);
        }
        other => panic!("expected oversize error, got {:?}", other),
    }
    assert_eq!(ledger.submission_count(), 0);
}

#[tokio::test]
async fn test_lookup_table_brings_transaction_under_limit() {
    let ledger = MockLedger::new();
    let keys = fresh_keys(40);
    let table = AddressLookupTableAccount {
        key: Pubkey::new_unique(),
        addresses: keys.clone(),
    };

    let envelope = assembler(&ledger)
        .assemble(wide_plan(&keys), &[table], &[], None)
        .await
        .unwrap();

    assert_eq!(compat::loaded_address_count(&envelope.transaction.message), 40);
    assert!(envelope.size < PACKET_DATA_SIZE);
    // payer and program stay static
    assert_eq!(compat::get_static_account_keys(&envelope.transaction.message).len(), 2);
}

#[tokio::test]
async fn test_priority_fee_follows_every_plan_instruction() {
    let ledger = MockLedger::new();
    let mut plan = wide_plan(&fresh_keys(1));
    plan.push_transfer(Instruction::new_with_bytes(Pubkey::new_unique(), &[9], vec![]));

    let envelope = assembler(&ledger)
        .assemble(plan, &[], &[], Some(10_000))
        .await
        .unwrap();

    let instructions = instruction_summary(&envelope.transaction);
    assert_eq!(instructions.len(), 3);
    let (program, data) = instructions.last().unwrap();
    assert_eq!(*program, compute_budget::id());
    assert_eq!(*data, ComputeBudgetInstruction::set_compute_unit_price(10_000).data);
}

#[tokio::test]
async fn test_zero_priority_fee_adds_nothing() {
    let ledger = MockLedger::new();
    let envelope = assembler(&ledger)
        .assemble(wide_plan(&fresh_keys(1)), &[], &[], Some(0))
        .await
        .unwrap();
    assert_eq!(envelope.instruction_count(), 1);
}

#[tokio::test]
async fn test_invalid_plan_never_reaches_the_ledger() {
    let ledger = MockLedger::new();
    let err = assembler(&ledger)
        .assemble(InstructionPlan::new(), &[], &[], None)
        .await
        .unwrap_err();
    assert!(matches!(err, TransactionBuilderError::InvalidInstructionOrder(_)));
    assert_eq!(ledger.submission_count(), 0);
}
