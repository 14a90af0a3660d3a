//! Fee Collection Scenario Tests
//!
//! - Threshold gating at 99.999999 and 100 whole units
//! - Full instruction layout of a collection with settlement transfer
//! - Schema and routing failures

use std::sync::Arc;

use solana_sdk::{
    compute_budget::{self, ComputeBudgetInstruction},
    pubkey::Pubkey,
    signature::Keypair,
    signer::Signer,
    system_program,
};

use super::test_helpers::{
    instruction_summary, market_v1_fixture, market_v2_fixture, swap_plan_fixture, swap_program,
    test_addresses, test_client, MockLedger, MockSwap,
};
use crate::client::{
    ClientError, CollectFeeRequest, NoOpReason, OperationOutcome, RpcOptions,
    FEE_COLLECTION_THRESHOLD,
};
use crate::derivation::market_address;
use crate::ledger::LedgerError;
use crate::program::instructions::discriminators;
use crate::state::{AccountRecord, FormatError};

const MARKET_ID: u64 = 7;

/// Market whose two fee buckets leave `unclaimed` minor units to collect
fn seed_market(ledger: &MockLedger, unclaimed: u64) -> Pubkey {
    let address = market_address(&test_addresses().program_id, MARKET_ID)
        .unwrap()
        .address;
    let mut market = market_v2_fixture(MARKET_ID);
    market.market_fee_available = unclaimed / 2 + 1_000_000;
    market.market_fee_claimed = 1_000_000;
    market.nft_holders_fee_available = unclaimed - unclaimed / 2;
    market.nft_holders_fee_claimed = 0;
    assert_eq!(market.unclaimed_fees(), unclaimed);

    ledger.insert(address, market.to_account_data().unwrap());
    address
}

fn request(vault: Pubkey) -> CollectFeeRequest {
    CollectFeeRequest {
        market_id: MARKET_ID,
        vault,
    }
}

#[tokio::test]
async fn test_fee_just_below_threshold_is_a_noop() {
    let ledger = MockLedger::new();
    seed_market(&ledger, 99_999_999);
    let swap = MockSwap::empty();
    let payer = Arc::new(Keypair::new());
    let client = test_client(ledger.clone(), swap.clone(), &payer);

    let outcome = client
        .collect_fee(request(Pubkey::new_unique()), RpcOptions::default())
        .await
        .unwrap();

    assert_eq!(
        outcome,
        OperationOutcome::NoOp(NoOpReason::FeeBelowThreshold {
            total_fee: 99_999_999,
            threshold: FEE_COLLECTION_THRESHOLD,
        })
    );
    assert!(swap.requests().is_empty(), "no quote below the threshold");
    assert_eq!(ledger.submission_count(), 0);
}

#[tokio::test]
async fn test_fee_at_threshold_is_collected_and_settled() {
    let ledger = MockLedger::new();
    seed_market(&ledger, 100_000_000);
    let payer = Arc::new(Keypair::new());
    let swap = MockSwap::returning(swap_plan_fixture(&payer.pubkey(), 1, true, 12, 412_345_678));
    let client = test_client(ledger.clone(), swap.clone(), &payer);
    let vault = Pubkey::new_unique();

    let outcome = client
        .collect_fee(request(vault), RpcOptions::default())
        .await
        .unwrap();

    let tx = ledger.single_submission();
    let receipt = *outcome.submitted().expect("collection should submit");
    assert_eq!(receipt.signature, tx.signatures[0]);
    assert_eq!(receipt.fee_to_swap, 100_000_000);
    assert_eq!(receipt.lamports, 412_345_678);

    let requests = swap.requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].input_mint, test_addresses().canonical_mint);
    assert_eq!(requests[0].output_mint, test_addresses().settlement_mint);
    assert_eq!(requests[0].amount, 100_000_000);

    // collect_fee, setup, compute limit, swap, cleanup, transfer
    let instructions = instruction_summary(&tx);
    let programs: Vec<Pubkey> = instructions.iter().map(|(program, _)| *program).collect();
    assert_eq!(
        programs,
        vec![
            test_addresses().program_id,
            swap_program(),
            compute_budget::id(),
            swap_program(),
            swap_program(),
            system_program::id(),
        ]
    );
    assert_eq!(instructions[0].1, discriminators::COLLECT_FEE.to_vec());
    assert_eq!(
        instructions[2].1,
        ComputeBudgetInstruction::set_compute_unit_limit(500_000).data
    );
    assert_eq!(instructions[3].1, vec![1]);
    assert_eq!(instructions[4].1, vec![99]);

    // System transfer: u32 tag 2, then lamports.
    let transfer = &instructions[5].1;
    assert_eq!(transfer[..4], [2, 0, 0, 0]);
    assert_eq!(u64::from_le_bytes(transfer[4..12].try_into().unwrap()), 412_345_678);

    let keys = tx.message.static_account_keys();
    assert!(keys.contains(&vault));
}

#[tokio::test]
async fn test_empty_route_after_gate_is_a_noop() {
    let ledger = MockLedger::new();
    seed_market(&ledger, 250_000_000);
    let payer = Arc::new(Keypair::new());
    let swap = MockSwap::empty();
    let client = test_client(ledger.clone(), swap.clone(), &payer);

    let outcome = client
        .collect_fee(request(Pubkey::new_unique()), RpcOptions::default())
        .await
        .unwrap();

    assert_eq!(outcome, OperationOutcome::NoOp(NoOpReason::NoSwapRoute));
    assert_eq!(swap.requests().len(), 1);
    assert_eq!(ledger.submission_count(), 0);
}

#[tokio::test]
async fn test_missing_market_is_an_error() {
    let ledger = MockLedger::new();
    let payer = Arc::new(Keypair::new());
    let client = test_client(ledger.clone(), MockSwap::empty(), &payer);

    let err = client
        .collect_fee(request(Pubkey::new_unique()), RpcOptions::default())
        .await
        .unwrap_err();
    assert!(matches!(err, ClientError::Ledger(LedgerError::AccountNotFound { .. })));
}

#[tokio::test]
async fn test_first_generation_market_cannot_collect() {
    let ledger = MockLedger::new();
    let address = market_address(&test_addresses().program_id, MARKET_ID)
        .unwrap()
        .address;
    ledger.insert(address, market_v1_fixture(MARKET_ID).to_account_data().unwrap());
    let payer = Arc::new(Keypair::new());
    let client = test_client(ledger.clone(), MockSwap::empty(), &payer);

    let err = client
        .collect_fee(request(Pubkey::new_unique()), RpcOptions::default())
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        ClientError::Format(FormatError::MalformedAccount { kind: "marketV2", .. })
    ));
    assert_eq!(ledger.submission_count(), 0);
}
