//! Market Lifecycle Tests
//!
//! Single-instruction operations through the facade:
//! - Order close, settle and payout
//! - Liquidity, market initialisation and resolution
//! - Staking requests and their validation

use std::sync::Arc;

use solana_sdk::{signature::Keypair, signer::Signer};

use super::test_helpers::{instruction_summary, test_addresses, test_client, MockLedger, MockSwap};
use crate::client::{
    AddLiquidityRequest, ClientError, InitializeMarketRequest, OrderRef, RpcOptions, StakeRef,
    StakeTokenRequest, TriadClient,
};
use crate::compat;
use crate::program::instructions::discriminators;
use crate::state::{FormatError, OrderDirection, WinningDirection};

fn setup() -> (Arc<MockLedger>, Arc<Keypair>, TriadClient) {
    let ledger = MockLedger::new();
    let payer = Arc::new(Keypair::new());
    let client = test_client(ledger.clone(), MockSwap::empty(), &payer);
    (ledger, payer, client)
}

/// Data of the only instruction in the only submission
fn single_instruction(ledger: &MockLedger) -> Vec<u8> {
    let instructions = instruction_summary(&ledger.single_submission());
    assert_eq!(instructions.len(), 1);
    assert_eq!(instructions[0].0, test_addresses().program_id);
    instructions[0].1.clone()
}

#[tokio::test]
async fn test_order_actions_submit_one_instruction_each() {
    let order = OrderRef {
        market_id: 3,
        order_id: 12,
    };
    let cases = [
        discriminators::CLOSE_ORDER,
        discriminators::SETTLE_ORDER,
        discriminators::PAYOUT_ORDER,
    ];

    for (index, expected) in cases.iter().enumerate() {
        let (ledger, payer, client) = setup();
        let signature = match index {
            0 => client.close_order(order, RpcOptions::default()).await,
            1 => client.settle_order(order, RpcOptions::default()).await,
            _ => client.payout_order(order, RpcOptions::default()).await,
        }
        .unwrap();

        let tx = ledger.single_submission();
        assert_eq!(tx.signatures[0], signature);
        assert_eq!(compat::get_required_signers(&tx.message), &[payer.pubkey()]);

        let data = single_instruction(&ledger);
        assert_eq!(data[..8], *expected);
        assert_eq!(data[8..], 12u64.to_le_bytes());
    }
}

#[tokio::test]
async fn test_add_liquidity() {
    let (ledger, _, client) = setup();
    let request = AddLiquidityRequest {
        market_id: 5,
        amount: 2_000_000,
        direction: OrderDirection::Flop,
    };
    client.add_liquidity(request, RpcOptions::default()).await.unwrap();

    let data = single_instruction(&ledger);
    assert_eq!(data[..8], discriminators::ADD_LIQUIDITY);
    assert_eq!(data[8..16], 2_000_000u64.to_le_bytes());

    let zero = AddLiquidityRequest { amount: 0, ..request };
    let err = client.add_liquidity(zero, RpcOptions::default()).await.unwrap_err();
    assert_eq!(err.category(), "invalid_request");
    assert_eq!(ledger.submission_count(), 1);
}

#[tokio::test]
async fn test_initialize_market_validates_window_and_question() {
    let (ledger, _, client) = setup();
    let request = InitializeMarketRequest {
        market_id: 9,
        name: "SOL/TRD".to_string(),
        question: "Will SOL close above 200?".to_string(),
        start_time: 1_700_000_000,
        end_time: 1_700_086_400,
    };

    let inverted = InitializeMarketRequest {
        end_time: request.start_time,
        ..request.clone()
    };
    let err = client
        .initialize_market(inverted, RpcOptions::default())
        .await
        .unwrap_err();
    assert_eq!(err.category(), "invalid_request");

    let verbose = InitializeMarketRequest {
        question: "q".repeat(81),
        ..request.clone()
    };
    let err = client
        .initialize_market(verbose, RpcOptions::default())
        .await
        .unwrap_err();
    assert_eq!(err, ClientError::Format(FormatError::TextTooLong { max: 80, actual: 81 }));
    assert_eq!(ledger.submission_count(), 0);

    client.initialize_market(request, RpcOptions::default()).await.unwrap();
    assert_eq!(single_instruction(&ledger)[..8], discriminators::INITIALIZE_MARKET);
}

#[tokio::test]
async fn test_resolve_market() {
    let (ledger, _, client) = setup();
    client
        .resolve_market(4, WinningDirection::Flop, RpcOptions::default())
        .await
        .unwrap();

    let data = single_instruction(&ledger);
    assert_eq!(data[..8], discriminators::RESOLVE_MARKET);
}

#[tokio::test]
async fn test_stake_requests() {
    let (ledger, _, client) = setup();
    let request = StakeTokenRequest {
        stake_vault: "Rev 1".to_string(),
        name: "stake-1".to_string(),
        amount: 0,
    };
    let err = client
        .stake_token(request.clone(), RpcOptions::default())
        .await
        .unwrap_err();
    assert_eq!(err.category(), "invalid_request");

    client
        .stake_token(
            StakeTokenRequest {
                amount: 1_000_000,
                ..request
            },
            RpcOptions::default(),
        )
        .await
        .unwrap();
    client
        .request_withdraw_stake(
            StakeRef {
                stake_vault: "Rev 1".to_string(),
                name: "stake-1".to_string(),
            },
            RpcOptions::default(),
        )
        .await
        .unwrap();

    let tags: Vec<Vec<u8>> = ledger
        .submitted()
        .iter()
        .map(|tx| instruction_summary(tx)[0].1[..8].to_vec())
        .collect();
    assert_eq!(
        tags,
        vec![
            discriminators::STAKE_TOKEN.to_vec(),
            discriminators::REQUEST_WITHDRAW_STAKE.to_vec(),
        ]
    );
}

#[tokio::test]
async fn test_stake_name_beyond_seed_limit_fails_before_submission() {
    let (ledger, _, client) = setup();
    let err = client
        .request_withdraw_stake(
            StakeRef {
                stake_vault: "Rev 1".to_string(),
                name: "s".repeat(40),
            },
            RpcOptions::default(),
        )
        .await
        .unwrap_err();

    assert!(matches!(err, ClientError::Derivation(_)));
    assert_eq!(ledger.submission_count(), 0);
}
