//! Ticket and Position Scenario Tests
//!
//! - Ticket mints signed by the wallet, the verifier and a fresh asset key
//! - Collection creation co-signed by the fresh core collection key
//! - Vault positions read back for a set of tickers

use std::sync::Arc;

use solana_sdk::{pubkey::Pubkey, signature::Keypair, signer::Signer};

use super::test_helpers::{instruction_summary, test_addresses, test_client, MockLedger, MockSwap};
use crate::client::{
    ClientError, CreateCollectionRequest, MintTicketRequest, RpcOptions, TriadClient,
};
use crate::compat;
use crate::config::{ConfigError, ProtocolAddresses};
use crate::derivation::{position_address, ticket_address};
use crate::program::instructions::discriminators;
use crate::state::records::{AccountRecord, PositionRecord, UserPositionRecord};
use crate::state::{FormatError, Rarity};

fn mint_request() -> MintTicketRequest {
    MintTicketRequest {
        collection_symbol: "PTCKT".to_string(),
        number: 17,
        discount: 20,
        is_boosted: false,
        rarity: Rarity::Uncommon,
        nft_mint: Pubkey::new_unique(),
    }
}

fn sorted(mut keys: Vec<Pubkey>) -> Vec<Pubkey> {
    keys.sort();
    keys
}

#[tokio::test]
async fn test_ticket_mint_carries_three_valid_signatures() {
    let ledger = MockLedger::new();
    let payer = Arc::new(Keypair::new());
    let client = test_client(ledger.clone(), MockSwap::empty(), &payer);
    let verifier = Keypair::new();

    let receipt = client
        .mint_ticket(mint_request(), &verifier, RpcOptions::default())
        .await
        .unwrap();

    let tx = ledger.single_submission();
    assert_eq!(tx.signatures[0], receipt.signature);

    let signers = compat::get_required_signers(&tx.message);
    assert_eq!(signers.len(), 3);
    assert_eq!(signers[0], payer.pubkey());
    assert_eq!(
        sorted(signers[1..].to_vec()),
        sorted(vec![verifier.pubkey(), receipt.asset])
    );
    assert_eq!(tx.signatures.len(), 3);
    assert!(tx.verify_with_results().iter().all(|ok| *ok));

    let instructions = instruction_summary(&tx);
    assert_eq!(instructions.len(), 1);
    assert_eq!(instructions[0].1[..8], discriminators::MINT_TICKET);

    let keys = tx.message.static_account_keys();
    let ticket = ticket_address(&test_addresses().program_id, 17).unwrap().address;
    assert!(keys.contains(&ticket));
    assert!(keys.contains(&test_addresses().ticket_collection.unwrap()));
}

#[tokio::test]
async fn test_every_mint_uses_a_fresh_asset() {
    let ledger = MockLedger::new();
    let payer = Arc::new(Keypair::new());
    let client = test_client(ledger.clone(), MockSwap::empty(), &payer);
    let verifier = Keypair::new();

    let first = client
        .mint_ticket(mint_request(), &verifier, RpcOptions::default())
        .await
        .unwrap();
    let second = client
        .mint_ticket(mint_request(), &verifier, RpcOptions::default())
        .await
        .unwrap();

    assert_ne!(first.asset, second.asset);
    assert_eq!(ledger.submission_count(), 2);
}

#[tokio::test]
async fn test_ticket_mint_needs_configured_collection() {
    let ledger = MockLedger::new();
    let payer = Arc::new(Keypair::new());
    let addresses = ProtocolAddresses {
        ticket_collection: None,
        ..test_addresses()
    };
    let client = TriadClient::new(ledger.clone(), MockSwap::empty(), payer, addresses, 500_000);

    let err = client
        .mint_ticket(mint_request(), &Keypair::new(), RpcOptions::default())
        .await
        .unwrap_err();
    assert_eq!(err, ClientError::Config(ConfigError::Missing("protocol.ticket_collection")));
    assert_eq!(ledger.submission_count(), 0);
}

#[tokio::test]
async fn test_discount_above_full_price_is_rejected() {
    let ledger = MockLedger::new();
    let payer = Arc::new(Keypair::new());
    let client = test_client(ledger.clone(), MockSwap::empty(), &payer);

    let request = MintTicketRequest {
        discount: 101,
        ..mint_request()
    };
    let err = client
        .mint_ticket(request, &Keypair::new(), RpcOptions::default())
        .await
        .unwrap_err();
    assert_eq!(err.category(), "invalid_request");
    assert_eq!(ledger.submission_count(), 0);
}

#[tokio::test]
async fn test_collection_is_cosigned_by_new_core_collection() {
    let ledger = MockLedger::new();
    let payer = Arc::new(Keypair::new());
    let client = test_client(ledger.clone(), MockSwap::empty(), &payer);

    let request = CreateCollectionRequest {
        name: "Poseidon".to_string(),
        symbol: "PTCKT".to_string(),
        supply: 0,
    };
    let err = client
        .create_collection(request.clone(), RpcOptions::default())
        .await
        .unwrap_err();
    assert_eq!(err.category(), "invalid_request");

    let receipt = client
        .create_collection(
            CreateCollectionRequest {
                supply: 1_000,
                ..request
            },
            RpcOptions::default(),
        )
        .await
        .unwrap();

    let tx = ledger.single_submission();
    assert_eq!(
        compat::get_required_signers(&tx.message),
        &[payer.pubkey(), receipt.core_collection]
    );
    assert!(tx.verify_with_results().iter().all(|ok| *ok));
    assert_eq!(instruction_summary(&tx)[0].1[..8], discriminators::CREATE_COLLECTION);
}

fn position(wallet: &Pubkey, ticker: &Pubkey, deposited: u64, withdrawn: u64) -> UserPositionRecord {
    UserPositionRecord {
        ts: 1_700_000_000,
        bump: 254,
        total_deposited: deposited,
        total_withdrawn: withdrawn,
        lp_share: 0,
        total_positions: 0,
        ticker: *ticker,
        authority: *wallet,
        positions: [PositionRecord::default(); 3],
    }
}

#[tokio::test]
async fn test_positions_with_amount_skip_empty_and_missing() {
    let ledger = MockLedger::new();
    let payer = Arc::new(Keypair::new());
    let client = test_client(ledger.clone(), MockSwap::empty(), &payer);
    let program_id = test_addresses().program_id;
    let wallet = Pubkey::new_unique();

    let funded = Pubkey::new_unique();
    let drained = Pubkey::new_unique();
    let untouched = Pubkey::new_unique();
    for (ticker, deposited, withdrawn) in [(funded, 40_000_000, 15_000_000), (drained, 10_000_000, 10_000_000)] {
        let address = position_address(&program_id, &wallet, &ticker).unwrap().address;
        let record = position(&wallet, &ticker, deposited, withdrawn);
        ledger.insert(address, record.to_account_data().unwrap());
    }

    let positions = client
        .get_user_positions_with_amount(&wallet, &[funded, drained, untouched])
        .await
        .unwrap();

    assert_eq!(positions.len(), 1);
    assert_eq!(positions[0].ticker, funded.to_string());
    assert_eq!(positions[0].total_deposited, "40");
    assert_eq!(positions[0].total_withdrawn, "15");
}

#[tokio::test]
async fn test_foreign_account_at_position_address_is_malformed() {
    let ledger = MockLedger::new();
    let payer = Arc::new(Keypair::new());
    let client = test_client(ledger.clone(), MockSwap::empty(), &payer);
    let wallet = Pubkey::new_unique();
    let ticker = Pubkey::new_unique();

    let address = position_address(&test_addresses().program_id, &wallet, &ticker)
        .unwrap()
        .address;
    ledger.insert(address, vec![0u8; 120]);

    let err = client
        .get_user_positions_with_amount(&wallet, &[ticker])
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        ClientError::Format(FormatError::MalformedAccount { kind: "userPosition", .. })
    ));
}
