//! Typed borsh schemas of the ledger accounts
//!
//! Each record mirrors the on-chain layout after the 8-byte Anchor account
//! discriminator. Enum tags are decoded exhaustively; an unknown tag fails
//! the whole decode instead of falling back to a default.

use borsh::{BorshDeserialize, BorshSerialize};
use serde::{Deserialize, Serialize};
use solana_sdk::pubkey::Pubkey;

use super::errors::FormatError;
use super::units::QUESTION_LEN;

/// Length of the Anchor account discriminator prefix
pub const DISCRIMINATOR_LEN: usize = 8;

/// Byte offset of the `name` bytes inside a serialised user account:
/// discriminator, ts, authority, bump, referral, referred, then the
/// 4-byte string length prefix.
pub const USER_NAME_OFFSET: usize = DISCRIMINATOR_LEN + 8 + 32 + 1 + 32 + 8 + 4;

/// A ledger account type with a fixed discriminator
pub trait AccountRecord: BorshSerialize + BorshDeserialize + Sized {
    /// Record kind, used in error messages
    const KIND: &'static str;
    /// `sha256("account:<Name>")[..8]`
    const DISCRIMINATOR: [u8; 8];

    /// Decode raw account data, checking the discriminator first.
    fn decode(data: &[u8]) -> Result<Self, FormatError> {
        if data.len() < DISCRIMINATOR_LEN {
            return Err(FormatError::malformed(
                Self::KIND,
                format!("{} bytes is shorter than the discriminator", data.len()),
            ));
        }
        if data[..DISCRIMINATOR_LEN] != Self::DISCRIMINATOR {
            return Err(FormatError::malformed(Self::KIND, "discriminator mismatch"));
        }

        // Accounts are allocated with slack, so trailing bytes are expected.
        let mut body = &data[DISCRIMINATOR_LEN..];
        Self::deserialize(&mut body).map_err(|e| FormatError::malformed(Self::KIND, e.to_string()))
    }

    /// Serialise with the discriminator prefix, as the program stores it.
    fn to_account_data(&self) -> std::io::Result<Vec<u8>> {
        let mut data = Self::DISCRIMINATOR.to_vec();
        self.serialize(&mut data)?;
        Ok(data)
    }
}

// ============================================================================
// Enums
// ============================================================================

#[derive(BorshSerialize, BorshDeserialize, Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WinningDirection {
    None,
    Hype,
    Flop,
}

#[derive(BorshSerialize, BorshDeserialize, Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OrderDirection {
    Hype,
    Flop,
}

#[derive(BorshSerialize, BorshDeserialize, Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OrderStatus {
    Init,
    Open,
    Closed,
    Claimed,
    Liquidated,
}

#[derive(BorshSerialize, BorshDeserialize, Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OrderType {
    Market,
    Limit,
}

/// Ticket tier; sets the mint price in the canonical asset
#[derive(BorshSerialize, BorshDeserialize, Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Rarity {
    Common,
    Uncommon,
    Rare,
    Epic,
    Legendary,
    Mythic,
}

// ============================================================================
// Markets
// ============================================================================

#[derive(BorshSerialize, BorshDeserialize, Debug, Clone, PartialEq, Eq)]
pub struct ResolvedQuestion {
    pub question_id: u64,
    pub question: [u8; QUESTION_LEN],
    pub start_time: i64,
    pub end_time: i64,
    pub hype_liquidity: u64,
    pub flop_liquidity: u64,
    pub winning_direction: WinningDirection,
    pub market_price: u64,
    pub final_hype_price: u64,
    pub final_flop_price: u64,
    pub total_hype_shares: u64,
    pub total_flop_shares: u64,
    pub padding: [u8; 40],
}

/// First-generation market layout (`market` account)
#[derive(BorshSerialize, BorshDeserialize, Debug, Clone, PartialEq, Eq)]
pub struct MarketV1Record {
    pub bump: u8,
    pub authority: Pubkey,
    pub market_id: u64,
    pub name: String,
    pub hype_price: u64,
    pub flop_price: u64,
    pub hype_liquidity: u64,
    pub flop_liquidity: u64,
    pub total_hype_shares: u64,
    pub total_flop_shares: u64,
    pub total_volume: u64,
    pub mint: Pubkey,
    pub ts: i64,
    pub update_ts: i64,
    pub open_orders_count: u64,
    pub next_order_id: u64,
    pub fee_bps: u16,
    pub fee_vault: Pubkey,
    pub is_active: bool,
    pub market_price: u64,
    pub previous_resolved_question: ResolvedQuestion,
    pub current_question_id: u64,
    pub current_question_start: i64,
    pub current_question_end: i64,
    pub current_question: [u8; QUESTION_LEN],
    pub liquidity: u64,
    pub padding: [u8; 200],
}

impl AccountRecord for MarketV1Record {
    const KIND: &'static str = "market";
    const DISCRIMINATOR: [u8; 8] = [219, 190, 213, 55, 0, 227, 198, 154];
}

/// Current market layout (`marketV2` account)
#[derive(BorshSerialize, BorshDeserialize, Debug, Clone, PartialEq, Eq)]
pub struct MarketV2Record {
    pub bump: u8,
    pub authority: Pubkey,
    pub market_id: u64,
    pub hype_price: u64,
    pub flop_price: u64,
    pub hype_liquidity: u64,
    pub flop_liquidity: u64,
    pub hype_shares: u64,
    pub flop_shares: u64,
    pub volume: u64,
    pub mint: Pubkey,
    pub update_ts: i64,
    pub opened_orders: u64,
    pub next_order_id: u64,
    pub fee_bps: u16,
    pub nft_holders_fee_available: u64,
    pub nft_holders_fee_claimed: u64,
    pub market_fee_available: u64,
    pub market_fee_claimed: u64,
    pub is_active: bool,
    pub market_start: i64,
    pub market_end: i64,
    pub question: [u8; QUESTION_LEN],
    pub winning_direction: WinningDirection,
    pub market_liquidity_at_start: u64,
    pub padding: [u8; 92],
}

impl AccountRecord for MarketV2Record {
    const KIND: &'static str = "marketV2";
    const DISCRIMINATOR: [u8; 8] = [27, 60, 50, 75, 191, 193, 86, 227];
}

impl MarketV2Record {
    /// Accrued-but-unclaimed fees across the market and NFT-holder buckets,
    /// in minor units. A claimed amount above its available amount counts
    /// as zero for that bucket.
    pub fn unclaimed_fees(&self) -> u64 {
        let market = self
            .market_fee_available
            .saturating_sub(self.market_fee_claimed);
        let holders = self
            .nft_holders_fee_available
            .saturating_sub(self.nft_holders_fee_claimed);
        market.saturating_add(holders)
    }
}

/// Either market layout, selected by discriminator
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MarketRecord {
    V1(Box<MarketV1Record>),
    V2(Box<MarketV2Record>),
}

impl MarketRecord {
    /// Version-tagged decode: the discriminator picks the schema.
    pub fn decode(data: &[u8]) -> Result<Self, FormatError> {
        match data.get(..DISCRIMINATOR_LEN) {
            Some(prefix) if prefix == MarketV1Record::DISCRIMINATOR => {
                MarketV1Record::decode(data).map(|r| Self::V1(Box::new(r)))
            }
            Some(prefix) if prefix == MarketV2Record::DISCRIMINATOR => {
                MarketV2Record::decode(data).map(|r| Self::V2(Box::new(r)))
            }
            Some(_) => Err(FormatError::malformed("market", "unknown market discriminator")),
            None => Err(FormatError::malformed("market", "account data too short")),
        }
    }
}

// ============================================================================
// Users and orders
// ============================================================================

#[derive(BorshSerialize, BorshDeserialize, Debug, Clone, PartialEq, Eq)]
pub struct UserRecord {
    pub ts: i64,
    pub authority: Pubkey,
    pub bump: u8,
    pub referral: Pubkey,
    pub referred: i64,
    pub name: String,
    pub swaps: i16,
    pub swaps_made: i16,
    pub staked: u64,
    pub first_swap: i64,
    pub user_trade: Pubkey,
}

impl AccountRecord for UserRecord {
    const KIND: &'static str = "user";
    const DISCRIMINATOR: [u8; 8] = [159, 117, 95, 227, 239, 151, 58, 236];
}

#[derive(BorshSerialize, BorshDeserialize, Debug, Clone, PartialEq, Eq)]
pub struct OrderRecord {
    pub ts: i64,
    pub order_id: u64,
    pub question_id: u64,
    pub market_id: u64,
    pub status: OrderStatus,
    pub price: u64,
    pub total_amount: u64,
    pub total_shares: u64,
    pub order_type: OrderType,
    pub direction: OrderDirection,
    pub padding: [u8; 32],
}

impl OrderRecord {
    /// An unused slot of the fixed-size order array
    pub fn is_empty_slot(&self) -> bool {
        self.status == OrderStatus::Init && self.order_id == 0 && self.total_amount == 0
    }
}

/// Number of order slots in a trade ledger
pub const ORDER_SLOTS: usize = 10;

#[derive(BorshSerialize, BorshDeserialize, Debug, Clone, PartialEq, Eq)]
pub struct UserTradeRecord {
    pub bump: u8,
    pub authority: Pubkey,
    pub total_deposits: u64,
    pub total_withdraws: u64,
    pub opened_orders: u64,
    pub orders: [OrderRecord; ORDER_SLOTS],
    pub padding: [u8; 32],
}

impl AccountRecord for UserTradeRecord {
    const KIND: &'static str = "userTrade";
    const DISCRIMINATOR: [u8; 8] = [149, 190, 47, 218, 136, 9, 222, 222];
}

// ============================================================================
// Vault positions
// ============================================================================

#[derive(BorshSerialize, BorshDeserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PositionRecord {
    pub amount: u64,
    pub entry_price: u64,
    pub ts: i64,
    pub is_long: bool,
    pub is_open: bool,
    pub pnl: i64,
}

/// Number of position slots in a user position account
pub const POSITION_SLOTS: usize = 3;

/// Deposits of one wallet into one ticker vault
#[derive(BorshSerialize, BorshDeserialize, Debug, Clone, PartialEq, Eq)]
pub struct UserPositionRecord {
    pub ts: i64,
    pub bump: u8,
    pub total_deposited: u64,
    pub total_withdrawn: u64,
    pub lp_share: u64,
    pub total_positions: u16,
    pub ticker: Pubkey,
    pub authority: Pubkey,
    pub positions: [PositionRecord; POSITION_SLOTS],
}

impl AccountRecord for UserPositionRecord {
    const KIND: &'static str = "userPosition";
    const DISCRIMINATOR: [u8; 8] = [251, 248, 209, 245, 83, 234, 17, 27];
}

impl UserPositionRecord {
    /// Whether anything deposited is still in the vault
    pub fn has_balance(&self) -> bool {
        self.total_deposited > self.total_withdrawn
    }
}

// ============================================================================
// Staking
// ============================================================================

#[derive(BorshSerialize, BorshDeserialize, Debug, Clone, PartialEq, Eq)]
pub struct StakeRecord {
    pub bump: u8,
    pub authority: Pubkey,
    pub init_ts: i64,
    pub withdraw_ts: i64,
    pub claimed_ts: i64,
    pub name: String,
    pub mint: Pubkey,
    pub boost: bool,
    pub stake_vault: Pubkey,
    pub claimed: u64,
    pub available: u64,
    pub amount: u64,
}

impl AccountRecord for StakeRecord {
    const KIND: &'static str = "stakeV2";
    const DISCRIMINATOR: [u8; 8] = [207, 98, 130, 13, 118, 181, 238, 47];
}

#[derive(BorshSerialize, BorshDeserialize, Debug, Clone, PartialEq)]
pub struct StakeVaultRecord {
    pub bump: u8,
    pub authority: Pubkey,
    pub init_ts: i64,
    pub end_ts: i64,
    pub amount: u64,
    pub amount_paid: u64,
    pub token_decimals: u8,
    pub nft_staked: u64,
    pub slots: u64,
    pub is_locked: bool,
    pub name: String,
    pub collection: String,
    pub token_mint: Pubkey,
    pub week: u8,
    pub token_staked: u64,
    pub sum_all_users: f64,
    pub padding: [u8; 32],
}

impl AccountRecord for StakeVaultRecord {
    const KIND: &'static str = "stakeVault";
    const DISCRIMINATOR: [u8; 8] = [192, 112, 65, 125, 129, 151, 173, 226];
}
