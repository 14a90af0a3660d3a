//! Application-facing views of ledger records
//!
//! Quantities are decimal strings at the ledger scale, identifiers and
//! timestamps are plain integer strings, text is trimmed of padding.

use serde::{Deserialize, Serialize};
use solana_sdk::pubkey::Pubkey;

use super::records::{
    MarketRecord, MarketV1Record, MarketV2Record, OrderDirection, OrderRecord, OrderStatus,
    OrderType, PositionRecord, StakeRecord, StakeVaultRecord, UserPositionRecord, UserRecord,
    UserTradeRecord, WinningDirection,
};
use super::units::{decode_fixed, format_units, CANONICAL_DECIMALS};

fn amount(value: u64) -> String {
    format_units(value, CANONICAL_DECIMALS)
}

/// Normalised market, identical in shape for both schema versions
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarketView {
    pub address: String,
    pub bump: u8,
    pub authority: String,
    pub market_id: String,
    pub name: String,
    pub hype_price: String,
    pub flop_price: String,
    pub hype_liquidity: String,
    pub flop_liquidity: String,
    pub hype_shares: String,
    pub flop_shares: String,
    pub volume: String,
    pub mint: String,
    pub update_ts: String,
    pub opened_orders: String,
    pub next_order_id: String,
    pub fee_bps: u16,
    pub fee_vault: String,
    pub is_active: bool,
    pub market_price: String,
    pub nft_holders_fee_available: String,
    pub nft_holders_fee_claimed: String,
    pub market_fee_available: String,
    pub market_fee_claimed: String,
    pub market_start: String,
    pub market_end: String,
    pub question: String,
    pub winning_direction: WinningDirection,
}

impl MarketView {
    /// Fields the first-generation layout does not carry
    pub const UNAVAILABLE_IN_V1: &'static [&'static str] = &[
        "nftHoldersFeeAvailable",
        "nftHoldersFeeClaimed",
        "marketFeeAvailable",
        "marketFeeClaimed",
    ];

    /// Fields dropped by the current layout
    pub const UNAVAILABLE_IN_V2: &'static [&'static str] = &["name", "feeVault", "marketPrice"];

    pub fn from_record(record: &MarketRecord, address: &Pubkey) -> Self {
        match record {
            MarketRecord::V1(market) => Self::from_v1(market, address),
            MarketRecord::V2(market) => Self::from_v2(market, address),
        }
    }

    pub fn from_v1(market: &MarketV1Record, address: &Pubkey) -> Self {
        let previous = &market.previous_resolved_question;
        // The resolved slot only describes the live question once it has been resolved.
        let winning_direction = if previous.question_id == market.current_question_id {
            previous.winning_direction
        } else {
            WinningDirection::None
        };

        Self {
            address: address.to_string(),
            bump: market.bump,
            authority: market.authority.to_string(),
            market_id: market.market_id.to_string(),
            name: market.name.trim_end().to_string(),
            hype_price: amount(market.hype_price),
            flop_price: amount(market.flop_price),
            hype_liquidity: amount(market.hype_liquidity),
            flop_liquidity: amount(market.flop_liquidity),
            hype_shares: amount(market.total_hype_shares),
            flop_shares: amount(market.total_flop_shares),
            volume: amount(market.total_volume),
            mint: market.mint.to_string(),
            update_ts: market.update_ts.to_string(),
            opened_orders: market.open_orders_count.to_string(),
            next_order_id: market.next_order_id.to_string(),
            fee_bps: market.fee_bps,
            fee_vault: market.fee_vault.to_string(),
            is_active: market.is_active,
            market_price: amount(market.market_price),
            nft_holders_fee_available: amount(0),
            nft_holders_fee_claimed: amount(0),
            market_fee_available: amount(0),
            market_fee_claimed: amount(0),
            market_start: market.current_question_start.to_string(),
            market_end: market.current_question_end.to_string(),
            question: decode_fixed(&market.current_question),
            winning_direction,
        }
    }

    pub fn from_v2(market: &MarketV2Record, address: &Pubkey) -> Self {
        Self {
            address: address.to_string(),
            bump: market.bump,
            authority: market.authority.to_string(),
            market_id: market.market_id.to_string(),
            name: String::new(),
            hype_price: amount(market.hype_price),
            flop_price: amount(market.flop_price),
            hype_liquidity: amount(market.hype_liquidity),
            flop_liquidity: amount(market.flop_liquidity),
            hype_shares: amount(market.hype_shares),
            flop_shares: amount(market.flop_shares),
            volume: amount(market.volume),
            mint: market.mint.to_string(),
            update_ts: market.update_ts.to_string(),
            opened_orders: market.opened_orders.to_string(),
            next_order_id: market.next_order_id.to_string(),
            fee_bps: market.fee_bps,
            fee_vault: Pubkey::default().to_string(),
            is_active: market.is_active,
            market_price: amount(0),
            nft_holders_fee_available: amount(market.nft_holders_fee_available),
            nft_holders_fee_claimed: amount(market.nft_holders_fee_claimed),
            market_fee_available: amount(market.market_fee_available),
            market_fee_claimed: amount(market.market_fee_claimed),
            market_start: market.market_start.to_string(),
            market_end: market.market_end.to_string(),
            question: decode_fixed(&market.question),
            winning_direction: market.winning_direction,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserView {
    pub address: String,
    pub ts: i64,
    pub authority: String,
    pub referral: String,
    pub referred: i64,
    pub name: String,
    pub swaps_made: i16,
    pub swaps: i16,
    pub staked: String,
    pub user_trade: String,
}

impl UserView {
    pub fn new(user: &UserRecord, address: &Pubkey) -> Self {
        Self {
            address: address.to_string(),
            ts: user.ts,
            authority: user.authority.to_string(),
            referral: user.referral.to_string(),
            referred: user.referred,
            name: user.name.trim_end().to_string(),
            swaps_made: user.swaps_made,
            swaps: user.swaps,
            staked: amount(user.staked),
            user_trade: user.user_trade.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderView {
    pub ts: String,
    pub order_id: String,
    pub question_id: String,
    pub market_id: String,
    pub status: OrderStatus,
    pub price: String,
    pub total_amount: String,
    pub total_shares: String,
    pub order_type: OrderType,
    pub direction: OrderDirection,
}

impl From<&OrderRecord> for OrderView {
    fn from(order: &OrderRecord) -> Self {
        Self {
            ts: order.ts.to_string(),
            order_id: order.order_id.to_string(),
            question_id: order.question_id.to_string(),
            market_id: order.market_id.to_string(),
            status: order.status,
            price: amount(order.price),
            total_amount: amount(order.total_amount),
            total_shares: amount(order.total_shares),
            order_type: order.order_type,
            direction: order.direction,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserTradeView {
    pub address: String,
    pub authority: String,
    pub total_deposits: String,
    pub total_withdraws: String,
    pub opened_orders: String,
    /// Occupied slots only
    pub orders: Vec<OrderView>,
}

impl UserTradeView {
    pub fn new(trade: &UserTradeRecord, address: &Pubkey) -> Self {
        Self {
            address: address.to_string(),
            authority: trade.authority.to_string(),
            total_deposits: amount(trade.total_deposits),
            total_withdraws: amount(trade.total_withdraws),
            opened_orders: trade.opened_orders.to_string(),
            orders: trade
                .orders
                .iter()
                .filter(|order| !order.is_empty_slot())
                .map(OrderView::from)
                .collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PositionView {
    pub amount: String,
    pub entry_price: String,
    pub ts: String,
    pub is_long: bool,
    pub is_open: bool,
    pub pnl: String,
}

impl From<&PositionRecord> for PositionView {
    fn from(position: &PositionRecord) -> Self {
        let magnitude = amount(position.pnl.unsigned_abs());
        Self {
            amount: amount(position.amount),
            entry_price: amount(position.entry_price),
            ts: position.ts.to_string(),
            is_long: position.is_long,
            is_open: position.is_open,
            pnl: if position.pnl < 0 {
                format!("-{}", magnitude)
            } else {
                magnitude
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserPositionView {
    pub address: String,
    pub ts: i64,
    pub total_deposited: String,
    pub total_withdrawn: String,
    pub lp_share: String,
    pub total_positions: u16,
    pub ticker: String,
    pub authority: String,
    /// Slots that were ever used
    pub positions: Vec<PositionView>,
}

impl UserPositionView {
    pub fn new(record: &UserPositionRecord, address: &Pubkey) -> Self {
        Self {
            address: address.to_string(),
            ts: record.ts,
            total_deposited: amount(record.total_deposited),
            total_withdrawn: amount(record.total_withdrawn),
            lp_share: amount(record.lp_share),
            total_positions: record.total_positions,
            ticker: record.ticker.to_string(),
            authority: record.authority.to_string(),
            positions: record
                .positions
                .iter()
                .filter(|position| **position != PositionRecord::default())
                .map(PositionView::from)
                .collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StakeView {
    pub address: String,
    pub authority: String,
    pub init_ts: i64,
    pub withdraw_ts: i64,
    pub claimed_ts: i64,
    pub name: String,
    pub mint: String,
    pub boost: bool,
    pub stake_vault: String,
    pub claimed: String,
    pub available: String,
    pub amount: String,
}

impl StakeView {
    pub fn new(stake: &StakeRecord, address: &Pubkey) -> Self {
        Self {
            address: address.to_string(),
            authority: stake.authority.to_string(),
            init_ts: stake.init_ts,
            withdraw_ts: stake.withdraw_ts,
            claimed_ts: stake.claimed_ts,
            name: stake.name.trim_end().to_string(),
            mint: stake.mint.to_string(),
            boost: stake.boost,
            stake_vault: stake.stake_vault.to_string(),
            claimed: amount(stake.claimed),
            available: amount(stake.available),
            amount: amount(stake.amount),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StakeVaultView {
    pub address: String,
    pub authority: String,
    pub init_ts: i64,
    pub end_ts: i64,
    pub amount: String,
    pub amount_paid: String,
    pub token_decimals: u8,
    pub nft_staked: u64,
    pub slots: u64,
    pub is_locked: bool,
    pub name: String,
    pub collection: String,
    pub token_mint: String,
    pub week: u8,
    pub token_staked: String,
    pub sum_all_users: f64,
}

impl StakeVaultView {
    /// Vault quantities use the vault's own token decimals.
    pub fn new(vault: &StakeVaultRecord, address: &Pubkey) -> Self {
        let decimals = vault.token_decimals;
        Self {
            address: address.to_string(),
            authority: vault.authority.to_string(),
            init_ts: vault.init_ts,
            end_ts: vault.end_ts,
            amount: format_units(vault.amount, decimals),
            amount_paid: format_units(vault.amount_paid, decimals),
            token_decimals: decimals,
            nft_staked: vault.nft_staked,
            slots: vault.slots,
            is_locked: vault.is_locked,
            name: vault.name.trim_end().to_string(),
            collection: vault.collection.trim_end().to_string(),
            token_mint: vault.token_mint.to_string(),
            week: vault.week,
            token_staked: format_units(vault.token_staked, decimals),
            sum_all_users: vault.sum_all_users,
        }
    }
}
