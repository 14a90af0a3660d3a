//! Ledger account schemas and their normalised views
//!
//! Raw account bytes are decoded into typed records (`records`), then
//! formatted into serialisable views (`views`). Formatting is pure and
//! never fails on a well-formed record.

pub mod errors;
pub mod records;
pub mod units;
pub mod views;

pub use errors::FormatError;
pub use records::{
    AccountRecord, MarketRecord, MarketV1Record, MarketV2Record, OrderDirection, OrderRecord,
    OrderStatus, OrderType, PositionRecord, Rarity, StakeRecord, StakeVaultRecord,
    UserPositionRecord, UserRecord, UserTradeRecord, WinningDirection,
};
pub use units::{decode_fixed, encode_fixed, format_units, parse_units, CANONICAL_DECIMALS};
pub use views::{
    MarketView, OrderView, PositionView, StakeVaultView, StakeView, UserPositionView,
    UserTradeView, UserView,
};
