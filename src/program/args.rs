//! Borsh argument structs of the program's instructions

use borsh::{BorshDeserialize, BorshSerialize};

use crate::state::records::{OrderDirection, Rarity};
use crate::state::units::{COMMENT_LEN, QUESTION_LEN};

#[derive(BorshSerialize, BorshDeserialize, Debug, Clone, PartialEq, Eq)]
pub struct OpenOrderArgs {
    pub amount: u64,
    pub direction: OrderDirection,
    pub comment: Option<[u8; COMMENT_LEN]>,
}

#[derive(BorshSerialize, BorshDeserialize, Debug, Clone, PartialEq, Eq)]
pub struct AddLiquidityArgs {
    pub amount: u64,
    pub direction: OrderDirection,
}

#[derive(BorshSerialize, BorshDeserialize, Debug, Clone, PartialEq, Eq)]
pub struct CreateUserArgs {
    pub name: String,
}

#[derive(BorshSerialize, BorshDeserialize, Debug, Clone, PartialEq, Eq)]
pub struct InitializeMarketArgs {
    pub name: String,
    pub market_id: u64,
    pub question: [u8; QUESTION_LEN],
    pub start_time: i64,
    pub end_time: i64,
}

#[derive(BorshSerialize, BorshDeserialize, Debug, Clone, PartialEq, Eq)]
pub struct StakeTokenArgs {
    pub stake_vault: String,
    pub name: String,
    pub amount: u64,
}

#[derive(BorshSerialize, BorshDeserialize, Debug, Clone, PartialEq, Eq)]
pub struct ClaimStakeRewardsArgs {
    pub rank: u16,
    pub collections: u8,
}

#[derive(BorshSerialize, BorshDeserialize, Debug, Clone, PartialEq, Eq)]
pub struct CreateCollectionArgs {
    pub name: String,
    pub symbol: String,
    /// Maximum number of tickets the collection will mint
    pub supply: u64,
}

#[derive(BorshSerialize, BorshDeserialize, Debug, Clone, PartialEq, Eq)]
pub struct MintTicketArgs {
    pub collection_symbol: String,
    /// Percent off the tier price
    pub discount: u64,
    pub is_boosted: bool,
    pub number: u64,
    pub rarity: Rarity,
}
