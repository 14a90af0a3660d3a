//! Instruction builders for the triad program

use borsh::BorshSerialize;
use solana_sdk::{
    instruction::{AccountMeta, Instruction},
    pubkey,
    pubkey::Pubkey,
    system_program,
};

use super::args::{
    AddLiquidityArgs, ClaimStakeRewardsArgs, CreateCollectionArgs, CreateUserArgs,
    InitializeMarketArgs, MintTicketArgs, OpenOrderArgs, StakeTokenArgs,
};
use crate::derivation::{
    collection_address, market_address, stake_address, stake_vault_address, ticket_address,
    token_account_address, user_address, user_trade_address,
};
use crate::state::records::WinningDirection;
use crate::tx_builder::TransactionBuilderError;

/// Discriminators as published in the program IDL
pub mod discriminators {
    pub const ADD_LIQUIDITY: [u8; 8] = [181, 157, 89, 67, 143, 182, 52, 72];
    pub const CLAIM_STAKE_REWARDS: [u8; 8] = [107, 91, 233, 196, 211, 47, 218, 21];
    pub const CLOSE_ORDER: [u8; 8] = [90, 103, 209, 28, 7, 63, 168, 4];
    pub const COLLECT_FEE: [u8; 8] = [60, 173, 247, 103, 4, 93, 130, 48];
    pub const CREATE_COLLECTION: [u8; 8] = [156, 251, 92, 54, 233, 2, 16, 82];
    pub const CREATE_USER: [u8; 8] = [108, 227, 130, 130, 252, 109, 75, 218];
    pub const CREATE_USER_TRADE: [u8; 8] = [232, 235, 58, 194, 135, 248, 153, 1];
    pub const INITIALIZE_MARKET: [u8; 8] = [35, 35, 189, 193, 155, 48, 170, 203];
    pub const MINT_TICKET: [u8; 8] = [159, 167, 223, 60, 138, 6, 23, 29];
    pub const OPEN_ORDER: [u8; 8] = [206, 88, 88, 143, 38, 136, 50, 224];
    pub const PAYOUT_ORDER: [u8; 8] = [247, 233, 158, 228, 63, 32, 236, 113];
    pub const REQUEST_WITHDRAW_STAKE: [u8; 8] = [175, 9, 77, 31, 145, 136, 30, 207];
    pub const RESOLVE_MARKET: [u8; 8] = [155, 23, 80, 173, 46, 74, 23, 239];
    pub const SETTLE_ORDER: [u8; 8] = [80, 74, 204, 34, 12, 183, 66, 66];
    pub const STAKE_TOKEN: [u8; 8] = [191, 127, 193, 101, 37, 96, 87, 211];
    pub const WITHDRAW_STAKE: [u8; 8] = [153, 8, 22, 138, 105, 176, 87, 66];
}

/// Metaplex Core, which owns ticket collections and assets
pub const CORE_PROGRAM_ID: Pubkey = pubkey!("CoREENxT6tW1HoK8ypY1SxRMZTcVPm7R94rH4PZNhX7d");

/// Settlement actions on an existing order; they share one account layout
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderAction {
    Close,
    Settle,
    Payout,
}

impl OrderAction {
    fn discriminator(self) -> [u8; 8] {
        match self {
            Self::Close => discriminators::CLOSE_ORDER,
            Self::Settle => discriminators::SETTLE_ORDER,
            Self::Payout => discriminators::PAYOUT_ORDER,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Close => "close_order",
            Self::Settle => "settle_order",
            Self::Payout => "payout_order",
        }
    }
}

/// Deployment-specific handle for building program instructions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TriadProgram {
    pub program_id: Pubkey,
    pub token_program: Pubkey,
    /// Canonical asset the program trades and stakes in
    pub mint: Pubkey,
}

impl TriadProgram {
    pub fn new(program_id: Pubkey, token_program: Pubkey, mint: Pubkey) -> Self {
        Self {
            program_id,
            token_program,
            mint,
        }
    }

    /// Canonical-asset token account of `owner`
    pub fn token_account(&self, owner: &Pubkey) -> Result<Pubkey, TransactionBuilderError> {
        Ok(token_account_address(owner, &self.mint, &self.token_program)?.address)
    }

    fn tail_accounts(&self, with_ata_program: bool) -> Vec<AccountMeta> {
        let mut metas = vec![AccountMeta::new_readonly(self.token_program, false)];
        if with_ata_program {
            metas.push(AccountMeta::new_readonly(spl_associated_token_account::id(), false));
        }
        metas.push(AccountMeta::new_readonly(system_program::id(), false));
        metas
    }

    fn instruction(&self, data: Vec<u8>, accounts: Vec<AccountMeta>) -> Instruction {
        Instruction {
            program_id: self.program_id,
            accounts,
            data,
        }
    }

    pub fn create_user_trade(&self, signer: &Pubkey) -> Result<Instruction, TransactionBuilderError> {
        let user = user_address(&self.program_id, signer)?.address;
        let user_trade = user_trade_address(&self.program_id, signer)?.address;

        Ok(self.instruction(
            discriminators::CREATE_USER_TRADE.to_vec(),
            vec![
                AccountMeta::new(*signer, true),
                AccountMeta::new(user, false),
                AccountMeta::new(user_trade, false),
                AccountMeta::new_readonly(system_program::id(), false),
            ],
        ))
    }

    pub fn open_order(
        &self,
        signer: &Pubkey,
        market_id: u64,
        args: &OpenOrderArgs,
    ) -> Result<Instruction, TransactionBuilderError> {
        let market = market_address(&self.program_id, market_id)?.address;
        let user_trade = user_trade_address(&self.program_id, signer)?.address;

        let mut accounts = vec![
            AccountMeta::new(*signer, true),
            AccountMeta::new(user_trade, false),
            AccountMeta::new(market, false),
            AccountMeta::new(self.mint, false),
            AccountMeta::new(self.token_account(signer)?, false),
            AccountMeta::new(self.token_account(&market)?, false),
        ];
        accounts.extend(self.tail_accounts(true));

        Ok(self.instruction(encode(discriminators::OPEN_ORDER, args, "open_order")?, accounts))
    }

    pub fn order_action(
        &self,
        action: OrderAction,
        signer: &Pubkey,
        market_id: u64,
        order_id: u64,
    ) -> Result<Instruction, TransactionBuilderError> {
        let market = market_address(&self.program_id, market_id)?.address;
        let user_trade = user_trade_address(&self.program_id, signer)?.address;

        let mut accounts = vec![
            AccountMeta::new(*signer, true),
            AccountMeta::new(user_trade, false),
            AccountMeta::new(market, false),
            AccountMeta::new(self.mint, false),
            AccountMeta::new(self.token_account(signer)?, false),
            AccountMeta::new(self.token_account(&market)?, false),
        ];
        accounts.extend(self.tail_accounts(true));

        Ok(self.instruction(
            encode(action.discriminator(), &order_id, action.name())?,
            accounts,
        ))
    }

    pub fn add_liquidity(
        &self,
        signer: &Pubkey,
        market_id: u64,
        args: &AddLiquidityArgs,
    ) -> Result<Instruction, TransactionBuilderError> {
        let market = market_address(&self.program_id, market_id)?.address;

        let mut accounts = vec![
            AccountMeta::new(*signer, true),
            AccountMeta::new(market, false),
            AccountMeta::new(self.mint, false),
            AccountMeta::new(self.token_account(signer)?, false),
            AccountMeta::new(self.token_account(&market)?, false),
        ];
        accounts.extend(self.tail_accounts(true));

        Ok(self.instruction(
            encode(discriminators::ADD_LIQUIDITY, args, "add_liquidity")?,
            accounts,
        ))
    }

    pub fn collect_fee(&self, signer: &Pubkey, market_id: u64) -> Result<Instruction, TransactionBuilderError> {
        let market = market_address(&self.program_id, market_id)?.address;

        let mut accounts = vec![
            AccountMeta::new(*signer, true),
            AccountMeta::new(market, false),
            AccountMeta::new(self.mint, false),
            AccountMeta::new(self.token_account(&market)?, false),
            AccountMeta::new(self.token_account(signer)?, false),
        ];
        accounts.extend(self.tail_accounts(true));

        Ok(self.instruction(discriminators::COLLECT_FEE.to_vec(), accounts))
    }

    pub fn initialize_market(
        &self,
        signer: &Pubkey,
        args: &InitializeMarketArgs,
    ) -> Result<Instruction, TransactionBuilderError> {
        let market = market_address(&self.program_id, args.market_id)?.address;

        let mut accounts = vec![
            AccountMeta::new(*signer, true),
            AccountMeta::new(market, false),
            AccountMeta::new(self.mint, false),
            AccountMeta::new(self.token_account(&market)?, false),
        ];
        accounts.extend(self.tail_accounts(true));

        Ok(self.instruction(
            encode(discriminators::INITIALIZE_MARKET, args, "initialize_market")?,
            accounts,
        ))
    }

    pub fn resolve_market(
        &self,
        signer: &Pubkey,
        market_id: u64,
        winning_direction: WinningDirection,
    ) -> Result<Instruction, TransactionBuilderError> {
        let market = market_address(&self.program_id, market_id)?.address;

        Ok(self.instruction(
            encode(discriminators::RESOLVE_MARKET, &winning_direction, "resolve_market")?,
            vec![
                AccountMeta::new(*signer, true),
                AccountMeta::new(market, false),
                AccountMeta::new_readonly(system_program::id(), false),
            ],
        ))
    }

    pub fn create_user(
        &self,
        signer: &Pubkey,
        referral: &Pubkey,
        args: &CreateUserArgs,
    ) -> Result<Instruction, TransactionBuilderError> {
        let user = user_address(&self.program_id, signer)?.address;

        Ok(self.instruction(
            encode(discriminators::CREATE_USER, args, "create_user")?,
            vec![
                AccountMeta::new(*signer, true),
                AccountMeta::new(*referral, false),
                AccountMeta::new(user, false),
                AccountMeta::new_readonly(system_program::id(), false),
            ],
        ))
    }

    pub fn stake_token(
        &self,
        signer: &Pubkey,
        args: &StakeTokenArgs,
    ) -> Result<Instruction, TransactionBuilderError> {
        let stake_vault = stake_vault_address(&self.program_id, &args.stake_vault)?.address;
        let user = user_address(&self.program_id, signer)?.address;
        let stake = stake_address(&self.program_id, signer, &args.name)?.address;

        let mut accounts = vec![
            AccountMeta::new(*signer, true),
            AccountMeta::new(stake_vault, false),
            AccountMeta::new(user, false),
            AccountMeta::new(stake, false),
            AccountMeta::new(self.mint, false),
            AccountMeta::new(self.token_account(signer)?, false),
            AccountMeta::new(self.token_account(&stake_vault)?, false),
        ];
        accounts.extend(self.tail_accounts(true));

        Ok(self.instruction(
            encode(discriminators::STAKE_TOKEN, args, "stake_token")?,
            accounts,
        ))
    }

    pub fn request_withdraw_stake(
        &self,
        signer: &Pubkey,
        stake_vault_name: &str,
        stake_name: &str,
    ) -> Result<Instruction, TransactionBuilderError> {
        let stake_vault = stake_vault_address(&self.program_id, stake_vault_name)?.address;
        let user = user_address(&self.program_id, signer)?.address;
        let stake = stake_address(&self.program_id, signer, stake_name)?.address;

        let mut accounts = vec![
            AccountMeta::new(*signer, true),
            AccountMeta::new(stake_vault, false),
            AccountMeta::new(user, false),
            AccountMeta::new(stake, false),
            AccountMeta::new(self.mint, false),
        ];
        accounts.extend(self.tail_accounts(false));

        Ok(self.instruction(discriminators::REQUEST_WITHDRAW_STAKE.to_vec(), accounts))
    }

    pub fn withdraw_stake(
        &self,
        signer: &Pubkey,
        admin: &Pubkey,
        stake_vault_name: &str,
        stake_name: &str,
    ) -> Result<Instruction, TransactionBuilderError> {
        let stake_vault = stake_vault_address(&self.program_id, stake_vault_name)?.address;
        let user = user_address(&self.program_id, signer)?.address;
        let stake = stake_address(&self.program_id, signer, stake_name)?.address;

        let mut accounts = vec![
            AccountMeta::new(*signer, true),
            AccountMeta::new(stake_vault, false),
            AccountMeta::new(user, false),
            AccountMeta::new(stake, false),
            AccountMeta::new(*admin, false),
            AccountMeta::new(self.mint, false),
            AccountMeta::new(self.token_account(&stake_vault)?, false),
            AccountMeta::new(self.token_account(signer)?, false),
        ];
        accounts.extend(self.tail_accounts(true));

        Ok(self.instruction(discriminators::WITHDRAW_STAKE.to_vec(), accounts))
    }

    /// Reward claims are co-signed by the verifier authority.
    pub fn claim_stake_rewards(
        &self,
        signer: &Pubkey,
        verifier: &Pubkey,
        stake_vault_name: &str,
        stake_name: &str,
        args: &ClaimStakeRewardsArgs,
    ) -> Result<Instruction, TransactionBuilderError> {
        let stake_vault = stake_vault_address(&self.program_id, stake_vault_name)?.address;
        let stake = stake_address(&self.program_id, signer, stake_name)?.address;

        let mut accounts = vec![
            AccountMeta::new(*signer, true),
            AccountMeta::new(*verifier, true),
            AccountMeta::new(stake_vault, false),
            AccountMeta::new(stake, false),
            AccountMeta::new(self.mint, false),
            AccountMeta::new(self.token_account(&stake_vault)?, false),
            AccountMeta::new(self.token_account(signer)?, false),
        ];
        accounts.extend(self.tail_accounts(true));

        Ok(self.instruction(
            encode(discriminators::CLAIM_STAKE_REWARDS, args, "claim_stake_rewards")?,
            accounts,
        ))
    }

    /// `core_collection` is a fresh keypair's address and co-signs.
    pub fn create_collection(
        &self,
        signer: &Pubkey,
        core_collection: &Pubkey,
        args: &CreateCollectionArgs,
    ) -> Result<Instruction, TransactionBuilderError> {
        let collection = collection_address(&self.program_id, &args.symbol)?.address;

        Ok(self.instruction(
            encode(discriminators::CREATE_COLLECTION, args, "create_collection")?,
            vec![
                AccountMeta::new(*signer, true),
                AccountMeta::new(*core_collection, true),
                AccountMeta::new(collection, false),
                AccountMeta::new_readonly(CORE_PROGRAM_ID, false),
                AccountMeta::new_readonly(spl_token::id(), false),
                AccountMeta::new_readonly(spl_associated_token_account::id(), false),
                AccountMeta::new_readonly(system_program::id(), false),
            ],
        ))
    }

    /// Burns `nft_mint` and mints a ticket asset into `core_collection`.
    /// Signed by the wallet, the verifier and the fresh `asset` key.
    pub fn mint_ticket(
        &self,
        signer: &Pubkey,
        verifier: &Pubkey,
        asset: &Pubkey,
        nft_mint: &Pubkey,
        core_collection: &Pubkey,
        args: &MintTicketArgs,
    ) -> Result<Instruction, TransactionBuilderError> {
        let ticket = ticket_address(&self.program_id, args.number)?.address;
        let collection = collection_address(&self.program_id, &args.collection_symbol)?.address;
        let nft_account = token_account_address(signer, nft_mint, &self.token_program)?.address;

        let mut accounts = vec![
            AccountMeta::new(*signer, true),
            AccountMeta::new(ticket, false),
            AccountMeta::new(*verifier, true),
            AccountMeta::new(*asset, true),
            AccountMeta::new(*nft_mint, false),
            AccountMeta::new(collection, false),
            AccountMeta::new(*core_collection, false),
            AccountMeta::new(self.mint, false),
            AccountMeta::new(self.token_account(signer)?, false),
            AccountMeta::new(nft_account, false),
            AccountMeta::new_readonly(CORE_PROGRAM_ID, false),
        ];
        accounts.extend(self.tail_accounts(true));

        Ok(self.instruction(
            encode(discriminators::MINT_TICKET, args, "mint_ticket")?,
            accounts,
        ))
    }
}

fn encode<T: BorshSerialize>(
    discriminator: [u8; 8],
    args: &T,
    name: &str,
) -> Result<Vec<u8>, TransactionBuilderError> {
    let mut data = discriminator.to_vec();
    args.serialize(&mut data)
        .map_err(|e| TransactionBuilderError::instruction_failed(name, e.to_string()))?;
    Ok(data)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::program::instruction_discriminator;
    use crate::state::records::{OrderDirection, Rarity};
    use crate::state::units::encode_fixed;
    use borsh::BorshDeserialize;

    fn program() -> TriadProgram {
        TriadProgram::new(
            Pubkey::new_unique(),
            Pubkey::new_unique(),
            Pubkey::new_unique(),
        )
    }

    #[test]
    fn test_discriminators_match_anchor_hash() {
        let pairs = [
            (discriminators::ADD_LIQUIDITY, "add_liquidity"),
            (discriminators::CLAIM_STAKE_REWARDS, "claim_stake_rewards"),
            (discriminators::CLOSE_ORDER, "close_order"),
            (discriminators::COLLECT_FEE, "collect_fee"),
            (discriminators::CREATE_COLLECTION, "create_collection"),
            (discriminators::CREATE_USER, "create_user"),
            (discriminators::CREATE_USER_TRADE, "create_user_trade"),
            (discriminators::INITIALIZE_MARKET, "initialize_market"),
            (discriminators::MINT_TICKET, "mint_ticket"),
            (discriminators::OPEN_ORDER, "open_order"),
            (discriminators::PAYOUT_ORDER, "payout_order"),
            (discriminators::REQUEST_WITHDRAW_STAKE, "request_withdraw_stake"),
            (discriminators::RESOLVE_MARKET, "resolve_market"),
            (discriminators::SETTLE_ORDER, "settle_order"),
            (discriminators::STAKE_TOKEN, "stake_token"),
            (discriminators::WITHDRAW_STAKE, "withdraw_stake"),
        ];
        for (expected, name) in pairs {
            assert_eq!(instruction_discriminator(name), expected, "{}", name);
        }
    }

    #[test]
    fn test_open_order_layout() {
        let program = program();
        let signer = Pubkey::new_unique();
        let args = OpenOrderArgs {
            amount: 10_000_000,
            direction: OrderDirection::Flop,
            comment: Some(encode_fixed("gm").unwrap()),
        };

        let ix = program.open_order(&signer, 7, &args).unwrap();
        assert_eq!(ix.program_id, program.program_id);
        assert_eq!(&ix.data[..8], &discriminators::OPEN_ORDER);
        assert_eq!(OpenOrderArgs::try_from_slice(&ix.data[8..]).unwrap(), args);

        assert_eq!(ix.accounts.len(), 9);
        assert_eq!(ix.accounts[0].pubkey, signer);
        assert!(ix.accounts[0].is_signer && ix.accounts[0].is_writable);
        assert_eq!(ix.accounts.iter().filter(|m| m.is_signer).count(), 1);
        assert_eq!(
            ix.accounts[2].pubkey,
            market_address(&program.program_id, 7).unwrap().address
        );
        assert_eq!(ix.accounts[8].pubkey, system_program::id());
        assert!(!ix.accounts[8].is_writable);
    }

    #[test]
    fn test_order_actions_encode_order_id() {
        let program = program();
        let signer = Pubkey::new_unique();
        for action in [OrderAction::Close, OrderAction::Settle, OrderAction::Payout] {
            let ix = program.order_action(action, &signer, 1, 99).unwrap();
            assert_eq!(&ix.data[..8], &action.discriminator());
            assert_eq!(&ix.data[8..], &99u64.to_le_bytes());
        }
    }

    #[test]
    fn test_claim_rewards_requires_two_signers() {
        let program = program();
        let signer = Pubkey::new_unique();
        let verifier = Pubkey::new_unique();
        let ix = program
            .claim_stake_rewards(
                &signer,
                &verifier,
                "vault",
                "stake-1",
                &ClaimStakeRewardsArgs {
                    rank: 3,
                    collections: 1,
                },
            )
            .unwrap();
        let signers: Vec<_> = ix
            .accounts
            .iter()
            .filter(|m| m.is_signer)
            .map(|m| m.pubkey)
            .collect();
        assert_eq!(signers, vec![signer, verifier]);
    }

    #[test]
    fn test_mint_ticket_layout() {
        let program = program();
        let signer = Pubkey::new_unique();
        let verifier = Pubkey::new_unique();
        let asset = Pubkey::new_unique();
        let nft_mint = Pubkey::new_unique();
        let core_collection = Pubkey::new_unique();
        let args = MintTicketArgs {
            collection_symbol: "PTCKT".to_string(),
            discount: 10,
            is_boosted: true,
            number: 42,
            rarity: Rarity::Rare,
        };

        let ix = program
            .mint_ticket(&signer, &verifier, &asset, &nft_mint, &core_collection, &args)
            .unwrap();
        assert_eq!(&ix.data[..8], &discriminators::MINT_TICKET);
        assert_eq!(MintTicketArgs::try_from_slice(&ix.data[8..]).unwrap(), args);
        assert_eq!(ix.accounts.len(), 14);

        let signers: Vec<_> = ix.accounts.iter().filter(|m| m.is_signer).map(|m| m.pubkey).collect();
        assert_eq!(signers, vec![signer, verifier, asset]);
        assert_eq!(ix.accounts[1].pubkey, ticket_address(&program.program_id, 42).unwrap().address);
        assert_eq!(
            ix.accounts[5].pubkey,
            collection_address(&program.program_id, "PTCKT").unwrap().address
        );
        assert_eq!(ix.accounts[10].pubkey, CORE_PROGRAM_ID);
    }

    #[test]
    fn test_create_collection_is_cosigned_by_core_collection() {
        let program = program();
        let signer = Pubkey::new_unique();
        let core_collection = Pubkey::new_unique();
        let args = CreateCollectionArgs {
            name: "Poseidon".to_string(),
            symbol: "PTCKT".to_string(),
            supply: 1_000,
        };

        let ix = program.create_collection(&signer, &core_collection, &args).unwrap();
        assert_eq!(&ix.data[..8], &discriminators::CREATE_COLLECTION);
        assert_eq!(CreateCollectionArgs::try_from_slice(&ix.data[8..]).unwrap(), args);
        let signers: Vec<_> = ix.accounts.iter().filter(|m| m.is_signer).map(|m| m.pubkey).collect();
        assert_eq!(signers, vec![signer, core_collection]);
        assert_eq!(ix.accounts[4].pubkey, spl_token::id());
    }

    #[test]
    fn test_long_stake_name_surfaces_derivation_error() {
        let program = program();
        let err = program
            .request_withdraw_stake(&Pubkey::new_unique(), "vault", &"s".repeat(40))
            .unwrap_err();
        assert!(matches!(err, TransactionBuilderError::Derivation(_)));
    }
}
