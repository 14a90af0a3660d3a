//! Staking vaults and stakes

use solana_sdk::{
    pubkey::Pubkey,
    signature::{Keypair, Signature, Signer},
};

use super::{ClientError, RpcOptions, TriadClient};
use crate::config::ConfigError;
use crate::derivation::stake_vault_address;
use crate::ledger::AccountFilter;
use crate::program::{ClaimStakeRewardsArgs, StakeTokenArgs};
use crate::state::records::DISCRIMINATOR_LEN;
use crate::state::{StakeRecord, StakeVaultRecord, StakeVaultView, StakeView};
use crate::structured_logging::OperationContext;
use crate::tx_builder::InstructionPlan;

/// Offset of `authority` in a stake account, after the discriminator and bump
const STAKE_AUTHORITY_OFFSET: usize = DISCRIMINATOR_LEN + 1;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StakeTokenRequest {
    pub stake_vault: String,
    /// Stake name, unique per wallet
    pub name: String,
    /// Canonical minor units
    pub amount: u64,
}

/// An existing stake of the signing wallet
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StakeRef {
    pub stake_vault: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClaimStakeRewardsRequest {
    pub stake: StakeRef,
    pub rank: u16,
    pub collections: u8,
}

impl TriadClient {
    pub async fn stake_token(
        &self,
        request: StakeTokenRequest,
        options: RpcOptions,
    ) -> Result<Signature, ClientError> {
        let context = OperationContext::new("stake_token");
        let result: Result<Signature, ClientError> = async {
            if request.amount == 0 {
                return Err(ClientError::invalid_request("stake amount must be positive"));
            }
            let args = StakeTokenArgs {
                stake_vault: request.stake_vault,
                name: request.name,
                amount: request.amount,
            };
            let mut plan = InstructionPlan::new();
            plan.push_core(self.program.stake_token(&self.authority(), &args)?);
            self.submit(&context, plan, &[], &[], options).await
        }
        .await;
        Self::observe(&context, result)
    }

    pub async fn request_withdraw_stake(
        &self,
        stake: StakeRef,
        options: RpcOptions,
    ) -> Result<Signature, ClientError> {
        let context = OperationContext::new("request_withdraw_stake");
        let result: Result<Signature, ClientError> = async {
            let mut plan = InstructionPlan::new();
            plan.push_core(self.program.request_withdraw_stake(
                &self.authority(),
                &stake.stake_vault,
                &stake.name,
            )?);
            self.submit(&context, plan, &[], &[], options).await
        }
        .await;
        Self::observe(&context, result)
    }

    /// Needs the stake administrator from `protocol.admin`.
    pub async fn withdraw_stake(&self, stake: StakeRef, options: RpcOptions) -> Result<Signature, ClientError> {
        let context = OperationContext::new("withdraw_stake");
        let result: Result<Signature, ClientError> = async {
            let admin = self
                .addresses
                .admin
                .ok_or(ConfigError::Missing("protocol.admin"))?;
            let mut plan = InstructionPlan::new();
            plan.push_core(self.program.withdraw_stake(
                &self.authority(),
                &admin,
                &stake.stake_vault,
                &stake.name,
            )?);
            self.submit(&context, plan, &[], &[], options).await
        }
        .await;
        Self::observe(&context, result)
    }

    /// Claim rewards, co-signed by `verifier`.
    pub async fn claim_stake_rewards(
        &self,
        request: ClaimStakeRewardsRequest,
        verifier: &Keypair,
        options: RpcOptions,
    ) -> Result<Signature, ClientError> {
        let context = OperationContext::new("claim_stake_rewards");
        let result: Result<Signature, ClientError> = async {
            let mut plan = InstructionPlan::new();
            plan.push_core(self.program.claim_stake_rewards(
                &self.authority(),
                &verifier.pubkey(),
                &request.stake.stake_vault,
                &request.stake.name,
                &ClaimStakeRewardsArgs {
                    rank: request.rank,
                    collections: request.collections,
                },
            )?);
            self.submit(&context, plan, &[], &[verifier], options).await
        }
        .await;
        Self::observe(&context, result)
    }

    pub async fn get_stake_vault(&self, name: &str) -> Result<StakeVaultView, ClientError> {
        let address = stake_vault_address(&self.addresses.program_id, name)?.address;
        let record: StakeVaultRecord = self.fetch(&address).await?;
        Ok(StakeVaultView::new(&record, &address))
    }

    pub async fn get_stakes_by_wallet(&self, wallet: &Pubkey) -> Result<Vec<StakeView>, ClientError> {
        let filters = vec![AccountFilter::memcmp(STAKE_AUTHORITY_OFFSET, wallet.to_bytes().to_vec())];
        let stakes = self.fetch_all::<StakeRecord>(filters).await?;
        Ok(stakes
            .iter()
            .filter(|(_, stake)| stake.authority == *wallet)
            .map(|(address, stake)| StakeView::new(stake, address))
            .collect())
    }
}
