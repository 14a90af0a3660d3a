//! User accounts and referrals

use solana_sdk::{pubkey::Pubkey, signature::Signature};

use super::{ClientError, RpcOptions, TriadClient};
use crate::derivation::{position_address, user_address};
use crate::ledger::AccountFilter;
use crate::program::CreateUserArgs;
use crate::state::errors::FormatError;
use crate::state::records::USER_NAME_OFFSET;
use crate::state::units::NAME_LEN;
use crate::state::{AccountRecord, UserPositionRecord, UserPositionView, UserRecord, UserView};
use crate::structured_logging::OperationContext;
use crate::tx_builder::InstructionPlan;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateUserRequest {
    /// At most 32 bytes
    pub name: String,
    /// Account credited with the referral
    pub referral: Pubkey,
}

impl TriadClient {
    pub async fn create_user(
        &self,
        request: CreateUserRequest,
        options: RpcOptions,
    ) -> Result<Signature, ClientError> {
        let context = OperationContext::new("create_user");
        let result: Result<Signature, ClientError> = async {
            let name = request.name.trim();
            if name.is_empty() {
                return Err(ClientError::invalid_request("user name must not be empty"));
            }
            if name.len() > NAME_LEN {
                return Err(FormatError::TextTooLong {
                    max: NAME_LEN,
                    actual: name.len(),
                }
                .into());
            }

            let mut plan = InstructionPlan::new();
            plan.push_core(self.program.create_user(
                &self.authority(),
                &request.referral,
                &CreateUserArgs {
                    name: name.to_string(),
                },
            )?);
            self.submit(&context, plan, &[], &[], options).await
        }
        .await;
        Self::observe(&context, result)
    }

    pub async fn get_user(&self, wallet: &Pubkey) -> Result<UserView, ClientError> {
        let address = user_address(&self.addresses.program_id, wallet)?.address;
        let record: UserRecord = self.fetch(&address).await?;
        Ok(UserView::new(&record, &address))
    }

    /// All users, most referrals first
    pub async fn get_users(&self) -> Result<Vec<UserView>, ClientError> {
        let mut users: Vec<UserView> = self
            .fetch_all::<UserRecord>(Vec::new())
            .await?
            .iter()
            .map(|(address, user)| UserView::new(user, address))
            .collect();
        users.sort_by(|a, b| b.referred.cmp(&a.referred));
        Ok(users)
    }

    /// Whether `wallet` has a user account. Only a missing account counts
    /// as `false`; any other failure is returned.
    pub async fn has_user(&self, wallet: &Pubkey) -> Result<bool, ClientError> {
        let address = user_address(&self.addresses.program_id, wallet)?.address;
        match self.ledger.get_account_data(&address).await {
            Ok(_) => Ok(true),
            Err(err) if err.is_account_not_found() => Ok(false),
            Err(err) => Err(err.into()),
        }
    }

    /// Authority of the user registered under `name`, if any.
    ///
    /// The ledger filters on the raw name bytes at [`USER_NAME_OFFSET`];
    /// every hit is decoded and its name compared again, so a layout change
    /// shows up as a decode error or no match rather than a wrong account.
    pub async fn get_referral(&self, name: &str) -> Result<Option<Pubkey>, ClientError> {
        let name = name.trim();
        if name.is_empty() || name.len() > NAME_LEN {
            return Ok(None);
        }

        let filters = vec![AccountFilter::memcmp(USER_NAME_OFFSET, name.as_bytes().to_vec())];
        let matches = self.fetch_all::<UserRecord>(filters).await?;

        let referral = matches
            .into_iter()
            .find(|(_, user)| user.name.trim_end() == name)
            .map(|(_, user)| user.authority);
        tracing::debug!(name, found = referral.is_some(), "Referral lookup");
        Ok(referral)
    }

    /// Vault positions of `wallet` under each of `tickers` that still hold
    /// a deposit. Tickers without a position account are skipped.
    pub async fn get_user_positions_with_amount(
        &self,
        wallet: &Pubkey,
        tickers: &[Pubkey],
    ) -> Result<Vec<UserPositionView>, ClientError> {
        let addresses = tickers
            .iter()
            .map(|ticker| Ok(position_address(&self.addresses.program_id, wallet, ticker)?.address))
            .collect::<Result<Vec<Pubkey>, ClientError>>()?;

        let accounts = self.ledger.get_multiple_accounts(&addresses).await?;
        let mut positions = Vec::new();
        for (address, data) in addresses.iter().zip(accounts) {
            let Some(data) = data else { continue };
            let record = UserPositionRecord::decode(&data)?;
            if record.has_balance() {
                positions.push(UserPositionView::new(&record, address));
            }
        }
        Ok(positions)
    }
}
