//! Order lifecycle facade
//!
//! Public operations against the triad program. Every write operation runs
//! its stages in order (check, convert, assemble, submit) and produces at
//! most one envelope. Deliberate short-circuits come back as
//! [`OperationOutcome::NoOp`], never as an error.
//!
//! - **trade**: markets and orders, fee collection
//! - **user**: user accounts and referrals
//! - **stake**: staking vaults and stakes
//! - **ticket**: ticket collections and ticket mints

pub mod errors;
mod stake;
mod ticket;
mod trade;
mod user;

pub use errors::ClientError;
pub use stake::{ClaimStakeRewardsRequest, StakeRef, StakeTokenRequest};
pub use ticket::{CollectionReceipt, CreateCollectionRequest, MintTicketRequest, TicketReceipt};
pub use trade::{
    AddLiquidityRequest, CollectFeeRequest, InitializeMarketRequest, OpenOrderRequest, OrderRef,
};
pub use user::CreateUserRequest;

pub use crate::tx_builder::RpcOptions;

use std::fmt;
use std::sync::Arc;

use solana_sdk::{
    message::AddressLookupTableAccount,
    pubkey::Pubkey,
    signature::{Keypair, Signature},
};

use crate::config::{Config, ProtocolAddresses};
use crate::ledger::{AccountFilter, LedgerRpc, SolanaLedger};
use crate::program::TriadProgram;
use crate::state::{AccountRecord, CANONICAL_DECIMALS};
use crate::structured_logging::OperationContext;
use crate::swap::{JupiterClient, SwapProvider};
use crate::tx_builder::{InstructionPlan, TxAssembler};
use crate::wallet::WalletManager;

/// Minimum unclaimed fee, in canonical minor units, worth a collection
pub const FEE_COLLECTION_THRESHOLD: u64 = 100 * 10u64.pow(CANONICAL_DECIMALS as u32);

/// Why an operation finished without submitting anything
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoOpReason {
    /// The routing service produced no swap instructions
    NoSwapRoute,
    /// Unclaimed fees are below [`FEE_COLLECTION_THRESHOLD`]
    FeeBelowThreshold { total_fee: u64, threshold: u64 },
}

impl NoOpReason {
    /// Stable label for metrics and logs
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NoSwapRoute => "no_swap_route",
            Self::FeeBelowThreshold { .. } => "fee_below_threshold",
        }
    }
}

impl fmt::Display for NoOpReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoSwapRoute => write!(f, "no swap route"),
            Self::FeeBelowThreshold { total_fee, threshold } => {
                write!(f, "unclaimed fee {} is below {}", total_fee, threshold)
            }
        }
    }
}

/// Result of an operation that may legitimately decide not to submit
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OperationOutcome<T> {
    Submitted(T),
    NoOp(NoOpReason),
}

impl<T> OperationOutcome<T> {
    pub fn is_submitted(&self) -> bool {
        matches!(self, Self::Submitted(_))
    }

    pub fn submitted(&self) -> Option<&T> {
        match self {
            Self::Submitted(value) => Some(value),
            Self::NoOp(_) => None,
        }
    }

    pub fn noop_reason(&self) -> Option<NoOpReason> {
        match self {
            Self::Submitted(_) => None,
            Self::NoOp(reason) => Some(*reason),
        }
    }
}

/// What a fee collection submitted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CollectFeeReceipt {
    pub signature: Signature,
    /// Canonical minor units swapped
    pub fee_to_swap: u64,
    /// Lamports transferred to the vault
    pub lamports: u64,
}

/// Client for one wallet against one triad deployment
pub struct TriadClient {
    ledger: Arc<dyn LedgerRpc>,
    swap: Arc<dyn SwapProvider>,
    assembler: TxAssembler,
    program: TriadProgram,
    addresses: ProtocolAddresses,
    fee_swap_compute_unit_limit: u32,
}

impl TriadClient {
    pub fn new(
        ledger: Arc<dyn LedgerRpc>,
        swap: Arc<dyn SwapProvider>,
        payer: Arc<Keypair>,
        addresses: ProtocolAddresses,
        fee_swap_compute_unit_limit: u32,
    ) -> Self {
        let assembler = TxAssembler::new(ledger.clone(), payer);
        let program = TriadProgram::new(
            addresses.program_id,
            addresses.token_program,
            addresses.canonical_mint,
        );
        Self {
            ledger,
            swap,
            assembler,
            program,
            addresses,
            fee_swap_compute_unit_limit,
        }
    }

    /// Wire up the RPC ledger and the Jupiter adapter from configuration.
    pub fn from_config(config: &Config, wallet: &WalletManager) -> Result<Self, ClientError> {
        config.validate()?;
        let addresses = config.protocol.resolve()?;
        let commitment = config.rpc.commitment_config()?;

        let ledger: Arc<dyn LedgerRpc> = Arc::new(SolanaLedger::new(
            config.rpc.url.clone(),
            commitment,
            config.rpc.request_timeout(),
        ));
        let swap: Arc<dyn SwapProvider> = Arc::new(JupiterClient::new(&config.swap, ledger.clone())?);

        Ok(Self::new(
            ledger,
            swap,
            wallet.keypair_arc(),
            addresses,
            config.transaction.fee_swap_compute_unit_limit,
        ))
    }

    /// Wallet that signs and pays for every operation
    pub fn authority(&self) -> Pubkey {
        self.assembler.payer()
    }

    pub fn program(&self) -> &TriadProgram {
        &self.program
    }

    pub fn addresses(&self) -> &ProtocolAddresses {
        &self.addresses
    }

    async fn fetch<R: AccountRecord>(&self, address: &Pubkey) -> Result<R, ClientError> {
        let data = self.ledger.get_account_data(address).await?;
        Ok(R::decode(&data)?)
    }

    /// Decoded accounts of one record type, optionally narrowed by `filters`
    async fn fetch_all<R: AccountRecord>(
        &self,
        filters: Vec<AccountFilter>,
    ) -> Result<Vec<(Pubkey, R)>, ClientError> {
        let mut all = vec![AccountFilter::memcmp(0, R::DISCRIMINATOR.to_vec())];
        all.extend(filters);

        let accounts = self
            .ledger
            .get_program_accounts(&self.addresses.program_id, &all)
            .await?;
        accounts
            .into_iter()
            .map(|(address, data)| Ok((address, R::decode(&data)?)))
            .collect()
    }

    async fn submit(
        &self,
        context: &OperationContext,
        plan: InstructionPlan,
        lookup_tables: &[AddressLookupTableAccount],
        extra_signers: &[&Keypair],
        options: RpcOptions,
    ) -> Result<Signature, ClientError> {
        let instructions = plan.len();
        context.log_stage("assemble");
        let signature = self
            .assembler
            .execute(plan, lookup_tables, extra_signers, options)
            .await?;
        context.log_submitted(&signature.to_string(), instructions);
        Ok(signature)
    }

    /// Record the failure of an operation, passing the result through.
    fn observe<T>(context: &OperationContext, result: Result<T, ClientError>) -> Result<T, ClientError> {
        if let Err(err) = &result {
            context.log_failure(err.category(), &err.to_string());
        }
        result
    }

    fn noop<T>(context: &OperationContext, reason: NoOpReason) -> OperationOutcome<T> {
        context.log_noop(reason.as_str());
        OperationOutcome::NoOp(reason)
    }
}

impl fmt::Debug for TriadClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TriadClient")
            .field("authority", &self.authority())
            .field("addresses", &self.addresses)
            .finish_non_exhaustive()
    }
}
