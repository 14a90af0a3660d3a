//! Markets, orders and fee collection

#[allow(deprecated)]
use solana_sdk::system_instruction;
use solana_sdk::{pubkey::Pubkey, signature::Signature};

use super::{
    ClientError, CollectFeeReceipt, NoOpReason, OperationOutcome, RpcOptions, TriadClient,
    FEE_COLLECTION_THRESHOLD,
};
use crate::derivation::{market_address, user_trade_address};
use crate::program::{AddLiquidityArgs, InitializeMarketArgs, OpenOrderArgs, OrderAction};
use crate::state::units::{COMMENT_LEN, QUESTION_LEN};
use crate::state::{
    encode_fixed, MarketRecord, MarketV1Record, MarketV2Record, MarketView,
    OrderDirection, UserTradeRecord, UserTradeView, WinningDirection,
};
use crate::structured_logging::OperationContext;
use crate::swap::SwapRequest;
use crate::tx_builder::InstructionPlan;

/// Open a position in `market_id`, paying with `token`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpenOrderRequest {
    pub market_id: u64,
    /// Minor units of `token`
    pub amount: u64,
    pub direction: OrderDirection,
    /// Asset paid in; anything but the canonical mint is swapped first
    pub token: Pubkey,
    /// At most 64 bytes
    pub comment: Option<String>,
}

/// An existing order of the signing wallet
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrderRef {
    pub market_id: u64,
    pub order_id: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AddLiquidityRequest {
    pub market_id: u64,
    /// Canonical minor units
    pub amount: u64,
    pub direction: OrderDirection,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CollectFeeRequest {
    pub market_id: u64,
    /// Receives the settlement proceeds
    pub vault: Pubkey,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InitializeMarketRequest {
    pub market_id: u64,
    pub name: String,
    /// At most 80 bytes
    pub question: String,
    pub start_time: i64,
    pub end_time: i64,
}

impl TriadClient {
    pub async fn open_order(
        &self,
        request: OpenOrderRequest,
        options: RpcOptions,
    ) -> Result<OperationOutcome<Signature>, ClientError> {
        let context = OperationContext::new("open_order");
        let result = self.open_order_stages(&context, request, options).await;
        Self::observe(&context, result)
    }

    async fn open_order_stages(
        &self,
        context: &OperationContext,
        request: OpenOrderRequest,
        options: RpcOptions,
    ) -> Result<OperationOutcome<Signature>, ClientError> {
        if request.amount == 0 {
            return Err(ClientError::invalid_request("order amount must be positive"));
        }
        let comment = request
            .comment
            .as_deref()
            .map(encode_fixed::<COMMENT_LEN>)
            .transpose()?;

        let authority = self.authority();
        let mut plan = InstructionPlan::new();

        context.log_stage("check_user_trade");
        let user_trade = user_trade_address(&self.addresses.program_id, &authority)?.address;
        match self.ledger.get_account_data(&user_trade).await {
            Ok(_) => {}
            Err(err) if err.is_account_not_found() => {
                context.log_account_missing("user_trade", &user_trade.to_string());
                plan.push_account_init(self.program.create_user_trade(&authority)?);
            }
            Err(err) => return Err(err.into()),
        }

        let mut amount = request.amount;
        let mut swap = None;
        if request.token != self.addresses.canonical_mint {
            context.log_stage("swap");
            let converted = self
                .swap
                .quote_and_build(&SwapRequest {
                    input_mint: request.token,
                    output_mint: self.addresses.canonical_mint,
                    amount: request.amount,
                    user: authority,
                })
                .await?;
            if converted.is_empty() {
                return Ok(Self::noop(context, NoOpReason::NoSwapRoute));
            }
            amount = converted.out_amount_floor;
            if amount == 0 {
                return Err(ClientError::invalid_request(
                    "swap guarantees no output for the order",
                ));
            }
            plan.push_swap(&converted, None);
            swap = Some(converted);
        }

        tracing::debug!(
            correlation_id = %context.correlation_id,
            market_id = request.market_id,
            amount,
            direction = ?request.direction,
            "Opening order"
        );
        plan.push_core(self.program.open_order(
            &authority,
            request.market_id,
            &OpenOrderArgs {
                amount,
                direction: request.direction,
                comment,
            },
        )?);

        let lookup_tables = match swap {
            Some(swap) => {
                plan.push_swap_cleanup(&swap);
                swap.lookup_tables
            }
            None => Vec::new(),
        };

        let signature = self
            .submit(context, plan, &lookup_tables, &[], options)
            .await?;
        Ok(OperationOutcome::Submitted(signature))
    }

    pub async fn close_order(&self, order: OrderRef, options: RpcOptions) -> Result<Signature, ClientError> {
        self.order_action(OrderAction::Close, order, options).await
    }

    pub async fn settle_order(&self, order: OrderRef, options: RpcOptions) -> Result<Signature, ClientError> {
        self.order_action(OrderAction::Settle, order, options).await
    }

    pub async fn payout_order(&self, order: OrderRef, options: RpcOptions) -> Result<Signature, ClientError> {
        self.order_action(OrderAction::Payout, order, options).await
    }

    async fn order_action(
        &self,
        action: OrderAction,
        order: OrderRef,
        options: RpcOptions,
    ) -> Result<Signature, ClientError> {
        let context = OperationContext::new(action.name());
        let result: Result<Signature, ClientError> = async {
            let mut plan = InstructionPlan::new();
            plan.push_core(self.program.order_action(
                action,
                &self.authority(),
                order.market_id,
                order.order_id,
            )?);
            self.submit(&context, plan, &[], &[], options).await
        }
        .await;
        Self::observe(&context, result)
    }

    pub async fn add_liquidity(
        &self,
        request: AddLiquidityRequest,
        options: RpcOptions,
    ) -> Result<Signature, ClientError> {
        let context = OperationContext::new("add_liquidity");
        let result: Result<Signature, ClientError> = async {
            if request.amount == 0 {
                return Err(ClientError::invalid_request("liquidity amount must be positive"));
            }
            let mut plan = InstructionPlan::new();
            plan.push_core(self.program.add_liquidity(
                &self.authority(),
                request.market_id,
                &AddLiquidityArgs {
                    amount: request.amount,
                    direction: request.direction,
                },
            )?);
            self.submit(&context, plan, &[], &[], options).await
        }
        .await;
        Self::observe(&context, result)
    }

    /// Collect a market's fees and convert them into the settlement asset.
    ///
    /// Skipped while the unclaimed total is below [`FEE_COLLECTION_THRESHOLD`].
    /// The collected fees are swapped, and the swap's guaranteed minimum
    /// output is transferred to `vault` in the same envelope.
    pub async fn collect_fee(
        &self,
        request: CollectFeeRequest,
        options: RpcOptions,
    ) -> Result<OperationOutcome<CollectFeeReceipt>, ClientError> {
        let context = OperationContext::new("collect_fee");
        let result = self.collect_fee_stages(&context, request, options).await;
        Self::observe(&context, result)
    }

    async fn collect_fee_stages(
        &self,
        context: &OperationContext,
        request: CollectFeeRequest,
        options: RpcOptions,
    ) -> Result<OperationOutcome<CollectFeeReceipt>, ClientError> {
        let authority = self.authority();
        let market = market_address(&self.addresses.program_id, request.market_id)?.address;

        context.log_stage("fetch_market");
        let record: MarketV2Record = self.fetch(&market).await?;
        let total_fee = record.unclaimed_fees();
        if total_fee < FEE_COLLECTION_THRESHOLD {
            return Ok(Self::noop(
                context,
                NoOpReason::FeeBelowThreshold {
                    total_fee,
                    threshold: FEE_COLLECTION_THRESHOLD,
                },
            ));
        }

        context.log_stage("swap");
        let swap = self
            .swap
            .quote_and_build(&SwapRequest {
                input_mint: self.addresses.canonical_mint,
                output_mint: self.addresses.settlement_mint,
                amount: total_fee,
                user: authority,
            })
            .await?;
        if swap.is_empty() {
            return Ok(Self::noop(context, NoOpReason::NoSwapRoute));
        }

        let lamports = swap.out_amount_floor;
        let mut plan = InstructionPlan::new();
        plan.push_core(self.program.collect_fee(&authority, request.market_id)?);
        plan.push_swap(&swap, Some(self.fee_swap_compute_unit_limit));
        plan.push_swap_cleanup(&swap);
        #[allow(deprecated)]
        let transfer = system_instruction::transfer(&authority, &request.vault, lamports);
        plan.push_transfer(transfer);

        let signature = self
            .submit(context, plan, &swap.lookup_tables, &[], options)
            .await?;
        Ok(OperationOutcome::Submitted(CollectFeeReceipt {
            signature,
            fee_to_swap: total_fee,
            lamports,
        }))
    }

    pub async fn initialize_market(
        &self,
        request: InitializeMarketRequest,
        options: RpcOptions,
    ) -> Result<Signature, ClientError> {
        let context = OperationContext::new("initialize_market");
        let result: Result<Signature, ClientError> = async {
            if request.end_time <= request.start_time {
                return Err(ClientError::invalid_request("market must end after it starts"));
            }
            let args = InitializeMarketArgs {
                name: request.name,
                market_id: request.market_id,
                question: encode_fixed::<QUESTION_LEN>(&request.question)?,
                start_time: request.start_time,
                end_time: request.end_time,
            };
            let mut plan = InstructionPlan::new();
            plan.push_core(self.program.initialize_market(&self.authority(), &args)?);
            self.submit(&context, plan, &[], &[], options).await
        }
        .await;
        Self::observe(&context, result)
    }

    pub async fn resolve_market(
        &self,
        market_id: u64,
        winning_direction: WinningDirection,
        options: RpcOptions,
    ) -> Result<Signature, ClientError> {
        let context = OperationContext::new("resolve_market");
        let result: Result<Signature, ClientError> = async {
            let mut plan = InstructionPlan::new();
            plan.push_core(self.program.resolve_market(
                &self.authority(),
                market_id,
                winning_direction,
            )?);
            self.submit(&context, plan, &[], &[], options).await
        }
        .await;
        Self::observe(&context, result)
    }

    /// Every market of both layouts, first-generation markets first.
    pub async fn get_all_markets(&self) -> Result<Vec<MarketView>, ClientError> {
        let v1 = self.fetch_all::<MarketV1Record>(Vec::new()).await?;
        let v2 = self.fetch_all::<MarketV2Record>(Vec::new()).await?;

        Ok(v1
            .iter()
            .map(|(address, market)| MarketView::from_v1(market, address))
            .chain(v2.iter().map(|(address, market)| MarketView::from_v2(market, address)))
            .collect())
    }

    pub async fn get_market_by_id(&self, market_id: u64) -> Result<MarketView, ClientError> {
        let address = market_address(&self.addresses.program_id, market_id)?.address;
        self.get_market_by_address(&address).await
    }

    /// Either layout is accepted; the discriminator decides.
    pub async fn get_market_by_address(&self, address: &Pubkey) -> Result<MarketView, ClientError> {
        let data = self.ledger.get_account_data(address).await?;
        let record = MarketRecord::decode(&data)?;
        Ok(MarketView::from_record(&record, address))
    }

    pub async fn get_user_trade(&self, wallet: &Pubkey) -> Result<UserTradeView, ClientError> {
        let address = user_trade_address(&self.addresses.program_id, wallet)?.address;
        let record: UserTradeRecord = self.fetch(&address).await?;
        Ok(UserTradeView::new(&record, &address))
    }
}
