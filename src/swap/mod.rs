//! Swap routing adapter
//!
//! Converts one asset into another by asking an external routing service
//! (Jupiter v6) for a quote and the instructions that execute it. The quote
//! is forwarded to the instruction endpoint untouched. Lookup tables the
//! returned instructions rely on are resolved from the ledger.
//!
//! Nothing here retries: a failed request surfaces as
//! [`SwapError::Unavailable`] with the remote payload attached.

pub mod errors;
pub mod wire;

pub use errors::SwapError;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response};
use solana_sdk::{
    address_lookup_table::state::AddressLookupTable, instruction::Instruction,
    message::AddressLookupTableAccount, pubkey::Pubkey,
};
use tracing::{debug, info, warn};

use crate::config::SwapConfig;
use crate::ledger::LedgerRpc;
use crate::metrics::metrics;
use wire::{out_amount_floor, parse_pubkey, SwapInstructionsRequest, SwapInstructionsResponse};

/// One conversion of `amount` minor units of `input_mint` into `output_mint`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SwapRequest {
    pub input_mint: Pubkey,
    pub output_mint: Pubkey,
    pub amount: u64,
    /// Wallet that signs and pays for the swap
    pub user: Pubkey,
}

/// Instructions and context needed to splice a swap into a transaction
#[derive(Debug, Clone, Default)]
pub struct SwapPlan {
    pub setup: Vec<Instruction>,
    /// Empty when the service returned no route
    pub swap: Vec<Instruction>,
    pub cleanup: Option<Instruction>,
    pub lookup_tables: Vec<AddressLookupTableAccount>,
    /// Guaranteed minimum output, in output-mint minor units
    pub out_amount_floor: u64,
}

impl SwapPlan {
    /// No swap leg was produced
    pub fn is_empty(&self) -> bool {
        self.swap.is_empty()
    }
}

#[async_trait]
pub trait SwapProvider: Send + Sync {
    async fn quote_and_build(&self, request: &SwapRequest) -> Result<SwapPlan, SwapError>;
}

/// [`SwapProvider`] backed by the Jupiter v6 HTTP API
pub struct JupiterClient {
    http: Client,
    base_url: String,
    slippage_bps: u16,
    api_key: Option<String>,
    ledger: Arc<dyn LedgerRpc>,
}

impl JupiterClient {
    pub fn new(config: &SwapConfig, ledger: Arc<dyn LedgerRpc>) -> Result<Self, SwapError> {
        let http = Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()
            .map_err(|e| SwapError::transport("client", e))?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            slippage_bps: config.slippage_bps,
            api_key: config.api_key.clone(),
            ledger,
        })
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.api_key {
            Some(key) => request.header("x-api-key", key),
            None => request,
        }
    }

    async fn quote(&self, request: &SwapRequest) -> Result<serde_json::Value, SwapError> {
        let url = format!("{}/quote", self.base_url);
        let amount = request.amount.to_string();
        let slippage = self.slippage_bps.to_string();
        let input_mint = request.input_mint.to_string();
        let output_mint = request.output_mint.to_string();

        let response = self
            .authorize(self.http.get(&url))
            .query(&[
                ("inputMint", input_mint.as_str()),
                ("outputMint", output_mint.as_str()),
                ("amount", amount.as_str()),
                ("slippageBps", slippage.as_str()),
            ])
            .send()
            .await
            .map_err(|e| SwapError::transport("quote", e))?;

        read_json(response, "quote").await
    }

    async fn swap_instructions(
        &self,
        user: &Pubkey,
        quote: &serde_json::Value,
    ) -> Result<SwapInstructionsResponse, SwapError> {
        let url = format!("{}/swap-instructions", self.base_url);
        let body = SwapInstructionsRequest {
            user_public_key: user.to_string(),
            quote_response: quote,
        };

        let response = self
            .authorize(self.http.post(&url))
            .json(&body)
            .send()
            .await
            .map_err(|e| SwapError::transport("swap_instructions", e))?;

        let value = read_json(response, "swap_instructions").await?;
        serde_json::from_value(value).map_err(|e| SwapError::invalid(e.to_string()))
    }
}

#[async_trait]
impl SwapProvider for JupiterClient {
    async fn quote_and_build(&self, request: &SwapRequest) -> Result<SwapPlan, SwapError> {
        debug!(
            input_mint = %request.input_mint,
            output_mint = %request.output_mint,
            amount = request.amount,
            "Requesting swap quote"
        );

        let quote = self.quote(request).await?;
        let floor = out_amount_floor(&quote)?;
        let response = self.swap_instructions(&request.user, &quote).await?;

        let setup = response
            .setup_instructions
            .iter()
            .map(|d| d.to_instruction())
            .collect::<Result<Vec<_>, _>>()?;
        let swap = response
            .swap_instruction
            .as_ref()
            .map(|d| d.to_instruction())
            .transpose()?
            .into_iter()
            .collect::<Vec<_>>();
        let cleanup = response
            .cleanup_instruction
            .as_ref()
            .map(|d| d.to_instruction())
            .transpose()?;

        let table_addresses = response
            .address_lookup_table_addresses
            .iter()
            .map(|address| parse_pubkey(address, "lookup table"))
            .collect::<Result<Vec<_>, _>>()?;
        let lookup_tables = resolve_lookup_tables(self.ledger.as_ref(), &table_addresses).await?;

        info!(
            setup = setup.len(),
            swap = swap.len(),
            cleanup = cleanup.is_some(),
            lookup_tables = lookup_tables.len(),
            out_amount_floor = floor,
            "Swap plan ready"
        );

        Ok(SwapPlan {
            setup,
            swap,
            cleanup,
            lookup_tables,
            out_amount_floor: floor,
        })
    }
}

async fn read_json(response: Response, stage: &'static str) -> Result<serde_json::Value, SwapError> {
    let status = response.status();
    let body = response
        .text()
        .await
        .map_err(|e| SwapError::transport(stage, e))?;

    if !status.is_success() {
        metrics()
            .swap_requests_total
            .with_label_values(&[stage, "error"])
            .inc();
        warn!(stage, status = status.as_u16(), "Swap service returned an error");
        return Err(SwapError::Unavailable {
            stage,
            status: Some(status.as_u16()),
            payload: (!body.is_empty()).then_some(body),
            message: format!("HTTP {}", status),
        });
    }

    let value: serde_json::Value =
        serde_json::from_str(&body).map_err(|e| SwapError::invalid(format!("{}: {}", stage, e)))?;

    // The service also reports failures inside a 200 body.
    if let Some(error) = value.get("error") {
        metrics()
            .swap_requests_total
            .with_label_values(&[stage, "error"])
            .inc();
        return Err(SwapError::Unavailable {
            stage,
            status: Some(status.as_u16()),
            payload: Some(body.clone()),
            message: error.to_string(),
        });
    }

    metrics()
        .swap_requests_total
        .with_label_values(&[stage, "ok"])
        .inc();
    Ok(value)
}

/// Fetch lookup tables by address. Tables that do not exist are skipped.
pub async fn resolve_lookup_tables(
    ledger: &dyn LedgerRpc,
    addresses: &[Pubkey],
) -> Result<Vec<AddressLookupTableAccount>, SwapError> {
    if addresses.is_empty() {
        return Ok(Vec::new());
    }

    let accounts = ledger
        .get_multiple_accounts(addresses)
        .await
        .map_err(|e| SwapError::transport("lookup_tables", e))?;

    let mut tables = Vec::with_capacity(addresses.len());
    for (key, data) in addresses.iter().zip(accounts) {
        let Some(data) = data else {
            debug!(table = %key, "Lookup table not found, skipping");
            continue;
        };
        let table = AddressLookupTable::deserialize(&data)
            .map_err(|e| SwapError::invalid(format!("lookup table {}: {}", key, e)))?;
        tables.push(AddressLookupTableAccount {
            key: *key,
            addresses: table.addresses.to_vec(),
        });
    }

    Ok(tables)
}
