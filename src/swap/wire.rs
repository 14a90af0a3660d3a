//! JSON shapes of the routing service and their conversion to instructions

use std::str::FromStr;

use base64::{engine::general_purpose::STANDARD as BASE64_STANDARD, Engine};
use serde::{Deserialize, Serialize};
use solana_sdk::{
    instruction::{AccountMeta, Instruction},
    pubkey::Pubkey,
};

use super::errors::SwapError;

/// Upper bound on decoded instruction data
const MAX_INSTRUCTION_DATA: usize = 4096;

/// Body of the swap-instructions request
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SwapInstructionsRequest<'a> {
    pub user_public_key: String,
    /// Passed through exactly as the quote endpoint returned it
    pub quote_response: &'a serde_json::Value,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SwapInstructionsResponse {
    #[serde(default)]
    pub setup_instructions: Vec<InstructionDescriptor>,
    #[serde(default)]
    pub swap_instruction: Option<InstructionDescriptor>,
    #[serde(default)]
    pub cleanup_instruction: Option<InstructionDescriptor>,
    #[serde(default)]
    pub address_lookup_table_addresses: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InstructionDescriptor {
    pub program_id: String,
    pub accounts: Vec<AccountDescriptor>,
    /// Base64 instruction data
    pub data: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountDescriptor {
    pub pubkey: String,
    pub is_signer: bool,
    pub is_writable: bool,
}

impl InstructionDescriptor {
    pub fn to_instruction(&self) -> Result<Instruction, SwapError> {
        let program_id = parse_pubkey(&self.program_id, "programId")?;

        let data = BASE64_STANDARD
            .decode(&self.data)
            .map_err(|e| SwapError::invalid(format!("base64 decode error: {}", e)))?;
        if data.len() > MAX_INSTRUCTION_DATA {
            return Err(SwapError::invalid(format!(
                "instruction data too large ({} bytes)",
                data.len()
            )));
        }

        let accounts = self
            .accounts
            .iter()
            .map(|account| {
                Ok(AccountMeta {
                    pubkey: parse_pubkey(&account.pubkey, "account pubkey")?,
                    is_signer: account.is_signer,
                    is_writable: account.is_writable,
                })
            })
            .collect::<Result<Vec<_>, SwapError>>()?;

        Ok(Instruction {
            program_id,
            accounts,
            data,
        })
    }
}

pub fn parse_pubkey(value: &str, field: &str) -> Result<Pubkey, SwapError> {
    Pubkey::from_str(value).map_err(|e| SwapError::invalid(format!("invalid {} '{}': {}", field, value, e)))
}

/// Minimum output amount guaranteed by the quote (`otherAmountThreshold`)
pub fn out_amount_floor(quote: &serde_json::Value) -> Result<u64, SwapError> {
    match quote.get("otherAmountThreshold") {
        Some(serde_json::Value::String(raw)) => raw
            .parse()
            .map_err(|e| SwapError::invalid(format!("otherAmountThreshold '{}': {}", raw, e))),
        Some(serde_json::Value::Number(raw)) => raw
            .as_u64()
            .ok_or_else(|| SwapError::invalid(format!("otherAmountThreshold {} is not a u64", raw))),
        _ => Err(SwapError::invalid("quote has no otherAmountThreshold")),
    }
}
