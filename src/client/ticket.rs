//! Ticket collections and ticket mints

use solana_sdk::{
    pubkey::Pubkey,
    signature::{Keypair, Signature, Signer},
};

use super::{ClientError, RpcOptions, TriadClient};
use crate::config::ConfigError;
use crate::program::{CreateCollectionArgs, MintTicketArgs};
use crate::state::Rarity;
use crate::structured_logging::OperationContext;
use crate::tx_builder::InstructionPlan;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateCollectionRequest {
    pub name: String,
    /// Registry key of the collection, at most 32 bytes
    pub symbol: String,
    pub supply: u64,
}

/// What a collection creation submitted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CollectionReceipt {
    pub signature: Signature,
    /// Address of the freshly generated core collection
    pub core_collection: Pubkey,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MintTicketRequest {
    pub collection_symbol: String,
    pub number: u64,
    /// Percent off the tier price, 0..=100
    pub discount: u64,
    pub is_boosted: bool,
    pub rarity: Rarity,
    /// Pass NFT burned in exchange for the ticket
    pub nft_mint: Pubkey,
}

/// What a ticket mint submitted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TicketReceipt {
    pub signature: Signature,
    /// Address of the freshly generated ticket asset
    pub asset: Pubkey,
}

impl TriadClient {
    /// Register a ticket collection. A fresh keypair becomes the core
    /// collection and co-signs the envelope.
    pub async fn create_collection(
        &self,
        request: CreateCollectionRequest,
        options: RpcOptions,
    ) -> Result<CollectionReceipt, ClientError> {
        let context = OperationContext::new("create_collection");
        let result: Result<CollectionReceipt, ClientError> = async {
            if request.symbol.trim().is_empty() || request.name.trim().is_empty() {
                return Err(ClientError::invalid_request("collection name and symbol are required"));
            }
            if request.supply == 0 {
                return Err(ClientError::invalid_request("collection supply must be positive"));
            }

            let core_collection = Keypair::new();
            let args = CreateCollectionArgs {
                name: request.name,
                symbol: request.symbol,
                supply: request.supply,
            };
            let mut plan = InstructionPlan::new();
            plan.push_core(self.program.create_collection(
                &self.authority(),
                &core_collection.pubkey(),
                &args,
            )?);

            let signature = self
                .submit(&context, plan, &[], &[&core_collection], options)
                .await?;
            Ok(CollectionReceipt {
                signature,
                core_collection: core_collection.pubkey(),
            })
        }
        .await;
        Self::observe(&context, result)
    }

    /// Exchange a pass NFT for a ticket in the configured collection.
    ///
    /// Signed by the wallet, `verifier` and a fresh asset keypair.
    pub async fn mint_ticket(
        &self,
        request: MintTicketRequest,
        verifier: &Keypair,
        options: RpcOptions,
    ) -> Result<TicketReceipt, ClientError> {
        let context = OperationContext::new("mint_ticket");
        let result: Result<TicketReceipt, ClientError> = async {
            let core_collection = self
                .addresses
                .ticket_collection
                .ok_or(ConfigError::Missing("protocol.ticket_collection"))?;
            if request.discount > 100 {
                return Err(ClientError::invalid_request(format!(
                    "discount {}% is above 100%",
                    request.discount
                )));
            }

            let asset = Keypair::new();
            let args = MintTicketArgs {
                collection_symbol: request.collection_symbol,
                discount: request.discount,
                is_boosted: request.is_boosted,
                number: request.number,
                rarity: request.rarity,
            };
            tracing::debug!(
                correlation_id = %context.correlation_id,
                number = args.number,
                rarity = ?args.rarity,
                asset = %asset.pubkey(),
                "Minting ticket"
            );

            let mut plan = InstructionPlan::new();
            plan.push_core(self.program.mint_ticket(
                &self.authority(),
                &verifier.pubkey(),
                &asset.pubkey(),
                &request.nft_mint,
                &core_collection,
                &args,
            )?);

            let signature = self
                .submit(&context, plan, &[], &[&asset, verifier], options)
                .await?;
            Ok(TicketReceipt {
                signature,
                asset: asset.pubkey(),
            })
        }
        .await;
        Self::observe(&context, result)
    }
}
