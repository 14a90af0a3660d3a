//! Deterministic program-address derivation
//!
//! Every account the triad program owns lives at an address derived from
//! the program id and an ordered seed list. Derivation walks the bump space
//! from 255 downwards and returns the first result that is off the ed25519
//! curve, so the same inputs always produce the same `(address, bump)`.
//!
//! The functions here are pure: no I/O, no caching.

pub mod errors;
pub use errors::DerivationError;

use solana_sdk::pubkey::Pubkey;

/// Maximum length of a single seed, in bytes
pub const MAX_SEED_LEN: usize = 32;

/// Maximum number of seeds, including the trailing bump byte
pub const MAX_SEEDS: usize = 16;

// ============================================================================
// Seed constants
// ============================================================================

pub const MARKET_SEED: &[u8] = b"market";
pub const USER_SEED: &[u8] = b"user";
pub const USER_TRADE_SEED: &[u8] = b"user_trade";
pub const USER_POSITION_SEED: &[u8] = b"user_position";
pub const STAKE_SEED: &[u8] = b"stake";
pub const STAKE_VAULT_SEED: &[u8] = b"stake_vault";
pub const COLLECTION_SEED: &[u8] = b"collection";
pub const NFT_SEED: &[u8] = b"nft";

/// One component of a derivation seed list
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeedComponent<'a> {
    /// Raw bytes, used for constant tags and names
    Bytes(&'a [u8]),
    /// A 32-byte account address
    Address(&'a Pubkey),
    /// A numeric identifier, serialised little-endian
    U64(u64),
}

impl SeedComponent<'_> {
    fn to_bytes(self) -> Vec<u8> {
        match self {
            SeedComponent::Bytes(bytes) => bytes.to_vec(),
            SeedComponent::Address(address) => address.to_bytes().to_vec(),
            SeedComponent::U64(value) => value.to_le_bytes().to_vec(),
        }
    }
}

/// Result of a successful derivation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DerivedAddress {
    pub address: Pubkey,
    pub bump: u8,
}

/// Derive the canonical program address for `seeds` under `program_id`.
///
/// # Errors
///
/// - `InvalidSeeds` if a seed is longer than 32 bytes or more than 15 seeds
///   are supplied
/// - `NoValidBump` if no bump in 0..=255 yields an off-curve address
pub fn derive_address(
    program_id: &Pubkey,
    seeds: &[SeedComponent<'_>],
) -> Result<DerivedAddress, DerivationError> {
    if seeds.len() >= MAX_SEEDS {
        return Err(DerivationError::too_many_seeds(seeds.len()));
    }

    let owned: Vec<Vec<u8>> = seeds.iter().map(|seed| seed.to_bytes()).collect();
    if let Some((index, seed)) = owned
        .iter()
        .enumerate()
        .find(|(_, seed)| seed.len() > MAX_SEED_LEN)
    {
        return Err(DerivationError::seed_too_long(index, seed.len()));
    }

    let base: Vec<&[u8]> = owned.iter().map(Vec::as_slice).collect();
    for bump in (0..=u8::MAX).rev() {
        let bump_seed = [bump];
        let mut slices = Vec::with_capacity(base.len() + 1);
        slices.extend_from_slice(&base);
        slices.push(&bump_seed[..]);

        // An on-curve candidate surfaces as an error; try the next bump.
        if let Ok(address) = Pubkey::create_program_address(&slices, program_id) {
            return Ok(DerivedAddress { address, bump });
        }
    }

    Err(DerivationError::NoValidBump {
        program_id: *program_id,
    })
}

// ============================================================================
// Derivation families
// ============================================================================

/// Market account, keyed by numeric market id
pub fn market_address(program_id: &Pubkey, market_id: u64) -> Result<DerivedAddress, DerivationError> {
    derive_address(
        program_id,
        &[SeedComponent::Bytes(MARKET_SEED), SeedComponent::U64(market_id)],
    )
}

/// User profile account of `authority`
pub fn user_address(program_id: &Pubkey, authority: &Pubkey) -> Result<DerivedAddress, DerivationError> {
    derive_address(
        program_id,
        &[SeedComponent::Bytes(USER_SEED), SeedComponent::Address(authority)],
    )
}

/// Trade ledger (open orders) of `authority`
pub fn user_trade_address(
    program_id: &Pubkey,
    authority: &Pubkey,
) -> Result<DerivedAddress, DerivationError> {
    derive_address(
        program_id,
        &[
            SeedComponent::Bytes(USER_TRADE_SEED),
            SeedComponent::Address(authority),
        ],
    )
}

/// Per-market position of `authority`
pub fn position_address(
    program_id: &Pubkey,
    authority: &Pubkey,
    market: &Pubkey,
) -> Result<DerivedAddress, DerivationError> {
    derive_address(
        program_id,
        &[
            SeedComponent::Bytes(USER_POSITION_SEED),
            SeedComponent::Address(authority),
            SeedComponent::Address(market),
        ],
    )
}

/// Associated token account of `owner` for `mint` under `token_program`
pub fn token_account_address(
    owner: &Pubkey,
    mint: &Pubkey,
    token_program: &Pubkey,
) -> Result<DerivedAddress, DerivationError> {
    derive_address(
        &spl_associated_token_account::id(),
        &[
            SeedComponent::Address(owner),
            SeedComponent::Address(token_program),
            SeedComponent::Address(mint),
        ],
    )
}

/// Stake account named `name` owned by `authority`
pub fn stake_address(
    program_id: &Pubkey,
    authority: &Pubkey,
    name: &str,
) -> Result<DerivedAddress, DerivationError> {
    derive_address(
        program_id,
        &[
            SeedComponent::Bytes(STAKE_SEED),
            SeedComponent::Address(authority),
            SeedComponent::Bytes(name.as_bytes()),
        ],
    )
}

/// Stake vault identified by `vault_name`
pub fn stake_vault_address(
    program_id: &Pubkey,
    vault_name: &str,
) -> Result<DerivedAddress, DerivationError> {
    derive_address(
        program_id,
        &[
            SeedComponent::Bytes(STAKE_VAULT_SEED),
            SeedComponent::Bytes(vault_name.as_bytes()),
        ],
    )
}

/// Ticket collection registered under `symbol`
pub fn collection_address(program_id: &Pubkey, symbol: &str) -> Result<DerivedAddress, DerivationError> {
    derive_address(
        program_id,
        &[
            SeedComponent::Bytes(COLLECTION_SEED),
            SeedComponent::Bytes(symbol.as_bytes()),
        ],
    )
}

/// Marker account of minted ticket `number`; it exists once the number is taken
pub fn ticket_address(program_id: &Pubkey, number: u64) -> Result<DerivedAddress, DerivationError> {
    derive_address(
        program_id,
        &[SeedComponent::Bytes(NFT_SEED), SeedComponent::U64(number)],
    )
}
