//! Instruction encoding for the triad program
//!
//! Instructions follow the Anchor wire format: an 8-byte discriminator
//! (`sha256("global:<snake_name>")[..8]`) followed by borsh-encoded
//! arguments. Account lists mirror the program's account structs in order.

pub mod args;
pub mod instructions;

pub use args::*;
pub use instructions::{OrderAction, TriadProgram};

use sha2::{Digest, Sha256};

/// Anchor instruction discriminator for a snake_case method name
pub fn instruction_discriminator(name: &str) -> [u8; 8] {
    hashed_discriminator("global", name)
}

/// Anchor account discriminator for a PascalCase account struct name
pub fn account_discriminator(name: &str) -> [u8; 8] {
    hashed_discriminator("account", name)
}

fn hashed_discriminator(namespace: &str, name: &str) -> [u8; 8] {
    let digest = Sha256::digest(format!("{}:{}", namespace, name).as_bytes());
    let mut out = [0u8; 8];
    out.copy_from_slice(&digest[..8]);
    out
}
