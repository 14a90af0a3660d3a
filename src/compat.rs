//! Version-independent accessors for compiled messages
//!
//! Transactions are always compiled as v0 here, but envelopes handed in
//! from outside (tests, replays) may carry legacy messages. These helpers
//! read the header, static keys and signer set of either version.

use std::collections::HashSet;

use solana_sdk::{
    message::{MessageHeader, VersionedMessage},
    pubkey::Pubkey,
};

#[inline]
#[must_use]
pub fn get_message_header(message: &VersionedMessage) -> &MessageHeader {
    match message {
        VersionedMessage::Legacy(legacy_msg) => &legacy_msg.header,
        VersionedMessage::V0(v0_msg) => &v0_msg.header,
    }
}

/// Keys embedded in the message itself, excluding lookup-table loads.
#[inline]
#[must_use]
pub fn get_static_account_keys(message: &VersionedMessage) -> &[Pubkey] {
    match message {
        VersionedMessage::Legacy(legacy_msg) => &legacy_msg.account_keys,
        VersionedMessage::V0(v0_msg) => &v0_msg.account_keys,
    }
}

/// Accounts that must sign: the first `num_required_signatures` static keys.
/// Signers can never come from a lookup table.
#[inline]
#[must_use]
pub fn get_required_signers(message: &VersionedMessage) -> &[Pubkey] {
    let num_signers = usize::from(get_message_header(message).num_required_signatures);
    let account_keys = get_static_account_keys(message);
    &account_keys[..num_signers.min(account_keys.len())]
}

/// Required signers not present in `available`, in message order.
pub fn missing_signers(message: &VersionedMessage, available: &[Pubkey]) -> Vec<Pubkey> {
    let available: HashSet<&Pubkey> = available.iter().collect();
    get_required_signers(message)
        .iter()
        .filter(|key| !available.contains(key))
        .copied()
        .collect()
}

/// Number of account addresses the message loads through lookup tables.
#[must_use]
pub fn loaded_address_count(message: &VersionedMessage) -> usize {
    match message {
        VersionedMessage::Legacy(_) => 0,
        VersionedMessage::V0(v0_msg) => v0_msg
            .address_table_lookups
            .iter()
            .map(|lookup| lookup.writable_indexes.len() + lookup.readonly_indexes.len())
            .sum(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use solana_sdk::{
        hash::Hash,
        instruction::{AccountMeta, Instruction},
        message::{v0::Message as MessageV0, AddressLookupTableAccount, Message},
        signature::Keypair,
        signer::Signer,
    };
    #[allow(deprecated)]
    use solana_sdk::system_instruction;

    fn cosigned_instruction(payer: &Pubkey, cosigner: &Pubkey, extra: &[Pubkey]) -> Instruction {
        let mut accounts = vec![AccountMeta::new(*payer, true), AccountMeta::new(*cosigner, true)];
        accounts.extend(extra.iter().map(|key| AccountMeta::new(*key, false)));
        Instruction::new_with_bytes(Pubkey::new_unique(), &[1], accounts)
    }

    #[test]
    fn test_legacy_and_v0_agree() {
        let payer = Keypair::new();
        let recipient = Pubkey::new_unique();

        #[allow(deprecated)]
        let instruction = system_instruction::transfer(&payer.pubkey(), &recipient, 1000);
        let legacy = VersionedMessage::Legacy(Message::new(
            std::slice::from_ref(&instruction),
            Some(&payer.pubkey()),
        ));
        let v0 = VersionedMessage::V0(
            MessageV0::try_compile(&payer.pubkey(), &[instruction], &[], Hash::default()).unwrap(),
        );

        for message in [legacy, v0] {
            assert_eq!(get_message_header(&message).num_required_signatures, 1);
            assert_eq!(get_required_signers(&message), &[payer.pubkey()]);
            assert_eq!(get_static_account_keys(&message)[0], payer.pubkey());
        }
    }

    #[test]
    fn test_missing_signers_reports_cosigner() {
        let payer = Pubkey::new_unique();
        let cosigner = Pubkey::new_unique();
        let ix = cosigned_instruction(&payer, &cosigner, &[]);
        let message = VersionedMessage::V0(
            MessageV0::try_compile(&payer, &[ix], &[], Hash::default()).unwrap(),
        );

        assert_eq!(get_required_signers(&message).len(), 2);
        assert_eq!(missing_signers(&message, &[payer]), vec![cosigner]);
        assert!(missing_signers(&message, &[cosigner, payer]).is_empty());
    }

    #[test]
    fn test_lookup_tables_shrink_static_keys() {
        let payer = Pubkey::new_unique();
        let cosigner = Pubkey::new_unique();
        let extra: Vec<Pubkey> = (0..6).map(|_| Pubkey::new_unique()).collect();
        let table = AddressLookupTableAccount {
            key: Pubkey::new_unique(),
            addresses: extra.clone(),
        };
        let ix = cosigned_instruction(&payer, &cosigner, &extra);

        let message = VersionedMessage::V0(
            MessageV0::try_compile(&payer, &[ix], &[table], Hash::default()).unwrap(),
        );
        assert_eq!(loaded_address_count(&message), 6);
        assert!(!get_static_account_keys(&message).iter().any(|k| extra.contains(k)));
        // Signers stay static even when a table lists them.
        assert_eq!(get_required_signers(&message), &[payer, cosigner]);
    }
}
