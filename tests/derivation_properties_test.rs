//! Property tests for address derivation and the fixed-length text codec

use proptest::prelude::*;
use solana_sdk::pubkey::Pubkey;

use triad_client::derivation::{
    derive_address, market_address, stake_address, user_trade_address, DerivationError,
    SeedComponent, MARKET_SEED, MAX_SEED_LEN,
};
use triad_client::state::{decode_fixed, encode_fixed, format_units, parse_units};

fn pubkey() -> impl Strategy<Value = Pubkey> {
    any::<[u8; 32]>().prop_map(Pubkey::new_from_array)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn market_derivation_is_deterministic_and_off_curve(program in pubkey(), market_id in any::<u64>()) {
        let first = market_address(&program, market_id).unwrap();
        let second = market_address(&program, market_id).unwrap();
        prop_assert_eq!(first, second);
        prop_assert!(!first.address.is_on_curve());

        let (expected, bump) =
            Pubkey::find_program_address(&[MARKET_SEED, &market_id.to_le_bytes()], &program);
        prop_assert_eq!(first.address, expected);
        prop_assert_eq!(first.bump, bump);
    }

    #[test]
    fn distinct_wallets_get_distinct_trade_ledgers(program in pubkey(), a in pubkey(), b in pubkey()) {
        prop_assume!(a != b);
        let first = user_trade_address(&program, &a).unwrap();
        let second = user_trade_address(&program, &b).unwrap();
        prop_assert_ne!(first.address, second.address);
    }

    #[test]
    fn stake_names_up_to_seed_limit_derive(program in pubkey(), owner in pubkey(), name in "[a-z0-9-]{1,32}") {
        let derived = stake_address(&program, &owner, &name).unwrap();
        prop_assert!(!derived.address.is_on_curve());
    }

    #[test]
    fn oversized_seeds_are_rejected(program in pubkey(), extra in 1usize..64) {
        let seed = vec![7u8; MAX_SEED_LEN + extra];
        let err = derive_address(&program, &[SeedComponent::Bytes(&seed)]).unwrap_err();
        prop_assert!(matches!(err, DerivationError::InvalidSeeds(_)));
    }

    #[test]
    fn fixed_text_round_trips(text in "[A-Za-z0-9/?,.]([A-Za-z0-9/?,. ]{0,62}[A-Za-z0-9/?,.])?") {
        let encoded = encode_fixed::<64>(&text).unwrap();
        prop_assert_eq!(decode_fixed(&encoded), text.clone());
        // decoding is idempotent once padded again
        let again = encode_fixed::<64>(&decode_fixed(&encoded)).unwrap();
        prop_assert_eq!(again, encoded);
    }

    #[test]
    fn padded_text_decodes_to_its_trimmed_form(text in "[a-z ]{0,40}", padding in "[ \\x00]{0,8}") {
        let input = format!("{}{}", text, padding);
        let encoded = encode_fixed::<64>(&input).unwrap();
        prop_assert_eq!(decode_fixed(&encoded), text.trim_end());
    }

    #[test]
    fn text_longer_than_field_never_encodes(text in "[a-z]{33,80}") {
        prop_assert!(encode_fixed::<32>(&text).is_err());
    }

    #[test]
    fn formatted_amounts_parse_back(value in any::<u64>(), decimals in 0u8..=9) {
        let rendered = format_units(value, decimals);
        prop_assert_eq!(parse_units(&rendered, decimals).unwrap(), value);
    }
}
