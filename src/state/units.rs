//! Fixed-point amounts and fixed-length text fields
//!
//! The ledger stores token quantities as integers in minor units and
//! short text (names, comments, questions) as space-padded byte arrays.

use super::errors::FormatError;

/// Decimal places of the canonical asset
pub const CANONICAL_DECIMALS: u8 = 6;

/// Byte budget of names
pub const NAME_LEN: usize = 32;

/// Byte budget of the comment attached to an opened order
pub const COMMENT_LEN: usize = 64;

/// Byte budget of a market question
pub const QUESTION_LEN: usize = 80;

/// Render `value` minor units as a decimal string with `decimals` places.
///
/// Trailing fractional zeros are dropped: `99_999_999` at 6 decimals is
/// `"99.999999"`, `100_000_000` is `"100"`.
pub fn format_units(value: u64, decimals: u8) -> String {
    if decimals == 0 {
        return value.to_string();
    }

    let scale = 10u128.pow(u32::from(decimals));
    let value = u128::from(value);
    let whole = value / scale;
    let frac = value % scale;

    if frac == 0 {
        return whole.to_string();
    }

    let frac = format!("{:0width$}", frac, width = usize::from(decimals));
    format!("{}.{}", whole, frac.trim_end_matches('0'))
}

/// Parse a decimal string into minor units with `decimals` places.
pub fn parse_units(input: &str, decimals: u8) -> Result<u64, FormatError> {
    let trimmed = input.trim();
    let (whole, frac) = match trimmed.split_once('.') {
        Some((whole, frac)) => (whole, frac),
        None => (trimmed, ""),
    };

    if whole.is_empty() && frac.is_empty() {
        return Err(FormatError::invalid_amount(input, "empty"));
    }
    if !whole.chars().all(|c| c.is_ascii_digit()) || !frac.chars().all(|c| c.is_ascii_digit()) {
        return Err(FormatError::invalid_amount(input, "not a decimal number"));
    }
    if frac.len() > usize::from(decimals) {
        return Err(FormatError::invalid_amount(
            input,
            format!("more than {} decimal places", decimals),
        ));
    }

    let scale = 10u128.pow(u32::from(decimals));
    let whole_value: u128 = if whole.is_empty() {
        0
    } else {
        whole
            .parse()
            .map_err(|_| FormatError::invalid_amount(input, "whole part out of range"))?
    };
    let frac_value: u128 = if frac.is_empty() {
        0
    } else {
        let padded = format!("{:0<width$}", frac, width = usize::from(decimals));
        padded
            .parse()
            .map_err(|_| FormatError::invalid_amount(input, "fraction out of range"))?
    };

    whole_value
        .checked_mul(scale)
        .and_then(|v| v.checked_add(frac_value))
        .and_then(|v| u64::try_from(v).ok())
        .ok_or_else(|| FormatError::invalid_amount(input, "overflows u64"))
}

/// Encode `text` into a space-padded `N`-byte array.
///
/// Trailing spaces and NULs are dropped first: they cannot be told apart
/// from padding, so [`decode_fixed`] returns exactly the trimmed text. The
/// length limit applies to the trimmed text.
pub fn encode_fixed<const N: usize>(text: &str) -> Result<[u8; N], FormatError> {
    let bytes = text.trim_end_matches([' ', '\0']).as_bytes();
    if bytes.len() > N {
        return Err(FormatError::TextTooLong {
            max: N,
            actual: bytes.len(),
        });
    }

    let mut out = [b' '; N];
    out[..bytes.len()].copy_from_slice(bytes);
    Ok(out)
}

/// Decode a fixed-length text field, dropping trailing spaces and NULs.
pub fn decode_fixed(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes)
        .trim_end_matches([' ', '\0'])
        .to_string()
}
