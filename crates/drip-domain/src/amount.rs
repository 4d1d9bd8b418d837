//! Fixed-point token amount helpers.
//!
//! ERC20 balances are integers scaled by `10^decimals`. Display strings keep a
//! fixed number of fractional digits and truncate the rest.

use alloy::primitives::U256;

/// Largest decimals value whose scale `10^decimals` still fits in a `U256`.
const MAX_DECIMALS: u8 = 77;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TokenAmountError {
    #[error("unsupported token decimals: {0} (max {MAX_DECIMALS})")]
    UnsupportedDecimals(u8),

    #[error("amount of {tokens} tokens overflows uint256 at {decimals} decimals")]
    Overflow { tokens: u64, decimals: u8 },
}

fn scale(decimals: u8) -> Result<U256, TokenAmountError> {
    if decimals > MAX_DECIMALS {
        return Err(TokenAmountError::UnsupportedDecimals(decimals));
    }
    U256::from(10u64)
        .checked_pow(U256::from(decimals))
        .ok_or(TokenAmountError::UnsupportedDecimals(decimals))
}

/// Converts a whole-token count into the token's integer representation.
///
/// `whole_tokens_to_units(100, 18)` is `100 * 10^18`.
pub fn whole_tokens_to_units(tokens: u64, decimals: u8) -> Result<U256, TokenAmountError> {
    U256::from(tokens)
        .checked_mul(scale(decimals)?)
        .ok_or(TokenAmountError::Overflow { tokens, decimals })
}

/// Formats a raw token amount as a decimal string with `decimal_places`
/// fractional digits.
///
/// Digits beyond `decimal_places` are truncated. When `decimal_places` exceeds
/// `decimals` the fraction is right-padded with zeros.
pub fn format_token_amount(
    raw: U256,
    decimals: u8,
    decimal_places: u8,
) -> Result<String, TokenAmountError> {
    let scale = scale(decimals)?;
    let integer = raw / scale;

    if decimal_places == 0 {
        return Ok(integer.to_string());
    }

    let fraction = if decimals == 0 {
        String::new()
    } else {
        format!("{:0>width$}", (raw % scale).to_string(), width = decimals as usize)
    };

    let shown: String = fraction
        .chars()
        .chain(std::iter::repeat('0'))
        .take(decimal_places as usize)
        .collect();

    Ok(format!("{integer}.{shown}"))
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;

    #[test]
    fn formats_whole_balance_with_six_places() {
        let raw: U256 = "123000000000000000000".parse().unwrap();
        assert_eq!(format_token_amount(raw, 18, 6).unwrap(), "123.000000");
    }

    #[test]
    fn truncates_instead_of_rounding() {
        // 1.9999999 tokens
        let raw = U256::from(1_999_999_900_000_000_000u128);
        assert_eq!(format_token_amount(raw, 18, 6).unwrap(), "1.999999");
    }

    #[test]
    fn keeps_leading_fraction_zeros() {
        // 0.000042 tokens
        let raw = U256::from(42_000_000_000_000u128);
        assert_eq!(format_token_amount(raw, 18, 6).unwrap(), "0.000042");
    }

    #[test]
    fn zero_places_prints_integer_part_only() {
        let raw = U256::from(5_500_000u64);
        assert_eq!(format_token_amount(raw, 6, 0).unwrap(), "5");
    }

    #[test]
    fn pads_when_places_exceed_decimals() {
        let raw = U256::from(1234u64);
        assert_eq!(format_token_amount(raw, 2, 4).unwrap(), "12.3400");
        assert_eq!(format_token_amount(raw, 0, 2).unwrap(), "1234.00");
    }

    #[test]
    fn reward_of_one_hundred_tokens() {
        let reward = whole_tokens_to_units(100, 18).unwrap();
        assert_eq!(reward, "100000000000000000000".parse::<U256>().unwrap());
    }

    #[test]
    fn rejects_unrepresentable_decimals() {
        assert_eq!(
            whole_tokens_to_units(1, 78),
            Err(TokenAmountError::UnsupportedDecimals(78))
        );
        assert_eq!(
            whole_tokens_to_units(u64::MAX, 77),
            Err(TokenAmountError::Overflow {
                tokens: u64::MAX,
                decimals: 77
            })
        );
    }
}
