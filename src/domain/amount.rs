//! Exact conversion of raw on-chain integers into decimal amounts.
//!
//! Beta values and fee rates arrive as 1e18 fixed-point integers; token
//! amounts arrive in the payment token's own base units. Both are unscaled
//! losslessly into [`Decimal`], and any value that cannot be represented
//! exactly is an error rather than a rounded approximation.

use rust_decimal::Decimal;
use thiserror::Error;

/// Scale of 1e18 fixed-point values (beta, fee rates).
pub const FIXED_POINT_SCALE: u32 = 18;

/// Errors converting raw integers into exact decimals.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AmountError {
    /// The raw value does not fit the decimal representation at this scale.
    #[error("raw amount {raw} at scale {scale} is not exactly representable")]
    Unrepresentable { raw: u128, scale: u32 },

    /// A weighted amount overflowed during multiplication.
    #[error("weighted amount overflow: {amount} x {beta}")]
    Overflow { amount: Decimal, beta: Decimal },
}

/// Unscale a 1e18 fixed-point integer (beta, fee rate).
pub fn from_fixed_e18(raw: u128) -> Result<Decimal, AmountError> {
    from_token_units(raw, FIXED_POINT_SCALE)
}

/// Unscale a raw token amount using the payment token's `decimals`.
pub fn from_token_units(raw: u128, decimals: u32) -> Result<Decimal, AmountError> {
    let mantissa = i128::try_from(raw).map_err(|_| AmountError::Unrepresentable {
        raw,
        scale: decimals,
    })?;
    Decimal::try_from_i128_with_scale(mantissa, decimals)
        .map(|d| d.normalize())
        .map_err(|_| AmountError::Unrepresentable {
            raw,
            scale: decimals,
        })
}

/// `amount x beta`, the weighted contribution of a balance move.
pub fn weighted(amount: Decimal, beta: Decimal) -> Result<Decimal, AmountError> {
    amount
        .checked_mul(beta)
        .ok_or(AmountError::Overflow { amount, beta })
}
