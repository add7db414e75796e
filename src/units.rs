use alloy::primitives::{
    utils::{format_units, parse_units, ParseUnits},
    U256,
};

use crate::{consts::TOKEN_DECIMALS, errors::SdkError};

/// Converts a decimal amount such as `"1.5"` to its smallest unit, assuming 18 decimals.
pub fn parse_amount(amount: &str) -> Result<U256, SdkError> {
    match parse_units(amount.trim(), TOKEN_DECIMALS)? {
        ParseUnits::U256(value) => Ok(value),
        ParseUnits::I256(_) => Err(SdkError::NegativeAmount(amount.to_string())),
    }
}

/// Inverse of [`parse_amount`], lossy above 2^53.
pub fn format_amount(amount: U256) -> Result<f64, SdkError> {
    Ok(format_units(amount, TOKEN_DECIMALS)?.parse::<f64>()?)
}
