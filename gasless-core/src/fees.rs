//! Conversion of native fee estimates into gas-token amounts.

use alloy_primitives::U256;

use crate::constants::FEE_SAFETY_MULTIPLIER;
use crate::error::{GaslessError, Result};
use crate::types::{FeeEstimate, GasTokenPrice, GaslessCompatibility};

/// Converts a native fee into the smallest unit of the gas token.
///
/// The sponsored path costs more gas than a direct invoke, so the overheads
/// are priced in before converting:
///
/// ```text
/// (fee + gas_price * gas_overhead + data_gas_price * data_gas_overhead)
///     * 10^decimals / price_in_eth
/// ```
pub fn gas_fees_in_gas_token(
    estimated_fee: U256,
    price: &GasTokenPrice,
    gas_price: U256,
    data_gas_price: U256,
    gas_overhead: U256,
    data_gas_overhead: U256,
) -> Result<U256> {
    if price.price_in_eth.is_zero() {
        return Err(GaslessError::InvalidGasTokenPrice(format!(
            "zero ETH price for token {}",
            price.token_address
        )));
    }

    let gas_overhead_fee = gas_price
        .checked_mul(gas_overhead)
        .ok_or(GaslessError::ArithmeticOverflow("gas overhead fee"))?;
    let data_overhead_fee = data_gas_price
        .checked_mul(data_gas_overhead)
        .ok_or(GaslessError::ArithmeticOverflow("data gas overhead fee"))?;
    let total_in_eth = estimated_fee
        .checked_add(gas_overhead_fee)
        .and_then(|sum| sum.checked_add(data_overhead_fee))
        .ok_or(GaslessError::ArithmeticOverflow("total native fee"))?;

    let unit = U256::from(10u64)
        .checked_pow(U256::from(price.decimals))
        .ok_or(GaslessError::ArithmeticOverflow("token decimals"))?;

    total_in_eth
        .checked_mul(unit)
        .map(|scaled| scaled / price.price_in_eth)
        .ok_or(GaslessError::ArithmeticOverflow("gas token amount"))
}

/// Maximum gas-token amount the user may be charged for a fee estimate:
/// the converted fee times the safety multiplier.
pub fn max_gas_token_amount(
    fee: &FeeEstimate,
    price: &GasTokenPrice,
    compatibility: &GaslessCompatibility,
) -> Result<U256> {
    let converted = gas_fees_in_gas_token(
        fee.overall_fee,
        price,
        fee.gas_price,
        fee.data_gas_price_or_default(),
        compatibility.gas_consumed_overhead,
        compatibility.data_gas_consumed_overhead,
    )?;

    converted
        .checked_mul(U256::from(FEE_SAFETY_MULTIPLIER))
        .ok_or(GaslessError::ArithmeticOverflow("max gas token amount"))
}
