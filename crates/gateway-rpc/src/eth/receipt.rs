//! Receipt retrieval (§4.6.3).

use super::address::resolve_address_pair;
use super::gas::gas_price_at_timestamp;
use super::logs::mirror_log_to_log;
use super::support::{mirror_error_to_gateway, resolve_block_number};
use super::EthContext;
use crate::params::BlockParam;
use crate::util::{decode_hex_lenient, ensure_0x_prefix};
use gateway_errors::GatewayError;
use gateway_mirror::{ContractResult, MirrorLog};
use gateway_primitives::hexutil;
use gateway_primitives::Receipt;

fn tx_type_field(r#type: Option<u8>) -> String {
    match r#type {
        Some(1) => "0x1".to_string(),
        Some(2) => "0x2".to_string(),
        _ => "0x0".to_string(),
    }
}

/// Derives the created contract's address (§4.6.3): system-contract
/// creation calls report it in the last 20 bytes of `call_result`; every
/// other creation reports it directly in the result's `address` field.
fn contract_address(ctx: &EthContext, result: &ContractResult) -> Option<String> {
    let selector = decode_hex_lenient(&result.function_parameters);
    let is_system_creation = selector.len() >= 4
        && ctx
            .config
            .system_contract_creation_selectors
            .iter()
            .any(|s| s == &selector[..4]);

    if is_system_creation {
        let output = decode_hex_lenient(&result.call_result);
        if output.len() >= 20 {
            return Some(hexutil::fixed_bytes(&output[output.len() - 20..]));
        }
    }
    result.address.clone()
}

async fn build_receipt(
    ctx: &EthContext,
    result: &ContractResult,
    logs: Vec<MirrorLog>,
    cumulative_gas_used: u64,
) -> Result<Receipt, GatewayError> {
    let (from, to) =
        resolve_address_pair(&ctx.mirror, &result.from, result.to.as_deref()).await?;
    if from.is_empty() {
        return Err(GatewayError::Internal("could not resolve transaction sender".to_string()));
    }

    let effective_gas_price = gas_price_at_timestamp(ctx, &result.timestamp).await?;

    Ok(Receipt {
        block_hash: ensure_0x_prefix(&result.block_hash),
        block_number: hexutil::quantity(result.block_number),
        from,
        to,
        cumulative_gas_used: hexutil::quantity(cumulative_gas_used),
        gas_used: hexutil::quantity(result.gas_used),
        contract_address: contract_address(ctx, result),
        logs: logs.iter().map(mirror_log_to_log).collect(),
        logs_bloom: hexutil::empty_bloom(),
        transaction_hash: result.hash.clone(),
        transaction_index: hexutil::quantity(result.transaction_index),
        effective_gas_price,
        root: None,
        status: if result.is_success() { "0x1".to_string() } else { "0x0".to_string() },
        tx_type: tx_type_field(result.r#type),
    })
}

fn synthetic_receipt(log: &MirrorLog) -> Receipt {
    let address = ensure_0x_prefix(&log.address);
    Receipt {
        block_hash: ensure_0x_prefix(&log.block_hash),
        block_number: hexutil::quantity(log.block_number),
        from: address.clone(),
        to: Some(address),
        cumulative_gas_used: "0x0".to_string(),
        gas_used: "0x0".to_string(),
        contract_address: None,
        logs: vec![mirror_log_to_log(log)],
        logs_bloom: hexutil::empty_bloom(),
        transaction_hash: ensure_0x_prefix(&log.transaction_hash),
        transaction_index: hexutil::quantity(log.transaction_index),
        effective_gas_price: "0x0".to_string(),
        root: None,
        status: "0x1".to_string(),
        tx_type: "0x2".to_string(),
    }
}

/// `eth_getTransactionReceipt` (§4.6.3).
pub async fn get_transaction_receipt(
    ctx: &EthContext,
    hash: &str,
) -> Result<Option<Receipt>, GatewayError> {
    let result = ctx.mirror.contract_result(hash, None).await.map_err(mirror_error_to_gateway)?;

    let Some(result) = result else {
        let logs = ctx.mirror.logs_by_filter(&format!("transaction.hash={hash}"), None)
            .await
            .map_err(mirror_error_to_gateway)?;
        return Ok(logs.first().map(synthetic_receipt));
    };

    let logs = ctx.mirror.contract_results_logs(hash, None).await.map_err(mirror_error_to_gateway)?;
    Ok(Some(build_receipt(ctx, &result, logs, result.gas_used).await?))
}

/// `eth_getBlockReceipts`: batched over every contract result in the
/// block's timestamp range, plus synthetic receipts for logs whose
/// transaction hash has no backing contract result.
pub async fn get_block_receipts(
    ctx: &EthContext,
    block: &BlockParam,
) -> Result<Option<Vec<Receipt>>, GatewayError> {
    let Some(number) = resolve_block_number(&ctx.mirror, block, None).await? else {
        return Ok(None);
    };

    let results =
        ctx.mirror.contract_results_by_block(number, None).await.map_err(mirror_error_to_gateway)?;

    let mut cumulative = 0u64;
    let mut receipts = Vec::with_capacity(results.len());
    let mut seen_hashes = std::collections::HashSet::new();
    for result in &results {
        cumulative += result.gas_used;
        seen_hashes.insert(result.hash.clone());
        let logs = ctx
            .mirror
            .contract_results_logs(&result.hash, None)
            .await
            .map_err(mirror_error_to_gateway)?;
        receipts.push(build_receipt(ctx, result, logs, cumulative).await?);
    }

    let block_logs = ctx
        .mirror
        .logs_by_filter(&format!("block.number={number}&limit=1000"), None)
        .await
        .map_err(mirror_error_to_gateway)?;
    let mut synthetic_seen = std::collections::HashSet::new();
    for log in &block_logs {
        if seen_hashes.contains(&log.transaction_hash) || !synthetic_seen.insert(log.transaction_hash.clone())
        {
            continue;
        }
        receipts.push(synthetic_receipt(log));
    }

    Ok(Some(receipts))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tx_type_defaults_to_legacy() {
        assert_eq!(tx_type_field(None), "0x0");
        assert_eq!(tx_type_field(Some(2)), "0x2");
    }

    #[test]
    fn synthetic_receipt_has_matching_from_and_to() {
        let log = MirrorLog {
            address: "aa".repeat(20),
            transaction_hash: "bb".repeat(32),
            block_hash: "cc".repeat(32),
            ..Default::default()
        };
        let receipt = synthetic_receipt(&log);
        assert_eq!(receipt.from, receipt.to.unwrap());
        assert_eq!(receipt.status, "0x1");
    }
}
