//! Transaction retrieval and construction (§4.6.2, §4.6.7).

use super::address::resolve_address_pair;
use super::support::{mirror_error_to_gateway, resolve_block_number};
use super::EthContext;
use crate::params::BlockParam;
use crate::util::{ensure_0x_prefix, non_empty, tinybar_to_weibar_hex};
use gateway_errors::GatewayError;
use gateway_mirror::ContractResult;
use gateway_primitives::hexutil;
use gateway_primitives::{AccessListItem, Transaction, TransactionEnvelope};
use std::collections::HashMap;

/// The type-dispatched transaction builder (§4.6.7). `from`/`to` are the
/// already-resolved EVM addresses; the rest of the envelope is taken from
/// `result`. Returns `None` for an unrecognized EIP-2718 type.
pub fn transaction_from_contract_result(
    result: &ContractResult,
    from: &str,
    to: Option<&str>,
    coef: u64,
) -> Option<Transaction> {
    let envelope = TransactionEnvelope {
        hash: result.hash.clone(),
        nonce: hexutil::quantity(result.nonce),
        from: from.to_string(),
        to: to.map(str::to_string),
        value: tinybar_to_weibar_hex(result.amount, coef),
        gas: hexutil::quantity(result.gas_limit),
        input: ensure_0x_prefix(&result.function_parameters),
        v: result.v.map(hexutil::quantity).unwrap_or_else(|| "0x0".to_string()),
        r: normalize_signature_component(&result.r),
        s: normalize_signature_component(&result.s),
        block_hash: non_empty(&result.block_hash),
        block_number: Some(hexutil::quantity(result.block_number)),
        transaction_index: Some(hexutil::quantity(result.transaction_index)),
        chain_id: chain_id_field(result),
    };

    match result.r#type {
        None | Some(0) => Some(Transaction::Legacy {
            gas_price: crate::util::tinybar_decimal_str_to_weibar_hex(&result.gas_price, coef),
            envelope,
        }),
        Some(1) => Some(Transaction::AccessList {
            gas_price: crate::util::tinybar_decimal_str_to_weibar_hex(&result.gas_price, coef),
            access_list: Vec::<AccessListItem>::new(),
            envelope,
        }),
        Some(2) => Some(Transaction::DynamicFee {
            access_list: Vec::<AccessListItem>::new(),
            max_fee_per_gas: normalize_fee(result.max_fee_per_gas.as_deref()),
            max_priority_fee_per_gas: normalize_fee(result.max_priority_fee_per_gas.as_deref()),
            envelope,
        }),
        Some(_) => None,
    }
}

fn normalize_signature_component(raw: &str) -> String {
    if raw.is_empty() {
        return "0x0".to_string();
    }
    hexutil::normalize_hex_quantity(raw)
}

/// Null/empty-hex becomes `0x0`; a present value has leading zeros stripped
/// (§4.6.7).
fn normalize_fee(raw: Option<&str>) -> String {
    match raw {
        None => "0x0".to_string(),
        Some(s) => hexutil::normalize_hex_quantity(s),
    }
}

/// Legacy chain-id of `0x` (i.e. absent) is left unset, for tool
/// compatibility (§4.6.7); other types always carry a normalized value.
fn chain_id_field(result: &ContractResult) -> Option<String> {
    let raw = result.chain_id.as_deref()?;
    let is_legacy = matches!(result.r#type, None | Some(0));
    if is_legacy && raw.strip_prefix("0x").unwrap_or(raw).is_empty() {
        None
    } else {
        Some(hexutil::normalize_hex_quantity(raw))
    }
}

/// `eth_getTransactionByHash` (§4.6.2): contract result lookup, falling back
/// to a synthetic-transaction probe against the logs endpoint.
pub async fn get_transaction_by_hash(
    ctx: &EthContext,
    hash: &str,
) -> Result<Option<Transaction>, GatewayError> {
    let result = ctx
        .mirror
        .contract_result(hash, None)
        .await
        .map_err(mirror_error_to_gateway)?;

    let Some(result) = result else {
        return synthesize_from_logs_probe(ctx, hash).await;
    };

    let (from, to) =
        resolve_address_pair(&ctx.mirror, &result.from, result.to.as_deref()).await?;
    Ok(transaction_from_contract_result(
        &result,
        &from,
        to.as_deref(),
        ctx.config.tinybar_to_weibar_coef,
    ))
}

async fn synthesize_from_logs_probe(
    ctx: &EthContext,
    hash: &str,
) -> Result<Option<Transaction>, GatewayError> {
    let logs = ctx
        .mirror
        .logs_by_filter(&format!("transaction.hash={hash}"), None)
        .await
        .map_err(mirror_error_to_gateway)?;
    let Some(log) = logs.into_iter().next() else { return Ok(None) };
    Ok(Some(Transaction::synthetic(
        hash.to_string(),
        log.address,
        ensure_0x_prefix(&log.block_hash),
        hexutil::quantity(log.block_number),
        hexutil::quantity(log.transaction_index),
    )))
}

/// `eth_getTransactionByBlockHashAndIndex` (§4.6.2).
pub async fn get_transaction_by_block_hash_and_index(
    ctx: &EthContext,
    block_hash: &str,
    index: u64,
) -> Result<Option<Transaction>, GatewayError> {
    let Some(block) = ctx.mirror.block_by_hash(block_hash, None).await.map_err(mirror_error_to_gateway)?
    else {
        return Ok(None);
    };
    transaction_by_block_number_and_index(ctx, block.number, index).await
}

/// `eth_getTransactionByBlockNumberAndIndex` (§4.6.2).
pub async fn get_transaction_by_block_number_and_index(
    ctx: &EthContext,
    block: &BlockParam,
    index: u64,
) -> Result<Option<Transaction>, GatewayError> {
    let Some(number) = resolve_block_number(&ctx.mirror, block, None).await? else {
        return Ok(None);
    };
    transaction_by_block_number_and_index(ctx, number, index).await
}

async fn transaction_by_block_number_and_index(
    ctx: &EthContext,
    block_number: u64,
    index: u64,
) -> Result<Option<Transaction>, GatewayError> {
    let results = ctx
        .mirror
        .contract_results_by_block(block_number, None)
        .await
        .map_err(mirror_error_to_gateway)?;
    let Some(result) = results.into_iter().find(|r| r.transaction_index == index) else {
        return Ok(None);
    };
    let (from, to) =
        resolve_address_pair(&ctx.mirror, &result.from, result.to.as_deref()).await?;
    Ok(transaction_from_contract_result(
        &result,
        &from,
        to.as_deref(),
        ctx.config.tinybar_to_weibar_coef,
    ))
}

/// Indexes a block's contract results by transaction hash, for reconciling
/// synthetic transactions against the block's log set (§4.6.1 step 2).
pub(crate) fn index_by_hash(results: &[ContractResult]) -> HashMap<&str, &ContractResult> {
    results.iter().map(|r| (r.hash.as_str(), r)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_result() -> ContractResult {
        ContractResult {
            hash: "0x".to_string() + &"11".repeat(32),
            from: "0x".to_string() + &"aa".repeat(20),
            to: Some("0x".to_string() + &"bb".repeat(20)),
            amount: 5,
            gas_limit: 21_000,
            gas_price: "100".to_string(),
            function_parameters: "deadbeef".to_string(),
            result: "SUCCESS".to_string(),
            block_hash: "0x".to_string() + &"cc".repeat(32),
            block_number: 10,
            transaction_index: 2,
            ..Default::default()
        }
    }

    #[test]
    fn legacy_type_builds_with_gas_price_and_no_chain_id_when_empty() {
        let mut result = base_result();
        result.r#type = None;
        result.chain_id = Some("0x".to_string());
        let tx = transaction_from_contract_result(&result, &result.from.clone(), result.to.as_deref(), 10_000_000_000)
            .unwrap();
        match tx {
            Transaction::Legacy { envelope, gas_price } => {
                assert_eq!(gas_price, "0x174876e800");
                assert_eq!(envelope.chain_id, None);
            }
            other => panic!("expected legacy, got {other:?}"),
        }
    }

    #[test]
    fn dynamic_fee_normalizes_null_max_fees() {
        let mut result = base_result();
        result.r#type = Some(2);
        result.max_fee_per_gas = None;
        result.max_priority_fee_per_gas = Some("0x00ab".to_string());
        let tx = transaction_from_contract_result(&result, &result.from.clone(), result.to.as_deref(), 1).unwrap();
        match tx {
            Transaction::DynamicFee { max_fee_per_gas, max_priority_fee_per_gas, access_list, .. } => {
                assert_eq!(max_fee_per_gas, "0x0");
                assert_eq!(max_priority_fee_per_gas, "0xab");
                assert!(access_list.is_empty());
            }
            other => panic!("expected dynamic fee, got {other:?}"),
        }
    }

    #[test]
    fn unknown_type_returns_none() {
        let mut result = base_result();
        result.r#type = Some(9);
        assert!(transaction_from_contract_result(&result, &result.from.clone(), result.to.as_deref(), 1).is_none());
    }

    #[test]
    fn signature_components_strip_leading_zeros() {
        let mut result = base_result();
        result.r = "0x00ab".to_string();
        result.s = "".to_string();
        let tx = transaction_from_contract_result(&result, &result.from.clone(), result.to.as_deref(), 1).unwrap();
        assert_eq!(tx.envelope().r, "0xab");
        assert_eq!(tx.envelope().s, "0x0");
    }
}
