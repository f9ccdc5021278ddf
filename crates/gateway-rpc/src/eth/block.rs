//! Block retrieval (§4.6.1).

use super::address::resolve_address_pair;
use super::gas::current_gas_price_for_block;
use super::logs::mirror_log_to_log;
use super::support::{mirror_error_to_gateway, parse_seconds, resolve_block};
use super::transaction::{index_by_hash, transaction_from_contract_result};
use super::EthContext;
use crate::params::BlockParam;
use crate::util::ensure_0x_prefix;
use alloy_consensus::{Eip658Value, Receipt as ConsensusReceipt, ReceiptEnvelope, ReceiptWithBloom};
use alloy_primitives::Log as AlloyLog;
use alloy_rlp::Encodable;
use gateway_errors::GatewayError;
use gateway_mirror::{ContractResult, MirrorLog};
use gateway_primitives::{hexutil, Block, BlockTransactions, Transaction};
use std::collections::{HashMap, HashSet};

/// A closed list of upstream result codes that indicate a contract result
/// failed host-specific validation and is excluded from a block's
/// transaction array (§4.6.1 step 1).
const HOST_VALIDATION_FAILURES: &[&str] =
    &["WRONG_NONCE", "INVALID_ACCOUNT_ID", "INSUFFICIENT_PAYER_BALANCE", "DUPLICATE_TRANSACTION"];

fn passes_host_validation(result: &ContractResult) -> bool {
    !HOST_VALIDATION_FAILURES.contains(&result.result.as_str())
}

/// `eth_getBlockByHash` / `eth_getBlockByNumber` (§4.6.1).
pub async fn get_block_by_hash_or_number(
    ctx: &EthContext,
    block: &BlockParam,
    show_details: bool,
) -> Result<Option<Block>, GatewayError> {
    let Some(mirror_block) = resolve_block(&ctx.mirror, block, None).await? else {
        return Ok(None);
    };

    let from_ts = mirror_block.timestamp.from.clone();
    let to_ts = mirror_block.timestamp.to.clone();
    let logs_query = format!("timestamp=gte:{from_ts}&timestamp=lte:{to_ts}&limit=1000");

    let (results, logs) = futures::future::join(
        ctx.mirror.contract_results_by_block(mirror_block.number, None),
        ctx.mirror.logs_by_filter(&logs_query, None),
    )
    .await;
    let mut results = results.map_err(mirror_error_to_gateway)?;
    let logs = logs.map_err(mirror_error_to_gateway)?;
    results.sort_by_key(|r| r.transaction_index);

    let synthetic_hashes = synthetic_transaction_hashes(&results, &logs);
    let total_entries = results.iter().filter(|r| passes_host_validation(r)).count()
        + synthetic_hashes.len();
    if show_details && total_entries > ctx.config.max_block_transactions_for_details {
        return Err(GatewayError::InvalidParams(
            "block has too many transactions for full details".to_string(),
        ));
    }

    let logs_by_hash = group_logs_by_hash(&logs);

    let mut transactions = Vec::with_capacity(total_entries);
    let mut receipt_entries: Vec<(ContractResult, Vec<MirrorLog>)> = Vec::with_capacity(total_entries);

    for result in results.iter().filter(|r| passes_host_validation(r)) {
        if show_details {
            let (from, to) =
                resolve_address_pair(&ctx.mirror, &result.from, result.to.as_deref()).await?;
            if let Some(tx) = transaction_from_contract_result(
                result,
                &from,
                to.as_deref(),
                ctx.config.tinybar_to_weibar_coef,
            ) {
                transactions.push(tx);
            }
        }
        let tx_logs = logs_by_hash.get(result.hash.as_str()).cloned().unwrap_or_default();
        receipt_entries.push((result.clone(), tx_logs));
    }

    for hash in &synthetic_hashes {
        let tx_logs = logs_by_hash.get(hash.as_str()).cloned().unwrap_or_default();
        let Some(first_log) = tx_logs.first() else { continue };
        if show_details {
            transactions.push(Transaction::synthetic(
                hash.clone(),
                ensure_0x_prefix(&first_log.address),
                ensure_0x_prefix(&first_log.block_hash),
                hexutil::quantity(first_log.block_number),
                hexutil::quantity(first_log.transaction_index),
            ));
        }
        receipt_entries.push((synthetic_result(hash, first_log), tx_logs));
    }

    let transactions = if show_details {
        BlockTransactions::Full(transactions)
    } else {
        let mut hashes: Vec<String> =
            results.iter().filter(|r| passes_host_validation(r)).map(|r| r.hash.clone()).collect();
        hashes.extend(synthetic_hashes.iter().cloned());
        BlockTransactions::Hashes(hashes)
    };

    let receipts_root = compute_receipts_root(&receipt_entries);
    let base_fee_per_gas = current_gas_price_for_block(ctx, &mirror_block.hash).await?;

    Ok(Some(Block::with_defaults(
        ensure_0x_prefix(&mirror_block.hash),
        ensure_0x_prefix(&mirror_block.prev_hash),
        hexutil::quantity(mirror_block.number),
        hexutil::quantity(parse_seconds(&from_ts)),
        hexutil::quantity(mirror_block.gas_used),
        hexutil::quantity(ctx.config.max_gas_per_second),
        base_fee_per_gas,
        mirror_block.logs_bloom.map(|b| ensure_0x_prefix(&b)),
        receipts_root,
        hexutil::quantity(mirror_block.size),
        transactions,
    )))
}

fn synthetic_transaction_hashes(results: &[ContractResult], logs: &[MirrorLog]) -> Vec<String> {
    let known = index_by_hash(results);
    let mut seen = HashSet::new();
    let mut hashes = Vec::new();
    for log in logs {
        let hash = ensure_0x_prefix(&log.transaction_hash);
        if known.contains_key(hash.as_str()) {
            continue;
        }
        if seen.insert(hash.clone()) {
            hashes.push(hash);
        }
    }
    hashes
}

fn group_logs_by_hash(logs: &[MirrorLog]) -> HashMap<&str, Vec<MirrorLog>> {
    let mut map: HashMap<&str, Vec<MirrorLog>> = HashMap::new();
    for log in logs {
        map.entry(log.transaction_hash.as_str()).or_default().push(log.clone());
    }
    map
}

fn synthetic_result(hash: &str, log: &MirrorLog) -> ContractResult {
    ContractResult {
        hash: hash.to_string(),
        from: log.address.clone(),
        to: Some(log.address.clone()),
        block_hash: log.block_hash.clone(),
        block_number: log.block_number,
        transaction_index: log.transaction_index,
        result: "SUCCESS".to_string(),
        r#type: Some(2),
        ..Default::default()
    }
}

fn compute_receipts_root(entries: &[(ContractResult, Vec<MirrorLog>)]) -> String {
    let envelopes: Vec<ReceiptEnvelope> = entries
        .iter()
        .map(|(result, logs)| {
            let consensus_logs: Vec<AlloyLog> = logs
                .iter()
                .filter_map(|l| {
                    let address = ensure_0x_prefix(&l.address).parse().ok()?;
                    Some(AlloyLog { address, data: Default::default() })
                })
                .collect();
            let receipt = ConsensusReceipt {
                status: Eip658Value::Eip658(result.is_success()),
                cumulative_gas_used: result.gas_used,
                logs: consensus_logs,
            };
            let with_bloom = ReceiptWithBloom::new(receipt, Default::default());
            match result.r#type {
                Some(1) => ReceiptEnvelope::Eip2930(with_bloom),
                Some(2) | None => ReceiptEnvelope::Eip1559(with_bloom),
                Some(_) => ReceiptEnvelope::Legacy(with_bloom),
            }
        })
        .collect();

    let root = alloy_trie::root::ordered_trie_root_with_encoder(&envelopes, |envelope, buf| {
        envelope.encode(buf)
    });
    hexutil::fixed_bytes(root.as_slice())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_seconds_from_timestamp() {
        assert_eq!(parse_seconds("123.456"), 123);
        assert_eq!(parse_seconds(""), 0);
    }

    #[test]
    fn synthetic_hashes_exclude_known_results() {
        let result = ContractResult { hash: "0xaa".to_string(), ..Default::default() };
        let logs = vec![
            MirrorLog { transaction_hash: "0xaa".to_string(), ..Default::default() },
            MirrorLog { transaction_hash: "0xbb".to_string(), ..Default::default() },
        ];
        let hashes = synthetic_transaction_hashes(&[result], &logs);
        assert_eq!(hashes, vec!["0xbb".to_string()]);
    }

    #[test]
    fn empty_block_receipts_root_is_stable() {
        let root = compute_receipts_root(&[]);
        assert!(root.starts_with("0x"));
    }
}
