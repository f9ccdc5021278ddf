//! Prestate tracer (§4.7): per-address `{balance, nonce, code, storage}`
//! snapshots for every account touched by a transaction's execution.

use crate::eth::support::mirror_error_to_gateway;
use crate::eth::EthContext;
use crate::util::ensure_0x_prefix;
use gateway_errors::GatewayError;
use gateway_mirror::{ContractAction, EntityKind};
use gateway_primitives::hexutil;
use std::collections::HashMap;

struct Touched {
    address: String,
    timestamp: String,
}

/// `prestateTracer`, only reachable at block scope (§4.7).
pub async fn prestate_tracer(
    ctx: &EthContext,
    tx_hash_or_id: &str,
    only_top_call: bool,
) -> Result<serde_json::Value, GatewayError> {
    let actions = ctx
        .mirror
        .contract_results_actions(tx_hash_or_id, None)
        .await
        .map_err(mirror_error_to_gateway)?;

    let scoped: Vec<&ContractAction> = if only_top_call {
        actions.iter().filter(|a| a.call_depth == 0).collect()
    } else {
        actions.iter().collect()
    };

    let touched = unique_addresses(&scoped);
    let entries = futures::future::join_all(
        touched.iter().map(|t| snapshot(ctx, &t.address, &t.timestamp)),
    )
    .await;

    let mut map = serde_json::Map::with_capacity(entries.len());
    for (touched, entry) in touched.iter().zip(entries) {
        map.insert(touched.address.clone(), entry?);
    }
    Ok(serde_json::Value::Object(map))
}

fn unique_addresses(actions: &[&ContractAction]) -> Vec<Touched> {
    let mut seen: HashMap<String, String> = HashMap::new();
    for action in actions {
        seen.entry(action.caller.clone()).or_insert_with(|| action.timestamp.clone());
        seen.entry(action.recipient.clone()).or_insert_with(|| action.timestamp.clone());
    }
    seen.into_iter().map(|(address, timestamp)| Touched { address, timestamp }).collect()
}

async fn snapshot(
    ctx: &EthContext,
    address: &str,
    timestamp: &str,
) -> Result<serde_json::Value, GatewayError> {
    let resolved =
        ctx.mirror.resolve_entity_type(address, None).await.map_err(mirror_error_to_gateway)?;
    let account = ctx
        .mirror
        .balance_at_timestamp(address, timestamp, None)
        .await
        .map_err(mirror_error_to_gateway)?;
    let balance = account.as_ref().and_then(|a| a.balance.as_ref()).map(|b| b.balance).unwrap_or(0);
    let nonce = account.as_ref().and_then(|a| a.ethereum_nonce).unwrap_or(0);

    match resolved.kind {
        EntityKind::Contract => {
            let state =
                ctx.mirror.contract_state(address, None).await.map_err(mirror_error_to_gateway)?;
            let code = state
                .and_then(|s| s.runtime_bytecode)
                .map(|b| ensure_0x_prefix(&b))
                .unwrap_or_else(|| "0x".to_string());
            let slots = ctx
                .mirror
                .contract_storage(address, Some(timestamp), None)
                .await
                .map_err(mirror_error_to_gateway)?;
            let storage: serde_json::Map<String, serde_json::Value> = slots
                .into_iter()
                .map(|s| (s.slot, serde_json::Value::String(ensure_0x_prefix(&s.value))))
                .collect();
            Ok(serde_json::json!({
                "balance": hexutil::quantity(balance),
                "nonce": hexutil::quantity(nonce),
                "code": code,
                "storage": storage,
            }))
        }
        EntityKind::Token | EntityKind::Account => Ok(serde_json::json!({
            "balance": hexutil::quantity(balance),
            "nonce": hexutil::quantity(nonce),
            "code": "0x",
            "storage": serde_json::json!({}),
        })),
    }
}
