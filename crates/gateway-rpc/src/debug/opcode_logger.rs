//! Opcode logger (§4.7): a transformed `structLogs` trace.

use crate::eth::support::mirror_error_to_gateway;
use crate::eth::EthContext;
use crate::params::TracerConfigWrapper;
use gateway_errors::GatewayError;

/// `opcodeLogger`.
pub async fn opcode_logger(
    ctx: &EthContext,
    tx_hash_or_id: &str,
    wrapper: &TracerConfigWrapper,
) -> Result<serde_json::Value, GatewayError> {
    let memory = wrapper.enable_memory;
    let stack = !wrapper.disable_stack;
    let storage = !wrapper.disable_storage;
    let query = format!("memory={memory}&stack={stack}&storage={storage}");

    let trace = ctx
        .mirror
        .contract_results_opcodes(tx_hash_or_id, &query, None)
        .await
        .map_err(mirror_error_to_gateway)?
        .ok_or(GatewayError::ResourceNotFound)?;

    let struct_logs: Vec<serde_json::Value> = trace
        .opcodes
        .iter()
        .map(|entry| {
            serde_json::json!({
                "pc": entry.pc,
                "op": entry.op,
                "gas": entry.gas,
                "gasCost": entry.gas_cost,
                "depth": entry.depth,
                "stack": if stack { json_strings(&entry.stack) } else { serde_json::Value::Null },
                "memory": if memory { json_strings(&entry.memory) } else { serde_json::Value::Null },
                "storage": if storage { json_map(&entry.storage) } else { serde_json::Value::Null },
                "reason": entry.reason.clone().map(serde_json::Value::String).unwrap_or(serde_json::Value::Null),
            })
        })
        .collect();

    Ok(serde_json::json!({
        "gas": trace.gas,
        "failed": trace.failed,
        "returnValue": trace.return_value.strip_prefix("0x").unwrap_or(&trace.return_value),
        "structLogs": struct_logs,
    }))
}

fn json_strings(values: &Option<Vec<String>>) -> serde_json::Value {
    match values {
        Some(v) => serde_json::Value::Array(v.iter().cloned().map(serde_json::Value::String).collect()),
        None => serde_json::Value::Null,
    }
}

fn json_map(values: &Option<std::collections::BTreeMap<String, String>>) -> serde_json::Value {
    match values {
        Some(map) => serde_json::Value::Object(
            map.iter().map(|(k, v)| (k.clone(), serde_json::Value::String(v.clone()))).collect(),
        ),
        None => serde_json::Value::Null,
    }
}
