//! Call tracer (§4.7): a flattened view of a transaction's execution tree.

use crate::eth::support::mirror_error_to_gateway;
use crate::eth::EthContext;
use crate::util::{decode_hex_lenient, ensure_0x_prefix};
use gateway_errors::GatewayError;
use gateway_mirror::ContractAction;
use gateway_primitives::hexutil;

const SUCCESS: &str = "SUCCESS";

/// `callTracer`.
pub async fn call_tracer(
    ctx: &EthContext,
    tx_hash_or_id: &str,
    only_top_call: bool,
) -> Result<serde_json::Value, GatewayError> {
    let (actions, root) = futures::future::join(
        ctx.mirror.contract_results_actions(tx_hash_or_id, None),
        ctx.mirror.contract_result(tx_hash_or_id, None),
    )
    .await;
    let actions = actions.map_err(mirror_error_to_gateway)?;
    let root = root.map_err(mirror_error_to_gateway)?.ok_or(GatewayError::ResourceNotFound)?;
    let Some(top) = actions.first() else {
        return Err(GatewayError::ResourceNotFound);
    };

    let mut result = serde_json::json!({
        "type": top.call_type,
        "from": top.caller,
        "to": top.recipient,
        "value": hexutil::quantity(top.value),
        "gas": hexutil::quantity(top.gas),
        "gasUsed": hexutil::quantity(top.gas_used),
        "input": ensure_0x_prefix(&root.function_parameters),
        "output": ensure_0x_prefix(&root.call_result),
    });

    if root.result != SUCCESS {
        let raw = decode_hex_lenient(&root.call_result);
        let obj = result.as_object_mut().expect("object literal");
        obj.insert("error".to_string(), serde_json::Value::String(root.result.clone()));
        obj.insert(
            "revertReason".to_string(),
            gateway_errors::decode_revert(&raw)
                .map(serde_json::Value::String)
                .unwrap_or(serde_json::Value::Null),
        );
        obj.insert("output".to_string(), serde_json::Value::String(ensure_0x_prefix(&root.call_result)));
    }

    if only_top_call || actions.len() == 1 {
        return Ok(result);
    }

    let mut calls = Vec::with_capacity(actions.len() - 1);
    for action in actions.iter().skip(1) {
        calls.push(render_call(ctx, action).await?);
    }

    result
        .as_object_mut()
        .expect("object literal")
        .insert("calls".to_string(), serde_json::Value::Array(calls));
    Ok(result)
}

async fn render_call(
    ctx: &EthContext,
    action: &ContractAction,
) -> Result<serde_json::Value, GatewayError> {
    let output = if action.call_type == "CREATE" {
        created_contract_bytecode(ctx, action).await?
    } else {
        action.output.clone().map(|o| ensure_0x_prefix(&o)).unwrap_or_else(|| "0x".to_string())
    };

    Ok(serde_json::json!({
        "type": action.call_type,
        "from": action.caller,
        "to": action.recipient,
        "value": hexutil::quantity(action.value),
        "gas": hexutil::quantity(action.gas),
        "gasUsed": hexutil::quantity(action.gas_used),
        "input": ensure_0x_prefix(&action.input),
        "output": output,
    }))
}

async fn created_contract_bytecode(
    ctx: &EthContext,
    action: &ContractAction,
) -> Result<String, GatewayError> {
    let state = ctx
        .mirror
        .contract_state(&action.recipient, None)
        .await
        .map_err(mirror_error_to_gateway)?;
    Ok(state
        .and_then(|s| s.runtime_bytecode)
        .map(|b| ensure_0x_prefix(&b))
        .unwrap_or_else(|| "0x".to_string()))
}
