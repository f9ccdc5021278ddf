//! `debug_traceBlockByNumber` (§4.7): runs the configured tracer over every
//! transaction in a block.

use super::{call_tracer, opcode_logger, prestate_tracer};
use crate::eth::support::{mirror_error_to_gateway, resolve_block};
use crate::eth::EthContext;
use crate::params::{BlockParam, TracerConfigWrapper, TracerKind};
use gateway_errors::GatewayError;

const WRONG_NONCE: &str = "WRONG_NONCE";

/// `traceBlockByNumber`.
pub async fn trace_block_by_number(
    ctx: &EthContext,
    block: &BlockParam,
    wrapper: &TracerConfigWrapper,
) -> Result<serde_json::Value, GatewayError> {
    if !ctx.config.debug_api_enabled {
        return Err(GatewayError::MethodNotFound("debug_traceBlockByNumber".to_string()));
    }

    let Some(mirror_block) = resolve_block(&ctx.mirror, block, None).await? else {
        return Err(GatewayError::UnknownBlock);
    };

    let mut results = ctx
        .mirror
        .contract_results_by_block(mirror_block.number, None)
        .await
        .map_err(mirror_error_to_gateway)?;
    results.retain(|r| r.result != WRONG_NONCE);
    results.sort_by_key(|r| r.transaction_index);

    let mut traced = Vec::with_capacity(results.len());
    for result in &results {
        let tracer_result = run_tracer(ctx, &result.hash, wrapper).await?;
        traced.push(serde_json::json!({ "txHash": result.hash, "result": tracer_result }));
    }

    Ok(serde_json::Value::Array(traced))
}

async fn run_tracer(
    ctx: &EthContext,
    tx_hash: &str,
    wrapper: &TracerConfigWrapper,
) -> Result<serde_json::Value, GatewayError> {
    match wrapper.tracer {
        TracerKind::CallTracer => call_tracer(ctx, tx_hash, wrapper.only_top_call).await,
        TracerKind::OpcodeLogger => {
            if !ctx.config.opcodelogger_enabled {
                return Err(GatewayError::MethodNotFound("opcodeLogger".to_string()));
            }
            opcode_logger(ctx, tx_hash, wrapper).await
        }
        TracerKind::PrestateTracer => prestate_tracer(ctx, tx_hash, wrapper.only_top_call).await,
    }
}
