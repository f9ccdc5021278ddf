//! C7: debug tracing (§4.7), gated by `DEBUG_API_ENABLED`.

mod call_tracer;
mod opcode_logger;
mod prestate_tracer;
mod trace_block;

pub use call_tracer::call_tracer;
pub use opcode_logger::opcode_logger;
pub use prestate_tracer::prestate_tracer;
pub use trace_block::trace_block_by_number;

use crate::eth::EthContext;
use crate::params::{TracerConfigWrapper, TracerKind};
use gateway_errors::GatewayError;

/// `debug_traceTransaction`. `wrapper` must already have been validated
/// with `TracerKind::OpcodeLogger` as its default (§4.7); `opcodeLogger` is
/// additionally gated by `OPCODELOGGER_ENABLED`, and `prestateTracer` is
/// rejected at this (single-transaction) scope.
pub async fn trace_transaction(
    ctx: &EthContext,
    tx_hash_or_id: &str,
    wrapper: &TracerConfigWrapper,
) -> Result<serde_json::Value, GatewayError> {
    if !ctx.config.debug_api_enabled {
        return Err(GatewayError::MethodNotFound("debug_traceTransaction".to_string()));
    }

    match wrapper.tracer {
        TracerKind::CallTracer => call_tracer(ctx, tx_hash_or_id, wrapper.only_top_call).await,
        TracerKind::OpcodeLogger => {
            if !ctx.config.opcodelogger_enabled {
                return Err(GatewayError::MethodNotFound("opcodeLogger".to_string()));
            }
            opcode_logger(ctx, tx_hash_or_id, wrapper).await
        }
        TracerKind::PrestateTracer => Err(GatewayError::InvalidParams(
            "prestateTracer is only supported at block scope".to_string(),
        )),
    }
}
