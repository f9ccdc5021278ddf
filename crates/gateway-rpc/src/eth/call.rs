//! `eth_call` / `eth_estimateGas` (§4.6.6).

use super::support::{mirror_error_to_gateway, resolve_block};
use super::EthContext;
use crate::params::{BlockParam, TransactionCallObject};
use crate::util::{decode_hex_lenient, ensure_0x_prefix};
use gateway_errors::GatewayError;
use gateway_mirror::ContractCallOutcome;
use gateway_primitives::{hexutil, units};

/// Upstream result codes that simulate-as-empty rather than error, per the
/// gateway's own semantics for a call that can't logically execute
/// (§4.6.6 "error ordering").
const EMPTY_RESULT_CODES: &[&str] = &["INVALID_TRANSACTION", "FAIL_INVALID"];

fn normalize_request(
    ctx: &EthContext,
    tx: &TransactionCallObject,
) -> Result<(Option<String>, Option<String>, Vec<u8>, u64, u64), GatewayError> {
    let to = tx.to.clone();
    let data = tx.data.as_deref().map(decode_hex_lenient).unwrap_or_default();

    let value_weibar = tx
        .value
        .as_deref()
        .map(|v| {
            let digits = v.strip_prefix("0x").unwrap_or(v);
            alloy_primitives::U256::from_str_radix(digits, 16)
                .map_err(|_| GatewayError::InvalidParams("invalid call value".to_string()))
        })
        .transpose()?
        .unwrap_or_default();
    let value_tinybar = units::weibar_to_tinybar(value_weibar, ctx.config.tinybar_to_weibar_coef);

    // A value-bearing call needs a concrete sender even when the caller
    // didn't supply one; the zero address stands in (§4.6.6 "from
    // population").
    let from = match (&tx.from, value_tinybar) {
        (Some(from), _) => Some(from.clone()),
        (None, 0) => None,
        (None, _) => Some(hexutil::zero_address()),
    };

    let gas = tx
        .gas
        .as_deref()
        .map(|g| {
            let digits = g.strip_prefix("0x").unwrap_or(g);
            u64::from_str_radix(digits, 16)
                .map_err(|_| GatewayError::InvalidParams("invalid gas".to_string()))
        })
        .transpose()?
        .unwrap_or(ctx.config.max_gas_per_second)
        .min(ctx.config.max_gas_per_second);

    Ok((from, to, data, value_tinybar, gas))
}

/// `eth_call`.
pub async fn call(
    ctx: &EthContext,
    tx: &TransactionCallObject,
    block: &BlockParam,
) -> Result<String, GatewayError> {
    let (from, to, data, value, gas) = normalize_request(ctx, tx)?;

    if !matches!(block, BlockParam::Tag(crate::params::BlockTag::Latest | crate::params::BlockTag::Pending))
        && resolve_block(&ctx.mirror, block, None).await?.is_none()
    {
        return Err(GatewayError::UnknownBlock);
    }

    if ctx.config.call_via_consensus {
        return call_via_consensus(ctx, from, to, data, value, gas, false).await;
    }
    call_via_mirror(ctx, &from, &to, &data, value, gas, false).await
}

async fn call_via_consensus(
    ctx: &EthContext,
    from: Option<String>,
    to: Option<String>,
    data: Vec<u8>,
    value: u64,
    gas: u64,
    estimate: bool,
) -> Result<String, GatewayError> {
    let request = gateway_consensus::ConsensusCallRequest { to, from, data, value, gas };
    let outcome = ctx.consensus.call(&request).await.map_err(|e| {
        GatewayError::Internal(format!("consensus call failed: {e}"))
    })?;
    match outcome {
        gateway_consensus::ConsensusCallOutcome::Success(bytes) => {
            if estimate {
                Ok(hexutil::quantity(gas))
            } else {
                Ok(hexutil::blob(&bytes))
            }
        }
        gateway_consensus::ConsensusCallOutcome::Reverted { raw_data } => {
            Err(contract_revert_error(&raw_data))
        }
    }
}

async fn call_via_mirror(
    ctx: &EthContext,
    from: &Option<String>,
    to: &Option<String>,
    data: &[u8],
    value: u64,
    gas: u64,
    estimate: bool,
) -> Result<String, GatewayError> {
    let body = serde_json::json!({
        "from": from,
        "to": to,
        "data": hexutil::blob(data),
        "value": value,
        "gas": gas,
        "estimate": estimate,
    });

    let outcome = ctx
        .mirror
        .contract_call(&body, None)
        .await
        .map_err(mirror_error_to_gateway)?;

    match outcome {
        ContractCallOutcome::Success(result) => {
            if estimate {
                Ok(normalize_estimate_result(&result, gas))
            } else {
                Ok(ensure_0x_prefix(&result))
            }
        }
        ContractCallOutcome::Failed { status, message } => {
            classify_call_failure(status, message, estimate, gas, ctx)
        }
    }
}

fn normalize_estimate_result(result: &str, fallback_gas: u64) -> String {
    let bytes = decode_hex_lenient(result);
    if bytes.is_empty() {
        return hexutil::quantity(fallback_gas);
    }
    hexutil::blob(&bytes)
}

fn classify_call_failure(
    status: u16,
    message: Option<gateway_mirror::ContractCallErrorMessage>,
    estimate: bool,
    gas: u64,
    ctx: &EthContext,
) -> Result<String, GatewayError> {
    let code = message.as_ref().map(|m| m.message.as_str()).unwrap_or("");

    if EMPTY_RESULT_CODES.contains(&code) {
        return Ok(if estimate { hexutil::quantity(gas) } else { "0x".to_string() });
    }

    if code.contains("REVERT") {
        if estimate && !ctx.config.estimate_gas_throws {
            return Ok(hexutil::quantity(gas));
        }
        let raw_data = message.and_then(|m| m.data).unwrap_or_default();
        return Err(contract_revert_error(&decode_hex_lenient(&raw_data)));
    }

    if status == 429 || (500..600).contains(&status) {
        return Err(GatewayError::MirrorUpstreamFailure { status });
    }

    Err(GatewayError::Internal(format!("call failed with status {status}: {code}")))
}

fn contract_revert_error(raw_data: &[u8]) -> GatewayError {
    GatewayError::ContractReverted {
        reason: gateway_errors::decode_revert(raw_data),
        raw_data: hexutil::blob(raw_data),
    }
}

/// `eth_estimateGas`.
pub async fn estimate_gas(
    ctx: &EthContext,
    tx: &TransactionCallObject,
    block: &BlockParam,
) -> Result<String, GatewayError> {
    let (from, to, data, value, gas) = normalize_request(ctx, tx)?;

    if !matches!(block, BlockParam::Tag(crate::params::BlockTag::Latest | crate::params::BlockTag::Pending))
        && resolve_block(&ctx.mirror, block, None).await?.is_none()
    {
        return Err(GatewayError::UnknownBlock);
    }

    if ctx.config.call_via_consensus {
        return call_via_consensus(ctx, from, to, data, value, gas, true).await;
    }

    match call_via_mirror(ctx, &from, &to, &data, value, gas, true).await {
        Ok(result) => Ok(result),
        Err(err) if ctx.config.estimate_gas_throws => Err(err),
        Err(GatewayError::ContractReverted { .. }) => Ok(fallback_gas_table(&to, &data)),
        Err(err) => Err(err),
    }
}

/// A predefined gas table keyed on call shape, used when the upstream
/// estimate fails and `estimate_gas_throws` isn't set.
fn fallback_gas_table(to: &Option<String>, data: &[u8]) -> String {
    let gas = match (to, data.is_empty()) {
        (None, _) => 500_000,
        (Some(_), true) => 21_000,
        (Some(_), false) => 80_000,
    };
    hexutil::quantity(gas)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fallback_table_distinguishes_creation_transfer_and_call() {
        assert_eq!(fallback_gas_table(&None, &[1, 2]), hexutil::quantity(500_000));
        assert_eq!(fallback_gas_table(&Some("0xabc".to_string()), &[]), hexutil::quantity(21_000));
        assert_eq!(fallback_gas_table(&Some("0xabc".to_string()), &[1]), hexutil::quantity(80_000));
    }

    #[test]
    fn empty_result_codes_cover_invalid_transaction() {
        assert!(EMPTY_RESULT_CODES.contains(&"INVALID_TRANSACTION"));
        assert!(EMPTY_RESULT_CODES.contains(&"FAIL_INVALID"));
    }
}
