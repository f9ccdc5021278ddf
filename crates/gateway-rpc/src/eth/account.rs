//! Account state: balance, nonce, code, and storage (§4.6.5).

use super::support::{mirror_error_to_gateway, parse_seconds, resolve_block};
use super::EthContext;
use crate::params::{BlockParam, BlockTag};
use crate::util::{decode_hex_lenient, ensure_0x_prefix, tinybar_to_weibar_hex};
use gateway_errors::GatewayError;
use gateway_mirror::EntityKind;
use gateway_primitives::hexutil;

/// The native token's precompile address. Its "code" is a single `INVALID`
/// opcode rather than empty bytes, matching how the host itself reports it.
const NATIVE_TOKEN_PRECOMPILE_ADDRESS: &str = "0x0000000000000000000000000000000000000167";

/// Template for the redirect bytecode the gateway synthesizes for tokens:
/// `CALLDATACOPY`/`CALL`-forwards every invocation to the HTS precompile,
/// with the token's own address spliced into the push operand.
const TOKEN_REDIRECT_BYTECODE_TEMPLATE: &str =
    "0x6080604052348015600f57600080fd5b506000610167905073";
const TOKEN_REDIRECT_BYTECODE_SUFFIX: &str =
    "600052366000602037600080366000846127105a03f43d806000803e8160008114605857816000f35b816000fd";

/// `eth_getBalance` (§4.6.5).
pub async fn get_balance(
    ctx: &EthContext,
    address: &str,
    block: &BlockParam,
) -> Result<String, GatewayError> {
    let coef = ctx.config.tinybar_to_weibar_coef;

    if matches!(block, BlockParam::Tag(BlockTag::Latest | BlockTag::Pending)) {
        let tinybar = live_balance(ctx, address).await?;
        return Ok(tinybar_to_weibar_hex(tinybar, coef));
    }

    let Some(mirror_block) = resolve_block(&ctx.mirror, block, None).await? else {
        return Err(GatewayError::UnknownBlock);
    };

    let Some(head) = resolve_block(&ctx.mirror, &BlockParam::Tag(BlockTag::Latest), None).await?
    else {
        return Err(GatewayError::UnknownBlock);
    };

    let block_age = parse_seconds(&head.timestamp.from)
        .saturating_sub(parse_seconds(&mirror_block.timestamp.to));

    if block_age <= ctx.config.balance_refresh_window.as_secs() {
        let mut tinybar = live_balance(ctx, address).await? as i128;
        let mut cursor = mirror_block.timestamp.to.clone();
        loop {
            let page = ctx
                .mirror
                .transfers_after(address, &cursor, None)
                .await
                .map_err(mirror_error_to_gateway)?;
            if page.is_empty() {
                break;
            }
            for transfer in &page {
                tinybar -= transfer.amount as i128;
            }
            if page.len() < 1000 {
                break;
            }
            cursor = page.last().map(|t| t.timestamp.clone()).unwrap_or(cursor);
        }
        let tinybar = tinybar.max(0) as u64;
        return Ok(tinybar_to_weibar_hex(tinybar, coef));
    }

    let account = ctx
        .mirror
        .balance_at_timestamp(address, &mirror_block.timestamp.to, None)
        .await
        .map_err(mirror_error_to_gateway)?;
    let tinybar = account.and_then(|a| a.balance).map(|b| b.balance).unwrap_or(0);
    Ok(tinybar_to_weibar_hex(tinybar, coef))
}

async fn live_balance(ctx: &EthContext, address: &str) -> Result<u64, GatewayError> {
    let account = ctx.mirror.account(address, None).await.map_err(mirror_error_to_gateway)?;
    Ok(account.and_then(|a| a.balance).map(|b| b.balance).unwrap_or(0))
}

/// `eth_getTransactionCount` (§4.6.5).
pub async fn get_transaction_count(
    ctx: &EthContext,
    address: &str,
    block: &BlockParam,
) -> Result<String, GatewayError> {
    if matches!(block, BlockParam::Tag(BlockTag::Latest | BlockTag::Pending)) {
        return latest_nonce(ctx, address).await;
    }

    if let BlockParam::Number(0) | BlockParam::Number(1) = block {
        return Ok(hexutil::quantity(0));
    }

    if matches!(block, BlockParam::Tag(BlockTag::Earliest)) {
        let Some(earliest) = ctx.mirror.earliest_block(None).await.map_err(mirror_error_to_gateway)?
        else {
            return Ok(hexutil::quantity(0));
        };
        if earliest.number > 1 {
            return Err(GatewayError::Internal(
                "earliest block is above the genesis boundary".to_string(),
            ));
        }
        return Ok(hexutil::quantity(0));
    }

    let Some(mirror_block) = resolve_block(&ctx.mirror, block, None).await? else {
        return Err(GatewayError::UnknownBlock);
    };
    let Some(head) = resolve_block(&ctx.mirror, &BlockParam::Tag(BlockTag::Latest), None).await?
    else {
        return Err(GatewayError::UnknownBlock);
    };

    if head.number.saturating_sub(mirror_block.number) <= ctx.config.max_logs_block_range {
        return latest_nonce(ctx, address).await;
    }

    historical_nonce(ctx, address, &mirror_block.timestamp.to).await
}

async fn latest_nonce(ctx: &EthContext, address: &str) -> Result<String, GatewayError> {
    let account = ctx.mirror.account(address, None).await.map_err(mirror_error_to_gateway)?;
    match account.and_then(|a| a.ethereum_nonce) {
        Some(nonce) => Ok(hexutil::quantity(nonce)),
        None => Ok("0x1".to_string()),
    }
}

async fn historical_nonce(
    ctx: &EthContext,
    address: &str,
    at_or_before_timestamp: &str,
) -> Result<String, GatewayError> {
    let results = ctx
        .mirror
        .contract_results_by_sender(address, at_or_before_timestamp, 2, None)
        .await
        .map_err(mirror_error_to_gateway)?;

    if results.len() <= 1 {
        return Ok(hexutil::quantity(1));
    }

    let Some(most_recent) = results.first() else {
        return Ok(hexutil::quantity(1));
    };

    if !most_recent.from.eq_ignore_ascii_case(address) {
        tracing::warn!(
            address,
            result_from = most_recent.from.as_str(),
            "historical nonce sender mismatch, falling back to latest nonce"
        );
        return latest_nonce(ctx, address).await;
    }

    Ok(hexutil::quantity(most_recent.nonce + 1))
}

/// `eth_getCode` (§4.6.5).
pub async fn get_code(
    ctx: &EthContext,
    address: &str,
    block: &BlockParam,
) -> Result<String, GatewayError> {
    if address.eq_ignore_ascii_case(NATIVE_TOKEN_PRECOMPILE_ADDRESS) {
        return Ok("0xfe".to_string());
    }

    let resolved =
        ctx.mirror.resolve_entity_type(address, None).await.map_err(mirror_error_to_gateway)?;

    match resolved.kind {
        EntityKind::Token => Ok(token_redirect_bytecode(address)),
        EntityKind::Account => Ok("0x".to_string()),
        EntityKind::Contract => {
            let Some(state) =
                ctx.mirror.contract_state(address, None).await.map_err(mirror_error_to_gateway)?
            else {
                return Ok("0x".to_string());
            };

            if let (Some(created_at), BlockParam::Number(_) | BlockParam::Hash(_)) =
                (&state.created_timestamp, block)
            {
                if let Some(mirror_block) = resolve_block(&ctx.mirror, block, None).await? {
                    if parse_seconds(created_at) > parse_seconds(&mirror_block.timestamp.to) {
                        return Ok("0x".to_string());
                    }
                }
            }

            Ok(state.runtime_bytecode.map(|b| ensure_0x_prefix(&b)).unwrap_or_else(|| "0x".to_string()))
        }
    }
}

fn token_redirect_bytecode(address: &str) -> String {
    let digits = decode_hex_lenient(address);
    let digits_hex = hex_encode(&digits);
    format!(
        "{}{}{}",
        TOKEN_REDIRECT_BYTECODE_TEMPLATE, digits_hex, TOKEN_REDIRECT_BYTECODE_SUFFIX
    )
}

fn hex_encode(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}

/// `eth_getStorageAt` (§4.6.5).
pub async fn get_storage_at(
    ctx: &EthContext,
    address: &str,
    slot: &str,
    block: &BlockParam,
) -> Result<String, GatewayError> {
    let timestamp = if matches!(block, BlockParam::Tag(BlockTag::Latest | BlockTag::Pending)) {
        None
    } else {
        let Some(mirror_block) = resolve_block(&ctx.mirror, block, None).await? else {
            return Err(GatewayError::UnknownBlock);
        };
        Some(mirror_block.timestamp.to)
    };

    let state = ctx
        .mirror
        .contract_state_by_address_and_slot(address, slot, timestamp.as_deref(), None)
        .await
        .map_err(mirror_error_to_gateway)?;

    Ok(state
        .and_then(|s| s.value)
        .map(|v| ensure_0x_prefix(&v))
        .unwrap_or_else(|| format!("0x{}", "0".repeat(64))))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_redirect_bytecode_embeds_address() {
        let bytecode = token_redirect_bytecode("0x0000000000000000000000000000000000000001");
        assert!(bytecode.starts_with(TOKEN_REDIRECT_BYTECODE_TEMPLATE));
        assert!(bytecode.contains("0000000000000000000000000000000000000001"));
        assert!(bytecode.ends_with(TOKEN_REDIRECT_BYTECODE_SUFFIX));
    }
}
