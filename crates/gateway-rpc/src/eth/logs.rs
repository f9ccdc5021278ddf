//! Log retrieval (§4.6.4).

use super::support::{mirror_error_to_gateway, resolve_block};
use super::EthContext;
use crate::params::{BlockParam, BlockTag, GetLogsParams};
use crate::util::ensure_0x_prefix;
use gateway_errors::GatewayError;
use gateway_mirror::MirrorLog;
use gateway_primitives::hexutil;
use gateway_primitives::Log;

/// Converts a mirror log entry into the gateway's response shape.
pub(crate) fn mirror_log_to_log(log: &MirrorLog) -> Log {
    Log::new(
        ensure_0x_prefix(&log.address),
        ensure_0x_prefix(&log.block_hash),
        hexutil::quantity(log.block_number),
        ensure_0x_prefix(&log.data),
        hexutil::quantity(log.index),
        log.topics.iter().map(|t| ensure_0x_prefix(t)).collect(),
        ensure_0x_prefix(&log.transaction_hash),
        hexutil::quantity(log.transaction_index),
    )
}

fn parse_timestamp(ts: &str) -> f64 {
    ts.parse().unwrap_or(0.0)
}

/// `eth_getLogs` (§4.6.4, steps 1-5).
pub async fn get_logs(ctx: &EthContext, params: &GetLogsParams) -> Result<Vec<Log>, GatewayError> {
    let (from_ts, to_ts) = resolve_timestamp_range(ctx, params).await?;

    let span = to_ts - from_ts;
    if span > ctx.config.max_logs_timestamp_range.as_secs_f64() {
        return Err(GatewayError::InvalidParams(
            "block range exceeds the maximum allowed timestamp span".to_string(),
        ));
    }

    let mut query = format!("timestamp=gte:{from_ts}&timestamp=lte:{to_ts}&limit=1000");
    for address in &params.address {
        query.push_str(&format!("&contract.id={address}"));
    }
    for (position, topic_group) in params.topics.iter().enumerate() {
        if let Some(values) = topic_group {
            for value in values {
                query.push_str(&format!("&topic{position}={value}"));
            }
        }
    }

    let mut logs = ctx.mirror.logs_by_filter(&query, None).await.map_err(mirror_error_to_gateway)?;
    logs.sort_by(|a, b| parse_timestamp(&a.timestamp).total_cmp(&parse_timestamp(&b.timestamp)));

    Ok(logs.iter().map(mirror_log_to_log).collect())
}

async fn resolve_timestamp_range(
    ctx: &EthContext,
    params: &GetLogsParams,
) -> Result<(f64, f64), GatewayError> {
    if let Some(block_hash) = &params.block_hash {
        let block = resolve_block(&ctx.mirror, &BlockParam::Hash(block_hash.clone()), None)
            .await?
            .ok_or(GatewayError::UnknownBlock)?;
        return Ok((parse_timestamp(&block.timestamp.from), parse_timestamp(&block.timestamp.to)));
    }

    let to_provided = params.to_block.is_some();
    let from_provided = params.from_block.is_some();

    if !from_provided && to_provided && !is_latest_like(params.to_block.as_ref().unwrap()) {
        return Err(GatewayError::InvalidParams(
            "fromBlock is required when toBlock is explicit".to_string(),
        ));
    }

    let from_param = params.from_block.clone().unwrap_or(BlockParam::Tag(BlockTag::Latest));
    let to_param = params.to_block.clone().unwrap_or(BlockParam::Tag(BlockTag::Latest));

    let from_block =
        resolve_block(&ctx.mirror, &from_param, None).await?.ok_or(GatewayError::UnknownBlock)?;
    let to_block =
        resolve_block(&ctx.mirror, &to_param, None).await?.ok_or(GatewayError::UnknownBlock)?;

    if from_block.number > to_block.number {
        return Err(GatewayError::InvalidParams("fromBlock is after toBlock".to_string()));
    }

    if to_block.number - from_block.number > ctx.config.max_logs_block_range && params.address.len() != 1 {
        return Err(GatewayError::InvalidParams(
            "block range exceeds the maximum allowed span".to_string(),
        ));
    }

    Ok((parse_timestamp(&from_block.timestamp.from), parse_timestamp(&to_block.timestamp.to)))
}

fn is_latest_like(param: &BlockParam) -> bool {
    matches!(param, BlockParam::Tag(BlockTag::Latest | BlockTag::Pending))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mirror_log_converts_fields() {
        let log = MirrorLog {
            address: "aa".repeat(20),
            data: "".to_string(),
            index: 1,
            topics: vec!["bb".repeat(32)],
            transaction_hash: "cc".repeat(32),
            transaction_index: 0,
            block_hash: "dd".repeat(32),
            block_number: 5,
            timestamp: "1.0".to_string(),
        };
        let converted = mirror_log_to_log(&log);
        assert!(converted.address.starts_with("0x"));
        assert_eq!(converted.log_index, "0x1");
        assert!(!converted.removed);
    }
}
