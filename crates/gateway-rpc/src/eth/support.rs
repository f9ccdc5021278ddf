//! Collaborators shared across the eth-service submodules: block-parameter
//! resolution and mirror-error translation.

use crate::params::{BlockParam, BlockTag};
use gateway_errors::GatewayError;
use gateway_mirror::{MirrorBlock, MirrorClient, MirrorError};

/// Maps a mirror transport/upstream failure to its HTTP-status-carrying
/// [`GatewayError`] (§7 "Propagation policy": preserved, not wrapped, with
/// the original status kept in `data`).
pub(crate) fn mirror_error_to_gateway(err: MirrorError) -> GatewayError {
    let status = match &err {
        MirrorError::Upstream { status } => *status,
        MirrorError::Deadline => 504,
        MirrorError::Transport(_) => 502,
        MirrorError::Decode(_) => 502,
    };
    GatewayError::MirrorUpstreamFailure { status }
}

/// Resolves a [`BlockParam`] to the mirror's block record, or `None` if the
/// block doesn't exist. `latest`/`pending`/`safe`/`finalized` all resolve to
/// the chain head; `earliest` to block 0.
pub(crate) async fn resolve_block(
    mirror: &MirrorClient,
    param: &BlockParam,
    request_id: Option<&str>,
) -> Result<Option<MirrorBlock>, GatewayError> {
    let result = match param {
        BlockParam::Tag(BlockTag::Latest | BlockTag::Pending | BlockTag::Safe | BlockTag::Finalized) => {
            mirror.latest_block(request_id).await
        }
        BlockParam::Tag(BlockTag::Earliest) => mirror.earliest_block(request_id).await,
        BlockParam::Number(n) => mirror.block_by_number(*n, request_id).await,
        BlockParam::Hash(h) => mirror.block_by_hash(h, request_id).await,
    };
    result.map_err(mirror_error_to_gateway)
}

/// Resolves a [`BlockParam`] directly to a block number, for call sites that
/// only need the number (e.g. historical-nonce branching).
pub(crate) async fn resolve_block_number(
    mirror: &MirrorClient,
    param: &BlockParam,
    request_id: Option<&str>,
) -> Result<Option<u64>, GatewayError> {
    if let BlockParam::Number(n) = param {
        return Ok(Some(*n));
    }
    Ok(resolve_block(mirror, param, request_id).await?.map(|b| b.number))
}

/// Parses the whole-seconds component of a mirror `"<seconds>.<nanos>"`
/// timestamp string. Missing or malformed input is treated as epoch zero.
pub(crate) fn parse_seconds(timestamp: &str) -> u64 {
    timestamp.split('.').next().and_then(|s| s.parse().ok()).unwrap_or(0)
}
