//! Constant and near-constant method handlers: no upstream state beyond a
//! single mirror read, named in §6's supported method set but not detailed
//! in §4.6.

use super::support::mirror_error_to_gateway;
use super::EthContext;
use crate::params::BlockTag;
use crate::util::decode_hex_lenient;
use alloy_primitives::keccak256;
use gateway_errors::GatewayError;
use gateway_primitives::hexutil;

/// `web3_clientVersion`: a static version string built from the crate
/// version at compile time.
pub fn client_version() -> String {
    format!("gateway/v{}", env!("CARGO_PKG_VERSION"))
}

/// `web3_sha3`: keccak256 of the single hex-encoded parameter.
pub fn sha3(data_hex: &str) -> String {
    let bytes = decode_hex_lenient(data_hex);
    hexutil::fixed_bytes(keccak256(&bytes).as_slice())
}

/// `net_listening`: always `true`.
pub fn net_listening() -> bool {
    true
}

/// `net_version`: the gateway's configured chain id, as a decimal string.
pub fn net_version(ctx: &EthContext) -> String {
    ctx.config.chain_id.to_string()
}

/// `eth_chainId`.
pub fn chain_id(ctx: &EthContext) -> String {
    hexutil::quantity(ctx.config.chain_id)
}

/// `eth_blockNumber`.
pub async fn block_number(ctx: &EthContext) -> Result<String, GatewayError> {
    let block = ctx.mirror.latest_block(None).await.map_err(mirror_error_to_gateway)?;
    let number = block.map(|b| b.number).unwrap_or(0);
    Ok(hexutil::quantity(number))
}

/// `eth_getBlockTransactionCountByHash` / `...ByNumber`.
pub async fn block_transaction_count(
    ctx: &EthContext,
    block: &crate::params::BlockParam,
) -> Result<Option<String>, GatewayError> {
    let Some(mirror_block) = super::support::resolve_block(&ctx.mirror, block, None).await? else {
        return Ok(None);
    };
    Ok(Some(hexutil::quantity(mirror_block.count)))
}

/// `eth_syncing`: always `false`.
pub fn syncing() -> bool {
    false
}

/// `eth_mining`: always `false`.
pub fn mining() -> bool {
    false
}

/// `eth_hashrate`: always `0x0`.
pub fn hashrate() -> String {
    hexutil::quantity(0)
}

/// `eth_accounts`: always empty.
pub fn accounts() -> Vec<String> {
    Vec::new()
}

/// `eth_getUncleCountByBlockHash` / `...ByBlockNumber`: the upstream has no
/// uncle-block concept.
pub fn uncle_count() -> String {
    hexutil::quantity(0)
}

/// `eth_getUncleByBlockHashAndIndex` / `...ByBlockNumberAndIndex`: always
/// absent.
pub fn uncle_by_index() -> Option<serde_json::Value> {
    None
}

/// Whether `tag` would resolve the same live head both times it's
/// consulted — used by `eth_getLogs`'s `fromBlock`/`toBlock` defaulting
/// heuristic.
pub fn is_latest_like(tag: BlockTag) -> bool {
    matches!(tag, BlockTag::Latest | BlockTag::Pending | BlockTag::Safe | BlockTag::Finalized)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_version_embeds_crate_version() {
        assert!(client_version().starts_with("gateway/v"));
    }

    #[test]
    fn sha3_hashes_empty_input_to_known_constant() {
        assert_eq!(
            sha3("0x"),
            "0xc5d2460186f7233c927e7db2dcc703c0e500b653ca82273b7bfad8045d85a470"
        );
    }
}
