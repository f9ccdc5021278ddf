//! Address resolution (§4.6.9).

use super::support::mirror_error_to_gateway;
use gateway_errors::GatewayError;
use gateway_mirror::MirrorClient;

/// Resolves `address` to the upstream canonical EVM address via
/// `resolveEntityType`, preferring the resolved entity's `evm_address`
/// field when present and falling back to the input unchanged.
pub async fn resolve_address(mirror: &MirrorClient, address: &str) -> Result<String, GatewayError> {
    let resolved =
        mirror.resolve_entity_type(address, None).await.map_err(mirror_error_to_gateway)?;
    Ok(resolved.evm_address.unwrap_or_else(|| address.to_string()))
}

/// Resolves `from` and `to` in parallel (§4.6.9 "Address pairs are
/// resolved in parallel").
pub async fn resolve_address_pair(
    mirror: &MirrorClient,
    from: &str,
    to: Option<&str>,
) -> Result<(String, Option<String>), GatewayError> {
    match to {
        Some(to) => {
            let (from, to) =
                futures::future::join(resolve_address(mirror, from), resolve_address(mirror, to))
                    .await;
            Ok((from?, Some(to?)))
        }
        None => Ok((resolve_address(mirror, from).await?, None)),
    }
}
