//! Raw transaction submission (§4.6.10).
//!
//! `Parsed -> Prechecked -> Submitting -> Submitted -> Reconciling -> Done`.
//! Every precheck fails fast with a specific typed error; submission and
//! reconciliation are best-effort beyond that point, since the transaction
//! may have reached consensus even when the gateway can't prove it did.

use super::support::mirror_error_to_gateway;
use super::EthContext;
use crate::util::{decode_hex_lenient, ensure_0x_prefix};
use alloy_consensus::{Transaction, TxEnvelope, TxType};
use alloy_eips::eip2718::Decodable2718;
use alloy_primitives::keccak256;
use gateway_consensus::ConsensusError;
use gateway_errors::GatewayError;
use gateway_primitives::{hexutil, units};

const ZERO_BYTE_GAS_COST: u64 = 4;
const NONZERO_BYTE_GAS_COST: u64 = 16;
const INTRINSIC_GAS_BASE: u64 = 21_000;

fn intrinsic_gas(data: &[u8]) -> u64 {
    let zeros = data.iter().filter(|b| **b == 0).count() as u64;
    let nonzeros = data.len() as u64 - zeros;
    INTRINSIC_GAS_BASE + zeros * ZERO_BYTE_GAS_COST + nonzeros * NONZERO_BYTE_GAS_COST
}

struct Parsed {
    envelope: TxEnvelope,
    from: String,
    raw: Vec<u8>,
    hash: String,
}

fn parse(raw_hex: &str) -> Result<Parsed, GatewayError> {
    let raw = decode_hex_lenient(raw_hex);
    let mut slice = raw.as_slice();
    let envelope = TxEnvelope::decode_2718(&mut slice)
        .map_err(|e| GatewayError::InvalidParams(format!("invalid raw transaction: {e}")))?;
    let from = envelope
        .recover_signer()
        .map(|addr| format!("0x{:x}", addr))
        .map_err(|_| GatewayError::InvalidParams("unable to recover sender".to_string()))?;
    let hash = hexutil::fixed_bytes(keccak256(&raw).as_slice());
    Ok(Parsed { envelope, from, raw, hash })
}

async fn precheck(ctx: &EthContext, parsed: &Parsed) -> Result<(), GatewayError> {
    let data = parsed.envelope.input();
    let gas_limit = parsed.envelope.gas_limit();
    let tx_type = parsed.envelope.tx_type();
    let nonce = parsed.envelope.nonce();
    let chain_id = parsed.envelope.chain_id();
    let value = parsed.envelope.value();
    let coef = ctx.config.tinybar_to_weibar_coef;

    if data.len() > ctx.config.max_call_data_size {
        return Err(GatewayError::CallDataSizeExceeded);
    }
    if parsed.raw.len() > ctx.config.max_transaction_size {
        return Err(GatewayError::TransactionSizeExceeded);
    }
    if tx_type == TxType::Eip4844 {
        return Err(GatewayError::UnsupportedTransactionType);
    }

    let floor = intrinsic_gas(data);
    if gas_limit < floor {
        return Err(GatewayError::GasLimitTooLow);
    }
    if gas_limit > ctx.config.max_transaction_fee_threshold {
        return Err(GatewayError::GasLimitTooHigh);
    }

    let account = ctx
        .mirror
        .account(&parsed.from, None)
        .await
        .map_err(mirror_error_to_gateway)?
        .ok_or(GatewayError::ResourceNotFound)?;

    let current_nonce = account.ethereum_nonce.unwrap_or(0);
    if current_nonce > nonce {
        return Err(GatewayError::NonceTooLow {
            provided: hexutil::quantity(nonce),
            expected: hexutil::quantity(current_nonce),
        });
    }

    // A pre-EIP-155 legacy transaction carries no chain id at all; the
    // spec's `v ∈ {27, 28}` check is subsumed by that, since EIP-155
    // replay protection is what introduces a chain-id-derived `v`.
    let legacy_unprotected = tx_type == TxType::Legacy && chain_id.is_none();
    if !legacy_unprotected && chain_id != Some(ctx.config.chain_id) {
        return Err(GatewayError::UnsupportedChainId);
    }

    let tinybar_value = units::weibar_to_tinybar(value, coef);
    let weibar_remainder = value % alloy_primitives::U256::from(coef);
    if tinybar_value == 0 && !weibar_remainder.is_zero() {
        return Err(GatewayError::ValueTooLow);
    }

    let gas_price = effective_gas_price(&parsed.envelope);
    let network_gas_price_tinybar = current_network_gas_price_tinybar(ctx).await?;
    let tolerance = ctx.config.gas_price_tolerance_tinybar;
    let is_whitelisted = ctx.config.deterministic_deploy_txs.iter().any(|tx| tx == &parsed.raw);
    if !is_whitelisted && gas_price + tolerance < network_gas_price_tinybar {
        return Err(GatewayError::GasPriceTooLow {
            provided: hexutil::quantity(gas_price),
            required: hexutil::quantity(network_gas_price_tinybar),
        });
    }

    let required_tinybar =
        tinybar_value.saturating_add(gas_price.saturating_mul(gas_limit));
    let balance_tinybar = account.balance.map(|b| b.balance).unwrap_or(0);
    if balance_tinybar < required_tinybar {
        return Err(GatewayError::InsufficientBalance);
    }

    if let alloy_primitives::TxKind::Call(to) = parsed.envelope.to() {
        let to_str = format!("0x{:x}", to);
        if let Some(recipient) = ctx.mirror.account(&to_str, None).await.map_err(mirror_error_to_gateway)? {
            if recipient.receiver_sig_required {
                return Err(GatewayError::InvalidContractAddress);
            }
        }
    }

    Ok(())
}

fn effective_gas_price(envelope: &TxEnvelope) -> u64 {
    envelope.gas_price().map(|p| p as u64).unwrap_or_else(|| envelope.max_fee_per_gas() as u64)
}

async fn current_network_gas_price_tinybar(ctx: &EthContext) -> Result<u64, GatewayError> {
    let fees = ctx.mirror.network_fees(None).await.map_err(mirror_error_to_gateway)?;
    let fees = fees.ok_or(GatewayError::ResourceNotFound)?;
    fees.fees
        .iter()
        .find(|f| f.transaction_type == "EthereumTransaction")
        .map(|f| f.gas)
        .ok_or(GatewayError::ResourceNotFound)
}

/// The outcome of step 3 (submit), preserving the at-most-one semantics:
/// a dropped connection or timeout after submit still carries a
/// `transactionId` when the upstream issued one.
enum SubmitResult {
    Success { transaction_id: String },
    PartialFailure { transaction_id: Option<String>, error: GatewayError },
}

async fn submit(ctx: &EthContext, raw: &[u8]) -> SubmitResult {
    match ctx.consensus.submit_transaction(raw).await {
        Ok(outcome) => SubmitResult::Success { transaction_id: outcome.transaction_id },
        Err(ConsensusError::Rejected { status }) => SubmitResult::PartialFailure {
            transaction_id: None,
            error: wrap_rejection(&status),
        },
        Err(ConsensusError::DroppedAfterSubmit { transaction_id }) => SubmitResult::PartialFailure {
            transaction_id,
            error: GatewayError::Internal("connection dropped after submit".to_string()),
        },
        Err(ConsensusError::TimeoutAfterSubmit { transaction_id }) => SubmitResult::PartialFailure {
            transaction_id,
            error: GatewayError::RequestTimeout,
        },
        Err(ConsensusError::Other(msg)) => SubmitResult::PartialFailure {
            transaction_id: None,
            error: GatewayError::Internal(msg),
        },
    }
}

fn wrap_rejection(status: &str) -> GatewayError {
    GatewayError::Internal(format!("consensus network rejected the transaction: {status}"))
}

/// Polls the mirror for the reconciled contract result, up to
/// `config.reconciliation_poll_attempts` times.
async fn reconcile(ctx: &EthContext, transaction_id: &str) -> Option<gateway_mirror::ContractResult> {
    for _ in 0..ctx.config.reconciliation_poll_attempts {
        if let Ok(Some(result)) = ctx.mirror.contract_result(transaction_id, None).await {
            return Some(result);
        }
        tokio::time::sleep(ctx.config.reconciliation_poll_interval).await;
    }
    None
}

/// Polls the mirror's account endpoint for `address`'s updated nonce,
/// distinguishing too-low from too-high (§4.6.10 step 5).
async fn reconcile_nonce_error(
    ctx: &EthContext,
    address: &str,
    provided_nonce: u64,
) -> GatewayError {
    for _ in 0..ctx.config.reconciliation_poll_attempts {
        if let Ok(Some(account)) = ctx.mirror.account(address, None).await {
            if let Some(current) = account.ethereum_nonce {
                return if provided_nonce < current {
                    GatewayError::NonceTooLow {
                        provided: hexutil::quantity(provided_nonce),
                        expected: hexutil::quantity(current),
                    }
                } else {
                    GatewayError::NonceTooHigh {
                        provided: hexutil::quantity(provided_nonce),
                        expected: hexutil::quantity(current),
                    }
                };
            }
        }
        tokio::time::sleep(ctx.config.reconciliation_poll_interval).await;
    }
    GatewayError::Internal("unable to reconcile nonce after WRONG_NONCE".to_string())
}

async fn finish(ctx: &EthContext, parsed: &Parsed, result: SubmitResult) -> Result<String, GatewayError> {
    match result {
        SubmitResult::Success { transaction_id } => {
            match reconcile(ctx, &transaction_id).await {
                Some(record) if record.result == "WRONG_NONCE" => {
                    Err(reconcile_nonce_error(ctx, &parsed.from, parsed.envelope.nonce()).await)
                }
                Some(record) => Ok(ensure_0x_prefix(&record.hash)),
                None => Err(GatewayError::Internal(
                    "transaction submitted but could not be reconciled".to_string(),
                )),
            }
        }
        SubmitResult::PartialFailure { transaction_id: Some(transaction_id), error } => {
            match reconcile(ctx, &transaction_id).await {
                Some(record) => Ok(ensure_0x_prefix(&record.hash)),
                None => {
                    tracing::warn!(
                        hash = parsed.hash.as_str(),
                        "reconciliation failed after partial submit failure, returning best-effort hash"
                    );
                    let _ = error;
                    Ok(parsed.hash.clone())
                }
            }
        }
        SubmitResult::PartialFailure { transaction_id: None, error } => Err(error),
    }
}

async fn upload_creation_bytecode_if_needed(ctx: &EthContext, envelope: &TxEnvelope) {
    if !matches!(envelope.to(), alloy_primitives::TxKind::Create) {
        return;
    }
    let _ = gateway_consensus::upload_oversized_bytecode(
        ctx.files.as_ref(),
        envelope.input(),
        ctx.config.max_call_data_size,
    )
    .await;
}

/// `eth_sendRawTransaction`.
pub async fn send_raw_transaction(ctx: &EthContext, raw_hex: &str) -> Result<String, GatewayError> {
    let parsed = parse(raw_hex)?;
    precheck(ctx, &parsed).await?;

    if ctx.config.use_async_tx_processing {
        let hash = parsed.hash.clone();
        let ctx = ctx.clone();
        tokio::spawn(async move {
            upload_creation_bytecode_if_needed(&ctx, &parsed.envelope).await;
            let result = submit(&ctx, &parsed.raw).await;
            let _ = finish(&ctx, &parsed, result).await;
        });
        return Ok(hash);
    }

    upload_creation_bytecode_if_needed(ctx, &parsed.envelope).await;
    let result = submit(ctx, &parsed.raw).await;
    finish(ctx, &parsed, result).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn intrinsic_gas_accounts_for_zero_and_nonzero_bytes() {
        assert_eq!(intrinsic_gas(&[]), INTRINSIC_GAS_BASE);
        assert_eq!(intrinsic_gas(&[0, 0, 1]), INTRINSIC_GAS_BASE + 2 * 4 + 16);
    }
}
