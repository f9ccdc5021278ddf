#![doc = "Error taxonomy, request correlation, and revert decoding for the JSON-RPC gateway."]
#![warn(missing_debug_implementations, missing_docs, rustdoc::all)]
#![deny(unused_must_use, rust_2018_idioms)]

mod context;
mod revert;

pub use context::RequestContext;
pub use revert::decode_revert;

use serde_json::Value;
use thiserror::Error;

/// The closed set of error kinds this gateway can surface, per §4.1.
///
/// Every variant carries enough information to build a JSON-RPC `{code,
/// message, data}` triple; [`GatewayError::code`], [`GatewayError::message`],
/// and [`GatewayError::data`] do that without needing a `RequestContext` —
/// the request-id prefix is applied separately by [`with_request_id`], so
/// the same error value can be constructed, logged, and rendered
/// independently.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum GatewayError {
    // -- protocol --
    /// Malformed JSON-RPC envelope.
    #[error("Invalid request")]
    InvalidRequest,
    /// No handler registered for this method name.
    #[error("Unknown method: {0}")]
    MethodNotFound(String),
    /// A required parameter was missing or failed schema validation.
    #[error("{0}")]
    InvalidParams(String),
    /// The request body could not be parsed as JSON.
    #[error("Parse error")]
    ParseError,
    /// Batch requests are disabled by configuration.
    #[error("Batch requests are disabled")]
    BatchDisabled,
    /// The batch exceeded the configured maximum size.
    #[error("Batch request size exceeded")]
    BatchTooLarge,

    // -- resource --
    /// The requested entity does not exist.
    #[error("Resource not found")]
    ResourceNotFound,
    /// The requested block tag/number/hash could not be resolved.
    #[error("Unknown block")]
    UnknownBlock,
    /// The request asked for state beyond the chain head.
    #[error("Requested beyond the current head")]
    RequestBeyondHead,

    // -- validation --
    /// `tx.nonce` is below the account's current nonce.
    #[error("Nonce too low: provided {provided}, expected {expected}")]
    NonceTooLow {
        /// The nonce the caller provided.
        provided: String,
        /// The nonce the account actually has.
        expected: String,
    },
    /// `tx.nonce` is above the account's current nonce.
    #[error("Nonce too high: provided {provided}, expected {expected}")]
    NonceTooHigh {
        /// The nonce the caller provided.
        provided: String,
        /// The nonce the account actually has.
        expected: String,
    },
    /// `tx.gas` exceeds the configured maximum transaction fee threshold.
    #[error("Gas limit too high")]
    GasLimitTooHigh,
    /// `tx.gas` is below the computed intrinsic gas for the call data.
    #[error("Gas limit too low")]
    GasLimitTooLow,
    /// `tx.gasPrice` is below the current network gas price.
    #[error("Gas price too low: provided {provided}, required {required}")]
    GasPriceTooLow {
        /// The gas price the caller provided.
        provided: String,
        /// The minimum acceptable gas price.
        required: String,
    },
    /// The sender's balance cannot cover `value + gasPrice * gasLimit`.
    #[error("Insufficient balance for transfer")]
    InsufficientBalance,
    /// `tx.value` falls in the forbidden sub-unit range (§4.6.10).
    #[error("Value too low")]
    ValueTooLow,
    /// The raw transaction's serialized byte count exceeds the configured cap.
    #[error("Transaction size exceeded")]
    TransactionSizeExceeded,
    /// The call data byte count exceeds the configured cap.
    #[error("Call data size exceeded")]
    CallDataSizeExceeded,
    /// The transaction's EIP-2718 type is not supported (blob transactions).
    #[error("Unsupported transaction type")]
    UnsupportedTransactionType,
    /// `tx.chainId` doesn't match the gateway's configured chain id.
    #[error("Unsupported chain id")]
    UnsupportedChainId,
    /// `tx.to` is not a well-formed EVM address.
    #[error("Invalid contract address")]
    InvalidContractAddress,

    // -- execution --
    /// The call reverted during execution.
    #[error("execution reverted{}", reason.as_ref().map(|r| format!(": {r}")).unwrap_or_default())]
    ContractReverted {
        /// The decoded human-readable reason, if recoverable.
        reason: Option<String>,
        /// The raw revert payload, `0x`-prefixed hex.
        raw_data: String,
    },

    // -- upstream --
    /// The mirror collaborator returned a non-retryable failure.
    #[error("Upstream request failed")]
    MirrorUpstreamFailure {
        /// The upstream's original HTTP status code.
        status: u16,
    },
    /// The ingress deadline elapsed before the request completed.
    #[error("Request timeout")]
    RequestTimeout,

    // -- rate --
    /// The caller exceeded the per-`(ip, method)` rate-limit threshold.
    #[error("Rate limit exceeded for method {method}")]
    RateLimitExceeded {
        /// The method name that was rate-limited.
        method: String,
    },

    // -- unsupported --
    /// A method that is intentionally never implemented (`engine_*`, signing).
    #[error("Unsupported JSON-RPC method")]
    UnsupportedMethod,
    /// A method that is recognized but not yet implemented.
    #[error("Not yet implemented: {0}")]
    NotYetImplemented(String),

    /// A catch-all for unexpected internal failures.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl GatewayError {
    /// The stable numeric JSON-RPC error code for this kind.
    pub const fn code(&self) -> i64 {
        match self {
            Self::InvalidRequest => -32600,
            Self::MethodNotFound(_) => -32601,
            Self::InvalidParams(_) => -32602,
            Self::ParseError => -32700,
            Self::BatchDisabled | Self::BatchTooLarge => -32600,

            Self::ResourceNotFound | Self::UnknownBlock | Self::RequestBeyondHead => -32001,

            Self::NonceTooLow { .. }
            | Self::NonceTooHigh { .. }
            | Self::GasLimitTooHigh
            | Self::GasLimitTooLow
            | Self::GasPriceTooLow { .. }
            | Self::InsufficientBalance
            | Self::ValueTooLow
            | Self::TransactionSizeExceeded
            | Self::CallDataSizeExceeded
            | Self::UnsupportedTransactionType
            | Self::UnsupportedChainId
            | Self::InvalidContractAddress => -32003,

            Self::ContractReverted { .. } => 3,

            Self::MirrorUpstreamFailure { .. } => -32020,
            Self::RequestTimeout => -32008,

            Self::RateLimitExceeded { .. } => -32605,

            Self::UnsupportedMethod | Self::NotYetImplemented(_) => -32601,

            Self::Internal(_) => -32603,
        }
    }

    /// The `data` payload to attach to the JSON-RPC error object, if any.
    pub fn data(&self) -> Option<Value> {
        match self {
            Self::ContractReverted { raw_data, .. } => {
                Some(Value::String(raw_data.clone()))
            }
            Self::MirrorUpstreamFailure { status } => {
                Some(serde_json::json!({ "statusCode": status }))
            }
            _ => None,
        }
    }

    /// Maps this error to the HTTP status code the transport layer should
    /// use for a single (non-batch) JSON-RPC response, per §6.
    pub fn http_status(&self) -> u16 {
        match self {
            Self::ContractReverted { .. } => 200,
            Self::Internal(_) => 500,
            Self::InvalidRequest
            | Self::InvalidParams(_)
            | Self::MethodNotFound(_)
            | Self::ParseError
            | Self::BatchDisabled
            | Self::BatchTooLarge
            | Self::UnsupportedMethod
            | Self::NotYetImplemented(_) => 400,
            Self::RateLimitExceeded { .. } => 429,
            Self::MirrorUpstreamFailure { status } => match *status {
                404 => 400,
                429 => 429,
                501 => 501,
                _ => 500,
            },
            _ => 400,
        }
    }
}

/// Prefixes `message` with `[Request ID: <id>] ` exactly once. If the
/// pattern already occurs anywhere in the message, the message is returned
/// unchanged — this makes the helper idempotent under repeated application
/// (§4.1).
pub fn with_request_id(request_id: &str, message: &str) -> String {
    let marker = format!("[Request ID: {request_id}]");
    if message.contains(&marker) {
        message.to_string()
    } else {
        format!("{marker} {message}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn with_request_id_is_idempotent() {
        let once = with_request_id("abc-123", "boom");
        let twice = with_request_id("abc-123", &once);
        assert_eq!(once, twice);
        assert_eq!(once, "[Request ID: abc-123] boom");
    }

    #[test]
    fn codes_match_taxonomy() {
        assert_eq!(GatewayError::InvalidRequest.code(), -32600);
        assert_eq!(GatewayError::MethodNotFound("eth_foo".into()).code(), -32601);
        assert_eq!(
            GatewayError::RateLimitExceeded { method: "eth_chainId".into() }.code(),
            -32605
        );
        assert_eq!(
            GatewayError::ContractReverted { reason: None, raw_data: "0x".into() }.code(),
            3
        );
    }

    #[test]
    fn http_status_mapping() {
        assert_eq!(
            GatewayError::ContractReverted { reason: None, raw_data: "0x".into() }.http_status(),
            200
        );
        assert_eq!(GatewayError::Internal("x".into()).http_status(), 500);
        assert_eq!(
            GatewayError::RateLimitExceeded { method: "m".into() }.http_status(),
            429
        );
        assert_eq!(
            GatewayError::MirrorUpstreamFailure { status: 404 }.http_status(),
            400
        );
        assert_eq!(
            GatewayError::MirrorUpstreamFailure { status: 429 }.http_status(),
            429
        );
        assert_eq!(
            GatewayError::MirrorUpstreamFailure { status: 501 }.http_status(),
            501
        );
        assert_eq!(
            GatewayError::MirrorUpstreamFailure { status: 502 }.http_status(),
            500
        );
    }
}
