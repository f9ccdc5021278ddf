//! The [Log] response type (§3 "Log").

use serde::{Deserialize, Serialize};

/// An Ethereum event log entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Log {
    /// The emitting contract's EVM address.
    pub address: String,
    /// The including block's hash, normalized to 32 bytes.
    pub block_hash: String,
    /// The including block's number.
    pub block_number: String,
    /// The ABI-encoded, non-indexed log data.
    pub data: String,
    /// Index of this log within its block.
    pub log_index: String,
    /// Always `false`: the gateway never reorgs logs it has already served.
    pub removed: bool,
    /// Indexed event topics (0-4 entries).
    pub topics: Vec<String>,
    /// The emitting transaction's hash, normalized to 32 bytes.
    pub transaction_hash: String,
    /// Index of the emitting transaction within its block.
    pub transaction_index: String,
}

impl Log {
    /// `removed` is always `false` per §3; this constructor bakes that in so
    /// call sites can't accidentally set it.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        address: String,
        block_hash: String,
        block_number: String,
        data: String,
        log_index: String,
        topics: Vec<String>,
        transaction_hash: String,
        transaction_index: String,
    ) -> Self {
        Self {
            address,
            block_hash,
            block_number,
            data,
            log_index,
            removed: false,
            topics,
            transaction_hash,
            transaction_index,
        }
    }
}
