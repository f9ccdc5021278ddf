//! The [Receipt] response type (§3 "Receipt"), both shapes.

use crate::Log;
use serde::{Deserialize, Serialize};

/// A transaction receipt, in either of its two shapes (§3).
///
/// Both shapes serialize to the same flat JSON object; the distinction is
/// purely about how the gateway derived the fields (from a contract result,
/// or purely from a log group with no backing contract result).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Receipt {
    /// The including block's hash.
    pub block_hash: String,
    /// The including block's number.
    pub block_number: String,
    /// Sender EVM address.
    pub from: String,
    /// Recipient EVM address; `None` for contract creation.
    pub to: Option<String>,
    /// Cumulative gas used by all transactions up to and including this one.
    pub cumulative_gas_used: String,
    /// Gas used by this transaction alone.
    pub gas_used: String,
    /// The address of a contract created by this transaction, if any.
    pub contract_address: Option<String>,
    /// Logs emitted by this transaction.
    pub logs: Vec<Log>,
    /// Bloom filter over this transaction's logs.
    pub logs_bloom: String,
    /// This transaction's hash.
    pub transaction_hash: String,
    /// This transaction's index within its block.
    pub transaction_index: String,
    /// The fee-schedule-derived gas price at the block's timestamp.
    pub effective_gas_price: String,
    /// Legacy state-root receipts field; unset on post-Byzantium receipts.
    pub root: Option<String>,
    /// `0x1` for success, `0x0` for failure.
    pub status: String,
    /// The originating transaction's EIP-2718 type.
    #[serde(rename = "type")]
    pub tx_type: String,
}

impl Receipt {
    /// Whether this receipt represents a successful execution.
    pub fn is_success(&self) -> bool {
        self.status == "0x1"
    }
}
