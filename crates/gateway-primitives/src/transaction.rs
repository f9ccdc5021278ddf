//! The [Transaction] tagged union (§3 "Transaction", §4.6.7).

use serde::{Deserialize, Serialize};

/// A single EIP-2930 access-list entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccessListItem {
    /// The address covered by this entry.
    pub address: String,
    /// The storage keys covered by this entry.
    pub storage_keys: Vec<String>,
}

/// Fields shared by all three transaction variants.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionEnvelope {
    /// 32-byte transaction hash.
    pub hash: String,
    /// Sender-side nonce.
    pub nonce: String,
    /// Sender EVM address.
    pub from: String,
    /// Recipient EVM address; `None` for contract creation.
    pub to: Option<String>,
    /// Value transferred, in weibar.
    pub value: String,
    /// Gas limit.
    pub gas: String,
    /// Call data / init code.
    pub input: String,
    /// Signature `v`.
    pub v: String,
    /// Signature `r`, leading zero stripped.
    pub r: String,
    /// Signature `s`, leading zero stripped.
    pub s: String,
    /// The block this transaction was included in; `None` for a detached
    /// synthetic transaction probe.
    pub block_hash: Option<String>,
    /// The including block's number.
    pub block_number: Option<String>,
    /// Index of this transaction within its block.
    pub transaction_index: Option<String>,
    /// Chain id; unset (`None`) for a legacy transaction with `chainId = 0x`,
    /// per §4.6.7, for tool compatibility.
    pub chain_id: Option<String>,
}

/// The three EIP-2718 transaction types this gateway can return.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Transaction {
    /// Type `0x0`: legacy, `gasPrice` always present.
    #[serde(rename = "0x0")]
    Legacy {
        /// Shared envelope fields.
        #[serde(flatten)]
        envelope: TransactionEnvelope,
        /// Gas price, always present on legacy transactions.
        gas_price: String,
    },
    /// Type `0x1`: EIP-2930 access-list, list forced empty by this gateway.
    #[serde(rename = "0x1")]
    AccessList {
        /// Shared envelope fields.
        #[serde(flatten)]
        envelope: TransactionEnvelope,
        /// Gas price.
        gas_price: String,
        /// Always empty (§4.6.7).
        access_list: Vec<AccessListItem>,
    },
    /// Type `0x2`: EIP-1559 dynamic fee.
    #[serde(rename = "0x2")]
    DynamicFee {
        /// Shared envelope fields.
        #[serde(flatten)]
        envelope: TransactionEnvelope,
        /// Always empty (§4.6.7).
        access_list: Vec<AccessListItem>,
        /// Normalized: null/empty-hex become `0x0`.
        max_fee_per_gas: String,
        /// Normalized: null/empty-hex become `0x0`.
        max_priority_fee_per_gas: String,
    },
}

impl Transaction {
    /// The envelope fields common to every variant.
    pub fn envelope(&self) -> &TransactionEnvelope {
        match self {
            Self::Legacy { envelope, .. }
            | Self::AccessList { envelope, .. }
            | Self::DynamicFee { envelope, .. } => envelope,
        }
    }

    /// The transaction hash, regardless of variant.
    pub fn hash(&self) -> &str {
        &self.envelope().hash
    }

    /// Builds a minimal synthetic type-2 transaction representing an
    /// EVM-visible log with no backing contract result (§4.6.1 step 2,
    /// Glossary "Synthetic transaction"). `from` and `to` both equal the
    /// log's address.
    pub fn synthetic(
        hash: String,
        address: String,
        block_hash: String,
        block_number: String,
        transaction_index: String,
    ) -> Self {
        Self::DynamicFee {
            envelope: TransactionEnvelope {
                hash,
                nonce: "0x0".to_string(),
                from: address.clone(),
                to: Some(address),
                value: "0x0".to_string(),
                gas: "0x0".to_string(),
                input: "0x".to_string(),
                v: "0x0".to_string(),
                r: "0x0".to_string(),
                s: "0x0".to_string(),
                block_hash: Some(block_hash),
                block_number: Some(block_number),
                transaction_index: Some(transaction_index),
                chain_id: None,
            },
            access_list: Vec::new(),
            max_fee_per_gas: "0x0".to_string(),
            max_priority_fee_per_gas: "0x0".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn envelope() -> TransactionEnvelope {
        TransactionEnvelope {
            hash: "0x".to_string() + &"11".repeat(32),
            nonce: "0x1".to_string(),
            from: "0x".to_string() + &"aa".repeat(20),
            to: Some("0x".to_string() + &"bb".repeat(20)),
            value: "0x0".to_string(),
            gas: "0x5208".to_string(),
            input: "0x".to_string(),
            v: "0x1b".to_string(),
            r: "0x1".to_string(),
            s: "0x1".to_string(),
            block_hash: None,
            block_number: None,
            transaction_index: None,
            chain_id: None,
        }
    }

    #[test]
    fn legacy_serializes_with_gas_price() {
        let tx = Transaction::Legacy { envelope: envelope(), gas_price: "0x1".to_string() };
        let json = serde_json::to_value(&tx).unwrap();
        assert_eq!(json["type"], "0x0");
        assert_eq!(json["gasPrice"], "0x1");
    }

    #[test]
    fn synthetic_transaction_has_matching_from_and_to() {
        let addr = "0x".to_string() + &"cc".repeat(20);
        let tx = Transaction::synthetic(
            "0x".to_string() + &"dd".repeat(32),
            addr.clone(),
            "0x".to_string() + &"ee".repeat(32),
            "0x5".to_string(),
            "0x0".to_string(),
        );
        assert_eq!(tx.envelope().from, addr);
        assert_eq!(tx.envelope().to, Some(addr));
    }
}
