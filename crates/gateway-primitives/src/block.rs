//! The [Block] response type (§3 "Block").

use crate::{hexutil, Transaction};
use serde::{Deserialize, Serialize};

/// Either a bare array of transaction hashes or an array of full
/// [Transaction] objects. Never mixed within one block, per the `showDetails`
/// invariant in §3.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum BlockTransactions {
    /// `showDetails = false`: just the hashes.
    Hashes(Vec<String>),
    /// `showDetails = true`: the full transaction objects.
    Full(Vec<Transaction>),
}

impl BlockTransactions {
    /// The number of transactions represented, regardless of variant.
    pub fn len(&self) -> usize {
        match self {
            Self::Hashes(h) => h.len(),
            Self::Full(t) => t.len(),
        }
    }

    /// Whether this block has no transactions.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// An Ethereum-shaped block, per §3.
///
/// Several fields are sentinel values because the upstream has no concept of
/// them: `difficulty`/`totalDifficulty` are always zero, `uncles` is always
/// empty, `miner` is the zero address, `mixHash`/`nonce`/`extraData` are
/// zero.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Block {
    /// 32-byte block hash (66 hex chars).
    pub hash: String,
    /// Parent block hash.
    pub parent_hash: String,
    /// Block number.
    pub number: String,
    /// Consensus timestamp, seconds.
    pub timestamp: String,
    /// Sum of `gasUsed` across all transactions in the block.
    pub gas_used: String,
    /// The block gas limit.
    pub gas_limit: String,
    /// The fee-schedule-derived base fee at this block's timestamp.
    pub base_fee_per_gas: String,
    /// Empty-bloom sentinel unless the upstream reports a populated bloom.
    pub logs_bloom: String,
    /// Always the zero address: the upstream has no beneficiary concept.
    pub miner: String,
    /// Always `0x0`.
    pub difficulty: String,
    /// Always `0x0`.
    pub total_difficulty: String,
    /// Always empty: no uncle blocks exist upstream.
    pub uncles: Vec<String>,
    /// The EIP-empty-array hash, since there are never any uncles.
    pub sha3_uncles: String,
    /// Always zero.
    pub mix_hash: String,
    /// Always zero.
    pub nonce: String,
    /// Always zero.
    pub extra_data: String,
    /// The default (empty) trie root.
    pub state_root: String,
    /// Computed per §4.6.1 over (tx hash, contract result, logs) triples.
    pub receipts_root: String,
    /// Default-root when there are no transactions, else the block hash.
    pub transactions_root: String,
    /// The RLP-encoded block size in bytes, as reported upstream.
    pub size: String,
    /// Either hashes or full transaction objects, never mixed.
    pub transactions: BlockTransactions,
}

impl Block {
    /// Builds the sentinel fields this type always carries, leaving the
    /// block-specific fields to be filled in by the caller.
    pub fn with_defaults(
        hash: String,
        parent_hash: String,
        number: String,
        timestamp: String,
        gas_used: String,
        gas_limit: String,
        base_fee_per_gas: String,
        logs_bloom: Option<String>,
        receipts_root: String,
        size: String,
        transactions: BlockTransactions,
    ) -> Self {
        let transactions_root = if transactions.is_empty() {
            hexutil::fixed_bytes(&[0u8; 32])
        } else {
            hash.clone()
        };

        Self {
            hash,
            parent_hash,
            number,
            timestamp,
            gas_used,
            gas_limit,
            base_fee_per_gas,
            logs_bloom: logs_bloom.unwrap_or_else(hexutil::empty_bloom),
            miner: hexutil::zero_address(),
            difficulty: "0x0".to_string(),
            total_difficulty: "0x0".to_string(),
            uncles: Vec::new(),
            sha3_uncles: hexutil::fixed_bytes(hexutil::empty_list_hash().as_slice()),
            mix_hash: hexutil::fixed_bytes(&[0u8; 32]),
            nonce: "0x0000000000000000".to_string(),
            extra_data: "0x".to_string(),
            state_root: hexutil::fixed_bytes(hexutil::default_root_hash().as_slice()),
            receipts_root,
            transactions_root,
            size,
            transactions,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_block_uses_default_transactions_root() {
        let block = Block::with_defaults(
            "0x".to_string() + &"11".repeat(32),
            "0x".to_string() + &"00".repeat(32),
            "0x1".to_string(),
            "0x1".to_string(),
            "0x0".to_string(),
            "0x1".to_string(),
            "0x0".to_string(),
            None,
            "0x".to_string() + &"00".repeat(32),
            "0x0".to_string(),
            BlockTransactions::Hashes(vec![]),
        );
        assert_eq!(block.transactions_root, "0x".to_string() + &"00".repeat(32));
        assert_eq!(block.logs_bloom, hexutil::empty_bloom());
    }

    #[test]
    fn nonempty_block_uses_block_hash_as_transactions_root() {
        let hash = "0x".to_string() + &"aa".repeat(32);
        let block = Block::with_defaults(
            hash.clone(),
            "0x".to_string() + &"00".repeat(32),
            "0x1".to_string(),
            "0x1".to_string(),
            "0x0".to_string(),
            "0x1".to_string(),
            "0x0".to_string(),
            None,
            "0x".to_string() + &"00".repeat(32),
            "0x0".to_string(),
            BlockTransactions::Hashes(vec!["0x".to_string() + &"bb".repeat(32)]),
        );
        assert_eq!(block.transactions_root, hash);
    }
}
