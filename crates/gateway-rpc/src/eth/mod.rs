//! C6: eth read/write services (§4.6).

mod account;
mod address;
mod block;
mod call;
mod constants;
mod gas;
mod logs;
mod receipt;
mod submit;
pub(crate) mod support;
mod transaction;

pub use account::{get_balance, get_code, get_storage_at, get_transaction_count};
pub use address::resolve_address;
pub use block::get_block_by_hash_or_number;
pub use call::{call, estimate_gas};
pub use constants::{
    accounts, block_number, block_transaction_count, chain_id, client_version, hashrate, mining,
    net_listening, net_version, sha3, syncing, uncle_by_index, uncle_count,
};
pub use gas::{current_gas_price_for_block, fee_history, gas_price, max_priority_fee_per_gas};
pub use logs::get_logs;
pub use receipt::{get_block_receipts, get_transaction_receipt};
pub use submit::send_raw_transaction;
pub use transaction::{
    get_transaction_by_block_hash_and_index, get_transaction_by_block_number_and_index,
    get_transaction_by_hash, transaction_from_contract_result,
};

use crate::config::GatewayConfig;
use gateway_consensus::{ConsensusClient, FileService};
use gateway_mirror::MirrorClient;
use std::sync::Arc;

/// The collaborators and configuration every eth-service function needs.
/// Passed by reference rather than bundled into a blanket `self` so each
/// function's dependencies stay explicit (§9 design notes favor explicit
/// wiring over hidden global state).
#[derive(Clone)]
pub struct EthContext {
    /// The mirror REST client.
    pub mirror: Arc<MirrorClient>,
    /// The consensus-network client used for `eth_sendRawTransaction`.
    pub consensus: Arc<dyn ConsensusClient>,
    /// The consensus file service, for oversized creation bytecode.
    pub files: Arc<dyn FileService>,
    /// Process-wide configuration.
    pub config: Arc<GatewayConfig>,
}

impl std::fmt::Debug for EthContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EthContext").finish_non_exhaustive()
    }
}
