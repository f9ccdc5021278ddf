//! Response shapes returned by the mirror collaborator's REST endpoints.
//!
//! The mirror REST contract is specified only as opaque URL-and-schema
//! pairs (§6); these types carry exactly the fields the eth/debug services
//! read out of them. `#[serde(default)]` throughout because the mirror may
//! omit fields the gateway doesn't need.

use serde::{Deserialize, Serialize};

/// A timestamp range, as the mirror reports it on blocks and contract
/// results: `from`/`to` are consensus-timestamp strings of the form
/// `"<seconds>.<nanos>"`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct TimestampRange {
    /// Inclusive lower bound.
    #[serde(default)]
    pub from: String,
    /// Exclusive upper bound, or empty for an open-ended (still-live) range.
    #[serde(default)]
    pub to: String,
}

/// A block, as reported by the mirror's block endpoints.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct MirrorBlock {
    /// 32-byte block hash, hex-encoded.
    pub hash: String,
    /// Parent block hash.
    #[serde(default)]
    pub prev_hash: String,
    /// Block number.
    pub number: u64,
    /// The block's consensus-timestamp range.
    pub timestamp: TimestampRange,
    /// Sum of gas used across all transactions in the block.
    #[serde(default)]
    pub gas_used: u64,
    /// The block's logs bloom, if the mirror computed one.
    #[serde(default)]
    pub logs_bloom: Option<String>,
    /// The number of transactions contained in the block.
    #[serde(default)]
    pub count: u64,
    /// RLP-encoded block size in bytes.
    #[serde(default)]
    pub size: u64,
}

/// A single execution (contract-call) result.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ContractResult {
    /// This transaction's hash.
    pub hash: String,
    /// The sender's EVM address.
    pub from: String,
    /// The callee's EVM address (or the contract being created).
    #[serde(default)]
    pub to: Option<String>,
    /// The created contract's address, if this result created one.
    #[serde(default)]
    pub address: Option<String>,
    /// Value transferred, tinybar.
    #[serde(default)]
    pub amount: u64,
    /// Gas limit supplied by the caller.
    #[serde(default)]
    pub gas_limit: u64,
    /// Gas actually consumed.
    #[serde(default)]
    pub gas_used: u64,
    /// Gas price, tinybar.
    #[serde(default)]
    pub gas_price: String,
    /// ABI-encoded call data / init code.
    #[serde(default)]
    pub function_parameters: String,
    /// The raw return data / revert payload.
    #[serde(default)]
    pub call_result: String,
    /// The upstream execution result code, e.g. `"SUCCESS"`, `"WRONG_NONCE"`.
    #[serde(default)]
    pub result: String,
    /// The EIP-2718 transaction type (0, 1, 2), if known.
    #[serde(default)]
    pub r#type: Option<u8>,
    /// Nonce used for this transaction.
    #[serde(default)]
    pub nonce: u64,
    /// Chain id, hex or decimal as the mirror reports it.
    #[serde(default)]
    pub chain_id: Option<String>,
    /// `maxFeePerGas`, present on type-2 transactions.
    #[serde(default)]
    pub max_fee_per_gas: Option<String>,
    /// `maxPriorityFeePerGas`, present on type-2 transactions.
    #[serde(default)]
    pub max_priority_fee_per_gas: Option<String>,
    /// Signature `v`.
    #[serde(default)]
    pub v: Option<u64>,
    /// Signature `r`, hex.
    #[serde(default)]
    pub r: String,
    /// Signature `s`, hex.
    #[serde(default)]
    pub s: String,
    /// The including block's hash.
    #[serde(default)]
    pub block_hash: String,
    /// The including block's number.
    #[serde(default)]
    pub block_number: u64,
    /// This transaction's index within its block.
    #[serde(default)]
    pub transaction_index: u64,
    /// This result's consensus timestamp.
    #[serde(default)]
    pub timestamp: String,
}

impl ContractResult {
    /// Whether this result's upstream result code indicates success.
    pub fn is_success(&self) -> bool {
        self.result == "SUCCESS"
    }
}

/// A single event log, as the mirror reports it.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct MirrorLog {
    /// The emitting contract's EVM address.
    pub address: String,
    /// The log's non-indexed ABI-encoded data.
    #[serde(default)]
    pub data: String,
    /// Index of this log within its block.
    #[serde(default)]
    pub index: u64,
    /// Indexed topics.
    #[serde(default)]
    pub topics: Vec<String>,
    /// The emitting transaction's hash.
    #[serde(default)]
    pub transaction_hash: String,
    /// Index of the emitting transaction within its block.
    #[serde(default)]
    pub transaction_index: u64,
    /// The including block's hash.
    #[serde(default)]
    pub block_hash: String,
    /// The including block's number.
    #[serde(default)]
    pub block_number: u64,
    /// This log's consensus timestamp.
    #[serde(default)]
    pub timestamp: String,
}

/// A page of logs, as the logs-by-address/time-range endpoints return them.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct LogsPage {
    /// The logs in this page.
    #[serde(default)]
    pub logs: Vec<MirrorLog>,
}

/// A page of contract results.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ContractResultsPage {
    /// The results in this page.
    #[serde(default)]
    pub results: Vec<ContractResult>,
}

/// An account, as the mirror's account endpoint reports it.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct MirrorAccount {
    /// The canonical EVM address for this account, if one is known.
    #[serde(default)]
    pub evm_address: Option<String>,
    /// Current balance, tinybar.
    #[serde(default)]
    pub balance: Option<AccountBalance>,
    /// The Ethereum-shaped nonce, if the upstream tracks one.
    #[serde(default)]
    pub ethereum_nonce: Option<u64>,
    /// Whether this account requires an explicit signature on any transfer
    /// that credits it (§4.6.10 precheck).
    #[serde(default)]
    pub receiver_sig_required: bool,
}

/// The nested balance object on a mirror account response.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct AccountBalance {
    /// Balance in tinybar.
    #[serde(default)]
    pub balance: u64,
    /// The timestamp this balance was reported as of.
    #[serde(default)]
    pub timestamp: String,
}

/// A single transfer entry returned when paginating balance history.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Transfer {
    /// The account affected.
    pub account: String,
    /// Signed tinybar amount (positive = credit, negative = debit).
    pub amount: i64,
    /// The transfer's consensus timestamp.
    pub timestamp: String,
}

/// A page of transfer entries.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct TransfersPage {
    /// The transfers in this page, one entry per affected account per
    /// transaction.
    #[serde(default)]
    pub transactions: Vec<Transfer>,
}

/// Contract runtime state: bytecode and a single slot lookup, or the full
/// slot map.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ContractState {
    /// The requested slot's value, hex, if a single slot was requested.
    #[serde(default)]
    pub value: Option<String>,
    /// Deployed runtime bytecode.
    #[serde(default)]
    pub runtime_bytecode: Option<String>,
    /// The block timestamp this contract's code was created at.
    #[serde(default)]
    pub created_timestamp: Option<String>,
}

/// A single slot/value entry from the unfiltered contract-state listing,
/// used by the prestate tracer to assemble a full `storage` map (§4.7).
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ContractStorageSlot {
    /// The slot, hex.
    pub slot: String,
    /// The slot's value, hex.
    pub value: String,
}

/// A page of the unfiltered contract-state listing.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ContractStoragePage {
    /// The slots in this page.
    #[serde(default)]
    pub state: Vec<ContractStorageSlot>,
}

/// The successful-body shape of a `POST /api/v1/contracts/call`.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ContractCallResult {
    /// The ABI-encoded return value, hex.
    #[serde(default)]
    pub result: Option<String>,
}

/// A single structured error message within a failed call's `_status` body.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ContractCallErrorMessage {
    /// The upstream result code, e.g. `"CONTRACT_REVERT_EXECUTED"`.
    #[serde(default)]
    pub message: String,
    /// A human-readable detail string, if the mirror decoded a revert
    /// reason string.
    #[serde(default)]
    pub detail: Option<String>,
    /// The raw revert payload, hex, if any.
    #[serde(default)]
    pub data: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub(crate) struct ContractCallErrorStatus {
    #[serde(default)]
    pub messages: Vec<ContractCallErrorMessage>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub(crate) struct ContractCallErrorBody {
    #[serde(default, rename = "_status")]
    pub status: Option<ContractCallErrorStatus>,
}

/// The outcome of a `contracts/call` request: either a successful ABI
/// result or a failure carrying the upstream HTTP status and the first
/// structured error message the mirror's body reported, if any (§4.6.6).
#[derive(Debug, Clone)]
pub enum ContractCallOutcome {
    /// The call executed successfully.
    Success(String),
    /// The call failed; `message` carries the upstream's own diagnosis when
    /// the mirror reported one.
    Failed {
        /// The final HTTP status observed.
        status: u16,
        /// The first structured error message, if the body had one.
        message: Option<ContractCallErrorMessage>,
    },
}

/// A single entry in the network fee schedule.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct NetworkFee {
    /// The transaction kind this fee entry applies to, e.g.
    /// `"EthereumTransaction"`.
    pub transaction_type: String,
    /// The fee, tinybar.
    pub gas: u64,
}

/// The network fees endpoint's response.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct NetworkFees {
    /// One entry per transaction kind.
    #[serde(default)]
    pub fees: Vec<NetworkFee>,
}

/// A single call/create/precompile action within a transaction's execution
/// trace, as reported by the contract-results/actions endpoint.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ContractAction {
    /// `CALL`, `CREATE`, `DELEGATECALL`, etc.
    pub call_type: String,
    /// Nesting depth; `0` is the top-level action.
    #[serde(default)]
    pub call_depth: u32,
    /// Caller EVM address.
    pub caller: String,
    /// The kind of entity the caller is (`ACCOUNT` or `CONTRACT`).
    #[serde(default)]
    pub caller_type: String,
    /// Callee EVM address.
    pub recipient: String,
    /// The kind of entity the recipient is.
    #[serde(default)]
    pub recipient_type: String,
    /// Value transferred, tinybar.
    #[serde(default)]
    pub value: u64,
    /// Gas made available.
    #[serde(default)]
    pub gas: u64,
    /// Gas consumed.
    #[serde(default)]
    pub gas_used: u64,
    /// Call input.
    #[serde(default)]
    pub input: String,
    /// Call output.
    #[serde(default)]
    pub output: Option<String>,
    /// The upstream execution result code for this action.
    #[serde(default)]
    pub result_data: String,
    /// This action's consensus timestamp.
    #[serde(default)]
    pub timestamp: String,
}

/// A page of actions.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ActionsPage {
    /// The actions in this page.
    #[serde(default)]
    pub actions: Vec<ContractAction>,
}

/// A single opcode trace entry, as the opcodes-trace endpoint reports it,
/// mirroring `structLogs` shape before gateway-side `null` normalization.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct OpcodeTraceEntry {
    /// Program counter.
    pub pc: u64,
    /// Opcode mnemonic.
    pub op: String,
    /// Gas remaining.
    pub gas: u64,
    /// Gas cost of this instruction.
    pub gas_cost: u64,
    /// Call-stack depth.
    pub depth: u32,
    /// Stack snapshot, if requested.
    #[serde(default)]
    pub stack: Option<Vec<String>>,
    /// Memory snapshot, if requested.
    #[serde(default)]
    pub memory: Option<Vec<String>>,
    /// Storage snapshot, if requested.
    #[serde(default)]
    pub storage: Option<std::collections::BTreeMap<String, String>>,
    /// Failure reason for this instruction, if any.
    #[serde(default)]
    pub reason: Option<String>,
}

/// The opcodes-trace endpoint's full response.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct OpcodesTraceResponse {
    /// Total gas consumed.
    #[serde(default)]
    pub gas: u64,
    /// Whether the traced call failed.
    #[serde(default)]
    pub failed: bool,
    /// Raw return value, hex.
    #[serde(default)]
    pub return_value: String,
    /// One entry per executed instruction.
    #[serde(default)]
    pub opcodes: Vec<OpcodeTraceEntry>,
}

/// The exchange-rate endpoint's response.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ExchangeRate {
    /// Cents-per-native-unit numerator.
    pub cent_equivalent: u64,
    /// Native-unit denominator.
    pub hbar_equivalent: u64,
    /// Expiration time, seconds since epoch.
    #[serde(default)]
    pub expiration_time: u64,
}

/// The kind of entity an address resolves to (§4.4 "resolveEntityType").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityKind {
    /// A deployed contract.
    Contract,
    /// A fungible/non-fungible token.
    Token,
    /// A plain externally-owned account.
    Account,
}

/// The tagged result of [`resolveEntityType`].
///
/// [`resolveEntityType`]: crate::MirrorClient::resolve_entity_type
#[derive(Debug, Clone)]
pub struct ResolvedEntity {
    /// The kind of entity this address resolved to.
    pub kind: EntityKind,
    /// The canonical EVM address, if different from the input.
    pub evm_address: Option<String>,
}
