//! The [TracerResult] variants (§3 "TracerResult", §4.7).

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One call-tracer frame. The top-level result is itself a [CallFrame]; its
/// `calls` field holds every non-top action unless `onlyTopCall` was set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CallFrame {
    /// `CALL`, `CREATE`, `DELEGATECALL`, etc.
    #[serde(rename = "type")]
    pub call_type: String,
    /// Caller EVM address.
    pub from: String,
    /// Callee EVM address (or created-contract address for `CREATE`).
    pub to: String,
    /// Value transferred, in weibar hex.
    pub value: String,
    /// Gas made available to this call.
    pub gas: String,
    /// Gas actually consumed.
    pub gas_used: String,
    /// Call input data.
    pub input: String,
    /// Call return data.
    pub output: String,
    /// Nested calls; omitted when `onlyTopCall` is set or there's exactly
    /// one action.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub calls: Option<Vec<CallFrame>>,
    /// Populated when the top-level result is non-success.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// The decoded human-readable revert reason, if recoverable.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub revert_reason: Option<String>,
}

/// One opcode-logger struct-log entry. Every optional field is emitted as
/// explicit `null` when its category is disabled, never omitted — unlike
/// [`CallFrame`], this is intentionally *not* `skip_serializing_if`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OpcodeStructLog {
    /// Program counter.
    pub pc: u64,
    /// Opcode mnemonic.
    pub op: String,
    /// Gas remaining before executing this instruction, as hex.
    pub gas: String,
    /// Gas cost of this instruction, as hex.
    pub gas_cost: String,
    /// Call-stack depth.
    pub depth: u64,
    /// Stack contents, or `null` when stack tracing is disabled.
    pub stack: Option<Vec<String>>,
    /// Memory contents, or `null` when memory tracing is disabled.
    pub memory: Option<Vec<String>>,
    /// Storage slot map, or `null` when storage tracing is disabled.
    pub storage: Option<BTreeMap<String, String>>,
    /// Error description, or `null` when this instruction succeeded.
    pub reason: Option<String>,
}

/// The `opcodeLogger` tracer's top-level result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OpcodeTrace {
    /// Total gas consumed by the traced transaction.
    pub gas: String,
    /// Whether execution failed.
    pub failed: bool,
    /// Raw return value with the `0x` prefix stripped.
    pub return_value: String,
    /// One entry per executed instruction.
    pub struct_logs: Vec<OpcodeStructLog>,
}

/// One address's prestate entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrestateAccount {
    /// Balance in weibar hex, normalized to `0x0` when the upstream reports
    /// none (§9 open question).
    pub balance: String,
    /// Account nonce.
    pub nonce: u64,
    /// Deployed bytecode; `0x` for non-contract accounts.
    pub code: String,
    /// Storage slot -> value map; empty for non-contract accounts.
    pub storage: BTreeMap<String, String>,
}

/// The three tracer-result variants (§3 "TracerResult").
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TracerResult {
    /// `callTracer`: a flattened call tree.
    CallTracer(CallFrame),
    /// `opcodeLogger`: a struct-log array with gas/return metadata.
    OpcodeLogger(OpcodeTrace),
    /// `prestateTracer`: address -> prestate entry map.
    PrestateTracer(BTreeMap<String, PrestateAccount>),
}
