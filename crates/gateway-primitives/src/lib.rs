#![doc = "Ethereum-shaped data model shared by the JSON-RPC gateway."]
#![warn(missing_debug_implementations, missing_docs, rustdoc::all)]
#![deny(unused_must_use, rust_2018_idioms)]

pub mod hexutil;
pub mod units;

mod block;
mod log;
mod receipt;
mod tracer;
mod transaction;

pub use block::Block;
pub use log::Log;
pub use receipt::Receipt;
pub use tracer::{CallFrame, OpcodeStructLog, OpcodeTrace, PrestateAccount, TracerResult};
pub use transaction::{AccessListItem, Transaction, TransactionEnvelope};
