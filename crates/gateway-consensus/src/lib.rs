#![doc = "Opaque client interface to the consensus-network collaborator (§4.6.3 \"Submission\")."]
#![warn(missing_debug_implementations, missing_docs, rustdoc::all)]
#![deny(unused_must_use, rust_2018_idioms)]

use async_trait::async_trait;
use std::sync::Mutex;
use tracing::warn;

/// The upstream consensus SDK's error taxonomy, narrowed to the variants
/// the submission pipeline (§4.6.3) branches on. `TransactionId` is still
/// populated on `network error after submit` and `timeout after submit`
/// because the transaction may have reached consensus despite the client
/// never seeing a clean acknowledgement.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ConsensusError {
    /// The upstream rejected the transaction outright; no `transactionId`
    /// was issued.
    #[error("consensus network rejected the transaction: {status}")]
    Rejected {
        /// The upstream status string, e.g. `"WRONG_NONCE"`.
        status: String,
    },
    /// The connection dropped after the transaction was sent; it may or
    /// may not have reached consensus.
    #[error("connection dropped after submit")]
    DroppedAfterSubmit {
        /// The transaction id, if the upstream issued one before dropping.
        transaction_id: Option<String>,
    },
    /// The call timed out after the transaction was sent.
    #[error("timed out after submit")]
    TimeoutAfterSubmit {
        /// The transaction id, if the upstream issued one before timing out.
        transaction_id: Option<String>,
    },
    /// Any other SDK-level failure, wrapped verbatim.
    #[error("consensus SDK error: {0}")]
    Other(String),
}

/// The outcome of [`ConsensusClient::submit_transaction`].
#[derive(Debug, Clone)]
pub struct SubmitOutcome {
    /// The upstream-assigned transaction id.
    pub transaction_id: String,
}

/// A single call/query against consensus-network state, used when
/// `eth_call`/`eth_estimateGas` are configured to bypass the mirror's
/// simulation endpoint (§4.6.6 "route to consensus").
#[derive(Debug, Clone, Default)]
pub struct ConsensusCallRequest {
    /// The callee; absent for a contract-creation simulation.
    pub to: Option<String>,
    /// The caller, if supplied.
    pub from: Option<String>,
    /// Call data / init code.
    pub data: Vec<u8>,
    /// Value, tinybar.
    pub value: u64,
    /// Gas limit.
    pub gas: u64,
}

/// The outcome of [`ConsensusClient::call`].
#[derive(Debug, Clone)]
pub enum ConsensusCallOutcome {
    /// The call executed successfully, returning this ABI-encoded result.
    Success(Vec<u8>),
    /// The call reverted; `raw_data` is the revert payload.
    Reverted {
        /// The raw revert payload.
        raw_data: Vec<u8>,
    },
}

/// The opaque "submit signed transaction, get id" client the gateway talks
/// to when writing (§1 "consensus network"). Only the surface the
/// submission pipeline needs is modeled; everything else about the
/// upstream SDK is out of scope.
#[async_trait]
pub trait ConsensusClient: Send + Sync + std::fmt::Debug {
    /// Submits `raw_tx` (the RLP-encoded signed transaction bytes) to the
    /// consensus network, returning its assigned id on success.
    async fn submit_transaction(
        &self,
        raw_tx: &[u8],
    ) -> Result<SubmitOutcome, ConsensusError>;

    /// Executes a read-only call/simulation directly against consensus
    /// state, bypassing the mirror's own simulation endpoint.
    async fn call(
        &self,
        request: &ConsensusCallRequest,
    ) -> Result<ConsensusCallOutcome, ConsensusError>;
}

/// The consensus collaborator's file service, used only for
/// contract-creation bytecode that exceeds the inline transaction size
/// limit (§4.6.3 "Bytecode side effect").
#[async_trait]
pub trait FileService: Send + Sync + std::fmt::Debug {
    /// Uploads `bytecode`, returning the upstream file id it was stored
    /// under.
    async fn upload(&self, bytecode: &[u8]) -> Result<String, ConsensusError>;

    /// Schedules `file_id` for deletion. Best-effort: callers invoke this
    /// on both the success and failure paths of a creation submission and
    /// do not propagate its outcome.
    async fn schedule_delete(&self, file_id: &str);
}

/// Uploads `bytecode` if it exceeds `inline_limit`, unconditionally
/// scheduling the uploaded file for deletion before returning — on both
/// the success and failure paths, per §4.6.3. Returns `Ok(None)` when no
/// upload was needed.
pub async fn upload_oversized_bytecode(
    files: &dyn FileService,
    bytecode: &[u8],
    inline_limit: usize,
) -> Result<Option<String>, ConsensusError> {
    if bytecode.len() <= inline_limit {
        return Ok(None);
    }
    let result = files.upload(bytecode).await;
    if let Ok(file_id) = &result {
        files.schedule_delete(file_id).await;
    }
    result.map(Some)
}

/// An in-memory [`ConsensusClient`] and [`FileService`] test double.
///
/// Every submitted transaction is recorded and assigned a deterministic
/// id derived from a monotonically increasing counter; no network I/O
/// occurs. Intended for gateway-rpc's unit tests, not production use.
#[derive(Debug, Default)]
pub struct InMemoryConsensusClient {
    submitted: Mutex<Vec<Vec<u8>>>,
    next_id: Mutex<u64>,
    deleted_files: Mutex<Vec<String>>,
}

impl InMemoryConsensusClient {
    /// Builds an empty test double.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns every transaction submitted so far, in submission order.
    pub fn submitted(&self) -> Vec<Vec<u8>> {
        self.submitted.lock().expect("lock poisoned").clone()
    }

    /// Returns every file id scheduled for deletion so far.
    pub fn deleted_files(&self) -> Vec<String> {
        self.deleted_files.lock().expect("lock poisoned").clone()
    }
}

#[async_trait]
impl ConsensusClient for InMemoryConsensusClient {
    async fn submit_transaction(
        &self,
        raw_tx: &[u8],
    ) -> Result<SubmitOutcome, ConsensusError> {
        self.submitted.lock().expect("lock poisoned").push(raw_tx.to_vec());
        let mut next_id = self.next_id.lock().expect("lock poisoned");
        *next_id += 1;
        Ok(SubmitOutcome { transaction_id: format!("0.0.2@{}.0", *next_id) })
    }

    async fn call(
        &self,
        _request: &ConsensusCallRequest,
    ) -> Result<ConsensusCallOutcome, ConsensusError> {
        Ok(ConsensusCallOutcome::Success(Vec::new()))
    }
}

#[async_trait]
impl FileService for InMemoryConsensusClient {
    async fn upload(&self, bytecode: &[u8]) -> Result<String, ConsensusError> {
        let mut next_id = self.next_id.lock().expect("lock poisoned");
        *next_id += 1;
        let file_id = format!("0.0.{}", 150000 + *next_id);
        let _ = bytecode;
        Ok(file_id)
    }

    async fn schedule_delete(&self, file_id: &str) {
        warn!(target: "gateway-consensus", file_id, "scheduling file for deletion");
        self.deleted_files.lock().expect("lock poisoned").push(file_id.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn submits_and_assigns_ids() {
        let client = InMemoryConsensusClient::new();
        let a = client.submit_transaction(&[1, 2, 3]).await.unwrap();
        let b = client.submit_transaction(&[4, 5, 6]).await.unwrap();
        assert_ne!(a.transaction_id, b.transaction_id);
        assert_eq!(client.submitted().len(), 2);
    }

    #[tokio::test]
    async fn oversized_bytecode_is_uploaded_and_scheduled_for_deletion() {
        let client = InMemoryConsensusClient::new();
        let bytecode = vec![0u8; 64];
        let file_id = upload_oversized_bytecode(&client, &bytecode, 32).await.unwrap();
        assert!(file_id.is_some());
        assert_eq!(client.deleted_files(), vec![file_id.unwrap()]);
    }

    #[tokio::test]
    async fn inline_bytecode_is_not_uploaded() {
        let client = InMemoryConsensusClient::new();
        let bytecode = vec![0u8; 8];
        let file_id = upload_oversized_bytecode(&client, &bytecode, 32).await.unwrap();
        assert!(file_id.is_none());
        assert!(client.deleted_files().is_empty());
    }
}
