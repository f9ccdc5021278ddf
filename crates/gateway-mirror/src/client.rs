use crate::types::*;
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::warn;

/// Retry policy for transient mirror failures (§4.4 "Retry policy").
///
/// A request retries on `429` and `5xx` responses, and on transport-level
/// errors (timeouts, connection resets), sleeping with exponential backoff
/// between attempts, until either `max_attempts` is exhausted or `deadline`
/// has elapsed since the first attempt — whichever comes first.
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Maximum number of attempts, including the first.
    pub max_attempts: u32,
    /// Wall-clock budget for the whole retry sequence.
    pub deadline: Duration,
    /// Backoff before the second attempt; doubles each subsequent attempt.
    pub base_backoff: Duration,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 4,
            deadline: Duration::from_secs(10),
            base_backoff: Duration::from_millis(200),
        }
    }
}

/// Errors this client can surface. `Upstream` carries the final HTTP status
/// after the retry budget was exhausted (or immediately, for non-retryable
/// 4xx responses); `Deadline` means the retry budget's wall-clock deadline
/// elapsed before a response was obtained.
#[derive(Debug, thiserror::Error)]
pub enum MirrorError {
    /// The mirror returned a terminal non-2xx, non-404 status.
    #[error("mirror upstream returned status {status}")]
    Upstream {
        /// The final HTTP status code observed.
        status: u16,
    },
    /// The retry deadline elapsed before a response was obtained.
    #[error("mirror request exceeded its retry deadline")]
    Deadline,
    /// A transport-level failure that exhausted the retry budget.
    #[error("mirror transport error: {0}")]
    Transport(String),
    /// The response body did not match the expected shape.
    #[error("mirror response decode error: {0}")]
    Decode(String),
}

/// A typed REST client for the mirror collaborator (§4.4).
///
/// The mirror is a read-optimized index of the consensus network's history.
/// Every method here issues a `GET` against a fixed path under `base` and
/// decodes a fixed response shape; retry, timeout, and `404`-as-`None`
/// handling are centralized in [`MirrorClient::get_json`].
#[derive(Debug, Clone)]
pub struct MirrorClient {
    base: String,
    inner: reqwest::Client,
    retry: RetryConfig,
}

impl MirrorClient {
    /// Builds a client against `base` (no trailing slash expected) using
    /// `retry` as its retry policy.
    pub fn new(base: impl Into<String>, inner: reqwest::Client, retry: RetryConfig) -> Self {
        Self { base: base.into(), inner, retry }
    }

    /// Issues a `GET <base><path>`, decoding the body as `T`.
    ///
    /// Returns `Ok(None)` on a `404`. `request_id`, if given, is forwarded
    /// as an `X-Request-Id` header so the mirror's own logs correlate with
    /// the gateway's (§4.1).
    pub async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        request_id: Option<&str>,
    ) -> Result<Option<T>, MirrorError> {
        let url = format!("{}{}", self.base, path);
        let start = std::time::Instant::now();
        let mut attempt = 0u32;
        let mut backoff = self.retry.base_backoff;

        loop {
            attempt += 1;
            if start.elapsed() >= self.retry.deadline {
                return Err(MirrorError::Deadline);
            }

            let mut req = self.inner.get(&url);
            if let Some(id) = request_id {
                req = req.header("X-Request-Id", id);
            }

            let resp = match req.send().await {
                Ok(resp) => resp,
                Err(e) => {
                    if attempt >= self.retry.max_attempts || start.elapsed() >= self.retry.deadline
                    {
                        return Err(MirrorError::Transport(e.to_string()));
                    }
                    warn!(
                        target: "gateway-mirror",
                        attempt, "transport error, retrying: {e}"
                    );
                    tokio::time::sleep(backoff).await;
                    backoff *= 2;
                    continue;
                }
            };

            let status = resp.status();
            if status == StatusCode::NOT_FOUND {
                return Ok(None);
            }
            if status.is_success() {
                return resp
                    .json::<T>()
                    .await
                    .map(Some)
                    .map_err(|e| MirrorError::Decode(e.to_string()));
            }

            let retryable = status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error();
            if !retryable || attempt >= self.retry.max_attempts || start.elapsed() >= self.retry.deadline
            {
                return Err(MirrorError::Upstream { status: status.as_u16() });
            }
            warn!(
                target: "gateway-mirror",
                attempt, status = status.as_u16(), "retryable upstream status, retrying"
            );
            tokio::time::sleep(backoff).await;
            backoff *= 2;
        }
    }

    /// `GET /api/v1/blocks/{hash}`
    pub async fn block_by_hash(
        &self,
        hash: &str,
        request_id: Option<&str>,
    ) -> Result<Option<MirrorBlock>, MirrorError> {
        self.get_json(&format!("/api/v1/blocks/{hash}"), request_id).await
    }

    /// `GET /api/v1/blocks/{number}`
    pub async fn block_by_number(
        &self,
        number: u64,
        request_id: Option<&str>,
    ) -> Result<Option<MirrorBlock>, MirrorError> {
        self.get_json(&format!("/api/v1/blocks/{number}"), request_id).await
    }

    /// `GET /api/v1/blocks?order=desc&limit=1` — the chain head.
    pub async fn latest_block(
        &self,
        request_id: Option<&str>,
    ) -> Result<Option<MirrorBlock>, MirrorError> {
        #[derive(serde::Deserialize)]
        struct Page {
            #[serde(default)]
            blocks: Vec<MirrorBlock>,
        }
        let page: Option<Page> = self
            .get_json("/api/v1/blocks?order=desc&limit=1", request_id)
            .await?;
        Ok(page.and_then(|p| p.blocks.into_iter().next()))
    }

    /// `GET /api/v1/blocks/0` — the genesis block.
    pub async fn earliest_block(
        &self,
        request_id: Option<&str>,
    ) -> Result<Option<MirrorBlock>, MirrorError> {
        self.block_by_number(0, request_id).await
    }

    /// `GET /api/v1/contracts/results/{transactionIdOrHash}`
    pub async fn contract_result(
        &self,
        id_or_hash: &str,
        request_id: Option<&str>,
    ) -> Result<Option<ContractResult>, MirrorError> {
        self.get_json(&format!("/api/v1/contracts/results/{id_or_hash}"), request_id)
            .await
    }

    /// `GET /api/v1/contracts/results` filtered by block, for reconciling a
    /// block's full transaction list.
    pub async fn contract_results_by_block(
        &self,
        block_number: u64,
        request_id: Option<&str>,
    ) -> Result<Vec<ContractResult>, MirrorError> {
        let page: Option<ContractResultsPage> = self
            .get_json(
                &format!("/api/v1/contracts/results?block.number={block_number}&limit=1000"),
                request_id,
            )
            .await?;
        Ok(page.map(|p| p.results).unwrap_or_default())
    }

    /// `GET /api/v1/contracts/results/{id}/logs`
    pub async fn contract_results_logs(
        &self,
        id_or_hash: &str,
        request_id: Option<&str>,
    ) -> Result<Vec<MirrorLog>, MirrorError> {
        let page: Option<LogsPage> = self
            .get_json(&format!("/api/v1/contracts/results/{id_or_hash}/logs"), request_id)
            .await?;
        Ok(page.map(|p| p.logs).unwrap_or_default())
    }

    /// `GET /api/v1/contracts/results/logs` filtered by address and/or
    /// timestamp range, for `eth_getLogs`.
    pub async fn logs_by_filter(
        &self,
        query: &str,
        request_id: Option<&str>,
    ) -> Result<Vec<MirrorLog>, MirrorError> {
        let page: Option<LogsPage> = self
            .get_json(&format!("/api/v1/contracts/results/logs?{query}"), request_id)
            .await?;
        Ok(page.map(|p| p.logs).unwrap_or_default())
    }

    /// `GET /api/v1/contracts/results/{id}/opcodes`
    pub async fn contract_results_opcodes(
        &self,
        id_or_hash: &str,
        query: &str,
        request_id: Option<&str>,
    ) -> Result<Option<OpcodesTraceResponse>, MirrorError> {
        let sep = if query.is_empty() { "" } else { "?" };
        self.get_json(
            &format!("/api/v1/contracts/results/{id_or_hash}/opcodes{sep}{query}"),
            request_id,
        )
        .await
    }

    /// `GET /api/v1/contracts/results/{id}/actions`
    pub async fn contract_results_actions(
        &self,
        id_or_hash: &str,
        request_id: Option<&str>,
    ) -> Result<Vec<ContractAction>, MirrorError> {
        let page: Option<ActionsPage> = self
            .get_json(&format!("/api/v1/contracts/results/{id_or_hash}/actions"), request_id)
            .await?;
        Ok(page.map(|p| p.actions).unwrap_or_default())
    }

    /// `GET /api/v1/accounts/{idOrAddress}`
    pub async fn account(
        &self,
        id_or_address: &str,
        request_id: Option<&str>,
    ) -> Result<Option<MirrorAccount>, MirrorError> {
        self.get_json(&format!("/api/v1/accounts/{id_or_address}"), request_id).await
    }

    /// `GET /api/v1/accounts/{address}?timestamp=lte:{ts}` — a historical
    /// balance lookup by reconciling transfers up to `timestamp` (§4.6.3).
    pub async fn balance_at_timestamp(
        &self,
        address: &str,
        timestamp: &str,
        request_id: Option<&str>,
    ) -> Result<Option<MirrorAccount>, MirrorError> {
        self.get_json(
            &format!("/api/v1/accounts/{address}?timestamp=lte:{timestamp}"),
            request_id,
        )
        .await
    }

    /// `GET /api/v1/accounts/{address}?transactiontype=CRYPTOTRANSFER&timestamp=gt:{timestamp}`
    /// — signed transfers affecting `address` since `timestamp`, for
    /// reconciling a historical balance within the refresh window (§4.6.5).
    pub async fn transfers_after(
        &self,
        address: &str,
        timestamp: &str,
        request_id: Option<&str>,
    ) -> Result<Vec<Transfer>, MirrorError> {
        let page: Option<TransfersPage> = self
            .get_json(
                &format!(
                    "/api/v1/accounts/{address}?transactiontype=CRYPTOTRANSFER&timestamp=gt:{timestamp}&limit=1000"
                ),
                request_id,
            )
            .await?;
        Ok(page.map(|p| p.transactions).unwrap_or_default())
    }

    /// `GET /api/v1/contracts/{address}/state?slot={slot}[&timestamp={ts}]`
    pub async fn contract_state_by_address_and_slot(
        &self,
        address: &str,
        slot: &str,
        timestamp: Option<&str>,
        request_id: Option<&str>,
    ) -> Result<Option<ContractState>, MirrorError> {
        let ts_query = timestamp.map(|t| format!("&timestamp={t}")).unwrap_or_default();
        self.get_json(
            &format!("/api/v1/contracts/{address}/state?slot={slot}{ts_query}"),
            request_id,
        )
        .await
    }

    /// `GET /api/v1/contracts/{address}` — runtime bytecode and metadata,
    /// without a slot lookup.
    pub async fn contract_state(
        &self,
        address: &str,
        request_id: Option<&str>,
    ) -> Result<Option<ContractState>, MirrorError> {
        self.get_json(&format!("/api/v1/contracts/{address}"), request_id).await
    }

    /// `GET /api/v1/contracts/{address}/state?timestamp={ts}` — every slot
    /// the mirror holds for `address` as of `timestamp`, for the prestate
    /// tracer's `storage` map (§4.7).
    pub async fn contract_storage(
        &self,
        address: &str,
        timestamp: Option<&str>,
        request_id: Option<&str>,
    ) -> Result<Vec<ContractStorageSlot>, MirrorError> {
        let ts_query = timestamp.map(|t| format!("?timestamp={t}")).unwrap_or_default();
        let page: Option<ContractStoragePage> = self
            .get_json(&format!("/api/v1/contracts/{address}/state{ts_query}"), request_id)
            .await?;
        Ok(page.map(|p| p.state).unwrap_or_default())
    }

    /// `GET /api/v1/contracts/results?from={address}&timestamp=lte:{ts}&order=desc&limit={limit}`
    /// — the most recent contract results sent by `address` at or before
    /// `timestamp`, for historical nonce reconciliation (§4.6.5).
    pub async fn contract_results_by_sender(
        &self,
        address: &str,
        at_or_before_timestamp: &str,
        limit: u32,
        request_id: Option<&str>,
    ) -> Result<Vec<ContractResult>, MirrorError> {
        let page: Option<ContractResultsPage> = self
            .get_json(
                &format!(
                    "/api/v1/contracts/results?from={address}&timestamp=lte:{at_or_before_timestamp}&order=desc&limit={limit}"
                ),
                request_id,
            )
            .await?;
        Ok(page.map(|p| p.results).unwrap_or_default())
    }

    /// `GET /api/v1/network/fees`
    pub async fn network_fees(
        &self,
        request_id: Option<&str>,
    ) -> Result<Option<NetworkFees>, MirrorError> {
        self.get_json("/api/v1/network/fees", request_id).await
    }

    /// `GET /api/v1/network/exchangerate`
    pub async fn network_exchange_rate(
        &self,
        request_id: Option<&str>,
    ) -> Result<Option<ExchangeRate>, MirrorError> {
        self.get_json("/api/v1/network/exchangerate", request_id).await
    }

    /// `POST /api/v1/contracts/call` — executes `body` against the mirror's
    /// EVM simulation (§4.6.6). Unlike [`get_json`](Self::get_json), a
    /// non-2xx response isn't necessarily a terminal failure: the mirror
    /// reports contract reverts and validation failures as structured
    /// `4xx` bodies the caller needs to inspect, so those are returned as
    /// `Ok(ContractCallOutcome::Failed { .. })` rather than `Err`. Only
    /// transport failures and a retry-budget exhaustion against `429`/`5xx`
    /// responses surface as `Err`.
    pub async fn contract_call(
        &self,
        body: &serde_json::Value,
        request_id: Option<&str>,
    ) -> Result<ContractCallOutcome, MirrorError> {
        let url = format!("{}/api/v1/contracts/call", self.base);
        let start = std::time::Instant::now();
        let mut attempt = 0u32;
        let mut backoff = self.retry.base_backoff;

        loop {
            attempt += 1;
            if start.elapsed() >= self.retry.deadline {
                return Err(MirrorError::Deadline);
            }

            let mut req = self.inner.post(&url).json(body);
            if let Some(id) = request_id {
                req = req.header("X-Request-Id", id);
            }

            let resp = match req.send().await {
                Ok(resp) => resp,
                Err(e) => {
                    if attempt >= self.retry.max_attempts || start.elapsed() >= self.retry.deadline
                    {
                        return Err(MirrorError::Transport(e.to_string()));
                    }
                    warn!(target: "gateway-mirror", attempt, "transport error, retrying: {e}");
                    tokio::time::sleep(backoff).await;
                    backoff *= 2;
                    continue;
                }
            };

            let status = resp.status();
            let bytes = resp.bytes().await.map_err(|e| MirrorError::Decode(e.to_string()))?;

            if status.is_success() {
                let parsed: ContractCallResult =
                    serde_json::from_slice(&bytes).map_err(|e| MirrorError::Decode(e.to_string()))?;
                return Ok(ContractCallOutcome::Success(parsed.result.unwrap_or_default()));
            }

            let retryable = status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error();
            if retryable && attempt < self.retry.max_attempts && start.elapsed() < self.retry.deadline
            {
                warn!(
                    target: "gateway-mirror",
                    attempt, status = status.as_u16(), "retryable upstream status, retrying"
                );
                tokio::time::sleep(backoff).await;
                backoff *= 2;
                continue;
            }

            let error_body: ContractCallErrorBody = serde_json::from_slice(&bytes).unwrap_or_default();
            let message = error_body.status.and_then(|s| s.messages.into_iter().next());
            return Ok(ContractCallOutcome::Failed { status: status.as_u16(), message });
        }
    }
}
