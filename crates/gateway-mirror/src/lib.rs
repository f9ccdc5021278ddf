#![doc = "Typed REST client for the mirror collaborator (§4.4)."]
#![warn(missing_debug_implementations, missing_docs, rustdoc::all)]
#![deny(unused_must_use, rust_2018_idioms)]

mod client;
mod resolve;
pub mod types;

pub use client::{MirrorClient, MirrorError, RetryConfig};
pub use types::{
    AccountBalance, ActionsPage, ContractAction, ContractCallErrorMessage, ContractCallOutcome,
    ContractCallResult, ContractResult, ContractResultsPage, ContractState, ContractStoragePage,
    ContractStorageSlot, EntityKind, ExchangeRate, LogsPage, MirrorAccount, MirrorBlock,
    MirrorLog, NetworkFee, NetworkFees, OpcodeTraceEntry, OpcodesTraceResponse, ResolvedEntity,
    TimestampRange, Transfer, TransfersPage,
};

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client(base: String) -> MirrorClient {
        MirrorClient::new(
            base,
            reqwest::Client::new(),
            RetryConfig {
                max_attempts: 3,
                deadline: Duration::from_secs(2),
                base_backoff: Duration::from_millis(1),
            },
        )
    }

    #[tokio::test]
    async fn not_found_maps_to_none() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v1/blocks/999"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let block = client(server.uri()).block_by_number(999, None).await.unwrap();
        assert!(block.is_none());
    }

    #[tokio::test]
    async fn retries_on_server_error_then_succeeds() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v1/blocks/1"))
            .respond_with(ResponseTemplate::new(503))
            .up_to_n_times(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/v1/blocks/1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "hash": "0xabc",
                "number": 1,
                "timestamp": {"from": "1.0", "to": "2.0"}
            })))
            .mount(&server)
            .await;

        let block = client(server.uri()).block_by_number(1, None).await.unwrap();
        assert_eq!(block.unwrap().number, 1);
    }

    #[tokio::test]
    async fn exhausts_retry_budget_on_persistent_failure() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v1/blocks/1"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let err = client(server.uri()).block_by_number(1, None).await.unwrap_err();
        assert!(matches!(err, MirrorError::Upstream { status: 500 }));
    }

    #[tokio::test]
    async fn non_retryable_client_error_is_terminal_on_first_attempt() {
        let server = MockServer::start().await;
        let mock = Mock::given(method("GET"))
            .and(path("/api/v1/blocks/1"))
            .respond_with(ResponseTemplate::new(400))
            .expect(1)
            .mount_as_scoped(&server)
            .await;

        let err = client(server.uri()).block_by_number(1, None).await.unwrap_err();
        assert!(matches!(err, MirrorError::Upstream { status: 400 }));
        drop(mock);
    }

    #[tokio::test]
    async fn latest_block_picks_first_page_entry() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v1/blocks"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "blocks": [{"hash": "0xhead", "number": 42, "timestamp": {"from": "10.0", "to": ""}}]
            })))
            .mount(&server)
            .await;

        let block = client(server.uri()).latest_block(None).await.unwrap().unwrap();
        assert_eq!(block.number, 42);
    }
}
