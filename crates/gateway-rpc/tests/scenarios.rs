//! End-to-end dispatch scenarios driven through the real [`Dispatcher`],
//! covering the gateway's literal worked examples: constant methods,
//! the unsupported-method path, the call tracer, and rate limiting.

use gateway_cache::{Cache, InMemorySharedCache};
use gateway_consensus::InMemoryConsensusClient;
use gateway_errors::{GatewayError, RequestContext};
use gateway_mirror::{MirrorClient, RetryConfig};
use gateway_ratelimit::{InMemoryStore, RateLimiter};
use gateway_rpc::{build_handlers, build_registry, Dispatcher, EthContext, GatewayConfig};
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn ctx(client_ip: &str) -> RequestContext {
    RequestContext::new("req-1", client_ip)
}

async fn dispatcher_with_mirror(
    mirror_base: String,
    config: GatewayConfig,
) -> Dispatcher<InMemorySharedCache, InMemoryStore> {
    let config = Arc::new(config);
    let mirror = Arc::new(MirrorClient::new(mirror_base, reqwest::Client::new(), RetryConfig::default()));
    let consensus = Arc::new(InMemoryConsensusClient::new());
    let eth_ctx = EthContext {
        mirror,
        consensus: consensus.clone(),
        files: consensus,
        config: config.clone(),
    };

    let registry = build_registry(&config);
    let handlers = build_handlers(eth_ctx);
    let cache = Cache::new(64, None);
    let rate_limiter = RateLimiter::new(InMemoryStore::default(), config.rate_limit_window);
    Dispatcher::new(registry, handlers, cache, rate_limiter)
}

fn dispatcher_no_mirror(config: GatewayConfig) -> Dispatcher<InMemorySharedCache, InMemoryStore> {
    let config = Arc::new(config);
    let mirror = Arc::new(MirrorClient::new("http://unused.invalid", reqwest::Client::new(), RetryConfig::default()));
    let consensus = Arc::new(InMemoryConsensusClient::new());
    let eth_ctx = EthContext {
        mirror,
        consensus: consensus.clone(),
        files: consensus,
        config: config.clone(),
    };

    let registry = build_registry(&config);
    let handlers = build_handlers(eth_ctx);
    let cache = Cache::new(64, None);
    let rate_limiter = RateLimiter::new(InMemoryStore::default(), config.rate_limit_window);
    Dispatcher::new(registry, handlers, cache, rate_limiter)
}

#[tokio::test]
async fn chain_id_matches_configured_value() {
    let dispatcher = dispatcher_no_mirror(GatewayConfig::default());
    let result =
        dispatcher.dispatch("eth_chainId", vec![], ctx("1.1.1.1"), 200).await.unwrap();
    assert_eq!(result, Value::String("0x12a".to_string()));
}

#[tokio::test]
async fn uncle_family_is_always_empty() {
    let dispatcher = dispatcher_no_mirror(GatewayConfig::default());

    let count = dispatcher
        .dispatch("eth_getUncleCountByBlockNumber", vec![json!("latest")], ctx("1.1.1.1"), 200)
        .await
        .unwrap();
    assert_eq!(count, Value::String("0x0".to_string()));

    let uncle = dispatcher
        .dispatch(
            "eth_getUncleByBlockHashAndIndex",
            vec![json!("0x".to_string() + &"11".repeat(32)), json!("0x0")],
            ctx("1.1.1.1"),
            200,
        )
        .await
        .unwrap();
    assert_eq!(uncle, Value::Null);
}

#[tokio::test]
async fn accounts_is_always_empty() {
    let dispatcher = dispatcher_no_mirror(GatewayConfig::default());
    let result = dispatcher.dispatch("eth_accounts", vec![], ctx("1.1.1.1"), 200).await.unwrap();
    assert_eq!(result, Value::Array(vec![]));
}

#[tokio::test]
async fn unsupported_method_reports_unsupported() {
    let dispatcher = dispatcher_no_mirror(GatewayConfig::default());
    let err = dispatcher.dispatch("eth_getWork", vec![], ctx("1.1.1.1"), 200).await.unwrap_err();
    assert!(matches!(err, GatewayError::UnsupportedMethod));
    assert_eq!(err.code(), -32601);
    assert_eq!(err.to_string(), "Unsupported JSON-RPC method");
}

#[tokio::test]
async fn call_tracer_nests_child_calls_unless_top_call_only() {
    let server = MockServer::start().await;
    let tx_hash = "0x".to_string() + &"aa".repeat(32);

    Mock::given(method("GET"))
        .and(path(format!("/api/v1/contracts/results/{tx_hash}/actions")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "actions": [
                {
                    "call_type": "CREATE",
                    "call_depth": 0,
                    "caller": "0x000000000000000000000000000000000000aaa",
                    "recipient": "0x000000000000000000000000000000000000bbb",
                    "value": 0,
                    "gas": 0x493e0,
                    "gas_used": 0x3a980,
                    "input": "0x1",
                    "output": "0x2"
                },
                {
                    "call_type": "CREATE",
                    "call_depth": 1,
                    "caller": "0x000000000000000000000000000000000000bbb",
                    "recipient": "0x000000000000000000000000000000000000ccc",
                    "value": 0,
                    "gas": 0x2e525,
                    "gas_used": 0x4b
                }
            ]
        })))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path(format!("/api/v1/contracts/results/{tx_hash}")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "hash": tx_hash,
            "from": "0x000000000000000000000000000000000000aaa",
            "function_parameters": "0x1",
            "call_result": "0x2",
            "result": "SUCCESS"
        })))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/api/v1/contracts/0x000000000000000000000000000000000000ccc"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "runtime_bytecode": "0xdeadbeef"
        })))
        .mount(&server)
        .await;

    let config = GatewayConfig { debug_api_enabled: true, ..GatewayConfig::default() };
    let dispatcher = dispatcher_with_mirror(server.uri(), config).await;

    let nested = dispatcher
        .dispatch(
            "debug_traceTransaction",
            vec![json!(tx_hash), json!({ "tracer": "callTracer" })],
            ctx("1.1.1.1"),
            200,
        )
        .await
        .unwrap();
    assert_eq!(nested["type"], json!("CREATE"));
    let calls = nested["calls"].as_array().expect("calls present");
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0]["to"], json!("0x000000000000000000000000000000000000ccc"));

    let top_only = dispatcher
        .dispatch(
            "debug_traceTransaction",
            vec![json!(tx_hash), json!({ "tracer": "callTracer", "tracerConfig": { "onlyTopCall": true } })],
            ctx("1.1.1.1"),
            200,
        )
        .await
        .unwrap();
    assert_eq!(top_only["type"], json!("CREATE"));
    assert!(top_only.get("calls").is_none());
}

#[tokio::test]
async fn rate_limiter_rejects_past_threshold_independently_per_client() {
    let dispatcher = dispatcher_no_mirror(GatewayConfig::default());

    for _ in 0..3 {
        let result = dispatcher.dispatch("eth_chainId", vec![], ctx("9.9.9.1"), 3).await;
        assert!(result.is_ok());
    }
    let fourth = dispatcher.dispatch("eth_chainId", vec![], ctx("9.9.9.1"), 3).await;
    let err = fourth.unwrap_err();
    assert!(matches!(err, GatewayError::RateLimitExceeded { .. }));
    assert_eq!(err.code(), -32605);
    assert_eq!(err.http_status(), 429);

    let other_client = dispatcher.dispatch("eth_chainId", vec![], ctx("9.9.9.2"), 3).await;
    assert!(other_client.is_ok());
}
