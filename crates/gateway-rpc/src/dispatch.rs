//! The dispatcher (§4.5 "Dispatch").

use crate::params::{
    parse_block_param, validate_address, validate_get_logs_params, validate_hex,
    validate_tracer_wrapper, validate_transaction_call_object, validate_transaction_hash,
    validate_transaction_hash_or_id, TracerKind,
};
use crate::registry::{ParamLayout, ParamSpec, ParamType, Registry, UnknownMethodClass};
use futures::future::BoxFuture;
use gateway_cache::{Cache, SharedCache};
use gateway_errors::{GatewayError, RequestContext};
use gateway_ratelimit::{RateLimitStore, RateLimiter};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;
use tracing::info;

/// A registered method's handler: takes the request's raw params (already
/// schema-validated, but not yet rearranged) and the request context,
/// returns a JSON result or a typed [`GatewayError`].
///
/// Handlers re-parse their own params via the `params` module helpers
/// rather than receiving pre-typed arguments — this keeps the dispatcher
/// generic over every method's distinct parameter shape (§9 "Decorator-
/// stamped metadata").
pub type Handler =
    Arc<dyn Fn(&[Value], RequestContext) -> BoxFuture<'static, Result<Value, GatewayError>> + Send + Sync>;

/// The dispatcher: owns the immutable registry plus the two mutable,
/// process-wide substrates (cache, rate limiter) every dispatched call
/// consults (§5 "Shared state").
pub struct Dispatcher<S: SharedCache, RS: RateLimitStore> {
    registry: Registry,
    handlers: HashMap<&'static str, Handler>,
    cache: Cache<S>,
    rate_limiter: RateLimiter<RS>,
}

impl<S: SharedCache, RS: RateLimitStore> Dispatcher<S, RS> {
    /// Builds a dispatcher from a populated registry, handler table, and
    /// the two shared substrates.
    pub fn new(
        registry: Registry,
        handlers: HashMap<&'static str, Handler>,
        cache: Cache<S>,
        rate_limiter: RateLimiter<RS>,
    ) -> Self {
        Self { registry, handlers, cache, rate_limiter }
    }

    /// Whether `method` may appear inside a batch request (§6). Unknown
    /// methods are allowed here — the dispatcher itself rejects them with
    /// the usual unknown-method classification once invoked.
    pub fn is_allowed_in_batch(&self, method: &str) -> bool {
        self.registry.get(method).map(|d| d.allowed_in_batch).unwrap_or(true)
    }

    /// Dispatches one JSON-RPC call (§4.5 steps 1-7).
    pub async fn dispatch(
        &self,
        method: &str,
        params: Vec<Value>,
        ctx: RequestContext,
        default_rate_limit: u64,
    ) -> Result<Value, GatewayError> {
        let started = Instant::now();
        let result = self.dispatch_inner(method, params, &ctx, default_rate_limit).await;
        info!(
            target: "gateway-rpc",
            method,
            request_id = %ctx.request_id,
            duration_ms = started.elapsed().as_millis() as u64,
            outcome = if result.is_ok() { "ok" } else { "error" },
            "dispatched"
        );
        result
    }

    async fn dispatch_inner(
        &self,
        method: &str,
        params: Vec<Value>,
        ctx: &RequestContext,
        default_rate_limit: u64,
    ) -> Result<Value, GatewayError> {
        // Step 1: registry lookup / unknown-method classification.
        let descriptor = match self.registry.get(method) {
            Some(d) => d,
            None => {
                return Err(match Registry::classify_unknown(method) {
                    UnknownMethodClass::IntentionallyUnsupported => GatewayError::UnsupportedMethod,
                    UnknownMethodClass::NotYetImplemented => {
                        GatewayError::NotYetImplemented(method.to_string())
                    }
                    UnknownMethodClass::MethodNotFound => {
                        GatewayError::MethodNotFound(method.to_string())
                    }
                });
            }
        };

        // Step 2: schema validation.
        if !descriptor.allow_extra_params && params.len() > descriptor.params.len() {
            return Err(GatewayError::InvalidParams(format!(
                "{method} accepts at most {} parameters",
                descriptor.params.len()
            )));
        }
        for (i, spec) in descriptor.params.iter().enumerate() {
            let value = params.get(i);
            match value {
                Some(v) if !v.is_null() => {
                    validate_one(spec, v).map_err(|e| {
                        spec.custom_error
                            .map(|m| GatewayError::InvalidParams(m.to_string()))
                            .unwrap_or(e)
                    })?;
                }
                _ if spec.required => {
                    return Err(spec
                        .custom_error
                        .map(|m| GatewayError::InvalidParams(m.to_string()))
                        .unwrap_or_else(|| {
                            GatewayError::InvalidParams(format!(
                                "missing required parameter {i} for {method}"
                            ))
                        }));
                }
                _ => {}
            }
        }

        // Step 3: cache lookup.
        let cache_key = descriptor
            .cache_policy
            .as_ref()
            .map(|policy| {
                let args: Vec<String> = params.iter().map(value_to_cache_arg).collect();
                let arg_refs: Vec<&str> = args.iter().map(String::as_str).collect();
                let disabled = policy.is_disabled_for(&arg_refs);
                (gateway_cache::key::build(method, &arg_refs), disabled)
            });
        if let Some((key, disabled)) = &cache_key {
            if !disabled {
                if let Some(policy) = &descriptor.cache_policy {
                    if let Some(hit) = self.cache.get(policy, key).await {
                        return Ok(hit);
                    }
                }
            }
        }

        // Step 4: rate limiting.
        let threshold = descriptor.rate_limit_threshold.unwrap_or(default_rate_limit);
        if self.rate_limiter.should_rate_limit(&ctx.client_ip, method, threshold).await {
            return Err(GatewayError::RateLimitExceeded { method: method.to_string() });
        }

        // Step 5: parameter layout.
        let handler_params: &[Value] = match descriptor.layout {
            ParamLayout::AppendContext => &params,
            ParamLayout::ContextOnly => &[],
        };

        // Step 6: invoke.
        let handler = self
            .handlers
            .get(method)
            .ok_or_else(|| GatewayError::Internal(format!("no handler registered for {method}")))?;
        let result = handler(handler_params, ctx.clone()).await?;

        // Step 3 (write-back): populate the cache on success.
        if let Some((key, disabled)) = &cache_key {
            if !disabled {
                if let Some(policy) = &descriptor.cache_policy {
                    self.cache.set(policy, key, result.clone()).await;
                }
            }
        }

        Ok(result)
    }
}

/// Stringifies a JSON param for use as a cache-key argument (§4.2 "L1").
fn value_to_cache_arg(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn validate_one(spec: &ParamSpec, value: &Value) -> Result<(), GatewayError> {
    match spec.kind {
        ParamType::Address => validate_address(value).map(drop),
        ParamType::Hex => validate_hex(value).map(drop),
        ParamType::Boolean => value
            .as_bool()
            .map(drop)
            .ok_or_else(|| GatewayError::InvalidParams("expected a boolean".to_string())),
        ParamType::BlockNumber => parse_block_param(value).map(drop),
        ParamType::BlockNumberOrHash => parse_block_param(value).map(drop),
        ParamType::TransactionHash => validate_transaction_hash(value).map(drop),
        ParamType::TransactionHashOrId => validate_transaction_hash_or_id(value).map(drop),
        ParamType::TransactionCallObject => validate_transaction_call_object(value).map(drop),
        ParamType::GetLogsParams => validate_get_logs_params(value).map(drop),
        ParamType::TracerConfigWrapper => {
            validate_tracer_wrapper(Some(value), TracerKind::OpcodeLogger).map(drop)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::MethodDescriptor;
    use gateway_cache::InMemorySharedCache;
    use gateway_ratelimit::InMemoryStore;
    use std::time::Duration;

    fn context() -> RequestContext {
        RequestContext::new("req-1", "1.2.3.4")
    }

    fn build_dispatcher() -> Dispatcher<InMemorySharedCache, InMemoryStore> {
        let mut registry = Registry::default();
        registry.register(MethodDescriptor::new("eth_chainId", vec![]));
        registry.register(
            MethodDescriptor::new("eth_getBalance", vec![ParamSpec::required(ParamType::Address)])
                .cache(gateway_cache::CachePolicy::l1(Duration::from_secs(30))),
        );

        let mut handlers: HashMap<&'static str, Handler> = HashMap::new();
        handlers.insert(
            "eth_chainId",
            Arc::new(|_params, _ctx| Box::pin(async { Ok(Value::String("0x12a".to_string())) })),
        );
        handlers.insert(
            "eth_getBalance",
            Arc::new(|_params, _ctx| Box::pin(async { Ok(Value::String("0x64".to_string())) })),
        );

        Dispatcher::new(
            registry,
            handlers,
            Cache::new(64, None),
            RateLimiter::new(InMemoryStore::default(), Duration::from_secs(60)),
        )
    }

    #[tokio::test]
    async fn dispatches_registered_method() {
        let dispatcher = build_dispatcher();
        let result = dispatcher.dispatch("eth_chainId", vec![], context(), 100).await.unwrap();
        assert_eq!(result, Value::String("0x12a".to_string()));
    }

    #[tokio::test]
    async fn unknown_method_is_method_not_found() {
        let dispatcher = build_dispatcher();
        let err = dispatcher.dispatch("eth_bogus", vec![], context(), 100).await.unwrap_err();
        assert!(matches!(err, GatewayError::MethodNotFound(_)));
    }

    #[tokio::test]
    async fn engine_namespace_is_unsupported() {
        let dispatcher = build_dispatcher();
        let err = dispatcher.dispatch("engine_newPayload", vec![], context(), 100).await.unwrap_err();
        assert!(matches!(err, GatewayError::UnsupportedMethod));
    }

    #[tokio::test]
    async fn debug_namespace_is_not_yet_implemented() {
        let dispatcher = build_dispatcher();
        let err =
            dispatcher.dispatch("debug_traceCall", vec![], context(), 100).await.unwrap_err();
        assert!(matches!(err, GatewayError::NotYetImplemented(_)));
    }

    #[tokio::test]
    async fn rejects_missing_required_param() {
        let dispatcher = build_dispatcher();
        let err = dispatcher.dispatch("eth_getBalance", vec![], context(), 100).await.unwrap_err();
        assert!(matches!(err, GatewayError::InvalidParams(_)));
    }

    #[tokio::test]
    async fn caches_successful_response() {
        let dispatcher = build_dispatcher();
        let addr = Value::String("0x".to_string() + &"ab".repeat(20));
        let first = dispatcher
            .dispatch("eth_getBalance", vec![addr.clone()], context(), 100)
            .await
            .unwrap();
        let second =
            dispatcher.dispatch("eth_getBalance", vec![addr], context(), 100).await.unwrap();
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn rate_limit_exceeded_after_threshold() {
        let dispatcher = build_dispatcher();
        for _ in 0..3 {
            dispatcher.dispatch("eth_chainId", vec![], context(), 3).await.unwrap();
        }
        let err = dispatcher.dispatch("eth_chainId", vec![], context(), 3).await.unwrap_err();
        assert!(matches!(err, GatewayError::RateLimitExceeded { .. }));
    }
}
