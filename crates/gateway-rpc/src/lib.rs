#![doc = "Method registry, dispatcher, eth read/write services, and debug tracing for the JSON-RPC gateway."]
#![warn(missing_debug_implementations, rustdoc::all)]
#![deny(unused_must_use, rust_2018_idioms)]

pub mod config;
pub mod debug;
pub mod dispatch;
pub mod eth;
pub mod params;
pub mod registry;
mod util;

pub use config::GatewayConfig;
pub use dispatch::{Dispatcher, Handler};
pub use eth::EthContext;
pub use registry::{MethodDescriptor, ParamLayout, ParamSpec, ParamType, Registry, UnknownMethodClass};

use futures::future::BoxFuture;
use gateway_cache::CachePolicy;
use gateway_errors::{GatewayError, RequestContext};
use params::{parse_block_param, BlockParam, BlockTag, TracerKind};
use serde::Serialize;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;

/// The set of JSON-RPC method names the gateway returns `UNSUPPORTED_METHOD`
/// for deterministically, rather than `METHOD_NOT_FOUND` (§6 "Supported
/// method set").
const DETERMINISTICALLY_UNSUPPORTED: &[&str] = &[
    "eth_sendTransaction",
    "eth_sign",
    "eth_signTransaction",
    "eth_coinbase",
    "eth_getWork",
    "eth_submitWork",
    "eth_submitHashrate",
    "eth_protocolVersion",
    "eth_newPendingTransactionFilter",
];

/// Serializes `value` into a JSON-RPC result, failing internally rather
/// than panicking if a handler's own type can't serialize.
fn json<T: Serialize>(value: T) -> Result<Value, GatewayError> {
    serde_json::to_value(value).map_err(|e| GatewayError::Internal(format!("result serialization failed: {e}")))
}

fn quantity_param(value: &Value) -> Result<u64, GatewayError> {
    let s = value.as_str().ok_or_else(|| GatewayError::InvalidParams("expected a hex quantity".to_string()))?;
    let digits = s.strip_prefix("0x").ok_or_else(|| GatewayError::InvalidParams(format!("invalid quantity: {s}")))?;
    u64::from_str_radix(digits, 16).map_err(|_| GatewayError::InvalidParams(format!("invalid quantity: {s}")))
}

/// Builds the immutable method registry (§4.5 "Dispatcher & registry", §6
/// "Supported method set"). Call once at process start.
pub fn build_registry(config: &GatewayConfig) -> Registry {
    use registry::{ParamLayout::*, ParamType::*};

    let mut r = Registry::default();

    // Methods the gateway deterministically refuses rather than executes
    // (§6 "Supported method set", the unsupported-method subset).
    for &name in DETERMINISTICALLY_UNSUPPORTED {
        r.register(MethodDescriptor::new(name, vec![]).layout(ContextOnly).allow_extra_params());
    }

    // Constant / near-constant methods: no user params.
    for name in [
        "web3_clientVersion",
        "web3_sha3",
        "net_listening",
        "net_version",
        "eth_chainId",
        "eth_syncing",
        "eth_mining",
        "eth_hashrate",
        "eth_accounts",
        "eth_blockNumber",
        "eth_maxPriorityFeePerGas",
        "eth_getUncleCountByBlockHash",
        "eth_getUncleCountByBlockNumber",
        "eth_getUncleByBlockHashAndIndex",
        "eth_getUncleByBlockNumberAndIndex",
    ] {
        r.register(MethodDescriptor::new(name, vec![]).layout(ContextOnly));
    }
    // `web3_sha3` takes one hex param but has no context dependency; give it
    // its own entry rather than folding it into the `ContextOnly` loop above.
    r.register(MethodDescriptor::new("web3_sha3", vec![ParamSpec::required(Hex)]));

    r.register(
        MethodDescriptor::new("eth_gasPrice", vec![]).cache(CachePolicy::l1(config.short_cache_ttl)),
    );

    r.register(
        MethodDescriptor::new(
            "eth_getBalance",
            vec![ParamSpec::required(Address), ParamSpec::optional(BlockNumberOrHash)],
        )
        .cache(
            CachePolicy::l1(config.default_cache_ttl)
                .disable_for(1, "latest")
                .disable_for(1, "pending"),
        ),
    );

    r.register(
        MethodDescriptor::new(
            "eth_getTransactionCount",
            vec![ParamSpec::required(Address), ParamSpec::optional(BlockNumberOrHash)],
        )
        .cache(
            CachePolicy::l1(config.default_cache_ttl)
                .disable_for(1, "latest")
                .disable_for(1, "pending"),
        ),
    );

    r.register(
        MethodDescriptor::new(
            "eth_getCode",
            vec![ParamSpec::required(Address), ParamSpec::optional(BlockNumberOrHash)],
        )
        .cache(
            CachePolicy::l1(config.default_cache_ttl)
                .disable_for(1, "latest")
                .disable_for(1, "pending"),
        ),
    );

    r.register(
        MethodDescriptor::new(
            "eth_getStorageAt",
            vec![
                ParamSpec::required(Address),
                ParamSpec::required(Hex),
                ParamSpec::optional(BlockNumberOrHash),
            ],
        )
        .cache(
            CachePolicy::l1(config.default_cache_ttl)
                .disable_for(2, "latest")
                .disable_for(2, "pending"),
        ),
    );

    r.register(
        MethodDescriptor::new(
            "eth_getBlockByHash",
            vec![ParamSpec::required(Hex), ParamSpec::optional(Boolean)],
        )
        .cache(CachePolicy::l1(config.default_cache_ttl)),
    );
    r.register(
        MethodDescriptor::new(
            "eth_getBlockByNumber",
            vec![ParamSpec::required(BlockNumber), ParamSpec::optional(Boolean)],
        )
        .cache(
            CachePolicy::l1(config.default_cache_ttl)
                .disable_for(0, "latest")
                .disable_for(0, "pending"),
        ),
    );
    r.register(
        MethodDescriptor::new("eth_getBlockTransactionCountByHash", vec![ParamSpec::required(Hex)])
            .cache(CachePolicy::l1(config.default_cache_ttl)),
    );
    r.register(
        MethodDescriptor::new(
            "eth_getBlockTransactionCountByNumber",
            vec![ParamSpec::required(BlockNumber)],
        )
        .cache(
            CachePolicy::l1(config.default_cache_ttl)
                .disable_for(0, "latest")
                .disable_for(0, "pending"),
        ),
    );
    r.register(
        MethodDescriptor::new("eth_getBlockReceipts", vec![ParamSpec::required(BlockNumberOrHash)])
            .cache(
                CachePolicy::l1(config.default_cache_ttl)
                    .disable_for(0, "latest")
                    .disable_for(0, "pending"),
            ),
    );

    r.register(
        MethodDescriptor::new("eth_getTransactionByHash", vec![ParamSpec::required(TransactionHashOrId)])
            .cache(CachePolicy::l1(config.default_cache_ttl)),
    );
    r.register(
        MethodDescriptor::new(
            "eth_getTransactionByBlockHashAndIndex",
            vec![ParamSpec::required(Hex), ParamSpec::required(Hex)],
        )
        .cache(CachePolicy::l1(config.default_cache_ttl)),
    );
    r.register(
        MethodDescriptor::new(
            "eth_getTransactionByBlockNumberAndIndex",
            vec![ParamSpec::required(BlockNumber), ParamSpec::required(Hex)],
        )
        .cache(
            CachePolicy::l1(config.default_cache_ttl)
                .disable_for(0, "latest")
                .disable_for(0, "pending"),
        ),
    );
    r.register(
        MethodDescriptor::new(
            "eth_getTransactionReceipt",
            vec![ParamSpec::required(TransactionHashOrId)],
        )
        .cache(CachePolicy::l1(config.default_cache_ttl)),
    );

    r.register(MethodDescriptor::new(
        "eth_getLogs",
        vec![ParamSpec::required(GetLogsParams)],
    ));

    r.register(
        MethodDescriptor::new(
            "eth_call",
            vec![
                ParamSpec::required(TransactionCallObject),
                ParamSpec::optional(BlockNumberOrHash),
            ],
        )
        .cache(CachePolicy::l1(config.short_cache_ttl)),
    );
    r.register(
        MethodDescriptor::new(
            "eth_estimateGas",
            vec![
                ParamSpec::required(TransactionCallObject),
                ParamSpec::optional(BlockNumberOrHash),
            ],
        )
        .cache(CachePolicy::l1(config.short_cache_ttl)),
    );

    r.register(MethodDescriptor::new(
        "eth_sendRawTransaction",
        vec![ParamSpec::required(Hex)],
    ).disallow_in_batch());

    r.register(
        MethodDescriptor::new(
            "eth_feeHistory",
            vec![ParamSpec::required(Hex), ParamSpec::required(BlockNumber)],
        )
        .allow_extra_params(),
    );

    r.register(
        MethodDescriptor::new(
            "debug_traceTransaction",
            vec![
                ParamSpec::required(TransactionHashOrId),
                ParamSpec::optional(TracerConfigWrapper),
            ],
        )
        .cache(CachePolicy::l1(config.default_cache_ttl))
        .disallow_in_batch(),
    );
    r.register(
        MethodDescriptor::new(
            "debug_traceBlockByNumber",
            vec![ParamSpec::required(BlockNumber), ParamSpec::optional(TracerConfigWrapper)],
        )
        .cache(
            CachePolicy::l1(config.default_cache_ttl)
                .disable_for(0, "latest")
                .disable_for(0, "pending"),
        )
        .disallow_in_batch(),
    );

    r
}

/// Builds the handler table matching every method [`build_registry`]
/// registers, closing over `ctx` (§4.6, §4.7).
pub fn build_handlers(ctx: EthContext) -> HashMap<&'static str, Handler> {
    let mut h: HashMap<&'static str, Handler> = HashMap::new();

    for &name in DETERMINISTICALLY_UNSUPPORTED {
        h.insert(
            name,
            Arc::new(|_params: &[Value], _ctx: RequestContext| {
                Box::pin(async { Err(GatewayError::UnsupportedMethod) }) as BoxFuture<'static, _>
            }) as Handler,
        );
    }

    macro_rules! insert {
        ($name:expr, |$params:ident, $rctx:ident| $body:expr) => {{
            let ctx = ctx.clone();
            h.insert(
                $name,
                Arc::new(move |params: &[Value], request_ctx: RequestContext| {
                    let ctx = ctx.clone();
                    let $params = params.to_vec();
                    let $rctx = request_ctx;
                    let fut: BoxFuture<'static, Result<Value, GatewayError>> =
                        Box::pin(async move {
                            let ctx = ctx;
                            $body
                        });
                    fut
                }) as Handler,
            );
        }};
    }

    insert!("web3_clientVersion", |_p, _c| json(eth::client_version()));
    insert!("web3_sha3", |p, _c| {
        let data = p[0].as_str().ok_or_else(|| GatewayError::InvalidParams("expected hex data".to_string()))?;
        json(eth::sha3(data))
    });
    insert!("net_listening", |_p, _c| json(eth::net_listening()));
    insert!("net_version", |_p, _c| json(eth::net_version(&ctx)));
    insert!("eth_chainId", |_p, _c| json(eth::chain_id(&ctx)));
    insert!("eth_blockNumber", |_p, _c| json(eth::block_number(&ctx).await?));
    insert!("eth_gasPrice", |_p, _c| json(eth::gas_price(&ctx).await?));
    insert!("eth_syncing", |_p, _c| json(eth::syncing()));
    insert!("eth_mining", |_p, _c| json(eth::mining()));
    insert!("eth_hashrate", |_p, _c| json(eth::hashrate()));
    insert!("eth_accounts", |_p, _c| json(eth::accounts()));
    insert!("eth_getUncleCountByBlockHash", |_p, _c| json(eth::uncle_count()));
    insert!("eth_getUncleCountByBlockNumber", |_p, _c| json(eth::uncle_count()));
    insert!("eth_getUncleByBlockHashAndIndex", |_p, _c| json(eth::uncle_by_index()));
    insert!("eth_getUncleByBlockNumberAndIndex", |_p, _c| json(eth::uncle_by_index()));
    insert!("eth_maxPriorityFeePerGas", |_p, _c| json(eth::max_priority_fee_per_gas()));

    insert!("eth_getBalance", |p, _c| {
        let address = params::validate_address(&p[0])?;
        let block = optional_block_param(p.get(1))?;
        json(eth::get_balance(&ctx, &address, &block).await?)
    });
    insert!("eth_getTransactionCount", |p, _c| {
        let address = params::validate_address(&p[0])?;
        let block = optional_block_param(p.get(1))?;
        json(eth::get_transaction_count(&ctx, &address, &block).await?)
    });
    insert!("eth_getCode", |p, _c| {
        let address = params::validate_address(&p[0])?;
        let block = optional_block_param(p.get(1))?;
        json(eth::get_code(&ctx, &address, &block).await?)
    });
    insert!("eth_getStorageAt", |p, _c| {
        let address = params::validate_address(&p[0])?;
        let slot = params::validate_hex(&p[1])?;
        let block = optional_block_param(p.get(2))?;
        json(eth::get_storage_at(&ctx, &address, &slot, &block).await?)
    });

    insert!("eth_getBlockByHash", |p, _c| {
        let block = BlockParam::Hash(params::validate_hex(&p[0])?);
        let show_details = p.get(1).and_then(Value::as_bool).unwrap_or(false);
        json(eth::get_block_by_hash_or_number(&ctx, &block, show_details).await?)
    });
    insert!("eth_getBlockByNumber", |p, _c| {
        let block = parse_block_param(&p[0])?;
        let show_details = p.get(1).and_then(Value::as_bool).unwrap_or(false);
        json(eth::get_block_by_hash_or_number(&ctx, &block, show_details).await?)
    });
    insert!("eth_getBlockTransactionCountByHash", |p, _c| {
        let block = BlockParam::Hash(params::validate_hex(&p[0])?);
        json(eth::block_transaction_count(&ctx, &block).await?)
    });
    insert!("eth_getBlockTransactionCountByNumber", |p, _c| {
        let block = parse_block_param(&p[0])?;
        json(eth::block_transaction_count(&ctx, &block).await?)
    });
    insert!("eth_getBlockReceipts", |p, _c| {
        let block = parse_block_param(&p[0])?;
        json(eth::get_block_receipts(&ctx, &block).await?)
    });

    insert!("eth_getTransactionByHash", |p, _c| {
        let hash = params::validate_transaction_hash_or_id(&p[0])?;
        json(eth::get_transaction_by_hash(&ctx, &hash).await?)
    });
    insert!("eth_getTransactionByBlockHashAndIndex", |p, _c| {
        let block_hash = params::validate_hex(&p[0])?;
        let index = quantity_param(&p[1])?;
        json(eth::get_transaction_by_block_hash_and_index(&ctx, &block_hash, index).await?)
    });
    insert!("eth_getTransactionByBlockNumberAndIndex", |p, _c| {
        let block = parse_block_param(&p[0])?;
        let index = quantity_param(&p[1])?;
        json(eth::get_transaction_by_block_number_and_index(&ctx, &block, index).await?)
    });
    insert!("eth_getTransactionReceipt", |p, _c| {
        let hash = params::validate_transaction_hash_or_id(&p[0])?;
        json(eth::get_transaction_receipt(&ctx, &hash).await?)
    });

    insert!("eth_getLogs", |p, _c| {
        let filter = params::validate_get_logs_params(&p[0])?;
        json(eth::get_logs(&ctx, &filter).await?)
    });

    insert!("eth_call", |p, _c| {
        let tx = params::validate_transaction_call_object(&p[0])?;
        let block = optional_block_param(p.get(1))?;
        json(eth::call(&ctx, &tx, &block).await?)
    });
    insert!("eth_estimateGas", |p, _c| {
        let tx = params::validate_transaction_call_object(&p[0])?;
        let block = optional_block_param(p.get(1))?;
        json(eth::estimate_gas(&ctx, &tx, &block).await?)
    });

    insert!("eth_sendRawTransaction", |p, _c| {
        let raw = params::validate_hex(&p[0])?;
        json(eth::send_raw_transaction(&ctx, &raw).await?)
    });

    insert!("eth_feeHistory", |p, _c| {
        let block_count = quantity_param(&p[0])?;
        let newest = parse_block_param(&p[1])?;
        let newest_number = crate::eth::support::resolve_block_number(&ctx.mirror, &newest, None)
            .await?
            .ok_or(GatewayError::UnknownBlock)?;
        json(eth::fee_history(&ctx, block_count, newest_number).await?)
    });

    insert!("debug_traceTransaction", |p, _c| {
        let hash = params::validate_transaction_hash_or_id(&p[0])?;
        let wrapper = params::validate_tracer_wrapper(p.get(1), TracerKind::OpcodeLogger)?;
        debug::trace_transaction(&ctx, &hash, &wrapper).await
    });
    insert!("debug_traceBlockByNumber", |p, _c| {
        let block = parse_block_param(&p[0])?;
        let wrapper = params::validate_tracer_wrapper(p.get(1), TracerKind::CallTracer)?;
        debug::trace_block_by_number(&ctx, &block, &wrapper).await
    });

    h
}

/// Resolves an optional block-parameter position, defaulting to `latest`
/// when absent (the schema marks it optional but every eth-service function
/// takes a concrete [`BlockParam`]).
fn optional_block_param(value: Option<&Value>) -> Result<BlockParam, GatewayError> {
    match value {
        Some(v) if !v.is_null() => parse_block_param(v),
        _ => Ok(BlockParam::Tag(BlockTag::Latest)),
    }
}
