//! The gateway binary: CLI/env configuration, logging and metrics
//! initialization, and the thin HTTP transport wired to `gateway-rpc`
//! (SPEC_FULL §A "bin/gateway").

mod client_ip;
mod http;
mod metrics;

use actix_web::web;
use anyhow::{anyhow, Result};
use clap::{ArgAction, Parser};
use gateway_cache::{Cache, InMemorySharedCache};
use gateway_consensus::{ConsensusClient, FileService, InMemoryConsensusClient};
use gateway_mirror::{MirrorClient, RetryConfig};
use gateway_ratelimit::{InMemoryStore, RateLimiter};
use gateway_rpc::eth::EthContext;
use gateway_rpc::{build_handlers, build_registry, Dispatcher, GatewayConfig};
use std::sync::atomic::AtomicU64;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, Level};

/// CLI/env configuration surface (SPEC_FULL §B "Configuration").
#[derive(Parser, Debug)]
#[command(author, version, about = "Ethereum-compatible JSON-RPC gateway")]
struct Args {
    /// Verbosity level (0 [error] - 4 [trace]).
    #[arg(long, short, action = ArgAction::Count)]
    v: u8,
    /// Address to bind the HTTP transport to.
    #[arg(long, env = "BIND_ADDR", default_value = "0.0.0.0:8080")]
    bind_addr: String,
    /// Base URL of the mirror collaborator's REST API.
    #[arg(long, env = "MIRROR_BASE_URL")]
    mirror_base_url: String,
    /// The gateway's configured EIP-155 chain id.
    #[arg(long, env = "CHAIN_ID", default_value_t = GatewayConfig::default().chain_id)]
    chain_id: u64,
    /// Default per-method rate-limit threshold.
    #[arg(long, env = "DEFAULT_RATE_LIMIT_THRESHOLD", default_value_t = GatewayConfig::default().default_rate_limit_threshold)]
    default_rate_limit_threshold: u64,
    /// Rate limiter fixed-window width, in seconds.
    #[arg(long, env = "RATE_LIMIT_WINDOW_SECS", default_value_t = GatewayConfig::default().rate_limit_window.as_secs())]
    rate_limit_window_secs: u64,
    /// L1 cache capacity, in entries.
    #[arg(long, env = "L1_CACHE_CAPACITY", default_value_t = GatewayConfig::default().l1_cache_capacity)]
    l1_cache_capacity: usize,
    /// Default cache TTL, in seconds.
    #[arg(long, env = "DEFAULT_CACHE_TTL_SECS", default_value_t = GatewayConfig::default().default_cache_ttl.as_secs())]
    default_cache_ttl_secs: u64,
    /// Cache TTL for `eth_gasPrice`/`eth_call`, in seconds.
    #[arg(long, env = "SHORT_CACHE_TTL_SECS", default_value_t = GatewayConfig::default().short_cache_ttl.as_secs())]
    short_cache_ttl_secs: u64,
    /// Whether `debug_*` methods are exposed at all.
    #[arg(long, env = "DEBUG_API_ENABLED")]
    debug_api_enabled: bool,
    /// Whether `opcodeLogger` is additionally permitted.
    #[arg(long, env = "OPCODELOGGER_ENABLED")]
    opcodelogger_enabled: bool,
    /// Whether `eth_sendRawTransaction` detaches reconciliation into a background task.
    #[arg(long, env = "USE_ASYNC_TX_PROCESSING")]
    use_async_tx_processing: bool,
    /// Whether batch JSON-RPC requests are accepted.
    #[arg(long, env = "BATCH_REQUESTS_ENABLED", default_value_t = true)]
    batch_requests_enabled: bool,
    /// Maximum number of calls in one batch request.
    #[arg(long, env = "MAX_BATCH_SIZE", default_value_t = GatewayConfig::default().max_batch_size)]
    max_batch_size: usize,
    /// Whether to trust `X-Forwarded-For`/`Forwarded` headers for client-IP resolution.
    #[arg(long, env = "TRUST_PROXY_HEADERS")]
    trust_proxy_headers: bool,
}

/// Shared application state handed to every request handler.
pub struct AppState {
    pub dispatcher: Arc<Dispatcher<InMemorySharedCache, InMemoryStore>>,
    pub config: Arc<GatewayConfig>,
    pub next_request_id: AtomicU64,
    pub instance_id: String,
}

#[actix_web::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing(args.v)?;

    let config = Arc::new(build_config(&args));

    let mirror = Arc::new(MirrorClient::new(
        args.mirror_base_url.clone(),
        reqwest::Client::new(),
        RetryConfig::default(),
    ));
    let consensus = Arc::new(InMemoryConsensusClient::new());
    let consensus_client: Arc<dyn ConsensusClient> = consensus.clone();
    let file_service: Arc<dyn FileService> = consensus;
    let ctx = EthContext { mirror, consensus: consensus_client, files: file_service, config: config.clone() };

    let registry = build_registry(&config);
    let handlers = build_handlers(ctx);
    let cache: Cache<InMemorySharedCache> = Cache::new(config.l1_cache_capacity, None);
    let rate_limiter = RateLimiter::new(InMemoryStore::default(), config.rate_limit_window);
    let dispatcher = Arc::new(Dispatcher::new(registry, handlers, cache, rate_limiter));

    let state = web::Data::new(AppState {
        dispatcher,
        config,
        next_request_id: AtomicU64::new(0),
        instance_id: std::process::id().to_string(),
    });

    info!(target: "gateway", bind_addr = %args.bind_addr, "starting gateway");

    actix_web::HttpServer::new(move || {
        actix_web::App::new()
            .app_data(state.clone())
            .service(http::rpc_handler)
            .service(metrics::serve)
    })
    .bind(&args.bind_addr)
    .map_err(|e| anyhow!(e))?
    .run()
    .await
    .map_err(|e| anyhow!(e))
}

fn build_config(args: &Args) -> GatewayConfig {
    GatewayConfig {
        chain_id: args.chain_id,
        default_rate_limit_threshold: args.default_rate_limit_threshold,
        rate_limit_window: Duration::from_secs(args.rate_limit_window_secs),
        l1_cache_capacity: args.l1_cache_capacity,
        default_cache_ttl: Duration::from_secs(args.default_cache_ttl_secs),
        short_cache_ttl: Duration::from_secs(args.short_cache_ttl_secs),
        debug_api_enabled: args.debug_api_enabled,
        opcodelogger_enabled: args.opcodelogger_enabled,
        use_async_tx_processing: args.use_async_tx_processing,
        batch_requests_enabled: args.batch_requests_enabled,
        max_batch_size: args.max_batch_size,
        trust_proxy_headers: args.trust_proxy_headers,
        ..GatewayConfig::default()
    }
}

/// Initializes the tracing subscriber from a verbosity count (trusted-sync's
/// `telemetry::init` pattern, without the Loki sink).
fn init_tracing(verbosity_level: u8) -> Result<()> {
    let level = match verbosity_level {
        0 => Level::ERROR,
        1 => Level::WARN,
        2 => Level::INFO,
        3 => Level::DEBUG,
        _ => Level::TRACE,
    };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level.to_string()));
    tracing_subscriber::fmt().with_env_filter(filter).try_init().map_err(|e| anyhow!(e))
}
