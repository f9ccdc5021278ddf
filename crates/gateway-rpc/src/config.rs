//! Runtime configuration surface consumed by the dispatcher and eth/debug
//! services (SPEC_FULL §B "Configuration").
//!
//! This is a plain data struct — the binary owns CLI/env parsing and builds
//! one of these once at startup, then threads it through as `Arc<GatewayConfig>`.
//! Keeping `clap` out of this crate means the core dispatch logic has no
//! dependency on how its configuration was sourced.

use std::time::Duration;

/// Process-wide configuration for the dispatcher, eth services, and debug
/// tracer.
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    /// The gateway's configured EIP-155 chain id.
    pub chain_id: u64,
    /// Tinybar -> weibar conversion coefficient (Glossary).
    pub tinybar_to_weibar_coef: u64,
    /// Default per-method rate-limit threshold for methods without an
    /// explicit override.
    pub default_rate_limit_threshold: u64,
    /// Rate limiter fixed-window width.
    pub rate_limit_window: Duration,
    /// L1 cache capacity, in entries.
    pub l1_cache_capacity: usize,
    /// Default cache TTL for block/transaction/receipt lookups.
    pub default_cache_ttl: Duration,
    /// Cache TTL for `eth_gasPrice` / `eth_call` responses.
    pub short_cache_ttl: Duration,
    /// Maximum block-hash-range span (in timestamp seconds) `eth_getLogs`
    /// accepts (§4.6.4: "7 days maximum").
    pub max_logs_timestamp_range: Duration,
    /// Maximum `toBlock - fromBlock` span `eth_getLogs` accepts.
    pub max_logs_block_range: u64,
    /// Maximum transaction count in a block before `getBlockByHash`/
    /// `getBlockByNumber` reject a full-details request (§4.6.1).
    pub max_block_transactions_for_details: usize,
    /// Whether `debug_*` methods are exposed at all.
    pub debug_api_enabled: bool,
    /// Whether `opcodeLogger` is additionally permitted when
    /// `debug_api_enabled` is set.
    pub opcodelogger_enabled: bool,
    /// Whether `eth_sendRawTransaction` detaches reconciliation into a
    /// background task (§4.6.10 "Async mode").
    pub use_async_tx_processing: bool,
    /// Whether `eth_estimateGas` propagates contract-revert failures
    /// instead of falling back to the predefined gas table.
    pub estimate_gas_throws: bool,
    /// Maximum call-data byte count for `eth_sendRawTransaction` (§4.6.10).
    pub max_call_data_size: usize,
    /// Maximum serialized transaction byte count.
    pub max_transaction_size: usize,
    /// Upper bound on a transaction's gas limit.
    pub max_transaction_fee_threshold: u64,
    /// Tolerance, in tinybar, the submitted gas price may fall below the
    /// current network gas price before being rejected.
    pub gas_price_tolerance_tinybar: u64,
    /// Raw bytes of whitelisted deterministic-deployer transactions,
    /// exempted from the gas-price precheck (§9 "Open questions").
    pub deterministic_deploy_txs: Vec<Vec<u8>>,
    /// Reconciliation poll attempts after a transaction submission.
    pub reconciliation_poll_attempts: u32,
    /// Delay between reconciliation poll attempts.
    pub reconciliation_poll_interval: Duration,
    /// Percentage buffer (may be negative) applied on top of the raw
    /// network gas price (§4.6.8).
    pub gas_price_buffer_percent: i64,
    /// Per-second network gas cap applied to `eth_call` (§4.6.6).
    pub max_gas_per_second: u64,
    /// Whether the front-end should prefer submitting `eth_call` against
    /// the consensus collaborator over the mirror's contract-call
    /// endpoint.
    pub call_via_consensus: bool,
    /// How far back from the chain head a historical block is still
    /// considered within the "balance refresh window" — recent enough that
    /// the mirror hasn't yet imported its historical balance, so
    /// `getBalance` reconciles it from the live balance and transfer
    /// history instead of the balance-at-timestamp endpoint (§4.6.5).
    pub balance_refresh_window: std::time::Duration,
    /// 4-byte selectors of the chain's native system-contract creation
    /// entry points. A contract result whose `function_parameters` starts
    /// with one of these derives its created address from the last 20
    /// bytes of `call_result` instead of the result's own `address` field
    /// (§4.6.3).
    pub system_contract_creation_selectors: Vec<[u8; 4]>,
    /// Whether batch JSON-RPC requests are accepted at all (§6).
    pub batch_requests_enabled: bool,
    /// Maximum number of calls tolerated in one batch request (§6).
    pub max_batch_size: usize,
    /// Whether the HTTP transport trusts `X-Forwarded-For`/`Forwarded`
    /// headers for client-IP resolution instead of the socket's peer
    /// address (§6 "Client-IP extraction").
    pub trust_proxy_headers: bool,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            chain_id: 0x12a,
            tinybar_to_weibar_coef: gateway_primitives::units::DEFAULT_TINYBAR_TO_WEIBAR_COEF,
            default_rate_limit_threshold: 200,
            rate_limit_window: Duration::from_secs(60),
            l1_cache_capacity: 10_000,
            default_cache_ttl: Duration::from_secs(60),
            short_cache_ttl: Duration::from_secs(5),
            max_logs_timestamp_range: Duration::from_secs(7 * 24 * 60 * 60),
            max_logs_block_range: 1_000,
            max_block_transactions_for_details: 2_000,
            debug_api_enabled: false,
            opcodelogger_enabled: false,
            use_async_tx_processing: false,
            estimate_gas_throws: false,
            max_call_data_size: 128 * 1024,
            max_transaction_size: 256 * 1024,
            max_transaction_fee_threshold: 15_000_000,
            gas_price_tolerance_tinybar: 1,
            deterministic_deploy_txs: Vec::new(),
            reconciliation_poll_attempts: 10,
            reconciliation_poll_interval: Duration::from_millis(500),
            gas_price_buffer_percent: 0,
            max_gas_per_second: 15_000_000,
            call_via_consensus: false,
            balance_refresh_window: Duration::from_secs(60 * 15),
            system_contract_creation_selectors: Vec::new(),
            batch_requests_enabled: true,
            max_batch_size: 100,
            trust_proxy_headers: false,
        }
    }
}
