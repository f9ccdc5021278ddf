//! Prometheus metrics (SPEC_FULL §B "Metrics"), registered the way
//! `providers-alloy`'s metrics module does: `lazy_static` vectors gathered
//! by a thin `/metrics` handler.

use actix_web::{get, HttpResponse, Responder};
use lazy_static::lazy_static;
use prometheus::{register_histogram_vec, register_int_counter_vec, Encoder, HistogramVec, IntCounterVec, TextEncoder};

lazy_static! {
    /// Total dispatched calls, labeled by method and outcome (`ok`/`error`).
    pub static ref RPC_CALLS: IntCounterVec = register_int_counter_vec!(
        "gateway_rpc_calls_total",
        "Total JSON-RPC calls dispatched",
        &["method", "outcome"]
    )
    .unwrap();
    /// Dispatch latency, labeled by method.
    pub static ref RPC_DURATION_SECONDS: HistogramVec = register_histogram_vec!(
        "gateway_rpc_duration_seconds",
        "JSON-RPC dispatch latency",
        &["method"]
    )
    .unwrap();
    /// Rate-limit rejections, labeled by method.
    pub static ref RATE_LIMIT_REJECTIONS: IntCounterVec = register_int_counter_vec!(
        "gateway_rate_limit_rejections_total",
        "Requests rejected by the rate limiter",
        &["method"]
    )
    .unwrap();
}

/// Records one dispatched call's outcome and duration.
pub fn record_call(method: &str, outcome: &str, duration_seconds: f64) {
    RPC_CALLS.with_label_values(&[method, outcome]).inc();
    RPC_DURATION_SECONDS.with_label_values(&[method]).observe(duration_seconds);
    if outcome == "rate_limited" {
        RATE_LIMIT_REJECTIONS.with_label_values(&[method]).inc();
    }
}

#[get("/metrics")]
pub async fn serve() -> impl Responder {
    let encoder = TextEncoder::new();
    let mut buffer = Vec::new();
    if let Err(e) = encoder.encode(&prometheus::gather(), &mut buffer) {
        tracing::error!(target: "gateway", "failed to encode prometheus metrics: {e}");
    }
    HttpResponse::Ok().content_type(encoder.format_type()).body(buffer)
}
