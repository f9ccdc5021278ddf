//! The thin HTTP transport (§6): deserializes JSON-RPC envelopes, calls
//! into the dispatcher, and maps the result back per the wire protocol and
//! HTTP status rules. Deliberately stays peripheral — all the semantics
//! live in `gateway-rpc`.

use crate::{client_ip, metrics, AppState};
use actix_web::{post, web, HttpRequest, HttpResponse};
use gateway_errors::{GatewayError, RequestContext};
use serde_json::{json, Value};
use std::sync::atomic::Ordering;
use std::time::Instant;

#[post("/")]
pub async fn rpc_handler(
    req: HttpRequest,
    body: web::Bytes,
    state: web::Data<AppState>,
) -> HttpResponse {
    let envelope: Value = match serde_json::from_slice(&body) {
        Ok(v) => v,
        Err(_) => return single_error_response(GatewayError::ParseError, Value::Null),
    };

    let client_ip = resolve_client_ip(&req, &state);

    match envelope {
        Value::Array(items) => handle_batch(&state, &client_ip, items).await,
        Value::Object(_) => {
            let request_ctx = new_context(&state, client_ip);
            let (response, error) = handle_one(&state, &request_ctx, envelope).await;
            match error {
                Some(e) => HttpResponse::build(status(e.http_status())).json(response),
                None => HttpResponse::Ok().json(response),
            }
        }
        _ => single_error_response(GatewayError::InvalidRequest, Value::Null),
    }
}

async fn handle_batch(state: &web::Data<AppState>, client_ip: &str, items: Vec<Value>) -> HttpResponse {
    if !state.config.batch_requests_enabled {
        return single_error_response(GatewayError::BatchDisabled, Value::Null);
    }
    if items.len() > state.config.max_batch_size {
        return single_error_response(GatewayError::BatchTooLarge, Value::Null);
    }
    for item in &items {
        if let Some(method) = item.get("method").and_then(Value::as_str) {
            if !state.dispatcher.is_allowed_in_batch(method) {
                return single_error_response(GatewayError::InvalidRequest, Value::Null);
            }
        }
    }

    let mut responses = Vec::with_capacity(items.len());
    for item in items {
        let request_ctx = new_context(state, client_ip.to_string());
        let (response, _) = handle_one(state, &request_ctx, item).await;
        responses.push(response);
    }
    // Batch responses always use HTTP 200 (§6), regardless of individual outcomes.
    HttpResponse::Ok().json(Value::Array(responses))
}

async fn handle_one(
    state: &web::Data<AppState>,
    ctx: &RequestContext,
    request: Value,
) -> (Value, Option<GatewayError>) {
    let id = request.get("id").cloned().unwrap_or(Value::Null);

    let method = match request.get("method").and_then(Value::as_str) {
        Some(m) => m.to_string(),
        None => return error_envelope(id, GatewayError::InvalidRequest),
    };
    let params = match request.get("params") {
        Some(Value::Array(values)) => values.clone(),
        Some(Value::Null) | None => Vec::new(),
        Some(_) => return error_envelope(id, GatewayError::InvalidParams("params must be an array".to_string())),
    };

    let started = Instant::now();
    let result = state
        .dispatcher
        .dispatch(&method, params, ctx.clone(), state.config.default_rate_limit_threshold)
        .await;
    let elapsed = started.elapsed().as_secs_f64();

    match result {
        Ok(value) => {
            metrics::record_call(&method, "ok", elapsed);
            (json!({ "jsonrpc": "2.0", "id": id, "result": value }), None)
        }
        Err(err) => {
            let outcome = if matches!(err, GatewayError::RateLimitExceeded { .. }) {
                "rate_limited"
            } else {
                "error"
            };
            metrics::record_call(&method, outcome, elapsed);
            error_envelope(id, err)
        }
    }
}

fn error_envelope(id: Value, err: GatewayError) -> (Value, Option<GatewayError>) {
    let mut error = json!({ "code": err.code(), "message": err.to_string() });
    if let Some(data) = err.data() {
        error["data"] = data;
    }
    (json!({ "jsonrpc": "2.0", "id": id, "error": error }), Some(err))
}

fn single_error_response(err: GatewayError, id: Value) -> HttpResponse {
    let status_code = status(err.http_status());
    let (envelope, _) = error_envelope(id, err);
    HttpResponse::build(status_code).json(envelope)
}

fn status(code: u16) -> actix_web::http::StatusCode {
    actix_web::http::StatusCode::from_u16(code).unwrap_or(actix_web::http::StatusCode::INTERNAL_SERVER_ERROR)
}

fn resolve_client_ip(req: &HttpRequest, state: &web::Data<AppState>) -> String {
    let header = |name: &str| req.headers().get(name).and_then(|v| v.to_str().ok());
    let peer = req.peer_addr().map(|a| a.ip().to_string()).unwrap_or_else(|| "unknown".to_string());
    client_ip::extract(
        state.config.trust_proxy_headers,
        header("x-forwarded-for"),
        header("forwarded"),
        &peer,
    )
}

fn new_context(state: &web::Data<AppState>, client_ip: String) -> RequestContext {
    let request_id = state.next_request_id.fetch_add(1, Ordering::Relaxed);
    RequestContext::new(format!("{}-{request_id}", state.instance_id), client_ip)
}
