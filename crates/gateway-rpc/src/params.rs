//! Parameter semantic types and validation (§4.5 "Parameter semantics").

use gateway_errors::GatewayError;
use serde_json::Value;

/// A resolved block parameter: either a tag, a concrete number, or a hash.
/// `BlockNumberOrHash` accepts `{blockNumber}`/`{blockHash}` per EIP-1898, a
/// bare hex number, a hash, or one of the named tags.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BlockParam {
    /// One of `latest`, `pending`, `earliest`, `safe`, `finalized`.
    Tag(BlockTag),
    /// A concrete block number.
    Number(u64),
    /// A concrete 32-byte block hash.
    Hash(String),
}

/// The named block tags (§4.5).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockTag {
    /// The chain head.
    Latest,
    /// Not meaningfully distinct from `latest` upstream; resolved the same.
    Pending,
    /// The genesis block.
    Earliest,
    /// Resolved the same as `latest` (the upstream has no fork-choice
    /// notion distinct from its own finality).
    Safe,
    /// Resolved the same as `latest`.
    Finalized,
}

impl BlockParam {
    /// Whether this parameter is a "live" tag that must never be cached
    /// (§4.2 "Policy hooks", §9 open question 2).
    pub fn is_non_cacheable_tag(&self) -> bool {
        matches!(self, Self::Tag(BlockTag::Latest | BlockTag::Pending))
    }

    /// The string form used as a cache-key argument.
    pub fn as_cache_arg(&self) -> String {
        match self {
            Self::Tag(BlockTag::Latest) => "latest".to_string(),
            Self::Tag(BlockTag::Pending) => "pending".to_string(),
            Self::Tag(BlockTag::Earliest) => "earliest".to_string(),
            Self::Tag(BlockTag::Safe) => "safe".to_string(),
            Self::Tag(BlockTag::Finalized) => "finalized".to_string(),
            Self::Number(n) => format!("0x{n:x}"),
            Self::Hash(h) => h.clone(),
        }
    }
}

/// Parses a bare block-tag-or-number-or-hash value (used where the schema
/// calls for `BlockNumber` directly rather than the EIP-1898 object form).
pub fn parse_block_param(value: &Value) -> Result<BlockParam, GatewayError> {
    match value {
        Value::String(s) => parse_block_param_str(s),
        Value::Object(map) => {
            if let Some(Value::String(h)) = map.get("blockHash") {
                return Ok(BlockParam::Hash(h.clone()));
            }
            if let Some(Value::String(n)) = map.get("blockNumber") {
                return parse_block_param_str(n);
            }
            Err(GatewayError::InvalidParams("invalid block parameter object".to_string()))
        }
        _ => Err(GatewayError::InvalidParams("invalid block parameter".to_string())),
    }
}

fn parse_block_param_str(s: &str) -> Result<BlockParam, GatewayError> {
    match s {
        "latest" => Ok(BlockParam::Tag(BlockTag::Latest)),
        "pending" => Ok(BlockParam::Tag(BlockTag::Pending)),
        "earliest" => Ok(BlockParam::Tag(BlockTag::Earliest)),
        "safe" => Ok(BlockParam::Tag(BlockTag::Safe)),
        "finalized" => Ok(BlockParam::Tag(BlockTag::Finalized)),
        hex if hex.starts_with("0x") && hex.len() == 66 => Ok(BlockParam::Hash(hex.to_string())),
        hex if hex.starts_with("0x") => u64::from_str_radix(&hex[2..], 16)
            .map(BlockParam::Number)
            .map_err(|_| GatewayError::InvalidParams("invalid block number".to_string())),
        _ => Err(GatewayError::InvalidParams("invalid block parameter".to_string())),
    }
}

/// Validates a `0x`-prefixed, 20-byte EVM address.
pub fn validate_address(value: &Value) -> Result<String, GatewayError> {
    let s = value.as_str().ok_or_else(|| GatewayError::InvalidParams("expected an address".to_string()))?;
    if s.starts_with("0x") && s.len() == 42 && s[2..].chars().all(|c| c.is_ascii_hexdigit()) {
        Ok(s.to_lowercase())
    } else {
        Err(GatewayError::InvalidParams(format!("invalid address: {s}")))
    }
}

/// Validates an arbitrary `0x`-prefixed hex string (no width constraint).
pub fn validate_hex(value: &Value) -> Result<String, GatewayError> {
    let s = value.as_str().ok_or_else(|| GatewayError::InvalidParams("expected a hex string".to_string()))?;
    if s.starts_with("0x") && s[2..].chars().all(|c| c.is_ascii_hexdigit()) {
        Ok(s.to_string())
    } else {
        Err(GatewayError::InvalidParams(format!("invalid hex value: {s}")))
    }
}

/// Validates a 32-byte transaction hash.
pub fn validate_transaction_hash(value: &Value) -> Result<String, GatewayError> {
    let s = value
        .as_str()
        .ok_or_else(|| GatewayError::InvalidParams("expected a transaction hash".to_string()))?;
    if s.starts_with("0x") && s.len() == 66 && s[2..].chars().all(|c| c.is_ascii_hexdigit()) {
        Ok(s.to_lowercase())
    } else {
        Err(GatewayError::InvalidParams(format!("invalid transaction hash: {s}")))
    }
}

/// Validates a transaction hash, or an upstream transaction id of the form
/// `shard.realm.num-sss-nnn` / `shard.realm.num@sss.nnn`.
pub fn validate_transaction_hash_or_id(value: &Value) -> Result<String, GatewayError> {
    if let Ok(hash) = validate_transaction_hash(value) {
        return Ok(hash);
    }
    let s = value
        .as_str()
        .ok_or_else(|| GatewayError::InvalidParams("expected a transaction hash or id".to_string()))?;
    if s.contains('.') {
        Ok(s.to_string())
    } else {
        Err(GatewayError::InvalidParams(format!("invalid transaction hash or id: {s}")))
    }
}

/// A validated `eth_call`/`eth_estimateGas` transaction-call object.
#[derive(Debug, Clone, Default)]
pub struct TransactionCallObject {
    /// Sender address, if supplied.
    pub from: Option<String>,
    /// Recipient address; absent for a contract-creation call.
    pub to: Option<String>,
    /// Value, in weibar hex.
    pub value: Option<String>,
    /// Gas limit, hex.
    pub gas: Option<String>,
    /// Gas price, hex.
    pub gas_price: Option<String>,
    /// Call data, taken from `input` when both `data` and `input` are
    /// present and differ (§4.6.6).
    pub data: Option<String>,
}

/// Validates and normalizes a transaction-call object (`eth_call`,
/// `eth_estimateGas`).
pub fn validate_transaction_call_object(value: &Value) -> Result<TransactionCallObject, GatewayError> {
    let obj = value
        .as_object()
        .ok_or_else(|| GatewayError::InvalidParams("expected a transaction call object".to_string()))?;

    let from = match obj.get("from") {
        Some(v) if !v.is_null() => Some(validate_address(v)?),
        _ => None,
    };
    let to = match obj.get("to") {
        Some(v) if !v.is_null() => Some(validate_address(v)?),
        _ => None,
    };
    let value_field = match obj.get("value") {
        Some(v) if !v.is_null() => Some(validate_hex(v)?),
        _ => None,
    };
    let gas = match obj.get("gas") {
        Some(v) if !v.is_null() => Some(validate_hex(v)?),
        _ => None,
    };
    let gas_price = match obj.get("gasPrice") {
        Some(v) if !v.is_null() => Some(validate_hex(v)?),
        _ => None,
    };

    let data = match obj.get("data") {
        Some(v) if !v.is_null() => Some(validate_hex(v)?),
        _ => None,
    };
    let input = match obj.get("input") {
        Some(v) if !v.is_null() => Some(validate_hex(v)?),
        _ => None,
    };
    let data = match (data, input) {
        (Some(_), Some(input)) => Some(input),
        (Some(data), None) => Some(data),
        (None, Some(input)) => Some(input),
        (None, None) => None,
    };

    Ok(TransactionCallObject { from, to, value: value_field, gas, gas_price, data })
}

/// A validated `eth_getLogs` parameter object.
#[derive(Debug, Clone, Default)]
pub struct GetLogsParams {
    /// A specific block to scope the query to, overriding `from_block`/`to_block`.
    pub block_hash: Option<String>,
    /// Lower bound of the block range.
    pub from_block: Option<BlockParam>,
    /// Upper bound of the block range.
    pub to_block: Option<BlockParam>,
    /// Contract address(es) to filter by.
    pub address: Vec<String>,
    /// Topic filters, one entry per topic position.
    pub topics: Vec<Option<Vec<String>>>,
}

/// Validates an `eth_getLogs` filter object.
pub fn validate_get_logs_params(value: &Value) -> Result<GetLogsParams, GatewayError> {
    let obj = value
        .as_object()
        .ok_or_else(|| GatewayError::InvalidParams("expected a getLogs filter object".to_string()))?;

    let block_hash = match obj.get("blockHash") {
        Some(v) if !v.is_null() => Some(validate_hex(v)?),
        _ => None,
    };
    let from_block = match obj.get("fromBlock") {
        Some(v) if !v.is_null() => Some(parse_block_param(v)?),
        _ => None,
    };
    let to_block = match obj.get("toBlock") {
        Some(v) if !v.is_null() => Some(parse_block_param(v)?),
        _ => None,
    };

    let address = match obj.get("address") {
        Some(Value::String(s)) => vec![validate_address(&Value::String(s.clone()))?],
        Some(Value::Array(items)) => {
            items.iter().map(validate_address).collect::<Result<Vec<_>, _>>()?
        }
        _ => Vec::new(),
    };

    let topics = match obj.get("topics") {
        Some(Value::Array(items)) => items
            .iter()
            .map(|t| match t {
                Value::Null => Ok(None),
                Value::String(s) => Ok(Some(vec![s.clone()])),
                Value::Array(inner) => inner
                    .iter()
                    .map(|v| v.as_str().map(str::to_string).ok_or_else(|| {
                        GatewayError::InvalidParams("invalid topic entry".to_string())
                    }))
                    .collect::<Result<Vec<_>, _>>()
                    .map(Some),
                _ => Err(GatewayError::InvalidParams("invalid topics entry".to_string())),
            })
            .collect::<Result<Vec<_>, _>>()?,
        _ => Vec::new(),
    };

    Ok(GetLogsParams { block_hash, from_block, to_block, address, topics })
}

/// The tracer kind requested by a `debug_trace*` wrapper.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TracerKind {
    /// Flattened call tree.
    CallTracer,
    /// Opcode-level struct logs.
    OpcodeLogger,
    /// Address -> prestate map.
    PrestateTracer,
}

/// A validated `{tracer?, tracerConfig?}` wrapper (§4.5 "TracerConfigWrapper").
#[derive(Debug, Clone)]
pub struct TracerConfigWrapper {
    /// Which tracer to run.
    pub tracer: TracerKind,
    /// `onlyTopCall`, for the call tracer.
    pub only_top_call: bool,
    /// `enableMemory`, for the opcode logger.
    pub enable_memory: bool,
    /// `disableStack`, for the opcode logger.
    pub disable_stack: bool,
    /// `disableStorage`, for the opcode logger.
    pub disable_storage: bool,
}

impl TracerConfigWrapper {
    fn defaulted(tracer: TracerKind) -> Self {
        Self {
            tracer,
            only_top_call: false,
            enable_memory: false,
            disable_stack: false,
            disable_storage: false,
        }
    }
}

/// Validates a `debug_traceTransaction`/`debug_traceBlockByNumber` wrapper
/// object, defaulting the tracer per `default_tracer` when absent or
/// partial.
pub fn validate_tracer_wrapper(
    value: Option<&Value>,
    default_tracer: TracerKind,
) -> Result<TracerConfigWrapper, GatewayError> {
    let Some(value) = value else { return Ok(TracerConfigWrapper::defaulted(default_tracer)) };
    if value.is_null() {
        return Ok(TracerConfigWrapper::defaulted(default_tracer));
    }
    let obj = value
        .as_object()
        .ok_or_else(|| GatewayError::InvalidParams("invalid tracer wrapper".to_string()))?;

    let tracer = match obj.get("tracer").and_then(Value::as_str) {
        Some("callTracer") => TracerKind::CallTracer,
        Some("opcodeLogger") => TracerKind::OpcodeLogger,
        Some("prestateTracer") => TracerKind::PrestateTracer,
        Some(other) => {
            return Err(GatewayError::InvalidParams(format!("unknown tracer: {other}")))
        }
        None => default_tracer,
    };

    let cfg = obj.get("tracerConfig").and_then(Value::as_object);
    let only_top_call =
        cfg.and_then(|c| c.get("onlyTopCall")).and_then(Value::as_bool).unwrap_or(false);
    let enable_memory =
        cfg.and_then(|c| c.get("enableMemory")).and_then(Value::as_bool).unwrap_or(false);
    let disable_stack =
        cfg.and_then(|c| c.get("disableStack")).and_then(Value::as_bool).unwrap_or(false);
    let disable_storage =
        cfg.and_then(|c| c.get("disableStorage")).and_then(Value::as_bool).unwrap_or(false);

    Ok(TracerConfigWrapper { tracer, only_top_call, enable_memory, disable_stack, disable_storage })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_block_tags() {
        assert_eq!(
            parse_block_param(&Value::String("latest".into())).unwrap(),
            BlockParam::Tag(BlockTag::Latest)
        );
    }

    #[test]
    fn parses_eip1898_hash_object() {
        let hash = "0x".to_string() + &"11".repeat(32);
        let obj = serde_json::json!({ "blockHash": hash });
        assert_eq!(parse_block_param(&obj).unwrap(), BlockParam::Hash(hash));
    }

    #[test]
    fn rejects_malformed_address() {
        assert!(validate_address(&Value::String("0xabc".into())).is_err());
    }

    #[test]
    fn input_wins_over_data_when_both_present_and_differ() {
        let obj = serde_json::json!({ "data": "0x01", "input": "0x02" });
        let call = validate_transaction_call_object(&obj).unwrap();
        assert_eq!(call.data.as_deref(), Some("0x02"));
    }

    #[test]
    fn tracer_wrapper_defaults_when_absent() {
        let wrapper = validate_tracer_wrapper(None, TracerKind::OpcodeLogger).unwrap();
        assert_eq!(wrapper.tracer, TracerKind::OpcodeLogger);
    }
}
