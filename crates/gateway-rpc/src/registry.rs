//! The method registry: `MethodDescriptor` and the table built once at
//! process start (§3 "MethodDescriptor", §4.5, §9).

use gateway_cache::CachePolicy;
use std::collections::HashMap;

/// The semantic type a parameter position is validated against (§4.5).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamType {
    /// A 20-byte EVM address.
    Address,
    /// An arbitrary hex string.
    Hex,
    /// A JSON boolean.
    Boolean,
    /// A bare block number/tag (no EIP-1898 object form).
    BlockNumber,
    /// `BlockNumberOrHash` per EIP-1898 (§4.5).
    BlockNumberOrHash,
    /// A 32-byte transaction hash.
    TransactionHash,
    /// A transaction hash or upstream transaction id.
    TransactionHashOrId,
    /// An `eth_call`/`eth_estimateGas` transaction object.
    TransactionCallObject,
    /// An `eth_getLogs` filter object.
    GetLogsParams,
    /// A `debug_trace*` `{tracer, tracerConfig}` wrapper.
    TracerConfigWrapper,
}

/// One parameter position's schema entry.
#[derive(Debug, Clone)]
pub struct ParamSpec {
    /// The semantic type this position validates against.
    pub kind: ParamType,
    /// Whether this position must be present.
    pub required: bool,
    /// A custom invalid-params message, used instead of the generic one
    /// when validation fails.
    pub custom_error: Option<&'static str>,
}

impl ParamSpec {
    /// A required parameter of the given kind.
    pub const fn required(kind: ParamType) -> Self {
        Self { kind, required: true, custom_error: None }
    }

    /// An optional parameter of the given kind.
    pub const fn optional(kind: ParamType) -> Self {
        Self { kind, required: false, custom_error: None }
    }

    /// Attaches a custom invalid-params message, builder style.
    pub const fn with_message(mut self, message: &'static str) -> Self {
        self.custom_error = Some(message);
        self
    }
}

/// How the dispatcher arranges validated params before invoking the
/// handler (§4.5, §9 "Dynamic parameter rearrangement functions").
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamLayout {
    /// Append the request context after the validated user params
    /// (the default).
    AppendContext,
    /// Ignore user params entirely; the handler only receives the request
    /// context (used by constant handlers like `eth_accounts`).
    ContextOnly,
}

/// A registered method's complete dispatch metadata.
#[derive(Debug, Clone)]
pub struct MethodDescriptor {
    /// The JSON-RPC method name, e.g. `"eth_getBalance"`.
    pub name: &'static str,
    /// Ordered parameter schema.
    pub params: Vec<ParamSpec>,
    /// How params are arranged before the handler is invoked.
    pub layout: ParamLayout,
    /// Cache policy, if this method's responses are cacheable.
    pub cache_policy: Option<CachePolicy>,
    /// Per-method rate-limit threshold override.
    pub rate_limit_threshold: Option<u64>,
    /// Whether this method may appear in a batch request. A handful of
    /// state-mutating or tracer-heavy methods are disallowed in batches.
    pub allowed_in_batch: bool,
    /// Whether params beyond the declared schema length are tolerated
    /// rather than rejected (§4.5 step 2, "unrecognized extra params").
    pub allow_extra_params: bool,
}

impl MethodDescriptor {
    /// Builds a descriptor with the common defaults: `AppendContext`
    /// layout, no cache policy, no rate-limit override, allowed in
    /// batches.
    pub fn new(name: &'static str, params: Vec<ParamSpec>) -> Self {
        Self {
            name,
            params,
            layout: ParamLayout::AppendContext,
            cache_policy: None,
            rate_limit_threshold: None,
            allowed_in_batch: true,
            allow_extra_params: false,
        }
    }

    /// Builder: sets the parameter layout.
    pub fn layout(mut self, layout: ParamLayout) -> Self {
        self.layout = layout;
        self
    }

    /// Builder: attaches a cache policy.
    pub fn cache(mut self, policy: CachePolicy) -> Self {
        self.cache_policy = Some(policy);
        self
    }

    /// Builder: overrides the rate-limit threshold.
    pub fn rate_limit(mut self, threshold: u64) -> Self {
        self.rate_limit_threshold = Some(threshold);
        self
    }

    /// Builder: marks this method as disallowed inside a batch request.
    pub fn disallow_in_batch(mut self) -> Self {
        self.allowed_in_batch = false;
        self
    }

    /// Builder: tolerates params beyond the declared schema length.
    pub fn allow_extra_params(mut self) -> Self {
        self.allow_extra_params = true;
        self
    }
}

/// The immutable method registry, populated once at process start (§3
/// "Lifecycles").
#[derive(Debug, Clone, Default)]
pub struct Registry {
    methods: HashMap<&'static str, MethodDescriptor>,
}

/// How an unregistered method name should be classified (§4.5 step 1).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnknownMethodClass {
    /// `engine_*`: intentionally never implemented.
    IntentionallyUnsupported,
    /// `trace_*` or `debug_*` other than the two supported debug methods.
    NotYetImplemented,
    /// Anything else: genuinely unknown.
    MethodNotFound,
}

impl Registry {
    /// Registers `descriptor`, keyed by its method name.
    pub fn register(&mut self, descriptor: MethodDescriptor) {
        self.methods.insert(descriptor.name, descriptor);
    }

    /// Looks up a method's descriptor.
    pub fn get(&self, method: &str) -> Option<&MethodDescriptor> {
        self.methods.get(method)
    }

    /// Classifies a method name absent from the registry (§4.5 step 1).
    pub fn classify_unknown(method: &str) -> UnknownMethodClass {
        if method.starts_with("engine_") {
            UnknownMethodClass::IntentionallyUnsupported
        } else if method.starts_with("trace_")
            || (method.starts_with("debug_")
                && method != "debug_traceTransaction"
                && method != "debug_traceBlockByNumber")
        {
            UnknownMethodClass::NotYetImplemented
        } else {
            UnknownMethodClass::MethodNotFound
        }
    }
}
