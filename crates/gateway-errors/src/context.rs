//! [RequestContext]: the request-scoped record threaded through every
//! downstream call (§3 "RequestContext").

/// A request-scoped record carrying correlation data: a unique request id,
/// the client's IP, and optionally a connection id and originating user.
///
/// Created at ingress and attached to every downstream call; destroyed when
/// the response is emitted. Cheap to clone — every layer that needs it holds
/// its own copy rather than threading a reference through async boundaries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestContext {
    /// Unique id for this request, used for log correlation and the
    /// `[Request ID: ...]` error-message prefix.
    pub request_id: String,
    /// The client's IP address, as resolved by the front-end (§6).
    pub client_ip: String,
    /// The WebSocket/connection id, if the request arrived over a
    /// persistent connection.
    pub connection_id: Option<String>,
    /// The originating user, if the front-end has one (e.g. an API-key
    /// principal). Not used by the core, but threaded through for logging.
    pub user: Option<String>,
}

impl RequestContext {
    /// Builds a new context with no connection id or user.
    pub fn new(request_id: impl Into<String>, client_ip: impl Into<String>) -> Self {
        Self {
            request_id: request_id.into(),
            client_ip: client_ip.into(),
            connection_id: None,
            user: None,
        }
    }

    /// Prefixes `message` with this context's `[Request ID: ...]` marker.
    pub fn annotate(&self, message: &str) -> String {
        crate::with_request_id(&self.request_id, message)
    }
}
