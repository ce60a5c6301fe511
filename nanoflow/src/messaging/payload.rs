//! The payload carried through pipelines.

use crate::context::RequestContext;
use std::sync::Arc;

/// A message flowing in and out of pipelines.
///
/// `data` is the opaque body. The request context is shared, not owned: it
/// accumulates one execution context per pipeline the message passes through.
#[derive(Debug, Clone)]
pub struct Payload {
    /// The message body.
    pub data: serde_json::Value,
    /// The request this message belongs to.
    pub context: Arc<RequestContext>,
    /// Optional routing key used by transports.
    pub routing_key: Option<String>,
}

impl Payload {
    /// Creates a payload for an existing request context.
    #[must_use]
    pub fn new(data: serde_json::Value, context: Arc<RequestContext>) -> Self {
        Self {
            data,
            context,
            routing_key: None,
        }
    }

    /// Creates a payload with a fresh request context for `origin`.
    #[must_use]
    pub fn from_origin(data: serde_json::Value, origin: impl Into<String>) -> Self {
        Self::new(data, Arc::new(RequestContext::new(origin)))
    }

    /// Sets the routing key.
    #[must_use]
    pub fn with_routing_key(mut self, routing_key: impl Into<String>) -> Self {
        self.routing_key = Some(routing_key.into());
        self
    }

    /// Returns the origin of the owning request.
    #[must_use]
    pub fn origin(&self) -> &str {
        self.context.origin()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_payload_creation() {
        let context = Arc::new(RequestContext::new("origin"));
        let payload = Payload::new(json!({}), context.clone());

        assert_eq!(payload.data, json!({}));
        assert!(Arc::ptr_eq(&payload.context, &context));
        assert!(payload.routing_key.is_none());
        assert_eq!(payload.origin(), "origin");
    }

    #[test]
    fn test_payload_clone_shares_request_context() {
        let payload = Payload::from_origin(json!({"a": 1}), "socket").with_routing_key("orders.created");
        let copy = payload.clone();

        assert!(Arc::ptr_eq(&payload.context, &copy.context));
        assert_eq!(copy.routing_key.as_deref(), Some("orders.created"));
    }
}
