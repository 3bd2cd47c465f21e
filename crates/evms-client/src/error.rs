//! Store client error types.

/// Errors from store RPC calls.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The queried object, or a field it is expected to carry, is absent.
    #[error("{object} not found: {detail}")]
    NotFound { object: String, detail: String },

    /// HTTP transport error (connection failure, timeout).
    #[error("HTTP error calling {method}: {source}")]
    Http {
        method: String,
        source: reqwest::Error,
    },

    /// The node answered with a non-2xx status.
    #[error("store RPC {method} returned {status}: {body}")]
    Status {
        method: String,
        status: u16,
        body: String,
    },

    /// The node answered with a JSON-RPC error object.
    #[error("store RPC {method} failed with code {code}: {message}")]
    Rpc {
        method: String,
        code: i64,
        message: String,
    },

    /// The node answered but reported an object error other than absence.
    #[error("{method} could not return {object}: {detail}")]
    Object {
        method: String,
        object: String,
        detail: String,
    },

    /// The response could not be decoded.
    #[error("failed to decode response from {method}: {reason}")]
    Decode { method: String, reason: String },
}

impl StoreError {
    /// Whether this is a network-level failure that a later attempt might
    /// not repeat: transport errors, 5xx/429 statuses, and JSON-RPC server
    /// errors.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Http { .. } => true,
            Self::Status { status, .. } => *status >= 500 || *status == 429,
            // JSON-RPC 2.0 reserves -32000..=-32099 for server errors.
            Self::Rpc { code, .. } => (-32099..=-32000).contains(code) || *code == -32603,
            Self::NotFound { .. } | Self::Object { .. } | Self::Decode { .. } => false,
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Whether this is the `StoreUnavailable` class: the store could not be
    /// reached or did not answer usefully.
    pub fn is_unavailable(&self) -> bool {
        !self.is_not_found()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_transience_follows_http_class() {
        let err = |status| StoreError::Status {
            method: "sui_getObject".into(),
            status,
            body: String::new(),
        };
        assert!(err(503).is_transient());
        assert!(err(429).is_transient());
        assert!(!err(400).is_transient());
    }

    #[test]
    fn not_found_is_neither_transient_nor_unavailable() {
        let err = StoreError::NotFound {
            object: "0x1".into(),
            detail: "notExists".into(),
        };
        assert!(!err.is_transient());
        assert!(!err.is_unavailable());
        assert_eq!(err.to_string(), "0x1 not found: notExists");
    }

    #[test]
    fn rpc_server_errors_are_transient() {
        let err = |code| StoreError::Rpc {
            method: "m".into(),
            code,
            message: "x".into(),
        };
        assert!(err(-32000).is_transient());
        assert!(err(-32603).is_transient());
        assert!(!err(-32602).is_transient());
    }
}
