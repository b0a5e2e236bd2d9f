/// Supplies the `authorization` header value attached to every request.
///
/// The header is part of the wire contract even when no credential has been
/// issued yet, so implementations return the literal value to send. The
/// request helper forwards it verbatim and never wraps it in a scheme.
pub trait AuthProvider: Send + Sync {
    /// Returns the exact header value for the next request.
    fn authorization_value(&self) -> String;
}

/// Provider for sessions without a credential: the header is sent empty.
#[derive(Debug, Clone, Copy, Default)]
pub struct Anonymous;

impl AuthProvider for Anonymous {
    fn authorization_value(&self) -> String {
        String::new()
    }
}

/// Passes a caller-supplied header value through unchanged.
#[derive(Debug, Clone)]
pub struct StaticValue {
    value: String,
}

impl StaticValue {
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
        }
    }
}

impl AuthProvider for StaticValue {
    fn authorization_value(&self) -> String {
        self.value.clone()
    }
}
