/// Category of a tracker error. Lets the boundary collaborators map
/// failures onto transport codes without inspecting messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Backing store or sibling service unreachable, errored, or timed out.
    Unavailable,
    /// Malformed identity, payload or timestamp at a serialization boundary.
    InvalidInput,
    /// Invalid configuration; fails startup.
    Config,
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorKind::Unavailable => f.write_str("unavailable"),
            ErrorKind::InvalidInput => f.write_str("invalid input"),
            ErrorKind::Config => f.write_str("config"),
        }
    }
}

/// Unified error type for store, fetch and publish capabilities.
///
/// Carries an `ErrorKind` for categorization and a human-readable message.
/// `From` impls assign the appropriate kind automatically and allow
/// ergonomic `?` in implementations.
#[derive(Clone)]
pub struct TrackerError {
    kind: ErrorKind,
    message: String,
}

impl TrackerError {
    /// Storage unreachable. Never retried internally.
    pub fn unavailable(msg: impl Into<String>) -> Self {
        Self { kind: ErrorKind::Unavailable, message: msg.into() }
    }

    /// Rejected before reaching the store or estimator.
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self { kind: ErrorKind::InvalidInput, message: msg.into() }
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self { kind: ErrorKind::Config, message: msg.into() }
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn is_unavailable(&self) -> bool {
        self.kind == ErrorKind::Unavailable
    }

    /// Add context to the error, preserving the original ErrorKind.
    ///
    /// Produces: `"context: original message"`.
    pub fn with_context(self, ctx: impl std::fmt::Display) -> Self {
        Self {
            kind: self.kind,
            message: format!("{ctx}: {}", self.message),
        }
    }
}

impl std::fmt::Debug for TrackerError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}", self.kind, self.message)
    }
}

impl std::fmt::Display for TrackerError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for TrackerError {}

impl From<std::io::Error> for TrackerError {
    fn from(e: std::io::Error) -> Self { Self { kind: ErrorKind::Unavailable, message: e.to_string() } }
}

impl From<serde_json::Error> for TrackerError {
    fn from(e: serde_json::Error) -> Self { Self { kind: ErrorKind::InvalidInput, message: e.to_string() } }
}

impl From<chrono::ParseError> for TrackerError {
    fn from(e: chrono::ParseError) -> Self { Self { kind: ErrorKind::InvalidInput, message: e.to_string() } }
}
