use thiserror::Error;

/// A convenience `Result` alias using [`BridgeError`].
pub type BridgeResult<T> = Result<T, BridgeError>;

/// Top-level error type for skillbridge.
///
/// The first five variants are the failure kinds a caller of `ask` can
/// distinguish; the rest are supporting errors raised by the surrounding
/// plumbing (configuration, model provider transport, serialization).
#[derive(Error, Debug)]
pub enum BridgeError {
    /// The capability card could not be fetched or parsed.
    #[error("Discovery error: {0}")]
    Discovery(String),

    /// Two or more skills in one card share a name.
    #[error("Binding error: {0}")]
    Binding(String),

    /// A single remote skill call failed at the transport level.
    #[error("Remote invocation error{}: {message}", status_suffix(.status))]
    RemoteInvocation {
        /// HTTP status returned by the remote agent, if one was received.
        status: Option<u16>,
        /// Human-readable cause.
        message: String,
    },

    /// The reasoning session failed independently of any tool call.
    #[error("Orchestration error: {0}")]
    Orchestration(String),

    /// The caller cancelled the operation before it completed.
    #[error("Operation cancelled")]
    Cancelled,

    /// A tool call could not be dispatched (unknown tool, bad arguments).
    #[error("Tool error: {0}")]
    Tool(String),

    /// An error in configuration parsing or validation.
    #[error("Config error: {0}")]
    Config(String),

    /// An error from an outbound HTTP request to a model provider.
    #[error("HTTP error: {0}")]
    Http(String),

    /// A JSON serialization or deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A standard I/O error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

fn status_suffix(status: &Option<u16>) -> String {
    status.map(|s| format!(" (status {s})")).unwrap_or_default()
}

/// Coarse classification of a [`BridgeError`], used by outer surfaces to
/// choose a response without matching on messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// See [`BridgeError::Discovery`].
    Discovery,
    /// See [`BridgeError::Binding`].
    Binding,
    /// See [`BridgeError::RemoteInvocation`].
    RemoteInvocation,
    /// See [`BridgeError::Orchestration`].
    Orchestration,
    /// See [`BridgeError::Cancelled`].
    Cancelled,
    /// Everything else.
    Internal,
}

impl BridgeError {
    /// Shorthand for a [`BridgeError::RemoteInvocation`] without an HTTP status.
    pub fn remote(message: impl Into<String>) -> Self {
        Self::RemoteInvocation {
            status: None,
            message: message.into(),
        }
    }

    /// Classify this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Discovery(_) => ErrorKind::Discovery,
            Self::Binding(_) => ErrorKind::Binding,
            Self::RemoteInvocation { .. } => ErrorKind::RemoteInvocation,
            Self::Orchestration(_) => ErrorKind::Orchestration,
            Self::Cancelled => ErrorKind::Cancelled,
            Self::Tool(_) | Self::Config(_) | Self::Http(_) | Self::Json(_) | Self::Io(_) => {
                ErrorKind::Internal
            }
        }
    }

    /// Returns true if this error is the cancellation signal.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
}
