//! Error types for Hilite.

use crate::key::HandlerId;
use crate::mapper::MapperError;

/// A specialized Result type for highlight operations.
pub type Result<T> = std::result::Result<T, HiliteError>;

/// Errors that can occur while mutating or linking highlight handlers.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum HiliteError {
    /// A translator's source handler was offered as one of its own targets.
    #[error("handler {0} cannot be a translation target of itself")]
    SelfTarget(HandlerId),

    /// The key mapper failed while translating an event.
    #[error("key mapper failed: {0}")]
    Mapper(#[from] MapperError),

    /// A listener reported a failure while handling an event.
    #[error("listener {listener} failed: {message}")]
    Listener { listener: String, message: String },

    /// The synchronous cascade grew deeper than a handler allows.
    #[error("highlight cascade exceeded maximum depth of {max_depth}")]
    CascadeDepthExceeded { max_depth: usize },

    /// A handler configuration value is out of range.
    #[error("invalid handler configuration: {0}")]
    InvalidConfig(String),
}

impl HiliteError {
    /// Create a listener failure.
    pub fn listener(listener: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Listener {
            listener: listener.into(),
            message: message.into(),
        }
    }

    /// Create a configuration error.
    pub fn invalid_config(message: impl Into<String>) -> Self {
        Self::InvalidConfig(message.into())
    }
}
