//! Handler configuration.

use crate::error::{HiliteError, Result};
use crate::handler::HighlightHandler;
use crate::key::HighlightKey;

/// Configuration for creating a [`HighlightHandler`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HandlerConfig {
    /// Name shown in logs and `Debug` output.
    pub name: Option<String>,
    /// Deepest synchronous cascade this handler will join.
    ///
    /// `None` disables the guard: cyclic translator wirings then recurse
    /// until the stack is exhausted.
    pub max_cascade_depth: Option<usize>,
}

impl HandlerConfig {
    /// Create a new configuration with the given handler name.
    pub fn with_name(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Default::default()
        }
    }

    /// Check that every value is in range.
    pub fn validate(&self) -> Result<()> {
        if self.max_cascade_depth == Some(0) {
            return Err(HiliteError::invalid_config(
                "max_cascade_depth must be at least 1",
            ));
        }
        Ok(())
    }
}

/// Builder for creating handlers with custom configuration.
#[derive(Debug, Default)]
pub struct HandlerBuilder {
    config: HandlerConfig,
}

impl HandlerBuilder {
    /// Create a new builder with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the handler name.
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.config.name = Some(name.into());
        self
    }

    /// Refuse mutations once the cascade is already `depth` calls deep.
    pub fn max_cascade_depth(mut self, depth: usize) -> Self {
        self.config.max_cascade_depth = Some(depth);
        self
    }

    /// Validate the configuration and create the handler.
    pub fn build<K: HighlightKey>(self) -> Result<HighlightHandler<K>> {
        HighlightHandler::with_config(self.config)
    }
}
