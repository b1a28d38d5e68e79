//! # fluxgate-error
//!
//! Unified error types for the fluxgate gateway client.
//!
//! All errors are machine-parseable with:
//! - Numeric error codes (FLUXGATE-XXXX)
//! - Structured JSON context
//! - Optional hints for correcting the input

mod code;
mod context;
mod convert;

pub use code::{ErrorCategory, ErrorCode};
pub use context::ErrorContext;
pub use convert::find_closest_match;

use serde::{Deserialize, Serialize};
use std::fmt;

/// The unified error type surfaced by fluxgate front-ends.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FluxgateError {
    /// Numeric error code (e.g., "FLUXGATE-2001")
    pub code: ErrorCode,

    /// Human-readable error message
    pub message: String,

    /// Structured context for programmatic handling
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<ErrorContext>,

    /// Suggestion for correcting the input
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
}

impl FluxgateError {
    /// Create a new error with code and message
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            context: None,
            hint: None,
        }
    }

    /// Add structured context
    pub fn with_context(mut self, context: ErrorContext) -> Self {
        self.context = Some(context);
        self
    }

    /// Add a hint
    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }

    pub fn category(&self) -> ErrorCategory {
        self.code.category()
    }

    /// Serialize to JSON for machine-readable output
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|e| {
            tracing::warn!("Failed to serialize FluxgateError: {}", e);
            format!(
                r#"{{"code":"{}","message":"Serialization failed"}}"#,
                self.code
            )
        })
    }
}

impl fmt::Display for FluxgateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)?;
        if let Some(hint) = &self.hint {
            write!(f, " (Hint: {})", hint)?;
        }
        Ok(())
    }
}

impl std::error::Error for FluxgateError {}

/// Result type alias for fluxgate operations
pub type Result<T> = std::result::Result<T, FluxgateError>;
