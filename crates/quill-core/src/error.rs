//! Error types for the Quill data layer.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::entity::EntityKind;
use crate::schema::ValidationError;

/// A shared error type for the entire Quill data layer.
///
/// Errors are `Clone` because a single failed fetch is reported to every
/// consumer attached to that request.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum QuillError {
    /// Network or HTTP failure reported by the API client
    #[error("Transport error{}: {message}", status.map(|s| format!(" (HTTP {s})")).unwrap_or_default())]
    Transport {
        status: Option<u16>,
        message: String,
    },

    /// Response payload did not match the entity schema
    #[error("Validation error: {kind} - {message}")]
    Validation { kind: EntityKind, message: String },

    /// The remote entity does not exist
    #[error("Entity not found: {kind} '{id}'")]
    NotFound { kind: EntityKind, id: String },

    /// A mutation was called without its endpoint configured
    #[error("No {method} endpoint configured")]
    MissingEndpoint { method: String },

    /// The consumer scope was cancelled before the request settled
    #[error("Cancelled")]
    Cancelled,

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// IO error (file system operations)
    #[error("IO error: {message}")]
    Io { message: String },

    /// Serialization/deserialization error outside of entity validation
    #[error("Serialization error: {format} - {message}")]
    Serialization { format: String, message: String },

    /// Internal error (should not happen in normal operation)
    #[error("Internal error: {0}")]
    Internal(String),
}

impl QuillError {
    // ============================================================================
    // Constructor helpers
    // ============================================================================

    /// Creates a Transport error
    pub fn transport(status: Option<u16>, message: impl Into<String>) -> Self {
        Self::Transport {
            status,
            message: message.into(),
        }
    }

    /// Creates a NotFound error
    pub fn not_found(kind: EntityKind, id: impl Into<String>) -> Self {
        Self::NotFound {
            kind,
            id: id.into(),
        }
    }

    /// Creates a MissingEndpoint error
    pub fn missing_endpoint(method: impl Into<String>) -> Self {
        Self::MissingEndpoint {
            method: method.into(),
        }
    }

    /// Creates a Config error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Creates an Internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    // ============================================================================
    // Type checking methods
    // ============================================================================

    /// Check if this is a NotFound error
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Check if this is a transport error
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Transport { .. })
    }

    /// Check if this is a validation error
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation { .. })
    }

    /// Check if this is a cancellation
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }

    /// HTTP status carried by a transport error, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Transport { status, .. } => *status,
            _ => None,
        }
    }

    /// Rewrites a transport 404 into a `NotFound` for the given entity.
    ///
    /// Other errors pass through untouched.
    pub fn into_not_found(self, kind: EntityKind, id: &str) -> Self {
        match self {
            Self::Transport {
                status: Some(404), ..
            } => Self::not_found(kind, id),
            other => other,
        }
    }
}

// ============================================================================
// From implementations for automatic conversion
// ============================================================================

impl From<ValidationError> for QuillError {
    fn from(err: ValidationError) -> Self {
        Self::Validation {
            kind: err.kind,
            message: err.message,
        }
    }
}

impl From<std::io::Error> for QuillError {
    fn from(err: std::io::Error) -> Self {
        Self::Io {
            message: format!("{} (kind: {:?})", err, err.kind()),
        }
    }
}

impl From<serde_json::Error> for QuillError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization {
            format: "JSON".to_string(),
            message: err.to_string(),
        }
    }
}

impl From<toml::de::Error> for QuillError {
    fn from(err: toml::de::Error) -> Self {
        Self::Serialization {
            format: "TOML".to_string(),
            message: err.to_string(),
        }
    }
}

/// A type alias for `Result<T, QuillError>`.
pub type Result<T> = std::result::Result<T, QuillError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transport_404_becomes_not_found() {
        let err = QuillError::transport(Some(404), "Record not found");
        let mapped = err.into_not_found(EntityKind::Accounts, "42");
        assert_eq!(mapped, QuillError::not_found(EntityKind::Accounts, "42"));
        assert!(mapped.is_not_found());
    }

    #[test]
    fn test_other_errors_pass_through() {
        let err = QuillError::transport(Some(500), "boom");
        let mapped = err.clone().into_not_found(EntityKind::Accounts, "42");
        assert_eq!(mapped, err);
        assert_eq!(mapped.status(), Some(500));
    }

    #[test]
    fn test_transport_display_includes_status() {
        let err = QuillError::transport(Some(502), "bad gateway");
        assert_eq!(err.to_string(), "Transport error (HTTP 502): bad gateway");

        let err = QuillError::transport(None, "connection refused");
        assert_eq!(err.to_string(), "Transport error: connection refused");
    }

    #[test]
    fn test_validation_error_conversion() {
        let err: QuillError = ValidationError::new(EntityKind::Groups, "missing id").into();
        assert!(err.is_validation());
        assert_eq!(err.to_string(), "Validation error: groups - missing id");
    }
}
