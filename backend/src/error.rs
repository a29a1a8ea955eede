//! Error taxonomy shared by the coordinate core, the proposal normalizer and
//! the external collaborators.
//!
//! Every failure is classified as one of:
//!
//! - [`PhtError::NotFound`]: object or proposal absent; never retried.
//! - [`PhtError::ValidationError`]: the caller sent something malformed; never
//!   retried, the caller must fix the input.
//! - [`PhtError::UpstreamError`]: a catalog, the ODA, the OSD or the object
//!   store was unreachable or replied with an unexpected shape. These carry a
//!   retryable context so the caller can decide.
//!
//! Configuration and internal errors exist for the service shell only.

use std::fmt;

/// Result type used throughout the crate.
pub type PhtResult<T> = Result<T, PhtError>;

/// Structured context attached to every [`PhtError`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ErrorContext {
    /// The operation being performed (e.g., "resolve", "normalize_for_update")
    pub operation: Option<String>,
    /// The entity type involved (e.g., "proposal", "target", "catalog")
    pub entity: Option<String>,
    /// The entity ID if applicable
    pub entity_id: Option<String>,
    /// Additional details about the error
    pub details: Option<String>,
    /// Whether this error is retryable
    pub retryable: bool,
}

impl ErrorContext {
    /// Create a new error context with an operation name.
    pub fn new(operation: impl Into<String>) -> Self {
        Self {
            operation: Some(operation.into()),
            ..Default::default()
        }
    }

    /// Set the entity type.
    pub fn with_entity(mut self, entity: impl Into<String>) -> Self {
        self.entity = Some(entity.into());
        self
    }

    /// Set the entity ID.
    pub fn with_entity_id(mut self, id: impl ToString) -> Self {
        self.entity_id = Some(id.to_string());
        self
    }

    /// Set additional details.
    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    /// Mark this error as retryable.
    pub fn retryable(mut self) -> Self {
        self.retryable = true;
        self
    }
}

impl fmt::Display for ErrorContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut parts = Vec::new();
        if let Some(ref op) = self.operation {
            parts.push(format!("operation={}", op));
        }
        if let Some(ref entity) = self.entity {
            parts.push(format!("entity={}", entity));
        }
        if let Some(ref id) = self.entity_id {
            parts.push(format!("id={}", id));
        }
        if let Some(ref details) = self.details {
            parts.push(format!("details={}", details));
        }
        if self.retryable {
            parts.push("retryable=true".to_string());
        }
        write!(f, "[{}]", parts.join(", "))
    }
}

/// Error type for every fallible operation in the crate.
#[derive(Debug, thiserror::Error)]
pub enum PhtError {
    /// Object name unknown to every catalog, or proposal id absent from the store.
    #[error("Not found: {message} {context}")]
    NotFound {
        message: String,
        context: ErrorContext,
    },

    /// Malformed input: bad sexagesimal string, missing field, id mismatch.
    #[error("Validation error: {message} {context}")]
    ValidationError {
        message: String,
        context: ErrorContext,
    },

    /// A collaborator was unreachable or answered with an unexpected shape.
    #[error("Upstream error: {message} {context}")]
    UpstreamError {
        message: String,
        context: ErrorContext,
    },

    /// Configuration or initialization error.
    #[error("Configuration error: {message} {context}")]
    ConfigurationError {
        message: String,
        context: ErrorContext,
    },

    /// Internal/unexpected errors.
    #[error("Internal error: {message} {context}")]
    InternalError {
        message: String,
        context: ErrorContext,
    },
}

impl PhtError {
    /// Create a not found error.
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound {
            message: message.into(),
            context: ErrorContext::default(),
        }
    }

    /// Create a not found error with context.
    pub fn not_found_with_context(message: impl Into<String>, context: ErrorContext) -> Self {
        Self::NotFound {
            message: message.into(),
            context,
        }
    }

    /// Create a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::ValidationError {
            message: message.into(),
            context: ErrorContext::default(),
        }
    }

    /// Create a validation error with context.
    pub fn validation_with_context(message: impl Into<String>, context: ErrorContext) -> Self {
        Self::ValidationError {
            message: message.into(),
            context,
        }
    }

    /// Create an upstream error. Upstream errors are always retryable.
    pub fn upstream(message: impl Into<String>) -> Self {
        Self::UpstreamError {
            message: message.into(),
            context: ErrorContext::default().retryable(),
        }
    }

    /// Create an upstream error with context.
    pub fn upstream_with_context(message: impl Into<String>, context: ErrorContext) -> Self {
        Self::UpstreamError {
            message: message.into(),
            context: context.retryable(),
        }
    }

    /// Create a configuration error.
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::ConfigurationError {
            message: message.into(),
            context: ErrorContext::default(),
        }
    }

    /// Create an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::InternalError {
            message: message.into(),
            context: ErrorContext::default(),
        }
    }

    /// Check if this error is retryable.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::UpstreamError { context, .. } => context.retryable,
            _ => false,
        }
    }

    /// The bare message, without the context suffix.
    pub fn message(&self) -> &str {
        match self {
            Self::NotFound { message, .. }
            | Self::ValidationError { message, .. }
            | Self::UpstreamError { message, .. }
            | Self::ConfigurationError { message, .. }
            | Self::InternalError { message, .. } => message,
        }
    }

    /// Get the error context.
    pub fn context(&self) -> &ErrorContext {
        match self {
            Self::NotFound { context, .. }
            | Self::ValidationError { context, .. }
            | Self::UpstreamError { context, .. }
            | Self::ConfigurationError { context, .. }
            | Self::InternalError { context, .. } => context,
        }
    }

    /// Add or update the operation in the error context.
    pub fn with_operation(mut self, operation: impl Into<String>) -> Self {
        match &mut self {
            Self::NotFound { context, .. }
            | Self::ValidationError { context, .. }
            | Self::UpstreamError { context, .. }
            | Self::ConfigurationError { context, .. }
            | Self::InternalError { context, .. } => {
                context.operation = Some(operation.into());
            }
        }
        self
    }
}

impl From<reqwest::Error> for PhtError {
    fn from(err: reqwest::Error) -> Self {
        let details = if err.is_timeout() {
            "timeout"
        } else if err.is_connect() {
            "connect"
        } else if err.is_decode() {
            "decode"
        } else {
            "request"
        };
        PhtError::upstream_with_context(
            err.to_string(),
            ErrorContext::default().with_details(details),
        )
    }
}

impl From<serde_path_to_error::Error<serde_json::Error>> for PhtError {
    fn from(err: serde_path_to_error::Error<serde_json::Error>) -> Self {
        let path = err.path().to_string();
        PhtError::validation_with_context(
            err.into_inner().to_string(),
            ErrorContext::new("parse_payload").with_details(format!("path={}", path)),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_upstream_is_retryable() {
        assert!(PhtError::upstream("catalog down").is_retryable());
        assert!(!PhtError::validation("bad").is_retryable());
        assert!(!PhtError::not_found("nope").is_retryable());
    }

    #[test]
    fn test_display_includes_context() {
        let err = PhtError::not_found_with_context(
            "proposal missing",
            ErrorContext::new("get").with_entity("proposal").with_entity_id("prsl-1"),
        );
        let text = err.to_string();
        assert!(text.starts_with("Not found: proposal missing"));
        assert!(text.contains("operation=get"));
        assert!(text.contains("id=prsl-1"));
        assert_eq!(err.message(), "proposal missing");
    }

    #[test]
    fn test_with_operation_overrides() {
        let err = PhtError::validation("x").with_operation("normalize_for_update");
        assert_eq!(
            err.context().operation.as_deref(),
            Some("normalize_for_update")
        );
    }

    #[test]
    fn test_path_to_error_becomes_validation() {
        #[derive(Debug, serde::Deserialize)]
        #[allow(dead_code)]
        struct Payload {
            count: u32,
        }
        let value = serde_json::json!({ "count": "three" });
        let err: PhtError = serde_path_to_error::deserialize::<_, Payload>(value)
            .unwrap_err()
            .into();
        assert!(matches!(err, PhtError::ValidationError { .. }));
        assert_eq!(err.context().details.as_deref(), Some("path=count"));
    }
}
