//! Error types for Praxis.
//!
//! Dispatch outcomes fall into two groups:
//!
//! | Category | Fault | Status |
//! |---|---|---|
//! | `MalformedRequest` | caller | 400 |
//! | `NotFound` | caller | 404 |
//! | `MethodNotAllowed` | caller | 405 |
//! | `ProviderUnresolved` | developer | 500 |
//! | `ArgumentMismatch` | developer | 500 |
//! | `InvocationFailure` | operation | 500 |
//!
//! Registration problems (`DuplicateKey`, `InvalidAction`) never reach a
//! caller; they are logged and the offending action is left out of the
//! registry.

use http::StatusCode;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type alias using [`DispatchError`].
pub type DispatchResult<T> = Result<T, DispatchError>;

/// Categories of errors for classification and handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCategory {
    /// The request path cannot be shaped into a key, or a request value is bad.
    MalformedRequest,
    /// No operation exists for the resource shape.
    NotFound,
    /// The resource shape is known but not for this verb.
    MethodNotAllowed,
    /// A provider slot has no registered supplier.
    ProviderUnresolved,
    /// An invoker read a slot with the wrong accessor.
    ArgumentMismatch,
    /// Two declarations produce the same routing key.
    DuplicateKey,
    /// An action declaration cannot be turned into a routing key.
    InvalidAction,
    /// The bound operation failed.
    InvocationFailure,
}

impl ErrorCategory {
    /// Returns the default HTTP status code for this error category.
    #[must_use]
    pub const fn default_status_code(&self) -> StatusCode {
        match self {
            Self::MalformedRequest => StatusCode::BAD_REQUEST,
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            Self::ProviderUnresolved
            | Self::ArgumentMismatch
            | Self::DuplicateKey
            | Self::InvalidAction
            | Self::InvocationFailure => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Returns `true` if the caller caused the error.
    #[must_use]
    pub const fn is_caller_fault(&self) -> bool {
        matches!(
            self,
            Self::MalformedRequest | Self::NotFound | Self::MethodNotAllowed
        )
    }

    /// Returns `true` if the error points at a misconfigured action.
    #[must_use]
    pub const fn is_developer_fault(&self) -> bool {
        matches!(
            self,
            Self::ProviderUnresolved | Self::ArgumentMismatch | Self::DuplicateKey | Self::InvalidAction
        )
    }

    /// Returns the machine-readable code.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::MalformedRequest => "MALFORMED_REQUEST",
            Self::NotFound => "NOT_FOUND",
            Self::MethodNotAllowed => "METHOD_NOT_ALLOWED",
            Self::ProviderUnresolved => "PROVIDER_UNRESOLVED",
            Self::ArgumentMismatch => "ARGUMENT_MISMATCH",
            Self::DuplicateKey => "DUPLICATE_KEY",
            Self::InvalidAction => "INVALID_ACTION",
            Self::InvocationFailure => "INVOCATION_FAILURE",
        }
    }
}

/// Errors produced while dispatching one request.
///
/// # Example
///
/// ```
/// use praxis_core::{DispatchError, ErrorCategory};
///
/// let error = DispatchError::malformed("path is empty");
/// assert_eq!(error.category(), ErrorCategory::MalformedRequest);
/// assert!(error.is_caller_fault());
/// ```
#[derive(Error, Debug)]
pub enum DispatchError {
    /// The request cannot be shaped into a routing key or carries bad values.
    #[error("Malformed request: {message}")]
    MalformedRequest {
        /// Human-readable error message.
        message: String,
    },

    /// No operation is registered for the resource shape.
    #[error("No action for {shape}")]
    NotFound {
        /// The verb-less route shape.
        shape: String,
    },

    /// The resource shape is known but does not accept the verb.
    #[error("{verb} not allowed for {shape}")]
    MethodNotAllowed {
        /// The requested verb.
        verb: String,
        /// The verb-less route shape.
        shape: String,
        /// Verbs registered for the shape, sorted.
        allowed: Vec<String>,
    },

    /// A provider slot has no supplier.
    #[error("No capability provider for {type_name} (action {action}, key {key})")]
    ProviderUnresolved {
        /// The declared parameter type.
        type_name: &'static str,
        /// The routing key of the action.
        key: String,
        /// The router and method that declared the slot.
        action: String,
    },

    /// An invoker asked for an argument the plan does not hold.
    #[error("Argument mismatch at slot {slot}: expected {expected}")]
    ArgumentMismatch {
        /// Slot position.
        slot: usize,
        /// What the invoker expected.
        expected: String,
    },

    /// The operation itself failed.
    #[error(transparent)]
    Invocation(anyhow::Error),
}

impl DispatchError {
    /// Creates a malformed-request error.
    #[must_use]
    pub fn malformed(message: impl Into<String>) -> Self {
        Self::MalformedRequest {
            message: message.into(),
        }
    }

    /// Creates a not-found error.
    #[must_use]
    pub fn not_found(shape: impl Into<String>) -> Self {
        Self::NotFound {
            shape: shape.into(),
        }
    }

    /// Creates a method-not-allowed error.
    #[must_use]
    pub fn method_not_allowed(
        verb: impl Into<String>,
        shape: impl Into<String>,
        allowed: Vec<String>,
    ) -> Self {
        Self::MethodNotAllowed {
            verb: verb.into(),
            shape: shape.into(),
            allowed,
        }
    }

    /// Creates an argument-mismatch error.
    #[must_use]
    pub fn argument_mismatch(slot: usize, expected: impl Into<String>) -> Self {
        Self::ArgumentMismatch {
            slot,
            expected: expected.into(),
        }
    }

    /// Wraps an operation failure.
    ///
    /// An operation that already failed with a `DispatchError` keeps its
    /// category instead of being wrapped again.
    pub fn invocation<E: Into<anyhow::Error>>(error: E) -> Self {
        match error.into().downcast::<Self>() {
            Ok(dispatch) => dispatch,
            Err(other) => Self::Invocation(other),
        }
    }

    /// Returns the error category.
    #[must_use]
    pub const fn category(&self) -> ErrorCategory {
        match self {
            Self::MalformedRequest { .. } => ErrorCategory::MalformedRequest,
            Self::NotFound { .. } => ErrorCategory::NotFound,
            Self::MethodNotAllowed { .. } => ErrorCategory::MethodNotAllowed,
            Self::ProviderUnresolved { .. } => ErrorCategory::ProviderUnresolved,
            Self::ArgumentMismatch { .. } => ErrorCategory::ArgumentMismatch,
            Self::Invocation(_) => ErrorCategory::InvocationFailure,
        }
    }

    /// Returns `true` if the caller caused the error.
    #[must_use]
    pub const fn is_caller_fault(&self) -> bool {
        self.category().is_caller_fault()
    }

    /// Returns the HTTP status code for this error.
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        self.category().default_status_code()
    }

    /// Returns the allowed verbs for a method-not-allowed error.
    #[must_use]
    pub fn allowed_verbs(&self) -> Option<&[String]> {
        match self {
            Self::MethodNotAllowed { allowed, .. } => Some(allowed),
            _ => None,
        }
    }

    /// Returns the wrapped operation failure, if any.
    #[must_use]
    pub fn as_invocation(&self) -> Option<&anyhow::Error> {
        match self {
            Self::Invocation(error) => Some(error),
            _ => None,
        }
    }

    /// Converts this error to a serializable error envelope.
    ///
    /// Developer-fault and operation errors expose only their category in
    /// the message; details stay in the logs.
    #[must_use]
    pub fn to_envelope(&self, request_id: Option<&str>) -> ErrorEnvelope {
        let category = self.category();
        let message = if category.is_caller_fault() {
            self.to_string()
        } else {
            "internal error".to_string()
        };
        let details = self
            .allowed_verbs()
            .map(|allowed| serde_json::json!({ "allowed": allowed }));

        ErrorEnvelope {
            error: ErrorDetail {
                code: category.code().to_string(),
                message,
                details,
            },
            request_id: request_id.map(ToString::to_string),
        }
    }
}

/// Errors raised while registering an action.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RegistrationError {
    /// The action's key is already taken.
    #[error("Duplicate key {key}: {rejected} rejected, {existing} kept")]
    DuplicateKey {
        /// The contested routing key.
        key: String,
        /// The action that owns the key.
        existing: String,
        /// The action that was rejected.
        rejected: String,
    },

    /// The action declaration is unusable.
    #[error("Invalid action {action}: {reason}")]
    InvalidAction {
        /// The router and method.
        action: String,
        /// Why the declaration was rejected.
        reason: String,
    },
}

impl RegistrationError {
    /// Creates an invalid-action error.
    #[must_use]
    pub fn invalid(action: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidAction {
            action: action.into(),
            reason: reason.into(),
        }
    }

    /// Returns the error category.
    #[must_use]
    pub const fn category(&self) -> ErrorCategory {
        match self {
            Self::DuplicateKey { .. } => ErrorCategory::DuplicateKey,
            Self::InvalidAction { .. } => ErrorCategory::InvalidAction,
        }
    }
}

/// Serializable error envelope for HTTP responses.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorEnvelope {
    /// The error details.
    pub error: ErrorDetail,
    /// The request ID for correlation.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
}

/// Error detail within an envelope.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorDetail {
    /// Machine-readable error code.
    pub code: String,
    /// Human-readable error message.
    pub message: String,
    /// Additional error details.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_caller_faults() {
        let errors = [
            DispatchError::malformed("bad"),
            DispatchError::not_found("/widgets"),
            DispatchError::method_not_allowed("PATCH", "/widgets", vec!["GET".into()]),
        ];
        for error in errors {
            assert!(error.is_caller_fault(), "{error:?}");
            assert!(error.status_code().is_client_error());
        }
    }

    #[test]
    fn test_developer_faults() {
        let unresolved = DispatchError::ProviderUnresolved {
            type_name: "app::Tenant",
            key: "GET /widgets".into(),
            action: "WidgetRouter::list".into(),
        };
        assert!(!unresolved.is_caller_fault());
        assert!(unresolved.category().is_developer_fault());
        assert_eq!(unresolved.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(unresolved.to_string().contains("app::Tenant"));

        let mismatch = DispatchError::argument_mismatch(2, "identifier");
        assert!(mismatch.category().is_developer_fault());
    }

    #[test]
    fn test_invocation_is_transparent() {
        let error = DispatchError::invocation(std::io::Error::new(
            std::io::ErrorKind::Other,
            "disk on fire",
        ));
        assert_eq!(error.category(), ErrorCategory::InvocationFailure);
        assert_eq!(error.to_string(), "disk on fire");
        assert!(error
            .as_invocation()
            .and_then(|e| e.downcast_ref::<std::io::Error>())
            .is_some());
        assert!(!error.category().is_developer_fault());
    }

    #[test]
    fn test_invocation_keeps_dispatch_errors() {
        let error = DispatchError::invocation(DispatchError::malformed("bad id"));
        assert_eq!(error.category(), ErrorCategory::MalformedRequest);

        let error = DispatchError::invocation(anyhow::anyhow!("plain"));
        assert_eq!(error.category(), ErrorCategory::InvocationFailure);
    }

    #[test]
    fn test_allowed_verbs() {
        let error = DispatchError::method_not_allowed(
            "PATCH",
            "/widgets",
            vec!["DELETE".into(), "GET".into()],
        );
        assert_eq!(error.status_code(), StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(
            error.allowed_verbs(),
            Some(&["DELETE".to_string(), "GET".to_string()][..])
        );
        assert_eq!(DispatchError::not_found("/x").allowed_verbs(), None);
    }

    #[test]
    fn test_envelope_serialization() {
        let error = DispatchError::method_not_allowed("PATCH", "/widgets", vec!["GET".into()]);
        let envelope = error.to_envelope(Some("req-1"));
        let json = serde_json::to_value(&envelope).unwrap();

        assert_eq!(json["error"]["code"], "METHOD_NOT_ALLOWED");
        assert_eq!(json["error"]["details"]["allowed"][0], "GET");
        assert_eq!(json["request_id"], "req-1");
    }

    #[test]
    fn test_envelope_hides_internal_detail() {
        let error = DispatchError::invocation(anyhow::anyhow!("db password rejected"));
        let envelope = error.to_envelope(None);
        assert_eq!(envelope.error.code, "INVOCATION_FAILURE");
        assert_eq!(envelope.error.message, "internal error");
        assert!(envelope.request_id.is_none());
    }

    #[test]
    fn test_registration_error_categories() {
        let duplicate = RegistrationError::DuplicateKey {
            key: "GET /widgets".into(),
            existing: "A::list".into(),
            rejected: "A::list_again".into(),
        };
        assert_eq!(duplicate.category(), ErrorCategory::DuplicateKey);
        assert!(duplicate.category().is_developer_fault());

        let invalid = RegistrationError::invalid("A::bad", "invalid verb");
        assert_eq!(invalid.category(), ErrorCategory::InvalidAction);
        assert_eq!(invalid.category().code(), "INVALID_ACTION");
    }
}
