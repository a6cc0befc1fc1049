//! Extraction error types.
//!
//! A supplier that cannot build its capability from the request reports an
//! [`ExtractionError`]. These are always the caller's fault and surface as
//! `MALFORMED_REQUEST`.

use http::StatusCode;
use praxis_core::{CapabilityError, TypeKey};
use std::fmt;

/// Where the offending value was read from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtractionSource {
    /// Query string parameters
    Query,
    /// HTTP headers
    Header,
    /// Anything else a custom supplier reads
    Other,
}

impl fmt::Display for ExtractionSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Query => write!(f, "query"),
            Self::Header => write!(f, "header"),
            Self::Other => write!(f, "other"),
        }
    }
}

/// Error that occurs while building a capability from a request.
///
/// # Example
///
/// ```rust
/// use praxis_extract::{ExtractionError, ExtractionSource};
/// use http::StatusCode;
///
/// let err = ExtractionError::invalid_type(ExtractionSource::Query, "page", "expected integer");
/// assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
/// assert_eq!(err.source(), ExtractionSource::Query);
/// assert!(err.to_string().contains("page"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractionError {
    extraction_source: ExtractionSource,
    kind: ExtractionErrorKind,
    field: Option<String>,
    message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ExtractionErrorKind {
    /// Required parameter is missing
    Missing,
    /// Value has invalid type or format
    InvalidType,
    /// Query string could not be decoded
    DeserializationFailed,
    /// Anything a custom supplier reports
    Custom,
}

impl ExtractionError {
    /// Creates an error for a missing parameter.
    #[must_use]
    pub fn missing(source: ExtractionSource, field: impl Into<String>) -> Self {
        let field = field.into();
        Self {
            extraction_source: source,
            kind: ExtractionErrorKind::Missing,
            message: format!("missing required {source} parameter: {field}"),
            field: Some(field),
        }
    }

    /// Creates an error for an invalid type or format.
    #[must_use]
    pub fn invalid_type(
        source: ExtractionSource,
        field: impl Into<String>,
        details: impl Into<String>,
    ) -> Self {
        let field = field.into();
        let details = details.into();
        Self {
            extraction_source: source,
            kind: ExtractionErrorKind::InvalidType,
            message: format!("invalid {source} parameter '{field}': {details}"),
            field: Some(field),
        }
    }

    /// Creates an error for an undecodable source.
    #[must_use]
    pub fn deserialization_failed(source: ExtractionSource, error: impl Into<String>) -> Self {
        let error = error.into();
        Self {
            extraction_source: source,
            kind: ExtractionErrorKind::DeserializationFailed,
            message: format!("failed to deserialize {source}: {error}"),
            field: None,
        }
    }

    /// Creates a custom error.
    #[must_use]
    pub fn custom(
        source: ExtractionSource,
        field: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            extraction_source: source,
            kind: ExtractionErrorKind::Custom,
            message: message.into(),
            field: Some(field.into()),
        }
    }

    /// Returns the extraction source.
    #[must_use]
    pub fn source(&self) -> ExtractionSource {
        self.extraction_source
    }

    /// Returns the field name if applicable.
    #[must_use]
    pub fn field(&self) -> Option<&str> {
        self.field.as_deref()
    }

    /// Returns the HTTP status code for this error.
    ///
    /// Always a client error: the supplier exists, the request is wrong.
    #[must_use]
    pub fn status_code(&self) -> StatusCode {
        StatusCode::BAD_REQUEST
    }

    /// Returns the error code suitable for error envelopes.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self.kind {
            ExtractionErrorKind::Missing => "MISSING_PARAMETER",
            ExtractionErrorKind::InvalidType => "INVALID_PARAMETER",
            ExtractionErrorKind::DeserializationFailed => "DESERIALIZATION_FAILED",
            ExtractionErrorKind::Custom => "EXTRACTION_FAILED",
        }
    }

    /// Converts into the dispatch-level capability error for `key`.
    #[must_use]
    pub fn into_capability_error(self, key: &TypeKey) -> CapabilityError {
        CapabilityError {
            type_name: key.name(),
            reason: self.message,
        }
    }
}

impl fmt::Display for ExtractionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for ExtractionError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_error() {
        let err = ExtractionError::missing(ExtractionSource::Header, "x-tenant");

        assert_eq!(err.source(), ExtractionSource::Header);
        assert_eq!(err.field(), Some("x-tenant"));
        assert_eq!(err.error_code(), "MISSING_PARAMETER");
        assert!(err.to_string().contains("missing"));
    }

    #[test]
    fn test_invalid_type_error() {
        let err = ExtractionError::invalid_type(ExtractionSource::Query, "per_page", "expected integer");

        assert_eq!(err.field(), Some("per_page"));
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(err.error_code(), "INVALID_PARAMETER");
        assert!(err.to_string().contains("expected integer"));
    }

    #[test]
    fn test_into_capability_error() {
        struct Pagination;

        let err = ExtractionError::invalid_type(ExtractionSource::Query, "page", "expected integer");
        let key = TypeKey::of::<Pagination>();
        let converted = err.into_capability_error(&key);

        assert_eq!(converted.type_name, key.name());
        assert!(converted.reason.contains("page"));
    }

    #[test]
    fn test_extraction_source_display() {
        assert_eq!(ExtractionSource::Query.to_string(), "query");
        assert_eq!(ExtractionSource::Header.to_string(), "header");
        assert_eq!(ExtractionSource::Other.to_string(), "other");
    }
}
