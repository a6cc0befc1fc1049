//! Core extractor trait.

use crate::{ExtractionError, RequestParts};

/// Types that can be built from the parts of a request.
///
/// Implementors can be registered as capability suppliers with
/// [`CapabilitySuppliers::extractor`](crate::CapabilitySuppliers::extractor).
///
/// # Example
///
/// ```rust
/// use praxis_extract::{ExtractionError, ExtractionSource, FromRequestParts, RequestParts};
///
/// #[derive(Clone)]
/// struct Tenant(String);
///
/// impl FromRequestParts for Tenant {
///     fn from_request_parts(parts: &RequestParts) -> Result<Self, ExtractionError> {
///         parts
///             .header("x-tenant")
///             .map(|t| Tenant(t.to_string()))
///             .ok_or_else(|| ExtractionError::missing(ExtractionSource::Header, "x-tenant"))
///     }
/// }
/// ```
pub trait FromRequestParts: Sized {
    /// Builds this type from the request parts.
    ///
    /// # Errors
    ///
    /// Returns an [`ExtractionError`] if the request carries bad values.
    fn from_request_parts(parts: &RequestParts) -> Result<Self, ExtractionError>;
}

// Optional extraction: a failure becomes `None`.
impl<T: FromRequestParts> FromRequestParts for Option<T> {
    fn from_request_parts(parts: &RequestParts) -> Result<Self, ExtractionError> {
        Ok(T::from_request_parts(parts).ok())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ExtractionSource;
    use http::{HeaderMap, Method, Uri};

    struct Tenant(String);

    impl FromRequestParts for Tenant {
        fn from_request_parts(parts: &RequestParts) -> Result<Self, ExtractionError> {
            parts
                .header("x-tenant")
                .map(|t| Tenant(t.to_string()))
                .ok_or_else(|| ExtractionError::missing(ExtractionSource::Header, "x-tenant"))
        }
    }

    #[test]
    fn test_optional_extraction() {
        let parts = RequestParts::new(Method::GET, Uri::from_static("/"), HeaderMap::new());
        assert!(Tenant::from_request_parts(&parts).is_err());
        assert!(Option::<Tenant>::from_request_parts(&parts).unwrap().is_none());

        let mut headers = HeaderMap::new();
        headers.insert("x-tenant", "acme".parse().unwrap());
        let parts = RequestParts::new(Method::GET, Uri::from_static("/"), headers);
        let tenant = Option::<Tenant>::from_request_parts(&parts).unwrap();
        assert_eq!(tenant.map(|t| t.0).as_deref(), Some("acme"));
    }
}
