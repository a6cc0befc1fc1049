//! Capability suppliers and per-request lookup.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use praxis_core::{Capabilities, Capability, CapabilityError, CapabilityLookup, TypeKey};
use tracing::debug;

use crate::standard::{EmbedSpec, FieldSelection, Locale, Pagination, PaginationSettings};
use crate::{ExtractionError, FromRequestParts, RequestParts};

type SupplyFn = Arc<dyn Fn(&RequestParts) -> Result<Capability, ExtractionError> + Send + Sync>;

/// Registry of suppliers keyed by capability type.
///
/// Built once at startup and shared. The startup self-check asks it which
/// declared provider types it can satisfy.
///
/// # Example
///
/// ```rust
/// use std::sync::Arc;
/// use praxis_core::{CapabilityLookup, TypeKey};
/// use praxis_extract::{CapabilitySuppliers, Pagination, PaginationSettings, RequestParts};
/// use http::{HeaderMap, Method, Uri};
///
/// let suppliers = Arc::new(CapabilitySuppliers::with_standard(PaginationSettings::default()));
/// assert!(suppliers.supports(&TypeKey::of::<Pagination>()));
///
/// let parts = RequestParts::new(Method::GET, Uri::from_static("/w?page=2"), HeaderMap::new());
/// let lookup = suppliers.for_request(parts);
/// let page = lookup.lookup(&TypeKey::of::<Pagination>()).unwrap().unwrap();
/// assert_eq!(page.downcast_ref::<Pagination>().map(|p| p.page), Some(2));
/// ```
#[derive(Clone, Default)]
pub struct CapabilitySuppliers {
    suppliers: HashMap<TypeKey, SupplyFn>,
}

impl CapabilitySuppliers {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a registry with the standard capabilities.
    #[must_use]
    pub fn with_standard(pagination: PaginationSettings) -> Self {
        let mut suppliers = Self::new();
        suppliers
            .register(move |parts| Pagination::from_parts(parts, &pagination))
            .extractor::<Locale>()
            .extractor::<FieldSelection>()
            .extractor::<EmbedSpec>();
        suppliers
    }

    /// Registers a supplier for `T`, replacing any earlier one.
    pub fn register<T, F>(&mut self, supplier: F) -> &mut Self
    where
        T: Send + Sync + 'static,
        F: Fn(&RequestParts) -> Result<T, ExtractionError> + Send + Sync + 'static,
    {
        let supply: SupplyFn =
            Arc::new(move |parts| supplier(parts).map(|value| Arc::new(value) as Capability));
        self.suppliers.insert(TypeKey::of::<T>(), supply);
        self
    }

    /// Registers `T`'s [`FromRequestParts`] implementation as its supplier.
    pub fn extractor<T>(&mut self) -> &mut Self
    where
        T: FromRequestParts + Send + Sync + 'static,
    {
        self.register(T::from_request_parts)
    }

    /// Returns `true` if a supplier exists for the type.
    #[must_use]
    pub fn supports(&self, key: &TypeKey) -> bool {
        self.suppliers.contains_key(key)
    }

    /// Returns the number of registered suppliers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.suppliers.len()
    }

    /// Returns `true` if nothing is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.suppliers.is_empty()
    }

    /// Runs the supplier for `key`, if there is one.
    pub fn supply(
        &self,
        key: &TypeKey,
        parts: &RequestParts,
    ) -> Option<Result<Capability, ExtractionError>> {
        self.suppliers.get(key).map(|supply| supply(parts))
    }

    /// Binds the registry to one request.
    #[must_use]
    pub fn for_request(self: &Arc<Self>, parts: RequestParts) -> RequestCapabilities {
        RequestCapabilities {
            suppliers: Arc::clone(self),
            parts,
            values: Capabilities::new(),
        }
    }
}

impl fmt::Debug for CapabilitySuppliers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut types: Vec<_> = self.suppliers.keys().map(TypeKey::short_name).collect();
        types.sort_unstable();
        f.debug_struct("CapabilitySuppliers")
            .field("types", &types)
            .finish()
    }
}

/// Capability lookup for one request.
///
/// Values inserted for this request win over registered suppliers.
#[derive(Debug)]
pub struct RequestCapabilities {
    suppliers: Arc<CapabilitySuppliers>,
    parts: RequestParts,
    values: Capabilities,
}

impl RequestCapabilities {
    /// Adds request-specific values, such as an authenticated principal.
    #[must_use]
    pub fn with_values(mut self, values: Capabilities) -> Self {
        self.values = values;
        self
    }

    /// Returns the request parts suppliers read from.
    #[must_use]
    pub fn parts(&self) -> &RequestParts {
        &self.parts
    }
}

impl CapabilityLookup for RequestCapabilities {
    fn lookup(&self, key: &TypeKey) -> Result<Option<Capability>, CapabilityError> {
        if let Some(value) = self.values.lookup(key)? {
            return Ok(Some(value));
        }
        match self.suppliers.supply(key, &self.parts) {
            Some(Ok(value)) => Ok(Some(value)),
            Some(Err(e)) => {
                debug!(capability = key.name(), error = %e, "capability supplier rejected request");
                Err(e.into_capability_error(key))
            }
            None => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ExtractionSource;
    use http::{HeaderMap, Method, Uri};

    #[derive(Debug, Clone, PartialEq)]
    struct Tenant(String);

    fn parts(uri: &'static str) -> RequestParts {
        let mut headers = HeaderMap::new();
        headers.insert("x-tenant", "acme".parse().unwrap());
        RequestParts::new(Method::GET, Uri::from_static(uri), headers)
    }

    fn tenant(parts: &RequestParts) -> Result<Tenant, ExtractionError> {
        parts
            .header("x-tenant")
            .map(|t| Tenant(t.to_string()))
            .ok_or_else(|| ExtractionError::missing(ExtractionSource::Header, "x-tenant"))
    }

    #[test]
    fn test_standard_set() {
        let suppliers = CapabilitySuppliers::with_standard(PaginationSettings::default());
        assert_eq!(suppliers.len(), 4);
        for key in [
            TypeKey::of::<Pagination>(),
            TypeKey::of::<Locale>(),
            TypeKey::of::<FieldSelection>(),
            TypeKey::of::<EmbedSpec>(),
        ] {
            assert!(suppliers.supports(&key), "{key}");
        }
        assert!(!suppliers.supports(&TypeKey::of::<Tenant>()));
    }

    #[test]
    fn test_custom_supplier() {
        let mut suppliers = CapabilitySuppliers::new();
        suppliers.register(tenant);
        let lookup = Arc::new(suppliers).for_request(parts("/w"));

        let value = lookup.lookup(&TypeKey::of::<Tenant>()).unwrap().unwrap();
        assert_eq!(value.downcast_ref::<Tenant>(), Some(&Tenant("acme".into())));
    }

    #[test]
    fn test_unknown_type_is_none() {
        let lookup = Arc::new(CapabilitySuppliers::new()).for_request(parts("/w"));
        assert!(lookup.lookup(&TypeKey::of::<Tenant>()).unwrap().is_none());
    }

    #[test]
    fn test_bad_request_value_is_error() {
        let suppliers = Arc::new(CapabilitySuppliers::with_standard(PaginationSettings::default()));
        let lookup = suppliers.for_request(parts("/w?page=abc"));
        let err = lookup.lookup(&TypeKey::of::<Pagination>()).unwrap_err();
        assert!(err.reason.contains("page"));
    }

    #[test]
    fn test_request_values_win() {
        let mut suppliers = CapabilitySuppliers::new();
        suppliers.register(tenant);
        let lookup = Arc::new(suppliers)
            .for_request(parts("/w"))
            .with_values(Capabilities::new().with(Tenant("override".into())));

        let value = lookup.lookup(&TypeKey::of::<Tenant>()).unwrap().unwrap();
        assert_eq!(value.downcast_ref::<Tenant>(), Some(&Tenant("override".into())));
    }
}
