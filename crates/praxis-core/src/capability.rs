//! Request-scoped capabilities.
//!
//! A capability is a contextual value (pagination, locale, an application
//! tenant, ...) that an action asks for by declaring a parameter of its type.
//! The HTTP layer answers those requests through a [`CapabilityLookup`]
//! supplied per request.
//!
//! # Example
//!
//! ```rust
//! use praxis_core::{Capabilities, CapabilityLookup, TypeKey};
//!
//! #[derive(Clone, Debug, PartialEq)]
//! struct Tenant(String);
//!
//! let mut caps = Capabilities::new();
//! caps.insert(Tenant("acme".into()));
//!
//! let tenant: Option<Tenant> = caps.get();
//! assert_eq!(tenant, Some(Tenant("acme".into())));
//!
//! let found = caps.lookup(&TypeKey::of::<Tenant>()).unwrap();
//! assert!(found.is_some());
//! ```

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use thiserror::Error;

/// A type-erased capability value.
pub type Capability = Arc<dyn Any + Send + Sync>;

/// Identity of a declared parameter type.
///
/// Compares by [`TypeId`]; the name is kept for diagnostics.
#[derive(Clone, Copy)]
pub struct TypeKey {
    id: TypeId,
    name: &'static str,
}

impl TypeKey {
    /// Returns the key for `T`.
    #[must_use]
    pub fn of<T: ?Sized + 'static>() -> Self {
        Self {
            id: TypeId::of::<T>(),
            name: std::any::type_name::<T>(),
        }
    }

    /// Returns the type id.
    #[must_use]
    pub fn id(&self) -> TypeId {
        self.id
    }

    /// Returns the full type name.
    #[must_use]
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Returns the type name without its module path or generics.
    ///
    /// ```rust
    /// use praxis_core::TypeKey;
    ///
    /// struct AccountId;
    /// assert_eq!(TypeKey::of::<AccountId>().short_name(), "AccountId");
    /// ```
    #[must_use]
    pub fn short_name(&self) -> &'static str {
        let base = self.name.split('<').next().unwrap_or(self.name);
        base.rsplit("::").next().unwrap_or(base)
    }
}

impl PartialEq for TypeKey {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for TypeKey {}

impl Hash for TypeKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Debug for TypeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

impl fmt::Display for TypeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

/// A supplier failed to produce a capability from the request.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid {type_name}: {reason}")]
pub struct CapabilityError {
    /// The capability type.
    pub type_name: &'static str,
    /// Why the request value was rejected.
    pub reason: String,
}

impl CapabilityError {
    /// Creates an error for capability type `T`.
    pub fn new<T: ?Sized + 'static>(reason: impl Into<String>) -> Self {
        Self {
            type_name: std::any::type_name::<T>(),
            reason: reason.into(),
        }
    }
}

/// Answers capability requests for one request.
///
/// `Ok(None)` means nothing supplies the type, which is a developer error.
/// `Err` means a supplier exists but the request carries bad values, which is
/// the caller's fault.
pub trait CapabilityLookup: Send + Sync {
    /// Looks up the capability for a declared type.
    fn lookup(&self, key: &TypeKey) -> Result<Option<Capability>, CapabilityError>;
}

impl<F> CapabilityLookup for F
where
    F: Fn(&TypeKey) -> Result<Option<Capability>, CapabilityError> + Send + Sync,
{
    fn lookup(&self, key: &TypeKey) -> Result<Option<Capability>, CapabilityError> {
        self(key)
    }
}

/// A plain container of capability values keyed by type.
#[derive(Default, Clone)]
pub struct Capabilities {
    values: HashMap<TypeKey, Capability>,
}

impl Capabilities {
    /// Creates an empty container.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a value, replacing any previous value of the same type.
    pub fn insert<T: Send + Sync + 'static>(&mut self, value: T) {
        self.values.insert(TypeKey::of::<T>(), Arc::new(value));
    }

    /// Inserts a value, builder style.
    #[must_use]
    pub fn with<T: Send + Sync + 'static>(mut self, value: T) -> Self {
        self.insert(value);
        self
    }

    /// Inserts an already type-erased value under an explicit key.
    pub fn insert_raw(&mut self, key: TypeKey, value: Capability) {
        self.values.insert(key, value);
    }

    /// Returns a clone of the value of type `T`.
    #[must_use]
    pub fn get<T: Clone + Send + Sync + 'static>(&self) -> Option<T> {
        self.values
            .get(&TypeKey::of::<T>())
            .and_then(|v| v.downcast_ref::<T>())
            .cloned()
    }

    /// Returns `true` if a value of the key's type is present.
    #[must_use]
    pub fn contains(&self, key: &TypeKey) -> bool {
        self.values.contains_key(key)
    }

    /// Returns the number of values.
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns `true` if the container is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl CapabilityLookup for Capabilities {
    fn lookup(&self, key: &TypeKey) -> Result<Option<Capability>, CapabilityError> {
        Ok(self.values.get(key).cloned())
    }
}

impl fmt::Debug for Capabilities {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Capabilities")
            .field("types", &self.values.keys().collect::<Vec<_>>())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    struct Tenant(&'static str);

    mod nested {
        pub struct AccountId;
        pub struct Wrapper<T>(pub T);
    }

    #[test]
    fn test_type_key_identity() {
        assert_eq!(TypeKey::of::<Tenant>(), TypeKey::of::<Tenant>());
        assert_ne!(TypeKey::of::<Tenant>(), TypeKey::of::<String>());
    }

    #[test]
    fn test_short_name() {
        assert_eq!(TypeKey::of::<nested::AccountId>().short_name(), "AccountId");
        assert_eq!(
            TypeKey::of::<nested::Wrapper<u64>>().short_name(),
            "Wrapper"
        );
        assert_eq!(TypeKey::of::<u64>().short_name(), "u64");
    }

    #[test]
    fn test_insert_get() {
        let mut caps = Capabilities::new();
        assert!(caps.is_empty());

        caps.insert(Tenant("acme"));
        assert_eq!(caps.len(), 1);
        assert!(caps.contains(&TypeKey::of::<Tenant>()));
        assert_eq!(caps.get::<Tenant>(), Some(Tenant("acme")));
        assert_eq!(caps.get::<String>(), None);

        caps.insert(Tenant("globex"));
        assert_eq!(caps.len(), 1);
        assert_eq!(caps.get::<Tenant>(), Some(Tenant("globex")));
    }

    #[test]
    fn test_lookup_missing_is_none() {
        let caps = Capabilities::new().with(7_u32);
        assert!(caps.lookup(&TypeKey::of::<Tenant>()).unwrap().is_none());
        let value = caps.lookup(&TypeKey::of::<u32>()).unwrap().unwrap();
        assert_eq!(value.downcast_ref::<u32>(), Some(&7));
    }

    #[test]
    fn test_closure_lookup() {
        let lookup = |key: &TypeKey| -> Result<Option<Capability>, CapabilityError> {
            if *key == TypeKey::of::<Tenant>() {
                Err(CapabilityError::new::<Tenant>("unknown tenant"))
            } else {
                Ok(None)
            }
        };
        let err = lookup.lookup(&TypeKey::of::<Tenant>()).unwrap_err();
        assert!(err.to_string().contains("unknown tenant"));
        assert!(lookup.lookup(&TypeKey::of::<u8>()).unwrap().is_none());
    }
}
