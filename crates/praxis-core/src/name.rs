//! Resource name resolution.
//!
//! A nested action names its parent through the *type* of its parent
//! identifier parameter (`AccountId`, say). A [`NameResolver`] turns that type
//! into the routing name of the parent resource (`accounts`).

use std::collections::HashMap;
use std::fmt;

use crate::capability::TypeKey;

/// Maps identifier types to resource names.
pub trait NameResolver: Send + Sync {
    /// Returns the resource name for an identifier type.
    fn resource_name(&self, ty: &TypeKey) -> Option<String>;

    /// Falls back to `other` when this resolver has no answer.
    fn or<R: NameResolver>(self, other: R) -> Or<Self, R>
    where
        Self: Sized,
    {
        Or {
            first: self,
            second: other,
        }
    }
}

impl<F> NameResolver for F
where
    F: Fn(&TypeKey) -> Option<String> + Send + Sync,
{
    fn resource_name(&self, ty: &TypeKey) -> Option<String> {
        self(ty)
    }
}

/// Two resolvers tried in order.
#[derive(Debug, Clone)]
pub struct Or<A, B> {
    first: A,
    second: B,
}

impl<A: NameResolver, B: NameResolver> NameResolver for Or<A, B> {
    fn resource_name(&self, ty: &TypeKey) -> Option<String> {
        self.first
            .resource_name(ty)
            .or_else(|| self.second.resource_name(ty))
    }
}

/// An explicit table of type to resource name.
///
/// # Example
///
/// ```rust
/// use praxis_core::{NameResolver, NameTable, TypeKey};
///
/// struct OrgKey;
///
/// let names = NameTable::new().with::<OrgKey>("organizations");
/// assert_eq!(
///     names.resource_name(&TypeKey::of::<OrgKey>()).as_deref(),
///     Some("organizations")
/// );
/// ```
#[derive(Default, Clone)]
pub struct NameTable {
    names: HashMap<TypeKey, String>,
}

impl NameTable {
    /// Creates an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Maps `T` to a resource name.
    pub fn insert<T: ?Sized + 'static>(&mut self, name: impl Into<String>) {
        self.names.insert(TypeKey::of::<T>(), name.into());
    }

    /// Maps `T` to a resource name, builder style.
    #[must_use]
    pub fn with<T: ?Sized + 'static>(mut self, name: impl Into<String>) -> Self {
        self.insert::<T>(name);
        self
    }

    /// Returns the number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// Returns `true` if the table is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

impl NameResolver for NameTable {
    fn resource_name(&self, ty: &TypeKey) -> Option<String> {
        self.names.get(ty).cloned()
    }
}

impl fmt::Debug for NameTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map()
            .entries(self.names.iter().map(|(k, v)| (k.name(), v)))
            .finish()
    }
}

/// Derives resource names from identifier type names.
///
/// Strips an `Id`/`ID` suffix, converts to snake case and pluralises:
/// `AccountId` becomes `accounts`, `LineItemId` becomes `line_items`,
/// `CategoryId` becomes `categories`.
#[derive(Debug, Default, Clone, Copy)]
pub struct ConventionNames;

impl ConventionNames {
    /// Applies the naming convention to a bare type name.
    ///
    /// ```rust
    /// use praxis_core::ConventionNames;
    ///
    /// assert_eq!(ConventionNames::derive("AccountId").as_deref(), Some("accounts"));
    /// assert_eq!(ConventionNames::derive("Id"), None);
    /// ```
    #[must_use]
    pub fn derive(type_name: &str) -> Option<String> {
        let stem = type_name
            .strip_suffix("Id")
            .or_else(|| type_name.strip_suffix("ID"))
            .unwrap_or(type_name);
        if stem.is_empty() || !stem.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
            return None;
        }
        Some(pluralize(&snake_case(stem)))
    }
}

impl NameResolver for ConventionNames {
    fn resource_name(&self, ty: &TypeKey) -> Option<String> {
        Self::derive(ty.short_name())
    }
}

fn snake_case(name: &str) -> String {
    let mut out = String::with_capacity(name.len() + 4);
    for (i, c) in name.chars().enumerate() {
        if c.is_ascii_uppercase() {
            if i > 0 && !out.ends_with('_') {
                out.push('_');
            }
            out.push(c.to_ascii_lowercase());
        } else {
            out.push(c);
        }
    }
    out
}

fn pluralize(word: &str) -> String {
    if word.ends_with('s') || word.ends_with('x') || word.ends_with("ch") || word.ends_with("sh") {
        return format!("{word}es");
    }
    if let Some(stem) = word.strip_suffix('y') {
        if !stem.ends_with(['a', 'e', 'i', 'o', 'u']) {
            return format!("{stem}ies");
        }
    }
    format!("{word}s")
}
