//! Routing keys.
//!
//! A [`RoutingKey`] is the canonical identity of one registered action. The
//! same key is computed twice: once from an action declaration when a router
//! is introspected, and once from the shape of every inbound request. Both
//! sides go through [`build_key`], so there is exactly one decision tree for
//! key construction.
//!
//! # Key layout
//!
//! Keys mirror the request path:
//!
//! ```text
//!   GET /widgets              -> (GET, widgets, item=false, sub=None,          custom=None)
//!   GET /widgets/42           -> (GET, widgets, item=true,  sub=None,          custom=None)
//!   POST /widgets/42:publish  -> (POST, widgets, item=true, sub=None,          custom=publish)
//!   GET /accounts/7/widgets   -> (GET, accounts, item=true, sub=Some(widgets), custom=None)
//!   GET /accounts/7/widgets/9 -> (GET, accounts, item=true, sub=Some(widgets), custom=None)
//! ```
//!
//! Nested routes are keyed by their parent: the leading resource is the
//! parent, it is always addressed by identifier, and the routed resource is
//! carried as the sub-resource. The nested resource's own identifier is not
//! part of the key.

use std::fmt;

use crate::verb::{canonical_verb, VerbError};
use thiserror::Error;

/// Errors raised while building a routing key.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum KeyError {
    /// The verb is not a valid HTTP method token.
    #[error(transparent)]
    Verb(#[from] VerbError),

    /// A resource name is empty or contains a reserved character.
    #[error("invalid resource name '{0}'")]
    InvalidResource(String),

    /// A custom action name contains a reserved character.
    #[error("invalid action name '{0}'")]
    InvalidName(String),
}

/// Returns the default action name for a verb, if it has one.
///
/// A declaration or request whose custom name equals the default for its
/// verb is keyed exactly like one with no custom name at all.
///
/// # Example
///
/// ```rust
/// use praxis_router::default_action_name;
///
/// assert_eq!(default_action_name("GET"), Some("retrieve"));
/// assert_eq!(default_action_name("DELETE"), Some("remove"));
/// assert_eq!(default_action_name("GREET"), None);
/// ```
#[must_use]
pub fn default_action_name(verb: &str) -> Option<&'static str> {
    match verb {
        "GET" => Some("retrieve"),
        "POST" => Some("create"),
        "PUT" => Some("update"),
        "DELETE" => Some("remove"),
        _ => None,
    }
}

/// Composite key identifying one registered action.
///
/// Two keys are equal iff every field is equal. Registries use keys for exact
/// matching only.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RoutingKey {
    verb: String,
    resource: String,
    has_identifier: bool,
    sub_resource: Option<String>,
    custom_name: Option<String>,
}

impl RoutingKey {
    /// Returns the canonical (upper-case) verb.
    #[must_use]
    pub fn verb(&self) -> &str {
        &self.verb
    }

    /// Returns the leading resource name (the parent, for nested keys).
    #[must_use]
    pub fn resource(&self) -> &str {
        &self.resource
    }

    /// Returns `true` if the leading resource is addressed by identifier.
    #[must_use]
    pub fn has_identifier(&self) -> bool {
        self.has_identifier
    }

    /// Returns the nested resource name, present only for nested keys.
    #[must_use]
    pub fn sub_resource(&self) -> Option<&str> {
        self.sub_resource.as_deref()
    }

    /// Returns the custom action name, if any.
    #[must_use]
    pub fn custom_name(&self) -> Option<&str> {
        self.custom_name.as_deref()
    }

    /// Returns `true` if this key addresses a nested resource.
    #[must_use]
    pub fn is_nested(&self) -> bool {
        self.sub_resource.is_some()
    }

    /// Returns the verb-agnostic part of this key.
    #[must_use]
    pub fn shape(&self) -> RouteShape {
        RouteShape {
            resource: self.resource.clone(),
            has_identifier: self.has_identifier,
            sub_resource: self.sub_resource.clone(),
            custom_name: self.custom_name.clone(),
        }
    }
}

impl fmt::Display for RoutingKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.verb, self.shape())
    }
}

/// A routing key without its verb.
///
/// Used to tell an unknown route (404) apart from a known route that does not
/// accept the requested verb (405).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RouteShape {
    resource: String,
    has_identifier: bool,
    sub_resource: Option<String>,
    custom_name: Option<String>,
}

impl RouteShape {
    /// Returns the leading resource name.
    #[must_use]
    pub fn resource(&self) -> &str {
        &self.resource
    }

    /// Returns `true` if the leading resource is addressed by identifier.
    #[must_use]
    pub fn has_identifier(&self) -> bool {
        self.has_identifier
    }

    /// Returns the nested resource name.
    #[must_use]
    pub fn sub_resource(&self) -> Option<&str> {
        self.sub_resource.as_deref()
    }

    /// Returns the custom action name.
    #[must_use]
    pub fn custom_name(&self) -> Option<&str> {
        self.custom_name.as_deref()
    }

    /// Re-attaches a verb to this shape.
    #[must_use]
    pub fn with_verb(&self, verb: impl Into<String>) -> RoutingKey {
        RoutingKey {
            verb: verb.into(),
            resource: self.resource.clone(),
            has_identifier: self.has_identifier,
            sub_resource: self.sub_resource.clone(),
            custom_name: self.custom_name.clone(),
        }
    }
}

impl fmt::Display for RouteShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "/{}", self.resource)?;
        if self.has_identifier {
            f.write_str("/{id}")?;
        }
        if let Some(sub) = &self.sub_resource {
            write!(f, "/{sub}")?;
        }
        if let Some(name) = &self.custom_name {
            write!(f, ":{name}")?;
        }
        Ok(())
    }
}

/// The inputs from which a [`RoutingKey`] is built.
///
/// Introspection fills this from an action declaration; request routing fills
/// it from a [`PathShape`](crate::PathShape). Both then call [`build_key`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyParts<'a> {
    /// The true verb, in any case.
    pub verb: &'a str,
    /// The routed resource.
    pub resource: &'a str,
    /// The parent resource, for nested routes.
    pub parent: Option<&'a str>,
    /// Whether the routed resource is addressed by identifier.
    pub has_identifier: bool,
    /// The custom action name, if any.
    pub custom_name: Option<&'a str>,
}

impl<'a> KeyParts<'a> {
    /// Starts a set of key parts for a collection route.
    #[must_use]
    pub fn new(verb: &'a str, resource: &'a str) -> Self {
        Self {
            verb,
            resource,
            parent: None,
            has_identifier: false,
            custom_name: None,
        }
    }

    /// Marks the routed resource as addressed by identifier.
    #[must_use]
    pub fn identified(mut self, has_identifier: bool) -> Self {
        self.has_identifier = has_identifier;
        self
    }

    /// Nests the routed resource under a parent.
    #[must_use]
    pub fn parent(mut self, parent: Option<&'a str>) -> Self {
        self.parent = parent;
        self
    }

    /// Sets the custom action name.
    #[must_use]
    pub fn custom_name(mut self, name: Option<&'a str>) -> Self {
        self.custom_name = name;
        self
    }
}

/// Builds the canonical routing key for a set of key parts.
///
/// Precedence is nested, then item, then collection: when a parent is
/// present the key is always nested and item-shaped under the parent,
/// whatever `has_identifier` says.
///
/// # Example
///
/// ```rust
/// use praxis_router::{build_key, KeyParts};
///
/// let key = build_key(
///     KeyParts::new("get", "widgets")
///         .identified(true)
///         .parent(Some("accounts")),
/// )
/// .unwrap();
///
/// assert_eq!(key.verb(), "GET");
/// assert_eq!(key.resource(), "accounts");
/// assert!(key.has_identifier());
/// assert_eq!(key.sub_resource(), Some("widgets"));
/// ```
pub fn build_key(parts: KeyParts<'_>) -> Result<RoutingKey, KeyError> {
    let verb = canonical_verb(parts.verb)?;
    let resource = checked_resource(parts.resource)?;
    let custom_name = normalize_custom_name(&verb, parts.custom_name)?;

    let key = if let Some(parent) = parts.parent {
        RoutingKey {
            verb,
            resource: checked_resource(parent)?,
            has_identifier: true,
            sub_resource: Some(resource),
            custom_name,
        }
    } else {
        RoutingKey {
            verb,
            resource,
            has_identifier: parts.has_identifier,
            sub_resource: None,
            custom_name,
        }
    };

    Ok(key)
}

fn checked_resource(name: &str) -> Result<String, KeyError> {
    let name = name.trim();
    if name.is_empty() || name.contains(['/', ':', '{', '}']) {
        return Err(KeyError::InvalidResource(name.to_string()));
    }
    Ok(name.to_string())
}

fn normalize_custom_name(verb: &str, name: Option<&str>) -> Result<Option<String>, KeyError> {
    let Some(name) = name.map(str::trim).filter(|n| !n.is_empty()) else {
        return Ok(None);
    };
    if name.contains(['/', ':']) {
        return Err(KeyError::InvalidName(name.to_string()));
    }
    match default_action_name(verb) {
        Some(default) if default.eq_ignore_ascii_case(name) => Ok(None),
        _ => Ok(Some(name.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collection_key() {
        let key = build_key(KeyParts::new("GET", "widgets")).unwrap();
        assert_eq!(key.verb(), "GET");
        assert_eq!(key.resource(), "widgets");
        assert!(!key.has_identifier());
        assert_eq!(key.sub_resource(), None);
        assert_eq!(key.custom_name(), None);
    }

    #[test]
    fn test_default_name_is_dropped() {
        let plain = build_key(KeyParts::new("GET", "widgets").identified(true)).unwrap();
        let named = build_key(
            KeyParts::new("GET", "widgets")
                .identified(true)
                .custom_name(Some("retrieve")),
        )
        .unwrap();
        assert_eq!(plain, named);

        let remove = build_key(KeyParts::new("DELETE", "widgets").custom_name(Some("Remove"))).unwrap();
        assert_eq!(remove.custom_name(), None);
    }

    #[test]
    fn test_default_name_of_other_verb_is_kept() {
        let key = build_key(KeyParts::new("POST", "widgets").custom_name(Some("retrieve"))).unwrap();
        assert_eq!(key.custom_name(), Some("retrieve"));
    }

    #[test]
    fn test_custom_verb_has_no_default() {
        let key = build_key(KeyParts::new("greet", "hello")).unwrap();
        assert_eq!(key.verb(), "GREET");
        assert_eq!(key.custom_name(), None);
    }

    #[test]
    fn test_nested_wins_over_item() {
        let with_item = build_key(
            KeyParts::new("GET", "widgets")
                .identified(true)
                .parent(Some("accounts")),
        )
        .unwrap();
        let without_item = build_key(KeyParts::new("GET", "widgets").parent(Some("accounts"))).unwrap();

        assert_eq!(with_item, without_item);
        assert_eq!(with_item.resource(), "accounts");
        assert!(with_item.has_identifier());
        assert_eq!(with_item.sub_resource(), Some("widgets"));
        assert!(with_item.is_nested());
    }

    #[test]
    fn test_invalid_resource_rejected() {
        assert_eq!(
            build_key(KeyParts::new("GET", " ")),
            Err(KeyError::InvalidResource(String::new()))
        );
        assert!(build_key(KeyParts::new("GET", "a/b")).is_err());
        assert!(build_key(KeyParts::new("GET", "widgets").parent(Some(""))).is_err());
    }

    #[test]
    fn test_invalid_custom_name_rejected() {
        let result = build_key(KeyParts::new("POST", "widgets").custom_name(Some("a:b")));
        assert_eq!(result, Err(KeyError::InvalidName("a:b".to_string())));
    }

    #[test]
    fn test_shape_drops_verb() {
        let get = build_key(KeyParts::new("GET", "widgets")).unwrap();
        let post = build_key(KeyParts::new("POST", "widgets")).unwrap();
        assert_ne!(get, post);
        assert_eq!(get.shape(), post.shape());
        assert_eq!(get.shape().with_verb("POST"), post);
    }

    #[test]
    fn test_display() {
        let key = build_key(
            KeyParts::new("POST", "widgets")
                .parent(Some("accounts"))
                .custom_name(Some("archive")),
        )
        .unwrap();
        assert_eq!(key.to_string(), "POST /accounts/{id}/widgets:archive");

        let item = build_key(KeyParts::new("GET", "widgets").identified(true)).unwrap();
        assert_eq!(item.to_string(), "GET /widgets/{id}");
    }
}
