//! Path shape parsing and request key building.
//!
//! Inbound paths take one of four shapes, optionally followed by a
//! `:name` custom-action suffix on the last segment:
//!
//! ```text
//!   /{resource}
//!   /{resource}/{id}
//!   /{parent}/{parent_id}/{resource}
//!   /{parent}/{parent_id}/{resource}/{id}
//! ```

use smallvec::SmallVec;
use thiserror::Error;

use crate::key::{build_key, KeyError, KeyParts, RoutingKey};

/// Errors raised while parsing a request path.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ShapeError {
    /// The path has no segments.
    #[error("path is empty")]
    Empty,

    /// The path has more segments than any supported shape.
    #[error("path has {0} segments, at most 4 are supported")]
    TooManySegments(usize),

    /// The path contains an empty segment (`//` or a trailing `/`).
    #[error("path contains an empty segment")]
    EmptySegment,

    /// The path ends in `:` with no action name.
    #[error("custom action name is empty")]
    EmptyCustomName,
}

/// The parsed shape of a request path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathShape {
    resource: String,
    identifier: Option<String>,
    parent: Option<(String, String)>,
    custom_name: Option<String>,
}

impl PathShape {
    /// Parses a request path.
    ///
    /// # Example
    ///
    /// ```rust
    /// use praxis_router::PathShape;
    ///
    /// let shape = PathShape::parse("/accounts/7/widgets/42:publish").unwrap();
    /// assert_eq!(shape.resource(), "widgets");
    /// assert_eq!(shape.identifier(), Some("42"));
    /// assert_eq!(shape.parent(), Some(("accounts", "7")));
    /// assert_eq!(shape.custom_name(), Some("publish"));
    /// ```
    pub fn parse(path: &str) -> Result<Self, ShapeError> {
        let trimmed = path.strip_prefix('/').unwrap_or(path);
        if trimmed.is_empty() {
            return Err(ShapeError::Empty);
        }

        let mut segments: SmallVec<[&str; 4]> = trimmed.split('/').collect();
        if segments.len() > 4 {
            return Err(ShapeError::TooManySegments(segments.len()));
        }

        let mut custom_name = None;
        if let Some(last) = segments.last_mut() {
            if let Some((head, name)) = last.split_once(':') {
                if name.is_empty() {
                    return Err(ShapeError::EmptyCustomName);
                }
                custom_name = Some(name.to_string());
                *last = head;
            }
        }

        if segments.iter().any(|s| s.is_empty()) {
            return Err(ShapeError::EmptySegment);
        }

        let shape = match segments.as_slice() {
            [resource] => Self::new(resource, None, None),
            [resource, id] => Self::new(resource, Some(id), None),
            [parent, parent_id, resource] => Self::new(resource, None, Some((parent, parent_id))),
            [parent, parent_id, resource, id] => {
                Self::new(resource, Some(id), Some((parent, parent_id)))
            }
            _ => return Err(ShapeError::Empty),
        };

        Ok(Self { custom_name, ..shape })
    }

    fn new(resource: &str, identifier: Option<&str>, parent: Option<(&str, &str)>) -> Self {
        Self {
            resource: resource.to_string(),
            identifier: identifier.map(str::to_string),
            parent: parent.map(|(p, id)| (p.to_string(), id.to_string())),
            custom_name: None,
        }
    }

    /// Returns the routed resource (the last resource segment).
    #[must_use]
    pub fn resource(&self) -> &str {
        &self.resource
    }

    /// Returns the routed resource's identifier, if present.
    #[must_use]
    pub fn identifier(&self) -> Option<&str> {
        self.identifier.as_deref()
    }

    /// Returns the parent resource name and identifier, if nested.
    #[must_use]
    pub fn parent(&self) -> Option<(&str, &str)> {
        self.parent.as_ref().map(|(p, id)| (p.as_str(), id.as_str()))
    }

    /// Returns the parent identifier, if nested.
    #[must_use]
    pub fn parent_identifier(&self) -> Option<&str> {
        self.parent.as_ref().map(|(_, id)| id.as_str())
    }

    /// Returns the custom action name, if any.
    #[must_use]
    pub fn custom_name(&self) -> Option<&str> {
        self.custom_name.as_deref()
    }

    /// Returns the key parts for this shape under the given verb.
    #[must_use]
    pub fn key_parts<'a>(&'a self, verb: &'a str) -> KeyParts<'a> {
        KeyParts::new(verb, &self.resource)
            .identified(self.identifier.is_some())
            .parent(self.parent.as_ref().map(|(p, _)| p.as_str()))
            .custom_name(self.custom_name.as_deref())
    }
}

/// Builds the routing key a request resolves to.
///
/// Shares [`build_key`] with action introspection, so a request and the
/// declaration it targets always agree on the key.
///
/// # Example
///
/// ```rust
/// use praxis_router::{request_key, PathShape};
///
/// let shape = PathShape::parse("/widgets/42").unwrap();
/// let key = request_key("GET", &shape).unwrap();
/// assert_eq!(key.to_string(), "GET /widgets/{id}");
/// ```
pub fn request_key(verb: &str, shape: &PathShape) -> Result<RoutingKey, KeyError> {
    build_key(shape.key_parts(verb))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collection() {
        let shape = PathShape::parse("/widgets").unwrap();
        assert_eq!(shape.resource(), "widgets");
        assert_eq!(shape.identifier(), None);
        assert_eq!(shape.parent(), None);
        assert_eq!(shape.custom_name(), None);
    }

    #[test]
    fn test_item() {
        let shape = PathShape::parse("/widgets/42").unwrap();
        assert_eq!(shape.identifier(), Some("42"));
    }

    #[test]
    fn test_nested_collection() {
        let shape = PathShape::parse("/accounts/7/widgets").unwrap();
        assert_eq!(shape.resource(), "widgets");
        assert_eq!(shape.parent(), Some(("accounts", "7")));
        assert_eq!(shape.parent_identifier(), Some("7"));
        assert_eq!(shape.identifier(), None);
    }

    #[test]
    fn test_custom_suffix() {
        let shape = PathShape::parse("/widgets:search").unwrap();
        assert_eq!(shape.resource(), "widgets");
        assert_eq!(shape.custom_name(), Some("search"));

        let shape = PathShape::parse("/accounts/7/widgets:archive").unwrap();
        assert_eq!(shape.custom_name(), Some("archive"));
        assert_eq!(shape.parent(), Some(("accounts", "7")));
    }

    #[test]
    fn test_leading_slash_optional() {
        assert_eq!(PathShape::parse("widgets/1"), PathShape::parse("/widgets/1"));
    }

    #[test]
    fn test_malformed() {
        assert_eq!(PathShape::parse(""), Err(ShapeError::Empty));
        assert_eq!(PathShape::parse("/"), Err(ShapeError::Empty));
        assert_eq!(PathShape::parse("/a/b/c/d/e"), Err(ShapeError::TooManySegments(5)));
        assert_eq!(PathShape::parse("/widgets/"), Err(ShapeError::EmptySegment));
        assert_eq!(PathShape::parse("//widgets"), Err(ShapeError::EmptySegment));
        assert_eq!(PathShape::parse("/widgets:"), Err(ShapeError::EmptyCustomName));
        assert_eq!(PathShape::parse("/:search"), Err(ShapeError::EmptySegment));
    }

    #[test]
    fn test_request_key_nested_ignores_own_id() {
        let with_id = PathShape::parse("/accounts/7/widgets/42").unwrap();
        let without_id = PathShape::parse("/accounts/7/widgets").unwrap();
        assert_eq!(
            request_key("GET", &with_id).unwrap(),
            request_key("GET", &without_id).unwrap()
        );
    }

    #[test]
    fn test_request_key_drops_default_name() {
        let shape = PathShape::parse("/widgets/42:retrieve").unwrap();
        let key = request_key("get", &shape).unwrap();
        assert_eq!(key.custom_name(), None);
        assert_eq!(key.verb(), "GET");
    }
}
