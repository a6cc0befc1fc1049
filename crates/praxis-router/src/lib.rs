//! Routing keys for Praxis actions.
//!
//! This crate owns the one piece of logic that both sides of action routing
//! must agree on: how a [`RoutingKey`] is built. Action declarations and
//! inbound requests are both reduced to [`KeyParts`] and passed through
//! [`build_key`], so the key a request computes is exactly the key its
//! target action was registered under.
//!
//! # Features
//!
//! - **Exact-match keys**: `(verb, resource, item?, sub-resource, custom name)`
//! - **Path shapes**: collection, item, nested collection and nested item,
//!   each with an optional `:name` custom suffix
//! - **Default names**: `retrieve`/`create`/`update`/`remove` collapse onto
//!   the unnamed key for GET/POST/PUT/DELETE
//! - **Verb tunneling**: [`VerbNormalizer`] maps verbs outside the transport
//!   vocabulary onto one sentinel while the [`TrueVerb`] is kept
//!
//! # Example
//!
//! ```rust
//! use praxis_router::{build_key, request_key, KeyParts, PathShape};
//!
//! // Declared: GET on widgets, item-shaped, nested under accounts.
//! let declared = build_key(
//!     KeyParts::new("GET", "widgets")
//!         .identified(true)
//!         .parent(Some("accounts")),
//! )
//! .unwrap();
//!
//! // Requested: GET /accounts/7/widgets/42
//! let shape = PathShape::parse("/accounts/7/widgets/42").unwrap();
//! let requested = request_key("GET", &shape).unwrap();
//!
//! assert_eq!(declared, requested);
//! ```

mod key;
mod shape;
mod verb;

pub use key::{build_key, default_action_name, KeyError, KeyParts, RouteShape, RoutingKey};
pub use shape::{request_key, PathShape, ShapeError};
pub use verb::{canonical_verb, TransportVerb, TrueVerb, VerbError, VerbNormalizer};

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn resource() -> impl Strategy<Value = String> {
        "[a-z][a-z0-9_-]{0,11}"
    }

    fn verb() -> impl Strategy<Value = String> {
        prop_oneof![
            Just("GET".to_string()),
            Just("post".to_string()),
            Just("Put".to_string()),
            Just("DELETE".to_string()),
            Just("PATCH".to_string()),
            "[a-zA-Z]{3,8}",
        ]
    }

    fn custom_name() -> impl Strategy<Value = Option<String>> {
        prop_oneof![
            Just(None),
            Just(Some("retrieve".to_string())),
            Just(Some("remove".to_string())),
            "[a-z]{1,10}".prop_map(Some),
        ]
    }

    fn path_for(
        resource: &str,
        item: bool,
        parent: Option<&str>,
        custom: Option<&str>,
    ) -> String {
        let mut path = String::new();
        if let Some(parent) = parent {
            path.push_str(&format!("/{parent}/7"));
        }
        path.push_str(&format!("/{resource}"));
        if item {
            path.push_str("/42");
        }
        if let Some(custom) = custom {
            path.push_str(&format!(":{custom}"));
        }
        path
    }

    proptest! {
        #[test]
        fn request_key_matches_declared_key(
            verb in verb(),
            resource in resource(),
            item in any::<bool>(),
            parent in proptest::option::of(resource()),
            custom in custom_name(),
        ) {
            let declared = build_key(
                KeyParts::new(&verb, &resource)
                    .identified(item)
                    .parent(parent.as_deref())
                    .custom_name(custom.as_deref()),
            ).unwrap();

            let path = path_for(&resource, item, parent.as_deref(), custom.as_deref());
            let shape = PathShape::parse(&path).unwrap();
            let first = request_key(&verb, &shape).unwrap();
            let second = request_key(&verb, &shape).unwrap();

            prop_assert_eq!(&first, &second);
            prop_assert_eq!(first, declared);
        }

        #[test]
        fn parent_always_yields_nested_key(
            verb in verb(),
            resource in resource(),
            parent in resource(),
            item in any::<bool>(),
        ) {
            let key = build_key(
                KeyParts::new(&verb, &resource)
                    .identified(item)
                    .parent(Some(&parent)),
            ).unwrap();

            prop_assert!(key.has_identifier());
            prop_assert_eq!(key.resource(), parent.as_str());
            prop_assert_eq!(key.sub_resource(), Some(resource.as_str()));
        }
    }

    #[test]
    fn test_scenario_keys() {
        let collection = build_key(KeyParts::new("GET", "widgets")).unwrap();
        assert_eq!(collection.to_string(), "GET /widgets");

        let item = build_key(
            KeyParts::new("GET", "widgets")
                .identified(true)
                .custom_name(Some("retrieve")),
        )
        .unwrap();
        assert_eq!(item.custom_name(), None);
        assert!(item.has_identifier());

        let greet = build_key(KeyParts::new("GREET", "hello")).unwrap();
        assert_eq!(greet.to_string(), "GREET /hello");
    }
}
