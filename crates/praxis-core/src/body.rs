//! Opaque request bodies.
//!
//! The dispatcher never looks inside a [`Body`]; it hands it to whatever
//! `BODY` slot the action declares. Actions choose how to read it through
//! [`FromBody`].

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use bytes::Bytes;
use serde::de::DeserializeOwned;
use serde::Deserialize;

use crate::error::DispatchError;

/// An opaque, already-parsed request body.
///
/// # Example
///
/// ```rust
/// use praxis_core::Body;
///
/// let body = Body::new(serde_json::json!({"name": "sprocket"}));
/// let value: &serde_json::Value = body.downcast_ref().unwrap();
/// assert_eq!(value["name"], "sprocket");
///
/// assert!(Body::empty().is_empty());
/// ```
#[derive(Clone, Default)]
pub struct Body {
    inner: Option<Arc<dyn Any + Send + Sync>>,
    type_name: Option<&'static str>,
}

impl Body {
    /// Creates an absent body.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Wraps a parsed body value.
    pub fn new<T: Send + Sync + 'static>(value: T) -> Self {
        Self {
            inner: Some(Arc::new(value)),
            type_name: Some(std::any::type_name::<T>()),
        }
    }

    /// Returns `true` if no body was supplied.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.is_none()
    }

    /// Returns the body value if it has type `T`.
    #[must_use]
    pub fn downcast_ref<T: 'static>(&self) -> Option<&T> {
        self.inner.as_ref().and_then(|v| v.downcast_ref::<T>())
    }

    /// Reads the body through a [`FromBody`] implementation.
    pub fn get<T: FromBody>(&self) -> Result<T, DispatchError> {
        T::from_body(self)
    }

    fn type_name(&self) -> &'static str {
        self.type_name.unwrap_or("<empty>")
    }
}

impl fmt::Debug for Body {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Body").field("type", &self.type_name()).finish()
    }
}

/// Conversion from an opaque body into a parameter value.
///
/// A missing or unreadable body is the caller's fault and yields
/// [`DispatchError::MalformedRequest`].
pub trait FromBody: Sized {
    /// Reads `Self` from the body.
    fn from_body(body: &Body) -> Result<Self, DispatchError>;
}

fn required(body: &Body) -> Result<(), DispatchError> {
    if body.is_empty() {
        Err(DispatchError::malformed("request body is required"))
    } else {
        Ok(())
    }
}

impl FromBody for Body {
    fn from_body(body: &Body) -> Result<Self, DispatchError> {
        Ok(body.clone())
    }
}

impl<T: FromBody> FromBody for Option<T> {
    fn from_body(body: &Body) -> Result<Self, DispatchError> {
        if body.is_empty() {
            Ok(None)
        } else {
            T::from_body(body).map(Some)
        }
    }
}

impl FromBody for Bytes {
    fn from_body(body: &Body) -> Result<Self, DispatchError> {
        required(body)?;
        if let Some(bytes) = body.downcast_ref::<Bytes>() {
            return Ok(bytes.clone());
        }
        if let Some(value) = body.downcast_ref::<serde_json::Value>() {
            return serde_json::to_vec(value)
                .map(Bytes::from)
                .map_err(|e| DispatchError::malformed(format!("unserializable body: {e}")));
        }
        Err(DispatchError::malformed(format!(
            "body of type {} cannot be read as bytes",
            body.type_name()
        )))
    }
}

impl FromBody for serde_json::Value {
    fn from_body(body: &Body) -> Result<Self, DispatchError> {
        Json::<Self>::from_body(body).map(|Json(v)| v)
    }
}

/// A JSON body deserialized into `T`.
///
/// Accepts a body holding a `serde_json::Value` or raw JSON bytes.
///
/// ```rust
/// use praxis_core::{Body, Json};
/// use serde::Deserialize;
///
/// #[derive(Deserialize)]
/// struct NewWidget { name: String }
///
/// let body = Body::new(serde_json::json!({"name": "sprocket"}));
/// let Json(widget): Json<NewWidget> = body.get().unwrap();
/// assert_eq!(widget.name, "sprocket");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Json<T>(pub T);

impl<T> Json<T> {
    /// Returns the inner value.
    pub fn into_inner(self) -> T {
        self.0
    }
}

impl<T: DeserializeOwned> FromBody for Json<T> {
    fn from_body(body: &Body) -> Result<Self, DispatchError> {
        required(body)?;
        let parsed = if let Some(value) = body.downcast_ref::<serde_json::Value>() {
            T::deserialize(value)
        } else if let Some(bytes) = body.downcast_ref::<Bytes>() {
            serde_json::from_slice(bytes)
        } else {
            return Err(DispatchError::malformed(format!(
                "body of type {} is not JSON",
                body.type_name()
            )));
        };
        parsed
            .map(Json)
            .map_err(|e| DispatchError::malformed(format!("invalid JSON body: {e}")))
    }
}
