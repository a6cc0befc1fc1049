//! Bound arguments and action outputs.

use std::any::Any;
use std::fmt;
use std::str::FromStr;

use praxis_core::{Body, Capability, DispatchError, FromBody};

/// One bound argument.
#[derive(Clone)]
pub enum Argument {
    /// Raw identifier path segment.
    Identifier(String),
    /// Raw parent identifier path segment.
    ParentIdentifier(String),
    /// The request body.
    Body(Body),
    /// A resolved capability value.
    Capability(Capability),
}

impl fmt::Debug for Argument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Identifier(id) => f.debug_tuple("Identifier").field(id).finish(),
            Self::ParentIdentifier(id) => f.debug_tuple("ParentIdentifier").field(id).finish(),
            Self::Body(body) => f.debug_tuple("Body").field(body).finish(),
            Self::Capability(_) => f.write_str("Capability(..)"),
        }
    }
}

/// The arguments bound for one invocation, one per plan slot.
///
/// Invokers read each slot with the accessor that matches its kind. Reading a
/// slot with the wrong accessor, or past the end, is an
/// [`DispatchError::ArgumentMismatch`].
///
/// # Example
///
/// ```rust
/// use praxis_dispatch::{Argument, Arguments};
///
/// let args = Arguments::new(vec![
///     Argument::ParentIdentifier("7".into()),
///     Argument::Identifier("42".into()),
/// ]);
///
/// let account: u64 = args.parent_identifier(0).unwrap();
/// let widget: u64 = args.identifier(1).unwrap();
/// assert_eq!((account, widget), (7, 42));
/// ```
#[derive(Debug, Clone, Default)]
pub struct Arguments {
    values: Vec<Argument>,
}

impl Arguments {
    /// Wraps bound arguments.
    #[must_use]
    pub fn new(values: Vec<Argument>) -> Self {
        Self { values }
    }

    /// Returns the number of arguments.
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns `true` if there are no arguments.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Returns the raw argument at a slot.
    #[must_use]
    pub fn get(&self, slot: usize) -> Option<&Argument> {
        self.values.get(slot)
    }

    /// Parses the identifier at a slot.
    pub fn identifier<T>(&self, slot: usize) -> Result<T, DispatchError>
    where
        T: FromStr,
        T::Err: fmt::Display,
    {
        match self.values.get(slot) {
            Some(Argument::Identifier(raw)) => parse_identifier(raw),
            _ => Err(DispatchError::argument_mismatch(slot, "identifier")),
        }
    }

    /// Parses the parent identifier at a slot.
    pub fn parent_identifier<T>(&self, slot: usize) -> Result<T, DispatchError>
    where
        T: FromStr,
        T::Err: fmt::Display,
    {
        match self.values.get(slot) {
            Some(Argument::ParentIdentifier(raw)) => parse_identifier(raw),
            _ => Err(DispatchError::argument_mismatch(slot, "parent identifier")),
        }
    }

    /// Reads the body at a slot.
    pub fn body<T: FromBody>(&self, slot: usize) -> Result<T, DispatchError> {
        match self.values.get(slot) {
            Some(Argument::Body(body)) => T::from_body(body),
            _ => Err(DispatchError::argument_mismatch(slot, "body")),
        }
    }

    /// Clones the capability at a slot.
    pub fn capability<T: Clone + 'static>(&self, slot: usize) -> Result<T, DispatchError> {
        match self.values.get(slot) {
            Some(Argument::Capability(value)) => value
                .downcast_ref::<T>()
                .cloned()
                .ok_or_else(|| DispatchError::argument_mismatch(slot, std::any::type_name::<T>())),
            _ => Err(DispatchError::argument_mismatch(slot, std::any::type_name::<T>())),
        }
    }
}

fn parse_identifier<T>(raw: &str) -> Result<T, DispatchError>
where
    T: FromStr,
    T::Err: fmt::Display,
{
    raw.parse()
        .map_err(|e| DispatchError::malformed(format!("invalid identifier '{raw}': {e}")))
}

/// The type-erased return value of an action.
///
/// The dispatcher passes it through unexamined; a response writer decides how
/// to render it.
pub struct ActionOutput {
    value: Box<dyn Any + Send>,
    type_name: &'static str,
}

impl ActionOutput {
    /// Wraps a return value.
    pub fn new<T: Send + 'static>(value: T) -> Self {
        Self {
            value: Box::new(value),
            type_name: std::any::type_name::<T>(),
        }
    }

    /// Returns `true` if the value has type `T`.
    #[must_use]
    pub fn is<T: 'static>(&self) -> bool {
        self.value.is::<T>()
    }

    /// Returns a reference to the value if it has type `T`.
    #[must_use]
    pub fn downcast_ref<T: 'static>(&self) -> Option<&T> {
        self.value.downcast_ref()
    }

    /// Takes the value if it has type `T`, or gives the output back.
    pub fn downcast<T: 'static>(self) -> Result<T, Self> {
        let type_name = self.type_name;
        self.value
            .downcast::<T>()
            .map(|v| *v)
            .map_err(|value| Self { value, type_name })
    }

    /// Returns the name of the wrapped type.
    #[must_use]
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }
}

impl fmt::Debug for ActionOutput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ActionOutput")
            .field("type", &self.type_name)
            .finish()
    }
}
