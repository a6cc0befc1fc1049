//! Conversion of an action's return value into a dispatch result.
//!
//! Generated invokers write `(&Returned::new(value)).into_action_result()`
//! with both traits in scope. Method resolution picks [`FallibleReturn`] for
//! any `Result<T, E>` (aliases such as `DispatchResult<T>` included) and
//! falls back to [`PlainReturn`] one auto-ref later for everything else.

use std::cell::Cell;

use praxis_core::DispatchError;

use crate::args::ActionOutput;

/// An action's return value on its way to the dispatcher.
pub struct Returned<T>(Cell<Option<T>>);

impl<T> Returned<T> {
    /// Wraps a return value.
    pub fn new(value: T) -> Self {
        Self(Cell::new(Some(value)))
    }

    fn take(&self) -> Result<T, DispatchError> {
        self.0
            .take()
            .ok_or_else(|| DispatchError::invocation(anyhow::anyhow!("action output already taken")))
    }
}

/// `Err` propagates through [`DispatchError::invocation`], so a returned
/// `DispatchError` keeps its category.
pub trait FallibleReturn {
    /// Converts the wrapped value.
    fn into_action_result(&self) -> Result<ActionOutput, DispatchError>;
}

impl<T, E> FallibleReturn for Returned<Result<T, E>>
where
    T: Send + 'static,
    E: Into<anyhow::Error>,
{
    fn into_action_result(&self) -> Result<ActionOutput, DispatchError> {
        match self.take()? {
            Ok(value) => Ok(ActionOutput::new(value)),
            Err(error) => Err(DispatchError::invocation(error)),
        }
    }
}

/// Any other value is the action's output.
pub trait PlainReturn {
    /// Converts the wrapped value.
    fn into_action_result(&self) -> Result<ActionOutput, DispatchError>;
}

impl<T: Send + 'static> PlainReturn for &Returned<T> {
    fn into_action_result(&self) -> Result<ActionOutput, DispatchError> {
        self.take().map(ActionOutput::new)
    }
}
