//! Parameter plans.
//!
//! A [`ParameterPlan`] records, once at introspection time, where each
//! argument of an action comes from. Binding walks the plan in order and
//! produces exactly one argument per slot.

use std::fmt;

use praxis_core::TypeKey;

use crate::descriptor::{ParamDescriptor, ParamKind};

/// Where one argument comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Slot {
    /// The routed resource's identifier path segment.
    Identifier,
    /// The parent resource's identifier path segment.
    ParentIdentifier,
    /// The opaque request body.
    Body,
    /// A request-scoped capability of the given type.
    Provider(TypeKey),
}

impl fmt::Display for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Identifier => f.write_str("IDENTIFIER"),
            Self::ParentIdentifier => f.write_str("PARENT_IDENTIFIER"),
            Self::Body => f.write_str("BODY"),
            Self::Provider(ty) => write!(f, "PROVIDER({ty})"),
        }
    }
}

/// The ordered slots of one action.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParameterPlan {
    slots: Vec<Slot>,
}

impl ParameterPlan {
    /// Builds a plan from parameter declarations, in declaration order.
    #[must_use]
    pub fn from_params(params: &[ParamDescriptor]) -> Self {
        let slots = params
            .iter()
            .map(|p| match p.kind() {
                ParamKind::Id => Slot::Identifier,
                ParamKind::ParentId(_) => Slot::ParentIdentifier,
                ParamKind::Body => Slot::Body,
                ParamKind::Capability(ty) => Slot::Provider(*ty),
            })
            .collect();
        Self { slots }
    }

    /// Returns the slots in binding order.
    #[must_use]
    pub fn slots(&self) -> &[Slot] {
        &self.slots
    }

    /// Returns the number of slots.
    #[must_use]
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Returns `true` if the action takes no arguments.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Returns the capability types the plan asks for.
    pub fn providers(&self) -> impl Iterator<Item = TypeKey> + '_ {
        self.slots.iter().filter_map(|s| match s {
            Slot::Provider(ty) => Some(*ty),
            _ => None,
        })
    }
}

impl fmt::Display for ParameterPlan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[")?;
        for (i, slot) in self.slots.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{slot}")?;
        }
        f.write_str("]")
    }
}
