//! # Praxis Core
//!
//! Shared types for the Praxis action engine:
//!
//! - [`DispatchError`] / [`RegistrationError`] - the error taxonomy
//! - [`TypeKey`], [`Capabilities`], [`CapabilityLookup`] - request-scoped capabilities
//! - [`Body`], [`FromBody`], [`Json`] - opaque request bodies
//! - [`NameResolver`], [`NameTable`], [`ConventionNames`] - parent resource names

#![doc(html_root_url = "https://docs.rs/praxis-core/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod body;
mod capability;
mod error;
mod name;

pub use body::{Body, FromBody, Json};
pub use capability::{Capabilities, Capability, CapabilityError, CapabilityLookup, TypeKey};
pub use error::{
    DispatchError, DispatchResult, ErrorCategory, ErrorDetail, ErrorEnvelope, RegistrationError,
};
pub use name::{ConventionNames, NameResolver, NameTable, Or};
