//! # Praxis Extract
//!
//! Request-scoped capabilities for Praxis actions.
//!
//! An action parameter that is neither an identifier nor the body is a
//! provider slot: at dispatch time its value is looked up by type. This crate
//! builds those values from the request.
//!
//! | Capability | Source |
//! |-----------|--------|
//! | [`Pagination`] | `page`, `per_page` query parameters |
//! | [`Locale`] | `lang` query parameter or `Accept-Language` |
//! | [`FieldSelection`] | `fields` query parameter |
//! | [`EmbedSpec`] | `embed` query parameter |
//!
//! Application types join through [`CapabilitySuppliers::register`] or by
//! implementing [`FromRequestParts`].
//!
//! ## Error Handling
//!
//! A supplier that rejects the request returns an [`ExtractionError`], which
//! the dispatcher reports as `MALFORMED_REQUEST`. A type with no supplier at
//! all is a developer error (`PROVIDER_UNRESOLVED`).
//!
//! ```rust
//! use std::sync::Arc;
//! use praxis_core::{CapabilityLookup, TypeKey};
//! use praxis_extract::{CapabilitySuppliers, Pagination, PaginationSettings, RequestParts};
//! use http::{HeaderMap, Method, Uri};
//!
//! let suppliers = Arc::new(CapabilitySuppliers::with_standard(PaginationSettings::default()));
//! let parts = RequestParts::new(Method::GET, Uri::from_static("/w?page=zero"), HeaderMap::new());
//!
//! let err = suppliers
//!     .for_request(parts)
//!     .lookup(&TypeKey::of::<Pagination>())
//!     .unwrap_err();
//! assert!(err.reason.contains("page"));
//! ```

#![doc(html_root_url = "https://docs.rs/praxis-extract/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod context;
mod error;
mod extractor;
mod standard;
mod suppliers;

pub use context::RequestParts;
pub use error::{ExtractionError, ExtractionSource};
pub use extractor::FromRequestParts;
pub use standard::{EmbedSpec, FieldSelection, Locale, Pagination, PaginationSettings};
pub use suppliers::{CapabilitySuppliers, RequestCapabilities};
