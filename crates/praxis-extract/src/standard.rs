//! Standard request-scoped capabilities.
//!
//! | Capability | Source |
//! |---|---|
//! | [`Pagination`] | `page`, `per_page` query parameters |
//! | [`Locale`] | `lang` query parameter, else `Accept-Language`, else `en` |
//! | [`FieldSelection`] | `fields=a,b` |
//! | [`EmbedSpec`] | `embed=a,b` |

use std::fmt;

use crate::{ExtractionError, ExtractionSource, FromRequestParts, RequestParts};

/// Default and maximum page sizes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PaginationSettings {
    /// Page size when the request does not name one.
    pub default_per_page: u32,
    /// Upper bound; larger requested sizes are clamped.
    pub max_per_page: u32,
}

impl Default for PaginationSettings {
    fn default() -> Self {
        Self {
            default_per_page: 20,
            max_per_page: 100,
        }
    }
}

/// The page a collection action should return. Pages start at 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    /// One-based page number.
    pub page: u32,
    /// Items per page, already clamped.
    pub per_page: u32,
}

impl Pagination {
    /// Reads pagination from the query string.
    pub fn from_parts(
        parts: &RequestParts,
        settings: &PaginationSettings,
    ) -> Result<Self, ExtractionError> {
        let page = positive(parts, "page")?.unwrap_or(1);
        let per_page = positive(parts, "per_page")?
            .unwrap_or(settings.default_per_page)
            .min(settings.max_per_page);
        Ok(Self { page, per_page })
    }

    /// Number of items before this page.
    #[must_use]
    pub fn offset(&self) -> u64 {
        u64::from(self.page - 1) * u64::from(self.per_page)
    }
}

fn positive(parts: &RequestParts, name: &str) -> Result<Option<u32>, ExtractionError> {
    let Some(raw) = parts.query_param(name)? else {
        return Ok(None);
    };
    let value: u32 = raw.trim().parse().map_err(|_| {
        ExtractionError::invalid_type(ExtractionSource::Query, name, "expected a positive integer")
    })?;
    if value == 0 {
        return Err(ExtractionError::invalid_type(
            ExtractionSource::Query,
            name,
            "must be at least 1",
        ));
    }
    Ok(Some(value))
}

impl FromRequestParts for Pagination {
    fn from_request_parts(parts: &RequestParts) -> Result<Self, ExtractionError> {
        Self::from_parts(parts, &PaginationSettings::default())
    }
}

/// The caller's preferred language tag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Locale(String);

impl Locale {
    /// Fallback when the request names no language.
    pub const DEFAULT: &'static str = "en";

    /// Returns the language tag.
    #[must_use]
    pub fn tag(&self) -> &str {
        &self.0
    }

    /// Returns the primary language subtag (`de` for `de-CH`).
    #[must_use]
    pub fn language(&self) -> &str {
        self.0.split('-').next().unwrap_or(&self.0)
    }
}

impl Default for Locale {
    fn default() -> Self {
        Self(Self::DEFAULT.to_string())
    }
}

impl fmt::Display for Locale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

fn is_language_tag(tag: &str) -> bool {
    !tag.is_empty()
        && tag.len() <= 35
        && tag.split('-').all(|part| {
            !part.is_empty() && part.len() <= 8 && part.chars().all(|c| c.is_ascii_alphanumeric())
        })
}

impl FromRequestParts for Locale {
    fn from_request_parts(parts: &RequestParts) -> Result<Self, ExtractionError> {
        if let Some(lang) = parts.query_param("lang")? {
            let lang = lang.trim();
            if !lang.is_empty() {
                if !is_language_tag(lang) {
                    return Err(ExtractionError::invalid_type(
                        ExtractionSource::Query,
                        "lang",
                        "expected a language tag",
                    ));
                }
                return Ok(Self(lang.to_string()));
            }
        }

        // Header values are advisory: anything unusable falls back to the default.
        let preferred = parts.header("accept-language").and_then(|header| {
            header
                .split(',')
                .filter_map(|entry| entry.split(';').next())
                .map(str::trim)
                .find(|tag| *tag != "*" && is_language_tag(tag))
        });

        Ok(preferred.map_or_else(Self::default, |tag| Self(tag.to_string())))
    }
}

/// Splits repeated comma-separated query values into one ordered, de-duplicated list.
fn list_param(parts: &RequestParts, name: &str) -> Result<Vec<String>, ExtractionError> {
    let mut items: Vec<String> = Vec::new();
    for (key, value) in parts.query_pairs()? {
        if key != name {
            continue;
        }
        for item in value.split(',').map(str::trim).filter(|s| !s.is_empty()) {
            if !items.iter().any(|existing| existing == item) {
                items.push(item.to_string());
            }
        }
    }
    Ok(items)
}

/// The fields the caller wants in the response. Empty means all fields.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldSelection(Vec<String>);

impl FieldSelection {
    /// Returns `true` if no selection was made.
    #[must_use]
    pub fn is_all(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns `true` if `field` should be rendered.
    #[must_use]
    pub fn includes(&self, field: &str) -> bool {
        self.is_all() || self.0.iter().any(|f| f == field)
    }

    /// Returns the selected fields, in request order.
    #[must_use]
    pub fn fields(&self) -> &[String] {
        &self.0
    }
}

impl FromRequestParts for FieldSelection {
    fn from_request_parts(parts: &RequestParts) -> Result<Self, ExtractionError> {
        list_param(parts, "fields").map(Self)
    }
}

/// Related resources the caller wants embedded.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EmbedSpec(Vec<String>);

impl EmbedSpec {
    /// Returns `true` if `relation` should be embedded.
    #[must_use]
    pub fn contains(&self, relation: &str) -> bool {
        self.0.iter().any(|r| r == relation)
    }

    /// Returns the requested relations, in request order.
    #[must_use]
    pub fn relations(&self) -> &[String] {
        &self.0
    }

    /// Returns `true` if nothing is to be embedded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromRequestParts for EmbedSpec {
    fn from_request_parts(parts: &RequestParts) -> Result<Self, ExtractionError> {
        list_param(parts, "embed").map(Self)
    }
}
