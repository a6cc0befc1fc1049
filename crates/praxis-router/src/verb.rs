//! Verb canonicalisation and tunneling.
//!
//! The transport layer only understands a small fixed vocabulary of HTTP
//! methods. [`VerbNormalizer`] maps any other verb onto a single sentinel
//! ([`TransportVerb::Tunneled`]) so the transport can route it to one
//! catch-all endpoint, while the caller keeps the [`TrueVerb`] for key
//! construction.

use std::fmt;

use http::Method;
use thiserror::Error;

/// Errors raised while canonicalising a verb.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VerbError {
    /// The verb is empty after trimming.
    #[error("verb is empty")]
    Empty,

    /// The verb contains characters that are not valid in an HTTP token.
    #[error("invalid verb '{0}'")]
    InvalidToken(String),
}

/// Trims and upper-cases a verb, validating it as an HTTP method token.
///
/// # Example
///
/// ```rust
/// use praxis_router::canonical_verb;
///
/// assert_eq!(canonical_verb(" greet ").unwrap(), "GREET");
/// assert!(canonical_verb("NOT A VERB").is_err());
/// ```
pub fn canonical_verb(raw: &str) -> Result<String, VerbError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(VerbError::Empty);
    }
    if !trimmed.bytes().all(is_token_byte) {
        return Err(VerbError::InvalidToken(trimmed.to_string()));
    }
    Ok(trimmed.to_ascii_uppercase())
}

// RFC 9110 tchar
const fn is_token_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric()
        || matches!(
            b,
            b'!' | b'#' | b'$' | b'%' | b'&' | b'\'' | b'*' | b'+' | b'-' | b'.' | b'^' | b'_' | b'`' | b'|' | b'~'
        )
}

/// The verb a request actually carries, preserved across tunneling.
///
/// Always canonical: trimmed, upper-case, a valid method token.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TrueVerb(String);

impl TrueVerb {
    /// Parses and canonicalises a verb.
    pub fn parse(raw: &str) -> Result<Self, VerbError> {
        canonical_verb(raw).map(Self)
    }

    /// Returns the verb as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&Method> for TrueVerb {
    fn from(method: &Method) -> Self {
        Self(method.as_str().to_ascii_uppercase())
    }
}

impl AsRef<str> for TrueVerb {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TrueVerb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The verb seen by the transport after normalisation.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TransportVerb {
    /// A verb from the transport's fixed vocabulary.
    Standard(Method),
    /// Sentinel for every verb outside the vocabulary.
    Tunneled,
}

impl TransportVerb {
    /// Returns `true` for the tunneling sentinel.
    #[must_use]
    pub fn is_tunneled(&self) -> bool {
        matches!(self, Self::Tunneled)
    }
}

impl fmt::Display for TransportVerb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Standard(method) => f.write_str(method.as_str()),
            Self::Tunneled => f.write_str("*"),
        }
    }
}

/// Maps true verbs onto the transport's fixed vocabulary.
///
/// # Example
///
/// ```rust
/// use praxis_router::{TransportVerb, TrueVerb, VerbNormalizer};
/// use http::Method;
///
/// let normalizer = VerbNormalizer::new();
///
/// let get = TrueVerb::parse("get").unwrap();
/// assert_eq!(normalizer.normalize(&get), TransportVerb::Standard(Method::GET));
///
/// let greet = TrueVerb::parse("GREET").unwrap();
/// assert_eq!(normalizer.normalize(&greet), TransportVerb::Tunneled);
/// assert_eq!(greet.as_str(), "GREET");
/// ```
#[derive(Debug, Clone)]
pub struct VerbNormalizer {
    vocabulary: Vec<Method>,
}

impl VerbNormalizer {
    /// The nine methods defined by RFC 9110.
    pub const STANDARD: [Method; 9] = [
        Method::GET,
        Method::POST,
        Method::PUT,
        Method::DELETE,
        Method::PATCH,
        Method::HEAD,
        Method::OPTIONS,
        Method::TRACE,
        Method::CONNECT,
    ];

    /// Creates a normaliser over the standard vocabulary.
    #[must_use]
    pub fn new() -> Self {
        Self {
            vocabulary: Self::STANDARD.to_vec(),
        }
    }

    /// Creates a normaliser over a custom vocabulary.
    ///
    /// Entries are canonicalised; invalid entries are rejected.
    pub fn with_vocabulary<I, S>(verbs: I) -> Result<Self, VerbError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut vocabulary = Vec::new();
        for verb in verbs {
            let canonical = canonical_verb(verb.as_ref())?;
            let method = Method::from_bytes(canonical.as_bytes())
                .map_err(|_| VerbError::InvalidToken(canonical.clone()))?;
            if !vocabulary.contains(&method) {
                vocabulary.push(method);
            }
        }
        Ok(Self { vocabulary })
    }

    /// Returns `true` if the verb is part of the transport vocabulary.
    #[must_use]
    pub fn is_standard(&self, verb: &TrueVerb) -> bool {
        self.vocabulary.iter().any(|m| m.as_str() == verb.as_str())
    }

    /// Returns the configured vocabulary.
    #[must_use]
    pub fn vocabulary(&self) -> &[Method] {
        &self.vocabulary
    }

    /// Maps a true verb to the verb the transport routes on.
    ///
    /// The true verb is never consumed; callers keep it for key building.
    #[must_use]
    pub fn normalize(&self, verb: &TrueVerb) -> TransportVerb {
        self.vocabulary
            .iter()
            .find(|m| m.as_str() == verb.as_str())
            .map_or(TransportVerb::Tunneled, |m| TransportVerb::Standard(m.clone()))
    }
}

impl Default for VerbNormalizer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_canonical_verb_uppercases_and_trims() {
        assert_eq!(canonical_verb("get").unwrap(), "GET");
        assert_eq!(canonical_verb("  Greet\t").unwrap(), "GREET");
        assert_eq!(canonical_verb("X-PURGE").unwrap(), "X-PURGE");
    }

    #[test]
    fn test_canonical_verb_rejects_bad_tokens() {
        assert_eq!(canonical_verb("   "), Err(VerbError::Empty));
        assert_eq!(
            canonical_verb("GE T"),
            Err(VerbError::InvalidToken("GE T".to_string()))
        );
        assert!(canonical_verb("GET/").is_err());
        assert!(canonical_verb("caf\u{e9}").is_err());
    }

    #[test]
    fn test_standard_verbs_pass_through() {
        let normalizer = VerbNormalizer::new();
        for method in VerbNormalizer::STANDARD {
            let verb = TrueVerb::from(&method);
            assert!(normalizer.is_standard(&verb));
            assert_eq!(normalizer.normalize(&verb), TransportVerb::Standard(method));
        }
    }

    #[test]
    fn test_custom_verbs_tunnel() {
        let normalizer = VerbNormalizer::new();
        let verb = TrueVerb::parse("greet").unwrap();
        let transport = normalizer.normalize(&verb);
        assert!(transport.is_tunneled());
        assert_eq!(transport.to_string(), "*");
        assert_eq!(verb.as_str(), "GREET");
    }

    #[test]
    fn test_narrow_vocabulary() {
        let normalizer = VerbNormalizer::with_vocabulary(["get", "post", "GET"]).unwrap();
        assert_eq!(normalizer.vocabulary().len(), 2);

        let delete = TrueVerb::parse("DELETE").unwrap();
        assert_eq!(normalizer.normalize(&delete), TransportVerb::Tunneled);

        let post = TrueVerb::parse("post").unwrap();
        assert_eq!(normalizer.normalize(&post), TransportVerb::Standard(Method::POST));
    }

    #[test]
    fn test_vocabulary_rejects_invalid_entries() {
        assert!(VerbNormalizer::with_vocabulary(["GET", "NO SPACES"]).is_err());
    }
}
