//! # Errors
//!
//! Two error categories are kept distinct: precondition violations
//! (wrong types, inconsistent client metadata) and processing errors (a
//! well-formed input produced an unacceptable response or JWT).
//! Protocol-level errors the Authorization Server returns as an
//! `{error, ...}` body are data, carried by [`Error::OAuth`] so callers
//! can branch on them without string matching.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Relying-party error taxonomy.
#[derive(Error, Debug)]
pub enum Error {
    /// A caller-supplied argument violated a precondition: wrong
    /// runtime type, empty required string, unsupported enum value, or
    /// inconsistent client metadata. Never wrapped.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// A well-formed input produced an unacceptable response or JWT:
    /// unexpected status, schema mismatch, invalid signature, issuer
    /// mismatch, claim outside its window, unknown key.
    #[error("processing error: {0}")]
    Processing(String),

    /// A branch that intentionally refuses to proceed: unknown
    /// algorithm, RSA modulus too small, a JWE where a JWS is required,
    /// an implicit or hybrid flow callback.
    #[error("unsupported operation: {0}")]
    Unsupported(String),

    /// An OAuth 2.0 error response, returned by the server as a value
    /// rather than raised by this library.
    #[error("authorization server error: {0}")]
    OAuth(OAuthError),

    /// The [`crate::provider::HttpClient`] failed to complete the
    /// exchange.
    #[error(transparent)]
    Transport(#[from] anyhow::Error),
}

impl Error {
    /// The OAuth 2.0 error response carried by this error, if that is
    /// what it is.
    #[must_use]
    pub const fn oauth(&self) -> Option<&OAuthError> {
        match self {
            Self::OAuth(e) => Some(e),
            _ => None,
        }
    }
}

/// An OAuth 2.0 error response body or callback error parameter set, as
/// defined by [RFC 6749] §5.2.
///
/// [RFC 6749]: https://www.rfc-editor.org/rfc/rfc6749
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
pub struct OAuthError {
    /// Error code, e.g. `invalid_grant` or `use_dpop_nonce`.
    pub error: String,

    /// Human-readable detail, when the server provides one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_description: Option<String>,

    /// A URI identifying a human-readable web page with error
    /// information.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_uri: Option<String>,
}

impl fmt::Display for OAuthError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.error_description {
            Some(description) => write!(f, "{}: {description}", self.error),
            None => write!(f, "{}", self.error),
        }
    }
}

/// Construct an `Error::InvalidArgument` from a format string.
macro_rules! invalid {
    ($($arg:tt)*) => {
        $crate::Error::InvalidArgument(format!($($arg)*))
    };
}

/// Construct an `Error::Processing` from a format string.
macro_rules! processing {
    ($($arg:tt)*) => {
        $crate::Error::Processing(format!($($arg)*))
    };
}

/// Construct an `Error::Unsupported` from a format string.
macro_rules! unsupported {
    ($($arg:tt)*) => {
        $crate::Error::Unsupported(format!($($arg)*))
    };
}

pub(crate) use {invalid, processing, unsupported};

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn oauth_errors_are_values() {
        let err = Error::OAuth(OAuthError {
            error: "invalid_grant".to_string(),
            error_description: Some("code expired".to_string()),
            error_uri: None,
        });
        let oauth = err.oauth().expect("should be protocol error");
        assert_eq!(oauth.error, "invalid_grant");
        assert_eq!(oauth.to_string(), "invalid_grant: code expired");
        assert!(invalid!("bad").oauth().is_none());
    }

    #[test]
    fn body_shape() {
        let body = r#"{"error":"invalid_client","error_uri":"https://as.example/e"}"#;
        let parsed: OAuthError = serde_json::from_str(body).expect("should parse");
        assert_eq!(parsed.error, "invalid_client");
        assert_eq!(parsed.error_description, None);
    }
}
