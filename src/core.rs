//! # Core Utilities
//!
//! Byte-level codecs, secure random material, PKCE, form encoding, and
//! the bounded caches shared by the JWKS and DPoP subsystems.

pub mod codec;
pub mod generate;
pub mod pkce;
pub mod urlencode;

pub(crate) mod cache;

/// Tolerance applied symmetrically to all timestamp comparisons.
pub(crate) const CLOCK_SKEW: i64 = 30;

/// Current UNIX time in seconds.
pub(crate) fn unix_now() -> i64 {
    chrono::Utc::now().timestamp()
}
