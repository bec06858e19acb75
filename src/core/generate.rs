//! # Random Material
//!
//! Generators for the opaque, high-entropy values the protocol calls
//! for: `state`, `nonce`, DPoP `jti`, and PKCE verifier input. Each is
//! 32 bytes of CSPRNG output, base64url-encoded.

use rand::{Rng, rng};

use crate::core::codec;

fn random_b64url() -> String {
    let mut bytes = [0u8; 32];
    rng().fill(bytes.as_mut_slice());
    codec::b64url(bytes)
}

/// Generate an authorization request `state` value.
#[must_use]
pub fn state() -> String {
    random_b64url()
}

/// Generate an ID Token `nonce` value.
#[must_use]
pub fn nonce() -> String {
    random_b64url()
}

/// Generate a proof JWT `jti` value.
#[must_use]
pub fn jti() -> String {
    random_b64url()
}
