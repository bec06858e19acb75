//! # Proof Key for Code Exchange
//!
//! PKCE ([RFC 7636]) helpers for public and confidential clients. Only
//! the `S256` challenge method is supported.
//!
//! [RFC 7636]: https://www.rfc-editor.org/rfc/rfc7636

use sha2::{Digest, Sha256};

use crate::core::{codec, generate};

/// Generate a `code_verifier`: 43 characters of base64url-encoded
/// CSPRNG output, per RFC 7636 §4.1.
#[must_use]
pub fn code_verifier() -> String {
    generate::jti()
}

/// Calculate the `S256` `code_challenge` for a verifier:
/// `base64url(SHA-256(ASCII(code_verifier)))`.
#[must_use]
pub fn code_challenge(verifier: &str) -> String {
    codec::b64url(Sha256::digest(verifier.as_bytes()))
}

#[cfg(test)]
mod test {
    use super::*;

    // Appendix B of RFC 7636.
    #[test]
    fn challenge_vector() {
        let verifier = "dBjftJeZ4CVP-mB92K27uhbUJU1p1r_wW1gFWFOEjXk";
        assert_eq!(code_challenge(verifier), "E9Melhoa2OwvFrEMTJguCHaoeK1t8URWbuGJSstw-cM");
    }

    #[test]
    fn verifier_length() {
        assert_eq!(code_verifier().len(), 43);
    }
}
