//! # JSON Object Signing and Encryption (JOSE)
//!
//! A minimal JOSE engine covering the fixed algorithm matrix this
//! library supports: JWS sign/verify over compact serialization
//! ([RFC 7515]), JWE encryption for signed-and-encrypted request
//! objects ([RFC 7516]), JWK import and export ([RFC 7517]), and the
//! JWT claim-validation pipeline ([RFC 7519]).
//!
//! Symmetric JWS algorithms are deliberately absent from the
//! verification paths: HS* appears only in `client_secret_jwt` client
//! assertions, which this library issues but never validates.
//!
//! [RFC 7515]: https://www.rfc-editor.org/rfc/rfc7515
//! [RFC 7516]: https://www.rfc-editor.org/rfc/rfc7516
//! [RFC 7517]: https://www.rfc-editor.org/rfc/rfc7517
//! [RFC 7519]: https://www.rfc-editor.org/rfc/rfc7519

pub mod jwa;
pub mod jwe;
pub mod jwk;
pub mod jws;
pub mod jwt;
