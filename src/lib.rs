//! A stateless [OAuth 2.0] and [OpenID Connect Core 1.0] client for
//! relying parties.
//!
//! The library discovers Authorization Server metadata, builds
//! spec-compliant requests to the server's endpoints (pushed
//! authorization, token, introspection, revocation, userinfo, device
//! authorization, JWKS), authenticates the client with one of five
//! authentication methods, and validates every security-sensitive
//! response against the applicable RFCs.
//!
//! # Design
//!
//! The library is architected around endpoint modules, each exposing a
//! `request` builder producing an [`http::Request`] and a `process`
//! validator consuming an [`http::Response`]. The HTTP transport itself
//! is a capability supplied by the caller as a [`provider::HttpClient`]
//! implementation, keeping the core free of any particular client
//! stack.
//!
//! Every response passes through the DPoP nonce recorder before its
//! body is inspected, so callers recover from `use_dpop_nonce` errors
//! by simply reissuing the request.
//!
//! Implicit and hybrid authorization flows are intentionally rejected,
//! as is symmetric (HS*) ID Token signature validation.
//!
//! [OAuth 2.0]: https://www.rfc-editor.org/rfc/rfc6749.html
//! [OpenID Connect Core 1.0]: https://openid.net/specs/openid-connect-core-1_0.html

pub mod core;
pub mod dpop;
pub mod endpoint;
pub mod jose;
pub mod jwks;
pub mod provider;
pub mod types;
pub mod www_auth;

mod auth;
mod error;

/// PKCE
pub mod pkce {
    pub use crate::core::pkce::{code_challenge, code_verifier};
}

pub use error::{Error, OAuthError};

/// Result type for relying-party operations.
pub type Result<T, E = Error> = std::result::Result<T, E>;
