//! # Token Revocation
//!
//! Request builder and response validator for the revocation endpoint
//! of [RFC 7009]. A successful revocation has no body to validate; only
//! the status matters.
//!
//! [RFC 7009]: https://www.rfc-editor.org/rfc/rfc7009

use bytes::Bytes;
use http::StatusCode;

use crate::error::invalid;
use crate::provider::HttpClient;
use crate::types::{AuthorizationServer, Client};
use crate::{Result, auth, endpoint};

use super::RequestOptions;

/// Build a revocation request for a token. Pass a `token_type_hint`
/// through [`RequestOptions::extra`] when the caller knows the token
/// kind.
///
/// # Errors
///
/// Returns an error when the server publishes no revocation endpoint,
/// the token is empty, or the client metadata is inconsistent.
pub fn request(
    server: &AuthorizationServer, client: &Client, token: &str, options: &RequestOptions<'_>,
) -> Result<http::Request<Bytes>> {
    let revocation_endpoint = server
        .revocation_endpoint
        .as_deref()
        .ok_or_else(|| invalid!("server metadata has no revocation_endpoint"))?;
    if token.is_empty() {
        return Err(invalid!("token must be non-empty"));
    }

    let mut body = vec![("token".to_string(), token.to_string())];
    body.extend(options.extra.iter().cloned());
    let authorization = auth::attach(server, client, options.client_key, &mut body)?;
    endpoint::form_post(revocation_endpoint, &body, options.dpop, authorization.as_ref())
}

/// Validate a revocation response: any `200` is success.
///
/// # Errors
///
/// Returns an error (or the server's OAuth error value) for any other
/// status.
pub fn process(response: &http::Response<Bytes>) -> Result<()> {
    endpoint::check_status(response, StatusCode::OK)
}

/// Revoke a token in one step.
///
/// # Errors
///
/// Propagates builder, transport, and validation failures.
pub async fn revoke(
    http: &impl HttpClient, server: &AuthorizationServer, client: &Client, token: &str,
    options: &RequestOptions<'_>,
) -> Result<()> {
    let response = endpoint::fetch(http, request(server, client, token, options)?).await?;
    process(&response)
}
