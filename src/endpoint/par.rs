//! # Pushed Authorization Requests
//!
//! Request builder and response validator for the pushed authorization
//! request endpoint of [RFC 9126].
//!
//! [RFC 9126]: https://www.rfc-editor.org/rfc/rfc9126

use bytes::Bytes;
use http::StatusCode;

use crate::error::{invalid, processing};
use crate::provider::HttpClient;
use crate::types::{AuthorizationServer, Client, PushedAuthorizationResponse};
use crate::{Result, auth, endpoint};

use super::RequestOptions;

/// Build a PAR request carrying the given authorization request
/// parameters.
///
/// # Errors
///
/// Returns an error when the server publishes no PAR endpoint or the
/// client metadata is inconsistent.
pub fn request(
    server: &AuthorizationServer, client: &Client, parameters: &[(String, String)],
    options: &RequestOptions<'_>,
) -> Result<http::Request<Bytes>> {
    let par_endpoint = server
        .pushed_authorization_request_endpoint
        .as_deref()
        .ok_or_else(|| invalid!("server metadata has no pushed_authorization_request_endpoint"))?;

    let mut body = parameters.to_vec();
    body.extend(options.extra.iter().cloned());
    let authorization = auth::attach(server, client, options.client_key, &mut body)?;
    endpoint::form_post(par_endpoint, &body, options.dpop, authorization.as_ref())
}

/// Validate a PAR response: a `201` carrying a non-empty `request_uri`
/// and a positive `expires_in`.
///
/// # Errors
///
/// Returns an error (or the server's OAuth error value) on any failed
/// check.
pub fn process(response: &http::Response<Bytes>) -> Result<PushedAuthorizationResponse> {
    endpoint::check_status(response, StatusCode::CREATED)?;
    let body: PushedAuthorizationResponse = endpoint::json_body(response)?;
    if body.request_uri.is_empty() {
        return Err(processing!("response request_uri must be non-empty"));
    }
    if body.expires_in == 0 {
        return Err(processing!("response expires_in must be positive"));
    }
    Ok(body)
}

/// Push an authorization request in one step.
///
/// # Errors
///
/// Propagates builder, transport, and validation failures.
pub async fn push(
    http: &impl HttpClient, server: &AuthorizationServer, client: &Client,
    parameters: &[(String, String)], options: &RequestOptions<'_>,
) -> Result<PushedAuthorizationResponse> {
    let response = endpoint::fetch(http, request(server, client, parameters, options)?).await?;
    process(&response)
}

#[cfg(test)]
mod test {
    use serde_json::json;

    use super::*;

    fn response(status: u16, body: serde_json::Value) -> http::Response<Bytes> {
        http::Response::builder()
            .status(status)
            .body(Bytes::from(body.to_string()))
            .expect("should build")
    }

    #[test]
    fn requires_created_status() {
        let body = json!({"request_uri": "urn:ietf:params:oauth:request_uri:x", "expires_in": 60});
        assert!(process(&response(200, body.clone())).is_err());
        let validated = process(&response(201, body)).expect("should validate");
        assert_eq!(validated.expires_in, 60);
    }

    #[test]
    fn rejects_degenerate_fields() {
        assert!(process(&response(201, json!({"request_uri": "", "expires_in": 60}))).is_err());
        assert!(process(&response(201, json!({"request_uri": "u", "expires_in": 0}))).is_err());
    }
}
