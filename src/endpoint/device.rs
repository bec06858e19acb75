//! # Device Authorization
//!
//! Request builder and response validator for the device authorization
//! endpoint of [RFC 8628]. The device-code *grant* lives with the other
//! grants in [`super::token`].
//!
//! [RFC 8628]: https://www.rfc-editor.org/rfc/rfc8628

use bytes::Bytes;
use http::StatusCode;

use crate::error::{invalid, processing};
use crate::provider::HttpClient;
use crate::types::{AuthorizationServer, Client, DeviceAuthorizationResponse};
use crate::{Result, auth, endpoint};

use super::RequestOptions;

/// Build a device authorization request.
///
/// # Errors
///
/// Returns an error when the server publishes no device authorization
/// endpoint or the client metadata is inconsistent.
pub fn request(
    server: &AuthorizationServer, client: &Client, options: &RequestOptions<'_>,
) -> Result<http::Request<Bytes>> {
    let device_endpoint = server
        .device_authorization_endpoint
        .as_deref()
        .ok_or_else(|| invalid!("server metadata has no device_authorization_endpoint"))?;

    let mut body = options.extra.clone();
    let authorization = auth::attach(server, client, options.client_key, &mut body)?;
    endpoint::form_post(device_endpoint, &body, options.dpop, authorization.as_ref())
}

/// Validate a device authorization response: a `200` carrying non-empty
/// codes and URIs and positive lifetimes. A missing `interval` defaults
/// to five seconds.
///
/// # Errors
///
/// Returns an error (or the server's OAuth error value) on any failed
/// check.
pub fn process(response: &http::Response<Bytes>) -> Result<DeviceAuthorizationResponse> {
    endpoint::check_status(response, StatusCode::OK)?;
    let body: DeviceAuthorizationResponse = endpoint::json_body(response)?;
    if body.device_code.is_empty() {
        return Err(processing!("response device_code must be non-empty"));
    }
    if body.user_code.is_empty() {
        return Err(processing!("response user_code must be non-empty"));
    }
    if body.verification_uri.is_empty() {
        return Err(processing!("response verification_uri must be non-empty"));
    }
    if body.verification_uri_complete.as_deref().is_some_and(str::is_empty) {
        return Err(processing!("response verification_uri_complete must be non-empty"));
    }
    if body.expires_in == 0 {
        return Err(processing!("response expires_in must be positive"));
    }
    Ok(body)
}

/// Start a device authorization in one step.
///
/// # Errors
///
/// Propagates builder, transport, and validation failures.
pub async fn authorize(
    http: &impl HttpClient, server: &AuthorizationServer, client: &Client,
    options: &RequestOptions<'_>,
) -> Result<DeviceAuthorizationResponse> {
    let response = endpoint::fetch(http, request(server, client, options)?).await?;
    process(&response)
}
