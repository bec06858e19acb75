//! # Protected Resource Requests
//!
//! Requests to resource servers authorized with an access token: plain
//! `Bearer`, or `DPoP` with the proof bound to the token through the
//! `ath` claim. Redirects are never followed; the provider contract
//! hands 3xx responses back as-is.

use bytes::Bytes;
use http::{HeaderMap, header};
use url::Url;

use crate::dpop::{self, DpopOptions};
use crate::error::invalid;
use crate::provider::HttpClient;
use crate::{Result, endpoint};

/// Build a request to a protected resource. With `dpop` set, the
/// authorization scheme is `DPoP` and a proof carrying the access-token
/// hash is attached; otherwise the scheme is `Bearer`.
///
/// # Errors
///
/// Returns an error when the access token is empty or the request
/// cannot be assembled.
pub fn request(
    access_token: &str, method: &http::Method, url: &Url, headers: HeaderMap, body: Option<Bytes>,
    dpop: Option<&DpopOptions>,
) -> Result<http::Request<Bytes>> {
    if access_token.is_empty() {
        return Err(invalid!("access token must be non-empty"));
    }

    let scheme = if dpop.is_some() { "DPoP" } else { "Bearer" };
    let mut request = http::Request::builder()
        .method(method.clone())
        .uri(url.as_str())
        .header(header::AUTHORIZATION, format!("{scheme} {access_token}"))
        .header(header::USER_AGENT, endpoint::USER_AGENT);
    if let Some(options) = dpop {
        request = request.header("DPoP", dpop::proof(options, method, url, Some(access_token))?);
    }

    let mut request = request
        .body(body.unwrap_or_default())
        .map_err(|e| invalid!("issue building request: {e}"))?;
    for (name, value) in &headers {
        request.headers_mut().append(name, value.clone());
    }
    Ok(request)
}

/// Execute a protected-resource request, recording any `DPoP-Nonce` the
/// resource returns. The response is handed back unvalidated: resource
/// semantics belong to the caller.
///
/// # Errors
///
/// Propagates builder and transport failures.
pub async fn fetch(
    http: &impl HttpClient, access_token: &str, method: &http::Method, url: &Url,
    headers: HeaderMap, body: Option<Bytes>, dpop: Option<&DpopOptions>,
) -> Result<http::Response<Bytes>> {
    let request = request(access_token, method, url, headers, body, dpop)?;
    endpoint::fetch(http, request).await
}
