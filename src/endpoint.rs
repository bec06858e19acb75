//! # Endpoint Requests and Validators
//!
//! One module per Authorization Server endpoint, each exposing a
//! `request` builder producing an [`http::Request`] and a `process`
//! validator consuming the matching [`http::Response`]. The helpers
//! here implement the behavior every validator shares: status
//! assertion, OAuth error-body extraction on 4xx responses, and the
//! DPoP nonce recording applied to every fetched response before its
//! body is inspected.

pub mod callback;
pub mod device;
pub mod discovery;
pub mod introspection;
pub mod jar;
pub mod par;
pub mod resource;
pub mod revocation;
pub mod token;
pub mod userinfo;

use bytes::Bytes;
use http::{HeaderValue, StatusCode, header};
use serde::de::DeserializeOwned;
use serde_json::Value;
use url::Url;

use crate::core::urlencode;
use crate::dpop::{self, DpopOptions};
use crate::error::{invalid, processing};
use crate::jose::jwk::PrivateKey;
use crate::provider::HttpClient;
use crate::{Error, OAuthError, Result};

/// `User-Agent` sent with every request the library builds.
pub(crate) const USER_AGENT: &str = concat!("openid-rp/", env!("CARGO_PKG_VERSION"));

/// Per-request options shared by the endpoint builders.
#[derive(Debug, Default)]
pub struct RequestOptions<'a> {
    /// DPoP key binding; when set, a fresh proof is attached.
    pub dpop: Option<&'a DpopOptions>,

    /// Private key for `private_key_jwt` client authentication.
    pub client_key: Option<&'a PrivateKey>,

    /// Additional body parameters, appended verbatim.
    pub extra: Vec<(String, String)>,
}

/// Dispatch a request through the provider and run the response through
/// the DPoP nonce recorder.
pub(crate) async fn fetch(
    http: &impl HttpClient, request: http::Request<Bytes>,
) -> Result<http::Response<Bytes>> {
    let url = request.uri().to_string();
    tracing::debug!("{} {url}", request.method());
    let response = http.fetch(request).await?;
    if let Ok(url) = Url::parse(&url) {
        dpop::record_nonce(&url, &response);
    }
    Ok(response)
}

/// Assert the expected success status. Any 4xx response is mined for an
/// OAuth error body, which surfaces as [`Error::OAuth`]; every other
/// unexpected status is a processing error.
pub(crate) fn check_status(response: &http::Response<Bytes>, expected: StatusCode) -> Result<()> {
    let status = response.status();
    if status == expected {
        return Ok(());
    }

    if status.is_client_error() {
        if let Ok(Value::Object(body)) = serde_json::from_slice::<Value>(response.body()) {
            if let Some(error) = body.get("error").and_then(Value::as_str) {
                if !error.is_empty() {
                    // non-string description/uri members are dropped
                    return Err(Error::OAuth(OAuthError {
                        error: error.to_string(),
                        error_description: body
                            .get("error_description")
                            .and_then(Value::as_str)
                            .map(ToString::to_string),
                        error_uri: body
                            .get("error_uri")
                            .and_then(Value::as_str)
                            .map(ToString::to_string),
                    }));
                }
            }
        }
    }
    Err(processing!("unexpected HTTP status {status}"))
}

/// Parse a JSON response body.
pub(crate) fn json_body<T: DeserializeOwned>(response: &http::Response<Bytes>) -> Result<T> {
    serde_json::from_slice(response.body())
        .map_err(|e| processing!("issue parsing response body: {e}"))
}

/// Build a form-encoded POST, attaching a DPoP proof when the options
/// carry a key binding.
pub(crate) fn form_post(
    endpoint: &str, body: &[(String, String)], dpop: Option<&DpopOptions>,
    authorization: Option<&HeaderValue>,
) -> Result<http::Request<Bytes>> {
    let url = parse_endpoint(endpoint)?;
    let mut request = http::Request::builder()
        .method(http::Method::POST)
        .uri(endpoint)
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .header(header::ACCEPT, "application/json")
        .header(header::USER_AGENT, USER_AGENT);
    if let Some(options) = dpop {
        request = request.header("DPoP", dpop::proof(options, &http::Method::POST, &url, None)?);
    }
    if let Some(authorization) = authorization {
        request = request.header(header::AUTHORIZATION, authorization);
    }
    request
        .body(Bytes::from(urlencode::to_body(body)))
        .map_err(|e| invalid!("issue building request: {e}"))
}

/// Build an `Accept`-negotiating GET.
pub(crate) fn get(endpoint: &str, accept: &str) -> Result<http::Request<Bytes>> {
    parse_endpoint(endpoint)?;
    http::Request::builder()
        .method(http::Method::GET)
        .uri(endpoint)
        .header(header::ACCEPT, accept)
        .header(header::USER_AGENT, USER_AGENT)
        .body(Bytes::new())
        .map_err(|e| invalid!("issue building request: {e}"))
}

pub(crate) fn parse_endpoint(endpoint: &str) -> Result<Url> {
    if endpoint.is_empty() {
        return Err(invalid!("endpoint URL must be non-empty"));
    }
    Url::parse(endpoint).map_err(|e| invalid!("invalid endpoint URL {endpoint}: {e}"))
}

#[cfg(test)]
mod test {
    use serde_json::json;

    use super::*;

    fn response(status: u16, body: Value) -> http::Response<Bytes> {
        http::Response::builder()
            .status(status)
            .body(Bytes::from(body.to_string()))
            .expect("should build")
    }

    #[test]
    fn oauth_error_extracted_from_4xx() {
        let response = response(400, json!({"error": "invalid_grant", "error_description": 42}));
        let err = check_status(&response, StatusCode::OK).expect_err("should fail");
        let oauth = err.oauth().expect("protocol error");
        assert_eq!(oauth.error, "invalid_grant");
        // the non-string description was dropped
        assert_eq!(oauth.error_description, None);
    }

    #[test]
    fn missing_error_member_is_processing_error() {
        let response = response(400, json!({"message": "nope"}));
        let err = check_status(&response, StatusCode::OK).expect_err("should fail");
        assert!(err.oauth().is_none());
    }

    #[test]
    fn server_errors_never_surface_as_oauth() {
        let response = response(500, json!({"error": "server_error"}));
        let err = check_status(&response, StatusCode::OK).expect_err("should fail");
        assert!(err.oauth().is_none());
    }

    #[test]
    fn expected_status_passes() {
        assert!(check_status(&response(200, json!({})), StatusCode::OK).is_ok());
        assert!(check_status(&response(201, json!({})), StatusCode::CREATED).is_ok());
    }
}
