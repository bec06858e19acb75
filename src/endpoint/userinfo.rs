//! # UserInfo
//!
//! Request builder and response validator for the UserInfo endpoint
//! ([OpenID Connect Core] §5.3), covering both the JSON and the signed
//! `application/jwt` response variants. The subject of the response is
//! pinned to the ID Token's unless the caller explicitly opts out.
//!
//! [OpenID Connect Core]: https://openid.net/specs/openid-connect-core-1_0.html

use bytes::Bytes;
use http::{HeaderMap, StatusCode, header};
use serde_json::Value;

use crate::dpop::DpopOptions;
use crate::error::{invalid, processing};
use crate::jose::{jws, jwt};
use crate::provider::HttpClient;
use crate::types::{AuthorizationServer, Client, ExpectedSubject, UserInfo};
use crate::{Result, endpoint, jwks};

use super::resource;

/// Build a UserInfo request authorized by the access token. The signed
/// media type is negotiated when the client's
/// `userinfo_signed_response_alg` is set.
///
/// # Errors
///
/// Returns an error when the server publishes no UserInfo endpoint or
/// the access token is empty.
pub fn request(
    server: &AuthorizationServer, client: &Client, access_token: &str,
    dpop: Option<&DpopOptions>,
) -> Result<http::Request<Bytes>> {
    let userinfo_endpoint = server
        .userinfo_endpoint
        .as_deref()
        .ok_or_else(|| invalid!("server metadata has no userinfo_endpoint"))?;
    let url = endpoint::parse_endpoint(userinfo_endpoint)?;

    let accept = if client.userinfo_signed_response_alg.is_some() {
        "application/jwt"
    } else {
        "application/json"
    };
    let mut headers = HeaderMap::new();
    headers.insert(header::ACCEPT, header::HeaderValue::from_static(accept));
    resource::request(access_token, &http::Method::GET, &url, headers, None, dpop)
}

/// Validate a UserInfo response, JSON or signed JWT by `Content-Type`.
/// The body must carry a non-empty `sub`, compared against
/// `expected_subject` unless skipped.
///
/// # Errors
///
/// Returns an error (or the server's OAuth error value) on any failed
/// check.
pub async fn process(
    http: &impl HttpClient, server: &AuthorizationServer, client: &Client,
    expected_subject: &ExpectedSubject, response: &http::Response<Bytes>,
) -> Result<UserInfo> {
    endpoint::check_status(response, StatusCode::OK)?;

    let content_type = response
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();

    let body: Value = if content_type.starts_with("application/jwt") {
        let token = std::str::from_utf8(response.body())
            .map_err(|_| processing!("response body is not UTF-8"))?
            .trim();
        signed_userinfo(http, server, client, token).await?
    } else {
        endpoint::json_body(response)?
    };

    let userinfo: UserInfo = serde_json::from_value(body)
        .map_err(|e| processing!("issue parsing userinfo: {e}"))?;
    if userinfo.sub.is_empty() {
        return Err(processing!("userinfo sub must be non-empty"));
    }
    if let ExpectedSubject::Value(expected) = expected_subject {
        if userinfo.sub != *expected {
            return Err(processing!("unexpected userinfo sub value"));
        }
    }
    Ok(userinfo)
}

/// The signed variant: verify the JWS under the userinfo algorithm
/// policy; `iss` and `aud`, when present, must name the server and this
/// client.
async fn signed_userinfo(
    http: &impl HttpClient, server: &AuthorizationServer, client: &Client, token: &str,
) -> Result<Value> {
    let jws = jws::decode(token)?;
    jwt::check_alg(
        jws.header.alg,
        client.userinfo_signed_response_alg,
        server.userinfo_signing_alg_values_supported.as_deref(),
    )?;

    let key = jwks::verification_key(http, server, &jws.header).await?;
    jws::verify(&jws, &key)?;

    let claims = jwt::parse_payload(&jws.payload)?;
    jwt::validate_claim_types(&claims)?;
    if claims.contains_key("iss") {
        jwt::validate_issuer(&claims, &server.issuer)?;
    }
    jwt::validate_audience(&claims, &client.client_id, false)?;
    Ok(Value::Object(claims))
}

/// Fetch and validate UserInfo in one step.
///
/// # Errors
///
/// Propagates builder, transport, and validation failures.
pub async fn fetch(
    http: &impl HttpClient, server: &AuthorizationServer, client: &Client, access_token: &str,
    expected_subject: &ExpectedSubject, dpop: Option<&DpopOptions>,
) -> Result<UserInfo> {
    let response =
        endpoint::fetch(http, request(server, client, access_token, dpop)?).await?;
    process(http, server, client, expected_subject, &response).await
}
