//! # Token Endpoint
//!
//! Grant request builders (authorization code, refresh token, client
//! credentials, device code) and the response validators, including the
//! full ID Token validation pipeline for OpenID Connect exchanges
//! ([RFC 6749], [RFC 8628], [OpenID Connect Core]).
//!
//! [RFC 6749]: https://www.rfc-editor.org/rfc/rfc6749
//! [RFC 8628]: https://www.rfc-editor.org/rfc/rfc8628
//! [OpenID Connect Core]: https://openid.net/specs/openid-connect-core-1_0.html

use bytes::Bytes;
use http::StatusCode;

use crate::error::{invalid, processing, unsupported};
use crate::jose::{jws, jwt};
use crate::provider::HttpClient;
use crate::types::{AuthorizationServer, Client, ExpectedNonce, MaxAge, TokenResponse};
use crate::{Result, auth, endpoint, jwks};

use super::RequestOptions;

const DEVICE_GRANT: &str = "urn:ietf:params:oauth:grant-type:device_code";

/// Build an authorization-code grant request.
///
/// # Errors
///
/// Returns an error when the server has no token endpoint, a required
/// argument is empty, or the client metadata is inconsistent.
pub fn authorization_code(
    server: &AuthorizationServer, client: &Client, code: &str, redirect_uri: &str,
    code_verifier: Option<&str>, options: &RequestOptions<'_>,
) -> Result<http::Request<Bytes>> {
    if code.is_empty() {
        return Err(invalid!("authorization code must be non-empty"));
    }
    if redirect_uri.is_empty() {
        return Err(invalid!("redirect_uri must be non-empty"));
    }

    let mut body = vec![
        ("grant_type".to_string(), "authorization_code".to_string()),
        ("code".to_string(), code.to_string()),
        ("redirect_uri".to_string(), redirect_uri.to_string()),
    ];
    if let Some(verifier) = code_verifier {
        body.push(("code_verifier".to_string(), verifier.to_string()));
    }
    grant_request(server, client, body, options)
}

/// Build a refresh-token grant request.
///
/// # Errors
///
/// Returns an error when the server has no token endpoint or the
/// refresh token is empty.
pub fn refresh(
    server: &AuthorizationServer, client: &Client, refresh_token: &str,
    options: &RequestOptions<'_>,
) -> Result<http::Request<Bytes>> {
    if refresh_token.is_empty() {
        return Err(invalid!("refresh_token must be non-empty"));
    }
    let body = vec![
        ("grant_type".to_string(), "refresh_token".to_string()),
        ("refresh_token".to_string(), refresh_token.to_string()),
    ];
    grant_request(server, client, body, options)
}

/// Build a client-credentials grant request.
///
/// # Errors
///
/// Returns an error when the server has no token endpoint.
pub fn client_credentials(
    server: &AuthorizationServer, client: &Client, options: &RequestOptions<'_>,
) -> Result<http::Request<Bytes>> {
    let body = vec![("grant_type".to_string(), "client_credentials".to_string())];
    grant_request(server, client, body, options)
}

/// Build a device-code grant request ([RFC 8628] §3.4).
///
/// [RFC 8628]: https://www.rfc-editor.org/rfc/rfc8628
///
/// # Errors
///
/// Returns an error when the server has no token endpoint or the device
/// code is empty.
pub fn device_code(
    server: &AuthorizationServer, client: &Client, device_code: &str,
    options: &RequestOptions<'_>,
) -> Result<http::Request<Bytes>> {
    if device_code.is_empty() {
        return Err(invalid!("device_code must be non-empty"));
    }
    let body = vec![
        ("grant_type".to_string(), DEVICE_GRANT.to_string()),
        ("device_code".to_string(), device_code.to_string()),
    ];
    grant_request(server, client, body, options)
}

fn grant_request(
    server: &AuthorizationServer, client: &Client, mut body: Vec<(String, String)>,
    options: &RequestOptions<'_>,
) -> Result<http::Request<Bytes>> {
    let token_endpoint = server
        .token_endpoint
        .as_deref()
        .ok_or_else(|| invalid!("server metadata has no token_endpoint"))?;
    body.extend(options.extra.iter().cloned());
    let authorization = auth::attach(server, client, options.client_key, &mut body)?;
    endpoint::form_post(token_endpoint, &body, options.dpop, authorization.as_ref())
}

/// Validate an OpenID Connect authorization-code response: the generic
/// token checks plus a required ID Token with `nonce` and `auth_time`
/// enforcement. `max_age` of `None` applies the client default.
///
/// # Errors
///
/// Returns an error (or the server's OAuth error value) on any failed
/// check.
pub async fn process_oidc(
    http: &impl HttpClient, server: &AuthorizationServer, client: &Client,
    response: &http::Response<Bytes>, expected_nonce: &ExpectedNonce, max_age: Option<MaxAge>,
) -> Result<TokenResponse> {
    let mut body = parse_token_body(response)?;
    if body.id_token.is_none() {
        return Err(processing!("response has no id_token"));
    }
    let max_age = max_age.unwrap_or_else(|| MaxAge::for_client(client));
    validate_id_token(http, server, client, &mut body, Some(expected_nonce), max_age).await?;
    Ok(body)
}

/// Validate a plain OAuth 2.0 authorization-code response. A response
/// carrying an `id_token` fails: the caller used the wrong mode.
///
/// # Errors
///
/// Returns an error (or the server's OAuth error value) on any failed
/// check.
pub fn process_oauth2(response: &http::Response<Bytes>) -> Result<TokenResponse> {
    let body = parse_token_body(response)?;
    if body.id_token.is_some() {
        return Err(unsupported!(
            "response carries an id_token, use the OpenID Connect validator"
        ));
    }
    Ok(body)
}

/// Validate a refresh-token or device-code grant response. An ID Token,
/// when present, runs through the pipeline without a `nonce`
/// expectation.
///
/// # Errors
///
/// Returns an error (or the server's OAuth error value) on any failed
/// check.
pub async fn process(
    http: &impl HttpClient, server: &AuthorizationServer, client: &Client,
    response: &http::Response<Bytes>,
) -> Result<TokenResponse> {
    let mut body = parse_token_body(response)?;
    if body.id_token.is_some() {
        validate_id_token(http, server, client, &mut body, None, MaxAge::Skip).await?;
    }
    Ok(body)
}

/// Validate a client-credentials response. No ID Token or refresh token
/// is expected; any present are left uninspected.
///
/// # Errors
///
/// Returns an error (or the server's OAuth error value) on any failed
/// check.
pub fn process_client_credentials(response: &http::Response<Bytes>) -> Result<TokenResponse> {
    parse_token_body(response)
}

/// The checks every token response undergoes: status `200`, required
/// `access_token` and `token_type`, lowercased `token_type`, positive
/// `expires_in`, and non-empty optional strings.
fn parse_token_body(response: &http::Response<Bytes>) -> Result<TokenResponse> {
    endpoint::check_status(response, StatusCode::OK)?;
    let mut body: TokenResponse = endpoint::json_body(response)?;

    if body.access_token.is_empty() {
        return Err(processing!("response access_token must be non-empty"));
    }
    if body.token_type.is_empty() {
        return Err(processing!("response token_type must be non-empty"));
    }
    body.token_type = body.token_type.to_ascii_lowercase();

    if body.expires_in == Some(0) {
        return Err(processing!("response expires_in must be positive"));
    }
    if body.refresh_token.as_deref().is_some_and(str::is_empty) {
        return Err(processing!("response refresh_token must be non-empty"));
    }
    if body.scope.as_deref().is_some_and(str::is_empty) {
        return Err(processing!("response scope must be non-empty"));
    }
    if body.id_token.as_deref().is_some_and(str::is_empty) {
        return Err(processing!("response id_token must be non-empty"));
    }
    Ok(body)
}

/// The ID Token pipeline: signature over a server key, algorithm
/// policy, claim presence and types, issuer, audience, `azp`,
/// `auth_time`, `at_hash` when present, and the caller's `nonce`
/// expectation. Validated claims are recorded on the response.
async fn validate_id_token(
    http: &impl HttpClient, server: &AuthorizationServer, client: &Client,
    body: &mut TokenResponse, expected_nonce: Option<&ExpectedNonce>, max_age: MaxAge,
) -> Result<()> {
    let id_token = body.id_token.as_deref().unwrap_or_default();
    let jws = jws::decode(id_token)?;
    jwt::check_alg(
        jws.header.alg,
        client.id_token_signed_response_alg,
        server.id_token_signing_alg_values_supported.as_deref(),
    )?;

    let key = jwks::verification_key(http, server, &jws.header).await?;
    jws::verify(&jws, &key)?;

    let claims = jwt::parse_payload(&jws.payload)?;
    jwt::require_claims(&claims, &["iss", "aud", "sub", "iat", "exp"])?;
    jwt::validate_claim_types(&claims)?;
    jwt::validate_issuer(&claims, &server.issuer)?;
    jwt::validate_audience(&claims, &client.client_id, true)?;
    jwt::validate_azp(&claims, &client.client_id)?;
    jwt::validate_auth_time(&claims, client.require_auth_time, &max_age)?;
    if claims.contains_key("at_hash") {
        jwt::validate_at_hash(&claims, &body.access_token, jws.header.alg)?;
    }
    // only the OIDC code-exchange validator binds a nonce expectation
    if let Some(expected) = expected_nonce {
        jwt::validate_nonce(&claims, expected)?;
    }

    body.set_id_token_claims(claims);
    Ok(())
}
