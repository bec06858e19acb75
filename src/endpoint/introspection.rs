//! # Token Introspection
//!
//! Request builder and response validator for the introspection
//! endpoint of [RFC 7662], including the signed
//! `application/token-introspection+jwt` response variant of
//! [JWT Introspection].
//!
//! [RFC 7662]: https://www.rfc-editor.org/rfc/rfc7662
//! [JWT Introspection]: https://datatracker.ietf.org/doc/html/draft-ietf-oauth-jwt-introspection-response

use bytes::Bytes;
use http::{StatusCode, header};
use serde_json::Value;

use crate::error::{invalid, processing};
use crate::jose::{jws, jwt};
use crate::provider::HttpClient;
use crate::types::{AuthorizationServer, Client, IntrospectionResponse};
use crate::{Result, auth, endpoint, jwks};

use super::RequestOptions;

const JWT_CONTENT_TYPE: &str = "application/token-introspection+jwt";

/// Build an introspection request for a token. The signed-response
/// media type is negotiated when the client's
/// `introspection_signed_response_alg` is set or `request_jwt_response`
/// asks for it.
///
/// # Errors
///
/// Returns an error when the server publishes no introspection
/// endpoint, the token is empty, or the client metadata is
/// inconsistent.
pub fn request(
    server: &AuthorizationServer, client: &Client, token: &str, request_jwt_response: bool,
    options: &RequestOptions<'_>,
) -> Result<http::Request<Bytes>> {
    let introspection_endpoint = server
        .introspection_endpoint
        .as_deref()
        .ok_or_else(|| invalid!("server metadata has no introspection_endpoint"))?;
    if token.is_empty() {
        return Err(invalid!("token must be non-empty"));
    }

    let mut body = vec![("token".to_string(), token.to_string())];
    body.extend(options.extra.iter().cloned());
    let authorization = auth::attach(server, client, options.client_key, &mut body)?;
    let mut request =
        endpoint::form_post(introspection_endpoint, &body, options.dpop, authorization.as_ref())?;

    if client.introspection_signed_response_alg.is_some() || request_jwt_response {
        request
            .headers_mut()
            .insert(header::ACCEPT, header::HeaderValue::from_static(JWT_CONTENT_TYPE));
    }
    Ok(request)
}

/// Validate an introspection response, JSON or signed JWT by
/// `Content-Type`. The final body must carry a boolean `active` member.
///
/// # Errors
///
/// Returns an error (or the server's OAuth error value) on any failed
/// check.
pub async fn process(
    http: &impl HttpClient, server: &AuthorizationServer, client: &Client,
    response: &http::Response<Bytes>,
) -> Result<IntrospectionResponse> {
    endpoint::check_status(response, StatusCode::OK)?;

    let content_type = response
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();

    let body: Value = if content_type.starts_with(JWT_CONTENT_TYPE) {
        let token = std::str::from_utf8(response.body())
            .map_err(|_| processing!("response body is not UTF-8"))?
            .trim();
        signed_introspection(http, server, client, token).await?
    } else {
        endpoint::json_body(response)?
    };

    if !body.get("active").is_some_and(Value::is_boolean) {
        return Err(processing!("introspection response must carry a boolean active member"));
    }
    serde_json::from_value(body).map_err(|e| processing!("issue parsing introspection: {e}"))
}

/// The signed variant: verify the JWS, require `iss`/`aud`/`iat` and
/// the `token-introspection+jwt` type, then unwrap the
/// `token_introspection` claim as the response body.
async fn signed_introspection(
    http: &impl HttpClient, server: &AuthorizationServer, client: &Client, token: &str,
) -> Result<Value> {
    let jws = jws::decode(token)?;
    jwt::check_alg(
        jws.header.alg,
        client.introspection_signed_response_alg,
        server.introspection_signing_alg_values_supported.as_deref(),
    )?;
    jwt::validate_typ(jws.header.typ.as_deref(), "token-introspection+jwt")?;

    let key = jwks::verification_key(http, server, &jws.header).await?;
    jws::verify(&jws, &key)?;

    let claims = jwt::parse_payload(&jws.payload)?;
    jwt::require_claims(&claims, &["iss", "aud", "iat"])?;
    jwt::validate_claim_types(&claims)?;
    jwt::validate_issuer(&claims, &server.issuer)?;
    jwt::validate_audience(&claims, &client.client_id, true)?;

    claims
        .get("token_introspection")
        .filter(|value| value.is_object())
        .cloned()
        .ok_or_else(|| processing!("JWT is missing required claim token_introspection"))
}

/// Introspect a token in one step.
///
/// # Errors
///
/// Propagates builder, transport, and validation failures.
pub async fn introspect(
    http: &impl HttpClient, server: &AuthorizationServer, client: &Client, token: &str,
    options: &RequestOptions<'_>,
) -> Result<IntrospectionResponse> {
    let response =
        endpoint::fetch(http, request(server, client, token, false, options)?).await?;
    process(http, server, client, &response).await
}

#[cfg(test)]
mod test {
    use serde_json::json;

    use super::*;
    use crate::types::TokenEndpointAuthMethod;

    fn server() -> AuthorizationServer {
        AuthorizationServer {
            issuer: "https://as.example".to_string(),
            token_endpoint: Some("https://as.example/token".to_string()),
            introspection_endpoint: Some("https://as.example/introspect".to_string()),
            ..AuthorizationServer::default()
        }
    }

    fn client() -> Client {
        Client {
            client_id: "client".to_string(),
            client_secret: Some("secret".to_string()),
            token_endpoint_auth_method: TokenEndpointAuthMethod::ClientSecretPost,
            ..Client::default()
        }
    }

    #[test]
    fn accept_negotiation() {
        let plain = request(&server(), &client(), "tok", false, &RequestOptions::default())
            .expect("should build");
        assert_eq!(
            plain.headers().get(header::ACCEPT).and_then(|v| v.to_str().ok()),
            Some("application/json")
        );

        let signed = request(&server(), &client(), "tok", true, &RequestOptions::default())
            .expect("should build");
        assert_eq!(
            signed.headers().get(header::ACCEPT).and_then(|v| v.to_str().ok()),
            Some(JWT_CONTENT_TYPE)
        );
    }

    #[tokio::test]
    async fn json_response_requires_active() {
        let http = crate::provider::test::unreachable();
        let ok = http::Response::builder()
            .status(200)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Bytes::from(json!({"active": false}).to_string()))
            .expect("should build");
        let body = process(&http, &server(), &client(), &ok).await.expect("should validate");
        assert!(!body.active);

        let bad = http::Response::builder()
            .status(200)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Bytes::from(json!({"active": "yes"}).to_string()))
            .expect("should build");
        assert!(process(&http, &server(), &client(), &bad).await.is_err());
    }
}
