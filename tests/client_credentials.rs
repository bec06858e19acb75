//! Client-credentials grant with a `client_secret_jwt` assertion.

use bytes::Bytes;
use openid_rp::endpoint::{RequestOptions, token};
use openid_rp::types::{AuthorizationServer, Client, TokenEndpointAuthMethod};
use serde_json::{Value, json};

const ISSUER: &str = "https://cc.example";

fn body_params(request: &http::Request<Bytes>) -> Vec<(String, String)> {
    url::form_urlencoded::parse(request.body())
        .map(|(n, v)| (n.into_owned(), v.into_owned()))
        .collect()
}

#[test]
fn assertion_follows_server_metadata() {
    let server = AuthorizationServer {
        issuer: ISSUER.to_string(),
        token_endpoint: Some(format!("{ISSUER}/token")),
        token_endpoint_auth_signing_alg_values_supported: Some(vec![
            "RS256".to_string(),
            "HS256".to_string(),
        ]),
        ..AuthorizationServer::default()
    };
    let client = Client {
        client_id: "c".to_string(),
        client_secret: Some("a-sufficiently-long-shared-secret".to_string()),
        token_endpoint_auth_method: TokenEndpointAuthMethod::ClientSecretJwt,
        ..Client::default()
    };

    let request = token::client_credentials(&server, &client, &RequestOptions::default())
        .expect("should build");
    let params = body_params(&request);

    assert!(params.contains(&("grant_type".to_string(), "client_credentials".to_string())));
    let assertion = params
        .iter()
        .find(|(n, _)| n == "client_assertion")
        .map(|(_, v)| v.clone())
        .expect("assertion present");

    // the first HS* value the server advertises is selected
    let header_segment = assertion.split('.').next().expect("header");
    let header: Value = serde_json::from_slice(
        &openid_rp::core::codec::b64url_decode(header_segment).expect("should decode"),
    )
    .expect("should parse");
    assert_eq!(header["alg"], "HS256");

    let claims: Value = serde_json::from_slice(
        &openid_rp::core::codec::b64url_decode(assertion.split('.').nth(1).expect("claims"))
            .expect("should decode"),
    )
    .expect("should parse");
    assert_eq!(claims["iss"], "c");
    assert_eq!(claims["sub"], "c");
    assert_eq!(claims["aud"], json!([ISSUER, format!("{ISSUER}/token")]));

    // and the response never inspects tokens it did not ask for
    let response = http::Response::builder()
        .status(200)
        .body(Bytes::from(
            json!({"access_token": "a", "token_type": "Bearer"}).to_string(),
        ))
        .expect("should build");
    let tokens = token::process_client_credentials(&response).expect("should validate");
    assert_eq!(tokens.token_type, "bearer");
    assert!(tokens.id_token_claims().is_none());
}
