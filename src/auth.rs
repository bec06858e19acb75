//! # Client Authentication
//!
//! The five token-endpoint authentication methods of [RFC 6749] §2.3
//! and [OpenID Connect Core] §9: `client_secret_basic`,
//! `client_secret_post`, `client_secret_jwt`, `private_key_jwt`, and
//! `none`. Inconsistent combinations of method, secret, and private key
//! are rejected before any request is built.
//!
//! [RFC 6749]: https://www.rfc-editor.org/rfc/rfc6749
//! [OpenID Connect Core]: https://openid.net/specs/openid-connect-core-1_0.html

use hmac::{Hmac, Mac};
use http::HeaderValue;
use serde_json::json;
use sha2::{Sha256, Sha384, Sha512};
use uuid::Uuid;

use crate::Result;
use crate::core::{codec, unix_now, urlencode};
use crate::error::{invalid, processing};
use crate::jose::jwa::HmacAlg;
use crate::jose::jwk::PrivateKey;
use crate::jose::jws::{self, ProtectedHeader};
use crate::types::{AuthorizationServer, Client, TokenEndpointAuthMethod};

const ASSERTION_TYPE: &str = "urn:ietf:params:oauth:client-assertion-type:jwt-bearer";

/// Lifetime of issued client assertions.
const ASSERTION_LIFETIME: i64 = 60;

/// Apply the client's authentication method to an outgoing
/// form-encoded request: body parameters are appended, and the
/// `Authorization` header value returned when the method uses one.
///
/// # Errors
///
/// Returns an error for inconsistent client metadata: a `client_secret_*`
/// method without a secret or with a private key, `private_key_jwt`
/// without a key or with a secret, or `none` with a secret.
pub(crate) fn attach(
    server: &AuthorizationServer, client: &Client, key: Option<&PrivateKey>,
    body: &mut Vec<(String, String)>,
) -> Result<Option<HeaderValue>> {
    if client.client_id.is_empty() {
        return Err(invalid!("client_id must be non-empty"));
    }

    match client.token_endpoint_auth_method {
        TokenEndpointAuthMethod::ClientSecretBasic => {
            let secret = require_secret(client)?;
            forbid_key(key)?;
            let credentials = format!(
                "{}:{}",
                urlencode::encode(&client.client_id),
                urlencode::encode(secret)
            );
            let header = format!("Basic {}", codec::b64(credentials.as_bytes()));
            Ok(Some(
                HeaderValue::from_str(&header)
                    .map_err(|e| invalid!("invalid client credentials: {e}"))?,
            ))
        }
        TokenEndpointAuthMethod::ClientSecretPost => {
            let secret = require_secret(client)?;
            forbid_key(key)?;
            body.push(("client_id".to_string(), client.client_id.clone()));
            body.push(("client_secret".to_string(), secret.to_string()));
            Ok(None)
        }
        TokenEndpointAuthMethod::ClientSecretJwt => {
            let secret = require_secret(client)?;
            forbid_key(key)?;
            let assertion = secret_assertion(server, client, secret)?;
            push_assertion(body, client, assertion);
            Ok(None)
        }
        TokenEndpointAuthMethod::PrivateKeyJwt => {
            if client.client_secret.is_some() {
                return Err(invalid!("private_key_jwt does not use a client_secret"));
            }
            let key =
                key.ok_or_else(|| invalid!("private_key_jwt requires a client private key"))?;
            let assertion = key_assertion(server, client, key)?;
            push_assertion(body, client, assertion);
            Ok(None)
        }
        TokenEndpointAuthMethod::None => {
            if client.client_secret.is_some() {
                return Err(invalid!("auth method none does not use a client_secret"));
            }
            body.push(("client_id".to_string(), client.client_id.clone()));
            Ok(None)
        }
    }
}

fn require_secret(client: &Client) -> Result<&str> {
    match client.client_secret.as_deref() {
        Some(secret) if !secret.is_empty() => Ok(secret),
        _ => Err(invalid!(
            "{:?} requires a client_secret",
            client.token_endpoint_auth_method
        )),
    }
}

fn forbid_key(key: Option<&PrivateKey>) -> Result<()> {
    if key.is_some() {
        return Err(invalid!("client_secret_* methods do not use a client private key"));
    }
    Ok(())
}

fn push_assertion(body: &mut Vec<(String, String)>, client: &Client, assertion: String) {
    body.push(("client_id".to_string(), client.client_id.clone()));
    body.push(("client_assertion_type".to_string(), ASSERTION_TYPE.to_string()));
    body.push(("client_assertion".to_string(), assertion));
}

/// The claim set shared by both assertion flavors: the client speaks
/// about itself, to the issuer and token endpoint, for sixty seconds.
fn assertion_claims(server: &AuthorizationServer, client: &Client) -> Result<Vec<u8>> {
    let token_endpoint = server
        .token_endpoint
        .as_deref()
        .ok_or_else(|| invalid!("server metadata has no token_endpoint"))?;
    let now = unix_now();
    let claims = json!({
        "jti": Uuid::new_v4().to_string(),
        "aud": [server.issuer.as_str(), token_endpoint],
        "exp": now + ASSERTION_LIFETIME,
        "iat": now,
        "nbf": now,
        "iss": client.client_id.as_str(),
        "sub": client.client_id.as_str(),
    });
    serde_json::to_vec(&claims).map_err(|e| processing!("issue serializing assertion: {e}"))
}

/// An HMAC-signed (`client_secret_jwt`) assertion. The algorithm is the
/// client's configured choice, else the first HS* value the server
/// advertises.
fn secret_assertion(server: &AuthorizationServer, client: &Client, secret: &str)
-> Result<String> {
    let alg = match client.token_endpoint_auth_signing_alg {
        Some(alg) => alg,
        None => server
            .token_endpoint_auth_signing_alg_values_supported
            .as_deref()
            .unwrap_or_default()
            .iter()
            .find_map(|value| value.parse::<HmacAlg>().ok())
            .ok_or_else(|| {
                invalid!("server advertises no HMAC algorithm for client_secret_jwt")
            })?,
    };

    let header = json!({"alg": alg.to_string()});
    let signing_input = format!(
        "{}.{}",
        codec::b64url(
            serde_json::to_vec(&header).map_err(|e| processing!("issue serializing header: {e}"))?
        ),
        codec::b64url(assertion_claims(server, client)?)
    );

    let tag = match alg {
        HmacAlg::HS256 => {
            let mut mac = <Hmac<Sha256> as Mac>::new_from_slice(secret.as_bytes())
                .map_err(|e| invalid!("invalid client_secret: {e}"))?;
            mac.update(signing_input.as_bytes());
            mac.finalize().into_bytes().to_vec()
        }
        HmacAlg::HS384 => {
            let mut mac = <Hmac<Sha384> as Mac>::new_from_slice(secret.as_bytes())
                .map_err(|e| invalid!("invalid client_secret: {e}"))?;
            mac.update(signing_input.as_bytes());
            mac.finalize().into_bytes().to_vec()
        }
        HmacAlg::HS512 => {
            let mut mac = <Hmac<Sha512> as Mac>::new_from_slice(secret.as_bytes())
                .map_err(|e| invalid!("invalid client_secret: {e}"))?;
            mac.update(signing_input.as_bytes());
            mac.finalize().into_bytes().to_vec()
        }
    };

    Ok(format!("{signing_input}.{}", codec::b64url(tag)))
}

/// A JWS (`private_key_jwt`) assertion, algorithm derived from the key.
fn key_assertion(
    server: &AuthorizationServer, client: &Client, key: &PrivateKey,
) -> Result<String> {
    let mut header = ProtectedHeader::new(key.key.alg()?);
    header.kid.clone_from(&key.kid);
    jws::sign(&header, &assertion_claims(server, client)?, &key.key)
}

#[cfg(test)]
mod test {
    use rand_core::OsRng;
    use serde_json::Value;

    use super::*;
    use crate::jose::jwa::JwsAlg;
    use crate::jose::jwk::SigningKey;

    fn server() -> AuthorizationServer {
        AuthorizationServer {
            issuer: "https://as.example".to_string(),
            token_endpoint: Some("https://as.example/token".to_string()),
            token_endpoint_auth_signing_alg_values_supported: Some(vec![
                "HS256".to_string(),
            ]),
            ..AuthorizationServer::default()
        }
    }

    fn confidential(method: TokenEndpointAuthMethod) -> Client {
        Client {
            client_id: "client".to_string(),
            client_secret: Some("s3cret!".to_string()),
            token_endpoint_auth_method: method,
            ..Client::default()
        }
    }

    #[test]
    fn basic_credentials_are_form_encoded() {
        let client = Client {
            client_id: "a+b".to_string(),
            client_secret: Some("s cret".to_string()),
            ..Client::default()
        };
        let mut body = Vec::new();
        let header =
            attach(&server(), &client, None, &mut body).expect("should attach").expect("header");
        // base64("a%2Bb:s+cret")
        assert_eq!(header.to_str().expect("ascii"), format!("Basic {}",
            codec::b64(b"a%2Bb:s+cret")));
        assert!(body.is_empty());
    }

    #[test]
    fn post_puts_credentials_in_body() {
        let client = confidential(TokenEndpointAuthMethod::ClientSecretPost);
        let mut body = Vec::new();
        let header = attach(&server(), &client, None, &mut body).expect("should attach");
        assert!(header.is_none());
        assert!(body.contains(&("client_id".to_string(), "client".to_string())));
        assert!(body.contains(&("client_secret".to_string(), "s3cret!".to_string())));
    }

    #[test]
    fn secret_jwt_assertion_shape() {
        let client = confidential(TokenEndpointAuthMethod::ClientSecretJwt);
        let mut body = Vec::new();
        attach(&server(), &client, None, &mut body).expect("should attach");

        let assertion = body
            .iter()
            .find(|(name, _)| name == "client_assertion")
            .map(|(_, value)| value.clone())
            .expect("assertion present");
        let segments: Vec<&str> = assertion.split('.').collect();
        assert_eq!(segments.len(), 3);

        let header: Value =
            serde_json::from_slice(&codec::b64url_decode(segments[0]).expect("should decode"))
                .expect("should parse");
        assert_eq!(header["alg"], "HS256");

        let claims: Value =
            serde_json::from_slice(&codec::b64url_decode(segments[1]).expect("should decode"))
                .expect("should parse");
        assert_eq!(claims["iss"], "client");
        assert_eq!(claims["sub"], "client");
        assert_eq!(claims["aud"],
            serde_json::json!(["https://as.example", "https://as.example/token"]));
        assert_eq!(
            claims["exp"].as_i64().expect("number") - claims["iat"].as_i64().expect("number"),
            60
        );
        assert!(
            body.contains(&("client_assertion_type".to_string(), ASSERTION_TYPE.to_string()))
        );
    }

    #[test]
    fn private_key_jwt_assertion_verifies() {
        let signing = SigningKey::Es256(p256::ecdsa::SigningKey::random(&mut OsRng));
        let key = PrivateKey::new(signing, Some("kid-1".to_string())).expect("valid key");
        let client = Client {
            client_id: "client".to_string(),
            token_endpoint_auth_method: TokenEndpointAuthMethod::PrivateKeyJwt,
            ..Client::default()
        };

        let mut body = Vec::new();
        attach(&server(), &client, Some(&key), &mut body).expect("should attach");
        let assertion = body
            .iter()
            .find(|(name, _)| name == "client_assertion")
            .map(|(_, value)| value.clone())
            .expect("assertion present");

        let jws = jws::decode(&assertion).expect("should decode");
        assert_eq!(jws.header.kid.as_deref(), Some("kid-1"));
        let verifier = key.key.public_jwk().expect("should project")
            .verifying_key(JwsAlg::ES256).expect("should import");
        jws::verify(&jws, &verifier).expect("should verify");
    }

    #[test]
    fn inconsistent_metadata_rejected() {
        let signing = SigningKey::Es256(p256::ecdsa::SigningKey::random(&mut OsRng));
        let key = PrivateKey::new(signing, None).expect("valid key");

        // secret methods refuse a private key
        let client = confidential(TokenEndpointAuthMethod::ClientSecretBasic);
        assert!(attach(&server(), &client, Some(&key), &mut Vec::new()).is_err());

        // private_key_jwt refuses a secret and requires a key
        let client = confidential(TokenEndpointAuthMethod::PrivateKeyJwt);
        assert!(attach(&server(), &client, Some(&key), &mut Vec::new()).is_err());
        let mut client = confidential(TokenEndpointAuthMethod::PrivateKeyJwt);
        client.client_secret = None;
        assert!(attach(&server(), &client, None, &mut Vec::new()).is_err());

        // none refuses a secret
        let client = confidential(TokenEndpointAuthMethod::None);
        assert!(attach(&server(), &client, None, &mut Vec::new()).is_err());

        // missing secret
        let mut client = confidential(TokenEndpointAuthMethod::ClientSecretBasic);
        client.client_secret = None;
        assert!(attach(&server(), &client, None, &mut Vec::new()).is_err());
    }
}
