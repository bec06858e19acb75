//! # JWT-Secured Authorization Requests
//!
//! Issuance of signed request objects ([RFC 9101],
//! `typ: oauth-authz-req+jwt`), optionally encrypted to the server when
//! it publishes an encryption key. This is the library's only consumer
//! of JWE issuance.
//!
//! [RFC 9101]: https://www.rfc-editor.org/rfc/rfc9101

use serde_json::{Map, Value, json};

use crate::Result;
use crate::core::{generate, unix_now};
use crate::error::{invalid, processing};
use crate::jose::jwa::{JweAlg, JweEnc};
use crate::jose::jwe;
use crate::jose::jwk::{Jwk, PrivateKey};
use crate::jose::jws::{self, ProtectedHeader};
use crate::types::{AuthorizationServer, Client};

/// Lifetime of issued request objects.
const REQUEST_OBJECT_LIFETIME: i64 = 60;

/// Sign an authorization request as a request object: the given
/// parameters plus `iss` (the client), `aud` (the issuer), `jti`, and a
/// sixty-second validity window.
///
/// # Errors
///
/// Returns an error when the key fails validation or a parameter name
/// collides with a reserved claim.
pub fn request_object(
    server: &AuthorizationServer, client: &Client, parameters: &[(String, String)],
    key: &PrivateKey,
) -> Result<String> {
    if client.client_id.is_empty() {
        return Err(invalid!("client_id must be non-empty"));
    }

    let mut claims = Map::new();
    for (name, value) in parameters {
        claims.insert(name.clone(), Value::String(value.clone()));
    }
    claims.insert("client_id".to_string(), json!(client.client_id));

    let now = unix_now();
    claims.insert("iss".to_string(), json!(client.client_id));
    claims.insert("aud".to_string(), json!(server.issuer));
    claims.insert("jti".to_string(), json!(generate::jti()));
    claims.insert("iat".to_string(), json!(now));
    claims.insert("nbf".to_string(), json!(now));
    claims.insert("exp".to_string(), json!(now + REQUEST_OBJECT_LIFETIME));

    let mut header = ProtectedHeader::new(key.key.alg()?);
    header.typ = Some("oauth-authz-req+jwt".to_string());
    header.kid.clone_from(&key.kid);

    let payload = serde_json::to_vec(&Value::Object(claims))
        .map_err(|e| processing!("issue serializing request object: {e}"))?;
    jws::sign(&header, &payload, &key.key)
}

/// Sign and encrypt a request object to the server's encryption key.
/// The key-management algorithm follows the recipient JWK's `alg`
/// annotation, else its key type (`ECDH-ES` for EC, `RSA-OAEP` for
/// RSA); content encryption follows the client's
/// `request_object_encryption_enc`, defaulting to `A128CBC-HS256`.
///
/// # Errors
///
/// Returns an error when the recipient key is unusable or either layer
/// fails.
pub fn encrypted_request_object(
    server: &AuthorizationServer, client: &Client, parameters: &[(String, String)],
    key: &PrivateKey, recipient: &Jwk,
) -> Result<String> {
    let signed = request_object(server, client, parameters, key)?;

    let alg = match recipient.alg.as_deref() {
        Some(annotated) => annotated.parse::<JweAlg>()?,
        None if recipient.kty == "EC" => JweAlg::EcdhEs,
        None => JweAlg::RsaOaep,
    };
    let enc = client.request_object_encryption_enc.unwrap_or(JweEnc::A128CbcHs256);

    jwe::encrypt(
        alg,
        enc,
        &recipient.encryption_key()?,
        signed.as_bytes(),
        recipient.kid.as_deref(),
        Some("oauth-authz-req+jwt"),
    )
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
            ..AuthorizationServer::default()
        }
    }

    fn client() -> Client {
        Client {
            client_id: "client".to_string(),
            ..Client::default()
        }
    }

    fn key() -> PrivateKey {
        let signing = SigningKey::Es256(p256::ecdsa::SigningKey::random(&mut OsRng));
        PrivateKey::new(signing, None).expect("valid key")
    }

    #[test]
    fn request_object_claims() {
        let parameters = vec![
            ("response_type".to_string(), "code".to_string()),
            ("redirect_uri".to_string(), "https://rp.example/cb".to_string()),
        ];
        let signed = request_object(&server(), &client(), &parameters, &key())
            .expect("should sign");

        let jws = jws::decode(&signed).expect("should decode");
        assert_eq!(jws.header.typ.as_deref(), Some("oauth-authz-req+jwt"));

        let claims: Value = serde_json::from_slice(&jws.payload).expect("should parse");
        assert_eq!(claims["iss"], "client");
        assert_eq!(claims["aud"], "https://as.example");
        assert_eq!(claims["response_type"], "code");
        assert_eq!(
            claims["exp"].as_i64().expect("number") - claims["iat"].as_i64().expect("number"),
            60
        );
        assert!(claims["jti"].is_string());
    }

    #[test]
    fn encrypted_request_object_structure() {
        let recipient = key().key.public_jwk().expect("should project");
        let sealed = encrypted_request_object(&server(), &client(), &[], &key(), &recipient)
            .expect("should encrypt");
        assert_eq!(sealed.split('.').count(), 5);

        let header: Value = serde_json::from_slice(
            &crate::core::codec::b64url_decode(sealed.split('.').next().expect("header"))
                .expect("should decode"),
        )
        .expect("should parse");
        // EC recipient key without an alg annotation selects ECDH-ES
        assert_eq!(header["alg"], "ECDH-ES");
        assert_eq!(header["enc"], "A128CBC-HS256");
        assert_eq!(header["cty"], "oauth-authz-req+jwt");
    }

    #[test]
    fn signature_verifies() {
        let key = key();
        let signed = request_object(&server(), &client(), &[], &key).expect("should sign");
        let jws = jws::decode(&signed).expect("should decode");
        let verifier = key.key.public_jwk().expect("should project")
            .verifying_key(JwsAlg::ES256).expect("should import");
        jws::verify(&jws, &verifier).expect("should verify");
    }
}
