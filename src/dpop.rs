//! # Demonstrating Proof-of-Possession
//!
//! DPoP ([draft-ietf-oauth-dpop]) key binding: proof JWT issuance for
//! endpoint and protected-resource requests, and the per-origin nonce
//! store that makes `use_dpop_nonce` recovery automatic. Every response
//! the library fetches passes through [`record_nonce`] before its body
//! is inspected, so the next proof for that origin carries the server's
//! latest nonce without caller involvement.
//!
//! [draft-ietf-oauth-dpop]: https://datatracker.ietf.org/doc/html/draft-ietf-oauth-dpop-06

use std::sync::{LazyLock, Mutex};

use bytes::Bytes;
use serde_json::json;
use sha2::{Digest, Sha256};
use url::Url;

use crate::Result;
use crate::core::cache::Lru;
use crate::core::{codec, generate, unix_now};
use crate::error::processing;
use crate::jose::jwk::PrivateKey;
use crate::jose::jws::{self, ProtectedHeader};

/// Nonces are tracked for the most recently seen origins.
const NONCE_CACHE_SIZE: usize = 100;

static NONCES: LazyLock<Mutex<Lru<String, String>>> =
    LazyLock::new(|| Mutex::new(Lru::new(NONCE_CACHE_SIZE)));

/// DPoP configuration for a request: the client's proof-of-possession
/// key pair and an optional nonce override.
#[derive(Clone, Debug)]
pub struct DpopOptions {
    /// The proof signing key. Its public half is embedded in every
    /// proof header.
    pub key: PrivateKey,

    /// Explicit nonce, overriding the per-origin cache.
    pub nonce: Option<String>,
}

impl DpopOptions {
    /// Bind proofs to the given key pair.
    #[must_use]
    pub const fn new(key: PrivateKey) -> Self {
        Self {
            key,
            nonce: None,
        }
    }
}

/// Build a proof JWT for one HTTP request. `access_token` is supplied
/// when authorizing a protected-resource request, binding the proof to
/// the token via the `ath` claim.
///
/// # Errors
///
/// Returns an error when the key fails validation.
pub fn proof(
    options: &DpopOptions, method: &http::Method, url: &Url, access_token: Option<&str>,
) -> Result<String> {
    let alg = options.key.key.alg()?;
    let header = ProtectedHeader {
        alg,
        typ: Some("dpop+jwt".to_string()),
        kid: None,
        jwk: Some(options.key.key.public_jwk()?),
        crit: None,
    };

    let origin = url.origin().ascii_serialization();
    let nonce = options
        .nonce
        .clone()
        .or_else(|| NONCES.lock().expect("lock poisoned").get(&origin).cloned());

    let mut claims = json!({
        "iat": unix_now(),
        "jti": generate::jti(),
        "htm": method.as_str(),
        // the proof covers origin and path only, never query or fragment
        "htu": format!("{origin}{}", url.path()),
    });
    if let Some(nonce) = nonce {
        claims["nonce"] = json!(nonce);
    }
    if let Some(token) = access_token {
        claims["ath"] = json!(codec::b64url(Sha256::digest(token.as_bytes())));
    }

    let payload =
        serde_json::to_vec(&claims).map_err(|e| processing!("issue serializing proof: {e}"))?;
    jws::sign(&header, &payload, &options.key.key)
}

/// Record the `DPoP-Nonce` header of a response, successful or not,
/// against the request origin.
pub fn record_nonce(url: &Url, response: &http::Response<Bytes>) {
    let Some(nonce) = response.headers().get("dpop-nonce").and_then(|v| v.to_str().ok()) else {
        return;
    };
    let origin = url.origin().ascii_serialization();
    tracing::debug!("recording DPoP nonce for {origin}");
    NONCES.lock().expect("lock poisoned").insert(origin, nonce.to_string());
}

/// The cached nonce for an origin, if one has been observed.
#[must_use]
pub fn cached_nonce(url: &Url) -> Option<String> {
    NONCES.lock().expect("lock poisoned").get(&url.origin().ascii_serialization()).cloned()
}

#[cfg(test)]
mod test {
    use rand_core::OsRng;
    use serde_json::Value;

    use super::*;
    use crate::jose::jwa::JwsAlg;
    use crate::jose::jwk::SigningKey;

    fn options() -> DpopOptions {
        let key = SigningKey::Es256(p256::ecdsa::SigningKey::random(&mut OsRng));
        DpopOptions::new(PrivateKey::new(key, None).expect("valid key"))
    }

    fn claims(token: &str) -> Value {
        let jws = jws::decode(token).expect("should decode");
        serde_json::from_slice(&jws.payload).expect("should parse")
    }

    #[test]
    fn proof_shape() {
        let url = Url::parse("https://rs.example/api/data?page=2").expect("valid url");
        let token = proof(&options(), &http::Method::GET, &url, Some("a-token"))
            .expect("should build proof");

        let jws = jws::decode(&token).expect("should decode");
        assert_eq!(jws.header.alg, JwsAlg::ES256);
        assert_eq!(jws.header.typ.as_deref(), Some("dpop+jwt"));
        let jwk = jws.header.jwk.expect("public key embedded");
        assert!(jwk.verifying_key(JwsAlg::ES256).is_ok());

        let claims = claims(&token);
        assert_eq!(claims["htm"], "GET");
        assert_eq!(claims["htu"], "https://rs.example/api/data");
        assert_eq!(
            claims["ath"],
            Value::String(codec::b64url(Sha256::digest(b"a-token")))
        );
    }

    #[test]
    fn nonce_self_correction() {
        let url = Url::parse("https://nonce-test.example/par").expect("valid url");
        let response = http::Response::builder()
            .status(400)
            .header("DPoP-Nonce", "N1")
            .body(Bytes::new())
            .expect("should build");
        record_nonce(&url, &response);

        // same origin, different path
        let other = Url::parse("https://nonce-test.example/token").expect("valid url");
        let token =
            proof(&options(), &http::Method::POST, &other, None).expect("should build proof");
        assert_eq!(claims(&token)["nonce"], "N1");

        // explicit override wins
        let mut with_override = options();
        with_override.nonce = Some("N2".to_string());
        let token =
            proof(&with_override, &http::Method::POST, &other, None).expect("should build proof");
        assert_eq!(claims(&token)["nonce"], "N2");
    }

    #[test]
    fn no_nonce_claim_without_observation() {
        let url = Url::parse("https://quiet.example/token").expect("valid url");
        let token = proof(&options(), &http::Method::POST, &url, None).expect("should build proof");
        assert_eq!(claims(&token).get("nonce"), None);
        assert_eq!(claims(&token).get("ath"), None);
    }
}
