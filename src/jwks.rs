//! # JWKS Fetch, Selection, and Cache
//!
//! Retrieval of the Authorization Server's JSON Web Key Set, selection
//! of the verification key a JWS header calls for, and a bounded cache
//! keyed by `jwks_uri`. Cached sets go stale after five hours; a
//! selection miss against a stale set evicts and refetches once before
//! failing.

use std::sync::{LazyLock, Mutex};

use bytes::Bytes;
use http::StatusCode;

use crate::core::cache::Lru;
use crate::core::unix_now;
use crate::error::{invalid, processing};
use crate::jose::jwk::{Jwk, JwkSet, VerifyingKey};
use crate::jose::jws::ProtectedHeader;
use crate::provider::HttpClient;
use crate::types::AuthorizationServer;
use crate::{Result, endpoint};

/// Key sets are cached for the most recently used issuers.
const CACHE_SIZE: usize = 20;

/// Age beyond which a cached set is considered stale.
const MAX_AGE: i64 = 5 * 60 * 60;

struct CacheEntry {
    jwks: JwkSet,
    iat: i64,
}

impl CacheEntry {
    fn is_stale(&self) -> bool {
        unix_now() >= self.iat + MAX_AGE
    }
}

static CACHE: LazyLock<Mutex<Lru<String, CacheEntry>>> =
    LazyLock::new(|| Mutex::new(Lru::new(CACHE_SIZE)));

/// Build the JWKS request for a server.
///
/// # Errors
///
/// Returns an error when the server publishes no `jwks_uri`.
pub fn request(server: &AuthorizationServer) -> Result<http::Request<Bytes>> {
    let jwks_uri =
        server.jwks_uri.as_deref().ok_or_else(|| invalid!("server metadata has no jwks_uri"))?;
    endpoint::get(jwks_uri, "application/json, application/jwk-set+json")
}

/// Validate a JWKS response: a `200` carrying a JSON object whose
/// `keys` member is an array of objects.
///
/// # Errors
///
/// Returns an error for any other status or body shape.
pub fn process(response: &http::Response<Bytes>) -> Result<JwkSet> {
    endpoint::check_status(response, StatusCode::OK)?;
    let value: serde_json::Value = endpoint::json_body(response)?;
    let Some(keys) = value.get("keys").and_then(serde_json::Value::as_array) else {
        return Err(processing!("JWKS response must be an object with a keys array"));
    };
    if !keys.iter().all(serde_json::Value::is_object) {
        return Err(processing!("JWKS keys must all be objects"));
    }
    serde_json::from_value(value).map_err(|e| processing!("issue parsing JWKS: {e}"))
}

/// Resolve the verification key a JWS header selects from the server's
/// key set, fetching or refreshing the cached set as needed.
///
/// # Errors
///
/// Returns an error when no key or more than one key matches, or the
/// fetch fails.
pub async fn verification_key(
    http: &impl HttpClient, server: &AuthorizationServer, header: &ProtectedHeader,
) -> Result<VerifyingKey> {
    let jwks_uri =
        server.jwks_uri.as_deref().ok_or_else(|| invalid!("server metadata has no jwks_uri"))?;

    let (jwks, stale) = lookup(http, server, jwks_uri).await?;
    let candidates = select(&jwks, header);

    match candidates.len() {
        1 => candidates[0].verifying_key(header.alg),
        0 if stale => {
            // the signing key may have rotated since the set was cached
            tracing::debug!("no key matched a stale JWKS for {jwks_uri}, refetching");
            CACHE.lock().expect("lock poisoned").remove(&jwks_uri.to_string());
            let (jwks, _) = lookup(http, server, jwks_uri).await?;
            let candidates = select(&jwks, header);
            match candidates.len() {
                1 => candidates[0].verifying_key(header.alg),
                0 => Err(processing!("no applicable keys in the server JWKS")),
                _ => Err(processing!("multiple keys match, the JWS must include a kid")),
            }
        }
        0 => Err(processing!("no applicable keys in the server JWKS")),
        _ => Err(processing!("multiple keys match, the JWS must include a kid")),
    }
}

async fn lookup(
    http: &impl HttpClient, server: &AuthorizationServer, jwks_uri: &str,
) -> Result<(JwkSet, bool)> {
    if let Some(entry) = CACHE.lock().expect("lock poisoned").get(&jwks_uri.to_string()) {
        return Ok((entry.jwks.clone(), entry.is_stale()));
    }

    let response = endpoint::fetch(http, request(server)?).await?;
    let jwks = process(&response)?;
    CACHE.lock().expect("lock poisoned").insert(jwks_uri.to_string(), CacheEntry {
        jwks: jwks.clone(),
        iat: unix_now(),
    });
    Ok((jwks, false))
}

/// Narrow the key set to the candidates compatible with a JWS header:
/// key type, `kid`, `alg`, `use`, `key_ops`, and EC curve must all be
/// consistent with the header's algorithm.
fn select<'a>(jwks: &'a JwkSet, header: &ProtectedHeader) -> Vec<&'a Jwk> {
    let alg = header.alg;
    let kty = if alg.is_rsa() { "RSA" } else { "EC" };

    jwks.keys
        .iter()
        .filter(|jwk| jwk.kty == kty)
        .filter(|jwk| header.kid.is_none() || jwk.kid == header.kid)
        .filter(|jwk| jwk.alg.as_ref().is_none_or(|a| *a == alg.to_string()))
        .filter(|jwk| jwk.key_use.as_deref().is_none_or(|u| u == "sig"))
        .filter(|jwk| {
            jwk.key_ops.as_ref().is_none_or(|ops| ops.iter().any(|op| op == "verify"))
        })
        .filter(|jwk| {
            alg.curve()
                .is_none_or(|curve| jwk.crv.as_deref() == Some(curve.to_string().as_str()))
        })
        .collect()
}
