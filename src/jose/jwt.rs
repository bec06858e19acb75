//! # JWT Claim Validation
//!
//! The claim-validation pipeline applied to ID Tokens, signed
//! introspection and userinfo responses, and JARM response objects
//! ([RFC 7519], [OpenID Connect Core]). Each step is a plain function
//! over the parsed claim set; validators run them in sequence and stop
//! at the first failure.
//!
//! All timestamp comparisons apply a symmetric 30-second tolerance.
//!
//! [RFC 7519]: https://www.rfc-editor.org/rfc/rfc7519
//! [OpenID Connect Core]: https://openid.net/specs/openid-connect-core-1_0.html

use serde_json::{Map, Value};
use sha2::{Digest, Sha256, Sha384, Sha512};
use subtle::ConstantTimeEq;

use crate::Result;
use crate::core::{CLOCK_SKEW, codec, unix_now};
use crate::error::processing;
use crate::jose::jwa::JwsAlg;
use crate::types::{ExpectedNonce, MaxAge};

/// A parsed JWT claim set.
pub type Claims = Map<String, Value>;

/// Parse a JWS payload as a claim set: JSON whose top level is an
/// object literal.
///
/// # Errors
///
/// Returns an error when the payload is not JSON or its top level is
/// not an object.
pub fn parse_payload(payload: &[u8]) -> Result<Claims> {
    let value: Value = serde_json::from_slice(payload)
        .map_err(|e| processing!("issue parsing JWT payload: {e}"))?;
    match value {
        Value::Object(map) => Ok(map),
        _ => Err(processing!("JWT payload must be a top-level object")),
    }
}

/// Require the named claims to be present.
///
/// # Errors
///
/// Returns an error naming the first missing claim.
pub fn require_claims(claims: &Claims, names: &[&str]) -> Result<()> {
    for name in names {
        if !claims.contains_key(*name) {
            return Err(processing!("JWT is missing required claim {name}"));
        }
    }
    Ok(())
}

/// Check the types and windows of whichever registered claims are
/// present: `exp` (number, not expired), `iat` (number), `nbf` (number,
/// not in the future), `iss` (string), `aud` (string or array of
/// strings).
///
/// # Errors
///
/// Returns an error on the first mistyped or out-of-window claim.
pub fn validate_claim_types(claims: &Claims) -> Result<()> {
    #[allow(clippy::cast_precision_loss)]
    let now = unix_now() as f64;
    let skew = f64::from(u32::try_from(CLOCK_SKEW).unwrap_or(30));

    if let Some(exp) = claims.get("exp") {
        let exp = exp.as_f64().ok_or_else(|| processing!("exp claim must be a number"))?;
        if exp <= now - skew {
            return Err(processing!("JWT has expired"));
        }
    }
    if let Some(iat) = claims.get("iat") {
        iat.as_f64().ok_or_else(|| processing!("iat claim must be a number"))?;
    }
    if let Some(nbf) = claims.get("nbf") {
        let nbf = nbf.as_f64().ok_or_else(|| processing!("nbf claim must be a number"))?;
        if nbf > now + skew {
            return Err(processing!("JWT is not yet valid"));
        }
    }
    if let Some(iss) = claims.get("iss") {
        if !iss.is_string() {
            return Err(processing!("iss claim must be a string"));
        }
    }
    if let Some(aud) = claims.get("aud") {
        let valid = match aud {
            Value::String(_) => true,
            Value::Array(entries) => entries.iter().all(Value::is_string),
            _ => false,
        };
        if !valid {
            return Err(processing!("aud claim must be a string or array of strings"));
        }
    }
    Ok(())
}

/// `iss` must equal the Authorization Server's issuer identifier.
///
/// # Errors
///
/// Returns an error on mismatch or a missing claim.
pub fn validate_issuer(claims: &Claims, issuer: &str) -> Result<()> {
    match claims.get("iss").and_then(Value::as_str) {
        Some(iss) if iss == issuer => Ok(()),
        Some(iss) => Err(processing!("unexpected iss claim value: {iss}")),
        None => Err(processing!("JWT is missing required claim iss")),
    }
}

/// `aud` must contain (array) or equal (string) the client identifier.
/// When `required` is false an absent claim passes, as in signed
/// userinfo responses.
///
/// # Errors
///
/// Returns an error on mismatch, or absence when required.
pub fn validate_audience(claims: &Claims, client_id: &str, required: bool) -> Result<()> {
    match claims.get("aud") {
        Some(Value::String(aud)) if aud == client_id => Ok(()),
        Some(Value::Array(entries)) if entries.iter().any(|e| e.as_str() == Some(client_id)) => {
            Ok(())
        }
        Some(_) => Err(processing!("unexpected aud claim value")),
        None if required => Err(processing!("JWT is missing required claim aud")),
        None => Ok(()),
    }
}

/// When `aud` is an array of more than one entry, `azp` must be present
/// and equal the client identifier.
///
/// # Errors
///
/// Returns an error when a multi-audience token lacks a matching `azp`.
pub fn validate_azp(claims: &Claims, client_id: &str) -> Result<()> {
    if let Some(Value::Array(entries)) = claims.get("aud") {
        if entries.len() != 1 {
            match claims.get("azp").and_then(Value::as_str) {
                Some(azp) if azp == client_id => {}
                Some(_) => return Err(processing!("unexpected azp claim value")),
                None => {
                    return Err(processing!("azp claim is required with multiple audiences"));
                }
            }
        }
    }
    Ok(())
}

/// `auth_time` is required when the client demands it or a `max_age`
/// constraint applies; under `max_age` the authentication must be
/// recent enough.
///
/// # Errors
///
/// Returns an error when `auth_time` is missing, mistyped, or too old.
pub fn validate_auth_time(claims: &Claims, require_auth_time: bool, max_age: &MaxAge)
-> Result<()> {
    let required = require_auth_time || matches!(max_age, MaxAge::Value(_));
    let Some(auth_time) = claims.get("auth_time") else {
        if required {
            return Err(processing!("JWT is missing required claim auth_time"));
        }
        return Ok(());
    };
    let auth_time =
        auth_time.as_f64().ok_or_else(|| processing!("auth_time claim must be a number"))?;

    if let MaxAge::Value(max_age) = max_age {
        #[allow(clippy::cast_precision_loss)]
        let now = unix_now() as f64;
        #[allow(clippy::cast_precision_loss)]
        let window = auth_time + *max_age as f64;
        if window < now - f64::from(u32::try_from(CLOCK_SKEW).unwrap_or(30)) {
            return Err(processing!("too much time has elapsed since end-user authentication"));
        }
    }
    Ok(())
}

/// Three-valued `nonce` check: expected absent, or present and equal to
/// the value the client sent.
///
/// # Errors
///
/// Returns an error on presence/absence violations or mismatch.
pub fn validate_nonce(claims: &Claims, expected: &ExpectedNonce) -> Result<()> {
    match (expected, claims.get("nonce").and_then(Value::as_str)) {
        (ExpectedNonce::ExpectNone, None) => Ok(()),
        (ExpectedNonce::ExpectNone, Some(_)) => {
            Err(processing!("unexpected nonce claim in ID Token"))
        }
        (ExpectedNonce::Value(_), None) => {
            Err(processing!("JWT is missing required claim nonce"))
        }
        (ExpectedNonce::Value(expected), Some(nonce)) => {
            if nonce == expected {
                Ok(())
            } else {
                Err(processing!("unexpected nonce claim value"))
            }
        }
    }
}

/// `at_hash`: base64url of the left half of the access token hashed
/// under the digest the ID Token's `alg` implies, compared in constant
/// time.
///
/// # Errors
///
/// Returns an error when the claim is missing or does not match.
pub fn validate_at_hash(claims: &Claims, access_token: &str, alg: JwsAlg) -> Result<()> {
    let Some(at_hash) = claims.get("at_hash").and_then(Value::as_str) else {
        return Err(processing!("JWT is missing required claim at_hash"));
    };

    let digest = match alg.sha_bits() {
        256 => Sha256::digest(access_token.as_bytes()).to_vec(),
        384 => Sha384::digest(access_token.as_bytes()).to_vec(),
        _ => Sha512::digest(access_token.as_bytes()).to_vec(),
    };
    let expected = codec::b64url(&digest[..digest.len() / 2]);

    if expected.as_bytes().ct_eq(at_hash.as_bytes()).into() {
        Ok(())
    } else {
        Err(processing!("invalid at_hash claim value"))
    }
}

/// Case-insensitive `typ` header check, stripping any `application/`
/// prefix, as required for signed introspection responses and request
/// objects.
///
/// # Errors
///
/// Returns an error when `typ` is absent or differs from `expected`.
pub fn validate_typ(typ: Option<&str>, expected: &str) -> Result<()> {
    let Some(typ) = typ else {
        return Err(processing!("JWT header is missing typ"));
    };
    let normalized = typ.strip_prefix("application/").unwrap_or(typ);
    if normalized.eq_ignore_ascii_case(expected) {
        Ok(())
    } else {
        Err(processing!("unexpected JWT typ header value: {typ}"))
    }
}

/// Resolve the accepted signing algorithm for a response kind: the
/// client's configured expectation wins, else membership in the alg
/// values the server advertises, else `RS256` alone.
///
/// # Errors
///
/// Returns an error when the header's `alg` falls outside the accepted
/// set.
pub fn check_alg(
    header_alg: JwsAlg, client_expected: Option<JwsAlg>, as_supported: Option<&[String]>,
) -> Result<()> {
    if let Some(expected) = client_expected {
        if header_alg == expected {
            return Ok(());
        }
        return Err(processing!("unexpected JWT alg {header_alg}, client expects {expected}"));
    }
    if let Some(supported) = as_supported {
        if supported.iter().any(|s| s == &header_alg.to_string()) {
            return Ok(());
        }
        return Err(processing!("JWT alg {header_alg} is not advertised by the server"));
    }
    // a server that advertises nothing gets RS256 only
    if header_alg == JwsAlg::RS256 {
        Ok(())
    } else {
        Err(processing!("unexpected JWT alg {header_alg}, expected RS256"))
    }
}
