//! # JSON Web Signatures
//!
//! Compact-serialization JWS signing and verification ([RFC 7515]).
//! The signing input is `base64url(header).base64url(payload)`; the
//! signature algorithm is dictated by the key handle, never by
//! unauthenticated header metadata alone.
//!
//! Tokens carrying a `crit` header parameter are rejected outright: no
//! extension is processed. Five-segment (JWE) tokens are refused where
//! a JWS is expected.
//!
//! [RFC 7515]: https://www.rfc-editor.org/rfc/rfc7515

use rand_core::OsRng;
use rsa::sha2::{Sha256, Sha384, Sha512};
use rsa::signature::{RandomizedSigner, SignatureEncoding, Signer, Verifier};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::Result;
use crate::core::codec;
use crate::error::{processing, unsupported};
use crate::jose::jwa::JwsAlg;
use crate::jose::jwk::{Jwk, SigningKey, VerifyingKey};

/// The protected header of a compact JWS.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
pub struct ProtectedHeader {
    /// Signing algorithm.
    pub alg: JwsAlg,

    /// Media type of the complete JWS, e.g. `dpop+jwt`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub typ: Option<String>,

    /// Identifier of the signing key within the issuer's JWKS.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kid: Option<String>,

    /// The public signing key itself, as embedded in DPoP proofs.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub jwk: Option<Jwk>,

    /// Critical extension parameters. Always rejected on decode.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub crit: Option<Vec<String>>,
}

impl ProtectedHeader {
    /// A header carrying only `alg`.
    #[must_use]
    pub const fn new(alg: JwsAlg) -> Self {
        Self {
            alg,
            typ: None,
            kid: None,
            jwk: None,
            crit: None,
        }
    }
}

/// A decoded, not-yet-verified compact JWS.
#[derive(Clone, Debug)]
pub struct CompactJws {
    /// The parsed protected header.
    pub header: ProtectedHeader,

    /// The raw payload bytes.
    pub payload: Vec<u8>,

    /// `base64url(header).base64url(payload)`, the bytes the signature
    /// covers.
    pub signing_input: String,

    /// The raw signature bytes.
    pub signature: Vec<u8>,
}

/// Sign `payload` under `header` with `key`, producing the compact
/// serialization.
///
/// # Errors
///
/// Returns an error when the header's `alg` does not match the key, or
/// the key fails validation.
pub fn sign(header: &ProtectedHeader, payload: &[u8], key: &SigningKey) -> Result<String> {
    let alg = key.alg()?;
    if alg != header.alg {
        return Err(unsupported!("header alg {} does not match key alg {alg}", header.alg));
    }

    let header_json =
        serde_json::to_vec(header).map_err(|e| processing!("issue serializing header: {e}"))?;
    let signing_input = format!("{}.{}", codec::b64url(header_json), codec::b64url(payload));
    let signature = sign_bytes(key, signing_input.as_bytes())?;
    Ok(format!("{signing_input}.{}", codec::b64url(signature)))
}

fn sign_bytes(key: &SigningKey, msg: &[u8]) -> Result<Vec<u8>> {
    let signature = match key {
        SigningKey::Es256(key) => {
            let signature: p256::ecdsa::Signature = key.sign(msg);
            signature.to_vec()
        }
        SigningKey::Es384(key) => {
            let signature: p384::ecdsa::Signature = key.sign(msg);
            signature.to_vec()
        }
        SigningKey::Es512(key) => {
            let signature: p521::ecdsa::Signature = key.sign(msg);
            signature.to_vec()
        }
        SigningKey::Rsa { alg, key } => match alg {
            JwsAlg::RS256 => {
                rsa::pkcs1v15::SigningKey::<Sha256>::new((**key).clone()).sign(msg).to_vec()
            }
            JwsAlg::RS384 => {
                rsa::pkcs1v15::SigningKey::<Sha384>::new((**key).clone()).sign(msg).to_vec()
            }
            JwsAlg::RS512 => {
                rsa::pkcs1v15::SigningKey::<Sha512>::new((**key).clone()).sign(msg).to_vec()
            }
            JwsAlg::PS256 => rsa::pss::SigningKey::<Sha256>::new((**key).clone())
                .sign_with_rng(&mut OsRng, msg)
                .to_vec(),
            JwsAlg::PS384 => rsa::pss::SigningKey::<Sha384>::new((**key).clone())
                .sign_with_rng(&mut OsRng, msg)
                .to_vec(),
            JwsAlg::PS512 => rsa::pss::SigningKey::<Sha512>::new((**key).clone())
                .sign_with_rng(&mut OsRng, msg)
                .to_vec(),
            _ => return Err(unsupported!("algorithm {alg} does not apply to an RSA key")),
        },
    };
    Ok(signature)
}

/// Split and parse a compact JWS without verifying it.
///
/// # Errors
///
/// Returns an error for a five-segment (JWE) token, a segment count
/// other than three, an unsupported or malformed header, or a header
/// carrying `crit`.
pub fn decode(token: &str) -> Result<CompactJws> {
    let segments: Vec<&str> = token.split('.').collect();
    if segments.len() == 5 {
        return Err(unsupported!("encrypted JWTs cannot be used here"));
    }
    if segments.len() != 3 {
        return Err(processing!("a compact JWS must have three segments"));
    }

    let header_bytes = codec::b64url_decode(segments[0])?;
    let header_value: Value = serde_json::from_slice(&header_bytes)
        .map_err(|e| processing!("issue parsing JWS header: {e}"))?;

    // distinguish "not an algorithm we do" from a malformed header
    let Some(alg) = header_value.get("alg").and_then(Value::as_str) else {
        return Err(processing!("JWS header has no alg"));
    };
    alg.parse::<JwsAlg>()?;

    let header: ProtectedHeader = serde_json::from_value(header_value)
        .map_err(|e| processing!("issue parsing JWS header: {e}"))?;
    if header.crit.is_some() {
        return Err(unsupported!("crit header parameter is not supported"));
    }

    Ok(CompactJws {
        header,
        payload: codec::b64url_decode(segments[1])?,
        signing_input: format!("{}.{}", segments[0], segments[1]),
        signature: codec::b64url_decode(segments[2])?,
    })
}

/// Verify a decoded JWS against a verification key.
///
/// # Errors
///
/// Returns an error when the key's algorithm differs from the header's
/// or the signature does not verify.
pub fn verify(jws: &CompactJws, key: &VerifyingKey) -> Result<()> {
    if key.alg() != jws.header.alg {
        return Err(processing!(
            "key algorithm {} does not match header alg {}",
            key.alg(),
            jws.header.alg
        ));
    }

    let msg = jws.signing_input.as_bytes();
    let sig = jws.signature.as_slice();
    let verified = match key {
        VerifyingKey::Es256(key) => p256::ecdsa::Signature::from_slice(sig)
            .and_then(|signature| key.verify(msg, &signature)),
        VerifyingKey::Es384(key) => p384::ecdsa::Signature::from_slice(sig)
            .and_then(|signature| key.verify(msg, &signature)),
        VerifyingKey::Es512(key) => p521::ecdsa::Signature::from_slice(sig)
            .and_then(|signature| key.verify(msg, &signature)),
        VerifyingKey::Rsa { alg, key } => match alg {
            JwsAlg::RS256 => rsa::pkcs1v15::Signature::try_from(sig).and_then(|signature| {
                rsa::pkcs1v15::VerifyingKey::<Sha256>::new(key.clone()).verify(msg, &signature)
            }),
            JwsAlg::RS384 => rsa::pkcs1v15::Signature::try_from(sig).and_then(|signature| {
                rsa::pkcs1v15::VerifyingKey::<Sha384>::new(key.clone()).verify(msg, &signature)
            }),
            JwsAlg::RS512 => rsa::pkcs1v15::Signature::try_from(sig).and_then(|signature| {
                rsa::pkcs1v15::VerifyingKey::<Sha512>::new(key.clone()).verify(msg, &signature)
            }),
            JwsAlg::PS256 => rsa::pss::Signature::try_from(sig).and_then(|signature| {
                rsa::pss::VerifyingKey::<Sha256>::new(key.clone()).verify(msg, &signature)
            }),
            JwsAlg::PS384 => rsa::pss::Signature::try_from(sig).and_then(|signature| {
                rsa::pss::VerifyingKey::<Sha384>::new(key.clone()).verify(msg, &signature)
            }),
            JwsAlg::PS512 => rsa::pss::Signature::try_from(sig).and_then(|signature| {
                rsa::pss::VerifyingKey::<Sha512>::new(key.clone()).verify(msg, &signature)
            }),
            _ => return Err(unsupported!("algorithm {alg} does not apply to an RSA key")),
        },
    };

    verified.map_err(|_| processing!("JWS signature verification failed"))
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::jose::jwa::Curve;

    // Token and key from RFC 7515 Appendix A.3 (ES256).
    const RFC7515_A3: &str = "eyJhbGciOiJFUzI1NiJ9.eyJpc3MiOiJqb2UiLA0KICJleHAiOjEzMDA4MTkzOD\
        AsDQogImh0dHA6Ly9leGFtcGxlLmNvbS9pc19yb290Ijp0cnVlfQ.DtEhU3ljbEg8L38VWAfUAqOyKAM6-Xx-F4G\
        awxaepmXFCgfTjDxw5djxLa8ISlSApmWQxfKTUJqPP3-Kg6NU1Q";

    fn rfc7515_key() -> VerifyingKey {
        Jwk {
            kty: "EC".to_string(),
            crv: Some("P-256".to_string()),
            x: Some("f83OJ3D2xF1Bg8vub9tLe1gHMzV76e8Tus9uPHvRVEU".to_string()),
            y: Some("x_FEzRu9m36HLN_tue659LNpXW6pCyStikYjKIWI5a0".to_string()),
            ..Jwk::default()
        }
        .verifying_key(JwsAlg::ES256)
        .expect("should import")
    }

    #[test]
    fn verify_rfc7515_vector() {
        let jws = decode(RFC7515_A3).expect("should decode");
        assert_eq!(jws.header.alg, JwsAlg::ES256);
        verify(&jws, &rfc7515_key()).expect("should verify");
    }

    #[test]
    fn tampered_payload_fails() {
        let mut jws = decode(RFC7515_A3).expect("should decode");
        jws.signing_input = jws.signing_input.replace('0', "1");
        assert!(verify(&jws, &rfc7515_key()).is_err());
    }

    #[test]
    fn sign_verify_round_trip() {
        for curve in [Curve::P256, Curve::P384, Curve::P521] {
            let key = match curve {
                Curve::P256 => SigningKey::Es256(p256::ecdsa::SigningKey::random(&mut OsRng)),
                Curve::P384 => SigningKey::Es384(p384::ecdsa::SigningKey::random(&mut OsRng)),
                Curve::P521 => SigningKey::Es512(p521::ecdsa::SigningKey::random(&mut OsRng)),
            };
            let alg = curve.jws_alg();
            let token =
                sign(&ProtectedHeader::new(alg), br#"{"sub":"u"}"#, &key).expect("should sign");
            let jws = decode(&token).expect("should decode");
            assert_eq!(jws.header, ProtectedHeader::new(alg));
            let verifier = key.public_jwk().expect("should project").verifying_key(alg)
                .expect("should import");
            verify(&jws, &verifier).expect("should verify");
        }
    }

    #[test]
    fn jwe_shaped_token_rejected() {
        assert!(decode("a.b.c.d.e").is_err());
        assert!(decode("a.b").is_err());
    }

    #[test]
    fn crit_rejected() {
        let header = codec::b64url(br#"{"alg":"ES256","crit":["exp"]}"#);
        let token = format!("{header}.e30.AA");
        assert!(decode(&token).is_err());
    }
}
