//! # JSON Web Keys
//!
//! The JWK wire model ([RFC 7517]), import of public JWKs into
//! verification and encryption key handles, and projection of local
//! private keys into the minimal public JWK published in DPoP proof
//! headers.
//!
//! Key handles carry their algorithm, so "derive the algorithm from the
//! key" is an accessor rather than trust in caller-supplied metadata.
//!
//! [RFC 7517]: https://www.rfc-editor.org/rfc/rfc7517

use p256::elliptic_curve::sec1::FromEncodedPoint;
use rsa::BigUint;
use rsa::traits::PublicKeyParts;
use serde::{Deserialize, Serialize};

use crate::core::codec;
use crate::error::{invalid, processing, unsupported};
use crate::jose::jwa::{Curve, JwsAlg};
use crate::Result;

/// Minimum RSA modulus width accepted for signing and verification.
const MIN_RSA_BITS: usize = 2048;

/// A JSON Web Key. Only the members this library recognizes are
/// modeled; unknown members are ignored on parse.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
pub struct Jwk {
    /// Key type: `RSA` or `EC`.
    pub kty: String,

    /// Key identifier, matched against JWS header `kid`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kid: Option<String>,

    /// Algorithm the key is intended for.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alg: Option<String>,

    /// Public key use: `sig` or `enc`.
    #[serde(rename = "use", skip_serializing_if = "Option::is_none")]
    pub key_use: Option<String>,

    /// Permitted key operations.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key_ops: Option<Vec<String>>,

    /// RSA modulus, base64url-encoded big-endian.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub n: Option<String>,

    /// RSA public exponent, base64url-encoded big-endian.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub e: Option<String>,

    /// EC curve name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub crv: Option<String>,

    /// EC x coordinate, base64url-encoded.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub x: Option<String>,

    /// EC y coordinate, base64url-encoded.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub y: Option<String>,
}

/// A JSON Web Key Set: the `keys` document served from `jwks_uri`.
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct JwkSet {
    /// The member keys, in server order.
    pub keys: Vec<Jwk>,
}

impl Jwk {
    /// Import this JWK as a verification key for `alg`.
    ///
    /// # Errors
    ///
    /// Returns an error when the key material is malformed, the key
    /// type or curve does not match `alg`, or an RSA modulus is
    /// narrower than 2048 bits.
    pub fn verifying_key(&self, alg: JwsAlg) -> Result<VerifyingKey> {
        let Some(curve) = alg.curve() else {
            return Ok(VerifyingKey::Rsa {
                alg,
                key: self.rsa_public()?,
            });
        };

        let (x, y) = self.ec_coordinates(curve)?;
        match curve {
            Curve::P256 => {
                let point = p256::EncodedPoint::from_affine_coordinates(
                    p256::FieldBytes::from_slice(&x),
                    p256::FieldBytes::from_slice(&y),
                    false,
                );
                p256::ecdsa::VerifyingKey::from_encoded_point(&point).map(VerifyingKey::Es256)
            }
            Curve::P384 => {
                let point = p384::EncodedPoint::from_affine_coordinates(
                    p384::FieldBytes::from_slice(&x),
                    p384::FieldBytes::from_slice(&y),
                    false,
                );
                p384::ecdsa::VerifyingKey::from_encoded_point(&point).map(VerifyingKey::Es384)
            }
            Curve::P521 => {
                let point = p521::EncodedPoint::from_affine_coordinates(
                    p521::FieldBytes::from_slice(&x),
                    p521::FieldBytes::from_slice(&y),
                    false,
                );
                p521::ecdsa::VerifyingKey::from_encoded_point(&point).map(VerifyingKey::Es512)
            }
        }
        .map_err(|e| processing!("invalid EC point: {e}"))
    }

    /// Import this JWK as a recipient key for JWE encryption.
    ///
    /// # Errors
    ///
    /// Returns an error when the key material is malformed or the key
    /// type is neither RSA nor a supported EC curve.
    pub fn encryption_key(&self) -> Result<EncryptionKey> {
        match self.kty.as_str() {
            "RSA" => Ok(EncryptionKey::Rsa(self.rsa_public()?)),
            "EC" => {
                let curve: Curve =
                    self.crv.as_deref().ok_or_else(|| processing!("EC JWK without crv"))?.parse()?;
                let (x, y) = self.ec_coordinates(curve)?;
                match curve {
                    Curve::P256 => {
                        let point = p256::EncodedPoint::from_affine_coordinates(
                            p256::FieldBytes::from_slice(&x),
                            p256::FieldBytes::from_slice(&y),
                            false,
                        );
                        Option::from(p256::PublicKey::from_encoded_point(&point))
                            .map(EncryptionKey::P256)
                    }
                    Curve::P384 => {
                        let point = p384::EncodedPoint::from_affine_coordinates(
                            p384::FieldBytes::from_slice(&x),
                            p384::FieldBytes::from_slice(&y),
                            false,
                        );
                        Option::from(p384::PublicKey::from_encoded_point(&point))
                            .map(EncryptionKey::P384)
                    }
                    Curve::P521 => {
                        let point = p521::EncodedPoint::from_affine_coordinates(
                            p521::FieldBytes::from_slice(&x),
                            p521::FieldBytes::from_slice(&y),
                            false,
                        );
                        Option::from(p521::PublicKey::from_encoded_point(&point))
                            .map(EncryptionKey::P521)
                    }
                }
                .ok_or_else(|| processing!("invalid EC point"))
            }
            kty => Err(unsupported!("unsupported key type: {kty}")),
        }
    }

    fn rsa_public(&self) -> Result<rsa::RsaPublicKey> {
        if self.kty != "RSA" {
            return Err(processing!("expected an RSA key, found {}", self.kty));
        }
        let n = self.n.as_deref().ok_or_else(|| processing!("RSA JWK without n"))?;
        let e = self.e.as_deref().ok_or_else(|| processing!("RSA JWK without e"))?;
        let key = rsa::RsaPublicKey::new(
            BigUint::from_bytes_be(&codec::b64url_decode(n)?),
            BigUint::from_bytes_be(&codec::b64url_decode(e)?),
        )
        .map_err(|e| processing!("invalid RSA key: {e}"))?;
        check_modulus(&key)?;
        Ok(key)
    }

    fn ec_coordinates(&self, curve: Curve) -> Result<(Vec<u8>, Vec<u8>)> {
        if self.kty != "EC" {
            return Err(processing!("expected an EC key, found {}", self.kty));
        }
        let declared: Curve =
            self.crv.as_deref().ok_or_else(|| processing!("EC JWK without crv"))?.parse()?;
        if declared != curve {
            return Err(processing!("JWK curve {declared} does not match expected {curve}"));
        }
        Ok((
            decode_coordinate(self.x.as_deref(), "x", curve.field_len())?,
            decode_coordinate(self.y.as_deref(), "y", curve.field_len())?,
        ))
    }
}

fn decode_coordinate(value: Option<&str>, name: &str, len: usize) -> Result<Vec<u8>> {
    let decoded =
        codec::b64url_decode(value.ok_or_else(|| processing!("EC JWK without {name}"))?)?;
    if decoded.len() != len {
        return Err(processing!("EC coordinate {name} must be {len} bytes"));
    }
    Ok(decoded)
}

fn check_modulus(key: &impl PublicKeyParts) -> Result<()> {
    if key.size() * 8 < MIN_RSA_BITS {
        return Err(unsupported!("RSA modulus must be at least {MIN_RSA_BITS} bits"));
    }
    Ok(())
}

/// An asymmetric signing key handle: the private half of the client's
/// `private_key_jwt` or DPoP key pair.
#[derive(Clone)]
pub enum SigningKey {
    /// ECDSA over P-256 (ES256).
    Es256(p256::ecdsa::SigningKey),
    /// ECDSA over P-384 (ES384).
    Es384(p384::ecdsa::SigningKey),
    /// ECDSA over P-521 (ES512).
    Es512(p521::ecdsa::SigningKey),
    /// RSA, with the PSS or PKCS#1 v1.5 variant the key is used for.
    Rsa {
        /// One of the `PS*` or `RS*` algorithms.
        alg: JwsAlg,
        /// The private key. Boxed: RSA keys are an order of magnitude
        /// larger than the enum's other variants.
        key: Box<rsa::RsaPrivateKey>,
    },
}

impl std::fmt::Debug for SigningKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.alg() {
            Ok(alg) => write!(f, "SigningKey({alg})"),
            Err(_) => write!(f, "SigningKey(invalid)"),
        }
    }
}

impl SigningKey {
    /// The JWS algorithm implied by this key.
    ///
    /// # Errors
    ///
    /// Returns an error for an RSA key annotated with a non-RSA
    /// algorithm or with a modulus narrower than 2048 bits.
    pub fn alg(&self) -> Result<JwsAlg> {
        match self {
            Self::Es256(_) => Ok(JwsAlg::ES256),
            Self::Es384(_) => Ok(JwsAlg::ES384),
            Self::Es512(_) => Ok(JwsAlg::ES512),
            Self::Rsa { alg, key } => {
                if !alg.is_rsa() {
                    return Err(unsupported!("algorithm {alg} does not apply to an RSA key"));
                }
                check_modulus(&**key)?;
                Ok(*alg)
            }
        }
    }

    /// Project the public half as a minimal JWK: `kty` plus the curve
    /// or modulus members, everything else dropped. This is the `jwk`
    /// published in DPoP proof headers.
    ///
    /// # Errors
    ///
    /// Returns an error when the key fails [`Self::alg`] validation.
    pub fn public_jwk(&self) -> Result<Jwk> {
        self.alg()?;
        let jwk = match self {
            Self::Es256(key) => {
                let point = key.verifying_key().to_encoded_point(false);
                ec_jwk(Curve::P256, point.x().map(|c| c.as_slice()), point.y().map(|c|
                    c.as_slice()))
            }
            Self::Es384(key) => {
                let point = key.verifying_key().to_encoded_point(false);
                ec_jwk(Curve::P384, point.x().map(|c| c.as_slice()), point.y().map(|c|
                    c.as_slice()))
            }
            Self::Es512(key) => {
                let point = p521::ecdsa::VerifyingKey::from(key).to_encoded_point(false);
                ec_jwk(Curve::P521, point.x().map(|c| c.as_slice()), point.y().map(|c|
                    c.as_slice()))
            }
            Self::Rsa { key, .. } => {
                let public = key.to_public_key();
                Jwk {
                    kty: "RSA".to_string(),
                    n: Some(codec::b64url(public.n().to_bytes_be())),
                    e: Some(codec::b64url(public.e().to_bytes_be())),
                    ..Jwk::default()
                }
            }
        };
        Ok(jwk)
    }
}

fn ec_jwk(curve: Curve, x: Option<&[u8]>, y: Option<&[u8]>) -> Jwk {
    Jwk {
        kty: "EC".to_string(),
        crv: Some(curve.to_string()),
        x: x.map(codec::b64url),
        y: y.map(codec::b64url),
        ..Jwk::default()
    }
}

/// A private key paired with the optional `kid` to advertise in JWS
/// headers built with it.
#[derive(Clone, Debug)]
pub struct PrivateKey {
    /// The signing key handle.
    pub key: SigningKey,

    /// Key identifier; when present it must be non-empty.
    pub kid: Option<String>,
}

impl PrivateKey {
    /// Pair a signing key with an optional key identifier.
    ///
    /// # Errors
    ///
    /// Returns an error when `kid` is present but empty, or the key
    /// fails algorithm validation.
    pub fn new(key: SigningKey, kid: Option<String>) -> Result<Self> {
        if kid.as_deref().is_some_and(str::is_empty) {
            return Err(invalid!("kid must be non-empty when provided"));
        }
        key.alg()?;
        Ok(Self { key, kid })
    }
}

/// A verification key handle imported from a JWKS entry.
#[derive(Clone)]
pub enum VerifyingKey {
    /// ECDSA over P-256 (ES256).
    Es256(p256::ecdsa::VerifyingKey),
    /// ECDSA over P-384 (ES384).
    Es384(p384::ecdsa::VerifyingKey),
    /// ECDSA over P-521 (ES512).
    Es512(p521::ecdsa::VerifyingKey),
    /// RSA public key with its PSS or PKCS#1 v1.5 algorithm.
    Rsa {
        /// One of the `PS*` or `RS*` algorithms.
        alg: JwsAlg,
        /// The public key.
        key: rsa::RsaPublicKey,
    },
}

impl std::fmt::Debug for VerifyingKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "VerifyingKey({})", self.alg())
    }
}

impl VerifyingKey {
    /// The JWS algorithm this key verifies.
    #[must_use]
    pub const fn alg(&self) -> JwsAlg {
        match self {
            Self::Es256(_) => JwsAlg::ES256,
            Self::Es384(_) => JwsAlg::ES384,
            Self::Es512(_) => JwsAlg::ES512,
            Self::Rsa { alg, .. } => *alg,
        }
    }
}

/// A recipient public key for JWE encryption.
#[derive(Clone, Debug)]
pub enum EncryptionKey {
    /// P-256 public key for ECDH-ES.
    P256(p256::PublicKey),
    /// P-384 public key for ECDH-ES.
    P384(p384::PublicKey),
    /// P-521 public key for ECDH-ES.
    P521(p521::PublicKey),
    /// RSA public key for RSA-OAEP variants.
    Rsa(rsa::RsaPublicKey),
}
