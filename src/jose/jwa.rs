//! # JSON Web Algorithms
//!
//! The closed algorithm sets this library supports ([RFC 7518]) and the
//! mappings between signing algorithms and elliptic curves. Anything
//! outside these sets is refused, never negotiated around.
//!
//! [RFC 7518]: https://www.rfc-editor.org/rfc/rfc7518

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::Error;
use crate::error::unsupported;

/// Asymmetric JWS signing algorithms accepted for issued and validated
/// tokens.
#[derive(Clone, Copy, Debug, Deserialize, Serialize, PartialEq, Eq)]
pub enum JwsAlg {
    /// RSASSA-PSS using SHA-256 and MGF1 with SHA-256.
    PS256,
    /// RSASSA-PSS using SHA-384 and MGF1 with SHA-384.
    PS384,
    /// RSASSA-PSS using SHA-512 and MGF1 with SHA-512.
    PS512,
    /// ECDSA using P-256 and SHA-256.
    ES256,
    /// ECDSA using P-384 and SHA-384.
    ES384,
    /// ECDSA using P-521 and SHA-512.
    ES512,
    /// RSASSA-PKCS1-v1_5 using SHA-256.
    RS256,
    /// RSASSA-PKCS1-v1_5 using SHA-384.
    RS384,
    /// RSASSA-PKCS1-v1_5 using SHA-512.
    RS512,
}

/// All supported JWS algorithms, in preference order.
pub const SUPPORTED_JWS_ALGS: [JwsAlg; 9] = [
    JwsAlg::PS256,
    JwsAlg::PS384,
    JwsAlg::PS512,
    JwsAlg::ES256,
    JwsAlg::ES384,
    JwsAlg::ES512,
    JwsAlg::RS256,
    JwsAlg::RS384,
    JwsAlg::RS512,
];

impl JwsAlg {
    /// The SHA-2 digest width implied by the algorithm suffix.
    #[must_use]
    pub const fn sha_bits(self) -> u32 {
        match self {
            Self::PS256 | Self::ES256 | Self::RS256 => 256,
            Self::PS384 | Self::ES384 | Self::RS384 => 384,
            Self::PS512 | Self::ES512 | Self::RS512 => 512,
        }
    }

    /// The curve an ECDSA algorithm is defined over, if any.
    #[must_use]
    pub const fn curve(self) -> Option<Curve> {
        match self {
            Self::ES256 => Some(Curve::P256),
            Self::ES384 => Some(Curve::P384),
            Self::ES512 => Some(Curve::P521),
            _ => None,
        }
    }

    /// Whether the algorithm is an RSA (PKCS#1 v1.5 or PSS) variant.
    #[must_use]
    pub const fn is_rsa(self) -> bool {
        matches!(
            self,
            Self::PS256 | Self::PS384 | Self::PS512 | Self::RS256 | Self::RS384 | Self::RS512
        )
    }
}

impl fmt::Display for JwsAlg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{self:?}")
    }
}

impl FromStr for JwsAlg {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PS256" => Ok(Self::PS256),
            "PS384" => Ok(Self::PS384),
            "PS512" => Ok(Self::PS512),
            "ES256" => Ok(Self::ES256),
            "ES384" => Ok(Self::ES384),
            "ES512" => Ok(Self::ES512),
            "RS256" => Ok(Self::RS256),
            "RS384" => Ok(Self::RS384),
            "RS512" => Ok(Self::RS512),
            _ => Err(unsupported!("unsupported JWS algorithm: {s}")),
        }
    }
}

/// HMAC algorithms, used only when issuing `client_secret_jwt` client
/// assertions.
#[derive(Clone, Copy, Debug, Deserialize, Serialize, PartialEq, Eq)]
pub enum HmacAlg {
    /// HMAC using SHA-256.
    HS256,
    /// HMAC using SHA-384.
    HS384,
    /// HMAC using SHA-512.
    HS512,
}

impl fmt::Display for HmacAlg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{self:?}")
    }
}

impl FromStr for HmacAlg {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "HS256" => Ok(Self::HS256),
            "HS384" => Ok(Self::HS384),
            "HS512" => Ok(Self::HS512),
            _ => Err(unsupported!("unsupported HMAC algorithm: {s}")),
        }
    }
}

/// JWE key-management algorithms supported for request-object
/// encryption.
#[derive(Clone, Copy, Debug, Deserialize, Serialize, PartialEq, Eq)]
pub enum JweAlg {
    /// ECDH-ES in direct key agreement mode.
    #[serde(rename = "ECDH-ES")]
    EcdhEs,
    /// RSAES-OAEP with SHA-1.
    #[serde(rename = "RSA-OAEP")]
    RsaOaep,
    /// RSAES-OAEP with SHA-256.
    #[serde(rename = "RSA-OAEP-256")]
    RsaOaep256,
    /// RSAES-OAEP with SHA-384.
    #[serde(rename = "RSA-OAEP-384")]
    RsaOaep384,
    /// RSAES-OAEP with SHA-512.
    #[serde(rename = "RSA-OAEP-512")]
    RsaOaep512,
}

impl fmt::Display for JweAlg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EcdhEs => write!(f, "ECDH-ES"),
            Self::RsaOaep => write!(f, "RSA-OAEP"),
            Self::RsaOaep256 => write!(f, "RSA-OAEP-256"),
            Self::RsaOaep384 => write!(f, "RSA-OAEP-384"),
            Self::RsaOaep512 => write!(f, "RSA-OAEP-512"),
        }
    }
}

impl FromStr for JweAlg {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ECDH-ES" => Ok(Self::EcdhEs),
            "RSA-OAEP" => Ok(Self::RsaOaep),
            "RSA-OAEP-256" => Ok(Self::RsaOaep256),
            "RSA-OAEP-384" => Ok(Self::RsaOaep384),
            "RSA-OAEP-512" => Ok(Self::RsaOaep512),
            _ => Err(unsupported!("unsupported JWE algorithm: {s}")),
        }
    }
}

/// JWE content-encryption algorithms.
#[derive(Clone, Copy, Debug, Deserialize, Serialize, PartialEq, Eq)]
pub enum JweEnc {
    /// AES GCM with a 128-bit key.
    A128GCM,
    /// AES GCM with a 192-bit key.
    A192GCM,
    /// AES GCM with a 256-bit key.
    A256GCM,
    /// AES-128-CBC with HMAC-SHA-256.
    #[serde(rename = "A128CBC-HS256")]
    A128CbcHs256,
    /// AES-192-CBC with HMAC-SHA-384.
    #[serde(rename = "A192CBC-HS384")]
    A192CbcHs384,
    /// AES-256-CBC with HMAC-SHA-512.
    #[serde(rename = "A256CBC-HS512")]
    A256CbcHs512,
}

impl JweEnc {
    /// Content-encryption key length in bytes. CBC-HMAC composites use
    /// a double-width key: one half for HMAC, one for CBC.
    #[must_use]
    pub const fn key_len(self) -> usize {
        match self {
            Self::A128GCM => 16,
            Self::A192GCM => 24,
            Self::A256GCM | Self::A128CbcHs256 => 32,
            Self::A192CbcHs384 => 48,
            Self::A256CbcHs512 => 64,
        }
    }

    /// Initialization vector length in bytes: 96 bits for GCM, 128 for
    /// CBC.
    #[must_use]
    pub const fn iv_len(self) -> usize {
        match self {
            Self::A128GCM | Self::A192GCM | Self::A256GCM => 12,
            _ => 16,
        }
    }

    /// Whether this is a GCM variant.
    #[must_use]
    pub const fn is_gcm(self) -> bool {
        matches!(self, Self::A128GCM | Self::A192GCM | Self::A256GCM)
    }
}

impl fmt::Display for JweEnc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::A128GCM => write!(f, "A128GCM"),
            Self::A192GCM => write!(f, "A192GCM"),
            Self::A256GCM => write!(f, "A256GCM"),
            Self::A128CbcHs256 => write!(f, "A128CBC-HS256"),
            Self::A192CbcHs384 => write!(f, "A192CBC-HS384"),
            Self::A256CbcHs512 => write!(f, "A256CBC-HS512"),
        }
    }
}

/// Elliptic curves supported for ECDSA and ECDH-ES.
#[derive(Clone, Copy, Debug, Deserialize, Serialize, PartialEq, Eq)]
pub enum Curve {
    /// NIST P-256 (secp256r1).
    #[serde(rename = "P-256")]
    P256,
    /// NIST P-384 (secp384r1).
    #[serde(rename = "P-384")]
    P384,
    /// NIST P-521 (secp521r1).
    #[serde(rename = "P-521")]
    P521,
}

impl Curve {
    /// The JWS algorithm defined over this curve.
    #[must_use]
    pub const fn jws_alg(self) -> JwsAlg {
        match self {
            Self::P256 => JwsAlg::ES256,
            Self::P384 => JwsAlg::ES384,
            Self::P521 => JwsAlg::ES512,
        }
    }

    /// Field element width in bytes.
    #[must_use]
    pub const fn field_len(self) -> usize {
        match self {
            Self::P256 => 32,
            Self::P384 => 48,
            Self::P521 => 66,
        }
    }
}

impl fmt::Display for Curve {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::P256 => write!(f, "P-256"),
            Self::P384 => write!(f, "P-384"),
            Self::P521 => write!(f, "P-521"),
        }
    }
}

impl FromStr for Curve {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "P-256" => Ok(Self::P256),
            "P-384" => Ok(Self::P384),
            "P-521" => Ok(Self::P521),
            _ => Err(unsupported!("unsupported curve: {s}")),
        }
    }
}
