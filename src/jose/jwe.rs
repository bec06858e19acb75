//! # JSON Web Encryption
//!
//! Compact-serialization JWE issuance ([RFC 7516]), used solely to
//! produce signed-and-encrypted request objects. Decryption is out of
//! scope: the relying party never receives JWEs it must open.
//!
//! Key management is ECDH-ES in direct key-agreement mode (CEK derived
//! with the Concat KDF of [NIST SP 800-56A] §5.8.1) or RSA-OAEP CEK
//! wrapping. Content encryption is AES-GCM with a 128-bit tag or the
//! AES-CBC HMAC-SHA-2 composites of [RFC 7518] §5.2.
//!
//! [RFC 7516]: https://www.rfc-editor.org/rfc/rfc7516
//! [RFC 7518]: https://www.rfc-editor.org/rfc/rfc7518
//! [NIST SP 800-56A]: https://csrc.nist.gov/pubs/sp/800/56/a/r3/final

use aes::cipher::block_padding::Pkcs7;
use aes::cipher::{BlockEncryptMut, KeyIvInit};
use aes_gcm::aead::{Aead, KeyInit, Payload};
use aes_gcm::{Aes128Gcm, Aes256Gcm, AesGcm};
use hmac::{Hmac, Mac};
use p256::elliptic_curve::sec1::ToEncodedPoint;
use rand::{Rng, rng};
use rand_core::OsRng;
use rsa::Oaep;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256, Sha384, Sha512};

use crate::Result;
use crate::core::codec;
use crate::error::{processing, unsupported};
use crate::jose::jwa::{JweAlg, JweEnc};
use crate::jose::jwk::{EncryptionKey, Jwk};

type Aes192Gcm = AesGcm<aes::Aes192, aes_gcm::aead::consts::U12>;

/// The protected header of a compact JWE.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct JweHeader {
    /// Key-management algorithm.
    pub alg: JweAlg,

    /// Content-encryption algorithm.
    pub enc: JweEnc,

    /// Ephemeral public key, present for ECDH-ES.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub epk: Option<Jwk>,

    /// Identifier of the recipient key.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kid: Option<String>,

    /// Content type of the plaintext, e.g. `oauth-authz-req+jwt` for a
    /// nested signed request object.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cty: Option<String>,
}

/// Encrypt `plaintext` to the recipient key, producing the five-segment
/// compact serialization.
///
/// # Errors
///
/// Returns an error when the key type does not match `alg` or a cipher
/// rejects its parameters.
pub fn encrypt(
    alg: JweAlg, enc: JweEnc, key: &EncryptionKey, plaintext: &[u8], kid: Option<&str>,
    cty: Option<&str>,
) -> Result<String> {
    let mut header = JweHeader {
        alg,
        enc,
        epk: None,
        kid: kid.map(ToString::to_string),
        cty: cty.map(ToString::to_string),
    };

    // CEK: derived for ECDH-ES (empty encrypted-key segment), random
    // and RSA-OAEP-wrapped otherwise.
    let (cek, encrypted_key) = match alg {
        JweAlg::EcdhEs => {
            let (z, epk) = agree(key)?;
            header.epk = Some(epk);
            (concat_kdf(&z, &enc.to_string(), enc.key_len() * 8), Vec::new())
        }
        JweAlg::RsaOaep | JweAlg::RsaOaep256 | JweAlg::RsaOaep384 | JweAlg::RsaOaep512 => {
            let EncryptionKey::Rsa(rsa_key) = key else {
                return Err(unsupported!("{alg} requires an RSA recipient key"));
            };
            let mut cek = vec![0u8; enc.key_len()];
            rng().fill(cek.as_mut_slice());
            let padding = match alg {
                JweAlg::RsaOaep => Oaep::new::<sha1::Sha1>(),
                JweAlg::RsaOaep256 => Oaep::new::<Sha256>(),
                JweAlg::RsaOaep384 => Oaep::new::<Sha384>(),
                JweAlg::RsaOaep512 => Oaep::new::<Sha512>(),
                JweAlg::EcdhEs => unreachable!(),
            };
            let wrapped = rsa_key
                .encrypt(&mut OsRng, padding, &cek)
                .map_err(|e| processing!("issue wrapping CEK: {e}"))?;
            (cek, wrapped)
        }
    };

    let mut iv = vec![0u8; enc.iv_len()];
    rng().fill(iv.as_mut_slice());

    let protected = codec::b64url(
        serde_json::to_vec(&header).map_err(|e| processing!("issue serializing header: {e}"))?,
    );
    let aad = protected.as_bytes();

    let (ciphertext, tag) = if enc.is_gcm() {
        gcm_encrypt(enc, &cek, &iv, plaintext, aad)?
    } else {
        cbc_hmac_encrypt(enc, &cek, &iv, plaintext, aad)?
    };

    Ok(format!(
        "{protected}.{}.{}.{}.{}",
        codec::b64url(encrypted_key),
        codec::b64url(iv),
        codec::b64url(ciphertext),
        codec::b64url(tag)
    ))
}

/// ECDH with a fresh ephemeral key; returns the shared secret and the
/// ephemeral public JWK for the header.
fn agree(key: &EncryptionKey) -> Result<(Vec<u8>, Jwk)> {
    use crate::jose::jwa::Curve;

    let (z, crv, point) = match key {
        EncryptionKey::P256(public) => {
            let ephemeral = p256::ecdh::EphemeralSecret::random(&mut OsRng);
            let point = ephemeral.public_key().to_encoded_point(false);
            (ephemeral.diffie_hellman(public).raw_secret_bytes().to_vec(), Curve::P256,
                (point.x().map(|c| c.as_slice().to_vec()), point.y().map(|c|
                    c.as_slice().to_vec())))
        }
        EncryptionKey::P384(public) => {
            let ephemeral = p384::ecdh::EphemeralSecret::random(&mut OsRng);
            let point = ephemeral.public_key().to_encoded_point(false);
            (ephemeral.diffie_hellman(public).raw_secret_bytes().to_vec(), Curve::P384,
                (point.x().map(|c| c.as_slice().to_vec()), point.y().map(|c|
                    c.as_slice().to_vec())))
        }
        EncryptionKey::P521(public) => {
            let ephemeral = p521::ecdh::EphemeralSecret::random(&mut OsRng);
            let point = ephemeral.public_key().to_encoded_point(false);
            (ephemeral.diffie_hellman(public).raw_secret_bytes().to_vec(), Curve::P521,
                (point.x().map(|c| c.as_slice().to_vec()), point.y().map(|c|
                    c.as_slice().to_vec())))
        }
        EncryptionKey::Rsa(_) => {
            return Err(unsupported!("ECDH-ES requires an EC recipient key"));
        }
    };

    let epk = Jwk {
        kty: "EC".to_string(),
        crv: Some(crv.to_string()),
        x: point.0.map(codec::b64url),
        y: point.1.map(codec::b64url),
        ..Jwk::default()
    };
    Ok((z, epk))
}

/// The Concat KDF, single-step, SHA-256, as profiled by RFC 7518 §4.6
/// for direct key agreement: `AlgorithmID` is the `enc` name,
/// `PartyUInfo` and `PartyVInfo` are empty, `SuppPubInfo` is the key
/// width in bits.
fn concat_kdf(z: &[u8], alg_id: &str, keydatalen_bits: usize) -> Vec<u8> {
    let mut other_info = Vec::new();
    other_info.extend(u32::try_from(alg_id.len()).unwrap_or(u32::MAX).to_be_bytes());
    other_info.extend(alg_id.as_bytes());
    other_info.extend(0u32.to_be_bytes());
    other_info.extend(0u32.to_be_bytes());
    other_info.extend(u32::try_from(keydatalen_bits).unwrap_or(u32::MAX).to_be_bytes());

    let mut derived = Vec::new();
    let rounds = keydatalen_bits.div_ceil(256);
    for counter in 1..=rounds {
        let mut hasher = Sha256::new();
        hasher.update(u32::try_from(counter).unwrap_or(u32::MAX).to_be_bytes());
        hasher.update(z);
        hasher.update(&other_info);
        derived.extend(hasher.finalize());
    }
    derived.truncate(keydatalen_bits / 8);
    derived
}

fn gcm_encrypt(
    enc: JweEnc, cek: &[u8], iv: &[u8], plaintext: &[u8], aad: &[u8],
) -> Result<(Vec<u8>, Vec<u8>)> {
    let payload = Payload {
        msg: plaintext,
        aad,
    };
    let nonce = aes_gcm::Nonce::from_slice(iv);
    let sealed = match enc {
        JweEnc::A128GCM => Aes128Gcm::new_from_slice(cek)
            .map_err(|e| processing!("invalid CEK: {e}"))?
            .encrypt(nonce, payload),
        JweEnc::A192GCM => Aes192Gcm::new_from_slice(cek)
            .map_err(|e| processing!("invalid CEK: {e}"))?
            .encrypt(nonce, payload),
        JweEnc::A256GCM => Aes256Gcm::new_from_slice(cek)
            .map_err(|e| processing!("invalid CEK: {e}"))?
            .encrypt(nonce, payload),
        _ => return Err(unsupported!("{enc} is not a GCM algorithm")),
    }
    .map_err(|_| processing!("AES-GCM encryption failed"))?;

    // the aead crate appends the 128-bit tag to the ciphertext
    let split = sealed.len() - 16;
    let (ciphertext, tag) = sealed.split_at(split);
    Ok((ciphertext.to_vec(), tag.to_vec()))
}

fn cbc_hmac_encrypt(
    enc: JweEnc, cek: &[u8], iv: &[u8], plaintext: &[u8], aad: &[u8],
) -> Result<(Vec<u8>, Vec<u8>)> {
    // first half of the CEK authenticates, second half encrypts
    let half = enc.key_len() / 2;
    let (mac_key, enc_key) = cek.split_at(half);

    let ciphertext = match enc {
        JweEnc::A128CbcHs256 => cbc::Encryptor::<aes::Aes128>::new_from_slices(enc_key, iv)
            .map_err(|e| processing!("invalid CEK: {e}"))?
            .encrypt_padded_vec_mut::<Pkcs7>(plaintext),
        JweEnc::A192CbcHs384 => cbc::Encryptor::<aes::Aes192>::new_from_slices(enc_key, iv)
            .map_err(|e| processing!("invalid CEK: {e}"))?
            .encrypt_padded_vec_mut::<Pkcs7>(plaintext),
        JweEnc::A256CbcHs512 => cbc::Encryptor::<aes::Aes256>::new_from_slices(enc_key, iv)
            .map_err(|e| processing!("invalid CEK: {e}"))?
            .encrypt_padded_vec_mut::<Pkcs7>(plaintext),
        _ => return Err(unsupported!("{enc} is not a CBC-HMAC algorithm")),
    };

    let al = codec::u64_be(u64::try_from(aad.len()).unwrap_or(u64::MAX) * 8);
    let mac_input = codec::concat(&[aad, iv, &ciphertext, &al]);
    let mut tag = match enc {
        JweEnc::A128CbcHs256 => {
            let mut mac = <Hmac<Sha256> as Mac>::new_from_slice(mac_key)
                .map_err(|e| processing!("invalid MAC key: {e}"))?;
            mac.update(&mac_input);
            mac.finalize().into_bytes().to_vec()
        }
        JweEnc::A192CbcHs384 => {
            let mut mac = <Hmac<Sha384> as Mac>::new_from_slice(mac_key)
                .map_err(|e| processing!("invalid MAC key: {e}"))?;
            mac.update(&mac_input);
            mac.finalize().into_bytes().to_vec()
        }
        JweEnc::A256CbcHs512 => {
            let mut mac = <Hmac<Sha512> as Mac>::new_from_slice(mac_key)
                .map_err(|e| processing!("invalid MAC key: {e}"))?;
            mac.update(&mac_input);
            mac.finalize().into_bytes().to_vec()
        }
        _ => unreachable!(),
    };
    tag.truncate(half);
    Ok((ciphertext, tag))
}
