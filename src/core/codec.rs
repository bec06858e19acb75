//! # Codecs
//!
//! Base64 and base64url codecs plus the byte-assembly helpers used by
//! the JOSE engine.

use base64ct::{Base64, Base64UrlUnpadded, Encoding};

use crate::{Error, Result};

/// Encode bytes as unpadded base64url ([RFC 4648] §5).
///
/// [RFC 4648]: https://www.rfc-editor.org/rfc/rfc4648
#[must_use]
pub fn b64url(bytes: impl AsRef<[u8]>) -> String {
    Base64UrlUnpadded::encode_string(bytes.as_ref())
}

/// Decode an unpadded base64url string.
///
/// # Errors
///
/// Returns an error when the input is not valid unpadded base64url.
pub fn b64url_decode(s: &str) -> Result<Vec<u8>> {
    Base64UrlUnpadded::decode_vec(s)
        .map_err(|e| Error::Processing(format!("invalid base64url: {e}")))
}

/// Encode bytes as padded, standard-alphabet base64.
#[must_use]
pub fn b64(bytes: impl AsRef<[u8]>) -> String {
    Base64::encode_string(bytes.as_ref())
}

/// A `u64` as 8 big-endian bytes.
#[must_use]
pub const fn u64_be(n: u64) -> [u8; 8] {
    n.to_be_bytes()
}

/// Concatenate byte slices into a single buffer.
#[must_use]
pub fn concat(parts: &[&[u8]]) -> Vec<u8> {
    let mut out = Vec::with_capacity(parts.iter().map(|p| p.len()).sum());
    for part in parts {
        out.extend_from_slice(part);
    }
    out
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn b64url_round_trip() {
        let cases: &[&[u8]] = &[b"", b"f", b"fo", b"foo", b"foob", b"fooba", b"foobar", &[0xfb,
            0xff, 0xfe, 0x00]];
        for case in cases {
            let encoded = b64url(case);
            assert!(!encoded.contains(['=', '+', '/']));
            assert_eq!(b64url_decode(&encoded).expect("should decode"), *case);
        }
    }

    #[test]
    fn b64url_rejects_padding() {
        assert!(b64url_decode("Zm9v=").is_err());
    }

    #[test]
    fn big_endian_length() {
        assert_eq!(u64_be(408), [0, 0, 0, 0, 0, 0, 1, 152]);
    }
}
