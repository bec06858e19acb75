//! # Form Encoding
//!
//! `application/x-www-form-urlencoded` encoding as used by OAuth 2.0
//! request bodies and HTTP Basic credentials ([RFC 6749] Appendix B):
//! percent-encoding with space rewritten to `+`.
//!
//! [RFC 6749]: https://www.rfc-editor.org/rfc/rfc6749

use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};

// unreserved characters per the form-urlencoded serializer
const FORM: &AsciiSet = &NON_ALPHANUMERIC.remove(b'*').remove(b'-').remove(b'.').remove(b'_');

/// Form-encode a single value.
#[must_use]
pub fn encode(s: &str) -> String {
    utf8_percent_encode(s, FORM).to_string().replace("%20", "+")
}

/// Serialize name/value pairs as a form-encoded request body.
#[must_use]
pub fn to_body(pairs: &[(String, String)]) -> String {
    pairs
        .iter()
        .map(|(name, value)| format!("{}={}", encode(name), encode(value)))
        .collect::<Vec<_>>()
        .join("&")
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn encodes_reserved() {
        assert_eq!(encode("a b+c"), "a+b%2Bc");
        assert_eq!(encode("sec=ret&"), "sec%3Dret%26");
        assert_eq!(encode("safe-._*"), "safe-._*");
    }

    #[test]
    fn body_serialization() {
        let pairs =
            vec![("grant_type".to_string(), "authorization_code".to_string()), ("code".to_string(),
                "a/b c".to_string())];
        assert_eq!(to_body(&pairs), "grant_type=authorization_code&code=a%2Fb+c");
    }
}
