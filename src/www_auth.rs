//! # `WWW-Authenticate` Challenges
//!
//! Parsing of the `WWW-Authenticate` response header ([RFC 9110]
//! §11.6.1) into structured challenges for caller-level policy. Schemes
//! and parameter names are lowercased; quoted parameter values are
//! unquoted. Challenges are data, never errors.
//!
//! [RFC 9110]: https://www.rfc-editor.org/rfc/rfc9110

use bytes::Bytes;

/// One authentication challenge: a scheme and its parameters, in header
/// order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Challenge {
    /// Authentication scheme, lowercased (`bearer`, `dpop`, …).
    pub scheme: String,

    /// Parameter name/value pairs; names lowercased, values unquoted.
    pub parameters: Vec<(String, String)>,
}

impl Challenge {
    /// A parameter's value by (case-insensitive) name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.parameters
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

fn is_token_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || "!#$%&'*+-.^_`|~".contains(c)
}

/// Parse a `WWW-Authenticate` header value into its challenges. An
/// unparseable header yields an empty list.
#[must_use]
pub fn parse_challenges(header: &str) -> Vec<Challenge> {
    // split on commas, joining segments where the comma fell inside a
    // quoted string
    let mut segments: Vec<String> = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    for c in header.chars() {
        match c {
            '"' => {
                in_quotes = !in_quotes;
                current.push(c);
            }
            ',' if !in_quotes => {
                segments.push(std::mem::take(&mut current));
            }
            _ => current.push(c),
        }
    }
    segments.push(current);

    let mut challenges: Vec<Challenge> = Vec::new();
    for segment in &segments {
        let segment = segment.trim();
        if segment.is_empty() {
            continue;
        }

        // a leading token that is not `name=` opens a new challenge
        let token_len = segment.chars().take_while(|c| is_token_char(*c)).count();
        let (token, rest) = segment.split_at(token_len);
        if token_len > 0 && !rest.starts_with('=') {
            challenges.push(Challenge {
                scheme: token.to_ascii_lowercase(),
                parameters: Vec::new(),
            });
            if let Some((name, value)) = parse_parameter(rest.trim_start()) {
                if let Some(challenge) = challenges.last_mut() {
                    challenge.parameters.push((name, value));
                }
            }
        } else if let Some(challenge) = challenges.last_mut() {
            if let Some((name, value)) = parse_parameter(segment) {
                challenge.parameters.push((name, value));
            }
        }
    }
    challenges
}

/// Parse the challenges of a response's `WWW-Authenticate` header, if
/// it carries one.
#[must_use]
pub fn from_response(response: &http::Response<Bytes>) -> Option<Vec<Challenge>> {
    let header = response.headers().get(http::header::WWW_AUTHENTICATE)?.to_str().ok()?;
    let challenges = parse_challenges(header);
    if challenges.is_empty() { None } else { Some(challenges) }
}

fn parse_parameter(s: &str) -> Option<(String, String)> {
    let equals = s.find('=')?;
    let (name, value) = s.split_at(equals);
    if name.is_empty() || !name.chars().all(is_token_char) {
        return None;
    }
    let value = value[1..].trim();
    let value = value.strip_prefix('"').and_then(|v| v.strip_suffix('"')).unwrap_or(value);
    Some((name.to_ascii_lowercase(), value.to_string()))
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn single_challenge() {
        let challenges = parse_challenges(
            r#"Bearer realm="api", error="invalid_token", error_description="expired""#,
        );
        assert_eq!(challenges.len(), 1);
        assert_eq!(challenges[0].scheme, "bearer");
        assert_eq!(challenges[0].get("realm"), Some("api"));
        assert_eq!(challenges[0].get("error"), Some("invalid_token"));
        assert_eq!(challenges[0].get("error_description"), Some("expired"));
    }

    #[test]
    fn multiple_schemes() {
        let challenges =
            parse_challenges(r#"DPoP error="use_dpop_nonce", Bearer realm="api""#);
        assert_eq!(challenges.len(), 2);
        assert_eq!(challenges[0].scheme, "dpop");
        assert_eq!(challenges[0].get("error"), Some("use_dpop_nonce"));
        assert_eq!(challenges[1].scheme, "bearer");
    }

    #[test]
    fn commas_inside_quoted_strings() {
        let challenges =
            parse_challenges(r#"Bearer error_description="one, two, three", scope="a b""#);
        assert_eq!(challenges.len(), 1);
        assert_eq!(challenges[0].get("error_description"), Some("one, two, three"));
        assert_eq!(challenges[0].get("scope"), Some("a b"));
    }

    #[test]
    fn names_lowercased_values_kept() {
        let challenges = parse_challenges(r#"BEARER Realm="CaseSensitive""#);
        assert_eq!(challenges[0].scheme, "bearer");
        assert_eq!(challenges[0].parameters[0].0, "realm");
        assert_eq!(challenges[0].get("realm"), Some("CaseSensitive"));
    }

    #[test]
    fn idempotent_over_normal_form() {
        let normal = r#"bearer realm="api", error="invalid_token""#;
        let first = parse_challenges(normal);
        let rebuilt = format!(
            "{} {}",
            first[0].scheme,
            first[0]
                .parameters
                .iter()
                .map(|(n, v)| format!(r#"{n}="{v}""#))
                .collect::<Vec<_>>()
                .join(", ")
        );
        assert_eq!(parse_challenges(&rebuilt), first);
    }

    #[test]
    fn bare_scheme() {
        let challenges = parse_challenges("Bearer");
        assert_eq!(challenges.len(), 1);
        assert!(challenges[0].parameters.is_empty());
    }
}
