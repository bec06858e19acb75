//! # Authorization Server Discovery
//!
//! Resolution of the well-known metadata document for an issuer, by the
//! OpenID Connect Discovery rules or the [RFC 8414] rules, and
//! validation that the document speaks for the expected issuer.
//!
//! [RFC 8414]: https://www.rfc-editor.org/rfc/rfc8414

use bytes::Bytes;
use http::StatusCode;
use url::Url;

use crate::error::{invalid, processing};
use crate::provider::HttpClient;
use crate::types::AuthorizationServer;
use crate::{Result, endpoint};

/// Which well-known URL convention to use.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum DiscoveryMethod {
    /// OpenID Connect Discovery: the suffix is appended to the issuer
    /// path.
    #[default]
    Oidc,

    /// RFC 8414: the suffix is inserted between host and issuer path.
    Oauth2,
}

/// Build the metadata request for an issuer identifier.
///
/// # Errors
///
/// Returns an error when the issuer is not a valid URL.
pub fn request(issuer: &str, method: DiscoveryMethod) -> Result<http::Request<Bytes>> {
    let mut url =
        Url::parse(issuer).map_err(|e| invalid!("invalid issuer identifier {issuer}: {e}"))?;

    let path = match method {
        DiscoveryMethod::Oidc => {
            format!("{}/.well-known/openid-configuration", url.path()).replace("//", "/")
        }
        DiscoveryMethod::Oauth2 => {
            if url.path() == "/" {
                "/.well-known/oauth-authorization-server".to_string()
            } else {
                format!("/.well-known/oauth-authorization-server{}", url.path())
            }
        }
    };
    url.set_path(&path);

    endpoint::get(url.as_str(), "application/json")
}

/// Validate a discovery response: a `200` JSON document whose `issuer`
/// equals the expected issuer, href-compared after URL normalization.
///
/// # Errors
///
/// Returns an error on status, shape, or issuer mismatch.
pub fn process(
    expected_issuer: &str, response: &http::Response<Bytes>,
) -> Result<AuthorizationServer> {
    let expected = Url::parse(expected_issuer)
        .map_err(|e| invalid!("invalid issuer identifier {expected_issuer}: {e}"))?;

    endpoint::check_status(response, StatusCode::OK)?;
    let server: AuthorizationServer = endpoint::json_body(response)?;
    if server.issuer.is_empty() {
        return Err(processing!("metadata document has no issuer"));
    }

    let declared = Url::parse(&server.issuer)
        .map_err(|e| processing!("metadata issuer is not a URL: {e}"))?;
    if declared.as_str() != expected.as_str() {
        return Err(processing!(
            "metadata issuer {declared} does not match expected issuer {expected}"
        ));
    }
    Ok(server)
}

/// Fetch and validate the metadata for an issuer in one step.
///
/// # Errors
///
/// Propagates builder, transport, and validation failures.
pub async fn discover(
    http: &impl HttpClient, issuer: &str, method: DiscoveryMethod,
) -> Result<AuthorizationServer> {
    let response = endpoint::fetch(http, request(issuer, method)?).await?;
    process(issuer, &response)
}

#[cfg(test)]
mod test {
    use serde_json::json;

    use super::*;

    fn url_of(request: &http::Request<Bytes>) -> String {
        request.uri().to_string()
    }

    #[test]
    fn oidc_appends_suffix() {
        let request = request("https://h.example/tenant/1", DiscoveryMethod::Oidc)
            .expect("should build");
        assert_eq!(
            url_of(&request),
            "https://h.example/tenant/1/.well-known/openid-configuration"
        );
    }

    #[test]
    fn oidc_collapses_root_slash() {
        let request =
            request("https://h.example/", DiscoveryMethod::Oidc).expect("should build");
        assert_eq!(url_of(&request), "https://h.example/.well-known/openid-configuration");
    }

    #[test]
    fn oauth2_root_issuer() {
        let request =
            request("https://h.example/", DiscoveryMethod::Oauth2).expect("should build");
        assert_eq!(url_of(&request), "https://h.example/.well-known/oauth-authorization-server");
    }

    #[test]
    fn oauth2_prefixes_path() {
        let request = request("https://h.example/tenant/1", DiscoveryMethod::Oauth2)
            .expect("should build");
        assert_eq!(
            url_of(&request),
            "https://h.example/.well-known/oauth-authorization-server/tenant/1"
        );
    }

    #[test]
    fn issuer_must_match() {
        let body = json!({"issuer": "https://other.example"}).to_string();
        let response = http::Response::builder()
            .status(200)
            .body(Bytes::from(body))
            .expect("should build");
        assert!(process("https://h.example", &response).is_err());
    }

    #[test]
    fn issuer_href_normalization() {
        // "https://h.example" normalizes to "https://h.example/"
        let body = json!({"issuer": "https://h.example/"}).to_string();
        let response = http::Response::builder()
            .status(200)
            .body(Bytes::from(body))
            .expect("should build");
        let server = process("https://h.example", &response).expect("should validate");
        assert_eq!(server.issuer, "https://h.example/");
    }
}
