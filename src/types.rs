//! # Protocol Types
//!
//! Authorization Server metadata ([RFC 8414]), the relying party's
//! registered client metadata, the endpoint response records, and the
//! three-valued expectation enums validators branch on.
//!
//! [RFC 8414]: https://www.rfc-editor.org/rfc/rfc8414

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::jose::jwa::{HmacAlg, JweEnc, JwsAlg};
use crate::jose::jwt::Claims;

/// Discovered Authorization Server metadata. Endpoints are all
/// optional; the presence of an endpoint gates the corresponding
/// operation. Constructed once per server from discovery and treated as
/// immutable thereafter.
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct AuthorizationServer {
    /// Issuer identifier URL. The one field discovery requires.
    pub issuer: String,

    /// Authorization endpoint URL.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub authorization_endpoint: Option<String>,

    /// Token endpoint URL.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token_endpoint: Option<String>,

    /// Pushed authorization request endpoint URL ([RFC 9126]).
    ///
    /// [RFC 9126]: https://www.rfc-editor.org/rfc/rfc9126
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pushed_authorization_request_endpoint: Option<String>,

    /// Device authorization endpoint URL ([RFC 8628]).
    ///
    /// [RFC 8628]: https://www.rfc-editor.org/rfc/rfc8628
    #[serde(skip_serializing_if = "Option::is_none")]
    pub device_authorization_endpoint: Option<String>,

    /// Token introspection endpoint URL ([RFC 7662]).
    ///
    /// [RFC 7662]: https://www.rfc-editor.org/rfc/rfc7662
    #[serde(skip_serializing_if = "Option::is_none")]
    pub introspection_endpoint: Option<String>,

    /// Token revocation endpoint URL ([RFC 7009]).
    ///
    /// [RFC 7009]: https://www.rfc-editor.org/rfc/rfc7009
    #[serde(skip_serializing_if = "Option::is_none")]
    pub revocation_endpoint: Option<String>,

    /// UserInfo endpoint URL.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub userinfo_endpoint: Option<String>,

    /// JSON Web Key Set URL.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub jwks_uri: Option<String>,

    /// JWS algorithms the server signs ID Tokens with.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id_token_signing_alg_values_supported: Option<Vec<String>>,

    /// JWS algorithms the server signs userinfo responses with.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub userinfo_signing_alg_values_supported: Option<Vec<String>>,

    /// JWS algorithms the server signs introspection responses with.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub introspection_signing_alg_values_supported: Option<Vec<String>>,

    /// JWS algorithms the server signs JARM response objects with.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub authorization_signing_alg_values_supported: Option<Vec<String>>,

    /// Algorithms accepted for signed client assertions.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token_endpoint_auth_signing_alg_values_supported: Option<Vec<String>>,

    /// Whether authorization responses carry an `iss` parameter
    /// ([RFC 9207]).
    ///
    /// [RFC 9207]: https://www.rfc-editor.org/rfc/rfc9207
    #[serde(skip_serializing_if = "Option::is_none")]
    pub authorization_response_iss_parameter_supported: Option<bool>,

    /// Any further metadata the server publishes.
    #[serde(flatten)]
    pub additional: Map<String, Value>,
}

/// Token endpoint client authentication methods.
#[derive(Clone, Copy, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TokenEndpointAuthMethod {
    /// HTTP Basic with form-encoded credentials (the default).
    #[default]
    ClientSecretBasic,

    /// `client_id`/`client_secret` in the request body.
    ClientSecretPost,

    /// HMAC-signed client assertion derived from the client secret.
    ClientSecretJwt,

    /// Client assertion signed with the client's asymmetric key.
    PrivateKeyJwt,

    /// Public client: `client_id` only.
    None,
}

/// The relying party's registered client metadata.
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct Client {
    /// OAuth 2.0 client identifier.
    pub client_id: String,

    /// Client secret, required by the `client_secret_*` authentication
    /// methods.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_secret: Option<String>,

    /// How the client authenticates to the token endpoint.
    #[serde(default)]
    pub token_endpoint_auth_method: TokenEndpointAuthMethod,

    /// Exact JWS algorithm expected on ID Tokens; overrides server
    /// metadata.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id_token_signed_response_alg: Option<JwsAlg>,

    /// Exact JWS algorithm expected on signed userinfo responses. Its
    /// presence makes userinfo requests negotiate `application/jwt`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub userinfo_signed_response_alg: Option<JwsAlg>,

    /// Exact JWS algorithm expected on signed introspection responses.
    /// Its presence makes introspection requests negotiate
    /// `application/token-introspection+jwt`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub introspection_signed_response_alg: Option<JwsAlg>,

    /// Exact JWS algorithm expected on JARM response objects.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub authorization_signed_response_alg: Option<JwsAlg>,

    /// HMAC algorithm for `client_secret_jwt` assertions; when absent,
    /// the first HS* value the server advertises is used.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token_endpoint_auth_signing_alg: Option<HmacAlg>,

    /// Default `max_age` applied to ID Token `auth_time` validation.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_max_age: Option<u64>,

    /// Whether ID Tokens must carry `auth_time`.
    #[serde(default)]
    pub require_auth_time: bool,

    /// Content-encryption algorithm for encrypted request objects.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_object_encryption_enc: Option<JweEnc>,
}

/// Three-valued ID Token `nonce` expectation.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum ExpectedNonce {
    /// The token must not carry a `nonce` claim.
    #[default]
    ExpectNone,

    /// The token must carry exactly this `nonce`.
    Value(String),
}

/// Three-valued authorization response `state` expectation.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum ExpectedState {
    /// The response must not carry a `state` parameter.
    #[default]
    ExpectNone,

    /// Accept any `state`; the caller verifies it out of band.
    Skip,

    /// The response must carry exactly this `state`.
    Value(String),
}

/// UserInfo `sub` expectation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ExpectedSubject {
    /// Accept any subject. Use only when no ID Token subject is
    /// available to pin.
    Skip,

    /// The response must be about exactly this subject.
    Value(String),
}

/// `auth_time` freshness constraint.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum MaxAge {
    /// No freshness check.
    #[default]
    Skip,

    /// End-user authentication must be at most this many seconds old.
    Value(u64),
}

impl MaxAge {
    /// The default constraint for a client: its registered
    /// `default_max_age`, else no check.
    #[must_use]
    pub fn for_client(client: &Client) -> Self {
        client.default_max_age.map_or(Self::Skip, Self::Value)
    }
}

/// A validated token endpoint response.
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct TokenResponse {
    /// The issued access token.
    pub access_token: String,

    /// Token type, lowercased during validation (`bearer` or `dpop`).
    pub token_type: String,

    /// Access token lifetime in seconds.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_in: Option<u64>,

    /// Refresh token, when the grant issues one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,

    /// Granted scope, when it differs from the request.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scope: Option<String>,

    /// ID Token, present on OpenID Connect grants.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id_token: Option<String>,

    /// Any further members of the response body.
    #[serde(flatten)]
    pub additional: Map<String, Value>,

    #[serde(skip)]
    id_token_claims: Option<Claims>,
}

impl TokenResponse {
    /// The ID Token claims validated alongside this response, when the
    /// response carried one.
    #[must_use]
    pub const fn id_token_claims(&self) -> Option<&Claims> {
        self.id_token_claims.as_ref()
    }

    pub(crate) fn set_id_token_claims(&mut self, claims: Claims) {
        self.id_token_claims = Some(claims);
    }
}

/// A validated pushed authorization response ([RFC 9126]).
///
/// [RFC 9126]: https://www.rfc-editor.org/rfc/rfc9126
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct PushedAuthorizationResponse {
    /// Reference to use as the `request_uri` authorization parameter.
    pub request_uri: String,

    /// Lifetime of the reference in seconds.
    pub expires_in: u64,
}

/// A validated device authorization response ([RFC 8628]).
///
/// [RFC 8628]: https://www.rfc-editor.org/rfc/rfc8628
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct DeviceAuthorizationResponse {
    /// The grant's device verification code.
    pub device_code: String,

    /// End-user verification code.
    pub user_code: String,

    /// End-user verification URI.
    pub verification_uri: String,

    /// Verification URI with the `user_code` included.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub verification_uri_complete: Option<String>,

    /// Lifetime of the codes in seconds.
    pub expires_in: u64,

    /// Minimum polling interval in seconds; 5 when the server omits it.
    #[serde(default = "default_interval")]
    pub interval: u64,
}

const fn default_interval() -> u64 {
    5
}

/// A validated introspection response ([RFC 7662]).
///
/// [RFC 7662]: https://www.rfc-editor.org/rfc/rfc7662
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct IntrospectionResponse {
    /// Whether the introspected token is active.
    pub active: bool,

    /// The remaining introspection members (`scope`, `exp`, `sub`, …).
    #[serde(flatten)]
    pub additional: Map<String, Value>,
}

/// A validated userinfo response.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct UserInfo {
    /// Subject the claims are about.
    pub sub: String,

    /// The end-user claims.
    #[serde(flatten)]
    pub claims: Map<String, Value>,
}

#[cfg(test)]
mod test {
    use serde_json::json;

    use super::*;

    #[test]
    fn metadata_keeps_unknown_members() {
        let body = json!({
            "issuer": "https://as.example",
            "jwks_uri": "https://as.example/jwks",
            "code_challenge_methods_supported": ["S256"]
        });
        let server: AuthorizationServer = serde_json::from_value(body).expect("should parse");
        assert_eq!(server.issuer, "https://as.example");
        assert!(server.additional.contains_key("code_challenge_methods_supported"));
        assert!(server.token_endpoint.is_none());
    }

    #[test]
    fn auth_method_wire_names() {
        assert_eq!(
            serde_json::to_string(&TokenEndpointAuthMethod::ClientSecretBasic)
                .expect("should serialize"),
            r#""client_secret_basic""#
        );
        assert_eq!(
            serde_json::from_str::<TokenEndpointAuthMethod>(r#""none""#).expect("should parse"),
            TokenEndpointAuthMethod::None
        );
    }

    #[test]
    fn device_interval_defaults() {
        let body = json!({
            "device_code": "d", "user_code": "u", "verification_uri": "https://as.example/device",
            "expires_in": 1800
        });
        let response: DeviceAuthorizationResponse =
            serde_json::from_value(body).expect("should parse");
        assert_eq!(response.interval, 5);
    }

    #[test]
    fn max_age_defaults_from_client() {
        let client = Client {
            client_id: "c".to_string(),
            default_max_age: Some(600),
            ..Client::default()
        };
        assert_eq!(MaxAge::for_client(&client), MaxAge::Value(600));
        assert_eq!(MaxAge::for_client(&Client::default()), MaxAge::Skip);
    }
}
