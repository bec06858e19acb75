//! # Authorization Response Validation
//!
//! Validation of front-channel authorization responses: the plain query
//! form with [RFC 9207] issuer checking, and the JWT-secured (JARM)
//! form, which verifies the response object and falls through to the
//! plain validator. Implicit and hybrid response parameters are
//! rejected outright.
//!
//! [RFC 9207]: https://www.rfc-editor.org/rfc/rfc9207

use std::str::FromStr;

use url::Url;

use crate::error::{invalid, processing, unsupported};
use crate::jose::{jws, jwt};
use crate::provider::HttpClient;
use crate::types::{AuthorizationServer, Client, ExpectedState};
use crate::{Error, OAuthError, Result, jwks};

/// The parameters of an authorization response, however delivered:
/// parsed from the redirect URL's query, a raw query string, or a JARM
/// response object.
#[derive(Clone, Debug, Default)]
pub struct CallbackParams(Vec<(String, String)>);

impl CallbackParams {
    /// A parameter's value. Duplicated parameters are an error per
    /// [RFC 6749] §3.1.
    ///
    /// [RFC 6749]: https://www.rfc-editor.org/rfc/rfc6749
    ///
    /// # Errors
    ///
    /// Returns an error when the parameter appears more than once.
    pub fn get(&self, name: &str) -> Result<Option<&str>> {
        let mut values = self.0.iter().filter(|(n, _)| n == name).map(|(_, v)| v.as_str());
        let first = values.next();
        if values.next().is_some() {
            return Err(processing!("parameter {name} appears more than once"));
        }
        Ok(first)
    }

    /// The `code` parameter, once validation has succeeded.
    ///
    /// # Errors
    ///
    /// Returns an error when `code` is absent or duplicated.
    pub fn code(&self) -> Result<&str> {
        self.get("code")?.ok_or_else(|| processing!("response has no code parameter"))
    }
}

impl From<&Url> for CallbackParams {
    fn from(url: &Url) -> Self {
        Self(url.query_pairs().map(|(n, v)| (n.into_owned(), v.into_owned())).collect())
    }
}

impl FromStr for CallbackParams {
    type Err = Error;

    fn from_str(query: &str) -> Result<Self, Self::Err> {
        let query = query.strip_prefix('?').unwrap_or(query);
        Ok(Self(
            url::form_urlencoded::parse(query.as_bytes())
                .map(|(n, v)| (n.into_owned(), v.into_owned()))
                .collect(),
        ))
    }
}

impl FromIterator<(String, String)> for CallbackParams {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Validate a plain authorization response.
///
/// The `iss` parameter is required and checked when the server
/// advertises [RFC 9207] support; `state` follows the caller's
/// three-valued expectation; an `error` parameter surfaces verbatim as
/// the OAuth error value; `id_token` or `token` parameters mean an
/// implicit or hybrid response and are refused.
///
/// [RFC 9207]: https://www.rfc-editor.org/rfc/rfc9207
///
/// # Errors
///
/// Returns an error (or the server's OAuth error value) on any failed
/// check.
pub fn validate(
    server: &AuthorizationServer, client: &Client, params: &CallbackParams,
    expected_state: &ExpectedState,
) -> Result<CallbackParams> {
    if client.client_id.is_empty() {
        return Err(invalid!("client_id must be non-empty"));
    }
    if params.get("response")?.is_some() {
        return Err(processing!("JARM responses must use the JWT response validator"));
    }

    let iss = params.get("iss")?;
    if server.authorization_response_iss_parameter_supported == Some(true) && iss.is_none() {
        return Err(processing!("response is missing the iss parameter"));
    }
    if let Some(iss) = iss {
        if iss != server.issuer {
            return Err(processing!("unexpected iss parameter value: {iss}"));
        }
    }

    let state = params.get("state")?;
    match expected_state {
        ExpectedState::ExpectNone => {
            if state.is_some() {
                return Err(processing!("unexpected state parameter"));
            }
        }
        ExpectedState::Skip => {}
        ExpectedState::Value(expected) => match state {
            Some(state) if state == expected => {}
            Some(_) => return Err(processing!("unexpected state parameter value")),
            None => return Err(processing!("response is missing the state parameter")),
        },
    }

    if let Some(error) = params.get("error")? {
        if error.is_empty() {
            return Err(processing!("response error parameter must be non-empty"));
        }
        return Err(Error::OAuth(OAuthError {
            error: error.to_string(),
            error_description: params.get("error_description")?.map(ToString::to_string),
            error_uri: params.get("error_uri")?.map(ToString::to_string),
        }));
    }

    if params.get("id_token")?.is_some() || params.get("token")?.is_some() {
        return Err(unsupported!("implicit and hybrid flows are not supported"));
    }

    Ok(params.clone())
}

/// Validate a JARM response: verify the JWS in the `response`
/// parameter, require `iss`, `aud`, and `exp`, project the remaining
/// string claims as callback parameters, and fall through to
/// [`validate`].
///
/// # Errors
///
/// Returns an error (or the server's OAuth error value) on any failed
/// check.
pub async fn validate_jwt(
    http: &impl HttpClient, server: &AuthorizationServer, client: &Client,
    params: &CallbackParams, expected_state: &ExpectedState,
) -> Result<CallbackParams> {
    let Some(response) = params.get("response")? else {
        return Err(processing!("response is missing the response parameter"));
    };

    let jws = jws::decode(response)?;
    jwt::check_alg(
        jws.header.alg,
        client.authorization_signed_response_alg,
        server.authorization_signing_alg_values_supported.as_deref(),
    )?;

    let key = jwks::verification_key(http, server, &jws.header).await?;
    jws::verify(&jws, &key)?;

    let claims = jwt::parse_payload(&jws.payload)?;
    jwt::require_claims(&claims, &["iss", "aud", "exp"])?;
    jwt::validate_claim_types(&claims)?;
    jwt::validate_issuer(&claims, &server.issuer)?;
    jwt::validate_audience(&claims, &client.client_id, true)?;

    // timestamps and non-string members have no query equivalent
    let unwrapped: CallbackParams = claims
        .iter()
        .filter(|(name, _)| !matches!(name.as_str(), "exp" | "iat" | "nbf" | "aud"))
        .filter_map(|(name, value)| {
            value.as_str().map(|value| (name.clone(), value.to_string()))
        })
        .collect();

    validate(server, client, &unwrapped, expected_state)
}
