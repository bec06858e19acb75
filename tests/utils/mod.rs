//! Shared fixtures: a signing keyring standing in for the server's key
//! material, and a canned-route HTTP provider.
#![allow(dead_code)]

use bytes::Bytes;
use openid_rp::jose::jwa::JwsAlg;
use openid_rp::jose::jwk::{Jwk, PrivateKey, SigningKey};
use openid_rp::jose::jws::{self, ProtectedHeader};
use openid_rp::provider::HttpClient;
use rand_core::OsRng;
use serde_json::{Value, json};

pub struct Keyring {
    pub key: PrivateKey,
}

impl Keyring {
    pub fn new(kid: &str) -> Self {
        let signing = SigningKey::Es256(p256::ecdsa::SigningKey::random(&mut OsRng));
        Self {
            key: PrivateKey::new(signing, Some(kid.to_string())).expect("valid key"),
        }
    }

    pub fn public_jwk(&self) -> Jwk {
        let mut jwk = self.key.key.public_jwk().expect("should project");
        jwk.kid.clone_from(&self.key.kid);
        jwk
    }

    pub fn jwks_body(&self) -> String {
        json!({"keys": [self.public_jwk()]}).to_string()
    }

    /// Sign a claim set as an ES256 JWT under this keyring's `kid`.
    pub fn sign(&self, claims: &Value) -> String {
        self.sign_with_typ(claims, None)
    }

    pub fn sign_with_typ(&self, claims: &Value, typ: Option<&str>) -> String {
        let mut header = ProtectedHeader::new(JwsAlg::ES256);
        header.kid.clone_from(&self.key.kid);
        header.typ = typ.map(ToString::to_string);
        let payload = serde_json::to_vec(claims).expect("should serialize");
        jws::sign(&header, &payload, &self.key.key).expect("should sign")
    }
}

pub struct Route {
    pub path: String,
    pub status: u16,
    pub content_type: String,
    pub body: String,
}

impl Route {
    pub fn json(path: &str, status: u16, body: String) -> Self {
        Self {
            path: path.to_string(),
            status,
            content_type: "application/json".to_string(),
            body,
        }
    }
}

/// Serves a fixed route table; everything else is a transport error.
pub struct TestServer(pub Vec<Route>);

impl HttpClient for TestServer {
    async fn fetch(
        &self, request: http::Request<Bytes>,
    ) -> anyhow::Result<http::Response<Bytes>> {
        let path = request.uri().path().to_string();
        let route = self
            .0
            .iter()
            .find(|route| route.path == path)
            .ok_or_else(|| anyhow::anyhow!("no route for {path}"))?;
        Ok(http::Response::builder()
            .status(route.status)
            .header(http::header::CONTENT_TYPE, &route.content_type)
            .body(Bytes::from(route.body.clone()))
            .expect("should build response"))
    }
}

pub fn unix_now() -> i64 {
    chrono::Utc::now().timestamp()
}
