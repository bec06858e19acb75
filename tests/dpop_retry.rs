//! DPoP nonce self-correction: a rejected request primes the nonce
//! cache, and the natural retry carries the fresh nonce.

use std::sync::Mutex;

use bytes::Bytes;
use openid_rp::dpop::DpopOptions;
use openid_rp::endpoint::{RequestOptions, par};
use openid_rp::jose::jwk::{PrivateKey, SigningKey};
use openid_rp::provider::HttpClient;
use openid_rp::types::{AuthorizationServer, Client, TokenEndpointAuthMethod};
use rand_core::OsRng;
use serde_json::{Value, json};

const ISSUER: &str = "https://dpop-retry.example";

/// Rejects proofs without its current nonce, as a DPoP server does.
struct NonceGate {
    nonce: &'static str,
    seen: Mutex<Vec<Option<String>>>,
}

impl NonceGate {
    fn proof_nonce(request: &http::Request<Bytes>) -> Option<String> {
        let proof = request.headers().get("dpop")?.to_str().ok()?;
        let payload = proof.split('.').nth(1)?;
        let decoded = openid_rp::core::codec::b64url_decode(payload).ok()?;
        let claims: Value = serde_json::from_slice(&decoded).ok()?;
        claims.get("nonce").and_then(Value::as_str).map(ToString::to_string)
    }
}

impl HttpClient for NonceGate {
    async fn fetch(
        &self, request: http::Request<Bytes>,
    ) -> anyhow::Result<http::Response<Bytes>> {
        let nonce = Self::proof_nonce(&request);
        self.seen.lock().expect("lock poisoned").push(nonce.clone());

        let response = if nonce.as_deref() == Some(self.nonce) {
            http::Response::builder().status(201).body(Bytes::from(
                json!({"request_uri": "urn:ietf:params:oauth:request_uri:x", "expires_in": 60})
                    .to_string(),
            ))
        } else {
            http::Response::builder()
                .status(400)
                .header("DPoP-Nonce", self.nonce)
                .body(Bytes::from(json!({"error": "use_dpop_nonce"}).to_string()))
        };
        Ok(response.expect("should build response"))
    }
}

#[tokio::test]
async fn reissue_carries_recorded_nonce() {
    let server = AuthorizationServer {
        issuer: ISSUER.to_string(),
        token_endpoint: Some(format!("{ISSUER}/token")),
        pushed_authorization_request_endpoint: Some(format!("{ISSUER}/par")),
        ..AuthorizationServer::default()
    };
    let client = Client {
        client_id: "c".to_string(),
        token_endpoint_auth_method: TokenEndpointAuthMethod::None,
        ..Client::default()
    };
    let http = NonceGate {
        nonce: "N1",
        seen: Mutex::new(Vec::new()),
    };

    let key = SigningKey::Es256(p256::ecdsa::SigningKey::random(&mut OsRng));
    let dpop = DpopOptions::new(PrivateKey::new(key, None).expect("valid key"));
    let parameters = vec![("response_type".to_string(), "code".to_string())];

    // first attempt: no nonce on record, the server rejects and
    // publishes one
    let options = RequestOptions {
        dpop: Some(&dpop),
        ..RequestOptions::default()
    };
    let err = par::push(&http, &server, &client, &parameters, &options)
        .await
        .expect_err("first attempt rejected");
    assert_eq!(err.oauth().expect("protocol error").error, "use_dpop_nonce");

    // the retry needs no special handling
    let pushed = par::push(&http, &server, &client, &parameters, &options)
        .await
        .expect("retry should succeed");
    assert_eq!(pushed.expires_in, 60);

    let seen = http.seen.lock().expect("lock poisoned");
    assert_eq!(*seen, vec![None, Some("N1".to_string())]);
}
