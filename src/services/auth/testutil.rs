//! Test helpers: Ed25519 signing keys, their JWKs, and signed access tokens.

use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use ed25519_dalek::SigningKey;
use jsonwebtoken::{Algorithm, EncodingKey, Header, jwk::JwkSet};
use serde_json::{Value, json};
use std::sync::Arc;

use crate::services::auth::{
    AuthGate,
    keys::{KeyCachePolicy, KeyResolver, StaticKeySource},
    verifier::SignatureVerifier,
};

pub const ISSUER: &str = "https://coffee-shop.auth.example/";
pub const AUDIENCE: &str = "drinks";
pub const KID: &str = "test-key-1";

pub struct TestKey {
    pub kid: String,
    signing: SigningKey,
}

impl TestKey {
    pub fn new(kid: &str, seed: u8) -> Self {
        Self {
            kid: kid.to_string(),
            signing: SigningKey::from_bytes(&[seed; 32]),
        }
    }

    pub fn jwk(&self) -> Value {
        json!({
            "kty": "OKP",
            "crv": "Ed25519",
            "use": "sig",
            "alg": "EdDSA",
            "kid": self.kid,
            "x": URL_SAFE_NO_PAD.encode(self.signing.verifying_key().to_bytes()),
        })
    }

    pub fn sign(&self, claims: &Value) -> String {
        self.sign_with_kid(&self.kid, claims)
    }

    pub fn sign_with_kid(&self, kid: &str, claims: &Value) -> String {
        let mut header = Header::new(Algorithm::EdDSA);
        header.kid = Some(kid.to_string());
        let key = EncodingKey::from_ed_der(&self.pkcs8_der());
        jsonwebtoken::encode(&header, claims, &key).expect("sign test token")
    }

    // PKCS#8 v1 wrapper around the raw 32-byte seed.
    fn pkcs8_der(&self) -> Vec<u8> {
        let mut der = vec![
            0x30, 0x2e, 0x02, 0x01, 0x00, 0x30, 0x05, 0x06, 0x03, 0x2b, 0x65, 0x70, 0x04, 0x22,
            0x04, 0x20,
        ];
        der.extend_from_slice(&self.signing.to_bytes());
        der
    }
}

pub fn key_set(keys: &[&TestKey]) -> JwkSet {
    serde_json::from_value(json!({
        "keys": keys.iter().map(|key| key.jwk()).collect::<Vec<_>>()
    }))
    .expect("test jwks")
}

pub fn now() -> i64 {
    chrono::Utc::now().timestamp()
}

/// Valid registered claims for the test issuer/audience, expiring in an hour.
pub fn claims_with(permissions: &[&str]) -> Value {
    json!({
        "iss": ISSUER,
        "aud": AUDIENCE,
        "sub": "auth0|barista",
        "iat": now(),
        "exp": now() + 3600,
        "permissions": permissions,
    })
}

pub fn verifier() -> SignatureVerifier {
    SignatureVerifier::new(Algorithm::EdDSA, ISSUER, AUDIENCE, 0)
}

pub fn gate_for(keys: &[&TestKey]) -> AuthGate {
    let resolver = KeyResolver::new(
        Arc::new(StaticKeySource::new(key_set(keys))),
        KeyCachePolicy::default(),
    );
    AuthGate::new(resolver, verifier())
}
