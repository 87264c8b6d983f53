use axum::http::HeaderValue;

use crate::services::auth::{
    error::AuthError,
    keys::KeyResolver,
    permissions,
    token,
    verifier::{SignatureVerifier, VerifiedClaims},
};

/// Per-request authorization: bearer extraction → decode → key → verify → permission.
///
/// Holds no per-request state; the key cache inside `KeyResolver` is the only
/// thing shared between calls.
#[derive(Debug)]
pub struct AuthGate {
    keys: KeyResolver,
    verifier: SignatureVerifier,
}

impl AuthGate {
    pub fn new(keys: KeyResolver, verifier: SignatureVerifier) -> Self {
        Self { keys, verifier }
    }

    pub async fn authorize(
        &self,
        authorization: Option<&HeaderValue>,
        required: &str,
    ) -> Result<VerifiedClaims, AuthError> {
        let raw = bearer_token(authorization)?;
        let token = token::decode(raw)?;
        let key = self.keys.resolve(token.kid()).await?;
        let claims = self.verifier.verify(&token, &key).inspect_err(|err| {
            if *err == AuthError::ClaimMismatch {
                let untrusted = token.untrusted_claims();
                tracing::debug!(
                    iss = ?untrusted.get("iss"),
                    aud = ?untrusted.get("aud"),
                    "credential issuer/audience did not match"
                );
            }
        })?;
        permissions::check(&claims, required)?;
        Ok(claims)
    }
}

/// `Bearer <token>`: exactly two whitespace-separated parts, the first literally `Bearer`.
fn bearer_token(authorization: Option<&HeaderValue>) -> Result<&str, AuthError> {
    let value = authorization
        .ok_or(AuthError::MissingAuthorizationHeader)?
        .to_str()
        .map_err(|_| AuthError::MalformedAuthorizationHeader)?;

    let mut parts = value.split_whitespace();
    match (parts.next(), parts.next(), parts.next()) {
        (Some("Bearer"), Some(token), None) => Ok(token),
        _ => Err(AuthError::MalformedAuthorizationHeader),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::auth::testutil::{self, TestKey};
    use serde_json::json;

    fn header(value: &str) -> HeaderValue {
        HeaderValue::from_str(value).unwrap()
    }

    #[test]
    fn extracts_bearer_token() {
        assert_eq!(bearer_token(Some(&header("Bearer abc.def.ghi"))), Ok("abc.def.ghi"));
    }

    #[test]
    fn missing_header_is_reported_as_missing() {
        assert_eq!(bearer_token(None), Err(AuthError::MissingAuthorizationHeader));
    }

    #[test]
    fn rejects_non_bearer_shapes() {
        for value in [
            "",
            "Bearer",
            "Bearer ",
            "bearer abc",
            "Basic dXNlcjpwYXNz",
            "Bearer abc def",
            "Token abc",
        ] {
            assert_eq!(
                bearer_token(Some(&header(value))),
                Err(AuthError::MalformedAuthorizationHeader),
                "{value:?}"
            );
        }
    }

    #[test]
    fn rejects_non_ascii_header_bytes() {
        let value = HeaderValue::from_bytes(b"Bearer \xffabc").unwrap();
        assert_eq!(
            bearer_token(Some(&value)),
            Err(AuthError::MalformedAuthorizationHeader)
        );
    }

    #[tokio::test]
    async fn authorizes_token_with_required_permission() {
        let key = TestKey::new(testutil::KID, 3);
        let gate = testutil::gate_for(&[&key]);
        let raw = key.sign(&testutil::claims_with(&["get:drinks-detail", "post:drinks"]));

        let claims = gate
            .authorize(Some(&header(&format!("Bearer {raw}"))), "post:drinks")
            .await
            .unwrap();
        assert_eq!(claims.subject(), Some("auth0|barista"));
    }

    #[tokio::test]
    async fn unknown_kid_never_succeeds() {
        let trusted = TestKey::new(testutil::KID, 3);
        let stranger = TestKey::new("stranger", 4);
        let gate = testutil::gate_for(&[&trusted]);
        let raw = stranger.sign(&testutil::claims_with(&["delete:drinks"]));

        let err = gate
            .authorize(Some(&header(&format!("Bearer {raw}"))), "delete:drinks")
            .await
            .unwrap_err();
        assert_eq!(
            err,
            AuthError::KeyNotFound {
                kid: "stranger".into()
            }
        );
    }

    #[tokio::test]
    async fn borrowed_kid_with_foreign_key_is_invalid_signature() {
        let trusted = TestKey::new(testutil::KID, 3);
        let forger = TestKey::new(testutil::KID, 5);
        let gate = testutil::gate_for(&[&trusted]);
        let raw = forger.sign(&testutil::claims_with(&["delete:drinks"]));

        let err = gate
            .authorize(Some(&header(&format!("Bearer {raw}"))), "delete:drinks")
            .await
            .unwrap_err();
        assert_eq!(err, AuthError::InvalidSignature);
    }

    #[tokio::test]
    async fn expired_token_is_rejected_before_permission_check() {
        let key = TestKey::new(testutil::KID, 3);
        let gate = testutil::gate_for(&[&key]);
        let mut claims = testutil::claims_with(&["get:drinks-detail"]);
        claims["exp"] = json!(testutil::now() - 60);

        let err = gate
            .authorize(
                Some(&header(&format!("Bearer {}", key.sign(&claims)))),
                "post:drinks",
            )
            .await
            .unwrap_err();
        assert_eq!(err, AuthError::CredentialExpired);
    }

    #[tokio::test]
    async fn malformed_credential_stops_before_key_lookup() {
        let gate = testutil::gate_for(&[]);

        let err = gate
            .authorize(Some(&header("Bearer not-a-jwt")), "get:drinks-detail")
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::MalformedCredential(_)));
    }

    #[tokio::test]
    async fn lacking_permission_is_denied() {
        let key = TestKey::new(testutil::KID, 3);
        let gate = testutil::gate_for(&[&key]);
        let raw = key.sign(&testutil::claims_with(&["get:drinks-detail"]));

        let err = gate
            .authorize(Some(&header(&format!("Bearer {raw}"))), "delete:drinks")
            .await
            .unwrap_err();
        assert_eq!(
            err,
            AuthError::PermissionDenied {
                required: "delete:drinks".into()
            }
        );
    }
}
