use jsonwebtoken::{
    Algorithm, Validation,
    errors::{Error as JwtError, ErrorKind},
};
use serde::Deserialize;
use serde_json::{Map, Value};

use crate::services::auth::{error::AuthError, keys::ResolvedKey, token::UnverifiedToken};

/// Claims as they appear on the wire. Private: only `SignatureVerifier` turns
/// them into `VerifiedClaims`, after the signature checked out.
#[derive(Debug, Clone, Deserialize)]
struct ClaimSet {
    // Optional here so a missing claim reaches `Validation` and is reported as
    // `MissingRequiredClaim` instead of a deserialization error.
    #[serde(default)]
    iss: Option<String>,
    #[serde(default)]
    sub: Option<String>,
    #[serde(default)]
    exp: Option<u64>,
    #[serde(default)]
    permissions: Option<Vec<String>>,
    #[serde(flatten)]
    other: Map<String, Value>,
}

/// Claims of a credential whose signature, issuer, audience and expiry were checked.
#[derive(Debug, Clone)]
pub struct VerifiedClaims {
    issuer: String,
    subject: Option<String>,
    expires_at: u64,
    permissions: Option<Vec<String>>,
    other: Map<String, Value>,
}

impl VerifiedClaims {
    pub fn issuer(&self) -> &str {
        &self.issuer
    }

    pub fn subject(&self) -> Option<&str> {
        self.subject.as_deref()
    }

    pub fn expires_at(&self) -> u64 {
        self.expires_at
    }

    /// `None` when the claim is absent, which is not the same as an empty list.
    pub fn permissions(&self) -> Option<&[String]> {
        self.permissions.as_deref()
    }

    /// Any claim not modelled above (`aud`, `azp`, `scope`, ...).
    pub fn claim(&self, name: &str) -> Option<&Value> {
        self.other.get(name)
    }
}

impl TryFrom<ClaimSet> for VerifiedClaims {
    type Error = AuthError;

    fn try_from(claims: ClaimSet) -> Result<Self, Self::Error> {
        let (Some(issuer), Some(expires_at)) = (claims.iss, claims.exp) else {
            return Err(AuthError::ClaimMismatch);
        };
        Ok(Self {
            issuer,
            subject: claims.sub,
            expires_at,
            permissions: claims.permissions,
            other: claims.other,
        })
    }
}

#[derive(Debug, Clone)]
pub struct SignatureVerifier {
    algorithm: Algorithm,
    validation: Validation,
}

impl SignatureVerifier {
    pub fn new(algorithm: Algorithm, issuer: &str, audience: &str, leeway_seconds: u64) -> Self {
        let mut validation = Validation::new(algorithm);
        validation.set_issuer(&[issuer]);
        validation.set_audience(&[audience]);
        validation.set_required_spec_claims(&["exp", "iss", "aud"]);
        validation.leeway = leeway_seconds;

        Self {
            algorithm,
            validation,
        }
    }

    pub fn verify(
        &self,
        token: &UnverifiedToken<'_>,
        key: &ResolvedKey,
    ) -> Result<VerifiedClaims, AuthError> {
        // Pin the algorithm before touching the key: header-driven algorithm
        // selection is how HS/RS confusion happens.
        if token.header().alg != self.algorithm {
            return Err(AuthError::AlgorithmMismatch);
        }
        if let Some(pinned) = key.algorithm
            && pinned != self.algorithm
        {
            return Err(AuthError::AlgorithmMismatch);
        }

        let data =
            jsonwebtoken::decode::<ClaimSet>(token.raw(), &key.decoding_key, &self.validation)
                .map_err(classify)?;

        VerifiedClaims::try_from(data.claims)
    }
}

fn classify(err: JwtError) -> AuthError {
    match err.kind() {
        ErrorKind::ExpiredSignature => AuthError::CredentialExpired,
        ErrorKind::InvalidIssuer
        | ErrorKind::InvalidAudience
        | ErrorKind::ImmatureSignature
        | ErrorKind::MissingRequiredClaim(_) => AuthError::ClaimMismatch,
        ErrorKind::InvalidAlgorithm => AuthError::AlgorithmMismatch,
        ErrorKind::InvalidToken | ErrorKind::Base64(_) | ErrorKind::Json(_) | ErrorKind::Utf8(_) => {
            AuthError::MalformedCredential("claims")
        }
        _ => AuthError::InvalidSignature,
    }
}
