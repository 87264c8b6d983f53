/*
 * Responsibility
 * - Authorization pipeline failures (header → decode → key → verify → permission)
 * - Each failure carries the HTTP status and the description shown to clients
 * - The HTTP rendering lives in crate::error, not here
 */
use axum::http::StatusCode;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthError {
    #[error("authorization header is missing")]
    MissingAuthorizationHeader,
    #[error("authorization header is not a bearer token")]
    MalformedAuthorizationHeader,
    #[error("credential is malformed: {0}")]
    MalformedCredential(&'static str),
    #[error("no verification key for kid {kid:?}")]
    KeyNotFound { kid: String },
    #[error("verification keys unavailable: {0}")]
    KeyServiceUnavailable(String),
    #[error("signing algorithm is not accepted")]
    AlgorithmMismatch,
    #[error("credential expired")]
    CredentialExpired,
    #[error("issuer or audience mismatch")]
    ClaimMismatch,
    #[error("invalid signature")]
    InvalidSignature,
    #[error("permissions claim is missing")]
    PermissionsClaimMissing,
    #[error("permission {required:?} not granted")]
    PermissionDenied { required: String },
}

impl AuthError {
    /// 401 for authentication failures, 403 once the caller is known but lacks the permission.
    pub fn status(&self) -> StatusCode {
        match self {
            Self::PermissionsClaimMissing | Self::PermissionDenied { .. } => StatusCode::FORBIDDEN,
            _ => StatusCode::UNAUTHORIZED,
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Self::MissingAuthorizationHeader => "Authorization header is expected.",
            Self::MalformedAuthorizationHeader => "Authorization header must be bearer token.",
            Self::MalformedCredential(_) => "Authorization malformed.",
            Self::KeyNotFound { .. } => "Unable to find the appropriate key.",
            Self::KeyServiceUnavailable(_) => "Unable to fetch verification keys.",
            Self::AlgorithmMismatch => "Token signing algorithm is not accepted.",
            Self::CredentialExpired => "Token expired.",
            Self::ClaimMismatch => "Incorrect claims. Please, check the audience and issuer.",
            Self::InvalidSignature => "Unable to parse authentication token.",
            Self::PermissionsClaimMissing => "Permissions not included in JWT.",
            Self::PermissionDenied { .. } => "Permission not found.",
        }
    }

    /// Stable identifier for logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::MissingAuthorizationHeader => "missing_authorization_header",
            Self::MalformedAuthorizationHeader => "malformed_authorization_header",
            Self::MalformedCredential(_) => "malformed_credential",
            Self::KeyNotFound { .. } => "key_not_found",
            Self::KeyServiceUnavailable(_) => "key_service_unavailable",
            Self::AlgorithmMismatch => "algorithm_mismatch",
            Self::CredentialExpired => "credential_expired",
            Self::ClaimMismatch => "claim_mismatch",
            Self::InvalidSignature => "invalid_signature",
            Self::PermissionsClaimMissing => "permissions_claim_missing",
            Self::PermissionDenied { .. } => "permission_denied",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn permission_failures_are_forbidden() {
        assert_eq!(AuthError::PermissionsClaimMissing.status(), StatusCode::FORBIDDEN);
        assert_eq!(
            AuthError::PermissionDenied {
                required: "delete:drinks".into()
            }
            .status(),
            StatusCode::FORBIDDEN
        );
    }

    #[test]
    fn authentication_failures_are_unauthorized() {
        let failures = [
            AuthError::MissingAuthorizationHeader,
            AuthError::MalformedAuthorizationHeader,
            AuthError::MalformedCredential("segments"),
            AuthError::KeyNotFound { kid: "k1".into() },
            AuthError::KeyServiceUnavailable("timeout".into()),
            AuthError::AlgorithmMismatch,
            AuthError::CredentialExpired,
            AuthError::ClaimMismatch,
            AuthError::InvalidSignature,
        ];
        for failure in failures {
            assert_eq!(failure.status(), StatusCode::UNAUTHORIZED, "{failure:?}");
        }
    }
}
