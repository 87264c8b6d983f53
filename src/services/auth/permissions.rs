use crate::services::auth::{error::AuthError, verifier::VerifiedClaims};

/// Exact, case-sensitive membership of `required` in the `permissions` claim.
pub fn check(claims: &VerifiedClaims, required: &str) -> Result<(), AuthError> {
    let granted = claims
        .permissions()
        .ok_or(AuthError::PermissionsClaimMissing)?;

    if granted.iter().any(|permission| permission == required) {
        Ok(())
    } else {
        Err(AuthError::PermissionDenied {
            required: required.to_string(),
        })
    }
}
