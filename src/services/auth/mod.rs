pub mod error;
pub mod factory;
pub mod gate;
pub mod keys;
pub mod permissions;
pub mod token;
pub mod verifier;

#[cfg(test)]
pub mod testutil;

pub use error::AuthError;
pub use factory::build_auth_gate;
pub use gate::AuthGate;
pub use verifier::VerifiedClaims;
