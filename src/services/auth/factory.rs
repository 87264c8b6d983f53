//! Factory: build `AuthGate` from application `Config`.
use std::sync::Arc;

use crate::config::{AuthConfig, KeySourceConfig};
use crate::services::auth::{
    AuthGate,
    keys::{KeyCachePolicy, KeyFetchError, KeyResolver, KeySource, RemoteKeySource, StaticKeySource},
    verifier::SignatureVerifier,
};

pub fn build_auth_gate(config: &AuthConfig) -> Result<Arc<AuthGate>, KeyFetchError> {
    let source: Arc<dyn KeySource> = match &config.keys {
        KeySourceConfig::Remote(url) => {
            Arc::new(RemoteKeySource::new(url.clone(), config.jwks_fetch_timeout)?)
        }
        KeySourceConfig::File(path) => Arc::new(StaticKeySource::from_file(path)?),
    };
    tracing::info!(
        keys = %source.describe(),
        issuer = %config.issuer,
        audience = %config.audience,
        algorithm = ?config.algorithm,
        "authorization configured"
    );

    let resolver = KeyResolver::new(
        source,
        KeyCachePolicy {
            ttl: config.jwks_cache_ttl,
            min_refresh: config.jwks_min_refresh,
        },
    );
    let verifier = SignatureVerifier::new(
        config.algorithm,
        &config.issuer,
        &config.audience,
        config.leeway_seconds,
    );

    Ok(Arc::new(AuthGate::new(resolver, verifier)))
}
