//! Verification key resolution (JWKS).
//!
//! The key set is process-wide and read-mostly:
//! - empty at startup, fetched lazily on the first lookup
//! - re-fetched once it is older than `ttl`; if that fetch fails the stale set keeps serving
//! - an unknown `kid` triggers one extra fetch, at most once per `min_refresh`
//!
//! The lock is never held across a fetch. Two cold lookups may both fetch; the
//! documents are identical so the last writer wins.

use std::{fmt, path::Path, sync::Arc, time::Duration};

use async_trait::async_trait;
use jsonwebtoken::{
    Algorithm, DecodingKey,
    jwk::{Jwk, JwkSet, KeyAlgorithm, PublicKeyUse},
};
use thiserror::Error;
use tokio::{sync::RwLock, time::Instant};
use tracing::{info, warn};
use url::Url;

use crate::services::auth::error::AuthError;

#[derive(Debug, Error)]
pub enum KeyFetchError {
    #[error("jwks url must use https (http only for localhost): {0}")]
    InsecureUrl(String),
    #[error("jwks request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("jwks endpoint answered {0}")]
    Status(reqwest::StatusCode),
    #[error("jwks file unreadable: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid jwks document: {0}")]
    Document(#[from] serde_json::Error),
}

/// Where the authority's key set comes from.
#[async_trait]
pub trait KeySource: Send + Sync {
    // For logs only.
    fn describe(&self) -> String;

    async fn fetch(&self) -> Result<JwkSet, KeyFetchError>;
}

/// The authority's published JWKS endpoint.
pub struct RemoteKeySource {
    client: reqwest::Client,
    url: Url,
}

impl RemoteKeySource {
    pub fn new(url: Url, timeout: Duration) -> Result<Self, KeyFetchError> {
        let local = matches!(url.host_str(), Some("localhost") | Some("127.0.0.1"));
        match url.scheme() {
            "https" => {}
            "http" if local => {}
            _ => return Err(KeyFetchError::InsecureUrl(url.to_string())),
        }

        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { client, url })
    }
}

#[async_trait]
impl KeySource for RemoteKeySource {
    fn describe(&self) -> String {
        self.url.to_string()
    }

    async fn fetch(&self) -> Result<JwkSet, KeyFetchError> {
        let response = self.client.get(self.url.clone()).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(KeyFetchError::Status(status));
        }
        let body = response.bytes().await?;
        Ok(serde_json::from_slice(&body)?)
    }
}

/// A fixed key set, loaded once (offline development, tests).
pub struct StaticKeySource {
    origin: String,
    keys: JwkSet,
}

impl StaticKeySource {
    pub fn new(keys: JwkSet) -> Self {
        Self {
            origin: "inline".to_string(),
            keys,
        }
    }

    pub fn from_file(path: &Path) -> Result<Self, KeyFetchError> {
        let bytes = std::fs::read(path)?;
        let keys = serde_json::from_slice(&bytes)?;
        Ok(Self {
            origin: path.display().to_string(),
            ..Self::new(keys)
        })
    }
}

#[async_trait]
impl KeySource for StaticKeySource {
    fn describe(&self) -> String {
        self.origin.clone()
    }

    async fn fetch(&self) -> Result<JwkSet, KeyFetchError> {
        Ok(self.keys.clone())
    }
}

/// Key material for one `kid`, ready for signature verification.
#[derive(Clone)]
pub struct ResolvedKey {
    pub kid: String,
    // `alg` pinned by the key set entry, when it names a signing algorithm.
    pub algorithm: Option<Algorithm>,
    pub decoding_key: DecodingKey,
}

impl fmt::Debug for ResolvedKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResolvedKey")
            .field("kid", &self.kid)
            .field("algorithm", &self.algorithm)
            .finish()
    }
}

#[derive(Clone)]
struct CachedKeys {
    keys: Arc<JwkSet>,
    fetched_at: Instant,
}

#[derive(Debug, Clone, Copy)]
pub struct KeyCachePolicy {
    pub ttl: Duration,
    pub min_refresh: Duration,
}

impl Default for KeyCachePolicy {
    fn default() -> Self {
        Self {
            ttl: Duration::from_secs(600),
            min_refresh: Duration::from_secs(30),
        }
    }
}

pub struct KeyResolver {
    source: Arc<dyn KeySource>,
    policy: KeyCachePolicy,
    cache: RwLock<Option<CachedKeys>>,
}

impl fmt::Debug for KeyResolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyResolver")
            .field("source", &self.source.describe())
            .field("policy", &self.policy)
            .finish()
    }
}

impl KeyResolver {
    pub fn new(source: Arc<dyn KeySource>, policy: KeyCachePolicy) -> Self {
        Self {
            source,
            policy,
            cache: RwLock::new(None),
        }
    }

    pub async fn resolve(&self, kid: &str) -> Result<ResolvedKey, AuthError> {
        let cached = self.cache.read().await.clone();

        let keys = match cached {
            Some(cached) if cached.fetched_at.elapsed() < self.policy.ttl => {
                if let Some(jwk) = signing_key(&cached.keys, kid) {
                    return to_resolved(kid, jwk);
                }
                if cached.fetched_at.elapsed() < self.policy.min_refresh {
                    return Err(AuthError::KeyNotFound {
                        kid: kid.to_string(),
                    });
                }
                info!(kid, "unknown kid, refreshing verification keys");
                self.refresh().await?
            }
            Some(stale) => match self.refresh().await {
                Ok(keys) => keys,
                Err(err) => {
                    warn!(error = %err, "key refresh failed, serving stale verification keys");
                    stale.keys
                }
            },
            None => self.refresh().await?,
        };

        match signing_key(&keys, kid) {
            Some(jwk) => to_resolved(kid, jwk),
            None => Err(AuthError::KeyNotFound {
                kid: kid.to_string(),
            }),
        }
    }

    async fn refresh(&self) -> Result<Arc<JwkSet>, AuthError> {
        let keys = self.source.fetch().await.map_err(|err| {
            warn!(source = %self.source.describe(), error = %err, "failed to fetch verification keys");
            AuthError::KeyServiceUnavailable(err.to_string())
        })?;
        info!(
            source = %self.source.describe(),
            keys = keys.keys.len(),
            "fetched verification keys"
        );

        let keys = Arc::new(keys);
        *self.cache.write().await = Some(CachedKeys {
            keys: keys.clone(),
            fetched_at: Instant::now(),
        });
        Ok(keys)
    }
}

// Entries published for encryption (`"use": "enc"`, or an encryption `alg`)
// never verify signatures.
fn signing_key<'a>(keys: &'a JwkSet, kid: &str) -> Option<&'a Jwk> {
    keys.keys.iter().find(|jwk| {
        jwk.common.key_id.as_deref() == Some(kid)
            && !matches!(jwk.common.public_key_use, Some(PublicKeyUse::Encryption))
            && jwk
                .common
                .key_algorithm
                .as_ref()
                .is_none_or(|alg| signing_algorithm(alg).is_some())
    })
}

fn signing_algorithm(alg: &KeyAlgorithm) -> Option<Algorithm> {
    alg.to_string().parse::<Algorithm>().ok()
}

fn to_resolved(kid: &str, jwk: &Jwk) -> Result<ResolvedKey, AuthError> {
    let decoding_key = DecodingKey::from_jwk(jwk).map_err(|err| {
        warn!(kid, error = %err, "verification key is unusable");
        AuthError::KeyNotFound {
            kid: kid.to_string(),
        }
    })?;

    let algorithm = jwk.common.key_algorithm.as_ref().and_then(signing_algorithm);

    Ok(ResolvedKey {
        kid: kid.to_string(),
        algorithm,
        decoding_key,
    })
}
