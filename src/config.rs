/*
 * Responsibility
 * - Read environment (optionally .env) once at startup
 * - Validate values; anything missing or unparsable fails startup
 * - Derive issuer / JWKS URL from AUTH_DOMAIN when they are not given explicitly
 */
use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use jsonwebtoken::Algorithm;
use thiserror::Error;
use url::Url;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnv {
    Development,
    Production,
}

impl AppEnv {
    fn parse(value: Option<String>) -> Self {
        match value
            .unwrap_or_else(|| "development".to_string())
            .to_ascii_lowercase()
            .as_str()
        {
            "production" | "prod" => Self::Production,
            _ => Self::Development,
        }
    }

    pub fn is_production(&self) -> bool {
        matches!(self, Self::Production)
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("missing configuration: {0}")]
    Missing(&'static str),
    #[error("invalid configuration: {0}")]
    Invalid(&'static str),
}

/// Where drinks are stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Storage {
    Postgres { url: String, max_connections: u32 },
    Memory,
}

/// Where verification keys come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeySourceConfig {
    Remote(Url),
    File(PathBuf),
}

#[derive(Debug, Clone)]
pub struct AuthConfig {
    pub issuer: String,
    pub audience: String,
    pub algorithm: Algorithm,
    pub leeway_seconds: u64,
    pub keys: KeySourceConfig,
    pub jwks_cache_ttl: Duration,
    pub jwks_min_refresh: Duration,
    pub jwks_fetch_timeout: Duration,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub addr: SocketAddr,
    pub app_env: AppEnv,
    pub cors_allowed_origins: Vec<String>,
    pub request_timeout: Duration,
    pub request_body_limit: usize,

    pub storage: Storage,
    pub auth: AuthConfig,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let port: u16 = parse_or(&lookup, "PORT", 3000)?;
        let addr = SocketAddr::from_str(&format!("0.0.0.0:{}", port))
            .map_err(|_| ConfigError::Invalid("PORT"))?;

        let app_env = AppEnv::parse(lookup("APP_ENV"));

        let cors_allowed_origins = lookup("CORS_ALLOWED_ORIGINS")
            .unwrap_or_default()
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>();

        let request_timeout = Duration::from_secs(parse_or(&lookup, "REQUEST_TIMEOUT_SECONDS", 30)?);
        let request_body_limit = parse_or(&lookup, "REQUEST_BODY_LIMIT_BYTES", 1024 * 1024)?;

        let database_url = lookup("DATABASE_URL").ok_or(ConfigError::Missing("DATABASE_URL"))?;
        let storage = if database_url.starts_with("memory://") {
            Storage::Memory
        } else {
            Storage::Postgres {
                url: database_url,
                max_connections: parse_or(&lookup, "DATABASE_MAX_CONNECTIONS", 5)?,
            }
        };

        let auth = AuthConfig::from_lookup(&lookup)?;

        Ok(Self {
            addr,
            app_env,
            cors_allowed_origins,
            request_timeout,
            request_body_limit,
            storage,
            auth,
        })
    }
}

impl AuthConfig {
    fn from_lookup(lookup: &impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let domain = lookup("AUTH_DOMAIN")
            .map(|d| d.trim().trim_end_matches('/').to_string())
            .filter(|d| !d.is_empty());

        // Auth0-style issuers carry the trailing slash.
        let issuer = match (lookup("AUTH_ISSUER"), &domain) {
            (Some(issuer), _) => issuer,
            (None, Some(domain)) => format!("https://{domain}/"),
            (None, None) => return Err(ConfigError::Missing("AUTH_ISSUER or AUTH_DOMAIN")),
        };

        let audience = lookup("AUTH_AUDIENCE").ok_or(ConfigError::Missing("AUTH_AUDIENCE"))?;

        let algorithm = match lookup("AUTH_ALGORITHM") {
            Some(alg) => {
                Algorithm::from_str(alg.trim()).map_err(|_| ConfigError::Invalid("AUTH_ALGORITHM"))?
            }
            None => Algorithm::RS256,
        };

        let keys = match (lookup("AUTH_JWKS_FILE"), lookup("AUTH_JWKS_URL"), &domain) {
            (Some(path), _, _) => KeySourceConfig::File(PathBuf::from(path)),
            (None, Some(url), _) => KeySourceConfig::Remote(
                Url::parse(&url).map_err(|_| ConfigError::Invalid("AUTH_JWKS_URL"))?,
            ),
            (None, None, Some(domain)) => KeySourceConfig::Remote(
                Url::parse(&format!("https://{domain}/.well-known/jwks.json"))
                    .map_err(|_| ConfigError::Invalid("AUTH_DOMAIN"))?,
            ),
            (None, None, None) => return Err(ConfigError::Missing("AUTH_JWKS_URL or AUTH_DOMAIN")),
        };

        Ok(Self {
            issuer,
            audience,
            algorithm,
            leeway_seconds: parse_or(lookup, "ACCESS_TOKEN_LEEWAY_SECONDS", 60)?,
            keys,
            jwks_cache_ttl: Duration::from_secs(parse_or(lookup, "JWKS_CACHE_TTL_SECONDS", 600)?),
            jwks_min_refresh: Duration::from_secs(parse_or(lookup, "JWKS_MIN_REFRESH_SECONDS", 30)?),
            jwks_fetch_timeout: Duration::from_secs(parse_or(
                lookup,
                "JWKS_FETCH_TIMEOUT_SECONDS",
                5,
            )?),
        })
    }
}

// Unset → default; set but unparsable → error (a typo should not silently fall back).
fn parse_or<T: FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &'static str,
    default: T,
) -> Result<T, ConfigError> {
    match lookup(key) {
        Some(raw) => raw.trim().parse().map_err(|_| ConfigError::Invalid(key)),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(pairs: &[(&str, &str)]) -> Result<Config, ConfigError> {
        let env: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| env.get(key).cloned())
    }

    const MINIMAL: &[(&str, &str)] = &[
        ("DATABASE_URL", "postgres://localhost/drinks"),
        ("AUTH_DOMAIN", "coffee-shop.eu.auth0.com"),
        ("AUTH_AUDIENCE", "drinks"),
    ];

    #[test]
    fn minimal_environment_uses_defaults() {
        let config = config(MINIMAL).unwrap();

        assert_eq!(config.addr.port(), 3000);
        assert_eq!(config.app_env, AppEnv::Development);
        assert_eq!(config.request_timeout, Duration::from_secs(30));
        assert_eq!(config.request_body_limit, 1024 * 1024);
        assert_eq!(
            config.storage,
            Storage::Postgres {
                url: "postgres://localhost/drinks".into(),
                max_connections: 5
            }
        );
        assert_eq!(config.auth.issuer, "https://coffee-shop.eu.auth0.com/");
        assert_eq!(config.auth.algorithm, Algorithm::RS256);
        assert_eq!(config.auth.leeway_seconds, 60);
        assert_eq!(config.auth.jwks_cache_ttl, Duration::from_secs(600));
        assert_eq!(
            config.auth.keys,
            KeySourceConfig::Remote(
                Url::parse("https://coffee-shop.eu.auth0.com/.well-known/jwks.json").unwrap()
            )
        );
    }

    #[test]
    fn explicit_values_override_derived_ones() {
        let mut pairs = MINIMAL.to_vec();
        pairs.extend([
            ("AUTH_ISSUER", "https://issuer.example"),
            ("AUTH_JWKS_URL", "http://localhost:9000/jwks.json"),
            ("AUTH_ALGORITHM", "EdDSA"),
            ("APP_ENV", "prod"),
            ("CORS_ALLOWED_ORIGINS", "https://a.example, ,https://b.example"),
            ("PORT", "8080"),
        ]);
        let config = config(&pairs).unwrap();

        assert_eq!(config.auth.issuer, "https://issuer.example");
        assert_eq!(config.auth.algorithm, Algorithm::EdDSA);
        assert!(config.app_env.is_production());
        assert_eq!(
            config.cors_allowed_origins,
            vec!["https://a.example", "https://b.example"]
        );
        assert_eq!(config.addr.port(), 8080);
        assert_eq!(
            config.auth.keys,
            KeySourceConfig::Remote(Url::parse("http://localhost:9000/jwks.json").unwrap())
        );
    }

    #[test]
    fn jwks_file_wins_over_url() {
        let mut pairs = MINIMAL.to_vec();
        pairs.push(("AUTH_JWKS_FILE", "./jwks.json"));
        let config = config(&pairs).unwrap();

        assert_eq!(
            config.auth.keys,
            KeySourceConfig::File(PathBuf::from("./jwks.json"))
        );
    }

    #[test]
    fn memory_storage_is_selected_by_url() {
        let mut pairs = MINIMAL.to_vec();
        pairs[0] = ("DATABASE_URL", "memory://");
        assert_eq!(config(&pairs).unwrap().storage, Storage::Memory);
    }

    #[test]
    fn required_values_are_enforced() {
        assert_eq!(
            config(&MINIMAL[1..]).unwrap_err(),
            ConfigError::Missing("DATABASE_URL")
        );
        assert_eq!(
            config(&[MINIMAL[0], MINIMAL[1]]).unwrap_err(),
            ConfigError::Missing("AUTH_AUDIENCE")
        );
        assert_eq!(
            config(&[MINIMAL[0], MINIMAL[2]]).unwrap_err(),
            ConfigError::Missing("AUTH_ISSUER or AUTH_DOMAIN")
        );
    }

    #[test]
    fn unparsable_values_are_rejected() {
        let mut pairs = MINIMAL.to_vec();
        pairs.push(("JWKS_CACHE_TTL_SECONDS", "ten minutes"));
        assert_eq!(
            config(&pairs).unwrap_err(),
            ConfigError::Invalid("JWKS_CACHE_TTL_SECONDS")
        );

        let mut pairs = MINIMAL.to_vec();
        pairs.push(("AUTH_ALGORITHM", "none"));
        assert_eq!(
            config(&pairs).unwrap_err(),
            ConfigError::Invalid("AUTH_ALGORITHM")
        );
    }
}
