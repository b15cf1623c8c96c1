//! Process configuration loaded from the environment.
//!
//! Everything is read once at startup. Invalid values are reported as
//! `AppError::Config` so the binary exits before binding a socket.

use std::env;
use std::fmt;
use std::time::Duration;

use uuid::Uuid;

use crate::auth::subject::SubjectMapping;
use crate::error::AppError;
use crate::keys::cache::MIN_REFRESH_INTERVAL;
use crate::services::exchange::IssuerPolicy;
use crate::state::security_config::{SecurityConfig, DEFAULT_LOCAL_ISSUER};

const DEFAULT_HOST: &str = "0.0.0.0";
const DEFAULT_PORT: u16 = 3001;
const DEFAULT_FETCH_TIMEOUT_SECS: u64 = 5;
const DEFAULT_CACHE_TTL_SECS: u64 = 300;

/// Resolved process configuration.
///
/// | Variable | Field | Default |
/// |---|---|---|
/// | `BRIDGE_HOST` / `BRIDGE_PORT` | `host` / `port` | `0.0.0.0` / `3001` |
/// | `OUTSETA_JWKS_URL` or `OUTSETA_DOMAIN` | `jwks_url` | required |
/// | `OUTSETA_ISSUER` | `expected_issuer` | derived from the domain |
/// | `SUPABASE_JWT_SECRET`, `SUPABASE_ISSUER` | `security` | secret required |
/// | `SUBJECT_MAPPING`, `SUBJECT_NAMESPACE` | `subject_mapping` | derived v5 |
/// | `JWKS_FETCH_TIMEOUT_SECS` | `fetch_timeout` | 5 |
/// | `JWKS_CACHE_TTL_SECS` | `cache_ttl` | 300 |
/// | `JWKS_MIN_REFRESH_SECS` | `min_refresh_interval` | 10 |
/// | `CLOCK_SKEW_SECS` | `leeway_secs` | 0 |
/// | `CORS_ALLOWED_ORIGINS` | `allowed_origins` | any |
#[derive(Clone)]
pub struct BridgeConfig {
    pub host: String,
    pub port: u16,
    pub jwks_url: String,
    /// Compared to the inbound `iss`; `None` skips the check
    pub expected_issuer: Option<String>,
    pub security: SecurityConfig,
    pub subject_mapping: SubjectMapping,
    /// Bounds each key set fetch end to end
    pub fetch_timeout: Duration,
    /// Zero disables key set caching
    pub cache_ttl: Duration,
    pub min_refresh_interval: Duration,
    pub leeway_secs: u64,
    /// `None` allows any origin
    pub allowed_origins: Option<Vec<String>>,
}

impl BridgeConfig {
    /// Load from the process environment.
    pub fn from_env() -> Result<Self, AppError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load from an arbitrary key lookup. Blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, AppError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let host = get("BRIDGE_HOST").unwrap_or_else(|| DEFAULT_HOST.to_string());
        let port = match get("BRIDGE_PORT") {
            Some(raw) => raw
                .parse::<u16>()
                .map_err(|_| AppError::config("BRIDGE_PORT must be a valid port number"))?,
            None => DEFAULT_PORT,
        };

        // Bare host expected; a pasted URL is reduced to its host.
        let domain = get("OUTSETA_DOMAIN").map(|d| {
            let host = d
                .strip_prefix("https://")
                .or_else(|| d.strip_prefix("http://"))
                .unwrap_or(&d);
            host.trim_end_matches('/').to_string()
        });
        let jwks_url = match (get("OUTSETA_JWKS_URL"), &domain) {
            (Some(url), _) => url,
            (None, Some(domain)) => format!("https://{domain}/.well-known/jwks"),
            (None, None) => {
                return Err(AppError::config(
                    "OUTSETA_JWKS_URL or OUTSETA_DOMAIN must be set",
                ))
            }
        };
        if !jwks_url.starts_with("https://") && !jwks_url.starts_with("http://") {
            return Err(AppError::config("OUTSETA_JWKS_URL must be an http(s) URL"));
        }

        let expected_issuer = get("OUTSETA_ISSUER")
            .or_else(|| domain.as_ref().map(|domain| format!("https://{domain}")));

        let secret = get("SUPABASE_JWT_SECRET")
            .ok_or_else(|| AppError::config("SUPABASE_JWT_SECRET must be set"))?;
        let security = SecurityConfig::new(secret.into_bytes()).with_issuer(
            get("SUPABASE_ISSUER").unwrap_or_else(|| DEFAULT_LOCAL_ISSUER.to_string()),
        );
        security
            .validate()
            .map_err(|e| AppError::config(e.to_string()))?;

        let subject_mapping = match get("SUBJECT_MAPPING") {
            Some(raw) => raw.parse::<SubjectMapping>().map_err(AppError::config)?,
            None => SubjectMapping::default(),
        };
        let subject_mapping = match (subject_mapping, get("SUBJECT_NAMESPACE")) {
            (SubjectMapping::Derived { .. }, Some(raw)) => SubjectMapping::Derived {
                namespace: Uuid::parse_str(&raw)
                    .map_err(|_| AppError::config("SUBJECT_NAMESPACE must be a UUID"))?,
            },
            (mapping, _) => mapping,
        };

        let fetch_timeout = Duration::from_secs(parse_secs(
            &get,
            "JWKS_FETCH_TIMEOUT_SECS",
            DEFAULT_FETCH_TIMEOUT_SECS,
        )?);
        if fetch_timeout.is_zero() {
            return Err(AppError::config(
                "JWKS_FETCH_TIMEOUT_SECS must be greater than zero",
            ));
        }

        let cache_ttl =
            Duration::from_secs(parse_secs(&get, "JWKS_CACHE_TTL_SECS", DEFAULT_CACHE_TTL_SECS)?);
        let min_refresh_interval = Duration::from_secs(parse_secs(
            &get,
            "JWKS_MIN_REFRESH_SECS",
            MIN_REFRESH_INTERVAL.as_secs(),
        )?);
        let leeway_secs = parse_secs(&get, "CLOCK_SKEW_SECS", 0)?;

        let allowed_origins = get("CORS_ALLOWED_ORIGINS").map(|raw| {
            raw.split(',')
                .map(|o| o.trim().to_string())
                .filter(|o| !o.is_empty())
                .collect::<Vec<_>>()
        });
        let allowed_origins = match allowed_origins {
            Some(origins) if origins.iter().any(|o| o == "*") => None,
            other => other.filter(|origins| !origins.is_empty()),
        };

        Ok(Self {
            host,
            port,
            jwks_url,
            expected_issuer,
            security,
            subject_mapping,
            fetch_timeout,
            cache_ttl,
            min_refresh_interval,
            leeway_secs,
            allowed_origins,
        })
    }

    pub fn issuer_policy(&self) -> IssuerPolicy {
        IssuerPolicy {
            expected_issuer: self.expected_issuer.clone(),
            subject_mapping: self.subject_mapping.clone(),
            leeway_secs: self.leeway_secs,
        }
    }
}

impl fmt::Debug for BridgeConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BridgeConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("jwks_url", &self.jwks_url)
            .field("expected_issuer", &self.expected_issuer)
            .field("security", &self.security)
            .field("subject_mapping", &self.subject_mapping)
            .field("fetch_timeout", &self.fetch_timeout)
            .field("cache_ttl", &self.cache_ttl)
            .field("leeway_secs", &self.leeway_secs)
            .field("allowed_origins", &self.allowed_origins)
            .finish()
    }
}

fn parse_secs<F>(get: &F, key: &str, default: u64) -> Result<u64, AppError>
where
    F: Fn(&str) -> Option<String>,
{
    match get(key) {
        Some(raw) => raw
            .parse::<u64>()
            .map_err(|_| AppError::config(format!("{key} must be a whole number of seconds"))),
        None => Ok(default),
    }
}
