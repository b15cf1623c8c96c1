use std::sync::Arc;
use std::time::Duration;

use crate::config::BridgeConfig;
use crate::error::AppError;
use crate::infra::clock::{Clock, SystemClock};
use crate::keys::cache::MIN_REFRESH_INTERVAL;
use crate::keys::{HttpKeySetSource, KeySetSource};
use crate::services::exchange::{IssuerPolicy, TokenExchangeService};
use crate::state::app_state::AppState;
use crate::state::security_config::SecurityConfig;

const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(300);

/// Builder for creating AppState instances (used in both tests and main).
///
/// Security config and a key source are required; the clock defaults to
/// [`SystemClock`], the policy to no issuer check with derived subjects,
/// and the cache to a 300 second TTL.
pub struct StateBuilder {
    security_config: Option<SecurityConfig>,
    key_source: Option<Arc<dyn KeySetSource>>,
    clock: Arc<dyn Clock>,
    policy: IssuerPolicy,
    cache_ttl: Duration,
    min_refresh_interval: Duration,
}

impl StateBuilder {
    pub fn new() -> Self {
        Self {
            security_config: None,
            key_source: None,
            clock: Arc::new(SystemClock),
            policy: IssuerPolicy::default(),
            cache_ttl: DEFAULT_CACHE_TTL,
            min_refresh_interval: MIN_REFRESH_INTERVAL,
        }
    }

    /// Production wiring: HTTP key source plus every policy knob from `config`.
    pub fn from_config(config: &BridgeConfig) -> Result<Self, AppError> {
        let source = HttpKeySetSource::new(config.jwks_url.clone(), config.fetch_timeout)?;

        Ok(Self::new()
            .with_security(config.security.clone())
            .with_key_source(Arc::new(source))
            .with_policy(config.issuer_policy())
            .with_cache_ttl(config.cache_ttl)
            .with_min_refresh_interval(config.min_refresh_interval))
    }

    pub fn with_security(mut self, security_config: SecurityConfig) -> Self {
        self.security_config = Some(security_config);
        self
    }

    pub fn with_key_source(mut self, source: Arc<dyn KeySetSource>) -> Self {
        self.key_source = Some(source);
        self
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_policy(mut self, policy: IssuerPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_cache_ttl(mut self, ttl: Duration) -> Self {
        self.cache_ttl = ttl;
        self
    }

    pub fn with_min_refresh_interval(mut self, interval: Duration) -> Self {
        self.min_refresh_interval = interval;
        self
    }

    /// Fails with `AppError::Config` when a required part is missing, and with
    /// a signing configuration error when the secret is unusable.
    pub fn build(self) -> Result<AppState, AppError> {
        let security = self
            .security_config
            .ok_or_else(|| AppError::config("signing configuration is required"))?;
        let source = self
            .key_source
            .ok_or_else(|| AppError::config("a key set source is required"))?;

        let service =
            TokenExchangeService::new(source, self.cache_ttl, self.clock, security, self.policy)?
                .with_min_refresh_interval(self.min_refresh_interval);

        Ok(AppState::new(service))
    }
}

impl Default for StateBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Shorthand for [`StateBuilder::new`].
pub fn build_state() -> StateBuilder {
    StateBuilder::new()
}
