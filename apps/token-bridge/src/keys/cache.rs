//! Key lookup by `kid` with a short-TTL cache in front of the key source.
//!
//! The cache holds a single entry: the whole key set. Concurrent misses are
//! coalesced by `moka`'s `try_get_with`, so one fetch serves every waiting
//! request and no request observes a partially updated set. A `kid` missing
//! from a cached set triggers one refetch, limited to once per
//! `MIN_REFRESH_INTERVAL`, to pick up rotated keys. A failed refetch leaves the cached set untouched.

use std::sync::Arc;
use std::time::{Duration, Instant};

use jsonwebtoken::jwk::{Jwk, JwkSet, PublicKeyUse};
use moka::future::Cache;
use tracing::{debug, info, warn};

use crate::errors::ExchangeError;
use crate::keys::jwks::KeySetSource;

/// Minimum age of a cached set before a `kid` miss may force a refetch.
pub const MIN_REFRESH_INTERVAL: Duration = Duration::from_secs(10);

const KEY_SET: &str = "jwks";

#[derive(Clone)]
struct CachedKeys {
    set: Arc<JwkSet>,
    fetched_at: Instant,
}

/// Resolves signing keys by `kid`.
pub struct KeyResolver {
    source: Arc<dyn KeySetSource>,
    /// `None` when caching is disabled (TTL of zero)
    cache: Option<Cache<&'static str, CachedKeys>>,
    min_refresh: Duration,
}

impl KeyResolver {
    pub fn new(source: Arc<dyn KeySetSource>, ttl: Duration) -> Self {
        let cache = (!ttl.is_zero()).then(|| {
            Cache::builder()
                .max_capacity(1)
                .time_to_live(ttl)
                .build()
        });

        Self {
            source,
            cache,
            min_refresh: MIN_REFRESH_INTERVAL,
        }
    }

    pub fn with_min_refresh_interval(mut self, interval: Duration) -> Self {
        self.min_refresh = interval;
        self
    }

    /// Find the verification key named `kid`.
    pub async fn resolve(&self, kid: &str) -> Result<Jwk, ExchangeError> {
        let Some(cache) = &self.cache else {
            let set = self.source.fetch().await?;
            return find_signing_key(&set, kid)
                .ok_or_else(|| ExchangeError::unknown_signing_key(kid));
        };

        let cached = self.cached(cache).await?;
        if let Some(jwk) = find_signing_key(&cached.set, kid) {
            return Ok(jwk);
        }

        if cached.fetched_at.elapsed() < self.min_refresh {
            debug!(kid = %kid, "Key not in recently fetched JWKS");
            return Err(ExchangeError::unknown_signing_key(kid));
        }

        debug!(kid = %kid, "Key not found in cache, refreshing JWKS");
        let set = match self.source.fetch().await {
            Ok(set) => set,
            Err(e) => {
                // The cached set stays in place for the keys it does hold.
                warn!(kid = %kid, error = %e, "JWKS refresh failed, keeping cached keys");
                return Err(ExchangeError::unknown_signing_key(kid));
            }
        };

        info!(key_count = set.keys.len(), "JWKS cache refreshed");
        let found = find_signing_key(&set, kid);
        cache
            .insert(
                KEY_SET,
                CachedKeys {
                    set: Arc::new(set),
                    fetched_at: Instant::now(),
                },
            )
            .await;

        found.ok_or_else(|| ExchangeError::unknown_signing_key(kid))
    }

    async fn cached(
        &self,
        cache: &Cache<&'static str, CachedKeys>,
    ) -> Result<CachedKeys, ExchangeError> {
        let source = Arc::clone(&self.source);
        cache
            .try_get_with(KEY_SET, async move {
                let set = source.fetch().await?;
                info!(key_count = set.keys.len(), "JWKS cache refreshed");
                Ok::<_, ExchangeError>(CachedKeys {
                    set: Arc::new(set),
                    fetched_at: Instant::now(),
                })
            })
            .await
            .map_err(|e| (*e).clone())
    }
}

/// Keys published for encryption are never used to verify signatures.
fn find_signing_key(set: &JwkSet, kid: &str) -> Option<Jwk> {
    set.keys
        .iter()
        .filter(|jwk| !matches!(jwk.common.public_key_use, Some(PublicKeyUse::Encryption)))
        .find(|jwk| jwk.common.key_id.as_deref() == Some(kid))
        .cloned()
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    use async_trait::async_trait;
    use serde_json::json;

    use super::*;

    fn key_set(kids: &[(&str, &str)]) -> JwkSet {
        let keys: Vec<_> = kids
            .iter()
            .map(|(kid, key_use)| {
                json!({
                    "kty": "RSA",
                    "kid": kid,
                    "use": key_use,
                    "alg": "RS256",
                    "n": "sXchDaQebHnPiGvyDOAT4saGEUetSyo9MKLOoWFsueri23bOdgWp4Dy1WlUzewbgBHod5pcM9H95GQRV3JDXboIRROSBigeC5yjU1hGzHHyXss8UDprecbAYxknTcQkhslANGRUZmdTOQ5qTRsLAt6BTYuyvVRdhS8exSZEy_c4gs_7svlJJQ4H9_NxsiIoLwAEk7-Q3UXERGYw_75IDrGA84-lA_-Ct4eTlXHBIY2EaV7t7LjJaynVJCpkv4LKjTTAumiGUIuQhrNhZLuF_RJLqHpM2kgWFLU7-VTdL1VbC2tejvcI2BlMkEpk1BzBZI0KQB0GaDWFLN-aEAw3vRw",
                    "e": "AQAB"
                })
            })
            .collect();
        serde_json::from_value(json!({ "keys": keys })).unwrap()
    }

    /// Source that counts fetches and serves whatever set is currently installed.
    /// Installing `None` makes every fetch fail.
    struct CountingSource {
        fetches: AtomicUsize,
        current: Mutex<Option<JwkSet>>,
    }

    impl CountingSource {
        fn new(set: JwkSet) -> Arc<Self> {
            Arc::new(Self {
                fetches: AtomicUsize::new(0),
                current: Mutex::new(Some(set)),
            })
        }

        fn install(&self, set: Option<JwkSet>) {
            *self.current.lock().unwrap() = set;
        }

        fn fetches(&self) -> usize {
            self.fetches.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl KeySetSource for CountingSource {
        async fn fetch(&self) -> Result<JwkSet, ExchangeError> {
            self.fetches.fetch_add(1, Ordering::SeqCst);
            self.current
                .lock()
                .unwrap()
                .clone()
                .ok_or_else(|| ExchangeError::upstream("issuer down"))
        }
    }

    struct FailingSource;

    #[async_trait]
    impl KeySetSource for FailingSource {
        async fn fetch(&self) -> Result<JwkSet, ExchangeError> {
            Err(ExchangeError::upstream("connection refused"))
        }
    }

    #[tokio::test]
    async fn cached_set_serves_repeat_lookups() {
        let source = CountingSource::new(key_set(&[("k1", "sig")]));
        let resolver = KeyResolver::new(source.clone(), Duration::from_secs(300));

        for _ in 0..5 {
            resolver.resolve("k1").await.unwrap();
        }
        assert_eq!(source.fetches(), 1);
    }

    #[tokio::test]
    async fn zero_ttl_fetches_every_time() {
        let source = CountingSource::new(key_set(&[("k1", "sig")]));
        let resolver = KeyResolver::new(source.clone(), Duration::ZERO);

        resolver.resolve("k1").await.unwrap();
        resolver.resolve("k1").await.unwrap();
        assert_eq!(source.fetches(), 2);
    }

    #[tokio::test]
    async fn unknown_kid_in_fresh_set_does_not_refetch() {
        let source = CountingSource::new(key_set(&[("k1", "sig")]));
        let resolver = KeyResolver::new(source.clone(), Duration::from_secs(300));

        let err = resolver.resolve("missing").await.unwrap_err();
        assert_eq!(err, ExchangeError::unknown_signing_key("missing"));
        assert_eq!(source.fetches(), 1);
    }

    #[tokio::test]
    async fn rotated_key_is_picked_up_by_refetch() {
        let source = CountingSource::new(key_set(&[("k1", "sig")]));
        let resolver = KeyResolver::new(source.clone(), Duration::from_secs(300))
            .with_min_refresh_interval(Duration::ZERO);

        resolver.resolve("k1").await.unwrap();
        source.install(Some(key_set(&[("k1", "sig"), ("k2", "sig")])));

        resolver.resolve("k2").await.unwrap();
        assert_eq!(source.fetches(), 2);
    }

    #[tokio::test]
    async fn failed_refresh_keeps_cached_keys() {
        let source = CountingSource::new(key_set(&[("k1", "sig")]));
        let resolver = KeyResolver::new(source.clone(), Duration::from_secs(300))
            .with_min_refresh_interval(Duration::ZERO);

        resolver.resolve("k1").await.unwrap();
        source.install(None);

        // Unknown kid during an outage is still an unknown key, not an upstream error.
        let err = resolver.resolve("bogus").await.unwrap_err();
        assert_eq!(err, ExchangeError::unknown_signing_key("bogus"));

        resolver.resolve("k1").await.unwrap();
        assert_eq!(source.fetches(), 2);
    }

    #[tokio::test]
    async fn successful_refresh_replaces_cached_set() {
        let source = CountingSource::new(key_set(&[("k1", "sig")]));
        let resolver = KeyResolver::new(source.clone(), Duration::from_secs(300))
            .with_min_refresh_interval(Duration::ZERO);

        resolver.resolve("k1").await.unwrap();
        source.install(Some(key_set(&[("k2", "sig")])));
        resolver.resolve("k2").await.unwrap();

        // k1 was rotated out; the refreshed set is what later lookups see.
        source.install(None);
        assert!(resolver.resolve("k2").await.is_ok());
        assert_eq!(source.fetches(), 2);
    }

    #[tokio::test]
    async fn encryption_keys_are_not_used_for_verification() {
        let source = CountingSource::new(key_set(&[("enc-1", "enc")]));
        let resolver = KeyResolver::new(source, Duration::ZERO);

        assert!(matches!(
            resolver.resolve("enc-1").await,
            Err(ExchangeError::UnknownSigningKey { .. })
        ));
    }

    #[tokio::test]
    async fn fetch_failure_propagates_and_is_not_cached() {
        let resolver = KeyResolver::new(Arc::new(FailingSource), Duration::from_secs(300));

        for _ in 0..2 {
            assert!(matches!(
                resolver.resolve("k1").await,
                Err(ExchangeError::UpstreamUnavailable(_))
            ));
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_misses_share_one_fetch() {
        let source = CountingSource::new(key_set(&[("k1", "sig")]));
        let resolver = Arc::new(KeyResolver::new(source.clone(), Duration::from_secs(300)));

        let tasks: Vec<_> = (0..16)
            .map(|_| {
                let resolver = Arc::clone(&resolver);
                tokio::spawn(async move { resolver.resolve("k1").await })
            })
            .collect();

        for task in tasks {
            task.await.unwrap().unwrap();
        }
        assert_eq!(source.fetches(), 1);
    }
}
