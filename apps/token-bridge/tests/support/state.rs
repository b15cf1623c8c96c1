use std::sync::Arc;
use std::time::Duration;

use bridge_test_support::issuer::TestIssuer;
use jsonwebtoken::jwk::JwkSet;
use serde_json::{json, Value};
use token_bridge::infra::clock::FixedClock;
use token_bridge::infra::state::build_state;
use token_bridge::keys::StaticKeySet;
use token_bridge::services::exchange::IssuerPolicy;
use token_bridge::state::app_state::AppState;
use token_bridge::state::security_config::SecurityConfig;

/// Frozen "now" for every integration test.
pub const NOW: u64 = 1_750_000_000;
pub const SECRET: &str = "test_secret_key_for_testing_purposes_only";

/// State trusting the primary test issuer, default policy.
pub fn test_state() -> AppState {
    test_state_with(TestIssuer::primary().jwk_set(), IssuerPolicy::default())
}

pub fn test_state_with(keys: JwkSet, policy: IssuerPolicy) -> AppState {
    build_state()
        .with_security(SecurityConfig::new(SECRET))
        .with_key_source(Arc::new(StaticKeySet::new(keys)))
        .with_clock(Arc::new(FixedClock(NOW)))
        .with_policy(policy)
        .with_cache_ttl(Duration::from_secs(300))
        .build()
        .expect("test state builds")
}

/// A provider token payload; `null` in `overrides` removes a claim.
pub fn inbound_claims(overrides: Value) -> Value {
    let mut claims = json!({
        "sub": "L9nqBaWZ",
        "email": "Ada@Example.com",
        "given_name": "Ada",
        "family_name": "Lovelace",
        "name": "Ada Lovelace",
        "iat": NOW - 30,
        "exp": NOW + 3600,
        "iss": "https://acme.outseta.com",
        "aud": "acme.outseta.com",
        "jti": "f8a1c0de",
        "outseta:accountUid": "wQX0kBmK",
        "outseta:isPrimary": "1",
        "outseta:subscriptionPlanUid": "Jy9gEbmM"
    });

    if let (Some(base), Some(extra)) = (claims.as_object_mut(), overrides.as_object()) {
        for (key, value) in extra {
            if value.is_null() {
                base.remove(key);
            } else {
                base.insert(key.clone(), value.clone());
            }
        }
    }
    claims
}
