#![allow(dead_code)]

// tests/common/mod.rs
use serde_json::Value;

// Logging is auto-installed for every test binary that declares `mod common`
#[ctor::ctor]
fn init_logging() {
    bridge_test_support::logging::init();
}

/// Every claim name present on a decoded token, sorted.
pub fn claim_names(claims: &Value) -> Vec<String> {
    let mut names: Vec<String> = claims
        .as_object()
        .map(|o| o.keys().cloned().collect())
        .unwrap_or_default();
    names.sort_unstable();
    names
}
