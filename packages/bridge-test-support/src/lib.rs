//! Test support for the token bridge.
//!
//! - `logging`: one idempotent tracing subscriber for unit and integration tests
//! - `issuer`: an in-process identity provider with fixed RSA keys
//! - `error_body`: assertions on the JSON error envelope

pub mod error_body;
pub mod issuer;
pub mod logging;
