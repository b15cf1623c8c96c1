//! Issuer signing keys: where they come from and how long they are kept.

pub mod cache;
pub mod jwks;

pub use cache::KeyResolver;
pub use jwks::{HttpKeySetSource, KeySetSource, StaticKeySet};
