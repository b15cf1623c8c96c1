//! Exchanges identity tokens issued by Outseta for session tokens that a
//! Supabase backend accepts.
//!
//! The inbound token is verified against the issuer's published key set,
//! its subject is mapped to a stable local UUID, and a new HS256 token is
//! signed with the backend's shared secret. Only an allow-listed set of
//! claims crosses over.
//!
//! The HTTP surface (`routes`, `middleware`, `extractors`) is thin; the
//! pipeline lives in [`services::exchange::TokenExchangeService`].

#![deny(clippy::wildcard_imports)]
#![cfg_attr(test, allow(clippy::wildcard_imports))]

pub mod auth;
pub mod config;
pub mod error;
pub mod errors;
pub mod extractors;
pub mod infra;
pub mod keys;
pub mod logging;
pub mod middleware;
pub mod routes;
pub mod services;
pub mod state;
pub mod trace_ctx;

#[cfg(test)]
pub mod test_bootstrap;

// Re-exports for public API
pub use auth::claims::{InboundClaims, SanitizedClaims, UserMetadata};
pub use auth::jwt::{mint_session_token, verify_session_token};
pub use auth::subject::{LocalSubjectId, SubjectMapping};
pub use config::BridgeConfig;
pub use error::AppError;
pub use errors::{ErrorCode, ExchangeError};
pub use extractors::auth_token::AuthToken;
pub use infra::clock::{Clock, FixedClock, SystemClock};
pub use infra::state::{build_state, StateBuilder};
pub use keys::{HttpKeySetSource, KeyResolver, KeySetSource, StaticKeySet};
pub use middleware::cors::cors_middleware;
pub use middleware::request_trace::RequestTrace;
pub use middleware::structured_logger::StructuredLogger;
pub use middleware::trace_span::TraceSpan;
pub use services::exchange::{ExchangeOutcome, IssuerPolicy, TokenExchangeService};
pub use state::app_state::AppState;
pub use state::security_config::SecurityConfig;

// Auto-initialize logging for unit tests
#[cfg(test)]
#[ctor::ctor]
fn init_test_logging() {
    test_bootstrap::logging::init();
}
