//! Exchange-level error type.
//!
//! This error type is HTTP-agnostic. Handlers return
//! `Result<T, crate::error::AppError>` and convert from `ExchangeError`
//! using the provided `From<ExchangeError> for AppError` implementation.
//!
//! The `String` payloads are diagnostic context for logs. They are never
//! copied into responses except for `InvalidRequest`, whose detail is always
//! produced by this crate.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExchangeError {
    /// Missing or malformed inbound token.
    #[error("invalid request: {0}")]
    InvalidRequest(String),
    /// The token's `kid` is absent from the issuer's key set.
    #[error("no signing key matches kid '{kid}'")]
    UnknownSigningKey { kid: String },
    /// Cryptographic verification failed.
    #[error("signature verification failed: {0}")]
    InvalidSignature(String),
    #[error("token expired")]
    TokenExpired,
    #[error("token not yet valid")]
    TokenNotYetValid,
    #[error("token issuer does not match the configured issuer")]
    IssuerMismatch,
    /// Subject or email could not be resolved from verified claims.
    #[error("missing identity: {0}")]
    MissingIdentity(String),
    /// Key set fetch failed (transport, timeout, non-2xx, unparsable body).
    #[error("issuer key set unavailable: {0}")]
    UpstreamUnavailable(String),
    /// Local signing secret missing or too weak. Fail closed.
    #[error("signing configuration error: {0}")]
    SigningConfiguration(String),
    #[error("internal error: {0}")]
    Internal(String),
}

impl ExchangeError {
    pub fn invalid_request(detail: impl Into<String>) -> Self {
        Self::InvalidRequest(detail.into())
    }

    pub fn unknown_signing_key(kid: impl Into<String>) -> Self {
        Self::UnknownSigningKey { kid: kid.into() }
    }

    pub fn invalid_signature(detail: impl Into<String>) -> Self {
        Self::InvalidSignature(detail.into())
    }

    pub fn missing_identity(detail: impl Into<String>) -> Self {
        Self::MissingIdentity(detail.into())
    }

    pub fn upstream(detail: impl Into<String>) -> Self {
        Self::UpstreamUnavailable(detail.into())
    }

    pub fn signing_config(detail: impl Into<String>) -> Self {
        Self::SigningConfiguration(detail.into())
    }

    pub fn internal(detail: impl Into<String>) -> Self {
        Self::Internal(detail.into())
    }

    /// Short machine-readable reason used in security log events.
    pub fn reason(&self) -> &'static str {
        match self {
            Self::InvalidRequest(_) => "invalid_request",
            Self::UnknownSigningKey { .. } => "unknown_signing_key",
            Self::InvalidSignature(_) => "invalid_signature",
            Self::TokenExpired => "token_expired",
            Self::TokenNotYetValid => "token_not_yet_valid",
            Self::IssuerMismatch => "issuer_mismatch",
            Self::MissingIdentity(_) => "missing_identity",
            Self::UpstreamUnavailable(_) => "upstream_unavailable",
            Self::SigningConfiguration(_) => "signing_configuration",
            Self::Internal(_) => "internal",
        }
    }
}
