//! Error codes for the token bridge API.
//!
//! Add new codes here; never pass ad-hoc strings as error codes.
//!
//! All error codes are SCREAMING_SNAKE_CASE and map 1:1 to the strings
//! that appear in HTTP responses.

use core::fmt;

/// Centralized error codes for the token bridge API.
///
/// Each variant maps to a canonical SCREAMING_SNAKE_CASE string that appears
/// in the `code` field of error responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    // Request Validation
    /// Missing or malformed inbound token
    InvalidRequest,

    // Authentication
    /// No key in the issuer's key set matches the token's `kid`
    UnknownSigningKey,
    /// Signature verification failed
    InvalidSignature,
    /// Inbound token has expired
    TokenExpired,
    /// Inbound token is not valid yet (`nbf` in the future)
    TokenNotYetValid,
    /// Inbound token was issued by an unexpected issuer
    IssuerMismatch,
    /// Subject or email claim absent
    MissingIdentity,

    // Upstream
    /// Issuer key set could not be fetched
    UpstreamUnavailable,

    // System Errors
    /// Local signing secret missing or unusable
    SigningConfiguration,
    /// Configuration error
    ConfigError,
    /// Internal server error
    Internal,
    /// Route not found
    NotFound,
}

impl ErrorCode {
    /// Every code, in declaration order.
    pub const ALL: [ErrorCode; 12] = [
        Self::InvalidRequest,
        Self::UnknownSigningKey,
        Self::InvalidSignature,
        Self::TokenExpired,
        Self::TokenNotYetValid,
        Self::IssuerMismatch,
        Self::MissingIdentity,
        Self::UpstreamUnavailable,
        Self::SigningConfiguration,
        Self::ConfigError,
        Self::Internal,
        Self::NotFound,
    ];

    /// Returns the canonical SCREAMING_SNAKE_CASE string for this error code.
    ///
    /// This is the exact string that appears in HTTP responses.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::InvalidRequest => "INVALID_REQUEST",

            Self::UnknownSigningKey => "UNKNOWN_SIGNING_KEY",
            Self::InvalidSignature => "INVALID_SIGNATURE",
            Self::TokenExpired => "TOKEN_EXPIRED",
            Self::TokenNotYetValid => "TOKEN_NOT_YET_VALID",
            Self::IssuerMismatch => "ISSUER_MISMATCH",
            Self::MissingIdentity => "MISSING_IDENTITY",

            Self::UpstreamUnavailable => "UPSTREAM_UNAVAILABLE",

            Self::SigningConfiguration => "SIGNING_CONFIGURATION",
            Self::ConfigError => "CONFIG_ERROR",
            Self::Internal => "INTERNAL",
            Self::NotFound => "NOT_FOUND",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
