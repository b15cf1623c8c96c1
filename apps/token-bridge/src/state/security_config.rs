use std::fmt;

use jsonwebtoken::Algorithm;

use crate::errors::ExchangeError;

/// Minimum accepted length of the local signing secret, in bytes.
pub const MIN_SECRET_LEN: usize = 32;

/// Default `iss` placed on session tokens.
pub const DEFAULT_LOCAL_ISSUER: &str = "supabase";

/// Audience and role carried by every session token.
pub const AUTHENTICATED: &str = "authenticated";

/// Configuration for signing the session tokens trusted by the data backend
#[derive(Clone)]
pub struct SecurityConfig {
    /// Shared secret used to sign and verify session tokens
    pub jwt_secret: Vec<u8>,
    /// JWT algorithm to use (HS256)
    pub algorithm: Algorithm,
    /// `iss` claim placed on session tokens
    pub issuer: String,
}

impl SecurityConfig {
    /// Create a new SecurityConfig with the given secret and the default issuer
    pub fn new(jwt_secret: impl Into<Vec<u8>>) -> Self {
        Self {
            jwt_secret: jwt_secret.into(),
            algorithm: Algorithm::HS256,
            issuer: DEFAULT_LOCAL_ISSUER.to_string(),
        }
    }

    pub fn with_issuer(mut self, issuer: impl Into<String>) -> Self {
        self.issuer = issuer.into();
        self
    }

    /// Reject secrets that could only produce unsigned or weakly signed tokens.
    pub fn validate(&self) -> Result<(), ExchangeError> {
        if self.jwt_secret.is_empty() {
            return Err(ExchangeError::signing_config("signing secret is empty"));
        }
        if self.jwt_secret.len() < MIN_SECRET_LEN {
            return Err(ExchangeError::signing_config(format!(
                "signing secret must be at least {MIN_SECRET_LEN} bytes"
            )));
        }
        if self.issuer.trim().is_empty() {
            return Err(ExchangeError::signing_config("session issuer is empty"));
        }
        Ok(())
    }
}

impl fmt::Debug for SecurityConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SecurityConfig")
            .field("jwt_secret", &"[REDACTED]")
            .field("algorithm", &self.algorithm)
            .field("issuer", &self.issuer)
            .finish()
    }
}
