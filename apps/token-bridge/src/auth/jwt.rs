use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};

use crate::auth::claims::SanitizedClaims;
use crate::errors::ExchangeError;
use crate::state::security_config::{SecurityConfig, AUTHENTICATED};

/// Sign a session token over exactly the sanitized claim set.
///
/// Fails closed with `SigningConfiguration` when the secret is unusable.
pub fn mint_session_token(
    claims: &SanitizedClaims,
    security: &SecurityConfig,
) -> Result<String, ExchangeError> {
    security.validate()?;

    encode(
        &Header::new(security.algorithm),
        claims,
        &EncodingKey::from_secret(&security.jwt_secret),
    )
    .map_err(|e| ExchangeError::internal(format!("failed to encode session token: {e}")))
}

/// Verify a session token and return its claims.
///
/// Errors:
/// - Expired token → `TokenExpired`
/// - Invalid signature → `InvalidSignature`
/// - Any other decode error → `InvalidRequest`
pub fn verify_session_token(
    token: &str,
    security: &SecurityConfig,
) -> Result<SanitizedClaims, ExchangeError> {
    // Default Validation already checks exp; pin algorithm, audience and issuer.
    let mut validation = Validation::new(security.algorithm);
    validation.set_audience(&[AUTHENTICATED]);
    validation.set_issuer(&[security.issuer.as_str()]);

    decode::<SanitizedClaims>(
        token,
        &DecodingKey::from_secret(&security.jwt_secret),
        &validation,
    )
    .map(|data| data.claims)
    .map_err(|e| match e.kind() {
        jsonwebtoken::errors::ErrorKind::ExpiredSignature => ExchangeError::TokenExpired,
        jsonwebtoken::errors::ErrorKind::InvalidSignature => {
            ExchangeError::invalid_signature("session token signature mismatch")
        }
        _ => ExchangeError::invalid_request(format!("unreadable session token: {e}")),
    })
}
