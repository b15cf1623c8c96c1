//! Parsing and verification of identity-provider tokens.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::jwk::Jwk;
use jsonwebtoken::{decode, decode_header, Algorithm, DecodingKey, Header, Validation};
use serde::Serialize;

use crate::auth::claims::InboundClaims;
use crate::errors::ExchangeError;

/// Algorithms an identity provider may sign with. Symmetric algorithms are
/// refused so a public key can never be used as an HMAC secret.
const ACCEPTED_ALGORITHMS: [Algorithm; 8] = [
    Algorithm::RS256,
    Algorithm::RS384,
    Algorithm::RS512,
    Algorithm::PS256,
    Algorithm::PS384,
    Algorithm::PS512,
    Algorithm::ES256,
    Algorithm::ES384,
];

/// Check the compact serialization: exactly three non-empty base64url segments.
pub fn check_compact_shape(token: &str) -> Result<(), ExchangeError> {
    if token.trim().is_empty() {
        return Err(ExchangeError::invalid_request("token is empty"));
    }

    let segments: Vec<&str> = token.split('.').collect();
    if segments.len() != 3 {
        return Err(ExchangeError::invalid_request(format!(
            "token must have 3 segments, found {}",
            segments.len()
        )));
    }

    for segment in segments {
        if segment.is_empty() {
            return Err(ExchangeError::invalid_request("token has an empty segment"));
        }
        if !segment
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_')
        {
            return Err(ExchangeError::invalid_request(
                "token segment is not base64url",
            ));
        }
    }

    Ok(())
}

/// Read the header without trusting anything in the token.
///
/// A readable header naming an algorithm we cannot verify (`none`, or a name
/// the JWT library does not know) is a signature failure, not a malformed
/// request.
pub fn read_header(token: &str) -> Result<Header, ExchangeError> {
    decode_header(token).map_err(|_| match header_alg(token) {
        Some(alg) if alg.parse::<Algorithm>().is_err() => {
            ExchangeError::invalid_signature(format!("algorithm {alg:?} is not accepted"))
        }
        _ => ExchangeError::invalid_request("unreadable token header"),
    })
}

/// The raw `alg` of a header that is valid JSON.
fn header_alg(token: &str) -> Option<String> {
    let segment = token.split('.').next()?;
    let bytes = URL_SAFE_NO_PAD.decode(segment).ok()?;
    let header: serde_json::Value = serde_json::from_slice(&bytes).ok()?;
    header.get("alg")?.as_str().map(str::to_owned)
}

/// Decode claims without verifying the signature.
///
/// Only used to reject expired or premature tokens before any network call.
/// Returns `None` when the payload is unreadable so that verification, not
/// this preview, reports the failure.
pub fn preview_claims(token: &str) -> Option<InboundClaims> {
    let payload = token.split('.').nth(1)?;
    let bytes = URL_SAFE_NO_PAD.decode(payload).ok()?;
    serde_json::from_slice(&bytes).ok()
}

/// Verify the token's signature against `jwk` and return its claims.
///
/// Temporal and issuer checks are left to the caller, which owns the clock.
pub fn verify(token: &str, header: &Header, jwk: &Jwk) -> Result<InboundClaims, ExchangeError> {
    if !ACCEPTED_ALGORITHMS.contains(&header.alg) {
        return Err(ExchangeError::invalid_signature(format!(
            "algorithm {:?} is not accepted",
            header.alg
        )));
    }

    if let Some(declared) = &jwk.common.key_algorithm {
        if algorithm_name(declared) != algorithm_name(&header.alg) {
            return Err(ExchangeError::invalid_signature(format!(
                "token algorithm {:?} does not match key algorithm",
                header.alg
            )));
        }
    }

    let key = DecodingKey::from_jwk(jwk)
        .map_err(|e| ExchangeError::invalid_signature(format!("unusable signing key: {e}")))?;

    let mut validation = Validation::new(header.alg);
    relax_claim_checks(&mut validation);

    decode::<InboundClaims>(token, &key, &validation)
        .map(|data| data.claims)
        .map_err(|e| match e.kind() {
            ErrorKind::Json(_) | ErrorKind::Utf8(_) => {
                ExchangeError::invalid_request(format!("unreadable token claims: {e}"))
            }
            _ => ExchangeError::invalid_signature(e.to_string()),
        })
}

/// Claims are checked against the injected clock, not by the JWT library.
fn relax_claim_checks(validation: &mut Validation) {
    validation.validate_exp = false;
    validation.validate_nbf = false;
    validation.validate_aud = false;
    validation.required_spec_claims.clear();
}

/// JOSE name of an algorithm (`"RS256"`), used to compare header and JWK values.
fn algorithm_name<T: Serialize>(alg: &T) -> Option<String> {
    serde_json::to_value(alg)
        .ok()
        .and_then(|v| v.as_str().map(str::to_owned))
}
