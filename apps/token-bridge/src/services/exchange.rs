//! Identity token exchange.
//!
//! Turns a token issued by the external identity provider into a session
//! token the data backend trusts:
//!
//! 1. check shape and read the header (`kid`, `alg`) without trusting claims
//! 2. reject expired or premature tokens before any network call
//! 3. resolve the issuer's key for `kid`
//! 4. verify the signature, then re-check time and issuer on verified claims
//! 5. resolve subject and email, map the subject to a local id
//! 6. project onto the claim allow-list and sign with the local secret
//!
//! The service holds no per-request state. Its side effects are the key set
//! fetch performed by the resolver and one security event per exchange.

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tracing::debug;

use crate::auth::claims::{InboundClaims, SanitizedClaims};
use crate::auth::inbound;
use crate::auth::jwt::mint_session_token;
use crate::auth::subject::{LocalSubjectId, SubjectMapping};
use crate::errors::ExchangeError;
use crate::infra::clock::Clock;
use crate::keys::{KeyResolver, KeySetSource};
use crate::logging::security;
use crate::state::security_config::SecurityConfig;

/// Rules applied to inbound tokens beyond signature verification.
#[derive(Debug, Clone, Default)]
pub struct IssuerPolicy {
    /// Expected `iss`; `None` disables the check
    pub expected_issuer: Option<String>,
    pub subject_mapping: SubjectMapping,
    /// Leeway applied to `exp` and `nbf`
    pub leeway_secs: u64,
}

/// Public echo of the exchanged identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExchangedUser {
    pub id: String,
    pub email: String,
}

#[derive(Debug, Clone)]
pub struct ExchangeOutcome {
    /// Signed session token
    pub token: String,
    pub user: ExchangedUser,
    pub external_subject: String,
}

pub struct TokenExchangeService {
    keys: KeyResolver,
    clock: Arc<dyn Clock>,
    security: SecurityConfig,
    policy: IssuerPolicy,
}

impl TokenExchangeService {
    /// Fails with `SigningConfiguration` if the secret is unusable, so a
    /// misconfigured process never starts serving.
    pub fn new(
        source: Arc<dyn KeySetSource>,
        cache_ttl: Duration,
        clock: Arc<dyn Clock>,
        security: SecurityConfig,
        policy: IssuerPolicy,
    ) -> Result<Self, ExchangeError> {
        security.validate()?;

        Ok(Self {
            keys: KeyResolver::new(source, cache_ttl),
            clock,
            security,
            policy,
        })
    }

    /// See [`KeyResolver::with_min_refresh_interval`].
    pub fn with_min_refresh_interval(mut self, interval: Duration) -> Self {
        self.keys = self.keys.with_min_refresh_interval(interval);
        self
    }

    pub fn security(&self) -> &SecurityConfig {
        &self.security
    }

    pub fn policy(&self) -> &IssuerPolicy {
        &self.policy
    }

    /// Run the exchange and record the security event for its outcome.
    ///
    /// Failures after signature verification carry the verified email into
    /// the event; earlier failures have no trusted email to report.
    pub async fn exchange(&self, inbound_token: &str) -> Result<ExchangeOutcome, ExchangeError> {
        let mut verified_email = None;
        let result = self.exchange_token(inbound_token, &mut verified_email).await;

        match &result {
            Ok(outcome) => security::exchange_succeeded(&outcome.user.id, &outcome.user.email),
            Err(e) => security::exchange_failed(e.reason(), verified_email.as_deref(), true),
        }
        result
    }

    async fn exchange_token(
        &self,
        inbound_token: &str,
        verified_email: &mut Option<String>,
    ) -> Result<ExchangeOutcome, ExchangeError> {
        inbound::check_compact_shape(inbound_token)?;
        let header = inbound::read_header(inbound_token)?;

        if let Some(preview) = inbound::preview_claims(inbound_token) {
            self.check_time(&preview)?;
        }

        let kid = header
            .kid
            .as_deref()
            .ok_or_else(|| ExchangeError::unknown_signing_key("<none>"))?;
        let jwk = self.keys.resolve(kid).await?;

        let claims = inbound::verify(inbound_token, &header, &jwk)?;
        debug!(kid = %kid, alg = ?header.alg, "Inbound token signature verified");
        *verified_email = claims.normalized_email();

        self.check_time(&claims)?;
        self.check_issuer(&claims)?;

        let exp = claims
            .exp
            .ok_or_else(|| ExchangeError::invalid_request("token has no exp claim"))?;
        let external_subject = claims
            .external_subject()
            .ok_or_else(|| ExchangeError::missing_identity("token has neither sub nor nameid"))?
            .to_string();
        let email = claims
            .normalized_email()
            .ok_or_else(|| ExchangeError::missing_identity("token has no email"))?;

        let local_subject: LocalSubjectId = self
            .policy
            .subject_mapping
            .local_subject_id(&external_subject)?;

        let iat = claims.iat.unwrap_or_else(|| self.clock.now_secs());
        let sanitized = SanitizedClaims::project(
            &claims,
            &local_subject,
            &external_subject,
            email.clone(),
            &self.security.issuer,
            iat,
            exp,
        );

        let token = mint_session_token(&sanitized, &self.security)?;

        Ok(ExchangeOutcome {
            token,
            user: ExchangedUser {
                id: local_subject.to_string(),
                email,
            },
            external_subject,
        })
    }

    fn check_time(&self, claims: &InboundClaims) -> Result<(), ExchangeError> {
        let now = self.clock.now_secs();
        let leeway = self.policy.leeway_secs;

        if let Some(exp) = claims.exp {
            if exp.saturating_add(leeway) <= now {
                return Err(ExchangeError::TokenExpired);
            }
        }
        if let Some(nbf) = claims.nbf {
            if nbf > now.saturating_add(leeway) {
                return Err(ExchangeError::TokenNotYetValid);
            }
        }
        Ok(())
    }

    fn check_issuer(&self, claims: &InboundClaims) -> Result<(), ExchangeError> {
        let Some(expected) = &self.policy.expected_issuer else {
            return Ok(());
        };

        match claims.iss.as_deref() {
            Some(iss) if normalize_issuer(iss) == normalize_issuer(expected) => Ok(()),
            _ => Err(ExchangeError::IssuerMismatch),
        }
    }
}

fn normalize_issuer(iss: &str) -> &str {
    iss.trim().trim_end_matches('/')
}
