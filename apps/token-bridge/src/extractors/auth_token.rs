use std::future::{ready, Ready};

use actix_web::{dev::Payload, http::header, FromRequest, HttpRequest};

use crate::error::AppError;
use crate::errors::ExchangeError;
use crate::logging::security;

/// Inbound identity token taken from `Authorization: Bearer <token>`.
///
/// Rejections are caller errors (400): the token is missing or the header is
/// not a bearer credential. Whether the token itself is acceptable is decided
/// by the exchange service.
#[derive(Clone)]
pub struct AuthToken {
    pub token: String,
}

impl std::fmt::Debug for AuthToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthToken").field("token", &"[redacted]").finish()
    }
}

impl AuthToken {
    fn parse(req: &HttpRequest) -> Result<Self, ExchangeError> {
        let value = req
            .headers()
            .get(header::AUTHORIZATION)
            .ok_or_else(|| ExchangeError::invalid_request("missing Authorization header"))?
            .to_str()
            .map_err(|_| ExchangeError::invalid_request("Authorization header is not ASCII"))?;

        let (scheme, token) = value
            .trim()
            .split_once(' ')
            .ok_or_else(|| ExchangeError::invalid_request("expected 'Bearer <token>'"))?;

        if !scheme.eq_ignore_ascii_case("bearer") {
            return Err(ExchangeError::invalid_request("expected 'Bearer <token>'"));
        }

        let token = token.trim();
        if token.is_empty() {
            return Err(ExchangeError::invalid_request("bearer token is empty"));
        }

        Ok(Self {
            token: token.to_string(),
        })
    }
}

impl FromRequest for AuthToken {
    type Error = AppError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        ready(Self::parse(req).map_err(|e| {
            security::exchange_failed(e.reason(), None, false);
            AppError::from(e)
        }))
    }
}
