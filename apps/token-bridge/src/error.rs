use actix_web::error::ResponseError;
use actix_web::http::StatusCode;
use actix_web::HttpResponse;
use serde::Serialize;
use thiserror::Error;

use crate::errors::{ErrorCode, ExchangeError};
use crate::trace_ctx;

/// JSON body returned for every failed request.
#[derive(Serialize)]
pub struct ErrorBody {
    pub error: String,
    pub code: String,
    pub trace_id: String,
}

/// Error type returned by handlers and extractors.
///
/// Each variant fixes the HTTP status; `code` selects the body's `code`.
/// `detail` is for logs and is shown to callers only for 4xx variants.
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Bad request: {detail}")]
    BadRequest { code: ErrorCode, detail: String },
    #[error("Unauthorized: {detail}")]
    Unauthorized { code: ErrorCode, detail: String },
    #[error("Not found: {detail}")]
    NotFound { detail: String },
    #[error("Bad gateway: {detail}")]
    BadGateway { code: ErrorCode, detail: String },
    #[error("Internal error: {detail}")]
    Internal { code: ErrorCode, detail: String },
    #[error("Configuration error: {detail}")]
    Config { detail: String },
}

impl AppError {
    /// Error code surfaced in the response body
    pub fn code(&self) -> ErrorCode {
        match self {
            AppError::BadRequest { code, .. } => *code,
            AppError::Unauthorized { code, .. } => *code,
            AppError::NotFound { .. } => ErrorCode::NotFound,
            AppError::BadGateway { code, .. } => *code,
            AppError::Internal { code, .. } => *code,
            AppError::Config { .. } => ErrorCode::ConfigError,
        }
    }

    /// Caller-facing message. Internal and configuration details stay in logs.
    fn public_message(&self) -> String {
        match self {
            AppError::BadRequest { detail, .. } => detail.clone(),
            AppError::Unauthorized { detail, .. } => detail.clone(),
            AppError::NotFound { detail } => detail.clone(),
            AppError::BadGateway { .. } => {
                "Identity provider is unavailable, please try again".to_string()
            }
            AppError::Internal { .. } | AppError::Config { .. } => {
                "Internal server error".to_string()
            }
        }
    }

    /// Get the HTTP status code for this error
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::BadRequest { .. } => StatusCode::BAD_REQUEST,
            AppError::Unauthorized { .. } => StatusCode::UNAUTHORIZED,
            AppError::NotFound { .. } => StatusCode::NOT_FOUND,
            AppError::BadGateway { .. } => StatusCode::BAD_GATEWAY,
            AppError::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Config { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn bad_request(code: ErrorCode, detail: impl Into<String>) -> Self {
        Self::BadRequest {
            code,
            detail: detail.into(),
        }
    }

    pub fn unauthorized(code: ErrorCode, detail: impl Into<String>) -> Self {
        Self::Unauthorized {
            code,
            detail: detail.into(),
        }
    }

    pub fn internal(detail: impl Into<String>) -> Self {
        Self::Internal {
            code: ErrorCode::Internal,
            detail: detail.into(),
        }
    }

    pub fn config(detail: impl Into<String>) -> Self {
        Self::Config {
            detail: detail.into(),
        }
    }

    pub fn not_found(detail: impl Into<String>) -> Self {
        Self::NotFound {
            detail: detail.into(),
        }
    }
}

impl From<ExchangeError> for AppError {
    fn from(e: ExchangeError) -> Self {
        match e {
            ExchangeError::InvalidRequest(detail) => {
                AppError::bad_request(ErrorCode::InvalidRequest, format!("Invalid request: {detail}"))
            }
            ExchangeError::UnknownSigningKey { .. } => AppError::unauthorized(
                ErrorCode::UnknownSigningKey,
                "Authentication failed: token signed with an unknown key",
            ),
            ExchangeError::InvalidSignature(_) => AppError::unauthorized(
                ErrorCode::InvalidSignature,
                "Authentication failed: invalid token signature",
            ),
            ExchangeError::TokenExpired => {
                AppError::unauthorized(ErrorCode::TokenExpired, "Authentication failed: token expired")
            }
            ExchangeError::TokenNotYetValid => AppError::unauthorized(
                ErrorCode::TokenNotYetValid,
                "Authentication failed: token not yet valid",
            ),
            ExchangeError::IssuerMismatch => AppError::unauthorized(
                ErrorCode::IssuerMismatch,
                "Authentication failed: unexpected token issuer",
            ),
            ExchangeError::MissingIdentity(_) => AppError::unauthorized(
                ErrorCode::MissingIdentity,
                "Authentication failed: token does not identify a user",
            ),
            ExchangeError::UpstreamUnavailable(detail) => AppError::BadGateway {
                code: ErrorCode::UpstreamUnavailable,
                detail,
            },
            ExchangeError::SigningConfiguration(detail) => AppError::Internal {
                code: ErrorCode::SigningConfiguration,
                detail,
            },
            ExchangeError::Internal(detail) => AppError::internal(detail),
        }
    }
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        self.status()
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status();
        let trace_id = trace_ctx::trace_id();

        let body = ErrorBody {
            error: self.public_message(),
            code: self.code().to_string(),
            trace_id: trace_id.clone(),
        };

        let mut response = HttpResponse::build(status)
            .insert_header(("x-trace-id", trace_id))
            .json(body);
        // Read back by `StructuredLogger`.
        response.extensions_mut().insert(self.code());
        response
    }
}
