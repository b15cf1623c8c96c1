use actix_web::{web, HttpResponse};
use serde::Serialize;
use tracing::debug;

use crate::error::AppError;
use crate::extractors::AuthToken;
use crate::logging::pii::Redacted;
use crate::services::exchange::ExchangedUser;
use crate::state::app_state::AppState;

#[derive(Debug, Serialize)]
pub struct ExchangeResponse {
    pub token: String,
    pub user: ExchangedUser,
}

/// POST /exchange
///
/// Exchanges the bearer identity token for a session token. The service
/// records the security event; the inbound token never reaches the logs.
async fn exchange(
    auth: AuthToken,
    app_state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let outcome = app_state
        .exchange
        .exchange(&auth.token)
        .await
        .map_err(|e| {
            debug!(error = %Redacted(&e.to_string()), "Exchange failed");
            AppError::from(e)
        })?;

    Ok(HttpResponse::Ok()
        .insert_header(("Cache-Control", "no-store"))
        .json(ExchangeResponse {
            token: outcome.token,
            user: outcome.user,
        }))
}

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(web::resource("/exchange").route(web::post().to(exchange)));
}
