use actix_web::{web, HttpResponse};

use crate::error::AppError;

pub mod exchange;
pub mod health;

/// Register every route. Shared by `main.rs` and the integration tests, so
/// both exercise the same paths.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.configure(health::configure_routes);
    cfg.configure(exchange::configure_routes);
    cfg.default_service(web::to(not_found));
}

/// Unknown paths get the same JSON error body as every other failure.
async fn not_found() -> Result<HttpResponse, AppError> {
    Err(AppError::not_found("Not found"))
}
