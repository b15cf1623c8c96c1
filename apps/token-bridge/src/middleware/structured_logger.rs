use std::future::{ready, Ready};
use std::time::Instant;

use actix_web::dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform};
use actix_web::Error as ActixError;
use futures_util::future::LocalBoxFuture;
use tracing::{error, info, warn};

use crate::errors::ErrorCode;
use crate::trace_ctx;

/// Emits one `request_completed` event per request.
///
/// The event names the matched route pattern rather than the raw path, so
/// probing requests cannot push arbitrary text into the logs. Failed requests
/// carry the `ErrorCode` that `AppError` stores in the response extensions,
/// which makes a rejected exchange searchable by code without reading the
/// security events.
pub struct StructuredLogger;

impl<S, B> Transform<S, ServiceRequest> for StructuredLogger
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = ActixError>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = ActixError;
    type InitError = ();
    type Transform = StructuredLoggerMiddleware<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(StructuredLoggerMiddleware { service }))
    }
}

pub struct StructuredLoggerMiddleware<S> {
    service: S,
}

impl<S, B> Service<ServiceRequest> for StructuredLoggerMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = ActixError>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = ActixError;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let start = Instant::now();
        let method = req.method().to_string();
        let route = req
            .match_pattern()
            .unwrap_or_else(|| "<unmatched>".to_string());

        let fut = self.service.call(req);

        Box::pin(async move {
            let result = fut.await;

            let (status, code) = match &result {
                Ok(res) => (
                    res.status(),
                    res.response().extensions().get::<ErrorCode>().copied(),
                ),
                Err(err) => (err.as_response_error().status_code(), None),
            };

            let completion = Completion {
                method,
                route,
                status: status.as_u16(),
                code,
                duration_ms: start.elapsed().as_millis() as u64,
            };
            if status.is_server_error() {
                completion.log(Severity::Error);
            } else if status.is_client_error() {
                completion.log(Severity::Warn);
            } else {
                completion.log(Severity::Info);
            }

            result
        })
    }
}

enum Severity {
    Info,
    Warn,
    Error,
}

struct Completion {
    method: String,
    route: String,
    status: u16,
    code: Option<ErrorCode>,
    duration_ms: u64,
}

impl Completion {
    fn log(&self, severity: Severity) {
        let trace_id = trace_ctx::trace_id();
        let code = self.code.as_ref().map(ErrorCode::as_str).unwrap_or("-");
        let Completion {
            method,
            route,
            status,
            duration_ms,
            ..
        } = self;

        match severity {
            Severity::Info => {
                info!(http.method = %method, http.route = %route, http.status_code = status, error.code = code, duration_ms, %trace_id, "request_completed")
            }
            Severity::Warn => {
                warn!(http.method = %method, http.route = %route, http.status_code = status, error.code = code, duration_ms, %trace_id, "request_completed")
            }
            Severity::Error => {
                error!(http.method = %method, http.route = %route, http.status_code = status, error.code = code, duration_ms, %trace_id, "request_completed")
            }
        }
    }
}
