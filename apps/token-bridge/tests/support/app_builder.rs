use actix_http::Request;
use actix_web::body::MessageBody;
use actix_web::dev::{Service, ServiceResponse};
use actix_web::{test, web, App, Error};
use token_bridge::middleware::cors::cors_middleware;
use token_bridge::middleware::request_trace::RequestTrace;
use token_bridge::middleware::structured_logger::StructuredLogger;
use token_bridge::middleware::trace_span::TraceSpan;
use token_bridge::routes;
use token_bridge::state::app_state::AppState;

/// Builder for test Actix services wired like `main.rs`.
pub struct TestAppBuilder {
    state: AppState,
    allowed_origins: Option<Vec<String>>,
}

impl TestAppBuilder {
    pub fn new(state: AppState) -> Self {
        Self {
            state,
            allowed_origins: None,
        }
    }

    /// Restrict CORS to `origins` instead of allowing any origin.
    pub fn with_allowed_origins(mut self, origins: &[&str]) -> Self {
        self.allowed_origins = Some(origins.iter().map(|o| o.to_string()).collect());
        self
    }

    pub async fn build(
        self,
    ) -> impl Service<Request, Response = ServiceResponse<impl MessageBody>, Error = Error> {
        let data = web::Data::new(self.state);
        let allowed_origins = self.allowed_origins;

        test::init_service(
            App::new()
                .wrap(cors_middleware(allowed_origins.as_deref()))
                .wrap(StructuredLogger)
                .wrap(TraceSpan)
                .wrap(RequestTrace)
                .app_data(data)
                .configure(routes::configure),
        )
        .await
    }
}

pub fn create_test_app(state: AppState) -> TestAppBuilder {
    TestAppBuilder::new(state)
}
