use actix_web::{web, App, HttpServer};
use token_bridge::config::BridgeConfig;
use token_bridge::infra::state::StateBuilder;
use token_bridge::middleware::cors::cors_middleware;
use token_bridge::middleware::request_trace::RequestTrace;
use token_bridge::middleware::structured_logger::StructuredLogger;
use token_bridge::middleware::trace_span::TraceSpan;
use token_bridge::routes;
use tracing::{error, info};

mod telemetry;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    telemetry::init_tracing();

    // Environment variables must be set by the runtime environment
    // (container env, or `set -a; . ./.env; set +a` locally).
    let config = match BridgeConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            error!(error = %e, "Invalid configuration");
            eprintln!("❌ {e}");
            std::process::exit(1);
        }
    };

    let app_state = match StateBuilder::from_config(&config).and_then(StateBuilder::build) {
        Ok(state) => state,
        Err(e) => {
            error!(error = %e, "Failed to build application state");
            eprintln!("❌ Failed to build application state: {e}");
            std::process::exit(1);
        }
    };

    info!(
        host = %config.host,
        port = config.port,
        jwks_url = %config.jwks_url,
        issuer_check = config.expected_issuer.is_some(),
        cache_ttl_secs = config.cache_ttl.as_secs(),
        "Starting token bridge"
    );

    let data = web::Data::new(app_state);
    let allowed_origins = config.allowed_origins.clone();

    HttpServer::new(move || {
        App::new()
            .wrap(cors_middleware(allowed_origins.as_deref()))
            .wrap(StructuredLogger)
            .wrap(TraceSpan)
            .wrap(RequestTrace)
            .app_data(data.clone())
            .configure(routes::configure)
    })
    .bind((config.host.as_str(), config.port))?
    .run()
    .await
}
