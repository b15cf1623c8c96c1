use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Filter used when `RUST_LOG` is unset. Connection-level chatter from the
/// HTTP stacks is kept at warn so security events stand out.
const DEFAULT_FILTER: &str = "info,actix_server=warn,reqwest=warn,hyper=warn,hyper_util=warn";

/// JSON logs on stdout, one object per line.
///
/// Each event carries its enclosing `request` span (`trace_id`, `method`,
/// `route`), so key-refresh and signature logs can be tied to the request
/// that caused them.
pub fn init_tracing() {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    let fmt_layer = fmt::layer()
        .json()
        .with_current_span(true)
        .with_span_list(false)
        .with_target(true)
        .with_ansi(false);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .init();
}
