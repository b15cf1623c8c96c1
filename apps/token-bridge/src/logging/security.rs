use tracing::{info, warn};

use crate::logging::pii::Redacted;
use crate::trace_ctx;

/// Log a rejected exchange. Only the failure reason is recorded, never the
/// token or its claims.
pub fn exchange_failed(reason: &str, email: Option<&str>, token_present: bool) {
    let trace_id = trace_ctx::trace_id();

    warn!(
        event = "SECURITY_EXCHANGE_FAILED",
        %trace_id,
        email = %email.map(Redacted).unwrap_or(Redacted("")),
        reason,
        token_present,
        "Token exchange rejected"
    );
}

/// Log a completed exchange.
pub fn exchange_succeeded(subject: &str, email: &str) {
    let trace_id = trace_ctx::trace_id();

    info!(
        event = "SECURITY_EXCHANGE_SUCCEEDED",
        %trace_id,
        subject,
        email = %Redacted(email),
        "Token exchanged"
    );
}
