//! Assertions on the error envelope `{error, code, trace_id}`.

use actix_web::body::{to_bytes, MessageBody};
use actix_web::dev::ServiceResponse;
use actix_web::http::StatusCode;
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct ErrorBody {
    pub error: String,
    pub code: String,
    pub trace_id: String,
}

/// Check status and code, that `x-trace-id` matches the body, and return
/// the parsed body for further assertions.
pub async fn assert_error_response<B: MessageBody>(
    resp: ServiceResponse<B>,
    expected_status: StatusCode,
    expected_code: &str,
) -> ErrorBody {
    assert_eq!(resp.status(), expected_status, "unexpected status");

    let header_trace_id = resp
        .headers()
        .get("x-trace-id")
        .and_then(|v| v.to_str().ok())
        .map(str::to_owned)
        .expect("error responses carry x-trace-id");

    let content_type = resp
        .headers()
        .get("content-type")
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_owned();
    assert!(
        content_type.starts_with("application/json"),
        "error body must be JSON, got {content_type}"
    );

    let bytes = to_bytes(resp.into_body())
        .await
        .unwrap_or_else(|_| panic!("error body is readable"));
    let body: ErrorBody = serde_json::from_slice(&bytes).expect("error body matches envelope");

    assert_eq!(body.code, expected_code);
    assert!(!body.error.is_empty(), "error message must be present");
    assert_eq!(body.trace_id, header_trace_id, "trace id header and body differ");

    body
}
