use actix_cors::Cors;
use actix_web::http::header;

/// Browser clients call the exchange endpoint directly from the app origin.
///
/// With no configured origins any origin is allowed and the wildcard is
/// sent; the endpoint never relies on cookies, so credentials stay off.
/// Configured origins must be http(s); `"null"` and empty entries are ignored.
pub fn cors_middleware(allowed_origins: Option<&[String]>) -> Cors {
    let mut cors = Cors::default()
        .allowed_methods(vec!["POST", "OPTIONS"])
        .allowed_headers(vec![
            header::AUTHORIZATION,
            header::CONTENT_TYPE,
            header::HeaderName::from_static("x-client-info"),
            header::HeaderName::from_static("apikey"),
        ])
        .expose_headers(vec![
            header::HeaderName::from_static("x-trace-id"),
            header::HeaderName::from_static("x-request-id"),
        ])
        .max_age(3600);

    let origins: Vec<&str> = allowed_origins
        .unwrap_or_default()
        .iter()
        .map(|s| s.trim())
        .filter(|s| !s.is_empty() && *s != "null")
        .filter(|s| s.starts_with("http://") || s.starts_with("https://"))
        .collect();

    if origins.is_empty() {
        return cors.allow_any_origin().send_wildcard();
    }

    for origin in origins {
        cors = cors.allowed_origin(origin);
    }
    cors
}
