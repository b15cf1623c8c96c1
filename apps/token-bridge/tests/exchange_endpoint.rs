mod common;
mod support;

use actix_web::http::{header, StatusCode};
use actix_web::test;
use bridge_test_support::error_body::assert_error_response;
use bridge_test_support::issuer::{jwk_set, tamper_payload, TestIssuer};
use serde_json::{json, Value};
use support::{create_test_app, inbound_claims, test_state, test_state_with, NOW, SECRET};
use token_bridge::auth::subject::SubjectMapping;
use token_bridge::services::exchange::IssuerPolicy;

fn exchange_request(token: &str) -> actix_http::Request {
    test::TestRequest::post()
        .uri("/exchange")
        .insert_header((header::AUTHORIZATION, format!("Bearer {token}")))
        .to_request()
}

/// Decode a session token with the shared secret. The frozen test clock
/// is far in the past, so expiry is not checked here.
fn decode_session(token: &str) -> Value {
    let mut validation = jsonwebtoken::Validation::new(jsonwebtoken::Algorithm::HS256);
    validation.validate_exp = false;
    validation.set_audience(&["authenticated"]);
    validation.set_issuer(&["supabase"]);
    jsonwebtoken::decode::<Value>(
        token,
        &jsonwebtoken::DecodingKey::from_secret(SECRET.as_bytes()),
        &validation,
    )
    .expect("session token verifies with the shared secret")
    .claims
}

#[actix_web::test]
async fn valid_token_is_exchanged() {
    let app = create_test_app(test_state()).build().await;
    let token = TestIssuer::primary().mint(&inbound_claims(json!({})));

    let resp = test::call_service(&app, exchange_request(&token)).await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(
        resp.headers().get(header::CACHE_CONTROL).unwrap(),
        "no-store"
    );

    let body: Value = test::read_body_json(resp).await;
    let expected_id = SubjectMapping::default()
        .local_subject_id("L9nqBaWZ")
        .unwrap()
        .to_string();
    assert_eq!(body["user"]["id"], expected_id);
    assert_eq!(body["user"]["email"], "ada@example.com");

    let session = decode_session(body["token"].as_str().unwrap());
    assert_eq!(session["sub"], expected_id);
    assert_eq!(session["email"], "ada@example.com");
    assert_eq!(session["role"], "authenticated");
    assert_eq!(session["aud"], "authenticated");
    assert_eq!(session["iat"], NOW - 30);
    assert_eq!(session["exp"], NOW + 3600);
}

#[actix_web::test]
async fn session_token_drops_provider_claims() {
    let app = create_test_app(test_state()).build().await;
    let token = TestIssuer::primary().mint(&inbound_claims(json!({})));

    let body: Value = test::read_body_json(test::call_service(&app, exchange_request(&token)).await).await;
    let session = decode_session(body["token"].as_str().unwrap());

    assert_eq!(
        common::claim_names(&session),
        ["aud", "email", "exp", "iat", "iss", "role", "sub", "user_metadata"]
    );
    assert_eq!(
        session["user_metadata"],
        json!({
            "outseta_id": "L9nqBaWZ",
            "full_name": "Ada Lovelace",
            "first_name": "Ada",
            "last_name": "Lovelace"
        })
    );
    let raw = serde_json::to_string(&session).unwrap();
    assert!(!raw.contains("outseta:"));
    assert!(!raw.contains("f8a1c0de"));
}

#[actix_web::test]
async fn repeated_logins_map_to_the_same_user() {
    let app = create_test_app(test_state()).build().await;
    let issuer = TestIssuer::primary();

    let mut ids = Vec::new();
    for (jti, iat) in [("login-1", NOW - 100), ("login-2", NOW - 10)] {
        let token = issuer.mint(&inbound_claims(json!({"jti": jti, "iat": iat})));
        let body: Value =
            test::read_body_json(test::call_service(&app, exchange_request(&token)).await).await;
        ids.push(body["user"]["id"].as_str().unwrap().to_string());
    }
    assert_eq!(ids[0], ids[1]);

    let other = issuer.mint(&inbound_claims(json!({"sub": "Zq81mPaX"})));
    let body: Value =
        test::read_body_json(test::call_service(&app, exchange_request(&other)).await).await;
    assert_ne!(body["user"]["id"], ids[0].as_str());
}

#[actix_web::test]
async fn missing_or_malformed_authorization_is_400() {
    let app = create_test_app(test_state()).build().await;

    let req = test::TestRequest::post().uri("/exchange").to_request();
    let resp = test::call_service(&app, req).await;
    assert_error_response(resp, StatusCode::BAD_REQUEST, "INVALID_REQUEST").await;

    let req = test::TestRequest::post()
        .uri("/exchange")
        .insert_header((header::AUTHORIZATION, "Basic dXNlcjpwYXNz"))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_error_response(resp, StatusCode::BAD_REQUEST, "INVALID_REQUEST").await;

    let resp = test::call_service(&app, exchange_request("not-a-jwt")).await;
    assert_error_response(resp, StatusCode::BAD_REQUEST, "INVALID_REQUEST").await;
}

#[actix_web::test]
async fn get_is_not_allowed() {
    let app = create_test_app(test_state()).build().await;
    let req = test::TestRequest::get().uri("/exchange").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::METHOD_NOT_ALLOWED);
}

#[actix_web::test]
async fn expired_token_is_401() {
    let app = create_test_app(test_state()).build().await;
    let token = TestIssuer::primary().mint(&inbound_claims(json!({"exp": NOW - 1})));

    let resp = test::call_service(&app, exchange_request(&token)).await;
    let body = assert_error_response(resp, StatusCode::UNAUTHORIZED, "TOKEN_EXPIRED").await;
    assert!(!body.error.contains(&token));
}

#[actix_web::test]
async fn premature_token_is_401() {
    let app = create_test_app(test_state()).build().await;
    let token = TestIssuer::primary().mint(&inbound_claims(json!({"nbf": NOW + 300})));

    let resp = test::call_service(&app, exchange_request(&token)).await;
    assert_error_response(resp, StatusCode::UNAUTHORIZED, "TOKEN_NOT_YET_VALID").await;
}

#[actix_web::test]
async fn tampered_token_is_401() {
    let app = create_test_app(test_state()).build().await;
    let token = TestIssuer::primary().mint(&inbound_claims(json!({})));

    let resp = test::call_service(&app, exchange_request(&tamper_payload(&token))).await;
    assert_error_response(resp, StatusCode::UNAUTHORIZED, "INVALID_SIGNATURE").await;
}

#[actix_web::test]
async fn unknown_kid_is_401() {
    let app = create_test_app(test_state()).build().await;
    let token = TestIssuer::rotated().mint(&inbound_claims(json!({})));

    let resp = test::call_service(&app, exchange_request(&token)).await;
    assert_error_response(resp, StatusCode::UNAUTHORIZED, "UNKNOWN_SIGNING_KEY").await;
}

#[actix_web::test]
async fn both_published_keys_are_accepted() {
    let primary = TestIssuer::primary();
    let rotated = TestIssuer::rotated();
    let state = test_state_with(jwk_set(&[&primary, &rotated]), IssuerPolicy::default());
    let app = create_test_app(state).build().await;

    for issuer in [&primary, &rotated] {
        let token = issuer.mint(&inbound_claims(json!({})));
        let resp = test::call_service(&app, exchange_request(&token)).await;
        assert_eq!(resp.status(), StatusCode::OK, "kid {}", issuer.kid());
    }
}

#[actix_web::test]
async fn symmetric_algorithm_forgery_is_401() {
    let app = create_test_app(test_state()).build().await;
    let token = TestIssuer::forge_hs256(TestIssuer::PRIMARY_KID, &inbound_claims(json!({})));

    let resp = test::call_service(&app, exchange_request(&token)).await;
    assert_error_response(resp, StatusCode::UNAUTHORIZED, "INVALID_SIGNATURE").await;
}

#[actix_web::test]
async fn issuer_mismatch_is_401() {
    let policy = IssuerPolicy {
        expected_issuer: Some("https://acme.outseta.com".to_string()),
        ..IssuerPolicy::default()
    };
    let app = create_test_app(test_state_with(TestIssuer::primary().jwk_set(), policy))
        .build()
        .await;

    let ok = TestIssuer::primary().mint(&inbound_claims(json!({})));
    let resp = test::call_service(&app, exchange_request(&ok)).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let foreign = TestIssuer::primary().mint(&inbound_claims(json!({"iss": "https://other.outseta.com"})));
    let resp = test::call_service(&app, exchange_request(&foreign)).await;
    assert_error_response(resp, StatusCode::UNAUTHORIZED, "ISSUER_MISMATCH").await;
}

#[actix_web::test]
async fn token_without_identity_is_401() {
    let app = create_test_app(test_state()).build().await;

    for removed in ["sub", "email"] {
        let mut overrides = serde_json::Map::new();
        overrides.insert(removed.to_string(), Value::Null);
        let token = TestIssuer::primary().mint(&inbound_claims(Value::Object(overrides)));
        let resp = test::call_service(&app, exchange_request(&token)).await;
        assert_error_response(resp, StatusCode::UNAUTHORIZED, "MISSING_IDENTITY").await;
    }
}

#[actix_web::test]
async fn error_bodies_never_echo_the_token() {
    let app = create_test_app(test_state()).build().await;
    let token = TestIssuer::rotated().mint(&inbound_claims(json!({})));

    let resp = test::call_service(&app, exchange_request(&token)).await;
    let body = test::read_body(resp).await;
    let text = std::str::from_utf8(&body).unwrap();

    for segment in token.split('.') {
        assert!(!text.contains(segment));
    }
    assert!(!text.contains(SECRET));
}
