use std::sync::Arc;

use axum::Router;
use axum::body::{Body, to_bytes};
use axum::http::{Request, StatusCode, header};
use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::{Duration, Utc};
use jsonwebtoken::{Algorithm, EncodingKey, Header, encode};
use serde_json::{Value, json};
use token_gate::app::{build_router, build_router_with, build_state};
use token_gate::config::Config;
use token_gate::services::gate::{GateRejection, GateRequest, Verdict};
use tower::ServiceExt;

const SECRET: &str = "test";

fn config() -> Config {
    Config::from_lookup(|key| match key {
        "JWT_SECRET_KEY" => Some(SECRET.to_string()),
        _ => None,
    })
    .expect("config")
}

fn app() -> Router {
    let config = config();
    let state = build_state(&config).expect("state");
    build_router(state, &config)
}

fn sign(alg: Algorithm, secret: &str, claims: &Value) -> String {
    encode(
        &Header::new(alg),
        claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .expect("sign")
}

fn get(uri: &str, authorization: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method("GET").uri(uri);
    if let Some(value) = authorization {
        builder = builder.header(header::AUTHORIZATION, value);
    }
    builder.body(Body::empty()).unwrap()
}

async fn send(app: Router, req: Request<Body>) -> (StatusCode, Value) {
    let resp = app.oneshot(req).await.unwrap();
    let status = resp.status();
    let bytes = to_bytes(resp.into_body(), 1024 * 1024).await.unwrap();
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, body)
}

#[tokio::test]
async fn root_and_health_are_exempt() {
    let (status, body) = send(app(), get("/", None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"message": "Hello"}));

    // garbage header does not matter on exempt paths
    let (status, body) = send(app(), get("/health", Some("Bearer a b"))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"status": "ok"}));
}

#[tokio::test]
async fn protected_without_header_is_401() {
    let (status, body) = send(app(), get("/api/v1/protected", None)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body, json!({"message": "Authorization header is missing"}));
}

#[tokio::test]
async fn malformed_header_is_400() {
    for value in ["Bearer", "Bearer a b"] {
        let (status, body) = send(app(), get("/api/v1/protected", Some(value))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "value {value:?}");
        assert_eq!(body, json!({"message": "Invalid Authorization header format"}));
    }
}

#[tokio::test]
async fn empty_token_is_401() {
    let (status, body) = send(app(), get("/api/v1/protected", Some("Bearer "))).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body, json!({"message": "Token is missing"}));
}

#[tokio::test]
async fn valid_token_reaches_handler() {
    let token = sign(Algorithm::HS256, SECRET, &json!({"sub": "alice"}));
    let auth = format!("Bearer {token}");

    let (status, body) = send(app(), get("/api/v1/protected", Some(&auth))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"message": "This is a protected route"}));
}

#[tokio::test]
async fn extra_whitespace_around_the_token_is_tolerated() {
    let token = sign(Algorithm::HS256, SECRET, &json!({"sub": "alice"}));
    for auth in [format!("Bearer  {token}"), format!("Bearer\t{token}")] {
        let (status, body) = send(app(), get("/api/v1/protected", Some(&auth))).await;
        assert_eq!(status, StatusCode::OK, "header {auth:?}");
        assert_eq!(body, json!({"message": "This is a protected route"}));
    }
}

#[tokio::test]
async fn me_echoes_verified_claims() {
    let exp = (Utc::now() + Duration::hours(1)).timestamp();
    let payload = json!({"sub": "alice", "company": "acme", "exp": exp});
    let token = sign(Algorithm::HS256, SECRET, &payload);
    let auth = format!("Bearer {token}");

    let (status, body) = send(app(), get("/api/v1/me", Some(&auth))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["sub"], json!("alice"));
    assert_eq!(body["claims"], payload);
    assert!(body["expires_at"].is_string());
}

#[tokio::test]
async fn bad_tokens_are_401_with_a_diagnostic() {
    let payload = json!({"sub": "alice"});
    let expired = json!({"sub": "alice", "exp": (Utc::now() - Duration::hours(1)).timestamp()});

    // {"alg":"none"} is not an algorithm the verifier knows at all
    let unsigned = format!(
        "{}.{}.",
        URL_SAFE_NO_PAD.encode(br#"{"alg":"none","typ":"JWT"}"#),
        URL_SAFE_NO_PAD.encode(payload.to_string())
    );

    let tokens = [
        sign(Algorithm::HS256, "wrong-secret", &payload),
        sign(Algorithm::HS384, SECRET, &payload),
        sign(Algorithm::HS256, SECRET, &expired),
        unsigned,
        "not-a-jwt".to_string(),
    ];

    for token in tokens {
        let auth = format!("Bearer {token}");
        let (status, body) = send(app(), get("/api/v1/protected", Some(&auth))).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED, "token {token}");
        let message = body["message"].as_str().expect("message");
        assert!(!message.is_empty());
    }
}

#[tokio::test]
async fn responses_carry_a_request_id() {
    let resp = app().oneshot(get("/api/v1/protected", None)).await.unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    assert!(resp.headers().contains_key("x-request-id"));
}

fn only_health(request: &GateRequest<'_>) -> Verdict {
    if request.path == "/health" {
        Verdict::Pass(Default::default())
    } else {
        Verdict::Reject(GateRejection::missing_header())
    }
}

#[tokio::test]
async fn custom_interceptor_can_be_wired_explicitly() {
    let config = config();
    let router = || build_router_with(Arc::new(only_health), &config);

    let (status, _) = send(router(), get("/health", None)).await;
    assert_eq!(status, StatusCode::OK);

    // "/" is exempt for the configured gate, but not for this interceptor
    let (status, body) = send(router(), get("/", None)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body, json!({"message": "Authorization header is missing"}));
}
