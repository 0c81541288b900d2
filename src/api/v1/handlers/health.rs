/*
 * Responsibility
 * - GET / と GET /health (疎通用)
 * - 既定では gate の除外パス (Authorization 不要)
 */
use axum::{Json, http::StatusCode, response::IntoResponse};
use serde_json::json;

pub async fn root() -> impl IntoResponse {
    (StatusCode::OK, Json(json!({"message": "Hello"})))
}

pub async fn health() -> impl IntoResponse {
    (StatusCode::OK, Json(json!({"status": "ok"})))
}
