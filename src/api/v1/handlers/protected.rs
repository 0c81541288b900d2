/*
 * Responsibility
 * - gate の内側にある route (Authorization: Bearer <jwt> 必須)
 * - /protected は疎通確認、/me は検証済み claims をそのまま返す
 */
use axum::{Json, http::StatusCode, response::IntoResponse};
use serde_json::json;
use tracing::debug;

use crate::api::v1::{dto::me::MeResponse, extractors::AuthCtxExtractor};

pub async fn protected() -> impl IntoResponse {
    (
        StatusCode::OK,
        Json(json!({"message": "This is a protected route"})),
    )
}

pub async fn me(AuthCtxExtractor(ctx): AuthCtxExtractor) -> Json<MeResponse> {
    debug!(sub = ?ctx.subject, "me");
    Json(MeResponse::from(ctx))
}
