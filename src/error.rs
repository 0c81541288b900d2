/*
 * Responsibility
 * - アプリ共通の AppError 定義
 * - IntoResponse 実装 (HTTP status / JSON error body)
 * - gate の拒否 (GateRejection) をそのまま status + message に変換
 */
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

use crate::services::gate::GateRejection;

/// Every error body this service produces: `{"message": "..."}`.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub message: String,
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error("{}", .0.message)]
    Rejected(GateRejection),
    #[error("{resource} not found")]
    NotFound { resource: &'static str },
    #[error("internal server error")]
    Internal,
}

impl AppError {
    pub fn not_found(resource: &'static str) -> Self {
        Self::NotFound { resource }
    }
}

impl From<GateRejection> for AppError {
    fn from(rejection: GateRejection) -> Self {
        Self::Rejected(rejection)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self {
            AppError::Rejected(rejection) => rejection.status(),
            AppError::NotFound { .. } => StatusCode::NOT_FOUND,
            AppError::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = ErrorResponse {
            message: self.to_string(),
        };

        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejection_keeps_status_and_message() {
        let response = AppError::from(GateRejection::malformed_header()).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let err = AppError::from(GateRejection::missing_header());
        assert_eq!(err.to_string(), "Authorization header is missing");
    }

    #[test]
    fn internal_is_500() {
        assert_eq!(
            AppError::Internal.into_response().status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(AppError::not_found("route").to_string(), "route not found");
    }
}
