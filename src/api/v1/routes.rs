/*
 * Responsibility
 * - v1 の URL 構造を定義
 * - gate は app.rs で router 全体に掛けるので、ここでは route の列挙だけ
 */
use axum::{Router, routing::get};

use crate::api::v1::handlers::protected::{me, protected};
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/protected", get(protected))
        .route("/me", get(me))
}
