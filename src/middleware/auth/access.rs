//! bearer token 検証 (TokenGate) → AuthCtx を extensions に入れる
//!
//! - 判定ロジックは `services::gate` 側 (RequestInterceptor) に閉じ込める
//! - ここは axum の Request を `GateRequest` に写して、結果を Response に変換するだけ
//! - Reject は `{"message": ...}` + 400/401 でパイプラインを打ち切る

use axum::{
    Router,
    body::Body,
    extract::State,
    http::Request,
    middleware::{self, Next},
    response::Response,
};
use tracing::warn;

use crate::api::v1::extractors::AuthCtx;
use crate::error::AppError;
use crate::services::gate::{GateRequest, Verdict};
use crate::state::AppState;

/// router 配下の全 route に gate を掛ける。
///
/// 例：
/// ```ignore
/// let router = Router::new().route("/", get(root)).nest("/api/v1", api::v1::routes());
/// let router = middleware::auth::access::apply(router, state.clone());
/// let app = router.with_state(state);
/// ```
pub fn apply(router: Router<AppState>, state: AppState) -> Router<AppState> {
    // axum 0.8 の from_fn は State extractor を受け取れないため、`from_fn_with_state` で明示的に state を渡す
    router.layer(middleware::from_fn_with_state(state, access_middleware))
}

async fn access_middleware(
    State(state): State<AppState>,
    mut req: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    let verdict = state
        .gate
        .evaluate(&GateRequest::new(req.uri().path(), req.headers()));

    match verdict {
        Verdict::Pass(claims) => {
            // middleware → extractor への受け渡し
            req.extensions_mut().insert(AuthCtx::from_claims(claims));
            Ok(next.run(req).await)
        }
        Verdict::Reject(rejection) => {
            warn!(
                path = req.uri().path(),
                kind = ?rejection.kind,
                status = rejection.status().as_u16(),
                reason = %rejection.message,
                "request rejected by token gate"
            );
            Err(AppError::Rejected(rejection))
        }
    }
}
