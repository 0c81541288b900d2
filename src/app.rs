/*
 * Responsibility
 * - Config読み込み → 依存生成 (TokenGate) → Router 組み立て
 * - Middleware の適用 (token gate, request-id/trace/limit/timeout)
 * - axum::serve() で起動
 */
use std::{panic, process, sync::Arc};

use anyhow::Result;
use axum::{Router, routing::get};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::api;
use crate::api::v1::handlers::health::{health, root};
use crate::config::Config;
use crate::error::AppError;
use crate::middleware;
use crate::services::gate::{RequestInterceptor, build_token_gate};
use crate::state::AppState;

fn init_tracing() {
    // Prefer RUST_LOG if set; otherwise use a sensible default.
    // Ex:
    // RUST_LOG=info,token_gate=debug,tower_http=debug cargo run
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info,tower_http=info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

fn init_panic_hook(abort_on_panic: bool) {
    // Keep the default hook as a fallback (prints to stderr with location/payload).
    let default_hook = panic::take_hook();

    panic::set_hook(Box::new(move |info| {
        tracing::error!(?info, "panic");

        // development では即落として気づけるようにする
        if abort_on_panic {
            process::abort();
        } else {
            default_hook(info);
        }
    }))
}

pub async fn run() -> Result<()> {
    init_tracing();
    let config = Config::from_env()?;
    init_panic_hook(!config.app_env.is_production());

    tracing::info!(
        "starting token gate in {:?} mode on {}",
        config.app_env,
        config.addr
    );

    let state = build_state(&config)?;
    let app = build_router(state, &config);

    let listener = tokio::net::TcpListener::bind(config.addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

pub fn build_state(config: &Config) -> Result<AppState, AppError> {
    let gate = build_token_gate(config)?;
    Ok(AppState::new(gate))
}

async fn fallback() -> AppError {
    AppError::not_found("route")
}

/// Full router: every route (and the fallback) sits behind the gate,
/// and the gate sits behind the HTTP-level layers.
pub fn build_router(state: AppState, config: &Config) -> Router {
    let router = Router::new()
        .route("/", get(root))
        .route("/health", get(health))
        .nest("/api/v1", api::v1::routes())
        .fallback(fallback);

    let router = middleware::auth::access::apply(router, state.clone()).with_state(state);

    middleware::http::apply(router, &config.http)
}

/// Router wired with an arbitrary interceptor instead of the configured `TokenGate`.
pub fn build_router_with(gate: Arc<dyn RequestInterceptor>, config: &Config) -> Router {
    build_router(AppState::new(gate), config)
}
