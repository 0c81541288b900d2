/*
 * Responsibility
 * - Router に紐づける共有コンテキスト (AppState)
 *   - ex: gate: RequestInterceptor (TokenGate など)
 * - Clone 前提で持つ (内部は Arc/Clone cheap)
 */
use std::fmt;
use std::sync::Arc;

use crate::services::gate::RequestInterceptor;

#[derive(Clone)]
pub struct AppState {
    pub gate: Arc<dyn RequestInterceptor>,
}

impl fmt::Debug for AppState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppState").finish_non_exhaustive()
    }
}

impl AppState {
    pub fn new(gate: Arc<dyn RequestInterceptor>) -> Self {
        Self { gate }
    }
}
