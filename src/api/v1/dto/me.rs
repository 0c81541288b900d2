use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::api::v1::extractors::AuthCtx;
use crate::services::gate::Claims;

#[derive(Debug, Serialize)]
pub struct MeResponse {
    pub sub: Option<String>,
    pub expires_at: Option<DateTime<Utc>>,
    pub claims: Claims,
}

impl From<AuthCtx> for MeResponse {
    fn from(ctx: AuthCtx) -> Self {
        Self {
            sub: ctx.subject,
            expires_at: ctx.expires_at,
            claims: ctx.claims,
        }
    }
}
