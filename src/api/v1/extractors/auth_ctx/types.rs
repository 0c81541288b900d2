/*
 * Responsibility
 * - Handler から見える「認証済みコンテキスト」の型
 * - middleware が gate を通したあと request extensions に格納し、handler はこの型だけを受け取る
 *
 * Notes
 * - 署名検証やヘッダ解析は services::gate 側の責務
 * - claims は型を固定しない (JSON map のまま)。よく使う sub/exp だけ持ち上げる
 */
use chrono::{DateTime, Utc};
use serde_json::Value;

use crate::services::gate::Claims;

/// gate を通過したリクエストに付与されるコンテキスト
///
/// - 除外パス (exempt) では `claims` は空
/// - `subject` は `sub` が文字列のときだけ入る
#[derive(Debug, Clone, Default)]
pub struct AuthCtx {
    pub subject: Option<String>,
    pub expires_at: Option<DateTime<Utc>>,
    pub claims: Claims,
}

impl AuthCtx {
    pub fn from_claims(claims: Claims) -> Self {
        let subject = claims
            .get("sub")
            .and_then(Value::as_str)
            .map(str::to_owned);
        let expires_at = claims
            .get("exp")
            .and_then(Value::as_i64)
            .and_then(|secs| DateTime::from_timestamp(secs, 0));

        Self {
            subject,
            expires_at,
            claims,
        }
    }

    pub fn is_anonymous(&self) -> bool {
        self.claims.is_empty()
    }
}
