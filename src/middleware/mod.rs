/*
 * Responsibility
 * - middleware の公開インターフェース
 * - auth (token gate), http (request-id / trace / limit / timeout)
 */
pub mod auth;
pub mod http;
