/*
 * Responsibility
 * - gate の入出力の型 (GateRequest / Verdict / GateRejection)
 * - middleware と core の間の「契約」として固定化する
 *
 * Notes
 * - HTTP の status は axum の StatusCode をそのまま使う (JSON 化は error.rs 側)
 */
use std::fmt;

use axum::http::{HeaderMap, StatusCode};
use serde_json::{Map, Value};

/// Decoded token payload. Open-ended by design of the tokens we accept.
pub type Claims = Map<String, Value>;

pub const MSG_MISSING_HEADER: &str = "Authorization header is missing";
pub const MSG_MALFORMED_HEADER: &str = "Invalid Authorization header format";
pub const MSG_EMPTY_TOKEN: &str = "Token is missing";
pub const MSG_UNSUPPORTED_SCHEME: &str = "Unsupported authorization scheme";

/// Read-only view of an inbound request, as much as the gate needs.
#[derive(Debug, Clone, Copy)]
pub struct GateRequest<'a> {
    pub path: &'a str,
    pub headers: &'a HeaderMap,
}

impl<'a> GateRequest<'a> {
    pub fn new(path: &'a str, headers: &'a HeaderMap) -> Self {
        Self { path, headers }
    }
}

/// Which check of the verifier rejected the token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerificationFailureKind {
    Signature,
    Algorithm,
    Expired,
    Claims,
    Structure,
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectionKind {
    MissingHeader,
    MalformedHeader,
    EmptyToken,
    UnsupportedScheme,
    VerificationFailure(VerificationFailureKind),
}

impl RejectionKind {
    pub fn status(self) -> StatusCode {
        match self {
            RejectionKind::MalformedHeader => StatusCode::BAD_REQUEST,
            RejectionKind::MissingHeader
            | RejectionKind::EmptyToken
            | RejectionKind::UnsupportedScheme
            | RejectionKind::VerificationFailure(_) => StatusCode::UNAUTHORIZED,
        }
    }
}

/// Terminal answer for a request that must not reach its handler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GateRejection {
    pub kind: RejectionKind,
    pub message: String,
}

impl GateRejection {
    pub fn new(kind: RejectionKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn missing_header() -> Self {
        Self::new(RejectionKind::MissingHeader, MSG_MISSING_HEADER)
    }

    pub fn malformed_header() -> Self {
        Self::new(RejectionKind::MalformedHeader, MSG_MALFORMED_HEADER)
    }

    pub fn empty_token() -> Self {
        Self::new(RejectionKind::EmptyToken, MSG_EMPTY_TOKEN)
    }

    pub fn unsupported_scheme() -> Self {
        Self::new(RejectionKind::UnsupportedScheme, MSG_UNSUPPORTED_SCHEME)
    }

    pub fn status(&self) -> StatusCode {
        self.kind.status()
    }
}

impl fmt::Display for GateRejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.status().as_u16(), self.message)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Verdict {
    /// Continue to the handler. Claims are empty for exempt paths.
    Pass(Claims),
    Reject(GateRejection),
}

impl Verdict {
    pub fn is_pass(&self) -> bool {
        matches!(self, Verdict::Pass(_))
    }
}

/// Anything that can decide, per request, whether the pipeline continues.
///
/// `TokenGate` is the main implementation; plain closures work too, so a
/// router can be wired with a custom or composed policy explicitly.
pub trait RequestInterceptor: Send + Sync {
    fn evaluate(&self, request: &GateRequest<'_>) -> Verdict;
}

impl<F> RequestInterceptor for F
where
    F: Fn(&GateRequest<'_>) -> Verdict + Send + Sync,
{
    fn evaluate(&self, request: &GateRequest<'_>) -> Verdict {
        self(request)
    }
}
