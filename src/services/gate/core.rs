//! Token gate - core decision procedure.
//!
//! This module is "core-only": it knows nothing about axum middleware or
//! responses. The middleware hands it a `GateRequest` and renders the
//! resulting `Verdict`.

use axum::http::header;
use tracing::debug;

use crate::config::GateConfig;
use crate::services::gate::types::{
    Claims, GateRejection, GateRequest, RejectionKind, RequestInterceptor, Verdict,
};
use crate::services::gate::verifier::{GateConfigError, TokenVerifier};

/// Path allow-list. Entries ending in `/*` match the prefix and everything below it.
#[derive(Debug, Clone, Default)]
pub struct ExemptPaths {
    exact: Vec<String>,
    prefixes: Vec<String>,
}

impl ExemptPaths {
    pub fn new<I, S>(paths: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut exempt = Self::default();
        for path in paths {
            let path = path.as_ref();
            match path.strip_suffix("/*") {
                Some(prefix) => exempt.prefixes.push(prefix.to_string()),
                None => exempt.exact.push(path.to_string()),
            }
        }
        exempt
    }

    pub fn matches(&self, path: &str) -> bool {
        if self.exact.iter().any(|p| p == path) {
            return true;
        }
        self.prefixes.iter().any(|prefix| {
            path.strip_prefix(prefix.as_str())
                .is_some_and(|rest| rest.is_empty() || rest.starts_with('/'))
        })
    }
}

/// Split `"<scheme> <token>"` on whitespace runs, ignoring leading/trailing whitespace.
///
/// A lone scheme followed by whitespace (`"Bearer "`) means the token is missing;
/// any other count than two parts is a malformed header.
fn split_authorization(value: &str) -> Result<(&str, &str), GateRejection> {
    let mut parts = value.split_whitespace();
    match (parts.next(), parts.next(), parts.next()) {
        (Some(scheme), Some(token), None) => Ok((scheme, token)),
        (Some(_), None, None) if value.ends_with(char::is_whitespace) => {
            Err(GateRejection::empty_token())
        }
        _ => Err(GateRejection::malformed_header()),
    }
}

#[derive(Debug, Clone)]
pub struct TokenGate {
    exempt: ExemptPaths,
    require_bearer_scheme: bool,
    verifier: TokenVerifier,
}

impl TokenGate {
    pub fn new(config: &GateConfig) -> Result<Self, GateConfigError> {
        Ok(Self {
            exempt: ExemptPaths::new(&config.exempt_paths),
            require_bearer_scheme: config.require_bearer_scheme,
            verifier: TokenVerifier::new(config)?,
        })
    }

    /// exempt → header presence → header shape → signature, each step terminal.
    pub fn evaluate(&self, request: &GateRequest<'_>) -> Verdict {
        if self.exempt.matches(request.path) {
            return Verdict::Pass(Claims::new());
        }

        match self.authenticate(request) {
            Ok(claims) => Verdict::Pass(claims),
            Err(rejection) => Verdict::Reject(rejection),
        }
    }

    fn authenticate(&self, request: &GateRequest<'_>) -> Result<Claims, GateRejection> {
        let value = request
            .headers
            .get(header::AUTHORIZATION)
            .ok_or_else(GateRejection::missing_header)?
            .to_str()
            .map_err(|_| GateRejection::malformed_header())?;

        let (scheme, token) = split_authorization(value)?;

        if self.require_bearer_scheme && !scheme.eq_ignore_ascii_case("bearer") {
            return Err(GateRejection::unsupported_scheme());
        }

        let claims = self.verifier.verify(token).map_err(|err| {
            GateRejection::new(RejectionKind::VerificationFailure(err.kind()), err.to_string())
        })?;

        debug!(
            path = request.path,
            sub = ?claims.get("sub"),
            claim_count = claims.len(),
            "bearer token verified"
        );

        Ok(claims)
    }
}

impl RequestInterceptor for TokenGate {
    fn evaluate(&self, request: &GateRequest<'_>) -> Verdict {
        TokenGate::evaluate(self, request)
    }
}
