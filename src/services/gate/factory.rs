//! Factory: build `TokenGate` from application `Config`.
use std::sync::Arc;

use tracing::{error, info};

use crate::config::Config;
use crate::error::AppError;
use crate::services::gate::TokenGate;

pub fn build_token_gate(config: &Config) -> Result<Arc<TokenGate>, AppError> {
    let gate = TokenGate::new(&config.gate).map_err(|e| {
        error!(error = %e, "invalid token gate configuration");
        AppError::Internal
    })?;

    info!(
        algorithms = ?config.gate.allowed_algorithms,
        exempt_paths = ?config.gate.exempt_paths,
        require_bearer_scheme = config.gate.require_bearer_scheme,
        "token gate ready"
    );

    Ok(Arc::new(gate))
}
