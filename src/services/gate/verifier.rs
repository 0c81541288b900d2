use std::collections::HashSet;
use std::fmt;

use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, Validation};
use thiserror::Error;

use crate::config::GateConfig;
use crate::services::gate::types::{Claims, VerificationFailureKind};

/// Key families. One configured key can only serve one of them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum KeyFamily {
    Hmac,
    Rsa,
    Ec,
    Ed,
}

fn key_family(alg: Algorithm) -> Option<KeyFamily> {
    match alg {
        Algorithm::HS256 | Algorithm::HS384 | Algorithm::HS512 => Some(KeyFamily::Hmac),
        Algorithm::RS256
        | Algorithm::RS384
        | Algorithm::RS512
        | Algorithm::PS256
        | Algorithm::PS384
        | Algorithm::PS512 => Some(KeyFamily::Rsa),
        Algorithm::ES256 | Algorithm::ES384 => Some(KeyFamily::Ec),
        Algorithm::EdDSA => Some(KeyFamily::Ed),
        #[allow(unreachable_patterns)]
        _ => None,
    }
}

/// Problems with the gate configuration, detected once at startup.
#[derive(Debug, Error)]
pub enum GateConfigError {
    #[error("no signing algorithm is allowed")]
    NoAlgorithms,
    #[error("unsupported signing algorithm: {0:?}")]
    UnsupportedAlgorithm(Algorithm),
    #[error("allowed algorithms mix key families: {0:?}")]
    MixedKeyFamilies(Vec<Algorithm>),
    #[error("secret or key is empty")]
    EmptyKey,
    #[error("invalid key material for {family}: {source}")]
    InvalidKey {
        family: &'static str,
        source: jsonwebtoken::errors::Error,
    },
}

/// Token verification failure. `Display` is the verifier's own diagnostic.
#[derive(Debug, Error)]
#[error("{source}")]
pub struct VerifyError {
    kind: VerificationFailureKind,
    #[source]
    source: jsonwebtoken::errors::Error,
}

impl VerifyError {
    pub fn kind(&self) -> VerificationFailureKind {
        self.kind
    }
}

impl From<jsonwebtoken::errors::Error> for VerifyError {
    fn from(source: jsonwebtoken::errors::Error) -> Self {
        let kind = match source.kind() {
            ErrorKind::InvalidSignature => VerificationFailureKind::Signature,
            ErrorKind::InvalidAlgorithm | ErrorKind::MissingAlgorithm => {
                VerificationFailureKind::Algorithm
            }
            ErrorKind::ExpiredSignature | ErrorKind::ImmatureSignature => {
                VerificationFailureKind::Expired
            }
            ErrorKind::InvalidIssuer
            | ErrorKind::InvalidAudience
            | ErrorKind::InvalidSubject
            | ErrorKind::MissingRequiredClaim(_) => VerificationFailureKind::Claims,
            ErrorKind::InvalidToken
            | ErrorKind::Base64(_)
            | ErrorKind::Json(_)
            | ErrorKind::Utf8(_) => VerificationFailureKind::Structure,
            _ => VerificationFailureKind::Other,
        };
        Self { kind, source }
    }
}

/// Compact JWS verifier: signature, algorithm allow-list, structure and the
/// standard time/issuer/audience claims.
///
/// - Key material is intentionally not printable via Debug.
#[derive(Clone)]
pub struct TokenVerifier {
    decoding_key: DecodingKey,
    validation: Validation,
}

impl fmt::Debug for TokenVerifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Do not print key material
        f.debug_struct("TokenVerifier")
            .field("validation", &self.validation)
            .finish()
    }
}

impl TokenVerifier {
    pub fn new(config: &GateConfig) -> Result<Self, GateConfigError> {
        let first = *config
            .allowed_algorithms
            .first()
            .ok_or(GateConfigError::NoAlgorithms)?;

        let family = key_family(first).ok_or(GateConfigError::UnsupportedAlgorithm(first))?;
        for alg in &config.allowed_algorithms {
            match key_family(*alg) {
                Some(f) if f == family => {}
                Some(_) => {
                    return Err(GateConfigError::MixedKeyFamilies(
                        config.allowed_algorithms.clone(),
                    ));
                }
                None => return Err(GateConfigError::UnsupportedAlgorithm(*alg)),
            }
        }

        if config.secret_or_key.is_empty() {
            return Err(GateConfigError::EmptyKey);
        }
        let key = config.secret_or_key.as_bytes();

        let decoding_key = match family {
            KeyFamily::Hmac => DecodingKey::from_secret(key),
            KeyFamily::Rsa => DecodingKey::from_rsa_pem(key).map_err(|source| {
                GateConfigError::InvalidKey {
                    family: "rsa",
                    source,
                }
            })?,
            KeyFamily::Ec => DecodingKey::from_ec_pem(key).map_err(|source| {
                GateConfigError::InvalidKey {
                    family: "ec",
                    source,
                }
            })?,
            KeyFamily::Ed => DecodingKey::from_ed_pem(key).map_err(|source| {
                GateConfigError::InvalidKey {
                    family: "ed25519",
                    source,
                }
            })?,
        };

        let mut validation = Validation::new(first);
        validation.algorithms = config.allowed_algorithms.clone();
        // exp は「あれば検証」。必須にするかは required_claims で決める
        validation.required_spec_claims = config
            .required_claims
            .iter()
            .cloned()
            .collect::<HashSet<_>>();
        validation.validate_exp = config.validate_exp;
        validation.validate_nbf = config.validate_exp;
        validation.leeway = config.leeway_seconds;

        // 設定された iss/aud はトークン側にも必須
        if let Some(issuer) = &config.issuer {
            validation.set_issuer(&[issuer]);
            validation.required_spec_claims.insert("iss".to_string());
        }
        match &config.audience {
            Some(audience) => {
                validation.set_audience(&[audience]);
                validation.required_spec_claims.insert("aud".to_string());
            }
            None => validation.validate_aud = false,
        }

        Ok(Self {
            decoding_key,
            validation,
        })
    }

    /// Verify and decode a compact token into its claims.
    pub fn verify(&self, token: &str) -> Result<Claims, VerifyError> {
        let data = jsonwebtoken::decode::<Claims>(token, &self.decoding_key, &self.validation)?;
        Ok(data.claims)
    }
}
