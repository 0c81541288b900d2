/*
 * Responsibility
 * - 環境変数や設定の読み込み (bind address, gate の鍵/アルゴリズム/除外パスなど)
 * - 設定値のバリデーション (不足なら起動失敗)
 */
use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::str::FromStr;
use std::time::Duration;

use jsonwebtoken::Algorithm;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnv {
    Development,
    Production,
}

impl AppEnv {
    fn parse(value: Option<String>) -> Self {
        match value
            .unwrap_or_else(|| "development".to_string())
            .to_ascii_lowercase()
            .as_str()
        {
            "production" | "prod" => Self::Production,
            _ => Self::Development,
        }
    }

    pub fn is_production(&self) -> bool {
        matches!(self, Self::Production)
    }
}

#[derive(Debug, PartialEq, Eq)]
pub enum ConfigError {
    Missing(&'static str),
    Invalid(&'static str),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Missing(key) => write!(f, "missing configuration: {}", key),
            ConfigError::Invalid(key) => write!(f, "invalid configuration: {}", key),
        }
    }
}

impl std::error::Error for ConfigError {}

/// Transport knobs consumed by `middleware::http`.
#[derive(Debug, Clone)]
pub struct HttpConfig {
    pub timeout: Duration,
    pub body_limit_bytes: usize,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            body_limit_bytes: 1024 * 1024,
        }
    }
}

/// Everything the token gate reads at startup.
///
/// `secret_or_key` is the raw HMAC secret for `HS*` algorithms, or a PEM
/// encoded public key for the asymmetric families.
#[derive(Clone)]
pub struct GateConfig {
    pub secret_or_key: String,
    pub allowed_algorithms: Vec<Algorithm>,
    pub exempt_paths: Vec<String>,
    pub require_bearer_scheme: bool,
    pub validate_exp: bool,
    pub leeway_seconds: u64,
    pub issuer: Option<String>,
    pub audience: Option<String>,
    pub required_claims: Vec<String>,
}

impl fmt::Debug for GateConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Do not print key material
        f.debug_struct("GateConfig")
            .field("allowed_algorithms", &self.allowed_algorithms)
            .field("exempt_paths", &self.exempt_paths)
            .field("require_bearer_scheme", &self.require_bearer_scheme)
            .field("validate_exp", &self.validate_exp)
            .field("leeway_seconds", &self.leeway_seconds)
            .field("issuer", &self.issuer)
            .field("audience", &self.audience)
            .field("required_claims", &self.required_claims)
            .finish()
    }
}

impl GateConfig {
    /// HS256 with `/` and `/health` exempt, expiry checked, 60s leeway.
    pub fn new(secret_or_key: impl Into<String>) -> Self {
        Self {
            secret_or_key: secret_or_key.into(),
            allowed_algorithms: vec![Algorithm::HS256],
            exempt_paths: vec!["/".to_string(), "/health".to_string()],
            require_bearer_scheme: false,
            validate_exp: true,
            leeway_seconds: 60,
            issuer: None,
            audience: None,
            required_claims: Vec::new(),
        }
    }

    pub fn with_algorithms(mut self, algorithms: impl IntoIterator<Item = Algorithm>) -> Self {
        self.allowed_algorithms = algorithms.into_iter().collect();
        self
    }

    pub fn with_exempt_paths<I, S>(mut self, paths: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.exempt_paths = paths.into_iter().map(Into::into).collect();
        self
    }

    pub fn require_bearer_scheme(mut self, required: bool) -> Self {
        self.require_bearer_scheme = required;
        self
    }

    pub fn validate_exp(mut self, enabled: bool) -> Self {
        self.validate_exp = enabled;
        self
    }

    pub fn with_issuer(mut self, issuer: impl Into<String>) -> Self {
        self.issuer = Some(issuer.into());
        self
    }

    pub fn with_audience(mut self, audience: impl Into<String>) -> Self {
        self.audience = Some(audience.into());
        self
    }

    pub fn with_required_claims<I, S>(mut self, claims: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.required_claims = claims.into_iter().map(Into::into).collect();
        self
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub addr: SocketAddr,
    pub app_env: AppEnv,
    pub http: HttpConfig,
    pub gate: GateConfig,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// `from_env` の本体。テストではプロセス環境を触らずに HashMap などを渡す。
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let bind_address = lookup("HTTP_BIND_ADDRESS").unwrap_or_else(|| "0.0.0.0".to_string());

        let port: u16 = match lookup("PORT") {
            Some(v) => v.trim().parse().map_err(|_| ConfigError::Invalid("PORT"))?,
            None => 3000,
        };

        let ip = IpAddr::from_str(bind_address.trim())
            .map_err(|_| ConfigError::Invalid("HTTP_BIND_ADDRESS"))?;
        let addr = SocketAddr::new(ip, port);

        let app_env = AppEnv::parse(lookup("APP_ENV"));

        let defaults = HttpConfig::default();
        let http = HttpConfig {
            timeout: match lookup("HTTP_TIMEOUT_SECONDS") {
                Some(v) => Duration::from_secs(
                    v.trim()
                        .parse()
                        .map_err(|_| ConfigError::Invalid("HTTP_TIMEOUT_SECONDS"))?,
                ),
                None => defaults.timeout,
            },
            body_limit_bytes: match lookup("HTTP_BODY_LIMIT_BYTES") {
                Some(v) => v
                    .trim()
                    .parse()
                    .map_err(|_| ConfigError::Invalid("HTTP_BODY_LIMIT_BYTES"))?,
                None => defaults.body_limit_bytes,
            },
        };

        // PEM を 1 行の env に入れる運用のため `\n` を改行に戻す
        let secret_or_key = lookup("JWT_SECRET_KEY")
            .filter(|v| !v.is_empty())
            .ok_or(ConfigError::Missing("JWT_SECRET_KEY"))?
            .replace("\\n", "\n");

        let mut gate = GateConfig::new(secret_or_key);

        if let Some(raw) = lookup("JWT_ALLOWED_ALGORITHMS") {
            let algorithms = split_list(&raw)
                .iter()
                .map(|name| Algorithm::from_str(name))
                .collect::<Result<Vec<_>, _>>()
                .map_err(|_| ConfigError::Invalid("JWT_ALLOWED_ALGORITHMS"))?;
            if algorithms.is_empty() {
                return Err(ConfigError::Invalid("JWT_ALLOWED_ALGORITHMS"));
            }
            gate.allowed_algorithms = algorithms;
        }

        if let Some(raw) = lookup("AUTH_EXEMPT_PATHS") {
            gate.exempt_paths = split_list(&raw);
        }

        if let Some(raw) = lookup("JWT_REQUIRED_CLAIMS") {
            gate.required_claims = split_list(&raw);
        }

        if let Some(raw) = lookup("AUTH_REQUIRE_BEARER_SCHEME") {
            gate.require_bearer_scheme =
                parse_bool(&raw).ok_or(ConfigError::Invalid("AUTH_REQUIRE_BEARER_SCHEME"))?;
        }

        if let Some(raw) = lookup("AUTH_VALIDATE_EXP") {
            gate.validate_exp =
                parse_bool(&raw).ok_or(ConfigError::Invalid("AUTH_VALIDATE_EXP"))?;
        }

        if let Some(raw) = lookup("ACCESS_TOKEN_LEEWAY_SECONDS") {
            gate.leeway_seconds = raw
                .trim()
                .parse()
                .map_err(|_| ConfigError::Invalid("ACCESS_TOKEN_LEEWAY_SECONDS"))?;
        }

        gate.issuer = lookup("AUTH_ISSUER").filter(|v| !v.trim().is_empty());
        gate.audience = lookup("AUTH_AUDIENCE").filter(|v| !v.trim().is_empty());

        Ok(Self {
            addr,
            app_env,
            http,
            gate,
        })
    }
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
