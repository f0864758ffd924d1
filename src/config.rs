//! Environment configuration.
//!
//! Responsibility:
//! - load and validate everything the gateway needs before serving
//!   (verification secret, policy resource locations, reload cadence)
//! - fail startup on anything missing or unparseable

use std::fmt;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnv {
    Development,
    Production,
}

impl AppEnv {
    pub fn from_env() -> Self {
        match std::env::var("APP_ENV")
            .unwrap_or_else(|_| "development".to_string())
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

#[derive(Debug)]
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

#[derive(Clone, Debug)]
pub struct Config {
    pub addr: SocketAddr,
    pub app_env: AppEnv,
    pub cors_allowed_origins: Vec<String>,

    pub auth_token_secret: String,
    pub auth_issuer: String,
    pub auth_audience: String,
    pub auth_leeway_seconds: u64,

    pub policy_model_path: PathBuf,
    pub policy_grants_path: PathBuf,
    pub unauthenticated_role: String,
    // 0 disables interval reloads; SIGHUP still works.
    pub policy_reload_interval_seconds: u64,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let port: u16 = std::env::var("PORT")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(3000);

        let addr: SocketAddr = SocketAddr::from_str(&format!("0.0.0.0:{}", port))
            .map_err(|_| ConfigError::Invalid("PORT"))?;

        let app_env = AppEnv::from_env();

        let cors_allowed_origins = std::env::var("CORS_ALLOWED_ORIGINS")
            .unwrap_or_default()
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>();

        let auth_token_secret = std::env::var("AUTH_TOKEN_SECRET")
            .map_err(|_| ConfigError::Missing("AUTH_TOKEN_SECRET"))?;
        if auth_token_secret.is_empty() {
            return Err(ConfigError::Invalid("AUTH_TOKEN_SECRET"));
        }

        let auth_issuer =
            std::env::var("AUTH_ISSUER").map_err(|_| ConfigError::Missing("AUTH_ISSUER"))?;

        let auth_audience =
            std::env::var("AUTH_AUDIENCE").map_err(|_| ConfigError::Missing("AUTH_AUDIENCE"))?;

        let auth_leeway_seconds = std::env::var("AUTH_LEEWAY_SECONDS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(60);

        let policy_model_path = std::env::var("POLICY_MODEL_PATH")
            .map(PathBuf::from)
            .map_err(|_| ConfigError::Missing("POLICY_MODEL_PATH"))?;

        let policy_grants_path = std::env::var("POLICY_GRANTS_PATH")
            .map(PathBuf::from)
            .map_err(|_| ConfigError::Missing("POLICY_GRANTS_PATH"))?;

        let unauthenticated_role = std::env::var("UNAUTHENTICATED_ROLE")
            .unwrap_or_else(|_| "unauthorized".to_string());
        if unauthenticated_role.is_empty() {
            return Err(ConfigError::Invalid("UNAUTHENTICATED_ROLE"));
        }

        let policy_reload_interval_seconds = std::env::var("POLICY_RELOAD_INTERVAL_SECONDS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(0);

        Ok(Self {
            addr,
            app_env,
            cors_allowed_origins,
            auth_token_secret,
            auth_issuer,
            auth_audience,
            auth_leeway_seconds,
            policy_model_path,
            policy_grants_path,
            unauthenticated_role,
            policy_reload_interval_seconds,
        })
    }
}
