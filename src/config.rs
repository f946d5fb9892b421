/*
 * Responsibility
 * - 環境変数 / .env からの設定読み込み (JWT secret, management user, chaos flag など)
 * - 設定値のバリデーション (不足・不正なら起動失敗)
 * - secret を Debug に出さない
 */
use std::fmt;
use std::net::SocketAddr;
use std::str::FromStr;

/// HS256 needs at least 256 bits of key material.
pub const MIN_JWT_SECRET_BYTES: usize = 32;

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

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Text,
    Json,
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

/// Credentials of the operator account that guards `/actuator/**`.
#[derive(Clone)]
pub struct ManagementUserConfig {
    pub username: String,
    pub password: String,
    // comma-separated, e.g. "ACTUATOR_ADMIN"
    pub roles: String,
}

/// argon2id cost parameters used by the shared password encoder.
#[derive(Debug, Clone, Copy)]
pub struct PasswordHashConfig {
    pub memory_kib: u32,
    pub iterations: u32,
}

impl Default for PasswordHashConfig {
    fn default() -> Self {
        Self {
            memory_kib: 19_456,
            iterations: 2,
        }
    }
}

#[derive(Clone)]
pub struct Config {
    pub addr: SocketAddr,
    pub app_env: AppEnv,
    pub log_format: LogFormat,

    pub jwt_secret_key: String,
    pub jwt_validity_seconds: u64,

    pub management_user: ManagementUserConfig,
    pub password_hash: PasswordHashConfig,

    // registers the flaky demo endpoint
    pub chaos_enabled: bool,
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Do not print secrets
        f.debug_struct("Config")
            .field("addr", &self.addr)
            .field("app_env", &self.app_env)
            .field("log_format", &self.log_format)
            .field("jwt_validity_seconds", &self.jwt_validity_seconds)
            .field("management_username", &self.management_user.username)
            .field("management_roles", &self.management_user.roles)
            .field("password_hash", &self.password_hash)
            .field("chaos_enabled", &self.chaos_enabled)
            .finish()
    }
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let port: u16 = std::env::var("PORT")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(8081);

        let addr: SocketAddr = SocketAddr::from_str(&format!("0.0.0.0:{}", port))
            .map_err(|_| ConfigError::Invalid("PORT"))?;

        let app_env = AppEnv::from_env();

        let log_format = match std::env::var("LOG_FORMAT")
            .unwrap_or_default()
            .to_ascii_lowercase()
            .as_str()
        {
            "json" => LogFormat::Json,
            _ => LogFormat::Text,
        };

        let jwt_secret_key =
            std::env::var("JWT_SECRET_KEY").map_err(|_| ConfigError::Missing("JWT_SECRET_KEY"))?;

        let jwt_validity_seconds = match std::env::var("JWT_VALIDITY_SECONDS") {
            Ok(v) => v
                .parse::<u64>()
                .map_err(|_| ConfigError::Invalid("JWT_VALIDITY_SECONDS"))?,
            Err(_) => 3600, // 1 hour
        };

        let management_user = ManagementUserConfig {
            username: std::env::var("ACTUATOR_USERNAME")
                .map_err(|_| ConfigError::Missing("ACTUATOR_USERNAME"))?,
            password: std::env::var("ACTUATOR_PASSWORD")
                .map_err(|_| ConfigError::Missing("ACTUATOR_PASSWORD"))?,
            roles: std::env::var("ACTUATOR_ROLES")
                .map_err(|_| ConfigError::Missing("ACTUATOR_ROLES"))?,
        };

        let defaults = PasswordHashConfig::default();
        let password_hash = PasswordHashConfig {
            memory_kib: std::env::var("PASSWORD_HASH_MEMORY_KIB")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.memory_kib),
            iterations: std::env::var("PASSWORD_HASH_ITERATIONS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.iterations),
        };

        let chaos_enabled = std::env::var("CHAOS_ENABLED")
            .map(|v| matches!(v.to_ascii_lowercase().as_str(), "1" | "true" | "yes"))
            .unwrap_or(false);

        let config = Self {
            addr,
            app_env,
            log_format,
            jwt_secret_key,
            jwt_validity_seconds,
            management_user,
            password_hash,
            chaos_enabled,
        };
        config.validate()?;

        Ok(config)
    }

    /// Checks the invariants `from_env` cannot express through parsing alone.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.jwt_secret_key.len() < MIN_JWT_SECRET_BYTES {
            return Err(ConfigError::Invalid("JWT_SECRET_KEY"));
        }
        if self.jwt_validity_seconds == 0
            || self.jwt_validity_seconds > crate::services::token::MAX_VALIDITY_SECONDS
        {
            return Err(ConfigError::Invalid("JWT_VALIDITY_SECONDS"));
        }
        if self.management_user.username.trim().is_empty() {
            return Err(ConfigError::Invalid("ACTUATOR_USERNAME"));
        }
        if self.management_user.password.is_empty() {
            return Err(ConfigError::Invalid("ACTUATOR_PASSWORD"));
        }
        if self
            .management_user
            .roles
            .split(',')
            .all(|r| r.trim().is_empty())
        {
            return Err(ConfigError::Invalid("ACTUATOR_ROLES"));
        }
        Ok(())
    }
}
