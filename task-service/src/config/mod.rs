use serde::Deserialize;
use service_core::config as core_config;
use service_core::error::AppError;
use std::env;
use std::str::FromStr;

use crate::utils::PasswordConfig;

#[derive(Debug, Clone, Deserialize)]
pub struct TaskConfig {
    #[serde(flatten)]
    pub common: core_config::Config,
    pub environment: Environment,
    pub service_name: String,
    pub service_version: String,
    pub log_level: String,
    pub otlp_endpoint: Option<String>,
    pub database: DatabaseConfig,
    pub password: PasswordConfig,
    pub security: SecurityConfig,
    pub rate_limit: RateLimitConfig,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    Dev,
    Prod,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
    pub acquire_timeout_seconds: u64,
    pub idle_timeout_seconds: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SecurityConfig {
    pub allowed_origins: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RateLimitConfig {
    pub login_attempts: u32,
    pub login_window_seconds: u64,
    pub global_ip_limit: u32,
    pub global_ip_window_seconds: u64,
    /// Key limits on `x-forwarded-for`; only safe behind a proxy that overwrites it.
    pub trust_forwarded_for: bool,
}

impl Default for TaskConfig {
    /// Development settings; what `from_env` yields with nothing set.
    fn default() -> Self {
        Self {
            common: core_config::Config::default(),
            environment: Environment::Dev,
            service_name: "task-service".to_string(),
            service_version: env!("CARGO_PKG_VERSION").to_string(),
            log_level: "info".to_string(),
            otlp_endpoint: None,
            database: DatabaseConfig {
                url: "postgres://localhost/tasks".to_string(),
                max_connections: 10,
                min_connections: 1,
                acquire_timeout_seconds: 30,
                idle_timeout_seconds: 600,
            },
            password: PasswordConfig::default(),
            security: SecurityConfig {
                allowed_origins: vec!["http://localhost:3000".to_string()],
            },
            rate_limit: RateLimitConfig {
                login_attempts: 5,
                login_window_seconds: 900,
                global_ip_limit: 100,
                global_ip_window_seconds: 60,
                trust_forwarded_for: false,
            },
        }
    }
}

impl TaskConfig {
    pub fn from_env() -> Result<Self, AppError> {
        let common_config = core_config::Config::load()?;

        let env_str = env::var("ENVIRONMENT").unwrap_or_else(|_| "dev".to_string());
        let environment: Environment = env_str
            .parse()
            .map_err(|e: String| AppError::ConfigError(anyhow::anyhow!(e)))?;

        let is_prod = environment == Environment::Prod;
        let defaults = TaskConfig::default();

        let config = TaskConfig {
            common: common_config,
            environment,
            service_name: get_env("SERVICE_NAME", Some("task-service"), false)?,
            service_version: get_env("SERVICE_VERSION", Some(env!("CARGO_PKG_VERSION")), false)?,
            log_level: get_env("LOG_LEVEL", Some("info"), false)?,
            otlp_endpoint: env::var("OTLP_ENDPOINT").ok().filter(|s| !s.is_empty()),
            database: DatabaseConfig {
                url: get_env("DATABASE_URL", Some(defaults.database.url.as_str()), is_prod)?,
                max_connections: parse_env(
                    "DATABASE_MAX_CONNECTIONS",
                    defaults.database.max_connections,
                )?,
                min_connections: parse_env(
                    "DATABASE_MIN_CONNECTIONS",
                    defaults.database.min_connections,
                )?,
                acquire_timeout_seconds: parse_env(
                    "DATABASE_ACQUIRE_TIMEOUT_SECONDS",
                    defaults.database.acquire_timeout_seconds,
                )?,
                idle_timeout_seconds: parse_env(
                    "DATABASE_IDLE_TIMEOUT_SECONDS",
                    defaults.database.idle_timeout_seconds,
                )?,
            },
            password: PasswordConfig {
                time_cost: parse_env("PASSWORD_TIME_COST", defaults.password.time_cost)?,
                memory_cost_kib: parse_env(
                    "PASSWORD_MEMORY_COST_KIB",
                    defaults.password.memory_cost_kib,
                )?,
                parallelism: parse_env("PASSWORD_PARALLELISM", defaults.password.parallelism)?,
                key_length: parse_env("PASSWORD_KEY_LENGTH", defaults.password.key_length)?,
            },
            security: SecurityConfig {
                allowed_origins: get_env("ALLOWED_ORIGINS", Some("http://localhost:3000"), is_prod)?
                    .split(',')
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty())
                    .collect(),
            },
            rate_limit: RateLimitConfig {
                login_attempts: parse_env(
                    "RATE_LIMIT_LOGIN_ATTEMPTS",
                    defaults.rate_limit.login_attempts,
                )?,
                login_window_seconds: parse_env(
                    "RATE_LIMIT_LOGIN_WINDOW_SECONDS",
                    defaults.rate_limit.login_window_seconds,
                )?,
                global_ip_limit: parse_env(
                    "RATE_LIMIT_GLOBAL_IP_LIMIT",
                    defaults.rate_limit.global_ip_limit,
                )?,
                global_ip_window_seconds: parse_env(
                    "RATE_LIMIT_GLOBAL_IP_WINDOW_SECONDS",
                    defaults.rate_limit.global_ip_window_seconds,
                )?,
                trust_forwarded_for: parse_env(
                    "RATE_LIMIT_TRUST_FORWARDED_FOR",
                    defaults.rate_limit.trust_forwarded_for,
                )?,
            },
        };

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), AppError> {
        if self.common.port == 0 {
            return Err(AppError::ConfigError(anyhow::anyhow!(
                "PORT must be greater than 0"
            )));
        }

        self.password.params().map_err(|e| {
            AppError::ConfigError(anyhow::anyhow!("PASSWORD_* settings rejected: {}", e))
        })?;

        if self.database.min_connections > self.database.max_connections {
            return Err(AppError::ConfigError(anyhow::anyhow!(
                "DATABASE_MIN_CONNECTIONS must not exceed DATABASE_MAX_CONNECTIONS"
            )));
        }

        if self.database.acquire_timeout_seconds == 0 {
            return Err(AppError::ConfigError(anyhow::anyhow!(
                "DATABASE_ACQUIRE_TIMEOUT_SECONDS must be greater than 0"
            )));
        }

        // In production, ensure stricter validation
        if self.environment == Environment::Prod
            && self.security.allowed_origins.iter().any(|o| o == "*")
        {
            return Err(AppError::ConfigError(anyhow::anyhow!(
                "Wildcard CORS origin not allowed in production"
            )));
        }

        Ok(())
    }
}

fn get_env(key: &str, default: Option<&str>, required: bool) -> Result<String, AppError> {
    match env::var(key) {
        Ok(val) => Ok(val),
        Err(_) => {
            if required {
                Err(AppError::ConfigError(anyhow::anyhow!(format!(
                    "{} is required in production but not set",
                    key
                ))))
            } else if let Some(def) = default {
                Ok(def.to_string())
            } else {
                Err(AppError::ConfigError(anyhow::anyhow!(format!(
                    "{} is required but not set",
                    key
                ))))
            }
        }
    }
}

fn parse_env<T>(key: &str, default: T) -> Result<T, AppError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(key) {
        Ok(val) => val.trim().parse().map_err(|e: T::Err| {
            AppError::ConfigError(anyhow::anyhow!("{} has an invalid value: {}", key, e))
        }),
        Err(_) => Ok(default),
    }
}

impl std::str::FromStr for Environment {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "dev" => Ok(Environment::Dev),
            "prod" => Ok(Environment::Prod),
            _ => Err(format!("Invalid environment: {}", s)),
        }
    }
}
