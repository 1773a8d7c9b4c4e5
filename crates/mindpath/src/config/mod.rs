use std::env;
use std::fmt;
use std::net::{IpAddr, SocketAddr};

use chrono::NaiveDate;

use crate::workflows::badges::{
    EvaluationConfig, DEFAULT_EARLY_USER_WINDOW_MONTHS, DEFAULT_MENTAL_HEALTH_CATEGORY,
};

const DEFAULT_LAUNCH_DATE: &str = "2025-01-01";

/// Distinguishes runtime behavior for different stages of the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnvironment {
    Development,
    Test,
    Production,
}

impl AppEnvironment {
    fn from_str(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "prod" | "production" => Self::Production,
            "test" | "ci" => Self::Test,
            _ => Self::Development,
        }
    }
}

/// Top-level configuration for the application.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: AppEnvironment,
    pub server: ServerConfig,
    pub telemetry: TelemetryConfig,
    pub badges: BadgeConfig,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let environment = AppEnvironment::from_str(
            &env::var("APP_ENV").unwrap_or_else(|_| "development".to_string()),
        );

        let host = env::var("APP_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = env::var("APP_PORT")
            .unwrap_or_else(|_| "3000".to_string())
            .parse::<u16>()
            .map_err(|_| ConfigError::InvalidPort)?;

        let log_level = env::var("APP_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        Ok(Self {
            environment,
            server: ServerConfig { host, port },
            telemetry: TelemetryConfig { log_level },
            badges: BadgeConfig::from_env()?,
        })
    }
}

/// Settings controlling the HTTP server binding.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl ServerConfig {
    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        if self.host.eq_ignore_ascii_case("localhost") {
            return Ok(SocketAddr::new(IpAddr::from([127, 0, 0, 1]), self.port));
        }

        let ip: IpAddr = self
            .host
            .parse()
            .map_err(|source| ConfigError::InvalidHost { source })?;

        Ok(SocketAddr::new(ip, self.port))
    }
}

/// Tracing and metrics controls.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub log_level: String,
}

/// Badge rule settings: the platform launch date anchors the early-user window.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BadgeConfig {
    pub launch_date: NaiveDate,
    pub early_user_window_months: u32,
    pub mental_health_category: String,
}

impl BadgeConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let raw_launch =
            env::var("APP_LAUNCH_DATE").unwrap_or_else(|_| DEFAULT_LAUNCH_DATE.to_string());
        let launch_date = NaiveDate::parse_from_str(raw_launch.trim(), "%Y-%m-%d")
            .map_err(|source| ConfigError::InvalidLaunchDate {
                value: raw_launch.clone(),
                source,
            })?;

        let early_user_window_months = match env::var("APP_EARLY_USER_WINDOW_MONTHS") {
            Ok(raw) => raw
                .trim()
                .parse::<u32>()
                .map_err(|_| ConfigError::InvalidEarlyUserWindow)?,
            Err(_) => DEFAULT_EARLY_USER_WINDOW_MONTHS,
        };

        let mental_health_category = env::var("APP_MENTAL_HEALTH_CATEGORY")
            .ok()
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
            .unwrap_or_else(|| DEFAULT_MENTAL_HEALTH_CATEGORY.to_string());

        Ok(Self {
            launch_date,
            early_user_window_months,
            mental_health_category,
        })
    }

    pub fn evaluation_config(&self) -> EvaluationConfig {
        EvaluationConfig {
            launch_date: self.launch_date,
            early_user_window_months: self.early_user_window_months,
            mental_health_category: self.mental_health_category.clone(),
        }
    }
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidPort,
    InvalidHost {
        source: std::net::AddrParseError,
    },
    InvalidLaunchDate {
        value: String,
        source: chrono::ParseError,
    },
    InvalidEarlyUserWindow,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidPort => write!(f, "APP_PORT must be a valid u16"),
            ConfigError::InvalidHost { .. } => {
                write!(f, "APP_HOST must be an IP address or 'localhost'")
            }
            ConfigError::InvalidLaunchDate { value, .. } => {
                write!(f, "APP_LAUNCH_DATE '{value}' must be formatted YYYY-MM-DD")
            }
            ConfigError::InvalidEarlyUserWindow => {
                write!(f, "APP_EARLY_USER_WINDOW_MONTHS must be a non-negative integer")
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::InvalidPort | ConfigError::InvalidEarlyUserWindow => None,
            ConfigError::InvalidHost { source } => Some(source),
            ConfigError::InvalidLaunchDate { source, .. } => Some(source),
        }
    }
}
