use crate::config::{AppEnvironment, TelemetryConfig};
use tracing_subscriber::filter::{LevelFilter, ParseError};
use tracing_subscriber::EnvFilter;

/// Keeps award decisions visible when the configured level is quieter than `info`.
const BADGE_TARGET_DIRECTIVE: &str = "mindpath::workflows::badges=info";

#[derive(Debug, thiserror::Error)]
pub enum TelemetryError {
    #[error("invalid log level/filter '{value}': unable to build EnvFilter")]
    EnvFilter {
        value: String,
        #[source]
        source: ParseError,
    },
    #[error("telemetry error: {0}")]
    Subscriber(Box<dyn std::error::Error + Send + Sync>),
}

/// `RUST_LOG` wins when set; otherwise the configured level.
pub fn build_filter(config: &TelemetryConfig) -> Result<EnvFilter, TelemetryError> {
    if let Ok(filter) = EnvFilter::try_from_default_env() {
        return Ok(filter);
    }

    configured_filter(&config.log_level)
}

fn configured_filter(log_level: &str) -> Result<EnvFilter, TelemetryError> {
    let quieter_than_info = log_level
        .trim()
        .parse::<LevelFilter>()
        .map(|level| level < LevelFilter::INFO)
        .unwrap_or(false);

    let directives = if quieter_than_info {
        format!("{},{}", log_level.trim(), BADGE_TARGET_DIRECTIVE)
    } else {
        log_level.trim().to_string()
    };

    EnvFilter::try_new(&directives).map_err(|source| TelemetryError::EnvFilter {
        value: log_level.to_string(),
        source,
    })
}

pub fn init(config: &TelemetryConfig, environment: AppEnvironment) -> Result<(), TelemetryError> {
    let env_filter = build_filter(config)?;

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(environment != AppEnvironment::Production)
        .compact()
        .with_ansi(environment == AppEnvironment::Development)
        .try_init()
        .map_err(TelemetryError::Subscriber)
}
