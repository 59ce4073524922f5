use std::env;
use std::fmt;

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

/// Top-level configuration for the scheduling core.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: AppEnvironment,
    pub scheduling: SchedulingConfig,
    pub telemetry: TelemetryConfig,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let environment = AppEnvironment::from_str(
            &env::var("ROSTER_ENV").unwrap_or_else(|_| "development".to_string()),
        );

        let scheduling = SchedulingConfig::from_env()?;
        let log_level = env::var("ROSTER_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        Ok(Self {
            environment,
            scheduling,
            telemetry: TelemetryConfig { log_level },
        })
    }
}

/// Policy dials for the scheduling core. Ministry settings from the
/// surrounding system resolve into these values; individual records may
/// still override the blocked-day quota per volunteer.
#[derive(Debug, Clone)]
pub struct SchedulingConfig {
    pub default_max_blocked_days_per_month: u8,
    pub swap_expiry_hours: i64,
    pub ranking_window_days: i64,
    pub auto_assign: bool,
}

impl SchedulingConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let default_max_blocked_days_per_month = env::var("ROSTER_MAX_BLOCKED_DAYS_PER_MONTH")
            .unwrap_or_else(|_| "5".to_string())
            .parse::<u8>()
            .map_err(|_| ConfigError::InvalidQuota)?;

        let swap_expiry_hours = env::var("ROSTER_SWAP_EXPIRY_HOURS")
            .unwrap_or_else(|_| "24".to_string())
            .parse::<i64>()
            .ok()
            .filter(|hours| *hours > 0)
            .ok_or(ConfigError::InvalidExpiryHorizon)?;

        let ranking_window_days = env::var("ROSTER_RANKING_WINDOW_DAYS")
            .unwrap_or_else(|_| "90".to_string())
            .parse::<i64>()
            .ok()
            .filter(|days| *days > 0)
            .ok_or(ConfigError::InvalidRankingWindow)?;

        let auto_assign = match env::var("ROSTER_AUTO_ASSIGN") {
            Ok(raw) => match raw.trim().to_ascii_lowercase().as_str() {
                "1" | "true" | "yes" | "on" => true,
                "0" | "false" | "no" | "off" => false,
                _ => return Err(ConfigError::InvalidAutoAssignFlag { found: raw }),
            },
            Err(_) => true,
        };

        Ok(Self {
            default_max_blocked_days_per_month,
            swap_expiry_hours,
            ranking_window_days,
            auto_assign,
        })
    }
}

impl Default for SchedulingConfig {
    fn default() -> Self {
        Self {
            default_max_blocked_days_per_month: 5,
            swap_expiry_hours: 24,
            ranking_window_days: 90,
            auto_assign: true,
        }
    }
}

/// Tracing controls.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub log_level: String,
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidQuota,
    InvalidExpiryHorizon,
    InvalidRankingWindow,
    InvalidAutoAssignFlag { found: String },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidQuota => {
                write!(f, "ROSTER_MAX_BLOCKED_DAYS_PER_MONTH must be a valid u8")
            }
            ConfigError::InvalidExpiryHorizon => {
                write!(f, "ROSTER_SWAP_EXPIRY_HOURS must be a positive integer")
            }
            ConfigError::InvalidRankingWindow => {
                write!(f, "ROSTER_RANKING_WINDOW_DAYS must be a positive integer")
            }
            ConfigError::InvalidAutoAssignFlag { found } => {
                write!(f, "ROSTER_AUTO_ASSIGN must be a boolean flag, found '{found}'")
            }
        }
    }
}

impl std::error::Error for ConfigError {}
