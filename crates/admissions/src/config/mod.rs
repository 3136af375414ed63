use std::env;
use std::fmt;
use std::net::{IpAddr, SocketAddr};

const DEFAULT_SLOT_MINUTES: u32 = 15;
const DEFAULT_INTERVIEW_MINUTES: u32 = 45;
const DEFAULT_MAX_INTERVIEW_MINUTES: u32 = 180;

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

/// Top-level configuration for the admissions service.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: AppEnvironment,
    pub server: ServerConfig,
    pub telemetry: TelemetryConfig,
    pub scheduling: SchedulingConfig,
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
        let with_targets = env::var("APP_LOG_TARGETS")
            .map(|value| matches!(value.trim(), "1" | "true" | "yes"))
            .unwrap_or(false);

        let scheduling = SchedulingConfig {
            slot_granularity_minutes: minutes_from_env("APP_SLOT_MINUTES", DEFAULT_SLOT_MINUTES)?,
            default_interview_minutes: minutes_from_env(
                "APP_DEFAULT_INTERVIEW_MINUTES",
                DEFAULT_INTERVIEW_MINUTES,
            )?,
            max_interview_minutes: minutes_from_env(
                "APP_MAX_INTERVIEW_MINUTES",
                DEFAULT_MAX_INTERVIEW_MINUTES,
            )?,
        };

        if scheduling.default_interview_minutes > scheduling.max_interview_minutes {
            return Err(ConfigError::InvalidMinutes {
                key: "APP_DEFAULT_INTERVIEW_MINUTES",
                value: scheduling.default_interview_minutes.to_string(),
            });
        }

        Ok(Self {
            environment,
            server: ServerConfig { host, port },
            telemetry: TelemetryConfig {
                log_level,
                with_targets,
            },
            scheduling,
        })
    }
}

fn minutes_from_env(key: &'static str, default: u32) -> Result<u32, ConfigError> {
    let Ok(raw) = env::var(key) else {
        return Ok(default);
    };

    match raw.trim().parse::<u32>() {
        Ok(minutes) if minutes > 0 => Ok(minutes),
        _ => Err(ConfigError::InvalidMinutes { key, value: raw }),
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

/// Tracing controls.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub log_level: String,
    /// Print the emitting module path next to each event.
    pub with_targets: bool,
}

/// Interview booking limits and free-slot search granularity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SchedulingConfig {
    pub slot_granularity_minutes: u32,
    pub default_interview_minutes: u32,
    pub max_interview_minutes: u32,
}

impl Default for SchedulingConfig {
    fn default() -> Self {
        Self {
            slot_granularity_minutes: DEFAULT_SLOT_MINUTES,
            default_interview_minutes: DEFAULT_INTERVIEW_MINUTES,
            max_interview_minutes: DEFAULT_MAX_INTERVIEW_MINUTES,
        }
    }
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidPort,
    InvalidHost { source: std::net::AddrParseError },
    InvalidMinutes { key: &'static str, value: String },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidPort => write!(f, "APP_PORT must be a valid u16"),
            ConfigError::InvalidHost { .. } => {
                write!(f, "APP_HOST must parse to an IPv4 or IPv6 address")
            }
            ConfigError::InvalidMinutes { key, value } => {
                write!(f, "{key} must be a positive number of minutes (found '{value}')")
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::InvalidPort | ConfigError::InvalidMinutes { .. } => None,
            ConfigError::InvalidHost { source } => Some(source),
        }
    }
}
