use crate::diagnosis::RankingConfig;
use std::env;
use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;

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

pub const DEFAULT_DATA_FILE: &str = "clinical_signs_and_symptoms_in_rare_diseases.csv";

/// Top-level configuration for the application.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: AppEnvironment,
    pub server: ServerConfig,
    pub telemetry: TelemetryConfig,
    pub data: DataConfig,
    pub ranking: RankingConfig,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let environment = AppEnvironment::from_str(
            &env::var("APP_ENV").unwrap_or_else(|_| "development".to_string()),
        );

        let host = env::var("APP_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = env::var("APP_PORT")
            .or_else(|_| env::var("PORT"))
            .unwrap_or_else(|_| "3000".to_string())
            .parse::<u16>()
            .map_err(|_| ConfigError::InvalidPort)?;

        let log_level = env::var("APP_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        let primary = env::var("APP_DATA_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_DATA_FILE));
        let fallback = env::var("APP_FALLBACK_DATA_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("file").join(DEFAULT_DATA_FILE));

        Ok(Self {
            environment,
            server: ServerConfig { host, port },
            telemetry: TelemetryConfig { log_level },
            data: DataConfig { primary, fallback },
            ranking: ranking_from_env()?,
        })
    }
}

fn ranking_from_env() -> Result<RankingConfig, ConfigError> {
    let mut ranking = RankingConfig::default();

    if let Some(value) = parse_var::<f64>("RANK_ABSENT_PENALTY")? {
        ranking.absent_penalty_factor =
            check_range("RANK_ABSENT_PENALTY", value, |v| (0.0..=1.0).contains(&v))?;
    }
    if let Some(value) = parse_var::<f64>("RANK_UNSEEN_LIKELIHOOD")? {
        ranking.unseen_symptom_likelihood =
            check_range("RANK_UNSEEN_LIKELIHOOD", value, |v| v > 0.0 && v <= 1.0)?;
    }
    if let Some(value) = parse_var::<usize>("RANK_CANDIDATE_LIMIT")? {
        if value == 0 {
            return Err(ConfigError::InvalidNumber {
                key: "RANK_CANDIDATE_LIMIT",
                value: value.to_string(),
            });
        }
        ranking.candidate_limit = value;
    }
    ranking.true_mode_deadline_ms = parse_var::<u64>("RANK_DEADLINE_MS")?;

    Ok(ranking)
}

/// Weights feed probabilities directly; NaN and infinities are never valid.
fn check_range(
    key: &'static str,
    value: f64,
    accepts: impl Fn(f64) -> bool,
) -> Result<f64, ConfigError> {
    if value.is_finite() && accepts(value) {
        Ok(value)
    } else {
        Err(ConfigError::InvalidNumber {
            key,
            value: value.to_string(),
        })
    }
}

fn parse_var<T: std::str::FromStr>(key: &'static str) -> Result<Option<T>, ConfigError> {
    match env::var(key) {
        Ok(raw) if raw.trim().is_empty() => Ok(None),
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|_| ConfigError::InvalidNumber { key, value: raw }),
        Err(_) => Ok(None),
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

/// Locations of the clinical-sign export, tried in order at startup.
#[derive(Debug, Clone)]
pub struct DataConfig {
    pub primary: PathBuf,
    pub fallback: PathBuf,
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidPort,
    InvalidHost { source: std::net::AddrParseError },
    InvalidNumber { key: &'static str, value: String },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidPort => write!(f, "APP_PORT must be a valid u16"),
            ConfigError::InvalidHost { .. } => {
                write!(f, "APP_HOST must parse to an IPv4 or IPv6 address")
            }
            ConfigError::InvalidNumber { key, value } => {
                write!(f, "{key} has an invalid value '{value}'")
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::InvalidPort | ConfigError::InvalidNumber { .. } => None,
            ConfigError::InvalidHost { source } => Some(source),
        }
    }
}
