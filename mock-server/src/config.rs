use std::env;
use std::fmt;
use std::net::{IpAddr, SocketAddr};

use tracing_subscriber::filter::ParseError;
use tracing_subscriber::EnvFilter;

/// Settings for the standalone mock server binary.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub log_level: String,
}

impl ServerConfig {
    /// Load from the process environment, after reading `.env` if present.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let host = env::var("MOCK_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port_raw = env::var("PORT").unwrap_or_else(|_| "3000".to_string());
        let port = port_raw
            .parse::<u16>()
            .map_err(|_| ConfigError::InvalidPort(port_raw.clone()))?;
        let log_level = env::var("MOCK_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        Ok(Self {
            host,
            port,
            log_level,
        })
    }

    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        if self.host.eq_ignore_ascii_case("localhost") {
            return Ok(SocketAddr::new(IpAddr::from([127, 0, 0, 1]), self.port));
        }
        let ip: IpAddr = self
            .host
            .parse()
            .map_err(|_| ConfigError::InvalidHost(self.host.clone()))?;
        Ok(SocketAddr::new(ip, self.port))
    }

    /// Install the global `tracing` subscriber. `RUST_LOG` wins over `log_level`.
    pub fn init_tracing(&self) -> Result<(), ConfigError> {
        let filter = match EnvFilter::try_from_default_env() {
            Ok(filter) => filter,
            Err(_) => EnvFilter::try_new(&self.log_level).map_err(|source| ConfigError::LogFilter {
                value: self.log_level.clone(),
                source,
            })?,
        };

        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .compact()
            .with_ansi(false)
            .try_init()
            .map_err(|err| ConfigError::Subscriber(err.to_string()))
    }
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidPort(String),
    InvalidHost(String),
    LogFilter { value: String, source: ParseError },
    Subscriber(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidPort(value) => write!(f, "PORT must be a valid u16, got '{value}'"),
            ConfigError::InvalidHost(value) => write!(f, "MOCK_HOST must be an IP address, got '{value}'"),
            ConfigError::LogFilter { value, .. } => {
                write!(f, "invalid log level/filter '{value}'")
            }
            ConfigError::Subscriber(msg) => write!(f, "could not install tracing subscriber: {msg}"),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::LogFilter { source, .. } => Some(source),
            _ => None,
        }
    }
}
