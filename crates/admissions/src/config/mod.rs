use std::env;
use std::fmt;
use std::net::{IpAddr, SocketAddr};

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
    pub admissions: AdmissionsConfig,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let environment = AppEnvironment::from_str(
            &env::var("APP_ENV").unwrap_or_else(|_| "development".to_string()),
        );

        let host = env::var("APP_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = env::var("APP_PORT")
            .unwrap_or_else(|_| "3005".to_string())
            .parse::<u16>()
            .map_err(|_| ConfigError::InvalidPort)?;

        let log_level = env::var("APP_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        let lifecycles = match env::var("APP_LIFECYCLES") {
            Ok(raw) => LifecycleKind::parse_list(&raw)?,
            Err(_) => LifecycleKind::ALL.to_vec(),
        };

        Ok(Self {
            environment,
            server: ServerConfig { host, port },
            telemetry: TelemetryConfig { log_level },
            admissions: AdmissionsConfig { lifecycles },
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

/// Tracing controls.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub log_level: String,
}

/// Which lifecycle vocabularies the service mounts.
#[derive(Debug, Clone)]
pub struct AdmissionsConfig {
    pub lifecycles: Vec<LifecycleKind>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleKind {
    Application,
    Inscription,
}

impl LifecycleKind {
    pub const ALL: [LifecycleKind; 2] = [LifecycleKind::Application, LifecycleKind::Inscription];

    pub fn parse(raw: &str) -> Result<Self, ConfigError> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "application" | "applications" => Ok(Self::Application),
            "inscription" | "inscriptions" => Ok(Self::Inscription),
            other => Err(ConfigError::UnknownLifecycle(other.to_string())),
        }
    }

    fn parse_list(raw: &str) -> Result<Vec<Self>, ConfigError> {
        let mut kinds = Vec::new();
        for item in raw.split(',').filter(|item| !item.trim().is_empty()) {
            let kind = Self::parse(item)?;
            if !kinds.contains(&kind) {
                kinds.push(kind);
            }
        }
        if kinds.is_empty() {
            return Err(ConfigError::NoLifecycles);
        }
        Ok(kinds)
    }

    /// Base path the lifecycle's routes are mounted under.
    pub fn base_path(self) -> &'static str {
        match self {
            LifecycleKind::Application => "/api/v1/applications",
            LifecycleKind::Inscription => "/api/v1/inscriptions",
        }
    }
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidPort,
    InvalidHost { source: std::net::AddrParseError },
    UnknownLifecycle(String),
    NoLifecycles,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidPort => write!(f, "APP_PORT must be a valid u16"),
            ConfigError::InvalidHost { .. } => {
                write!(f, "APP_HOST must parse to an IPv4 or IPv6 address")
            }
            ConfigError::UnknownLifecycle(value) => write!(
                f,
                "APP_LIFECYCLES entry '{value}' must be 'application' or 'inscription'"
            ),
            ConfigError::NoLifecycles => write!(f, "APP_LIFECYCLES must name at least one lifecycle"),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::InvalidHost { source } => Some(source),
            ConfigError::InvalidPort
            | ConfigError::UnknownLifecycle(_)
            | ConfigError::NoLifecycles => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;
    use std::sync::{Mutex, OnceLock};

    fn env_guard() -> &'static Mutex<()> {
        static GUARD: OnceLock<Mutex<()>> = OnceLock::new();
        GUARD.get_or_init(|| Mutex::new(()))
    }

    fn reset_env() {
        env::remove_var("APP_ENV");
        env::remove_var("APP_HOST");
        env::remove_var("APP_PORT");
        env::remove_var("APP_LOG_LEVEL");
        env::remove_var("APP_LIFECYCLES");
    }

    #[test]
    fn load_uses_defaults_when_env_missing() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        let config = AppConfig::load().expect("config loads with defaults");
        assert_eq!(config.environment, AppEnvironment::Development);
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 3005);
        assert_eq!(config.telemetry.log_level, "info");
        assert_eq!(config.admissions.lifecycles, LifecycleKind::ALL.to_vec());
    }

    #[test]
    fn accepts_localhost_host() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("APP_HOST", "localhost");
        let config = AppConfig::load().expect("config loads");
        let addr = config.server.socket_addr().expect("localhost resolves");
        assert_eq!(addr, SocketAddr::new(IpAddr::from([127, 0, 0, 1]), 3005));
        reset_env();
    }

    #[test]
    fn lifecycle_list_is_parsed_and_deduplicated() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("APP_LIFECYCLES", "inscription, Inscriptions,");
        let config = AppConfig::load().expect("config loads");
        assert_eq!(config.admissions.lifecycles, vec![LifecycleKind::Inscription]);

        env::set_var("APP_LIFECYCLES", "registrations");
        assert!(matches!(
            AppConfig::load(),
            Err(ConfigError::UnknownLifecycle(value)) if value == "registrations"
        ));

        env::set_var("APP_LIFECYCLES", " , ");
        assert!(matches!(AppConfig::load(), Err(ConfigError::NoLifecycles)));
        reset_env();
    }
}
