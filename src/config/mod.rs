use serde::{Deserialize, Serialize};
use std::env;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use thiserror::Error;

/// File looked up when `--config` names a directory.
pub const CONFIG_FILE_NAME: &str = "config.yaml";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub environment: Environment,
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub store: StoreConfig,
    pub api: ApiConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    Development,
    Staging,
    Production,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DatabaseBackend {
    Postgres,
    Memory,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    pub backend: DatabaseBackend,
    /// Connection URL; wins over `credentials_path`.
    pub url: Option<String>,
    /// File whose contents are the connection URL.
    pub credentials_path: Option<PathBuf>,
    pub max_connections: u32,
    pub connect_timeout_secs: u64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Make soft-deleted records visible to reads.
    pub include_deleted: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// POST creates the record when there is nothing to update.
    pub upsert_on_post: bool,
    pub max_request_size_bytes: usize,
    pub enable_cors: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub json: bool,
    /// Error tracking DSN. Unset disables error tracking.
    pub error_tracking_token: Option<String>,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },
}

impl Environment {
    pub fn as_str(&self) -> &'static str {
        match self {
            Environment::Development => "development",
            Environment::Staging => "staging",
            Environment::Production => "production",
        }
    }

    fn from_env() -> Self {
        match env::var("APP_ENV").as_deref() {
            Ok("production") | Ok("prod") => Environment::Production,
            Ok("staging") | Ok("stage") => Environment::Staging,
            _ => Environment::Development,
        }
    }
}

impl FromStr for DatabaseBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "postgres" | "postgresql" => Ok(DatabaseBackend::Postgres),
            "memory" => Ok(DatabaseBackend::Memory),
            other => Err(format!("unknown database backend: {}", other)),
        }
    }
}

impl AppConfig {
    /// Load from a YAML file, or from `config.yaml` inside a directory, then
    /// apply environment overrides. A directory without a config file yields
    /// the defaults for `APP_ENV`.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let file = if path.is_dir() {
            path.join(CONFIG_FILE_NAME)
        } else {
            path.to_path_buf()
        };

        let config = if path.is_dir() && !file.exists() {
            Self::for_environment(Environment::from_env())
        } else {
            Self::from_file(&file)?
        };

        Ok(config.with_env_overrides())
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml(&contents).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn from_yaml(contents: &str) -> Result<Self, serde_yaml::Error> {
        serde_yaml::from_str(contents)
    }

    pub fn for_environment(environment: Environment) -> Self {
        match environment {
            Environment::Production => Self::production(),
            Environment::Staging => Self::staging(),
            Environment::Development => Self::development(),
        }
    }

    pub fn with_env_overrides(self) -> Self {
        self.with_overrides(|key| env::var(key).ok())
    }

    /// Apply overrides from `lookup`. Values that fail to parse are ignored.
    pub fn with_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        match lookup("APP_ENV").as_deref() {
            Some("production") | Some("prod") => self.environment = Environment::Production,
            Some("staging") | Some("stage") => self.environment = Environment::Staging,
            Some("development") | Some("dev") => self.environment = Environment::Development,
            _ => {}
        }

        // Server overrides
        if let Some(v) = lookup("PACE_HOST") {
            self.server.host = v;
        }
        if let Some(v) = lookup("PACE_PORT").or_else(|| lookup("PORT")) {
            self.server.port = v.parse().unwrap_or(self.server.port);
        }

        // Database overrides
        if let Some(v) = lookup("DATABASE_URL") {
            self.database.url = Some(v);
        }
        if let Some(v) = lookup("PACE_DATABASE_BACKEND") {
            self.database.backend = v.parse().unwrap_or(self.database.backend);
        }
        if let Some(v) = lookup("PACE_CREDENTIALS_PATH") {
            self.database.credentials_path = Some(PathBuf::from(v));
        }

        // Store overrides
        if let Some(v) = lookup("PACE_INCLUDE_DELETED") {
            self.store.include_deleted = v.parse().unwrap_or(self.store.include_deleted);
        }

        // Logging overrides
        if let Some(v) = lookup("PACE_ERROR_TRACKING_TOKEN") {
            self.logging.error_tracking_token = Some(v).filter(|t| !t.is_empty());
        }

        self
    }

    pub fn is_production(&self) -> bool {
        matches!(self.environment, Environment::Production)
    }

    fn development() -> Self {
        Self {
            environment: Environment::Development,
            server: ServerConfig::default(),
            database: DatabaseConfig {
                max_connections: 10,
                connect_timeout_secs: 30,
                ..DatabaseConfig::default()
            },
            store: StoreConfig::default(),
            api: ApiConfig {
                upsert_on_post: true,
                max_request_size_bytes: 10 * 1024 * 1024, // 10MB
                enable_cors: true,
            },
            logging: LoggingConfig {
                json: false,
                error_tracking_token: None,
            },
        }
    }

    fn staging() -> Self {
        Self {
            environment: Environment::Staging,
            server: ServerConfig::default(),
            database: DatabaseConfig {
                max_connections: 20,
                connect_timeout_secs: 10,
                ..DatabaseConfig::default()
            },
            store: StoreConfig::default(),
            api: ApiConfig {
                upsert_on_post: true,
                max_request_size_bytes: 5 * 1024 * 1024, // 5MB
                enable_cors: true,
            },
            logging: LoggingConfig {
                json: true,
                error_tracking_token: None,
            },
        }
    }

    fn production() -> Self {
        Self {
            environment: Environment::Production,
            server: ServerConfig::default(),
            database: DatabaseConfig {
                max_connections: 50,
                connect_timeout_secs: 5,
                ..DatabaseConfig::default()
            },
            store: StoreConfig::default(),
            api: ApiConfig {
                upsert_on_post: true,
                max_request_size_bytes: 2 * 1024 * 1024, // 2MB
                enable_cors: false,
            },
            logging: LoggingConfig {
                json: true,
                error_tracking_token: None,
            },
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self::development()
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8001,
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            backend: DatabaseBackend::Postgres,
            url: None,
            credentials_path: None,
            max_connections: 10,
            connect_timeout_secs: 30,
        }
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            upsert_on_post: true,
            max_request_size_bytes: 10 * 1024 * 1024,
            enable_cors: true,
        }
    }
}
