use serde::Deserialize;
use std::env;
use std::path::PathBuf;
use std::str::FromStr;

const DEFAULT_UPLOAD_TYPES: &str = "jpg,jpeg,png,gif,webp,pdf";

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub max_body_bytes: Option<usize>,
    pub media_root: Option<String>,
    pub upload_max_bytes: Option<usize>,
    pub upload_allowed_types: Option<String>,
    pub workers: Option<usize>,
    pub cors_allowed_origin: Option<String>,
}

impl Config {
    pub fn from_env() -> Result<Self, config::ConfigError> {
        dotenvy::dotenv().ok();

        let cfg = config::Config::builder()
            .add_source(config::Environment::default())
            .build()?;

        let config: Config = cfg.try_deserialize()?;
        config.validate()?;

        Ok(config)
    }

    /// Rejects settings that would make the server unsafe or unusable.
    pub fn validate(&self) -> Result<(), config::ConfigError> {
        if !self
            .host
            .chars()
            .all(|c| c.is_alphanumeric() || ".:-_".contains(c))
        {
            return Err(config::ConfigError::Message(
                "Invalid host format".to_string(),
            ));
        }

        if self.port < 1024 {
            return Err(config::ConfigError::Message(
                "Port must be 1024 or higher for security reasons".to_string(),
            ));
        }

        // 1MB..500MB
        if let Some(limit) = self.max_body_bytes {
            let min = 1024 * 1024;
            let max = 500 * 1024 * 1024;
            if limit < min || limit > max {
                return Err(config::ConfigError::Message(format!(
                    "max_body_bytes must be between {} and {} bytes",
                    min, max
                )));
            }
        }

        // 1KB..100MB
        if let Some(limit) = self.upload_max_bytes {
            let min = 1024;
            let max = 100 * 1024 * 1024;
            if limit < min || limit > max {
                return Err(config::ConfigError::Message(format!(
                    "upload_max_bytes must be between {} and {} bytes",
                    min, max
                )));
            }
        }

        if self.allowed_upload_types().is_empty() {
            return Err(config::ConfigError::Message(
                "upload_allowed_types must list at least one extension".to_string(),
            ));
        }

        if let Some(0) = self.workers {
            return Err(config::ConfigError::Message(
                "workers must be greater than zero".to_string(),
            ));
        }

        Ok(())
    }

    pub fn effective_max_body_bytes(&self) -> usize {
        self.max_body_bytes.unwrap_or(100 * 1024 * 1024)
    }

    pub fn effective_upload_max_bytes(&self) -> usize {
        self.upload_max_bytes.unwrap_or(5 * 1024 * 1024)
    }

    pub fn effective_media_root(&self) -> PathBuf {
        PathBuf::from(self.media_root.as_deref().unwrap_or("media"))
    }

    pub fn effective_workers(&self) -> usize {
        self.workers.unwrap_or_else(num_cpus::get)
    }

    /// Lowercased extensions without the leading dot.
    pub fn allowed_upload_types(&self) -> Vec<String> {
        self.upload_allowed_types
            .as_deref()
            .unwrap_or(DEFAULT_UPLOAD_TYPES)
            .split(',')
            .map(|ext| ext.trim().trim_start_matches('.').to_ascii_lowercase())
            .filter(|ext| !ext.is_empty())
            .collect()
    }
}

#[derive(Debug, Clone)]
pub struct DatabaseSettings {
    pub url: String,
    pub max_connections: Option<u32>,
    pub min_connections: Option<u32>,
    pub connect_timeout_secs: Option<u64>,
    pub acquire_timeout_secs: Option<u64>,
    pub idle_timeout_secs: Option<u64>,
    pub sql_log: Option<bool>,
    /// Create missing tables right after connecting.
    pub auto_migrate: bool,
}

impl DatabaseSettings {
    pub fn default_from_url(url: String) -> Self {
        Self {
            url,
            max_connections: parse_env_var("DATABASE_MAX_CONNECTIONS"),
            min_connections: parse_env_var("DATABASE_MIN_CONNECTIONS"),
            connect_timeout_secs: parse_env_var("DATABASE_CONNECT_TIMEOUT_SECS"),
            acquire_timeout_secs: parse_env_var("DATABASE_ACQUIRE_TIMEOUT_SECS"),
            idle_timeout_secs: parse_env_var("DATABASE_IDLE_TIMEOUT_SECS"),
            sql_log: parse_env_var("DATABASE_SQL_LOG"),
            auto_migrate: parse_env_var("DATABASE_AUTO_MIGRATE").unwrap_or(false),
        }
    }

    pub fn is_sqlite(&self) -> bool {
        self.url.starts_with("sqlite:")
    }

    /// Every pooled connection to `sqlite::memory:` opens its own empty database.
    pub fn is_in_memory(&self) -> bool {
        self.is_sqlite() && self.url.contains(":memory:")
    }
}

fn parse_env_var<T>(key: &str) -> Option<T>
where
    T: FromStr,
{
    env::var(key).ok().and_then(|value| value.parse::<T>().ok())
}
