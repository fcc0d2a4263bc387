//! Configuration management using Figment
//!
//! Configuration is loaded from multiple sources with the following
//! precedence (highest to lowest):
//! 1. Environment variables (prefix: TRAILHEAD_)
//! 2. Current working directory: ./config.toml
//! 3. XDG config directory: ~/.config/trailhead-service/config.toml
//! 4. System directory: /etc/trailhead-service/config.toml
//! 5. Default values

use std::path::PathBuf;

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Service configuration
    pub service: ServiceConfig,

    /// JWT configuration
    pub jwt: JwtConfig,

    /// Document store configuration
    #[serde(default)]
    pub store: StoreConfig,
}

/// Service-level configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceConfig {
    /// Service name
    pub name: String,

    /// Port to listen on
    #[serde(default = "default_port")]
    pub port: u16,

    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,

    /// Request body size limit in MB
    #[serde(default = "default_body_limit_mb")]
    pub body_limit_mb: usize,

    /// Environment (development, production)
    #[serde(default = "default_environment")]
    pub environment: String,
}

impl ServiceConfig {
    /// Whether the service runs in development mode (verbose errors).
    #[must_use]
    pub fn is_development(&self) -> bool {
        matches!(self.environment.as_str(), "development" | "dev")
    }
}

/// JWT configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JwtConfig {
    /// HS256 signing secret
    pub secret: String,

    /// Access token lifetime in seconds
    #[serde(default = "default_jwt_expires_in")]
    pub expires_in_secs: u64,

    /// Lifetime of the `jwt` cookie in days
    #[serde(default = "default_cookie_expires_days")]
    pub cookie_expires_days: u64,
}

/// Document store configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Optional JSON file with seed collections, loaded at startup
    #[serde(default)]
    pub seed_file: Option<PathBuf>,
}

// Default value functions
fn default_port() -> u16 {
    8080
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_timeout() -> u64 {
    30
}

fn default_body_limit_mb() -> usize {
    10
}

fn default_environment() -> String {
    "development".to_string()
}

fn default_jwt_expires_in() -> u64 {
    // 90 days, matching the cookie
    90 * 24 * 60 * 60
}

fn default_cookie_expires_days() -> u64 {
    90
}

impl Config {
    /// Load configuration from all sources.
    ///
    /// Searches config files in this order (first found wins per key):
    /// 1. Current working directory: ./config.toml
    /// 2. XDG config directory: ~/.config/trailhead-service/config.toml
    /// 3. System directory: /etc/trailhead-service/config.toml
    ///
    /// Environment variables (TRAILHEAD_ prefix, `__` separating nesting
    /// levels) override all file-based configs.
    pub fn load() -> Result<Self> {
        let config_paths = Self::find_config_paths();

        let mut figment = Figment::new().merge(Serialized::defaults(Config::default()));

        // Merge in reverse order so higher-priority files override
        for path in config_paths.iter().rev() {
            if path.exists() {
                tracing::info!("Loading configuration from: {}", path.display());
                figment = figment.merge(Toml::file(path));
            }
        }

        figment = figment.merge(Env::prefixed("TRAILHEAD_").split("__"));

        let config = figment.extract()?;
        Ok(config)
    }

    /// Load configuration from a specific file, bypassing the search
    /// paths. Useful for testing and non-standard deployments.
    pub fn load_from(path: &str) -> Result<Self> {
        let config = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Toml::file(path))
            .merge(Env::prefixed("TRAILHEAD_").split("__"))
            .extract()?;
        Ok(config)
    }

    fn find_config_paths() -> Vec<PathBuf> {
        let mut paths = Vec::new();

        // 1. Current working directory (dev/testing)
        paths.push(PathBuf::from("config.toml"));

        // 2. XDG config directory
        let xdg_dirs = xdg::BaseDirectories::with_prefix("trailhead-service");
        if let Ok(path) = xdg_dirs.place_config_file("config.toml") {
            paths.push(path);
        }

        // 3. System-wide directory
        paths.push(PathBuf::from("/etc/trailhead-service/config.toml"));

        paths
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            service: ServiceConfig {
                name: "trailhead-service".to_string(),
                port: default_port(),
                log_level: default_log_level(),
                timeout_secs: default_timeout(),
                body_limit_mb: default_body_limit_mb(),
                environment: default_environment(),
            },
            jwt: JwtConfig {
                secret: "trailhead-dev-secret-change-me".to_string(),
                expires_in_secs: default_jwt_expires_in(),
                cookie_expires_days: default_cookie_expires_days(),
            },
            store: StoreConfig::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.service.port, 8080);
        assert_eq!(config.service.log_level, "info");
        assert_eq!(config.jwt.cookie_expires_days, 90);
        assert!(config.store.seed_file.is_none());
    }

    #[test]
    fn test_environment_detection() {
        let mut config = Config::default();
        assert!(config.service.is_development());
        config.service.environment = "production".to_string();
        assert!(!config.service.is_development());
    }

    #[test]
    fn test_load_from_toml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            r#"
[service]
name = "trailhead-test"
port = 9999

[jwt]
secret = "test-secret"
expires_in_secs = 60
"#,
        )
        .unwrap();

        let config = Config::load_from(path.to_str().unwrap()).unwrap();
        assert_eq!(config.service.name, "trailhead-test");
        assert_eq!(config.service.port, 9999);
        assert_eq!(config.jwt.expires_in_secs, 60);
        // defaulted fields survive partial files
        assert_eq!(config.service.timeout_secs, 30);
    }
}
