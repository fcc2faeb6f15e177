//! Application Configuration
//!
//! This module provides configuration management for the application,
//! supporting YAML configuration files with sensible defaults.

use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::Path;
use log::{info, warn};

/// Storage backend types
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum StorageBackend {
    LocalDisk,
    Mock,
}

impl Default for StorageBackend {
    fn default() -> Self {
        StorageBackend::LocalDisk
    }
}

impl std::str::FromStr for StorageBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "localdisk" | "local" | "disk" => Ok(StorageBackend::LocalDisk),
            "mock" => Ok(StorageBackend::Mock),
            _ => Err(format!("Unknown storage backend: {}", s)),
        }
    }
}

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Server configuration
    pub server: ServerConfig,
    /// Storage configuration
    pub storage: StorageConfig,
    /// Upload/download handler configuration
    pub share: ShareConfig,
    /// Logging configuration
    pub logging: LoggingConfig,
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Server host
    pub host: String,
    /// Server port
    pub port: u16,
    /// Number of worker threads
    pub workers: usize,
}

/// Storage backend configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Storage backend type
    pub backend: StorageBackend,
    /// Base path for finalized entries
    pub base_path: String,
    /// Staging path for entries still being written
    pub temp_path: String,
}

/// Configuration for the upload and download handlers
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShareConfig {
    /// Path the upload POST route is bound on, e.g. "/upload"
    pub upload_path: String,
    /// Path prefix the download GET route is bound on, e.g. "/get"
    pub get_path: String,
    /// Protocol and host prefix used to build returned URLs.
    /// Has to end with a slash, e.g. "http://localhost:9710/"
    pub protocol_host: String,
    /// Buffer size in bytes used when streaming file bytes
    pub buffer_size: usize,
    /// Content types which are displayed inline in the client's browser
    pub whitelisted_content_types: Vec<String>,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Path to log configuration file
    pub config_file: String,
}

impl AppConfig {
    /// Load configuration from file, use defaults if not found.
    /// The STORAGE_BACKEND environment variable overrides the configured backend.
    pub fn load() -> Result<Self, Box<dyn std::error::Error>> {
        let config_path = "config.yaml";
        let mut config = if Path::new(config_path).exists() {
            let content = fs::read_to_string(config_path)?;
            let config: AppConfig = serde_yaml::from_str(&content)?;
            info!("Loaded configuration from {}", config_path);
            config
        } else {
            warn!("Config file not found, using defaults");
            Self::default()
        };

        if let Ok(backend_str) = env::var("STORAGE_BACKEND") {
            match backend_str.parse::<StorageBackend>() {
                Ok(backend) => {
                    info!("Using storage backend from environment: {:?}", backend);
                    config.storage.backend = backend;
                }
                Err(e) => {
                    warn!("Invalid storage backend in environment: {}. Keeping {:?}.", e, config.storage.backend);
                }
            }
        }

        Ok(config)
    }

    /// Create default configuration
    pub fn default() -> Self {
        Self {
            server: ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 9710,
                workers: 4,
            },
            storage: StorageConfig {
                backend: StorageBackend::LocalDisk,
                base_path: "./data/storage".to_string(),
                temp_path: "./data/temp".to_string(),
            },
            share: ShareConfig {
                upload_path: "/upload".to_string(),
                get_path: "/get".to_string(),
                protocol_host: "http://localhost:9710/".to_string(),
                buffer_size: 16384,
                whitelisted_content_types: vec![
                    "image/png".to_string(),
                    "image/jpeg".to_string(),
                    "image/gif".to_string(),
                    "text/plain".to_string(),
                ],
            },
            logging: LoggingConfig {
                config_file: "server_log.yaml".to_string(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    fn test_storage_backend_from_str() {
        assert_eq!("localdisk".parse::<StorageBackend>().unwrap(), StorageBackend::LocalDisk);
        assert_eq!("LocalDisk".parse::<StorageBackend>().unwrap(), StorageBackend::LocalDisk);
        assert_eq!("local".parse::<StorageBackend>().unwrap(), StorageBackend::LocalDisk);
        assert_eq!("disk".parse::<StorageBackend>().unwrap(), StorageBackend::LocalDisk);
        assert_eq!("mock".parse::<StorageBackend>().unwrap(), StorageBackend::Mock);
        assert_eq!("MOCK".parse::<StorageBackend>().unwrap(), StorageBackend::Mock);

        assert!("invalid".parse::<StorageBackend>().is_err());
    }

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.storage.backend, StorageBackend::LocalDisk);
        assert_eq!(config.share.upload_path, "/upload");
        assert_eq!(config.share.get_path, "/get");
        assert!(config.share.protocol_host.ends_with('/'));
        assert!(config.share.buffer_size > 0);
    }

    #[test]
    #[serial]
    fn test_env_backend_override() {
        std::env::set_var("STORAGE_BACKEND", "mock");
        let config = AppConfig::load().unwrap();
        assert_eq!(config.storage.backend, StorageBackend::Mock);
        std::env::remove_var("STORAGE_BACKEND");
    }
}
