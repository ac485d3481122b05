//! Application configuration management.

use serde::Deserialize;

/// Application configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Server configuration.
    pub server: ServerConfig,
    /// Database configuration.
    pub database: DatabaseConfig,
    /// Object storage configuration.
    pub storage: StorageSettings,
    /// Draft lifecycle configuration.
    #[serde(default)]
    pub drafts: DraftSettings,
}

/// Server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Host to bind to.
    #[serde(default = "default_host")]
    pub host: String,
    /// Port to listen on.
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

/// Database configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// Database connection URL.
    pub url: String,
    /// Maximum number of connections in the pool.
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

fn default_max_connections() -> u32 {
    10
}

/// Object storage configuration.
///
/// `backend` selects the provider: `s3`, `azblob`, or `fs`. The remaining
/// fields are provider-specific; the server binary maps them onto the
/// storage layer's provider type.
#[derive(Debug, Clone, Deserialize)]
pub struct StorageSettings {
    /// Storage backend: `s3`, `azblob`, or `fs`.
    pub backend: String,
    /// Base URL under which blobs are publicly served.
    pub public_base_url: String,
    /// S3 endpoint URL.
    #[serde(default)]
    pub endpoint: Option<String>,
    /// S3 bucket / Azure container name.
    #[serde(default)]
    pub bucket: Option<String>,
    /// S3 access key id.
    #[serde(default)]
    pub access_key_id: Option<String>,
    /// S3 secret access key.
    #[serde(default)]
    pub secret_access_key: Option<String>,
    /// S3 region.
    #[serde(default)]
    pub region: Option<String>,
    /// Azure storage account name.
    #[serde(default)]
    pub account: Option<String>,
    /// Azure storage access key.
    #[serde(default)]
    pub access_key: Option<String>,
    /// Root directory for the `fs` backend.
    #[serde(default)]
    pub root: Option<String>,
    /// Maximum upload size in bytes.
    #[serde(default = "default_max_upload_size")]
    pub max_upload_size: u64,
}

fn default_max_upload_size() -> u64 {
    10 * 1024 * 1024
}

/// Draft lifecycle configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DraftSettings {
    /// How long a registered draft handle may stay un-finalized before the
    /// sweeper reclaims it, in seconds.
    #[serde(default = "default_draft_ttl")]
    pub ttl_secs: u64,
    /// Interval between sweeper passes, in seconds.
    #[serde(default = "default_sweep_interval")]
    pub sweep_interval_secs: u64,
    /// Interval between reclaim-queue drain passes, in seconds.
    #[serde(default = "default_reclaim_interval")]
    pub reclaim_interval_secs: u64,
}

impl Default for DraftSettings {
    fn default() -> Self {
        Self {
            ttl_secs: default_draft_ttl(),
            sweep_interval_secs: default_sweep_interval(),
            reclaim_interval_secs: default_reclaim_interval(),
        }
    }
}

fn default_draft_ttl() -> u64 {
    86_400 // 24 hours
}

fn default_sweep_interval() -> u64 {
    3_600 // 1 hour
}

fn default_reclaim_interval() -> u64 {
    300 // 5 minutes
}

impl AppConfig {
    /// Loads configuration from environment and config files.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration cannot be loaded.
    pub fn load() -> Result<Self, config::ConfigError> {
        let run_mode = std::env::var("RUN_MODE").unwrap_or_else(|_| "development".to_string());

        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{run_mode}")).required(false))
            .add_source(config::Environment::with_prefix("DRIFTWOOD").separator("__"))
            .build()?;

        config.try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_draft_settings_defaults() {
        let settings = DraftSettings::default();
        assert_eq!(settings.ttl_secs, 86_400);
        assert_eq!(settings.sweep_interval_secs, 3_600);
        assert_eq!(settings.reclaim_interval_secs, 300);
    }

    #[test]
    fn test_storage_settings_deserialize_fs() {
        let settings: StorageSettings = serde_json::from_str(
            r#"{"backend":"fs","public_base_url":"https://cdn.example.com/media","root":"./uploads"}"#,
        )
        .unwrap();
        assert_eq!(settings.backend, "fs");
        assert_eq!(settings.root.as_deref(), Some("./uploads"));
        assert_eq!(settings.max_upload_size, 10 * 1024 * 1024);
        assert!(settings.bucket.is_none());
    }
}
