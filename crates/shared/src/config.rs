//! Application configuration management.

use serde::Deserialize;
use std::path::PathBuf;

/// Application configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    /// Server configuration.
    #[serde(default)]
    pub server: ServerConfig,
    /// Storage root configuration.
    #[serde(default)]
    pub storage: StorageConfig,
    /// Authentication configuration.
    #[serde(default)]
    pub auth: AuthConfig,
    /// Upload configuration.
    #[serde(default)]
    pub upload: UploadConfig,
    /// External renderer configuration.
    #[serde(default)]
    pub render: RenderConfig,
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
    /// Public base URL used when building asset URLs in responses.
    #[serde(default = "default_public_base_url")]
    pub public_base_url: String,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_public_base_url() -> String {
    "http://localhost:8080".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            public_base_url: default_public_base_url(),
        }
    }
}

/// Storage root configuration.
///
/// Each directory is created at startup if missing. Every path the service
/// touches must resolve inside one of these three roots.
#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    /// Directory holding uploaded originals.
    #[serde(default = "default_originals_dir")]
    pub originals_dir: PathBuf,
    /// Directory holding processed derivatives.
    #[serde(default = "default_cache_dir")]
    pub cache_dir: PathBuf,
    /// Directory holding thumbnail derivatives.
    #[serde(default = "default_thumbnails_dir")]
    pub thumbnails_dir: PathBuf,
}

fn default_originals_dir() -> PathBuf {
    PathBuf::from("data/originals")
}

fn default_cache_dir() -> PathBuf {
    PathBuf::from("data/cache")
}

fn default_thumbnails_dir() -> PathBuf {
    PathBuf::from("data/thumbnails")
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            originals_dir: default_originals_dir(),
            cache_dir: default_cache_dir(),
            thumbnails_dir: default_thumbnails_dir(),
        }
    }
}

/// Authentication configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AuthConfig {
    /// API key required on mutating endpoints. When unset, the check is
    /// disabled (development mode).
    #[serde(default)]
    pub api_key: Option<String>,
}

/// Upload configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct UploadConfig {
    /// Maximum accepted upload size in bytes.
    #[serde(default = "default_max_upload_bytes")]
    pub max_bytes: usize,
}

fn default_max_upload_bytes() -> usize {
    100 * 1024 * 1024
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            max_bytes: default_max_upload_bytes(),
        }
    }
}

/// External renderer configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct RenderConfig {
    /// Override for the ffmpeg binary (absolute path or name on PATH).
    #[serde(default)]
    pub ffmpeg: Option<String>,
    /// Override for the pdftoppm binary (absolute path or name on PATH).
    #[serde(default)]
    pub pdftoppm: Option<String>,
    /// Override for the pdfinfo binary (absolute path or name on PATH).
    #[serde(default)]
    pub pdfinfo: Option<String>,
    /// Timeout applied to each renderer subprocess, in seconds.
    #[serde(default = "default_render_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_render_timeout_secs() -> u64 {
    30
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            ffmpeg: None,
            pdftoppm: None,
            pdfinfo: None,
            timeout_secs: default_render_timeout_secs(),
        }
    }
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
            .add_source(config::Environment::with_prefix("DARKROOM").separator("__"))
            .build()?;

        config.try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.storage.originals_dir, PathBuf::from("data/originals"));
        assert_eq!(config.storage.cache_dir, PathBuf::from("data/cache"));
        assert_eq!(
            config.storage.thumbnails_dir,
            PathBuf::from("data/thumbnails")
        );
        assert!(config.auth.api_key.is_none());
        assert_eq!(config.upload.max_bytes, 100 * 1024 * 1024);
        assert_eq!(config.render.timeout_secs, 30);
        assert!(config.render.ffmpeg.is_none());
    }

    #[test]
    fn test_load_from_env() {
        temp_env::with_vars(
            [
                ("DARKROOM__SERVER__PORT", Some("9090")),
                ("DARKROOM__AUTH__API_KEY", Some("secret")),
                ("DARKROOM__STORAGE__ORIGINALS_DIR", Some("/srv/originals")),
                ("DARKROOM__RENDER__FFMPEG", Some("/opt/ffmpeg/ffmpeg")),
            ],
            || {
                let config = AppConfig::load().expect("config should load");
                assert_eq!(config.server.port, 9090);
                assert_eq!(config.auth.api_key.as_deref(), Some("secret"));
                assert_eq!(
                    config.storage.originals_dir,
                    PathBuf::from("/srv/originals")
                );
                assert_eq!(config.render.ffmpeg.as_deref(), Some("/opt/ffmpeg/ffmpeg"));
            },
        );
    }

    #[test]
    fn test_load_without_env_uses_defaults() {
        temp_env::with_vars_unset(["RUN_MODE"], || {
            let config = AppConfig::load().expect("config should load");
            assert_eq!(config.server.port, 8080);
            assert_eq!(config.render.timeout_secs, 30);
        });
    }
}
