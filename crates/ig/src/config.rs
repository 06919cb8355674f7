//! Configuration management for the image generator.
//!
//! This module handles loading, validation and conversion of the image
//! generator's configuration from TOML files and command-line arguments.

use cigi_protocol::{host_byte_order, ByteOrder, CigiVersion};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::info;

/// Application configuration loaded from a TOML file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct AppConfig {
    /// Host link settings
    #[serde(default)]
    pub host: HostSettings,
    /// Frame loop settings
    #[serde(default)]
    pub frame: FrameSettings,
    /// Logging settings
    #[serde(default)]
    pub logging: LoggingSettings,
    /// Definition tree settings
    #[serde(default)]
    pub definitions: DefinitionsSettings,
}

/// Where the image generator listens and which CIGI dialect it speaks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HostSettings {
    /// Local UDP address Host messages arrive on (e.g. "0.0.0.0:8004")
    pub bind_address: String,
    /// Address Start Of Frame messages go to. When unset they go to the
    /// sender of the latest Host message.
    #[serde(default)]
    pub host_address: Option<String>,
    /// CIGI major version
    pub cigi_major: u8,
    /// CIGI minor version
    pub cigi_minor: u8,
    /// Byte order of outgoing messages
    #[serde(default)]
    pub byte_order: ByteOrderSetting,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ByteOrderSetting {
    /// Byte order of this machine
    #[default]
    Native,
    Big,
    Little,
}

/// Frame loop pacing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrameSettings {
    /// Frames per second
    pub rate_hz: f64,
    /// Stop after this many frames (None runs until a shutdown signal)
    #[serde(default)]
    pub frame_limit: Option<u64>,
}

/// Logging system configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingSettings {
    /// Log level filter (trace, debug, info, warn, error)
    pub level: String,
    /// Whether to output logs in JSON format
    pub json_format: bool,
}

/// Static definition tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct DefinitionsSettings {
    /// TOML file holding entity types and the view layout
    #[serde(default)]
    pub path: Option<PathBuf>,
}

impl Default for HostSettings {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8004".to_string(),
            host_address: None,
            cigi_major: 3,
            cigi_minor: 3,
            byte_order: ByteOrderSetting::Native,
        }
    }
}

impl Default for FrameSettings {
    fn default() -> Self {
        Self {
            rate_hz: 60.0,
            frame_limit: None,
        }
    }
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json_format: false,
        }
    }
}

impl AppConfig {
    /// Loads configuration from a TOML file, creating a default file if it
    /// doesn't exist.
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the configuration file
    ///
    /// # Returns
    ///
    /// The loaded configuration, or an error if the file could not be read,
    /// parsed or created.
    pub async fn load_from_file(path: &Path) -> Result<Self, Box<dyn std::error::Error>> {
        if path.exists() {
            let content = tokio::fs::read_to_string(path).await?;
            let config: AppConfig = toml::from_str(&content)?;
            Ok(config)
        } else {
            let default_config = AppConfig::default();
            let toml_content = toml::to_string_pretty(&default_config)?;
            tokio::fs::write(path, toml_content).await?;
            info!("Created default configuration file: {}", path.display());
            Ok(default_config)
        }
    }

    /// Validates the configuration settings.
    ///
    /// # Returns
    ///
    /// `Ok(())` if the configuration is valid, or an error message naming
    /// the offending setting.
    pub fn validate(&self) -> Result<(), String> {
        self.bind_address()?;
        self.host_address()?;

        let version = self.cigi_version();
        if !version.is_supported() {
            return Err(format!(
                "Unsupported CIGI version {version}. Supported: {}",
                CigiVersion::SUPPORTED
                    .iter()
                    .map(ToString::to_string)
                    .collect::<Vec<_>>()
                    .join(", ")
            ));
        }

        if !(self.frame.rate_hz.is_finite() && self.frame.rate_hz > 0.0) {
            return Err(format!(
                "Frame rate must be a positive number of Hz, got {}",
                self.frame.rate_hz
            ));
        }

        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.logging.level.as_str()) {
            return Err(format!(
                "Invalid log level: {}. Must be one of: {valid_levels:?}",
                &self.logging.level
            ));
        }

        Ok(())
    }

    pub fn bind_address(&self) -> Result<SocketAddr, String> {
        self.host
            .bind_address
            .parse()
            .map_err(|_| format!("Invalid bind address: {}", &self.host.bind_address))
    }

    pub fn host_address(&self) -> Result<Option<SocketAddr>, String> {
        self.host
            .host_address
            .as_deref()
            .map(|address| {
                address
                    .parse()
                    .map_err(|_| format!("Invalid host address: {address}"))
            })
            .transpose()
    }

    pub fn cigi_version(&self) -> CigiVersion {
        CigiVersion::new(self.host.cigi_major, self.host.cigi_minor)
    }

    pub fn outgoing_byte_order(&self) -> ByteOrder {
        match self.host.byte_order {
            ByteOrderSetting::Native => host_byte_order(),
            ByteOrderSetting::Big => ByteOrder::Big,
            ByteOrderSetting::Little => ByteOrder::Little,
        }
    }

    /// Time between two frames. Only meaningful after [`validate`](Self::validate).
    pub fn frame_period(&self) -> Duration {
        Duration::from_secs_f64(1.0 / self.frame.rate_hz)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = AppConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.cigi_version(), CigiVersion::V3_3);
        assert_eq!(config.outgoing_byte_order(), host_byte_order());
        assert_eq!(config.host_address(), Ok(None));
        assert_eq!(config.frame_period(), Duration::from_secs_f64(1.0 / 60.0));
    }

    #[test]
    fn validation_rejects_bad_settings() {
        let mut config = AppConfig::default();
        config.host.bind_address = "invalid".to_string();
        assert!(config.validate().is_err());

        let mut config = AppConfig::default();
        config.host.host_address = Some("nowhere".to_string());
        assert!(config.validate().is_err());

        let mut config = AppConfig::default();
        config.host.cigi_minor = 7;
        assert!(config.validate().unwrap_err().contains("3.3"));

        let mut config = AppConfig::default();
        config.frame.rate_hz = 0.0;
        assert!(config.validate().is_err());
        config.frame.rate_hz = f64::NAN;
        assert!(config.validate().is_err());

        let mut config = AppConfig::default();
        config.logging.level = "verbose".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn partial_files_fall_back_to_defaults() {
        let config: AppConfig = toml::from_str(
            r#"
            [host]
            bind_address = "127.0.0.1:9000"
            host_address = "127.0.0.1:9001"
            cigi_major = 4
            cigi_minor = 0
            byte_order = "big"

            [frame]
            rate_hz = 30.0
            "#,
        )
        .unwrap();
        assert!(config.validate().is_ok());
        assert_eq!(config.cigi_version(), CigiVersion::V4_0);
        assert_eq!(config.outgoing_byte_order(), ByteOrder::Big);
        assert_eq!(config.logging, LoggingSettings::default());
        assert_eq!(config.definitions.path, None);
        assert!(toml::from_str::<AppConfig>("[host]\nbind_address = 1\n").is_err());
    }

    #[tokio::test]
    async fn missing_file_is_created_with_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ig.toml");

        let created = AppConfig::load_from_file(&path).await.unwrap();
        assert_eq!(created, AppConfig::default());
        assert!(path.exists());

        let reloaded = AppConfig::load_from_file(&path).await.unwrap();
        assert_eq!(reloaded, created);
    }

    #[tokio::test]
    async fn malformed_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ig.toml");
        tokio::fs::write(&path, "[frame\nrate_hz = ").await.unwrap();
        assert!(AppConfig::load_from_file(&path).await.is_err());
    }
}
