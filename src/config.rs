//! Runtime configuration types and loading

use eyre::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Top-level runtime configuration: image rendering, async pool sizing, and
/// collector scheduling defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RuntimeConfig {
    /// Image rendering configuration
    pub image: ImageConfig,

    /// Collector scheduling configuration
    pub collectors: CollectorsConfig,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            image: ImageConfig::default(),
            collectors: CollectorsConfig::default(),
        }
    }
}

impl RuntimeConfig {
    /// Load configuration with fallback chain: explicit path, project-local
    /// `.dashprobe.yml`, user config dir, then defaults.
    pub fn load(config_path: Option<&PathBuf>) -> Result<Self> {
        if let Some(path) = config_path {
            return Self::load_from_file(path).context(format!("Failed to load config from {}", path.display()));
        }

        let local_config = PathBuf::from(".dashprobe.yml");
        if local_config.exists() {
            match Self::load_from_file(&local_config) {
                Ok(config) => return Ok(config),
                Err(e) => {
                    tracing::warn!("Failed to load config from {}: {}", local_config.display(), e);
                }
            }
        }

        if let Some(config_dir) = dirs::config_dir() {
            let user_config = config_dir.join("dashprobe").join("dashprobe.yml");
            if user_config.exists() {
                match Self::load_from_file(&user_config) {
                    Ok(config) => return Ok(config),
                    Err(e) => {
                        tracing::warn!("Failed to load config from {}: {}", user_config.display(), e);
                    }
                }
            }
        }

        tracing::info!("No config file found, using defaults");
        Ok(Self::default())
    }

    fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path).context("Failed to read config file")?;
        let config: Self = serde_yaml::from_str(&content).context("Failed to parse config file")?;
        tracing::info!("Loaded config from: {}", path.as_ref().display());
        Ok(config)
    }
}

/// Image rendering configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ImageConfig {
    /// Force a specific protocol ("kitty", "iterm2", "sixel", "halfblocks",
    /// "none") instead of auto-detecting. Empty string or "auto" means
    /// auto-detect.
    #[serde(rename = "protocol-override")]
    pub protocol_override: String,

    /// LRU cache byte budget, in mebibytes.
    #[serde(rename = "max-cache-size-mb")]
    pub max_cache_size_mb: u32,

    /// Number of workers in the async render pool.
    #[serde(rename = "async-workers")]
    pub async_workers: u32,
}

impl Default for ImageConfig {
    fn default() -> Self {
        Self {
            protocol_override: "auto".to_string(),
            max_cache_size_mb: 32,
            async_workers: 2,
        }
    }
}

/// Collector scheduling configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CollectorsConfig {
    /// Default collection interval in milliseconds, used when a collector's
    /// own interval is unset.
    #[serde(rename = "default-interval-ms")]
    pub default_interval_ms: u64,

    /// Channel capacity for the fan-in update stream.
    #[serde(rename = "update-channel-capacity")]
    pub update_channel_capacity: usize,
}

impl Default for CollectorsConfig {
    fn default() -> Self {
        Self {
            default_interval_ms: 5_000,
            update_channel_capacity: 64,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = RuntimeConfig::default();

        assert_eq!(config.image.protocol_override, "auto");
        assert_eq!(config.image.max_cache_size_mb, 32);
        assert_eq!(config.collectors.default_interval_ms, 5_000);
    }

    #[test]
    fn test_deserialize_config() {
        let yaml = r#"
image:
  protocol-override: kitty
  max-cache-size-mb: 64
  async-workers: 4

collectors:
  default-interval-ms: 10000
  update-channel-capacity: 128
"#;

        let config: RuntimeConfig = serde_yaml::from_str(yaml).unwrap();

        assert_eq!(config.image.protocol_override, "kitty");
        assert_eq!(config.image.max_cache_size_mb, 64);
        assert_eq!(config.image.async_workers, 4);
        assert_eq!(config.collectors.default_interval_ms, 10_000);
        assert_eq!(config.collectors.update_channel_capacity, 128);
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let yaml = r#"
image:
  protocol-override: sixel
"#;

        let config: RuntimeConfig = serde_yaml::from_str(yaml).unwrap();

        assert_eq!(config.image.protocol_override, "sixel");
        assert_eq!(config.image.max_cache_size_mb, 32);
        assert_eq!(config.collectors.default_interval_ms, 5_000);
    }

}
