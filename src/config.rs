// Global configuration management

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::engine::derive::QualityMode;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub probe: ProbeConfig,

    #[serde(default)]
    pub profiles: ProfilesConfig,

    #[serde(default)]
    pub derive: DeriveConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProbeConfig {
    /// Probe hardware encoders with vainfo / nvidia-smi. When off, hardware
    /// encoders the codec library knows are assumed usable.
    #[serde(default = "default_true")]
    pub vainfo_probe: bool,

    /// Render node to probe (auto-detected from /dev/dri when unset)
    #[serde(default)]
    pub render_device: Option<String>,

    #[serde(default = "default_ffmpeg_path")]
    pub ffmpeg_path: String,

    #[serde(default = "default_vainfo_path")]
    pub vainfo_path: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProfilesConfig {
    /// Profile directory (defaults to <config dir>/codecprof/profiles)
    #[serde(default)]
    pub dir: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeriveConfig {
    /// Quality directive used when a profile sets both CRF and global quality
    #[serde(default)]
    pub quality_mode: QualityMode,

    /// Emit the require_meta pipeline directive
    #[serde(default = "default_true")]
    pub require_meta: bool,
}

fn default_true() -> bool {
    true
}

fn default_ffmpeg_path() -> String {
    "ffmpeg".to_string()
}

fn default_vainfo_path() -> String {
    "vainfo".to_string()
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            vainfo_probe: true,
            render_device: None,
            ffmpeg_path: default_ffmpeg_path(),
            vainfo_path: default_vainfo_path(),
        }
    }
}

impl Default for DeriveConfig {
    fn default() -> Self {
        Self {
            quality_mode: QualityMode::default(),
            require_meta: true,
        }
    }
}

impl Config {
    /// Directory holding config.toml and the default profile directory
    pub fn config_dir() -> Result<PathBuf> {
        Ok(dirs::config_dir()
            .context("Could not determine config directory")?
            .join("codecprof"))
    }

    /// Get the path to the config file
    pub fn config_path() -> Result<PathBuf> {
        Ok(Self::config_dir()?.join("config.toml"))
    }

    /// Profile directory, configured or default
    pub fn profiles_dir(&self) -> Result<PathBuf> {
        match &self.profiles.dir {
            Some(dir) => Ok(dir.clone()),
            None => Ok(Self::config_dir()?.join("profiles")),
        }
    }

    /// Load config from disk, or fall back to defaults if it doesn't exist
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path()?;
        if config_path.exists() {
            Self::load_from(&config_path)
        } else {
            tracing::debug!(path = %config_path.display(), "no config file, using defaults");
            Ok(Config::default())
        }
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        toml::from_str(&contents).with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    /// Save config to disk
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        // Create parent directory if it doesn't exist
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create config directory: {}", parent.display()))?;
        }

        let contents = toml::to_string_pretty(self).context("Failed to serialize config")?;

        fs::write(path, contents).with_context(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(())
    }

    /// Check if config file exists
    pub fn exists() -> bool {
        Self::config_path().map(|p| p.exists()).unwrap_or(false)
    }

    /// Create a default config file if it doesn't exist
    pub fn ensure_default() -> Result<()> {
        if !Self::exists() {
            let config = Config::default();
            config.save()?;
        }
        Ok(())
    }
}
