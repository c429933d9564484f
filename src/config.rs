//! # Configuration Management Module
//!
//! Holds the user-editable settings of the toolkit.
//!
//! ## Responsibilities:
//! - Defines the `Config` struct with tool overrides and policy defaults
//! - Validates parameters before any tool is run
//! - Loads/saves the configuration as JSON
//! - Provides sensible defaults for every field
//!
//! ## Parameters:
//! - `ffmpeg_path` / `ffprobe_path` / `mkvextract_path`: explicit tool locations
//!   (default: None = search the tools dir and `PATH`)
//! - `overwrite`: replace existing output files (default: false)
//! - `shortest`: end muxed output with the shortest input (default: false)
//! - `dry_run`: report planned moves without touching files (default: false)
//! - `bonus_extensions`: extensions the Plex organizer moves
//!   (default: mp4, srt, en.srt, eng.srt, forced.srt)
//! - `json_output`: print results as JSON (default: false)
//!
//! CLI flags override what is loaded from file.
//!
//! ## Example:
//! ```ignore
//! let config = Config {
//!     overwrite: true,
//!     ..Default::default()
//! };
//! config.validate()?;
//! ```

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default extensions for bonus content
pub const DEFAULT_BONUS_EXTENSIONS: [&str; 5] = ["mp4", "srt", "en.srt", "eng.srt", "forced.srt"];

/// Configuration for the media toolkit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Explicit ffmpeg location
    pub ffmpeg_path: Option<PathBuf>,
    /// Explicit ffprobe location
    pub ffprobe_path: Option<PathBuf>,
    /// Explicit mkvextract location
    pub mkvextract_path: Option<PathBuf>,
    /// Replace existing output files
    pub overwrite: bool,
    /// Stop muxed output at the shortest input
    pub shortest: bool,
    /// Dry run - report moves without performing them
    pub dry_run: bool,
    /// Extensions recognized by the Plex organizer, without leading dot
    pub bonus_extensions: Vec<String>,
    /// Print command results as JSON on stdout
    pub json_output: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            ffmpeg_path: None,
            ffprobe_path: None,
            mkvextract_path: None,
            overwrite: false,
            shortest: false,
            dry_run: false,
            bonus_extensions: DEFAULT_BONUS_EXTENSIONS.iter().map(|e| e.to_string()).collect(),
            json_output: false,
        }
    }
}

impl Config {
    /// Validate configuration parameters
    pub fn validate(&self) -> Result<()> {
        if self.bonus_extensions.is_empty() {
            return Err(anyhow::anyhow!("At least one bonus extension is required"));
        }

        for ext in &self.bonus_extensions {
            if ext.is_empty() || ext.starts_with('.') || ext.ends_with('.') {
                return Err(anyhow::anyhow!(
                    "Invalid bonus extension '{}': use e.g. 'mp4' or 'en.srt'",
                    ext
                ));
            }
            if ext.contains('/') || ext.contains('\\') {
                return Err(anyhow::anyhow!("Bonus extension must not contain a path separator: {}", ext));
            }
        }

        let overrides = [
            ("ffmpeg", &self.ffmpeg_path),
            ("ffprobe", &self.ffprobe_path),
            ("mkvextract", &self.mkvextract_path),
        ];
        for (tool, path) in overrides {
            if let Some(path) = path {
                if !path.is_file() {
                    return Err(anyhow::anyhow!(
                        "Configured {} path does not exist: {}",
                        tool,
                        path.display()
                    ));
                }
            }
        }

        Ok(())
    }

    /// Default config file location
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("media-toolkit").join("config.json"))
    }

    /// Load configuration from file
    pub async fn from_file(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = tokio::fs::read_to_string(path).await?;
        let config: Config = serde_json::from_str(&content)
            .map_err(|e| anyhow::anyhow!("Invalid config file {}: {}", path.display(), e))?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to file
    pub async fn save_to_file(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let content = serde_json::to_string_pretty(self)?;
        tokio::fs::write(path, content).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_config_validation() {
        let mut config = Config::default();
        assert!(config.validate().is_ok());

        config.bonus_extensions = vec![];
        assert!(config.validate().is_err());

        config.bonus_extensions = vec![".mp4".to_string()];
        assert!(config.validate().is_err());

        config.bonus_extensions = vec!["sub/srt".to_string()];
        assert!(config.validate().is_err());

        config.bonus_extensions = vec!["mp4".to_string()];
        config.ffprobe_path = Some(PathBuf::from("/nonexistent/ffprobe-12345"));
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_default() {
        let config = Config::default();
        assert!(!config.overwrite);
        assert!(!config.shortest);
        assert!(!config.dry_run);
        assert!(config.ffmpeg_path.is_none());
        assert_eq!(config.bonus_extensions.len(), 5);
        assert!(config.bonus_extensions.contains(&"mp4".to_string()));
    }

    #[tokio::test]
    async fn test_missing_file_gives_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let config = Config::from_file(&temp_dir.path().join("absent.json")).await.unwrap();
        assert_eq!(config, Config::default());
    }

    #[tokio::test]
    async fn test_config_save_load() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("nested").join("config.json");

        let original_config = Config {
            overwrite: true,
            shortest: true,
            bonus_extensions: vec!["mp4".to_string(), "mkv".to_string()],
            ..Default::default()
        };

        original_config.save_to_file(&config_path).await.unwrap();
        let loaded_config = Config::from_file(&config_path).await.unwrap();

        assert_eq!(loaded_config, original_config);
    }

    #[tokio::test]
    async fn test_partial_file_fills_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("config.json");
        tokio::fs::write(&config_path, r#"{ "overwrite": true }"#).await.unwrap();

        let config = Config::from_file(&config_path).await.unwrap();
        assert!(config.overwrite);
        assert_eq!(config.bonus_extensions, Config::default().bonus_extensions);
    }
}
