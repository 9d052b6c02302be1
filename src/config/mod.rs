//! Configuration file management
//!
//! Loads TOML configuration files and provides CLI settings.
//! Default config path: ~/.config/bitatlas/config.toml

use anyhow::{Context, Result};
use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::font::{FontError, FontFormat};

/// Environment variable overriding the config path
pub const CONFIG_ENV: &str = "BITATLAS_CONFIG";

/// Application settings
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Font settings
    pub font: FontConfig,
    /// Export settings
    pub export: ExportConfig,
}

/// Font settings
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FontConfig {
    /// Font file loaded when none is given on the command line
    pub path: String,
    /// Format tag: "bdf" | "fon" (inferred from the extension if empty)
    pub format: String,
}

/// Export settings
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportConfig {
    /// Atlas PNG output path (disabled if empty)
    pub png: String,
    /// Print a text dump of every glyph
    pub preview: bool,
}

impl FontConfig {
    /// Explicit format tag, falling back to the file extension
    pub fn resolve_format(&self, path: &Path) -> Result<FontFormat, FontError> {
        if self.format.is_empty() {
            FontFormat::from_path(path)
        } else {
            self.format.parse()
        }
    }
}

impl Config {
    /// Get the path that would be used for loading config
    /// Returns None if using built-in defaults
    pub fn config_path() -> Option<PathBuf> {
        // 1. BITATLAS_CONFIG environment variable
        if let Ok(path) = std::env::var(CONFIG_ENV) {
            let p = Path::new(&path);
            if p.exists() {
                return Some(p.to_path_buf());
            }
        }

        // 2. User config: ~/.config/bitatlas/config.toml
        let user = dirs::config_dir()?.join("bitatlas").join("config.toml");
        user.exists().then_some(user)
    }

    /// Load configuration with priority:
    /// 1. BITATLAS_CONFIG environment variable
    /// 2. ~/.config/bitatlas/config.toml
    /// 3. Built-in defaults
    pub fn load() -> Self {
        if let Some(path) = Self::config_path() {
            match Self::load_from_file(&path) {
                Ok(config) => {
                    info!("Loaded config: {}", path.display());
                    return config;
                }
                Err(e) => {
                    warn!("Failed to load config {}: {:#}", path.display(), e);
                }
            }
        }
        info!("Using built-in default config");
        Self::default()
    }

    /// Load settings from specified path
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        Self::parse(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    /// Parse TOML text
    pub fn parse(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full() {
        let config = Config::parse(
            r#"
            [font]
            path = "fonts/vga.fon"
            format = "fon"

            [export]
            png = "atlas.png"
            preview = true
            "#,
        )
        .unwrap();
        assert_eq!(config.font.path, "fonts/vga.fon");
        assert_eq!(config.font.format, "fon");
        assert_eq!(config.export.png, "atlas.png");
        assert!(config.export.preview);
    }

    #[test]
    fn test_parse_partial_uses_defaults() {
        let config = Config::parse("[export]\npreview = true\n").unwrap();
        assert!(config.font.path.is_empty());
        assert!(config.export.png.is_empty());
        assert!(config.export.preview);
        assert_eq!(Config::parse("").unwrap(), Config::default());
    }

    #[test]
    fn test_parse_invalid() {
        assert!(Config::parse("[font]\npath = 3\n").is_err());
    }

    #[test]
    fn test_resolve_format() {
        let mut font = FontConfig::default();
        assert_eq!(font.resolve_format(Path::new("a.bdf")), Ok(FontFormat::Bdf));
        font.format = "fon".to_string();
        assert_eq!(font.resolve_format(Path::new("a.bdf")), Ok(FontFormat::Fon));
        font.format = "otf".to_string();
        assert!(font.resolve_format(Path::new("a.bdf")).is_err());
    }

    #[test]
    fn test_load_from_file() {
        let path = std::env::temp_dir().join(format!("bitatlas-config-{}.toml", std::process::id()));
        std::fs::write(&path, "[font]\npath = \"x.bdf\"\n").unwrap();
        let config = Config::load_from_file(&path).unwrap();
        std::fs::remove_file(&path).unwrap();
        assert_eq!(config.font.path, "x.bdf");

        let missing = Config::load_from_file(&path).unwrap_err();
        assert!(format!("{:#}", missing).contains("Failed to read config file"));
    }
}
