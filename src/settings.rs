use crate::config::{FlowerStyle, SourceKind, TreeConfig};
use crate::error::{EngineError, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

pub const DEFAULT_ZOOM: f32 = 3.0;

/// Contents of `~/.config/moodtree/config.toml`; every table is optional
#[derive(Debug, Default, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub tree: TreeConfig,
    #[serde(default)]
    pub display: DisplaySettings,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct DisplaySettings {
    pub style: FlowerStyle,
    pub source: SourceKind,
    pub zoom: f32,
    pub log_file: Option<PathBuf>,
}

impl Default for DisplaySettings {
    fn default() -> Self {
        Self {
            style: FlowerStyle::default(),
            source: SourceKind::default(),
            zoom: DEFAULT_ZOOM,
            log_file: None,
        }
    }
}

impl Settings {
    /// Defaults when the file is absent; an error when it exists but is unreadable or invalid
    pub fn try_load() -> Result<Self> {
        Self::load_from(&Self::config_path())
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let fail = |message: String| EngineError::Settings { path: path.to_path_buf(), message };
        let content = fs::read_to_string(path).map_err(|e| fail(e.to_string()))?;
        let settings = Self::parse(&content).map_err(fail)?;
        Ok(settings)
    }

    pub fn parse(content: &str) -> std::result::Result<Self, String> {
        let settings: Settings = toml::from_str(content).map_err(|e| e.to_string())?;
        settings.tree.validate().map_err(|e| e.to_string())?;
        if !(settings.display.zoom > 0.0) {
            return Err(format!("display.zoom must be positive, got {}", settings.display.zoom));
        }
        Ok(settings)
    }

    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("moodtree")
            .join("config.toml")
    }
}
