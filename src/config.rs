use std::fs;
use std::path::PathBuf;

use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::engine::LayoutMode;
use crate::session::PlacementMode;

pub const MAX_GROUP_SIZE: usize = 200;

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_group_size")]
    pub group_size: usize,
    #[serde(default = "default_placement_mode")]
    pub placement_mode: PlacementMode,
    #[serde(default = "default_column_layouts")]
    pub column_layouts: Vec<LayoutMode>,
    #[serde(default = "default_theme")]
    pub theme: String,
    #[serde(default = "default_autosave")]
    pub autosave: bool,
}

fn default_group_size() -> usize {
    16
}
fn default_placement_mode() -> PlacementMode {
    PlacementMode::AutoCheck
}
fn default_column_layouts() -> Vec<LayoutMode> {
    vec![LayoutMode::Sort, LayoutMode::Shuffle]
}
fn default_theme() -> String {
    "catppuccin-mocha".to_string()
}
fn default_autosave() -> bool {
    true
}

impl Default for Config {
    fn default() -> Self {
        Self {
            group_size: default_group_size(),
            placement_mode: default_placement_mode(),
            column_layouts: default_column_layouts(),
            theme: default_theme(),
            autosave: default_autosave(),
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        let path = Self::config_path();
        if path.exists() {
            let content = fs::read_to_string(&path)?;
            let mut config: Config = toml::from_str(&content)?;
            config.validate();
            Ok(config)
        } else {
            Ok(Config::default())
        }
    }

    pub fn save(&self) -> Result<()> {
        let path = Self::config_path();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        fs::write(&path, content)?;
        Ok(())
    }

    /// Directory holding config, saved session, log file and user themes.
    pub fn dir() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("colmatch")
    }

    fn config_path() -> PathBuf {
        Self::dir().join("config.toml")
    }

    /// Clamp values that would make the puzzle unplayable.
    pub fn validate(&mut self) {
        self.group_size = self.group_size.clamp(1, MAX_GROUP_SIZE);
        if self.column_layouts.is_empty() {
            self.column_layouts = default_column_layouts();
        }
    }
}
