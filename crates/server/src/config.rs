//! Server configuration, read from a JSON file.
//!
//! Every field has a default, so a missing file (or a partial one) is fine.

use std::path::{Path, PathBuf};

use anyhow::Context;
use serde::Deserialize;

use crate::level::LevelSettings;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Physics tick period for every level.
    pub tick_interval_ms: u64,
    pub world_dir: PathBuf,
    /// 0 disables autosave.
    pub autosave_secs: u64,
    /// Keep a per-level change history file.
    pub history: bool,
    /// How often the metrics snapshot is logged; 0 disables it.
    pub metrics_secs: u64,
    pub levels: Vec<LevelConfig>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LevelConfig {
    pub name: String,
    #[serde(default = "default_width")]
    pub width: u16,
    #[serde(default = "default_height")]
    pub height: u16,
    #[serde(default = "default_width")]
    pub length: u16,
    #[serde(flatten)]
    pub settings: LevelSettings,
}

fn default_width() -> u16 {
    128
}

fn default_height() -> u16 {
    64
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: 100,
            world_dir: PathBuf::from("world"),
            autosave_secs: 300,
            history: true,
            metrics_secs: 60,
            levels: vec![LevelConfig::main()],
        }
    }
}

impl LevelConfig {
    /// The level created when none are configured.
    pub fn main() -> Self {
        Self {
            name: "main".to_string(),
            width: default_width(),
            height: default_height(),
            length: default_width(),
            settings: LevelSettings::default(),
        }
    }
}

impl ServerConfig {
    /// Read `path`, falling back to defaults when it does not exist.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        if !path.exists() {
            tracing::info!("No config at {}, using defaults", path.display());
            return Ok(Self::default());
        }
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        Self::parse(&text).with_context(|| format!("invalid config {}", path.display()))
    }

    pub fn parse(text: &str) -> anyhow::Result<Self> {
        let mut config: ServerConfig = serde_json::from_str(text)?;
        if config.levels.is_empty() {
            config.levels.push(LevelConfig::main());
        }
        if config.tick_interval_ms == 0 {
            anyhow::bail!("tick_interval_ms must be positive");
        }
        Ok(config)
    }
}
