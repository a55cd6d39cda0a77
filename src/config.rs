//! Configuration Management
//!
//! Handles persistent configuration storage for cres.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Environment variable that can switch override warnings off
pub const OVERRIDE_WARNINGS_ENV: &str = "CRES_OVERRIDE_WARNINGS";

fn default_override_warnings() -> bool {
    true
}

/// User configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Warn when caller overrides replace a prescriptive default
    #[serde(default = "default_override_warnings")]
    pub override_warnings: bool,
    /// Shapes applied by `cres annotate` when none is given
    #[serde(default)]
    pub default_shapes: Vec<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            override_warnings: default_override_warnings(),
            default_shapes: Vec::new(),
        }
    }
}

impl Config {
    /// Get the config file path
    pub fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("cres").join("config.json"))
    }

    /// Load configuration from disk
    pub fn load() -> Self {
        let Some(path) = Self::config_path() else {
            return Self::default();
        };
        Self::load_from(&path)
    }

    /// Load configuration from a specific file, falling back to defaults
    pub fn load_from(path: &Path) -> Self {
        if !path.exists() {
            return Self::default();
        }

        match std::fs::read_to_string(path) {
            Ok(content) => serde_json::from_str(&content).unwrap_or_else(|e| {
                tracing::warn!("Ignoring malformed config {:?}: {}", path, e);
                Self::default()
            }),
            Err(_) => Self::default(),
        }
    }

    /// Save configuration to a specific file
    pub fn save_to(&self, path: &Path) -> Result<()> {
        // Create parent directory
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {:?}", parent))?;
        }

        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content).with_context(|| format!("Failed to write {:?}", path))?;

        Ok(())
    }

    /// Get effective override warning setting (env > config)
    pub fn effective_override_warnings(&self) -> bool {
        Self::override_warnings_from_env(std::env::var(OVERRIDE_WARNINGS_ENV).ok().as_deref())
            .unwrap_or(self.override_warnings)
    }

    fn override_warnings_from_env(value: Option<&str>) -> Option<bool> {
        match value?.trim().to_lowercase().as_str() {
            "false" | "0" | "off" => Some(false),
            "true" | "1" | "on" => Some(true),
            _ => None,
        }
    }
}
