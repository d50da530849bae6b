//! Optional settings file.
//!
//! Values here sit between command-line flags/environment and the built-in defaults.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Address of the classification service when nothing else is configured.
pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:5174";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub base_url: Option<String>,
    #[serde(with = "humantime_serde")]
    pub timeout: Option<Duration>,
}

/// `<config_dir>/ddos-predictor/config.json`
pub fn default_settings_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("ddos-predictor").join("config.json"))
}

/// Load settings from `explicit` if given (must exist), else from the default path if present.
pub fn load_settings(explicit: Option<&Path>) -> Result<Settings> {
    match explicit {
        Some(p) => read_settings(p),
        None => match default_settings_path() {
            Some(p) if p.exists() => read_settings(&p),
            _ => Ok(Settings::default()),
        },
    }
}

fn read_settings(path: &Path) -> Result<Settings> {
    let raw = std::fs::read(path).with_context(|| format!("read config {}", path.display()))?;
    serde_json::from_slice(&raw).with_context(|| format!("parse config {}", path.display()))
}
