use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use pipewright_livelog::DEFAULT_CAPACITY;
use serde::{Deserialize, Serialize};

pub const DEFAULT_SERVER_URL: &str = "http://localhost:5000";

/// Settings read from `<data-dir>/config.json`.
///
/// Every field is optional in the file; command-line flags override it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
  /// Base URL of the editor server.
  pub server_url: String,
  /// Script catalog directory. Defaults to `<data-dir>/catalog`.
  pub catalog_dir: Option<PathBuf>,
  /// Events buffered between a run and the log view.
  pub channel_capacity: usize,
}

impl Default for Settings {
  fn default() -> Self {
    Self {
      server_url: DEFAULT_SERVER_URL.to_string(),
      catalog_dir: None,
      channel_capacity: DEFAULT_CAPACITY,
    }
  }
}

impl Settings {
  /// Load settings from the data directory. A missing file yields defaults.
  pub fn load(data_dir: &Path) -> Result<Self> {
    let path = data_dir.join("config.json");
    if !path.exists() {
      return Ok(Self::default());
    }

    let content = std::fs::read_to_string(&path)
      .with_context(|| format!("failed to read settings: {}", path.display()))?;
    serde_json::from_str(&content)
      .with_context(|| format!("failed to parse settings: {}", path.display()))
  }

  pub fn catalog_dir(&self, data_dir: &Path) -> PathBuf {
    self
      .catalog_dir
      .clone()
      .unwrap_or_else(|| data_dir.join("catalog"))
  }
}
