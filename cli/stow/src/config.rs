//! `stow.toml` configuration.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Name of the configuration file searched for upward from the working directory.
pub const CONFIG_FILE: &str = "stow.toml";

/// The top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StowConfig {
    /// Store settings.
    #[serde(default)]
    pub store: StoreConfig,
    /// Output settings.
    #[serde(default)]
    pub output: OutputConfig,
}

/// Store section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Root directory of the filesystem store, relative to the config file.
    #[serde(default = "default_root")]
    pub root: PathBuf,
}

impl Default for StoreConfig {
    fn default() -> Self {
        StoreConfig {
            root: default_root(),
        }
    }
}

fn default_root() -> PathBuf {
    PathBuf::from(".stow")
}

/// Output section.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Pretty-print JSON output by default.
    #[serde(default)]
    pub pretty: bool,
}

impl StowConfig {
    /// Search upward from `start_dir` for a `stow.toml` file, parse and return it
    /// along with the directory it was found in.
    pub fn find_and_load(start_dir: &Path) -> Result<Option<(Self, PathBuf)>> {
        let mut dir = start_dir.to_path_buf();
        loop {
            let candidate = dir.join(CONFIG_FILE);
            if candidate.is_file() {
                let config = Self::load(&candidate)?;
                return Ok(Some((config, dir)));
            }
            if !dir.pop() {
                break;
            }
        }
        Ok(None)
    }

    /// Load a configuration file from an explicit path.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()))?;
        toml::from_str(&content).with_context(|| format!("parsing {}", path.display()))
    }

    /// Resolve the store root against the directory the config came from.
    pub fn store_root(&self, base_dir: &Path) -> PathBuf {
        if self.store.root.is_absolute() {
            self.store.root.clone()
        } else {
            base_dir.join(&self.store.root)
        }
    }
}

/// Load the configuration for a command.
///
/// An explicit path must exist. Otherwise the nearest `stow.toml` is used,
/// falling back to defaults anchored at `cwd`.
pub fn load_config(cwd: &Path, explicit: Option<&Path>) -> Result<(StowConfig, PathBuf)> {
    if let Some(path) = explicit {
        let config = StowConfig::load(path)?;
        let dir = path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .map(Path::to_path_buf)
            .unwrap_or_else(|| cwd.to_path_buf());
        return Ok((config, dir));
    }

    match StowConfig::find_and_load(cwd)? {
        Some(found) => Ok(found),
        None => {
            tracing::debug!("no {CONFIG_FILE} found, using defaults");
            Ok((StowConfig::default(), cwd.to_path_buf()))
        }
    }
}
