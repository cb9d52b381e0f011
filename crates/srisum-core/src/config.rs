use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::algorithm::{DEFAULT_ALGORITHM, STRICT_ALGORITHMS};
use crate::compute::BUF_SIZE;
use crate::run::DEFAULT_MAX_OPEN_FILES;

/// Global configuration loaded from `~/.config/srisum/config.toml`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SrisumConfig {
    /// Algorithms computed when `--algorithms` is not given.
    pub default_algorithms: Vec<String>,
    /// Allow-set applied by `--strict`.
    pub strict_algorithms: Vec<String>,
    /// Chunk size for every stream read, in bytes.
    pub read_buffer_bytes: usize,
    /// Maximum number of targets hashed at once.
    pub max_open_files: usize,
}

impl Default for SrisumConfig {
    fn default() -> Self {
        Self {
            default_algorithms: vec![DEFAULT_ALGORITHM.to_string()],
            strict_algorithms: STRICT_ALGORITHMS.iter().map(|s| s.to_string()).collect(),
            read_buffer_bytes: BUF_SIZE,
            max_open_files: DEFAULT_MAX_OPEN_FILES,
        }
    }
}

/// Existing config file, if any, searched under the XDG config dirs.
pub fn config_path() -> Result<Option<PathBuf>> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("srisum")?;
    Ok(xdg_dirs.find_config_file("config.toml"))
}

/// Load configuration from disk. A missing file yields defaults; nothing is created.
pub fn load() -> Result<SrisumConfig> {
    match config_path()? {
        Some(path) => load_from(&path),
        None => Ok(SrisumConfig::default()),
    }
}

pub fn load_from(path: &Path) -> Result<SrisumConfig> {
    let data = fs::read_to_string(path)
        .with_context(|| format!("reading config {}", path.display()))?;
    let cfg: SrisumConfig =
        toml::from_str(&data).with_context(|| format!("parsing config {}", path.display()))?;
    tracing::debug!("loaded config from {}", path.display());
    Ok(cfg)
}
