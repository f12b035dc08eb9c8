//! Configuration loading for jrun
//!
//! Configuration lives in `jrun.toml`, discovered by traversing up from the
//! current directory, with a global fallback under the XDG config dir.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::xdg;

fn default_url_fresh_secs() -> u64 {
    // Cached URL content is reused for a day before re-fetching.
    86_400
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct JrunConfig {
    /// Override for the cache directory (downloaded URLs, built jars).
    #[serde(default)]
    pub cache_dir: Option<PathBuf>,

    /// How long downloaded URL content stays fresh before re-fetching.
    #[serde(default = "default_url_fresh_secs")]
    pub url_fresh_secs: u64,

    /// Extra trusted URL prefixes, merged with the persisted trust store.
    #[serde(default)]
    pub trusted: Vec<String>,

    /// Default Java version when no //JAVA directive is present.
    #[serde(default)]
    pub java_version: Option<String>,
}

impl Default for JrunConfig {
    fn default() -> Self {
        Self {
            cache_dir: None,
            url_fresh_secs: default_url_fresh_secs(),
            trusted: Vec::new(),
            java_version: None,
        }
    }
}

impl JrunConfig {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    /// Effective cache directory, honouring the config override.
    pub fn effective_cache_dir(&self) -> PathBuf {
        self.cache_dir.clone().unwrap_or_else(xdg::cache_dir)
    }
}

/// Discovers jrun configuration by traversing up the directory tree
pub fn discover_config(start_dir: &Path) -> Option<PathBuf> {
    let mut current = start_dir.to_path_buf();

    loop {
        let config_path = current.join("jrun.toml");
        if config_path.exists() {
            return Some(config_path);
        }

        match current.parent() {
            Some(parent) => current = parent.to_path_buf(),
            None => break,
        }
    }

    let global_config = xdg::config_dir().join("config.toml");
    if global_config.exists() {
        return Some(global_config);
    }

    None
}

/// Loads configuration with auto-discovery support
///
/// If `explicit_path` is provided, loads config from that path. Otherwise,
/// auto-discovers by traversing up from the current directory. Falls back to
/// defaults when nothing is found.
pub fn load_config_with_discovery(explicit_path: Option<&str>) -> Result<JrunConfig> {
    if let Some(config_path) = explicit_path {
        return JrunConfig::from_file(config_path);
    }

    let current_dir =
        std::env::current_dir().context("Failed to get current directory for config discovery")?;

    match discover_config(&current_dir) {
        Some(discovered) => {
            tracing::debug!(config = %discovered.display(), "using discovered config");
            JrunConfig::from_file(&discovered)
        }
        None => Ok(JrunConfig::default()),
    }
}
