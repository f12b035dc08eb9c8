//! XDG Base Directory support for jrun
//!
//! Directory structure:
//! - `$XDG_CACHE_HOME/jrun/` (default: `~/.cache/jrun/`) - downloaded URLs and built jars
//! - `$XDG_CONFIG_HOME/jrun/` (default: `~/.config/jrun/`) - configuration and trust store

use std::path::PathBuf;

/// Get the jrun cache directory.
///
/// Respects XDG_CACHE_HOME. Falls back to `$HOME/.cache/jrun` on Unix, or the
/// platform cache directory elsewhere.
pub fn cache_dir() -> PathBuf {
    if let Ok(xdg_cache) = std::env::var("XDG_CACHE_HOME") {
        PathBuf::from(xdg_cache).join("jrun")
    } else if let Some(cache) = dirs::cache_dir() {
        cache.join("jrun")
    } else if let Some(home) = dirs::home_dir() {
        home.join(".cache").join("jrun")
    } else {
        PathBuf::from(".jrun-cache")
    }
}

/// Get the jrun config directory (configuration file, trust store).
pub fn config_dir() -> PathBuf {
    if let Ok(xdg_config) = std::env::var("XDG_CONFIG_HOME") {
        PathBuf::from(xdg_config).join("jrun")
    } else if let Some(config) = dirs::config_dir() {
        config.join("jrun")
    } else if let Some(home) = dirs::home_dir() {
        home.join(".config").join("jrun")
    } else {
        PathBuf::from(".jrun-config")
    }
}

/// Cache subtree for downloaded URL content (one sharded entry per URL).
pub fn urls_cache_dir() -> PathBuf {
    cache_dir().join("urls")
}

/// Cache subtree for built jars, keyed by main file name + stable id.
pub fn jars_cache_dir() -> PathBuf {
    cache_dir().join("jars")
}

/// Default location of the persisted trust store.
pub fn trust_store_path() -> PathBuf {
    config_dir().join("trusted-sources.json")
}
