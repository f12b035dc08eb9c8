//! Trust policy for remote sources.
//!
//! Remote URLs must be covered by an allow-list of URL prefixes before any
//! network access happens. The allow-list is persisted as JSON in the config
//! directory and can be extended per-run from `jrun.toml`.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Policy gate consulted before fetching any remote reference.
///
/// Kept as a trait so resolution logic stays testable with fake policies.
pub trait TrustPolicy: Send + Sync {
    fn is_trusted(&self, url: &str) -> bool;
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct TrustFile {
    #[serde(default)]
    prefixes: Vec<String>,
}

/// File-backed allow-list keyed by URL prefix.
#[derive(Debug)]
pub struct TrustStore {
    path: PathBuf,
    prefixes: Vec<String>,
}

impl TrustStore {
    /// Load the trust store from `path`, treating a missing file as empty.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let prefixes = if path.exists() {
            let content = fs::read_to_string(&path)
                .with_context(|| format!("Failed to read trust store: {}", path.display()))?;
            let file: TrustFile = serde_json::from_str(&content)
                .with_context(|| format!("Failed to parse trust store: {}", path.display()))?;
            file.prefixes
        } else {
            Vec::new()
        };
        Ok(Self { path, prefixes })
    }

    /// Add extra prefixes without persisting them (config-supplied trust).
    pub fn with_extra_prefixes(mut self, extra: &[String]) -> Self {
        for prefix in extra {
            if !self.prefixes.contains(prefix) {
                self.prefixes.push(prefix.clone());
            }
        }
        self
    }

    pub fn add(&mut self, prefix: &str) -> Result<()> {
        if !self.prefixes.iter().any(|p| p == prefix) {
            self.prefixes.push(prefix.to_string());
        }
        self.save()
    }

    pub fn remove(&mut self, prefix: &str) -> Result<()> {
        self.prefixes.retain(|p| p != prefix);
        self.save()
    }

    pub fn prefixes(&self) -> &[String] {
        &self.prefixes
    }

    fn save(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        let file = TrustFile {
            prefixes: self.prefixes.clone(),
        };
        let content = serde_json::to_string_pretty(&file)?;
        fs::write(&self.path, content)
            .with_context(|| format!("Failed to write trust store: {}", self.path.display()))?;
        Ok(())
    }
}

impl TrustPolicy for TrustStore {
    fn is_trusted(&self, url: &str) -> bool {
        self.prefixes.iter().any(|p| url.starts_with(p.as_str()))
    }
}

/// Trusts everything. For tests and `--insecure`-style escape hatches.
#[derive(Debug, Default)]
pub struct TrustAll;

impl TrustPolicy for TrustAll {
    fn is_trusted(&self, _url: &str) -> bool {
        true
    }
}
