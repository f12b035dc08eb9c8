//! Command implementations

pub mod build;
pub mod cache;
pub mod info;
pub mod run;
pub mod trust;

use anyhow::{bail, Result};
use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;

use crate::config::JrunConfig;
use crate::resolver::trust::TrustStore;
use crate::resolver::{HttpFetcher, ResolveContext, Resolver, UrlCache};
use crate::source::{EnvPropertySource, PropertySource};
use crate::xdg;

/// Wire up a resolver from the effective configuration: persisted trust
/// store plus config-supplied prefixes, HTTP transport, shared URL cache.
pub(crate) fn make_resolver(config: &JrunConfig) -> Result<Resolver> {
    let trust = TrustStore::load(xdg::trust_store_path())?
        .with_extra_prefixes(&config.trusted);
    Ok(Resolver::new(
        Box::new(trust),
        Box::new(HttpFetcher::new()),
        UrlCache::new(config.effective_cache_dir().join("urls")),
        Duration::from_secs(config.url_fresh_secs),
    ))
}

/// Resolution context for a command-line reference: the current directory.
pub(crate) fn cwd_context() -> Result<ResolveContext> {
    Ok(ResolveContext::Dir(std::env::current_dir()?))
}

/// Parse repeated `-D key=value` pairs.
pub(crate) fn parse_properties(pairs: &[String]) -> Result<CliProperties> {
    let mut map = HashMap::new();
    for pair in pairs {
        match pair.split_once('=') {
            Some((key, value)) if !key.is_empty() => {
                map.insert(key.to_string(), value.to_string());
            }
            _ => bail!("invalid property '{pair}', expected key=value"),
        }
    }
    Ok(CliProperties {
        map,
        env: EnvPropertySource,
    })
}

/// `-D` values first, process environment as fallback.
pub(crate) struct CliProperties {
    map: HashMap<String, String>,
    env: EnvPropertySource,
}

impl CliProperties {
    pub(crate) fn pairs(&self) -> impl Iterator<Item = (&String, &String)> {
        self.map.iter()
    }
}

impl PropertySource for CliProperties {
    fn resolve(&self, name: &str) -> Option<String> {
        self.map
            .get(name)
            .cloned()
            .or_else(|| self.env.resolve(name))
    }
}

pub(crate) fn jars_dir(config: &JrunConfig) -> PathBuf {
    config.effective_cache_dir().join("jars")
}
