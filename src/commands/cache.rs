//! `jrun cache`: inspect and clear cached content.

use anyhow::Result;
use std::fs;
use tracing::info;

use crate::cli::{CacheArgs, CacheCommands};
use crate::config::load_config_with_discovery;

pub fn run(args: CacheArgs) -> Result<()> {
    let config = load_config_with_discovery(args.config.config.as_deref())?;
    let root = config.effective_cache_dir();

    match args.command {
        CacheCommands::Clear => {
            for sub in ["urls", "jars"] {
                let dir = root.join(sub);
                if dir.exists() {
                    fs::remove_dir_all(&dir)?;
                    info!(dir = %dir.display(), "cleared");
                }
            }
            println!("cache cleared");
        }
        CacheCommands::Path => {
            println!("{}", root.display());
        }
        CacheCommands::Stats => {
            let urls = subtree_stats(&root.join("urls"))?;
            let jars = subtree_stats(&root.join("jars"))?;
            println!("Cache: {}", root.display());
            println!("URL entries: {} files, {:.2} MB", urls.0, urls.1 as f64 / 1_000_000.0);
            println!("Built jars: {} files, {:.2} MB", jars.0, jars.1 as f64 / 1_000_000.0);
        }
    }
    Ok(())
}

/// (file count, total bytes) of a directory tree; missing trees are empty.
fn subtree_stats(dir: &std::path::Path) -> Result<(u64, u64)> {
    let mut files = 0u64;
    let mut bytes = 0u64;
    if !dir.exists() {
        return Ok((0, 0));
    }
    let mut stack = vec![dir.to_path_buf()];
    while let Some(current) = stack.pop() {
        for entry in fs::read_dir(&current)? {
            let entry = entry?;
            let meta = entry.metadata()?;
            if meta.is_dir() {
                stack.push(entry.path());
            } else {
                files += 1;
                bytes += meta.len();
            }
        }
    }
    Ok((files, bytes))
}
