//! Content cache for downloaded URL bytes.
//!
//! Each URL maps to one cache entry directory (git-style sharding of the
//! URL's SHA256: first 2 hex chars as subdir). An entry holds the
//! materialized file(s) of the fetched resource plus a `.stamp` marker whose
//! mtime records the fetch time for freshness checks.
//!
//! Writes are atomic (write to a PID-qualified temp file, then rename), so
//! concurrent uncoordinated invocations of the tool never observe a partially
//! written file. Same-key writes are idempotent: the key is derived from the
//! URL and the content is whatever that URL serves.

use sha2::{Digest, Sha256};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};
use tracing::debug;

use crate::error::Result;

const STAMP_FILE: &str = ".stamp";

#[derive(Debug, Clone)]
pub struct UrlCache {
    root: PathBuf,
}

impl UrlCache {
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    /// Cache entry directory for a URL (fragment-free).
    pub fn entry_dir(&self, url: &str) -> PathBuf {
        let hex_id = hex::encode(Sha256::digest(url.as_bytes()));
        let (prefix, suffix) = hex_id.split_at(2);
        self.root.join(prefix).join(suffix)
    }

    /// Whether the entry for `url` exists and was fetched within `window`.
    pub fn is_fresh(&self, url: &str, window: Duration) -> bool {
        let stamp = self.entry_dir(url).join(STAMP_FILE);
        let Ok(meta) = fs::metadata(&stamp) else {
            return false;
        };
        match meta.modified().map(|t| SystemTime::now().duration_since(t)) {
            Ok(Ok(age)) => age <= window,
            _ => false,
        }
    }

    /// Materialize fetched files into the entry for `url` and stamp it.
    ///
    /// Returns the entry directory. Every file is written atomically; the
    /// stamp is written last so a fresh entry always has complete content.
    pub fn put(&self, url: &str, files: &[(String, Vec<u8>)]) -> Result<PathBuf> {
        let dir = self.entry_dir(url);
        fs::create_dir_all(&dir)?;

        for (name, bytes) in files {
            write_atomic(&dir.join(name), bytes)?;
        }
        write_atomic(&dir.join(STAMP_FILE), b"")?;

        debug!(url, files = files.len(), "materialized url cache entry");
        Ok(dir)
    }

    /// Look up one member file of an entry, case-insensitively.
    ///
    /// Bundle fragments use lowercased generated names (`two.java` for a
    /// member stored as `Two.java`), so the lookup folds case.
    pub fn member(&self, url: &str, name: &str) -> Option<PathBuf> {
        let dir = self.entry_dir(url);
        let entries = fs::read_dir(&dir).ok()?;
        let wanted = name.to_lowercase();
        for entry in entries.flatten() {
            let file_name = entry.file_name().to_string_lossy().to_string();
            if file_name == STAMP_FILE {
                continue;
            }
            if file_name.to_lowercase() == wanted {
                return Some(entry.path());
            }
        }
        None
    }

    /// First member of an entry, in name order. Used for fragment-less
    /// references to multi-file bundles.
    pub fn first_member(&self, url: &str) -> Option<PathBuf> {
        let dir = self.entry_dir(url);
        let mut names: Vec<PathBuf> = fs::read_dir(&dir)
            .ok()?
            .flatten()
            .map(|e| e.path())
            .filter(|p| p.file_name().map(|n| n != STAMP_FILE).unwrap_or(false))
            .collect();
        names.sort();
        names.into_iter().next()
    }

    /// Remove the whole cache subtree.
    pub fn clear(&self) -> Result<()> {
        if self.root.exists() {
            fs::remove_dir_all(&self.root)?;
        }
        Ok(())
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

/// Write data atomically: temp file qualified by PID, then rename.
fn write_atomic(path: &Path, data: &[u8]) -> Result<()> {
    let parent = path.parent().expect("cache paths always have a parent");
    fs::create_dir_all(parent)?;

    let temp_name = format!(
        "{}.tmp.{}",
        path.file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default(),
        std::process::id()
    );
    let temp_path = parent.join(temp_name);

    let mut file = fs::File::create(&temp_path)?;
    file.write_all(data)?;
    file.sync_all()?;
    fs::rename(&temp_path, path)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_put_and_member_lookup() {
        let temp = TempDir::new().unwrap();
        let cache = UrlCache::new(temp.path());

        let url = "https://example.com/bundle";
        cache
            .put(
                url,
                &[
                    ("One.java".to_string(), b"class One {}".to_vec()),
                    ("Two.java".to_string(), b"class Two {}".to_vec()),
                ],
            )
            .unwrap();

        let member = cache.member(url, "two.java").unwrap();
        assert_eq!(fs::read(&member).unwrap(), b"class Two {}");
        assert!(cache.member(url, "three.java").is_none());
    }

    #[test]
    fn test_freshness_window() {
        let temp = TempDir::new().unwrap();
        let cache = UrlCache::new(temp.path());

        let url = "https://example.com/a.java";
        assert!(!cache.is_fresh(url, Duration::from_secs(60)));

        cache
            .put(url, &[("a.java".to_string(), b"class a {}".to_vec())])
            .unwrap();
        assert!(cache.is_fresh(url, Duration::from_secs(60)));
        assert!(!cache.is_fresh(url, Duration::from_secs(0)));
    }

    #[test]
    fn test_entry_dirs_are_sharded_and_distinct() {
        let temp = TempDir::new().unwrap();
        let cache = UrlCache::new(temp.path());

        let a = cache.entry_dir("https://example.com/a");
        let b = cache.entry_dir("https://example.com/b");
        assert_ne!(a, b);
        assert_eq!(a, cache.entry_dir("https://example.com/a"));
    }

    #[test]
    fn test_put_is_idempotent() {
        let temp = TempDir::new().unwrap();
        let cache = UrlCache::new(temp.path());

        let url = "https://example.com/x.java";
        let files = vec![("x.java".to_string(), b"class x {}".to_vec())];
        let d1 = cache.put(url, &files).unwrap();
        let d2 = cache.put(url, &files).unwrap();
        assert_eq!(d1, d2);
        assert_eq!(fs::read(d1.join("x.java")).unwrap(), b"class x {}");
    }
}
