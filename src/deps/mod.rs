//! Maven coordinate handling and classpath materialization.

use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::error::{Error, Result};

/// A named artifact repository. Tokens come either as `name=url` or as a
/// well-known alias (`central`, `jitpack`, `google`) or as a bare URL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MavenRepo {
    pub id: String,
    pub url: String,
}

impl MavenRepo {
    pub fn new(id: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            url: url.into(),
        }
    }

    pub fn from_token(token: &str) -> Self {
        if let Some((name, url)) = token.split_once('=') {
            return Self::new(name.trim(), url.trim());
        }
        match token.to_ascii_lowercase().as_str() {
            "central" | "mavencentral" => {
                Self::new("central", "https://repo1.maven.org/maven2/")
            }
            "jitpack" => Self::new("jitpack", "https://jitpack.io/"),
            "google" => Self::new("google", "https://maven.google.com/"),
            _ => Self::new(token, token),
        }
    }
}

/// An ordered list of resolved artifact paths.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Classpath {
    entries: Vec<PathBuf>,
}

impl Classpath {
    pub fn new(entries: Vec<PathBuf>) -> Self {
        Self { entries }
    }

    pub fn entries(&self) -> &[PathBuf] {
        &self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Joined form suitable for `-cp`.
    pub fn as_arg(&self) -> String {
        let sep = if cfg!(windows) { ";" } else { ":" };
        self.entries
            .iter()
            .map(|p| p.display().to_string())
            .collect::<Vec<_>>()
            .join(sep)
    }

    /// A new classpath with `path` appended in front-to-back order.
    pub fn with_entry(&self, path: PathBuf) -> Self {
        let mut entries = self.entries.clone();
        entries.push(path);
        Self { entries }
    }
}

/// Turns dependency coordinates plus repositories into concrete artifacts.
pub trait DependencyResolver: Send + Sync {
    fn resolve(&self, repos: &[MavenRepo], deps: &[String]) -> Result<Classpath>;
}

/// Resolves coordinates against a local Maven repository layout
/// (`~/.m2/repository` by default). Missing artifacts are a resolution
/// error, not a download trigger.
#[derive(Debug)]
pub struct LocalM2Resolver {
    repo_root: PathBuf,
}

impl LocalM2Resolver {
    pub fn new(repo_root: PathBuf) -> Self {
        Self { repo_root }
    }

    pub fn from_home() -> Self {
        let root = dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".m2")
            .join("repository");
        Self::new(root)
    }

    fn artifact_path(&self, coordinate: &str) -> Result<PathBuf> {
        let parts: Vec<&str> = coordinate.split(':').collect();
        let (group, artifact, version) = match parts.as_slice() {
            [g, a, v] => (*g, *a, *v),
            _ => {
                return Err(Error::ClasspathResolution(format!(
                    "`{coordinate}` is not a group:artifact:version coordinate"
                )))
            }
        };
        let mut path = self.repo_root.clone();
        for seg in group.split('.') {
            path.push(seg);
        }
        path.push(artifact);
        path.push(version);
        path.push(format!("{artifact}-{version}.jar"));
        Ok(path)
    }
}

impl DependencyResolver for LocalM2Resolver {
    fn resolve(&self, _repos: &[MavenRepo], deps: &[String]) -> Result<Classpath> {
        let mut entries = Vec::with_capacity(deps.len());
        for dep in deps {
            let path = self.artifact_path(dep)?;
            if !path.is_file() {
                return Err(Error::ClasspathResolution(format!(
                    "artifact for `{dep}` not found at {}",
                    path.display()
                )));
            }
            debug!(coordinate = %dep, path = %path.display(), "resolved artifact");
            entries.push(path);
        }
        Ok(Classpath::new(entries))
    }
}

/// Dedup-merge repositories, first occurrence of an id wins.
pub fn merge_repos(base: &[MavenRepo], tokens: &[String]) -> Vec<MavenRepo> {
    let mut merged: Vec<MavenRepo> = base.to_vec();
    for token in tokens {
        let repo = MavenRepo::from_token(token);
        if !merged.iter().any(|r| r.id == repo.id) {
            merged.push(repo);
        }
    }
    merged
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_repo_token_forms() {
        assert_eq!(
            MavenRepo::from_token("acme=https://maven.acme.com/repo"),
            MavenRepo::new("acme", "https://maven.acme.com/repo")
        );
        assert_eq!(
            MavenRepo::from_token("central"),
            MavenRepo::new("central", "https://repo1.maven.org/maven2/")
        );
        assert_eq!(
            MavenRepo::from_token("jitpack").url,
            "https://jitpack.io/"
        );
        let bare = MavenRepo::from_token("https://example.com/maven");
        assert_eq!(bare.id, "https://example.com/maven");
        assert_eq!(bare.url, "https://example.com/maven");
    }

    #[test]
    fn test_merge_repos_dedups_by_id() {
        let base = vec![MavenRepo::new("central", "https://repo1.maven.org/maven2/")];
        let merged = merge_repos(
            &base,
            &["central".to_string(), "jitpack".to_string()],
        );
        assert_eq!(merged.len(), 2);
        assert_eq!(merged[1].id, "jitpack");
    }

    #[test]
    fn test_classpath_as_arg() {
        let cp = Classpath::new(vec![PathBuf::from("/a/x.jar"), PathBuf::from("/b/y.jar")]);
        if cfg!(windows) {
            assert_eq!(cp.as_arg(), "/a/x.jar;/b/y.jar");
        } else {
            assert_eq!(cp.as_arg(), "/a/x.jar:/b/y.jar");
        }
    }

    #[test]
    fn test_local_m2_layout() {
        let temp = TempDir::new().unwrap();
        let jar = temp
            .path()
            .join("info/picocli/picocli/4.6.3/picocli-4.6.3.jar");
        fs::create_dir_all(jar.parent().unwrap()).unwrap();
        fs::write(&jar, b"jar").unwrap();

        let resolver = LocalM2Resolver::new(temp.path().to_path_buf());
        let cp = resolver
            .resolve(&[], &["info.picocli:picocli:4.6.3".to_string()])
            .unwrap();
        assert_eq!(cp.entries(), [jar]);
    }

    #[test]
    fn test_local_m2_missing_artifact_errors() {
        let temp = TempDir::new().unwrap();
        let resolver = LocalM2Resolver::new(temp.path().to_path_buf());
        let err = resolver
            .resolve(&[], &["org.example:absent:1.0".to_string()])
            .unwrap_err();
        assert!(err.to_string().contains("org.example:absent:1.0"));
    }

    #[test]
    fn test_versionless_coordinate_rejected() {
        let resolver = LocalM2Resolver::new(PathBuf::from("/nonexistent"));
        let err = resolver
            .resolve(&[], &["org.example:thing".to_string()])
            .unwrap_err();
        assert!(matches!(err, Error::ClasspathResolution(_)));
    }
}
