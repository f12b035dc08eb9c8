//! Reference-to-file resolution.
//!
//! A reference string is a local path, a bare filename relative to the
//! current resolution context, or a URL (optionally fragment-qualified to
//! select one member of a multi-file bundle). Resolution turns it into a
//! `ResourceRef` backed by a concrete readable file, applying the trust
//! policy and content cache for remote references.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

use crate::error::{Error, Result};

use super::cache::UrlCache;
use super::fetch::Fetcher;
use super::trust::TrustPolicy;

/// Resolved identity and location of one addressable resource.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ResourceRef {
    /// The reference string as originally written.
    pub original: String,
    /// The concrete readable file the reference resolved to.
    pub file: PathBuf,
    /// Whether the origin was a URL.
    pub is_url: bool,
    /// For URL origins, the cache entry the bytes were materialized to.
    pub cache_dir: Option<PathBuf>,
}

impl ResourceRef {
    /// A ResourceRef for an existing local file, no resolution involved.
    pub fn for_file<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref();
        Self {
            original: path.display().to_string(),
            file: path.to_path_buf(),
            is_url: false,
            cache_dir: None,
        }
    }

    pub fn file_name(&self) -> String {
        self.file
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default()
    }
}

/// Where a relative reference is resolved from.
#[derive(Debug, Clone)]
pub enum ResolveContext {
    /// Relative to a local directory.
    Dir(PathBuf),
    /// Relative to a URL-origin source: siblings are first looked up in the
    /// materialized cache directory, then joined onto the base URL.
    Url { base: String, dir: PathBuf },
}

impl ResolveContext {
    pub fn dir(&self) -> &Path {
        match self {
            ResolveContext::Dir(d) => d,
            ResolveContext::Url { dir, .. } => dir,
        }
    }
}

/// Resolves reference strings into `ResourceRef`s.
///
/// Holds the trust policy, content cache and transport as injected
/// collaborator handles, plus a per-pass memo so resolution is idempotent
/// within one discovery.
pub struct Resolver {
    trust: Box<dyn TrustPolicy>,
    fetcher: Box<dyn Fetcher>,
    cache: UrlCache,
    fresh_window: Duration,
    memo: HashMap<(String, PathBuf), ResourceRef>,
}

impl Resolver {
    pub fn new(
        trust: Box<dyn TrustPolicy>,
        fetcher: Box<dyn Fetcher>,
        cache: UrlCache,
        fresh_window: Duration,
    ) -> Self {
        Self {
            trust,
            fetcher,
            cache,
            fresh_window,
            memo: HashMap::new(),
        }
    }

    pub fn cache(&self) -> &UrlCache {
        &self.cache
    }

    /// Resolve `reference` within `ctx` to a concrete readable file.
    pub fn resolve(&mut self, reference: &str, ctx: &ResolveContext) -> Result<ResourceRef> {
        // A bare name only has meaning inside its context directory, so the
        // idempotence memo is keyed by (reference, context dir).
        let memo_key = (reference.to_string(), ctx.dir().to_path_buf());
        if let Some(found) = self.memo.get(&memo_key) {
            return Ok(found.clone());
        }

        let resolved = if is_url(reference) {
            self.resolve_url(reference)?
        } else {
            self.resolve_local(reference, ctx)?
        };

        debug!(
            reference,
            file = %resolved.file.display(),
            remote = resolved.is_url,
            "resolved reference"
        );
        self.memo.insert(memo_key, resolved.clone());
        Ok(resolved)
    }

    fn resolve_local(&mut self, reference: &str, ctx: &ResolveContext) -> Result<ResourceRef> {
        let path = Path::new(reference);

        // Bare sibling names of a URL-origin source: prefer the materialized
        // bundle member, otherwise join onto the base URL.
        if let ResolveContext::Url { base, dir } = ctx {
            let candidate = dir.join(reference);
            if candidate.is_file() {
                return finish_local(reference, &candidate, ctx);
            }
            let joined = join_url(base, reference);
            return self.resolve_url(&joined);
        }

        let candidate = if path.is_absolute() {
            path.to_path_buf()
        } else {
            ctx.dir().join(path)
        };

        if !candidate.is_file() {
            return Err(Error::NotFound(reference.to_string()));
        }
        finish_local(reference, &candidate, ctx)
    }

    fn resolve_url(&mut self, reference: &str) -> Result<ResourceRef> {
        let (base, fragment) = split_fragment(reference);

        if !self.trust.is_trusted(base) {
            return Err(Error::UntrustedSource(reference.to_string()));
        }

        if !self.cache.is_fresh(base, self.fresh_window) {
            debug!(url = base, "fetching remote resource");
            let content = self.fetcher.fetch(base)?;
            self.cache.put(base, &content.into_files())?;
        }

        let file = match fragment {
            Some(frag) => {
                let wanted = fragment_to_file_name(frag);
                self.cache
                    .member(base, &wanted)
                    .ok_or_else(|| Error::NotFound(reference.to_string()))?
            }
            None => self
                .cache
                .first_member(base)
                .ok_or_else(|| Error::NotFound(reference.to_string()))?,
        };

        Ok(ResourceRef {
            original: reference.to_string(),
            file,
            is_url: true,
            cache_dir: Some(self.cache.entry_dir(base)),
        })
    }
}

fn finish_local(reference: &str, candidate: &Path, ctx: &ResolveContext) -> Result<ResourceRef> {
    let file = candidate.canonicalize()?;
    // A file materialized from a URL keeps its URL origin even when an
    // include reaches it by bare name.
    let from_bundle = matches!(ctx, ResolveContext::Url { .. });
    Ok(ResourceRef {
        original: reference.to_string(),
        file,
        is_url: from_bundle,
        cache_dir: if from_bundle {
            Some(ctx.dir().to_path_buf())
        } else {
            None
        },
    })
}

pub fn is_url(reference: &str) -> bool {
    reference.contains("://")
}

/// Split a fragment-qualified URL into (base, fragment).
pub fn split_fragment(url: &str) -> (&str, Option<&str>) {
    match url.split_once('#') {
        Some((base, frag)) if !frag.is_empty() => (base, Some(frag)),
        _ => (url, None),
    }
}

/// Map a bundle fragment to the member filename it selects.
///
/// Generated fragments use `file-` plus the name with its extension dot
/// turned into a dash: `#file-two-java` selects `two.java`,
/// `#file-gsonhelper-java` selects `gsonhelper.java`.
pub fn fragment_to_file_name(fragment: &str) -> String {
    let name = fragment.strip_prefix("file-").unwrap_or(fragment);
    match name.rsplit_once('-') {
        Some((stem, ext)) => format!("{stem}.{ext}"),
        None => name.to_string(),
    }
}

/// Join a relative reference onto a base URL (sibling-level join).
fn join_url(base: &str, relative: &str) -> String {
    match base.rfind('/') {
        Some(idx) => format!("{}/{}", &base[..idx], relative),
        None => relative.to_string(),
    }
}
