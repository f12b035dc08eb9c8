//! Transitive closure of a main source and its included sources.
//!
//! Discovery is an explicit worklist walk over each source's inclusion list.
//! The visited set is keyed by resolved concrete file identity, never by
//! reference string, so two spellings of the same file are included once and
//! mutual inclusion terminates. Duplicates and cycles are skipped, not
//! errors. A failed step propagates; no partial set escapes.

use sha2::{Digest, Sha256};
use std::collections::{HashSet, VecDeque};
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::error::Result;
use crate::resolver::resource::{is_url, split_fragment};
use crate::resolver::{ResolveContext, Resolver, ResourceRef};

use super::directives::PropertySource;
use super::source::Source;

#[derive(Debug, Clone, Default)]
pub struct SourceSet {
    sources: Vec<Source>,
    dependencies: Vec<String>,
    repositories: Vec<String>,
}

struct WorkItem {
    reference: String,
    ctx: ResolveContext,
}

impl SourceSet {
    /// An empty set, for projects backed by a pre-built artifact.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Discover the full closure of `main`.
    pub fn discover(
        main: Source,
        resolver: &mut Resolver,
        props: Option<&dyn PropertySource>,
    ) -> Result<SourceSet> {
        let mut set = SourceSet::default();
        let mut visited: HashSet<PathBuf> = HashSet::new();
        let mut work: VecDeque<WorkItem> = VecDeque::new();

        visited.insert(canonical_identity(main.resource_ref()));
        let main_ctx = ctx_for(main.resource_ref(), None);
        enqueue_includes(&main, &main_ctx, &mut work);
        set.absorb(&main);
        set.sources.push(main);

        while let Some(item) = work.pop_front() {
            if !is_url(&item.reference) && is_glob(&item.reference) {
                expand_glob(&item, &mut work)?;
                continue;
            }

            let rref = resolver.resolve(&item.reference, &item.ctx)?;
            if !visited.insert(canonical_identity(&rref)) {
                debug!(reference = %item.reference, "already included, skipping");
                continue;
            }

            let source = Source::read(rref, props)?;
            let child_ctx = ctx_for(source.resource_ref(), Some(&item.ctx));
            enqueue_includes(&source, &child_ctx, &mut work);
            set.absorb(&source);
            set.sources.push(source);
        }

        debug!(
            sources = set.sources.len(),
            dependencies = set.dependencies.len(),
            "discovery complete"
        );
        Ok(set)
    }

    fn absorb(&mut self, source: &Source) {
        for dep in source.dependencies() {
            if !self.dependencies.contains(dep) {
                self.dependencies.push(dep.clone());
            }
        }
        for repo in source.repositories() {
            if !self.repositories.contains(repo) {
                self.repositories.push(repo.clone());
            }
        }
    }

    /// All sources, main first, then transitively included in discovery
    /// order. This order is significant for classpath construction.
    pub fn sources(&self) -> &[Source] {
        &self.sources
    }

    /// Deduplicated union of dependency coordinates across the closure,
    /// order-stable on first occurrence.
    pub fn dependencies(&self) -> &[String] {
        &self.dependencies
    }

    /// Deduplicated union of repository tokens across the closure.
    pub fn repositories(&self) -> &[String] {
        &self.repositories
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }

    /// Deterministic content-derived cache key: a digest of every member's
    /// name and text in closure order plus the dependency union.
    pub fn stable_id(&self) -> String {
        let mut hasher = Sha256::new();
        for source in &self.sources {
            hasher.update(source.resource_ref().file_name().as_bytes());
            hasher.update([0u8]);
            hasher.update(source.text().as_bytes());
            hasher.update([0u8]);
        }
        let mut deps = self.dependencies.clone();
        deps.sort();
        for dep in deps {
            hasher.update(dep.as_bytes());
            hasher.update([0u8]);
        }
        hex::encode(hasher.finalize())[..16].to_string()
    }
}

/// File identity used for visited-set dedup. Falls back to the resolved path
/// when canonicalization is impossible.
fn canonical_identity(rref: &ResourceRef) -> PathBuf {
    rref.file.canonicalize().unwrap_or_else(|_| rref.file.clone())
}

/// Build the resolution context that `rref`'s own includes resolve in.
///
/// URL-origin sources resolve relative references against their originating
/// URL; bundle members inherit their parent's base URL since their own
/// reference was a bare sibling name.
fn ctx_for(rref: &ResourceRef, parent: Option<&ResolveContext>) -> ResolveContext {
    let dir = rref
        .file
        .parent()
        .unwrap_or_else(|| Path::new("."))
        .to_path_buf();

    if rref.is_url {
        let base = if is_url(&rref.original) {
            split_fragment(&rref.original).0.to_string()
        } else if let Some(ResolveContext::Url { base, .. }) = parent {
            base.clone()
        } else {
            rref.original.clone()
        };
        ResolveContext::Url { base, dir }
    } else {
        ResolveContext::Dir(dir)
    }
}

fn enqueue_includes(source: &Source, ctx: &ResolveContext, work: &mut VecDeque<WorkItem>) {
    for reference in source.sources() {
        work.push_back(WorkItem {
            reference: reference.clone(),
            ctx: ctx.clone(),
        });
    }
}

fn is_glob(reference: &str) -> bool {
    reference.contains('*') || reference.contains('?') || reference.contains('[')
}

/// Expand a glob inclusion into concrete path references, processed at the
/// glob's position in the worklist.
fn expand_glob(item: &WorkItem, work: &mut VecDeque<WorkItem>) -> Result<()> {
    let pattern = item.ctx.dir().join(&item.reference);
    let pattern = pattern.to_string_lossy();

    let mut matches: Vec<PathBuf> = glob::glob(&pattern)
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidInput, e.to_string()))?
        .filter_map(|m| m.ok())
        .filter(|p| p.is_file())
        .collect();
    matches.sort();

    for path in matches.into_iter().rev() {
        work.push_front(WorkItem {
            reference: path.display().to_string(),
            ctx: item.ctx.clone(),
        });
    }
    Ok(())
}
