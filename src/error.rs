//! Error taxonomy for the resolution pipeline.
//!
//! Commands wrap these in `anyhow` with extra context; the variants here are
//! the conditions the resolver, parser and classpath machinery can surface.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    /// Remote reference not covered by the trust store. Fatal to the single
    /// resolution step; recoverable by `jrun trust add`.
    #[error("untrusted source: {0} (allow it with `jrun trust add`)")]
    UntrustedSource(String),

    /// Network or IO failure while fetching a remote resource. Not retried
    /// internally; the caller may retry the whole invocation.
    #[error("failed to fetch {url}: {reason}")]
    FetchFailure { url: String, reason: String },

    /// A recognized directive with a value that violates its grammar.
    #[error("malformed //{tag} directive in {origin} (line {line}): {reason}")]
    MalformedDirective {
        tag: String,
        origin: String,
        line: usize,
        reason: String,
    },

    /// A `${name}` placeholder with no supplied value and no default.
    #[error("property '{0}' has no value and no default")]
    MissingProperty(String),

    /// The dependency resolver collaborator could not satisfy a coordinate.
    /// Surfaced verbatim.
    #[error("classpath resolution failed: {0}")]
    ClasspathResolution(String),

    /// A compiler or packaging step exited unsuccessfully.
    #[error("build failed: {0}")]
    Build(String),

    /// A local reference that does not point at an existing file.
    #[error("resource not found: {0}")]
    NotFound(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}
