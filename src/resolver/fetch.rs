//! Remote content transport.
//!
//! Fetching is behind the `Fetcher` trait so discovery stays testable with
//! fake transports. The shipped implementation speaks plain HTTP(S) for
//! single files and the gist API for multi-file bundles.

use crate::error::{Error, Result};

/// What a URL resolves to on the wire.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemoteContent {
    /// A single file: its materialization name and raw bytes.
    Single { name: String, bytes: Vec<u8> },
    /// A multi-file bundle (e.g. a gist): (member name, bytes) pairs in the
    /// order the service lists them.
    Bundle { files: Vec<(String, Vec<u8>)> },
}

impl RemoteContent {
    pub fn into_files(self) -> Vec<(String, Vec<u8>)> {
        match self {
            RemoteContent::Single { name, bytes } => vec![(name, bytes)],
            RemoteContent::Bundle { files } => files,
        }
    }
}

/// Network transport collaborator. One call per distinct URL; no retries.
pub trait Fetcher: Send + Sync {
    fn fetch(&self, url: &str) -> Result<RemoteContent>;
}

/// HTTP(S) fetcher. Gist URLs go through the gist API and come back as
/// bundles; everything else is a single file named after the last URL path
/// segment.
pub struct HttpFetcher {
    client: reqwest::blocking::Client,
}

impl HttpFetcher {
    pub fn new() -> Self {
        let client = reqwest::blocking::Client::builder()
            .user_agent(concat!("jrun/", env!("CARGO_PKG_VERSION")))
            .build()
            .expect("default TLS backend is always available");
        Self { client }
    }
}

impl Default for HttpFetcher {
    fn default() -> Self {
        Self::new()
    }
}

impl Fetcher for HttpFetcher {
    fn fetch(&self, url: &str) -> Result<RemoteContent> {
        if let Some(gist_id) = gist_id(url) {
            return self.fetch_gist(url, &gist_id);
        }

        let response = self
            .client
            .get(url)
            .send()
            .and_then(|r| r.error_for_status())
            .map_err(|e| Error::FetchFailure {
                url: url.to_string(),
                reason: e.to_string(),
            })?;
        let bytes = response.bytes().map_err(|e| Error::FetchFailure {
            url: url.to_string(),
            reason: e.to_string(),
        })?;

        Ok(RemoteContent::Single {
            name: file_name_from_url(url),
            bytes: bytes.to_vec(),
        })
    }
}

impl HttpFetcher {
    fn fetch_gist(&self, url: &str, gist_id: &str) -> Result<RemoteContent> {
        let api_url = format!("https://api.github.com/gists/{gist_id}");
        let response = self
            .client
            .get(&api_url)
            .header("Accept", "application/vnd.github+json")
            .send()
            .and_then(|r| r.error_for_status())
            .map_err(|e| Error::FetchFailure {
                url: url.to_string(),
                reason: e.to_string(),
            })?;

        let body: serde_json::Value =
            response.json().map_err(|e| Error::FetchFailure {
                url: url.to_string(),
                reason: format!("invalid gist response: {e}"),
            })?;

        let files = body
            .get("files")
            .and_then(|f| f.as_object())
            .ok_or_else(|| Error::FetchFailure {
                url: url.to_string(),
                reason: "gist response has no files".to_string(),
            })?;

        let mut members = Vec::with_capacity(files.len());
        for (name, info) in files {
            let content = info
                .get("content")
                .and_then(|c| c.as_str())
                .ok_or_else(|| Error::FetchFailure {
                    url: url.to_string(),
                    reason: format!("gist member '{name}' has no content"),
                })?;
            members.push((name.clone(), content.as_bytes().to_vec()));
        }

        if members.is_empty() {
            return Err(Error::FetchFailure {
                url: url.to_string(),
                reason: "gist bundle is empty".to_string(),
            });
        }

        Ok(RemoteContent::Bundle { files: members })
    }
}

/// Extract a gist id from gist.github.com URLs.
fn gist_id(url: &str) -> Option<String> {
    let rest = url
        .strip_prefix("https://gist.github.com/")
        .or_else(|| url.strip_prefix("http://gist.github.com/"))?;
    let path = rest.split('#').next().unwrap_or(rest);
    let id = path.rsplit('/').next()?.trim();
    if id.is_empty() {
        None
    } else {
        Some(id.to_string())
    }
}

/// Materialization name for a single-file URL: the last path segment, or
/// "main" when the URL has no usable segment.
pub fn file_name_from_url(url: &str) -> String {
    let without_fragment = url.split('#').next().unwrap_or(url);
    let without_query = without_fragment.split('?').next().unwrap_or(without_fragment);
    let segment = without_query.trim_end_matches('/').rsplit('/').next();
    match segment {
        Some(s) if !s.is_empty() && !s.contains(':') => s.to_string(),
        _ => "main".to_string(),
    }
}
