//! Directive scanning for source text.
//!
//! Directives are line-oriented comment markers: `//TAG value`. The scanner
//! produces a tagged-value stream in file order; the `Source` reducer folds
//! that stream into the data model. Grammar concerns live here, data-model
//! invariants live in `source.rs`.
//!
//! `${name}` and `${name:default}` placeholders pass through the scanner
//! verbatim and are resolved later via a caller-supplied `PropertySource`.

use crate::error::{Error, Result};

/// One recognized directive occurrence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Directive {
    Deps(Vec<String>),
    Repos(Vec<String>),
    CompileOptions(Vec<String>),
    RuntimeOptions(Vec<String>),
    JavaVersion(String),
    Gav(String),
    Sources(Vec<String>),
    Description(String),
    Cds,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tagged {
    pub directive: Directive,
    pub line: usize,
}

/// Scan `text` for directives, in file order. `origin` labels errors.
///
/// Unrecognized tags are ignored for forward compatibility; malformed values
/// for recognized tags fail with the tag name and line number.
pub fn scan(text: &str, origin: &str) -> Result<Vec<Tagged>> {
    let mut out = Vec::new();

    for (idx, raw_line) in text.lines().enumerate() {
        let line_no = idx + 1;
        let line = raw_line.trim_start();

        if let Some(rest) = line.strip_prefix("//") {
            if let Some(tagged) = scan_comment(rest, origin, line_no)? {
                out.push(tagged);
            }
        } else if line.contains("@GrabResolver(") {
            if let Some(repo) = parse_grab_resolver(line) {
                out.push(Tagged {
                    directive: Directive::Repos(vec![repo]),
                    line: line_no,
                });
            }
        }
    }

    Ok(out)
}

fn scan_comment(rest: &str, origin: &str, line: usize) -> Result<Option<Tagged>> {
    // The tag keyword sits directly after the comment marker; `// DEPS …`
    // is prose, not a directive.
    let (tag, value) = match rest.split_once(char::is_whitespace) {
        Some((tag, value)) => (tag, strip_trailing_comment(value).trim()),
        None => (rest.trim_end(), ""),
    };

    let malformed = |reason: &str| Error::MalformedDirective {
        tag: tag.to_string(),
        origin: origin.to_string(),
        line,
        reason: reason.to_string(),
    };

    let directive = match tag {
        "DEPS" => {
            if value.is_empty() {
                return Err(malformed("expected comma-separated coordinates"));
            }
            Directive::Deps(split_commas(value))
        }
        "REPOS" => {
            if value.is_empty() {
                return Err(malformed("expected repository tokens"));
            }
            Directive::Repos(split_repo_tokens(value))
        }
        "JAVAC_OPTIONS" => {
            if value.is_empty() {
                return Err(malformed("expected compiler flags"));
            }
            Directive::CompileOptions(split_options(value))
        }
        "JAVA_OPTIONS" => {
            if value.is_empty() {
                return Err(malformed("expected runtime flags"));
            }
            Directive::RuntimeOptions(split_options(value))
        }
        "JAVA" => {
            if value.is_empty() {
                return Err(malformed("expected a version token"));
            }
            let bare = value.strip_suffix('+').unwrap_or(value);
            if bare.is_empty() || !bare.chars().all(|c| c.is_ascii_digit() || c == '.') {
                return Err(malformed("version must be digits with an optional '+'"));
            }
            Directive::JavaVersion(value.to_string())
        }
        "GAV" => {
            let parts: Vec<&str> = value.split(':').collect();
            if value.is_empty() || parts.len() < 2 || parts.len() > 3
                || parts.iter().any(|p| p.is_empty())
            {
                return Err(malformed("expected group:artifact[:version]"));
            }
            Directive::Gav(value.to_string())
        }
        "SOURCES" => {
            if value.is_empty() {
                return Err(malformed("expected a path, glob or URL"));
            }
            Directive::Sources(split_commas(value))
        }
        "DESCRIPTION" => {
            if value.is_empty() {
                return Err(malformed("expected description text"));
            }
            Directive::Description(value.to_string())
        }
        "CDS" => {
            if !value.is_empty() {
                return Err(malformed("takes no value"));
            }
            Directive::Cds
        }
        _ => return Ok(None),
    };

    Ok(Some(Tagged { directive, line }))
}

/// Strip an inline trailing comment (` // ...`) used for documentation in
/// formatted listings. Only the value part reaches the grammar.
fn strip_trailing_comment(value: &str) -> &str {
    match value.find(" //") {
        Some(idx) => &value[..idx],
        None => value,
    }
}

fn split_commas(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// Repository tokens split on commas and whitespace: `name=url` or bare
/// url/alias tokens.
fn split_repo_tokens(value: &str) -> Vec<String> {
    value
        .split(|c: char| c == ',' || c.is_whitespace())
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// Whitespace tokenization with double-quoted segments preserved as one
/// token (quotes removed). Single quotes stay part of the token, so
/// `"-Dvalue='this is space'"` comes out as `-Dvalue='this is space'`.
fn split_options(value: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;

    for c in value.chars() {
        match c {
            '"' => in_quotes = !in_quotes,
            c if c.is_whitespace() && !in_quotes => {
                if !current.is_empty() {
                    tokens.push(std::mem::take(&mut current));
                }
            }
            c => current.push(c),
        }
    }
    if !current.is_empty() {
        tokens.push(current);
    }
    tokens
}

/// Parse the legacy resolver annotation into a repository token.
///
/// `@GrabResolver(name="restlet.org", root="http://maven.restlet.org")`
/// yields `restlet.org=http://maven.restlet.org`;
/// `@GrabResolver("http://maven.restlet.org")` yields the bare URL (the
/// repository's display name is then the URL itself).
fn parse_grab_resolver(line: &str) -> Option<String> {
    let start = line.find("@GrabResolver(")? + "@GrabResolver(".len();
    let end = line[start..].find(')')? + start;
    let args = &line[start..end];

    let name = quoted_value(args, "name");
    let root = quoted_value(args, "root");

    match (name, root) {
        (Some(name), Some(root)) => Some(format!("{name}={root}")),
        _ => {
            // Single positional form: one quoted URL.
            let first = args.find('"')?;
            let rest = &args[first + 1..];
            let second = rest.find('"')?;
            let url = &rest[..second];
            if url.is_empty() {
                None
            } else {
                Some(url.to_string())
            }
        }
    }
}

fn quoted_value(args: &str, key: &str) -> Option<String> {
    let key_idx = args.find(key)?;
    let after = &args[key_idx + key.len()..];
    let eq = after.find('=')?;
    if !after[..eq].trim().is_empty() {
        return None;
    }
    let after_eq = after[eq + 1..].trim_start();
    let rest = after_eq.strip_prefix('"')?;
    let close = rest.find('"')?;
    Some(rest[..close].to_string())
}

/// Placeholder value provider collaborator.
pub trait PropertySource {
    fn resolve(&self, name: &str) -> Option<String>;
}

impl PropertySource for std::collections::HashMap<String, String> {
    fn resolve(&self, name: &str) -> Option<String> {
        self.get(name).cloned()
    }
}

/// Resolves placeholders from process environment variables.
pub struct EnvPropertySource;

impl PropertySource for EnvPropertySource {
    fn resolve(&self, name: &str) -> Option<String> {
        std::env::var(name).ok()
    }
}

/// Substitute `${name}` / `${name:default}` placeholders in `value`.
///
/// A name with neither a supplied value nor a default fails with
/// `MissingProperty`. Text without placeholders passes through unchanged.
pub fn substitute(value: &str, props: &dyn PropertySource) -> Result<String> {
    let mut result = String::with_capacity(value.len());
    let mut chars = value.chars().peekable();

    while let Some(c) = chars.next() {
        if c == '$' && chars.peek() == Some(&'{') {
            chars.next(); // consume {

            let mut expr = String::new();
            let mut depth = 1;
            for ch in chars.by_ref() {
                match ch {
                    '{' => {
                        depth += 1;
                        expr.push(ch);
                    }
                    '}' => {
                        depth -= 1;
                        if depth == 0 {
                            break;
                        }
                        expr.push(ch);
                    }
                    _ => expr.push(ch),
                }
            }

            let (name, default) = match expr.find(':') {
                Some(idx) => (&expr[..idx], Some(&expr[idx + 1..])),
                None => (expr.as_str(), None),
            };

            match props.resolve(name) {
                Some(v) => result.push_str(&v),
                None => match default {
                    Some(d) => result.push_str(d),
                    None => return Err(Error::MissingProperty(name.to_string())),
                },
            }
        } else {
            result.push(c);
        }
    }

    Ok(result)
}
