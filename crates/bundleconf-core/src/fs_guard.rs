//! Dev File-Server Guard.
//!
//! A stateless predicate deciding whether the dev server may read a file.
//! The project root is always readable; anything else must sit inside one
//! of the configured allowed roots. Deny patterns win over both.
//!
//! The guard fails closed: a path it cannot interpret is denied.

use crate::config::FsServeConfig;
use crate::error::{Error, Result};
use bundleconf_util::path::{absolutize, is_within, normalize};
use serde::Serialize;
use std::path::{Component, Path, PathBuf};
use thiserror::Error;
use url::Url;

/// URL prefix addressing the filesystem directly.
pub const FS_PREFIX: &str = "/@fs/";

/// Why a request was refused.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "pattern", rename_all = "camelCase")]
pub enum DenyReason {
    /// Outside the project root and every allowed root.
    OutsideAllowList,
    /// Matched a deny pattern.
    DenyListed(String),
    /// The request could not be mapped to a filesystem path.
    Malformed,
}

/// A refused file request. Non-fatal: the server answers this one request with 403.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
#[error("Access denied: {} ({})", .path.display(), describe_reason(.reason))]
pub struct AccessDenied {
    pub path: PathBuf,
    pub reason: DenyReason,
}

fn describe_reason(reason: &DenyReason) -> String {
    match reason {
        DenyReason::OutsideAllowList => "outside of the serving allow list".to_string(),
        DenyReason::DenyListed(pattern) => format!("matches deny pattern '{pattern}'"),
        DenyReason::Malformed => "malformed request path".to_string(),
    }
}

/// Outcome of a guard check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "decision", rename_all = "camelCase")]
pub enum AccessDecision {
    /// Inside the project root or an allowed root.
    Allowed { path: PathBuf },
    /// Outside every root, served because `strict` is off.
    AllowedUnrestricted { path: PathBuf },
    Denied(AccessDenied),
}

impl AccessDecision {
    #[must_use]
    pub fn is_allowed(&self) -> bool {
        !matches!(self, Self::Denied(_))
    }

    /// Convert into a `Result`, keeping the served path.
    pub fn into_result(self) -> std::result::Result<PathBuf, AccessDenied> {
        match self {
            Self::Allowed { path } | Self::AllowedUnrestricted { path } => Ok(path),
            Self::Denied(denied) => Err(denied),
        }
    }
}

#[derive(Debug, Clone)]
struct DenyRule {
    source: String,
    pattern: glob::Pattern,
}

/// Compiled serving policy.
#[derive(Debug, Clone)]
pub struct FsGuard {
    root: PathBuf,
    /// Lexical and canonical forms of the root and every allowed root.
    allowed: Vec<PathBuf>,
    deny: Vec<DenyRule>,
    strict: bool,
}

impl FsGuard {
    /// Compile the guard for `root`, which must be absolute.
    ///
    /// Allowed roots that exist on disk are also kept in canonical form so a
    /// symlinked request path is compared against the real location.
    pub fn new(config: &FsServeConfig, root: &Path) -> Result<Self> {
        if !root.is_absolute() {
            return Err(Error::invalid(
                "root",
                format!("'{}' is not an absolute path", root.display()),
            ));
        }
        let root = normalize(root);
        let mut allowed = Vec::new();
        for dir in std::iter::once(&root).chain(config.allow.iter()) {
            let lexical = absolutize(dir, &root);
            if !lexical.has_root() {
                continue;
            }
            if let Ok(real) = dunce::canonicalize(&lexical) {
                if !allowed.contains(&real) {
                    allowed.push(real);
                }
            }
            if !allowed.contains(&lexical) {
                allowed.push(lexical);
            }
        }

        let deny = config
            .deny
            .iter()
            .map(|source| compile_deny_pattern(source))
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            root,
            allowed,
            deny,
            strict: config.strict,
        })
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Check a filesystem path. Relative paths are taken from the project root.
    #[must_use]
    pub fn check(&self, path: &Path) -> AccessDecision {
        let lexical = absolutize(path, &self.root);
        if !lexical.is_absolute() || lexical.components().any(|c| c == Component::ParentDir) {
            return denied(lexical, DenyReason::Malformed);
        }
        let resolved = dunce::canonicalize(&lexical).unwrap_or(lexical);

        if let Some(rule) = self.deny.iter().find(|rule| matches_deny(&rule.pattern, &resolved)) {
            return denied(resolved, DenyReason::DenyListed(rule.source.clone()));
        }

        if self.allowed.iter().any(|dir| is_within(&resolved, dir)) {
            return AccessDecision::Allowed { path: resolved };
        }

        if self.strict {
            denied(resolved, DenyReason::OutsideAllowList)
        } else {
            AccessDecision::AllowedUnrestricted { path: resolved }
        }
    }

    /// Check a dev-server request URL path such as `/src/main.ts?t=123` or
    /// `/@fs/home/me/shared/icon.woff2`.
    #[must_use]
    pub fn check_url(&self, url_path: &str) -> AccessDecision {
        match self.url_to_path(url_path) {
            Some(path) => self.check(&path),
            None => denied(PathBuf::from(url_path), DenyReason::Malformed),
        }
    }

    /// Map a request URL path to the filesystem path it addresses.
    fn url_to_path(&self, url_path: &str) -> Option<PathBuf> {
        if !url_path.starts_with('/') {
            return None;
        }
        let mut url = Url::parse("file:///").ok()?.join(url_path).ok()?;
        url.set_query(None);
        url.set_fragment(None);

        if let Some(fs_path) = url.path().strip_prefix(FS_PREFIX) {
            let direct = Url::parse("file:///").ok()?.join(fs_path).ok()?;
            return direct.to_file_path().ok();
        }

        let decoded = url.to_file_path().ok()?;
        let relative = decoded.strip_prefix("/").ok()?;
        Some(self.root.join(relative))
    }
}

fn denied(path: PathBuf, reason: DenyReason) -> AccessDecision {
    AccessDecision::Denied(AccessDenied { path, reason })
}

fn compile_deny_pattern(source: &str) -> Result<DenyRule> {
    let trimmed = source.trim_start_matches("**/");
    let pattern = glob::Pattern::new(trimmed)
        .map_err(|e| Error::invalid("server.fs.deny", format!("invalid pattern '{source}': {e}")))?;
    Ok(DenyRule {
        source: source.to_string(),
        pattern,
    })
}

/// Match against the file name and every directory component.
fn matches_deny(pattern: &glob::Pattern, path: &Path) -> bool {
    path.components().any(|c| match c {
        Component::Normal(part) => part.to_str().is_some_and(|s| pattern.matches(s)),
        _ => false,
    })
}
