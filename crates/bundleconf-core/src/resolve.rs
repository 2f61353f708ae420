//! Path Resolver: alias rewriting followed by filesystem resolution.
//!
//! ## Specifier Types
//!
//! - Aliased: `@/components/Foo.vue` → `<src>/components/Foo.vue`
//! - Relative: `./utils`, `../lib/foo`
//! - Root-absolute: `/src/main.ts` (project root first, then the filesystem)
//! - Bare: `vue`, `@mdi/font`, `@mdi/font/css/materialdesignicons.css`
//! - Builtin: `node:path`
//!
//! Resolution is a pure function of the specifier, the importer, the config,
//! and the filesystem. Nothing is cached.

use crate::alias::{apply_aliases, AliasRule};
use crate::config::BundlerConfig;
use bundleconf_util::path::package_name;
use serde::Serialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Result of resolving an import specifier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Resolution {
    /// Resolved to a file on disk.
    File {
        path: PathBuf,
        /// npm package owning the file, if it lives under `node_modules`.
        package: Option<String>,
    },
    /// Built-in module (`node:fs`, etc.), left to the runtime.
    Builtin { specifier: String },
}

impl Resolution {
    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        match self {
            Self::File { path, .. } => Some(path),
            Self::Builtin { .. } => None,
        }
    }
}

/// Resolution failure, fatal to the compilation unit that requested it.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ResolveError {
    #[error(
        "Cannot resolve '{specifier}'{}{}",
        describe_importer(.importer.as_deref()),
        describe_alias(.aliased_to.as_deref())
    )]
    NotFound {
        specifier: String,
        importer: Option<PathBuf>,
        /// Path the specifier was rewritten to by an alias rule.
        aliased_to: Option<PathBuf>,
    },

    #[error("Invalid package.json at {path}: {message}")]
    PackageJson { path: PathBuf, message: String },
}

fn describe_importer(importer: Option<&Path>) -> String {
    importer.map_or_else(String::new, |p| format!(" from '{}'", p.display()))
}

fn describe_alias(aliased_to: Option<&Path>) -> String {
    aliased_to.map_or_else(String::new, |p| format!(" (aliased to '{}')", p.display()))
}

/// Import resolver bound to one configuration.
#[derive(Debug, Clone, Copy)]
pub struct PathResolver<'a> {
    root: &'a Path,
    aliases: &'a [AliasRule],
    extensions: &'a [String],
}

impl<'a> PathResolver<'a> {
    /// Resolver for a loaded configuration.
    #[must_use]
    pub fn new(config: &'a BundlerConfig) -> Self {
        Self {
            root: &config.root,
            aliases: &config.resolve.alias,
            extensions: &config.resolve.extensions,
        }
    }

    /// Resolver from individual parts.
    #[must_use]
    pub fn from_parts(
        root: &'a Path,
        aliases: &'a [AliasRule],
        extensions: &'a [String],
    ) -> Self {
        Self {
            root,
            aliases,
            extensions,
        }
    }

    /// Apply alias rules only (first match wins).
    #[must_use]
    pub fn rewrite(&self, specifier: &str) -> Option<(&'a AliasRule, PathBuf)> {
        apply_aliases(self.aliases, specifier)
    }

    /// Resolve an import specifier.
    ///
    /// # Arguments
    /// - `specifier`: The import specifier (e.g., `@/App.vue`, `./utils`, `vue`)
    /// - `importer`: The file containing the import; `None` for entry points
    pub fn resolve(
        &self,
        specifier: &str,
        importer: Option<&Path>,
    ) -> Result<Resolution, ResolveError> {
        let not_found = |aliased_to: Option<PathBuf>| ResolveError::NotFound {
            specifier: specifier.to_string(),
            importer: importer.map(Path::to_path_buf),
            aliased_to,
        };

        if let Some((_, target)) = self.rewrite(specifier) {
            return self
                .resolve_file_or_directory(&target)
                .map(file_resolution)
                .ok_or_else(|| not_found(Some(target)));
        }

        if let Some(rest) = specifier.strip_prefix("node:") {
            if !rest.is_empty() {
                return Ok(Resolution::Builtin {
                    specifier: specifier.to_string(),
                });
            }
        }

        let importer_dir = importer
            .and_then(Path::parent)
            .filter(|dir| dir.components().next().is_some())
            .unwrap_or(self.root);

        if is_relative(specifier) {
            let target = importer_dir.join(specifier);
            return self
                .resolve_file_or_directory(&target)
                .map(file_resolution)
                .ok_or_else(|| not_found(None));
        }

        if let Some(stripped) = specifier.strip_prefix('/') {
            let from_root = self.root.join(stripped);
            return self
                .resolve_file_or_directory(&from_root)
                .or_else(|| self.resolve_file_or_directory(Path::new(specifier)))
                .map(file_resolution)
                .ok_or_else(|| not_found(None));
        }

        match self.resolve_bare(specifier, importer_dir)? {
            Some(path) => Ok(file_resolution(path)),
            None => Err(not_found(None)),
        }
    }

    /// Walk up `node_modules` directories from `from_dir` to the filesystem root.
    ///
    /// The nearest package directory decides: if its entry does not resolve,
    /// the lookup fails instead of falling through to an outer copy.
    fn resolve_bare(
        &self,
        specifier: &str,
        from_dir: &Path,
    ) -> Result<Option<PathBuf>, ResolveError> {
        let (pkg_name, subpath) = parse_bare_specifier(specifier);

        let Some(pkg_dir) = from_dir
            .ancestors()
            .map(|dir| dir.join("node_modules").join(&pkg_name))
            .find(|pkg_dir| pkg_dir.is_dir())
        else {
            return Ok(None);
        };

        let pkg_json = pkg_dir.join("package.json");
        if pkg_json.is_file() {
            return self.resolve_package_entry(&pkg_dir, &pkg_json, subpath.as_deref());
        }
        let target = subpath
            .as_ref()
            .map_or_else(|| pkg_dir.join("index"), |sub| pkg_dir.join(sub));
        Ok(self.resolve_file_or_directory(&target))
    }

    /// Resolve a package entry (or subpath) via its package.json.
    fn resolve_package_entry(
        &self,
        pkg_dir: &Path,
        pkg_json: &Path,
        subpath: Option<&str>,
    ) -> Result<Option<PathBuf>, ResolveError> {
        let invalid = |message: String| ResolveError::PackageJson {
            path: pkg_json.to_path_buf(),
            message,
        };
        let content = std::fs::read_to_string(pkg_json).map_err(|e| invalid(e.to_string()))?;
        let json: serde_json::Value =
            serde_json::from_str(&content).map_err(|e| invalid(e.to_string()))?;

        if let Some(sub) = subpath {
            if let Some(entry) = json
                .get("exports")
                .and_then(|exports| resolve_exports(exports, &format!("./{sub}")))
            {
                if let Some(found) = self.resolve_file_or_directory(&pkg_dir.join(entry)) {
                    return Ok(Some(found));
                }
            }
            return Ok(self.resolve_file_or_directory(&pkg_dir.join(sub)));
        }

        if let Some(entry) = json
            .get("exports")
            .and_then(|exports| resolve_exports(exports, "."))
        {
            if let Some(found) = self.resolve_file_or_directory(&pkg_dir.join(entry)) {
                return Ok(Some(found));
            }
        }

        for field in ["module", "main", "style"] {
            if let Some(entry) = json.get(field).and_then(|v| v.as_str()) {
                if let Some(found) = self.resolve_file_or_directory(&pkg_dir.join(entry)) {
                    return Ok(Some(found));
                }
            }
        }

        Ok(self.resolve_index(pkg_dir))
    }

    /// Exact file, then each extension appended, then directory index files.
    fn resolve_file_or_directory(&self, target: &Path) -> Option<PathBuf> {
        if target.is_file() {
            return Some(canonical(target));
        }

        for ext in self.extensions {
            let mut with_ext = target.as_os_str().to_owned();
            with_ext.push(ext);
            let with_ext = PathBuf::from(with_ext);
            if with_ext.is_file() {
                return Some(canonical(&with_ext));
            }
        }

        if target.is_dir() {
            return self.resolve_index(target);
        }

        None
    }

    fn resolve_index(&self, dir: &Path) -> Option<PathBuf> {
        self.extensions.iter().find_map(|ext| {
            let index = dir.join(format!("index{ext}"));
            index.is_file().then(|| canonical(&index))
        })
    }
}

fn is_relative(specifier: &str) -> bool {
    specifier == "."
        || specifier == ".."
        || specifier.starts_with("./")
        || specifier.starts_with("../")
}

fn canonical(path: &Path) -> PathBuf {
    dunce::canonicalize(path).unwrap_or_else(|_| path.to_path_buf())
}

fn file_resolution(path: PathBuf) -> Resolution {
    let package = package_name(&path);
    Resolution::File { path, package }
}

/// Split a bare specifier into package name and subpath.
fn parse_bare_specifier(specifier: &str) -> (String, Option<String>) {
    let segments = if specifier.starts_with('@') { 2 } else { 1 };
    let mut parts = specifier.splitn(segments + 1, '/');
    let name: Vec<&str> = parts.by_ref().take(segments).collect();
    let subpath = parts.next().filter(|s| !s.is_empty()).map(str::to_string);
    (name.join("/"), subpath)
}

/// Resolve the `exports` field for a subpath (`.` or `./sub`).
fn resolve_exports(exports: &serde_json::Value, subpath: &str) -> Option<String> {
    match exports {
        serde_json::Value::String(s) if subpath == "." => Some(s.clone()),
        serde_json::Value::Object(map) => {
            if let Some(value) = map.get(subpath) {
                return resolve_export_value(value);
            }
            // Conditions at the top level apply to `.` only
            let is_conditional = map.keys().all(|k| !k.starts_with('.'));
            if subpath == "." && is_conditional {
                return resolve_export_value(exports);
            }
            None
        }
        _ => None,
    }
}

/// Export conditions in preference order.
const EXPORT_CONDITIONS: [&str; 3] = ["import", "default", "require"];

/// Resolve a single export target, preferring `import` > `default` > `require`.
fn resolve_export_value(value: &serde_json::Value) -> Option<String> {
    match value {
        serde_json::Value::String(s) => Some(s.clone()),
        serde_json::Value::Object(map) => EXPORT_CONDITIONS
            .iter()
            .find_map(|cond| map.get(*cond).and_then(resolve_export_value)),
        serde_json::Value::Array(items) => items.iter().find_map(resolve_export_value),
        _ => None,
    }
}
