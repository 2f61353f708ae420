//! Config as written by the user, before normalization.
//!
//! Field names follow the bundler's config file (`camelCase`). Keys this layer
//! does not own are ignored.

use super::{
    default_deny, default_extensions, BuildConfig, BundlerConfig, ConfigEnv, FsServeConfig,
    ResolveConfig, ServerConfig,
};
use crate::alias::AliasRule;
use crate::build::{ChunkGroup, ManualChunks};
use crate::error::{Error, Result};
use crate::plugin::{PluginDescriptor, PluginPipeline};
use bundleconf_util::path::{absolutize, normalize};
use indexmap::IndexMap;
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UserConfig {
    pub root: Option<String>,
    pub mode: Option<String>,
    pub plugins: Vec<UserPlugin>,
    pub resolve: UserResolve,
    pub server: UserServer,
    pub build: UserBuild,
}

/// `{ name, package, options }` as produced by the module reader.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserPlugin {
    pub name: String,
    #[serde(default)]
    pub package: Option<String>,
    #[serde(default)]
    pub options: serde_json::Value,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UserResolve {
    pub alias: Option<AliasSpec>,
    pub extensions: Option<Vec<String>>,
}

/// `alias` accepts both of the bundler's forms.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum AliasSpec {
    /// `{ '@': './src' }`, in key order.
    Map(IndexMap<String, String>),
    /// `[{ find: '@', replacement: './src' }]`
    List(Vec<AliasEntry>),
}

#[derive(Debug, Clone, Deserialize)]
pub struct AliasEntry {
    pub find: String,
    pub replacement: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UserServer {
    pub fs: UserFs,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UserFs {
    pub allow: Vec<String>,
    pub deny: Option<Vec<String>>,
    pub strict: Option<bool>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UserBuild {
    pub out_dir: Option<String>,
    pub rollup_options: UserRollupOptions,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UserRollupOptions {
    pub output: UserOutput,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UserOutput {
    pub manual_chunks: IndexMap<String, Vec<String>>,
}

impl UserConfig {
    /// Validate and resolve into the immutable [`BundlerConfig`].
    ///
    /// `config_dir` anchors a relative `root`; every other relative path is
    /// taken from the resolved root. A relative `config_dir` is taken from the
    /// process working directory, so the root is always absolute.
    pub fn normalize(
        self,
        config_dir: &Path,
        config_file: Option<PathBuf>,
        env: &ConfigEnv,
    ) -> Result<BundlerConfig> {
        let config_dir = absolute_dir(config_dir)?;
        let root = match self.root.as_deref() {
            Some("") => return Err(Error::invalid("root", "must not be empty")),
            Some(root) => absolutize(Path::new(root), &config_dir),
            None => config_dir,
        };

        let mode = env
            .mode
            .clone()
            .or(self.mode)
            .unwrap_or_else(|| env.command.default_mode().to_string());

        let plugins = normalize_plugins(self.plugins)?;
        let alias = normalize_aliases(self.resolve.alias, &root)?;
        let extensions = normalize_extensions(self.resolve.extensions)?;
        let fs = normalize_fs(self.server.fs, &root)?;
        let manual_chunks = ManualChunks::from_groups(
            self.build
                .rollup_options
                .output
                .manual_chunks
                .into_iter()
                .map(|(name, packages)| ChunkGroup::new(name, packages))
                .collect(),
        )?;

        let out_dir = match self.build.out_dir.as_deref() {
            Some("") => return Err(Error::invalid("build.outDir", "must not be empty")),
            Some(dir) => absolutize(Path::new(dir), &root),
            None => root.join("dist"),
        };

        Ok(BundlerConfig {
            root,
            config_file,
            command: env.command,
            mode,
            plugins,
            resolve: ResolveConfig { alias, extensions },
            server: ServerConfig { fs },
            build: BuildConfig {
                out_dir,
                manual_chunks,
            },
        })
    }
}

/// `dir` made absolute against the process working directory, then normalized.
pub(super) fn absolute_dir(dir: &Path) -> Result<PathBuf> {
    if dir.is_absolute() {
        Ok(normalize(dir))
    } else {
        Ok(absolutize(dir, &std::env::current_dir()?))
    }
}

fn normalize_plugins(plugins: Vec<UserPlugin>) -> Result<PluginPipeline> {
    let mut descriptors = Vec::with_capacity(plugins.len());
    for (idx, plugin) in plugins.into_iter().enumerate() {
        if plugin.name.trim().is_empty() {
            return Err(Error::invalid(
                format!("plugins[{idx}]"),
                "plugin name must not be empty",
            ));
        }
        descriptors.push(PluginDescriptor::new(plugin.name, plugin.package, plugin.options));
    }
    Ok(PluginPipeline::new(descriptors))
}

fn normalize_aliases(spec: Option<AliasSpec>, root: &Path) -> Result<Vec<AliasRule>> {
    let entries: Vec<(String, String)> = match spec {
        None => Vec::new(),
        Some(AliasSpec::Map(map)) => map.into_iter().collect(),
        Some(AliasSpec::List(list)) => list
            .into_iter()
            .map(|e| (e.find, e.replacement))
            .collect(),
    };

    entries
        .into_iter()
        .map(|(find, replacement)| {
            if find.is_empty() {
                return Err(Error::invalid("resolve.alias", "alias prefix must not be empty"));
            }
            if replacement.trim().is_empty() {
                return Err(Error::invalid(
                    format!("resolve.alias.{find}"),
                    "replacement must not be empty",
                ));
            }
            Ok(AliasRule::new(find, absolutize(Path::new(&replacement), root)))
        })
        .collect()
}

fn normalize_extensions(extensions: Option<Vec<String>>) -> Result<Vec<String>> {
    let Some(extensions) = extensions else {
        return Ok(default_extensions());
    };
    let mut out: Vec<String> = Vec::with_capacity(extensions.len());
    for ext in extensions {
        if !ext.starts_with('.') || ext.len() < 2 {
            return Err(Error::invalid(
                "resolve.extensions",
                format!("'{ext}' must start with '.'"),
            ));
        }
        if !out.contains(&ext) {
            out.push(ext);
        }
    }
    Ok(out)
}

fn normalize_fs(fs: UserFs, root: &Path) -> Result<FsServeConfig> {
    let mut allow: Vec<PathBuf> = vec![root.to_path_buf()];
    for entry in fs.allow {
        let dir = absolutize(Path::new(&entry), root);
        if !allow.contains(&dir) {
            allow.push(dir);
        }
    }

    let deny = fs.deny.unwrap_or_else(default_deny);
    for pattern in &deny {
        glob::Pattern::new(pattern.trim_start_matches("**/")).map_err(|e| {
            Error::invalid("server.fs.deny", format!("invalid pattern '{pattern}': {e}"))
        })?;
    }

    Ok(FsServeConfig {
        strict: fs.strict.unwrap_or(true),
        allow,
        deny,
    })
}
