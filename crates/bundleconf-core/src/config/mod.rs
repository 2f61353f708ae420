//! Bundler configuration: discovery, loading, validation.
//!
//! The configuration is read once per process and never mutated. Everything
//! downstream (resolver, file-server guard, chunk planner) borrows the
//! [`BundlerConfig`] produced here.
//!
//! ## Discovery
//!
//! In the project root, the first existing file wins:
//! `bundleconf.config.json`, `vite.config.js`, `vite.config.mjs`,
//! `vite.config.ts`. No file means the default configuration.

pub mod js;
mod user;

pub use user::{AliasEntry, AliasSpec, UserConfig, UserPlugin};

use crate::alias::AliasRule;
use crate::build::ManualChunks;
use crate::error::{Error, Result};
use crate::plugin::PluginPipeline;
use bundleconf_util::fs::read_source;
use bundleconf_util::hash::blake3_bytes;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Config file names, in discovery order.
pub const CONFIG_FILES: &[&str] = &[
    "bundleconf.config.json",
    "vite.config.js",
    "vite.config.mjs",
    "vite.config.ts",
];

/// Extensions probed when an import omits one.
pub const DEFAULT_EXTENSIONS: &[&str] = &[".mjs", ".js", ".mts", ".ts", ".jsx", ".tsx", ".json"];

/// Files the dev server never serves.
pub const DEFAULT_DENY: &[&str] = &[".env", ".env.*", "*.crt", "*.pem", ".git"];

#[must_use]
pub fn default_extensions() -> Vec<String> {
    DEFAULT_EXTENSIONS.iter().map(|s| (*s).to_string()).collect()
}

#[must_use]
pub fn default_deny() -> Vec<String> {
    DEFAULT_DENY.iter().map(|s| (*s).to_string()).collect()
}

/// Which bundler command the config is loaded for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Command {
    /// Development server.
    #[default]
    Serve,
    /// Production build.
    Build,
}

impl Command {
    #[must_use]
    pub fn default_mode(self) -> &'static str {
        match self {
            Self::Serve => "development",
            Self::Build => "production",
        }
    }
}

/// Invocation context the config is resolved against.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigEnv {
    pub command: Command,
    /// Overrides the config file's `mode`.
    pub mode: Option<String>,
}

impl ConfigEnv {
    #[must_use]
    pub fn new(command: Command) -> Self {
        Self { command, mode: None }
    }

    #[must_use]
    pub fn with_mode(mut self, mode: Option<String>) -> Self {
        self.mode = mode;
        self
    }
}

/// Normalized, validated configuration.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BundlerConfig {
    /// Absolute project root.
    pub root: PathBuf,
    /// File the config was read from, if any.
    pub config_file: Option<PathBuf>,
    pub command: Command,
    pub mode: String,
    pub plugins: PluginPipeline,
    pub resolve: ResolveConfig,
    pub server: ServerConfig,
    pub build: BuildConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolveConfig {
    /// Alias rules in declaration order; the first match wins.
    pub alias: Vec<AliasRule>,
    pub extensions: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerConfig {
    pub fs: FsServeConfig,
}

/// `server.fs` after normalization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FsServeConfig {
    /// Refuse paths outside every allowed root.
    pub strict: bool,
    /// Absolute, normalized, de-duplicated. The project root comes first.
    pub allow: Vec<PathBuf>,
    /// Glob patterns matched against path components.
    pub deny: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildConfig {
    pub out_dir: PathBuf,
    pub manual_chunks: ManualChunks,
}

impl BundlerConfig {
    /// Default configuration for a project without a config file.
    pub fn defaults(root: &Path, env: &ConfigEnv) -> Result<Self> {
        UserConfig::default().normalize(root, None, env)
    }

    /// BLAKE3 digest of the canonical JSON form.
    ///
    /// Two loads of the same file produce the same fingerprint.
    pub fn fingerprint(&self) -> Result<String> {
        let bytes = serde_json::to_vec(self)
            .map_err(|e| Error::other(format!("serialize config: {e}")))?;
        Ok(blake3_bytes(&bytes))
    }
}

/// Find the config file in `root`, following [`CONFIG_FILES`] order.
#[must_use]
pub fn find_config_file(root: &Path) -> Option<PathBuf> {
    CONFIG_FILES
        .iter()
        .map(|name| root.join(name))
        .find(|path| path.is_file())
}

/// Load the configuration for `root`.
///
/// An explicit `config_path` (relative to `root`) must exist; otherwise the
/// file is discovered, and the defaults apply when there is none.
pub fn load_config(
    root: &Path,
    config_path: Option<&Path>,
    env: &ConfigEnv,
) -> Result<BundlerConfig> {
    // `import.meta.url` and the guard's allow list need absolute paths
    let absolute_root = user::absolute_dir(root)?;
    let root = absolute_root.as_path();
    let file = match config_path {
        Some(path) => {
            let path = root.join(path);
            if !path.is_file() {
                return Err(Error::ConfigNotFound { path });
            }
            Some(path)
        }
        None => find_config_file(root),
    };

    let Some(file) = file else {
        return BundlerConfig::defaults(root, env);
    };

    let user = read_user_config(&file)?;
    let config_dir = file.parent().unwrap_or(root);
    user.normalize(config_dir, Some(file.clone()), env)
}

/// Parse a config file into its unvalidated form.
pub fn read_user_config(file: &Path) -> Result<UserConfig> {
    let source = read_source(file).map_err(|source| Error::ConfigRead {
        path: file.to_path_buf(),
        source,
    })?;
    let parse_error = |message: String| Error::ConfigParse {
        path: file.to_path_buf(),
        message,
    };

    let value = if file.extension().is_some_and(|ext| ext == "json") {
        serde_json::from_str(&source).map_err(|e| parse_error(e.to_string()))?
    } else {
        js::evaluate_config_module(&source, file).map_err(parse_error)?
    };

    serde_json::from_value(value).map_err(|e| parse_error(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plugin::Capability;
    use tempfile::tempdir;

    const VITE_CONFIG: &str = r"
import { fileURLToPath, URL } from 'node:url'

import { defineConfig } from 'vite'
import vue from '@vitejs/plugin-vue'
import vueDevTools from 'vite-plugin-vue-devtools'

// https://vite.dev/config/
export default defineConfig({
  plugins: [
    vue(),
    vueDevTools(),
  ],
  resolve: {
    alias: {
      '@': fileURLToPath(new URL('./src', import.meta.url))
    },
  },
  server: {
    fs: {
      allow: ['..', 'node_modules']
    }
  },
  build: {
    rollupOptions: {
      output: {
        manualChunks: {
          'material-icons': ['@mdi/font']
        }
      }
    }
  }
})
";

    fn project() -> (tempfile::TempDir, PathBuf) {
        let dir = tempdir().unwrap();
        let root = dunce::canonicalize(dir.path()).unwrap().join("app");
        std::fs::create_dir_all(&root).unwrap();
        (dir, root)
    }

    #[test]
    fn test_load_vite_config() {
        let (_dir, root) = project();
        std::fs::write(root.join("vite.config.js"), VITE_CONFIG).unwrap();

        let config = load_config(&root, None, &ConfigEnv::new(Command::Serve)).unwrap();

        assert_eq!(config.root, root);
        assert_eq!(config.config_file, Some(root.join("vite.config.js")));
        assert_eq!(config.mode, "development");
        assert_eq!(config.resolve.alias, vec![AliasRule::new("@", root.join("src"))]);
        assert_eq!(
            config.server.fs.allow,
            vec![
                root.clone(),
                root.parent().unwrap().to_path_buf(),
                root.join("node_modules")
            ]
        );
        assert!(config.server.fs.strict);
        assert_eq!(
            config.build.manual_chunks.chunk_for_package("@mdi/font"),
            Some("material-icons")
        );

        let names: Vec<_> = config.plugins.declared().iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["vue", "vueDevTools"]);
        assert!(config.plugins.declared()[1].has_capability(Capability::DevTools));
    }

    #[test]
    fn test_load_json_config_with_alias_list() {
        let (_dir, root) = project();
        std::fs::write(
            root.join("bundleconf.config.json"),
            r#"{
                "resolve": {
                    "alias": [
                        { "find": "@components", "replacement": "src/components" },
                        { "find": "@", "replacement": "src" }
                    ],
                    "extensions": [".ts", ".vue"]
                },
                "server": { "fs": { "strict": false, "deny": [".env"] } },
                "build": { "outDir": "out" },
                "optimizeDeps": { "include": ["vue"] }
            }"#,
        )
        .unwrap();

        let config = load_config(&root, None, &ConfigEnv::new(Command::Build)).unwrap();
        assert_eq!(config.mode, "production");
        assert_eq!(config.resolve.alias[0].find, "@components");
        assert_eq!(config.resolve.alias[1].replacement, root.join("src"));
        assert_eq!(config.resolve.extensions, vec![".ts", ".vue"]);
        assert!(!config.server.fs.strict);
        assert_eq!(config.server.fs.deny, vec![".env"]);
        assert_eq!(config.server.fs.allow, vec![root.clone()]);
        assert_eq!(config.build.out_dir, root.join("out"));
    }

    #[test]
    fn test_no_config_file_uses_defaults() {
        let (_dir, root) = project();
        let config = load_config(&root, None, &ConfigEnv::new(Command::Serve)).unwrap();

        assert!(config.config_file.is_none());
        assert!(config.plugins.is_empty());
        assert!(config.resolve.alias.is_empty());
        assert_eq!(config.resolve.extensions, default_extensions());
        assert_eq!(config.server.fs.deny, default_deny());
        assert!(config.build.manual_chunks.is_empty());
        assert_eq!(config.build.out_dir, root.join("dist"));
    }

    #[test]
    fn test_explicit_missing_config() {
        let (_dir, root) = project();
        let err = load_config(&root, Some(Path::new("nope.config.js")), &ConfigEnv::default())
            .unwrap_err();
        assert!(matches!(err, Error::ConfigNotFound { .. }));
    }

    #[test]
    fn test_discovery_order() {
        let (_dir, root) = project();
        std::fs::write(root.join("vite.config.ts"), "export default {}").unwrap();
        std::fs::write(root.join("bundleconf.config.json"), "{}").unwrap();
        assert_eq!(find_config_file(&root), Some(root.join("bundleconf.config.json")));
    }

    #[test]
    fn test_mode_override() {
        let (_dir, root) = project();
        std::fs::write(root.join("bundleconf.config.json"), r#"{ "mode": "staging" }"#).unwrap();

        let from_file = load_config(&root, None, &ConfigEnv::new(Command::Build)).unwrap();
        assert_eq!(from_file.mode, "staging");

        let env = ConfigEnv::new(Command::Build).with_mode(Some("test".to_string()));
        let from_cli = load_config(&root, None, &env).unwrap();
        assert_eq!(from_cli.mode, "test");
    }

    #[test]
    fn test_chunk_conflict_rejected_at_load() {
        let (_dir, root) = project();
        std::fs::write(
            root.join("bundleconf.config.json"),
            r#"{ "build": { "rollupOptions": { "output": { "manualChunks": {
                "icons": ["@mdi/font"],
                "vendor": ["vue", "@mdi/font"]
            } } } } }"#,
        )
        .unwrap();

        let err = load_config(&root, None, &ConfigEnv::default()).unwrap_err();
        assert_eq!(err.code(), "CHUNK_ASSIGNMENT_CONFLICT");
    }

    #[test]
    fn test_invalid_options_fail_fast() {
        let (_dir, root) = project();
        let cases = [
            r#"{ "resolve": { "alias": { "": "src" } } }"#,
            r#"{ "resolve": { "alias": { "@": "" } } }"#,
            r#"{ "resolve": { "extensions": ["ts"] } }"#,
            r#"{ "server": { "fs": { "deny": ["["] } } }"#,
            r#"{ "plugins": [{ "name": "" }] }"#,
        ];
        for case in cases {
            std::fs::write(root.join("bundleconf.config.json"), case).unwrap();
            let err = load_config(&root, None, &ConfigEnv::default()).unwrap_err();
            assert_eq!(err.code(), "CONFIG_INVALID", "{case}");
        }
    }

    #[test]
    fn test_parse_errors() {
        let (_dir, root) = project();
        std::fs::write(root.join("bundleconf.config.json"), "{ not json").unwrap();
        let err = load_config(&root, None, &ConfigEnv::default()).unwrap_err();
        assert!(matches!(err, Error::ConfigParse { .. }));

        std::fs::remove_file(root.join("bundleconf.config.json")).unwrap();
        std::fs::write(root.join("vite.config.js"), "module.exports = {}").unwrap();
        let err = load_config(&root, None, &ConfigEnv::default()).unwrap_err();
        assert!(matches!(err, Error::ConfigParse { .. }));
    }

    #[test]
    fn test_vite_config_with_define_block_loads() {
        let (_dir, root) = project();
        std::fs::write(
            root.join("vite.config.js"),
            "export default { define: { __APP_VERSION__: JSON.stringify('1.0') }, \
             resolve: { alias: { '@': './src' } } }",
        )
        .unwrap();

        let config = load_config(&root, None, &ConfigEnv::default()).unwrap();
        assert_eq!(config.resolve.alias, vec![AliasRule::new("@", root.join("src"))]);
    }

    #[test]
    fn test_package_style_alias_is_root_relative() {
        let (_dir, root) = project();
        std::fs::write(
            root.join("bundleconf.config.json"),
            r#"{ "resolve": { "alias": { "vue": "vue/dist/vue.esm-bundler.js" } } }"#,
        )
        .unwrap();

        let config = load_config(&root, None, &ConfigEnv::default()).unwrap();
        assert_eq!(
            config.resolve.alias[0].replacement,
            root.join("vue/dist/vue.esm-bundler.js")
        );
    }

    #[test]
    fn test_relative_root_is_made_absolute() {
        let cwd = std::env::current_dir().unwrap();
        let config = load_config(Path::new("."), None, &ConfigEnv::default()).unwrap();

        assert!(config.root.is_absolute());
        assert_eq!(config.root, bundleconf_util::path::normalize(&cwd));
        assert_eq!(config.server.fs.allow[0], config.root);
        assert_eq!(config.build.out_dir, config.root.join("dist"));
    }

    #[test]
    fn test_loading_twice_is_identical() {
        let (_dir, root) = project();
        std::fs::write(root.join("vite.config.js"), VITE_CONFIG).unwrap();
        let env = ConfigEnv::new(Command::Build);

        let first = load_config(&root, None, &env).unwrap();
        let second = load_config(&root, None, &env).unwrap();
        assert_eq!(first, second);
        assert_eq!(first.fingerprint().unwrap(), second.fingerprint().unwrap());

        let serve = load_config(&root, None, &ConfigEnv::new(Command::Serve)).unwrap();
        assert_ne!(first.fingerprint().unwrap(), serve.fingerprint().unwrap());
    }
}
