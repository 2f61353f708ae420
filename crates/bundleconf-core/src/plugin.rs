//! Plugin descriptors and the ordered plugin pipeline.
//!
//! Plugins themselves are opaque to this crate (loading and running them is
//! the bundler engine's job). What the config owns is the *list*: which
//! plugins are declared, in what order, for which command, and what each is
//! known to do.
//!
//! Ordering follows the bundler's `enforce` rule: `Pre` → `Normal` → `Post`,
//! with declaration order preserved inside each class.

use crate::config::Command;
use serde::{Deserialize, Serialize};

/// Plugin enforcement ordering.
///
/// Controls where a plugin runs relative to others in the pipeline.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum PluginEnforce {
    /// Runs before normal plugins (e.g., alias resolution, devtools instrumentation).
    Pre,
    /// Default ordering (no enforcement).
    #[default]
    Normal,
    /// Runs after normal plugins (e.g., minification).
    Post,
}

/// Which command a plugin is active for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PluginApply {
    /// Active for both the dev server and production builds.
    #[default]
    Both,
    Serve,
    Build,
}

impl PluginApply {
    #[must_use]
    pub fn applies_to(self, command: Command) -> bool {
        match self {
            Self::Both => true,
            Self::Serve => command == Command::Serve,
            Self::Build => command == Command::Build,
        }
    }
}

/// What a plugin contributes to the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Capability {
    /// Compiles or rewrites module source (`transform` hook).
    Transform,
    /// Participates in hot module replacement.
    HotUpdate,
    /// Registers dev-server middleware.
    ServerMiddleware,
    /// Bridges to browser developer tools.
    DevTools,
    /// Takes part in module resolution (`resolveId` hook).
    Resolve,
}

/// A declared plugin.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PluginDescriptor {
    /// Name as written in the config (the factory's local binding, e.g. `vue`).
    pub name: String,
    /// Package the factory was imported from, when known.
    pub package: Option<String>,
    /// First argument passed to the factory, if it was an object.
    pub options: serde_json::Value,
    pub enforce: PluginEnforce,
    pub apply: PluginApply,
    /// Sorted, de-duplicated.
    pub capabilities: Vec<Capability>,
}

impl PluginDescriptor {
    /// Build a descriptor, tagging it from the known-plugin table and letting
    /// `options.enforce` / `options.apply` override the defaults.
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        package: Option<String>,
        options: serde_json::Value,
    ) -> Self {
        let name = name.into();
        let known = package.as_deref().and_then(known_plugin);

        let (mut enforce, mut apply, mut capabilities) = known.map_or_else(
            || (PluginEnforce::Normal, PluginApply::Both, vec![Capability::Transform]),
            |k| (k.enforce, k.apply, k.capabilities.to_vec()),
        );

        if let Some(value) = options.get("enforce") {
            if let Ok(parsed) = serde_json::from_value::<PluginEnforce>(value.clone()) {
                enforce = parsed;
            }
        }
        if let Some(value) = options.get("apply") {
            if let Ok(parsed) = serde_json::from_value::<PluginApply>(value.clone()) {
                apply = parsed;
            }
        }

        capabilities.sort();
        capabilities.dedup();

        Self {
            name,
            package,
            options,
            enforce,
            apply,
            capabilities,
        }
    }

    #[must_use]
    pub fn has_capability(&self, capability: Capability) -> bool {
        self.capabilities.contains(&capability)
    }
}

struct KnownPlugin {
    enforce: PluginEnforce,
    apply: PluginApply,
    capabilities: &'static [Capability],
}

/// Defaults for plugins whose behavior is documented by their packages.
fn known_plugin(package: &str) -> Option<KnownPlugin> {
    match package {
        "@vitejs/plugin-vue" | "@vitejs/plugin-vue-jsx" | "@vitejs/plugin-react" => {
            Some(KnownPlugin {
                enforce: PluginEnforce::Normal,
                apply: PluginApply::Both,
                capabilities: &[Capability::Transform, Capability::HotUpdate],
            })
        }
        "vite-plugin-vue-devtools" => Some(KnownPlugin {
            enforce: PluginEnforce::Pre,
            apply: PluginApply::Serve,
            capabilities: &[
                Capability::DevTools,
                Capability::ServerMiddleware,
                Capability::Transform,
            ],
        }),
        "vite-tsconfig-paths" => Some(KnownPlugin {
            enforce: PluginEnforce::Pre,
            apply: PluginApply::Both,
            capabilities: &[Capability::Resolve],
        }),
        _ => None,
    }
}

/// The declared plugins, in declaration order.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct PluginPipeline {
    plugins: Vec<PluginDescriptor>,
}

impl PluginPipeline {
    #[must_use]
    pub fn new(plugins: Vec<PluginDescriptor>) -> Self {
        Self { plugins }
    }

    /// All declared plugins in declaration order.
    #[must_use]
    pub fn declared(&self) -> &[PluginDescriptor] {
        &self.plugins
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.plugins.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.plugins.is_empty()
    }

    /// Plugins active for `command`, in activation order.
    ///
    /// Stable sort by `enforce`, so declaration order survives within a class.
    #[must_use]
    pub fn active(&self, command: Command) -> Vec<&PluginDescriptor> {
        let mut active: Vec<&PluginDescriptor> = self
            .plugins
            .iter()
            .filter(|p| p.apply.applies_to(command))
            .collect();
        active.sort_by_key(|p| p.enforce);
        active
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn vue() -> PluginDescriptor {
        PluginDescriptor::new("vue", Some("@vitejs/plugin-vue".into()), serde_json::Value::Null)
    }

    fn devtools() -> PluginDescriptor {
        PluginDescriptor::new(
            "vueDevTools",
            Some("vite-plugin-vue-devtools".into()),
            serde_json::Value::Null,
        )
    }

    #[test]
    fn test_known_plugins_are_tagged() {
        let vue = vue();
        assert!(vue.has_capability(Capability::Transform));
        assert!(vue.has_capability(Capability::HotUpdate));
        assert_eq!(vue.apply, PluginApply::Both);

        let devtools = devtools();
        assert!(devtools.has_capability(Capability::DevTools));
        assert_eq!(devtools.apply, PluginApply::Serve);
        assert_eq!(devtools.enforce, PluginEnforce::Pre);
    }

    #[test]
    fn test_unknown_plugin_defaults() {
        let p = PluginDescriptor::new("custom", None, serde_json::Value::Null);
        assert_eq!(p.capabilities, vec![Capability::Transform]);
        assert_eq!(p.enforce, PluginEnforce::Normal);
        assert_eq!(p.apply, PluginApply::Both);
    }

    #[test]
    fn test_options_override_enforce_and_apply() {
        let p = PluginDescriptor::new(
            "custom",
            None,
            json!({ "enforce": "post", "apply": "build" }),
        );
        assert_eq!(p.enforce, PluginEnforce::Post);
        assert_eq!(p.apply, PluginApply::Build);
    }

    #[test]
    fn test_active_pipeline_per_command() {
        let pipeline = PluginPipeline::new(vec![vue(), devtools()]);

        let serve: Vec<_> = pipeline
            .active(Command::Serve)
            .iter()
            .map(|p| p.name.as_str())
            .collect();
        // devtools is `pre`, so it runs first in dev even though declared second
        assert_eq!(serve, vec!["vueDevTools", "vue"]);

        let build: Vec<_> = pipeline
            .active(Command::Build)
            .iter()
            .map(|p| p.name.as_str())
            .collect();
        assert_eq!(build, vec!["vue"]);

        // Declaration order is untouched
        assert_eq!(pipeline.declared()[0].name, "vue");
    }

    #[test]
    fn test_stable_order_within_enforce_class() {
        let pipeline = PluginPipeline::new(vec![
            PluginDescriptor::new("a", None, serde_json::Value::Null),
            PluginDescriptor::new("b", None, json!({ "enforce": "post" })),
            PluginDescriptor::new("c", None, serde_json::Value::Null),
            PluginDescriptor::new("d", None, json!({ "enforce": "pre" })),
        ]);
        let names: Vec<_> = pipeline
            .active(Command::Build)
            .iter()
            .map(|p| p.name.as_str())
            .collect();
        assert_eq!(names, vec!["d", "a", "c", "b"]);
    }
}
