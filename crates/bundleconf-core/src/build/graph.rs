//! Module dependency graph.
//!
//! The graph is produced by the bundler engine; this crate only consumes it
//! to decide chunk membership. A JSON description is accepted so a build can
//! be planned without running the engine.

use bundleconf_util::path::package_name;
use rustc_hash::FxHashMap as HashMap;
use serde::Deserialize;
use std::path::Path;
use thiserror::Error;

/// Unique identifier for a module in the graph.
pub type ModuleId = usize;

/// A module in the dependency graph.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Module {
    /// Absolute path (or engine ID) of the module.
    pub path: String,
    /// npm package owning the module, derived from its `node_modules` segment.
    pub package: Option<String>,
    /// Module IDs this module depends on (static imports).
    pub dependencies: Vec<ModuleId>,
    /// Module IDs this module dynamically imports (code split points).
    pub dynamic_dependencies: Vec<ModuleId>,
}

impl Module {
    /// A module with no edges yet; the owning package is derived from `path`.
    pub fn new(path: impl Into<String>) -> Self {
        let path = path.into();
        let package = package_name(Path::new(&path));
        Self {
            path,
            package,
            dependencies: Vec::new(),
            dynamic_dependencies: Vec::new(),
        }
    }
}

/// Errors in a graph description.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum GraphError {
    #[error("Module '{0}' is listed more than once")]
    DuplicateModule(String),

    #[error("Module '{from}' imports '{path}', which is not in the graph")]
    UnknownModule { from: String, path: String },

    #[error("Entry module '{0}' is not in the graph")]
    MissingEntry(String),
}

/// The module dependency graph.
#[derive(Debug, Default)]
pub struct ModuleGraph {
    /// All modules, indexed by ID.
    modules: Vec<Module>,
    /// Path to ID mapping for deduplication.
    path_to_id: HashMap<String, ModuleId>,
}

impl ModuleGraph {
    /// Create a new empty graph.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a module to the graph, returning its ID.
    pub fn add(&mut self, module: Module) -> ModuleId {
        let id = self.modules.len();
        self.path_to_id.insert(module.path.clone(), id);
        self.modules.push(module);
        id
    }

    /// Get a module by ID.
    #[must_use]
    pub fn get(&self, id: ModuleId) -> Option<&Module> {
        self.modules.get(id)
    }

    /// Get module ID by path.
    #[must_use]
    pub fn id_by_path(&self, path: &str) -> Option<ModuleId> {
        self.path_to_id.get(path).copied()
    }

    /// Number of modules in the graph.
    #[must_use]
    pub fn len(&self) -> usize {
        self.modules.len()
    }

    /// Check if graph is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }

    /// Iterate over all modules with their IDs, in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (ModuleId, &Module)> {
        self.modules.iter().enumerate()
    }

    /// Build a graph from its JSON description, returning it with the entry ID.
    pub fn from_description(desc: &GraphDescription) -> Result<(Self, ModuleId), GraphError> {
        let mut graph = Self::new();
        for module in &desc.modules {
            if graph.id_by_path(&module.path).is_some() {
                return Err(GraphError::DuplicateModule(module.path.clone()));
            }
            graph.add(Module::new(module.path.clone()));
        }

        for (id, module) in desc.modules.iter().enumerate() {
            let lookup = |path: &String| {
                graph
                    .id_by_path(path)
                    .ok_or_else(|| GraphError::UnknownModule {
                        from: module.path.clone(),
                        path: path.clone(),
                    })
            };
            let dependencies = module.imports.iter().map(lookup).collect::<Result<Vec<_>, _>>()?;
            let dynamic = module
                .dynamic_imports
                .iter()
                .map(lookup)
                .collect::<Result<Vec<_>, _>>()?;

            let node = &mut graph.modules[id];
            node.dependencies = dependencies;
            node.dynamic_dependencies = dynamic;
        }

        let entry = graph
            .id_by_path(&desc.entry)
            .ok_or_else(|| GraphError::MissingEntry(desc.entry.clone()))?;
        Ok((graph, entry))
    }
}

/// JSON description of a module graph.
///
/// ```json
/// {
///   "entry": "/app/src/main.ts",
///   "modules": [
///     { "path": "/app/src/main.ts", "imports": ["/app/node_modules/vue/index.mjs"] },
///     { "path": "/app/node_modules/vue/index.mjs" }
///   ]
/// }
/// ```
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphDescription {
    pub entry: String,
    pub modules: Vec<ModuleDescription>,
}

/// One module in a [`GraphDescription`].
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModuleDescription {
    pub path: String,
    #[serde(default)]
    pub imports: Vec<String>,
    #[serde(default)]
    pub dynamic_imports: Vec<String>,
}
