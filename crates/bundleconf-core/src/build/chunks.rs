//! Production chunk assignment.
//!
//! Two passes over the module graph:
//!
//! 1. **Manual chunks**: every module owned by a package in a [`ChunkGroup`]
//!    goes to that group's chunk. Each manual chunk then absorbs the static
//!    dependencies of its members that no other manual chunk has claimed.
//! 2. **Default splitting**: an entry chunk (`main`) plus one chunk per
//!    dynamic-import target, following static dependencies. Modules already
//!    placed are skipped, so a module never lands in two chunks.
//!
//! [`ChunkGroup`]: super::ChunkGroup

use super::graph::{ModuleGraph, ModuleId};
use super::manual_chunks::ManualChunks;
use rustc_hash::{FxHashMap as HashMap, FxHashSet as HashSet};
use serde::Serialize;
use std::collections::BTreeSet;

/// A chunk is a group of modules that are emitted into one output file.
#[derive(Debug, Clone)]
pub struct Chunk {
    /// Unique chunk ID.
    pub id: ChunkId,
    /// Output name (file stem).
    pub name: String,
    /// Modules in this chunk, in assignment order.
    pub modules: Vec<ModuleId>,
    /// Module the chunk was split at. `None` for manual chunks.
    pub entry: Option<ModuleId>,
    /// Whether this is the main entry chunk.
    pub is_entry: bool,
    /// Whether this chunk comes from a chunk group.
    pub is_manual: bool,
    /// Chunks that this chunk depends on (must be loaded first), sorted.
    pub dependencies: Vec<ChunkId>,
}

/// Unique identifier for a chunk.
pub type ChunkId = usize;

/// Result of chunk assignment.
#[derive(Debug)]
pub struct ChunkGraph {
    /// All chunks.
    chunks: Vec<Chunk>,
    /// Module to chunk mapping.
    module_to_chunk: HashMap<ModuleId, ChunkId>,
}

impl ChunkGraph {
    /// Partition the module graph into chunks.
    pub fn from_module_graph(
        graph: &ModuleGraph,
        entry_id: ModuleId,
        manual: &ManualChunks,
    ) -> Self {
        let mut chunk_graph = ChunkGraph {
            chunks: Vec::new(),
            module_to_chunk: HashMap::default(),
        };

        chunk_graph.assign_manual_chunks(graph, entry_id, manual);

        let split_points = find_split_points(graph, &chunk_graph.module_to_chunk);
        chunk_graph.create_default_chunks(graph, entry_id, &split_points);

        chunk_graph.link_chunks(graph);

        chunk_graph
    }

    /// Pin group members, then let each manual chunk absorb unclaimed static dependencies.
    fn assign_manual_chunks(
        &mut self,
        graph: &ModuleGraph,
        entry_id: ModuleId,
        manual: &ManualChunks,
    ) {
        if manual.is_empty() {
            return;
        }

        let mut members: Vec<Vec<ModuleId>> = vec![Vec::new(); manual.groups().len()];
        for (id, module) in graph.iter() {
            if let Some(group) = module.package.as_deref().and_then(|p| manual.group_index(p)) {
                members[group].push(id);
            }
        }

        let mut manual_chunk_ids = Vec::new();
        for (group, modules) in manual.groups().iter().zip(members) {
            if modules.is_empty() {
                continue;
            }
            let chunk_id = self.create_chunk(group.name.clone(), None, false, true);
            for module_id in modules {
                self.place(module_id, chunk_id);
            }
            manual_chunk_ids.push(chunk_id);
        }

        for chunk_id in manual_chunk_ids {
            let mut stack: Vec<ModuleId> = self.chunks[chunk_id].modules.clone();
            let mut visited: HashSet<ModuleId> = stack.iter().copied().collect();

            while let Some(module_id) = stack.pop() {
                let Some(module) = graph.get(module_id) else {
                    continue;
                };
                for &dep_id in &module.dependencies {
                    if dep_id == entry_id || !visited.insert(dep_id) {
                        continue;
                    }
                    if self.module_to_chunk.contains_key(&dep_id) {
                        continue;
                    }
                    self.place(dep_id, chunk_id);
                    stack.push(dep_id);
                }
            }
        }
    }

    /// Create the entry chunk and one chunk per split point.
    fn create_default_chunks(
        &mut self,
        graph: &ModuleGraph,
        entry_id: ModuleId,
        split_points: &BTreeSet<ModuleId>,
    ) {
        let mut used_names: HashSet<String> =
            self.chunks.iter().map(|c| c.name.clone()).collect();

        let main_name = unique_name("main", &mut used_names);
        let main_chunk_id = self.create_chunk(main_name, Some(entry_id), true, false);
        self.assign_modules_to_chunk(graph, entry_id, main_chunk_id, split_points);

        for &split_id in split_points {
            if split_id == entry_id {
                continue;
            }
            if let Some(module) = graph.get(split_id) {
                let chunk_name =
                    unique_name(&generate_chunk_name(&module.path), &mut used_names);
                let chunk_id = self.create_chunk(chunk_name, Some(split_id), false, false);
                self.assign_modules_to_chunk(graph, split_id, chunk_id, split_points);

                self.chunks[main_chunk_id].dependencies.push(chunk_id);
            }
        }
    }

    /// Create a new chunk.
    fn create_chunk(
        &mut self,
        name: String,
        entry: Option<ModuleId>,
        is_entry: bool,
        is_manual: bool,
    ) -> ChunkId {
        let id = self.chunks.len();
        self.chunks.push(Chunk {
            id,
            name,
            modules: Vec::new(),
            entry,
            is_entry,
            is_manual,
            dependencies: Vec::new(),
        });
        id
    }

    fn place(&mut self, module_id: ModuleId, chunk_id: ChunkId) {
        self.module_to_chunk.insert(module_id, chunk_id);
        self.chunks[chunk_id].modules.push(module_id);
    }

    /// Assign modules to a chunk by following static dependencies.
    ///
    /// Stops at other split points and at modules another chunk already owns.
    fn assign_modules_to_chunk(
        &mut self,
        graph: &ModuleGraph,
        start: ModuleId,
        chunk_id: ChunkId,
        split_points: &BTreeSet<ModuleId>,
    ) {
        let mut visited = HashSet::default();
        let mut stack = vec![start];

        while let Some(module_id) = stack.pop() {
            if !visited.insert(module_id) {
                continue;
            }

            if module_id != start && split_points.contains(&module_id) {
                continue;
            }
            if self.module_to_chunk.contains_key(&module_id) {
                continue;
            }

            self.place(module_id, chunk_id);

            if let Some(module) = graph.get(module_id) {
                // Reverse so the first import is visited first.
                for &dep_id in module.dependencies.iter().rev() {
                    if !visited.contains(&dep_id) {
                        stack.push(dep_id);
                    }
                }
            }
        }
    }

    /// Record static cross-chunk edges as chunk dependencies.
    fn link_chunks(&mut self, graph: &ModuleGraph) {
        for chunk_id in 0..self.chunks.len() {
            let mut deps: BTreeSet<ChunkId> =
                self.chunks[chunk_id].dependencies.iter().copied().collect();
            for &module_id in &self.chunks[chunk_id].modules {
                let Some(module) = graph.get(module_id) else {
                    continue;
                };
                for dep_id in &module.dependencies {
                    if let Some(&other) = self.module_to_chunk.get(dep_id) {
                        if other != chunk_id {
                            deps.insert(other);
                        }
                    }
                }
            }
            self.chunks[chunk_id].dependencies = deps.into_iter().collect();
        }
    }

    /// Get all chunks.
    pub fn chunks(&self) -> &[Chunk] {
        &self.chunks
    }

    /// Get the main entry chunk.
    pub fn main_chunk(&self) -> Option<&Chunk> {
        self.chunks.iter().find(|c| c.is_entry)
    }

    /// Get a chunk by name.
    pub fn chunk_named(&self, name: &str) -> Option<&Chunk> {
        self.chunks.iter().find(|c| c.name == name)
    }

    /// Get async chunks (dynamic-import split points).
    pub fn async_chunks(&self) -> Vec<&Chunk> {
        self.chunks
            .iter()
            .filter(|c| !c.is_entry && !c.is_manual)
            .collect()
    }

    /// Get chunks produced by chunk groups.
    pub fn manual_chunks(&self) -> Vec<&Chunk> {
        self.chunks.iter().filter(|c| c.is_manual).collect()
    }

    /// Get the chunk containing a module.
    pub fn chunk_for_module(&self, module_id: ModuleId) -> Option<ChunkId> {
        self.module_to_chunk.get(&module_id).copied()
    }

    /// Check if the output has more than one chunk.
    pub fn has_splits(&self) -> bool {
        self.chunks.len() > 1
    }

    /// Generate a manifest for the chunk graph.
    pub fn generate_manifest(&self, graph: &ModuleGraph) -> ChunkManifest {
        ChunkManifest {
            schema_version: crate::version::SCHEMA_VERSION,
            chunks: self
                .chunks
                .iter()
                .map(|chunk| ChunkInfo {
                    id: chunk.id,
                    name: chunk.name.clone(),
                    file: format!("{}.js", chunk.name),
                    is_entry: chunk.is_entry,
                    is_manual: chunk.is_manual,
                    modules: chunk
                        .modules
                        .iter()
                        .filter_map(|&id| graph.get(id).map(|m| m.path.clone()))
                        .collect(),
                    dependencies: chunk.dependencies.clone(),
                })
                .collect(),
        }
    }
}

/// Find split points (dynamic import targets) not already claimed by a manual chunk.
///
/// Ordered so chunk IDs are stable across runs.
fn find_split_points(
    graph: &ModuleGraph,
    assigned: &HashMap<ModuleId, ChunkId>,
) -> BTreeSet<ModuleId> {
    graph
        .iter()
        .flat_map(|(_, module)| module.dynamic_dependencies.iter().copied())
        .filter(|id| !assigned.contains_key(id))
        .collect()
}

/// Generate a chunk name from a file path.
fn generate_chunk_name(path: &str) -> String {
    std::path::Path::new(path)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("chunk")
        .to_string()
}

/// `base`, or `base-2`, `base-3`, … if taken.
fn unique_name(base: &str, used: &mut HashSet<String>) -> String {
    let mut name = base.to_string();
    let mut n = 2;
    while used.contains(&name) {
        name = format!("{base}-{n}");
        n += 1;
    }
    used.insert(name.clone());
    name
}

/// Chunk manifest written next to the build output.
#[derive(Debug, Clone, Serialize)]
pub struct ChunkManifest {
    pub schema_version: u32,
    /// Information about each chunk.
    pub chunks: Vec<ChunkInfo>,
}

/// Information about a single chunk.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChunkInfo {
    pub id: ChunkId,
    pub name: String,
    /// Output file name.
    pub file: String,
    pub is_entry: bool,
    pub is_manual: bool,
    /// Module paths in this chunk.
    pub modules: Vec<String>,
    /// Chunk IDs this chunk depends on.
    pub dependencies: Vec<ChunkId>,
}

impl ChunkManifest {
    /// Serialize manifest to pretty JSON.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}
