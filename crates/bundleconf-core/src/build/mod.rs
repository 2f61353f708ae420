//! Production build planning.
//!
//! Applies the chunk grouping policy to a module graph and produces the
//! chunk layout the bundler emits.

pub mod chunks;
pub mod graph;
pub mod manual_chunks;

pub use chunks::{Chunk, ChunkGraph, ChunkId, ChunkInfo, ChunkManifest};
pub use graph::{GraphDescription, GraphError, Module, ModuleDescription, ModuleGraph, ModuleId};
pub use manual_chunks::{ChunkGroup, ManualChunks};

/// A module graph together with its chunk assignment.
#[derive(Debug)]
pub struct BuildPlan {
    pub graph: ModuleGraph,
    pub entry: ModuleId,
    pub chunks: ChunkGraph,
}

impl BuildPlan {
    /// Plan chunks for a described graph under `policy`.
    pub fn from_description(
        desc: &GraphDescription,
        policy: &ManualChunks,
    ) -> Result<Self, GraphError> {
        let (graph, entry) = ModuleGraph::from_description(desc)?;
        let chunks = ChunkGraph::from_module_graph(&graph, entry, policy);
        Ok(Self { graph, entry, chunks })
    }

    #[must_use]
    pub fn manifest(&self) -> ChunkManifest {
        self.chunks.generate_manifest(&self.graph)
    }

    /// Name of the chunk holding the module at `path`.
    #[must_use]
    pub fn chunk_name_for(&self, path: &str) -> Option<&str> {
        let id = self.graph.id_by_path(path)?;
        let chunk = self.chunks.chunk_for_module(id)?;
        self.chunks.chunks().get(chunk).map(|c| c.name.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_material_icons_scenario() {
        let desc: GraphDescription = serde_json::from_str(
            r#"{
                "entry": "/app/src/main.ts",
                "modules": [
                    { "path": "/app/src/main.ts", "imports": ["/app/node_modules/@mdi/font/css/materialdesignicons.css", "/app/src/App.vue"] },
                    { "path": "/app/src/App.vue" },
                    { "path": "/app/node_modules/@mdi/font/css/materialdesignicons.css", "imports": ["/app/node_modules/@mdi/font/fonts/materialdesignicons-webfont.woff2"] },
                    { "path": "/app/node_modules/@mdi/font/fonts/materialdesignicons-webfont.woff2" }
                ]
            }"#,
        )
        .unwrap();
        let policy =
            ManualChunks::from_groups(vec![ChunkGroup::new("material-icons", ["@mdi/font"])])
                .unwrap();

        let plan = BuildPlan::from_description(&desc, &policy).unwrap();

        assert_eq!(
            plan.chunk_name_for("/app/node_modules/@mdi/font/css/materialdesignicons.css"),
            Some("material-icons")
        );
        assert_eq!(
            plan.chunk_name_for(
                "/app/node_modules/@mdi/font/fonts/materialdesignicons-webfont.woff2"
            ),
            Some("material-icons")
        );
        assert_eq!(plan.chunk_name_for("/app/src/App.vue"), Some("main"));

        let manifest = plan.manifest();
        assert!(manifest.chunks.iter().any(|c| c.file == "material-icons.js"));
    }
}
