//! `bundleconf chunks`: plan production chunks for a module graph.

use bundleconf_core::build::{BuildPlan, ChunkManifest, GraphDescription};
use bundleconf_core::config::Command;
use bundleconf_core::Settings;
use bundleconf_util::fs::{read_source, write_artifact};
use miette::Result;
use serde::Serialize;
use std::path::Path;

#[derive(Serialize)]
struct ChunksResult<'a> {
    ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    out: Option<&'a Path>,
    manifest: &'a ChunkManifest,
}

pub fn run(settings: &Settings, graph_file: &Path, out: Option<&Path>, json: bool) -> Result<()> {
    let config = super::load_or_exit(settings, Command::Build, json);

    let graph_file = settings.cwd.join(graph_file);
    let source = match read_source(&graph_file) {
        Ok(source) => source,
        Err(e) => super::fail(
            json,
            "GRAPH_READ_FAILED",
            &format!("Failed to read {}: {e}", graph_file.display()),
        ),
    };
    let description: GraphDescription = match serde_json::from_str(&source) {
        Ok(desc) => desc,
        Err(e) => super::fail(
            json,
            "GRAPH_PARSE_FAILED",
            &format!("Failed to parse {}: {e}", graph_file.display()),
        ),
    };

    let plan = match BuildPlan::from_description(&description, &config.build.manual_chunks) {
        Ok(plan) => plan,
        Err(e) => super::fail(json, "GRAPH_INVALID", &e.to_string()),
    };
    let manifest = plan.manifest();
    tracing::info!(
        modules = plan.graph.len(),
        chunks = manifest.chunks.len(),
        "planned chunks"
    );

    let out = out.map(|p| settings.cwd.join(p));
    if let Some(out) = &out {
        let bytes = match manifest.to_json() {
            Ok(text) => text.into_bytes(),
            Err(e) => super::fail(json, "INTERNAL_ERROR", &e.to_string()),
        };
        if let Err(e) = write_artifact(out, &bytes) {
            super::fail(
                json,
                "MANIFEST_WRITE_FAILED",
                &format!("Failed to write {}: {e}", out.display()),
            );
        }
        tracing::debug!(out = %out.display(), "wrote manifest");
    }

    if json {
        return super::print_json(&ChunksResult {
            ok: true,
            out: out.as_deref(),
            manifest: &manifest,
        });
    }

    for chunk in &manifest.chunks {
        let kind = if chunk.is_entry {
            "entry"
        } else if chunk.is_manual {
            "manual"
        } else {
            "async"
        };
        println!("{} [{kind}] {} module(s)", chunk.file, chunk.modules.len());
        for module in &chunk.modules {
            println!("  {module}");
        }
    }
    Ok(())
}
