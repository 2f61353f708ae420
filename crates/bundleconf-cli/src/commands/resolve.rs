//! `bundleconf resolve`: run the path resolver on one specifier.

use bundleconf_core::config::Command;
use bundleconf_core::{PathResolver, Resolution, Settings};
use miette::Result;
use serde::Serialize;
use std::path::{Path, PathBuf};

#[derive(Serialize)]
struct AliasJson<'a> {
    find: &'a str,
    rewritten: PathBuf,
}

#[derive(Serialize)]
struct ResolveResult<'a> {
    ok: bool,
    specifier: &'a str,
    importer: Option<&'a Path>,
    #[serde(skip_serializing_if = "Option::is_none")]
    alias: Option<AliasJson<'a>>,
    resolution: Resolution,
}

pub fn run(
    settings: &Settings,
    specifier: &str,
    importer: Option<&Path>,
    json: bool,
) -> Result<()> {
    let config = super::load_or_exit(settings, Command::Serve, json);
    let importer = importer.map(|p| settings.cwd.join(p));
    let resolver = PathResolver::new(&config);

    let alias = resolver.rewrite(specifier).map(|(rule, rewritten)| {
        tracing::debug!(find = %rule.find, rewritten = %rewritten.display(), "alias matched");
        AliasJson {
            find: &rule.find,
            rewritten,
        }
    });

    let resolution = match resolver.resolve(specifier, importer.as_deref()) {
        Ok(resolution) => resolution,
        Err(e) => {
            tracing::warn!(specifier, "resolution failed");
            super::fail(json, "RESOLUTION_FAILURE", &e.to_string());
        }
    };

    if json {
        return super::print_json(&ResolveResult {
            ok: true,
            specifier,
            importer: importer.as_deref(),
            alias,
            resolution,
        });
    }

    match &resolution {
        Resolution::File { path, package } => {
            println!("{}", path.display());
            if let Some(package) = package {
                println!("  package: {package}");
            }
        }
        Resolution::Builtin { specifier } => println!("{specifier} (builtin)"),
    }
    if let Some(alias) = alias {
        println!("  alias:   {} -> {}", alias.find, alias.rewritten.display());
    }
    Ok(())
}
