//! `bundleconf config`: load, validate, and print the normalized config.

use bundleconf_core::config::{BundlerConfig, Command};
use bundleconf_core::version::SCHEMA_VERSION;
use bundleconf_core::Settings;
use miette::{IntoDiagnostic, Result};
use serde::Serialize;
use std::io::{self, Write};

#[derive(Serialize)]
struct ConfigResult<'a> {
    schema_version: u32,
    ok: bool,
    fingerprint: String,
    config: &'a BundlerConfig,
}

pub fn run(settings: &Settings, command: Command, json: bool) -> Result<()> {
    let config = super::load_or_exit(settings, command, json);
    let fingerprint = match config.fingerprint() {
        Ok(fp) => fp,
        Err(e) => super::fail(json, e.code(), &e.to_string()),
    };
    tracing::info!(fingerprint = %fingerprint, "config is valid");

    if json {
        return super::print_json(&ConfigResult {
            schema_version: SCHEMA_VERSION,
            ok: true,
            fingerprint,
            config: &config,
        });
    }

    print_human(&config, &fingerprint).into_diagnostic()
}

fn print_human(config: &BundlerConfig, fingerprint: &str) -> io::Result<()> {
    let mut out = io::stdout().lock();

    writeln!(out, "Root:         {}", config.root.display())?;
    match &config.config_file {
        Some(file) => writeln!(out, "Config file:  {}", file.display())?,
        None => writeln!(out, "Config file:  (none, using defaults)")?,
    }
    writeln!(out, "Command:      {:?}", config.command)?;
    writeln!(out, "Mode:         {}", config.mode)?;
    writeln!(out, "Fingerprint:  {fingerprint}")?;
    writeln!(out)?;

    writeln!(out, "Plugins:")?;
    if config.plugins.is_empty() {
        writeln!(out, "  (none)")?;
    }
    for plugin in config.plugins.declared() {
        writeln!(
            out,
            "  {} ({})",
            plugin.name,
            plugin.package.as_deref().unwrap_or("unknown package")
        )?;
    }

    writeln!(out, "Aliases:")?;
    if config.resolve.alias.is_empty() {
        writeln!(out, "  (none)")?;
    }
    for rule in &config.resolve.alias {
        writeln!(out, "  {} -> {}", rule.find, rule.replacement.display())?;
    }

    let fs = &config.server.fs;
    writeln!(out, "Dev server fs (strict: {}):", fs.strict)?;
    for dir in &fs.allow {
        writeln!(out, "  allow {}", dir.display())?;
    }
    for pattern in &fs.deny {
        writeln!(out, "  deny  {pattern}")?;
    }

    writeln!(out, "Manual chunks:")?;
    if config.build.manual_chunks.is_empty() {
        writeln!(out, "  (none)")?;
    }
    for group in config.build.manual_chunks.groups() {
        writeln!(out, "  {}: {}", group.name, group.packages.join(", "))?;
    }
    writeln!(out, "Out dir:      {}", config.build.out_dir.display())?;

    Ok(())
}
