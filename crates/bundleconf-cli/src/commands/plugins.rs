//! `bundleconf plugins`: list the active plugin pipeline.

use bundleconf_core::config::Command;
use bundleconf_core::{PluginDescriptor, Settings};
use miette::Result;
use serde::Serialize;

#[derive(Serialize)]
struct PluginsResult<'a> {
    ok: bool,
    command: Command,
    plugins: Vec<&'a PluginDescriptor>,
}

pub fn run(settings: &Settings, command: Command, json: bool) -> Result<()> {
    let config = super::load_or_exit(settings, command, json);
    let active = config.plugins.active(command);
    tracing::debug!(
        declared = config.plugins.len(),
        active = active.len(),
        "plugin pipeline"
    );

    if json {
        return super::print_json(&PluginsResult {
            ok: true,
            command,
            plugins: active,
        });
    }

    if active.is_empty() {
        println!("(no plugins active)");
    }
    for (idx, plugin) in active.iter().enumerate() {
        let caps: Vec<String> = plugin
            .capabilities
            .iter()
            .map(|c| format!("{c:?}"))
            .collect();
        println!(
            "{}. {} [{:?}] {}",
            idx + 1,
            plugin.name,
            plugin.enforce,
            caps.join(", ")
        );
    }
    Ok(())
}
