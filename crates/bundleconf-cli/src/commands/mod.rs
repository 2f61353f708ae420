pub mod access;
pub mod chunks;
pub mod config;
pub mod plugins;
pub mod resolve;
pub mod version;

use bundleconf_core::config::{load_config, BundlerConfig, Command, ConfigEnv};
use bundleconf_core::paths::project_root;
use bundleconf_core::Settings;
use miette::{IntoDiagnostic, Result};
use serde::Serialize;

/// Error payload shared by every JSON output.
#[derive(Debug, Serialize)]
pub struct ErrorJson {
    pub code: String,
    pub message: String,
}

#[derive(Serialize)]
struct ErrorResult<'a> {
    ok: bool,
    error: &'a ErrorJson,
}

/// Load the bundler config for the project around `settings.cwd`.
///
/// On failure, reports the error (JSON or human) and exits with status 1.
pub fn load_or_exit(settings: &Settings, command: Command, json: bool) -> BundlerConfig {
    let root = project_root(&settings.cwd).unwrap_or_else(|| settings.cwd.clone());
    let env = ConfigEnv::new(command).with_mode(settings.mode.clone());

    match load_config(&root, settings.config_file.as_deref(), &env) {
        Ok(config) => {
            tracing::debug!(
                root = %config.root.display(),
                config_file = ?config.config_file,
                mode = %config.mode,
                "loaded config"
            );
            config
        }
        Err(e) => fail(json, e.code(), &e.to_string()),
    }
}

/// Report a failure and exit with status 1.
pub fn fail(json: bool, code: &str, message: &str) -> ! {
    if json {
        let error = ErrorJson {
            code: code.to_string(),
            message: message.to_string(),
        };
        let result = ErrorResult { ok: false, error: &error };
        if let Ok(out) = serde_json::to_string_pretty(&result) {
            println!("{out}");
        }
    } else {
        eprintln!("error: {message}");
    }
    std::process::exit(1);
}

/// Print a value as pretty JSON on stdout.
pub fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let out = serde_json::to_string_pretty(value).into_diagnostic()?;
    println!("{out}");
    Ok(())
}
