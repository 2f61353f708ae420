//! `bundleconf access`: ask the dev file-server guard about requests.

use bundleconf_core::config::Command;
use super::ErrorJson;
use bundleconf_core::{AccessDecision, FsGuard, Settings};
use miette::Result;
use serde::Serialize;
use std::path::Path;

#[derive(Serialize)]
struct AccessEntry<'a> {
    request: &'a str,
    allowed: bool,
    #[serde(flatten)]
    decision: AccessDecision,
}

#[derive(Serialize)]
struct AccessResult<'a> {
    ok: bool,
    strict: bool,
    results: Vec<AccessEntry<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<ErrorJson>,
}

/// Error code reported when at least one request is refused.
const ACCESS_DENIED: &str = "ACCESS_DENIED";

/// Check each request. Exits with status 1 if any is denied.
///
/// With `as_url`, requests are dev-server URL paths (`/src/App.vue`,
/// `/@fs/...`); otherwise filesystem paths relative to the working directory.
pub fn run(settings: &Settings, requests: &[String], as_url: bool, json: bool) -> Result<()> {
    let config = super::load_or_exit(settings, Command::Serve, json);
    let guard = match FsGuard::new(&config.server.fs, &config.root) {
        Ok(guard) => guard,
        Err(e) => super::fail(json, e.code(), &e.to_string()),
    };

    let results: Vec<AccessEntry<'_>> = requests
        .iter()
        .map(|request| {
            let decision = if as_url {
                guard.check_url(request)
            } else {
                guard.check(&settings.cwd.join(Path::new(request)))
            };
            match &decision {
                AccessDecision::Denied(denied) => {
                    tracing::warn!(request = %request, reason = ?denied.reason, "access denied");
                }
                _ => tracing::debug!(request = %request, "access allowed"),
            }
            AccessEntry {
                request,
                allowed: decision.is_allowed(),
                decision,
            }
        })
        .collect();

    let all_allowed = results.iter().all(|entry| entry.allowed);

    if json {
        let error = results
            .iter()
            .find_map(|entry| match &entry.decision {
                AccessDecision::Denied(denied) => Some(denied),
                _ => None,
            })
            .map(|denied| {
                let refused = results.iter().filter(|entry| !entry.allowed).count();
                ErrorJson {
                    code: ACCESS_DENIED.to_string(),
                    message: if refused > 1 {
                        format!("{denied} (and {} more)", refused - 1)
                    } else {
                        denied.to_string()
                    },
                }
            });
        super::print_json(&AccessResult {
            ok: all_allowed,
            strict: config.server.fs.strict,
            results,
            error,
        })?;
    } else {
        for entry in &results {
            match &entry.decision {
                AccessDecision::Allowed { path } => println!("allow  {}", path.display()),
                AccessDecision::AllowedUnrestricted { path } => {
                    println!("allow  {} (not strict)", path.display());
                }
                AccessDecision::Denied(denied) => println!("deny   {denied}"),
            }
        }
    }

    if !all_allowed {
        std::process::exit(1);
    }
    Ok(())
}
