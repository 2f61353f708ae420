use std::fmt::Write;

/// The current version, read from Cargo.toml at compile time.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Schema version of the JSON emitted by `bundleconf` (config dumps, chunk manifests).
/// Bump this when changing field names or shapes.
pub const SCHEMA_VERSION: u32 = 1;

/// Returns a formatted version string including build metadata if available.
#[must_use]
pub fn version_string() -> String {
    let mut s = format!("bundleconf {VERSION}");

    if let Some(hash) = option_env!("BUNDLECONF_BUILD_GIT_HASH") {
        let _ = write!(s, " ({hash})");
    }

    s
}
