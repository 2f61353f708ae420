//! Logging initialization for the CLI.
//!
//! Logging is owned by the CLI crate to keep library crates lightweight.
//! Command output goes to stdout; logs always go to stderr.

use tracing::Level;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Binary crate name; every event the CLI emits has a target under it.
const TARGET: &str = "bundleconf";

/// Filter directive raising the CLI's own events to the requested level.
fn binary_directive(verbosity: u8) -> String {
    let level = match verbosity {
        0 => Level::WARN,
        1 => Level::DEBUG,
        _ => Level::TRACE,
    };
    format!("{TARGET}={level}")
}

/// Initialize the tracing subscriber.
///
/// # Arguments
/// * `verbosity` - 0 = WARN, 1 = DEBUG, 2+ = TRACE
/// * `json` - If true, output JSON lines to stderr
///
/// JSON output format:
/// ```json
/// {"timestamp":"...","level":"WARN","target":"bundleconf::commands::access","span":{"cmd":"access","cwd":"/path"},"fields":{"message":"access denied"}}
/// ```
pub fn init(verbosity: u8, json: bool) {
    // RUST_LOG wins over the verbosity flag for other targets
    let mut filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    if let Ok(directive) = binary_directive(verbosity).parse() {
        filter = filter.add_directive(directive);
    }

    let subscriber = tracing_subscriber::registry().with(filter);

    if json {
        subscriber
            .with(
                fmt::layer()
                    .json()
                    .with_current_span(true)
                    .with_span_list(false)
                    .with_writer(std::io::stderr),
            )
            .init();
    } else {
        subscriber
            .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
            .init();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_directive_targets_binary_crate() {
        assert_eq!(binary_directive(0), "bundleconf=WARN");
        assert_eq!(binary_directive(1), "bundleconf=DEBUG");
        assert_eq!(binary_directive(3), "bundleconf=TRACE");
        assert_eq!(module_path!().split("::").next(), Some(TARGET));
    }
}
