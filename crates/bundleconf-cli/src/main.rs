#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::needless_pass_by_value)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::doc_markdown)]

mod commands;
mod logging;

use bundleconf_core::config::Command;
use bundleconf_core::Settings;
use clap::{Parser, ValueEnum};
use miette::Result;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "bundleconf")]
#[command(
    author,
    version,
    about = "Inspect and apply front-end bundler configuration",
    long_about = None
)]
struct Cli {
    /// Increase logging verbosity (-v for DEBUG, -vv for TRACE)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Emit JSON formatted output (stable, machine-readable)
    #[arg(long, global = true)]
    json: bool,

    /// Override the working directory
    #[arg(long, global = true, value_name = "PATH")]
    cwd: Option<PathBuf>,

    /// Use this config file instead of discovering one
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Override the mode (defaults to development for serve, production for build)
    #[arg(long, global = true)]
    mode: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(clap::Subcommand, Debug)]
enum Commands {
    /// Print version information
    Version,

    /// Load and validate the config, then print it normalized
    Config {
        /// Command to resolve the config for
        #[arg(long, value_enum, default_value_t = CommandArg::Serve)]
        command: CommandArg,
    },

    /// Resolve an import specifier through aliases and node_modules
    Resolve {
        /// Import specifier (e.g., "@/components/Foo.vue", "vue", "./utils")
        specifier: String,

        /// File containing the import
        #[arg(long, value_name = "FILE")]
        importer: Option<PathBuf>,
    },

    /// Check whether the dev server may serve the given files
    Access {
        /// Filesystem paths, or URL paths with --url
        #[arg(required = true)]
        paths: Vec<String>,

        /// Treat arguments as dev-server URL paths (e.g., "/@fs/etc/passwd")
        #[arg(long)]
        url: bool,
    },

    /// Plan production chunks for a module graph
    Chunks {
        /// JSON module graph: { "entry": ..., "modules": [...] }
        graph: PathBuf,

        /// Write the chunk manifest to this file
        #[arg(long, short = 'o', value_name = "FILE")]
        out: Option<PathBuf>,
    },

    /// List the plugins active for a command, in pipeline order
    Plugins {
        #[arg(long, value_enum, default_value_t = CommandArg::Serve)]
        command: CommandArg,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum CommandArg {
    Serve,
    Build,
}

impl From<CommandArg> for Command {
    fn from(arg: CommandArg) -> Self {
        match arg {
            CommandArg::Serve => Command::Serve,
            CommandArg::Build => Command::Build,
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Determine working directory
    let cwd = cli
        .cwd
        .or_else(|| std::env::current_dir().ok())
        .unwrap_or_else(|| PathBuf::from("."));
    let cwd = dunce::canonicalize(&cwd).unwrap_or(cwd);

    let settings = Settings::new(cwd.clone())
        .with_verbosity(cli.verbose)
        .with_json_logs(cli.json)
        .with_config_file(cli.config.map(|p| cwd.join(p)))
        .with_mode(cli.mode);

    logging::init(settings.verbosity, settings.json_logs);

    let json = cli.json;
    match cli.command {
        Some(Commands::Version) | None => commands::version::run(json),
        Some(Commands::Config { command }) => {
            let span = tracing::info_span!("config", cmd = "config", cwd = %cwd.display());
            let _guard = span.enter();
            commands::config::run(&settings, command.into(), json)
        }
        Some(Commands::Resolve {
            specifier,
            importer,
        }) => {
            let span = tracing::info_span!("resolve", cmd = "resolve", cwd = %cwd.display());
            let _guard = span.enter();
            commands::resolve::run(&settings, &specifier, importer.as_deref(), json)
        }
        Some(Commands::Access { paths, url }) => {
            let span = tracing::info_span!("access", cmd = "access", cwd = %cwd.display());
            let _guard = span.enter();
            commands::access::run(&settings, &paths, url, json)
        }
        Some(Commands::Chunks { graph, out }) => {
            let span = tracing::info_span!("chunks", cmd = "chunks", cwd = %cwd.display());
            let _guard = span.enter();
            commands::chunks::run(&settings, &graph, out.as_deref(), json)
        }
        Some(Commands::Plugins { command }) => {
            let span = tracing::info_span!("plugins", cmd = "plugins", cwd = %cwd.display());
            let _guard = span.enter();
            commands::plugins::run(&settings, command.into(), json)
        }
    }
}
