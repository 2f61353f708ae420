#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::too_many_lines)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::needless_pass_by_value)]
#![allow(clippy::return_self_not_must_use)]

pub mod alias;
pub mod build;
pub mod config;
pub mod error;
pub mod fs_guard;
pub mod paths;
pub mod plugin;
pub mod resolve;
pub mod settings;
pub mod version;

pub use alias::{apply_aliases, AliasRule};
pub use build::{BuildPlan, ChunkGroup, ChunkManifest, GraphDescription, ManualChunks};
pub use config::{load_config, BundlerConfig, Command, ConfigEnv, FsServeConfig};
pub use error::{Error, Result};
pub use fs_guard::{AccessDecision, AccessDenied, DenyReason, FsGuard};
pub use plugin::{Capability, PluginDescriptor, PluginPipeline};
pub use resolve::{PathResolver, Resolution, ResolveError};
pub use settings::Settings;
pub use version::VERSION;
