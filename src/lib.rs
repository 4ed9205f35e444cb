// cmakesync - keeps a CMake project model in sync with its generator
//
// This is the library crate containing the synchronization engine and data structures.
// The binary crate (main.rs) provides the command line entry point.

pub mod config;
pub mod controller;
pub mod logging;
pub mod metrics;
pub mod models;
pub mod paths;
pub mod services;
pub mod state;

// Re-export commonly used types for convenience
pub use config::ConfigManager;
pub use controller::{BuildDirManager, ControllerError, ParseDecision};
pub use metrics::SyncMetrics;
pub use models::{BuildTarget, ConfigItem, ConfigSet, FileNode, FolderNode, ProjectSettings};
pub use state::{ProjectEvent, ProjectModel, ProjectState};

/// Application version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Application name
pub const APP_NAME: &str = env!("CARGO_PKG_NAME");
