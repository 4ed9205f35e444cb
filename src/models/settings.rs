use crate::models::ConfigSet;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Project settings from cmakesync.yaml
///
/// Contains the generator setup, the initial configuration passed to it and
/// logging preferences.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProjectSettings {
    #[serde(rename = "Generator", default)]
    pub generator: GeneratorSettings,

    /// Build directory; a temporary one is used when empty
    #[serde(rename = "Build Directory", default)]
    pub build_directory: String,

    /// Entries in `KEY:TYPE=VALUE` form
    #[serde(rename = "Configuration", default)]
    pub configuration: ConfigSet,

    /// Applied on top of the inherited environment
    #[serde(rename = "Environment", default)]
    pub environment: IndexMap<String, String>,

    #[serde(rename = "Logging", default)]
    pub logging: LogSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneratorSettings {
    #[serde(rename = "Executable", default = "default_executable")]
    pub executable: String,

    /// Passed as `-G<name>`; omitted when empty
    #[serde(rename = "Name", default = "default_generator_name")]
    pub name: String,
}

impl Default for GeneratorSettings {
    fn default() -> Self {
        Self {
            executable: default_executable(),
            name: default_generator_name(),
        }
    }
}

fn default_executable() -> String {
    "cmake".to_string()
}

fn default_generator_name() -> String {
    "CodeBlocks - Unix Makefiles".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogSettings {
    #[serde(rename = "Directory", default = "default_log_dir")]
    pub directory: String,

    #[serde(rename = "Prefix", default = "default_log_prefix")]
    pub prefix: String,

    #[serde(rename = "Debug Mode", default)]
    pub debug_mode: bool,

    #[serde(rename = "Console", default = "default_console")]
    pub console: bool,
}

impl Default for LogSettings {
    fn default() -> Self {
        Self {
            directory: default_log_dir(),
            prefix: default_log_prefix(),
            debug_mode: false,
            console: true,
        }
    }
}

fn default_log_dir() -> String {
    "logs".to_string()
}

fn default_log_prefix() -> String {
    "cmakesync".to_string()
}

fn default_console() -> bool {
    true
}
