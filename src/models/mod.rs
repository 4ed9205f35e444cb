//! Data models for cmakesync.
//!
//! This module contains the core data structures shared by the services and the
//! controller:
//! - [`ConfigItem`] / [`ConfigSet`]: generator configuration entries
//! - [`BuildTarget`] / [`BuildType`]: targets reported by the metadata document
//! - [`FileNode`] / [`FolderNode`]: the live project tree
//! - [`Diagnostic`]: problems reported by the generator
//! - [`ProjectSettings`]: settings loaded from `cmakesync.yaml`

pub mod build_target;
pub mod config_item;
pub mod diagnostic;
pub mod nodes;
pub mod settings;

pub use build_target::{BuildTarget, BuildType};
pub use config_item::{ConfigItem, ConfigItemParseError, ConfigSet, ConfigType};
pub use diagnostic::{Diagnostic, DiagnosticCategory, Severity};
pub use nodes::{FileKind, FileNode, FolderNode};
pub use settings::{GeneratorSettings, LogSettings, ProjectSettings};
