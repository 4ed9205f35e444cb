//! Services module - the building blocks of project synchronization.
//!
//! Everything here is free of controller state and can be exercised on its
//! own. The controller wires these together.
//!
//! # Components
//!
//! - [`generator`]: Builds the generator command line, spawns it and reduces its
//!   output into diagnostics ([`OutputReducer`])
//! - [`metadata`]: Single-pass parser for the CodeBlocks project document
//!   ([`MetadataParser`], [`find_metadata_file`])
//! - [`assign`]: Attributes loose files to the target whose source directory
//!   contains them most specifically
//! - [`reconcile`]: Updates the live file tree against a freshly parsed file list
//! - [`watch`]: Watched project files and the [`WatchService`] seam
//! - [`build_type`]: Reads the build configuration class from `CMakeCache.txt`
//! - [`deployment`]: Deployment data and runnable targets
//!
//! # Data flow
//!
//! 1. The controller decides whether the generator has to run, using
//!    [`WatchSet::is_newer_than`] against the metadata document
//! 2. [`spawn_generator`] runs it; output lines go through [`OutputReducer`]
//! 3. [`MetadataParser`] parses the document, [`assign_files`] completes
//!    target membership
//! 4. [`reconcile_tree`] updates the live tree

pub mod assign;
pub mod build_type;
pub mod deployment;
pub mod generator;
pub mod metadata;
pub mod reconcile;
pub mod watch;

pub use assign::assign_files;
pub use build_type::read_build_type;
pub use deployment::{
    ApplicationTarget, DeployableFile, DeployableKind, DeploymentData, DeploymentManifest,
    deployment_for_targets,
};
pub use generator::{
    GeneratorCommand, GeneratorExit, GeneratorRun, OutputReducer, ReducedLine, generator_arguments,
    spawn_generator,
};
pub use metadata::{MetadataError, MetadataParser, ParsedProject, find_metadata_file};
pub use reconcile::{ReconcileReport, reconcile_tree};
pub use watch::{NotifyWatchService, WatchError, WatchService, WatchSet};
