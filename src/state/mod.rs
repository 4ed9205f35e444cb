// Project model module
//
// This module provides the ProjectModel which wraps ProjectState with thread-safe access
// using Arc<RwLock<T>> and emits change events for collaborators.

use crate::models::{BuildTarget, BuildType, Diagnostic, DiagnosticCategory, FileNode, FolderNode};
use crate::services::deployment::{ApplicationTarget, DeploymentData};
use crate::services::metadata::ParsedProject;
use crate::services::reconcile::{ReconcileReport, reconcile_tree};
use camino::{Utf8Path, Utf8PathBuf};
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tokio::sync::broadcast;

/// Change events emitted when the project model is modified
///
/// Events are edge-triggered signals; consumers re-read the current state
/// through [`ProjectModel::read`] or [`ProjectModel::snapshot`].
#[derive(Clone, Debug, PartialEq)]
pub enum ProjectEvent {
    /// A generator run has started
    ParsingStarted,

    /// Extraction finished; the model reflects the latest metadata
    DataAvailable,

    /// The project's display name changed
    DisplayNameChanged { name: String },

    /// The target list differs from the previous one
    TargetsChanged,

    /// Files were added to or removed from the project tree
    FileListChanged { added: usize, removed: usize },

    /// A diagnostic was reported
    DiagnosticAdded(Diagnostic),

    /// Diagnostics of one category were cleared
    DiagnosticsCleared { category: DiagnosticCategory },
}

/// Everything known about the project
#[derive(Debug, Clone)]
pub struct ProjectState {
    pub project_name: String,
    pub source_dir: Utf8PathBuf,
    pub build_dir: Utf8PathBuf,

    /// Live file tree rooted at the source directory
    pub root: FolderNode,
    pub targets: Vec<BuildTarget>,
    /// Every file of the project, sorted and deduplicated
    pub files: Vec<Utf8PathBuf>,
    /// Build-definition files, also the watched files
    pub project_files: Vec<Utf8PathBuf>,

    pub diagnostics: Vec<Diagnostic>,
    /// Generator output of the current or last invocation
    pub output_log: Vec<String>,
    pub is_parsing: bool,

    pub build_type: BuildType,
    pub deployment: DeploymentData,
    pub application_targets: Vec<ApplicationTarget>,
}

impl ProjectState {
    pub fn new(source_dir: impl Into<Utf8PathBuf>, build_dir: impl Into<Utf8PathBuf>) -> Self {
        let source_dir = source_dir.into();
        let project_name = source_dir.file_name().unwrap_or_default().to_string();
        Self {
            root: FolderNode::new(source_dir.clone(), project_name.clone()),
            project_name,
            source_dir,
            build_dir: build_dir.into(),
            targets: Vec::new(),
            files: Vec::new(),
            project_files: Vec::new(),
            diagnostics: Vec::new(),
            output_log: Vec::new(),
            is_parsing: false,
            build_type: BuildType::Unknown,
            deployment: DeploymentData::default(),
            application_targets: Vec::new(),
        }
    }

    /// Titles of all targets, or only of those that can be run
    pub fn build_target_titles(&self, runnable_only: bool) -> Vec<String> {
        self.targets
            .iter()
            .filter(|t| !runnable_only || t.is_runnable())
            .map(|t| t.title.clone())
            .collect()
    }

    pub fn has_build_target(&self, title: &str) -> bool {
        self.targets.iter().any(|t| t.title == title)
    }

    pub fn build_target_for_title(&self, title: &str) -> Option<&BuildTarget> {
        self.targets.iter().find(|t| t.title == title)
    }

    pub fn diagnostics_of(
        &self,
        category: DiagnosticCategory,
    ) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics.iter().filter(move |d| d.category == category)
    }
}

/// Result of a freshly parsed project, ready to be applied
#[derive(Debug, Clone, Default)]
pub struct ParseResult {
    pub project: ParsedProject,
    pub build_type: BuildType,
    pub deployment: DeploymentData,
    pub application_targets: Vec<ApplicationTarget>,
}

/// Thread-safe project model with event emission
///
/// This is the central shared component that:
/// - Provides thread-safe access to [`ProjectState`] via `Arc<RwLock<T>>`
/// - Detects changes and emits [`ProjectEvent`]s
/// - Applies parse results, reconciling the live tree in place
///
/// # Related Types
///
/// - [`crate::controller::BuildDirManager`]: The only writer during normal operation
/// - [`ProjectEvent`]: Event types emitted on mutations
pub struct ProjectModel {
    state: Arc<RwLock<ProjectState>>,
    event_tx: broadcast::Sender<ProjectEvent>,
}

impl ProjectModel {
    /// Create a model for `source_dir` with a broadcast buffer of 100 events
    pub fn new(source_dir: impl Into<Utf8PathBuf>, build_dir: impl Into<Utf8PathBuf>) -> Self {
        let (event_tx, _) = broadcast::channel(100);
        Self {
            state: Arc::new(RwLock::new(ProjectState::new(source_dir, build_dir))),
            event_tx,
        }
    }

    fn read_guard(&self) -> RwLockReadGuard<'_, ProjectState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write_guard(&self) -> RwLockWriteGuard<'_, ProjectState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Get a clone of the current state
    pub fn snapshot(&self) -> ProjectState {
        self.read_guard().clone()
    }

    /// Execute a function with read access to the state
    ///
    /// # Example
    /// ```ignore
    /// let titles = model.read(|state| state.build_target_titles(true));
    /// ```
    pub fn read<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&ProjectState) -> R,
    {
        f(&self.read_guard())
    }

    /// Update the state and emit change events
    ///
    /// Returns the events that were emitted.
    pub fn update<F>(&self, update_fn: F) -> Vec<ProjectEvent>
    where
        F: FnOnce(&mut ProjectState),
    {
        let changes = {
            let mut state = self.write_guard();
            let before = ChangeMarks::of(&state);
            update_fn(&mut state);
            before.detect_changes(&state)
        };

        for change in &changes {
            self.emit(change.clone());
        }
        changes
    }

    /// Subscribe to project events
    pub fn subscribe(&self) -> broadcast::Receiver<ProjectEvent> {
        self.event_tx.subscribe()
    }

    fn emit(&self, event: ProjectEvent) {
        // No subscribers is fine
        let _ = self.event_tx.send(event);
    }

    // Convenience methods used by the controller

    /// Mark a generator run as started.
    ///
    /// Build-system diagnostics and the output log of the previous run are
    /// dropped; diagnostics of other categories are kept.
    pub fn parsing_started(&self) -> Vec<ProjectEvent> {
        let mut changes = self.clear_diagnostics(DiagnosticCategory::BuildSystem);
        changes.extend(self.update(|state| {
            state.output_log.clear();
            state.is_parsing = true;
        }));
        changes
    }

    /// Mark extraction as finished and announce fresh data
    pub fn data_available(&self) -> Vec<ProjectEvent> {
        let mut changes = self.update(|state| state.is_parsing = false);
        self.emit(ProjectEvent::DataAvailable);
        changes.push(ProjectEvent::DataAvailable);
        changes
    }

    pub fn append_output(&self, line: impl Into<String>) {
        self.write_guard().output_log.push(line.into());
    }

    pub fn add_diagnostic(&self, diagnostic: Diagnostic) -> ProjectEvent {
        self.write_guard().diagnostics.push(diagnostic.clone());
        let event = ProjectEvent::DiagnosticAdded(diagnostic);
        self.emit(event.clone());
        event
    }

    /// Drop the first diagnostic equal to `diagnostic`. No event is sent;
    /// callers report the replacement.
    pub fn remove_diagnostic(&self, diagnostic: &Diagnostic) -> bool {
        let mut state = self.write_guard();
        match state.diagnostics.iter().position(|d| d == diagnostic) {
            Some(index) => {
                state.diagnostics.remove(index);
                true
            }
            None => false,
        }
    }

    pub fn clear_diagnostics(&self, category: DiagnosticCategory) -> Vec<ProjectEvent> {
        let removed = {
            let mut state = self.write_guard();
            let before = state.diagnostics.len();
            state.diagnostics.retain(|d| d.category != category);
            before - state.diagnostics.len()
        };

        if removed == 0 {
            return Vec::new();
        }
        let event = ProjectEvent::DiagnosticsCleared { category };
        self.emit(event.clone());
        vec![event]
    }

    /// Replace targets and derived data with a fresh parse and reconcile the
    /// live tree against its files.
    ///
    /// Files and project files together make up the tree. An empty project
    /// name keeps the current one.
    pub fn apply_parse(&self, result: ParseResult) -> (ReconcileReport, Vec<ProjectEvent>) {
        let ParseResult {
            project,
            build_type,
            deployment,
            application_targets,
        } = result;

        let mut nodes: Vec<FileNode> = project.files;
        nodes.extend(project.project_files.iter().cloned());

        let mut files: Vec<Utf8PathBuf> = nodes.iter().map(|n| n.path.clone()).collect();
        files.sort();
        files.dedup();

        let project_files: Vec<Utf8PathBuf> =
            project.project_files.into_iter().map(|n| n.path).collect();

        let mut report = ReconcileReport::default();
        let mut changes = self.update(|state| {
            if !project.project_name.is_empty() {
                state.project_name = project.project_name;
            }
            report = reconcile_tree(&mut state.root, nodes);
            state.targets = project.targets;
            state.files = files;
            state.project_files = project_files;
            state.build_type = build_type;
            state.deployment = deployment;
            state.application_targets = application_targets;
        });

        if !report.is_unchanged() {
            let event = ProjectEvent::FileListChanged {
                added: report.added.len(),
                removed: report.removed.len(),
            };
            self.emit(event.clone());
            changes.push(event);
        }

        (report, changes)
    }

    pub fn project_name(&self) -> String {
        self.read(|state| state.project_name.clone())
    }

    pub fn build_target_titles(&self, runnable_only: bool) -> Vec<String> {
        self.read(|state| state.build_target_titles(runnable_only))
    }

    pub fn has_build_target(&self, title: &str) -> bool {
        self.read(|state| state.has_build_target(title))
    }

    pub fn build_target_for_title(&self, title: &str) -> Option<BuildTarget> {
        self.read(|state| state.build_target_for_title(title).cloned())
    }

    pub fn contains_file(&self, path: &Utf8Path) -> bool {
        self.read(|state| state.root.find_file(path).is_some())
    }
}

impl Clone for ProjectModel {
    fn clone(&self) -> Self {
        Self {
            state: Arc::clone(&self.state),
            event_tx: self.event_tx.clone(),
        }
    }
}

/// The parts of the state whose changes are reported by [`ProjectModel::update`]
struct ChangeMarks {
    project_name: String,
    is_parsing: bool,
    targets: Vec<BuildTarget>,
}

impl ChangeMarks {
    fn of(state: &ProjectState) -> Self {
        Self {
            project_name: state.project_name.clone(),
            is_parsing: state.is_parsing,
            targets: state.targets.clone(),
        }
    }

    fn detect_changes(self, new: &ProjectState) -> Vec<ProjectEvent> {
        let mut changes = Vec::new();

        if !self.is_parsing && new.is_parsing {
            changes.push(ProjectEvent::ParsingStarted);
        }

        if self.project_name != new.project_name {
            changes.push(ProjectEvent::DisplayNameChanged {
                name: new.project_name.clone(),
            });
        }

        if self.targets != new.targets {
            changes.push(ProjectEvent::TargetsChanged);
        }

        changes
    }
}
