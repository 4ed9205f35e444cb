//! Build directory controller.
//!
//! [`BuildDirManager`] owns one build directory. It decides whether the
//! generator has to run, makes sure at most one run is in flight, turns the
//! run's output into diagnostics and extracts the metadata afterwards,
//! whatever the exit status was.
//!
//! # States
//!
//! The controller is either idle or invoking. A request to start the
//! generator while a run is in flight is rejected with
//! [`ControllerError::Busy`]; it is never queued.
//!
//! # Driving it
//!
//! Callers either drive it step by step ([`BuildDirManager::request_parse`]
//! followed by [`BuildDirManager::wait_for_generator`]) or hand it to
//! [`BuildDirManager::run`], which also reacts to watched-file changes.

use crate::metrics::SyncMetrics;
use crate::models::{
    ConfigSet, Diagnostic, DiagnosticCategory, FileNode, GeneratorSettings, ProjectSettings,
    Severity,
};
use crate::paths::clean_path;
use crate::services::build_type::read_build_type;
use crate::services::deployment::{DeploymentManifest, deployment_for_targets};
use crate::services::generator::{
    GeneratorCommand, GeneratorExit, GeneratorRun, OutputReducer, spawn_generator,
};
use crate::services::metadata::{MetadataParser, find_metadata_file};
use crate::services::watch::{WatchService, WatchSet};
use crate::state::{ParseResult, ProjectModel};
use camino::{Utf8Path, Utf8PathBuf};
use indexmap::IndexMap;
use std::fs;
use std::sync::Arc;
use std::time::{Instant, SystemTime};
use tempfile::TempDir;
use thiserror::Error;
use tokio::sync::{mpsc, watch};

/// Top-level build definition file of a project
pub const TOP_LEVEL_PROJECT_FILE: &str = "CMakeLists.txt";

/// Prefix of the temporary build directory used when none is configured
pub const TEMP_BUILD_DIR_PREFIX: &str = "cmake-tmp-";

/// Log target for verbatim generator output
const GENERATOR_LOG_TARGET: &str = "cmakesync::generator";

#[derive(Error, Debug)]
pub enum ControllerError {
    #[error("Generator is already running")]
    Busy,

    #[error("No generator executable configured")]
    MissingExecutable,

    #[error("Invalid generator name: {0:?}")]
    InvalidGeneratorName(String),

    #[error("Build directory {path} is not usable: {source}")]
    BuildDirectory {
        path: Utf8PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to start generator {executable}: {source}")]
    Spawn {
        executable: Utf8PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to create temporary build directory: {0}")]
    TemporaryDirectory(String),
}

/// What [`BuildDirManager::request_parse`] decided
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseDecision {
    /// No metadata yet; the generator runs with the full configuration
    Configure,
    /// A watched file is newer than the metadata; the generator reruns with
    /// its recorded settings only
    Reconfigure,
    /// The metadata is current and was extracted right away
    UpToDate,
}

/// Owner of one generator build directory
pub struct BuildDirManager {
    source_dir: Utf8PathBuf,
    build_dir: Utf8PathBuf,
    // Removed from disk when the manager is dropped
    _temp_dir: Option<TempDir>,

    generator: GeneratorSettings,
    input_config: ConfigSet,
    environment: IndexMap<String, String>,

    watch_set: WatchSet,
    watcher: Box<dyn WatchService>,
    watch_events: Option<mpsc::UnboundedReceiver<Utf8PathBuf>>,

    run: Option<GeneratorRun>,
    run_started: Option<Instant>,
    reducer: OutputReducer,
    // Diagnostic of the last refused start, replaced by the next one
    refusal: Option<Diagnostic>,

    model: ProjectModel,
    metrics: Arc<SyncMetrics>,
}

impl BuildDirManager {
    /// Create a manager for `source_dir`.
    ///
    /// Without a configured build directory a temporary one is created; it
    /// lives as long as the manager. Paths reported by `watch_events` trigger
    /// a reparse while [`run`](Self::run) is active.
    pub fn new(
        source_dir: impl Into<Utf8PathBuf>,
        settings: &ProjectSettings,
        watcher: Box<dyn WatchService>,
        watch_events: mpsc::UnboundedReceiver<Utf8PathBuf>,
    ) -> Result<Self, ControllerError> {
        let source_dir = source_dir.into();

        let (build_dir, temp_dir) = if settings.build_directory.is_empty() {
            let temp_dir = tempfile::Builder::new()
                .prefix(TEMP_BUILD_DIR_PREFIX)
                .tempdir()
                .map_err(|e| ControllerError::TemporaryDirectory(e.to_string()))?;
            let path = Utf8PathBuf::try_from(temp_dir.path().to_path_buf())
                .map_err(|e| ControllerError::TemporaryDirectory(e.to_string()))?;
            tracing::info!("Using temporary build directory {}", path);
            (path, Some(temp_dir))
        } else {
            (absolute_build_dir(&settings.build_directory)?, None)
        };

        let mut watch_set = WatchSet::new();
        watch_set.insert(source_dir.join(TOP_LEVEL_PROJECT_FILE));

        Ok(Self {
            model: ProjectModel::new(source_dir.clone(), build_dir.clone()),
            reducer: OutputReducer::new(source_dir.clone()),
            source_dir,
            build_dir,
            _temp_dir: temp_dir,
            generator: settings.generator.clone(),
            input_config: settings.configuration.clone(),
            environment: settings.environment.clone(),
            watch_set,
            watcher,
            watch_events: Some(watch_events),
            run: None,
            run_started: None,
            refusal: None,
            metrics: Arc::new(SyncMetrics::new()),
        })
    }

    pub fn source_dir(&self) -> &Utf8Path {
        &self.source_dir
    }

    pub fn build_dir(&self) -> &Utf8Path {
        &self.build_dir
    }

    /// Handle to the shared project model
    pub fn model(&self) -> &ProjectModel {
        &self.model
    }

    pub fn metrics(&self) -> Arc<SyncMetrics> {
        Arc::clone(&self.metrics)
    }

    pub fn watch_set(&self) -> &WatchSet {
        &self.watch_set
    }

    /// Whether `path` is one of the watched build-definition files
    pub fn is_project_file(&self, path: &Utf8Path) -> bool {
        self.watch_set.contains(path)
    }

    pub fn is_invoking(&self) -> bool {
        self.run.is_some()
    }

    pub fn project_name(&self) -> String {
        self.model.project_name()
    }

    pub fn input_config(&self) -> &ConfigSet {
        &self.input_config
    }

    pub fn set_input_config(&mut self, config: ConfigSet) {
        self.input_config = config;
    }

    /// The metadata document currently in the build directory
    pub fn metadata_file(&self) -> Option<Utf8PathBuf> {
        find_metadata_file(&self.build_dir)
    }

    /// Bring the model up to date, running the generator only when needed.
    pub fn request_parse(&mut self) -> Result<ParseDecision, ControllerError> {
        if self.is_invoking() {
            tracing::warn!("Parse requested while the generator is running");
            return Err(ControllerError::Busy);
        }

        let metadata_time = self
            .metadata_file()
            .and_then(|path| fs::metadata(path).and_then(|m| m.modified()).ok());

        let Some(metadata_time) = metadata_time else {
            tracing::info!("No metadata in {}, configuring", self.build_dir);
            self.start_generator(self.input_config.clone())?;
            return Ok(ParseDecision::Configure);
        };

        if self.is_stale(metadata_time) {
            tracing::info!("Project files changed since the last run, reconfiguring");
            self.start_generator(ConfigSet::new())?;
            return Ok(ParseDecision::Reconfigure);
        }

        tracing::debug!("Metadata is up to date");
        self.extract_data();
        self.model.data_available();
        Ok(ParseDecision::UpToDate)
    }

    fn is_stale(&self, metadata_time: SystemTime) -> bool {
        self.watch_set.is_newer_than(metadata_time)
    }

    /// Run the generator with the full input configuration.
    pub fn force_reparse(&mut self) -> Result<(), ControllerError> {
        self.start_generator(self.input_config.clone())
    }

    fn validate_generator(&self) -> Result<(), ControllerError> {
        if self.generator.executable.trim().is_empty() {
            return Err(ControllerError::MissingExecutable);
        }
        if self.generator.name.chars().any(char::is_control) {
            return Err(ControllerError::InvalidGeneratorName(self.generator.name.clone()));
        }
        Ok(())
    }

    /// Start the generator with `config` as its `-D` arguments.
    ///
    /// Refused while another run is in flight, when the generator setup is
    /// invalid and when the process cannot be started. Apart from `Busy`, a
    /// refusal is reported as a build-system diagnostic.
    pub fn start_generator(&mut self, config: ConfigSet) -> Result<(), ControllerError> {
        if self.is_invoking() {
            tracing::warn!("Generator start refused: already running");
            return Err(ControllerError::Busy);
        }

        if let Err(e) = self.validate_generator() {
            self.report_refusal(&e);
            return Err(e);
        }

        if let Err(source) = fs::create_dir_all(&self.build_dir) {
            let e = ControllerError::BuildDirectory {
                path: self.build_dir.clone(),
                source,
            };
            self.report_refusal(&e);
            return Err(e);
        }

        let command = GeneratorCommand {
            executable: Utf8PathBuf::from(&self.generator.executable),
            source_dir: self.source_dir.clone(),
            build_dir: self.build_dir.clone(),
            generator_name: self.generator.name.clone(),
            config,
            environment: self.environment.clone(),
        };

        let run = match spawn_generator(&command) {
            Ok(run) => run,
            Err(source) => {
                let e = ControllerError::Spawn {
                    executable: command.executable,
                    source,
                };
                self.report_refusal(&e);
                return Err(e);
            }
        };

        tracing::debug!("Generator started with pid {:?}", run.id());
        self.run = Some(run);
        self.run_started = Some(Instant::now());
        self.refusal = None;
        self.reducer.reset();
        self.metrics.record_invocation();
        // Drops the previous run's build-system diagnostics
        self.model.parsing_started();
        Ok(())
    }

    /// Report a start that did not happen. Diagnostics of the previous run
    /// stay until a generator actually starts.
    fn report_refusal(&mut self, error: &ControllerError) {
        tracing::error!("Generator start refused: {}", error);
        if let Some(previous) = self.refusal.take() {
            self.model.remove_diagnostic(&previous);
        }
        let diagnostic = Diagnostic::new(
            DiagnosticCategory::BuildSystem,
            Severity::Error,
            error.to_string(),
        );
        self.model.add_diagnostic(diagnostic.clone());
        self.refusal = Some(diagnostic);
    }

    /// Drain the running generator, then extract its metadata.
    ///
    /// Returns `None` when nothing is running. Cancel safe: output consumed
    /// before cancellation stays processed, and a later call picks up where
    /// this one stopped.
    pub async fn wait_for_generator(&mut self) -> Option<GeneratorExit> {
        let run = self.run.as_mut()?;

        while let Some(line) = run.next_line().await {
            let reduced = self.reducer.process_line(&line);
            tracing::info!(target: GENERATOR_LOG_TARGET, "{}", reduced.text);
            self.model.append_output(reduced.text);
            if let Some(diagnostic) = reduced.completed {
                self.model.add_diagnostic(diagnostic);
            }
        }

        let exit = match run.wait().await {
            Ok(exit) => exit,
            Err(e) => {
                tracing::warn!("Failed to wait for generator: {}", e);
                GeneratorExit::Crashed
            }
        };

        self.finish_run(exit);
        Some(exit)
    }

    fn finish_run(&mut self, exit: GeneratorExit) {
        if let Some(diagnostic) = self.reducer.flush() {
            self.model.add_diagnostic(diagnostic);
        }

        self.run = None;
        let duration = self.run_started.take().map(|t| t.elapsed()).unwrap_or_default();
        self.metrics.record_exit(exit, duration);

        // Even a failed run may have left usable metadata behind
        self.extract_data();

        let message = exit.message();
        self.model.append_output(message.clone());
        match exit {
            GeneratorExit::Success => tracing::info!("{}", message),
            _ => tracing::warn!("{}", message),
        }
        self.model.data_available();
    }

    /// Parse the metadata document and apply it to the model.
    ///
    /// On failure the previous model is kept and only the top-level project
    /// file stays watched, so editing it triggers another attempt.
    fn extract_data(&mut self) -> bool {
        let top_level = self.source_dir.join(TOP_LEVEL_PROJECT_FILE);

        let parsed = match self.metadata_file() {
            Some(path) => {
                MetadataParser::parse_file(&path, &self.source_dir).map_err(|e| e.to_string())
            }
            None => Err(format!("no metadata document in {}", self.build_dir)),
        };

        let mut project = match parsed {
            Ok(project) => project,
            Err(e) => {
                tracing::warn!("Keeping previous project model: {}", e);
                self.metrics.record_parse_failure();
                self.rearm_watches([top_level].into_iter().collect());
                return false;
            }
        };

        if !project.has_project_files() {
            project.project_files.push(FileNode::project_file(top_level));
        }
        let watch_set: WatchSet = project.project_files.iter().map(|f| f.path.clone()).collect();

        let manifest = DeploymentManifest::load(&self.source_dir);
        let (deployment, application_targets) = deployment_for_targets(
            &project.targets,
            &self.source_dir,
            &self.build_dir,
            manifest.as_ref(),
        );

        let result = ParseResult {
            project,
            build_type: read_build_type(&self.build_dir),
            deployment,
            application_targets,
        };
        let (report, _) = self.model.apply_parse(result);
        self.metrics.record_parse(&report);

        self.rearm_watches(watch_set);
        true
    }

    fn rearm_watches(&mut self, watch_set: WatchSet) {
        self.watch_set = watch_set;
        if let Err(e) = self.watcher.set_watched(&self.watch_set.to_vec()) {
            tracing::warn!("Failed to watch project files: {}", e);
        }
    }

    /// React to a change of a watched file: reparse unless a run is in flight.
    ///
    /// Returns whether a new run was started.
    pub fn handle_file_change(&mut self, path: &Utf8Path) -> bool {
        if !self.is_project_file(path) {
            return false;
        }
        if self.is_invoking() {
            tracing::debug!("Ignoring change of {} while the generator runs", path);
            return false;
        }

        tracing::info!("{} changed, reparsing", path);
        match self.force_reparse() {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!("Reparse after change of {} failed: {}", path, e);
                false
            }
        }
    }

    /// Drive the controller until `shutdown` turns true.
    ///
    /// Starts with [`request_parse`](Self::request_parse), then reacts to
    /// watched-file changes and generator completion. A run still in flight
    /// at shutdown is detached, not killed.
    pub async fn run(&mut self, mut shutdown: watch::Receiver<bool>) {
        if let Err(e) = self.request_parse() {
            tracing::warn!("Initial parse failed: {}", e);
        }

        let mut events = self.watch_events.take();

        loop {
            if *shutdown.borrow() {
                break;
            }

            let invoking = self.is_invoking();
            let has_events = events.is_some();

            tokio::select! {
                changed = shutdown.changed() => {
                    if changed.is_err() {
                        break;
                    }
                }
                path = recv_event(&mut events), if has_events => {
                    match path {
                        Some(path) => {
                            self.handle_file_change(&path);
                        }
                        None => {
                            tracing::debug!("Watch event channel closed");
                            events = None;
                        }
                    }
                }
                _ = self.wait_for_generator(), if invoking => {}
            }
        }

        self.watch_events = events;
        self.metrics.log_summary();
    }
}

async fn recv_event(
    events: &mut Option<mpsc::UnboundedReceiver<Utf8PathBuf>>,
) -> Option<Utf8PathBuf> {
    match events {
        Some(rx) => rx.recv().await,
        None => std::future::pending().await,
    }
}

impl Drop for BuildDirManager {
    fn drop(&mut self) {
        if let Some(run) = &self.run {
            tracing::debug!("Detaching from running generator (pid {:?})", run.id());
        }
    }
}

/// `path` made absolute against the working directory, without touching the
/// filesystem.
fn absolute_build_dir(path: &str) -> Result<Utf8PathBuf, ControllerError> {
    let unusable = |source: std::io::Error| ControllerError::BuildDirectory {
        path: Utf8PathBuf::from(path),
        source,
    };
    let absolute = std::path::absolute(path).map_err(unusable)?;
    let absolute = Utf8PathBuf::try_from(absolute).map_err(|e| unusable(e.into_io_error()))?;
    Ok(clean_path(&absolute))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::watch::MockWatchService;

    fn settings(build_dir: &Utf8Path) -> ProjectSettings {
        ProjectSettings {
            build_directory: build_dir.to_string(),
            ..ProjectSettings::default()
        }
    }

    fn utf8(dir: &TempDir) -> Utf8PathBuf {
        Utf8PathBuf::try_from(dir.path().to_path_buf()).unwrap()
    }

    fn manager(
        source: &Utf8Path,
        settings: &ProjectSettings,
        watcher: MockWatchService,
    ) -> BuildDirManager {
        let (_tx, rx) = mpsc::unbounded_channel();
        BuildDirManager::new(source, settings, Box::new(watcher), rx).unwrap()
    }

    const CBP: &str = r#"<?xml version="1.0"?>
<CodeBlocks_project_file><Project>
  <Option title="demo"/>
  <Build><Target title="app"><Option output="/b/app"/></Target></Build>
  <Unit filename="SRC/main.cpp"/>
  <Unit filename="SRC/CMakeLists.txt"><Option virtualFolder="CMake Files\"/></Unit>
</Project></CodeBlocks_project_file>"#;

    #[test]
    fn test_temporary_build_dir() {
        let source = TempDir::new().unwrap();
        let manager = manager(&utf8(&source), &ProjectSettings::default(), MockWatchService::new());

        let build_dir = manager.build_dir().to_path_buf();
        assert!(build_dir.file_name().unwrap().starts_with(TEMP_BUILD_DIR_PREFIX));
        assert!(build_dir.exists());

        drop(manager);
        assert!(!build_dir.exists());
    }

    #[test]
    fn test_initial_watch_set_is_top_level_file() {
        let source = TempDir::new().unwrap();
        let build = TempDir::new().unwrap();
        let manager = manager(&utf8(&source), &settings(&utf8(&build)), MockWatchService::new());

        assert!(manager.is_project_file(&utf8(&source).join("CMakeLists.txt")));
        assert_eq!(manager.project_name(), utf8(&source).file_name().unwrap());
        assert!(!manager.is_invoking());
    }

    #[test]
    fn test_up_to_date_metadata_is_extracted() {
        let source = TempDir::new().unwrap();
        let build = TempDir::new().unwrap();
        let source_dir = utf8(&source);
        let build_dir = utf8(&build);
        fs::write(
            build_dir.join("demo.cbp"),
            CBP.replace("SRC", source_dir.as_str()),
        )
        .unwrap();

        let mut watcher = MockWatchService::new();
        let expected = vec![source_dir.join("CMakeLists.txt")];
        watcher
            .expect_set_watched()
            .withf(move |paths| paths == expected.as_slice())
            .times(1)
            .returning(|_| Ok(()));

        let mut manager = manager(&source_dir, &settings(&build_dir), watcher);
        let mut events = manager.model().subscribe();

        assert_eq!(manager.request_parse().unwrap(), ParseDecision::UpToDate);
        assert!(!manager.is_invoking());
        assert_eq!(manager.project_name(), "demo");
        assert!(manager.model().contains_file(&source_dir.join("main.cpp")));

        let mut received = Vec::new();
        while let Ok(event) = events.try_recv() {
            received.push(event);
        }
        assert_eq!(received.last(), Some(&crate::state::ProjectEvent::DataAvailable));
    }

    #[test]
    fn test_parse_failure_keeps_model_and_watches_top_level() {
        let source = TempDir::new().unwrap();
        let build = TempDir::new().unwrap();
        let source_dir = utf8(&source);
        let build_dir = utf8(&build);
        fs::write(build_dir.join("demo.cbp"), CBP.replace("SRC", source_dir.as_str())).unwrap();

        let mut watcher = MockWatchService::new();
        watcher.expect_set_watched().times(2).returning(|_| Ok(()));
        let mut manager = manager(&source_dir, &settings(&build_dir), watcher);

        manager.request_parse().unwrap();
        fs::write(build_dir.join("demo.cbp"), "<CodeBlocks_project_file>").unwrap();
        assert!(!manager.extract_data());

        assert_eq!(manager.project_name(), "demo");
        assert!(manager.model().contains_file(&source_dir.join("main.cpp")));
        assert_eq!(manager.watch_set().to_vec(), vec![source_dir.join("CMakeLists.txt")]);
    }

    #[test]
    fn test_missing_executable_refused() {
        let source = TempDir::new().unwrap();
        let build = TempDir::new().unwrap();
        let mut settings = settings(&utf8(&build));
        settings.generator.executable = String::new();

        let mut manager = manager(&utf8(&source), &settings, MockWatchService::new());

        let result = manager.request_parse();
        assert!(matches!(result, Err(ControllerError::MissingExecutable)));
        assert!(!manager.is_invoking());
        assert_eq!(manager.model().snapshot().diagnostics.len(), 1);

        // Retrying does not stack up refusals
        assert!(manager.request_parse().is_err());
        assert!(manager.force_reparse().is_err());
        let diagnostics = manager.model().snapshot().diagnostics;
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].severity, Severity::Error);
    }

    #[test]
    fn test_relative_build_dir_made_absolute() {
        let source = TempDir::new().unwrap();
        let settings = ProjectSettings {
            build_directory: "out/../build".to_string(),
            ..ProjectSettings::default()
        };

        let manager = manager(&utf8(&source), &settings, MockWatchService::new());

        let cwd = Utf8PathBuf::try_from(std::env::current_dir().unwrap()).unwrap();
        assert!(manager.build_dir().is_absolute());
        assert_eq!(manager.build_dir(), cwd.join("build"));
        assert_eq!(manager.model().snapshot().build_dir, cwd.join("build"));
    }

    #[test]
    fn test_invalid_generator_name_refused() {
        let source = TempDir::new().unwrap();
        let build = TempDir::new().unwrap();
        let mut settings = settings(&utf8(&build));
        settings.generator.name = "Unix\nMakefiles".to_string();

        let mut manager = manager(&utf8(&source), &settings, MockWatchService::new());
        assert!(matches!(
            manager.force_reparse(),
            Err(ControllerError::InvalidGeneratorName(_))
        ));
    }

    #[tokio::test]
    async fn test_spawn_failure_reported() {
        let source = TempDir::new().unwrap();
        let build = TempDir::new().unwrap();
        let mut settings = settings(&utf8(&build));
        settings.generator.executable = "/definitely/not/a/generator".to_string();

        let mut manager = manager(&utf8(&source), &settings, MockWatchService::new());
        let earlier =
            Diagnostic::new(DiagnosticCategory::BuildSystem, Severity::Warning, "earlier");
        manager.model().add_diagnostic(earlier.clone());

        assert!(matches!(manager.force_reparse(), Err(ControllerError::Spawn { .. })));
        assert!(matches!(manager.force_reparse(), Err(ControllerError::Spawn { .. })));
        assert!(!manager.is_invoking());

        let diagnostics = manager.model().snapshot().diagnostics;
        assert_eq!(diagnostics.len(), 2);
        assert_eq!(diagnostics[0], earlier);
        assert_eq!(diagnostics[1].category, DiagnosticCategory::BuildSystem);
        assert_eq!(diagnostics[1].severity, Severity::Error);
        assert!(diagnostics[1].description.contains("/definitely/not/a/generator"));
    }

    #[test]
    fn test_change_of_unwatched_file_ignored() {
        let source = TempDir::new().unwrap();
        let build = TempDir::new().unwrap();
        let settings = settings(&utf8(&build));
        let mut manager = manager(&utf8(&source), &settings, MockWatchService::new());

        assert!(!manager.handle_file_change(Utf8Path::new("/somewhere/else.txt")));
        assert!(!manager.is_invoking());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_second_start_rejected_while_running() {
        let source = TempDir::new().unwrap();
        let build = TempDir::new().unwrap();
        let mut settings = settings(&utf8(&build));
        // `sleep <source dir>` fails quickly but not instantly
        settings.generator.executable = "/bin/sleep".to_string();
        settings.generator.name = String::new();

        let mut watcher = MockWatchService::new();
        watcher.expect_set_watched().returning(|_| Ok(()));
        let mut manager = manager(&utf8(&source), &settings, watcher);

        manager.force_reparse().unwrap();
        assert!(manager.is_invoking());
        assert!(matches!(manager.force_reparse(), Err(ControllerError::Busy)));
        assert!(matches!(manager.request_parse(), Err(ControllerError::Busy)));
        assert!(!manager.handle_file_change(&utf8(&source).join("CMakeLists.txt")));

        let exit = manager.wait_for_generator().await.unwrap();
        assert!(!exit.is_success());
        assert!(!manager.is_invoking());
        assert!(manager.wait_for_generator().await.is_none());
    }
}
