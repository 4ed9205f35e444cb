//! Generator subprocess handling.
//!
//! Builds the command line, spawns the generator in the build directory and
//! streams its output back line by line. Standard output and standard error
//! are merged at the OS level into a single stream in write order.
//!
//! [`OutputReducer`] turns that line stream into [`Diagnostic`]s: a line
//! starting with `CMake Error`/`CMake Warning` opens a diagnostic, indented or
//! empty lines continue it and any other line closes it.

use crate::models::{ConfigSet, Diagnostic, DiagnosticCategory, Severity};
use camino::{Utf8Path, Utf8PathBuf};
use indexmap::IndexMap;
use regex::Regex;
use os_pipe::PipeReader;
use std::io::{BufRead, BufReader};
use std::process::{ExitStatus, Stdio};
use tokio::process::{Child, Command};
use tokio::sync::mpsc;

/// Everything needed to start one generator run
#[derive(Debug, Clone)]
pub struct GeneratorCommand {
    pub executable: Utf8PathBuf,
    pub source_dir: Utf8PathBuf,
    pub build_dir: Utf8PathBuf,
    /// Passed as `-G<name>`; omitted when empty
    pub generator_name: String,
    pub config: ConfigSet,
    /// Applied on top of the inherited environment
    pub environment: IndexMap<String, String>,
}

impl GeneratorCommand {
    /// Argument list: `<source> [-G<name>] <-D entries>`
    pub fn arguments(&self) -> Vec<String> {
        generator_arguments(&self.source_dir, &self.generator_name, &self.config)
    }
}

/// Render the generator argument list.
///
/// The source directory always comes first so the invocation never depends
/// on the contents of the build directory.
pub fn generator_arguments(
    source_dir: &Utf8Path,
    generator_name: &str,
    config: &ConfigSet,
) -> Vec<String> {
    let mut args = Vec::with_capacity(config.len() + 2);
    args.push(source_dir.to_string());
    if !generator_name.is_empty() {
        args.push(format!("-G{}", generator_name));
    }
    args.extend(config.to_arguments());
    args
}

/// How a generator run ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GeneratorExit {
    Success,
    Failed(i32),
    /// Terminated by a signal or otherwise without an exit code
    Crashed,
}

impl GeneratorExit {
    pub fn from_status(status: ExitStatus) -> Self {
        match status.code() {
            Some(0) => GeneratorExit::Success,
            Some(code) => GeneratorExit::Failed(code),
            None => GeneratorExit::Crashed,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, GeneratorExit::Success)
    }

    /// Message written to the output log once the run is over
    pub fn message(&self) -> String {
        match self {
            GeneratorExit::Success => "*** generator finished successfully.".to_string(),
            GeneratorExit::Failed(code) => format!("*** generator exited with exit code {}.", code),
            GeneratorExit::Crashed => "*** generator process crashed!".to_string(),
        }
    }
}

/// A running generator process and its merged output stream
#[derive(Debug)]
pub struct GeneratorRun {
    child: Child,
    lines: mpsc::UnboundedReceiver<String>,
}

impl GeneratorRun {
    /// Next output line, or `None` once the output stream is closed.
    ///
    /// Cancel safe.
    pub async fn next_line(&mut self) -> Option<String> {
        self.lines.recv().await
    }

    /// Wait for the process to exit. Call after `next_line` returned `None`
    /// to be sure no output is lost.
    ///
    /// Cancel safe.
    pub async fn wait(&mut self) -> std::io::Result<GeneratorExit> {
        let status = self.child.wait().await?;
        Ok(GeneratorExit::from_status(status))
    }

    pub fn id(&self) -> Option<u32> {
        self.child.id()
    }
}

/// Spawn the generator described by `command`.
///
/// Standard output and standard error share one pipe, so lines arrive in the
/// order the generator wrote them. The build directory must already exist.
pub fn spawn_generator(command: &GeneratorCommand) -> std::io::Result<GeneratorRun> {
    let args = command.arguments();
    tracing::info!(
        "Running {} {} in {}",
        command.executable,
        args.join(" "),
        command.build_dir
    );

    let (reader, writer) = os_pipe::pipe()?;
    let mut cmd = Command::new(command.executable.as_std_path());
    cmd.args(&args)
        .current_dir(command.build_dir.as_std_path())
        .envs(&command.environment)
        .stdin(Stdio::null())
        .stdout(writer.try_clone()?)
        .stderr(writer);

    let child = cmd.spawn()?;
    // Our copies of the write end must go so the stream ends with the child
    drop(cmd);

    let (tx, rx) = mpsc::unbounded_channel();
    tokio::task::spawn_blocking(move || forward_lines(reader, tx));

    Ok(GeneratorRun { child, lines: rx })
}

fn forward_lines(stream: PipeReader, tx: mpsc::UnboundedSender<String>) {
    let mut reader = BufReader::new(stream);
    let mut buffer = Vec::new();
    loop {
        buffer.clear();
        match reader.read_until(b'\n', &mut buffer) {
            Ok(0) => break,
            Ok(_) => {
                let line = String::from_utf8_lossy(&buffer).into_owned();
                if tx.send(line).is_err() {
                    break;
                }
            }
            Err(e) => {
                tracing::warn!("Failed to read generator output: {}", e);
                break;
            }
        }
    }
}

/// Strip every trailing newline variant
pub fn normalize_line(line: &str) -> &str {
    line.trim_end_matches(['\n', '\r'])
}

/// Result of feeding one output line to the reducer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReducedLine {
    /// The normalized line, for the output log
    pub text: String,
    /// A diagnostic this line completed
    pub completed: Option<Diagnostic>,
}

/// Folds generator output into build-system diagnostics
pub struct OutputReducer {
    source_dir: Utf8PathBuf,
    header_pattern: Regex,
    pending: Option<Diagnostic>,
}

impl OutputReducer {
    /// Relative locations in diagnostics are resolved against `source_dir`.
    pub fn new(source_dir: impl Into<Utf8PathBuf>) -> Self {
        Self {
            source_dir: source_dir.into(),
            header_pattern: Regex::new(concat!(
                r"^CMake (Error|Warning|Deprecation Warning)(?: \(dev\))?",
                r"(?: at (.+):(\d+) \([^)]*\))?",
            ))
            .expect("Invalid diagnostic header regex"),
            pending: None,
        }
    }

    /// Drop any half-built diagnostic
    pub fn reset(&mut self) {
        self.pending = None;
    }

    pub fn has_pending(&self) -> bool {
        self.pending.is_some()
    }

    pub fn process_line(&mut self, raw: &str) -> ReducedLine {
        let line = normalize_line(raw);

        let mut completed = None;
        if let Some(pending) = self.pending.as_mut() {
            if line.is_empty() || line.starts_with([' ', '\t']) {
                pending.description.push('\n');
                pending.description.push_str(line);
                return ReducedLine {
                    text: line.to_string(),
                    completed: None,
                };
            }
            completed = self.flush();
        }

        if let Some(caps) = self.header_pattern.captures(line) {
            let severity = if &caps[1] == "Error" {
                Severity::Error
            } else {
                Severity::Warning
            };
            let mut diagnostic = Diagnostic::new(DiagnosticCategory::BuildSystem, severity, line);
            if let (Some(file), Some(number)) = (caps.get(2), caps.get(3)) {
                let file = Utf8Path::new(file.as_str());
                diagnostic.file = Some(if file.is_absolute() {
                    file.to_path_buf()
                } else {
                    self.source_dir.join(file)
                });
                diagnostic.line = number.as_str().parse().ok();
            }
            self.pending = Some(diagnostic);
        }

        ReducedLine {
            text: line.to_string(),
            completed,
        }
    }

    /// Complete the pending diagnostic, if any. Trailing blank continuation
    /// lines are dropped from its description.
    pub fn flush(&mut self) -> Option<Diagnostic> {
        let mut diagnostic = self.pending.take()?;
        let trimmed = diagnostic.description.trim_end().len();
        diagnostic.description.truncate(trimmed);
        Some(diagnostic)
    }
}
