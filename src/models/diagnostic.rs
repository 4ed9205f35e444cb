use camino::Utf8PathBuf;

/// Where a diagnostic came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DiagnosticCategory {
    /// Generator (build system configuration) output
    BuildSystem,
    Compile,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Error,
    Warning,
}

/// A user-visible problem report, possibly spanning several output lines.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub category: DiagnosticCategory,
    pub severity: Severity,
    pub description: String,
    pub file: Option<Utf8PathBuf>,
    pub line: Option<u32>,
}

impl Diagnostic {
    pub fn new(
        category: DiagnosticCategory,
        severity: Severity,
        description: impl Into<String>,
    ) -> Self {
        Self {
            category,
            severity,
            description: description.into(),
            file: None,
            line: None,
        }
    }
}
