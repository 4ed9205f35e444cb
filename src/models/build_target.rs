use camino::Utf8PathBuf;

/// One buildable unit reported by the generator.
///
/// Targets are rebuilt from scratch on every parse and never patched
/// incrementally.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BuildTarget {
    pub title: String,
    pub executable: Utf8PathBuf,
    pub is_library: bool,
    pub working_directory: Utf8PathBuf,
    /// Source location recovered from `working_directory`
    pub source_directory: Utf8PathBuf,
    /// Include paths in command line order, duplicates allowed
    pub include_directories: Vec<Utf8PathBuf>,
    /// `#define NAME VALUE` lines derived from `-D` compiler options
    pub defines: Vec<String>,
    pub compiler_options: Vec<String>,
    pub build_command: String,
    pub clean_command: String,
    pub files: Vec<Utf8PathBuf>,
}

impl BuildTarget {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Self::default()
        }
    }

    /// Targets with an executable that is not a library can be run
    pub fn is_runnable(&self) -> bool {
        !self.executable.as_str().is_empty() && !self.is_library
    }

    /// All defines as one preprocessor block, one per line
    pub fn defines_block(&self) -> String {
        let mut block = String::new();
        for define in &self.defines {
            block.push_str(define);
            block.push('\n');
        }
        block
    }

    /// Record a compiler option, deriving a define from `-DNAME[=VALUE]`.
    ///
    /// Options already recorded verbatim are ignored.
    pub fn add_compiler_option(&mut self, option: &str) {
        if option.is_empty() || self.compiler_options.iter().any(|o| o == option) {
            return;
        }
        self.compiler_options.push(option.to_string());

        if let Some(macro_def) = option.strip_prefix("-D").filter(|m| !m.is_empty()) {
            let define = match macro_def.split_once('=') {
                Some((name, value)) => format!("#define {} {}", name, value),
                None => format!("#define {}", macro_def),
            };
            self.defines.push(define);
        }
    }
}

/// Build configuration class read from the generator's cache
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BuildType {
    Release,
    Debug,
    Profile,
    #[default]
    Unknown,
}

impl BuildType {
    /// Classify a `CMAKE_BUILD_TYPE` value, case-insensitively.
    pub fn from_cache_value(value: &str) -> Self {
        let value = value.trim();
        let is = |name: &str| value.eq_ignore_ascii_case(name);

        if is("Release") || is("MinSizeRel") {
            BuildType::Release
        } else if is("Debug") || is("DebugFull") {
            BuildType::Debug
        } else if is("RelWithDebInfo") {
            BuildType::Profile
        } else {
            BuildType::Unknown
        }
    }
}
