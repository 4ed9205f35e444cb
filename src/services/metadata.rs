//! CodeBlocks project file (`*.cbp`) parser.
//!
//! The generator describes targets, compiler settings and file membership in a
//! CodeBlocks project document in the build directory. The parser walks the
//! element stream once, front to back. Elements it does not understand are
//! skipped as a whole with a depth counter, so the sibling that follows is
//! read from the right position no matter how deeply the skipped element nests.

use crate::models::{BuildTarget, FileNode};
use crate::paths::{clean_path, relative_path};
use crate::services::assign::assign_files;
use camino::{Utf8Path, Utf8PathBuf};
use roxmltree::{Document, Node};
use std::collections::HashSet;
use std::fs;
use std::time::SystemTime;
use thiserror::Error;

/// Extension of the metadata document
pub const METADATA_EXTENSION: &str = "cbp";

/// Target titles with this suffix are dependency-only aliases
const FAST_TARGET_SUFFIX: &str = "/fast";

/// Units with this suffix are generator-internal rule files
const RULE_FILE_SUFFIX: &str = ".rule";

#[derive(Error, Debug)]
pub enum MetadataError {
    #[error("Failed to read metadata file {path}: {source}")]
    Io {
        path: Utf8PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed metadata document: {0}")]
    Malformed(#[from] roxmltree::Error),
}

/// Everything extracted from one metadata document
#[derive(Debug, Clone, Default)]
pub struct ParsedProject {
    pub project_name: String,
    pub compiler_name: String,
    pub targets: Vec<BuildTarget>,
    /// Ordinary project files, first occurrence order
    pub files: Vec<FileNode>,
    /// Files belonging to the build definition itself
    pub project_files: Vec<FileNode>,
}

impl ParsedProject {
    pub fn has_project_files(&self) -> bool {
        !self.project_files.is_empty()
    }
}

/// Locate the newest metadata document directly inside `build_dir`.
pub fn find_metadata_file(build_dir: &Utf8Path) -> Option<Utf8PathBuf> {
    let entries = build_dir.read_dir_utf8().ok()?;

    let mut newest: Option<(SystemTime, Utf8PathBuf)> = None;
    for entry in entries.flatten() {
        let path = entry.path();
        if path.extension() != Some(METADATA_EXTENSION) {
            continue;
        }
        let modified = entry
            .metadata()
            .and_then(|m| m.modified())
            .unwrap_or(SystemTime::UNIX_EPOCH);
        if newest.as_ref().is_none_or(|(time, _)| modified > *time) {
            newest = Some((modified, path.to_path_buf()));
        }
    }

    newest.map(|(_, path)| path)
}

/// Forward-only view over the element events of a document.
///
/// Holds one child iterator per open element; the top iterator belongs to
/// the innermost element whose start has been read.
struct ElementCursor<'a, 'input> {
    stack: Vec<roxmltree::Children<'a, 'input>>,
}

enum Token<'a, 'input> {
    Start(Node<'a, 'input>),
    End,
}

impl<'a, 'input> ElementCursor<'a, 'input> {
    fn new(document: &'a Document<'input>) -> Self {
        Self {
            stack: vec![document.root().children()],
        }
    }

    /// Next element start or end; text, comments and the document node are skipped.
    fn next(&mut self) -> Option<Token<'a, 'input>> {
        loop {
            let children = self.stack.last_mut()?;
            match children.next() {
                Some(node) if node.is_element() => {
                    self.stack.push(node.children());
                    return Some(Token::Start(node));
                }
                Some(_) => {}
                None => {
                    self.stack.pop();
                    // The document node itself has no end token
                    if self.stack.is_empty() {
                        return None;
                    }
                    return Some(Token::End);
                }
            }
        }
    }

    /// Consume the rest of the element whose start was just read.
    fn skip_element(&mut self) {
        let mut depth = 1usize;
        while depth > 0 {
            match self.next() {
                Some(Token::Start(_)) => depth += 1,
                Some(Token::End) => depth -= 1,
                None => return,
            }
        }
    }

    /// Yield the children of the current element, skipping none. Returns
    /// `None` once the current element's end is consumed.
    fn child(&mut self) -> Option<Node<'a, 'input>> {
        match self.next()? {
            Token::Start(node) => Some(node),
            Token::End => None,
        }
    }
}

/// Single-pass parser for the generator's metadata document.
pub struct MetadataParser {
    build_dir: Utf8PathBuf,
    source_dir: Utf8PathBuf,
    project: ParsedProject,
    current: BuildTarget,
    processed_units: HashSet<String>,
}

impl MetadataParser {
    /// `build_dir` is the directory holding the document, `source_dir` the
    /// project's source root.
    pub fn new(build_dir: impl Into<Utf8PathBuf>, source_dir: impl Into<Utf8PathBuf>) -> Self {
        Self {
            build_dir: build_dir.into(),
            source_dir: source_dir.into(),
            project: ParsedProject::default(),
            current: BuildTarget::default(),
            processed_units: HashSet::new(),
        }
    }

    /// Parse the document at `path`. Its directory is taken as the build directory.
    pub fn parse_file(
        path: &Utf8Path,
        source_dir: &Utf8Path,
    ) -> Result<ParsedProject, MetadataError> {
        let text = fs::read_to_string(path).map_err(|source| MetadataError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let build_dir = path.parent().unwrap_or(Utf8Path::new(""));

        let project = MetadataParser::new(build_dir, source_dir).parse_str(&text)?;
        tracing::debug!(
            "Parsed {}: {} targets, {} files, {} project files",
            path,
            project.targets.len(),
            project.files.len(),
            project.project_files.len()
        );
        Ok(project)
    }

    /// Parse a complete document. A malformed document fails as a whole.
    pub fn parse_str(mut self, text: &str) -> Result<ParsedProject, MetadataError> {
        let document = Document::parse(text)?;
        let mut cursor = ElementCursor::new(&document);

        while let Some(token) = cursor.next() {
            if let Token::Start(node) = token {
                if node.has_tag_name("CodeBlocks_project_file") {
                    self.parse_project_file(&mut cursor);
                } else {
                    cursor.skip_element();
                }
            }
        }

        let file_paths: Vec<Utf8PathBuf> =
            self.project.files.iter().map(|f| f.path.clone()).collect();
        assign_files(&mut self.project.targets, &file_paths);

        Ok(self.project)
    }

    fn parse_project_file(&mut self, cursor: &mut ElementCursor<'_, '_>) {
        while let Some(node) = cursor.child() {
            if node.has_tag_name("Project") {
                self.parse_project(cursor);
            } else {
                cursor.skip_element();
            }
        }
    }

    fn parse_project(&mut self, cursor: &mut ElementCursor<'_, '_>) {
        while let Some(node) = cursor.child() {
            match node.tag_name().name() {
                "Option" => {
                    if let Some(title) = node.attribute("title") {
                        self.project.project_name = title.to_string();
                    }
                    if let Some(compiler) = node.attribute("compiler") {
                        self.project.compiler_name = compiler.to_string();
                    }
                    cursor.skip_element();
                }
                "Build" => self.parse_build(cursor),
                "Unit" => self.parse_unit(node, cursor),
                _ => cursor.skip_element(),
            }
        }
    }

    fn parse_build(&mut self, cursor: &mut ElementCursor<'_, '_>) {
        while let Some(node) = cursor.child() {
            if node.has_tag_name("Target") {
                self.parse_target(node, cursor);
            } else {
                cursor.skip_element();
            }
        }
    }

    fn parse_target(&mut self, target: Node<'_, '_>, cursor: &mut ElementCursor<'_, '_>) {
        self.current = BuildTarget::new(target.attribute("title").unwrap_or_default());

        while let Some(node) = cursor.child() {
            match node.tag_name().name() {
                "Compiler" => self.parse_compiler(cursor),
                "Option" => {
                    self.parse_target_option(node);
                    cursor.skip_element();
                }
                "MakeCommands" => self.parse_make_commands(cursor),
                _ => cursor.skip_element(),
            }
        }

        let target = std::mem::take(&mut self.current);
        if target.title.ends_with(FAST_TARGET_SUFFIX) {
            tracing::trace!("Skipping dependency-only target {}", target.title);
        } else {
            self.project.targets.push(target);
        }
    }

    fn parse_target_option(&mut self, node: Node<'_, '_>) {
        if let Some(output) = node.attribute("output") {
            self.current.executable = Utf8PathBuf::from(output);
        } else if let Some(kind) = node.attribute("type") {
            // 2: static library, 3: shared library
            if kind == "2" || kind == "3" {
                self.current.is_library = true;
            }
        } else if let Some(working_dir) = node.attribute("working_dir") {
            let working_dir = Utf8PathBuf::from(working_dir);
            let relative = relative_path(&self.build_dir, &working_dir);
            self.current.source_directory = clean_path(&self.source_dir.join(relative));
            self.current.working_directory = working_dir;
        }
    }

    fn parse_make_commands(&mut self, cursor: &mut ElementCursor<'_, '_>) {
        while let Some(node) = cursor.child() {
            let command = node.attribute("command").map(str::to_string);
            match (node.tag_name().name(), command) {
                ("Build", Some(command)) => self.current.build_command = command,
                ("Clean", Some(command)) => self.current.clean_command = command,
                _ => {}
            }
            cursor.skip_element();
        }
    }

    fn parse_compiler(&mut self, cursor: &mut ElementCursor<'_, '_>) {
        while let Some(node) = cursor.child() {
            if node.has_tag_name("Add") {
                // Include order matters, so duplicates are kept
                if let Some(directory) = node.attribute("directory").filter(|d| !d.is_empty()) {
                    self.current.include_directories.push(Utf8PathBuf::from(directory));
                }
                if let Some(option) = node.attribute("option") {
                    self.current.add_compiler_option(option);
                }
            }
            cursor.skip_element();
        }
    }

    fn parse_unit(&mut self, unit: Node<'_, '_>, cursor: &mut ElementCursor<'_, '_>) {
        let file_name = unit
            .attribute("filename")
            .filter(|name| !name.is_empty())
            .map(|name| self.resolve_unit(name))
            .unwrap_or_default();
        let mut is_project_file = false;

        while let Some(node) = cursor.child() {
            if node.has_tag_name("Option") && node.has_attribute("virtualFolder") {
                is_project_file = true;
            }
            cursor.skip_element();
        }

        if file_name.is_empty()
            || file_name.ends_with(RULE_FILE_SUFFIX)
            || !self.processed_units.insert(file_name.clone())
        {
            return;
        }

        if is_project_file {
            self.project.project_files.push(FileNode::project_file(file_name));
        } else {
            self.project.files.push(FileNode::from_path(file_name));
        }
    }

    /// Unit paths relative to the document are taken from the source root.
    fn resolve_unit(&self, name: &str) -> String {
        let path = Utf8Path::new(name);
        if path.is_absolute() {
            name.to_string()
        } else {
            clean_path(&self.source_dir.join(path)).into_string()
        }
    }
}
