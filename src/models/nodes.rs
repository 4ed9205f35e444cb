//! Project tree nodes.
//!
//! [`FolderNode`]s form a tree rooted at the project source directory. Each
//! folder owns its subfolders and [`FileNode`]s, keyed by path. Folders left
//! without files and subfolders are pruned by their parent; the root is never
//! pruned.

use camino::{Utf8Path, Utf8PathBuf};
use std::collections::BTreeMap;

/// Closed classification of project files
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FileKind {
    Source,
    Header,
    Resource,
    Form,
    Qml,
    ProjectDefinition,
    Unknown,
}

const EXTENSION_TABLE: &[(&str, FileKind)] = &[
    ("c", FileKind::Source),
    ("cc", FileKind::Source),
    ("cpp", FileKind::Source),
    ("cxx", FileKind::Source),
    ("c++", FileKind::Source),
    ("cp", FileKind::Source),
    ("m", FileKind::Source),
    ("mm", FileKind::Source),
    ("h", FileKind::Header),
    ("hh", FileKind::Header),
    ("hpp", FileKind::Header),
    ("hxx", FileKind::Header),
    ("h++", FileKind::Header),
    ("inl", FileKind::Header),
    ("qrc", FileKind::Resource),
    ("ui", FileKind::Form),
    ("qml", FileKind::Qml),
    ("cmake", FileKind::ProjectDefinition),
];

impl FileKind {
    /// Classify by file name and extension
    pub fn classify(path: &Utf8Path) -> FileKind {
        if path.file_name() == Some("CMakeLists.txt") {
            return FileKind::ProjectDefinition;
        }

        let Some(extension) = path.extension() else {
            return FileKind::Unknown;
        };
        EXTENSION_TABLE
            .iter()
            .find(|(ext, _)| ext.eq_ignore_ascii_case(extension))
            .map(|(_, kind)| *kind)
            .unwrap_or(FileKind::Unknown)
    }
}

fn is_generated_name(file_name: &str) -> bool {
    (file_name.starts_with("moc_") && file_name.ends_with(".cxx"))
        || (file_name.starts_with("ui_") && file_name.ends_with(".h"))
        || (file_name.starts_with("qrc_") && file_name.ends_with(".cxx"))
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileNode {
    pub path: Utf8PathBuf,
    pub kind: FileKind,
    pub is_generated: bool,
}

impl FileNode {
    pub fn new(path: impl Into<Utf8PathBuf>, kind: FileKind, is_generated: bool) -> Self {
        Self {
            path: path.into(),
            kind,
            is_generated,
        }
    }

    /// Node for an arbitrary project file, classified by name
    pub fn from_path(path: impl Into<Utf8PathBuf>) -> Self {
        let path = path.into();
        let kind = FileKind::classify(&path);
        let is_generated = kind != FileKind::ProjectDefinition
            && path.file_name().is_some_and(is_generated_name);
        Self {
            path,
            kind,
            is_generated,
        }
    }

    /// Node for a build-definition file
    pub fn project_file(path: impl Into<Utf8PathBuf>) -> Self {
        Self::new(path, FileKind::ProjectDefinition, false)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FolderNode {
    pub path: Utf8PathBuf,
    pub display_name: String,
    folders: BTreeMap<Utf8PathBuf, FolderNode>,
    files: BTreeMap<Utf8PathBuf, FileNode>,
}

impl FolderNode {
    pub fn new(path: impl Into<Utf8PathBuf>, display_name: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            display_name: display_name.into(),
            folders: BTreeMap::new(),
            files: BTreeMap::new(),
        }
    }

    pub fn folders(&self) -> impl Iterator<Item = &FolderNode> {
        self.folders.values()
    }

    pub fn files(&self) -> impl Iterator<Item = &FileNode> {
        self.files.values()
    }

    pub fn folder(&self, path: &Utf8Path) -> Option<&FolderNode> {
        self.folders.get(path)
    }

    pub fn is_empty(&self) -> bool {
        self.folders.is_empty() && self.files.is_empty()
    }

    /// Depth-first collection of every file below this folder
    pub fn collect_files(&self) -> Vec<&FileNode> {
        let mut result = Vec::new();
        let mut stack = vec![self];
        while let Some(folder) = stack.pop() {
            stack.extend(folder.folders.values());
            result.extend(folder.files.values());
        }
        result
    }

    /// Find a file anywhere in this subtree
    pub fn find_file(&self, path: &Utf8Path) -> Option<&FileNode> {
        let mut folder = self;
        loop {
            if let Some(file) = folder.files.get(path) {
                return Some(file);
            }
            folder = folder.child_containing(path)?;
        }
    }

    /// Walk down from this folder to `directory`, creating missing folders.
    ///
    /// Directories that do not live below this folder get a single child
    /// folder named after their full path.
    pub fn find_or_create_folder(&mut self, directory: &Utf8Path) -> &mut FolderNode {
        let Ok(relative) = directory.strip_prefix(&self.path) else {
            return self
                .folders
                .entry(directory.to_path_buf())
                .or_insert_with(|| FolderNode::new(directory, directory.as_str()));
        };

        let mut folder = self;
        let mut path = folder.path.clone();
        for part in relative.components() {
            path.push(part);
            folder = folder
                .folders
                .entry(path.clone())
                .or_insert_with(|| FolderNode::new(path.clone(), part.as_str()));
        }
        folder
    }

    pub fn add_file(&mut self, file: FileNode) {
        self.files.insert(file.path.clone(), file);
    }

    /// Detach the file at `path` from the subtree and prune every folder
    /// that became empty on the way. This folder itself is never removed.
    pub fn remove_file(&mut self, path: &Utf8Path) -> Option<FileNode> {
        if let Some(file) = self.files.remove(path) {
            return Some(file);
        }

        let key = self.child_key_containing(path)?;
        let child = self.folders.get_mut(&key)?;
        let removed = child.remove_file(path);
        if child.is_empty() {
            self.folders.remove(&key);
        }
        removed
    }

    fn child_containing(&self, path: &Utf8Path) -> Option<&FolderNode> {
        let key = self.child_key_containing(path)?;
        self.folders.get(&key)
    }

    fn child_key_containing(&self, path: &Utf8Path) -> Option<Utf8PathBuf> {
        self.folders
            .keys()
            .filter(|folder| path.starts_with(folder.as_path()))
            .max_by_key(|folder| folder.as_str().len())
            .cloned()
    }
}
