use crate::models::{FileNode, FolderNode};
use camino::{Utf8Path, Utf8PathBuf};
use std::cmp::Ordering;

/// Paths touched by one reconciliation pass
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReconcileReport {
    pub added: Vec<Utf8PathBuf>,
    pub removed: Vec<Utf8PathBuf>,
}

impl ReconcileReport {
    pub fn is_unchanged(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty()
    }
}

/// Update the live tree under `root` so that it holds exactly the files in
/// `new_files`.
///
/// Nodes whose path is already present stay untouched, even if the new list
/// classifies them differently. Missing folders are created on the way down;
/// folders emptied by removals are pruned up to, but never including, `root`.
pub fn reconcile_tree(root: &mut FolderNode, new_files: Vec<FileNode>) -> ReconcileReport {
    let mut old_paths: Vec<Utf8PathBuf> = root
        .collect_files()
        .into_iter()
        .map(|f| f.path.clone())
        .collect();
    old_paths.sort();

    let mut new_files = new_files;
    new_files.sort_by(|a, b| a.path.cmp(&b.path));
    new_files.dedup_by(|a, b| a.path == b.path);

    let mut added = Vec::new();
    let mut removed = Vec::new();

    let mut old_iter = old_paths.into_iter().peekable();
    let mut new_iter = new_files.into_iter().peekable();
    loop {
        let ordering = match (old_iter.peek(), new_iter.peek()) {
            (None, None) => break,
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (Some(old), Some(new)) => old.as_path().cmp(new.path.as_path()),
        };
        match ordering {
            Ordering::Less => removed.extend(old_iter.next()),
            Ordering::Greater => added.extend(new_iter.next()),
            Ordering::Equal => {
                // Already live; the freshly parsed duplicate is dropped
                old_iter.next();
                new_iter.next();
            }
        }
    }

    let mut report = ReconcileReport::default();

    for file in added {
        let directory = file.path.parent().unwrap_or(Utf8Path::new("")).to_path_buf();
        report.added.push(file.path.clone());
        root.find_or_create_folder(&directory).add_file(file);
    }

    for path in removed {
        if root.remove_file(&path).is_some() {
            report.removed.push(path);
        }
    }

    if !report.is_unchanged() {
        tracing::debug!(
            "Reconciled project tree: {} added, {} removed",
            report.added.len(),
            report.removed.len()
        );
    }

    report
}
