use crate::models::BuildTarget;
use camino::{Utf8Path, Utf8PathBuf};
use std::collections::HashSet;

/// Attribute files to the build target whose source directory contains them
/// most specifically.
///
/// Files already listed by some target are left alone. The rest are visited
/// in path order; a file in the same directory as the previously assigned one
/// goes to the same target without searching again. Files no target contains
/// fall back to the first target. Among targets with equally long matching
/// source directories the first one in `targets` wins.
pub fn assign_files(targets: &mut [BuildTarget], files: &[Utf8PathBuf]) {
    if targets.is_empty() {
        return;
    }

    let attributed: HashSet<Utf8PathBuf> = targets
        .iter()
        .flat_map(|t| t.files.iter().cloned())
        .collect();

    let mut pending: Vec<&Utf8PathBuf> =
        files.iter().filter(|f| !attributed.contains(*f)).collect();
    pending.sort_by(|a, b| a.as_str().cmp(b.as_str()));
    pending.dedup();

    let mut last: Option<usize> = None;
    let mut parent_directory: Option<&Utf8Path> = None;

    for file in pending {
        let parent = file.parent();
        let index = match last {
            Some(index) if parent.is_some() && parent == parent_directory => index,
            _ => best_target_for(targets, file).unwrap_or(0),
        };

        targets[index].files.push(file.clone());
        last = Some(index);
        parent_directory = parent;
    }
}

fn best_target_for(targets: &[BuildTarget], file: &Utf8Path) -> Option<usize> {
    let mut best: Option<(usize, usize)> = None;
    for (index, target) in targets.iter().enumerate() {
        let source = target.source_directory.as_path();
        if source.as_str().is_empty() || file == source || !file.starts_with(source) {
            continue;
        }
        let length = source.as_str().len();
        if best.is_none_or(|(_, best_length)| length > best_length) {
            best = Some((index, length));
        }
    }
    best.map(|(index, _)| index)
}
