// Lexical path helpers; nothing here touches the filesystem.

use camino::{Utf8Component, Utf8Path, Utf8PathBuf};

/// Resolve `.` and `..` components without consulting the filesystem.
pub fn clean_path(path: &Utf8Path) -> Utf8PathBuf {
    let mut result = Utf8PathBuf::new();
    for component in path.components() {
        match component {
            Utf8Component::CurDir => {}
            Utf8Component::ParentDir => {
                let at_anchor = matches!(
                    result.components().next_back(),
                    None | Some(
                        Utf8Component::RootDir
                            | Utf8Component::Prefix(_)
                            | Utf8Component::ParentDir
                    )
                );
                if at_anchor {
                    if !result.has_root() {
                        result.push("..");
                    }
                } else {
                    result.pop();
                }
            }
            other => result.push(other),
        }
    }
    result
}

/// Path of `path` relative to `base`, using `..` where needed.
///
/// Returns an empty path when both are the same directory.
pub fn relative_path(base: &Utf8Path, path: &Utf8Path) -> Utf8PathBuf {
    let base = clean_path(base);
    let path = clean_path(path);

    let base_parts: Vec<_> = base.components().collect();
    let path_parts: Vec<_> = path.components().collect();
    let common = base_parts
        .iter()
        .zip(&path_parts)
        .take_while(|(a, b)| a == b)
        .count();

    let mut result = Utf8PathBuf::new();
    for _ in common..base_parts.len() {
        result.push("..");
    }
    for part in &path_parts[common..] {
        result.push(part);
    }
    result
}
