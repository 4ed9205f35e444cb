//! Deployment data derived from the parsed targets.
//!
//! Every target with an executable deploys it below the manifest prefix,
//! mirroring its location relative to the build directory. An optional
//! manifest (`QtCreatorDeployment.txt` in the source directory) adds more
//! files: its first line is the prefix, every further `source:destination`
//! line deploys one source-relative file.

use crate::models::BuildTarget;
use crate::paths::relative_path;
use camino::{Utf8Path, Utf8PathBuf};
use std::fs;

/// Name of the optional deployment manifest in the source directory
pub const DEPLOYMENT_MANIFEST: &str = "QtCreatorDeployment.txt";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeployableKind {
    Executable,
    Normal,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeployableFile {
    pub local_path: Utf8PathBuf,
    pub remote_directory: String,
    pub kind: DeployableKind,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeploymentData {
    pub files: Vec<DeployableFile>,
}

impl DeploymentData {
    pub fn add_file(
        &mut self,
        local_path: impl Into<Utf8PathBuf>,
        remote_directory: impl Into<String>,
        kind: DeployableKind,
    ) {
        self.files.push(DeployableFile {
            local_path: local_path.into(),
            remote_directory: remote_directory.into(),
            kind,
        });
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

/// A runnable target, as offered to run configurations
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApplicationTarget {
    pub title: String,
    pub executable: Utf8PathBuf,
}

/// Parsed deployment manifest
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeploymentManifest {
    /// Always ends with `/` unless the manifest was absent
    pub prefix: String,
    /// `(source-relative path, destination)` pairs
    pub entries: Vec<(String, String)>,
}

impl DeploymentManifest {
    pub fn parse(contents: &str) -> Self {
        let mut lines = contents.lines();
        let mut prefix = lines.next().unwrap_or_default().trim_end().to_string();
        if !prefix.ends_with('/') {
            prefix.push('/');
        }

        let entries = lines
            .filter_map(|line| line.split_once(':'))
            .map(|(source, destination)| (source.to_string(), destination.trim_end().to_string()))
            .collect();

        Self { prefix, entries }
    }

    /// Read the manifest from `source_dir`, if there is one.
    pub fn load(source_dir: &Utf8Path) -> Option<Self> {
        let path = source_dir.join(DEPLOYMENT_MANIFEST);
        match fs::read_to_string(&path) {
            Ok(contents) => Some(Self::parse(&contents)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => None,
            Err(e) => {
                tracing::warn!("Failed to read deployment manifest {}: {}", path, e);
                None
            }
        }
    }
}

/// Deployment data and runnable targets for the current target list.
pub fn deployment_for_targets(
    targets: &[BuildTarget],
    source_dir: &Utf8Path,
    build_dir: &Utf8Path,
    manifest: Option<&DeploymentManifest>,
) -> (DeploymentData, Vec<ApplicationTarget>) {
    let prefix = manifest.map(|m| m.prefix.as_str()).unwrap_or_default();

    let mut data = DeploymentData::default();
    let mut applications = Vec::new();

    for target in targets.iter().filter(|t| !t.executable.as_str().is_empty()) {
        let executable_dir = target.executable.parent().unwrap_or(Utf8Path::new(""));
        let remote = format!("{}{}", prefix, relative_path(build_dir, executable_dir));
        data.add_file(target.executable.clone(), remote, DeployableKind::Executable);

        if !target.is_library {
            applications.push(ApplicationTarget {
                title: target.title.clone(),
                executable: target.executable.clone(),
            });
        }
    }

    if let Some(manifest) = manifest {
        for (source, destination) in &manifest.entries {
            data.add_file(
                source_dir.join(source),
                format!("{}{}", prefix, destination),
                DeployableKind::Normal,
            );
        }
    }

    (data, applications)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn target(title: &str, executable: &str, is_library: bool) -> BuildTarget {
        let mut t = BuildTarget::new(title);
        t.executable = Utf8PathBuf::from(executable);
        t.is_library = is_library;
        t
    }

    #[test]
    fn test_manifest_parse() {
        let manifest =
            DeploymentManifest::parse("/opt/app\nshare/icon.png:share/icons\nno separator\n");
        assert_eq!(manifest.prefix, "/opt/app/");
        assert_eq!(
            manifest.entries,
            vec![("share/icon.png".to_string(), "share/icons".to_string())]
        );
    }

    #[test]
    fn test_manifest_prefix_already_terminated() {
        let manifest = DeploymentManifest::parse("/opt/app/\n");
        assert_eq!(manifest.prefix, "/opt/app/");
        assert!(manifest.entries.is_empty());
    }

    #[test]
    fn test_deployment_without_manifest() {
        let targets = vec![
            target("app", "/b/bin/app", false),
            target("core", "/b/lib/libcore.so", true),
            target("docs", "", false),
        ];

        let (data, apps) =
            deployment_for_targets(&targets, Utf8Path::new("/s"), Utf8Path::new("/b"), None);

        assert_eq!(data.files.len(), 2);
        assert_eq!(data.files[0].remote_directory, "bin");
        assert_eq!(data.files[0].kind, DeployableKind::Executable);
        assert_eq!(data.files[1].remote_directory, "lib");
        assert_eq!(apps.len(), 1);
        assert_eq!(apps[0].title, "app");
    }

    #[test]
    fn test_deployment_with_manifest() {
        let manifest = DeploymentManifest::parse("/opt\nconf/app.ini:etc\n");
        let targets = vec![target("app", "/b/app", false)];

        let (data, _) = deployment_for_targets(
            &targets,
            Utf8Path::new("/s"),
            Utf8Path::new("/b"),
            Some(&manifest),
        );

        assert_eq!(data.files[0].remote_directory, "/opt/");
        assert_eq!(data.files[1].local_path, Utf8PathBuf::from("/s/conf/app.ini"));
        assert_eq!(data.files[1].remote_directory, "/opt/etc");
        assert_eq!(data.files[1].kind, DeployableKind::Normal);
    }

    #[test]
    fn test_load_missing_manifest() {
        let dir = tempfile::TempDir::new().unwrap();
        let source = Utf8PathBuf::try_from(dir.path().to_path_buf()).unwrap();
        assert!(DeploymentManifest::load(&source).is_none());

        fs::write(source.join(DEPLOYMENT_MANIFEST), "/target\n").unwrap();
        assert_eq!(DeploymentManifest::load(&source).unwrap().prefix, "/target/");
    }
}
