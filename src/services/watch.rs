//! Watched project-definition files.
//!
//! A [`WatchSet`] is recomputed from scratch after every parse and handed to a
//! [`WatchService`], which replaces whatever it watched before. The controller
//! only sees the service through the trait; [`NotifyWatchService`] backs it
//! with a native file system watcher and reports changed paths on a channel.

use camino::{Utf8Path, Utf8PathBuf};
use notify::{Config, Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use std::collections::BTreeSet;
use std::fs;
use std::time::SystemTime;
use thiserror::Error;
use tokio::sync::mpsc;

#[derive(Error, Debug)]
pub enum WatchError {
    #[error("Failed to create watcher: {0}")]
    WatcherCreation(#[from] notify::Error),

    #[error("Failed to watch path {path}: {source}")]
    WatchPath {
        path: Utf8PathBuf,
        #[source]
        source: notify::Error,
    },
}

/// Input files whose modification times gate staleness
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WatchSet {
    paths: BTreeSet<Utf8PathBuf>,
}

impl WatchSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, path: impl Into<Utf8PathBuf>) {
        self.paths.insert(path.into());
    }

    pub fn contains(&self, path: &Utf8Path) -> bool {
        self.paths.contains(path)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Utf8PathBuf> {
        self.paths.iter()
    }

    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    pub fn to_vec(&self) -> Vec<Utf8PathBuf> {
        self.paths.iter().cloned().collect()
    }

    /// Most recent modification time among the watched files that exist
    pub fn newest_modification(&self) -> Option<SystemTime> {
        self.paths
            .iter()
            .filter_map(|path| fs::metadata(path).and_then(|m| m.modified()).ok())
            .max()
    }

    /// Whether any watched file was modified after `time`
    pub fn is_newer_than(&self, time: SystemTime) -> bool {
        self.newest_modification().is_some_and(|newest| newest > time)
    }
}

impl FromIterator<Utf8PathBuf> for WatchSet {
    fn from_iter<I: IntoIterator<Item = Utf8PathBuf>>(iter: I) -> Self {
        Self {
            paths: iter.into_iter().collect(),
        }
    }
}

/// File watching seam of the controller
#[cfg_attr(test, mockall::automock)]
pub trait WatchService: Send {
    /// Replace the watched paths with exactly `paths`
    fn set_watched(&mut self, paths: &[Utf8PathBuf]) -> Result<(), WatchError>;
}

/// [`WatchService`] backed by the platform's native watcher.
///
/// Every modification, creation or removal of a watched path is sent on the
/// channel returned by [`NotifyWatchService::new`].
pub struct NotifyWatchService {
    watcher: RecommendedWatcher,
    watched: Vec<Utf8PathBuf>,
}

impl NotifyWatchService {
    pub fn new() -> Result<(Self, mpsc::UnboundedReceiver<Utf8PathBuf>), WatchError> {
        let (tx, rx) = mpsc::unbounded_channel();

        let watcher = RecommendedWatcher::new(
            move |res: Result<Event, notify::Error>| match res {
                Ok(event) => {
                    if !matches!(
                        event.kind,
                        EventKind::Modify(_) | EventKind::Create(_) | EventKind::Remove(_)
                    ) {
                        return;
                    }
                    for path in event.paths {
                        if let Ok(path) = Utf8PathBuf::try_from(path) {
                            let _ = tx.send(path);
                        }
                    }
                }
                Err(e) => tracing::warn!("File watcher error: {}", e),
            },
            Config::default(),
        )?;

        Ok((
            Self {
                watcher,
                watched: Vec::new(),
            },
            rx,
        ))
    }
}

impl WatchService for NotifyWatchService {
    fn set_watched(&mut self, paths: &[Utf8PathBuf]) -> Result<(), WatchError> {
        for path in self.watched.drain(..) {
            if let Err(e) = self.watcher.unwatch(path.as_std_path()) {
                tracing::debug!("Failed to unwatch {}: {}", path, e);
            }
        }

        // Keep going past a failing path; the first failure is reported
        let mut first_error = None;
        for path in paths {
            match self.watcher.watch(path.as_std_path(), RecursiveMode::NonRecursive) {
                Ok(()) => self.watched.push(path.clone()),
                Err(e) => {
                    first_error.get_or_insert(WatchError::WatchPath {
                        path: path.clone(),
                        source: e,
                    });
                }
            }
        }

        tracing::debug!("Watching {} project files", self.watched.len());
        first_error.map_or(Ok(()), Err)
    }
}
