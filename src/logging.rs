use crate::models::LogSettings;
use anyhow::{Context, Result};
use camino::Utf8Path;
use std::fs;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Install the global subscriber described by the `Logging` settings section.
///
/// Events go to a daily rotating file `<directory>/<prefix>.<date>` and, when
/// `console` is set, to stderr as well. `RUST_LOG` takes precedence over the
/// configured level; `force_debug` raises the configured level to debug.
///
/// # Returns
/// A guard that must be held for the duration of the program to keep logging active
pub fn setup_logging(settings: &LogSettings, force_debug: bool) -> Result<WorkerGuard> {
    let log_dir = Utf8Path::new(&settings.directory);
    ensure_log_dir(log_dir)?;

    let (writer, guard) =
        tracing_appender::non_blocking(rolling::daily(log_dir, &settings.prefix));
    let debug_level = settings.debug_mode || force_debug;

    let file_layer = tracing_subscriber::fmt::layer()
        .with_writer(writer)
        .with_ansi(false)
        .with_target(true)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true);

    let console_layer = settings.console.then(|| {
        tracing_subscriber::fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(false)
    });

    tracing_subscriber::registry()
        .with(level_filter(debug_level))
        .with(file_layer)
        .with(console_layer)
        .try_init()
        .context("Failed to install tracing subscriber")?;

    tracing::info!(
        dir = %log_dir,
        prefix = %settings.prefix,
        debug = debug_level,
        console = settings.console,
        "Logging initialized"
    );
    Ok(guard)
}

/// `RUST_LOG` if set and valid, otherwise `debug` or `info`
fn level_filter(debug: bool) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(if debug { "debug" } else { "info" }))
}

fn ensure_log_dir(log_dir: &Utf8Path) -> Result<()> {
    if !log_dir.is_dir() {
        fs::create_dir_all(log_dir)
            .with_context(|| format!("Failed to create log directory: {}", log_dir))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use camino::Utf8PathBuf;
    use tempfile::TempDir;

    fn temp_log_dir(temp_dir: &TempDir) -> Utf8PathBuf {
        Utf8PathBuf::try_from(temp_dir.path().join("nested").join("logs")).unwrap()
    }

    #[test]
    fn test_log_directory_created() {
        let temp_dir = TempDir::new().unwrap();
        let log_dir = temp_log_dir(&temp_dir);

        ensure_log_dir(&log_dir).unwrap();
        // Existing directories are fine
        ensure_log_dir(&log_dir).unwrap();

        assert!(log_dir.is_dir());
    }

    #[test]
    fn test_setup_creates_directory() {
        let temp_dir = TempDir::new().unwrap();
        let settings = LogSettings {
            directory: temp_log_dir(&temp_dir).to_string(),
            console: false,
            ..LogSettings::default()
        };

        // Only the first subscriber per process installs; the directory is
        // created either way
        let _ = setup_logging(&settings, false);

        assert!(Utf8Path::new(&settings.directory).is_dir());
    }
}
