//! cmakesync - keeps a CMake project model in sync with its generator
//!
//! Main entry point for the command line tool.
//!
//! # Overview
//!
//! This binary initializes:
//! - Logging infrastructure (file rotation + optional console output)
//! - Tokio async runtime (subprocess execution and file watching)
//! - Configuration loading ([`ConfigManager`])
//! - The build directory controller ([`BuildDirManager`])
//!
//! # Execution Flow
//!
//! 1. Parse the command line
//! 2. Load `cmakesync.yaml` from the configuration directory
//! 3. Initialize logging from its `Logging` section
//! 4. Create the controller with a native file watcher
//! 5. Either parse once (running the generator if needed) and print a
//!    summary, or with `--watch` keep reparsing on project file changes
//!    until Ctrl-C

use anyhow::{Context, Result};
use camino::Utf8PathBuf;
use clap::Parser;
use cmakesync::services::NotifyWatchService;
use cmakesync::{APP_NAME, BuildDirManager, ConfigManager, ProjectState, VERSION};
use tokio::sync::watch;

#[derive(Parser)]
#[command(name = "cmakesync")]
#[command(about = "Keep a CMake project model in sync with its generator", version)]
struct Cli {
    /// Project source directory (containing the top-level CMakeLists.txt)
    #[arg(short, long, default_value = ".")]
    source: Utf8PathBuf,

    /// Directory holding cmakesync.yaml
    #[arg(short, long, default_value = ".")]
    config_dir: Utf8PathBuf,

    /// Build directory, overriding the settings file
    #[arg(short, long)]
    build: Option<Utf8PathBuf>,

    /// Keep running and reparse whenever a project file changes
    #[arg(short, long)]
    watch: bool,

    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let config_manager = ConfigManager::new(&cli.config_dir)?;
    let mut settings = config_manager.load_settings()?;
    if let Some(build) = &cli.build {
        settings.build_directory = build.to_string();
    }

    // Held until the end of main so buffered log lines are flushed
    let _log_guard = cmakesync::logging::setup_logging(&settings.logging, cli.debug)?;

    tracing::info!("Starting {} v{}", APP_NAME, VERSION);

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .thread_name("cmakesync-worker")
        .build()
        .context("Failed to create tokio runtime")?;

    let source_dir = cli
        .source
        .canonicalize_utf8()
        .with_context(|| format!("Source directory not found: {}", cli.source))?;

    runtime.block_on(async move {
        let (watcher, watch_events) =
            NotifyWatchService::new().context("Failed to create file watcher")?;
        let mut manager =
            BuildDirManager::new(source_dir, &settings, Box::new(watcher), watch_events)?;

        if cli.watch {
            let (shutdown_tx, shutdown_rx) = watch::channel(false);
            tokio::spawn(async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    tracing::info!("Ctrl-C received, shutting down");
                }
                let _ = shutdown_tx.send(true);
            });
            manager.run(shutdown_rx).await;
        } else {
            manager.request_parse()?;
            manager.wait_for_generator().await;
            manager.metrics().log_summary();
        }

        print_summary(&manager.model().snapshot());
        Ok::<_, anyhow::Error>(())
    })?;

    tracing::info!("Shutdown complete");
    Ok(())
}

fn print_summary(state: &ProjectState) {
    println!("Project: {}", state.project_name);
    println!("Build directory: {}", state.build_dir);
    println!("Build type: {:?}", state.build_type);

    println!("Targets:");
    for target in &state.targets {
        let kind = if target.is_library {
            "library"
        } else if target.is_runnable() {
            "executable"
        } else {
            "utility"
        };
        println!("  {} ({}, {} files)", target.title, kind, target.files.len());
    }

    println!("Files: {}", state.files.len());
    for diagnostic in &state.diagnostics {
        println!("{:?}: {}", diagnostic.severity, diagnostic.description);
    }
}
