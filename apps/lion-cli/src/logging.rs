//! Console and file log sinks.

use chrono::Local;
use lion_sim::LogConfig;
use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, registry};

/// Timestamped log file name inside `dir`.
pub fn log_file_path(dir: &Path) -> PathBuf {
    dir.join(format!("{}.txt", Local::now().format("%Y%m%d_%H%M%S")))
}

fn open_log_file(dir: &Path) -> std::io::Result<(File, PathBuf)> {
    std::fs::create_dir_all(dir)?;
    let path = log_file_path(dir);
    let file = File::create(&path)?;
    Ok((file, path))
}

/// Install the global subscriber. Returns the log file path when a file sink
/// was opened. A file that cannot be opened is reported on the console and
/// logging continues without it.
pub fn init(config: &LogConfig) -> Option<PathBuf> {
    let console = fmt::layer()
        .with_target(false)
        .with_writer(std::io::stderr)
        .with_filter(LevelFilter::from_level(config.console_level.into()));

    let mut failure = None;
    let mut opened = None;
    let file_layer = config.dir.as_deref().and_then(|dir| match open_log_file(dir) {
        Ok((file, path)) => {
            opened = Some(path);
            Some(
                fmt::layer()
                    .with_ansi(false)
                    .with_writer(Mutex::new(file))
                    .with_filter(LevelFilter::from_level(config.file_level.into())),
            )
        }
        Err(e) => {
            failure = Some((dir.to_path_buf(), e));
            None
        }
    });

    registry().with(console).with(file_layer).init();

    if let Some((dir, e)) = failure {
        tracing::warn!(dir = %dir.display(), error = %e, "could not open log file, logging to console only");
    }
    if let Some(path) = &opened {
        tracing::debug!(path = %path.display(), "logging to file");
    }
    opened
}
