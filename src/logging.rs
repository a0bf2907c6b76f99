//! Diagnostic stream setup.
//!
//! The interactive session owns the terminal, so diagnostics go to an
//! append-only log file under the user's cache directory. When that file
//! cannot be opened the subscriber writes to stderr instead, but only while
//! the terminal UI is not running; events during the session are discarded.

use std::fs::{self, File, OpenOptions};
use std::io::{self, Sink, Stderr};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use anyhow::{Context, Result};
use tracing_subscriber::fmt::writer::{EitherWriter, MakeWriter};
use tracing_subscriber::EnvFilter;

pub const LOG_ENV: &str = "GH_TRENDING_LOG";
pub const LOG_FILE_ENV: &str = "GH_TRENDING_LOG_FILE";
const DEFAULT_FILTER: &str = "info";

static TERMINAL_ACTIVE: AtomicBool = AtomicBool::new(false);

#[derive(Debug, Clone, Default)]
pub struct LogOptions {
    /// Overrides the log file location.
    pub file: Option<PathBuf>,
}

impl LogOptions {
    pub fn from_env() -> Self {
        Self {
            file: std::env::var_os(LOG_FILE_ENV)
                .filter(|value| !value.is_empty())
                .map(PathBuf::from),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogTarget {
    File(PathBuf),
    Stderr,
}

pub fn default_log_path() -> Option<PathBuf> {
    dirs::cache_dir().map(|dir| dir.join("gh-trending").join("gh-trending.log"))
}

/// Marks the alternate screen as owned, muting the stderr fallback.
pub fn set_terminal_active(active: bool) {
    TERMINAL_ACTIVE.store(active, Ordering::SeqCst);
}

/// Stderr writer that goes quiet while the terminal UI is up.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConsoleWriter;

impl<'a> MakeWriter<'a> for ConsoleWriter {
    type Writer = EitherWriter<Stderr, Sink>;

    fn make_writer(&'a self) -> Self::Writer {
        if TERMINAL_ACTIVE.load(Ordering::SeqCst) {
            EitherWriter::B(io::sink())
        } else {
            EitherWriter::A(io::stderr())
        }
    }
}

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
}

fn open_log_file(path: &Path) -> Result<File> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("create log directory {}", parent.display()))?;
    }
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("open log file {}", path.display()))
}

/// Installs the global subscriber. Calling it twice keeps the first one.
///
/// Never fails: an unusable log file degrades to [`ConsoleWriter`].
pub fn init(options: &LogOptions) -> LogTarget {
    let candidate = options.file.clone().or_else(default_log_path);
    let opened = candidate
        .as_deref()
        .map(|path| open_log_file(path).map(|file| (path.to_path_buf(), file)));

    match opened {
        Some(Ok((path, file))) => {
            let _ = tracing_subscriber::fmt()
                .with_env_filter(env_filter())
                .with_ansi(false)
                .with_target(false)
                .with_writer(Mutex::new(file))
                .try_init();
            LogTarget::File(path)
        }
        Some(Err(err)) => {
            install_console();
            tracing::warn!(error = %format!("{err:#}"), "log file unavailable, logging to stderr");
            LogTarget::Stderr
        }
        None => {
            install_console();
            LogTarget::Stderr
        }
    }
}

fn install_console() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter())
        .with_target(false)
        .with_writer(ConsoleWriter)
        .try_init();
}
