//! Logging init: append to a file under the XDG state dir, or fall back to stderr.
//!
//! Filter precedence: `SEGFETCH_LOG`, then `RUST_LOG`, then a built-in default.
//! The file default includes per-segment debug events; the stderr default is
//! warnings plus engine info. Lines carry the thread name (`segfetch-worker-N`).

use anyhow::Result;
use std::fs::{self, File};
use std::io;
use std::path::PathBuf;
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::EnvFilter;

/// Environment variable consulted before `RUST_LOG`.
pub const LOG_ENV: &str = "SEGFETCH_LOG";

/// `segfetch` is the CLI binary's target, `segfetch_core` the engine's.
const FILE_FILTER: &str = "info,segfetch=debug,segfetch_core=debug";
const STDERR_FILTER: &str = "warn,segfetch_core=info";

/// Picks the directive string: first non-blank of `own`, `rust_log`, else `default`.
fn filter_directives(own: Option<String>, rust_log: Option<String>, default: &str) -> String {
    own.into_iter()
        .chain(rust_log)
        .find(|d| !d.trim().is_empty())
        .unwrap_or_else(|| default.to_string())
}

fn env_filter(default: &str) -> EnvFilter {
    let directives = filter_directives(
        std::env::var(LOG_ENV).ok(),
        std::env::var("RUST_LOG").ok(),
        default,
    );
    EnvFilter::try_new(&directives).unwrap_or_else(|e| {
        eprintln!("segfetch: ignoring bad log filter {:?}: {}", directives, e);
        EnvFilter::new(default)
    })
}

/// Hands each event a clone of the log file handle, or stderr if cloning fails.
struct LogFile(File);

enum LogWriter {
    File(File),
    Stderr(io::Stderr),
}

impl io::Write for LogWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self {
            LogWriter::File(f) => f.write(buf),
            LogWriter::Stderr(e) => e.write(buf),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self {
            LogWriter::File(f) => f.flush(),
            LogWriter::Stderr(e) => e.flush(),
        }
    }
}

impl<'a> MakeWriter<'a> for LogFile {
    type Writer = LogWriter;

    fn make_writer(&'a self) -> Self::Writer {
        match self.0.try_clone() {
            Ok(f) => LogWriter::File(f),
            Err(_) => LogWriter::Stderr(io::stderr()),
        }
    }
}

/// Path of the log file: `$XDG_STATE_HOME/segfetch/segfetch.log`.
pub fn log_file_path() -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("segfetch")?;
    Ok(xdg_dirs.get_state_home().join("segfetch.log"))
}

/// Initializes file logging and returns the log path. On failure (state dir
/// unwritable, subscriber already set) the caller can fall back to
/// [`init_logging_stderr`].
pub fn init_logging() -> Result<PathBuf> {
    let path = log_file_path()?;
    if let Some(dir) = path.parent() {
        fs::create_dir_all(dir)?;
    }
    let file = fs::OpenOptions::new().create(true).append(true).open(&path)?;

    tracing_subscriber::fmt()
        .with_env_filter(env_filter(FILE_FILTER))
        .with_writer(LogFile(file))
        .with_thread_names(true)
        .with_ansi(false)
        .try_init()
        .map_err(|e| anyhow::anyhow!("{}", e))?;

    tracing::info!(path = %path.display(), "logging initialized");
    Ok(path)
}

/// Logging to stderr only, for when the log file cannot be used.
pub fn init_logging_stderr() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter(STDERR_FILTER))
        .with_writer(io::stderr)
        .with_thread_names(true)
        .try_init();
}
