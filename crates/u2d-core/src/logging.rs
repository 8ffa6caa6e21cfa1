//! Logging init for the `u2d` binary.
//!
//! Events go to `$XDG_STATE_HOME/u2d/u2d.log`. When the state dir cannot be
//! used, [`init_logging_stderr`] sends them to stderr instead so a relay
//! never fails on logging alone.

use anyhow::Result;
use std::fs;
use std::io;
use std::path::PathBuf;
use tracing_subscriber::fmt::writer::BoxMakeWriter;
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::EnvFilter;

/// Targets: the `u2d` binary and the `u2d_core` library.
const DEFAULT_FILTER: &str = "info,u2d=debug,u2d_core=debug";

/// Checked before `RUST_LOG`.
pub const LOG_ENV: &str = "U2D_LOG";

/// One write handle on the relay log; stderr if the log file handle could
/// not be duplicated for this event.
enum LogSink {
    File(fs::File),
    Stderr,
}

impl io::Write for LogSink {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self {
            LogSink::File(f) => f.write(buf),
            LogSink::Stderr => io::stderr().lock().write(buf),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self {
            LogSink::File(f) => f.flush(),
            LogSink::Stderr => io::stderr().lock().flush(),
        }
    }
}

/// Hands out a [`LogSink`] per event from the shared append-mode log file.
struct RelayLog(fs::File);

impl<'a> MakeWriter<'a> for RelayLog {
    type Writer = LogSink;

    fn make_writer(&'a self) -> Self::Writer {
        self.0
            .try_clone()
            .map(LogSink::File)
            .unwrap_or(LogSink::Stderr)
    }
}

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_env(LOG_ENV)
        .or_else(|_| EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
}

/// `$XDG_STATE_HOME/u2d/u2d.log`.
pub fn log_path() -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("u2d")?;
    Ok(xdg_dirs.get_state_home().join("u2d").join("u2d.log"))
}

/// Installs the file subscriber and returns the log path. An `Err` leaves no
/// subscriber installed, so the caller can fall back to stderr.
pub fn init_logging() -> Result<PathBuf> {
    let path = log_path()?;
    if let Some(dir) = path.parent() {
        fs::create_dir_all(dir)?;
    }
    let file = fs::OpenOptions::new().create(true).append(true).open(&path)?;

    tracing_subscriber::fmt()
        .with_env_filter(env_filter())
        .with_writer(BoxMakeWriter::new(RelayLog(file)))
        .with_ansi(false)
        .try_init()
        .map_err(|e| anyhow::anyhow!("{e}"))?;

    tracing::info!("logging to {}", path.display());
    Ok(path)
}

/// Stderr-only subscriber for when [`init_logging`] fails.
pub fn init_logging_stderr() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter())
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .try_init();
}
