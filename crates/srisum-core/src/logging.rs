//! Logging init: append to a log file under the XDG state dir, or write to
//! stderr when that is not possible.

use anyhow::Result;
use std::fs;
use std::io::{self, Write};
use std::path::PathBuf;
use tracing_subscriber::fmt::writer::BoxMakeWriter;
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::EnvFilter;

/// Default filter for the log file. Per-target events are `debug` and only
/// show up when `RUST_LOG` asks for them.
const FILE_FILTER: &str = "info";

/// Default filter for stderr, which also carries report lines.
const STDERR_FILTER: &str = "warn";

/// One log event's destination: a handle on the log file, or stderr if the
/// handle could not be duplicated.
enum LogSink {
    File(fs::File),
    Stderr,
}

impl Write for LogSink {
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

struct LogFile(fs::File);

impl<'a> MakeWriter<'a> for LogFile {
    type Writer = LogSink;

    fn make_writer(&'a self) -> Self::Writer {
        match self.0.try_clone() {
            Ok(f) => LogSink::File(f),
            Err(_) => LogSink::Stderr,
        }
    }
}

fn filter(default: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default))
}

fn log_file_path() -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("srisum")?;
    Ok(xdg_dirs.get_state_home().join("srisum").join("srisum.log"))
}

/// Log to `~/.local/state/srisum/srisum.log`. Returns Err when the file
/// cannot be opened so the caller can fall back to stderr.
pub fn init_logging() -> Result<()> {
    let path = log_file_path()?;
    if let Some(dir) = path.parent() {
        fs::create_dir_all(dir)?;
    }
    let file = fs::OpenOptions::new().create(true).append(true).open(&path)?;

    tracing_subscriber::fmt()
        .with_env_filter(filter(FILE_FILTER))
        .with_writer(BoxMakeWriter::new(LogFile(file)))
        .with_ansi(false)
        .try_init()
        .map_err(|e| anyhow::anyhow!(e))?;

    tracing::debug!("logging to {}", path.display());
    Ok(())
}

/// Stderr-only logging, warnings and above unless `RUST_LOG` says otherwise.
pub fn init_logging_stderr() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter(STDERR_FILTER))
        .with_writer(io::stderr)
        .with_ansi(false)
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn log_sink_writes_to_file() {
        let mut tmp = tempfile::NamedTempFile::new().unwrap();
        let maker = LogFile(tmp.reopen().unwrap());
        let mut sink = maker.make_writer();
        sink.write_all(b"checked\n").unwrap();
        sink.flush().unwrap();
        let mut out = String::new();
        io::Read::read_to_string(tmp.as_file_mut(), &mut out).unwrap();
        assert_eq!(out, "checked\n");
    }
}
