//! File logging for the command-line driver
//!
//! Events go to `<data_dir>/crfplan.log` through a non-blocking
//! `tracing-appender` writer. The file is size-capped at startup: once it
//! passes [`MAX_LOG_BYTES`] only the newest [`RETAINED_LOG_BYTES`] survive.

use std::fs::{self, File, OpenOptions};
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

pub const LOG_FILE_NAME: &str = "crfplan.log";
pub const MAX_LOG_BYTES: u64 = 5 * 1024 * 1024;
pub const RETAINED_LOG_BYTES: u64 = 1024 * 1024;

const TRIM_NOTICE: &str = "--- crfplan: earlier log entries dropped ---\n";

/// Keeps the background log writer alive; pending events are flushed when
/// it is dropped
pub struct LogHandle {
    pub path: PathBuf,
    _guard: WorkerGuard,
}

/// Drop everything but the last `retain` bytes of `path` once it is larger
/// than `limit`, starting at a line boundary.
///
/// Returns the number of bytes removed.
fn trim_log(path: &Path, limit: u64, retain: u64) -> io::Result<u64> {
    let size = match fs::metadata(path) {
        Ok(meta) => meta.len(),
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(0),
        Err(e) => return Err(e),
    };
    if size <= limit {
        return Ok(0);
    }

    let start = size.saturating_sub(retain);
    let mut tail = Vec::new();
    {
        let mut file = File::open(path)?;
        file.seek(SeekFrom::Start(start))?;
        file.read_to_end(&mut tail)?;
    }
    let first_line = tail
        .iter()
        .position(|&b| b == b'\n')
        .map_or(0, |i| i + 1);
    let kept = &tail[first_line..];

    let mut file = File::create(path)?;
    file.write_all(TRIM_NOTICE.as_bytes())?;
    file.write_all(kept)?;
    Ok(size - kept.len() as u64)
}

fn default_directive(level: &str) -> String {
    format!("crfplan={level},crfplan_core=warn")
}

/// Start logging to `{data_dir}/crfplan.log`.
///
/// `RUST_LOG` takes precedence over `level`. The returned handle must be
/// held until the program exits.
pub fn init_logging(data_dir: &Path, level: &str) -> color_eyre::Result<LogHandle> {
    fs::create_dir_all(data_dir)?;
    let path = data_dir.join(LOG_FILE_NAME);

    let trimmed = match trim_log(&path, MAX_LOG_BYTES, RETAINED_LOG_BYTES) {
        Ok(bytes) => bytes,
        Err(e) => {
            eprintln!("Warning: could not trim {}: {e}", path.display());
            0
        }
    };

    let file = OpenOptions::new().create(true).append(true).open(&path)?;
    let (writer, guard) = tracing_appender::non_blocking(file);

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive(level)));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            fmt::layer()
                .with_writer(writer)
                .with_ansi(false)
                .with_target(true),
        )
        .try_init()?;

    tracing::info!(log_path = %path.display(), trimmed, "logging initialized");
    Ok(LogHandle {
        path,
        _guard: guard,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_small_log_is_untouched() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(LOG_FILE_NAME);
        fs::write(&path, "one\ntwo\n").unwrap();

        assert_eq!(trim_log(&path, 1024, 512).unwrap(), 0);
        assert_eq!(fs::read_to_string(&path).unwrap(), "one\ntwo\n");
    }

    #[test]
    fn test_missing_log_is_not_an_error() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(trim_log(&dir.path().join("none.log"), 10, 5).unwrap(), 0);
    }

    #[test]
    fn test_trim_keeps_whole_recent_lines() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(LOG_FILE_NAME);
        let content: String = (0..100).map(|i| format!("line {i:03}\n")).collect();
        fs::write(&path, &content).unwrap();

        // Each line is 9 bytes; 40 bytes starts mid-line
        assert_eq!(trim_log(&path, 100, 40).unwrap(), 900 - 36);
        let trimmed = fs::read_to_string(&path).unwrap();
        let mut lines = trimmed.lines();
        assert_eq!(lines.next(), Some(TRIM_NOTICE.trim_end()));
        let rest: Vec<&str> = lines.collect();
        assert_eq!(rest, vec!["line 096", "line 097", "line 098", "line 099"]);
    }

    #[test]
    fn test_default_directive() {
        assert_eq!(default_directive("debug"), "crfplan=debug,crfplan_core=warn");
    }
}
