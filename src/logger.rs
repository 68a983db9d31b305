//! Session logger: a `log` backend that writes to a single file in the OS
//! data directory.
//!
//! The file is **truncated at each launch**, so it only ever contains output
//! from the most recent session.
//!
//! Log location:
//!   Windows:  `%APPDATA%\PhotoStudio\photostudio.log`
//!   Linux:    `~/.local/share/PhotoStudio/photostudio.log`
//!   macOS:    `~/Library/Application Support/PhotoStudio/photostudio.log`
//!
//! Use the `log` macros (`log::info!`, `log::warn!`, ...) anywhere in the
//! crate. Warnings and errors are mirrored to stderr.

use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, OnceLock};
use std::time::{SystemTime, UNIX_EPOCH};

use log::{Level, LevelFilter, Log, Metadata, Record};

static LOGGER: SessionLogger = SessionLogger;
static LOG_FILE: OnceLock<Mutex<File>> = OnceLock::new();
static LOG_PATH: OnceLock<PathBuf> = OnceLock::new();

/// Returns the path to the current session log file.
pub fn log_path() -> Option<&'static PathBuf> {
    LOG_PATH.get()
}

struct SessionLogger;

impl Log for SessionLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        // HTTP stack internals are noise at debug level.
        metadata.level() <= Level::Info
            || metadata
                .target()
                .get(..11)
                .is_some_and(|t| t.eq_ignore_ascii_case("photostudio"))
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let line = format_line(record.level(), record.target(), &record.args().to_string());
        write_line(&line);
        if record.level() <= Level::Warn {
            eprintln!("{}", line);
        }
    }

    fn flush(&self) {
        if let Some(mutex) = LOG_FILE.get()
            && let Ok(mut file) = mutex.lock()
        {
            let _ = file.flush();
        }
    }
}

/// Silently ignores I/O errors so that logging never crashes the app.
fn write_line(line: &str) {
    if let Some(mutex) = LOG_FILE.get()
        && let Ok(mut file) = mutex.lock()
    {
        let _ = writeln!(file, "{}", line);
    }
}

fn format_line(level: Level, target: &str, msg: &str) -> String {
    format!("[{}] [{:<5}] {}: {}", timestamp(), level, target, msg)
}

/// Initialise the session logger. Call once, before any logging.
///
/// Truncates the log file, registers the `log` backend (`verbose` lowers the
/// level to `Debug`) and chains a panic hook that records the panic first.
pub fn init(verbose: bool) {
    let path = data_dir().join("PhotoStudio").join("photostudio.log");
    match open_truncated(&path) {
        Ok(file) => {
            let _ = LOG_PATH.set(path.clone());
            let _ = LOG_FILE.set(Mutex::new(file));
        }
        // Not fatal: stderr mirroring still works.
        Err(e) => eprintln!("photostudio: cannot open log file {}: {}", path.display(), e),
    }

    if log::set_logger(&LOGGER).is_ok() {
        log::set_max_level(if verbose { LevelFilter::Debug } else { LevelFilter::Info });
    }

    write_line(&session_header(unix_secs(), &path));

    let prev = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        write_line(&format!("[{}] [PANIC] {}", timestamp(), info));
        prev(info);
    }));
}

fn open_truncated(path: &Path) -> std::io::Result<File> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    OpenOptions::new().create(true).write(true).truncate(true).open(path)
}

fn session_header(started_unix: u64, path: &Path) -> String {
    format!(
        "=== PhotoStudio {} session started at unix {} ===\nLog file: {}\n",
        env!("CARGO_PKG_VERSION"),
        started_unix,
        path.display()
    )
}

/// Platform data directory (without the app sub-folder).
fn data_dir() -> PathBuf {
    let var = |name: &str| std::env::var_os(name).map(PathBuf::from);
    #[cfg(target_os = "windows")]
    {
        if let Some(appdata) = var("APPDATA") {
            return appdata;
        }
    }
    #[cfg(target_os = "macos")]
    {
        if let Some(home) = var("HOME") {
            return home.join("Library").join("Application Support");
        }
    }
    var("XDG_DATA_HOME")
        .or_else(|| var("HOME").map(|h| h.join(".local").join("share")))
        .unwrap_or_else(|| PathBuf::from("."))
}

fn unix_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

fn timestamp() -> String {
    clock(unix_secs())
}

/// HH:MM:SS (UTC) within the day.
fn clock(secs: u64) -> String {
    format!("{:02}:{:02}:{:02}", (secs % 86_400) / 3600, (secs % 3600) / 60, secs % 60)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn line_carries_level_and_target() {
        let line = format_line(Level::Warn, "photostudio::session", "slow response");
        assert!(line.ends_with("[WARN ] photostudio::session: slow response"));
        assert!(line.starts_with('['));
    }

    #[test]
    fn dependency_debug_output_is_filtered() {
        let ours = Metadata::builder()
            .level(Level::Debug)
            .target("photostudio::ops::generate")
            .build();
        let theirs = Metadata::builder()
            .level(Level::Debug)
            .target("reqwest::connect")
            .build();
        assert!(LOGGER.enabled(&ours));
        assert!(!LOGGER.enabled(&theirs));
    }

    #[test]
    fn clock_wraps_at_midnight() {
        assert_eq!(clock(0), "00:00:00");
        assert_eq!(clock(86_400 + 3 * 3600 + 25 * 60 + 9), "03:25:09");
    }

    #[test]
    fn header_names_version_and_file() {
        let header = session_header(1_700_000_000, Path::new("/tmp/photostudio.log"));
        assert!(header.starts_with(&format!("=== PhotoStudio {} ", env!("CARGO_PKG_VERSION"))));
        assert!(header.contains("unix 1700000000"));
        assert!(header.contains("Log file: /tmp/photostudio.log"));
    }
}
