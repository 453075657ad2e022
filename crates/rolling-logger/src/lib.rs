//! Rolling Logger
//!
//! `tracing` subscriber that writes to stderr and to a size-rotated set of
//! log files (`<app>.log`, `<app>.log.1`, ...), and keeps the most recent
//! lines in memory for "show logs" style views.
//! `log` records are bridged into `tracing` on init.

use std::collections::VecDeque;
use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, OnceLock};

use thiserror::Error;
use tracing_subscriber::fmt::time::ChronoLocal;
use tracing_subscriber::fmt::writer::MakeWriterExt;
use tracing_subscriber::fmt::MakeWriter;

const DEFAULT_MAX_FILE_BYTES: u64 = 1024 * 1024;
const DEFAULT_MAX_FILES: usize = 3;
const DEFAULT_RING_CAPACITY: usize = 500;
const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.3f";

static LOGGER: OnceLock<Arc<Mutex<LogSink>>> = OnceLock::new();

#[derive(Debug, Error)]
pub enum LoggerError {
    #[error("log directory {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("invalid log level '{0}'")]
    Level(String),
    #[error("a global logger is already installed")]
    AlreadyInitialized,
    #[error("logger not initialized")]
    NotInitialized,
}

/// Logger settings
#[derive(Debug, Clone)]
pub struct LoggerConfig {
    pub log_dir: PathBuf,
    pub app_name: String,
    /// `trace`, `debug`, `info`, `warn` or `error`
    pub level: String,
    pub max_file_bytes: u64,
    /// Number of files kept including the active one
    pub max_files: usize,
    pub ring_capacity: usize,
    pub stderr: bool,
}

impl LoggerConfig {
    pub fn new(log_dir: impl Into<PathBuf>, app_name: impl Into<String>) -> Self {
        Self {
            log_dir: log_dir.into(),
            app_name: app_name.into(),
            level: "info".to_string(),
            max_file_bytes: DEFAULT_MAX_FILE_BYTES,
            max_files: DEFAULT_MAX_FILES,
            ring_capacity: DEFAULT_RING_CAPACITY,
            stderr: true,
        }
    }

    pub fn with_level(mut self, level: impl Into<String>) -> Self {
        self.level = level.into();
        self
    }
}

/// Fixed-capacity buffer of the most recent lines
#[derive(Debug)]
pub struct RingBuffer {
    lines: VecDeque<String>,
    capacity: usize,
}

impl RingBuffer {
    pub fn new(capacity: usize) -> Self {
        Self {
            lines: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    pub fn push(&mut self, line: impl Into<String>) {
        if self.capacity == 0 {
            return;
        }
        if self.lines.len() == self.capacity {
            self.lines.pop_front();
        }
        self.lines.push_back(line.into());
    }

    pub fn lines(&self) -> Vec<String> {
        self.lines.iter().cloned().collect()
    }
}

/// Log file that rotates once it passes `max_bytes`
#[derive(Debug)]
pub struct RollingFile {
    dir: PathBuf,
    app_name: String,
    max_bytes: u64,
    max_files: usize,
    file: File,
    written: u64,
}

impl RollingFile {
    pub fn open(dir: &Path, app_name: &str, max_bytes: u64, max_files: usize) -> io::Result<Self> {
        fs::create_dir_all(dir)?;
        let path = Self::numbered(dir, app_name, 0);
        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        let written = file.metadata()?.len();
        Ok(Self {
            dir: dir.to_path_buf(),
            app_name: app_name.to_string(),
            max_bytes,
            max_files: max_files.max(1),
            file,
            written,
        })
    }

    /// Path of the active file
    pub fn path(&self) -> PathBuf {
        Self::numbered(&self.dir, &self.app_name, 0)
    }

    fn numbered(dir: &Path, app_name: &str, n: usize) -> PathBuf {
        if n == 0 {
            dir.join(format!("{}.log", app_name))
        } else {
            dir.join(format!("{}.log.{}", app_name, n))
        }
    }

    /// Shift `<app>.log.N` up by one, dropping the oldest, and start a fresh active file
    fn rotate(&mut self) -> io::Result<()> {
        self.file.flush()?;
        let oldest = Self::numbered(&self.dir, &self.app_name, self.max_files - 1);
        if self.max_files == 1 {
            // single file: truncate in place
            self.file = File::create(&oldest)?;
            self.written = 0;
            return Ok(());
        }
        if oldest.exists() {
            fs::remove_file(&oldest)?;
        }
        for n in (0..self.max_files - 1).rev() {
            let from = Self::numbered(&self.dir, &self.app_name, n);
            if from.exists() {
                fs::rename(&from, Self::numbered(&self.dir, &self.app_name, n + 1))?;
            }
        }
        self.file = File::create(self.path())?;
        self.written = 0;
        Ok(())
    }
}

impl Write for RollingFile {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if self.written > 0 && self.written + buf.len() as u64 > self.max_bytes {
            self.rotate()?;
        }
        let n = self.file.write(buf)?;
        self.written += n as u64;
        Ok(n)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.file.flush()
    }
}

/// File plus ring buffer, shared by every writer the subscriber makes
#[derive(Debug)]
pub struct LogSink {
    file: RollingFile,
    recent: RingBuffer,
}

impl LogSink {
    pub fn new(file: RollingFile, ring_capacity: usize) -> Self {
        Self {
            file,
            recent: RingBuffer::new(ring_capacity),
        }
    }

    pub fn recent_lines(&self) -> Vec<String> {
        self.recent.lines()
    }
}

/// `MakeWriter` handing out writers into a shared [`LogSink`]
#[derive(Debug, Clone)]
pub struct SinkWriter {
    sink: Arc<Mutex<LogSink>>,
}

impl SinkWriter {
    pub fn new(sink: Arc<Mutex<LogSink>>) -> Self {
        Self { sink }
    }
}

impl Write for SinkWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let mut sink = self
            .sink
            .lock()
            .map_err(|_| io::Error::new(io::ErrorKind::Other, "log sink poisoned"))?;
        sink.file.write_all(buf)?;
        for line in String::from_utf8_lossy(buf).lines() {
            if !line.trim().is_empty() {
                sink.recent.push(line);
            }
        }
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        match self.sink.lock() {
            Ok(mut sink) => sink.file.flush(),
            Err(_) => Ok(()),
        }
    }
}

impl<'a> MakeWriter<'a> for SinkWriter {
    type Writer = SinkWriter;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}

fn parse_level(level: &str) -> Result<tracing::Level, LoggerError> {
    level
        .trim()
        .parse::<tracing::Level>()
        .map_err(|_| LoggerError::Level(level.to_string()))
}

/// Install the global logger writing to `<log_dir>/<app_name>.log`
pub fn init_logger(log_dir: impl Into<PathBuf>, app_name: &str) -> Result<(), LoggerError> {
    init_with_config(LoggerConfig::new(log_dir, app_name))
}

/// Install the global logger with explicit settings
pub fn init_with_config(config: LoggerConfig) -> Result<(), LoggerError> {
    let level = parse_level(&config.level)?;
    let file = RollingFile::open(
        &config.log_dir,
        &config.app_name,
        config.max_file_bytes,
        config.max_files,
    )
    .map_err(|source| LoggerError::Io {
        path: config.log_dir.clone(),
        source,
    })?;

    let sink = Arc::new(Mutex::new(LogSink::new(file, config.ring_capacity)));
    let writer = SinkWriter::new(Arc::clone(&sink));
    let builder = tracing_subscriber::fmt()
        .with_max_level(level)
        .with_ansi(false)
        .with_target(false)
        .with_timer(ChronoLocal::new(TIME_FORMAT.to_string()));

    let installed = if config.stderr {
        builder.with_writer(writer.and(io::stderr)).try_init()
    } else {
        builder.with_writer(writer).try_init()
    };
    installed.map_err(|_| LoggerError::AlreadyInitialized)?;

    let _ = LOGGER.set(sink);
    tracing::info!(
        "=== {} session started {} ===",
        config.app_name,
        chrono::Local::now().format(TIME_FORMAT)
    );
    Ok(())
}

/// Most recent lines written since init
pub fn recent_lines() -> Result<Vec<String>, LoggerError> {
    let sink = LOGGER.get().ok_or(LoggerError::NotInitialized)?;
    let guard = sink.lock().map_err(|_| LoggerError::NotInitialized)?;
    Ok(guard.recent_lines())
}

pub fn info(message: &str) -> Result<(), LoggerError> {
    LOGGER.get().ok_or(LoggerError::NotInitialized)?;
    tracing::info!("{}", message);
    Ok(())
}

pub fn warn(message: &str) -> Result<(), LoggerError> {
    LOGGER.get().ok_or(LoggerError::NotInitialized)?;
    tracing::warn!("{}", message);
    Ok(())
}

pub fn error(message: &str) -> Result<(), LoggerError> {
    LOGGER.get().ok_or(LoggerError::NotInitialized)?;
    tracing::error!("{}", message);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ring_buffer_keeps_newest() {
        let mut ring = RingBuffer::new(2);
        ring.push("a");
        ring.push("b");
        ring.push("c");
        assert_eq!(ring.lines(), vec!["b".to_string(), "c".to_string()]);

        let mut none = RingBuffer::new(0);
        none.push("x");
        assert!(none.lines().is_empty());
    }

    #[test]
    fn test_rolling_file_rotates_and_drops_oldest() {
        let dir = tempfile::tempdir().unwrap();
        let mut file = RollingFile::open(dir.path(), "vault", 10, 3).unwrap();

        file.write_all(b"first-1234\n").unwrap();
        file.write_all(b"second-123\n").unwrap();
        file.write_all(b"third-1234\n").unwrap();
        file.write_all(b"fourth-123\n").unwrap();
        file.flush().unwrap();

        let read = |name: &str| fs::read_to_string(dir.path().join(name)).unwrap();
        assert_eq!(read("vault.log"), "fourth-123\n");
        assert_eq!(read("vault.log.1"), "third-1234\n");
        assert_eq!(read("vault.log.2"), "second-123\n");
        assert!(!dir.path().join("vault.log.3").exists());
    }

    #[test]
    fn test_rolling_file_appends_to_existing() {
        let dir = tempfile::tempdir().unwrap();
        {
            let mut file = RollingFile::open(dir.path(), "vault", 1024, 2).unwrap();
            file.write_all(b"one\n").unwrap();
        }
        let mut file = RollingFile::open(dir.path(), "vault", 1024, 2).unwrap();
        file.write_all(b"two\n").unwrap();
        file.flush().unwrap();
        assert_eq!(fs::read_to_string(file.path()).unwrap(), "one\ntwo\n");
    }

    #[test]
    fn test_sink_writer_fills_ring_and_file() {
        let dir = tempfile::tempdir().unwrap();
        let file = RollingFile::open(dir.path(), "vault", 1024, 2).unwrap();
        let sink = Arc::new(Mutex::new(LogSink::new(file, 8)));
        let mut writer = SinkWriter::new(Arc::clone(&sink));

        writer.write_all(b"INFO loaded\n\nWARN failed\n").unwrap();
        writer.flush().unwrap();

        let lines = sink.lock().unwrap().recent_lines();
        assert_eq!(lines, vec!["INFO loaded".to_string(), "WARN failed".to_string()]);
        let on_disk = fs::read_to_string(dir.path().join("vault.log")).unwrap();
        assert!(on_disk.contains("WARN failed"));
    }

    #[test]
    fn test_bad_level_is_rejected_before_install() {
        let dir = tempfile::tempdir().unwrap();
        let err = init_with_config(LoggerConfig::new(dir.path(), "vault").with_level("loud")).unwrap_err();
        assert!(matches!(err, LoggerError::Level(_)));
    }

    #[test]
    fn test_helpers_need_init() {
        // no test in this module installs the global logger
        assert!(matches!(info("x"), Err(LoggerError::NotInitialized)));
        assert!(matches!(recent_lines(), Err(LoggerError::NotInitialized)));
    }
}
