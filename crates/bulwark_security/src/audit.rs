//! # Audit Logger
//!
//! **Queued, Batched Security Log**
//!
//! Message-processing threads never touch the disk. They:
//! 1. Mirror the line to the console (`tracing`, target `security`)
//! 2. Strip color codes and stamp the line
//! 3. Append it to a shared queue
//!
//! A dedicated writer thread wakes once per interval, appends the whole
//! queue to `security.log`, and clears it. Stopping performs one last flush.
//!
//! ## Architecture
//!
//! ```text
//!   Thread 1 ──┐
//!   Thread 2 ──┼──> [Mutex<Vec<AuditEntry>>] ──> [Writer Thread] ──> security.log
//!   Thread N ──┘        (arrival order)           (every interval)
//! ```
//!
//! ## File Format
//!
//! `[yyyy-MM-dd HH:mm:ss.SSS] <line without ANSI sequences>`
//!
//! A failed write drops that batch. The error goes to `tracing` and the
//! next batch is attempted normally.

use std::fs::{self, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use chrono::{DateTime, Local};
use crossbeam_channel::{bounded, RecvTimeoutError, Sender};
use parking_lot::Mutex;
use tracing::{error, info, warn};

use crate::error::{SecurityError, SecurityResult};

/// Timestamp layout of persisted entries.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.3f";

/// Writer configuration.
#[derive(Clone, Debug)]
pub struct AuditConfig {
    /// Time between flushes.
    pub flush_interval: Duration,
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            flush_interval: Duration::from_millis(1000),
        }
    }
}

/// Console severity of a logged batch.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Severity {
    /// Lifecycle and filter notices.
    Info,
    /// IGNORE-mode failures.
    Warning,
    /// KICK-mode failures.
    Alert,
}

/// One queued line.
#[derive(Clone, Debug)]
pub struct AuditEntry {
    /// When the line was queued.
    pub timestamp: DateTime<Local>,
    /// Color-free text.
    pub line: String,
}

impl AuditEntry {
    /// Stamps a line, removing ANSI sequences.
    #[must_use]
    pub fn new(line: &str) -> Self {
        Self {
            timestamp: Local::now(),
            line: strip_ansi(line),
        }
    }

    /// Persisted form, without trailing newline.
    #[must_use]
    pub fn render(&self) -> String {
        format!("[{}] {}", self.timestamp.format(TIMESTAMP_FORMAT), self.line)
    }
}

/// Removes ANSI escape sequences.
#[must_use]
pub fn strip_ansi(line: &str) -> String {
    String::from_utf8_lossy(&strip_ansi_escapes::strip(line)).into_owned()
}

struct Writer {
    handle: JoinHandle<()>,
    stop: Sender<()>,
}

/// Asynchronous security log.
pub struct SecurityLogger {
    path: PathBuf,
    config: AuditConfig,
    queue: Arc<Mutex<Vec<AuditEntry>>>,
    running: Arc<AtomicBool>,
    writer: Mutex<Option<Writer>>,
}

impl SecurityLogger {
    /// Creates a stopped logger writing to `path`.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>, config: AuditConfig) -> Self {
        Self {
            path: path.into(),
            config,
            queue: Arc::new(Mutex::new(Vec::new())),
            running: Arc::new(AtomicBool::new(false)),
            writer: Mutex::new(None),
        }
    }

    /// Log file path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns true between [`SecurityLogger::start`] and [`SecurityLogger::stop`].
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    /// Entries waiting for the next flush.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.queue.lock().len()
    }

    /// Starts the writer thread. Starting a running logger does nothing.
    ///
    /// # Errors
    ///
    /// [`SecurityError::Io`] if the log directory cannot be created or the
    /// thread cannot be spawned.
    pub fn start(&self) -> SecurityResult<()> {
        let mut slot = self.writer.lock();
        if slot.is_some() {
            return Ok(());
        }

        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|e| SecurityError::io(parent, e))?;
        }

        let (stop, stop_rx) = bounded::<()>(1);
        let queue = Arc::clone(&self.queue);
        let path = self.path.clone();
        let interval = self.config.flush_interval;

        self.running.store(true, Ordering::Release);
        let handle = thread::Builder::new()
            .name("security-audit".into())
            .spawn(move || {
                loop {
                    match stop_rx.recv_timeout(interval) {
                        Err(RecvTimeoutError::Timeout) => {
                            if let Err(e) = poll(&queue, &path) {
                                error!("Failed to write security log: {e}");
                            }
                        }
                        Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
                    }
                }
                if let Err(e) = poll(&queue, &path) {
                    error!("Failed to write security log: {e}");
                }
            })
            .map_err(|e| {
                self.running.store(false, Ordering::Release);
                SecurityError::io(&self.path, e)
            })?;

        *slot = Some(Writer { handle, stop });
        Ok(())
    }

    /// Stops queueing, wakes the writer, and waits for its final flush.
    pub fn stop(&self) {
        {
            // Queueing re-checks `running` under this lock, so nothing lands
            // after the final flush.
            let _queue = self.queue.lock();
            self.running.store(false, Ordering::Release);
        }
        let Some(writer) = self.writer.lock().take() else {
            return;
        };
        let _ = writer.stop.try_send(());
        if writer.handle.join().is_err() {
            error!("Security log writer panicked");
        }
    }

    /// Queues a line for the file. Does nothing while stopped.
    pub fn queue(&self, line: &str) {
        if !self.is_running() {
            return;
        }
        let entry = AuditEntry::new(line);
        let mut queue = self.queue.lock();
        if self.is_running() {
            queue.push(entry);
        }
    }

    /// Mirrors lines to the console now and queues them for the file.
    pub fn log<S: AsRef<str>>(&self, severity: Severity, lines: &[S]) {
        for line in lines {
            let line = line.as_ref();
            match severity {
                Severity::Info => info!(target: "security", "{line}"),
                Severity::Warning => warn!(target: "security", "{line}"),
                Severity::Alert => error!(target: "security", "{line}"),
            }
            self.queue(line);
        }
    }

    /// Writes everything queued so far, on the calling thread.
    ///
    /// # Errors
    ///
    /// [`SecurityError::Io`]; the drained entries are lost.
    pub fn flush(&self) -> SecurityResult<usize> {
        poll(&self.queue, &self.path)
    }
}

impl std::fmt::Debug for SecurityLogger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SecurityLogger")
            .field("path", &self.path)
            .field("running", &self.is_running())
            .field("pending", &self.pending())
            .finish()
    }
}

impl Drop for SecurityLogger {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Appends and clears the queue while holding its lock, so concurrent
/// flushes keep arrival order.
fn poll(queue: &Mutex<Vec<AuditEntry>>, path: &Path) -> SecurityResult<usize> {
    let mut entries = queue.lock();
    if entries.is_empty() {
        return Ok(0);
    }
    let drained = std::mem::take(&mut *entries);

    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|e| SecurityError::io(path, e))?;
    let mut out = BufWriter::new(file);
    for entry in &drained {
        writeln!(out, "{}", entry.render()).map_err(|e| SecurityError::io(path, e))?;
    }
    out.flush().map_err(|e| SecurityError::io(path, e))?;
    Ok(drained.len())
}
