//! # Security Service
//!
//! Owns the filter, the packet checker and the audit logger for one
//! server directory, and drives their lifecycle.
//!
//! ```text
//!   start ──► filter.load ──► checker.load ──► audit.start
//!   reload ─► filter.load ──► checker.load     (previous catalog kept on failure)
//!   stop ───► audit.stop (final flush)
//! ```

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tracing::{error, info, warn};

use crate::audit::{AuditConfig, SecurityLogger};
use crate::check::Services;
use crate::config::ConfigFile;
use crate::dispatcher::PacketChecker;
use crate::error::SecurityResult;
use crate::filter::TextFilter;
use crate::host::Host;

/// Configuration file name inside the server directory.
pub const CONFIG_FILE_NAME: &str = "security.toml";
/// Filter file name inside the server directory.
pub const FILTER_FILE_NAME: &str = "filters.txt";
/// Audit log file name inside the logs directory.
pub const AUDIT_LOG_NAME: &str = "security.log";

/// Where the service keeps its files.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SecurityPaths {
    /// Holds `security.toml` and `filters.txt`.
    pub server_dir: PathBuf,
    /// Holds `security.log`.
    pub logs_dir: PathBuf,
}

impl SecurityPaths {
    /// Groups both directories.
    pub fn new(server_dir: impl Into<PathBuf>, logs_dir: impl Into<PathBuf>) -> Self {
        Self {
            server_dir: server_dir.into(),
            logs_dir: logs_dir.into(),
        }
    }

    /// `<server_dir>/security.toml`.
    #[must_use]
    pub fn config_file(&self) -> PathBuf {
        self.server_dir.join(CONFIG_FILE_NAME)
    }

    /// `<server_dir>/filters.txt`.
    #[must_use]
    pub fn filter_file(&self) -> PathBuf {
        self.server_dir.join(FILTER_FILE_NAME)
    }

    /// `<logs_dir>/security.log`.
    #[must_use]
    pub fn audit_log(&self) -> PathBuf {
        self.logs_dir.join(AUDIT_LOG_NAME)
    }
}

/// The running security layer.
#[derive(Debug)]
pub struct SecurityService {
    paths: SecurityPaths,
    filter: Arc<TextFilter>,
    audit: Arc<SecurityLogger>,
    checker: PacketChecker,
    stopped: AtomicBool,
}

impl SecurityService {
    /// Loads the filter and the checks, then starts the audit writer.
    ///
    /// Nothing here is fatal. A configuration that fails to load leaves
    /// every check inactive; an audit log that cannot be opened leaves the
    /// checks running without a log file.
    pub fn start(paths: SecurityPaths, host: Arc<dyn Host>, audit_config: AuditConfig) -> Self {
        let filter = Arc::new(TextFilter::new(paths.filter_file()));
        if let Err(e) = filter.load() {
            warn!(target: "security", "Chat filter inactive: {e}");
        }

        let audit = Arc::new(SecurityLogger::new(paths.audit_log(), audit_config));
        let services = Services {
            host,
            audit: Arc::clone(&audit),
        };
        let checker = PacketChecker::new(
            ConfigFile::new(paths.config_file()),
            services,
            Arc::clone(&filter),
        );
        // Failures are logged by the checker; routes fail open meanwhile.
        let _ = checker.load();

        if let Err(e) = audit.start() {
            error!(target: "security", "{e}");
            error!(target: "security", "Security events will not be logged.");
        }
        info!(target: "security", "Security service started in {}", paths.server_dir.display());

        Self {
            paths,
            filter,
            audit,
            checker,
            stopped: AtomicBool::new(false),
        }
    }

    /// Re-reads the filter and the configuration. Returns the number of
    /// active checks.
    ///
    /// # Errors
    ///
    /// The configuration error; the previous checks stay active.
    pub fn reload(&self) -> SecurityResult<usize> {
        if let Err(e) = self.filter.load() {
            warn!(target: "security", "Chat filter inactive: {e}");
        }
        self.checker.load()
    }

    /// Flushes and stops the audit writer. Safe to call more than once.
    pub fn stop(&self) {
        if self.stopped.swap(true, Ordering::AcqRel) {
            return;
        }
        self.audit.stop();
        info!(target: "security", "Security service stopped.");
    }

    /// Message entry points.
    #[must_use]
    pub const fn checker(&self) -> &PacketChecker {
        &self.checker
    }

    /// Chat filter.
    #[must_use]
    pub fn filter(&self) -> &TextFilter {
        &self.filter
    }

    /// Audit logger.
    #[must_use]
    pub fn audit(&self) -> &SecurityLogger {
        &self.audit
    }

    /// File locations.
    #[must_use]
    pub const fn paths(&self) -> &SecurityPaths {
        &self.paths
    }

    /// `security.toml`.
    #[must_use]
    pub fn config_path(&self) -> &Path {
        self.checker.config().path()
    }
}

impl Drop for SecurityService {
    fn drop(&mut self) {
        self.stop();
    }
}
