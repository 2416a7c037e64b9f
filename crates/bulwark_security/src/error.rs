//! # Security Error Types
//!
//! Configuration faults, I/O faults and predicate faults.
//!
//! A message failing a check is NOT an error: that outcome is the
//! `Ok(false)` verdict and drives logging and kicking.

use std::path::PathBuf;

use bulwark_protocol::ProtocolError;
use thiserror::Error;

/// Errors that can occur in the security layer.
#[derive(Error, Debug)]
pub enum SecurityError {
    /// A check section lacks its log template.
    #[error("'log_message' isn't defined for 'security_checks.{id}' in security.toml.")]
    MissingLogMessage {
        /// Dotted check id.
        id: String,
    },

    /// A mode key was present but empty.
    #[error("empty 'mode' for 'security_checks.{id}' in security.toml.")]
    EmptyMode {
        /// Dotted check id, or `default`.
        id: String,
    },

    /// A key holds the wrong kind of value.
    #[error("invalid value in 'security_checks.{id}': {reason}")]
    InvalidSection {
        /// Dotted check id.
        id: String,
        /// Parser message.
        reason: String,
    },

    /// The configuration document is not valid TOML or has the wrong shape.
    #[error("failed to parse security configuration: {0}")]
    Parse(#[from] toml::de::Error),

    /// File system failure on a configuration, filter or log file.
    #[error("I/O error on {path}: {source}")]
    Io {
        /// File involved.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// A predicate read past the end of a malformed message.
    #[error("malformed message: {0}")]
    Protocol(#[from] ProtocolError),

    /// A predicate needed a player that is not online.
    #[error("no online player with id {0}")]
    UnknownPlayer(i16),

    /// A decoded action names a target the host could not resolve.
    #[error("message target does not resolve to an online player")]
    UnresolvedTarget,

    /// The sending session has no player entity.
    #[error("session '{0}' has no player entity")]
    NoPlayerEntity(String),

    /// A predicate needed a world cell that does not exist.
    #[error("no world cell at {x},{y},{z}")]
    UnknownCell {
        /// Cell x.
        x: i32,
        /// Cell y.
        y: i32,
        /// Cell z.
        z: i32,
    },
}

impl SecurityError {
    /// Wraps an I/O error with the file it happened on.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// Result type for security operations.
pub type SecurityResult<T> = Result<T, SecurityError>;
