//! # Protocol Error Types
//!
//! Everything that can go wrong while reading or writing a message body.

use thiserror::Error;

/// Errors raised by the message reader and writer.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    /// The message ended before a value could be read.
    #[error("unexpected end of message at byte {position}: need {needed}, have {remaining}")]
    UnexpectedEnd {
        /// Cursor position of the failed read.
        position: usize,
        /// Bytes the read required.
        needed: usize,
        /// Bytes left in the message.
        remaining: usize,
    },

    /// A string payload was not valid UTF-8.
    #[error("invalid UTF-8 in string at byte {position}")]
    InvalidUtf8 {
        /// Cursor position of the string's length prefix.
        position: usize,
    },

    /// A string does not fit the u16 length prefix.
    #[error("string of {len} bytes exceeds the 65535 byte limit")]
    StringTooLong {
        /// Encoded length in bytes.
        len: usize,
    },

    /// A cursor or range pointed past the end of the message.
    #[error("position {position} is outside a message of {len} bytes")]
    OutOfBounds {
        /// Requested position.
        position: usize,
        /// Message length.
        len: usize,
    },
}

/// Result type for protocol operations.
pub type ProtocolResult<T> = Result<T, ProtocolError>;
