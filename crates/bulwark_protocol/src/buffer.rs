//! # Message Buffer
//!
//! Cursor-tracking storage for one inbound message body.
//!
//! ## Peek, Don't Consume
//!
//! ```text
//!   MessageBuffer ──reader()──► MessageReader (borrowed bytes, own cursor)
//!        │                              │ read_i16 / read_string / ...
//!        │ cursor untouched             ▼
//!        └──────────────────────► game handler parses from the same spot
//! ```
//!
//! Validators only ever receive a [`MessageReader`]. It copies the buffer's
//! cursor when created and advances its own copy, so a validator cannot
//! move the buffer no matter how much it reads. The game handler, which does
//! own the message, advances the buffer through [`MessageBuffer::consume`].
//!
//! The one writer in the security layer (chat censoring) rewrites a byte
//! range in place with [`MessageBuffer::replace_range`] and puts the cursor
//! back with [`MessageBuffer::reset`].

use std::ops::Range;

use crate::error::{ProtocolError, ProtocolResult};

/// Saved cursor position, restored with [`MessageBuffer::reset`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Mark(usize);

impl Mark {
    /// Byte offset this mark points at.
    #[inline]
    #[must_use]
    pub const fn position(self) -> usize {
        self.0
    }
}

/// One message body plus the cursor the game handler reads from.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MessageBuffer {
    bytes: Vec<u8>,
    position: usize,
}

impl MessageBuffer {
    /// Wraps a message body with the cursor at the start.
    #[must_use]
    pub const fn new(bytes: Vec<u8>) -> Self {
        Self { bytes, position: 0 }
    }

    /// Current cursor position.
    #[inline]
    #[must_use]
    pub const fn position(&self) -> usize {
        self.position
    }

    /// Moves the cursor.
    ///
    /// # Errors
    ///
    /// Returns [`ProtocolError::OutOfBounds`] past the end of the message.
    pub fn set_position(&mut self, position: usize) -> ProtocolResult<()> {
        if position > self.bytes.len() {
            return Err(ProtocolError::OutOfBounds {
                position,
                len: self.bytes.len(),
            });
        }
        self.position = position;
        Ok(())
    }

    /// Total length in bytes.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Returns true for an empty body.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Bytes left after the cursor.
    #[inline]
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.bytes.len() - self.position
    }

    /// The whole body.
    #[inline]
    #[must_use]
    pub fn as_slice(&self) -> &[u8] {
        &self.bytes
    }

    /// Detached reader starting at the current cursor.
    #[inline]
    #[must_use]
    pub fn reader(&self) -> MessageReader<'_> {
        MessageReader {
            bytes: &self.bytes,
            position: self.position,
        }
    }

    /// Saves the cursor.
    #[inline]
    #[must_use]
    pub const fn mark(&self) -> Mark {
        Mark(self.position)
    }

    /// Restores a saved cursor, clamped to the current length.
    #[inline]
    pub fn reset(&mut self, mark: Mark) {
        self.position = mark.0.min(self.bytes.len());
    }

    /// Runs `f` and restores the cursor afterwards, whatever `f` did to it.
    pub fn scoped<T>(&mut self, f: impl FnOnce(&mut Self) -> T) -> T {
        let mark = self.mark();
        let result = f(self);
        self.reset(mark);
        result
    }

    /// Reads through a reader and commits its cursor only on success.
    ///
    /// # Errors
    ///
    /// Propagates the error from `f`; the cursor is left where it was.
    pub fn consume<T, E>(
        &mut self,
        f: impl FnOnce(&mut MessageReader<'_>) -> Result<T, E>,
    ) -> Result<T, E> {
        let mut reader = self.reader();
        let value = f(&mut reader)?;
        self.position = reader.position;
        Ok(value)
    }

    /// Replaces `range` with `replacement`, growing or shrinking the body.
    ///
    /// The cursor is moved to the start of the range.
    ///
    /// # Errors
    ///
    /// Returns [`ProtocolError::OutOfBounds`] for a range outside the body.
    pub fn replace_range(&mut self, range: Range<usize>, replacement: &[u8]) -> ProtocolResult<()> {
        if range.start > range.end || range.end > self.bytes.len() {
            return Err(ProtocolError::OutOfBounds {
                position: range.end,
                len: self.bytes.len(),
            });
        }
        let start = range.start;
        self.bytes.splice(range, replacement.iter().copied());
        self.position = start;
        Ok(())
    }

    /// Consumes the buffer, returning the body.
    #[must_use]
    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }
}

impl From<Vec<u8>> for MessageBuffer {
    fn from(bytes: Vec<u8>) -> Self {
        Self::new(bytes)
    }
}

/// Big-endian reader with its own cursor over borrowed message bytes.
#[derive(Clone, Debug)]
pub struct MessageReader<'a> {
    bytes: &'a [u8],
    position: usize,
}

impl<'a> MessageReader<'a> {
    /// Reader over a raw slice, starting at byte 0.
    #[must_use]
    pub const fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, position: 0 }
    }

    /// Reader's own cursor.
    #[inline]
    #[must_use]
    pub const fn position(&self) -> usize {
        self.position
    }

    /// Bytes left after the cursor.
    #[inline]
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.bytes.len().saturating_sub(self.position)
    }

    fn take<const N: usize>(&mut self) -> ProtocolResult<[u8; N]> {
        let end = self.position + N;
        let Some(slice) = self.bytes.get(self.position..end) else {
            return Err(ProtocolError::UnexpectedEnd {
                position: self.position,
                needed: N,
                remaining: self.remaining(),
            });
        };
        let mut out = [0u8; N];
        out.copy_from_slice(slice);
        self.position = end;
        Ok(out)
    }

    /// Reads one unsigned byte.
    ///
    /// # Errors
    ///
    /// [`ProtocolError::UnexpectedEnd`] on a short message, as for every read.
    #[inline]
    pub fn read_u8(&mut self) -> ProtocolResult<u8> {
        Ok(self.take::<1>()?[0])
    }

    /// Reads one signed byte.
    ///
    /// # Errors
    ///
    /// See [`MessageReader::read_u8`].
    #[inline]
    pub fn read_i8(&mut self) -> ProtocolResult<i8> {
        Ok(i8::from_be_bytes(self.take::<1>()?))
    }

    /// Reads a byte flag. Only `1` is true.
    ///
    /// # Errors
    ///
    /// See [`MessageReader::read_u8`].
    #[inline]
    pub fn read_bool(&mut self) -> ProtocolResult<bool> {
        Ok(self.read_u8()? == 1)
    }

    /// Reads a big-endian i16.
    ///
    /// # Errors
    ///
    /// See [`MessageReader::read_u8`].
    #[inline]
    pub fn read_i16(&mut self) -> ProtocolResult<i16> {
        Ok(i16::from_be_bytes(self.take::<2>()?))
    }

    /// Reads a big-endian u16.
    ///
    /// # Errors
    ///
    /// See [`MessageReader::read_u8`].
    #[inline]
    pub fn read_u16(&mut self) -> ProtocolResult<u16> {
        Ok(u16::from_be_bytes(self.take::<2>()?))
    }

    /// Reads a big-endian i32.
    ///
    /// # Errors
    ///
    /// See [`MessageReader::read_u8`].
    #[inline]
    pub fn read_i32(&mut self) -> ProtocolResult<i32> {
        Ok(i32::from_be_bytes(self.take::<4>()?))
    }

    /// Reads a big-endian f32.
    ///
    /// # Errors
    ///
    /// See [`MessageReader::read_u8`].
    #[inline]
    pub fn read_f32(&mut self) -> ProtocolResult<f32> {
        Ok(f32::from_be_bytes(self.take::<4>()?))
    }

    /// Reads a u16-length-prefixed UTF-8 string.
    ///
    /// # Errors
    ///
    /// [`ProtocolError::UnexpectedEnd`] on a short message,
    /// [`ProtocolError::InvalidUtf8`] on a malformed payload.
    pub fn read_string(&mut self) -> ProtocolResult<String> {
        let start = self.position;
        let len = usize::from(self.read_u16()?);
        let end = self.position + len;
        let Some(raw) = self.bytes.get(self.position..end) else {
            let remaining = self.remaining();
            self.position = start;
            return Err(ProtocolError::UnexpectedEnd {
                position: start,
                needed: len,
                remaining,
            });
        };
        let text = std::str::from_utf8(raw)
            .map_err(|_| ProtocolError::InvalidUtf8 { position: start })?
            .to_owned();
        self.position = end;
        Ok(text)
    }
}

/// Growable big-endian writer for message bodies.
#[derive(Clone, Debug, Default)]
pub struct MessageWriter {
    bytes: Vec<u8>,
}

impl MessageWriter {
    /// Empty writer.
    #[must_use]
    pub const fn new() -> Self {
        Self { bytes: Vec::new() }
    }

    /// Bytes written so far.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Returns true if nothing has been written.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Writes one unsigned byte.
    pub fn put_u8(&mut self, value: u8) -> &mut Self {
        self.bytes.push(value);
        self
    }

    /// Writes a byte flag (`1` or `0`).
    pub fn put_bool(&mut self, value: bool) -> &mut Self {
        self.put_u8(u8::from(value))
    }

    /// Writes a big-endian i16.
    pub fn put_i16(&mut self, value: i16) -> &mut Self {
        self.bytes.extend_from_slice(&value.to_be_bytes());
        self
    }

    /// Writes a big-endian i32.
    pub fn put_i32(&mut self, value: i32) -> &mut Self {
        self.bytes.extend_from_slice(&value.to_be_bytes());
        self
    }

    /// Writes a big-endian f32.
    pub fn put_f32(&mut self, value: f32) -> &mut Self {
        self.bytes.extend_from_slice(&value.to_be_bytes());
        self
    }

    /// Writes a u16-length-prefixed UTF-8 string.
    ///
    /// # Errors
    ///
    /// [`ProtocolError::StringTooLong`] above 65535 encoded bytes.
    pub fn put_string(&mut self, value: &str) -> ProtocolResult<&mut Self> {
        let len = u16::try_from(value.len())
            .map_err(|_| ProtocolError::StringTooLong { len: value.len() })?;
        self.bytes.extend_from_slice(&len.to_be_bytes());
        self.bytes.extend_from_slice(value.as_bytes());
        Ok(self)
    }

    /// Written bytes.
    #[must_use]
    pub fn as_slice(&self) -> &[u8] {
        &self.bytes
    }

    /// Finishes into a buffer with the cursor at the start.
    #[must_use]
    pub fn finish(self) -> MessageBuffer {
        MessageBuffer::new(self.bytes)
    }
}
