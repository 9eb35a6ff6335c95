//! Low-level byte stream parser for class file and archive decoding.
//!
//! This module provides the [`crate::file::parser::Parser`] type, a cursor-based binary data
//! parser used for reading class file structures, method bytecode and ZIP records. It offers
//! bounds-checked access to binary data with support for both little-endian and big-endian
//! formats.
//!
//! # Architecture
//!
//! The parser is built around a simple cursor-based model that maintains a position within
//! a byte slice:
//!
//! - **Position tracking** - Maintains current offset for sequential parsing operations
//! - **Bounds checking** - All operations validate data availability before reading
//! - **Type-safe reading** - Strongly typed methods for common data types
//!
//! # Usage Examples
//!
//! ```rust
//! use jarscope::Parser;
//!
//! let data = [0xCA, 0xFE, 0xBA, 0xBE, 0x00, 0x00, 0x00, 0x34];
//! let mut parser = Parser::new(&data);
//!
//! assert_eq!(parser.read_be::<u32>()?, 0xCAFE_BABE);
//! let minor = parser.read_be::<u16>()?;
//! let major = parser.read_be::<u16>()?;
//! assert_eq!((major, minor), (52, 0));
//! assert!(!parser.has_more_data());
//! # Ok::<(), jarscope::Error>(())
//! ```

use crate::{
    file::io::{read_be_at, read_le_at, ByteIO},
    Result,
};

/// A generic binary data parser.
///
/// `Parser` provides a cursor-based interface for reading binary data in both
/// little-endian and big-endian formats. The parser maintains an internal position
/// cursor and provides bounds checking to prevent buffer overruns when reading
/// malformed or truncated data.
///
/// # Examples
///
/// ```rust
/// use jarscope::Parser;
///
/// let data = [0x01, 0x02, 0x03, 0x04, 0x05, 0x06, 0x07, 0x08];
/// let mut parser = Parser::new(&data);
///
/// let first = parser.read_le::<u32>()?;
/// assert_eq!(first, 0x04030201);
///
/// parser.seek(6)?;
/// let last_bytes = parser.read_be::<u16>()?;
/// assert_eq!(last_bytes, 0x0708);
/// # Ok::<(), jarscope::Error>(())
/// ```
pub struct Parser<'a> {
    /// The binary data being parsed
    data: &'a [u8],
    /// Current position within the data buffer
    position: usize,
}

impl<'a> Parser<'a> {
    /// Create a new [`crate::file::parser::Parser`] from a byte slice.
    ///
    /// # Arguments
    /// * `data` - The byte slice to read from
    #[must_use]
    pub fn new(data: &'a [u8]) -> Self {
        Parser { data, position: 0 }
    }

    /// Returns the length of the underlying data buffer.
    #[must_use]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Returns `true` if the parser has no data.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Returns `true` if there is more data available to parse.
    #[must_use]
    pub fn has_more_data(&self) -> bool {
        self.position < self.data.len()
    }

    /// Returns the number of bytes between the cursor and the end of the data.
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.data.len().saturating_sub(self.position)
    }

    /// Checks that at least `count` bytes remain after the cursor.
    ///
    /// Use this before handing the remaining data to the unchecked cursor primitives
    /// in [`crate::file::io`].
    ///
    /// # Errors
    /// Returns [`crate::Error::OutOfBounds`] if fewer than `count` bytes remain.
    pub fn ensure_remaining(&self, count: usize) -> Result<()> {
        if self.remaining() < count {
            return Err(out_of_bounds_error!());
        }
        Ok(())
    }

    /// Move the current position to the specified index.
    ///
    /// Seeking to exactly the end of the data is allowed and leaves nothing to read.
    ///
    /// # Arguments
    /// * `pos` - The position to move the cursor to
    ///
    /// # Errors
    /// Returns [`crate::Error::OutOfBounds`] if position is beyond the data length.
    pub fn seek(&mut self, pos: usize) -> Result<()> {
        if pos > self.data.len() {
            return Err(out_of_bounds_error!());
        }

        self.position = pos;
        Ok(())
    }

    /// Move the position forward by the specified number of bytes.
    ///
    /// # Arguments
    /// * `step` - Amount of bytes to advance
    ///
    /// # Errors
    /// Returns [`crate::Error::OutOfBounds`] if advancing by step would exceed the data length.
    pub fn advance_by(&mut self, step: usize) -> Result<()> {
        self.ensure_remaining(step)?;
        self.position += step;
        Ok(())
    }

    /// Advances the cursor to the next multiple of `alignment`.
    ///
    /// # Errors
    /// Returns [`crate::Error::OutOfBounds`] if the aligned position lies past the end.
    pub fn align(&mut self, alignment: usize) -> Result<()> {
        let padding = (alignment - (self.position % alignment)) % alignment;
        self.advance_by(padding)
    }

    /// Get the current position of the parser within the data buffer.
    #[must_use]
    pub fn pos(&self) -> usize {
        self.position
    }

    /// Get access to the underlying data buffer.
    #[must_use]
    pub fn data(&self) -> &'a [u8] {
        self.data
    }

    /// Peek at the byte at the current position without advancing.
    ///
    /// # Errors
    /// Returns [`crate::Error::OutOfBounds`] if the cursor is at the end of the data.
    pub fn peek_byte(&self) -> Result<u8> {
        self.data
            .get(self.position)
            .copied()
            .ok_or(out_of_bounds_error!())
    }

    /// Read a value of type `T` in little-endian order and advance.
    ///
    /// # Errors
    /// Returns [`crate::Error::OutOfBounds`] if there are insufficient bytes.
    pub fn read_le<T: ByteIO>(&mut self) -> Result<T> {
        read_le_at::<T>(self.data, &mut self.position)
    }

    /// Read a value of type `T` in big-endian order and advance.
    ///
    /// # Errors
    /// Returns [`crate::Error::OutOfBounds`] if there are insufficient bytes.
    pub fn read_be<T: ByteIO>(&mut self) -> Result<T> {
        read_be_at::<T>(self.data, &mut self.position)
    }

    /// Borrow the next `count` bytes and advance past them.
    ///
    /// # Errors
    /// Returns [`crate::Error::OutOfBounds`] if fewer than `count` bytes remain.
    pub fn read_bytes(&mut self, count: usize) -> Result<&'a [u8]> {
        self.ensure_remaining(count)?;
        let slice = &self.data[self.position..self.position + count];
        self.position += count;
        Ok(slice)
    }
}
