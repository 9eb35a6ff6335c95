//! Low-level byte order and safe reading utilities for class file and archive parsing.
//!
//! This module provides endian-aware binary reading for the two container formats the
//! loader understands. Class files are big-endian throughout, while ZIP archives store
//! every header field little-endian, so both orders are supported through one trait.
//!
//! # Key Components
//!
//! ## Core Trait
//! - [`crate::file::io::ByteIO`] - Trait defining endian-aware conversion for primitive types
//!
//! ## Bounds-checked Reading
//! - [`crate::file::io::read_le`] / [`crate::file::io::read_le_at`] - Little-endian reads
//! - [`crate::file::io::read_be`] / [`crate::file::io::read_be_at`] - Big-endian reads
//!
//! ## Cursor Primitives
//! - [`crate::file::io::read32`] / [`crate::file::io::read16`] - Unchecked big-endian reads that
//!   consume bytes from a slice cursor
//!
//! # Usage Examples
//!
//! ```rust
//! use jarscope::file::io::{read_be_at, read_le_at};
//!
//! let data = [0xCA, 0xFE, 0xBA, 0xBE, 0x50, 0x4B];
//! let mut offset = 0;
//!
//! let magic: u32 = read_be_at(&data, &mut offset)?;
//! assert_eq!(magic, 0xCAFE_BABE);
//!
//! let zip_sig: u16 = read_le_at(&data, &mut offset)?;
//! assert_eq!(zip_sig, 0x4B50);
//! assert_eq!(offset, 6);
//! # Ok::<(), jarscope::Error>(())
//! ```
//!
//! # Thread Safety
//!
//! All functions in this module are pure and can be called concurrently.

use crate::{Error::OutOfBounds, Result};

/// Trait for implementing type specific safe readers.
///
/// Each implementation defines a `Bytes` associated type that represents the fixed-size
/// byte array required for that particular type (e.g., `[u8; 4]` for `u32`). The trait
/// methods then convert these byte arrays to the target type using the appropriate
/// endianness conversion.
pub trait ByteIO: Sized {
    /// Associated type representing the byte array type for this numeric type.
    type Bytes: Sized + for<'a> TryFrom<&'a [u8]>;

    /// Read T from a byte buffer in little-endian
    fn from_le_bytes(bytes: Self::Bytes) -> Self;
    /// Read T from a byte buffer in big-endian
    fn from_be_bytes(bytes: Self::Bytes) -> Self;
}

macro_rules! impl_byte_io {
    ($($ty:ty),* $(,)?) => {
        $(
            impl ByteIO for $ty {
                type Bytes = [u8; std::mem::size_of::<$ty>()];

                fn from_le_bytes(bytes: Self::Bytes) -> Self {
                    <$ty>::from_le_bytes(bytes)
                }

                fn from_be_bytes(bytes: Self::Bytes) -> Self {
                    <$ty>::from_be_bytes(bytes)
                }
            }
        )*
    };
}

impl_byte_io!(u64, i64, u32, i32, u16, i16, u8, i8, f32, f64);

/// Safely reads a value of type `T` in little-endian byte order from the start of a buffer.
///
/// # Errors
/// Returns [`crate::Error::OutOfBounds`] if there are insufficient bytes.
pub fn read_le<T: ByteIO>(data: &[u8]) -> Result<T> {
    let mut offset = 0_usize;
    read_le_at(data, &mut offset)
}

/// Safely reads a value of type `T` in little-endian byte order at a specific offset.
///
/// The offset is advanced by the number of bytes read.
///
/// # Arguments
///
/// * `data` - The byte buffer to read from
/// * `offset` - Mutable reference to the offset position (will be advanced after reading)
///
/// # Errors
/// Returns [`crate::Error::OutOfBounds`] if there are insufficient bytes.
pub fn read_le_at<T: ByteIO>(data: &[u8], offset: &mut usize) -> Result<T> {
    let type_len = std::mem::size_of::<T>();
    let Some(end) = offset.checked_add(type_len) else {
        return Err(OutOfBounds);
    };
    if end > data.len() {
        return Err(OutOfBounds);
    }

    let Ok(read) = data[*offset..end].try_into() else {
        return Err(OutOfBounds);
    };

    *offset = end;

    Ok(T::from_le_bytes(read))
}

/// Safely reads a value of type `T` in big-endian byte order from the start of a buffer.
///
/// # Errors
/// Returns [`crate::Error::OutOfBounds`] if there are insufficient bytes.
pub fn read_be<T: ByteIO>(data: &[u8]) -> Result<T> {
    let mut offset = 0_usize;
    read_be_at(data, &mut offset)
}

/// Safely reads a value of type `T` in big-endian byte order at a specific offset.
///
/// The offset is advanced by the number of bytes read.
///
/// # Arguments
///
/// * `data` - The byte buffer to read from
/// * `offset` - Mutable reference to the offset position (will be advanced after reading)
///
/// # Errors
/// Returns [`crate::Error::OutOfBounds`] if there are insufficient bytes.
pub fn read_be_at<T: ByteIO>(data: &[u8], offset: &mut usize) -> Result<T> {
    let type_len = std::mem::size_of::<T>();
    let Some(end) = offset.checked_add(type_len) else {
        return Err(OutOfBounds);
    };
    if end > data.len() {
        return Err(OutOfBounds);
    }

    let Ok(read) = data[*offset..end].try_into() else {
        return Err(OutOfBounds);
    };

    *offset = end;

    Ok(T::from_be_bytes(read))
}

/// Consumes four bytes from `cursor` as a big-endian value and advances it.
///
/// This is the class-file byte order. No bounds checking is performed: callers
/// validate the remaining length first, e.g. with
/// [`Parser::ensure_remaining`](crate::file::parser::Parser::ensure_remaining).
///
/// # Panics
///
/// Panics if fewer than four bytes remain.
///
/// # Examples
///
/// ```rust
/// use jarscope::file::io::read32;
///
/// let data = [0x00, 0x00, 0x01, 0x00, 0xFF];
/// let mut cursor = &data[..];
/// assert_eq!(read32(&mut cursor), 0x100);
/// assert_eq!(cursor, &[0xFF]);
/// ```
#[inline]
pub fn read32(cursor: &mut &[u8]) -> u32 {
    let (head, tail) = cursor.split_at(4);
    *cursor = tail;
    u32::from_be_bytes([head[0], head[1], head[2], head[3]])
}

/// Consumes two bytes from `cursor` as a big-endian value and advances it.
///
/// The result is widened to `u32`. Like [`read32`], bounds are the caller's
/// responsibility.
///
/// # Panics
///
/// Panics if fewer than two bytes remain.
#[inline]
pub fn read16(cursor: &mut &[u8]) -> u32 {
    let (head, tail) = cursor.split_at(2);
    *cursor = tail;
    u32::from(u16::from_be_bytes([head[0], head[1]]))
}

#[cfg(test)]
mod tests {
    use super::*;

    const TEST_BUFFER: [u8; 8] = [0x01, 0x02, 0x03, 0x04, 0x05, 0x06, 0x07, 0x08];

    #[test]
    fn read_le_u16() {
        let result = read_le::<u16>(&TEST_BUFFER).unwrap();
        assert_eq!(result, 0x0201);
    }

    #[test]
    fn read_le_u32() {
        let result = read_le::<u32>(&TEST_BUFFER).unwrap();
        assert_eq!(result, 0x0403_0201);
    }

    #[test]
    fn read_le_u64() {
        let result = read_le::<u64>(&TEST_BUFFER).unwrap();
        assert_eq!(result, 0x0807060504030201);
    }

    #[test]
    fn read_be_u16() {
        let result = read_be::<u16>(&TEST_BUFFER).unwrap();
        assert_eq!(result, 0x0102);
    }

    #[test]
    fn read_be_i32() {
        let data = [0xFF, 0xFF, 0xFF, 0xFE];
        let result = read_be::<i32>(&data).unwrap();
        assert_eq!(result, -2);
    }

    #[test]
    fn read_be_f64() {
        let data = 1.5_f64.to_be_bytes();
        let result = read_be::<f64>(&data).unwrap();
        assert_eq!(result, 1.5);
    }

    #[test]
    fn read_at_advances_offset() {
        let mut offset = 2;
        let value: u16 = read_be_at(&TEST_BUFFER, &mut offset).unwrap();
        assert_eq!(value, 0x0304);
        assert_eq!(offset, 4);

        let value: u32 = read_le_at(&TEST_BUFFER, &mut offset).unwrap();
        assert_eq!(value, 0x0807_0605);
        assert_eq!(offset, 8);
    }

    #[test]
    fn errors() {
        let buffer = [0xFF, 0xFF, 0xFF, 0xFF];

        let result = read_le::<u64>(&buffer);
        assert!(matches!(result, Err(OutOfBounds)));

        let mut offset = usize::MAX;
        let result = read_be_at::<u8>(&buffer, &mut offset);
        assert!(matches!(result, Err(OutOfBounds)));
        assert_eq!(offset, usize::MAX);
    }

    #[test]
    fn cursor_reads() {
        let data = [0xCA, 0xFE, 0xBA, 0xBE, 0x00, 0x34, 0x99];
        let mut cursor = &data[..];

        assert_eq!(read32(&mut cursor), 0xCAFE_BABE);
        assert_eq!(read16(&mut cursor), 0x34);
        assert_eq!(cursor, &[0x99]);
    }

    #[test]
    #[should_panic]
    fn cursor_read_short_input_panics() {
        let data = [0x01, 0x02, 0x03];
        let mut cursor = &data[..];
        let _ = read32(&mut cursor);
    }
}
