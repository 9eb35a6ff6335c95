//! Binary input abstraction for class files and archives.
//!
//! This module abstracts over the sources the loader reads from and provides the
//! primitives used to decode them.
//!
//! # Key Components
//!
//! ## Core Types
//! - [`crate::file::File`] - Loaded input data, either memory-mapped from disk or owned in memory
//! - [`crate::file::Backend`] - Trait for different data sources (disk files, memory buffers)
//!
//! ## Parsing Infrastructure
//! - [`crate::file::parser::Parser`] - Bounds-checked cursor for structured decoding
//! - [`crate::file::io`] - Endian-aware primitive reads, including the `read32`/`read16`
//!   cursor primitives
//!
//! # Examples
//!
//! ```rust,no_run
//! use jarscope::File;
//! use std::path::Path;
//!
//! let file = File::from_file(Path::new("app.jar"))?;
//! println!("Loaded {} bytes", file.len());
//! # Ok::<(), jarscope::Error>(())
//! ```
//!
//! # Thread Safety
//!
//! [`File`] and both backends are [`Send`] and [`Sync`]; the data is immutable once loaded.

pub mod io;
pub mod parser;

mod memory;
mod physical;

use std::path::Path;

use crate::{Error::Empty, Result};
use memory::Memory;
use physical::Physical;

/// Backend trait for file data sources.
///
/// This trait abstracts over the source of input data, allowing for both in-memory and
/// on-disk representations. All implementations must be thread-safe.
pub trait Backend: Send + Sync {
    /// Returns a slice of the data at the given offset and length.
    ///
    /// # Arguments
    ///
    /// * `offset` - The starting offset within the data.
    /// * `len` - The length of the slice in bytes.
    ///
    /// # Errors
    ///
    /// Returns an error if the requested range is out of bounds.
    fn data_slice(&self, offset: usize, len: usize) -> Result<&[u8]>;

    /// Returns the entire data buffer.
    fn data(&self) -> &[u8];

    /// Returns the total length of the data buffer.
    fn len(&self) -> usize;
}

/// A loaded input file.
///
/// Wraps a [`Backend`] and rejects empty input up front, so every consumer can assume
/// at least one byte of data.
pub struct File {
    /// The underlying data source (memory or file).
    data: Box<dyn Backend>,
}

impl File {
    /// Loads a file from the given path using a memory mapping.
    ///
    /// # Arguments
    ///
    /// * `file` - Path to the class file or archive on disk.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be opened or mapped, or if it is empty.
    pub fn from_file(file: &Path) -> Result<File> {
        let input = Physical::new(file)?;

        Self::load(input)
    }

    /// Wraps an in-memory buffer.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Empty`] if the buffer is empty.
    pub fn from_mem(data: Vec<u8>) -> Result<File> {
        let input = Memory::new(data);

        Self::load(input)
    }

    fn load<T: Backend + 'static>(data: T) -> Result<File> {
        if data.len() == 0 {
            return Err(Empty);
        }

        Ok(File {
            data: Box::new(data),
        })
    }

    /// Returns the total size of the loaded file in bytes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Returns `true` if the file has a length of zero.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.len() == 0
    }

    /// Returns the complete file contents.
    #[must_use]
    pub fn data(&self) -> &[u8] {
        self.data.data()
    }

    /// Returns a bounds-checked slice of the file.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::OutOfBounds`] if the range exceeds the file.
    pub fn data_slice(&self, offset: usize, len: usize) -> Result<&[u8]> {
        self.data.data_slice(offset, len)
    }
}
