//! Physical file backend for memory-mapped I/O.
//!
//! This module provides the [`crate::file::physical::Physical`] backend that implements the
//! [`crate::file::Backend`] trait for accessing files from disk using memory-mapped I/O.
//! JAR archives are read through their central directory at the end of the file, so
//! mapping avoids reading entries that are never loaded.

use super::Backend;
use crate::{
    Error::{Error, FileError},
    Result,
};

use memmap2::Mmap;
use std::{fs, path::Path};

/// A file backend that uses memory-mapped I/O for efficient access to files on disk.
///
/// All access operations include bounds checking to ensure memory safety.
#[derive(Debug)]
pub struct Physical {
    /// Memory-mapped file data
    data: Mmap,
}

impl Physical {
    /// Create a new physical file backend by memory-mapping the specified file.
    ///
    /// # Arguments
    /// * `path` - Path to the class file or archive on disk
    ///
    /// # Errors
    /// Returns [`crate::Error::FileError`] if the file cannot be opened or
    /// [`crate::Error::Error`] if memory mapping fails.
    pub fn new(path: impl AsRef<Path>) -> Result<Physical> {
        let file = match fs::File::open(path) {
            Ok(file) => file,
            Err(error) => return Err(FileError(error)),
        };

        // The mapping is read-only and the file handle stays owned by the map.
        let mmap = match unsafe { Mmap::map(&file) } {
            Ok(mmap) => mmap,
            Err(error) => return Err(Error(error.to_string())),
        };

        Ok(Physical { data: mmap })
    }
}

impl Backend for Physical {
    fn data_slice(&self, offset: usize, len: usize) -> Result<&[u8]> {
        let Some(offset_end) = offset.checked_add(len) else {
            return Err(out_of_bounds_error!());
        };

        if offset_end > self.data.len() {
            return Err(out_of_bounds_error!());
        }

        Ok(&self.data[offset..offset_end])
    }

    fn data(&self) -> &[u8] {
        self.data.as_ref()
    }

    fn len(&self) -> usize {
        self.data.len()
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn physical_roundtrip() {
        let path = std::env::temp_dir().join(format!("jarscope-physical-{}.bin", std::process::id()));
        {
            let mut file = fs::File::create(&path).unwrap();
            file.write_all(&[0xCA, 0xFE, 0xBA, 0xBE, 0x00, 0x00]).unwrap();
        }

        let physical = Physical::new(&path).unwrap();
        assert_eq!(physical.len(), 6);
        assert_eq!(physical.data_slice(0, 4).unwrap(), &[0xCA, 0xFE, 0xBA, 0xBE]);
        assert!(physical.data_slice(4, 4).is_err());

        drop(physical);
        let _ = fs::remove_file(&path);
    }

    #[test]
    fn physical_missing_file() {
        let result = Physical::new("/this/path/does/not/exist.jar");
        assert!(matches!(result, Err(FileError(_))));
    }
}
