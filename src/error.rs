use thiserror::Error;

use crate::ir::EntryId;

macro_rules! malformed_error {
    // Single string version
    ($msg:expr) => {
        crate::Error::Malformed {
            message: $msg.to_string(),
            file: file!(),
            line: line!(),
        }
    };

    // Format string with arguments version
    ($fmt:expr, $($arg:tt)*) => {
        crate::Error::Malformed {
            message: format!($fmt, $($arg)*),
            file: file!(),
            line: line!(),
        }
    };
}

macro_rules! out_of_bounds_error {
    () => {
        crate::Error::OutOfBounds
    };
}

/// The generic Error type, which provides coverage for all errors this library can potentially
/// return.
///
/// This enum covers all failure modes of loading class files and archives, editing
/// instruction streams, building control flow graphs and running passes. Each variant
/// provides specific context about the failure mode to enable appropriate error handling.
///
/// # Error Categories
///
/// ## Loading Errors
/// - [`Error::Malformed`] - Corrupted or invalid class file or archive structure
/// - [`Error::OutOfBounds`] - Attempted to read beyond the end of the input
/// - [`Error::NotSupported`] - Unsupported format feature (ZIP64, unknown compression)
/// - [`Error::Empty`] - Empty input provided
///
/// ## I/O and External Errors
/// - [`Error::FileError`] - Filesystem I/O errors
/// - [`Error::Error`] - Miscellaneous failures
///
/// ## IR and Analysis Errors
/// - [`Error::InvalidPosition`] - A stream handle that no longer refers to a live entry
/// - [`Error::StaleGraph`] - A control flow graph used after its stream was edited
/// - [`Error::GraphError`] - Inconsistent control flow structure
/// - [`Error::MissingBody`] - A per-method transform invoked on a method without code
///
/// # Examples
///
/// ```rust,no_run
/// use jarscope::{loader, metadata::Scope, Error};
/// use std::path::Path;
///
/// let mut scope = Scope::new();
/// match loader::load_jar_file(Path::new("app.jar"), &mut scope, None) {
///     Ok(()) => println!("Loaded {} classes", scope.len()),
///     Err(Error::NotSupported) => eprintln!("Archive format is not supported"),
///     Err(Error::Malformed { message, file, line }) => {
///         eprintln!("Malformed input: {} ({}:{})", message, file, line);
///     }
///     Err(e) => eprintln!("Other error: {}", e),
/// }
/// ```
#[derive(Error, Debug)]
pub enum Error {
    // Loading Errors
    /// The input is damaged and could not be parsed.
    ///
    /// This error indicates that the class file or archive doesn't conform to the
    /// expected format. The error includes the source location where the malformation
    /// was detected for debugging purposes.
    ///
    /// # Fields
    ///
    /// * `message` - Detailed description of what was malformed
    /// * `file` - Source file where the error was detected
    /// * `line` - Source line where the error was detected
    #[error("Malformed - {file}:{line}: {message}")]
    Malformed {
        /// The message to be printed for the Malformed error
        message: String,
        /// The source file in which this error occured
        file: &'static str,
        /// The source line in which this error occured
        line: u32,
    },

    /// An out of bound access was attempted while parsing the input.
    ///
    /// This error occurs when trying to read data beyond the end of the file
    /// or buffer. It's a safety check to prevent buffer overruns during parsing.
    #[error("Out of Bound read would have occurred!")]
    OutOfBounds,

    /// This input uses a feature that is not supported.
    ///
    /// Returned for ZIP64 archives, encrypted entries and compression methods
    /// other than stored and deflate.
    #[error("This file type is not supported")]
    NotSupported,

    /// Provided input was empty.
    #[error("Provided input was empty")]
    Empty,

    /// File I/O error.
    ///
    /// Wraps standard I/O errors that can occur during file operations
    /// such as reading from disk, permission issues, or filesystem errors.
    #[error("{0}")]
    FileError(#[from] std::io::Error),

    /// Generic error for miscellaneous failures.
    #[error("{0}")]
    Error(String),

    /// A stream position that does not refer to a live entry.
    ///
    /// Returned by every [`crate::ir::InstructionStream`] operation that receives a handle
    /// to an entry that was already erased or never belonged to the stream.
    #[error("Stream position {0} does not refer to a live entry")]
    InvalidPosition(EntryId),

    /// A control flow graph was queried after its stream was modified.
    ///
    /// Graphs are snapshots of one stream generation. Any edit bumps the generation
    /// and every graph built before it must be rebuilt.
    #[error("Control flow graph is stale - built for generation {built}, stream is at {current}")]
    StaleGraph {
        /// The stream generation the graph was built from
        built: u64,
        /// The current stream generation
        current: u64,
    },

    /// Control flow graph error.
    ///
    /// Errors related to graph construction or validation, such as a branch to a
    /// label that has no target marker in the stream.
    #[error("{0}")]
    GraphError(String),

    /// A per-method transform was invoked on a method that has no code.
    ///
    /// The associated value names the method.
    #[error("Method {0} has no body")]
    MissingBody(String),
}
