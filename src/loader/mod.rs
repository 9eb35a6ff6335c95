//! Loading of JAR archives and class files into a [`Scope`].
//!
//! Every `*.class` entry of an archive is parsed, its method bodies are decoded into
//! instruction streams and the class is appended to the scope. Other entries are
//! skipped.
//!
//! # Attribute Hook
//!
//! Attributes the loader does not interpret (anything outside the standard set of the
//! member kind) can be observed through an [`AttributeHook`]. The hook runs once per
//! such attribute, after the owning field or method is fully decoded, and the payload
//! slice is only valid for the duration of the call.
//!
//! Position maps written next to an optimized archive are read with [`PositionMap`],
//! which unwinds inlined source positions back to their call sites.
//!
//! # Failure
//!
//! Loading stops at the first error. Classes loaded before the failure stay in the
//! scope; treat a scope that saw an error as unreliable.
//!
//! # Examples
//!
//! ```rust,no_run
//! use jarscope::loader::{self, FieldOrMethod};
//! use jarscope::metadata::Scope;
//! use std::path::Path;
//!
//! let mut scope = Scope::new();
//! let mut custom = 0;
//! let mut hook = |owner: FieldOrMethod<'_>, name: &str, payload: &[u8]| {
//!     println!("{name} on {owner} ({} bytes)", payload.len());
//!     custom += 1;
//! };
//! loader::load_jar_file(Path::new("app.jar"), &mut scope, Some(&mut hook))?;
//! println!("{} classes, {custom} custom attributes", scope.len());
//! # Ok::<(), jarscope::Error>(())
//! ```

mod archive;
mod classfile;
mod positionmap;

use std::{fmt, path::Path};

use log::{debug, info};

use crate::{
    file::File,
    metadata::{FieldDef, MethodDef, Scope},
    Result,
};

pub use archive::{Archive, Compression, ZipEntry};
pub use positionmap::PositionMap;

/// The declaration an attribute belongs to.
#[derive(Debug, Clone, Copy)]
pub enum FieldOrMethod<'a> {
    /// Attribute of a field
    Field(&'a FieldDef),
    /// Attribute of a method
    Method(&'a MethodDef),
}

impl fmt::Display for FieldOrMethod<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldOrMethod::Field(field) => write!(f, "{field}"),
            FieldOrMethod::Method(method) => write!(f, "{method}"),
        }
    }
}

/// Callback for non-standard field and method attributes.
///
/// Arguments are the owning declaration, the attribute name and its payload.
pub type AttributeHook<'h> = dyn FnMut(FieldOrMethod<'_>, &str, &[u8]) + 'h;

/// Loads every class of the JAR archive at `path` into `scope`.
///
/// # Errors
/// Returns [`crate::Error::FileError`] if the file cannot be opened, and any error of
/// [`load_jar_bytes`].
pub fn load_jar_file(
    path: &Path,
    scope: &mut Scope,
    hook: Option<&mut AttributeHook<'_>>,
) -> Result<()> {
    let file = File::from_file(path)?;
    info!("Loading archive {}", path.display());
    load_jar_bytes(file.data(), scope, hook)
}

/// Loads every class of an in-memory JAR archive into `scope`.
///
/// # Errors
/// Returns [`crate::Error::NotSupported`] for ZIP64 archives, encrypted entries or
/// unknown compression methods, and [`crate::Error::Malformed`] or
/// [`crate::Error::OutOfBounds`] for damaged archives, CRC mismatches and malformed
/// class files.
pub fn load_jar_bytes(
    data: &[u8],
    scope: &mut Scope,
    mut hook: Option<&mut AttributeHook<'_>>,
) -> Result<()> {
    let archive = Archive::parse(data)?;

    let mut loaded = 0usize;
    for entry in archive.entries() {
        if entry.is_dir() || !entry.name.ends_with(".class") {
            debug!("Skipping archive entry {}", entry.name);
            continue;
        }

        let bytes = archive.read(entry)?;
        let class = classfile::parse_class(&bytes, hook.as_deref_mut())?;
        if scope.push(class) {
            loaded += 1;
        }
    }

    info!(
        "Loaded {} classes from {} archive entries",
        loaded,
        archive.len()
    );
    Ok(())
}

/// Loads the single class file at `path` into `scope`.
///
/// # Errors
/// Returns [`crate::Error::FileError`] if the file cannot be opened, and any error of
/// [`load_class_bytes`].
pub fn load_class_file(
    path: &Path,
    scope: &mut Scope,
    hook: Option<&mut AttributeHook<'_>>,
) -> Result<()> {
    let file = File::from_file(path)?;
    load_class_bytes(file.data(), scope, hook)
}

/// Parses one class file and appends it to `scope`.
///
/// # Errors
/// Returns [`crate::Error::Malformed`] for a bad magic number, unknown constant tags,
/// invalid bytecode or trailing bytes, and [`crate::Error::OutOfBounds`] for truncated
/// input.
pub fn load_class_bytes(
    data: &[u8],
    scope: &mut Scope,
    hook: Option<&mut AttributeHook<'_>>,
) -> Result<()> {
    let class = classfile::parse_class(data, hook)?;
    scope.push(class);
    Ok(())
}
