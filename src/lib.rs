// Copyright 2025 Johann Kempter
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.
//
// SPDX-License-Identifier: Apache-2.0

#![doc(html_no_source)]
#![deny(missing_docs)]
#![allow(clippy::too_many_arguments)]
// - 'file/physical.rs' uses mmap to map a file into memory

//! # jarscope
//!
//! A framework for loading and optimizing JVM bytecode.
//!
//! `jarscope` reads JAR archives and class files, decodes every method body into an
//! editable instruction stream, builds control flow graphs over those streams and runs
//! transformation passes on them.
//!
//! ## Features
//!
//! - **📦 Binary loading** - ZIP/JAR archives (stored and deflated entries) and class
//!   files, with a hook for non-standard attributes
//! - **🔍 Editable IR** - Instruction streams with stable entry positions, labels, try
//!   regions and source positions
//! - **⚡ Control flow graphs** - Built lazily per body and dropped on every edit
//! - **🔧 Passes** - Goto chain removal and a graph consistency check, run sequentially
//!   or across classes on the rayon pool
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use jarscope::prelude::*;
//! use std::path::Path;
//!
//! let mut scope = Scope::new();
//! load_jar_file(Path::new("app.jar"), &mut scope, None)?;
//!
//! let mut manager = PassManager::new(Config::default()).with_pass(RemoveGotosPass::new());
//! let report = manager.run(&mut scope)?;
//! println!("{report}");
//! # Ok::<(), jarscope::Error>(())
//! ```
//!
//! ## Architecture
//!
//! - [`loader`] - Archive and class file parsing into a [`metadata::Scope`]
//! - [`metadata`] - Classes, members, access flags and constant pools
//! - [`ir`] - Opcodes, instruction streams, method bodies and the bytecode decoder
//! - [`analysis`] - Basic blocks and control flow graphs
//! - [`compiler`] - Pass traits, the pass manager, metrics and the built-in passes
//! - [`Error`] and [`Result`] - Error handling

#[macro_use]
pub(crate) mod error;

/// Shared functionality which is used in unit- and integration-tests
#[cfg(test)]
pub(crate) mod test;

/// Convenient re-exports of the most commonly used types and traits.
///
/// # Example
///
/// ```rust,no_run
/// use jarscope::prelude::*;
///
/// let mut scope = Scope::new();
/// load_class_file(std::path::Path::new("Main.class"), &mut scope, None)?;
/// println!("{} method bodies", scope.count_bodies());
/// # Ok::<(), jarscope::Error>(())
/// ```
pub mod prelude;

/// Raw input access: memory mapped or in-memory files and a bounds checked parser.
pub mod file;

/// The editable instruction representation of method bodies.
///
/// # Key Types
///
/// - [`ir::InstructionStream`] - Ordered entries with stable positions
/// - [`ir::Entry`] - Instruction, branch target, try/catch marker or source position
/// - [`ir::MethodBody`] - A stream with its lazily built control flow graph
///
/// # Examples
///
/// ```rust
/// use jarscope::ir::{Entry, Instruction, InstructionStream, Opcode};
///
/// let mut stream = InstructionStream::new();
/// let ret = stream.push_back(Entry::Instruction(Instruction::simple(Opcode::Return)));
/// stream.insert_before(ret, Entry::Instruction(Instruction::simple(Opcode::Nop)))?;
/// assert_eq!(stream.count_instructions(), 2);
/// # Ok::<(), jarscope::Error>(())
/// ```
pub mod ir;

/// Control flow analysis over instruction streams.
pub mod analysis;

/// Loaded class model.
pub mod metadata;

/// JAR archive and class file loading.
pub mod loader;

/// Passes and the pass manager.
pub mod compiler;

/// Shared graph and rendering utilities.
pub mod utils;

/// `jarscope` Result type
///
/// A type alias for [`std::result::Result<T, Error>`] where the error type is always [`Error`].
///
/// # Examples
///
/// ```rust,no_run
/// use jarscope::{metadata::Scope, Result};
///
/// fn load(path: &str) -> Result<Scope> {
///     let mut scope = Scope::new();
///     jarscope::loader::load_jar_file(std::path::Path::new(path), &mut scope, None)?;
///     Ok(scope)
/// }
/// ```
pub type Result<T> = std::result::Result<T, Error>;

/// `jarscope` Error type
///
/// # Examples
///
/// ```rust,no_run
/// use jarscope::{metadata::Scope, Error};
///
/// let mut scope = Scope::new();
/// match jarscope::loader::load_jar_file(std::path::Path::new("app.jar"), &mut scope, None) {
///     Ok(()) => println!("Loaded {} classes", scope.len()),
///     Err(Error::NotSupported) => println!("Archive format not supported"),
///     Err(Error::Malformed { message, .. }) => println!("Malformed: {}", message),
///     Err(e) => println!("Error: {}", e),
/// }
/// ```
pub use error::Error;

/// Raw file access.
pub use file::{parser::Parser, File};
