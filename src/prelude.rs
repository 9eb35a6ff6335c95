//! # jarscope Prelude
//!
//! The most commonly used types for loading and transforming bytecode. Import with
//! `use jarscope::prelude::*;`.

// ================================================================================================
// Core Types and Error Handling
// ================================================================================================

/// The main error type for all jarscope operations
pub use crate::Error;

/// The result type used throughout jarscope
pub use crate::Result;

/// Low-level file parsing utilities
pub use crate::{File, Parser};

// ================================================================================================
// Loading
// ================================================================================================

/// Archive and class file entry points
pub use crate::loader::{
    load_class_bytes, load_class_file, load_jar_bytes, load_jar_file, AttributeHook,
    FieldOrMethod,
};

/// Inlined source position lookup
pub use crate::loader::PositionMap;

/// Loaded classes and their members
pub use crate::metadata::{
    ClassAccess, ClassDef, FieldAccess, FieldDef, MethodAccess, MethodDef, Scope,
};

// ================================================================================================
// Instruction Streams and Control Flow
// ================================================================================================

/// Editable method bodies
pub use crate::ir::{
    Entry, EntryId, Instruction, InstructionStream, Label, MethodBody, Opcode, Operand,
};

/// Control flow graphs
pub use crate::analysis::{BasicBlock, CfgEdgeKind, ControlFlowGraph};

// ================================================================================================
// Passes
// ================================================================================================

/// Pass pipeline
pub use crate::compiler::{
    CfgCheckPass, Config, MethodContext, MethodPass, Metrics, Pass, PassConfig, PassManager,
    PassReport, RemoveGotosPass,
};
