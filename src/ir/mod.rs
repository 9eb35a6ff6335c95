//! Intermediate representation of method bodies.
//!
//! A method body is an [`InstructionStream`]: an ordered, mutable list of [`Entry`]
//! values. Instructions reference branch targets through [`Label`]s instead of byte
//! offsets, so entries can be moved, inserted and erased freely. Structure that the
//! class file keeps in side tables is inlined into the stream as markers:
//!
//! - [`Entry::Target`] marks where a label points to
//! - [`Entry::Try`] opens or closes a protected region
//! - [`Entry::Catch`] starts the handler of a region
//! - [`Entry::Position`] carries source line information
//!
//! # Key Components
//!
//! - [`Opcode`] / [`FlowType`] - The JVM opcode table and control transfer classification
//! - [`Instruction`] / [`Operand`] - Decoded instructions
//! - [`InstructionStream`] / [`EntryId`] - The mutable stream and its stable handles
//! - [`MethodBody`] - A stream with frame sizes and a cached control flow graph
//! - [`decoder`] - Conversion from `Code` attributes
//!
//! # Examples
//!
//! ```rust
//! use jarscope::ir::{decoder, Opcode};
//!
//! // iconst_0; ifeq +4; nop; return
//! let code = [0x03, 0x99, 0x00, 0x04, 0x00, 0xB1];
//! let stream = decoder::decode(&code, &[], &[], None)?;
//!
//! assert_eq!(stream.count_instructions(), 4);
//! let last = stream.last().unwrap();
//! let ret = stream.get(last)?.as_instruction().unwrap();
//! assert_eq!(ret.opcode, Opcode::Return);
//! # Ok::<(), jarscope::Error>(())
//! ```

mod body;
pub mod decoder;
mod entry;
mod instruction;
mod opcode;
mod stream;

pub use body::MethodBody;
pub use entry::{CatchMarker, Entry, Label, Position, RegionId, TryKind, TryMarker};
pub use instruction::{Instruction, Operand, SwitchTable};
pub use opcode::{FlowType, Opcode, OperandKind};
pub use stream::{EntryId, InstructionStream, Iter};
