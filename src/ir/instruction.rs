use std::fmt;

use crate::ir::{FlowType, Label, Opcode};

/// Jump table of a `tableswitch` or `lookupswitch`.
///
/// `tableswitch` is normalised into explicit `(value, target)` pairs so both forms share
/// one representation. Which form to emit is left to an encoder.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SwitchTable {
    /// Target taken when no case matches
    pub default: Label,
    /// Case values with their targets, in encoding order
    pub cases: Vec<(i32, Label)>,
}

/// The decoded inline operand of an instruction.
///
/// Branch offsets are resolved to [`Label`]s during decoding, so instructions can be
/// moved around the stream without fixing up offsets.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Operand {
    /// No operand
    None,
    /// Immediate value of `bipush`, `sipush`
    Int(i32),
    /// Constant pool index
    Constant(u16),
    /// Local variable slot
    Local(u16),
    /// Operands of `iinc`
    Iinc {
        /// Local variable slot
        index: u16,
        /// Signed increment
        delta: i16,
    },
    /// Branch target
    Branch(Label),
    /// Switch jump table
    Switch(SwitchTable),
    /// Operands of `invokeinterface`
    InvokeInterface {
        /// Constant pool index of the interface method
        index: u16,
        /// Argument slot count
        count: u8,
    },
    /// Primitive type code of `newarray`
    ArrayType(u8),
    /// Operands of `multianewarray`
    MultiArray {
        /// Constant pool index of the array class
        index: u16,
        /// Number of dimensions to allocate
        dimensions: u8,
    },
}

/// A single bytecode instruction.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Instruction {
    /// The operation
    pub opcode: Opcode,
    /// Its decoded operand
    pub operand: Operand,
}

impl Instruction {
    /// Creates an instruction from its parts.
    #[must_use]
    pub fn new(opcode: Opcode, operand: Operand) -> Self {
        Instruction { opcode, operand }
    }

    /// Creates an instruction without operand.
    #[must_use]
    pub fn simple(opcode: Opcode) -> Self {
        Instruction {
            opcode,
            operand: Operand::None,
        }
    }

    /// Creates a `goto` to `target`.
    #[must_use]
    pub fn goto(target: Label) -> Self {
        Instruction {
            opcode: Opcode::Goto,
            operand: Operand::Branch(target),
        }
    }

    /// Creates a branch instruction of any branching opcode.
    #[must_use]
    pub fn branch(opcode: Opcode, target: Label) -> Self {
        Instruction {
            opcode,
            operand: Operand::Branch(target),
        }
    }

    /// The control-flow classification of this instruction.
    #[must_use]
    pub fn flow(&self) -> FlowType {
        self.opcode.flow()
    }

    /// Returns `true` for `goto` and `goto_w`.
    #[must_use]
    pub fn is_goto(&self) -> bool {
        self.opcode.is_goto()
    }

    /// Returns `true` if this instruction ends a basic block.
    #[must_use]
    pub fn is_terminator(&self) -> bool {
        self.flow().is_terminator()
    }

    /// Returns `true` if control can never continue with the next instruction.
    #[must_use]
    pub fn ends_flow(&self) -> bool {
        !self.flow().falls_through()
    }

    /// Every label this instruction may transfer control to.
    ///
    /// Switches list the default target first, then the cases in table order.
    /// Duplicates are preserved.
    #[must_use]
    pub fn targets(&self) -> Vec<Label> {
        match &self.operand {
            Operand::Branch(label) => vec![*label],
            Operand::Switch(table) => std::iter::once(table.default)
                .chain(table.cases.iter().map(|(_, label)| *label))
                .collect(),
            _ => Vec::new(),
        }
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.opcode)?;
        match &self.operand {
            Operand::None => Ok(()),
            Operand::Int(value) => write!(f, " {}", value),
            Operand::Constant(index) => write!(f, " #{}", index),
            Operand::Local(index) => write!(f, " {}", index),
            Operand::Iinc { index, delta } => write!(f, " {}, {}", index, delta),
            Operand::Branch(label) => write!(f, " {}", label),
            Operand::Switch(table) => {
                write!(f, " {{")?;
                for (value, label) in &table.cases {
                    write!(f, " {}: {},", value, label)?;
                }
                write!(f, " default: {} }}", table.default)
            }
            Operand::InvokeInterface { index, count } => write!(f, " #{}, {}", index, count),
            Operand::ArrayType(code) => write!(f, " {}", code),
            Operand::MultiArray { index, dimensions } => write!(f, " #{}, {}", index, dimensions),
        }
    }
}
