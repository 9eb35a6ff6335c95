//! JVM opcode table.
//!
//! Every opcode from `0x00` to `0xC9` is listed once with its mnemonic, the encoding of
//! its inline operand and its control-flow classification. `wide` (`0xC4`) is a prefix
//! that only widens the operand of the following instruction; the decoder folds it into
//! that operand, so it has no variant here.

use strum::{EnumCount, EnumIter};

/// Encoding of the inline operand that follows an opcode byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperandKind {
    /// No inline operand
    None,
    /// Signed byte immediate (`bipush`)
    Byte,
    /// Signed short immediate (`sipush`)
    Short,
    /// Unsigned byte constant pool index (`ldc`)
    ConstIndex8,
    /// Unsigned short constant pool index
    ConstIndex16,
    /// Local variable index, one byte or two under `wide`
    Local,
    /// Local variable index and signed increment (`iinc`)
    Iinc,
    /// Signed 16-bit branch offset
    Branch16,
    /// Signed 32-bit branch offset
    Branch32,
    /// `tableswitch` padding, default, bounds and jump table
    TableSwitch,
    /// `lookupswitch` padding, default and match/offset pairs
    LookupSwitch,
    /// Constant pool index, argument count and a zero byte
    InvokeInterface,
    /// Constant pool index followed by two zero bytes
    InvokeDynamic,
    /// Primitive array type code (`newarray`)
    NewArray,
    /// Constant pool index and dimension count (`multianewarray`)
    MultiANewArray,
}

/// How an instruction transfers control.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FlowType {
    /// Continues with the next instruction
    Sequential,
    /// Method invocation, continues with the next instruction
    Call,
    /// Jumps to its target or falls through
    ConditionalBranch,
    /// Always jumps to its target (`goto`, `goto_w`)
    UnconditionalBranch,
    /// Jumps to a subroutine which returns to the next instruction (`jsr`, `jsr_w`)
    Subroutine,
    /// Jumps to one of several targets
    Switch,
    /// Leaves the method or subroutine (`*return`, `ret`)
    Return,
    /// Raises an exception (`athrow`)
    Throw,
}

impl FlowType {
    /// Returns `true` if an instruction of this kind must end a basic block.
    #[must_use]
    pub const fn is_terminator(self) -> bool {
        !matches!(self, FlowType::Sequential | FlowType::Call)
    }

    /// Returns `true` if control may continue with the lexically next instruction.
    #[must_use]
    pub const fn falls_through(self) -> bool {
        matches!(
            self,
            FlowType::Sequential
                | FlowType::Call
                | FlowType::ConditionalBranch
                | FlowType::Subroutine
        )
    }
}

macro_rules! opcodes {
    ($( $variant:ident = $code:literal, $mnemonic:literal, $kind:ident, $flow:ident; )*) => {
        /// A JVM opcode.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, EnumCount)]
        #[repr(u8)]
        #[allow(missing_docs)]
        pub enum Opcode {
            $( $variant = $code, )*
        }

        impl Opcode {
            /// Looks up the opcode for a bytecode byte.
            ///
            /// Returns `None` for `wide`, the reserved opcodes and unassigned bytes.
            #[must_use]
            pub const fn from_byte(byte: u8) -> Option<Opcode> {
                match byte {
                    $( $code => Some(Opcode::$variant), )*
                    _ => None,
                }
            }

            /// The mnemonic as written in `javap` output.
            #[must_use]
            pub const fn mnemonic(self) -> &'static str {
                match self {
                    $( Opcode::$variant => $mnemonic, )*
                }
            }

            /// The encoding of this opcode's inline operand.
            #[must_use]
            pub const fn operand_kind(self) -> OperandKind {
                match self {
                    $( Opcode::$variant => OperandKind::$kind, )*
                }
            }

            /// The control-flow classification of this opcode.
            #[must_use]
            pub const fn flow(self) -> FlowType {
                match self {
                    $( Opcode::$variant => FlowType::$flow, )*
                }
            }
        }
    };
}

opcodes! {
    Nop = 0x00, "nop", None, Sequential;
    AconstNull = 0x01, "aconst_null", None, Sequential;
    IconstM1 = 0x02, "iconst_m1", None, Sequential;
    Iconst0 = 0x03, "iconst_0", None, Sequential;
    Iconst1 = 0x04, "iconst_1", None, Sequential;
    Iconst2 = 0x05, "iconst_2", None, Sequential;
    Iconst3 = 0x06, "iconst_3", None, Sequential;
    Iconst4 = 0x07, "iconst_4", None, Sequential;
    Iconst5 = 0x08, "iconst_5", None, Sequential;
    Lconst0 = 0x09, "lconst_0", None, Sequential;
    Lconst1 = 0x0A, "lconst_1", None, Sequential;
    Fconst0 = 0x0B, "fconst_0", None, Sequential;
    Fconst1 = 0x0C, "fconst_1", None, Sequential;
    Fconst2 = 0x0D, "fconst_2", None, Sequential;
    Dconst0 = 0x0E, "dconst_0", None, Sequential;
    Dconst1 = 0x0F, "dconst_1", None, Sequential;
    Bipush = 0x10, "bipush", Byte, Sequential;
    Sipush = 0x11, "sipush", Short, Sequential;
    Ldc = 0x12, "ldc", ConstIndex8, Sequential;
    LdcW = 0x13, "ldc_w", ConstIndex16, Sequential;
    Ldc2W = 0x14, "ldc2_w", ConstIndex16, Sequential;
    Iload = 0x15, "iload", Local, Sequential;
    Lload = 0x16, "lload", Local, Sequential;
    Fload = 0x17, "fload", Local, Sequential;
    Dload = 0x18, "dload", Local, Sequential;
    Aload = 0x19, "aload", Local, Sequential;
    Iload0 = 0x1A, "iload_0", None, Sequential;
    Iload1 = 0x1B, "iload_1", None, Sequential;
    Iload2 = 0x1C, "iload_2", None, Sequential;
    Iload3 = 0x1D, "iload_3", None, Sequential;
    Lload0 = 0x1E, "lload_0", None, Sequential;
    Lload1 = 0x1F, "lload_1", None, Sequential;
    Lload2 = 0x20, "lload_2", None, Sequential;
    Lload3 = 0x21, "lload_3", None, Sequential;
    Fload0 = 0x22, "fload_0", None, Sequential;
    Fload1 = 0x23, "fload_1", None, Sequential;
    Fload2 = 0x24, "fload_2", None, Sequential;
    Fload3 = 0x25, "fload_3", None, Sequential;
    Dload0 = 0x26, "dload_0", None, Sequential;
    Dload1 = 0x27, "dload_1", None, Sequential;
    Dload2 = 0x28, "dload_2", None, Sequential;
    Dload3 = 0x29, "dload_3", None, Sequential;
    Aload0 = 0x2A, "aload_0", None, Sequential;
    Aload1 = 0x2B, "aload_1", None, Sequential;
    Aload2 = 0x2C, "aload_2", None, Sequential;
    Aload3 = 0x2D, "aload_3", None, Sequential;
    Iaload = 0x2E, "iaload", None, Sequential;
    Laload = 0x2F, "laload", None, Sequential;
    Faload = 0x30, "faload", None, Sequential;
    Daload = 0x31, "daload", None, Sequential;
    Aaload = 0x32, "aaload", None, Sequential;
    Baload = 0x33, "baload", None, Sequential;
    Caload = 0x34, "caload", None, Sequential;
    Saload = 0x35, "saload", None, Sequential;
    Istore = 0x36, "istore", Local, Sequential;
    Lstore = 0x37, "lstore", Local, Sequential;
    Fstore = 0x38, "fstore", Local, Sequential;
    Dstore = 0x39, "dstore", Local, Sequential;
    Astore = 0x3A, "astore", Local, Sequential;
    Istore0 = 0x3B, "istore_0", None, Sequential;
    Istore1 = 0x3C, "istore_1", None, Sequential;
    Istore2 = 0x3D, "istore_2", None, Sequential;
    Istore3 = 0x3E, "istore_3", None, Sequential;
    Lstore0 = 0x3F, "lstore_0", None, Sequential;
    Lstore1 = 0x40, "lstore_1", None, Sequential;
    Lstore2 = 0x41, "lstore_2", None, Sequential;
    Lstore3 = 0x42, "lstore_3", None, Sequential;
    Fstore0 = 0x43, "fstore_0", None, Sequential;
    Fstore1 = 0x44, "fstore_1", None, Sequential;
    Fstore2 = 0x45, "fstore_2", None, Sequential;
    Fstore3 = 0x46, "fstore_3", None, Sequential;
    Dstore0 = 0x47, "dstore_0", None, Sequential;
    Dstore1 = 0x48, "dstore_1", None, Sequential;
    Dstore2 = 0x49, "dstore_2", None, Sequential;
    Dstore3 = 0x4A, "dstore_3", None, Sequential;
    Astore0 = 0x4B, "astore_0", None, Sequential;
    Astore1 = 0x4C, "astore_1", None, Sequential;
    Astore2 = 0x4D, "astore_2", None, Sequential;
    Astore3 = 0x4E, "astore_3", None, Sequential;
    Iastore = 0x4F, "iastore", None, Sequential;
    Lastore = 0x50, "lastore", None, Sequential;
    Fastore = 0x51, "fastore", None, Sequential;
    Dastore = 0x52, "dastore", None, Sequential;
    Aastore = 0x53, "aastore", None, Sequential;
    Bastore = 0x54, "bastore", None, Sequential;
    Castore = 0x55, "castore", None, Sequential;
    Sastore = 0x56, "sastore", None, Sequential;
    Pop = 0x57, "pop", None, Sequential;
    Pop2 = 0x58, "pop2", None, Sequential;
    Dup = 0x59, "dup", None, Sequential;
    DupX1 = 0x5A, "dup_x1", None, Sequential;
    DupX2 = 0x5B, "dup_x2", None, Sequential;
    Dup2 = 0x5C, "dup2", None, Sequential;
    Dup2X1 = 0x5D, "dup2_x1", None, Sequential;
    Dup2X2 = 0x5E, "dup2_x2", None, Sequential;
    Swap = 0x5F, "swap", None, Sequential;
    Iadd = 0x60, "iadd", None, Sequential;
    Ladd = 0x61, "ladd", None, Sequential;
    Fadd = 0x62, "fadd", None, Sequential;
    Dadd = 0x63, "dadd", None, Sequential;
    Isub = 0x64, "isub", None, Sequential;
    Lsub = 0x65, "lsub", None, Sequential;
    Fsub = 0x66, "fsub", None, Sequential;
    Dsub = 0x67, "dsub", None, Sequential;
    Imul = 0x68, "imul", None, Sequential;
    Lmul = 0x69, "lmul", None, Sequential;
    Fmul = 0x6A, "fmul", None, Sequential;
    Dmul = 0x6B, "dmul", None, Sequential;
    Idiv = 0x6C, "idiv", None, Sequential;
    Ldiv = 0x6D, "ldiv", None, Sequential;
    Fdiv = 0x6E, "fdiv", None, Sequential;
    Ddiv = 0x6F, "ddiv", None, Sequential;
    Irem = 0x70, "irem", None, Sequential;
    Lrem = 0x71, "lrem", None, Sequential;
    Frem = 0x72, "frem", None, Sequential;
    Drem = 0x73, "drem", None, Sequential;
    Ineg = 0x74, "ineg", None, Sequential;
    Lneg = 0x75, "lneg", None, Sequential;
    Fneg = 0x76, "fneg", None, Sequential;
    Dneg = 0x77, "dneg", None, Sequential;
    Ishl = 0x78, "ishl", None, Sequential;
    Lshl = 0x79, "lshl", None, Sequential;
    Ishr = 0x7A, "ishr", None, Sequential;
    Lshr = 0x7B, "lshr", None, Sequential;
    Iushr = 0x7C, "iushr", None, Sequential;
    Lushr = 0x7D, "lushr", None, Sequential;
    Iand = 0x7E, "iand", None, Sequential;
    Land = 0x7F, "land", None, Sequential;
    Ior = 0x80, "ior", None, Sequential;
    Lor = 0x81, "lor", None, Sequential;
    Ixor = 0x82, "ixor", None, Sequential;
    Lxor = 0x83, "lxor", None, Sequential;
    Iinc = 0x84, "iinc", Iinc, Sequential;
    I2l = 0x85, "i2l", None, Sequential;
    I2f = 0x86, "i2f", None, Sequential;
    I2d = 0x87, "i2d", None, Sequential;
    L2i = 0x88, "l2i", None, Sequential;
    L2f = 0x89, "l2f", None, Sequential;
    L2d = 0x8A, "l2d", None, Sequential;
    F2i = 0x8B, "f2i", None, Sequential;
    F2l = 0x8C, "f2l", None, Sequential;
    F2d = 0x8D, "f2d", None, Sequential;
    D2i = 0x8E, "d2i", None, Sequential;
    D2l = 0x8F, "d2l", None, Sequential;
    D2f = 0x90, "d2f", None, Sequential;
    I2b = 0x91, "i2b", None, Sequential;
    I2c = 0x92, "i2c", None, Sequential;
    I2s = 0x93, "i2s", None, Sequential;
    Lcmp = 0x94, "lcmp", None, Sequential;
    Fcmpl = 0x95, "fcmpl", None, Sequential;
    Fcmpg = 0x96, "fcmpg", None, Sequential;
    Dcmpl = 0x97, "dcmpl", None, Sequential;
    Dcmpg = 0x98, "dcmpg", None, Sequential;
    Ifeq = 0x99, "ifeq", Branch16, ConditionalBranch;
    Ifne = 0x9A, "ifne", Branch16, ConditionalBranch;
    Iflt = 0x9B, "iflt", Branch16, ConditionalBranch;
    Ifge = 0x9C, "ifge", Branch16, ConditionalBranch;
    Ifgt = 0x9D, "ifgt", Branch16, ConditionalBranch;
    Ifle = 0x9E, "ifle", Branch16, ConditionalBranch;
    IfIcmpeq = 0x9F, "if_icmpeq", Branch16, ConditionalBranch;
    IfIcmpne = 0xA0, "if_icmpne", Branch16, ConditionalBranch;
    IfIcmplt = 0xA1, "if_icmplt", Branch16, ConditionalBranch;
    IfIcmpge = 0xA2, "if_icmpge", Branch16, ConditionalBranch;
    IfIcmpgt = 0xA3, "if_icmpgt", Branch16, ConditionalBranch;
    IfIcmple = 0xA4, "if_icmple", Branch16, ConditionalBranch;
    IfAcmpeq = 0xA5, "if_acmpeq", Branch16, ConditionalBranch;
    IfAcmpne = 0xA6, "if_acmpne", Branch16, ConditionalBranch;
    Goto = 0xA7, "goto", Branch16, UnconditionalBranch;
    Jsr = 0xA8, "jsr", Branch16, Subroutine;
    Ret = 0xA9, "ret", Local, Return;
    Tableswitch = 0xAA, "tableswitch", TableSwitch, Switch;
    Lookupswitch = 0xAB, "lookupswitch", LookupSwitch, Switch;
    Ireturn = 0xAC, "ireturn", None, Return;
    Lreturn = 0xAD, "lreturn", None, Return;
    Freturn = 0xAE, "freturn", None, Return;
    Dreturn = 0xAF, "dreturn", None, Return;
    Areturn = 0xB0, "areturn", None, Return;
    Return = 0xB1, "return", None, Return;
    Getstatic = 0xB2, "getstatic", ConstIndex16, Sequential;
    Putstatic = 0xB3, "putstatic", ConstIndex16, Sequential;
    Getfield = 0xB4, "getfield", ConstIndex16, Sequential;
    Putfield = 0xB5, "putfield", ConstIndex16, Sequential;
    Invokevirtual = 0xB6, "invokevirtual", ConstIndex16, Call;
    Invokespecial = 0xB7, "invokespecial", ConstIndex16, Call;
    Invokestatic = 0xB8, "invokestatic", ConstIndex16, Call;
    Invokeinterface = 0xB9, "invokeinterface", InvokeInterface, Call;
    Invokedynamic = 0xBA, "invokedynamic", InvokeDynamic, Call;
    New = 0xBB, "new", ConstIndex16, Sequential;
    Newarray = 0xBC, "newarray", NewArray, Sequential;
    Anewarray = 0xBD, "anewarray", ConstIndex16, Sequential;
    Arraylength = 0xBE, "arraylength", None, Sequential;
    Athrow = 0xBF, "athrow", None, Throw;
    Checkcast = 0xC0, "checkcast", ConstIndex16, Sequential;
    Instanceof = 0xC1, "instanceof", ConstIndex16, Sequential;
    Monitorenter = 0xC2, "monitorenter", None, Sequential;
    Monitorexit = 0xC3, "monitorexit", None, Sequential;
    Multianewarray = 0xC5, "multianewarray", MultiANewArray, Sequential;
    Ifnull = 0xC6, "ifnull", Branch16, ConditionalBranch;
    Ifnonnull = 0xC7, "ifnonnull", Branch16, ConditionalBranch;
    GotoW = 0xC8, "goto_w", Branch32, UnconditionalBranch;
    JsrW = 0xC9, "jsr_w", Branch32, Subroutine;
}

/// The `wide` prefix byte.
pub const WIDE: u8 = 0xC4;

impl Opcode {
    /// The bytecode byte of this opcode.
    #[must_use]
    pub const fn byte(self) -> u8 {
        self as u8
    }

    /// Returns `true` for `goto` and `goto_w`.
    #[must_use]
    pub const fn is_goto(self) -> bool {
        matches!(self, Opcode::Goto | Opcode::GotoW)
    }

    /// Returns `true` if a `wide` prefix may precede this opcode.
    #[must_use]
    pub const fn is_widenable(self) -> bool {
        matches!(self.operand_kind(), OperandKind::Local | OperandKind::Iinc)
    }
}

impl std::fmt::Display for Opcode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.mnemonic())
    }
}

#[cfg(test)]
mod tests {
    use strum::{EnumCount, IntoEnumIterator};

    use super::*;

    #[test]
    fn table_roundtrips_through_bytes() {
        for opcode in Opcode::iter() {
            assert_eq!(Opcode::from_byte(opcode.byte()), Some(opcode));
        }
        // 0x00..=0xC9 without the wide prefix
        assert_eq!(Opcode::COUNT, 0xC9);
    }

    #[test]
    fn unassigned_bytes() {
        assert_eq!(Opcode::from_byte(WIDE), None);
        assert_eq!(Opcode::from_byte(0xCA), None);
        assert_eq!(Opcode::from_byte(0xFF), None);
    }

    #[test]
    fn flow_classification() {
        assert!(Opcode::Goto.is_goto());
        assert!(Opcode::GotoW.is_goto());
        assert!(!Opcode::Ifeq.is_goto());

        assert!(!Opcode::Goto.flow().falls_through());
        assert!(Opcode::Ifnull.flow().falls_through());
        assert!(Opcode::Jsr.flow().falls_through());
        assert!(!Opcode::Athrow.flow().falls_through());
        assert!(!Opcode::Ret.flow().falls_through());
        assert!(!Opcode::Lookupswitch.flow().falls_through());

        assert!(Opcode::Invokestatic.flow() == FlowType::Call);
        assert!(!FlowType::Call.is_terminator());
        assert!(FlowType::Throw.is_terminator());
    }

    #[test]
    fn mnemonics() {
        assert_eq!(Opcode::IfIcmpge.mnemonic(), "if_icmpge");
        assert_eq!(Opcode::Ldc2W.to_string(), "ldc2_w");
        assert!(Opcode::Iinc.is_widenable());
        assert!(Opcode::Ret.is_widenable());
        assert!(!Opcode::Bipush.is_widenable());
    }
}
