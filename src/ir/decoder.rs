//! Bytecode decoder.
//!
//! Turns the contents of a `Code` attribute into an [`InstructionStream`]. Decoding runs
//! in two passes: the first walks the bytecode, decodes every instruction and records
//! instruction boundaries and raw branch offsets; the second validates every target
//! against those boundaries, allocates labels and emits entries with their markers.
//!
//! Marker order at a bytecode offset is fixed: region ends, handler starts, region starts,
//! the branch target, source positions and finally the instruction itself.

use std::{collections::BTreeMap, sync::Arc};

use log::warn;

use crate::{
    file::parser::Parser,
    ir::{
        opcode::WIDE, Entry, Instruction, InstructionStream, Label, MethodBody, Opcode, Operand,
        OperandKind, Position, SwitchTable,
    },
    Result,
};

/// One row of a method's exception table, as stored in the class file.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ExceptionHandler {
    /// First protected offset
    pub start_pc: u16,
    /// First offset after the protected range
    pub end_pc: u16,
    /// Offset of the handler code
    pub handler_pc: u16,
    /// Constant pool index of the caught class, `0` catches everything
    pub catch_type: u16,
}

/// One row of a `LineNumberTable`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LineNumber {
    /// Offset of the first instruction on this line
    pub start_pc: u16,
    /// Source line
    pub line: u16,
}

/// The undecoded parts of a `Code` attribute.
#[derive(Clone, Debug, Default)]
pub struct RawCode<'a> {
    /// Maximum operand stack depth
    pub max_stack: u16,
    /// Number of local variable slots
    pub max_locals: u16,
    /// The bytecode
    pub code: &'a [u8],
    /// Exception table rows in table order
    pub exception_table: Vec<ExceptionHandler>,
    /// Line number rows, from every `LineNumberTable` of the attribute
    pub line_numbers: Vec<LineNumber>,
}

enum RawOperand {
    Ready(Operand),
    Branch(usize),
    Switch {
        default: usize,
        cases: Vec<(i32, usize)>,
    },
}

struct RawInstruction {
    pc: usize,
    opcode: Opcode,
    operand: RawOperand,
}

/// Decodes a complete method body.
///
/// `source_file` is attached to every position marker.
///
/// # Errors
/// Returns [`crate::Error::Malformed`] for unknown opcodes, branches or exception ranges
/// that do not land on an instruction boundary, and inconsistent switch tables, and
/// [`crate::Error::OutOfBounds`] if the bytecode ends inside an instruction.
pub fn decode_body(raw: &RawCode<'_>, source_file: Option<Arc<str>>) -> Result<MethodBody> {
    let stream = decode(raw.code, &raw.exception_table, &raw.line_numbers, source_file)?;
    Ok(MethodBody::new(raw.max_stack, raw.max_locals, stream))
}

/// Decodes bytecode with its exception and line tables into a stream.
///
/// # Errors
/// See [`decode_body`].
pub fn decode(
    code: &[u8],
    exception_table: &[ExceptionHandler],
    line_numbers: &[LineNumber],
    source_file: Option<Arc<str>>,
) -> Result<InstructionStream> {
    let code_len = code.len();
    let instructions = decode_instructions(code)?;

    let mut boundary = vec![false; code_len];
    for instruction in &instructions {
        boundary[instruction.pc] = true;
    }
    let is_boundary = |pc: usize| pc < code_len && boundary[pc];

    let mut stream = InstructionStream::new();

    let mut labels: BTreeMap<usize, Label> = BTreeMap::new();
    for instruction in &instructions {
        let targets: Vec<usize> = match &instruction.operand {
            RawOperand::Ready(_) => continue,
            RawOperand::Branch(target) => vec![*target],
            RawOperand::Switch { default, cases } => std::iter::once(*default)
                .chain(cases.iter().map(|(_, target)| *target))
                .collect(),
        };

        for target in targets {
            if !is_boundary(target) {
                return Err(malformed_error!(
                    "Branch at {} targets offset {} which is not an instruction",
                    instruction.pc,
                    target
                ));
            }
            labels
                .entry(target)
                .or_insert_with(|| stream.new_label());
        }
    }

    // markers to emit before the instruction at each offset; index code_len holds the
    // region ends that close after the last instruction
    let mut try_ends: Vec<Vec<Entry>> = vec![Vec::new(); code_len + 1];
    let mut catches: Vec<Vec<Entry>> = vec![Vec::new(); code_len + 1];
    let mut try_starts: Vec<Vec<Entry>> = vec![Vec::new(); code_len + 1];

    for handler in exception_table {
        let (start, end, target) = (
            usize::from(handler.start_pc),
            usize::from(handler.end_pc),
            usize::from(handler.handler_pc),
        );

        if start == end {
            warn!("Ignoring empty exception range at offset {}", start);
            continue;
        }
        if start > end {
            return Err(malformed_error!(
                "Exception range {}..{} is inverted",
                start,
                end
            ));
        }
        if !is_boundary(start) || !(is_boundary(end) || end == code_len) || !is_boundary(target) {
            return Err(malformed_error!(
                "Exception range {}..{} -> {} does not align with instructions",
                start,
                end,
                target
            ));
        }

        let region = stream.new_region();
        let catch_type = (handler.catch_type != 0).then_some(handler.catch_type);

        try_starts[start].push(Entry::try_start(region));
        try_ends[end].push(Entry::try_end(region));
        catches[target].push(Entry::catch(region, catch_type));
    }

    let mut positions: Vec<Vec<Entry>> = vec![Vec::new(); code_len];
    for line in line_numbers {
        let pc = usize::from(line.start_pc);
        if !is_boundary(pc) {
            warn!("Ignoring line number {} at offset {}", line.line, pc);
            continue;
        }
        positions[pc].push(Entry::Position(Arc::new(Position::new(
            u32::from(line.line),
            source_file.clone(),
        ))));
    }

    for instruction in instructions {
        let pc = instruction.pc;

        for entry in try_ends[pc]
            .drain(..)
            .chain(catches[pc].drain(..))
            .chain(try_starts[pc].drain(..))
        {
            stream.push_back(entry);
        }
        if let Some(label) = labels.get(&pc) {
            stream.push_back(Entry::Target(*label));
        }
        for entry in positions[pc].drain(..) {
            stream.push_back(entry);
        }

        let operand = match instruction.operand {
            RawOperand::Ready(operand) => operand,
            RawOperand::Branch(target) => Operand::Branch(resolve(&labels, target)?),
            RawOperand::Switch { default, cases } => Operand::Switch(SwitchTable {
                default: resolve(&labels, default)?,
                cases: cases
                    .into_iter()
                    .map(|(value, target)| Ok((value, resolve(&labels, target)?)))
                    .collect::<Result<Vec<_>>>()?,
            }),
        };

        stream.push_back(Entry::Instruction(Instruction::new(
            instruction.opcode,
            operand,
        )));
    }

    for entry in try_ends[code_len].drain(..) {
        stream.push_back(entry);
    }

    Ok(stream)
}

fn resolve(labels: &BTreeMap<usize, Label>, target: usize) -> Result<Label> {
    labels
        .get(&target)
        .copied()
        .ok_or_else(|| malformed_error!("No label allocated for offset {}", target))
}

fn branch_target(pc: usize, offset: i64, code_len: usize) -> Result<usize> {
    let target = pc as i64 + offset;
    if target < 0 || target >= code_len as i64 {
        return Err(malformed_error!(
            "Branch at {} with offset {} leaves the method",
            pc,
            offset
        ));
    }
    Ok(target as usize)
}

fn decode_instructions(code: &[u8]) -> Result<Vec<RawInstruction>> {
    let code_len = code.len();
    let mut parser = Parser::new(code);
    let mut instructions = Vec::new();

    while parser.has_more_data() {
        let pc = parser.pos();
        let byte = parser.read_be::<u8>()?;

        if byte == WIDE {
            let byte = parser.read_be::<u8>()?;
            let opcode = match Opcode::from_byte(byte) {
                Some(opcode) if opcode.is_widenable() => opcode,
                _ => {
                    return Err(malformed_error!(
                        "Opcode 0x{:02X} at {} cannot be widened",
                        byte,
                        pc
                    ))
                }
            };

            let index = parser.read_be::<u16>()?;
            let operand = if opcode == Opcode::Iinc {
                Operand::Iinc {
                    index,
                    delta: parser.read_be::<i16>()?,
                }
            } else {
                Operand::Local(index)
            };

            instructions.push(RawInstruction {
                pc,
                opcode,
                operand: RawOperand::Ready(operand),
            });
            continue;
        }

        let Some(opcode) = Opcode::from_byte(byte) else {
            return Err(malformed_error!("Invalid opcode 0x{:02X} at {}", byte, pc));
        };

        let operand = match opcode.operand_kind() {
            OperandKind::None => RawOperand::Ready(Operand::None),
            OperandKind::Byte => {
                RawOperand::Ready(Operand::Int(i32::from(parser.read_be::<i8>()?)))
            }
            OperandKind::Short => {
                RawOperand::Ready(Operand::Int(i32::from(parser.read_be::<i16>()?)))
            }
            OperandKind::ConstIndex8 => {
                RawOperand::Ready(Operand::Constant(u16::from(parser.read_be::<u8>()?)))
            }
            OperandKind::ConstIndex16 => {
                RawOperand::Ready(Operand::Constant(parser.read_be::<u16>()?))
            }
            OperandKind::Local => {
                RawOperand::Ready(Operand::Local(u16::from(parser.read_be::<u8>()?)))
            }
            OperandKind::Iinc => {
                let index = u16::from(parser.read_be::<u8>()?);
                let delta = i16::from(parser.read_be::<i8>()?);
                RawOperand::Ready(Operand::Iinc { index, delta })
            }
            OperandKind::Branch16 => {
                let offset = i64::from(parser.read_be::<i16>()?);
                RawOperand::Branch(branch_target(pc, offset, code_len)?)
            }
            OperandKind::Branch32 => {
                let offset = i64::from(parser.read_be::<i32>()?);
                RawOperand::Branch(branch_target(pc, offset, code_len)?)
            }
            OperandKind::TableSwitch => {
                parser.align(4)?;
                let default = branch_target(pc, i64::from(parser.read_be::<i32>()?), code_len)?;
                let low = parser.read_be::<i32>()?;
                let high = parser.read_be::<i32>()?;
                if low > high {
                    return Err(malformed_error!(
                        "tableswitch at {} has low {} above high {}",
                        pc,
                        low,
                        high
                    ));
                }

                let count = (i64::from(high) - i64::from(low) + 1) as usize;
                parser.ensure_remaining(count.saturating_mul(4))?;

                let mut cases = Vec::with_capacity(count);
                for value in low..=high {
                    let offset = i64::from(parser.read_be::<i32>()?);
                    cases.push((value, branch_target(pc, offset, code_len)?));
                }
                RawOperand::Switch { default, cases }
            }
            OperandKind::LookupSwitch => {
                parser.align(4)?;
                let default = branch_target(pc, i64::from(parser.read_be::<i32>()?), code_len)?;
                let npairs = parser.read_be::<i32>()?;
                if npairs < 0 {
                    return Err(malformed_error!(
                        "lookupswitch at {} has negative pair count {}",
                        pc,
                        npairs
                    ));
                }

                let count = npairs as usize;
                parser.ensure_remaining(count.saturating_mul(8))?;

                let mut cases = Vec::with_capacity(count);
                for _ in 0..count {
                    let value = parser.read_be::<i32>()?;
                    let offset = i64::from(parser.read_be::<i32>()?);
                    cases.push((value, branch_target(pc, offset, code_len)?));
                }
                RawOperand::Switch { default, cases }
            }
            OperandKind::InvokeInterface => {
                let index = parser.read_be::<u16>()?;
                let count = parser.read_be::<u8>()?;
                parser.advance_by(1)?;
                RawOperand::Ready(Operand::InvokeInterface { index, count })
            }
            OperandKind::InvokeDynamic => {
                let index = parser.read_be::<u16>()?;
                parser.advance_by(2)?;
                RawOperand::Ready(Operand::Constant(index))
            }
            OperandKind::NewArray => RawOperand::Ready(Operand::ArrayType(parser.read_be::<u8>()?)),
            OperandKind::MultiANewArray => {
                let index = parser.read_be::<u16>()?;
                let dimensions = parser.read_be::<u8>()?;
                RawOperand::Ready(Operand::MultiArray { index, dimensions })
            }
        };

        instructions.push(RawInstruction {
            pc,
            opcode,
            operand,
        });
    }

    Ok(instructions)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;

    fn listing(stream: &InstructionStream) -> String {
        stream.to_string()
    }

    #[test]
    fn branches_become_labels() {
        let code = [
            0x03, // 0: iconst_0
            0x99, 0x00, 0x06, // 1: ifeq 7
            0xA7, 0x00, 0x04, // 4: goto 8
            0x00, // 7: nop
            0xB1, // 8: return
        ];

        let stream = decode(&code, &[], &[], None).unwrap();
        assert_eq!(
            listing(&stream),
            "    iconst_0\n    ifeq L0\n    goto L1\n  L0:\n    nop\n  L1:\n    return\n"
        );
        assert_eq!(stream.count_instructions(), 5);
    }

    #[test]
    fn backward_branch() {
        let code = [
            0x00, // 0: nop
            0xA7, 0xFF, 0xFF, // 1: goto 0
        ];

        let stream = decode(&code, &[], &[], None).unwrap();
        assert_eq!(listing(&stream), "  L0:\n    nop\n    goto L0\n");
    }

    #[test]
    fn tableswitch_padding() {
        let mut code = vec![0x1A, 0xAA, 0x00, 0x00];
        code.extend_from_slice(&27_i32.to_be_bytes()); // default -> 28
        code.extend_from_slice(&0_i32.to_be_bytes()); // low
        code.extend_from_slice(&1_i32.to_be_bytes()); // high
        code.extend_from_slice(&23_i32.to_be_bytes()); // 0 -> 24
        code.extend_from_slice(&25_i32.to_be_bytes()); // 1 -> 26
        code.extend_from_slice(&[0x04, 0xAC, 0x05, 0xAC, 0x03, 0xAC]);
        assert_eq!(code.len(), 30);

        let stream = decode(&code, &[], &[], None).unwrap();
        let switch = stream
            .iter()
            .find_map(|(_, e)| e.as_instruction().filter(|i| i.opcode == Opcode::Tableswitch))
            .unwrap();

        assert_eq!(
            switch.operand,
            Operand::Switch(SwitchTable {
                default: Label(0),
                cases: vec![(0, Label(1)), (1, Label(2))],
            })
        );
        assert!(stream.find_label(Label(0)).is_some());
        assert!(stream.find_label(Label(2)).is_some());
    }

    #[test]
    fn lookupswitch_padding() {
        // lookupswitch at offset 2 pads one byte
        let mut code = vec![0x1A, 0x00, 0xAB, 0x00];
        code.extend_from_slice(&18_i32.to_be_bytes()); // default -> 20
        code.extend_from_slice(&1_i32.to_be_bytes()); // npairs
        code.extend_from_slice(&(-5_i32).to_be_bytes());
        code.extend_from_slice(&19_i32.to_be_bytes()); // -5 -> 21
        code.extend_from_slice(&[0xB1, 0xB1]);

        let stream = decode(&code, &[], &[], None).unwrap();
        let switch = stream
            .iter()
            .find_map(|(_, e)| e.as_instruction().filter(|i| i.opcode == Opcode::Lookupswitch))
            .unwrap();
        assert_eq!(
            switch.operand,
            Operand::Switch(SwitchTable {
                default: Label(0),
                cases: vec![(-5, Label(1))],
            })
        );
    }

    #[test]
    fn wide_and_goto_w() {
        let code = [
            0xC4, 0x15, 0x01, 0x00, // 0: wide iload 256
            0xC4, 0x84, 0x00, 0x05, 0xFF, 0xFF, // 4: wide iinc 5, -1
            0xC8, 0x00, 0x00, 0x00, 0x05, // 10: goto_w 15
            0xB1, // 15: return
        ];

        let stream = decode(&code, &[], &[], None).unwrap();
        let instructions: Vec<&Instruction> =
            stream.iter().filter_map(|(_, e)| e.as_instruction()).collect();

        assert_eq!(instructions[0].operand, Operand::Local(256));
        assert_eq!(
            instructions[1].operand,
            Operand::Iinc {
                index: 5,
                delta: -1
            }
        );
        assert_eq!(instructions[2].opcode, Opcode::GotoW);
        assert!(instructions[2].is_goto());
        assert_eq!(instructions[3].opcode, Opcode::Return);
    }

    #[test]
    fn exception_table_markers() {
        let code = [
            0x00, // 0: nop
            0x00, // 1: nop
            0xB1, // 2: return
            0x4C, // 3: astore_1
            0xB1, // 4: return
        ];
        let handlers = [ExceptionHandler {
            start_pc: 0,
            end_pc: 2,
            handler_pc: 3,
            catch_type: 7,
        }];

        let stream = decode(&code, &handlers, &[], None).unwrap();
        assert_eq!(
            listing(&stream),
            "  .try_start R0\n    nop\n    nop\n  .try_end R0\n    return\n  .catch R0 #7\n    astore_1\n    return\n"
        );
    }

    #[test]
    fn region_ending_at_code_end() {
        let code = [0x00, 0xB1];
        let handlers = [ExceptionHandler {
            start_pc: 0,
            end_pc: 2,
            handler_pc: 0,
            catch_type: 0,
        }];

        let stream = decode(&code, &handlers, &[], None).unwrap();
        assert_eq!(
            listing(&stream),
            "  .catch R0 any\n  .try_start R0\n    nop\n    return\n  .try_end R0\n"
        );
    }

    #[test]
    fn line_numbers_become_positions() {
        let code = [0x00, 0xB1];
        let lines = [
            LineNumber {
                start_pc: 0,
                line: 10,
            },
            LineNumber {
                start_pc: 1,
                line: 11,
            },
        ];

        let stream = decode(&code, &[], &lines, Some(Arc::from("A.java"))).unwrap();
        assert_eq!(
            listing(&stream),
            "  .line A.java:10\n    nop\n  .line A.java:11\n    return\n"
        );
    }

    #[test]
    fn malformed_bytecode() {
        // branch into the operand of another instruction
        let code = [0xA7, 0x00, 0x04, 0x10, 0x05, 0xB1];
        assert!(matches!(
            decode(&code, &[], &[], None),
            Err(Error::Malformed { .. })
        ));

        // truncated operand
        assert!(matches!(
            decode(&[0x11, 0x00], &[], &[], None),
            Err(Error::OutOfBounds)
        ));

        // reserved opcode
        assert!(matches!(
            decode(&[0xFE], &[], &[], None),
            Err(Error::Malformed { .. })
        ));

        // wide on an opcode without local operand
        assert!(matches!(
            decode(&[0xC4, 0x10, 0x00, 0x00], &[], &[], None),
            Err(Error::Malformed { .. })
        ));
    }
}
