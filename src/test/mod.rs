//! Builders shared by the unit tests.

use std::{collections::HashMap, sync::Arc};

use crate::ir::{
    Entry, Instruction, InstructionStream, Label, MethodBody, Opcode, Operand, Position, RegionId,
    SwitchTable,
};

/// Fluent builder for instruction streams with named labels and regions.
///
/// Names are resolved on first use, so a label can be referenced before its target is
/// placed.
pub struct StreamBuilder {
    stream: InstructionStream,
    labels: HashMap<&'static str, Label>,
    regions: HashMap<&'static str, RegionId>,
}

impl StreamBuilder {
    pub fn new() -> Self {
        Self {
            stream: InstructionStream::new(),
            labels: HashMap::new(),
            regions: HashMap::new(),
        }
    }

    fn label(&mut self, name: &'static str) -> Label {
        if let Some(label) = self.labels.get(name) {
            return *label;
        }
        let label = self.stream.new_label();
        self.labels.insert(name, label);
        label
    }

    fn region(&mut self, name: &'static str) -> RegionId {
        if let Some(region) = self.regions.get(name) {
            return *region;
        }
        let region = self.stream.new_region();
        self.regions.insert(name, region);
        region
    }

    /// Appends an instruction without operand
    pub fn op(mut self, opcode: Opcode) -> Self {
        self.stream
            .push_back(Entry::Instruction(Instruction::simple(opcode)));
        self
    }

    /// Appends a `goto`
    pub fn goto(mut self, label: &'static str) -> Self {
        let label = self.label(label);
        self.stream
            .push_back(Entry::Instruction(Instruction::goto(label)));
        self
    }

    /// Appends a branch of any branching opcode
    pub fn branch(mut self, opcode: Opcode, label: &'static str) -> Self {
        let label = self.label(label);
        self.stream
            .push_back(Entry::Instruction(Instruction::branch(opcode, label)));
        self
    }

    /// Appends a `lookupswitch`
    pub fn switch(mut self, default: &'static str, cases: &[(i32, &'static str)]) -> Self {
        let default = self.label(default);
        let cases = cases
            .iter()
            .map(|(value, name)| (*value, self.label(name)))
            .collect();
        self.stream.push_back(Entry::Instruction(Instruction::new(
            Opcode::Lookupswitch,
            Operand::Switch(SwitchTable { default, cases }),
        )));
        self
    }

    /// Places the target marker of a label
    pub fn target(mut self, label: &'static str) -> Self {
        let label = self.label(label);
        self.stream.push_back(Entry::Target(label));
        self
    }

    pub fn try_start(mut self, region: &'static str) -> Self {
        let region = self.region(region);
        self.stream.push_back(Entry::try_start(region));
        self
    }

    pub fn try_end(mut self, region: &'static str) -> Self {
        let region = self.region(region);
        self.stream.push_back(Entry::try_end(region));
        self
    }

    pub fn catch(mut self, region: &'static str, catch_type: Option<u16>) -> Self {
        let region = self.region(region);
        self.stream.push_back(Entry::catch(region, catch_type));
        self
    }

    pub fn line(mut self, line: u32) -> Self {
        self.stream.push_back(Entry::Position(Arc::new(Position::new(
            line,
            Some(Arc::from("Test.java")),
        ))));
        self
    }

    pub fn build(self) -> InstructionStream {
        self.stream
    }

    pub fn body(self) -> MethodBody {
        MethodBody::new(2, 2, self.stream)
    }
}

/// Opcodes of all instructions in stream order
pub fn opcodes(stream: &InstructionStream) -> Vec<Opcode> {
    stream
        .iter()
        .filter_map(|(_, entry)| entry.as_instruction().map(|i| i.opcode))
        .collect()
}

/// Number of `goto`/`goto_w` instructions
pub fn goto_count(stream: &InstructionStream) -> usize {
    stream.iter().filter(|(_, entry)| entry.is_goto()).count()
}
