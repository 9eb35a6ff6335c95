use crate::{analysis::ControlFlowGraph, ir::InstructionStream, Error, Result};

/// The code of one method.
///
/// A body owns its [`InstructionStream`] exclusively and caches the control flow graph
/// of the current stream generation. Mutable access to the stream drops the cache; the
/// next [`MethodBody::cfg`] call rebuilds it.
#[derive(Debug, Default)]
pub struct MethodBody {
    /// Maximum operand stack depth
    pub max_stack: u16,
    /// Number of local variable slots
    pub max_locals: u16,
    stream: InstructionStream,
    cfg: Option<ControlFlowGraph>,
}

impl MethodBody {
    /// Creates a body around an existing stream.
    #[must_use]
    pub fn new(max_stack: u16, max_locals: u16, stream: InstructionStream) -> Self {
        MethodBody {
            max_stack,
            max_locals,
            stream,
            cfg: None,
        }
    }

    /// The instruction stream.
    #[must_use]
    pub fn stream(&self) -> &InstructionStream {
        &self.stream
    }

    /// Mutable access to the instruction stream. Invalidates the cached graph.
    pub fn stream_mut(&mut self) -> &mut InstructionStream {
        self.cfg = None;
        &mut self.stream
    }

    /// The control flow graph of the current stream, built on demand.
    ///
    /// # Errors
    /// Returns [`crate::Error::GraphError`] if the stream references an undefined label
    /// or defines a label twice.
    pub fn cfg(&mut self) -> Result<&ControlFlowGraph> {
        let fresh = self
            .cfg
            .as_ref()
            .is_some_and(|cfg| cfg.generation() == self.stream.generation());

        if !fresh {
            self.cfg = Some(ControlFlowGraph::build(&self.stream)?);
        }

        self.cfg
            .as_ref()
            .ok_or_else(|| Error::GraphError("control flow graph missing after build".to_string()))
    }

    /// Returns the stream together with its graph.
    ///
    /// # Errors
    /// Propagates graph construction failures as [`MethodBody::cfg`] does.
    pub fn stream_and_cfg(&mut self) -> Result<(&InstructionStream, &ControlFlowGraph)> {
        self.cfg()?;
        match &self.cfg {
            Some(cfg) => Ok((&self.stream, cfg)),
            None => Err(Error::GraphError(
                "control flow graph missing after build".to_string(),
            )),
        }
    }

    /// Drops the cached graph.
    pub fn invalidate_cfg(&mut self) {
        self.cfg = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::{Entry, Instruction, Opcode};

    #[test]
    fn cfg_is_cached_until_stream_changes() {
        let mut stream = InstructionStream::new();
        let exit = stream.new_label();
        stream.push_back(Entry::Instruction(Instruction::goto(exit)));
        stream.push_back(Entry::Target(exit));
        stream.push_back(Entry::Instruction(Instruction::simple(Opcode::Return)));

        let mut body = MethodBody::new(0, 0, stream);
        let generation = body.cfg().unwrap().generation();
        assert_eq!(body.cfg().unwrap().block_count(), 2);
        assert_eq!(body.cfg().unwrap().generation(), generation);

        let first = body.stream().first().unwrap();
        body.stream_mut().erase(first).unwrap();

        let (stream, cfg) = body.stream_and_cfg().unwrap();
        assert_eq!(cfg.generation(), stream.generation());
        assert_eq!(cfg.block_count(), 1);
    }
}
