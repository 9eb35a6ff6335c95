//! Control flow graph construction over an instruction stream.

use std::{
    collections::{BTreeSet, HashMap, HashSet},
    fmt::Write,
};

use crate::{
    analysis::cfg::{BasicBlock, CfgEdge, CfgEdgeKind},
    ir::{Entry, EntryId, FlowType, InstructionStream, Label, Operand, RegionId, TryKind},
    utils::{
        escape_dot,
        graph::{algorithms, DirectedGraph, EdgeId, NodeId},
    },
    Error::{GraphError, StaleGraph},
    Result,
};

/// Blocks and edges of one instruction stream generation.
///
/// The graph is derived from the stream and never edited: transforms change the stream
/// and build a new graph. Every query that reads stream entries through the graph
/// first checks that the stream is still at the generation the graph was built from.
///
/// # Block boundaries
///
/// A new block starts
///
/// - before a [`Entry::Target`] that some instruction branches to, a try start or a
///   catch marker, if the current block already holds an instruction;
/// - after any instruction that is not [`FlowType::Sequential`] or [`FlowType::Call`],
///   and after a try end marker. Further try end markers stay with the closing block.
///
/// Markers behind the last instruction join the last block, unless a branch refers to
/// them.
///
/// # Edges
///
/// Explicit branch targets first, then fallthrough into the next block when the last
/// instruction does not end control flow, then one exception edge per handler of each
/// region covering the block. Each target appears once per source block.
///
/// # Examples
///
/// ```rust
/// use jarscope::analysis::ControlFlowGraph;
/// use jarscope::ir::{Entry, Instruction, InstructionStream, Opcode};
///
/// let mut stream = InstructionStream::new();
/// let exit = stream.new_label();
/// stream.push_back(Entry::Instruction(Instruction::branch(Opcode::Ifeq, exit)));
/// stream.push_back(Entry::Instruction(Instruction::simple(Opcode::Nop)));
/// stream.push_back(Entry::Target(exit));
/// stream.push_back(Entry::Instruction(Instruction::simple(Opcode::Return)));
///
/// let cfg = ControlFlowGraph::build(&stream)?;
/// assert_eq!(cfg.block_count(), 3);
/// let entry = cfg.entry().unwrap();
/// assert_eq!(cfg.successors(entry).count(), 2);
/// # Ok::<(), jarscope::Error>(())
/// ```
#[derive(Debug, Clone)]
pub struct ControlFlowGraph {
    graph: DirectedGraph<BasicBlock, CfgEdge>,
    entry: Option<NodeId>,
    exits: Vec<NodeId>,
    labels: HashMap<Label, NodeId>,
    generation: u64,
}

struct PendingBlock {
    first: EntryId,
    last: EntryId,
    instruction_count: usize,
    last_instruction: Option<EntryId>,
    flow: Option<FlowType>,
    ends_in_goto: bool,
    try_regions: Option<Vec<RegionId>>,
    handles: Vec<RegionId>,
    has_exception_markers: bool,
    labels: Vec<Label>,
    referenced_label: bool,
}

impl PendingBlock {
    fn new(first: EntryId) -> Self {
        PendingBlock {
            first,
            last: first,
            instruction_count: 0,
            last_instruction: None,
            flow: None,
            ends_in_goto: false,
            try_regions: None,
            handles: Vec::new(),
            has_exception_markers: false,
            labels: Vec::new(),
            referenced_label: false,
        }
    }

    fn absorb(&mut self, trailing: PendingBlock) {
        self.last = trailing.last;
        self.ends_in_goto = false;
        self.handles.extend(trailing.handles);
        self.has_exception_markers |= trailing.has_exception_markers;
        self.labels.extend(trailing.labels);
    }

    fn finish(self, id: NodeId) -> (BasicBlock, Vec<Label>) {
        let block = BasicBlock {
            id,
            first: self.first,
            last: self.last,
            instruction_count: self.instruction_count,
            last_instruction: self.last_instruction,
            flow: self.flow,
            ends_in_goto: self.ends_in_goto,
            try_regions: self.try_regions.unwrap_or_default(),
            handles: self.handles,
            has_exception_markers: self.has_exception_markers,
        };
        (block, self.labels)
    }
}

impl ControlFlowGraph {
    /// Builds the graph of the current stream.
    ///
    /// An empty stream yields a graph without blocks; a stream that holds only markers
    /// yields a single empty block.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::GraphError`] if an instruction branches to a label that
    /// has no target marker, or a label has more than one target marker.
    pub fn build(stream: &InstructionStream) -> Result<Self> {
        let mut referenced: HashSet<Label> = HashSet::new();
        let mut defined: HashSet<Label> = HashSet::new();
        for (_, entry) in stream.iter() {
            match entry {
                Entry::Instruction(instruction) => referenced.extend(instruction.targets()),
                Entry::Target(label) => {
                    if !defined.insert(*label) {
                        return Err(GraphError(format!("label {label} is defined twice")));
                    }
                }
                _ => {}
            }
        }

        let pending = Self::partition(stream, &referenced);

        let mut graph: DirectedGraph<BasicBlock, CfgEdge> =
            DirectedGraph::with_capacity(pending.len(), pending.len() * 2);
        let mut labels: HashMap<Label, NodeId> = HashMap::new();
        for (index, block) in pending.into_iter().enumerate() {
            let (block, block_labels) = block.finish(NodeId::new(index));
            let node = graph.add_node(block);
            for label in block_labels {
                labels.insert(label, node);
            }
        }

        Self::connect(stream, &mut graph, &labels)?;

        let entry = (!graph.is_empty()).then(|| NodeId::new(0));
        let exits = graph.exit_nodes().collect();

        Ok(ControlFlowGraph {
            graph,
            entry,
            exits,
            labels,
            generation: stream.generation(),
        })
    }

    fn partition(stream: &InstructionStream, referenced: &HashSet<Label>) -> Vec<PendingBlock> {
        let mut blocks: Vec<PendingBlock> = Vec::new();
        let mut current: Option<PendingBlock> = None;
        let mut active: BTreeSet<RegionId> = BTreeSet::new();
        let mut split_pending = false;

        for (id, entry) in stream.iter() {
            let boundary = match entry {
                Entry::Target(label) => referenced.contains(label),
                Entry::Try(marker) => marker.kind == TryKind::Start,
                Entry::Catch(_) => true,
                _ => false,
            };
            let closing = matches!(entry, Entry::Try(marker) if marker.kind == TryKind::End);

            let split = current.as_ref().is_some_and(|block| {
                block.instruction_count > 0 && (boundary || (split_pending && !closing))
            });
            if split {
                blocks.extend(current.take());
                split_pending = false;
            }

            let block = current.get_or_insert_with(|| PendingBlock::new(id));
            block.last = id;
            block.ends_in_goto = false;

            match entry {
                Entry::Instruction(instruction) => {
                    block.instruction_count += 1;
                    block.last_instruction = Some(id);
                    block.flow = Some(instruction.flow());
                    block.ends_in_goto = instruction.is_goto();
                    if block.try_regions.is_none() {
                        block.try_regions = Some(active.iter().copied().collect());
                    }
                    if instruction.is_terminator() {
                        split_pending = true;
                    }
                }
                Entry::Target(label) => {
                    block.labels.push(*label);
                    block.referenced_label |= referenced.contains(label);
                }
                Entry::Try(marker) => {
                    block.has_exception_markers = true;
                    match marker.kind {
                        TryKind::Start => {
                            active.insert(marker.region);
                        }
                        TryKind::End => {
                            active.remove(&marker.region);
                            split_pending = true;
                        }
                    }
                }
                Entry::Catch(marker) => {
                    block.has_exception_markers = true;
                    block.handles.push(marker.region);
                }
                Entry::Position(_) => {}
            }
        }

        if let Some(block) = current {
            match blocks.last_mut() {
                Some(previous) if block.instruction_count == 0 && !block.referenced_label => {
                    previous.absorb(block);
                }
                _ => blocks.push(block),
            }
        }

        blocks
    }

    fn connect(
        stream: &InstructionStream,
        graph: &mut DirectedGraph<BasicBlock, CfgEdge>,
        labels: &HashMap<Label, NodeId>,
    ) -> Result<()> {
        let mut handlers: HashMap<RegionId, Vec<(NodeId, Option<u16>)>> = HashMap::new();
        for (node, block) in graph.nodes() {
            for region in &block.handles {
                let catch_type = Self::catch_type(stream, block, *region)?;
                handlers.entry(*region).or_default().push((node, catch_type));
            }
        }

        let block_count = graph.node_count();
        for index in 0..block_count {
            let node = NodeId::new(index);
            let mut edges: Vec<CfgEdge> = Vec::new();

            let Some(block) = graph.node(node) else {
                continue;
            };

            if let Some(last) = block.last_instruction {
                if let Some(instruction) = stream.get(last)?.as_instruction() {
                    match &instruction.operand {
                        Operand::Switch(table) => {
                            let target = Self::resolve(labels, table.default, node)?;
                            add(&mut edges, target, CfgEdgeKind::Switch { case_value: None });
                            for (value, label) in &table.cases {
                                let target = Self::resolve(labels, *label, node)?;
                                let kind = CfgEdgeKind::Switch {
                                    case_value: Some(*value),
                                };
                                add(&mut edges, target, kind);
                            }
                        }
                        _ => {
                            let kind = match instruction.flow() {
                                FlowType::UnconditionalBranch => CfgEdgeKind::Goto,
                                FlowType::Subroutine => CfgEdgeKind::Subroutine,
                                _ => CfgEdgeKind::Branch,
                            };
                            for label in instruction.targets() {
                                let target = Self::resolve(labels, label, node)?;
                                add(&mut edges, target, kind.clone());
                            }
                        }
                    }
                }
            }

            if block.falls_through() && index + 1 < block_count {
                add(&mut edges, NodeId::new(index + 1), CfgEdgeKind::Fallthrough);
            }

            for region in &block.try_regions {
                for (handler, catch_type) in handlers.get(region).into_iter().flatten() {
                    add(
                        &mut edges,
                        *handler,
                        CfgEdgeKind::Exception {
                            region: *region,
                            catch_type: *catch_type,
                        },
                    );
                }
            }

            for edge in edges {
                graph.add_edge(node, edge.target(), edge)?;
            }
        }

        Ok(())
    }

    fn resolve(labels: &HashMap<Label, NodeId>, label: Label, source: NodeId) -> Result<NodeId> {
        labels.get(&label).copied().ok_or_else(|| {
            GraphError(format!(
                "block {source} branches to label {label} which has no target"
            ))
        })
    }

    fn catch_type(
        stream: &InstructionStream,
        block: &BasicBlock,
        region: RegionId,
    ) -> Result<Option<u16>> {
        for (_, entry) in stream.iter_range(block.first, block.last)? {
            if let Entry::Catch(marker) = entry {
                if marker.region == region {
                    return Ok(marker.catch_type);
                }
            }
        }
        Ok(None)
    }

    /// The stream generation this graph describes.
    #[must_use]
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Checks that `stream` has not been edited since the graph was built.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::StaleGraph`] if the generations differ.
    pub fn check_fresh(&self, stream: &InstructionStream) -> Result<()> {
        if stream.generation() != self.generation {
            return Err(StaleGraph {
                built: self.generation,
                current: stream.generation(),
            });
        }
        Ok(())
    }

    /// Number of blocks.
    #[must_use]
    pub fn block_count(&self) -> usize {
        self.graph.node_count()
    }

    /// Number of edges.
    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// The block with id `node`.
    #[must_use]
    pub fn block(&self, node: NodeId) -> Option<&BasicBlock> {
        self.graph.node(node)
    }

    /// All blocks in stream order.
    pub fn blocks(&self) -> impl Iterator<Item = &BasicBlock> + '_ {
        self.graph.nodes().map(|(_, block)| block)
    }

    /// The method entry block, `None` for an empty stream.
    #[must_use]
    pub fn entry(&self) -> Option<NodeId> {
        self.entry
    }

    /// Blocks without successors.
    #[must_use]
    pub fn exits(&self) -> &[NodeId] {
        &self.exits
    }

    /// The block whose range holds the target marker of `label`.
    #[must_use]
    pub fn block_of_label(&self, label: Label) -> Option<NodeId> {
        self.labels.get(&label).copied()
    }

    /// Successor blocks of `node`, in edge order.
    ///
    /// # Panics
    ///
    /// Panics if `node` is not a block of this graph.
    pub fn successors(&self, node: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        self.graph.successors(node)
    }

    /// Predecessor blocks of `node`, in edge order.
    ///
    /// # Panics
    ///
    /// Panics if `node` is not a block of this graph.
    pub fn predecessors(&self, node: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        self.graph.predecessors(node)
    }

    /// Outgoing edges of `node` as `(id, target, edge)`.
    ///
    /// # Panics
    ///
    /// Panics if `node` is not a block of this graph.
    pub fn outgoing_edges(
        &self,
        node: NodeId,
    ) -> impl Iterator<Item = (EdgeId, NodeId, &CfgEdge)> + '_ {
        self.graph.outgoing_edges(node)
    }

    /// Number of successors of `node`.
    #[must_use]
    pub fn out_degree(&self, node: NodeId) -> usize {
        self.graph.out_degree(node)
    }

    /// Number of predecessors of `node`.
    #[must_use]
    pub fn in_degree(&self, node: NodeId) -> usize {
        self.graph.in_degree(node)
    }

    /// The underlying directed graph.
    #[must_use]
    pub fn graph(&self) -> &DirectedGraph<BasicBlock, CfgEdge> {
        &self.graph
    }

    /// Blocks reachable from the entry in reverse postorder.
    #[must_use]
    pub fn reverse_postorder(&self) -> Vec<NodeId> {
        self.entry
            .map(|entry| algorithms::reverse_postorder(&self.graph, entry))
            .unwrap_or_default()
    }

    /// Blocks reachable from the entry in postorder.
    #[must_use]
    pub fn postorder(&self) -> Vec<NodeId> {
        self.entry
            .map(|entry| algorithms::postorder(&self.graph, entry))
            .unwrap_or_default()
    }

    /// Blocks reachable from the entry in depth-first pre-order.
    #[must_use]
    pub fn dfs(&self) -> Vec<NodeId> {
        self.entry
            .map(|entry| algorithms::dfs(&self.graph, entry).collect())
            .unwrap_or_default()
    }

    /// Blocks not reachable from the entry, in stream order.
    #[must_use]
    pub fn unreachable_blocks(&self) -> Vec<NodeId> {
        let mut reached = vec![false; self.block_count()];
        for node in self.dfs() {
            reached[node.index()] = true;
        }
        self.graph
            .node_ids()
            .filter(|node| !reached[node.index()])
            .collect()
    }

    /// Handles of the entries of block `node`, in order.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::StaleGraph`] if `stream` changed since the build, or
    /// [`crate::Error::GraphError`] if `node` is not a block of this graph.
    pub fn block_entries(&self, stream: &InstructionStream, node: NodeId) -> Result<Vec<EntryId>> {
        self.check_fresh(stream)?;
        let block = self
            .block(node)
            .ok_or_else(|| GraphError(format!("no block {node}")))?;
        Ok(stream
            .iter_range(block.first, block.last)?
            .map(|(id, _)| id)
            .collect())
    }

    /// Renders the graph in Graphviz DOT format.
    ///
    /// Every block lists its entries; the entry block is green and exit blocks are red.
    /// Exception edges are dashed.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::StaleGraph`] if `stream` changed since the build.
    pub fn to_dot(&self, stream: &InstructionStream, title: Option<&str>) -> Result<String> {
        self.check_fresh(stream)?;

        let mut dot = String::new();
        dot.push_str("digraph CFG {\n");
        if let Some(name) = title {
            let _ = writeln!(dot, "    label=\"CFG: {}\";", escape_dot(name));
        }
        dot.push_str("    labelloc=t;\n");
        dot.push_str("    node [shape=box, fontname=\"Courier\", fontsize=10];\n");
        dot.push_str("    edge [fontname=\"Courier\", fontsize=9];\n\n");

        for (node, block) in self.graph.nodes() {
            let is_entry = Some(node) == self.entry;
            let is_exit = self.exits.contains(&node);

            let mut label = format!("{node}");
            if is_entry {
                label.push_str(" (entry)");
            }
            if is_exit {
                label.push_str(" (exit)");
            }
            label.push_str("\\l");

            for (_, entry) in stream.iter_range(block.first, block.last)? {
                label.push_str(&escape_dot(&entry.to_string()));
                label.push_str("\\l");
            }

            let style = if is_entry {
                ", style=filled, fillcolor=lightgreen"
            } else if is_exit {
                ", style=filled, fillcolor=lightcoral"
            } else {
                ""
            };
            let _ = writeln!(dot, "    {node} [label=\"{label}\"{style}];");
        }

        dot.push('\n');

        for node in self.graph.node_ids() {
            for (_, target, edge) in self.outgoing_edges(node) {
                let style = if edge.kind().is_exceptional() {
                    ", style=dashed, color=red"
                } else {
                    ""
                };
                let _ = writeln!(
                    dot,
                    "    {node} -> {target} [label=\"{}\"{style}];",
                    escape_dot(&edge.kind().label())
                );
            }
        }

        dot.push_str("}\n");
        Ok(dot)
    }
}

/// Pushes an edge unless `edges` already reaches `target`.
fn add(edges: &mut Vec<CfgEdge>, target: NodeId, kind: CfgEdgeKind) {
    if !edges.iter().any(|edge| edge.target() == target) {
        edges.push(CfgEdge::new(target, kind));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        ir::{Opcode, Position},
        test::StreamBuilder,
        Error,
    };

    fn nodes(raw: &[usize]) -> Vec<NodeId> {
        raw.iter().copied().map(NodeId::new).collect()
    }

    fn kinds(cfg: &ControlFlowGraph, node: usize) -> Vec<(NodeId, CfgEdgeKind)> {
        cfg.outgoing_edges(NodeId::new(node))
            .map(|(_, target, edge)| (target, edge.kind().clone()))
            .collect()
    }

    #[test]
    fn straight_line_is_one_block() {
        let stream = StreamBuilder::new()
            .op(Opcode::Iconst0)
            .op(Opcode::Ireturn)
            .build();

        let cfg = ControlFlowGraph::build(&stream).unwrap();
        assert_eq!(cfg.block_count(), 1);
        assert_eq!(cfg.edge_count(), 0);
        assert_eq!(cfg.entry(), Some(NodeId::new(0)));
        assert_eq!(cfg.exits(), nodes(&[0]).as_slice());
        assert_eq!(cfg.generation(), stream.generation());
    }

    #[test]
    fn conditional_diamond() {
        let stream = StreamBuilder::new()
            .op(Opcode::Iload0)
            .branch(Opcode::Ifeq, "else")
            .op(Opcode::Iconst1)
            .goto("end")
            .target("else")
            .op(Opcode::Iconst0)
            .target("end")
            .op(Opcode::Ireturn)
            .build();

        let cfg = ControlFlowGraph::build(&stream).unwrap();
        assert_eq!(cfg.block_count(), 4);

        assert_eq!(
            kinds(&cfg, 0),
            vec![
                (NodeId::new(2), CfgEdgeKind::Branch),
                (NodeId::new(1), CfgEdgeKind::Fallthrough),
            ]
        );
        assert_eq!(kinds(&cfg, 1), vec![(NodeId::new(3), CfgEdgeKind::Goto)]);
        assert_eq!(kinds(&cfg, 2), vec![(NodeId::new(3), CfgEdgeKind::Fallthrough)]);
        assert_eq!(
            cfg.predecessors(NodeId::new(3)).collect::<Vec<_>>(),
            nodes(&[1, 2])
        );

        let b1 = cfg.block(NodeId::new(1)).unwrap();
        assert!(b1.ends_in_goto);
        assert_eq!(b1.instruction_count, 2);
        assert_eq!(cfg.exits(), nodes(&[3]).as_slice());
        assert_eq!(cfg.reverse_postorder(), nodes(&[0, 1, 2, 3]));
        assert!(cfg.unreachable_blocks().is_empty());
    }

    #[test]
    fn unreferenced_markers_do_not_split() {
        let stream = StreamBuilder::new()
            .op(Opcode::Nop)
            .target("unused")
            .line(3)
            .op(Opcode::Nop)
            .op(Opcode::Return)
            .build();

        let cfg = ControlFlowGraph::build(&stream).unwrap();
        assert_eq!(cfg.block_count(), 1);
        assert_eq!(cfg.block(NodeId::new(0)).unwrap().instruction_count, 3);
    }

    #[test]
    fn entries_after_terminator_open_a_block() {
        let stream = StreamBuilder::new()
            .goto("exit")
            .line(7)
            .op(Opcode::Nop)
            .target("exit")
            .op(Opcode::Return)
            .build();

        let cfg = ControlFlowGraph::build(&stream).unwrap();
        assert_eq!(cfg.block_count(), 3);
        assert_eq!(cfg.unreachable_blocks(), nodes(&[1]));

        let entries = cfg.block_entries(&stream, NodeId::new(1)).unwrap();
        assert_eq!(entries.len(), 2);
        assert!(matches!(stream.get(entries[0]).unwrap(), Entry::Position(p) if p.line == 7));
    }

    #[test]
    fn trailing_markers_join_last_block() {
        let stream = StreamBuilder::new()
            .op(Opcode::Return)
            .line(9)
            .target("unused")
            .build();

        let cfg = ControlFlowGraph::build(&stream).unwrap();
        assert_eq!(cfg.block_count(), 1);
        let block = cfg.block(NodeId::new(0)).unwrap();
        assert_eq!(Some(block.last), stream.last());
        assert!(!block.ends_in_goto);
    }

    #[test]
    fn exception_edges_reach_handlers() {
        let stream = StreamBuilder::new()
            .try_start("r")
            .op(Opcode::Nop)
            .try_end("r")
            .op(Opcode::Return)
            .catch("r", Some(12))
            .op(Opcode::Astore1)
            .op(Opcode::Return)
            .build();

        let cfg = ControlFlowGraph::build(&stream).unwrap();
        assert_eq!(cfg.block_count(), 3);

        let region = RegionId(0);
        assert_eq!(
            kinds(&cfg, 0),
            vec![
                (NodeId::new(1), CfgEdgeKind::Fallthrough),
                (
                    NodeId::new(2),
                    CfgEdgeKind::Exception {
                        region,
                        catch_type: Some(12)
                    }
                ),
            ]
        );

        let protected = cfg.block(NodeId::new(0)).unwrap();
        assert!(protected.is_covered_by(region));
        assert!(protected.has_exception_markers);

        let after = cfg.block(NodeId::new(1)).unwrap();
        assert!(after.try_regions.is_empty());

        let handler = cfg.block(NodeId::new(2)).unwrap();
        assert!(handler.is_handler());
        assert_eq!(
            cfg.predecessors(NodeId::new(2)).collect::<Vec<_>>(),
            nodes(&[0])
        );
    }

    #[test]
    fn consecutive_try_ends_stay_together() {
        let stream = StreamBuilder::new()
            .try_start("outer")
            .try_start("inner")
            .op(Opcode::Nop)
            .try_end("inner")
            .try_end("outer")
            .op(Opcode::Return)
            .catch("inner", None)
            .catch("outer", None)
            .op(Opcode::Athrow)
            .build();

        let cfg = ControlFlowGraph::build(&stream).unwrap();
        assert_eq!(cfg.block_count(), 3);
        assert_eq!(cfg.block(NodeId::new(0)).unwrap().try_regions.len(), 2);
        assert_eq!(cfg.block(NodeId::new(2)).unwrap().handles.len(), 2);
        // both regions share one handler block, so a single deduplicated edge
        assert_eq!(cfg.out_degree(NodeId::new(0)), 2);
    }

    #[test]
    fn switch_edges_are_deduplicated() {
        let stream = StreamBuilder::new()
            .op(Opcode::Iload0)
            .switch("dflt", &[(1, "one"), (2, "one")])
            .target("one")
            .op(Opcode::Return)
            .target("dflt")
            .op(Opcode::Return)
            .build();

        let cfg = ControlFlowGraph::build(&stream).unwrap();
        assert_eq!(
            kinds(&cfg, 0),
            vec![
                (NodeId::new(2), CfgEdgeKind::Switch { case_value: None }),
                (
                    NodeId::new(1),
                    CfgEdgeKind::Switch {
                        case_value: Some(1)
                    }
                ),
            ]
        );
    }

    #[test]
    fn label_errors() {
        let undefined = StreamBuilder::new().goto("nowhere").build();
        assert!(matches!(
            ControlFlowGraph::build(&undefined),
            Err(Error::GraphError(_))
        ));

        let duplicate = StreamBuilder::new()
            .target("twice")
            .op(Opcode::Nop)
            .target("twice")
            .op(Opcode::Return)
            .build();
        assert!(matches!(
            ControlFlowGraph::build(&duplicate),
            Err(Error::GraphError(_))
        ));
    }

    #[test]
    fn degenerate_streams() {
        let empty = InstructionStream::new();
        let cfg = ControlFlowGraph::build(&empty).unwrap();
        assert_eq!(cfg.block_count(), 0);
        assert_eq!(cfg.entry(), None);
        assert!(cfg.reverse_postorder().is_empty());

        let mut markers = InstructionStream::new();
        markers.push_back(Entry::Position(std::sync::Arc::new(Position::new(1, None))));
        let cfg = ControlFlowGraph::build(&markers).unwrap();
        assert_eq!(cfg.block_count(), 1);
        assert!(cfg.block(NodeId::new(0)).unwrap().is_empty());
    }

    #[test]
    fn stale_graph_is_rejected() {
        let mut stream = StreamBuilder::new()
            .op(Opcode::Nop)
            .op(Opcode::Return)
            .build();
        let cfg = ControlFlowGraph::build(&stream).unwrap();
        assert!(cfg.check_fresh(&stream).is_ok());

        let first = stream.first().unwrap();
        stream.erase(first).unwrap();

        assert!(matches!(
            cfg.block_entries(&stream, NodeId::new(0)),
            Err(Error::StaleGraph { .. })
        ));
        assert!(matches!(
            cfg.to_dot(&stream, None),
            Err(Error::StaleGraph { built, current }) if built < current
        ));
    }

    #[test]
    fn dot_output() {
        let stream = StreamBuilder::new()
            .try_start("r")
            .op(Opcode::Nop)
            .try_end("r")
            .goto("done")
            .catch("r", None)
            .op(Opcode::Athrow)
            .target("done")
            .op(Opcode::Return)
            .build();

        let cfg = ControlFlowGraph::build(&stream).unwrap();
        let dot = cfg.to_dot(&stream, Some("Foo.<init>()V")).unwrap();

        assert!(dot.starts_with("digraph CFG {"));
        assert!(dot.contains("label=\"CFG: Foo.\\<init\\>()V\""));
        assert!(dot.contains("B0 (entry)"));
        assert!(dot.contains("B0 -> B2 [label=\"catch R0\", style=dashed, color=red];"));
        assert!(dot.contains("B1 -> B3"));
        assert!(dot.trim_end().ends_with('}'));
    }
}
