use crate::{
    ir::{EntryId, FlowType, RegionId},
    utils::graph::NodeId,
};

/// A basic block: a contiguous, inclusive range of stream entries.
///
/// Blocks do not own entries. They describe a range of the stream generation their
/// graph was built from and become meaningless once the stream is edited.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BasicBlock {
    /// Ordinal of the block in stream order
    pub id: NodeId,
    /// First entry of the range
    pub first: EntryId,
    /// Last entry of the range, inclusive
    pub last: EntryId,
    /// Number of instruction entries in the range
    pub instruction_count: usize,
    /// The last instruction in the range
    pub last_instruction: Option<EntryId>,
    /// Flow kind of the last instruction
    pub flow: Option<FlowType>,
    /// The last entry of the range is a `goto` or `goto_w`
    pub ends_in_goto: bool,
    /// Protected regions covering the block's instructions, sorted
    pub try_regions: Vec<RegionId>,
    /// Regions whose handler starts in this block
    pub handles: Vec<RegionId>,
    /// The range contains try or catch markers
    pub has_exception_markers: bool,
}

impl BasicBlock {
    /// Returns `true` if the block holds no instructions.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.instruction_count == 0
    }

    /// Returns `true` if exceptions of some region land in this block.
    #[must_use]
    pub fn is_handler(&self) -> bool {
        !self.handles.is_empty()
    }

    /// Returns `true` if the block can continue into the lexically next block.
    #[must_use]
    pub fn falls_through(&self) -> bool {
        self.flow.map_or(true, FlowType::falls_through)
    }

    /// Returns `true` if `region` protects this block.
    #[must_use]
    pub fn is_covered_by(&self, region: RegionId) -> bool {
        self.try_regions.binary_search(&region).is_ok()
    }
}
