//! Control flow graphs over instruction streams.
//!
//! [`ControlFlowGraph::build`] partitions a stream into [`BasicBlock`]s and connects them
//! with typed [`CfgEdge`]s. Graphs are snapshots: they remember the stream generation
//! they were built from and refuse to read entries from a stream that has moved on.
//!
//! # Edge Types
//!
//! - **Goto** / **Branch** / **Subroutine**: explicit targets of the block's last
//!   instruction
//! - **Switch**: default and case targets of `tableswitch` and `lookupswitch`
//! - **Fallthrough**: into the lexically next block
//! - **Exception**: from every block of a protected region to the region's handler
//!
//! # Examples
//!
//! ```rust
//! use jarscope::ir::decoder;
//! use jarscope::analysis::{CfgEdgeKind, ControlFlowGraph};
//!
//! // 0: goto 4; 3: nop; 4: return
//! let stream = decoder::decode(&[0xA7, 0x00, 0x04, 0x00, 0xB1], &[], &[], None)?;
//! let cfg = ControlFlowGraph::build(&stream)?;
//!
//! assert_eq!(cfg.block_count(), 3);
//! assert_eq!(cfg.unreachable_blocks().len(), 1);
//! let entry = cfg.entry().unwrap();
//! let (_, _, edge) = cfg.outgoing_edges(entry).next().unwrap();
//! assert_eq!(edge.kind(), &CfgEdgeKind::Goto);
//! # Ok::<(), jarscope::Error>(())
//! ```

mod block;
mod edge;
mod graph;

pub use block::BasicBlock;
pub use edge::{CfgEdge, CfgEdgeKind};
pub use graph::ControlFlowGraph;
