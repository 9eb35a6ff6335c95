//! Program analysis over the instruction stream IR.
//!
//! Currently this is control flow: block partitioning, typed edges, traversal orders
//! and reachability. See [`cfg`].

pub mod cfg;

pub use cfg::{BasicBlock, CfgEdge, CfgEdgeKind, ControlFlowGraph};
