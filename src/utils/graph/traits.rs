//! Adjacency traits shared by graph algorithms.
//!
//! Traversals are written against these traits rather than a concrete graph type, so
//! they run unchanged on [`crate::utils::graph::DirectedGraph`] and on views built over
//! it.

use crate::utils::graph::NodeId;

/// Node count and node enumeration.
pub trait GraphBase {
    /// Number of nodes.
    fn node_count(&self) -> usize;

    /// All node ids, in ascending order.
    fn node_ids(&self) -> impl Iterator<Item = NodeId>;
}

/// Forward adjacency.
pub trait Successors: GraphBase {
    /// Targets of the edges leaving `node`, in edge insertion order.
    fn successors(&self, node: NodeId) -> impl Iterator<Item = NodeId>;
}

/// Backward adjacency.
pub trait Predecessors: GraphBase {
    /// Sources of the edges entering `node`, in edge insertion order.
    fn predecessors(&self, node: NodeId) -> impl Iterator<Item = NodeId>;
}
