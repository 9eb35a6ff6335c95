//! Graph algorithms.
//!
//! Only traversals are needed by the control flow layer: [`dfs`], [`postorder`] and
//! [`reverse_postorder`]. They are generic over [`crate::utils::graph::Successors`].

mod traversal;

pub use traversal::{dfs, postorder, reverse_postorder, DfsIterator};
