//! Generic directed graph infrastructure.
//!
//! The control flow graph is built on these pieces:
//!
//! - [`NodeId`] / [`EdgeId`] - typed indices, so node and edge numbers cannot be mixed up
//! - [`DirectedGraph`] - adjacency-list storage with per-node and per-edge payloads
//! - [`GraphBase`], [`Successors`], [`Predecessors`] - adjacency traits the algorithms are
//!   written against
//! - [`algorithms`] - depth-first traversals
//!
//! # Examples
//!
//! ```rust
//! use jarscope::utils::graph::{algorithms, DirectedGraph};
//!
//! let mut graph: DirectedGraph<char, ()> = DirectedGraph::new();
//! let a = graph.add_node('a');
//! let b = graph.add_node('b');
//! let c = graph.add_node('c');
//! graph.add_edge(a, b, ())?;
//! graph.add_edge(b, c, ())?;
//!
//! assert_eq!(algorithms::reverse_postorder(&graph, a), vec![a, b, c]);
//! # Ok::<(), jarscope::Error>(())
//! ```

mod directed;
mod edge;
mod node;
mod traits;

pub mod algorithms;

pub use directed::DirectedGraph;
pub use edge::EdgeId;
pub use node::NodeId;
pub use traits::{GraphBase, Predecessors, Successors};
