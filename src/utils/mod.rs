//! Support code shared by the analysis and transform layers.

mod dot;
pub mod graph;

pub use dot::escape_dot;
