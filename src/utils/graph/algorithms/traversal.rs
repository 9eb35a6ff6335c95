//! Depth-first traversals.
//!
//! - [`dfs`] - lazy pre-order iterator
//! - [`postorder`] - nodes after all their descendants
//! - [`reverse_postorder`] - nodes before their descendants, for forward analyses
//!
//! All traversals are iterative and only visit nodes reachable from the start node.
//! Successors are visited in edge insertion order.

use crate::utils::graph::{NodeId, Successors};

/// Pre-order depth-first iterator returned by [`dfs`].
pub struct DfsIterator<'g, G: Successors> {
    graph: &'g G,
    stack: Vec<NodeId>,
    visited: Vec<bool>,
}

impl<G: Successors> Iterator for DfsIterator<'_, G> {
    type Item = NodeId;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.stack.pop()?;

        // reversed so the first successor is popped first
        let successors: Vec<NodeId> = self.graph.successors(node).collect();
        for &succ in successors.iter().rev() {
            if !self.visited[succ.index()] {
                self.visited[succ.index()] = true;
                self.stack.push(succ);
            }
        }

        Some(node)
    }
}

/// Visits every node reachable from `start` in depth-first pre-order.
///
/// An out-of-range `start` yields nothing.
pub fn dfs<G: Successors>(graph: &G, start: NodeId) -> DfsIterator<'_, G> {
    let node_count = graph.node_count();
    if start.index() >= node_count {
        return DfsIterator {
            graph,
            stack: Vec::new(),
            visited: Vec::new(),
        };
    }

    let mut visited = vec![false; node_count];
    visited[start.index()] = true;

    DfsIterator {
        graph,
        stack: vec![start],
        visited,
    }
}

/// Nodes reachable from `start`, each after all of its depth-first descendants.
#[allow(clippy::items_after_statements)]
pub fn postorder<G: Successors>(graph: &G, start: NodeId) -> Vec<NodeId> {
    let node_count = graph.node_count();
    if start.index() >= node_count {
        return Vec::new();
    }

    #[derive(Clone, Copy)]
    enum State {
        Enter,
        Exit,
    }

    let mut visited = vec![false; node_count];
    let mut result = Vec::with_capacity(node_count);
    let mut stack = vec![(start, State::Enter)];

    while let Some((node, state)) = stack.pop() {
        match state {
            State::Enter => {
                if visited[node.index()] {
                    continue;
                }
                visited[node.index()] = true;
                stack.push((node, State::Exit));

                let successors: Vec<NodeId> = graph.successors(node).collect();
                for &succ in successors.iter().rev() {
                    if !visited[succ.index()] {
                        stack.push((succ, State::Enter));
                    }
                }
            }
            State::Exit => result.push(node),
        }
    }

    result
}

/// The reverse of [`postorder`].
pub fn reverse_postorder<G: Successors>(graph: &G, start: NodeId) -> Vec<NodeId> {
    let mut result = postorder(graph, start);
    result.reverse();
    result
}
