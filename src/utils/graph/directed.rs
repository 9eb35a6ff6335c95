//! Adjacency-list directed graph.
//!
//! [`DirectedGraph`] stores node data and edge data in two vectors indexed by
//! [`NodeId`] and [`EdgeId`], plus per-node lists of outgoing and incoming edge ids.
//! Both directions are maintained on every insertion, so predecessor queries cost the
//! same as successor queries. Graphs are built once and then only read; there is no
//! node or edge removal.

use crate::{
    utils::graph::{
        edge::EdgeId,
        node::NodeId,
        traits::{GraphBase, Predecessors, Successors},
    },
    Error, Result,
};

#[derive(Debug, Clone)]
struct EdgeData<E> {
    source: NodeId,
    target: NodeId,
    data: E,
}

/// A directed graph with node data `N` and edge data `E`.
///
/// Parallel edges and self loops are allowed; callers that need unique edges dedupe
/// before inserting.
///
/// # Examples
///
/// ```rust
/// use jarscope::utils::graph::DirectedGraph;
///
/// let mut graph: DirectedGraph<&str, ()> = DirectedGraph::new();
/// let a = graph.add_node("A");
/// let b = graph.add_node("B");
/// graph.add_edge(a, b, ())?;
///
/// assert_eq!(graph.successors(a).collect::<Vec<_>>(), vec![b]);
/// assert_eq!(graph.predecessors(b).collect::<Vec<_>>(), vec![a]);
/// # Ok::<(), jarscope::Error>(())
/// ```
#[derive(Debug, Clone)]
pub struct DirectedGraph<N, E> {
    nodes: Vec<N>,
    edges: Vec<EdgeData<E>>,
    outgoing: Vec<Vec<EdgeId>>,
    incoming: Vec<Vec<EdgeId>>,
}

impl<N, E> Default for DirectedGraph<N, E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<N, E> DirectedGraph<N, E> {
    /// Creates an empty graph.
    #[must_use]
    pub fn new() -> Self {
        DirectedGraph {
            nodes: Vec::new(),
            edges: Vec::new(),
            outgoing: Vec::new(),
            incoming: Vec::new(),
        }
    }

    /// Creates an empty graph with preallocated storage.
    #[must_use]
    pub fn with_capacity(node_capacity: usize, edge_capacity: usize) -> Self {
        DirectedGraph {
            nodes: Vec::with_capacity(node_capacity),
            edges: Vec::with_capacity(edge_capacity),
            outgoing: Vec::with_capacity(node_capacity),
            incoming: Vec::with_capacity(node_capacity),
        }
    }

    /// Adds a node and returns its id.
    pub fn add_node(&mut self, data: N) -> NodeId {
        let id = NodeId::new(self.nodes.len());
        self.nodes.push(data);
        self.outgoing.push(Vec::new());
        self.incoming.push(Vec::new());
        id
    }

    /// Adds an edge from `source` to `target`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::GraphError`] if either endpoint is not a node of this graph.
    pub fn add_edge(&mut self, source: NodeId, target: NodeId, data: E) -> Result<EdgeId> {
        if source.index() >= self.nodes.len() {
            return Err(Error::GraphError(format!(
                "source node {} does not exist in graph with {} nodes",
                source,
                self.nodes.len()
            )));
        }
        if target.index() >= self.nodes.len() {
            return Err(Error::GraphError(format!(
                "target node {} does not exist in graph with {} nodes",
                target,
                self.nodes.len()
            )));
        }

        let id = EdgeId::new(self.edges.len());
        self.edges.push(EdgeData {
            source,
            target,
            data,
        });
        self.outgoing[source.index()].push(id);
        self.incoming[target.index()].push(id);

        Ok(id)
    }

    /// Data of `node`, if it exists.
    #[must_use]
    pub fn node(&self, node: NodeId) -> Option<&N> {
        self.nodes.get(node.index())
    }

    /// Mutable data of `node`, if it exists.
    pub fn node_mut(&mut self, node: NodeId) -> Option<&mut N> {
        self.nodes.get_mut(node.index())
    }

    /// Number of nodes.
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Returns `true` if the graph has no nodes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// All node ids in ascending order.
    pub fn node_ids(&self) -> impl Iterator<Item = NodeId> + '_ {
        (0..self.nodes.len()).map(NodeId::new)
    }

    /// All nodes with their data.
    pub fn nodes(&self) -> impl Iterator<Item = (NodeId, &N)> + '_ {
        self.nodes
            .iter()
            .enumerate()
            .map(|(index, data)| (NodeId::new(index), data))
    }

    /// Data of `edge`, if it exists.
    #[must_use]
    pub fn edge(&self, edge: EdgeId) -> Option<&E> {
        self.edges.get(edge.index()).map(|e| &e.data)
    }

    /// Source and target of `edge`, if it exists.
    #[must_use]
    pub fn edge_endpoints(&self, edge: EdgeId) -> Option<(NodeId, NodeId)> {
        self.edges.get(edge.index()).map(|e| (e.source, e.target))
    }

    /// Number of edges.
    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// Targets of the edges leaving `node`.
    ///
    /// # Panics
    ///
    /// Panics if `node` is not a node of this graph.
    pub fn successors(&self, node: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        self.outgoing[node.index()]
            .iter()
            .map(|&edge_id| self.edges[edge_id.index()].target)
    }

    /// Sources of the edges entering `node`.
    ///
    /// # Panics
    ///
    /// Panics if `node` is not a node of this graph.
    pub fn predecessors(&self, node: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        self.incoming[node.index()]
            .iter()
            .map(|&edge_id| self.edges[edge_id.index()].source)
    }

    /// Edges leaving `node` as `(id, target, data)`.
    ///
    /// # Panics
    ///
    /// Panics if `node` is not a node of this graph.
    pub fn outgoing_edges(&self, node: NodeId) -> impl Iterator<Item = (EdgeId, NodeId, &E)> + '_ {
        self.outgoing[node.index()].iter().map(|&edge_id| {
            let edge = &self.edges[edge_id.index()];
            (edge_id, edge.target, &edge.data)
        })
    }

    /// Edges entering `node` as `(id, source, data)`.
    ///
    /// # Panics
    ///
    /// Panics if `node` is not a node of this graph.
    pub fn incoming_edges(&self, node: NodeId) -> impl Iterator<Item = (EdgeId, NodeId, &E)> + '_ {
        self.incoming[node.index()].iter().map(|&edge_id| {
            let edge = &self.edges[edge_id.index()];
            (edge_id, edge.source, &edge.data)
        })
    }

    /// Number of edges leaving `node`.
    #[must_use]
    pub fn out_degree(&self, node: NodeId) -> usize {
        self.outgoing.get(node.index()).map_or(0, Vec::len)
    }

    /// Number of edges entering `node`.
    #[must_use]
    pub fn in_degree(&self, node: NodeId) -> usize {
        self.incoming.get(node.index()).map_or(0, Vec::len)
    }

    /// Nodes without outgoing edges.
    pub fn exit_nodes(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.node_ids().filter(|&node| self.out_degree(node) == 0)
    }

    /// Returns `true` if `node` belongs to this graph.
    #[must_use]
    pub fn contains_node(&self, node: NodeId) -> bool {
        node.index() < self.nodes.len()
    }
}

impl<N, E> GraphBase for DirectedGraph<N, E> {
    fn node_count(&self) -> usize {
        self.nodes.len()
    }

    fn node_ids(&self) -> impl Iterator<Item = NodeId> {
        (0..self.nodes.len()).map(NodeId::new)
    }
}

impl<N, E> Successors for DirectedGraph<N, E> {
    fn successors(&self, node: NodeId) -> impl Iterator<Item = NodeId> {
        self.outgoing[node.index()]
            .iter()
            .map(|&edge_id| self.edges[edge_id.index()].target)
    }
}

impl<N, E> Predecessors for DirectedGraph<N, E> {
    fn predecessors(&self, node: NodeId) -> impl Iterator<Item = NodeId> {
        self.incoming[node.index()]
            .iter()
            .map(|&edge_id| self.edges[edge_id.index()].source)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// A -> B, A -> C, B -> D, C -> D
    fn diamond() -> DirectedGraph<&'static str, u32> {
        let mut graph = DirectedGraph::new();
        let a = graph.add_node("A");
        let b = graph.add_node("B");
        let c = graph.add_node("C");
        let d = graph.add_node("D");
        graph.add_edge(a, b, 1).unwrap();
        graph.add_edge(a, c, 2).unwrap();
        graph.add_edge(b, d, 3).unwrap();
        graph.add_edge(c, d, 4).unwrap();
        graph
    }

    #[test]
    fn adjacency_both_directions() {
        let graph = diamond();
        let (a, b, c, d) = (NodeId(0), NodeId(1), NodeId(2), NodeId(3));

        assert_eq!(graph.node_count(), 4);
        assert_eq!(graph.edge_count(), 4);
        assert_eq!(graph.successors(a).collect::<Vec<_>>(), vec![b, c]);
        assert_eq!(graph.predecessors(d).collect::<Vec<_>>(), vec![b, c]);
        assert_eq!(graph.in_degree(a), 0);
        assert_eq!(graph.out_degree(a), 2);
        assert_eq!(graph.exit_nodes().collect::<Vec<_>>(), vec![d]);

        let edges: Vec<(NodeId, u32)> = graph
            .outgoing_edges(a)
            .map(|(_, target, data)| (target, *data))
            .collect();
        assert_eq!(edges, vec![(b, 1), (c, 2)]);

        let incoming: Vec<NodeId> = graph.incoming_edges(d).map(|(_, s, _)| s).collect();
        assert_eq!(incoming, vec![b, c]);
        assert_eq!(graph.edge_endpoints(EdgeId(3)), Some((c, d)));
        assert_eq!(graph.edge(EdgeId(9)), None);
    }

    #[test]
    fn add_edge_rejects_unknown_nodes() {
        let mut graph: DirectedGraph<(), ()> = DirectedGraph::new();
        let a = graph.add_node(());

        assert!(matches!(
            graph.add_edge(a, NodeId(5), ()),
            Err(Error::GraphError(_))
        ));
        assert!(graph.add_edge(NodeId(5), a, ()).is_err());
        assert!(graph.add_edge(a, a, ()).is_ok());
        assert_eq!(graph.successors(a).collect::<Vec<_>>(), vec![a]);
    }

    #[test]
    fn trait_views_match_inherent() {
        fn count<G: Successors + Predecessors>(graph: &G) -> (usize, usize) {
            let succ: usize = graph.node_ids().map(|n| graph.successors(n).count()).sum();
            let pred: usize = graph.node_ids().map(|n| graph.predecessors(n).count()).sum();
            (succ, pred)
        }

        assert_eq!(count(&diamond()), (4, 4));
    }
}
