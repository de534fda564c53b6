//! Adjacency-indexed graph with stable node and edge ids.
//!
//! Every node keeps a hash index from neighbor id to the incident edges
//! shared with that neighbor, so neighbor queries and degree bookkeeping stay
//! near constant time. Parallel edges are legal; consumers decide whether to
//! deduplicate.

use glam::Vec3;
use hashbrown::HashMap;
use rustc_hash::FxBuildHasher;

type Adjacency = HashMap<NodeId, Vec<EdgeId>, FxBuildHasher>;

/// Stable identifier of a node inside the [`Graph`] that created it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub(crate) u32);

impl NodeId {
    /// Arena slot of this node.
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Stable identifier of an edge inside the [`Graph`] that created it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EdgeId(pub(crate) u32);

impl EdgeId {
    /// Arena slot of this edge.
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// A positioned graph node with its adjacency index and degree counters.
#[derive(Clone, Debug)]
pub struct Node {
    position: Vec3,
    adjacency: Adjacency,
    in_degree: u32,
    out_degree: u32,
    degree: u32,
}

impl Node {
    fn new(position: Vec3) -> Self {
        Self {
            position,
            adjacency: Adjacency::default(),
            in_degree: 0,
            out_degree: 0,
            degree: 0,
        }
    }

    /// World position; `z` carries the encoded height sample.
    pub fn position(&self) -> Vec3 {
        self.position
    }

    /// Number of edges that can be traversed into this node.
    pub fn in_degree(&self) -> u32 {
        self.in_degree
    }

    /// Number of edges that can be traversed out of this node.
    pub fn out_degree(&self) -> u32 {
        self.out_degree
    }

    /// Total number of edge endpoints at this node.
    pub fn degree(&self) -> u32 {
        self.degree
    }
}

/// An edge referencing its endpoints by id. The weight never changes after
/// creation.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Edge {
    src: NodeId,
    dst: NodeId,
    weight: f32,
    directed: bool,
}

impl Edge {
    pub fn src(&self) -> NodeId {
        self.src
    }

    pub fn dst(&self) -> NodeId {
        self.dst
    }

    pub fn weight(&self) -> f32 {
        self.weight
    }

    pub fn is_directed(&self) -> bool {
        self.directed
    }

    /// The endpoint opposite to `node`.
    ///
    /// # Panics
    ///
    /// Panics if `node` is not an endpoint of this edge.
    pub fn other(&self, node: NodeId) -> NodeId {
        assert!(
            node == self.src || node == self.dst,
            "{node:?} is not an endpoint of edge {:?}->{:?}",
            self.src,
            self.dst
        );
        if node == self.src { self.dst } else { self.src }
    }

    /// Returns `true` if the edge can be traversed starting at `node`.
    pub fn is_source(&self, node: NodeId) -> bool {
        if self.directed {
            self.src == node
        } else {
            node == self.src || node == self.dst
        }
    }

    /// Returns `true` if the edge can be traversed ending at `node`.
    pub fn is_destination(&self, node: NodeId) -> bool {
        if self.directed {
            self.dst == node
        } else {
            node == self.src || node == self.dst
        }
    }
}

/// Owns all nodes and edges it was asked to create.
///
/// Deleted slots stay vacant so the ids of surviving entities never change.
/// Using an id that does not refer to a live entity is a programming error
/// and panics.
#[derive(Clone, Debug, Default)]
pub struct Graph {
    nodes: Vec<Option<Node>>,
    edges: Vec<Option<Edge>>,
    node_count: usize,
    edge_count: usize,
}

impl Graph {
    /// Creates an empty graph.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty graph with room for the given number of entities.
    pub fn with_capacity(nodes: usize, edges: usize) -> Self {
        Self {
            nodes: Vec::with_capacity(nodes),
            edges: Vec::with_capacity(edges),
            node_count: 0,
            edge_count: 0,
        }
    }

    /// Adds an unconnected node at `position`.
    pub fn add_node(&mut self, position: Vec3) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(Some(Node::new(position)));
        self.node_count += 1;
        id
    }

    /// Adds an edge and registers it in both endpoints' adjacency index.
    ///
    /// No uniqueness check is made: connecting an already adjacent pair
    /// creates a parallel edge.
    pub fn add_edge(&mut self, src: NodeId, dst: NodeId, directed: bool, weight: f32) -> EdgeId {
        // Validate both endpoints before mutating anything.
        self.node(src);
        self.node(dst);

        let id = EdgeId(self.edges.len() as u32);
        self.edges.push(Some(Edge {
            src,
            dst,
            weight,
            directed,
        }));
        self.edge_count += 1;

        let source = self.node_mut(src);
        source.adjacency.entry(dst).or_default().push(id);
        source.degree += 1;
        source.out_degree += 1;
        if !directed {
            source.in_degree += 1;
        }

        let target = self.node_mut(dst);
        if src != dst {
            target.adjacency.entry(src).or_default().push(id);
        }
        target.degree += 1;
        target.in_degree += 1;
        if !directed {
            target.out_degree += 1;
        }

        id
    }

    /// Adds an edge weighted with the Euclidean distance between the
    /// endpoint positions.
    pub fn connect(&mut self, src: NodeId, dst: NodeId, directed: bool) -> EdgeId {
        let weight = self.position(src).distance(self.position(dst));
        self.add_edge(src, dst, directed, weight)
    }

    /// Looks up an edge joining `a` and `b` through `a`'s adjacency index.
    ///
    /// With parallel edges the first one inserted is returned.
    pub fn edge_between(&self, a: NodeId, b: NodeId) -> Option<EdgeId> {
        self.node(a)
            .adjacency
            .get(&b)
            .and_then(|edges| edges.first().copied())
    }

    /// Returns the node with the given id.
    ///
    /// # Panics
    ///
    /// Panics if the node does not exist.
    pub fn node(&self, id: NodeId) -> &Node {
        match self.nodes.get(id.index()) {
            Some(Some(node)) => node,
            _ => panic!("node {id:?} does not exist"),
        }
    }

    fn node_mut(&mut self, id: NodeId) -> &mut Node {
        match self.nodes.get_mut(id.index()) {
            Some(Some(node)) => node,
            _ => panic!("node {id:?} does not exist"),
        }
    }

    /// Returns the edge with the given id.
    ///
    /// # Panics
    ///
    /// Panics if the edge does not exist.
    pub fn edge(&self, id: EdgeId) -> &Edge {
        match self.edges.get(id.index()) {
            Some(Some(edge)) => edge,
            _ => panic!("edge {id:?} does not exist"),
        }
    }

    /// Shorthand for `self.node(id).position()`.
    pub fn position(&self, id: NodeId) -> Vec3 {
        self.node(id).position
    }

    /// Iterates over the ids of all live nodes in creation order.
    pub fn nodes(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.nodes
            .iter()
            .enumerate()
            .filter(|(_, slot)| slot.is_some())
            .map(|(i, _)| NodeId(i as u32))
    }

    /// Iterates over the ids of all live edges in creation order.
    pub fn edges(&self) -> impl Iterator<Item = EdgeId> + '_ {
        self.edges
            .iter()
            .enumerate()
            .filter(|(_, slot)| slot.is_some())
            .map(|(i, _)| EdgeId(i as u32))
    }

    /// Iterates over live edges together with their data.
    pub fn edge_records(&self) -> impl Iterator<Item = (EdgeId, &Edge)> + '_ {
        self.edges
            .iter()
            .enumerate()
            .filter_map(|(i, slot)| slot.as_ref().map(|edge| (EdgeId(i as u32), edge)))
    }

    /// Every edge touching `node`, each reported once.
    pub fn incident_edges(&self, node: NodeId) -> impl Iterator<Item = EdgeId> + '_ {
        self.node(node).adjacency.values().flatten().copied()
    }

    /// Edges that can be traversed starting at `node`.
    pub fn out_edges(&self, node: NodeId) -> impl Iterator<Item = EdgeId> + '_ {
        self.incident_edges(node)
            .filter(move |&e| self.edge(e).is_source(node))
    }

    /// Returns `true` if at least one edge joins `a` and `b`.
    pub fn is_adjacent(&self, a: NodeId, b: NodeId) -> bool {
        self.node(a).adjacency.contains_key(&b)
    }

    /// Returns `true` if an edge leads from `b` to `a`.
    pub fn is_successor_of(&self, a: NodeId, b: NodeId) -> bool {
        self.any_edge_between(a, b, |edge| edge.is_source(b) && edge.is_destination(a))
    }

    /// Returns `true` if an edge leads from `a` to `b`.
    pub fn is_predecessor_of(&self, a: NodeId, b: NodeId) -> bool {
        self.any_edge_between(a, b, |edge| edge.is_source(a) && edge.is_destination(b))
    }

    fn any_edge_between(&self, a: NodeId, b: NodeId, pred: impl Fn(&Edge) -> bool) -> bool {
        self.node(a)
            .adjacency
            .get(&b)
            .is_some_and(|edges| edges.iter().any(|&e| pred(self.edge(e))))
    }

    /// Removes an edge and fixes both endpoints' index entries and degrees.
    ///
    /// # Panics
    ///
    /// Panics if the edge does not exist.
    pub fn delete_edge(&mut self, id: EdgeId) {
        let edge = match self.edges.get_mut(id.index()).and_then(Option::take) {
            Some(edge) => edge,
            None => panic!("edge {id:?} does not exist"),
        };
        self.edge_count -= 1;

        self.detach(edge.src, edge.dst, id);
        if edge.src != edge.dst {
            self.detach(edge.dst, edge.src, id);
        }

        let source = self.node_mut(edge.src);
        source.degree -= 1;
        source.out_degree -= 1;
        if !edge.directed {
            source.in_degree -= 1;
        }

        let target = self.node_mut(edge.dst);
        target.degree -= 1;
        target.in_degree -= 1;
        if !edge.directed {
            target.out_degree -= 1;
        }
    }

    fn detach(&mut self, owner: NodeId, neighbor: NodeId, id: EdgeId) {
        let adjacency = &mut self.node_mut(owner).adjacency;
        if let Some(edges) = adjacency.get_mut(&neighbor) {
            edges.retain(|&e| e != id);
            if edges.is_empty() {
                adjacency.remove(&neighbor);
            }
        }
    }

    /// Removes a node together with every incident edge. O(degree).
    ///
    /// # Panics
    ///
    /// Panics if the node does not exist.
    pub fn delete_node(&mut self, id: NodeId) {
        let incident: Vec<EdgeId> = self.incident_edges(id).collect();
        for edge in incident {
            self.delete_edge(edge);
        }
        self.nodes[id.index()] = None;
        self.node_count -= 1;
    }

    /// Number of live nodes.
    pub fn node_count(&self) -> usize {
        self.node_count
    }

    /// Number of live edges.
    pub fn edge_count(&self) -> usize {
        self.edge_count
    }

    /// Upper bound (exclusive) of node slot indices ever handed out.
    pub(crate) fn node_slots(&self) -> usize {
        self.nodes.len()
    }

    /// Sum of all live edge weights.
    pub fn total_weight(&self) -> f64 {
        self.edge_records().map(|(_, e)| e.weight as f64).sum()
    }
}
