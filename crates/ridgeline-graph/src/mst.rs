//! Prim's algorithm over a [`Graph`], producing a minimum spanning forest.

use glam::Vec3;
use tracing::debug;

use crate::graph::{EdgeId, Graph, NodeId};
use crate::heap::{EntryRef, FibonacciHeap};

/// Summit heights are divided by this factor before they become node `z`
/// coordinates, so editing a height barely perturbs the tree topology.
pub const HEIGHT_CODE_FACTOR: f32 = 256.0;

/// Working state for one input node during a single build.
struct PrimNodeInfo {
    dist: f32,
    /// Output-tree node of the parent together with the connecting input edge.
    parent: Option<(NodeId, EdgeId)>,
    tree_node: NodeId,
    entry: EntryRef,
    in_tree: bool,
}

/// Non-negative floats order the same as their IEEE bit patterns.
fn distance_key(dist: f32) -> u64 {
    u64::from(dist.max(0.0).to_bits())
}

/// Computes a minimum spanning forest of `graph` with Prim's algorithm.
///
/// Every node starts in the queue at infinite distance, so each exhausted
/// component is followed by a fresh tree rooted at the next extracted node.
/// The result holds a copy of every input node (same creation order) and one
/// edge per non-root node, carrying the original weight and directedness.
pub fn minimum_spanning_forest(graph: &Graph) -> Graph {
    let node_count = graph.node_count();
    let mut tree = Graph::with_capacity(node_count, node_count.saturating_sub(1));
    let mut queue = FibonacciHeap::with_capacity(node_count);
    let mut info: Vec<Option<PrimNodeInfo>> = (0..graph.node_slots()).map(|_| None).collect();

    for node in graph.nodes() {
        let tree_node = tree.add_node(graph.position(node));
        let entry = queue.insert(node, u64::MAX);
        info[node.index()] = Some(PrimNodeInfo {
            dist: f32::INFINITY,
            parent: None,
            tree_node,
            entry,
            in_tree: false,
        });
    }

    let mut roots = 0usize;
    while let Some(node) = queue.extract_min() {
        let Some(current) = info[node.index()].as_mut() else {
            continue;
        };
        current.in_tree = true;
        current.dist = 0.0;
        let tree_node = current.tree_node;

        match current.parent {
            Some((parent, edge)) => {
                let edge = graph.edge(edge);
                tree.add_edge(parent, tree_node, edge.is_directed(), edge.weight());
            }
            None => roots += 1,
        }

        for edge_id in graph.out_edges(node) {
            let edge = graph.edge(edge_id);
            let Some(neighbor) = info[edge.other(node).index()].as_mut() else {
                continue;
            };
            if neighbor.in_tree || edge.weight() >= neighbor.dist {
                continue;
            }
            neighbor.dist = edge.weight();
            neighbor.parent = Some((tree_node, edge_id));
            queue.change_key(neighbor.entry, distance_key(neighbor.dist));
        }
    }

    debug!(
        nodes = tree.node_count(),
        edges = tree.edge_count(),
        trees = roots,
        "built minimum spanning forest"
    );
    tree
}

impl Graph {
    /// Builds the complete undirected graph over `points`, weighting every
    /// edge with the Euclidean distance between its endpoints.
    pub fn from_points(points: &[Vec3]) -> Self {
        let n = points.len();
        let mut graph = Self::with_capacity(n, n * n.saturating_sub(1) / 2);
        let ids: Vec<NodeId> = points.iter().map(|&p| graph.add_node(p)).collect();
        for (i, &a) in ids.iter().enumerate() {
            for &b in &ids[i + 1..] {
                graph.connect(a, b, false);
            }
        }
        graph
    }

    /// Shorthand for [`minimum_spanning_forest`].
    pub fn build_mst(&self) -> Graph {
        minimum_spanning_forest(self)
    }
}

/// Builds the minimum spanning tree of the complete graph over `points`.
///
/// # Panics
///
/// Panics if `points` is empty.
pub fn compute_mst(points: &[Vec3]) -> Graph {
    assert!(!points.is_empty(), "cannot build a spanning tree over zero points");
    Graph::from_points(points).build_mst()
}
