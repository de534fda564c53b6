//! Tests for minimum spanning forest construction.

use glam::Vec3;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::graph::Graph;
use crate::mst::{compute_mst, minimum_spanning_forest};

fn random_points(rng: &mut ChaCha8Rng, n: usize) -> Vec<Vec3> {
    (0..n)
        .map(|_| {
            Vec3::new(
                rng.random_range(0.0..500.0),
                rng.random_range(0.0..500.0),
                rng.random_range(0.0..1.0),
            )
        })
        .collect()
}

/// Heap-free O(N^2) Prim over the complete graph.
fn reference_mst_weight(points: &[Vec3]) -> f64 {
    let n = points.len();
    let mut in_tree = vec![false; n];
    let mut best = vec![f32::INFINITY; n];
    best[0] = 0.0;
    let mut total = 0.0f64;
    for _ in 0..n {
        let next = (0..n)
            .filter(|&i| !in_tree[i])
            .min_by(|&a, &b| best[a].total_cmp(&best[b]))
            .expect("a node remains outside the tree");
        in_tree[next] = true;
        total += best[next] as f64;
        for i in 0..n {
            if !in_tree[i] {
                best[i] = best[i].min(points[next].distance(points[i]));
            }
        }
    }
    total
}

/// Union-find over node slots; returns `false` as soon as an edge closes a cycle.
fn is_acyclic(tree: &Graph) -> bool {
    let mut parent: Vec<usize> = (0..tree.node_count()).collect();
    fn find(parent: &mut [usize], mut x: usize) -> usize {
        while parent[x] != x {
            parent[x] = parent[parent[x]];
            x = parent[x];
        }
        x
    }
    for (_, edge) in tree.edge_records() {
        let a = find(&mut parent, edge.src().index());
        let b = find(&mut parent, edge.dst().index());
        if a == b {
            return false;
        }
        parent[a] = b;
    }
    true
}

#[test]
fn test_square_ring_spanning_tree() {
    let points = [
        Vec3::new(0.0, 0.0, 0.0),
        Vec3::new(10.0, 0.0, 0.0),
        Vec3::new(10.0, 10.0, 0.0),
        Vec3::new(0.0, 10.0, 0.0),
    ];
    let tree = compute_mst(&points);
    assert_eq!(tree.node_count(), 4);
    assert_eq!(tree.edge_count(), 3);
    assert!((tree.total_weight() - 30.0).abs() < 1e-4, "weight {}", tree.total_weight());
    assert!(is_acyclic(&tree));
}

#[test]
fn test_single_point_has_no_edges() {
    let tree = compute_mst(&[Vec3::new(3.0, 4.0, 0.5)]);
    assert_eq!(tree.node_count(), 1);
    assert_eq!(tree.edge_count(), 0);
}

#[test]
#[should_panic(expected = "zero points")]
fn test_empty_point_set_panics() {
    compute_mst(&[]);
}

#[test]
fn test_matches_reference_prim_on_random_points() {
    let mut rng = ChaCha8Rng::seed_from_u64(0x5EED);
    for n in [2usize, 3, 7, 20, 64, 150, 200] {
        let points = random_points(&mut rng, n);
        let tree = compute_mst(&points);

        assert_eq!(tree.node_count(), n);
        assert_eq!(tree.edge_count(), n - 1, "n = {n}");
        assert!(is_acyclic(&tree), "n = {n}: tree contains a cycle");

        let expected = reference_mst_weight(&points);
        let actual = tree.total_weight();
        assert!(
            (actual - expected).abs() <= expected * 1e-5 + 1e-3,
            "n = {n}: weight {actual} differs from reference {expected}"
        );
    }
}

#[test]
fn test_tree_nodes_copy_input_positions() {
    let mut rng = ChaCha8Rng::seed_from_u64(7);
    let points = random_points(&mut rng, 12);
    let tree = compute_mst(&points);
    let positions: Vec<Vec3> = tree.nodes().map(|n| tree.position(n)).collect();
    assert_eq!(positions, points);
}

#[test]
fn test_disconnected_input_yields_forest() {
    let mut graph = Graph::new();
    let a = graph.add_node(Vec3::new(0.0, 0.0, 0.0));
    let b = graph.add_node(Vec3::new(1.0, 0.0, 0.0));
    let c = graph.add_node(Vec3::new(2.0, 0.0, 0.0));
    let d = graph.add_node(Vec3::new(50.0, 0.0, 0.0));
    let e = graph.add_node(Vec3::new(52.0, 0.0, 0.0));
    let _isolated = graph.add_node(Vec3::new(-40.0, 0.0, 0.0));
    graph.connect(a, b, false);
    graph.connect(b, c, false);
    graph.connect(a, c, false);
    graph.connect(d, e, false);

    let forest = minimum_spanning_forest(&graph);
    assert_eq!(forest.node_count(), 6);
    assert_eq!(forest.edge_count(), 3);
    assert!(is_acyclic(&forest));
    assert!((forest.total_weight() - 4.0).abs() < 1e-5);
    let isolated_degree = forest
        .nodes()
        .map(|n| forest.node(n).degree())
        .filter(|&d| d == 0)
        .count();
    assert_eq!(isolated_degree, 1);
}

#[test]
fn test_prefers_lighter_parallel_edge() {
    let mut graph = Graph::new();
    let a = graph.add_node(Vec3::ZERO);
    let b = graph.add_node(Vec3::X);
    graph.add_edge(a, b, false, 9.0);
    graph.add_edge(a, b, false, 2.0);

    let tree = graph.build_mst();
    assert_eq!(tree.edge_count(), 1);
    assert!((tree.total_weight() - 2.0).abs() < 1e-6);
}

#[test]
fn test_directed_edges_keep_orientation() {
    let mut graph = Graph::new();
    let a = graph.add_node(Vec3::ZERO);
    let b = graph.add_node(Vec3::X);
    let c = graph.add_node(Vec3::new(2.0, 0.0, 0.0));
    graph.connect(a, b, true);
    graph.connect(b, c, true);

    let tree = graph.build_mst();
    assert_eq!(tree.edge_count(), 2);
    for (_, edge) in tree.edge_records() {
        assert!(edge.is_directed());
        assert!(edge.src().index() < edge.dst().index());
    }
}

#[test]
fn test_deleted_nodes_are_skipped() {
    let points = [
        Vec3::new(0.0, 0.0, 0.0),
        Vec3::new(5.0, 0.0, 0.0),
        Vec3::new(10.0, 0.0, 0.0),
    ];
    let mut graph = Graph::from_points(&points);
    let middle = graph.nodes().nth(1).expect("three nodes");
    graph.delete_node(middle);

    let tree = graph.build_mst();
    assert_eq!(tree.node_count(), 2);
    assert_eq!(tree.edge_count(), 1);
    assert!((tree.total_weight() - 10.0).abs() < 1e-5);
}
