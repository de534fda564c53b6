//! Graph and priority-queue primitives behind MST-based terrain synthesis.
//!
//! Nodes, edges and heap entries live in slot arenas addressed by stable
//! integer ids, so adjacency and heap-sibling relationships are plain index
//! links rather than references.

mod graph;
mod heap;
mod mst;

#[cfg(test)]
mod mst_tests;

pub use graph::{Edge, EdgeId, Graph, Node, NodeId};
pub use heap::{EntryRef, FibonacciHeap};
pub use mst::{HEIGHT_CODE_FACTOR, compute_mst, minimum_spanning_forest};
