//! Shared graph routines used by more than one plugin. Kept separate
//! from the plugins themselves since none of route/table/multi-target
//! "owns" Dijkstra; they all just need it.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use rustc_hash::FxHashMap;

use crate::dataset::{Dataset, NodeId};

#[derive(Copy, Clone, PartialEq)]
struct HeapEntry {
    cost: f64,
    node: NodeId,
}

impl Eq for HeapEntry {}

impl Ord for HeapEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reversed so `BinaryHeap` (a max-heap) pops the smallest cost.
        other
            .cost
            .partial_cmp(&self.cost)
            .unwrap_or(Ordering::Equal)
    }
}

impl PartialOrd for HeapEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Single-source shortest path costs from `source` over every
/// reachable node, weighted by [`Dataset::edge_weight`].
pub fn dijkstra(dataset: &Dataset, source: NodeId) -> FxHashMap<NodeId, f64> {
    let mut costs: FxHashMap<NodeId, f64> = FxHashMap::default();
    let mut heap = BinaryHeap::new();

    costs.insert(source, 0.0);
    heap.push(HeapEntry {
        cost: 0.0,
        node: source,
    });

    while let Some(HeapEntry { cost, node }) = heap.pop() {
        if cost > *costs.get(&node).unwrap_or(&f64::INFINITY) {
            continue;
        }
        for &edge_id in dataset.adjacency(node) {
            let Some(edge) = dataset.edge(edge_id) else {
                continue;
            };
            let next_cost = cost + edge.weight;
            if next_cost < *costs.get(&edge.to).unwrap_or(&f64::INFINITY) {
                costs.insert(edge.to, next_cost);
                heap.push(HeapEntry {
                    cost: next_cost,
                    node: edge.to,
                });
            }
        }
    }

    costs
}

/// Single-source shortest path tree from `source`, also recording a
/// predecessor edge per reached node so a path can be reconstructed.
pub fn dijkstra_with_path(
    dataset: &Dataset,
    source: NodeId,
) -> (FxHashMap<NodeId, f64>, FxHashMap<NodeId, u32>) {
    let mut costs: FxHashMap<NodeId, f64> = FxHashMap::default();
    let mut predecessor: FxHashMap<NodeId, u32> = FxHashMap::default();
    let mut heap = BinaryHeap::new();

    costs.insert(source, 0.0);
    heap.push(HeapEntry {
        cost: 0.0,
        node: source,
    });

    while let Some(HeapEntry { cost, node }) = heap.pop() {
        if cost > *costs.get(&node).unwrap_or(&f64::INFINITY) {
            continue;
        }
        for &edge_id in dataset.adjacency(node) {
            let Some(edge) = dataset.edge(edge_id) else {
                continue;
            };
            let next_cost = cost + edge.weight;
            if next_cost < *costs.get(&edge.to).unwrap_or(&f64::INFINITY) {
                costs.insert(edge.to, next_cost);
                predecessor.insert(edge.to, edge_id);
                heap.push(HeapEntry {
                    cost: next_cost,
                    node: edge.to,
                });
            }
        }
    }

    (costs, predecessor)
}

/// Reconstruct the node sequence from `source` to `target` given a
/// predecessor-edge map produced by [`dijkstra_with_path`].
pub fn reconstruct_path(
    dataset: &Dataset,
    source: NodeId,
    target: NodeId,
    predecessor: &FxHashMap<NodeId, u32>,
) -> Option<Vec<NodeId>> {
    if source == target {
        return Some(vec![source]);
    }
    let mut path = vec![target];
    let mut current = target;
    while current != source {
        let edge_id = *predecessor.get(&current)?;
        let edge = dataset.edge(edge_id)?;
        current = edge.from;
        path.push(current);
        if path.len() > dataset.node_count() + 1 {
            // A predecessor cycle would mean a Dijkstra invariant was
            // violated; bail rather than loop forever.
            return None;
        }
    }
    path.reverse();
    Some(path)
}
