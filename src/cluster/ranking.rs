//! Weight-ordered priority queues used during cluster growth

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use crate::cluster::detection::AssignedSet;
use crate::graph::CompressedGraph;

/// Heap entry ordered by weight, heaviest first.
///
/// Equal weights pop in insertion order so a run is reproducible.
#[derive(Debug, Clone, Copy)]
struct Ranked<T> {
    weight: f64,
    order: usize,
    item: T,
}

impl<T> PartialEq for Ranked<T> {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl<T> Eq for Ranked<T> {}

impl<T> PartialOrd for Ranked<T> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<T> Ord for Ranked<T> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.weight
            .total_cmp(&other.weight)
            .then_with(|| other.order.cmp(&self.order))
    }
}

/// Max-priority queue keyed by a weight captured at push time
#[derive(Debug, Clone)]
pub struct WeightQueue<T> {
    heap: BinaryHeap<Ranked<T>>,
    pushed: usize,
}

impl<T> Default for WeightQueue<T> {
    fn default() -> Self {
        Self {
            heap: BinaryHeap::new(),
            pushed: 0,
        }
    }
}

impl<T> WeightQueue<T> {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            heap: BinaryHeap::with_capacity(capacity),
            pushed: 0,
        }
    }

    pub fn push(&mut self, item: T, weight: f64) {
        self.heap.push(Ranked {
            weight,
            order: self.pushed,
            item,
        });
        self.pushed += 1;
    }

    /// Remove the heaviest entry
    pub fn pop(&mut self) -> Option<T> {
        self.heap.pop().map(|entry| entry.item)
    }

    /// Remove the heaviest entry along with its weight
    pub fn pop_weighted(&mut self) -> Option<(T, f64)> {
        self.heap.pop().map(|entry| (entry.item, entry.weight))
    }

    pub fn len(&self) -> usize {
        self.heap.len()
    }

    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }
}

/// Every edge of a graph, heaviest first, drained lazily as nodes get assigned
#[derive(Debug, Clone)]
pub struct EdgeRanking {
    queue: WeightQueue<u32>,
}

impl EdgeRanking {
    /// Rank all edges of the graph by descending weight
    pub fn new(graph: &CompressedGraph) -> Self {
        let mut queue = WeightQueue::with_capacity(graph.edge_count());
        for (idx, edge) in graph.edges.iter().enumerate() {
            queue.push(idx as u32, edge.weight);
        }
        Self { queue }
    }

    /// Pop edges until one with both endpoints unassigned surfaces.
    ///
    /// Stale edges are discarded on the way; `None` once the ranking is exhausted.
    pub fn pop_next_usable(
        &mut self,
        graph: &CompressedGraph,
        assigned: &AssignedSet,
    ) -> Option<u32> {
        while let Some(idx) = self.queue.pop() {
            let edge = graph.edge(idx);
            if assigned.contains(edge.source) || assigned.contains(edge.target) {
                log::trace!(
                    "Discarding edge {} -- {}: endpoint already clustered",
                    graph.label(edge.source),
                    graph.label(edge.target)
                );
                continue;
            }
            return Some(idx);
        }
        None
    }

    /// Edges not yet popped, usable or not
    pub fn remaining(&self) -> usize {
        self.queue.len()
    }
}
