//! Memory-efficient weighted graph representation

use std::mem;
use serde::{Serialize, Deserialize};

/// An undirected edge stored once, in declaration order
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Edge {
    /// Endpoint the edge was declared from
    pub source: u32,

    /// Endpoint the edge was declared to
    pub target: u32,

    /// Non-negative edge weight
    pub weight: f64,
}

impl Edge {
    /// The endpoint across the edge from `node`
    pub fn opposite(&self, node: u32) -> u32 {
        if self.source == node {
            self.target
        } else {
            self.source
        }
    }
}

/// One entry of a node's adjacency list
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Adjacent {
    /// Neighbouring node index
    pub node: u32,

    /// Index into the edge array
    pub edge: u32,
}

/// Compressed sparse representation of a weighted undirected graph.
///
/// Every edge appears in the adjacency lists of both endpoints. Lists are
/// sorted by neighbour index so edge lookups are a binary search.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompressedGraph {
    /// Number of nodes in the graph
    pub node_count: usize,

    /// Offset array: index where each node's adjacency begins
    /// offsets[i] to offsets[i+1] defines the adjacency range for node i
    pub offsets: Vec<u32>,

    /// Adjacency array: concatenated neighbour lists
    pub adjacency: Vec<Adjacent>,

    /// Edge array in declaration order
    pub edges: Vec<Edge>,

    /// Display label of every node
    pub labels: Vec<String>,
}

impl CompressedGraph {
    /// Create an empty graph with pre-allocated capacity
    pub fn with_capacity(node_count: usize, edge_count: usize) -> Self {
        Self {
            node_count: 0,
            offsets: Vec::with_capacity(node_count + 1),
            adjacency: Vec::with_capacity(edge_count * 2),
            edges: Vec::with_capacity(edge_count),
            labels: Vec::with_capacity(node_count),
        }
    }

    /// Number of undirected edges
    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// Get the adjacency list of a node
    pub fn neighbours(&self, node: u32) -> &[Adjacent] {
        let start = self.offsets[node as usize] as usize;
        let end = self.offsets[node as usize + 1] as usize;
        &self.adjacency[start..end]
    }

    /// Get an edge by index
    pub fn edge(&self, edge: u32) -> &Edge {
        &self.edges[edge as usize]
    }

    /// Weight of an edge by index
    pub fn weight(&self, edge: u32) -> f64 {
        self.edges[edge as usize].weight
    }

    /// Label of a node
    pub fn label(&self, node: u32) -> &str {
        &self.labels[node as usize]
    }

    /// Find the edge joining `a` and `b`, if any
    pub fn find_edge(&self, a: u32, b: u32) -> Option<u32> {
        let adjacent = self.neighbours(a);
        adjacent
            .binary_search_by_key(&b, |entry| entry.node)
            .ok()
            .map(|pos| adjacent[pos].edge)
    }

    /// Check if `a` and `b` are joined by an edge
    pub fn has_edge(&self, a: u32, b: u32) -> bool {
        self.find_edge(a, b).is_some()
    }

    /// Number of edges incident to a node
    pub fn degree(&self, node: u32) -> usize {
        let start = self.offsets[node as usize] as usize;
        let end = self.offsets[node as usize + 1] as usize;
        end - start
    }

    /// Estimate memory usage in bytes
    pub fn memory_usage(&self) -> usize {
        let base = mem::size_of::<Self>();
        let offsets = self.offsets.capacity() * mem::size_of::<u32>();
        let adjacency = self.adjacency.capacity() * mem::size_of::<Adjacent>();
        let edges = self.edges.capacity() * mem::size_of::<Edge>();
        let labels = self.labels.iter().map(|s| s.capacity()).sum::<usize>();

        base + offsets + adjacency + edges + labels
    }
}
