//! Graph construction module

use crate::graph::compressed::{Adjacent, CompressedGraph, Edge};
use std::collections::HashMap;
use thiserror::Error;

/// Reasons a node or edge is refused by the builder
#[derive(Debug, Clone, PartialEq, Error)]
pub enum BuildError {
    /// Two nodes were declared with the same identifier
    #[error("node id {id} is declared more than once")]
    DuplicateNode { id: i64 },

    /// An edge referenced a node that was never declared
    #[error("edge refers to undeclared node id {id}")]
    UnknownNode { id: i64 },

    /// An edge referenced a node index outside the graph
    #[error("node index {index} is out of range")]
    IndexOutOfRange { index: u32 },

    /// Edge weights must be finite and non-negative
    #[error("edge weight {weight} is not a finite non-negative number")]
    InvalidWeight { weight: f64 },
}

/// Outcome of adding an edge
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EdgeInsert {
    /// The edge was stored under this index
    Added(u32),

    /// Both endpoints were the same node
    SelfLoop,

    /// The pair was already joined by an earlier edge
    Duplicate(u32),
}

/// Builder for incrementally constructing a CompressedGraph
pub struct GraphBuilder {
    /// Mapping from external integer IDs to node indices
    id_to_index: HashMap<i64, u32>,

    /// Node labels
    labels: Vec<String>,

    /// Adjacency lists for each node
    adjacency_lists: Vec<Vec<Adjacent>>,

    /// Edges in insertion order
    edges: Vec<Edge>,

    /// Unordered endpoint pairs already joined, mapped to their edge index
    pairs: HashMap<(u32, u32), u32>,
}

impl GraphBuilder {
    /// Create a new graph builder with the given node capacity
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            id_to_index: HashMap::with_capacity(capacity),
            labels: Vec::with_capacity(capacity),
            adjacency_lists: Vec::with_capacity(capacity),
            edges: Vec::new(),
            pairs: HashMap::new(),
        }
    }

    /// Look up the index of a previously declared node
    pub fn node_index(&self, id: i64) -> Result<u32, BuildError> {
        self.id_to_index
            .get(&id)
            .copied()
            .ok_or(BuildError::UnknownNode { id })
    }

    /// Declare a node. Without a label the numeric id is used for display.
    pub fn add_node(&mut self, id: i64, label: Option<String>) -> Result<u32, BuildError> {
        if self.id_to_index.contains_key(&id) {
            return Err(BuildError::DuplicateNode { id });
        }

        let idx = self.labels.len() as u32;
        self.id_to_index.insert(id, idx);
        self.labels.push(label.unwrap_or_else(|| id.to_string()));
        self.adjacency_lists.push(Vec::new());

        Ok(idx)
    }

    /// Add an undirected weighted edge between two node indices
    pub fn add_edge(&mut self, source: u32, target: u32, weight: f64) -> Result<EdgeInsert, BuildError> {
        for index in [source, target] {
            if index as usize >= self.labels.len() {
                return Err(BuildError::IndexOutOfRange { index });
            }
        }
        if !weight.is_finite() || weight < 0.0 {
            return Err(BuildError::InvalidWeight { weight });
        }
        if source == target {
            return Ok(EdgeInsert::SelfLoop);
        }

        let key = (source.min(target), source.max(target));
        if let Some(&existing) = self.pairs.get(&key) {
            return Ok(EdgeInsert::Duplicate(existing));
        }

        let edge = self.edges.len() as u32;
        self.edges.push(Edge { source, target, weight });
        self.pairs.insert(key, edge);
        self.adjacency_lists[source as usize].push(Adjacent { node: target, edge });
        self.adjacency_lists[target as usize].push(Adjacent { node: source, edge });

        Ok(EdgeInsert::Added(edge))
    }

    /// Build the compressed graph
    pub fn build(mut self) -> CompressedGraph {
        let node_count = self.labels.len();
        let mut graph = CompressedGraph::with_capacity(node_count, self.edges.len());

        // Create offsets array
        graph.offsets.push(0);
        let mut offset = 0;
        for list in &mut self.adjacency_lists {
            // Sort for binary search efficiency
            list.sort_unstable_by_key(|entry| entry.node);
            offset += list.len() as u32;
            graph.offsets.push(offset);
            graph.adjacency.extend_from_slice(list);
        }

        debug_assert_eq!(graph.adjacency.len(), self.edges.len() * 2);

        graph.node_count = node_count;
        graph.edges = self.edges;
        graph.labels = self.labels;
        graph
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_duplicate_node_ids() {
        let mut builder = GraphBuilder::with_capacity(2);
        builder.add_node(1, None).unwrap();
        assert_eq!(
            builder.add_node(1, Some("again".to_string())),
            Err(BuildError::DuplicateNode { id: 1 })
        );
    }

    #[test]
    fn skips_self_loops_and_repeated_pairs() {
        let mut builder = GraphBuilder::with_capacity(2);
        let a = builder.add_node(1, None).unwrap();
        let b = builder.add_node(2, None).unwrap();
        assert_eq!(builder.add_edge(a, b, 3.0), Ok(EdgeInsert::Added(0)));
        assert_eq!(builder.add_edge(b, a, 4.0), Ok(EdgeInsert::Duplicate(0)));
        assert_eq!(builder.add_edge(a, a, 1.0), Ok(EdgeInsert::SelfLoop));

        let graph = builder.build();
        assert_eq!(graph.edge_count(), 1);
        assert_eq!(graph.weight(0), 3.0);
    }

    #[test]
    fn rejects_negative_and_nan_weights() {
        let mut builder = GraphBuilder::with_capacity(2);
        let a = builder.add_node(1, None).unwrap();
        let b = builder.add_node(2, None).unwrap();
        assert!(matches!(
            builder.add_edge(a, b, -1.0),
            Err(BuildError::InvalidWeight { .. })
        ));
        assert!(matches!(
            builder.add_edge(a, b, f64::NAN),
            Err(BuildError::InvalidWeight { .. })
        ));
    }

    #[test]
    fn unknown_ids_are_reported() {
        let builder = GraphBuilder::with_capacity(0);
        assert_eq!(builder.node_index(7), Err(BuildError::UnknownNode { id: 7 }));
    }
}
