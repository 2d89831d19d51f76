//! Cluster statistics and metrics

use crate::graph::CompressedGraph;
use serde::{Serialize, Deserialize};

/// Summary statistics of the edges inside one cluster
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClusterMetrics {
    /// Number of members
    pub size: usize,

    /// Edges with both endpoints in the cluster
    pub internal_edges: usize,

    /// Density: internal edges / potential undirected edges
    pub density: f64,

    /// Sum of internal edge weights
    pub total_weight: f64,

    /// Mean internal edge weight (0 when there are no internal edges)
    pub mean_weight: f64,
}

/// Calculate metrics for a set of members
pub fn calculate_cluster_metrics(graph: &CompressedGraph, members: &[u32]) -> ClusterMetrics {
    let n = members.len();
    let mut internal_edges = 0;
    let mut total_weight = 0.0;

    for (i, &a) in members.iter().enumerate() {
        for &b in &members[i + 1..] {
            if let Some(edge) = graph.find_edge(a, b) {
                internal_edges += 1;
                total_weight += graph.weight(edge);
            }
        }
    }

    ClusterMetrics {
        size: n,
        internal_edges,
        density: calculate_density(n, internal_edges),
        total_weight,
        mean_weight: if internal_edges == 0 {
            0.0
        } else {
            total_weight / internal_edges as f64
        },
    }
}

/// Calculate density (actual edges / potential edges)
pub fn calculate_density(size: usize, internal_edges: usize) -> f64 {
    if size <= 1 {
        return 1.0; // By convention, singleton clusters have density 1
    }

    // Potential edges = n * (n - 1) / 2 for an undirected graph
    let potential_edges = size * (size - 1) / 2;
    internal_edges as f64 / potential_edges as f64
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::GraphBuilder;

    #[test]
    fn triangle_with_pendant() {
        let mut builder = GraphBuilder::with_capacity(4);
        for id in 0..4 {
            builder.add_node(id, None).unwrap();
        }
        builder.add_edge(0, 1, 4.0).unwrap();
        builder.add_edge(1, 2, 2.0).unwrap();
        builder.add_edge(0, 2, 3.0).unwrap();
        builder.add_edge(2, 3, 8.0).unwrap();
        let graph = builder.build();

        let metrics = calculate_cluster_metrics(&graph, &[0, 1, 2]);
        assert_eq!(metrics.internal_edges, 3);
        assert_eq!(metrics.density, 1.0);
        assert_eq!(metrics.total_weight, 9.0);
        assert_eq!(metrics.mean_weight, 3.0);

        let sparse = calculate_cluster_metrics(&graph, &[0, 1, 3]);
        assert_eq!(sparse.internal_edges, 1);
        assert_eq!(sparse.density, 1.0 / 3.0);
    }

    #[test]
    fn singletons_are_dense_by_convention() {
        assert_eq!(calculate_density(1, 0), 1.0);
        assert_eq!(calculate_density(0, 0), 1.0);
    }
}
