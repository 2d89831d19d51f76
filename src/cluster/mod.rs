//! Cluster analysis module

pub mod detection;
pub mod metrics;
pub mod ranking;

pub use detection::{find_quasi_cliques, AssignedSet, ClusterGrowthEngine};
pub use metrics::ClusterMetrics;

use crate::graph::CompressedGraph;
use serde::{Serialize, Deserialize};

/// A finalized group of nodes
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cluster {
    /// Position of this cluster in the partition
    pub id: u32,

    /// Members in the order they joined; the seed comes first
    pub members: Vec<u32>,

    /// Edge the cluster was seeded from (`None` for leftover singletons)
    pub seed_edge: Option<u32>,
}

impl Cluster {
    pub fn size(&self) -> usize {
        self.members.len()
    }

    /// Member labels in insertion order
    pub fn labels(&self, graph: &CompressedGraph) -> Vec<String> {
        self.members
            .iter()
            .map(|&node| graph.label(node).to_string())
            .collect()
    }
}

/// Disjoint clusters covering every node of a graph
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Partition {
    /// Grown clusters in discovery order, then singletons in node order
    pub clusters: Vec<Cluster>,
}

impl Partition {
    pub fn len(&self) -> usize {
        self.clusters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clusters.is_empty()
    }

    /// Number of nodes covered by the partition
    pub fn node_count(&self) -> usize {
        self.clusters.iter().map(Cluster::size).sum()
    }

    /// Clusters that were grown from a seed edge
    pub fn grown(&self) -> impl Iterator<Item = &Cluster> {
        self.clusters.iter().filter(|c| c.seed_edge.is_some())
    }

    /// Every cluster as a list of node labels
    pub fn labels(&self, graph: &CompressedGraph) -> Vec<Vec<String>> {
        self.clusters.iter().map(|c| c.labels(graph)).collect()
    }
}
