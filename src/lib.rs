//! Core library functions for the quasi-clique clusterer

pub mod config;
pub mod data;
pub mod graph;
pub mod cluster;
pub mod storage;

pub use anyhow::{Result, anyhow};

use std::path::Path;
use std::time::Instant;

use crate::config::Config;
use crate::storage::Report;

/// Load a GML graph, partition it and resolve the clusters to labels
pub fn cluster_file(path: impl AsRef<Path>, config: &Config) -> Result<Report> {
    let path = path.as_ref();

    let started = Instant::now();
    let graph = data::load_graph(path, config).map_err(|err| {
        let code = err.code();
        anyhow!(err).context(format!(
            "error ({}) loading graph from file \"{}\"",
            code,
            path.display()
        ))
    })?;
    log::info!(
        "Graph read from file \"{}\" has {} nodes and {} edges",
        path.display(),
        graph.node_count,
        graph.edge_count()
    );
    log::debug!("Loaded graph in {:.3?}", started.elapsed());

    let started = Instant::now();
    let partition = cluster::find_quasi_cliques(&graph);
    log::debug!("Clustered graph in {:.3?}", started.elapsed());

    debug_assert_eq!(partition.node_count(), graph.node_count);
    Ok(Report::new(&partition, &graph))
}
