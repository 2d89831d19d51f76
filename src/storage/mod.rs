//! Partition report output

use anyhow::{Context, Result};
use crate::cluster::Partition;
use crate::graph::CompressedGraph;
use serde::{Serialize, Deserialize};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// The report document: every cluster as a list of node labels
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Report {
    pub clusters: Vec<Vec<String>>,
}

impl Report {
    /// Resolve a partition's node indices to labels
    pub fn new(partition: &Partition, graph: &CompressedGraph) -> Self {
        Self {
            clusters: partition.labels(graph),
        }
    }
}

/// Serialize a report to any writer
pub fn write_report<W: Write>(report: &Report, mut writer: W, pretty: bool) -> Result<()> {
    if pretty {
        serde_json::to_writer_pretty(&mut writer, report)?;
    } else {
        serde_json::to_writer(&mut writer, report)?;
    }
    writeln!(writer)?;
    writer.flush()?;

    Ok(())
}

/// Save a report to the given file
pub fn save_report(report: &Report, path: impl AsRef<Path>, pretty: bool) -> Result<()> {
    let path = path.as_ref();
    log::info!("Saving {} clusters to {}", report.clusters.len(), path.display());

    let file = File::create(path)
        .with_context(|| format!("failed to create report file {}", path.display()))?;
    write_report(report, BufWriter::new(file), pretty)
        .with_context(|| format!("failed to write report to {}", path.display()))?;

    log::info!("Results saved successfully");

    Ok(())
}
