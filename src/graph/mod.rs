//! Weighted graph representation and construction

pub mod compressed;
pub mod builder;

pub use builder::{BuildError, EdgeInsert, GraphBuilder};
pub use compressed::{Adjacent, CompressedGraph, Edge};
