//! Graph input loading

pub mod gml;

pub use gml::{load_graph, parse_graph, GmlError, GmlErrorCode};
