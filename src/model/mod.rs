//! Domain model: graph, flow, run, and trace types + topology wrapper.

pub mod graph;
pub mod types;

pub use graph::{EdgeLabel, GraphTopology};
pub use types::*;
