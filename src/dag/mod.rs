//! DAG Module - static view of `depends` edges
//!
//! Diagnostics only: the runner never consults this to decide ordering
//! (it waits on completion signals), and a cycle is reported, not resolved.

mod graph;

pub use graph::{dangling_dependencies, DependencyGraph};
