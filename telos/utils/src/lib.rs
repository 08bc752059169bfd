//! Shared utilities for the telos compiler.
mod errors;
mod id;
mod out_file;
mod weight_graph;

pub use errors::{Error, TelosResult};
pub use id::{GSym, GetName, Id};
pub use out_file::OutputFile;
pub use weight_graph::WeightGraph;
