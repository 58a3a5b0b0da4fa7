//! # Deptrace
//!
//! Command-line driver for the Deptrace reachability analysis: loads a JSON
//! class model, analyses it from an entry point and reports the results.

pub mod agent;
pub mod report;
pub mod session;

pub use session::{analyze, load_config, load_model, seed_entry_point, AnalysisRequest};
