//! Whole-program reachability and type propagation
//!
//! This module implements the dependency analysis:
//! - An arena-based propagation graph with replaying edges and consumers
//! - A two-queue driver (method worklist, deferred tasks) run to a fixpoint
//! - Transfer functions for every instruction of the program model
//! - Subtype aggregation nodes shared by all call sites of a declared type
//! - Lazy virtual call resolution in fast or precise mode
//! - Stale-class eviction for watch-mode reuse of a session

mod analyzer;
mod config;
mod diagnostics;
mod graph;
mod hierarchy;
mod instructions;
mod records;
mod subtype;
mod virtual_call;

pub use analyzer::{AnalysisStats, DependencyAnalyzer, EvictionSummary};
pub use config::{AnalysisMode, AnalyzerConfig};
pub use diagnostics::{Diagnostics, Problem};
pub use graph::{ConsumerId, Delivery, NodeId, PropagationGraph, PropagationStats, TypeId};
pub use hierarchy::ClassHierarchy;
pub use records::{CallSiteKey, ClassDependency, FieldDependency, MethodDependency, MethodId};
pub use virtual_call::{ResolverId, VirtualCallResolver};
