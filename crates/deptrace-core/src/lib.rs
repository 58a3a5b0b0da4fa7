//! # Deptrace Core
//!
//! Whole-program reachability and type-propagation analysis for a JVM-like
//! class model, with devirtualization of monomorphic call sites.
//!
//! ## Modules
//!
//! - **[`model`]** - Classes, methods, descriptors and method bodies
//! - **[`dependency`]** - Propagation graph, linking and the analysis session
//! - **[`optimization`]** - Rewrites that consume the settled analysis
//!
//! ## Quick Start
//!
//! ```rust
//! use deptrace_core::prelude::*;
//!
//! let classes = ClassSet::new();
//! let mut analyzer = DependencyAnalyzer::new(classes, AnalyzerConfig::default());
//! analyzer.process_dependencies();
//! assert!(analyzer.is_settled());
//! ```

pub mod dependency;
pub mod error;
pub mod model;
pub mod optimization;

pub use error::{AnalysisError, ModelError, Result};

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::dependency::{AnalysisMode, AnalyzerConfig, DependencyAnalyzer, EvictionSummary, Problem};
    pub use crate::error::{AnalysisError, ModelError};
    pub use crate::model::{
        BasicBlock, ClassHolder, ClassSet, ClassSource, Dispatch, FieldHolder, FieldRef, Instruction, MethodDescriptor,
        MethodHolder, MethodRef, Modifier, Program, RuntimeType, TryCatch, ValueType,
    };
    pub use crate::optimization::{Devirtualization, DevirtualizationStats};
}
