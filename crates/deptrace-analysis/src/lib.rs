//! # Deptrace Analysis
//!
//! Reporting over a settled Deptrace dependency analysis.
//!
//! ## Modules
//!
//! - **[`metrics`]** - Reachability summary and call-site metrics
//!
//! ## Quick Start
//!
//! ```rust
//! use deptrace_analysis::prelude::*;
//! use deptrace_core::prelude::*;
//!
//! let mut analyzer = DependencyAnalyzer::new(ClassSet::new(), AnalyzerConfig::default());
//! analyzer.process_dependencies();
//!
//! let report = ReachabilityReport::from_analyzer(&analyzer).unwrap();
//! assert_eq!(report.summary.methods, 0);
//! ```

pub mod metrics;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::metrics::{
        CallSiteDistribution, MethodMetrics, ReachabilityReport, ReachabilitySummary, MEGAMORPHIC_THRESHOLD,
    };
}

pub use metrics::{CallSiteDistribution, MethodMetrics, ReachabilityReport, ReachabilitySummary};
