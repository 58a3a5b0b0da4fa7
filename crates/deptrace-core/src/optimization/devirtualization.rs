//! Devirtualization of monomorphic call sites
//!
//! A virtual or interface invocation whose call site resolved to exactly one
//! implementation is rewritten to a direct call of that implementation.
//! Sites with no target (never reached) or several targets are left alone.

use crate::dependency::DependencyAnalyzer;
use crate::error::Result;
use crate::model::{Dispatch, Instruction, MethodRef, Program};
use indexmap::IndexMap;
use serde::Serialize;
use tracing::{debug, info};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DevirtualizationStats {
    /// Dynamic call sites looked at.
    pub examined: usize,
    pub devirtualized: usize,
    pub polymorphic: usize,
    pub unreachable: usize,
}

impl DevirtualizationStats {
    fn merge(&mut self, other: DevirtualizationStats) {
        self.examined += other.examined;
        self.devirtualized += other.devirtualized;
        self.polymorphic += other.polymorphic;
        self.unreachable += other.unreachable;
    }
}

/// Applies devirtualization using the results of a settled analysis.
///
/// ```
/// use deptrace_core::dependency::{AnalyzerConfig, DependencyAnalyzer};
/// use deptrace_core::model::ClassSet;
/// use deptrace_core::optimization::Devirtualization;
///
/// let analyzer = DependencyAnalyzer::new(ClassSet::new(), AnalyzerConfig::default());
/// let devirtualization = Devirtualization::new(&analyzer).unwrap();
/// assert_eq!(devirtualization.stats().examined, 0);
/// ```
#[derive(Debug)]
pub struct Devirtualization<'a> {
    analyzer: &'a DependencyAnalyzer,
    stats: DevirtualizationStats,
}

impl<'a> Devirtualization<'a> {
    /// Fails with [`AnalysisError::NotSettled`](crate::error::AnalysisError::NotSettled)
    /// while the analysis still has pending work.
    pub fn new(analyzer: &'a DependencyAnalyzer) -> Result<Self> {
        analyzer.ensure_settled()?;
        Ok(Self {
            analyzer,
            stats: DevirtualizationStats::default(),
        })
    }

    /// Rewrites the dynamic invocations of `program`, the body of `method`.
    /// Returns the number of rewritten call sites.
    pub fn apply(&mut self, method: &MethodRef, program: &mut Program) -> usize {
        if self.analyzer.method(method).is_none() {
            return 0;
        }
        let mut stats = DevirtualizationStats::default();

        for instruction in program.instructions_mut() {
            let Instruction::Invoke {
                instance: Some(instance),
                method: callee,
                dispatch,
                ..
            } = instruction
            else {
                continue;
            };
            if !dispatch.is_dynamic() {
                continue;
            }
            stats.examined += 1;

            let targets = self.analyzer.call_site_targets(method, *instance, &callee.descriptor);
            match targets.len() {
                0 => stats.unreachable += 1,
                1 => {
                    if let Some(target) = targets.into_iter().next() {
                        debug!(caller = %method, callee = %callee, target = %target, "devirtualized call");
                        *callee = target;
                        *dispatch = Dispatch::Special;
                        stats.devirtualized += 1;
                    }
                }
                _ => stats.polymorphic += 1,
            }
        }

        self.stats.merge(stats);
        stats.devirtualized
    }

    /// Devirtualized copies of the bodies of every reachable method.
    pub fn apply_all(&mut self) -> IndexMap<MethodRef, Program> {
        let mut programs = IndexMap::new();
        for record in self.analyzer.methods() {
            let Some(program) = &record.holder().program else {
                continue;
            };
            let mut program = program.clone();
            self.apply(record.reference(), &mut program);
            programs.insert(record.reference().clone(), program);
        }
        info!(
            examined = self.stats.examined,
            devirtualized = self.stats.devirtualized,
            polymorphic = self.stats.polymorphic,
            "devirtualization finished"
        );
        programs
    }

    pub fn stats(&self) -> DevirtualizationStats {
        self.stats
    }
}
