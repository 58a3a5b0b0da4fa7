//! Reachability metrics
//!
//! Summarises a settled dependency analysis: what is reachable, how the
//! dynamic call sites resolved, and what devirtualization would achieve.

pub mod call_sites;

use anyhow::Result;
use deptrace_core::dependency::{AnalysisMode, DependencyAnalyzer, Problem, PropagationStats};
use deptrace_core::optimization::{Devirtualization, DevirtualizationStats};
use serde::{Deserialize, Serialize};
use tracing::debug;

pub use call_sites::{CallSiteDistribution, MEGAMORPHIC_THRESHOLD};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MethodMetrics {
    pub reference: String,
    pub has_body: bool,
    pub variables: usize,
    pub call_sites: usize,
    /// Sum of resolved targets over the method's dynamic call sites.
    pub resolved_targets: usize,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReachabilitySummary {
    pub classes: usize,
    pub methods: usize,
    pub methods_with_body: usize,
    pub fields: usize,
    pub problems: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReachabilityReport {
    pub generation: u32,
    pub mode: AnalysisMode,
    pub summary: ReachabilitySummary,
    pub classes: Vec<String>,
    pub methods: Vec<MethodMetrics>,
    pub fields: Vec<String>,
    pub call_sites: CallSiteDistribution,
    pub devirtualization: DevirtualizationStats,
    pub propagation: PropagationStats,
    pub diagnostics: Vec<Problem>,
}

impl ReachabilityReport {
    /// Builds the report. Fails when the analysis has not reached its
    /// fixpoint.
    pub fn from_analyzer(analyzer: &DependencyAnalyzer) -> Result<Self> {
        let mut devirtualization = Devirtualization::new(analyzer)?;
        devirtualization.apply_all();

        let mut classes: Vec<String> = analyzer.reachable_classes().map(str::to_string).collect();
        classes.sort();
        let mut fields: Vec<String> = analyzer.reachable_fields().map(ToString::to_string).collect();
        fields.sort();

        let mut call_sites = CallSiteDistribution::new();
        let methods: Vec<MethodMetrics> = analyzer
            .methods()
            .map(|record| {
                let mut sites = 0;
                let mut resolved_targets = 0;
                for site in record.call_sites() {
                    let targets = analyzer
                        .call_site_targets(record.reference(), site.receiver, &site.descriptor)
                        .len();
                    call_sites.add(targets);
                    sites += 1;
                    resolved_targets += targets;
                }
                MethodMetrics {
                    reference: record.reference().to_string(),
                    has_body: record.has_body(),
                    variables: record.variable_count(),
                    call_sites: sites,
                    resolved_targets,
                }
            })
            .collect();

        let diagnostics: Vec<Problem> = analyzer.diagnostics().problems().cloned().collect();
        let summary = ReachabilitySummary {
            classes: classes.len(),
            methods: methods.len(),
            methods_with_body: methods.iter().filter(|m| m.has_body).count(),
            fields: fields.len(),
            problems: diagnostics.len(),
        };
        debug!(?summary, "built reachability report");

        Ok(Self {
            generation: analyzer.generation(),
            mode: analyzer.config().mode,
            summary,
            classes,
            methods,
            fields,
            call_sites,
            devirtualization: devirtualization.stats(),
            propagation: analyzer.propagation_stats(),
            diagnostics,
        })
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use deptrace_core::dependency::AnalyzerConfig;
    use deptrace_core::model::{
        BasicBlock, ClassHolder, ClassSet, Dispatch, Instruction, MethodHolder, MethodRef, Modifier, Program,
        ROOT_CLASS,
    };

    fn program(variable_count: usize, instructions: Vec<Instruction>) -> Option<Program> {
        Some(Program::new(variable_count, vec![BasicBlock::new(instructions)]))
    }

    fn shape_classes() -> ClassSet {
        let area = || MethodHolder::new("area()I".parse().unwrap(), program(1, vec![Instruction::Return { value: None }]));
        let invoke = |instance| Instruction::Invoke {
            receiver: None,
            instance: Some(instance),
            method: "Shape.area()I".parse().unwrap(),
            arguments: vec![],
            dispatch: Dispatch::Virtual("Shape".to_string()),
        };
        let main = MethodHolder::new(
            "main()V".parse().unwrap(),
            program(
                4,
                vec![
                    Instruction::Construct {
                        receiver: 1,
                        class: "Circle".to_string(),
                    },
                    Instruction::Construct {
                        receiver: 2,
                        class: "Square".to_string(),
                    },
                    invoke(1),
                    invoke(3),
                    Instruction::Return { value: None },
                ],
            ),
        )
        .with_modifier(Modifier::Static);

        ClassSet::new()
            .with(ClassHolder::new(ROOT_CLASS))
            .with(
                ClassHolder::new("Shape")
                    .with_parent(ROOT_CLASS)
                    .with_method(MethodHolder::new("area()I".parse().unwrap(), None).with_modifier(Modifier::Abstract)),
            )
            .with(ClassHolder::new("Circle").with_parent("Shape").with_method(area()))
            .with(ClassHolder::new("Square").with_parent("Shape").with_method(area()))
            .with(ClassHolder::new("Main").with_parent(ROOT_CLASS).with_method(main))
    }

    fn analyzed(config: AnalyzerConfig) -> DependencyAnalyzer {
        let mut analyzer = DependencyAnalyzer::new(shape_classes(), config);
        let main: MethodRef = "Main.main()V".parse().unwrap();
        analyzer.add_entry_point(&main).unwrap();
        analyzer.process_dependencies();
        analyzer
    }

    #[test]
    fn test_precise_report() {
        let report = ReachabilityReport::from_analyzer(&analyzed(AnalyzerConfig::precise())).unwrap();

        assert_eq!(report.mode, AnalysisMode::Precise);
        assert_eq!(report.classes, vec!["Circle", "Main", "Shape", "Square", ROOT_CLASS]);
        assert_eq!(report.summary.methods, 2);
        assert_eq!(report.call_sites.monomorphic, 1);
        assert_eq!(report.call_sites.unreachable, 1);
        assert_eq!(report.devirtualization.devirtualized, 1);
        assert!(report.diagnostics.is_empty());

        let main = &report.methods[0];
        assert_eq!(main.reference, "Main.main()V");
        assert_eq!(main.call_sites, 2);
        assert_eq!(main.resolved_targets, 1);
    }

    #[test]
    fn test_fast_report_aggregates_subtypes() {
        let report = ReachabilityReport::from_analyzer(&analyzed(AnalyzerConfig::default())).unwrap();

        assert_eq!(report.mode, AnalysisMode::Fast);
        assert_eq!(report.summary.methods, 3);
        assert_eq!(report.call_sites.polymorphic, 2);
        assert_eq!(report.devirtualization.devirtualized, 0);
    }

    #[test]
    fn test_unsettled_analysis_is_an_error() {
        let mut analyzer = DependencyAnalyzer::new(shape_classes(), AnalyzerConfig::default());
        analyzer.add_entry_point(&"Main.main()V".parse().unwrap()).unwrap();
        assert!(ReachabilityReport::from_analyzer(&analyzer).is_err());
    }

    #[test]
    fn test_report_serializes() {
        let report = ReachabilityReport::from_analyzer(&analyzed(AnalyzerConfig::default())).unwrap();
        let json: serde_json::Value = serde_json::from_str(&report.to_json().unwrap()).unwrap();
        assert_eq!(json["mode"], "fast");
        assert_eq!(json["summary"]["classes"], 5);
    }
}
