//! Human-readable rendering of reachability reports

use colored::Colorize;
use deptrace_analysis::ReachabilityReport;
use std::fmt::Write;

pub fn render_text(report: &ReachabilityReport, verbose: bool) -> String {
    let mut out = String::new();
    let summary = &report.summary;

    let _ = writeln!(
        out,
        "{} (generation {}, {:?} mode)",
        "Reachability".bold(),
        report.generation,
        report.mode
    );
    let _ = writeln!(out, "  classes:  {}", summary.classes);
    let _ = writeln!(
        out,
        "  methods:  {} ({} with body)",
        summary.methods, summary.methods_with_body
    );
    let _ = writeln!(out, "  fields:   {}", summary.fields);

    let sites = &report.call_sites;
    let _ = writeln!(out, "{}", "Call sites".bold());
    let _ = writeln!(out, "  monomorphic:  {}", sites.monomorphic.to_string().green());
    let _ = writeln!(out, "  polymorphic:  {}", sites.polymorphic.to_string().yellow());
    let _ = writeln!(out, "  megamorphic:  {}", sites.megamorphic.to_string().red());
    let _ = writeln!(out, "  unreachable:  {}", sites.unreachable);
    let _ = writeln!(
        out,
        "  devirtualized {} of {} ({:.1}% of reached sites monomorphic)",
        report.devirtualization.devirtualized,
        report.devirtualization.examined,
        sites.monomorphic_percentage()
    );

    if verbose {
        let _ = writeln!(out, "{}", "Methods".bold());
        for method in &report.methods {
            let marker = if method.has_body { " " } else { "*" };
            let _ = writeln!(out, "  {marker} {}", method.reference);
        }
    }

    if !report.diagnostics.is_empty() {
        let _ = writeln!(out, "{}", "Problems".bold().red());
        for problem in &report.diagnostics {
            let _ = writeln!(out, "  {} {}", "warning:".yellow(), problem);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use deptrace_core::dependency::{AnalyzerConfig, DependencyAnalyzer};
    use deptrace_core::model::{BasicBlock, ClassHolder, ClassSet, Instruction, MethodHolder, Modifier, Program};

    fn report() -> ReachabilityReport {
        let body = Program::new(
            2,
            vec![BasicBlock::new(vec![
                Instruction::Construct {
                    receiver: 1,
                    class: "Missing".to_string(),
                },
                Instruction::Return { value: None },
            ])],
        );
        let classes = ClassSet::new().with(
            ClassHolder::new("Main")
                .with_method(MethodHolder::new("main()V".parse().unwrap(), Some(body)).with_modifier(Modifier::Static)),
        );
        let mut analyzer = DependencyAnalyzer::new(classes, AnalyzerConfig::default());
        analyzer.add_entry_point(&"Main.main()V".parse().unwrap()).unwrap();
        analyzer.process_dependencies();
        ReachabilityReport::from_analyzer(&analyzer).unwrap()
    }

    #[test]
    fn test_render_lists_problems_and_methods() {
        colored::control::set_override(false);
        let text = render_text(&report(), true);

        assert!(text.contains("Reachability (generation 0, Fast mode)"));
        assert!(text.contains("methods:  1 (1 with body)"));
        assert!(text.contains("Main.main()V"));
        assert!(text.contains("warning: class Missing not found"));
    }

    #[test]
    fn test_methods_hidden_unless_verbose() {
        colored::control::set_override(false);
        let text = render_text(&report(), false);
        assert!(!text.contains("Methods"));
    }
}
