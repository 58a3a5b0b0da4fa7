//! Loading a class model and running one analysis over it

use anyhow::{Context, Result};
use deptrace_analysis::ReachabilityReport;
use deptrace_core::dependency::{AnalysisMode, AnalyzerConfig, DependencyAnalyzer};
use deptrace_core::model::{ClassSet, MethodRef, RuntimeType, ValueType, STRING_CLASS};
use std::path::{Path, PathBuf};
use tracing::info;

/// Everything needed to analyse a model from one entry point.
#[derive(Debug, Clone)]
pub struct AnalysisRequest {
    pub model: PathBuf,
    pub entry: MethodRef,
    pub config: AnalyzerConfig,
}

/// Reads the analyzer configuration, applying command-line overrides.
pub fn load_config(path: Option<&Path>, precise: bool) -> Result<AnalyzerConfig> {
    let mut config = match path {
        Some(path) => AnalyzerConfig::from_file(path)
            .with_context(|| format!("failed to read analyzer config {}", path.display()))?,
        None => AnalyzerConfig::default(),
    };
    if precise {
        config.mode = AnalysisMode::Precise;
    }
    Ok(config)
}

pub fn load_model(path: &Path) -> Result<ClassSet> {
    let classes = ClassSet::from_file(path).with_context(|| format!("failed to load class model {}", path.display()))?;
    info!(classes = classes.len(), path = %path.display(), "loaded class model");
    Ok(classes)
}

/// Adds `entry` as an entry point. A `main(String[])` entry also receives a
/// `String[]` argument array.
pub fn seed_entry_point(analyzer: &mut DependencyAnalyzer, entry: &MethodRef) -> Result<()> {
    analyzer.add_entry_point(entry)?;
    let arguments = ValueType::object(STRING_CLASS).with_degree(1);
    if entry.name() == "main" && entry.descriptor.params == [arguments.clone()] {
        if let Some(ty) = RuntimeType::from_value_type(&arguments) {
            analyzer.propagate_parameter(entry, 1, ty)?;
        }
    }
    Ok(())
}

/// Runs the analysis of `request` to its fixpoint.
pub fn analyze(request: &AnalysisRequest) -> Result<(DependencyAnalyzer, ReachabilityReport)> {
    let classes = load_model(&request.model)?;
    let mut analyzer = DependencyAnalyzer::new(classes, request.config.clone());
    seed_entry_point(&mut analyzer, &request.entry)?;
    analyzer.process_dependencies();
    let report = ReachabilityReport::from_analyzer(&analyzer)?;
    Ok((analyzer, report))
}
