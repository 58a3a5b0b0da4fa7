//! Analyzer configuration

use serde::{Deserialize, Serialize};
use std::path::Path;

/// How virtual call sites are resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnalysisMode {
    /// One resolver per declared callee, fed by the aggregated subtype node
    /// of the declaring class.
    #[default]
    Fast,
    /// One resolver per call site, fed by the receiver variable's own node.
    Precise,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalyzerConfig {
    pub mode: AnalysisMode,
    /// Target can suspend cooperatively on monitor acquisition.
    pub async_supported: bool,
    /// Link `<clinit>` when a class is first initialised.
    pub link_class_initializers: bool,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            mode: AnalysisMode::Fast,
            async_supported: false,
            link_class_initializers: true,
        }
    }
}

impl AnalyzerConfig {
    pub fn precise() -> Self {
        Self {
            mode: AnalysisMode::Precise,
            ..Self::default()
        }
    }

    pub fn from_file(path: &Path) -> std::io::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&content)?;
        Ok(config)
    }
}
