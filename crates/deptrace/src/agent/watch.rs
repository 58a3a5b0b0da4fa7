//! Watch mode for Deptrace
//!
//! Keeps one analysis session alive across edits of the class model. Every
//! reload is diffed against the previous model and only the classes that
//! changed are evicted before the analysis runs again.

use anyhow::{Context, Result};
use deptrace_analysis::ReachabilityReport;
use deptrace_core::dependency::{DependencyAnalyzer, EvictionSummary};
use deptrace_core::model::{ClassName, ClassSet};
use notify::{EventKind, RecursiveMode, Watcher};
use serde::Serialize;
use std::path::Path;
use std::sync::mpsc;
use std::time::SystemTime;
use tracing::{debug, error, info, warn};

use crate::session::{load_model, seed_entry_point, AnalysisRequest};

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
pub enum WatchStatus {
    Starting,
    Watching,
    Analyzing,
    Error,
}

#[derive(Debug, Clone, Serialize)]
pub struct WatchState {
    pub status: WatchStatus,
    pub start_time: SystemTime,
    pub runs: u64,
    pub failed_reloads: u64,
    pub last_changed: Vec<ClassName>,
    pub last_eviction: Option<EvictionSummary>,
    pub last_error: Option<String>,
}

impl Default for WatchState {
    fn default() -> Self {
        Self {
            status: WatchStatus::Starting,
            start_time: SystemTime::now(),
            runs: 0,
            failed_reloads: 0,
            last_changed: Vec::new(),
            last_eviction: None,
            last_error: None,
        }
    }
}

pub struct WatchSession {
    request: AnalysisRequest,
    classes: ClassSet,
    analyzer: DependencyAnalyzer,
    state: WatchState,
}

impl WatchSession {
    /// Loads the model and runs the first analysis.
    pub fn start(request: AnalysisRequest) -> Result<(Self, ReachabilityReport)> {
        info!("Starting watch session for {}", request.model.display());
        let classes = load_model(&request.model)?;
        let mut analyzer = DependencyAnalyzer::new(classes.clone(), request.config.clone());
        seed_entry_point(&mut analyzer, &request.entry)?;
        analyzer.process_dependencies();
        let report = ReachabilityReport::from_analyzer(&analyzer)?;

        let state = WatchState {
            status: WatchStatus::Watching,
            runs: 1,
            ..WatchState::default()
        };
        Ok((
            Self {
                request,
                classes,
                analyzer,
                state,
            },
            report,
        ))
    }

    pub fn state(&self) -> &WatchState {
        &self.state
    }

    pub fn analyzer(&self) -> &DependencyAnalyzer {
        &self.analyzer
    }

    /// Re-reads the model. Returns `None` when no class changed.
    pub fn reload(&mut self) -> Result<Option<ReachabilityReport>> {
        let classes = load_model(&self.request.model)?;
        let changed = self.classes.changed_classes(&classes);
        if changed.is_empty() {
            debug!("Class model unchanged");
            return Ok(None);
        }
        info!("{} classes changed: {}", changed.len(), changed.join(", "));

        self.state.status = WatchStatus::Analyzing;
        self.analyzer.set_class_source(classes.clone());
        let eviction = self.analyzer.evict(changed.iter().cloned());
        self.classes = classes;
        self.analyzer.process_dependencies();
        let report = ReachabilityReport::from_analyzer(&self.analyzer)?;

        self.state.runs += 1;
        self.state.last_changed = changed;
        self.state.last_eviction = Some(eviction);

        let unresolved: Vec<String> = self.analyzer.unresolved_entry_points().map(ToString::to_string).collect();
        if unresolved.is_empty() {
            self.state.status = WatchStatus::Watching;
            self.state.last_error = None;
        } else {
            // Kept by the analyzer; retried on the next change.
            warn!("Entry point unresolved: {}", unresolved.join(", "));
            self.state.status = WatchStatus::Error;
            self.state.last_error = Some(format!("unresolved entry point {}", unresolved.join(", ")));
        }
        Ok(Some(report))
    }

    /// Blocks, reloading whenever the model file changes and handing every
    /// new report to `on_report`.
    pub fn run(&mut self, mut on_report: impl FnMut(&ReachabilityReport)) -> Result<()> {
        let model = self.request.model.clone();
        let directory = match model.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => Path::new(".").to_path_buf(),
        };
        let file_name = model
            .file_name()
            .map(ToOwned::to_owned)
            .with_context(|| format!("{} is not a file path", model.display()))?;

        let (tx, rx) = mpsc::channel();
        let mut watcher = notify::recommended_watcher(tx).context("failed to create file watcher")?;
        // Editors often replace the file, so watch its directory.
        watcher
            .watch(&directory, RecursiveMode::NonRecursive)
            .with_context(|| format!("failed to watch {}", directory.display()))?;
        info!("Watching {} for changes", model.display());

        for event in rx {
            let event = match event {
                Ok(event) => event,
                Err(e) => {
                    warn!("Watcher error: {}", e);
                    continue;
                }
            };
            if !matches!(event.kind, EventKind::Create(_) | EventKind::Modify(_)) {
                continue;
            }
            if !event.paths.iter().any(|path| path.file_name() == Some(file_name.as_os_str())) {
                continue;
            }
            match self.reload() {
                Ok(Some(report)) => on_report(&report),
                Ok(None) => {}
                Err(e) => {
                    error!("Reload failed: {:#}", e);
                    self.state.status = WatchStatus::Error;
                    self.state.failed_reloads += 1;
                    self.state.last_error = Some(format!("{e:#}"));
                }
            }
        }
        Ok(())
    }
}
