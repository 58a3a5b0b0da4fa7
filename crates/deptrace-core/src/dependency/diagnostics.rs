//! Problems found in the closed world while linking

use crate::model::{ClassName, FieldRef, MethodRef};
use indexmap::IndexSet;
use serde::Serialize;
use thiserror::Error;
use tracing::warn;

/// An inconsistency in the class metadata. The analysis keeps going and
/// treats the reference as resolving to the universal root.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Error, Serialize)]
#[serde(tag = "kind", content = "reference", rename_all = "snake_case")]
pub enum Problem {
    #[error("class {0} not found")]
    ClassNotFound(ClassName),
    #[error("method {0} not found")]
    MethodNotFound(MethodRef),
    #[error("field {0} not found")]
    FieldNotFound(FieldRef),
    #[error("entry point {0} not found")]
    EntryPointNotFound(MethodRef),
}

/// Collects problems, reporting each distinct one once per session.
#[derive(Debug, Default)]
pub struct Diagnostics {
    problems: IndexSet<Problem>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn report(&mut self, problem: Problem) {
        if self.problems.contains(&problem) {
            return;
        }
        warn!("{}", problem);
        self.problems.insert(problem);
    }

    pub fn problems(&self) -> impl Iterator<Item = &Problem> {
        self.problems.iter()
    }

    pub fn len(&self) -> usize {
        self.problems.len()
    }

    pub fn is_empty(&self) -> bool {
        self.problems.is_empty()
    }

    pub fn clear(&mut self) {
        self.problems.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_problems_are_reported_once() {
        let mut diagnostics = Diagnostics::new();
        diagnostics.report(Problem::ClassNotFound("A".to_string()));
        diagnostics.report(Problem::ClassNotFound("A".to_string()));
        diagnostics.report(Problem::ClassNotFound("B".to_string()));
        assert_eq!(diagnostics.len(), 2);
        assert_eq!(
            diagnostics.problems().map(ToString::to_string).collect::<Vec<_>>(),
            vec!["class A not found", "class B not found"]
        );
    }
}
