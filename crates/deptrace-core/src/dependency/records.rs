//! Per-entity dependency records owned by the analysis session

use super::graph::NodeId;
use super::virtual_call::ResolverId;
use crate::model::{ClassHolder, ClassName, FieldRef, MethodDescriptor, MethodHolder, MethodRef, Variable};
use indexmap::IndexMap;
use smallvec::SmallVec;
use std::sync::Arc;

/// Index of a linked method within the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MethodId(pub(crate) usize);

/// Identifies a dynamic call site within its caller.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CallSiteKey {
    pub receiver: Variable,
    pub descriptor: MethodDescriptor,
}

#[derive(Debug, Clone)]
pub struct ClassDependency {
    pub name: ClassName,
    /// Referenced but absent from the class source.
    pub missing: bool,
    pub initialized: bool,
}

#[derive(Debug, Clone)]
pub struct FieldDependency {
    pub reference: FieldRef,
    pub node: NodeId,
}

/// Analysis state of one linked method.
///
/// `parameters[0]` is the receiver slot (unused for static methods);
/// `parameters[i]` for `i >= 1` is the i-th declared parameter.
#[derive(Debug, Clone)]
pub struct MethodDependency {
    pub(crate) reference: MethodRef,
    pub(crate) class: Arc<ClassHolder>,
    pub(crate) method_index: usize,
    pub(crate) parameters: Vec<NodeId>,
    pub(crate) result: NodeId,
    pub(crate) thrown: NodeId,
    pub(crate) variables: Vec<NodeId>,
    pub(crate) processed: bool,
    pub(crate) call_sites: IndexMap<CallSiteKey, SmallVec<[ResolverId; 1]>>,
}

impl MethodDependency {
    pub fn reference(&self) -> &MethodRef {
        &self.reference
    }

    pub fn holder(&self) -> &MethodHolder {
        &self.class.methods[self.method_index]
    }

    pub fn has_body(&self) -> bool {
        self.holder().program.is_some()
    }

    /// Whether the instruction-level transfer functions have run.
    pub fn is_processed(&self) -> bool {
        self.processed
    }

    pub fn parameter(&self, index: usize) -> Option<NodeId> {
        self.parameters.get(index).copied()
    }

    pub fn parameters(&self) -> &[NodeId] {
        &self.parameters
    }

    pub fn result(&self) -> NodeId {
        self.result
    }

    pub fn thrown(&self) -> NodeId {
        self.thrown
    }

    /// Node of a local variable; `None` until the body has been processed.
    pub fn variable(&self, variable: Variable) -> Option<NodeId> {
        self.variables.get(variable).copied()
    }

    pub fn variable_count(&self) -> usize {
        self.variables.len()
    }

    pub fn call_sites(&self) -> impl Iterator<Item = &CallSiteKey> {
        self.call_sites.keys()
    }

    pub(crate) fn resolvers_for(&self, key: &CallSiteKey) -> &[ResolverId] {
        self.call_sites.get(key).map(|ids| ids.as_slice()).unwrap_or(&[])
    }
}
