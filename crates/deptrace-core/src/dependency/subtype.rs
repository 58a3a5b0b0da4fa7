//! Subtype aggregation nodes and array item nodes
//!
//! `subtype_node(T)` collects every instantiated type assignable to `T`.
//! Nodes are created on demand and wired to the nodes of their direct
//! supertypes by a deferred task, so the edges grow with the depth of the
//! hierarchy rather than with the number of call sites.

use super::analyzer::{DeferredTask, DependencyAnalyzer};
use super::graph::NodeId;
use crate::model::{PrimitiveType, ValueType, ROOT_CLASS};
use tracing::debug;

/// Identifies the shared node holding the items of arrays whose component
/// type strips to `primitive` (or a class, when `None`) after `degree`
/// dimensions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) struct ArrayItemKey {
    primitive: Option<PrimitiveType>,
    degree: usize,
}

impl ArrayItemKey {
    const OBJECT: ArrayItemKey = ArrayItemKey {
        primitive: None,
        degree: 0,
    };

    fn of(component: &ValueType) -> Self {
        let (degree, element) = component.strip_arrays();
        let primitive = match element {
            ValueType::Primitive(primitive) => Some(*primitive),
            _ => None,
        };
        Self { primitive, degree }
    }

    fn carries_references(self) -> bool {
        self.primitive.is_none() || self.degree > 0
    }
}

impl DependencyAnalyzer {
    /// Aggregation node of all instantiated subtypes of `ty`.
    ///
    /// The root class maps to [`instances_node`](Self::instances_node).
    pub fn subtype_node(&mut self, ty: &ValueType) -> NodeId {
        if ty.is_object(ROOT_CLASS) {
            return self.instances;
        }
        if let Some(&node) = self.subtype_nodes.get(ty) {
            return node;
        }
        let node = self.graph.create_node();
        self.subtype_nodes.insert(ty.clone(), node);
        debug!(ty = %ty, "created subtype node");
        self.defer(DeferredTask::ConnectSupertypes { ty: ty.clone(), node });
        node
    }

    /// Connects `node`, the aggregation node of `ty`, to the aggregation
    /// nodes of the direct supertypes of `ty` at the same array degree.
    ///
    /// Arrays of primitives, arrays of the root class and classes that cannot
    /// be found connect to the root instead.
    pub(crate) fn connect_supertypes(&mut self, ty: &ValueType, node: NodeId) {
        let (degree, element) = ty.strip_arrays();
        let name = match element {
            ValueType::Object(name) if name != ROOT_CLASS => name.clone(),
            _ => {
                self.connect(node, self.instances);
                return;
            }
        };
        let Some(class) = self.hierarchy.get(&name) else {
            self.link_class(&name);
            self.connect(node, self.instances);
            return;
        };

        let supertypes: Vec<ValueType> = class
            .supertypes()
            .map(|supertype| ValueType::object(supertype).with_degree(degree))
            .collect();
        if supertypes.is_empty() {
            self.connect(node, self.instances);
            return;
        }
        for supertype in supertypes {
            let target = self.subtype_node(&supertype);
            self.connect(node, target);
        }
    }

    /// Node holding the items of arrays with component type `component`.
    pub(crate) fn array_item_node(&mut self, component: &ValueType) -> NodeId {
        let key = ArrayItemKey::of(component);
        if let Some(&node) = self.array_item_nodes.get(&key) {
            return node;
        }
        let node = self.graph.create_node();
        self.array_item_nodes.insert(key, node);

        // Covariance: an Object[] may hold the items of any reference array.
        if key != ArrayItemKey::OBJECT && key.carries_references() {
            let object = self.array_item_node(&ValueType::object(ROOT_CLASS));
            self.connect(node, object);
            self.connect(object, node);
        }
        node
    }
}
