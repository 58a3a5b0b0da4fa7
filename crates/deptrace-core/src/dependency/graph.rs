//! Type-propagation graph
//!
//! Nodes live in an arena and are addressed by [`NodeId`]. Each node owns a
//! monotone set of observed types, an append-only list of outgoing edges and
//! an append-only list of consumer handles. Adding a type floods it along
//! edges with an explicit worklist; consumers are not called from here but
//! queued as [`Delivery`] records, which the owning session drains. This
//! keeps the graph free of callbacks that would need mutable access to the
//! session while the graph itself is borrowed.

use crate::model::RuntimeType;
use indexmap::IndexSet;
use serde::Serialize;
use std::collections::VecDeque;
use tracing::trace;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct NodeId(u32);

impl NodeId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Interned [`RuntimeType`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TypeId(u32);

/// Handle of a consumer registered on one or more nodes.
///
/// The meaning of a handle is owned by whoever allocated it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConsumerId(pub u32);

/// A pending consumer invocation: `consumer` must observe `ty`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Delivery {
    pub consumer: ConsumerId,
    pub ty: TypeId,
}

#[derive(Debug, Default)]
struct Node {
    types: IndexSet<TypeId>,
    edges: IndexSet<NodeId>,
    consumers: Vec<ConsumerId>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PropagationStats {
    pub nodes: usize,
    pub edges: usize,
    /// Number of (node, type) pairs that were new when delivered.
    pub type_additions: usize,
    pub consumer_deliveries: usize,
}

#[derive(Debug, Default)]
pub struct PropagationGraph {
    nodes: Vec<Node>,
    types: IndexSet<RuntimeType>,
    pending: VecDeque<Delivery>,
    stats: PropagationStats,
}

impl PropagationGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn create_node(&mut self) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(Node::default());
        self.stats.nodes += 1;
        id
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn intern(&mut self, ty: RuntimeType) -> TypeId {
        let (index, _) = self.types.insert_full(ty);
        TypeId(index as u32)
    }

    pub fn type_id(&self, ty: &RuntimeType) -> Option<TypeId> {
        self.types.get_index_of(ty).map(|index| TypeId(index as u32))
    }

    pub fn runtime_type(&self, id: TypeId) -> &RuntimeType {
        &self.types[id.0 as usize]
    }

    /// Adds `ty` to `node` and everything reachable from it.
    ///
    /// Returns `false` when `node` already held the type, in which case
    /// nothing else happens.
    pub fn add_type(&mut self, node: NodeId, ty: TypeId) -> bool {
        if self.nodes[node.index()].types.contains(&ty) {
            return false;
        }
        self.flood(vec![(node, ty)]);
        true
    }

    /// Appends the edge `from -> to` and replays every type already in
    /// `from` into `to`.
    pub fn connect(&mut self, from: NodeId, to: NodeId) {
        if from == to || !self.nodes[from.index()].edges.insert(to) {
            return;
        }
        self.stats.edges += 1;
        let history: Vec<(NodeId, TypeId)> = self.nodes[from.index()]
            .types
            .iter()
            .map(|&ty| (to, ty))
            .collect();
        self.flood(history);
    }

    /// Registers `consumer` on `node` and queues one delivery for every type
    /// the node already holds.
    pub fn add_consumer(&mut self, node: NodeId, consumer: ConsumerId) {
        let target = &mut self.nodes[node.index()];
        if target.consumers.contains(&consumer) {
            return;
        }
        target.consumers.push(consumer);
        for &ty in &target.types {
            self.pending.push_back(Delivery { consumer, ty });
        }
    }

    pub fn next_delivery(&mut self) -> Option<Delivery> {
        let delivery = self.pending.pop_front()?;
        self.stats.consumer_deliveries += 1;
        Some(delivery)
    }

    pub fn has_pending_deliveries(&self) -> bool {
        !self.pending.is_empty()
    }

    fn flood(&mut self, mut work: Vec<(NodeId, TypeId)>) {
        while let Some((node_id, ty)) = work.pop() {
            let node = &mut self.nodes[node_id.index()];
            if !node.types.insert(ty) {
                continue;
            }
            self.stats.type_additions += 1;
            trace!(node = node_id.0, ty = %self.types[ty.0 as usize], "type added");
            for &consumer in &node.consumers {
                self.pending.push_back(Delivery { consumer, ty });
            }
            work.extend(node.edges.iter().map(|&target| (target, ty)));
        }
    }

    /// Whether `node` belongs to this arena.
    pub fn has_node(&self, node: NodeId) -> bool {
        node.index() < self.nodes.len()
    }

    pub fn contains(&self, node: NodeId, ty: &RuntimeType) -> bool {
        match (self.nodes.get(node.index()), self.type_id(ty)) {
            (Some(node), Some(id)) => node.types.contains(&id),
            _ => false,
        }
    }

    /// Types observed at `node`, in arrival order. Empty for a handle from
    /// another arena that falls outside this one.
    pub fn types(&self, node: NodeId) -> impl Iterator<Item = &RuntimeType> + '_ {
        self.type_ids(node).map(move |id| self.runtime_type(id))
    }

    pub fn type_ids(&self, node: NodeId) -> impl Iterator<Item = TypeId> + '_ {
        self.nodes
            .get(node.index())
            .into_iter()
            .flat_map(|node| node.types.iter().copied())
    }

    pub fn type_count(&self, node: NodeId) -> usize {
        self.nodes.get(node.index()).map_or(0, |node| node.types.len())
    }

    pub fn edges(&self, node: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        self.nodes
            .get(node.index())
            .into_iter()
            .flat_map(|node| node.edges.iter().copied())
    }

    pub fn stats(&self) -> PropagationStats {
        self.stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn drain(graph: &mut PropagationGraph) -> Vec<Delivery> {
        std::iter::from_fn(|| graph.next_delivery()).collect()
    }

    #[test]
    fn test_add_type_is_idempotent() {
        let mut graph = PropagationGraph::new();
        let a = graph.create_node();
        let x = graph.intern(RuntimeType::class("X"));
        graph.add_consumer(a, ConsumerId(7));

        assert!(graph.add_type(a, x));
        assert!(!graph.add_type(a, x));

        assert_eq!(drain(&mut graph), vec![Delivery { consumer: ConsumerId(7), ty: x }]);
        assert_eq!(graph.type_count(a), 1);
    }

    #[test]
    fn test_connect_replays_history() {
        let mut graph = PropagationGraph::new();
        let a = graph.create_node();
        let b = graph.create_node();
        let x = graph.intern(RuntimeType::class("X"));
        let y = graph.intern(RuntimeType::class("Y"));
        graph.add_type(a, x);
        graph.add_type(a, y);

        graph.connect(a, b);

        assert!(graph.contains(b, &RuntimeType::class("X")));
        assert!(graph.contains(b, &RuntimeType::class("Y")));
    }

    #[test]
    fn test_add_consumer_replays_each_type_once() {
        let mut graph = PropagationGraph::new();
        let a = graph.create_node();
        let x = graph.intern(RuntimeType::class("X"));
        let y = graph.intern(RuntimeType::class("Y"));
        graph.add_type(a, x);
        graph.add_type(a, y);

        graph.add_consumer(a, ConsumerId(1));
        graph.add_consumer(a, ConsumerId(1));

        let deliveries = drain(&mut graph);
        assert_eq!(
            deliveries,
            vec![
                Delivery { consumer: ConsumerId(1), ty: x },
                Delivery { consumer: ConsumerId(1), ty: y },
            ]
        );
    }

    #[test]
    fn test_consumers_invoked_in_registration_order() {
        let mut graph = PropagationGraph::new();
        let a = graph.create_node();
        graph.add_consumer(a, ConsumerId(2));
        graph.add_consumer(a, ConsumerId(1));
        let x = graph.intern(RuntimeType::class("X"));
        graph.add_type(a, x);

        let order: Vec<_> = drain(&mut graph).into_iter().map(|d| d.consumer).collect();
        assert_eq!(order, vec![ConsumerId(2), ConsumerId(1)]);
    }

    #[test]
    fn test_transitive_closure_along_chain() {
        let mut graph = PropagationGraph::new();
        let a = graph.create_node();
        let b = graph.create_node();
        let c = graph.create_node();
        graph.connect(a, b);
        graph.connect(b, c);
        let x = graph.intern(RuntimeType::class("X"));
        graph.add_type(a, x);

        assert!(graph.contains(b, &RuntimeType::class("X")));
        assert!(graph.contains(c, &RuntimeType::class("X")));
    }

    #[test]
    fn test_cycles_terminate() {
        let mut graph = PropagationGraph::new();
        let a = graph.create_node();
        let b = graph.create_node();
        graph.connect(a, b);
        graph.connect(b, a);
        graph.add_consumer(b, ConsumerId(0));
        let x = graph.intern(RuntimeType::class("X"));
        graph.add_type(a, x);

        assert_eq!(drain(&mut graph).len(), 1);
        assert_eq!(graph.stats().type_additions, 2);
    }

    #[test]
    fn test_duplicate_and_self_edges_are_ignored() {
        let mut graph = PropagationGraph::new();
        let a = graph.create_node();
        let b = graph.create_node();
        graph.connect(a, b);
        graph.connect(a, b);
        graph.connect(a, a);
        assert_eq!(graph.edges(a).collect::<Vec<_>>(), vec![b]);
        assert_eq!(graph.stats().edges, 1);
    }

    fn arb_operations() -> impl Strategy<Value = Vec<(u8, u8, u8)>> {
        // (kind, x, y): kind 0 = add type y to node x, otherwise connect x -> y
        prop::collection::vec((0u8..3, 0u8..6, 0u8..6), 0..40)
    }

    proptest! {
        #[test]
        fn prop_types_never_shrink(ops in arb_operations()) {
            let mut graph = PropagationGraph::new();
            let nodes: Vec<_> = (0..6).map(|_| graph.create_node()).collect();
            let mut previous = vec![0usize; nodes.len()];

            for (kind, x, y) in ops {
                if kind == 0 {
                    let ty = graph.intern(RuntimeType::class(format!("T{y}")));
                    graph.add_type(nodes[x as usize], ty);
                } else {
                    graph.connect(nodes[x as usize], nodes[y as usize]);
                }
                for (i, &node) in nodes.iter().enumerate() {
                    let count = graph.type_count(node);
                    prop_assert!(count >= previous[i]);
                    previous[i] = count;
                }
            }
        }

        #[test]
        fn prop_edges_imply_subset(ops in arb_operations()) {
            let mut graph = PropagationGraph::new();
            let nodes: Vec<_> = (0..6).map(|_| graph.create_node()).collect();

            for (kind, x, y) in ops {
                if kind == 0 {
                    let ty = graph.intern(RuntimeType::class(format!("T{y}")));
                    graph.add_type(nodes[x as usize], ty);
                } else {
                    graph.connect(nodes[x as usize], nodes[y as usize]);
                }
            }

            for &node in &nodes {
                for target in graph.edges(node).collect::<Vec<_>>() {
                    for ty in graph.type_ids(node).collect::<Vec<_>>() {
                        prop_assert!(graph.type_ids(target).any(|t| t == ty));
                    }
                }
            }
        }

        #[test]
        fn prop_each_consumer_sees_each_type_once(ops in arb_operations()) {
            let mut graph = PropagationGraph::new();
            let nodes: Vec<_> = (0..6).map(|_| graph.create_node()).collect();
            for (i, &node) in nodes.iter().enumerate() {
                graph.add_consumer(node, ConsumerId(i as u32));
            }

            for (kind, x, y) in ops {
                if kind == 0 {
                    let ty = graph.intern(RuntimeType::class(format!("T{y}")));
                    graph.add_type(nodes[x as usize], ty);
                    graph.add_type(nodes[x as usize], ty);
                } else {
                    graph.connect(nodes[x as usize], nodes[y as usize]);
                }
            }

            let deliveries = drain(&mut graph);
            let unique: std::collections::HashSet<_> =
                deliveries.iter().map(|d| (d.consumer, d.ty)).collect();
            prop_assert_eq!(unique.len(), deliveries.len());
            for (i, &node) in nodes.iter().enumerate() {
                let seen = deliveries.iter().filter(|d| d.consumer == ConsumerId(i as u32)).count();
                prop_assert_eq!(seen, graph.type_count(node));
            }
        }
    }
}
