//! The analysis session
//!
//! [`DependencyAnalyzer`] owns every piece of state of one whole-program
//! analysis: the propagation graph, the per-method/field/class records, the
//! subtype and virtual-call caches and the two work queues. Nothing here is
//! process-global, so independent sessions never interfere.
//!
//! # Driving the fixpoint
//!
//! ```
//! use deptrace_core::dependency::{AnalyzerConfig, DependencyAnalyzer};
//! use deptrace_core::model::{BasicBlock, ClassHolder, ClassSet, Instruction, MethodHolder, MethodRef, Modifier, Program};
//!
//! let main: MethodRef = "Main.main()V".parse().unwrap();
//! let body = Program::new(2, vec![BasicBlock::new(vec![
//!     Instruction::Construct { receiver: 1, class: "Main".to_string() },
//!     Instruction::Return { value: None },
//! ])]);
//! let classes = ClassSet::new().with(
//!     ClassHolder::new("Main")
//!         .with_method(MethodHolder::new(main.descriptor.clone(), Some(body)).with_modifier(Modifier::Static)),
//! );
//!
//! let mut analyzer = DependencyAnalyzer::new(classes, AnalyzerConfig::default());
//! analyzer.add_entry_point(&main).unwrap();
//! analyzer.process_dependencies();
//! assert!(analyzer.reachable_classes().any(|name| name == "Main"));
//! ```

use super::config::AnalyzerConfig;
use super::diagnostics::{Diagnostics, Problem};
use super::graph::{ConsumerId, Delivery, NodeId, PropagationGraph, PropagationStats};
use super::hierarchy::ClassHierarchy;
use super::instructions::InstructionAnalyzer;
use super::records::{CallSiteKey, ClassDependency, FieldDependency, MethodDependency, MethodId};
use super::subtype::ArrayItemKey;
use super::virtual_call::{ResolverId, ResolverKey, VirtualCallResolver};
use crate::error::{AnalysisError, Result};
use crate::model::{
    ClassName, ClassSource, FieldRef, MethodDescriptor, MethodRef, Modifier, RuntimeType, ValueType, Variable,
    ROOT_CLASS,
};
use indexmap::{IndexMap, IndexSet};
use serde::Serialize;
use std::collections::{HashMap, HashSet, VecDeque};
use tracing::{debug, info, warn};

/// A unit of graph construction postponed until the current propagation
/// wave has settled.
#[derive(Debug, Clone)]
pub(crate) enum DeferredTask {
    /// Wire a fresh subtype aggregation node to its direct supertypes.
    ConnectSupertypes { ty: ValueType, node: NodeId },
    /// Register a shared resolver on the aggregation node of its receiver.
    AttachResolver { resolver: ResolverId, receiver: ValueType },
}

pub(crate) enum ConsumerKind {
    /// The root instances node forwards each type to its exact subtype node.
    SubtypeDispatch,
    VirtualCall(ResolverId),
    Observer(Box<dyn FnMut(&RuntimeType)>),
}

enum Action {
    Subtype,
    Virtual(ResolverId),
    Observe,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct AnalysisStats {
    pub methods_processed: usize,
    pub deferred_tasks: usize,
    /// Rounds of the two-queue driver loop.
    pub waves: usize,
}

/// Counts of what an eviction discarded.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct EvictionSummary {
    pub stale_classes: usize,
    pub method_records: usize,
    pub field_records: usize,
    pub subtype_nodes: usize,
    pub virtual_call_resolvers: usize,
    pub hierarchy_entries: usize,
}

fn monitor_method(name: &str) -> MethodRef {
    MethodRef::new(
        ROOT_CLASS,
        MethodDescriptor::new(name, vec![ValueType::object(ROOT_CLASS)], ValueType::Void),
    )
}

pub struct DependencyAnalyzer {
    pub(crate) config: AnalyzerConfig,
    pub(crate) hierarchy: ClassHierarchy,
    pub(crate) graph: PropagationGraph,
    pub(crate) diagnostics: Diagnostics,
    pub(crate) instances: NodeId,
    pub(crate) classes: IndexMap<ClassName, ClassDependency>,
    pub(crate) methods: IndexMap<MethodRef, MethodDependency>,
    aliases: HashMap<MethodRef, MethodId>,
    pub(crate) fields: IndexMap<FieldRef, FieldDependency>,
    pub(crate) subtype_nodes: HashMap<ValueType, NodeId>,
    pub(crate) array_item_nodes: HashMap<ArrayItemKey, NodeId>,
    consumers: Vec<ConsumerKind>,
    pub(crate) resolvers: Vec<VirtualCallResolver>,
    pub(crate) resolver_keys: HashMap<ResolverKey, ResolverId>,
    worklist: VecDeque<MethodId>,
    deferred: VecDeque<DeferredTask>,
    entry_points: IndexMap<MethodRef, Vec<(usize, RuntimeType)>>,
    reseed: bool,
    dispatching: bool,
    generation: u32,
    stats: AnalysisStats,
}

impl std::fmt::Debug for DependencyAnalyzer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DependencyAnalyzer")
            .field("config", &self.config)
            .field("generation", &self.generation)
            .field("classes", &self.classes.len())
            .field("methods", &self.methods.len())
            .field("fields", &self.fields.len())
            .field("nodes", &self.graph.node_count())
            .finish_non_exhaustive()
    }
}

impl DependencyAnalyzer {
    pub fn new(source: impl ClassSource + 'static, config: AnalyzerConfig) -> Self {
        let mut graph = PropagationGraph::new();
        let instances = graph.create_node();
        let mut analyzer = Self {
            config,
            hierarchy: ClassHierarchy::new(Box::new(source)),
            graph,
            diagnostics: Diagnostics::new(),
            instances,
            classes: IndexMap::new(),
            methods: IndexMap::new(),
            aliases: HashMap::new(),
            fields: IndexMap::new(),
            subtype_nodes: HashMap::new(),
            array_item_nodes: HashMap::new(),
            consumers: Vec::new(),
            resolvers: Vec::new(),
            resolver_keys: HashMap::new(),
            worklist: VecDeque::new(),
            deferred: VecDeque::new(),
            entry_points: IndexMap::new(),
            reseed: false,
            dispatching: false,
            generation: 0,
            stats: AnalysisStats::default(),
        };
        analyzer.attach_subtype_dispatch();
        analyzer
    }

    fn attach_subtype_dispatch(&mut self) {
        let dispatch = self.register_consumer(ConsumerKind::SubtypeDispatch);
        self.graph.add_consumer(self.instances, dispatch);
    }

    pub fn config(&self) -> &AnalyzerConfig {
        &self.config
    }

    /// Replaces the class provider. Classes that changed must also be
    /// passed to [`evict`](Self::evict).
    pub fn set_class_source(&mut self, source: impl ClassSource + 'static) {
        self.hierarchy.set_source(Box::new(source));
    }

    // ------------------------------------------------------------------
    // Graph operations with consumer dispatch
    // ------------------------------------------------------------------

    /// The universal root: every instantiated type ends up here.
    pub fn instances_node(&self) -> NodeId {
        self.instances
    }

    pub fn create_node(&mut self) -> NodeId {
        self.graph.create_node()
    }

    pub fn add_type(&mut self, node: NodeId, ty: RuntimeType) {
        let id = self.graph.intern(ty);
        self.graph.add_type(node, id);
        self.dispatch();
    }

    pub fn connect(&mut self, from: NodeId, to: NodeId) {
        self.graph.connect(from, to);
        self.dispatch();
    }

    /// Registers a callback observing every type that reaches `node`,
    /// including the ones already there.
    pub fn add_observer(&mut self, node: NodeId, observer: impl FnMut(&RuntimeType) + 'static) {
        let consumer = self.register_consumer(ConsumerKind::Observer(Box::new(observer)));
        self.add_consumer(node, consumer);
    }

    pub(crate) fn add_consumer(&mut self, node: NodeId, consumer: ConsumerId) {
        self.graph.add_consumer(node, consumer);
        self.dispatch();
    }

    pub(crate) fn register_consumer(&mut self, kind: ConsumerKind) -> ConsumerId {
        let id = ConsumerId(self.consumers.len() as u32);
        self.consumers.push(kind);
        id
    }

    pub fn node_types(&self, node: NodeId) -> impl Iterator<Item = &RuntimeType> + '_ {
        self.graph.types(node)
    }

    pub fn node_contains(&self, node: NodeId, ty: &RuntimeType) -> bool {
        self.graph.contains(node, ty)
    }

    /// Marks `ty` as instantiated: it reaches `node` and the root.
    pub(crate) fn instantiate(&mut self, node: NodeId, ty: RuntimeType) {
        if let Some(class) = ty.element.class_name() {
            let class = class.to_string();
            self.link_class(&class);
        }
        let id = self.graph.intern(ty);
        self.graph.add_type(node, id);
        self.graph.add_type(self.instances, id);
        self.dispatch();
    }

    /// Drains pending consumer deliveries. Nested calls return at once and
    /// leave the work to the outermost loop, so consumer chains never grow
    /// the stack.
    pub(crate) fn dispatch(&mut self) {
        if self.dispatching {
            return;
        }
        self.dispatching = true;
        while let Some(delivery) = self.graph.next_delivery() {
            self.deliver(delivery);
        }
        self.dispatching = false;
    }

    fn deliver(&mut self, delivery: Delivery) {
        let index = delivery.consumer.0 as usize;
        let action = match &self.consumers[index] {
            ConsumerKind::SubtypeDispatch => Action::Subtype,
            ConsumerKind::VirtualCall(resolver) => Action::Virtual(*resolver),
            ConsumerKind::Observer(_) => Action::Observe,
        };
        match action {
            Action::Subtype => {
                let ty = self.graph.runtime_type(delivery.ty).to_value_type();
                let node = self.subtype_node(&ty);
                self.graph.add_type(node, delivery.ty);
            }
            Action::Virtual(resolver) => self.resolve_virtual_call(resolver, delivery.ty),
            Action::Observe => {
                if let ConsumerKind::Observer(observer) = &mut self.consumers[index] {
                    observer(self.graph.runtime_type(delivery.ty));
                }
            }
        }
    }

    // ------------------------------------------------------------------
    // Driver
    // ------------------------------------------------------------------

    pub(crate) fn defer(&mut self, task: DeferredTask) {
        self.deferred.push_back(task);
    }

    /// Runs the two-queue driver until neither pending methods nor deferred
    /// tasks remain.
    pub fn process_dependencies(&mut self) {
        if std::mem::take(&mut self.reseed) {
            self.seed_entry_points();
        }
        loop {
            self.stats.waves += 1;
            while let Some(method) = self.worklist.pop_front() {
                self.process_method(method);
            }
            if self.deferred.is_empty() {
                break;
            }
            let tasks: Vec<DeferredTask> = self.deferred.drain(..).collect();
            for task in tasks {
                self.stats.deferred_tasks += 1;
                self.run_deferred(task);
            }
        }
        info!(
            generation = self.generation,
            classes = self.classes.len(),
            methods = self.methods.len(),
            fields = self.fields.len(),
            nodes = self.graph.node_count(),
            "dependency analysis reached fixpoint"
        );
    }

    /// Whether results may be read: both queues and the delivery queue are
    /// empty.
    pub fn is_settled(&self) -> bool {
        !self.reseed && self.worklist.is_empty() && self.deferred.is_empty() && !self.graph.has_pending_deliveries()
    }

    pub(crate) fn ensure_settled(&self) -> Result<()> {
        if self.is_settled() {
            Ok(())
        } else {
            Err(AnalysisError::NotSettled)
        }
    }

    fn run_deferred(&mut self, task: DeferredTask) {
        match task {
            DeferredTask::ConnectSupertypes { ty, node } => self.connect_supertypes(&ty, node),
            DeferredTask::AttachResolver { resolver, receiver } => {
                let node = self.subtype_node(&receiver);
                let consumer = self.resolvers[resolver.index()].consumer;
                self.add_consumer(node, consumer);
            }
        }
    }

    fn process_method(&mut self, id: MethodId) {
        let record = &mut self.methods[id.0];
        if record.processed {
            return;
        }
        record.processed = true;
        self.stats.methods_processed += 1;

        let class = record.class.clone();
        let holder = &class.methods[record.method_index];
        let synchronized = holder.has_modifier(Modifier::Synchronized);
        debug!(method = %record.reference, "processing method");

        if let Some(program) = &holder.program {
            let variables: Vec<NodeId> = (0..program.variable_count).map(|_| self.graph.create_node()).collect();
            let record = &mut self.methods[id.0];
            record.variables = variables.clone();
            let parameters = record.parameters.clone();
            for (&parameter, &variable) in parameters.iter().zip(variables.iter()) {
                self.graph.connect(parameter, variable);
            }
            self.dispatch();

            let mut analyzer = InstructionAnalyzer::new(self, id);
            for block in &program.blocks {
                for instruction in &block.instructions {
                    analyzer.analyze(instruction);
                }
                for try_catch in &block.try_catches {
                    analyzer.analyze_try_catch(try_catch);
                }
            }
        }

        if synchronized {
            self.link_monitor_methods(None);
        }
    }

    /// Links the runtime's monitor support, connecting `object` to the
    /// monitor parameter when given.
    pub(crate) fn link_monitor_methods(&mut self, object: Option<NodeId>) {
        let mut names = Vec::with_capacity(4);
        if self.config.async_supported {
            names.push("monitorEnter");
        }
        names.push("monitorEnterSync");
        if self.config.async_supported {
            names.push("monitorExit");
        }
        names.push("monitorExitSync");

        for name in names {
            let Some(id) = self.link_method(&monitor_method(name)) else {
                continue;
            };
            if let (Some(object), Some(parameter)) = (object, self.methods[id.0].parameter(1)) {
                self.connect(object, parameter);
            }
        }
    }

    // ------------------------------------------------------------------
    // Linking
    // ------------------------------------------------------------------

    /// Marks `name` and its supertypes reachable. Returns `false` when the
    /// class does not exist.
    pub fn link_class(&mut self, name: &str) -> bool {
        if let Some(existing) = self.classes.get(name) {
            return !existing.missing;
        }
        let mut pending = vec![name.to_string()];
        while let Some(name) = pending.pop() {
            if self.classes.contains_key(&name) {
                continue;
            }
            let class = self.hierarchy.get(&name);
            if class.is_none() {
                self.diagnostics.report(Problem::ClassNotFound(name.clone()));
            } else {
                debug!(class = %name, "linked class");
            }
            self.classes.insert(
                name.clone(),
                ClassDependency {
                    name: name.clone(),
                    missing: class.is_none(),
                    initialized: false,
                },
            );
            if let Some(class) = class {
                pending.extend(class.supertypes().map(str::to_string));
            }
        }
        self.classes.get(name).is_some_and(|class| !class.missing)
    }

    /// Initialises `name` and its superclasses, linking each `<clinit>`.
    pub(crate) fn initialize_class(&mut self, name: &str) {
        let mut current = Some(name.to_string());
        while let Some(name) = current.take() {
            if !self.link_class(&name) {
                return;
            }
            match self.classes.get_mut(&name) {
                Some(record) if !record.initialized => record.initialized = true,
                _ => return,
            }
            let Some(class) = self.hierarchy.get(&name) else {
                return;
            };
            let initializer = MethodDescriptor::class_initializer();
            if self.config.link_class_initializers && class.method(&initializer).is_some() {
                self.link_method(&MethodRef::new(name.clone(), initializer));
            }
            current = class.parent.clone();
        }
    }

    /// Links the declaration `method` resolves to and schedules its body.
    pub fn link_method(&mut self, method: &MethodRef) -> Option<MethodId> {
        if let Some(id) = self.method_id(method) {
            return Some(id);
        }
        let Some(resolved) = self.hierarchy.resolve_method(method) else {
            if self.link_class(&method.class) {
                self.diagnostics.report(Problem::MethodNotFound(method.clone()));
            }
            return None;
        };
        if let Some(index) = self.methods.get_index_of(&resolved) {
            self.aliases.insert(method.clone(), MethodId(index));
            return Some(MethodId(index));
        }
        let class = self.hierarchy.get(&resolved.class)?;
        let method_index = class.methods.iter().position(|m| m.descriptor == resolved.descriptor)?;
        self.link_class(&resolved.class);

        let parameters = (0..=resolved.descriptor.parameter_count())
            .map(|_| self.graph.create_node())
            .collect();
        let result = self.graph.create_node();
        let thrown = self.graph.create_node();
        debug!(method = %resolved, "linked method");

        let (index, _) = self.methods.insert_full(
            resolved.clone(),
            MethodDependency {
                reference: resolved.clone(),
                class,
                method_index,
                parameters,
                result,
                thrown,
                variables: Vec::new(),
                processed: false,
                call_sites: IndexMap::new(),
            },
        );
        let id = MethodId(index);
        if &resolved != method {
            self.aliases.insert(method.clone(), id);
        }
        self.worklist.push_back(id);
        Some(id)
    }

    /// Node of the field `field` resolves to; the root when it does not
    /// resolve.
    pub fn link_field(&mut self, field: &FieldRef) -> NodeId {
        if let Some(record) = self.fields.get(field) {
            return record.node;
        }
        let Some(resolved) = self.hierarchy.resolve_field(field) else {
            if self.link_class(&field.class) {
                self.diagnostics.report(Problem::FieldNotFound(field.clone()));
            }
            return self.instances;
        };
        if let Some(record) = self.fields.get(&resolved) {
            let node = record.node;
            self.fields.insert(
                field.clone(),
                FieldDependency {
                    reference: resolved,
                    node,
                },
            );
            return node;
        }
        self.link_class(&resolved.class);
        let node = self.graph.create_node();
        debug!(field = %resolved, "linked field");
        for key in [resolved.clone(), field.clone()] {
            self.fields.insert(
                key,
                FieldDependency {
                    reference: resolved.clone(),
                    node,
                },
            );
        }
        node
    }

    // ------------------------------------------------------------------
    // Entry points
    // ------------------------------------------------------------------

    /// Links `method` as a root of reachability.
    pub fn add_entry_point(&mut self, method: &MethodRef) -> Result<MethodId> {
        let id = self
            .link_method(method)
            .ok_or_else(|| AnalysisError::EntryPointNotFound(method.clone()))?;
        if self.methods[id.0].holder().is_static() {
            let class = self.methods[id.0].reference.class.clone();
            self.initialize_class(&class);
        }
        self.entry_points.entry(method.clone()).or_default();
        info!(method = %method, "added entry point");
        Ok(id)
    }

    /// Instantiates `ty` into parameter slot `index` of an entry point
    /// (slot 0 is the receiver).
    pub fn propagate_parameter(&mut self, method: &MethodRef, index: usize, ty: RuntimeType) -> Result<()> {
        let id = self
            .method_id(method)
            .ok_or_else(|| AnalysisError::UnknownMethod(method.clone()))?;
        let node = self.methods[id.0]
            .parameter(index)
            .ok_or_else(|| AnalysisError::InvalidParameter {
                method: method.clone(),
                index,
            })?;
        self.instantiate(node, ty.clone());
        let seeds = self.entry_points.entry(method.clone()).or_default();
        if !seeds.contains(&(index, ty.clone())) {
            seeds.push((index, ty));
        }
        Ok(())
    }

    /// Re-adds every entry point after a restart. One that no longer
    /// resolves is reported and kept, seeds included, for the next
    /// generation.
    fn seed_entry_points(&mut self) {
        let entries = std::mem::take(&mut self.entry_points);
        for (method, seeds) in entries {
            if let Err(err) = self.add_entry_point(&method) {
                warn!("{}; retrying after the next eviction", err);
                self.diagnostics.report(Problem::EntryPointNotFound(method.clone()));
                self.entry_points.insert(method, seeds);
                continue;
            }
            for (index, ty) in seeds {
                if let Err(err) = self.propagate_parameter(&method, index, ty.clone()) {
                    warn!("{}", err);
                    let kept = self.entry_points.entry(method.clone()).or_default();
                    if !kept.contains(&(index, ty.clone())) {
                        kept.push((index, ty));
                    }
                }
            }
        }
    }

    /// Entry points that did not resolve in the current generation.
    pub fn unresolved_entry_points(&self) -> impl Iterator<Item = &MethodRef> {
        self.entry_points.keys().filter(|method| self.method_id(method).is_none())
    }

    // ------------------------------------------------------------------
    // Eviction
    // ------------------------------------------------------------------

    /// Forgets everything derived from the classes in `stale` and restarts
    /// propagation from the entry points on the next
    /// [`process_dependencies`](Self::process_dependencies).
    ///
    /// The class-hierarchy cache keeps answers that never looked at a stale
    /// class. Graph state cannot be partially retracted, since types that
    /// flowed through evicted nodes may have reached any other node, so the
    /// whole generation of nodes, records, caches and queues is discarded.
    ///
    /// [`NodeId`]s and [`MethodId`]s are only meaningful within the
    /// generation that produced them. Look them up again after evicting;
    /// node queries answer stale handles that fall outside the new arena as
    /// if the node were empty.
    pub fn evict<I, S>(&mut self, stale: I) -> EvictionSummary
    where
        I: IntoIterator<Item = S>,
        S: Into<ClassName>,
    {
        let stale: HashSet<ClassName> = stale.into_iter().map(Into::into).collect();
        let is_stale = |name: &str| stale.contains(name);

        let summary = EvictionSummary {
            stale_classes: stale.len(),
            method_records: self.methods.keys().filter(|m| is_stale(&m.class)).count(),
            field_records: self.fields.keys().filter(|f| is_stale(&f.class)).count(),
            subtype_nodes: self
                .subtype_nodes
                .keys()
                .filter(|ty| ty.class_name().is_some_and(is_stale))
                .count(),
            virtual_call_resolvers: self
                .resolvers
                .iter()
                .filter(|resolver| resolver.touches(&is_stale))
                .count(),
            hierarchy_entries: self.hierarchy.evict(&stale),
        };

        self.restart_generation();
        info!(generation = self.generation, ?summary, "evicted stale classes");
        summary
    }

    fn restart_generation(&mut self) {
        self.graph = PropagationGraph::new();
        self.instances = self.graph.create_node();
        self.diagnostics.clear();
        self.classes.clear();
        self.methods.clear();
        self.aliases.clear();
        self.fields.clear();
        self.subtype_nodes.clear();
        self.array_item_nodes.clear();
        self.consumers.clear();
        self.resolvers.clear();
        self.resolver_keys.clear();
        self.worklist.clear();
        self.deferred.clear();
        self.dispatching = false;
        self.stats = AnalysisStats::default();
        self.generation += 1;
        self.attach_subtype_dispatch();
        self.reseed = true;
    }

    pub fn generation(&self) -> u32 {
        self.generation
    }

    // ------------------------------------------------------------------
    // Results
    // ------------------------------------------------------------------

    pub fn method_id(&self, method: &MethodRef) -> Option<MethodId> {
        self.methods
            .get_index_of(method)
            .map(MethodId)
            .or_else(|| self.aliases.get(method).copied())
    }

    pub fn method(&self, method: &MethodRef) -> Option<&MethodDependency> {
        self.method_id(method).map(|id| &self.methods[id.0])
    }

    pub fn method_by_id(&self, id: MethodId) -> &MethodDependency {
        &self.methods[id.0]
    }

    pub fn methods(&self) -> impl Iterator<Item = &MethodDependency> {
        self.methods.values()
    }

    pub fn reachable_methods(&self) -> impl Iterator<Item = &MethodRef> {
        self.methods.keys()
    }

    pub fn reachable_classes(&self) -> impl Iterator<Item = &str> {
        self.classes
            .values()
            .filter(|class| !class.missing)
            .map(|class| class.name.as_str())
    }

    pub fn class(&self, name: &str) -> Option<&ClassDependency> {
        self.classes.get(name)
    }

    /// Resolved fields; aliases through subclasses are reported once.
    pub fn reachable_fields(&self) -> impl Iterator<Item = &FieldRef> {
        self.fields
            .iter()
            .filter(|(key, record)| *key == &record.reference)
            .map(|(key, _)| key)
    }

    pub fn field_node(&self, field: &FieldRef) -> Option<NodeId> {
        self.fields.get(field).map(|record| record.node)
    }

    /// Types observed at a variable of a processed method.
    pub fn variable_types(&self, method: &MethodRef, variable: Variable) -> Vec<&RuntimeType> {
        self.method(method)
            .and_then(|record| record.variable(variable))
            .map(|node| self.graph.types(node).collect())
            .unwrap_or_default()
    }

    /// Implementations resolved for the dynamic call on `receiver` with
    /// `descriptor` inside `method`. Empty when the site was never reached.
    pub fn call_site_targets(&self, method: &MethodRef, receiver: Variable, descriptor: &MethodDescriptor) -> IndexSet<MethodRef> {
        let Some(record) = self.method(method) else {
            return IndexSet::new();
        };
        let key = CallSiteKey {
            receiver,
            descriptor: descriptor.clone(),
        };
        record
            .resolvers_for(&key)
            .iter()
            .flat_map(|id| self.resolvers[id.index()].targets.iter().cloned())
            .collect()
    }

    pub fn diagnostics(&self) -> &Diagnostics {
        &self.diagnostics
    }

    pub fn stats(&self) -> AnalysisStats {
        self.stats
    }

    pub fn propagation_stats(&self) -> PropagationStats {
        self.graph.stats()
    }

    pub fn graph(&self) -> &PropagationGraph {
        &self.graph
    }
}
