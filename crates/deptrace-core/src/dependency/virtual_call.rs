//! Lazy resolution of virtual and interface call sites
//!
//! A call site is never resolved when its instruction is processed. A
//! resolver is registered as a consumer instead, and every concrete type it
//! is later shown produces at most one new target. In fast mode one resolver
//! per declared callee listens on the aggregated subtype node of the
//! declaring class, shared by all of its call sites. In precise mode every
//! call site gets its own resolver on the receiver variable's node.

use super::analyzer::{ConsumerKind, DeferredTask, DependencyAnalyzer};
use super::config::AnalysisMode;
use super::graph::{ConsumerId, NodeId, TypeId};
use super::records::{CallSiteKey, MethodId};
use crate::model::{ClassName, MethodRef, ValueType, Variable};
use indexmap::IndexSet;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ResolverId(usize);

impl ResolverId {
    pub fn index(self) -> usize {
        self.0
    }
}

/// The value nodes of one invocation in its caller.
#[derive(Debug, Clone)]
pub(crate) struct CallSite {
    pub(crate) caller: MethodId,
    pub(crate) receiver: Option<NodeId>,
    /// Positional; `None` for an argument variable the body does not define.
    pub(crate) arguments: Vec<Option<NodeId>>,
    pub(crate) result: Option<NodeId>,
    pub(crate) thrown: NodeId,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub(crate) enum ResolverKey {
    Shared(MethodRef),
    CallSite {
        caller: MethodId,
        receiver: Variable,
        method: MethodRef,
    },
}

#[derive(Debug)]
pub struct VirtualCallResolver {
    pub(crate) declared: MethodRef,
    /// Types not assignable to this class are ignored.
    pub(crate) filter: Option<ClassName>,
    pub(crate) consumer: ConsumerId,
    pub(crate) targets: IndexSet<MethodRef>,
    pub(crate) sites: Vec<CallSite>,
}

impl VirtualCallResolver {
    pub fn declared(&self) -> &MethodRef {
        &self.declared
    }

    /// Implementations resolved so far, in discovery order.
    pub fn targets(&self) -> &IndexSet<MethodRef> {
        &self.targets
    }

    pub(crate) fn touches(&self, is_stale: &impl Fn(&str) -> bool) -> bool {
        is_stale(&self.declared.class) || self.targets.iter().any(|target| is_stale(&target.class))
    }
}

impl DependencyAnalyzer {
    /// Registers a dynamic invocation of `method` on `receiver` within
    /// `site.caller`. The class of `method` is the declared receiver type:
    /// the resolver listens on its subtypes (fast) or filters by it
    /// (precise).
    pub(crate) fn link_virtual_call(&mut self, receiver: Variable, method: &MethodRef, site: CallSite) {
        let caller = site.caller;
        let key = match self.config.mode {
            AnalysisMode::Fast => ResolverKey::Shared(method.clone()),
            AnalysisMode::Precise => ResolverKey::CallSite {
                caller,
                receiver,
                method: method.clone(),
            },
        };

        let id = match self.resolver_keys.get(&key) {
            Some(&id) => id,
            None => self.create_resolver(key, method, site.receiver),
        };

        let call_site = CallSiteKey {
            receiver,
            descriptor: method.descriptor.clone(),
        };
        let resolvers = self.methods[caller.0].call_sites.entry(call_site).or_default();
        if !resolvers.contains(&id) {
            resolvers.push(id);
        }

        let resolver = &mut self.resolvers[id.index()];
        resolver.sites.push(site.clone());
        let targets: Vec<MethodRef> = resolver.targets.iter().cloned().collect();
        for target in targets {
            if let Some(callee) = self.method_id(&target) {
                self.connect_call_site(&site, callee);
            }
        }
    }

    fn create_resolver(&mut self, key: ResolverKey, method: &MethodRef, receiver: Option<NodeId>) -> ResolverId {
        let id = ResolverId(self.resolvers.len());
        let consumer = self.register_consumer(ConsumerKind::VirtualCall(id));
        let filter = match key {
            ResolverKey::Shared(_) => None,
            ResolverKey::CallSite { .. } => Some(method.class.clone()),
        };
        let shared = filter.is_none();
        self.resolvers.push(VirtualCallResolver {
            declared: method.clone(),
            filter,
            consumer,
            targets: IndexSet::new(),
            sites: Vec::new(),
        });
        self.resolver_keys.insert(key, id);
        debug!(method = %method, shared, "created virtual call resolver");

        if shared {
            self.defer(DeferredTask::AttachResolver {
                resolver: id,
                receiver: ValueType::object(method.class.clone()),
            });
        } else if let Some(node) = receiver {
            self.add_consumer(node, consumer);
        }
        id
    }

    /// Consumer body: resolves the implementation a receiver of type `ty`
    /// runs and wires it into every site sharing the resolver.
    pub(crate) fn resolve_virtual_call(&mut self, id: ResolverId, ty: TypeId) {
        let runtime = self.graph.runtime_type(ty).clone();
        let resolver = &self.resolvers[id.index()];
        let descriptor = resolver.declared.descriptor.clone();
        if let Some(filter) = resolver.filter.clone() {
            if !self.hierarchy.is_assignable(&runtime, &filter) {
                return;
            }
        }
        let Some(class) = runtime.dispatch_class().map(str::to_string) else {
            return;
        };
        let Some(target) = self.hierarchy.resolve_implementation(&class, &descriptor) else {
            return;
        };
        if !self.resolvers[id.index()].targets.insert(target.clone()) {
            return;
        }
        debug!(receiver = %runtime, target = %target, "resolved virtual call");

        let Some(callee) = self.link_method(&target) else {
            return;
        };
        let sites = self.resolvers[id.index()].sites.clone();
        for site in &sites {
            self.connect_call_site(site, callee);
        }
    }

    /// Connects the caller's value nodes of `site` to `callee`'s parameter,
    /// result and thrown nodes.
    pub(crate) fn connect_call_site(&mut self, site: &CallSite, callee: MethodId) {
        let record = &self.methods[callee.0];
        let is_static = record.holder().is_static();
        let parameters = record.parameters.clone();
        let (result, thrown) = (record.result, record.thrown);

        if let (Some(receiver), false) = (site.receiver, is_static) {
            self.graph.connect(receiver, parameters[0]);
        }
        for (argument, &parameter) in site.arguments.iter().zip(parameters.iter().skip(1)) {
            if let Some(argument) = *argument {
                self.graph.connect(argument, parameter);
            }
        }
        if let Some(target) = site.result {
            self.graph.connect(result, target);
        }
        self.graph.connect(thrown, site.thrown);
        self.dispatch();
    }
}
