//! Instruction transfer functions
//!
//! Each instruction contributes edges between the nodes of its variables,
//! the fields and array items it touches and the methods it calls, and links
//! every class and method it references.

use super::analyzer::DependencyAnalyzer;
use super::graph::NodeId;
use super::records::MethodId;
use super::virtual_call::CallSite;
use crate::model::{
    Dispatch, FieldRef, Instruction, MethodRef, RuntimeType, TryCatch, ValueType, Variable, CLASS_CLASS, STRING_CLASS,
};

pub(crate) struct InstructionAnalyzer<'a> {
    analyzer: &'a mut DependencyAnalyzer,
    caller: MethodId,
    variables: Vec<NodeId>,
    result: NodeId,
    thrown: NodeId,
}

impl<'a> InstructionAnalyzer<'a> {
    pub(crate) fn new(analyzer: &'a mut DependencyAnalyzer, caller: MethodId) -> Self {
        let record = &analyzer.methods[caller.0];
        let variables = record.variables.clone();
        let (result, thrown) = (record.result, record.thrown);
        Self {
            analyzer,
            caller,
            variables,
            result,
            thrown,
        }
    }

    fn node(&self, variable: Variable) -> Option<NodeId> {
        self.variables.get(variable).copied()
    }

    fn flow(&mut self, from: Variable, to: Variable) {
        if let (Some(from), Some(to)) = (self.node(from), self.node(to)) {
            self.analyzer.connect(from, to);
        }
    }

    fn flow_into(&mut self, from: NodeId, to: Variable) {
        if let Some(to) = self.node(to) {
            self.analyzer.connect(from, to);
        }
    }

    fn flow_from(&mut self, from: Variable, to: NodeId) {
        if let Some(from) = self.node(from) {
            self.analyzer.connect(from, to);
        }
    }

    fn instantiate(&mut self, receiver: Variable, ty: RuntimeType) {
        if let Some(node) = self.node(receiver) {
            self.analyzer.instantiate(node, ty);
        }
    }

    fn link_type(&mut self, ty: &ValueType) {
        if let Some(class) = ty.class_name() {
            let class = class.to_string();
            self.analyzer.link_class(&class);
        }
    }

    pub(crate) fn analyze(&mut self, instruction: &Instruction) {
        match instruction {
            Instruction::Assign { receiver, assignee } => self.flow(*assignee, *receiver),
            Instruction::Cast {
                receiver,
                value,
                target_type,
            } => {
                self.link_type(target_type);
                self.flow(*value, *receiver);
            }
            Instruction::NullConstant { .. } => {}
            Instruction::StringConstant { receiver, .. } => {
                self.instantiate(*receiver, RuntimeType::class(STRING_CLASS));
            }
            Instruction::ClassConstant { receiver, constant } => {
                self.link_type(constant);
                self.instantiate(*receiver, RuntimeType::class(CLASS_CLASS));
            }
            Instruction::Construct { receiver, class } => {
                self.instantiate(*receiver, RuntimeType::class(class.clone()));
            }
            Instruction::ConstructArray {
                receiver, item_type, ..
            } => {
                if let Some(ty) = RuntimeType::from_value_type(&ValueType::array_of(item_type.clone())) {
                    self.instantiate(*receiver, ty);
                }
            }
            Instruction::ConstructMultiArray {
                receiver,
                array_type,
                dimensions,
            } => self.construct_multi_array(*receiver, array_type, dimensions.len()),
            Instruction::GetField {
                receiver,
                instance,
                field,
                ..
            } => {
                let node = self.field_node(*instance, field);
                self.flow_into(node, *receiver);
            }
            Instruction::PutField {
                instance, field, value, ..
            } => {
                let node = self.field_node(*instance, field);
                self.flow_from(*value, node);
            }
            Instruction::GetElement {
                receiver,
                element_type,
                ..
            } => {
                if element_type.is_reference() {
                    let item = self.analyzer.array_item_node(element_type);
                    self.flow_into(item, *receiver);
                }
            }
            Instruction::PutElement {
                value, element_type, ..
            } => {
                if element_type.is_reference() {
                    let item = self.analyzer.array_item_node(element_type);
                    self.flow_from(*value, item);
                }
            }
            Instruction::CloneArray { receiver, array } => self.flow(*array, *receiver),
            Instruction::Invoke {
                receiver,
                instance,
                method,
                arguments,
                dispatch,
            } => self.invoke(*receiver, *instance, method, arguments, dispatch),
            Instruction::IsInstance { tested_type, .. } => self.link_type(tested_type),
            Instruction::InitClass { class } => self.analyzer.initialize_class(class),
            Instruction::Phi { receiver, incomings } => {
                for &incoming in incomings {
                    self.flow(incoming, *receiver);
                }
            }
            Instruction::MonitorEnter { object } | Instruction::MonitorExit { object } => {
                let object = self.node(*object);
                self.analyzer.link_monitor_methods(object);
            }
            Instruction::Jump { .. } | Instruction::Branch { .. } => {}
            Instruction::Return { value } => {
                if let Some(value) = value {
                    self.flow_from(*value, self.result);
                }
            }
            Instruction::Raise { exception } => self.flow_from(*exception, self.thrown),
        }
    }

    /// Handler variables receive everything the method may throw.
    pub(crate) fn analyze_try_catch(&mut self, try_catch: &TryCatch) {
        if let Some(class) = &try_catch.exception_type {
            self.analyzer.link_class(class);
        }
        if let Some(variable) = try_catch.exception_variable {
            self.flow_into(self.thrown, variable);
        }
    }

    fn field_node(&mut self, instance: Option<Variable>, field: &FieldRef) -> NodeId {
        if instance.is_none() {
            self.analyzer.initialize_class(&field.class);
        }
        self.analyzer.link_field(field)
    }

    /// The outer array goes to the receiver; every inner dimension that the
    /// instruction allocates goes to the item node of the level above it.
    fn construct_multi_array(&mut self, receiver: Variable, array_type: &ValueType, dimensions: usize) {
        let Some(ty) = RuntimeType::from_value_type(array_type) else {
            return;
        };
        self.instantiate(receiver, ty.clone());
        for level in 1..dimensions.min(ty.degree) {
            let inner = RuntimeType {
                element: ty.element.clone(),
                degree: ty.degree - level,
            };
            let item = self.analyzer.array_item_node(&inner.to_value_type());
            self.analyzer.instantiate(item, inner);
        }
    }

    fn invoke(
        &mut self,
        receiver: Option<Variable>,
        instance: Option<Variable>,
        method: &MethodRef,
        arguments: &[Variable],
        dispatch: &Dispatch,
    ) {
        let site = CallSite {
            caller: self.caller,
            receiver: instance.and_then(|variable| self.node(variable)),
            arguments: arguments.iter().map(|&argument| self.node(argument)).collect(),
            result: receiver.and_then(|variable| self.node(variable)),
            thrown: self.thrown,
        };

        match (dispatch, instance) {
            (Dispatch::Virtual(_) | Dispatch::Interface(_), Some(instance)) => {
                let owner = dispatch.receiver_type().unwrap_or(&method.class);
                let declared = MethodRef::new(owner, method.descriptor.clone());
                self.analyzer.link_virtual_call(instance, &declared, site);
            }
            _ => {
                if matches!(dispatch, Dispatch::Static) {
                    self.analyzer.initialize_class(&method.class);
                }
                if let Some(callee) = self.analyzer.link_method(method) {
                    self.analyzer.connect_call_site(&site, callee);
                }
            }
        }
    }
}
