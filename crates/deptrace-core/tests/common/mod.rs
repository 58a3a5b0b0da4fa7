//! Builders shared by the integration tests

#![allow(dead_code)]

use deptrace_core::prelude::*;
use deptrace_core::model::{Variable, ROOT_CLASS};

pub fn object_class() -> ClassHolder {
    ClassHolder::new(ROOT_CLASS)
}

pub fn class(name: &str, parent: &str) -> ClassHolder {
    ClassHolder::new(name).with_parent(parent)
}

pub fn body(variable_count: usize, instructions: Vec<Instruction>) -> Program {
    Program::new(variable_count, vec![BasicBlock::new(instructions)])
}

pub fn method(descriptor: &str, variable_count: usize, instructions: Vec<Instruction>) -> MethodHolder {
    MethodHolder::new(
        descriptor.parse().expect("valid descriptor"),
        Some(body(variable_count, instructions)),
    )
}

pub fn static_method(descriptor: &str, variable_count: usize, instructions: Vec<Instruction>) -> MethodHolder {
    method(descriptor, variable_count, instructions).with_modifier(Modifier::Static)
}

/// A `foo()V` override that does nothing.
pub fn foo_impl() -> MethodHolder {
    method("foo()V", 1, vec![ret()])
}

pub fn main_ref() -> MethodRef {
    "Main.main()V".parse().expect("valid reference")
}

pub fn main_class(variable_count: usize, instructions: Vec<Instruction>) -> ClassHolder {
    ClassHolder::new("Main")
        .with_parent(ROOT_CLASS)
        .with_method(static_method("main()V", variable_count, instructions))
}

pub fn construct(receiver: Variable, class: &str) -> Instruction {
    Instruction::Construct {
        receiver,
        class: class.to_string(),
    }
}

pub fn invoke_virtual(instance: Variable, method: &str) -> Instruction {
    let method: MethodRef = method.parse().expect("valid reference");
    Instruction::Invoke {
        receiver: None,
        instance: Some(instance),
        dispatch: Dispatch::Virtual(method.class.clone()),
        method,
        arguments: vec![],
    }
}

pub fn invoke_static(receiver: Option<Variable>, method: &str, arguments: Vec<Variable>) -> Instruction {
    Instruction::Invoke {
        receiver,
        instance: None,
        method: method.parse().expect("valid reference"),
        arguments,
        dispatch: Dispatch::Static,
    }
}

pub fn ret() -> Instruction {
    Instruction::Return { value: None }
}

/// Runs the analysis from `Main.main()V` to its fixpoint.
pub fn analyze(classes: ClassSet, config: AnalyzerConfig) -> DependencyAnalyzer {
    let mut analyzer = DependencyAnalyzer::new(classes, config);
    analyzer.add_entry_point(&main_ref()).expect("entry point resolves");
    analyzer.process_dependencies();
    assert!(analyzer.is_settled());
    analyzer
}

pub fn class_type(name: &str) -> RuntimeType {
    RuntimeType::class(name)
}
