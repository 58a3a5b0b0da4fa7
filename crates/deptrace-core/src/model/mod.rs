//! Program model consumed by the analysis
//!
//! This is the boundary with the class/method metadata provider: classes
//! with their supertypes, fields and methods, and method bodies as basic
//! blocks of typed instructions. The analysis never mutates it; the
//! devirtualization pass rewrites caller-owned copies of method bodies.

mod class;
mod program;
mod reference;
mod types;

pub use class::{ClassHolder, ClassSet, ClassSource, FieldHolder, MethodHolder, Modifier, Modifiers};
pub use program::{BasicBlock, BlockIndex, Dispatch, Instruction, Program, TryCatch, Variable};
pub use reference::{FieldRef, MethodDescriptor, MethodRef};
pub use types::{ClassName, PrimitiveType, RuntimeType, ValueType, CLASS_CLASS, ROOT_CLASS, STRING_CLASS};
