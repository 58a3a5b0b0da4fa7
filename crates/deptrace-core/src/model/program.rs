//! Method bodies: basic blocks of typed instructions

use super::reference::{FieldRef, MethodRef};
use super::types::{ClassName, ValueType};
use serde::{Deserialize, Serialize};

/// Index of an SSA variable within a method body.
///
/// Variable 0 holds `this`; variables `1..=n` hold the parameters.
pub type Variable = usize;

/// Index of a basic block within a method body.
pub type BlockIndex = usize;

/// How an invocation selects its target.
///
/// `Virtual` and `Interface` carry the declared receiver type; the
/// devirtualization pass rewrites them to `Special` once a single
/// implementation is proven.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Dispatch {
    Static,
    Special,
    Virtual(ClassName),
    Interface(ClassName),
}

impl Dispatch {
    pub fn is_dynamic(&self) -> bool {
        matches!(self, Dispatch::Virtual(_) | Dispatch::Interface(_))
    }

    /// Declared receiver type of a dynamic dispatch.
    pub fn receiver_type(&self) -> Option<&str> {
        match self {
            Dispatch::Virtual(owner) | Dispatch::Interface(owner) => Some(owner),
            Dispatch::Static | Dispatch::Special => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Instruction {
    Assign {
        receiver: Variable,
        assignee: Variable,
    },
    Cast {
        receiver: Variable,
        value: Variable,
        target_type: ValueType,
    },
    NullConstant {
        receiver: Variable,
    },
    StringConstant {
        receiver: Variable,
        value: String,
    },
    ClassConstant {
        receiver: Variable,
        constant: ValueType,
    },
    Construct {
        receiver: Variable,
        class: ClassName,
    },
    ConstructArray {
        receiver: Variable,
        item_type: ValueType,
        size: Variable,
    },
    /// `array_type` is the full type of the created array.
    ConstructMultiArray {
        receiver: Variable,
        array_type: ValueType,
        dimensions: Vec<Variable>,
    },
    /// `instance` is `None` for static fields.
    GetField {
        receiver: Variable,
        instance: Option<Variable>,
        field: FieldRef,
        field_type: ValueType,
    },
    PutField {
        instance: Option<Variable>,
        field: FieldRef,
        value: Variable,
        field_type: ValueType,
    },
    /// `element_type` is the declared component type of `array`.
    GetElement {
        receiver: Variable,
        array: Variable,
        element_type: ValueType,
    },
    PutElement {
        array: Variable,
        index: Variable,
        value: Variable,
        element_type: ValueType,
    },
    CloneArray {
        receiver: Variable,
        array: Variable,
    },
    Invoke {
        receiver: Option<Variable>,
        instance: Option<Variable>,
        method: MethodRef,
        arguments: Vec<Variable>,
        dispatch: Dispatch,
    },
    IsInstance {
        receiver: Variable,
        value: Variable,
        tested_type: ValueType,
    },
    InitClass {
        class: ClassName,
    },
    Phi {
        receiver: Variable,
        incomings: Vec<Variable>,
    },
    MonitorEnter {
        object: Variable,
    },
    MonitorExit {
        object: Variable,
    },
    Jump {
        target: BlockIndex,
    },
    Branch {
        condition: Variable,
        consequent: BlockIndex,
        alternative: BlockIndex,
    },
    Return {
        value: Option<Variable>,
    },
    Raise {
        exception: Variable,
    },
}

/// A protected range entry attached to a block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TryCatch {
    /// Caught class; `None` catches everything.
    #[serde(default)]
    pub exception_type: Option<ClassName>,
    pub handler: BlockIndex,
    #[serde(default)]
    pub exception_variable: Option<Variable>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BasicBlock {
    pub instructions: Vec<Instruction>,
    #[serde(default)]
    pub try_catches: Vec<TryCatch>,
}

impl BasicBlock {
    pub fn new(instructions: Vec<Instruction>) -> Self {
        Self {
            instructions,
            try_catches: Vec::new(),
        }
    }
}

/// Control-flow graph of one method body.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Program {
    pub variable_count: usize,
    pub blocks: Vec<BasicBlock>,
}

impl Program {
    pub fn new(variable_count: usize, blocks: Vec<BasicBlock>) -> Self {
        Self { variable_count, blocks }
    }

    pub fn instructions(&self) -> impl Iterator<Item = &Instruction> {
        self.blocks.iter().flat_map(|block| block.instructions.iter())
    }

    pub fn instructions_mut(&mut self) -> impl Iterator<Item = &mut Instruction> {
        self.blocks.iter_mut().flat_map(|block| block.instructions.iter_mut())
    }

    pub fn try_catches(&self) -> impl Iterator<Item = &TryCatch> {
        self.blocks.iter().flat_map(|block| block.try_catches.iter())
    }
}
