//! Method and field references

use super::types::{parse_prefix, ClassName, ValueType};
use crate::error::ModelError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Name plus signature of a method, independent of its owner class.
///
/// Textual form: `name(params)ret`, e.g. `foo(ILjava/lang/Object;)V`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct MethodDescriptor {
    pub name: String,
    pub params: Vec<ValueType>,
    pub result: ValueType,
}

impl MethodDescriptor {
    pub fn new(name: impl Into<String>, params: Vec<ValueType>, result: ValueType) -> Self {
        Self {
            name: name.into(),
            params,
            result,
        }
    }

    pub fn parameter_count(&self) -> usize {
        self.params.len()
    }

    pub fn is_constructor(&self) -> bool {
        self.name == "<init>"
    }

    pub fn class_initializer() -> Self {
        Self::new("<clinit>", Vec::new(), ValueType::Void)
    }
}

impl FromStr for MethodDescriptor {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || ModelError::InvalidMethodDescriptor(s.to_string());
        let open = s.find('(').ok_or_else(invalid)?;
        let name = &s[..open];
        if name.is_empty() {
            return Err(invalid());
        }

        let mut rest = &s[open + 1..];
        let mut params = Vec::new();
        loop {
            if let Some(after) = rest.strip_prefix(')') {
                rest = after;
                break;
            }
            let (param, after) = parse_prefix(rest).ok_or_else(invalid)?;
            if param == ValueType::Void {
                return Err(invalid());
            }
            params.push(param);
            rest = after;
        }

        let result = ValueType::parse(rest).map_err(|_| invalid())?;
        Ok(Self::new(name, params, result))
    }
}

impl fmt::Display for MethodDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}(", self.name)?;
        for param in &self.params {
            write!(f, "{param}")?;
        }
        write!(f, "){}", self.result)
    }
}

impl TryFrom<String> for MethodDescriptor {
    type Error = ModelError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<MethodDescriptor> for String {
    fn from(value: MethodDescriptor) -> Self {
        value.to_string()
    }
}

/// A method named by owner class and descriptor: `pkg.Class.name(..)R`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct MethodRef {
    pub class: ClassName,
    pub descriptor: MethodDescriptor,
}

impl MethodRef {
    pub fn new(class: impl Into<ClassName>, descriptor: MethodDescriptor) -> Self {
        Self {
            class: class.into(),
            descriptor,
        }
    }

    pub fn name(&self) -> &str {
        &self.descriptor.name
    }
}

impl FromStr for MethodRef {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || ModelError::InvalidMethodReference(s.to_string());
        let open = s.find('(').ok_or_else(invalid)?;
        let dot = s[..open].rfind('.').ok_or_else(invalid)?;
        let class = &s[..dot];
        if class.is_empty() {
            return Err(invalid());
        }
        let descriptor = s[dot + 1..].parse().map_err(|_| invalid())?;
        Ok(Self::new(class, descriptor))
    }
}

impl fmt::Display for MethodRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.class, self.descriptor)
    }
}

impl TryFrom<String> for MethodRef {
    type Error = ModelError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<MethodRef> for String {
    fn from(value: MethodRef) -> Self {
        value.to_string()
    }
}

/// A field named by owner class and field name: `pkg.Class.field`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct FieldRef {
    pub class: ClassName,
    pub name: String,
}

impl FieldRef {
    pub fn new(class: impl Into<ClassName>, name: impl Into<String>) -> Self {
        Self {
            class: class.into(),
            name: name.into(),
        }
    }
}

impl FromStr for FieldRef {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.rsplit_once('.') {
            Some((class, name)) if !class.is_empty() && !name.is_empty() => Ok(Self::new(class, name)),
            _ => Err(ModelError::InvalidFieldReference(s.to_string())),
        }
    }
}

impl fmt::Display for FieldRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.class, self.name)
    }
}

impl TryFrom<String> for FieldRef {
    type Error = ModelError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<FieldRef> for String {
    fn from(value: FieldRef) -> Self {
        value.to_string()
    }
}
