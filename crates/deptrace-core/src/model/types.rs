//! Declared and runtime types

use crate::error::ModelError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Fully qualified class name, dotted (`java.lang.Object`).
pub type ClassName = String;

/// The universal root of the class hierarchy.
pub const ROOT_CLASS: &str = "java.lang.Object";
pub const STRING_CLASS: &str = "java.lang.String";
pub const CLASS_CLASS: &str = "java.lang.Class";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PrimitiveType {
    Boolean,
    Byte,
    Short,
    Char,
    Int,
    Long,
    Float,
    Double,
}

impl PrimitiveType {
    pub fn descriptor_char(self) -> char {
        match self {
            PrimitiveType::Boolean => 'Z',
            PrimitiveType::Byte => 'B',
            PrimitiveType::Short => 'S',
            PrimitiveType::Char => 'C',
            PrimitiveType::Int => 'I',
            PrimitiveType::Long => 'J',
            PrimitiveType::Float => 'F',
            PrimitiveType::Double => 'D',
        }
    }

    fn from_descriptor_char(c: char) -> Option<Self> {
        Some(match c {
            'Z' => PrimitiveType::Boolean,
            'B' => PrimitiveType::Byte,
            'S' => PrimitiveType::Short,
            'C' => PrimitiveType::Char,
            'I' => PrimitiveType::Int,
            'J' => PrimitiveType::Long,
            'F' => PrimitiveType::Float,
            'D' => PrimitiveType::Double,
            _ => return None,
        })
    }

    pub fn keyword(self) -> &'static str {
        match self {
            PrimitiveType::Boolean => "boolean",
            PrimitiveType::Byte => "byte",
            PrimitiveType::Short => "short",
            PrimitiveType::Char => "char",
            PrimitiveType::Int => "int",
            PrimitiveType::Long => "long",
            PrimitiveType::Float => "float",
            PrimitiveType::Double => "double",
        }
    }
}

/// A declared type, as it appears in descriptors and instructions.
///
/// Serialized in JVM descriptor syntax (`I`, `Ljava/lang/String;`, `[[I`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum ValueType {
    Void,
    Primitive(PrimitiveType),
    Object(ClassName),
    Array(Box<ValueType>),
}

impl ValueType {
    pub fn object(name: impl Into<ClassName>) -> Self {
        ValueType::Object(name.into())
    }

    pub fn array_of(item: ValueType) -> Self {
        ValueType::Array(Box::new(item))
    }

    /// Wraps `self` in `degree` array dimensions.
    pub fn with_degree(self, degree: usize) -> Self {
        (0..degree).fold(self, |ty, _| ValueType::array_of(ty))
    }

    /// Splits off every array dimension, returning the degree and the
    /// innermost non-array type.
    pub fn strip_arrays(&self) -> (usize, &ValueType) {
        let mut degree = 0;
        let mut ty = self;
        while let ValueType::Array(item) = ty {
            degree += 1;
            ty = item;
        }
        (degree, ty)
    }

    pub fn is_object(&self, name: &str) -> bool {
        matches!(self, ValueType::Object(n) if n == name)
    }

    /// Whether values of this type are references that the analysis tracks.
    pub fn is_reference(&self) -> bool {
        matches!(self, ValueType::Object(_) | ValueType::Array(_))
    }

    /// Class that has to be linked for this type to be usable, if any.
    pub fn class_name(&self) -> Option<&str> {
        match self.strip_arrays().1 {
            ValueType::Object(name) => Some(name),
            _ => None,
        }
    }

    pub fn parse(descriptor: &str) -> Result<Self, ModelError> {
        let (ty, rest) = parse_prefix(descriptor)
            .ok_or_else(|| ModelError::InvalidTypeDescriptor(descriptor.to_string()))?;
        if !rest.is_empty() {
            return Err(ModelError::InvalidTypeDescriptor(descriptor.to_string()));
        }
        Ok(ty)
    }
}

/// Parses one type from the front of `s`, returning it with the remainder.
pub(crate) fn parse_prefix(s: &str) -> Option<(ValueType, &str)> {
    let mut chars = s.chars();
    let first = chars.next()?;
    match first {
        'V' => Some((ValueType::Void, &s[1..])),
        '[' => {
            let (item, rest) = parse_prefix(&s[1..])?;
            if item == ValueType::Void {
                return None;
            }
            Some((ValueType::array_of(item), rest))
        }
        'L' => {
            let end = s.find(';')?;
            let name = &s[1..end];
            if name.is_empty() {
                return None;
            }
            Some((ValueType::Object(name.replace('/', ".")), &s[end + 1..]))
        }
        c => PrimitiveType::from_descriptor_char(c).map(|p| (ValueType::Primitive(p), &s[1..])),
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValueType::Void => f.write_str("V"),
            ValueType::Primitive(p) => write!(f, "{}", p.descriptor_char()),
            ValueType::Object(name) => write!(f, "L{};", name.replace('.', "/")),
            ValueType::Array(item) => write!(f, "[{item}"),
        }
    }
}

impl TryFrom<String> for ValueType {
    type Error = ModelError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        ValueType::parse(&value)
    }
}

impl From<ValueType> for String {
    fn from(value: ValueType) -> Self {
        value.to_string()
    }
}

/// A concrete runtime type observed by the propagation graph.
///
/// `element` is never an array and never `Void`; arrays are expressed
/// through `degree`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RuntimeType {
    pub element: ValueType,
    pub degree: usize,
}

impl RuntimeType {
    pub fn class(name: impl Into<ClassName>) -> Self {
        Self {
            element: ValueType::Object(name.into()),
            degree: 0,
        }
    }

    /// Runtime type of a value whose exact declared type is `ty`.
    ///
    /// Returns `None` for `void` and bare primitives, which never flow
    /// through the graph.
    pub fn from_value_type(ty: &ValueType) -> Option<Self> {
        let (degree, element) = ty.strip_arrays();
        match element {
            ValueType::Void => None,
            ValueType::Primitive(_) if degree == 0 => None,
            _ => Some(Self {
                element: element.clone(),
                degree,
            }),
        }
    }

    pub fn to_value_type(&self) -> ValueType {
        self.element.clone().with_degree(self.degree)
    }

    pub fn is_array(&self) -> bool {
        self.degree > 0
    }

    /// Class whose method table is consulted when dispatching on this type.
    pub fn dispatch_class(&self) -> Option<&str> {
        if self.is_array() {
            return Some(ROOT_CLASS);
        }
        match &self.element {
            ValueType::Object(name) => Some(name),
            _ => None,
        }
    }
}

impl fmt::Display for RuntimeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.element {
            ValueType::Object(name) => f.write_str(name)?,
            ValueType::Primitive(p) => f.write_str(p.keyword())?,
            other => write!(f, "{other}")?,
        }
        for _ in 0..self.degree {
            f.write_str("[]")?;
        }
        Ok(())
    }
}
