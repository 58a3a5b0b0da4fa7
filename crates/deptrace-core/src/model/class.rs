//! Class metadata and the read-only class provider

use super::program::Program;
use super::reference::MethodDescriptor;
use super::types::{ClassName, ValueType};
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Modifier {
    Abstract,
    Static,
    Final,
    Native,
    Synchronized,
    Interface,
}

pub type Modifiers = SmallVec<[Modifier; 2]>;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldHolder {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: ValueType,
    #[serde(default)]
    pub modifiers: Modifiers,
}

impl FieldHolder {
    pub fn is_static(&self) -> bool {
        self.modifiers.contains(&Modifier::Static)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MethodHolder {
    pub descriptor: MethodDescriptor,
    #[serde(default)]
    pub modifiers: Modifiers,
    /// `None` for native and abstract methods.
    #[serde(default)]
    pub program: Option<Program>,
}

impl MethodHolder {
    pub fn new(descriptor: MethodDescriptor, program: Option<Program>) -> Self {
        Self {
            descriptor,
            modifiers: Modifiers::new(),
            program,
        }
    }

    pub fn with_modifier(mut self, modifier: Modifier) -> Self {
        if !self.modifiers.contains(&modifier) {
            self.modifiers.push(modifier);
        }
        self
    }

    pub fn has_modifier(&self, modifier: Modifier) -> bool {
        self.modifiers.contains(&modifier)
    }

    pub fn is_static(&self) -> bool {
        self.has_modifier(Modifier::Static)
    }

    pub fn is_abstract(&self) -> bool {
        self.has_modifier(Modifier::Abstract)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassHolder {
    pub name: ClassName,
    #[serde(default)]
    pub parent: Option<ClassName>,
    #[serde(default)]
    pub interfaces: Vec<ClassName>,
    #[serde(default)]
    pub modifiers: Modifiers,
    #[serde(default)]
    pub fields: Vec<FieldHolder>,
    #[serde(default)]
    pub methods: Vec<MethodHolder>,
}

impl ClassHolder {
    pub fn new(name: impl Into<ClassName>) -> Self {
        Self {
            name: name.into(),
            parent: None,
            interfaces: Vec::new(),
            modifiers: Modifiers::new(),
            fields: Vec::new(),
            methods: Vec::new(),
        }
    }

    pub fn with_parent(mut self, parent: impl Into<ClassName>) -> Self {
        self.parent = Some(parent.into());
        self
    }

    pub fn with_interface(mut self, interface: impl Into<ClassName>) -> Self {
        self.interfaces.push(interface.into());
        self
    }

    pub fn with_modifier(mut self, modifier: Modifier) -> Self {
        if !self.modifiers.contains(&modifier) {
            self.modifiers.push(modifier);
        }
        self
    }

    pub fn with_field(mut self, field: FieldHolder) -> Self {
        self.fields.push(field);
        self
    }

    pub fn with_method(mut self, method: MethodHolder) -> Self {
        self.methods.push(method);
        self
    }

    pub fn method(&self, descriptor: &MethodDescriptor) -> Option<&MethodHolder> {
        self.methods.iter().find(|m| &m.descriptor == descriptor)
    }

    pub fn field(&self, name: &str) -> Option<&FieldHolder> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Direct supertypes: the superclass first, then interfaces in
    /// declaration order.
    pub fn supertypes(&self) -> impl Iterator<Item = &str> {
        self.parent
            .iter()
            .chain(self.interfaces.iter())
            .map(String::as_str)
    }
}

/// Read-only source of class metadata for the closed world.
pub trait ClassSource {
    fn get(&self, name: &str) -> Option<Arc<ClassHolder>>;
}

/// In-memory class provider.
#[derive(Debug, Clone, Default)]
pub struct ClassSet {
    classes: HashMap<ClassName, Arc<ClassHolder>>,
}

#[derive(Debug, Deserialize, Serialize)]
struct ClassSetFile {
    classes: Vec<ClassHolder>,
}

impl ClassSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, class: ClassHolder) -> Option<Arc<ClassHolder>> {
        self.classes.insert(class.name.clone(), Arc::new(class))
    }

    pub fn with(mut self, class: ClassHolder) -> Self {
        self.add(class);
        self
    }

    pub fn remove(&mut self, name: &str) -> Option<Arc<ClassHolder>> {
        self.classes.remove(name)
    }

    pub fn len(&self) -> usize {
        self.classes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.classes.keys().map(String::as_str)
    }

    /// Names of classes that differ between `self` and `newer`: changed,
    /// added or removed.
    pub fn changed_classes(&self, newer: &ClassSet) -> Vec<ClassName> {
        let mut changed: Vec<ClassName> = self
            .classes
            .iter()
            .filter(|(name, class)| newer.classes.get(*name).map_or(true, |other| other != *class))
            .map(|(name, _)| name.clone())
            .collect();
        changed.extend(
            newer
                .classes
                .keys()
                .filter(|name| !self.classes.contains_key(*name))
                .cloned(),
        );
        changed.sort();
        changed
    }

    /// Parses `{"classes": [...]}`.
    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        let file: ClassSetFile = serde_json::from_str(json)?;
        Ok(file.classes.into_iter().fold(ClassSet::new(), ClassSet::with))
    }

    pub fn from_file(path: &Path) -> std::io::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content).map_err(std::io::Error::from)
    }
}

impl ClassSource for ClassSet {
    fn get(&self, name: &str) -> Option<Arc<ClassHolder>> {
        self.classes.get(name).cloned()
    }
}
