//! Memoised class-hierarchy queries over a [`ClassSource`]
//!
//! Unlike the propagation state, this cache is meant to outlive a single
//! analysis generation: watch-mode tooling evicts only the classes it knows
//! changed, and every memoised answer remembers which classes its lookup
//! visited so that it can be dropped with them.

use crate::model::{ClassHolder, ClassName, ClassSource, FieldRef, MethodDescriptor, MethodRef, RuntimeType, ROOT_CLASS};
use smallvec::SmallVec;
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Arc;

type LookupPath = SmallVec<[ClassName; 4]>;

#[derive(Debug, Clone)]
struct Memo<T> {
    result: Option<T>,
    path: LookupPath,
}

impl<T> Memo<T> {
    fn touches(&self, stale: &HashSet<ClassName>) -> bool {
        self.path.iter().any(|name| stale.contains(name))
    }
}

/// Array types are assignable to these besides the root.
const ARRAY_SUPERTYPES: [&str; 2] = ["java.lang.Cloneable", "java.io.Serializable"];

pub struct ClassHierarchy {
    source: Box<dyn ClassSource>,
    classes: HashMap<ClassName, Option<Arc<ClassHolder>>>,
    declarations: HashMap<MethodRef, Memo<MethodRef>>,
    implementations: HashMap<(ClassName, MethodDescriptor), Memo<MethodRef>>,
    fields: HashMap<FieldRef, Memo<FieldRef>>,
    subclasses: HashMap<(ClassName, ClassName), Memo<()>>,
}

impl std::fmt::Debug for ClassHierarchy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClassHierarchy")
            .field("classes", &self.classes.len())
            .field("declarations", &self.declarations.len())
            .field("implementations", &self.implementations.len())
            .finish_non_exhaustive()
    }
}

impl ClassHierarchy {
    pub fn new(source: Box<dyn ClassSource>) -> Self {
        Self {
            source,
            classes: HashMap::new(),
            declarations: HashMap::new(),
            implementations: HashMap::new(),
            fields: HashMap::new(),
            subclasses: HashMap::new(),
        }
    }

    /// Swaps the underlying provider. Already cached answers are kept until
    /// evicted.
    pub fn set_source(&mut self, source: Box<dyn ClassSource>) {
        self.source = source;
    }

    pub fn get(&mut self, name: &str) -> Option<Arc<ClassHolder>> {
        if let Some(cached) = self.classes.get(name) {
            return cached.clone();
        }
        let class = self.source.get(name);
        self.classes.insert(name.to_string(), class.clone());
        class
    }

    /// Finds the class that declares `method`, abstract or not, searching
    /// superclasses first and superinterfaces second.
    pub fn resolve_method(&mut self, method: &MethodRef) -> Option<MethodRef> {
        if let Some(memo) = self.declarations.get(method) {
            return memo.result.clone();
        }
        let descriptor = &method.descriptor;
        let (result, path) = self.lookup(&method.class, |class| {
            class
                .method(descriptor)
                .map(|_| MethodRef::new(class.name.clone(), descriptor.clone()))
        });
        self.declarations.insert(
            method.clone(),
            Memo {
                result: result.clone(),
                path,
            },
        );
        result
    }

    /// Finds the implementation a receiver of exact class `class` runs for
    /// `descriptor`: the nearest non-abstract declaration up the superclass
    /// chain, then a default method from a superinterface.
    pub fn resolve_implementation(&mut self, class: &str, descriptor: &MethodDescriptor) -> Option<MethodRef> {
        let key = (class.to_string(), descriptor.clone());
        if let Some(memo) = self.implementations.get(&key) {
            return memo.result.clone();
        }
        let (result, path) = self.lookup(class, |holder| {
            holder
                .method(descriptor)
                .filter(|m| !m.is_abstract() && !m.is_static())
                .map(|_| MethodRef::new(holder.name.clone(), descriptor.clone()))
        });
        self.implementations.insert(
            key,
            Memo {
                result: result.clone(),
                path,
            },
        );
        result
    }

    pub fn resolve_field(&mut self, field: &FieldRef) -> Option<FieldRef> {
        if let Some(memo) = self.fields.get(field) {
            return memo.result.clone();
        }
        let (result, path) = self.lookup(&field.class, |class| {
            class
                .field(&field.name)
                .map(|_| FieldRef::new(class.name.clone(), field.name.clone()))
        });
        self.fields.insert(
            field.clone(),
            Memo {
                result: result.clone(),
                path,
            },
        );
        result
    }

    /// Whether `class` is `ancestor` or inherits from it.
    pub fn is_subclass(&mut self, class: &str, ancestor: &str) -> bool {
        if class == ancestor || ancestor == ROOT_CLASS {
            return true;
        }
        let key = (class.to_string(), ancestor.to_string());
        if let Some(memo) = self.subclasses.get(&key) {
            return memo.result.is_some();
        }
        let (result, path) = self.lookup(class, |holder| (holder.name == ancestor).then_some(()));
        let found = result.is_some();
        self.subclasses.insert(key, Memo { result, path });
        found
    }

    /// Whether a value of runtime type `ty` can be stored in a variable of
    /// declared class `declared`.
    pub fn is_assignable(&mut self, ty: &RuntimeType, declared: &str) -> bool {
        if declared == ROOT_CLASS {
            return true;
        }
        if ty.is_array() {
            return ARRAY_SUPERTYPES.contains(&declared);
        }
        match ty.dispatch_class() {
            Some(class) => {
                let class = class.to_string();
                self.is_subclass(&class, declared)
            }
            None => false,
        }
    }

    /// Drops every cached class in `stale` and every memoised answer whose
    /// lookup visited one. Returns the number of entries removed.
    pub fn evict(&mut self, stale: &HashSet<ClassName>) -> usize {
        let before = self.len();
        self.classes.retain(|name, _| !stale.contains(name));
        self.declarations.retain(|_, memo| !memo.touches(stale));
        self.implementations.retain(|_, memo| !memo.touches(stale));
        self.fields.retain(|_, memo| !memo.touches(stale));
        self.subclasses.retain(|_, memo| !memo.touches(stale));
        before - self.len()
    }

    fn len(&self) -> usize {
        self.classes.len()
            + self.declarations.len()
            + self.implementations.len()
            + self.fields.len()
            + self.subclasses.len()
    }

    /// Visits `start`, its superclasses, then all superinterfaces
    /// breadth-first, returning the first hit of `pick` and every class name
    /// looked at on the way.
    fn lookup<T>(&mut self, start: &str, mut pick: impl FnMut(&ClassHolder) -> Option<T>) -> (Option<T>, LookupPath) {
        let mut path = LookupPath::new();
        let mut seen = HashSet::new();
        let mut interfaces = VecDeque::new();

        let mut current = Some(start.to_string());
        while let Some(name) = current.take() {
            if !seen.insert(name.clone()) {
                break;
            }
            path.push(name.clone());
            let Some(class) = self.get(&name) else {
                break;
            };
            if let Some(found) = pick(&class) {
                return (Some(found), path);
            }
            interfaces.extend(class.interfaces.iter().cloned());
            current = class.parent.clone();
        }

        while let Some(name) = interfaces.pop_front() {
            if !seen.insert(name.clone()) {
                continue;
            }
            path.push(name.clone());
            let Some(class) = self.get(&name) else {
                continue;
            };
            if let Some(found) = pick(&class) {
                return (Some(found), path);
            }
            interfaces.extend(class.interfaces.iter().cloned());
        }

        (None, path)
    }
}
