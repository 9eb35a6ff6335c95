use std::collections::HashMap;

use log::warn;

use crate::metadata::{ClassDef, MethodDef};

/// The ordered set of classes under optimization.
///
/// Class names are unique. A second class with a name already present is dropped with
/// a warning and the first definition wins.
#[derive(Debug, Default)]
pub struct Scope {
    classes: Vec<ClassDef>,
    index: HashMap<String, usize>,
}

impl Scope {
    /// Creates an empty scope.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a class, returning `false` if one with the same name was already present.
    pub fn push(&mut self, class: ClassDef) -> bool {
        if self.index.contains_key(class.name.as_ref()) {
            warn!("Duplicate class {} ignored, keeping the first definition", class.name);
            return false;
        }
        self.index.insert(class.name.to_string(), self.classes.len());
        self.classes.push(class);
        true
    }

    /// Number of classes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.classes.len()
    }

    /// Returns `true` if no class was loaded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }

    /// Classes in load order.
    #[must_use]
    pub fn classes(&self) -> &[ClassDef] {
        &self.classes
    }

    /// Classes in load order, for in-place edits of their members.
    ///
    /// Renaming a class through this slice is not reflected by [`Scope::find`].
    pub fn classes_mut(&mut self) -> &mut [ClassDef] {
        &mut self.classes
    }

    /// Looks up a class by internal name.
    #[must_use]
    pub fn find(&self, name: &str) -> Option<&ClassDef> {
        self.index.get(name).map(|&i| &self.classes[i])
    }

    /// Looks up a class by internal name for modification.
    pub fn find_mut(&mut self, name: &str) -> Option<&mut ClassDef> {
        self.index.get(name).map(|&i| &mut self.classes[i])
    }

    /// Iterates over every method of every class.
    pub fn methods(&self) -> impl Iterator<Item = &MethodDef> + '_ {
        self.classes.iter().flat_map(|c| c.methods.iter())
    }

    /// Number of methods that carry code.
    #[must_use]
    pub fn count_bodies(&self) -> usize {
        self.methods().filter(|m| m.has_body()).count()
    }
}

impl<'a> IntoIterator for &'a Scope {
    type Item = &'a ClassDef;
    type IntoIter = std::slice::Iter<'a, ClassDef>;

    fn into_iter(self) -> Self::IntoIter {
        self.classes.iter()
    }
}
