use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityKind {
    Class,
    Function,
}

/// A cataloged top-level declaration, unique by (file, kind, name, line)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entity {
    #[serde(rename = "type")]
    pub kind: EntityKind,

    pub name: String,

    /// Line of the `class`/`def` keyword
    pub line: usize,

    /// File path relative to the analysis root's parent
    pub file: String,

    /// Positional superclass expressions (classes only)
    pub bases: Vec<String>,

    /// Function definitions directly inside the class body (classes only)
    pub method_count: usize,

    /// Decorator expressions without the leading `@`
    pub decorators: Vec<String>,

    pub docstring: Option<String>,
}

impl Entity {
    pub fn is_class(&self) -> bool {
        self.kind == EntityKind::Class
    }
}

/// Entities grouped by relative file path, in path order
pub type EntityCatalog = BTreeMap<String, Vec<Entity>>;

/// Number of classes and functions declared in one file's entity list
pub fn count_kinds(entities: &[Entity]) -> (usize, usize) {
    let classes = entities.iter().filter(|e| e.is_class()).count();
    (classes, entities.len() - classes)
}
