//! Schema catalog: entity and relation definitions.
//!
//! The catalog is a plain in-memory registry; entities are created and
//! updated by upstream systems, so nothing here persists.

mod entity;
mod library;
mod relation;

pub use entity::{EntityDef, FieldDef, ScalarType};
pub use library::library_catalog;
pub use relation::{Cardinality, RelationDef};

use std::collections::HashMap;

/// Registry of entity and relation definitions.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    entities: HashMap<String, EntityDef>,
    relations: Vec<RelationDef>,
}

impl Catalog {
    /// Create an empty catalog.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an entity definition, replacing any previous one.
    pub fn register_entity(&mut self, entity: EntityDef) {
        self.entities.insert(entity.name.clone(), entity);
    }

    /// Register a relation definition.
    pub fn register_relation(&mut self, relation: RelationDef) {
        self.relations.push(relation);
    }

    /// Look up an entity definition by name.
    pub fn entity(&self, name: &str) -> Option<&EntityDef> {
        self.entities.get(name)
    }

    /// Look up a relation by source entity and relation name.
    pub fn relation(&self, from_entity: &str, name: &str) -> Option<&RelationDef> {
        self.relations
            .iter()
            .find(|r| r.from_entity == from_entity && r.name == name)
    }

    /// All relations whose source is the given entity.
    pub fn relations_from(&self, from_entity: &str) -> Vec<&RelationDef> {
        self.relations
            .iter()
            .filter(|r| r.from_entity == from_entity)
            .collect()
    }
}
