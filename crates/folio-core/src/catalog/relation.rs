//! Relation definitions between entities.

/// Cardinality of a relation, seen from the source entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cardinality {
    /// Exactly one target row per source row (foreign key on the source).
    OneToOne,
    /// Zero or more target rows per source row (foreign key on the target).
    OneToMany,
    /// Exactly one target row, shared by many sources (foreign key on the source).
    ManyToOne,
}

impl Cardinality {
    /// Whether the foreign key lives on the target (the "many" side).
    pub fn key_on_target(&self) -> bool {
        matches!(self, Cardinality::OneToMany)
    }
}

/// A relation definition between two entities.
#[derive(Debug, Clone, PartialEq)]
pub struct RelationDef {
    /// Relation name (unique per source entity).
    pub name: String,
    /// Source entity name.
    pub from_entity: String,
    /// Target entity name.
    pub to_entity: String,
    /// Relation cardinality.
    pub cardinality: Cardinality,
    /// Join field on the source entity.
    pub from_field: String,
    /// Join field on the target entity.
    pub to_field: String,
}

impl RelationDef {
    /// Create a one-to-one relation (foreign key on the source).
    pub fn one_to_one(
        name: impl Into<String>,
        from_entity: impl Into<String>,
        from_field: impl Into<String>,
        to_entity: impl Into<String>,
        to_field: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            from_entity: from_entity.into(),
            to_entity: to_entity.into(),
            cardinality: Cardinality::OneToOne,
            from_field: from_field.into(),
            to_field: to_field.into(),
        }
    }

    /// Create a one-to-many relation (foreign key on the target).
    pub fn one_to_many(
        name: impl Into<String>,
        from_entity: impl Into<String>,
        from_field: impl Into<String>,
        to_entity: impl Into<String>,
        to_field: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            from_entity: from_entity.into(),
            to_entity: to_entity.into(),
            cardinality: Cardinality::OneToMany,
            from_field: from_field.into(),
            to_field: to_field.into(),
        }
    }

    /// Create a many-to-one relation (foreign key on the source).
    pub fn many_to_one(
        name: impl Into<String>,
        from_entity: impl Into<String>,
        from_field: impl Into<String>,
        to_entity: impl Into<String>,
        to_field: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            from_entity: from_entity.into(),
            to_entity: to_entity.into(),
            cardinality: Cardinality::ManyToOne,
            from_field: from_field.into(),
            to_field: to_field.into(),
        }
    }

    /// Whether the relation fans out to a collection.
    pub fn is_to_many(&self) -> bool {
        self.cardinality == Cardinality::OneToMany
    }
}
