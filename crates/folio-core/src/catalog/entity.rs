//! Entity and field definitions.

/// Scalar field types supported by the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScalarType {
    /// Boolean.
    Bool,
    /// 32-bit signed integer.
    Int32,
    /// 64-bit signed integer.
    Int64,
    /// 64-bit floating point.
    Float64,
    /// UTF-8 string.
    Str,
    /// Timestamp as microseconds since Unix epoch.
    Timestamp,
    /// Calendar date.
    Date,
}

/// A field definition on an entity.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldDef {
    /// Field name.
    pub name: String,
    /// Scalar type of the field.
    pub ty: ScalarType,
}

impl FieldDef {
    /// Create a field definition.
    pub fn new(name: impl Into<String>, ty: ScalarType) -> Self {
        Self {
            name: name.into(),
            ty,
        }
    }
}

/// An entity definition: name, identity field, and scalar fields.
#[derive(Debug, Clone, PartialEq)]
pub struct EntityDef {
    /// Entity name (unique within the catalog).
    pub name: String,
    /// Name of the identity field.
    pub id_field: String,
    /// Scalar fields, in declaration order.
    pub fields: Vec<FieldDef>,
}

impl EntityDef {
    /// Create an entity definition with no fields.
    pub fn new(name: impl Into<String>, id_field: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            id_field: id_field.into(),
            fields: vec![],
        }
    }

    /// Add a field definition.
    pub fn with_field(mut self, field: FieldDef) -> Self {
        self.fields.push(field);
        self
    }

    /// Look up a field by name.
    pub fn get_field(&self, name: &str) -> Option<&FieldDef> {
        self.fields.iter().find(|f| f.name == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entity_builder() {
        let entity = EntityDef::new("Book", "id")
            .with_field(FieldDef::new("id", ScalarType::Int64))
            .with_field(FieldDef::new("name", ScalarType::Str))
            .with_field(FieldDef::new("published", ScalarType::Date));

        assert_eq!(entity.fields.len(), 3);
        assert_eq!(entity.get_field("published").unwrap().ty, ScalarType::Date);
        assert!(entity.get_field("isbn").is_none());
    }
}
