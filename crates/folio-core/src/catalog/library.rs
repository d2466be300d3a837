//! The library schema: User, Author, Book, Publisher.

use super::{Catalog, EntityDef, FieldDef, RelationDef, ScalarType};

/// Build the catalog for the library schema.
///
/// Authors reference exactly one User (1:1 by foreign key) and own a Book
/// collection; each Book references one Publisher. `books_count` on Author
/// is a denormalized cache of the owned book count — ranking trusts it as
/// given, and the engine never re-derives it from the live rows.
pub fn library_catalog() -> Catalog {
    let user = EntityDef::new("User", "id")
        .with_field(FieldDef::new("id", ScalarType::Int64))
        .with_field(FieldDef::new("first_name", ScalarType::Str))
        .with_field(FieldDef::new("last_name", ScalarType::Str))
        .with_field(FieldDef::new("user_name", ScalarType::Str))
        .with_field(FieldDef::new("email", ScalarType::Str))
        .with_field(FieldDef::new("created", ScalarType::Timestamp))
        .with_field(FieldDef::new("email_confirmed", ScalarType::Bool))
        .with_field(FieldDef::new("last_activity", ScalarType::Timestamp));

    let author = EntityDef::new("Author", "id")
        .with_field(FieldDef::new("id", ScalarType::Int64))
        .with_field(FieldDef::new("user_id", ScalarType::Int64))
        .with_field(FieldDef::new("age", ScalarType::Int32))
        .with_field(FieldDef::new("country", ScalarType::Str))
        .with_field(FieldDef::new("nick_name", ScalarType::Str))
        // Cached aggregate; stale values are a data-quality concern outside
        // the engine's control.
        .with_field(FieldDef::new("books_count", ScalarType::Int64));

    let book = EntityDef::new("Book", "id")
        .with_field(FieldDef::new("id", ScalarType::Int64))
        .with_field(FieldDef::new("author_id", ScalarType::Int64))
        .with_field(FieldDef::new("name", ScalarType::Str))
        .with_field(FieldDef::new("isbn", ScalarType::Str))
        .with_field(FieldDef::new("published", ScalarType::Date))
        .with_field(FieldDef::new("publisher_id", ScalarType::Int64));

    let publisher = EntityDef::new("Publisher", "id")
        .with_field(FieldDef::new("id", ScalarType::Int64))
        .with_field(FieldDef::new("name", ScalarType::Str))
        .with_field(FieldDef::new("established", ScalarType::Date));

    let mut catalog = Catalog::new();
    catalog.register_entity(user);
    catalog.register_entity(author);
    catalog.register_entity(book);
    catalog.register_entity(publisher);
    catalog.register_relation(RelationDef::one_to_one(
        "user", "Author", "user_id", "User", "id",
    ));
    catalog.register_relation(RelationDef::one_to_many(
        "books", "Author", "id", "Book", "author_id",
    ));
    catalog.register_relation(RelationDef::many_to_one(
        "publisher",
        "Book",
        "publisher_id",
        "Publisher",
        "id",
    ));
    catalog
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Cardinality;

    #[test]
    fn test_library_catalog_entities() {
        let catalog = library_catalog();
        for name in ["User", "Author", "Book", "Publisher"] {
            assert!(catalog.entity(name).is_some(), "missing entity {name}");
        }
        let author = catalog.entity("Author").unwrap();
        assert_eq!(author.id_field, "id");
        assert!(author.get_field("books_count").is_some());
    }

    #[test]
    fn test_library_catalog_relations() {
        let catalog = library_catalog();
        let user = catalog.relation("Author", "user").unwrap();
        assert_eq!(user.cardinality, Cardinality::OneToOne);
        assert_eq!(user.to_entity, "User");

        let books = catalog.relation("Author", "books").unwrap();
        assert!(books.is_to_many());
        assert_eq!(books.to_field, "author_id");

        let publisher = catalog.relation("Book", "publisher").unwrap();
        assert_eq!(publisher.cardinality, Cardinality::ManyToOne);
        assert_eq!(publisher.to_entity, "Publisher");
    }
}
