//! Cross-strategy equivalence checking.
//!
//! Two strategy outputs are equivalent when they return the same authors
//! in the same rank order and, per author, the same multiset of books.
//! Book order within an author is execution detail and is not compared
//! directly; everything else must match field for field.

use crate::project::{AuthorProjection, BookProjection};

/// Check whether two result sets are logically equivalent.
pub fn equivalent(a: &[AuthorProjection], b: &[AuthorProjection]) -> bool {
    a.len() == b.len() && a.iter().zip(b).all(|(x, y)| authors_equivalent(x, y))
}

fn authors_equivalent(a: &AuthorProjection, b: &AuthorProjection) -> bool {
    a.id == b.id
        && a.first_name == b.first_name
        && a.last_name == b.last_name
        && a.user_name == b.user_name
        && a.email == b.email
        && a.age == b.age
        && a.country == b.country
        && a.books_count == b.books_count
        && book_multisets_equal(&a.books, &b.books)
}

fn book_multisets_equal(a: &[BookProjection], b: &[BookProjection]) -> bool {
    let mut a = a.to_vec();
    let mut b = b.to_vec();
    let key = |book: &BookProjection| (book.title.clone(), book.published_year);
    a.sort_by_key(key);
    b.sort_by_key(key);
    a == b
}

#[cfg(test)]
mod tests {
    use super::*;

    fn book(title: &str, year: i32) -> BookProjection {
        BookProjection {
            title: title.into(),
            published_year: year,
        }
    }

    fn author(id: i64, books: Vec<BookProjection>) -> AuthorProjection {
        AuthorProjection {
            id,
            first_name: "A".into(),
            last_name: "B".into(),
            user_name: "ab".into(),
            email: "ab@example.com".into(),
            age: 27,
            country: "Serbia".into(),
            books_count: books.len() as i64,
            books,
        }
    }

    #[test]
    fn test_same_books_different_order_is_equivalent() {
        let a = vec![author(1, vec![book("X", 1890), book("Y", 1895)])];
        let b = vec![author(1, vec![book("Y", 1895), book("X", 1890)])];
        assert!(equivalent(&a, &b));
    }

    #[test]
    fn test_root_order_matters() {
        let a = vec![author(1, vec![]), author(2, vec![])];
        let b = vec![author(2, vec![]), author(1, vec![])];
        assert!(!equivalent(&a, &b));
    }

    #[test]
    fn test_different_book_multiset_is_not_equivalent() {
        let a = vec![author(1, vec![book("X", 1890), book("X", 1890)])];
        let b = vec![author(1, vec![book("X", 1890)])];
        assert!(!equivalent(&a, &b));
    }

    #[test]
    fn test_length_mismatch() {
        let a = vec![author(1, vec![])];
        assert!(!equivalent(&a, &[]));
    }

    #[test]
    fn test_empty_results_are_equivalent() {
        assert!(equivalent(&[], &[]));
    }
}
