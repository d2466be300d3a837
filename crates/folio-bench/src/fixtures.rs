//! Deterministic library data generation for benchmarks.
//!
//! Generators are seeded so every run measures the same dataset. A fixed
//! fraction of authors matches the canonical Serbia/27 predicate, keeping
//! result size roughly constant while total data grows with scale.

use chrono::NaiveDate;
use folio_core::EntityRow;
use folio_plan::Value;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

const SEED: u64 = 0x5EED_F011_0;

/// Scale factor for generated datasets.
#[derive(Clone, Copy, Debug)]
pub enum Scale {
    /// ~20 authors; development iteration.
    Tiny,
    /// ~200 authors.
    Small,
    /// ~2,000 authors.
    Medium,
    /// ~20,000 authors.
    Large,
}

impl Scale {
    /// Number of authors (and users) generated.
    pub fn authors(&self) -> usize {
        match self {
            Scale::Tiny => 20,
            Scale::Small => 200,
            Scale::Medium => 2_000,
            Scale::Large => 20_000,
        }
    }

    /// Maximum books per author; actual counts are uniform in 0..=max.
    pub fn max_books_per_author(&self) -> usize {
        match self {
            Scale::Tiny => 3,
            Scale::Small => 5,
            Scale::Medium => 8,
            Scale::Large => 10,
        }
    }
}

impl Default for Scale {
    fn default() -> Self {
        Scale::Medium
    }
}

/// A generated dataset, one row vector per entity table.
pub struct Library {
    pub users: Vec<EntityRow>,
    pub authors: Vec<EntityRow>,
    pub books: Vec<EntityRow>,
    pub publishers: Vec<EntityRow>,
}

const COUNTRIES: [&str; 8] = [
    "Serbia", "France", "Japan", "Brazil", "Norway", "Ghana", "Canada", "Chile",
];

const FIRST_NAMES: [&str; 8] = [
    "Ana", "Marko", "Jovana", "Nikola", "Mila", "Petar", "Sara", "Luka",
];

const PUBLISHER_COUNT: usize = 25;

/// Generate a library dataset at the given scale.
///
/// Every tenth author is pinned to Serbia/age 27 so the canonical query
/// always has candidates; `books_count` is written from the number of
/// books actually generated, so ranking and reality agree.
pub fn generate_library(scale: Scale) -> Library {
    let mut rng = StdRng::seed_from_u64(SEED);
    let author_count = scale.authors();

    let publishers: Vec<EntityRow> = (0..PUBLISHER_COUNT as i64)
        .map(|id| publisher_row(id + 1, &mut rng))
        .collect();

    let mut users = Vec::with_capacity(author_count);
    let mut authors = Vec::with_capacity(author_count);
    let mut books = Vec::new();
    let mut next_book_id: i64 = 1;

    for i in 0..author_count {
        let author_id = (i + 1) as i64;
        let user_id = author_id + 1_000_000;
        users.push(user_row(user_id, i));

        let (country, age) = if i % 10 == 0 {
            ("Serbia", 27)
        } else {
            (
                COUNTRIES[rng.gen_range(0..COUNTRIES.len())],
                rng.gen_range(20..70),
            )
        };

        let book_count = rng.gen_range(0..=scale.max_books_per_author());
        for _ in 0..book_count {
            books.push(book_row(next_book_id, author_id, &mut rng));
            next_book_id += 1;
        }

        authors.push(EntityRow::new(
            author_id,
            vec![
                ("id".into(), Value::Int64(author_id)),
                ("user_id".into(), Value::Int64(user_id)),
                ("age".into(), Value::Int32(age)),
                ("country".into(), Value::from(country)),
                ("nick_name".into(), Value::from(format!("pen{author_id}"))),
                ("books_count".into(), Value::Int64(book_count as i64)),
            ],
        ));
    }

    Library {
        users,
        authors,
        books,
        publishers,
    }
}

fn user_row(id: i64, index: usize) -> EntityRow {
    let first = FIRST_NAMES[index % FIRST_NAMES.len()];
    EntityRow::new(
        id,
        vec![
            ("id".into(), Value::Int64(id)),
            ("first_name".into(), Value::from(first)),
            ("last_name".into(), Value::from(format!("{first}ov"))),
            ("user_name".into(), Value::from(format!("{first}{index}").to_lowercase())),
            ("email".into(), Value::from(format!("u{index}@example.com"))),
            ("created".into(), Value::Timestamp(1_600_000_000_000_000)),
            ("email_confirmed".into(), Value::Bool(index % 7 != 0)),
            ("last_activity".into(), Value::Timestamp(1_700_000_000_000_000)),
        ],
    )
}

fn book_row(id: i64, author_id: i64, rng: &mut StdRng) -> EntityRow {
    // Publication years span 1800..2000; roughly half fall before 1900.
    let year = rng.gen_range(1800..2000);
    let month = rng.gen_range(1..=12);
    let published = NaiveDate::from_ymd_opt(year, month, 1).unwrap();
    EntityRow::new(
        id,
        vec![
            ("id".into(), Value::Int64(id)),
            ("author_id".into(), Value::Int64(author_id)),
            ("name".into(), Value::from(format!("Volume {id}"))),
            ("isbn".into(), Value::from(format!("978-{id:09}"))),
            ("published".into(), Value::Date(published)),
            (
                "publisher_id".into(),
                Value::Int64(rng.gen_range(1..=PUBLISHER_COUNT as i64)),
            ),
        ],
    )
}

fn publisher_row(id: i64, rng: &mut StdRng) -> EntityRow {
    let year = rng.gen_range(1700..1950);
    EntityRow::new(
        id,
        vec![
            ("id".into(), Value::Int64(id)),
            ("name".into(), Value::from(format!("Press {id}"))),
            (
                "established".into(),
                Value::Date(NaiveDate::from_ymd_opt(year, 1, 1).unwrap()),
            ),
        ],
    )
}
