//! The filter/sort/categorize pipeline.
//!
//! Pure functions over `&[BookRecord]`: same inputs, same output, inputs
//! never mutated. The favorites set is an explicit parameter because the
//! favorites sort needs it.

use std::cmp::Ordering;
use std::collections::BTreeSet;

use openshelf_core::{BookRecord, CategoryFilter, QueryCriteria, SortKey};

/// Subjects shorter than this (in chars) are too generic to offer as
/// categories; longer than [`CATEGORY_MAX_CHARS`] too unwieldy.
pub const CATEGORY_MIN_CHARS: usize = 3;
pub const CATEGORY_MAX_CHARS: usize = 29;
pub const MAX_CATEGORIES: usize = 20;

/// Filters then sorts. Both filter predicates must pass (AND semantics).
/// Sorting is stable: records the comparator considers equal keep the order
/// filtering produced, which is the original list order.
pub fn apply(
    records: &[BookRecord],
    criteria: &QueryCriteria,
    favorites: &BTreeSet<String>,
) -> Vec<BookRecord> {
    let mut out: Vec<BookRecord> = records
        .iter()
        .filter(|record| {
            matches_search(record, &criteria.search_text)
                && matches_category(record, &criteria.category)
        })
        .cloned()
        .collect();

    match criteria.sort_key {
        SortKey::Title => out.sort_by(|a, b| cmp_case_insensitive(&a.title, &b.title)),
        SortKey::Author => {
            out.sort_by(|a, b| cmp_case_insensitive(a.first_author(), b.first_author()))
        }
        SortKey::Year => out.sort_by(|a, b| {
            // Descending; a missing year counts as 0 and lands last.
            b.first_publish_year
                .unwrap_or(0)
                .cmp(&a.first_publish_year.unwrap_or(0))
        }),
        SortKey::Favorites => out.sort_by(|a, b| {
            let a_fav = favorites.contains(&a.title);
            let b_fav = favorites.contains(&b.title);
            b_fav
                .cmp(&a_fav)
                .then_with(|| cmp_case_insensitive(&a.title, &b.title))
        }),
    }

    out
}

/// Category options, derived from the FULL record list so they stay stable
/// while the user types a search term: trim happened at normalization, here
/// we drop out-of-bounds lengths, dedupe, sort and cap.
pub fn categories(records: &[BookRecord]) -> Vec<String> {
    let mut subjects: Vec<String> = records
        .iter()
        .flat_map(|record| record.subjects.iter().cloned())
        .filter(|subject| {
            (CATEGORY_MIN_CHARS..=CATEGORY_MAX_CHARS).contains(&subject.chars().count())
        })
        .collect();
    subjects.sort();
    subjects.dedup();
    subjects.truncate(MAX_CATEGORIES);
    subjects
}

fn matches_search(record: &BookRecord, search_text: &str) -> bool {
    if search_text.is_empty() {
        return true;
    }
    let needle = search_text.to_lowercase();
    record.title.to_lowercase().contains(&needle)
        || record.authors_joined().to_lowercase().contains(&needle)
}

fn matches_category(record: &BookRecord, category: &CategoryFilter) -> bool {
    match category {
        CategoryFilter::All => true,
        CategoryFilter::Selected(name) => record.subjects.iter().any(|subject| subject == name),
    }
}

fn cmp_case_insensitive(a: &str, b: &str) -> Ordering {
    a.to_lowercase().cmp(&b.to_lowercase())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(title: &str, authors: &[&str], year: Option<u32>) -> BookRecord {
        BookRecord {
            title: title.to_string(),
            authors: authors.iter().map(|a| a.to_string()).collect(),
            first_publish_year: year,
            ..BookRecord::default()
        }
    }

    fn with_subjects(mut record: BookRecord, subjects: &[&str]) -> BookRecord {
        record.subjects = subjects.iter().map(|s| s.to_string()).collect();
        record
    }

    fn shelf() -> Vec<BookRecord> {
        vec![
            record("Suç ve Ceza", &["Fyodor Dostoyevski"], Some(1866)),
            record("Kürk Mantolu Madonna", &["Sabahattin Ali"], Some(1943)),
        ]
    }

    fn criteria(search: &str, sort_key: SortKey) -> QueryCriteria {
        QueryCriteria {
            search_text: search.to_string(),
            sort_key,
            category: CategoryFilter::All,
        }
    }

    #[test]
    fn identity_criteria_returns_every_record() {
        let records = shelf();
        let out = apply(
            &records,
            &criteria("", SortKey::Title),
            &BTreeSet::new(),
        );
        assert_eq!(out.len(), records.len());
    }

    #[test]
    fn apply_does_not_mutate_input() {
        let records = shelf();
        let before = records.clone();
        let _ = apply(&records, &criteria("ceza", SortKey::Year), &BTreeSet::new());
        assert_eq!(records, before);
    }

    #[test]
    fn search_matches_title_case_insensitively() {
        let out = apply(
            &shelf(),
            &criteria("madonna", SortKey::Title),
            &BTreeSet::new(),
        );
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].title, "Kürk Mantolu Madonna");
    }

    #[test]
    fn search_matches_joined_authors() {
        let out = apply(
            &shelf(),
            &criteria("dostoyevski", SortKey::Title),
            &BTreeSet::new(),
        );
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].title, "Suç ve Ceza");
    }

    #[test]
    fn search_miss_yields_empty_list() {
        let out = apply(
            &shelf(),
            &criteria("tolstoy", SortKey::Title),
            &BTreeSet::new(),
        );
        assert!(out.is_empty());
    }

    #[test]
    fn year_sort_is_descending() {
        let out = apply(&shelf(), &criteria("", SortKey::Year), &BTreeSet::new());
        assert_eq!(out[0].title, "Kürk Mantolu Madonna");
        assert_eq!(out[1].title, "Suç ve Ceza");
    }

    #[test]
    fn missing_year_sorts_after_all_dated_records() {
        let mut records = shelf();
        records.insert(0, record("Undated", &[], None));

        let out = apply(&records, &criteria("", SortKey::Year), &BTreeSet::new());
        assert_eq!(out.last().unwrap().title, "Undated");
        assert!(out[..out.len() - 1]
            .iter()
            .all(|r| r.first_publish_year.is_some()));
    }

    #[test]
    fn title_sort_is_idempotent() {
        let records = vec![
            record("gamma", &[], None),
            record("Alpha", &[], None),
            record("beta", &[], None),
        ];
        let once = apply(&records, &criteria("", SortKey::Title), &BTreeSet::new());
        let twice = apply(&once, &criteria("", SortKey::Title), &BTreeSet::new());
        assert_eq!(once, twice);
        assert_eq!(once[0].title, "Alpha");
        assert_eq!(once[1].title, "beta");
        assert_eq!(once[2].title, "gamma");
    }

    #[test]
    fn author_sort_puts_authorless_records_first() {
        let records = vec![
            record("Zeta", &["Zweig"], None),
            record("Anonymous Work", &[], None),
            record("Alpha", &["Ali"], None),
        ];
        let out = apply(&records, &criteria("", SortKey::Author), &BTreeSet::new());
        assert_eq!(out[0].title, "Anonymous Work");
        assert_eq!(out[1].title, "Alpha");
        assert_eq!(out[2].title, "Zeta");
    }

    #[test]
    fn favorites_sort_partitions_then_orders_by_title() {
        let records = vec![
            record("Carmilla", &[], None),
            record("Beloved", &[], None),
            record("Dracula", &[], None),
            record("Atonement", &[], None),
        ];
        let favorites: BTreeSet<String> =
            ["Dracula".to_string(), "Beloved".to_string()].into();

        let out = apply(&records, &criteria("", SortKey::Favorites), &favorites);
        let titles: Vec<&str> = out.iter().map(|r| r.title.as_str()).collect();
        assert_eq!(titles, vec!["Beloved", "Dracula", "Atonement", "Carmilla"]);
    }

    #[test]
    fn category_filter_requires_exact_subject_match() {
        let records = vec![
            with_subjects(record("A", &[], None), &["Fantasy", "Fiction"]),
            with_subjects(record("B", &[], None), &["fantasy"]),
            record("C", &[], None),
        ];
        let criteria = QueryCriteria {
            search_text: String::new(),
            sort_key: SortKey::Title,
            category: CategoryFilter::Selected("Fantasy".to_string()),
        };
        let out = apply(&records, &criteria, &BTreeSet::new());
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].title, "A");
    }

    #[test]
    fn filters_combine_with_and_semantics() {
        let records = vec![
            with_subjects(record("Dune", &["Frank Herbert"], None), &["Science Fiction"]),
            with_subjects(record("Dune Messiah", &["Frank Herbert"], None), &["Fantasy"]),
        ];
        let criteria = QueryCriteria {
            search_text: "dune".to_string(),
            sort_key: SortKey::Title,
            category: CategoryFilter::Selected("Fantasy".to_string()),
        };
        let out = apply(&records, &criteria, &BTreeSet::new());
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].title, "Dune Messiah");
    }

    #[test]
    fn categories_drop_short_long_and_duplicate_subjects() {
        let records = vec![
            with_subjects(
                record("A", &[], None),
                &[
                    "SF",
                    "Art",
                    "A subject name that runs far past the cap",
                    "Fiction",
                ],
            ),
            with_subjects(record("B", &[], None), &["Fiction", "History"]),
        ];

        let out = categories(&records);
        assert_eq!(
            out,
            vec![
                "Art".to_string(),
                "Fiction".to_string(),
                "History".to_string()
            ]
        );
    }

    #[test]
    fn categories_boundary_lengths() {
        let twentynine = "a".repeat(29);
        let thirty = "a".repeat(30);
        let records = vec![with_subjects(
            record("A", &[], None),
            &["ab", "abc", twentynine.as_str(), thirty.as_str()],
        )];

        let out = categories(&records);
        assert_eq!(out, vec!["abc".to_string(), twentynine]);
    }

    #[test]
    fn categories_are_capped() {
        let records: Vec<BookRecord> = (0..30)
            .map(|i| {
                with_subjects(
                    record(&format!("book {i}"), &[], None),
                    &[format!("Subject {i:02}").as_str()],
                )
            })
            .collect();

        let out = categories(&records);
        assert_eq!(out.len(), MAX_CATEGORIES);
        assert_eq!(out[0], "Subject 00");
    }

    #[test]
    fn categories_come_from_the_full_list_not_the_filtered_one() {
        // The caller passes the unfiltered list; a search term must not be
        // able to shrink the option set.
        let records = vec![
            with_subjects(record("Dune", &[], None), &["Science Fiction"]),
            with_subjects(record("Emma", &[], None), &["Romance"]),
        ];
        let filtered = apply(&records, &criteria("dune", SortKey::Title), &BTreeSet::new());
        assert_eq!(filtered.len(), 1);
        assert_eq!(
            categories(&records),
            vec!["Romance".to_string(), "Science Fiction".to_string()]
        );
    }
}
