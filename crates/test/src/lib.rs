//! Test helpers and fixtures.

use openshelf_core::{BookRecord, CategoryFilter, QueryCriteria, SortKey};

pub fn make_record(title: &str, authors: &[&str], year: Option<u32>) -> BookRecord {
    BookRecord {
        title: title.to_string(),
        authors: authors.iter().map(|a| a.to_string()).collect(),
        first_publish_year: year,
        ..BookRecord::default()
    }
}

pub fn make_criteria(search_text: &str, sort_key: SortKey) -> QueryCriteria {
    QueryCriteria {
        search_text: search_text.to_string(),
        sort_key,
        category: CategoryFilter::All,
    }
}

/// The two-record shelf used across scenario tests.
pub fn sample_shelf() -> Vec<BookRecord> {
    vec![
        make_record("Suç ve Ceza", &["Fyodor Dostoyevski"], Some(1866)),
        make_record("Kürk Mantolu Madonna", &["Sabahattin Ali"], Some(1943)),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    #[test]
    fn builds_records() {
        let record = make_record("Dune", &["Frank Herbert"], Some(1965));
        assert_eq!(record.first_author(), "Frank Herbert");
        assert_eq!(record.first_publish_year, Some(1965));
    }

    #[test]
    fn sample_shelf_filters_end_to_end() {
        let out = application::query::apply(
            &sample_shelf(),
            &make_criteria("madonna", SortKey::Title),
            &BTreeSet::new(),
        );
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].title, "Kürk Mantolu Madonna");
    }

    #[test]
    fn normalized_search_payload_flows_through_query() {
        let body = r#"{
            "numFound": 2,
            "docs": [
                { "title": "Suç ve Ceza", "author_name": ["Fyodor Dostoyevski"], "first_publish_year": 1866 },
                { "title": "Kürk Mantolu Madonna", "author_name": ["Sabahattin Ali"], "first_publish_year": 1943 }
            ]
        }"#;

        let records = catalog::parse_search(body).unwrap();
        let out = application::query::apply(
            &records,
            &make_criteria("", SortKey::Year),
            &BTreeSet::new(),
        );
        assert_eq!(out[0].title, "Kürk Mantolu Madonna");
        assert_eq!(out[1].title, "Suç ve Ceza");
    }

    #[test]
    fn favorites_toggle_persists_across_loads() {
        let storage = storage::Storage::open(":memory:").unwrap();
        let favorites = storage
            .toggle_favorite(&BTreeSet::new(), "Suç ve Ceza")
            .unwrap();
        assert!(favorites.contains("Suç ve Ceza"));
        assert_eq!(storage.load_favorites(), favorites);
    }
}
