//! Application orchestration layer for Openshelf.

use std::collections::BTreeSet;

use openshelf_core::{BookRecord, CategoryFilter, QueryCriteria, Settings};

pub mod query;

/// View state owned by the coordinator: the record list, the current
/// criteria, the favorites set and the fetch flags. The query engine takes
/// this data as plain inputs; nothing here is captured implicitly by the UI.
#[derive(Debug, Clone)]
pub struct AppContext {
    pub settings: Settings,
    pub records: Vec<BookRecord>,
    pub criteria: QueryCriteria,
    pub favorites: BTreeSet<String>,
    pub loading: bool,
    pub error: Option<String>,
    pub notice: Option<String>,
    pub selected: usize,
}

impl AppContext {
    pub fn new(settings: Settings) -> Self {
        Self {
            settings,
            records: Vec::new(),
            criteria: QueryCriteria::default(),
            favorites: BTreeSet::new(),
            loading: false,
            error: None,
            notice: None,
            selected: 0,
        }
    }

    pub fn with_favorites(mut self, favorites: BTreeSet<String>) -> Self {
        self.favorites = favorites;
        self
    }

    pub fn begin_fetch(&mut self) {
        self.loading = true;
        self.error = None;
        self.notice = None;
    }

    /// Fetch success with a non-empty list: replace the records, clear the
    /// flags, drop any category selection that no longer exists.
    pub fn finish_fetch(&mut self, records: Vec<BookRecord>) {
        self.records = records;
        self.loading = false;
        self.error = None;
        self.notice = None;
        self.retain_valid_category();
        self.clamp_selection();
    }

    /// Fetch success with zero records: a distinct notice, not an error, and
    /// the record list stays whatever it was.
    pub fn empty_fetch(&mut self, notice: impl Into<String>) {
        self.loading = false;
        self.error = None;
        self.notice = Some(notice.into());
    }

    /// Fetch failure: the record list stays whatever it was.
    pub fn fail_fetch(&mut self, message: impl Into<String>) {
        self.loading = false;
        self.error = Some(message.into());
        self.notice = None;
    }

    /// The list the UI renders, re-derived synchronously on every call.
    pub fn visible(&self) -> Vec<BookRecord> {
        query::apply(&self.records, &self.criteria, &self.favorites)
    }

    pub fn categories(&self) -> Vec<String> {
        query::categories(&self.records)
    }

    pub fn is_favorite(&self, title: &str) -> bool {
        self.favorites.contains(title)
    }

    pub fn clamp_selection(&mut self) {
        let visible = self.visible().len();
        self.selected = self.selected.min(visible.saturating_sub(1));
    }

    fn retain_valid_category(&mut self) {
        let stale = match &self.criteria.category {
            CategoryFilter::All => false,
            CategoryFilter::Selected(name) => !self.categories().iter().any(|c| c == name),
        };
        if stale {
            self.criteria.category = CategoryFilter::All;
        }
    }
}
