//! Core domain types for Openshelf.

use serde::{Deserialize, Serialize};

/// One normalized catalog entry.
///
/// The title doubles as the identity key for favoriting and selection;
/// the reading-log payload carries no stable upstream id, so two distinct
/// works sharing a title collide in the favorites set. Known limitation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookRecord {
    pub title: String,
    pub authors: Vec<String>,
    pub first_publish_year: Option<u32>,
    pub subjects: Vec<String>,
    pub cover_id: Option<u64>,
    pub isbns: Vec<String>,
}

impl BookRecord {
    pub fn first_author(&self) -> &str {
        self.authors.first().map(String::as_str).unwrap_or("")
    }

    pub fn authors_joined(&self) -> String {
        self.authors.join(", ")
    }

    /// Display URL for the medium cover image. No cover id, no URL.
    pub fn cover_url(&self) -> Option<String> {
        self.cover_id
            .map(|id| format!("https://covers.openlibrary.org/b/id/{id}-M.jpg"))
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortKey {
    #[default]
    Title,
    Author,
    Year,
    Favorites,
}

impl SortKey {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortKey::Title => "title",
            SortKey::Author => "author",
            SortKey::Year => "year",
            SortKey::Favorites => "favorites",
        }
    }

    pub fn cycle(self) -> Self {
        match self {
            SortKey::Title => SortKey::Author,
            SortKey::Author => SortKey::Year,
            SortKey::Year => SortKey::Favorites,
            SortKey::Favorites => SortKey::Title,
        }
    }
}

impl std::fmt::Display for SortKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for SortKey {
    type Err = &'static str;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "title" => Ok(SortKey::Title),
            "author" => Ok(SortKey::Author),
            "year" => Ok(SortKey::Year),
            "favorites" => Ok(SortKey::Favorites),
            _ => Err("unknown sort key"),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum CategoryFilter {
    #[default]
    All,
    Selected(String),
}

impl CategoryFilter {
    pub fn label(&self) -> &str {
        match self {
            CategoryFilter::All => "all",
            CategoryFilter::Selected(name) => name,
        }
    }
}

/// User-selected search text, sort key and category filter. Session-only.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryCriteria {
    pub search_text: String,
    pub sort_key: SortKey,
    pub category: CategoryFilter,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    Light,
    Dark,
}

impl Theme {
    pub fn as_str(&self) -> &'static str {
        match self {
            Theme::Light => "light",
            Theme::Dark => "dark",
        }
    }
}

impl std::fmt::Display for Theme {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Theme {
    type Err = &'static str;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "light" => Ok(Theme::Light),
            "dark" => Ok(Theme::Dark),
            _ => Err("unknown theme"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub theme: Theme,
    pub search_limit: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            theme: Theme::Dark,
            search_limit: 50,
        }
    }
}

impl Settings {
    pub fn normalize(&mut self) {
        self.search_limit = self.search_limit.clamp(1, 100);
    }

    pub fn cycle_theme(&mut self) {
        self.theme = match self.theme {
            Theme::Light => Theme::Dark,
            Theme::Dark => Theme::Light,
        };
    }
}
