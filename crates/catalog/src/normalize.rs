//! Raw upstream payload shapes and their mapping onto [`BookRecord`].
//!
//! Absent upstream data stays absent in the record: no field is defaulted to
//! a placeholder string here, rendering fallbacks are the UI's business.
//! Entries without a title are skipped outright — the title is the record's
//! identity key and an entry without one can be neither shown nor favorited.

use anyhow::Context as _;
use openshelf_core::BookRecord;
use serde::Deserialize;

#[derive(Debug, Deserialize)]
struct ReadingLogResponse {
    reading_log_entries: Vec<ReadingLogEntry>,
}

#[derive(Debug, Deserialize)]
struct ReadingLogEntry {
    work: ReadingLogWork,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ReadingLogWork {
    title: Option<String>,
    author_names: Option<Vec<String>>,
    first_publish_year: Option<u32>,
    subject: Option<Vec<String>>,
    isbn: Option<Vec<String>>,
    cover_id: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    docs: Vec<SearchDoc>,
    #[serde(default, rename = "numFound")]
    #[allow(dead_code)]
    num_found: u64,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct SearchDoc {
    title: Option<String>,
    author_name: Option<Vec<String>>,
    first_publish_year: Option<u32>,
    cover_i: Option<u64>,
    isbn: Option<Vec<String>>,
    subject: Option<Vec<String>>,
}

#[derive(Debug, Deserialize)]
struct VolumesResponse {
    items: Vec<VolumeItem>,
}

#[derive(Debug, Deserialize)]
struct VolumeItem {
    #[serde(rename = "volumeInfo")]
    volume_info: VolumeInfo,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct VolumeInfo {
    title: Option<String>,
    authors: Option<Vec<String>>,
}

/// Parses the want-to-read reading log: `{ reading_log_entries: [{ work }] }`.
/// A body without the top-level collection key is an error, not an empty list.
pub fn parse_reading_log(body: &str) -> anyhow::Result<Vec<BookRecord>> {
    let response: ReadingLogResponse =
        serde_json::from_str(body).context("parse reading log payload")?;
    Ok(response
        .reading_log_entries
        .into_iter()
        .filter_map(|entry| {
            let work = entry.work;
            Some(BookRecord {
                title: required_title(work.title)?,
                authors: work.author_names.unwrap_or_default(),
                first_publish_year: work.first_publish_year,
                subjects: clean_subjects(work.subject.unwrap_or_default()),
                cover_id: work.cover_id,
                isbns: work.isbn.unwrap_or_default(),
            })
        })
        .collect())
}

/// Parses the search endpoint payload: `{ docs: [...], numFound }`.
pub fn parse_search(body: &str) -> anyhow::Result<Vec<BookRecord>> {
    let response: SearchResponse = serde_json::from_str(body).context("parse search payload")?;
    Ok(response
        .docs
        .into_iter()
        .filter_map(|doc| {
            Some(BookRecord {
                title: required_title(doc.title)?,
                authors: doc.author_name.unwrap_or_default(),
                first_publish_year: doc.first_publish_year,
                subjects: clean_subjects(doc.subject.unwrap_or_default()),
                cover_id: doc.cover_i,
                isbns: doc.isbn.unwrap_or_default(),
            })
        })
        .collect())
}

/// Parses the volumes payload: `{ items: [{ volumeInfo }] }`. The shape
/// carries no year, subjects, isbns or numeric cover id.
pub fn parse_volumes(body: &str) -> anyhow::Result<Vec<BookRecord>> {
    let response: VolumesResponse = serde_json::from_str(body).context("parse volumes payload")?;
    Ok(response
        .items
        .into_iter()
        .filter_map(|item| {
            let info = item.volume_info;
            Some(BookRecord {
                title: required_title(info.title)?,
                authors: info.authors.unwrap_or_default(),
                ..BookRecord::default()
            })
        })
        .collect())
}

fn required_title(title: Option<String>) -> Option<String> {
    let title = title?;
    let trimmed = title.trim();
    if trimmed.is_empty() {
        return None;
    }
    Some(trimmed.to_string())
}

fn clean_subjects(subjects: Vec<String>) -> Vec<String> {
    subjects
        .into_iter()
        .map(|subject| subject.trim().to_string())
        .filter(|subject| !subject.is_empty())
        .collect()
}
