//! Upstream catalog access: payload normalization and a background fetch worker.

use std::time::Duration;

use anyhow::Context as _;
use openshelf_core::BookRecord;

mod normalize;
mod worker;

pub use normalize::{parse_reading_log, parse_search, parse_volumes};
pub use worker::{CatalogWorker, FetchJob, FetchOutcome};

const READING_LOG_URL: &str = "https://openlibrary.org/people/mekBot/books/want-to-read.json";
const SEARCH_URL: &str = "https://openlibrary.org/search.json";
const VOLUMES_URL: &str = "https://www.googleapis.com/books/v1/volumes";

const SEARCH_FIELDS: &str =
    "title,author_name,first_publish_year,cover_i,isbn,subject,publisher,language,key";

const USER_AGENT: &str = concat!("openshelf/", env!("CARGO_PKG_VERSION"));

/// Where the record list comes from. Each variant owns one payload shape
/// and one normalizer; nothing is guessed from the structure of the body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Source {
    /// The public want-to-read reading log.
    ReadingLog,
    /// Full-text search against the OpenLibrary search endpoint.
    Search { query: String, limit: usize },
    /// Free-text search against the volumes API. Alternate variant; the
    /// payload carries no cover ids, years or subjects.
    Volumes { query: String },
}

impl Source {
    pub fn label(&self) -> &'static str {
        match self {
            Source::ReadingLog => "reading log",
            Source::Search { .. } => "search",
            Source::Volumes { .. } => "volumes",
        }
    }
}

#[derive(Debug, Clone)]
pub struct CatalogClient {
    http: reqwest::blocking::Client,
}

impl CatalogClient {
    pub fn new() -> anyhow::Result<Self> {
        let http = reqwest::blocking::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(30))
            .build()
            .context("build http client")?;
        Ok(Self { http })
    }

    /// Fetches and normalizes one source. Any failure along the way (network,
    /// status, malformed body, absent collection key) is a single error; no
    /// partial record list is ever produced.
    pub fn fetch_records(&self, source: &Source) -> anyhow::Result<Vec<BookRecord>> {
        let request = match source {
            Source::ReadingLog => self.http.get(READING_LOG_URL),
            Source::Search { query, limit } => self.http.get(SEARCH_URL).query(&[
                ("q", query.clone()),
                ("limit", limit.to_string()),
                ("fields", SEARCH_FIELDS.to_string()),
            ]),
            Source::Volumes { query } => self.http.get(VOLUMES_URL).query(&[("q", query)]),
        };

        let response = request
            .send()
            .with_context(|| format!("fetch {}", source.label()))?
            .error_for_status()
            .with_context(|| format!("fetch {}", source.label()))?;
        let body = response
            .text()
            .with_context(|| format!("read {} body", source.label()))?;

        match source {
            Source::ReadingLog => parse_reading_log(&body),
            Source::Search { .. } => parse_search(&body),
            Source::Volumes { .. } => parse_volumes(&body),
        }
    }

    pub fn fetch_cover(&self, cover_id: u64) -> anyhow::Result<Vec<u8>> {
        let url = format!("https://covers.openlibrary.org/b/id/{cover_id}-M.jpg");
        let response = self
            .http
            .get(&url)
            .send()
            .with_context(|| format!("fetch cover {cover_id}"))?
            .error_for_status()
            .with_context(|| format!("fetch cover {cover_id}"))?;
        let bytes = response
            .bytes()
            .with_context(|| format!("read cover {cover_id} body"))?;
        Ok(bytes.to_vec())
    }
}
