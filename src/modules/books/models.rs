use serde::{Deserialize, Serialize};
use thiserror::Error;
use time::OffsetDateTime;

/// A catalog entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Book {
    /// Unique identifier for the book
    pub id: String,
    pub name: String,
    pub year: i32,
    pub author: String,
    pub summary: String,
    pub publisher: String,
    pub page_count: u32,
    pub read_page: u32,
    /// Whether `read_page` reached `page_count` when the book was added.
    /// Not recomputed by updates.
    pub finished: bool,
    pub reading: bool,
    #[serde(with = "time::serde::rfc3339")]
    pub inserted_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

/// Projection returned by the list endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookSummary {
    pub id: String,
    pub name: String,
    pub publisher: String,
}

impl From<&Book> for BookSummary {
    fn from(book: &Book) -> Self {
        Self {
            id: book.id.clone(),
            name: book.name.clone(),
            publisher: book.publisher.clone(),
        }
    }
}

/// Request model for adding a book. Omitted fields take their zero value.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CreateBook {
    pub name: Option<String>,
    pub year: i32,
    pub author: String,
    pub summary: String,
    pub publisher: String,
    pub page_count: u32,
    pub read_page: u32,
    pub reading: bool,
}

/// Request model for replacing a book's fields.
///
/// `reading` is optional here: when omitted the stored value is kept.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct UpdateBook {
    pub name: Option<String>,
    pub year: i32,
    pub author: String,
    pub summary: String,
    pub publisher: String,
    pub page_count: u32,
    pub read_page: u32,
    /// `None` keeps the stored value.
    pub reading: Option<bool>,
}

/// Why a payload was refused. Checked in declaration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum FieldError {
    #[error("name is missing or empty")]
    MissingName,
    #[error("readPage is greater than pageCount")]
    ReadPageExceedsPageCount,
}

impl FieldError {
    /// JSON name of the offending field
    pub fn field(&self) -> &'static str {
        match self {
            FieldError::MissingName => "name",
            FieldError::ReadPageExceedsPageCount => "readPage",
        }
    }
}

/// Validated values written by both create and update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BookFields {
    pub name: String,
    pub year: i32,
    pub author: String,
    pub summary: String,
    pub publisher: String,
    pub page_count: u32,
    pub read_page: u32,
}

impl BookFields {
    #[allow(clippy::too_many_arguments)]
    fn validate(
        name: Option<String>,
        year: i32,
        author: String,
        summary: String,
        publisher: String,
        page_count: u32,
        read_page: u32,
    ) -> Result<Self, FieldError> {
        let name = match name {
            Some(name) if !name.is_empty() => name,
            _ => return Err(FieldError::MissingName),
        };
        if read_page > page_count {
            return Err(FieldError::ReadPageExceedsPageCount);
        }

        Ok(Self {
            name,
            year,
            author,
            summary,
            publisher,
            page_count,
            read_page,
        })
    }
}

impl CreateBook {
    /// Validate the payload, returning the fields to store and the `reading` flag.
    pub fn validate(self) -> Result<(BookFields, bool), FieldError> {
        let fields = BookFields::validate(
            self.name,
            self.year,
            self.author,
            self.summary,
            self.publisher,
            self.page_count,
            self.read_page,
        )?;
        Ok((fields, self.reading))
    }
}

impl UpdateBook {
    pub fn validate(self) -> Result<(BookFields, Option<bool>), FieldError> {
        let fields = BookFields::validate(
            self.name,
            self.year,
            self.author,
            self.summary,
            self.publisher,
            self.page_count,
            self.read_page,
        )?;
        Ok((fields, self.reading))
    }
}

/// Raw query string of the list endpoint, every occurrence of each known key
/// in request order. Unknown keys are dropped.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListQuery {
    pub reading: Vec<String>,
    pub finished: Vec<String>,
    pub name: Vec<String>,
}

impl FromIterator<(String, String)> for ListQuery {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(pairs: I) -> Self {
        let mut query = ListQuery::default();
        for (key, value) in pairs {
            match key.as_str() {
                "reading" => query.reading.push(value),
                "finished" => query.finished.push(value),
                "name" => query.name.push(value),
                _ => {}
            }
        }
        query
    }
}

/// The single filter a list request applies.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BookFilter {
    All,
    Reading(bool),
    Finished(bool),
    /// Lowercased needle matched against the lowercased name.
    NameContains(String),
}

impl BookFilter {
    /// Pick the filter for a query: `reading`, then `finished`, then `name`.
    ///
    /// A flag other than a single `"0"`/`"1"` is ignored and the next one is
    /// tried. A repeated `name` uses its last value.
    pub fn from_query(query: &ListQuery) -> Self {
        if let Some(reading) = single_flag(&query.reading) {
            return BookFilter::Reading(reading);
        }
        if let Some(finished) = single_flag(&query.finished) {
            return BookFilter::Finished(finished);
        }
        match query.name.last() {
            Some(name) => BookFilter::NameContains(name.to_lowercase()),
            None => BookFilter::All,
        }
    }

    pub fn matches(&self, book: &Book) -> bool {
        match self {
            BookFilter::All => true,
            BookFilter::Reading(reading) => book.reading == *reading,
            BookFilter::Finished(finished) => book.finished == *finished,
            BookFilter::NameContains(needle) => book.name.to_lowercase().contains(needle.as_str()),
        }
    }
}

fn single_flag(values: &[String]) -> Option<bool> {
    match values {
        [value] => parse_flag(value),
        _ => None,
    }
}

fn parse_flag(value: &str) -> Option<bool> {
    match value {
        "1" => Some(true),
        "0" => Some(false),
        _ => None,
    }
}

/// `data` of a successful create.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookCreated {
    pub book_id: String,
}

/// `data` of a successful list.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookList {
    pub books: Vec<BookSummary>,
}

/// `data` of a successful fetch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookDetail {
    pub book: Book,
}
