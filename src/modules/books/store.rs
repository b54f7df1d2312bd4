//! In-memory catalog store.
//!
//! Books live in an insertion-ordered map keyed by id, behind a `RwLock`:
//! lookups are O(1), listing follows insertion order, and every mutation is
//! atomic relative to concurrent scans.

use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use indexmap::IndexMap;
use rand::Rng;
use thiserror::Error;
use time::OffsetDateTime;

use super::models::{Book, BookFields, BookFilter, BookSummary};

/// Length of generated book ids
pub const ID_LENGTH: usize = 16;

/// URL-safe alphabet ids are drawn from
const ID_ALPHABET: &[u8; 64] =
    b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789_-";

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("book store lock poisoned")]
    Poisoned,
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Source of timestamps for `insertedAt`/`updatedAt`
pub trait Clock: Send + Sync + 'static {
    fn now(&self) -> OffsetDateTime;
}

/// Wall clock in UTC
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> OffsetDateTime {
        OffsetDateTime::now_utc()
    }
}

/// Shared handle to the catalog. Clones refer to the same books.
#[derive(Clone)]
pub struct BookStore {
    books: Arc<RwLock<IndexMap<String, Book>>>,
    clock: Arc<dyn Clock>,
}

impl BookStore {
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            books: Arc::new(RwLock::new(IndexMap::new())),
            clock,
        }
    }

    fn read(&self) -> StoreResult<RwLockReadGuard<'_, IndexMap<String, Book>>> {
        self.books.read().map_err(|_| StoreError::Poisoned)
    }

    fn write(&self) -> StoreResult<RwLockWriteGuard<'_, IndexMap<String, Book>>> {
        self.books.write().map_err(|_| StoreError::Poisoned)
    }

    /// Append a new book and return it.
    ///
    /// `finished` is derived from the page counts here and only here.
    pub fn insert(&self, fields: BookFields, reading: bool) -> StoreResult<Book> {
        let now = self.clock.now();
        let mut books = self.write()?;

        let mut rng = rand::thread_rng();
        let mut id = generate_id(&mut rng);
        while books.contains_key(&id) {
            id = generate_id(&mut rng);
        }

        let book = Book {
            id: id.clone(),
            finished: fields.page_count == fields.read_page,
            name: fields.name,
            year: fields.year,
            author: fields.author,
            summary: fields.summary,
            publisher: fields.publisher,
            page_count: fields.page_count,
            read_page: fields.read_page,
            reading,
            inserted_at: now,
            updated_at: now,
        };
        books.insert(id, book.clone());
        Ok(book)
    }

    /// Summaries of the books matching `filter`, in insertion order
    pub fn list(&self, filter: &BookFilter) -> StoreResult<Vec<BookSummary>> {
        let books = self.read()?;
        Ok(books
            .values()
            .filter(|book| filter.matches(book))
            .map(BookSummary::from)
            .collect())
    }

    pub fn get(&self, id: &str) -> StoreResult<Option<Book>> {
        Ok(self.read()?.get(id).cloned())
    }

    /// Replace the editable fields of a book.
    ///
    /// `id`, `insertedAt` and `finished` are kept; `reading` is kept when
    /// `reading` is `None`. Returns `None` when no book has this id.
    pub fn update(
        &self,
        id: &str,
        fields: BookFields,
        reading: Option<bool>,
    ) -> StoreResult<Option<Book>> {
        let now = self.clock.now();
        let mut books = self.write()?;

        let Some(book) = books.get_mut(id) else {
            return Ok(None);
        };

        book.name = fields.name;
        book.year = fields.year;
        book.author = fields.author;
        book.summary = fields.summary;
        book.publisher = fields.publisher;
        book.page_count = fields.page_count;
        book.read_page = fields.read_page;
        if let Some(reading) = reading {
            book.reading = reading;
        }
        book.updated_at = now;

        Ok(Some(book.clone()))
    }

    /// Remove a book, keeping the order of the others
    pub fn remove(&self, id: &str) -> StoreResult<Option<Book>> {
        Ok(self.write()?.shift_remove(id))
    }

    pub fn len(&self) -> StoreResult<usize> {
        Ok(self.read()?.len())
    }

    pub fn is_empty(&self) -> StoreResult<bool> {
        Ok(self.read()?.is_empty())
    }

    /// Drop every book, returning how many were held
    pub fn clear(&self) -> StoreResult<usize> {
        let mut books = self.write()?;
        let count = books.len();
        books.clear();
        Ok(count)
    }

    /// Poison the lock by panicking while holding it.
    #[cfg(test)]
    pub(crate) fn poison(&self) {
        let books = Arc::clone(&self.books);
        let _ = std::thread::spawn(move || {
            let _guard = books.write().unwrap();
            panic!("poisoning book store");
        })
        .join();
    }
}

impl Default for BookStore {
    fn default() -> Self {
        Self::new()
    }
}

/// Random id of [`ID_LENGTH`] characters over a URL-safe alphabet
pub fn generate_id<R: Rng + ?Sized>(rng: &mut R) -> String {
    (0..ID_LENGTH)
        .map(|_| ID_ALPHABET[rng.gen_range(0..ID_ALPHABET.len())] as char)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::sync::atomic::{AtomicI64, Ordering};
    use time::macros::datetime;

    /// Advances one second per reading
    struct StepClock(AtomicI64);

    impl Clock for StepClock {
        fn now(&self) -> OffsetDateTime {
            let step = self.0.fetch_add(1, Ordering::SeqCst);
            datetime!(2024-03-01 12:00 UTC) + time::Duration::seconds(step)
        }
    }

    fn store() -> BookStore {
        BookStore::with_clock(Arc::new(StepClock(AtomicI64::new(0))))
    }

    fn fields(name: &str, page_count: u32, read_page: u32) -> BookFields {
        BookFields {
            name: name.to_string(),
            year: 2010,
            author: "Author".to_string(),
            summary: "Summary".to_string(),
            publisher: format!("{} Press", name),
            page_count,
            read_page,
        }
    }

    #[test]
    fn generated_ids_use_the_url_safe_alphabet() {
        let mut rng = rand::thread_rng();
        for _ in 0..100 {
            let id = generate_id(&mut rng);
            assert_eq!(id.len(), ID_LENGTH);
            assert!(id
                .bytes()
                .all(|b| b.is_ascii_alphanumeric() || b == b'_' || b == b'-'));
        }
    }

    #[test]
    fn insert_sets_server_fields() {
        let store = store();
        let book = store.insert(fields("A", 5, 5), true).unwrap();

        assert_eq!(book.id.len(), ID_LENGTH);
        assert!(book.finished);
        assert!(book.reading);
        assert_eq!(book.inserted_at, book.updated_at);
        assert_eq!(store.get(&book.id).unwrap(), Some(book));
    }

    #[test]
    fn unfinished_when_pages_remain() {
        let store = store();
        let book = store.insert(fields("A", 5, 2), false).unwrap();
        assert!(!book.finished);
    }

    #[test]
    fn ids_are_unique() {
        let store = store();
        let ids: HashSet<_> = (0..500)
            .map(|i| store.insert(fields(&i.to_string(), 1, 0), false).unwrap().id)
            .collect();
        assert_eq!(ids.len(), 500);
        assert_eq!(store.len().unwrap(), 500);
    }

    #[test]
    fn list_keeps_insertion_order_and_filters() {
        let store = store();
        let a = store.insert(fields("Alpha", 10, 1), true).unwrap();
        let b = store.insert(fields("Beta", 10, 10), false).unwrap();
        let c = store.insert(fields("Gamma", 10, 2), true).unwrap();

        let all = store.list(&BookFilter::All).unwrap();
        let ids: Vec<_> = all.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, vec![a.id.as_str(), b.id.as_str(), c.id.as_str()]);
        assert_eq!(all[1].publisher, "Beta Press");

        let reading = store.list(&BookFilter::Reading(true)).unwrap();
        assert_eq!(reading.len(), 2);
        assert_eq!(reading[0].name, "Alpha");
        assert_eq!(reading[1].name, "Gamma");

        let finished = store.list(&BookFilter::Finished(true)).unwrap();
        assert_eq!(finished.len(), 1);
        assert_eq!(finished[0].id, b.id);
    }

    #[test]
    fn update_replaces_fields_but_not_finished() {
        let store = store();
        let book = store.insert(fields("A", 5, 5), true).unwrap();

        let updated = store
            .update(&book.id, fields("B", 100, 10), None)
            .unwrap()
            .unwrap();

        assert_eq!(updated.id, book.id);
        assert_eq!(updated.name, "B");
        assert_eq!(updated.page_count, 100);
        assert_eq!(updated.inserted_at, book.inserted_at);
        assert!(updated.updated_at > book.updated_at);
        // finished reflects the page counts at creation time
        assert!(updated.finished);
        assert!(updated.reading);

        let updated = store
            .update(&book.id, fields("B", 100, 10), Some(false))
            .unwrap()
            .unwrap();
        assert!(!updated.reading);
    }

    #[test]
    fn update_unknown_id_changes_nothing() {
        let store = store();
        store.insert(fields("A", 5, 1), false).unwrap();
        assert!(store.update("missing", fields("B", 1, 1), None).unwrap().is_none());
        assert_eq!(store.list(&BookFilter::All).unwrap()[0].name, "A");
    }

    #[test]
    fn remove_preserves_order_of_the_rest() {
        let store = store();
        let a = store.insert(fields("A", 1, 0), false).unwrap();
        let b = store.insert(fields("B", 1, 0), false).unwrap();
        let c = store.insert(fields("C", 1, 0), false).unwrap();

        assert_eq!(store.remove(&b.id).unwrap().map(|book| book.name), Some("B".to_string()));
        assert!(store.remove(&b.id).unwrap().is_none());

        let names: Vec<_> = store
            .list(&BookFilter::All)
            .unwrap()
            .into_iter()
            .map(|s| s.name)
            .collect();
        assert_eq!(names, vec!["A", "C"]);
        assert!(store.get(&a.id).unwrap().is_some());
        assert!(store.get(&c.id).unwrap().is_some());
    }

    #[test]
    fn clear_reports_dropped_books() {
        let store = store();
        store.insert(fields("A", 1, 0), false).unwrap();
        store.insert(fields("B", 1, 0), false).unwrap();
        assert_eq!(store.clear().unwrap(), 2);
        assert!(store.is_empty().unwrap());
    }

    #[test]
    fn poisoned_lock_is_reported() {
        let store = store();
        store.poison();
        assert!(matches!(store.get("x"), Err(StoreError::Poisoned)));
        assert!(matches!(
            store.insert(fields("A", 1, 1), false),
            Err(StoreError::Poisoned)
        ));
    }
}
