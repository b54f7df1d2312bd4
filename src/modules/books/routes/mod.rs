//! HTTP handlers for the books module.

use axum::{
    extract::{Path, State},
    routing::get,
    Router,
};
use bookshelf_http::{ApiResponse, AppError, AppResult, Envelope, Params, Payload};

use super::models::{
    BookCreated, BookDetail, BookFilter, BookList, CreateBook, FieldError, ListQuery, UpdateBook,
};
use super::store::{BookStore, StoreError};

const BOOK_NOT_FOUND: &str = "book not found.";
const ID_NOT_FOUND: &str = "id not found";

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        AppError::Internal(err.into())
    }
}

/// Routes mounted under `/books`
pub fn router(store: BookStore) -> Router {
    Router::new()
        .route("/", get(list_books).post(create_book))
        .route(
            "/{book_id}",
            get(get_book).put(update_book).delete(delete_book),
        )
        .with_state(store)
}

fn invalid(err: FieldError, action: &str) -> AppError {
    let message = match err {
        FieldError::MissingName => format!("name is required to {} a book.", action),
        FieldError::ReadPageExceedsPageCount => "readPage must not exceed pageCount.".to_string(),
    };
    AppError::validation(err.field(), message)
}

/// POST /books
async fn create_book(
    State(store): State<BookStore>,
    Payload(payload): Payload<CreateBook>,
) -> AppResult<ApiResponse<BookCreated>> {
    let (fields, reading) = payload.validate().map_err(|e| invalid(e, "add"))?;

    let book = store.insert(fields, reading)?;
    tracing::info!(book_id = %book.id, finished = book.finished, "book added");

    Ok(ApiResponse::created(
        Envelope::success(BookCreated { book_id: book.id }).with_message("book added successfully"),
    ))
}

/// GET /books
async fn list_books(
    State(store): State<BookStore>,
    Params(pairs): Params<Vec<(String, String)>>,
) -> AppResult<ApiResponse<BookList>> {
    let query: ListQuery = pairs.into_iter().collect();
    let filter = BookFilter::from_query(&query);
    let books = store.list(&filter)?;
    tracing::debug!(?filter, count = books.len(), "listing books");

    Ok(ApiResponse::ok(Envelope::success(BookList { books })))
}

/// GET /books/{book_id}
async fn get_book(
    State(store): State<BookStore>,
    Path(book_id): Path<String>,
) -> AppResult<ApiResponse<BookDetail>> {
    let book = store
        .get(&book_id)?
        .ok_or_else(|| AppError::not_found(BOOK_NOT_FOUND))?;

    Ok(ApiResponse::ok(Envelope::success(BookDetail { book })))
}

/// PUT /books/{book_id}
///
/// The payload is validated before the id is looked up.
async fn update_book(
    State(store): State<BookStore>,
    Path(book_id): Path<String>,
    Payload(payload): Payload<UpdateBook>,
) -> AppResult<ApiResponse<()>> {
    let (fields, reading) = payload.validate().map_err(|e| invalid(e, "update"))?;

    let book = store
        .update(&book_id, fields, reading)?
        .ok_or_else(|| AppError::not_found(ID_NOT_FOUND))?;
    tracing::info!(book_id = %book.id, "book updated");

    Ok(ApiResponse::ok(Envelope::message("book updated successfully")))
}

/// DELETE /books/{book_id}
async fn delete_book(
    State(store): State<BookStore>,
    Path(book_id): Path<String>,
) -> AppResult<ApiResponse<()>> {
    let book = store
        .remove(&book_id)?
        .ok_or_else(|| AppError::not_found(ID_NOT_FOUND))?;
    tracing::info!(book_id = %book.id, "book deleted");

    Ok(ApiResponse::ok(Envelope::message("book deleted successfully")))
}
