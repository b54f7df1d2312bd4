pub mod models;
pub mod routes;
pub mod store;

use async_trait::async_trait;
use axum::Router;
use bookshelf_kernel::{InitCtx, Module};
use serde_json::json;

use store::BookStore;

/// Books module: owns the catalog store and serves the `/books` endpoints
pub struct BooksModule {
    store: BookStore,
}

impl BooksModule {
    pub fn new() -> Self {
        Self::with_store(BookStore::new())
    }

    /// Build the module around an existing store
    pub fn with_store(store: BookStore) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &BookStore {
        &self.store
    }
}

impl Default for BooksModule {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Module for BooksModule {
    fn name(&self) -> &'static str {
        "books"
    }

    async fn init(&self, ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        tracing::info!(
            module = self.name(),
            environment = ?ctx.settings.environment,
            "books module initialized"
        );
        Ok(())
    }

    fn routes(&self) -> Router {
        routes::router(self.store.clone())
    }

    fn openapi(&self) -> Option<serde_json::Value> {
        Some(openapi_fragment())
    }

    async fn start(&self, _ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        let books = self.store.len()?;
        tracing::info!(module = self.name(), books, "books module started");
        Ok(())
    }

    async fn stop(&self) -> anyhow::Result<()> {
        let dropped = self.store.clear()?;
        tracing::info!(module = self.name(), dropped, "books module stopped");
        Ok(())
    }
}

fn fail_response(description: &str) -> serde_json::Value {
    json!({
        "description": description,
        "content": {
            "application/json": {
                "schema": { "$ref": "#/components/schemas/FailResponse" }
            }
        }
    })
}

fn success_response(description: &str, data_schema: &str) -> serde_json::Value {
    json!({
        "description": description,
        "content": {
            "application/json": {
                "schema": {
                    "type": "object",
                    "properties": {
                        "status": { "type": "string", "enum": ["success"] },
                        "message": { "type": "string" },
                        "data": { "$ref": format!("#/components/schemas/{}", data_schema) }
                    },
                    "required": ["status"]
                }
            }
        }
    })
}

fn message_response(description: &str) -> serde_json::Value {
    json!({
        "description": description,
        "content": {
            "application/json": {
                "schema": {
                    "type": "object",
                    "properties": {
                        "status": { "type": "string", "enum": ["success"] },
                        "message": { "type": "string" }
                    },
                    "required": ["status", "message"]
                }
            }
        }
    })
}

fn book_id_param() -> serde_json::Value {
    json!({
        "name": "bookId",
        "in": "path",
        "required": true,
        "schema": { "type": "string" }
    })
}

fn flag_param(name: &str, description: &str) -> serde_json::Value {
    json!({
        "name": name,
        "in": "query",
        "required": false,
        "description": description,
        "schema": { "type": "string", "enum": ["0", "1"] }
    })
}

fn payload_body(schema: &str) -> serde_json::Value {
    json!({
        "required": true,
        "content": {
            "application/json": {
                "schema": { "$ref": format!("#/components/schemas/{}", schema) }
            }
        }
    })
}

fn openapi_fragment() -> serde_json::Value {
    json!({
        "paths": {
            "": {
                "get": {
                    "summary": "List books",
                    "description": "Applies at most one filter: reading, then finished, then name.",
                    "tags": ["Books"],
                    "parameters": [
                        flag_param("reading", "1 for books being read, 0 for the rest"),
                        flag_param("finished", "1 for finished books, 0 for the rest"),
                        {
                            "name": "name",
                            "in": "query",
                            "required": false,
                            "description": "Case-insensitive substring of the book name",
                            "schema": { "type": "string" }
                        }
                    ],
                    "responses": {
                        "200": success_response("Matching books", "BookList"),
                        "500": fail_response("Internal server error")
                    }
                },
                "post": {
                    "summary": "Add a book",
                    "tags": ["Books"],
                    "requestBody": payload_body("CreateBook"),
                    "responses": {
                        "201": success_response("Book added", "BookCreated"),
                        "400": fail_response("Missing name, readPage above pageCount or malformed payload"),
                        "500": fail_response("Internal server error")
                    }
                }
            },
            "/{bookId}": {
                "get": {
                    "summary": "Get a book",
                    "tags": ["Books"],
                    "parameters": [book_id_param()],
                    "responses": {
                        "200": success_response("The book", "BookDetail"),
                        "404": fail_response("Book not found")
                    }
                },
                "put": {
                    "summary": "Update a book",
                    "tags": ["Books"],
                    "parameters": [book_id_param()],
                    "requestBody": payload_body("UpdateBook"),
                    "responses": {
                        "200": message_response("Book updated"),
                        "400": fail_response("Missing name, readPage above pageCount or malformed payload"),
                        "404": fail_response("Id not found")
                    }
                },
                "delete": {
                    "summary": "Delete a book",
                    "tags": ["Books"],
                    "parameters": [book_id_param()],
                    "responses": {
                        "200": message_response("Book deleted"),
                        "404": fail_response("Id not found")
                    }
                }
            }
        },
        "components": {
            "schemas": {
                "Book": {
                    "type": "object",
                    "properties": {
                        "id": { "type": "string", "description": "16-character generated identifier" },
                        "name": { "type": "string" },
                        "year": { "type": "integer" },
                        "author": { "type": "string" },
                        "summary": { "type": "string" },
                        "publisher": { "type": "string" },
                        "pageCount": { "type": "integer", "minimum": 0 },
                        "readPage": { "type": "integer", "minimum": 0 },
                        "finished": { "type": "boolean", "description": "readPage == pageCount when the book was added" },
                        "reading": { "type": "boolean" },
                        "insertedAt": { "type": "string", "format": "date-time" },
                        "updatedAt": { "type": "string", "format": "date-time" }
                    },
                    "required": [
                        "id", "name", "year", "author", "summary", "publisher", "pageCount",
                        "readPage", "finished", "reading", "insertedAt", "updatedAt"
                    ]
                },
                "BookSummary": {
                    "type": "object",
                    "properties": {
                        "id": { "type": "string" },
                        "name": { "type": "string" },
                        "publisher": { "type": "string" }
                    },
                    "required": ["id", "name", "publisher"]
                },
                "BookList": {
                    "type": "object",
                    "properties": {
                        "books": {
                            "type": "array",
                            "items": { "$ref": "#/components/schemas/BookSummary" }
                        }
                    },
                    "required": ["books"]
                },
                "BookDetail": {
                    "type": "object",
                    "properties": {
                        "book": { "$ref": "#/components/schemas/Book" }
                    },
                    "required": ["book"]
                },
                "BookCreated": {
                    "type": "object",
                    "properties": {
                        "bookId": { "type": "string" }
                    },
                    "required": ["bookId"]
                },
                "CreateBook": {
                    "type": "object",
                    "properties": {
                        "name": { "type": "string", "minLength": 1 },
                        "year": { "type": "integer" },
                        "author": { "type": "string" },
                        "summary": { "type": "string" },
                        "publisher": { "type": "string" },
                        "pageCount": { "type": "integer", "minimum": 0 },
                        "readPage": { "type": "integer", "minimum": 0 },
                        "reading": { "type": "boolean" }
                    },
                    "required": ["name"]
                },
                "UpdateBook": {
                    "type": "object",
                    "properties": {
                        "name": { "type": "string", "minLength": 1 },
                        "year": { "type": "integer" },
                        "author": { "type": "string" },
                        "summary": { "type": "string" },
                        "publisher": { "type": "string" },
                        "pageCount": { "type": "integer", "minimum": 0 },
                        "readPage": { "type": "integer", "minimum": 0 },
                        "reading": { "type": "boolean", "description": "Kept unchanged when omitted" }
                    },
                    "required": ["name"]
                }
            }
        }
    })
}

/// Create a new instance of the books module
pub fn create_module() -> std::sync::Arc<dyn Module> {
    std::sync::Arc::new(BooksModule::new())
}
