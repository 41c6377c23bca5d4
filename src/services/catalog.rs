//! Catalog (books) service

use uuid::Uuid;
use validator::Validate;

use crate::{
    error::{AppError, AppResult},
    models::book::{Book, BookQuery, CreateBook, UpdateBook},
    repository::Repository,
};

#[derive(Clone)]
pub struct CatalogService {
    repository: Repository,
}

impl CatalogService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    /// List books with optional filters
    pub async fn list_books(&self, query: &BookQuery) -> AppResult<Vec<Book>> {
        self.repository.books.get_all(query).await
    }

    /// Get a book by ID
    pub async fn get_book(&self, id: Uuid) -> AppResult<Book> {
        self.repository.books.get_by_id(id).await
    }

    /// Add a book to the catalog (staff action). New books start available.
    pub async fn create_book(&self, request: CreateBook) -> AppResult<Book> {
        request
            .validate()
            .map_err(|e| AppError::Validation(e.to_string()))?;

        let book = Book {
            id: Uuid::new_v4(),
            title: request.title,
            author: request.author,
            description: request.description,
            cover_url: request.cover_url,
            available: true,
        };

        self.repository.books.create(&book).await?;

        tracing::info!(book_id = %book.id, title = %book.title, "Book created");

        Ok(book)
    }

    /// Edit book display fields (staff action)
    pub async fn update_book(&self, id: Uuid, update: UpdateBook) -> AppResult<Book> {
        update
            .validate()
            .map_err(|e| AppError::Validation(e.to_string()))?;

        self.repository.books.update(id, &update).await
    }
}
