//! Books repository for database operations

use sqlx::{Pool, Postgres};
use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    models::book::{AvailabilityFilter, Book, BookQuery, UpdateBook},
};

#[derive(Clone)]
pub struct BooksRepository {
    pool: Pool<Postgres>,
}

impl BooksRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Get book by ID
    pub async fn get_by_id(&self, id: Uuid) -> AppResult<Book> {
        sqlx::query_as::<_, Book>("SELECT * FROM books WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Book with id {} not found", id)))
    }

    /// List books with optional author and availability filters
    pub async fn get_all(&self, query: &BookQuery) -> AppResult<Vec<Book>> {
        let available: Option<bool> = query.availability.and_then(|f| match f {
            AvailabilityFilter::All => None,
            AvailabilityFilter::Available => Some(true),
            AvailabilityFilter::Unavailable => Some(false),
        });

        let books = sqlx::query_as::<_, Book>(
            r#"
            SELECT * FROM books
            WHERE ($1::text IS NULL OR author ILIKE '%' || $1 || '%')
              AND ($2::boolean IS NULL OR available = $2)
            ORDER BY title
            "#,
        )
        .bind(query.author.as_deref())
        .bind(available)
        .fetch_all(&self.pool)
        .await?;

        Ok(books)
    }

    /// Insert a new book
    pub async fn create(&self, book: &Book) -> AppResult<()> {
        sqlx::query(
            r#"
            INSERT INTO books (id, title, author, description, cover_url, available)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(book.id)
        .bind(&book.title)
        .bind(&book.author)
        .bind(&book.description)
        .bind(&book.cover_url)
        .bind(book.available)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Update book fields (title, author, description, cover).
    /// Availability is not touched here; the loan engine owns it.
    pub async fn update(&self, id: Uuid, update: &UpdateBook) -> AppResult<Book> {
        sqlx::query_as::<_, Book>(
            r#"
            UPDATE books
            SET title = COALESCE($2, title),
                author = COALESCE($3, author),
                description = COALESCE($4, description),
                cover_url = COALESCE($5, cover_url),
                modif_date = now()
            WHERE id = $1
            RETURNING id, title, author, description, cover_url, available
            "#,
        )
        .bind(id)
        .bind(update.title.as_deref())
        .bind(update.author.as_deref())
        .bind(update.description.as_deref())
        .bind(update.cover_url.as_deref())
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Book with id {} not found", id)))
    }

    /// Set availability unconditionally (restock / release)
    pub async fn set_available(&self, id: Uuid, available: bool) -> AppResult<()> {
        let result = sqlx::query("UPDATE books SET available = $2 WHERE id = $1")
            .bind(id)
            .bind(available)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Book with id {} not found", id)));
        }

        Ok(())
    }

    /// Count total and available books
    pub async fn count(&self) -> AppResult<(i64, i64)> {
        let row: (i64, i64) = sqlx::query_as(
            "SELECT COUNT(*), COUNT(*) FILTER (WHERE available) FROM books",
        )
        .fetch_one(&self.pool)
        .await?;

        Ok(row)
    }
}
