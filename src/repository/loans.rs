//! Loans repository for database operations
//!
//! Lifecycle writes are conditional updates so that each read-modify-write
//! is a single atomic statement against the store: two racing transitions
//! on the same loan cannot both succeed, and a loan request cannot claim a
//! book another request just took.

use sqlx::{Pool, Postgres};
use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    models::loan::{LoanRequest, LoanStatus},
};

#[derive(Clone)]
pub struct LoansRepository {
    pool: Pool<Postgres>,
}

impl LoansRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Get loan by ID
    pub async fn get_by_id(&self, id: Uuid) -> AppResult<LoanRequest> {
        sqlx::query_as::<_, LoanRequest>("SELECT * FROM loans WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Loan with id {} not found", id)))
    }

    /// Get all loans
    pub async fn get_all(&self) -> AppResult<Vec<LoanRequest>> {
        let loans = sqlx::query_as::<_, LoanRequest>("SELECT * FROM loans ORDER BY return_date")
            .fetch_all(&self.pool)
            .await?;

        Ok(loans)
    }

    /// Get loans for a student
    pub async fn get_student_loans(&self, student_id: Uuid) -> AppResult<Vec<LoanRequest>> {
        let loans = sqlx::query_as::<_, LoanRequest>(
            "SELECT * FROM loans WHERE student_id = $1 ORDER BY return_date",
        )
        .bind(student_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(loans)
    }

    /// Create a loan request, claiming the referenced book in the same
    /// transaction. Fails with a conflict if the book is not available.
    pub async fn create(&self, loan: &LoanRequest) -> AppResult<()> {
        let mut tx = self.pool.begin().await?;

        let claimed = sqlx::query(
            "UPDATE books SET available = FALSE WHERE id = $1 AND available = TRUE",
        )
        .bind(loan.book_id)
        .execute(&mut *tx)
        .await?;

        if claimed.rows_affected() == 0 {
            // Zero rows: either the book is gone or someone holds it
            let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM books WHERE id = $1)")
                .bind(loan.book_id)
                .fetch_one(&mut *tx)
                .await?;

            return Err(if exists {
                AppError::Conflict("Book is not available".to_string())
            } else {
                AppError::NotFound(format!("Book with id {} not found", loan.book_id))
            });
        }

        sqlx::query(
            r#"
            INSERT INTO loans (
                id, book_id, student_id, student_name, student_matricula,
                book_title, pickup_date, return_date, status
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            "#,
        )
        .bind(loan.id)
        .bind(loan.book_id)
        .bind(loan.student_id)
        .bind(&loan.student_name)
        .bind(&loan.student_matricula)
        .bind(&loan.book_title)
        .bind(loan.pickup_date)
        .bind(loan.return_date)
        .bind(loan.status)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(())
    }

    /// Transition a loan from one of the expected states to `to`,
    /// compare-and-set style. Zero rows affected is disambiguated by
    /// re-reading the loan: unknown id is `NotFound`, a state that moved
    /// on is `InvalidTransition`.
    pub async fn update_status(
        &self,
        id: Uuid,
        expected: &[LoanStatus],
        to: LoanStatus,
    ) -> AppResult<LoanRequest> {
        let expected_strs: Vec<String> =
            expected.iter().map(|s| s.as_str().to_string()).collect();

        let updated = sqlx::query_as::<_, LoanRequest>(
            r#"
            UPDATE loans SET status = $3
            WHERE id = $1 AND status = ANY($2)
            RETURNING id, book_id, student_id, student_name, student_matricula,
                      book_title, pickup_date, return_date, status
            "#,
        )
        .bind(id)
        .bind(&expected_strs)
        .bind(to)
        .fetch_optional(&self.pool)
        .await?;

        match updated {
            Some(loan) => Ok(loan),
            None => {
                let current = self.get_by_id(id).await?;
                Err(AppError::InvalidTransition(format!(
                    "Cannot move loan {} from {} to {}",
                    id, current.status, to
                )))
            }
        }
    }

    /// Count loans currently in the given persisted state
    pub async fn count_with_status(&self, status: LoanStatus) -> AppResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM loans WHERE status = $1")
            .bind(status)
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}
