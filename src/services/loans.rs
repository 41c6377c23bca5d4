//! Loan lifecycle service
//!
//! Owns the loan-request state machine and the availability side effects
//! that keep books consistent with loan state. Transitions are persisted
//! through conditional updates; the overdue/due-soon projection computed
//! from dates never writes back.

use chrono::{Local, NaiveDate};
use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    models::loan::{
        filter_by_derived_status, CreateLoanRequest, DerivedFilter, LoanDetails, LoanRequest,
        LoanStatus,
    },
    models::user::Role,
    repository::Repository,
    ticket,
};

/// Dashboard counters for books and loans
#[derive(Debug, serde::Serialize, utoipa::ToSchema)]
pub struct DashboardStats {
    pub books_total: i64,
    pub books_available: i64,
    pub loans_pending: i64,
    pub loans_active: i64,
    pub loans_overdue: i64,
    pub loans_due_soon: i64,
}

#[derive(Clone)]
pub struct LoansService {
    repository: Repository,
}

impl LoansService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    /// Today as a local calendar date; all due-date math runs on calendar
    /// days, never on instants
    fn today() -> NaiveDate {
        Local::now().date_naive()
    }

    /// List loans, optionally filtered by a derived-status predicate
    pub async fn list_loans(&self, filter: Option<DerivedFilter>) -> AppResult<Vec<LoanDetails>> {
        let today = Self::today();
        let loans = self.repository.loans.get_all().await?;

        let loans: Vec<LoanRequest> = match filter {
            Some(f) => filter_by_derived_status(loans, f, today).collect(),
            None => loans,
        };

        Ok(loans
            .into_iter()
            .map(|loan| LoanDetails::new(loan, today))
            .collect())
    }

    /// Get loans for a student
    pub async fn get_student_loans(&self, student_id: Uuid) -> AppResult<Vec<LoanDetails>> {
        // Verify user exists
        self.repository.users.get_by_id(student_id).await?;

        let today = Self::today();
        let loans = self.repository.loans.get_student_loans(student_id).await?;

        Ok(loans
            .into_iter()
            .map(|loan| LoanDetails::new(loan, today))
            .collect())
    }

    /// Create a loan request (student action).
    ///
    /// Snapshots the student and book display fields into the loan record,
    /// claims the book atomically, and returns the stored loan with its QR
    /// ticket payload.
    pub async fn create_loan_request(
        &self,
        request: CreateLoanRequest,
    ) -> AppResult<(LoanRequest, String)> {
        let today = Self::today();

        if request.pickup_date > request.return_date {
            return Err(AppError::Validation(
                "Pickup date must not be after return date".to_string(),
            ));
        }
        if request.pickup_date < today || request.return_date < today {
            return Err(AppError::Validation(
                "Loan dates must not be in the past".to_string(),
            ));
        }

        let student = self.repository.users.get_by_id(request.student_id).await?;
        if student.role != Role::Student {
            return Err(AppError::Validation(
                "Only students can request loans".to_string(),
            ));
        }
        let matricula = student.matricula.clone().ok_or_else(|| {
            AppError::Validation("Student account has no matricula".to_string())
        })?;

        let book = self.repository.books.get_by_id(request.book_id).await?;

        let loan = LoanRequest {
            id: Uuid::new_v4(),
            book_id: book.id,
            student_id: student.id,
            student_name: student.name.clone(),
            student_matricula: matricula,
            book_title: book.title.clone(),
            pickup_date: request.pickup_date,
            return_date: request.return_date,
            status: LoanStatus::Pending,
        };

        // Claims the book inside the same transaction; a stale `available`
        // read above cannot produce a double loan
        self.repository.loans.create(&loan).await?;

        let payload = ticket::encode_ticket(&loan)?;

        tracing::info!(
            loan_id = %loan.id,
            book_id = %loan.book_id,
            student = %loan.student_matricula,
            "Loan request created"
        );

        Ok((loan, payload))
    }

    /// Decode a scanned QR payload and resolve it against storage.
    ///
    /// The stored loan is authoritative; the ticket only identifies it.
    pub async fn scan_ticket(&self, payload: &str) -> AppResult<LoanDetails> {
        let ticket = ticket::decode_ticket(payload)?;
        let loan = self.repository.loans.get_by_id(ticket.id).await?;
        Ok(LoanDetails::new(loan, Self::today()))
    }

    /// Approve a pickup: PENDING -> ACTIVE. The book stays unavailable;
    /// it was claimed when the request was created.
    pub async fn approve_pickup(&self, loan_id: Uuid) -> AppResult<LoanRequest> {
        let loan = self
            .repository
            .loans
            .update_status(loan_id, &[LoanStatus::Pending], LoanStatus::Active)
            .await?;

        tracing::info!(loan_id = %loan.id, student = %loan.student_matricula, "Pickup approved");

        Ok(loan)
    }

    /// Record a return: ACTIVE or OVERDUE -> RETURNED, and release the
    /// book in the same call.
    pub async fn mark_returned(&self, loan_id: Uuid) -> AppResult<LoanRequest> {
        let loan = self
            .repository
            .loans
            .update_status(
                loan_id,
                &[LoanStatus::Active, LoanStatus::Overdue],
                LoanStatus::Returned,
            )
            .await?;

        self.release_book(loan.book_id).await?;

        tracing::info!(loan_id = %loan.id, book_id = %loan.book_id, "Loan returned");

        Ok(loan)
    }

    /// Persist an overdue state: ACTIVE -> OVERDUE. The copy is released
    /// for other borrowers; the overdue record stays open until returned.
    pub async fn mark_overdue(&self, loan_id: Uuid) -> AppResult<LoanRequest> {
        let loan = self
            .repository
            .loans
            .update_status(loan_id, &[LoanStatus::Active], LoanStatus::Overdue)
            .await?;

        self.release_book(loan.book_id).await?;

        tracing::info!(loan_id = %loan.id, book_id = %loan.book_id, "Loan marked overdue");

        Ok(loan)
    }

    /// Release a book back to the shelf. Exposed on its own so a manual
    /// restock flow can invoke it independently of any transition.
    pub async fn release_book(&self, book_id: Uuid) -> AppResult<()> {
        self.repository.books.set_available(book_id, true).await
    }

    /// Counters for the staff dashboard
    pub async fn dashboard_stats(&self) -> AppResult<DashboardStats> {
        let today = Self::today();

        let (books_total, books_available) = self.repository.books.count().await?;
        let loans_pending = self
            .repository
            .loans
            .count_with_status(LoanStatus::Pending)
            .await?;
        let loans_active = self
            .repository
            .loans
            .count_with_status(LoanStatus::Active)
            .await?;

        // Overdue and due-soon are projections, so count them off the
        // loaded list rather than in SQL
        let loans = self.repository.loans.get_all().await?;
        let loans_overdue = loans
            .iter()
            .filter(|l| DerivedFilter::Overdue.matches(l, today))
            .count() as i64;
        let loans_due_soon = loans
            .iter()
            .filter(|l| DerivedFilter::DueSoon.matches(l, today))
            .count() as i64;

        Ok(DashboardStats {
            books_total,
            books_available,
            loans_pending,
            loans_active,
            loans_overdue,
            loans_due_soon,
        })
    }

    /// Whether the backing store answers; used by the readiness probe
    pub async fn backend_ready(&self) -> AppResult<()> {
        self.repository.ping().await
    }
}
