//! Loan management endpoints

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    error::AppResult,
    models::loan::{CreateLoanRequest, LoanDetails, LoanQuery, LoanRequest},
};

/// Response for a freshly created loan request: the stored loan plus the
/// payload the student app renders as a QR code
#[derive(Serialize, ToSchema)]
pub struct CreateLoanResponse {
    pub loan: LoanRequest,
    /// Flat JSON ticket payload for the QR code
    pub ticket: String,
}

/// Scan request: raw text decoded from a QR code
#[derive(Deserialize, ToSchema)]
pub struct ScanRequest {
    pub payload: String,
}

/// Response for a staff transition on a loan
#[derive(Serialize, ToSchema)]
pub struct TransitionResponse {
    /// New persisted status
    pub status: String,
    /// Loan after the transition
    pub loan: LoanRequest,
}

/// List loans, optionally filtered by derived status
#[utoipa::path(
    get,
    path = "/loans",
    tag = "loans",
    params(LoanQuery),
    responses(
        (status = 200, description = "Loans with display status", body = Vec<LoanDetails>)
    )
)]
pub async fn list_loans(
    State(state): State<crate::AppState>,
    Query(query): Query<LoanQuery>,
) -> AppResult<Json<Vec<LoanDetails>>> {
    let loans = state.services.loans.list_loans(query.status).await?;
    Ok(Json(loans))
}

/// Get loans for a specific student
#[utoipa::path(
    get,
    path = "/users/{id}/loans",
    tag = "loans",
    params(
        ("id" = Uuid, Path, description = "Student ID")
    ),
    responses(
        (status = 200, description = "Student's loans", body = Vec<LoanDetails>),
        (status = 404, description = "User not found")
    )
)]
pub async fn get_student_loans(
    State(state): State<crate::AppState>,
    Path(student_id): Path<Uuid>,
) -> AppResult<Json<Vec<LoanDetails>>> {
    let loans = state.services.loans.get_student_loans(student_id).await?;
    Ok(Json(loans))
}

/// Create a loan request (student action)
#[utoipa::path(
    post,
    path = "/loans",
    tag = "loans",
    request_body = CreateLoanRequest,
    responses(
        (status = 201, description = "Loan request created", body = CreateLoanResponse),
        (status = 400, description = "Invalid dates or requester"),
        (status = 404, description = "Book or student not found"),
        (status = 409, description = "Book is not available")
    )
)]
pub async fn create_loan(
    State(state): State<crate::AppState>,
    Json(request): Json<CreateLoanRequest>,
) -> AppResult<(StatusCode, Json<CreateLoanResponse>)> {
    let (loan, ticket) = state.services.loans.create_loan_request(request).await?;
    Ok((StatusCode::CREATED, Json(CreateLoanResponse { loan, ticket })))
}

/// Decode a scanned QR ticket and resolve the loan it references
#[utoipa::path(
    post,
    path = "/loans/scan",
    tag = "loans",
    request_body = ScanRequest,
    responses(
        (status = 200, description = "Valid ticket", body = LoanDetails),
        (status = 400, description = "Malformed ticket payload"),
        (status = 404, description = "Loan not found")
    )
)]
pub async fn scan_ticket(
    State(state): State<crate::AppState>,
    Json(request): Json<ScanRequest>,
) -> AppResult<Json<LoanDetails>> {
    let loan = state.services.loans.scan_ticket(&request.payload).await?;
    Ok(Json(loan))
}

/// Approve a pickup (PENDING -> ACTIVE)
#[utoipa::path(
    post,
    path = "/loans/{id}/approve",
    tag = "loans",
    params(
        ("id" = Uuid, Path, description = "Loan ID")
    ),
    responses(
        (status = 200, description = "Pickup approved", body = TransitionResponse),
        (status = 404, description = "Loan not found"),
        (status = 409, description = "Loan is not pending")
    )
)]
pub async fn approve_pickup(
    State(state): State<crate::AppState>,
    Path(loan_id): Path<Uuid>,
) -> AppResult<Json<TransitionResponse>> {
    let loan = state.services.loans.approve_pickup(loan_id).await?;

    Ok(Json(TransitionResponse {
        status: "active".to_string(),
        loan,
    }))
}

/// Record a return (ACTIVE/OVERDUE -> RETURNED, releases the book)
#[utoipa::path(
    post,
    path = "/loans/{id}/return",
    tag = "loans",
    params(
        ("id" = Uuid, Path, description = "Loan ID")
    ),
    responses(
        (status = 200, description = "Book returned", body = TransitionResponse),
        (status = 404, description = "Loan not found"),
        (status = 409, description = "Loan already returned")
    )
)]
pub async fn return_loan(
    State(state): State<crate::AppState>,
    Path(loan_id): Path<Uuid>,
) -> AppResult<Json<TransitionResponse>> {
    let loan = state.services.loans.mark_returned(loan_id).await?;

    Ok(Json(TransitionResponse {
        status: "returned".to_string(),
        loan,
    }))
}

/// Persist an overdue state (ACTIVE -> OVERDUE, releases the book)
#[utoipa::path(
    post,
    path = "/loans/{id}/overdue",
    tag = "loans",
    params(
        ("id" = Uuid, Path, description = "Loan ID")
    ),
    responses(
        (status = 200, description = "Loan marked overdue", body = TransitionResponse),
        (status = 404, description = "Loan not found"),
        (status = 409, description = "Loan is not active")
    )
)]
pub async fn mark_overdue(
    State(state): State<crate::AppState>,
    Path(loan_id): Path<Uuid>,
) -> AppResult<Json<TransitionResponse>> {
    let loan = state.services.loans.mark_overdue(loan_id).await?;

    Ok(Json(TransitionResponse {
        status: "overdue".to_string(),
        loan,
    }))
}
