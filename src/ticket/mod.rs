//! Loan ticket transfer format
//!
//! A loan request travels to the staff desk as a flat JSON payload inside
//! a QR code. This module owns that wire format: encoding a loan into the
//! payload and decoding scanned text back into a validated ticket. Partial
//! or malformed payloads are rejected outright, never partially accepted.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    models::loan::{parse_transport_date, LoanRequest, LoanStatus},
    models::user::MATRICULA_RE,
};

/// Validated loan ticket as carried by a QR code.
///
/// Field names on the wire are camelCase, matching the payload the student
/// app renders; dates are `YYYY-MM-DD` with no time component.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LoanTicket {
    pub id: Uuid,
    pub book_id: Uuid,
    pub student_id: Uuid,
    pub student_name: String,
    pub student_matricula: String,
    pub book_title: String,
    pub pickup_date: NaiveDate,
    pub return_date: NaiveDate,
    pub status: LoanStatus,
}

impl From<&LoanRequest> for LoanTicket {
    fn from(loan: &LoanRequest) -> Self {
        Self {
            id: loan.id,
            book_id: loan.book_id,
            student_id: loan.student_id,
            student_name: loan.student_name.clone(),
            student_matricula: loan.student_matricula.clone(),
            book_title: loan.book_title.clone(),
            pickup_date: loan.pickup_date,
            return_date: loan.return_date,
            status: loan.status,
        }
    }
}

/// Raw payload as scanned; every field optional so that validation can
/// name what is missing
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct RawTicket {
    id: Option<String>,
    book_id: Option<String>,
    student_id: Option<String>,
    student_name: Option<String>,
    student_matricula: Option<String>,
    book_title: Option<String>,
    pickup_date: Option<String>,
    return_date: Option<String>,
    status: Option<String>,
}

fn required(field: &Option<String>, name: &str) -> AppResult<()> {
    match field.as_deref() {
        Some(v) if !v.is_empty() => Ok(()),
        _ => Err(AppError::Validation(format!(
            "Ticket is missing required field '{}'",
            name
        ))),
    }
}

fn required_uuid(field: &Option<String>, name: &str) -> AppResult<Uuid> {
    required(field, name)?;
    let raw = field.as_deref().unwrap_or_default();
    Uuid::parse_str(raw)
        .map_err(|_| AppError::Validation(format!("Ticket field '{}' is not a valid id", name)))
}

fn required_date(field: &Option<String>, name: &str) -> AppResult<NaiveDate> {
    required(field, name)?;
    parse_transport_date(field.as_deref().unwrap_or_default())
}

/// Encode a loan request into its QR payload
pub fn encode_ticket(loan: &LoanRequest) -> AppResult<String> {
    serde_json::to_string(&LoanTicket::from(loan))
        .map_err(|e| AppError::Internal(format!("Failed to encode ticket: {}", e)))
}

/// Decode and validate a scanned QR payload.
///
/// At minimum the id, an 8-digit student matricula and the book title must
/// be present; dates and status must parse into their closed forms.
pub fn decode_ticket(payload: &str) -> AppResult<LoanTicket> {
    let raw: RawTicket = serde_json::from_str(payload)
        .map_err(|_| AppError::Validation("Ticket payload is not valid JSON".to_string()))?;

    let id = required_uuid(&raw.id, "id")?;
    let book_id = required_uuid(&raw.book_id, "bookId")?;
    let student_id = required_uuid(&raw.student_id, "studentId")?;

    required(&raw.student_name, "studentName")?;
    required(&raw.student_matricula, "studentMatricula")?;
    required(&raw.book_title, "bookTitle")?;

    let student_matricula = raw.student_matricula.unwrap_or_default();
    if !MATRICULA_RE.is_match(&student_matricula) {
        return Err(AppError::Validation(
            "Ticket field 'studentMatricula' must be exactly 8 digits".to_string(),
        ));
    }

    let pickup_date = required_date(&raw.pickup_date, "pickupDate")?;
    let return_date = required_date(&raw.return_date, "returnDate")?;

    required(&raw.status, "status")?;
    let status: LoanStatus = raw
        .status
        .as_deref()
        .unwrap_or_default()
        .parse()
        .map_err(AppError::Validation)?;

    Ok(LoanTicket {
        id,
        book_id,
        student_id,
        student_name: raw.student_name.unwrap_or_default(),
        student_matricula,
        book_title: raw.book_title.unwrap_or_default(),
        pickup_date,
        return_date,
        status,
    })
}
