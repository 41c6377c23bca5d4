//! Loan request model, lifecycle states and derived due-date status

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::{Decode, Encode, FromRow, Postgres};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use crate::error::{AppError, AppResult};

/// Persisted lifecycle state of a loan request.
///
/// `Returned` is terminal. `Overdue` here is the staff-recorded state; the
/// read-time overdue flag computed from dates lives in [`DisplayStatus`]
/// and is never written back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "UPPERCASE")]
pub enum LoanStatus {
    Pending,
    Active,
    Returned,
    Overdue,
}

impl LoanStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            LoanStatus::Pending => "PENDING",
            LoanStatus::Active => "ACTIVE",
            LoanStatus::Returned => "RETURNED",
            LoanStatus::Overdue => "OVERDUE",
        }
    }

    /// Whether the loan still holds the book (keeps it unavailable)
    pub fn is_open(&self) -> bool {
        !matches!(self, LoanStatus::Returned)
    }

    /// Allowed state-machine edges. Everything else is an invalid
    /// transition; once `Returned`, no edge leaves the state.
    pub fn can_transition_to(&self, next: LoanStatus) -> bool {
        matches!(
            (self, next),
            (LoanStatus::Pending, LoanStatus::Active)
                | (LoanStatus::Active, LoanStatus::Returned)
                | (LoanStatus::Active, LoanStatus::Overdue)
                | (LoanStatus::Overdue, LoanStatus::Returned)
        )
    }
}

impl std::fmt::Display for LoanStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for LoanStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PENDING" => Ok(LoanStatus::Pending),
            "ACTIVE" => Ok(LoanStatus::Active),
            "RETURNED" => Ok(LoanStatus::Returned),
            "OVERDUE" => Ok(LoanStatus::Overdue),
            _ => Err(format!("Invalid loan status: {}", s)),
        }
    }
}

// Stored as TEXT; SQLx conversions mirror the string form
impl sqlx::Type<Postgres> for LoanStatus {
    fn type_info() -> sqlx::postgres::PgTypeInfo {
        <String as sqlx::Type<Postgres>>::type_info()
    }
}

impl<'r> Decode<'r, Postgres> for LoanStatus {
    fn decode(value: sqlx::postgres::PgValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        let s: String = Decode::<Postgres>::decode(value)?;
        s.parse().map_err(|e: String| e.into())
    }
}

impl Encode<'_, Postgres> for LoanStatus {
    fn encode_by_ref(&self, buf: &mut sqlx::postgres::PgArgumentBuffer) -> sqlx::encode::IsNull {
        <String as Encode<Postgres>>::encode(self.as_str().to_string(), buf)
    }
}

/// Loan request model from database.
///
/// `student_name`, `student_matricula` and `book_title` are snapshots taken
/// when the request is created; later edits to the user or book must not
/// rewrite historical loans.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct LoanRequest {
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

/// Create loan request (student action)
#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateLoanRequest {
    pub book_id: Uuid,
    pub student_id: Uuid,
    pub pickup_date: NaiveDate,
    pub return_date: NaiveDate,
}

/// Read-time projection of a loan against today's calendar date.
///
/// `diff_days` is the whole-day distance to the return date: 0 means due
/// today, negative means past due. A loan is never both overdue and
/// due-soon.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
pub struct DisplayStatus {
    pub is_overdue: bool,
    pub is_due_soon: bool,
    pub diff_days: i64,
}

/// Number of days ahead within which an active loan counts as due-soon,
/// inclusive of "due today"
pub const DUE_SOON_WINDOW_DAYS: i64 = 3;

/// Compute the display status of a loan for a given calendar date.
///
/// Pure and side-effect free; used for display and filtering only. The
/// persisted `OVERDUE` state always shows as overdue, an `ACTIVE` loan
/// shows as overdue once its return date has passed.
pub fn compute_display_status(loan: &LoanRequest, today: NaiveDate) -> DisplayStatus {
    let diff_days = (loan.return_date - today).num_days();
    let is_overdue = loan.status == LoanStatus::Overdue
        || (loan.status == LoanStatus::Active && diff_days < 0);
    let is_due_soon = loan.status == LoanStatus::Active
        && !is_overdue
        && (0..=DUE_SOON_WINDOW_DAYS).contains(&diff_days);

    DisplayStatus {
        is_overdue,
        is_due_soon,
        diff_days,
    }
}

/// Derived-status predicates for loan listings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum DerivedFilter {
    Pending,
    Active,
    Overdue,
    DueSoon,
    Returned,
}

impl DerivedFilter {
    pub fn matches(&self, loan: &LoanRequest, today: NaiveDate) -> bool {
        match self {
            DerivedFilter::Pending => loan.status == LoanStatus::Pending,
            DerivedFilter::Active => loan.status == LoanStatus::Active,
            DerivedFilter::Returned => loan.status == LoanStatus::Returned,
            DerivedFilter::Overdue => compute_display_status(loan, today).is_overdue,
            DerivedFilter::DueSoon => compute_display_status(loan, today).is_due_soon,
        }
    }
}

/// Lazily filter loans by a derived-status predicate
pub fn filter_by_derived_status<I>(
    loans: I,
    filter: DerivedFilter,
    today: NaiveDate,
) -> impl Iterator<Item = LoanRequest>
where
    I: IntoIterator<Item = LoanRequest>,
{
    loans
        .into_iter()
        .filter(move |loan| filter.matches(loan, today))
}

/// Loan query parameters
#[derive(Debug, Deserialize, IntoParams, ToSchema)]
pub struct LoanQuery {
    /// Derived-status filter (pending, active, overdue, due_soon, returned)
    pub status: Option<DerivedFilter>,
}

/// Loan with its display status, as returned by listing endpoints
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct LoanDetails {
    #[serde(flatten)]
    pub loan: LoanRequest,
    pub is_overdue: bool,
    pub is_due_soon: bool,
    pub diff_days: i64,
}

impl LoanDetails {
    pub fn new(loan: LoanRequest, today: NaiveDate) -> Self {
        let display = compute_display_status(&loan, today);
        Self {
            loan,
            is_overdue: display.is_overdue,
            is_due_soon: display.is_due_soon,
            diff_days: display.diff_days,
        }
    }
}

/// Parse a transport date in strict `YYYY-MM-DD` form.
///
/// The wire format carries no time or timezone; the string is decomposed
/// into calendar components rather than handed to a generic date-time
/// parser, so a stored date never shifts by a day across timezones.
pub fn parse_transport_date(s: &str) -> AppResult<NaiveDate> {
    let bytes = s.as_bytes();
    let well_formed = bytes.len() == 10
        && bytes[4] == b'-'
        && bytes[7] == b'-'
        && bytes
            .iter()
            .enumerate()
            .all(|(i, b)| i == 4 || i == 7 || b.is_ascii_digit());

    if !well_formed {
        return Err(AppError::Validation(format!(
            "Invalid date '{}', expected YYYY-MM-DD",
            s
        )));
    }

    let year: i32 = s[0..4].parse().unwrap_or(0);
    let month: u32 = s[5..7].parse().unwrap_or(0);
    let day: u32 = s[8..10].parse().unwrap_or(0);

    NaiveDate::from_ymd_opt(year, month, day)
        .ok_or_else(|| AppError::Validation(format!("Invalid calendar date '{}'", s)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn loan_with(status: LoanStatus, return_date: NaiveDate) -> LoanRequest {
        LoanRequest {
            id: Uuid::nil(),
            book_id: Uuid::nil(),
            student_id: Uuid::nil(),
            student_name: "Ana Torres".to_string(),
            student_matricula: "12345678".to_string(),
            book_title: "Cien años de soledad".to_string(),
            pickup_date: return_date - chrono::Duration::days(7),
            return_date,
            status,
        }
    }

    #[test]
    fn transition_table() {
        assert!(LoanStatus::Pending.can_transition_to(LoanStatus::Active));
        assert!(LoanStatus::Active.can_transition_to(LoanStatus::Returned));
        assert!(LoanStatus::Active.can_transition_to(LoanStatus::Overdue));
        assert!(LoanStatus::Overdue.can_transition_to(LoanStatus::Returned));

        // No edge back to pending, no skipping pending approval
        assert!(!LoanStatus::Active.can_transition_to(LoanStatus::Pending));
        assert!(!LoanStatus::Pending.can_transition_to(LoanStatus::Returned));
        assert!(!LoanStatus::Pending.can_transition_to(LoanStatus::Overdue));
    }

    #[test]
    fn returned_is_terminal() {
        for next in [
            LoanStatus::Pending,
            LoanStatus::Active,
            LoanStatus::Returned,
            LoanStatus::Overdue,
        ] {
            assert!(!LoanStatus::Returned.can_transition_to(next));
        }
        assert!(!LoanStatus::Returned.is_open());
    }

    #[test]
    fn due_today_is_due_soon() {
        // today = 2024-06-10, return = 2024-06-10 -> diff 0, due soon
        let today = date(2024, 6, 10);
        let loan = loan_with(LoanStatus::Active, date(2024, 6, 10));
        let status = compute_display_status(&loan, today);
        assert_eq!(status.diff_days, 0);
        assert!(!status.is_overdue);
        assert!(status.is_due_soon);
    }

    #[test]
    fn past_return_date_is_overdue() {
        // today = 2024-06-10, return = 2024-06-07 -> diff -3, overdue
        let today = date(2024, 6, 10);
        let loan = loan_with(LoanStatus::Active, date(2024, 6, 7));
        let status = compute_display_status(&loan, today);
        assert_eq!(status.diff_days, -3);
        assert!(status.is_overdue);
        assert!(!status.is_due_soon);
    }

    #[test]
    fn due_soon_window_boundaries() {
        let today = date(2024, 6, 10);

        let yesterday = compute_display_status(&loan_with(LoanStatus::Active, date(2024, 6, 9)), today);
        assert_eq!(yesterday.diff_days, -1);
        assert!(yesterday.is_overdue);

        let in_three = compute_display_status(&loan_with(LoanStatus::Active, date(2024, 6, 13)), today);
        assert_eq!(in_three.diff_days, 3);
        assert!(in_three.is_due_soon);

        let in_four = compute_display_status(&loan_with(LoanStatus::Active, date(2024, 6, 14)), today);
        assert_eq!(in_four.diff_days, 4);
        assert!(!in_four.is_due_soon);
        assert!(!in_four.is_overdue);
    }

    #[test]
    fn overdue_and_due_soon_are_exclusive() {
        let today = date(2024, 6, 10);
        for offset in -10..=10 {
            for status in [
                LoanStatus::Pending,
                LoanStatus::Active,
                LoanStatus::Returned,
                LoanStatus::Overdue,
            ] {
                let loan = loan_with(status, today + chrono::Duration::days(offset));
                let display = compute_display_status(&loan, today);
                assert!(
                    !(display.is_overdue && display.is_due_soon),
                    "status {:?} offset {} flagged both overdue and due soon",
                    status,
                    offset
                );
            }
        }
    }

    #[test]
    fn persisted_overdue_always_shows_overdue() {
        let today = date(2024, 6, 10);
        // Even with a return date in the future, the recorded state wins
        let loan = loan_with(LoanStatus::Overdue, date(2024, 6, 20));
        let status = compute_display_status(&loan, today);
        assert!(status.is_overdue);
        assert!(!status.is_due_soon);
    }

    #[test]
    fn pending_and_returned_never_flagged() {
        let today = date(2024, 6, 10);
        for status in [LoanStatus::Pending, LoanStatus::Returned] {
            let loan = loan_with(status, date(2024, 6, 1));
            let display = compute_display_status(&loan, today);
            assert!(!display.is_overdue);
            assert!(!display.is_due_soon);
        }
    }

    #[test]
    fn derived_filters() {
        let today = date(2024, 6, 10);
        let loans = vec![
            loan_with(LoanStatus::Pending, date(2024, 6, 15)),
            loan_with(LoanStatus::Active, date(2024, 6, 11)),
            loan_with(LoanStatus::Active, date(2024, 6, 1)),
            loan_with(LoanStatus::Overdue, date(2024, 6, 1)),
            loan_with(LoanStatus::Returned, date(2024, 6, 1)),
        ];

        let count = |filter| {
            filter_by_derived_status(loans.clone(), filter, today).count()
        };

        assert_eq!(count(DerivedFilter::Pending), 1);
        assert_eq!(count(DerivedFilter::Active), 2);
        // One active past its date plus one persisted overdue
        assert_eq!(count(DerivedFilter::Overdue), 2);
        assert_eq!(count(DerivedFilter::DueSoon), 1);
        assert_eq!(count(DerivedFilter::Returned), 1);
    }

    #[test]
    fn transport_date_strictness() {
        assert_eq!(parse_transport_date("2024-06-10").unwrap(), date(2024, 6, 10));

        // Not zero-padded, wrong separators, trailing time, out of range
        assert!(parse_transport_date("2024-6-10").is_err());
        assert!(parse_transport_date("2024/06/10").is_err());
        assert!(parse_transport_date("2024-06-10T00:00:00Z").is_err());
        assert!(parse_transport_date("2024-13-01").is_err());
        assert!(parse_transport_date("2024-02-30").is_err());
        assert!(parse_transport_date("").is_err());
    }

    #[test]
    fn status_string_round_trip() {
        for status in [
            LoanStatus::Pending,
            LoanStatus::Active,
            LoanStatus::Returned,
            LoanStatus::Overdue,
        ] {
            assert_eq!(status.as_str().parse::<LoanStatus>().unwrap(), status);
        }
        assert!("pending".parse::<LoanStatus>().is_err());
        assert!("LOST".parse::<LoanStatus>().is_err());
    }
}
