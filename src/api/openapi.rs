//! OpenAPI documentation

use axum::Router;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::api::{books, health, loans, stats, users};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Biblioteca API",
        version = "0.3.0",
        description = "School Library Loan Tracking REST API",
        license(name = "AGPL-3.0", url = "https://www.gnu.org/licenses/agpl-3.0.html")
    ),
    servers(
        (url = "/api/v1", description = "API v1")
    ),
    paths(
        // Health
        health::health_check,
        health::readiness_check,
        // Users
        users::register,
        users::login,
        users::get_user,
        // Books
        books::list_books,
        books::get_book,
        books::create_book,
        books::update_book,
        books::release_book,
        // Loans
        loans::list_loans,
        loans::get_student_loans,
        loans::create_loan,
        loans::scan_ticket,
        loans::approve_pickup,
        loans::return_loan,
        loans::mark_overdue,
        // Stats
        stats::get_stats,
    ),
    components(
        schemas(
            // Shared
            crate::error::ErrorResponse,
            health::HealthResponse,
            // Users
            crate::models::user::User,
            crate::models::user::Role,
            crate::models::user::RegisterUser,
            crate::models::user::LoginRequest,
            // Books
            crate::models::book::Book,
            crate::models::book::CreateBook,
            crate::models::book::UpdateBook,
            crate::models::book::AvailabilityFilter,
            // Loans
            crate::models::loan::LoanRequest,
            crate::models::loan::LoanStatus,
            crate::models::loan::LoanDetails,
            crate::models::loan::DisplayStatus,
            crate::models::loan::CreateLoanRequest,
            crate::models::loan::DerivedFilter,
            crate::ticket::LoanTicket,
            loans::CreateLoanResponse,
            loans::ScanRequest,
            loans::TransitionResponse,
            // Stats
            crate::services::loans::DashboardStats,
        )
    ),
    tags(
        (name = "health", description = "Service health"),
        (name = "users", description = "Registration and login"),
        (name = "books", description = "Catalog management"),
        (name = "loans", description = "Loan lifecycle"),
        (name = "stats", description = "Dashboard statistics")
    )
)]
pub struct ApiDoc;

/// Create the router serving the OpenAPI document and Swagger UI
pub fn create_openapi_router() -> Router {
    Router::new().merge(
        SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()),
    )
}
