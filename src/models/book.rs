//! Book (catalog entry) model and related types

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

/// Book model from database
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Book {
    pub id: Uuid,
    pub title: String,
    pub author: String,
    pub description: String,
    /// Cover image URL; may be a data URI or empty
    pub cover_url: String,
    pub available: bool,
}

/// Create book request (staff action)
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateBook {
    #[validate(length(min = 1, message = "Title is required"))]
    pub title: String,
    #[validate(length(min = 1, message = "Author is required"))]
    pub author: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub cover_url: String,
}

/// Update book request (staff action; availability is owned by the loan
/// engine and the restock endpoint, not by edits)
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdateBook {
    #[validate(length(min = 1, message = "Title must not be empty"))]
    pub title: Option<String>,
    #[validate(length(min = 1, message = "Author must not be empty"))]
    pub author: Option<String>,
    pub description: Option<String>,
    pub cover_url: Option<String>,
}

/// Availability filter for book listings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum AvailabilityFilter {
    All,
    Available,
    Unavailable,
}

impl AvailabilityFilter {
    pub fn matches(&self, book: &Book) -> bool {
        match self {
            AvailabilityFilter::All => true,
            AvailabilityFilter::Available => book.available,
            AvailabilityFilter::Unavailable => !book.available,
        }
    }
}

/// Book query parameters
#[derive(Debug, Deserialize, IntoParams, ToSchema)]
pub struct BookQuery {
    /// Case-insensitive substring match on author
    pub author: Option<String>,
    pub availability: Option<AvailabilityFilter>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn book(available: bool) -> Book {
        Book {
            id: Uuid::nil(),
            title: "Don Quijote de la Mancha".to_string(),
            author: "Miguel de Cervantes".to_string(),
            description: String::new(),
            cover_url: String::new(),
            available,
        }
    }

    #[test]
    fn availability_filter() {
        assert!(AvailabilityFilter::All.matches(&book(true)));
        assert!(AvailabilityFilter::All.matches(&book(false)));
        assert!(AvailabilityFilter::Available.matches(&book(true)));
        assert!(!AvailabilityFilter::Available.matches(&book(false)));
        assert!(AvailabilityFilter::Unavailable.matches(&book(false)));
        assert!(!AvailabilityFilter::Unavailable.matches(&book(true)));
    }
}
