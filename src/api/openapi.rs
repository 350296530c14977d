//! OpenAPI documentation

use axum::Router;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::api::{books, borrowers, health, lendings};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Lending API",
        version = "1.0.0",
        description = "Library book lending and borrowing analytics REST API",
        license(name = "AGPL-3.0", url = "https://www.gnu.org/licenses/agpl-3.0.html")
    ),
    servers(
        (url = "/api/v1", description = "API v1")
    ),
    paths(
        // Health
        health::health_check,
        health::readiness_check,
        // Books
        books::list_books,
        books::get_book,
        books::create_book,
        books::update_book,
        books::delete_book,
        books::get_availability,
        // Borrowers
        borrowers::list_borrowers,
        borrowers::get_borrower,
        borrowers::create_borrower,
        borrowers::update_borrower,
        borrowers::delete_borrower,
        borrowers::get_history,
        // Lendings
        lendings::create_lending,
        lendings::get_lending,
        lendings::return_lending,
        // Reports
        books::most_borrowed,
        books::also_borrowed,
        books::reading_rate,
        borrowers::most_active,
    ),
    components(
        schemas(
            // Books
            crate::models::book::BookDetails,
            crate::models::book::CreateBook,
            crate::models::book::UpdateBook,
            // Borrowers
            crate::models::borrower::Borrower,
            crate::models::borrower::CreateBorrower,
            crate::models::borrower::UpdateBorrower,
            // Lendings
            crate::models::lending::LendingActivity,
            crate::models::lending::CreateLending,
            crate::models::lending::LendingHistoryEntry,
            // Reports
            crate::models::report::BookAvailability,
            crate::models::report::BookRanking,
            crate::models::report::TopBorrower,
            crate::models::report::ReadingRate,
            // Health
            health::HealthResponse,
            health::ReadinessResponse,
            // Errors
            crate::error::ErrorResponse,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "books", description = "Book catalog management"),
        (name = "borrowers", description = "Borrower management"),
        (name = "lendings", description = "Borrowing and returning books"),
        (name = "reports", description = "Lending analytics")
    )
)]
pub struct ApiDoc;

/// Create the OpenAPI documentation router
pub fn create_openapi_router() -> Router {
    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
}
