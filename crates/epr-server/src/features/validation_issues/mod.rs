//! Validation errors and warnings of uploaded files

pub mod queries;
pub mod routes;

pub use queries::{GetValidationErrorsQuery, GetValidationWarningsQuery};
pub use routes::validation_issues_routes;
