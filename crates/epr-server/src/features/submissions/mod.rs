//! Submissions: creation, submission and status queries

pub mod commands;
pub mod enrichment;
pub mod queries;
pub mod routes;

pub use commands::{CreateSubmissionCommand, CreateSubmissionResponse, SubmitSubmissionCommand};
pub use enrichment::{
    PomSubmissionResponse, RegistrationSubmissionResponse, SubmissionResponse, SubmissionSummary,
};
pub use queries::{
    GetOrganisationDetailsQuery, GetSubmissionFileQuery, GetSubmissionPeriodsQuery,
    GetSubmissionQuery, GetSubmissionsQuery, GetUploadedFileQuery, OrganisationDetailsResponse,
    SubmissionFileResponse, UploadedFileResponse,
};
pub use routes::submissions_routes;
