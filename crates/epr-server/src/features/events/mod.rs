//! Submission events: recording and regulator sync feeds

pub mod commands;
pub mod queries;
pub mod routes;

pub use commands::{CreateEventCommand, CreateEventResponse};
pub use queries::{
    GetRegulatorPoMDecisionsQuery, GetRegulatorRegistrationDecisionsQuery,
    GetSubmissionEventsQuery, RegulatorDecisionResponse, SubmissionEventsResponse,
};
pub use routes::events_routes;
