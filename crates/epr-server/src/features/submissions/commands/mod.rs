pub mod create;
pub mod submit;

pub use create::{CreateSubmissionCommand, CreateSubmissionResponse};
pub use submit::SubmitSubmissionCommand;
