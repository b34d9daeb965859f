pub mod create;

pub use create::{CreateEventCommand, CreateEventResponse};
