//! Feature slices
//!
//! Each slice owns its commands, queries and routes:
//!
//! - **submissions**: create, submit, list and enrich submissions
//! - **events**: record submission events and serve regulator sync feeds
//! - **validation_issues**: row-level errors and warnings of the current file
//!
//! Commands and queries are plain `mediator::Request` types; routes send them
//! through the shared [`Pipeline`] together with their handler.

pub mod events;
pub mod shared;
pub mod submissions;
pub mod validation_issues;

use axum::Router;

use crate::config::Config;
use crate::cqrs::Pipeline;
use crate::repository::SharedStore;

/// State shared by all feature routes
#[derive(Clone)]
pub struct AppState {
    pub pipeline: Pipeline,
    pub max_issues_to_process: usize,
}

impl AppState {
    pub fn new(store: SharedStore, config: &Config) -> Self {
        Self {
            pipeline: Pipeline::new(store, config.pipeline.slow_request_threshold()),
            max_issues_to_process: config.validation.max_issues_to_process,
        }
    }

    pub fn store(&self) -> SharedStore {
        self.pipeline.store().clone()
    }
}

/// All feature routes, relative to the API prefix
pub fn router(state: AppState) -> Router {
    Router::new()
        .merge(submissions::submissions_routes())
        .merge(events::events_routes())
        .merge(validation_issues::validation_issues_routes())
        .with_state(state)
}
