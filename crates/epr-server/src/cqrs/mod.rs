//! Request pipeline
//!
//! Every command and query is sent through [`Pipeline::send`], which wraps the
//! handler in a fixed chain of stages, outermost first:
//!
//! 1. [`validation`]: runs the request's rules; on failure the handler never
//!    runs and `AppError::Validation` is returned
//! 2. [`exception`]: logs unexpected failures and panics with the request
//!    name and payload, then propagates them unchanged
//! 3. [`logging`]: entry and exit logs
//! 4. [`performance`]: warns when the handler exceeds the slow threshold
//!
//! Requests are plain data types marked with `mediator::Request`; handlers are
//! async functions the routes pass in alongside the request.

use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;

use crate::context::RequestContext;
use crate::error::{AppResult, FieldError};
use crate::repository::{RepositoryError, SharedStore};

pub mod exception;
pub mod logging;
pub mod performance;
pub mod validation;

pub const DEFAULT_SLOW_REQUEST_THRESHOLD: Duration = Duration::from_millis(500);

/// Validation rules of a request
///
/// Rules may consult the store; every failing rule is reported.
#[async_trait]
pub trait Validate: Send + Sync {
    async fn validate(
        &self,
        ctx: &RequestContext,
        store: &SharedStore,
    ) -> Result<Vec<FieldError>, RepositoryError>;
}

/// Short type name of a request, e.g. `CreateSubmissionCommand`
pub fn request_name<T: ?Sized>() -> &'static str {
    let full = std::any::type_name::<T>();
    full.rsplit("::").next().unwrap_or(full)
}

#[derive(Clone)]
pub struct Pipeline {
    store: SharedStore,
    slow_request_threshold: Duration,
}

impl Pipeline {
    pub fn new(store: SharedStore, slow_request_threshold: Duration) -> Self {
        Self {
            store,
            slow_request_threshold,
        }
    }

    pub fn store(&self) -> &SharedStore {
        &self.store
    }

    /// Runs `handler` for `request` inside every pipeline stage
    pub async fn send<Req, Res, H, Fut>(
        &self,
        ctx: &RequestContext,
        request: Req,
        handler: H,
    ) -> AppResult<Res>
    where
        Req: mediator::Request<AppResult<Res>> + Validate + Serialize,
        H: FnOnce(Req) -> Fut,
        Fut: Future<Output = AppResult<Res>>,
    {
        let name = request_name::<Req>();

        validation::run(name, &request, ctx, &self.store).await?;

        let payload = serde_json::to_value(&request).unwrap_or_default();
        let handled = performance::timed(
            name,
            &payload,
            self.slow_request_threshold,
            handler(request),
        );
        exception::guard(name, &payload, logging::around(name, handled)).await
    }
}
