//! Shared utilities for feature modules
//!
//! - **validation**: field-error collection used by every request's rules
//! - **test_helpers**: in-memory fixtures (test-only)

pub mod validation;

#[cfg(test)]
pub mod test_helpers;

pub use validation::FieldErrors;

use uuid::Uuid;

use crate::context::RequestContext;
use crate::error::{AppError, AppResult};
use crate::models::Submission;
use crate::repository::{
    CommandRepository, Entity, QueryRepository, SharedStore, Source, Store,
};

/// Read repository bound to the request's cancellation
pub fn queries<T: Entity>(store: &SharedStore, ctx: &RequestContext) -> QueryRepository<T>
where
    dyn Store: Source<T>,
{
    QueryRepository::new(store.clone(), ctx.cancellation())
}

/// Write repository bound to the request's cancellation
pub fn commands(store: &SharedStore, ctx: &RequestContext) -> CommandRepository {
    CommandRepository::new(store.clone(), ctx.cancellation())
}

/// Loads a submission the caller's organisation is allowed to see
///
/// Missing submissions are `NotFound`; submissions of another organisation
/// are `Unauthorized` with [`crate::error::ORGANISATION_MISMATCH`].
pub async fn owned_submission(
    store: &SharedStore,
    ctx: &RequestContext,
    submission_id: Uuid,
) -> AppResult<Submission> {
    let submission = queries::<Submission>(store, ctx)
        .get_by_id(submission_id)
        .await?
        .ok_or_else(|| AppError::not_found(format!("Submission {submission_id} not found")))?;

    if !submission.belongs_to(ctx.organisation_id) {
        tracing::warn!(
            submission_id = %submission_id,
            organisation_id = %ctx.organisation_id,
            "Submission requested by another organisation"
        );
        return Err(AppError::organisation_mismatch(format!(
            "Submission {submission_id} belongs to another organisation"
        )));
    }

    Ok(submission)
}

/// Commits staged changes, failing with `code` when nothing was written
pub async fn save(
    commands: &mut CommandRepository,
    code: &str,
    message: impl Into<String>,
) -> AppResult<()> {
    if commands.save_changes().await? {
        Ok(())
    } else {
        Err(AppError::failure(code, message))
    }
}
