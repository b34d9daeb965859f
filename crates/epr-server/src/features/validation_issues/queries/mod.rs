//! Row-level validation issues of a submission's latest scanned file
//!
//! The latest antivirus result decides which blob is current; its issues are
//! returned ordered by row number and capped at the configured maximum.

pub mod errors;
pub mod warnings;

pub use errors::GetValidationErrorsQuery;
pub use warnings::GetValidationWarningsQuery;

use epr_common::types::EventType;
use uuid::Uuid;

use crate::context::RequestContext;
use crate::error::AppResult;
use crate::features::shared;
use crate::models::{EventKind, IssueSeverity, SubmissionEvent, ValidationIssue};
use crate::repository::{col, Predicate, SharedStore, Source, Store};

/// Blob name of the submission's most recent antivirus result, if any
async fn current_blob(
    store: &SharedStore,
    ctx: &RequestContext,
    submission_id: Uuid,
) -> AppResult<Option<String>> {
    let latest = shared::queries::<SubmissionEvent>(store, ctx)
        .get_all(
            Predicate::eq(col::SUBMISSION_ID, submission_id)
                .and(Predicate::eq(col::EVENT_TYPE, EventType::AntivirusResult.value())),
        )
        .order_by_desc(col::CREATED)
        .first()
        .await?;

    Ok(latest.and_then(|event| match event.kind {
        EventKind::AntivirusResult(result) => result.blob_name,
        _ => None,
    }))
}

pub(crate) async fn fetch_issues<S>(
    store: &SharedStore,
    ctx: &RequestContext,
    submission_id: Uuid,
    max_issues: usize,
) -> AppResult<Vec<ValidationIssue<S>>>
where
    S: IssueSeverity,
    dyn Store: Source<ValidationIssue<S>>,
{
    let Some(blob_name) = current_blob(store, ctx, submission_id).await? else {
        tracing::debug!(%submission_id, "No antivirus result, no {}s", S::LABEL);
        return Ok(Vec::new());
    };

    let issues = shared::queries::<ValidationIssue<S>>(store, ctx)
        .get_all(Predicate::eq(col::BLOB_NAME, blob_name))
        .order_by_asc(col::ROW_NUMBER)
        .take(max_issues)
        .to_list()
        .await?;
    Ok(issues)
}
