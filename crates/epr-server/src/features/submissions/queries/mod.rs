pub mod file;
pub mod get;
pub mod list;
pub mod organisation_details;
pub mod periods;
pub mod uploaded_file;

pub use file::{GetSubmissionFileQuery, SubmissionFileResponse};
pub use get::GetSubmissionQuery;
pub use list::GetSubmissionsQuery;
pub use organisation_details::{GetOrganisationDetailsQuery, OrganisationDetailsResponse};
pub use periods::GetSubmissionPeriodsQuery;
pub use uploaded_file::{GetUploadedFileQuery, UploadedFileResponse};

use std::collections::HashMap;

use uuid::Uuid;

use super::enrichment::{enrich, SubmissionResponse};
use crate::context::RequestContext;
use crate::features::shared;
use crate::models::{Submission, SubmissionEvent};
use crate::repository::{col, Predicate, RepositoryError, SharedStore};

/// Enriches `submissions` from their events, fetched in one read
pub(crate) async fn responses(
    store: &SharedStore,
    ctx: &RequestContext,
    submissions: &[Submission],
) -> Result<Vec<SubmissionResponse>, RepositoryError> {
    if submissions.is_empty() {
        return Ok(Vec::new());
    }

    let events = shared::queries::<SubmissionEvent>(store, ctx)
        .get_all(Predicate::is_in(
            col::SUBMISSION_ID,
            submissions.iter().map(|s| s.id),
        ))
        .to_list()
        .await?;

    let mut by_submission: HashMap<Uuid, Vec<SubmissionEvent>> = HashMap::new();
    for event in events {
        by_submission.entry(event.submission_id).or_default().push(event);
    }

    Ok(submissions
        .iter()
        .map(|submission| {
            let events = by_submission
                .get(&submission.id)
                .map(Vec::as_slice)
                .unwrap_or_default();
            enrich(submission, events)
        })
        .collect())
}
