use async_trait::async_trait;
use mediator::Request;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::context::RequestContext;
use crate::cqrs::Validate;
use crate::error::{AppError, AppResult, FieldError};
use crate::features::shared::{self, FieldErrors};
use crate::features::submissions::enrichment::SubmissionResponse;
use crate::repository::{RepositoryError, SharedStore};

/// One submission of the caller's organisation, with derived status
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GetSubmissionQuery {
    pub id: Uuid,
    pub organisation_id: Uuid,
}

impl Request<AppResult<SubmissionResponse>> for GetSubmissionQuery {}

#[async_trait]
impl Validate for GetSubmissionQuery {
    async fn validate(
        &self,
        _ctx: &RequestContext,
        _store: &SharedStore,
    ) -> Result<Vec<FieldError>, RepositoryError> {
        let mut errors = FieldErrors::new();
        errors.require_id("id", self.id);
        errors.require_id("organisationId", self.organisation_id);
        Ok(errors.into_vec())
    }
}

#[tracing::instrument(skip(store, ctx, query), fields(submission_id = %query.id))]
pub async fn handle(
    store: SharedStore,
    ctx: RequestContext,
    query: GetSubmissionQuery,
) -> AppResult<SubmissionResponse> {
    let submission = shared::owned_submission(&store, &ctx, query.id).await?;
    super::responses(&store, &ctx, std::slice::from_ref(&submission))
        .await?
        .pop()
        .ok_or_else(|| AppError::not_found(format!("Submission {} not found", query.id)))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::features::shared::test_helpers::{context, seed, store, submission};
    use epr_common::types::SubmissionType;

    #[tokio::test]
    async fn test_returns_typed_response() {
        let store = store();
        let ctx = context(Uuid::new_v4());
        let submission = submission(ctx.organisation_id, SubmissionType::Registration);
        seed(&store, vec![submission.clone().into()]).await;

        let query = GetSubmissionQuery {
            id: submission.id,
            organisation_id: ctx.organisation_id,
        };
        let response = handle(store, ctx, query).await.unwrap();
        assert!(matches!(response, SubmissionResponse::Registration(_)));
        assert_eq!(response.id(), submission.id);
    }

    #[tokio::test]
    async fn test_other_organisation_is_unauthorized() {
        let store = store();
        let submission = submission(Uuid::new_v4(), SubmissionType::Producer);
        seed(&store, vec![submission.clone().into()]).await;
        let ctx = context(Uuid::new_v4());

        let query = GetSubmissionQuery {
            id: submission.id,
            organisation_id: ctx.organisation_id,
        };
        let result = handle(store, ctx, query).await;
        assert!(matches!(result, Err(AppError::Unauthorized { .. })));
    }
}
