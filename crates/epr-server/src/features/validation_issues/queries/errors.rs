use async_trait::async_trait;
use mediator::Request;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::fetch_issues;
use crate::context::RequestContext;
use crate::cqrs::Validate;
use crate::error::{AppResult, FieldError};
use crate::features::shared::FieldErrors;
use crate::models::{ErrorSeverity, ValidationError};
use crate::repository::{RepositoryError, SharedStore};

/// Validation errors of the submission's current file
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GetValidationErrorsQuery {
    pub submission_id: Uuid,
}

impl Request<AppResult<Vec<ValidationError>>> for GetValidationErrorsQuery {}

#[async_trait]
impl Validate for GetValidationErrorsQuery {
    async fn validate(
        &self,
        _ctx: &RequestContext,
        _store: &SharedStore,
    ) -> Result<Vec<FieldError>, RepositoryError> {
        let mut errors = FieldErrors::new();
        errors.require_id("submissionId", self.submission_id);
        Ok(errors.into_vec())
    }
}

#[tracing::instrument(skip(store, ctx), fields(submission_id = %query.submission_id))]
pub async fn handle(
    store: SharedStore,
    ctx: RequestContext,
    query: GetValidationErrorsQuery,
    max_issues: usize,
) -> AppResult<Vec<ValidationError>> {
    fetch_issues::<ErrorSeverity>(&store, &ctx, query.submission_id, max_issues).await
}
