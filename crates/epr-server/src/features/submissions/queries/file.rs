//! Submission file query
//!
//! Resolves an uploaded file id to its latest antivirus check and the owning
//! submission.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use epr_common::types::{EventType, FileType, SubmissionType};
use mediator::Request;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::context::RequestContext;
use crate::cqrs::Validate;
use crate::error::{AppError, AppResult, FieldError};
use crate::features::shared::{self, FieldErrors};
use crate::models::{EventKind, Submission, SubmissionEvent};
use crate::repository::{col, Predicate, RepositoryError, SharedStore};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GetSubmissionFileQuery {
    pub file_id: Uuid,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionFileResponse {
    pub submission_id: Uuid,
    pub file_id: Uuid,
    pub file_name: String,
    pub file_type: FileType,
    pub registration_set_id: Option<Uuid>,
    pub organisation_id: Uuid,
    pub user_id: Uuid,
    pub submission_type: SubmissionType,
    pub submission_period: String,
    pub compliance_scheme_id: Option<Uuid>,
    pub created: DateTime<Utc>,
}

impl Request<AppResult<SubmissionFileResponse>> for GetSubmissionFileQuery {}

#[async_trait]
impl Validate for GetSubmissionFileQuery {
    async fn validate(
        &self,
        _ctx: &RequestContext,
        _store: &SharedStore,
    ) -> Result<Vec<FieldError>, RepositoryError> {
        let mut errors = FieldErrors::new();
        errors.require_id("fileId", self.file_id);
        Ok(errors.into_vec())
    }
}

#[tracing::instrument(skip(store, ctx, query), fields(file_id = %query.file_id))]
pub async fn handle(
    store: SharedStore,
    ctx: RequestContext,
    query: GetSubmissionFileQuery,
) -> AppResult<SubmissionFileResponse> {
    let event = shared::queries::<SubmissionEvent>(&store, &ctx)
        .get_all(
            Predicate::eq(col::EVENT_TYPE, EventType::AntivirusCheck.value())
                .and(Predicate::eq(col::FILE_ID, query.file_id)),
        )
        .order_by_desc(col::CREATED)
        .first()
        .await?
        .ok_or_else(|| AppError::not_found(format!("File {} not found", query.file_id)))?;

    let EventKind::AntivirusCheck(check) = event.kind else {
        return Err(AppError::not_found(format!("File {} not found", query.file_id)));
    };

    let submission = shared::queries::<Submission>(&store, &ctx)
        .get_by_id(event.submission_id)
        .await?
        .ok_or_else(|| {
            AppError::not_found(format!("Submission {} not found", event.submission_id))
        })?;

    Ok(SubmissionFileResponse {
        submission_id: submission.id,
        file_id: check.file_id,
        file_name: check.file_name,
        file_type: check.file_type,
        registration_set_id: check.registration_set_id,
        organisation_id: submission.organisation_id,
        user_id: event.user_id,
        submission_type: submission.submission_type,
        submission_period: submission.submission_period,
        compliance_scheme_id: submission.compliance_scheme_id,
        created: event.created,
    })
}
