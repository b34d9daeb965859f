//! Uploaded file query
//!
//! The latest antivirus check for a file within one submission, together with
//! the latest scan result for it when there is one.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use epr_common::types::{AntivirusScanResult, EventType, FileType};
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
pub struct GetUploadedFileQuery {
    pub submission_id: Uuid,
    pub file_id: Uuid,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadedFileResponse {
    pub submission_id: Uuid,
    pub organisation_id: Uuid,
    pub submission_period: String,
    pub file_id: Uuid,
    pub file_name: String,
    pub file_type: FileType,
    pub registration_set_id: Option<Uuid>,
    pub uploaded_by: Uuid,
    pub uploaded_at: DateTime<Utc>,
    pub blob_name: Option<String>,
    pub antivirus_scan_result: Option<AntivirusScanResult>,
}

impl Request<AppResult<UploadedFileResponse>> for GetUploadedFileQuery {}

#[async_trait]
impl Validate for GetUploadedFileQuery {
    async fn validate(
        &self,
        _ctx: &RequestContext,
        _store: &SharedStore,
    ) -> Result<Vec<FieldError>, RepositoryError> {
        let mut errors = FieldErrors::new();
        errors.require_id("submissionId", self.submission_id);
        errors.require_id("fileId", self.file_id);
        Ok(errors.into_vec())
    }
}

async fn latest(
    store: &SharedStore,
    ctx: &RequestContext,
    query: &GetUploadedFileQuery,
    event_type: EventType,
) -> Result<Option<SubmissionEvent>, RepositoryError> {
    shared::queries::<SubmissionEvent>(store, ctx)
        .get_all(
            Predicate::eq(col::SUBMISSION_ID, query.submission_id)
                .and(Predicate::eq(col::EVENT_TYPE, event_type.value()))
                .and(Predicate::eq(col::FILE_ID, query.file_id)),
        )
        .order_by_desc(col::CREATED)
        .first()
        .await
}

#[tracing::instrument(
    skip(store, ctx, query),
    fields(submission_id = %query.submission_id, file_id = %query.file_id)
)]
pub async fn handle(
    store: SharedStore,
    ctx: RequestContext,
    query: GetUploadedFileQuery,
) -> AppResult<UploadedFileResponse> {
    let not_found = || {
        AppError::not_found(format!(
            "File {} not found for submission {}",
            query.file_id, query.submission_id
        ))
    };

    let event = latest(&store, &ctx, &query, EventType::AntivirusCheck)
        .await?
        .ok_or_else(not_found)?;
    let EventKind::AntivirusCheck(check) = event.kind else {
        return Err(not_found());
    };

    let submission = shared::queries::<Submission>(&store, &ctx)
        .get_by_id(query.submission_id)
        .await?
        .ok_or_else(|| {
            AppError::not_found(format!("Submission {} not found", query.submission_id))
        })?;

    let result = latest(&store, &ctx, &query, EventType::AntivirusResult)
        .await?
        .and_then(|event| match event.kind {
            EventKind::AntivirusResult(result) => Some(result),
            _ => None,
        });

    Ok(UploadedFileResponse {
        submission_id: submission.id,
        organisation_id: submission.organisation_id,
        submission_period: submission.submission_period,
        file_id: check.file_id,
        file_name: check.file_name,
        file_type: check.file_type,
        registration_set_id: check.registration_set_id,
        uploaded_by: event.user_id,
        uploaded_at: event.created,
        blob_name: result.as_ref().and_then(|r| r.blob_name.clone()),
        antivirus_scan_result: result.map(|r| r.antivirus_scan_result),
    })
}
