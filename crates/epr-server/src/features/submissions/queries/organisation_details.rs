//! Organisation details query
//!
//! Given the blob of any file in a registration set, finds the blob holding
//! the set's company details:
//!
//! 1. antivirus result for the blob
//! 2. antivirus check for that result's file
//! 3. company details check in the same registration set
//! 4. antivirus result for the company details file, with a blob name

use async_trait::async_trait;
use epr_common::types::{EventType, FileType};
use mediator::Request;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::context::RequestContext;
use crate::cqrs::Validate;
use crate::error::{AppError, AppResult, FieldError};
use crate::features::shared::{self, FieldErrors};
use crate::models::{AntivirusCheck, AntivirusResult, EventKind, SubmissionEvent};
use crate::repository::{col, Predicate, QueryRepository, RepositoryError, SharedStore};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GetOrganisationDetailsQuery {
    #[serde(default)]
    pub blob_name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrganisationDetailsResponse {
    pub blob_name: String,
    pub submission_id: Uuid,
    pub registration_set_id: Uuid,
    pub file_id: Uuid,
    pub file_name: String,
}

impl Request<AppResult<OrganisationDetailsResponse>> for GetOrganisationDetailsQuery {}

#[async_trait]
impl Validate for GetOrganisationDetailsQuery {
    async fn validate(
        &self,
        _ctx: &RequestContext,
        _store: &SharedStore,
    ) -> Result<Vec<FieldError>, RepositoryError> {
        let mut errors = FieldErrors::new();
        errors.require_text("blobName", Some(self.blob_name.as_str()));
        Ok(errors.into_vec())
    }
}

async fn latest(
    events: &QueryRepository<SubmissionEvent>,
    predicate: Predicate,
) -> Result<Option<SubmissionEvent>, RepositoryError> {
    events
        .get_all(predicate)
        .order_by_desc(col::CREATED)
        .first()
        .await
}

fn as_result(event: SubmissionEvent) -> Option<AntivirusResult> {
    match event.kind {
        EventKind::AntivirusResult(result) => Some(result),
        _ => None,
    }
}

fn as_check(event: SubmissionEvent) -> Option<(Uuid, AntivirusCheck)> {
    match event.kind {
        EventKind::AntivirusCheck(check) => Some((event.submission_id, check)),
        _ => None,
    }
}

fn missing(message: String) -> AppError {
    tracing::info!("{message}");
    AppError::not_found(message)
}

#[tracing::instrument(skip(store, ctx, query), fields(blob_name = %query.blob_name))]
pub async fn handle(
    store: SharedStore,
    ctx: RequestContext,
    query: GetOrganisationDetailsQuery,
) -> AppResult<OrganisationDetailsResponse> {
    let events = shared::queries::<SubmissionEvent>(&store, &ctx);
    let result_type = Predicate::eq(col::EVENT_TYPE, EventType::AntivirusResult.value());
    let check_type = Predicate::eq(col::EVENT_TYPE, EventType::AntivirusCheck.value());

    let result = latest(
        &events,
        result_type
            .clone()
            .and(Predicate::eq(col::BLOB_NAME, query.blob_name.as_str())),
    )
    .await?
    .and_then(as_result)
    .ok_or_else(|| missing(format!("No antivirus result found for blob {}", query.blob_name)))?;

    let (_, check) = latest(
        &events,
        check_type.clone().and(Predicate::eq(col::FILE_ID, result.file_id)),
    )
    .await?
    .and_then(as_check)
    .ok_or_else(|| missing(format!("No antivirus check found for file {}", result.file_id)))?;

    let registration_set_id = check.registration_set_id.ok_or_else(|| {
        missing(format!("File {} is not part of a registration set", check.file_id))
    })?;

    let (submission_id, company) = latest(
        &events,
        check_type
            .and(Predicate::eq(col::REGISTRATION_SET_ID, registration_set_id))
            .and(Predicate::eq(col::FILE_TYPE, FileType::CompanyDetails.value())),
    )
    .await?
    .and_then(as_check)
    .ok_or_else(|| {
        missing(format!(
            "No company details file found for registration set {registration_set_id}"
        ))
    })?;

    let blob_name = latest(
        &events,
        result_type
            .and(Predicate::eq(col::FILE_ID, company.file_id))
            .and(Predicate::IsNotNull(col::BLOB_NAME)),
    )
    .await?
    .and_then(as_result)
    .and_then(|result| result.blob_name)
    .ok_or_else(|| {
        missing(format!(
            "No antivirus result with a blob found for company details file {}",
            company.file_id
        ))
    })?;

    Ok(OrganisationDetailsResponse {
        blob_name,
        submission_id,
        registration_set_id,
        file_id: company.file_id,
        file_name: company.file_name,
    })
}
