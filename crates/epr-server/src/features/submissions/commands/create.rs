//! Create submission command
//!
//! The caller chooses the submission id; it must not be in use yet. The
//! owning organisation and creating user come from the request headers.

use async_trait::async_trait;
use chrono::Utc;
use epr_common::types::{DataSourceType, SubmissionType};
use mediator::Request;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::context::RequestContext;
use crate::cqrs::Validate;
use crate::error::{AppResult, FieldError};
use crate::features::shared::{self, FieldErrors};
use crate::models::Submission;
use crate::repository::{RepositoryError, SharedStore};

const MIN_SUBMISSION_PERIOD_LENGTH: usize = 4;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateSubmissionCommand {
    pub id: Uuid,
    pub submission_type: SubmissionType,
    pub submission_period: String,
    #[serde(default = "default_data_source")]
    pub data_source_type: DataSourceType,
    #[serde(default)]
    pub compliance_scheme_id: Option<Uuid>,
    #[serde(default)]
    pub is_resubmission: bool,
    /// Set from the `organisationId` header
    #[serde(default)]
    pub organisation_id: Uuid,
    /// Set from the `userId` header
    #[serde(default)]
    pub user_id: Uuid,
}

fn default_data_source() -> DataSourceType {
    DataSourceType::File
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateSubmissionResponse {
    pub id: Uuid,
}

impl Request<AppResult<CreateSubmissionResponse>> for CreateSubmissionCommand {}

#[async_trait]
impl Validate for CreateSubmissionCommand {
    async fn validate(
        &self,
        ctx: &RequestContext,
        store: &SharedStore,
    ) -> Result<Vec<FieldError>, RepositoryError> {
        let mut errors = FieldErrors::new();
        errors.require_id("id", self.id);
        errors.require_id("organisationId", self.organisation_id);
        errors.require_id("userId", self.user_id);
        errors.min_length(
            "submissionPeriod",
            &self.submission_period,
            MIN_SUBMISSION_PERIOD_LENGTH,
        );

        if !self.id.is_nil() {
            let taken = shared::queries::<Submission>(store, ctx)
                .get_by_id(self.id)
                .await?
                .is_some();
            errors.check(!taken, "id", format!("Submission {} already exists", self.id));
        }

        Ok(errors.into_vec())
    }
}

#[tracing::instrument(
    skip(store, ctx, command),
    fields(submission_id = %command.id, submission_type = %command.submission_type)
)]
pub async fn handle(
    store: SharedStore,
    ctx: RequestContext,
    command: CreateSubmissionCommand,
) -> AppResult<CreateSubmissionResponse> {
    let submission = Submission {
        id: command.id,
        submission_type: command.submission_type,
        submission_period: command.submission_period.trim().to_string(),
        data_source_type: command.data_source_type,
        organisation_id: command.organisation_id,
        user_id: command.user_id,
        compliance_scheme_id: command.compliance_scheme_id,
        is_submitted: false,
        is_resubmission: command.is_resubmission,
        app_reference_number: None,
        created: Utc::now(),
    };

    let mut commands = shared::commands(&store, &ctx);
    commands.add(submission);
    shared::save(
        &mut commands,
        "SUBMISSION_NOT_CREATED",
        format!("Submission {} could not be created", command.id),
    )
    .await?;

    tracing::info!(organisation_id = %command.organisation_id, "Submission created");
    Ok(CreateSubmissionResponse { id: command.id })
}
