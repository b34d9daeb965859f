//! Submit submission command
//!
//! Records a `Submitted` event for a file that passed its antivirus scan and
//! flags the submission as submitted, in one batch.

use async_trait::async_trait;
use epr_common::types::{AntivirusScanResult, EventType};
use mediator::Request;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::context::RequestContext;
use crate::cqrs::Validate;
use crate::error::{AppError, AppResult, FieldError};
use crate::features::shared::{self, FieldErrors};
use crate::models::{EventKind, SubmissionEvent, Submitted};
use crate::repository::{col, Predicate, RepositoryError, SharedStore};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitSubmissionCommand {
    /// Taken from the route
    #[serde(default)]
    pub submission_id: Uuid,
    pub file_id: Uuid,
    #[serde(default)]
    pub submitted_by: Option<String>,
    #[serde(default)]
    pub app_reference_number: Option<String>,
    #[serde(default)]
    pub organisation_id: Uuid,
    #[serde(default)]
    pub user_id: Uuid,
}

impl Request<AppResult<()>> for SubmitSubmissionCommand {}

#[async_trait]
impl Validate for SubmitSubmissionCommand {
    async fn validate(
        &self,
        _ctx: &RequestContext,
        _store: &SharedStore,
    ) -> Result<Vec<FieldError>, RepositoryError> {
        let mut errors = FieldErrors::new();
        errors.require_id("submissionId", self.submission_id);
        errors.require_id("fileId", self.file_id);
        errors.require_id("userId", self.user_id);
        Ok(errors.into_vec())
    }
}

async fn passed_antivirus(
    store: &SharedStore,
    ctx: &RequestContext,
    submission_id: Uuid,
    file_id: Uuid,
) -> Result<bool, RepositoryError> {
    let latest = shared::queries::<SubmissionEvent>(store, ctx)
        .get_all(
            Predicate::eq(col::SUBMISSION_ID, submission_id)
                .and(Predicate::eq(col::EVENT_TYPE, EventType::AntivirusResult.value()))
                .and(Predicate::eq(col::FILE_ID, file_id)),
        )
        .order_by_desc(col::CREATED)
        .first()
        .await?;

    Ok(matches!(
        latest.map(|e| e.kind),
        Some(EventKind::AntivirusResult(result))
            if result.antivirus_scan_result == AntivirusScanResult::Success
    ))
}

#[tracing::instrument(
    skip(store, ctx, command),
    fields(submission_id = %command.submission_id, file_id = %command.file_id)
)]
pub async fn handle(
    store: SharedStore,
    ctx: RequestContext,
    command: SubmitSubmissionCommand,
) -> AppResult<()> {
    let mut submission = shared::owned_submission(&store, &ctx, command.submission_id).await?;

    if !passed_antivirus(&store, &ctx, submission.id, command.file_id).await? {
        return Err(AppError::invalid(
            "fileId",
            format!("File {} has not passed its antivirus check", command.file_id),
        ));
    }

    let event = SubmissionEvent::new(
        submission.id,
        command.user_id,
        EventKind::Submitted(Submitted {
            file_id: command.file_id,
            submitted_by: command.submitted_by,
        }),
    );
    submission.mark_submitted(command.app_reference_number);

    let mut commands = shared::commands(&store, &ctx);
    commands.add(event);
    commands.update(submission);
    shared::save(
        &mut commands,
        "SUBMISSION_NOT_SUBMITTED",
        format!("Submission {} could not be submitted", command.submission_id),
    )
    .await?;

    tracing::info!("Submission submitted");
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::features::shared::test_helpers::{
        antivirus_result, context, seed, store, submission,
    };
    use crate::models::Submission;
    use epr_common::types::SubmissionType;

    fn command(ctx: &RequestContext, submission_id: Uuid, file_id: Uuid) -> SubmitSubmissionCommand {
        SubmitSubmissionCommand {
            submission_id,
            file_id,
            submitted_by: Some("Jane".to_string()),
            app_reference_number: Some("PEPR00002125P1".to_string()),
            organisation_id: ctx.organisation_id,
            user_id: ctx.user_id,
        }
    }

    #[tokio::test]
    async fn test_submits_scanned_file() {
        let store = store();
        let ctx = context(Uuid::new_v4());
        let submission = submission(ctx.organisation_id, SubmissionType::Producer);
        let file_id = Uuid::new_v4();
        seed(
            &store,
            vec![
                submission.clone().into(),
                antivirus_result(submission.id, 1, file_id, AntivirusScanResult::Success, "blob")
                    .into(),
            ],
        )
        .await;

        handle(store.clone(), ctx.clone(), command(&ctx, submission.id, file_id))
            .await
            .unwrap();

        let saved = shared::queries::<Submission>(&store, &ctx)
            .get_by_id(submission.id)
            .await
            .unwrap()
            .unwrap();
        assert!(saved.is_submitted);
        assert_eq!(saved.app_reference_number.as_deref(), Some("PEPR00002125P1"));

        let submitted = shared::queries::<SubmissionEvent>(&store, &ctx)
            .any(Predicate::eq(col::EVENT_TYPE, EventType::Submitted.value()))
            .await
            .unwrap();
        assert!(submitted);
    }

    #[tokio::test]
    async fn test_quarantined_file_is_rejected() {
        let store = store();
        let ctx = context(Uuid::new_v4());
        let submission = submission(ctx.organisation_id, SubmissionType::Producer);
        let file_id = Uuid::new_v4();
        seed(
            &store,
            vec![
                submission.clone().into(),
                antivirus_result(submission.id, 1, file_id, AntivirusScanResult::Quarantined, "b")
                    .into(),
            ],
        )
        .await;

        let result = handle(store, ctx.clone(), command(&ctx, submission.id, file_id)).await;
        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[tokio::test]
    async fn test_other_organisation_is_unauthorized() {
        let store = store();
        let submission = submission(Uuid::new_v4(), SubmissionType::Producer);
        seed(&store, vec![submission.clone().into()]).await;
        let ctx = context(Uuid::new_v4());

        let result = handle(store, ctx.clone(), command(&ctx, submission.id, Uuid::new_v4())).await;
        assert!(matches!(result, Err(AppError::Unauthorized { .. })));
    }

    #[tokio::test]
    async fn test_missing_submission_is_not_found() {
        let ctx = context(Uuid::new_v4());
        let result = handle(store(), ctx.clone(), command(&ctx, Uuid::new_v4(), Uuid::new_v4())).await;
        assert!(matches!(result, Err(AppError::NotFound(_))));
    }
}
