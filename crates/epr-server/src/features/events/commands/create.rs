//! Create event command
//!
//! Records one decoded event against a submission. Validation events also
//! stage their row-level errors and warnings, owned by the new event and
//! sharing its blob name, in the same batch.

use async_trait::async_trait;
use epr_common::types::RegulatorDecision;
use mediator::Request;
use serde::Serialize;
use uuid::Uuid;

use crate::codec::{EventPayload, ValidationPayload};
use crate::context::RequestContext;
use crate::cqrs::Validate;
use crate::error::{AppResult, FieldError};
use crate::features::shared::{self, FieldErrors};
use crate::models::{
    EventKind, IssueSeverity, Submission, SubmissionEvent, ValidationError, ValidationEvent,
    ValidationIssue, ValidationSummary, ValidationWarning,
};
use crate::repository::{RepositoryError, SharedStore};

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateEventCommand {
    pub submission_id: Uuid,
    pub user_id: Uuid,
    pub payload: EventPayload,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateEventResponse {
    pub id: Uuid,
}

impl Request<AppResult<CreateEventResponse>> for CreateEventCommand {}

fn require_blob<D>(errors: &mut FieldErrors, payload: &ValidationPayload<D>) {
    errors.require_text("blobName", Some(payload.blob_name.as_str()));
}

fn require_comments(
    errors: &mut FieldErrors,
    decision: RegulatorDecision,
    comments: Option<&str>,
) {
    if decision.requires_comments() {
        errors.require_text("comments", comments);
    }
}

#[async_trait]
impl Validate for CreateEventCommand {
    async fn validate(
        &self,
        ctx: &RequestContext,
        store: &SharedStore,
    ) -> Result<Vec<FieldError>, RepositoryError> {
        let mut errors = FieldErrors::new();
        errors.require_id("submissionId", self.submission_id);
        errors.require_id("userId", self.user_id);

        if !self.submission_id.is_nil() {
            let exists = shared::queries::<Submission>(store, ctx)
                .get_by_id(self.submission_id)
                .await?
                .is_some();
            errors.check(
                exists,
                "submissionId",
                format!("Submission {} does not exist", self.submission_id),
            );
        }

        match &self.payload {
            EventPayload::AntivirusCheck(check) => {
                errors.require_id("fileId", check.file_id);
                errors.require_text("fileName", Some(check.file_name.as_str()));
            },
            EventPayload::AntivirusResult(result) => errors.require_id("fileId", result.file_id),
            EventPayload::Submitted(submitted) => errors.require_id("fileId", submitted.file_id),
            EventPayload::FileDownloadCheck(check) => {
                errors.require_id("fileId", check.file_id);
                errors.require_text("fileName", Some(check.file_name.as_str()));
                errors.require_text("blobName", Some(check.blob_name.as_str()));
            },
            EventPayload::CheckSplitter(payload) => require_blob(&mut errors, payload),
            EventPayload::ProducerValidation(payload) => require_blob(&mut errors, payload),
            EventPayload::RegistrationValidation(payload) => require_blob(&mut errors, payload),
            EventPayload::BrandValidation(payload) | EventPayload::PartnerValidation(payload) => {
                require_blob(&mut errors, payload)
            },
            EventPayload::RegulatorPoMDecision(decision) => {
                errors.require_id("fileId", decision.file_id);
                require_comments(&mut errors, decision.decision, decision.comments.as_deref());
            },
            EventPayload::RegulatorRegistrationDecision(decision) => {
                errors.require_id("fileId", decision.file_id);
                require_comments(&mut errors, decision.decision, decision.comments.as_deref());
            },
            EventPayload::RegistrationFeePayment(_)
            | EventPayload::RegistrationApplicationSubmitted(_)
            | EventPayload::PackagingResubmissionFeePayment(_)
            | EventPayload::PackagingResubmissionApplicationSubmitted(_) => {},
        }

        Ok(errors.into_vec())
    }
}

type Issues = (Vec<ValidationError>, Vec<ValidationWarning>);

/// Splits a validation payload into the stored event and its issues
fn validation_event<D>(payload: ValidationPayload<D>) -> (ValidationEvent<D>, Issues) {
    let errors = payload.errors.unwrap_or_default();
    let warnings = payload.warnings.unwrap_or_default();
    let summary = ValidationSummary::from_issues(
        payload.blob_name,
        payload.blob_container_name,
        &errors,
        &warnings,
        payload.error_count,
        payload.warning_count,
    );
    (
        ValidationEvent {
            summary,
            details: payload.details,
        },
        (errors, warnings),
    )
}

fn into_kind(payload: EventPayload) -> (EventKind, Issues) {
    let none = || (Vec::new(), Vec::new());
    match payload {
        EventPayload::AntivirusCheck(e) => (EventKind::AntivirusCheck(e), none()),
        EventPayload::AntivirusResult(e) => (EventKind::AntivirusResult(e), none()),
        EventPayload::Submitted(e) => (EventKind::Submitted(e), none()),
        EventPayload::FileDownloadCheck(e) => (EventKind::FileDownloadCheck(e), none()),
        EventPayload::RegulatorPoMDecision(e) => (EventKind::RegulatorPoMDecision(e), none()),
        EventPayload::RegulatorRegistrationDecision(e) => {
            (EventKind::RegulatorRegistrationDecision(e), none())
        },
        EventPayload::RegistrationFeePayment(e) => (EventKind::RegistrationFeePayment(e), none()),
        EventPayload::RegistrationApplicationSubmitted(e) => {
            (EventKind::RegistrationApplicationSubmitted(e), none())
        },
        EventPayload::PackagingResubmissionFeePayment(e) => {
            (EventKind::PackagingResubmissionFeePayment(e), none())
        },
        EventPayload::PackagingResubmissionApplicationSubmitted(e) => {
            (EventKind::PackagingResubmissionApplicationSubmitted(e), none())
        },
        EventPayload::CheckSplitter(p) => {
            let (event, issues) = validation_event(p);
            (EventKind::CheckSplitter(event), issues)
        },
        EventPayload::ProducerValidation(p) => {
            let (event, issues) = validation_event(p);
            (EventKind::ProducerValidation(event), issues)
        },
        EventPayload::RegistrationValidation(p) => {
            let (event, issues) = validation_event(p);
            (EventKind::RegistrationValidation(event), issues)
        },
        EventPayload::BrandValidation(p) => {
            let (event, issues) = validation_event(p);
            (EventKind::BrandValidation(event), issues)
        },
        EventPayload::PartnerValidation(p) => {
            let (event, issues) = validation_event(p);
            (EventKind::PartnerValidation(event), issues)
        },
    }
}

/// Caps `issues` at `max` and attaches them to their owning event
fn adopt<S: IssueSeverity>(
    mut issues: Vec<ValidationIssue<S>>,
    event: &SubmissionEvent,
    blob_name: &str,
    max: usize,
) -> Vec<ValidationIssue<S>> {
    if issues.len() > max {
        tracing::warn!(
            event_id = %event.id,
            received = issues.len(),
            kept = max,
            "Dropping validation {}s beyond the configured maximum",
            S::LABEL
        );
        issues.truncate(max);
    }
    for issue in &mut issues {
        issue.validation_event_id = event.id;
        issue.blob_name = blob_name.to_string();
    }
    issues
}

#[tracing::instrument(
    skip(store, ctx, command),
    fields(submission_id = %command.submission_id, event_type = %command.payload.event_type())
)]
pub async fn handle(
    store: SharedStore,
    ctx: RequestContext,
    command: CreateEventCommand,
    max_issues: usize,
) -> AppResult<CreateEventResponse> {
    let (kind, (errors, warnings)) = into_kind(command.payload);
    let event = SubmissionEvent::new(command.submission_id, command.user_id, kind);
    let blob_name = event
        .kind
        .validation()
        .map(|summary| summary.blob_name.clone())
        .unwrap_or_default();

    let errors = adopt(errors, &event, &blob_name, max_issues);
    let warnings = adopt(warnings, &event, &blob_name, max_issues);
    let (error_count, warning_count) = (errors.len(), warnings.len());
    let id = event.id;

    let mut commands = shared::commands(&store, &ctx);
    commands.add(event);
    for error in errors {
        commands.add(error);
    }
    for warning in warnings {
        commands.add(warning);
    }
    shared::save(
        &mut commands,
        "EVENT_NOT_CREATED",
        format!("Event could not be created for submission {}", command.submission_id),
    )
    .await?;

    tracing::info!(event_id = %id, error_count, warning_count, "Event created");
    Ok(CreateEventResponse { id })
}
