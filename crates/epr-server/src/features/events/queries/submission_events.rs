//! Submission events query
//!
//! Everything a regulator needs to sync one submission since its last pull:
//! submitted files, regulator decisions and antivirus checks created strictly
//! after `lastSyncTime`. File names come from the submission's antivirus
//! checks, whenever those were recorded.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use epr_common::types::{EventType, FileType, RegulatorDecision};
use mediator::Request;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::default_last_sync_time;
use crate::context::RequestContext;
use crate::cqrs::Validate;
use crate::error::{AppResult, FieldError};
use crate::features::shared::{self, FieldErrors};
use crate::models::{EventKind, SubmissionEvent};
use crate::repository::{col, Predicate, RepositoryError, SharedStore};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GetSubmissionEventsQuery {
    #[serde(default)]
    pub submission_id: Uuid,
    #[serde(default = "default_last_sync_time")]
    pub last_sync_time: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionEventsResponse {
    pub submitted: Vec<SubmittedEventResponse>,
    pub regulator_decisions: Vec<DecisionEventResponse>,
    pub antivirus_checks: Vec<AntivirusCheckEventResponse>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmittedEventResponse {
    pub submission_id: Uuid,
    pub file_id: Uuid,
    pub file_name: Option<String>,
    pub submitted_by: Option<String>,
    pub user_id: Uuid,
    pub created: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DecisionEventResponse {
    pub submission_id: Uuid,
    pub file_id: Uuid,
    pub file_name: Option<String>,
    pub decision: RegulatorDecision,
    pub comments: Option<String>,
    pub user_id: Uuid,
    pub created: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AntivirusCheckEventResponse {
    pub submission_id: Uuid,
    pub file_id: Uuid,
    pub file_name: String,
    pub file_type: FileType,
    pub registration_set_id: Option<Uuid>,
    pub user_id: Uuid,
    pub created: DateTime<Utc>,
}

impl Request<AppResult<SubmissionEventsResponse>> for GetSubmissionEventsQuery {}

#[async_trait]
impl Validate for GetSubmissionEventsQuery {
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

#[tracing::instrument(
    skip(store, ctx, query),
    fields(submission_id = %query.submission_id, last_sync_time = %query.last_sync_time)
)]
pub async fn handle(
    store: SharedStore,
    ctx: RequestContext,
    query: GetSubmissionEventsQuery,
) -> AppResult<SubmissionEventsResponse> {
    let events = shared::queries::<SubmissionEvent>(&store, &ctx)
        .get_all(Predicate::eq(col::SUBMISSION_ID, query.submission_id).and(Predicate::is_in(
            col::EVENT_TYPE,
            [
                EventType::AntivirusCheck,
                EventType::Submitted,
                EventType::RegulatorPoMDecision,
                EventType::RegulatorRegistrationDecision,
            ]
            .map(EventType::value),
        )))
        .order_by_asc(col::CREATED)
        .to_list()
        .await?;

    let file_names: HashMap<Uuid, String> = events
        .iter()
        .filter_map(|event| match &event.kind {
            EventKind::AntivirusCheck(check) => Some((check.file_id, check.file_name.clone())),
            _ => None,
        })
        .collect();
    let file_name = |file_id: &Uuid| file_names.get(file_id).cloned();

    let mut response = SubmissionEventsResponse::default();
    for event in events.into_iter().filter(|e| e.created > query.last_sync_time) {
        let decision = |file_id: Uuid, decision: RegulatorDecision, comments: Option<String>| {
            DecisionEventResponse {
                submission_id: event.submission_id,
                file_id,
                file_name: file_name(&file_id),
                decision,
                comments,
                user_id: event.user_id,
                created: event.created,
            }
        };

        match &event.kind {
            EventKind::Submitted(submitted) => response.submitted.push(SubmittedEventResponse {
                submission_id: event.submission_id,
                file_id: submitted.file_id,
                file_name: file_name(&submitted.file_id),
                submitted_by: submitted.submitted_by.clone(),
                user_id: event.user_id,
                created: event.created,
            }),
            EventKind::RegulatorPoMDecision(d) => response.regulator_decisions.push(decision(
                d.file_id,
                d.decision,
                d.comments.clone(),
            )),
            EventKind::RegulatorRegistrationDecision(d) => response
                .regulator_decisions
                .push(decision(d.file_id, d.decision, d.comments.clone())),
            EventKind::AntivirusCheck(check) => {
                response.antivirus_checks.push(AntivirusCheckEventResponse {
                    submission_id: event.submission_id,
                    file_id: check.file_id,
                    file_name: check.file_name.clone(),
                    file_type: check.file_type,
                    registration_set_id: check.registration_set_id,
                    user_id: event.user_id,
                    created: event.created,
                })
            },
            _ => {},
        }
    }

    Ok(response)
}
