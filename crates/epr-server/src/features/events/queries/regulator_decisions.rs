//! Regulator decision sync queries
//!
//! Submission-agnostic feeds of PoM and registration decisions created
//! strictly after `lastSyncTime`, oldest first.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use epr_common::types::{EventType, RegulatorDecision};
use mediator::Request;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::default_last_sync_time;
use crate::context::RequestContext;
use crate::cqrs::Validate;
use crate::error::{AppResult, FieldError};
use crate::features::shared;
use crate::models::{EventKind, SubmissionEvent};
use crate::repository::{col, Predicate, RepositoryError, SharedStore};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GetRegulatorPoMDecisionsQuery {
    #[serde(default = "default_last_sync_time")]
    pub last_sync_time: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GetRegulatorRegistrationDecisionsQuery {
    #[serde(default = "default_last_sync_time")]
    pub last_sync_time: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegulatorDecisionResponse {
    pub id: Uuid,
    pub submission_id: Uuid,
    pub file_id: Uuid,
    pub decision: RegulatorDecision,
    pub comments: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_resubmission_required: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub app_reference_number: Option<String>,
    pub user_id: Uuid,
    pub created: DateTime<Utc>,
}

impl RegulatorDecisionResponse {
    fn from_event(event: SubmissionEvent) -> Option<Self> {
        let base = |file_id, decision, comments| Self {
            id: event.id,
            submission_id: event.submission_id,
            file_id,
            decision,
            comments,
            is_resubmission_required: None,
            app_reference_number: None,
            user_id: event.user_id,
            created: event.created,
        };

        match &event.kind {
            EventKind::RegulatorPoMDecision(d) => Some(Self {
                is_resubmission_required: Some(d.is_resubmission_required),
                ..base(d.file_id, d.decision, d.comments.clone())
            }),
            EventKind::RegulatorRegistrationDecision(d) => Some(Self {
                app_reference_number: d.app_reference_number.clone(),
                ..base(d.file_id, d.decision, d.comments.clone())
            }),
            _ => None,
        }
    }
}

impl Request<AppResult<Vec<RegulatorDecisionResponse>>> for GetRegulatorPoMDecisionsQuery {}
impl Request<AppResult<Vec<RegulatorDecisionResponse>>> for GetRegulatorRegistrationDecisionsQuery {}

#[async_trait]
impl Validate for GetRegulatorPoMDecisionsQuery {
    async fn validate(
        &self,
        _ctx: &RequestContext,
        _store: &SharedStore,
    ) -> Result<Vec<FieldError>, RepositoryError> {
        Ok(Vec::new())
    }
}

#[async_trait]
impl Validate for GetRegulatorRegistrationDecisionsQuery {
    async fn validate(
        &self,
        _ctx: &RequestContext,
        _store: &SharedStore,
    ) -> Result<Vec<FieldError>, RepositoryError> {
        Ok(Vec::new())
    }
}

async fn decisions_since(
    store: &SharedStore,
    ctx: &RequestContext,
    event_type: EventType,
    last_sync_time: DateTime<Utc>,
) -> AppResult<Vec<RegulatorDecisionResponse>> {
    let events = shared::queries::<SubmissionEvent>(store, ctx)
        .get_all(
            Predicate::eq(col::EVENT_TYPE, event_type.value())
                .and(Predicate::gt(col::CREATED, last_sync_time)),
        )
        .order_by_asc(col::CREATED)
        .to_list()
        .await?;

    tracing::debug!(count = events.len(), %event_type, "Loaded regulator decisions");
    Ok(events
        .into_iter()
        .filter_map(RegulatorDecisionResponse::from_event)
        .collect())
}

#[tracing::instrument(skip(store, ctx), fields(last_sync_time = %query.last_sync_time))]
pub async fn handle_pom(
    store: SharedStore,
    ctx: RequestContext,
    query: GetRegulatorPoMDecisionsQuery,
) -> AppResult<Vec<RegulatorDecisionResponse>> {
    decisions_since(&store, &ctx, EventType::RegulatorPoMDecision, query.last_sync_time).await
}

#[tracing::instrument(skip(store, ctx), fields(last_sync_time = %query.last_sync_time))]
pub async fn handle_registration(
    store: SharedStore,
    ctx: RequestContext,
    query: GetRegulatorRegistrationDecisionsQuery,
) -> AppResult<Vec<RegulatorDecisionResponse>> {
    decisions_since(
        &store,
        &ctx,
        EventType::RegulatorRegistrationDecision,
        query.last_sync_time,
    )
    .await
}
