//! List submissions query
//!
//! Submissions of the caller's organisation, newest first, optionally
//! narrowed by period, type and compliance scheme.

use async_trait::async_trait;
use epr_common::types::SubmissionType;
use mediator::Request;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::context::RequestContext;
use crate::cqrs::Validate;
use crate::error::{AppResult, FieldError};
use crate::features::shared::{self, FieldErrors};
use crate::features::submissions::enrichment::SubmissionResponse;
use crate::models::Submission;
use crate::repository::{col, Predicate, RepositoryError, SharedStore};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GetSubmissionsQuery {
    /// Comma separated submission periods
    #[serde(default)]
    pub periods: Option<String>,
    #[serde(default)]
    pub r#type: Option<SubmissionType>,
    #[serde(default)]
    pub compliance_scheme_id: Option<Uuid>,
    #[serde(default)]
    pub limit: Option<usize>,
    #[serde(default)]
    pub organisation_id: Uuid,
}

impl GetSubmissionsQuery {
    fn period_list(&self) -> Vec<String> {
        self.periods
            .as_deref()
            .unwrap_or_default()
            .split(',')
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .map(str::to_string)
            .collect()
    }

    fn predicate(&self) -> Predicate {
        let mut predicate = Predicate::eq(col::ORGANISATION_ID, self.organisation_id);

        let periods = self.period_list();
        if !periods.is_empty() {
            predicate = predicate.and(Predicate::is_in(col::SUBMISSION_PERIOD, periods));
        }
        if let Some(submission_type) = self.r#type {
            predicate = predicate.and(Predicate::eq(col::SUBMISSION_TYPE, submission_type.value()));
        }
        if let Some(scheme) = self.compliance_scheme_id {
            predicate = predicate.and(Predicate::eq(col::COMPLIANCE_SCHEME_ID, scheme));
        }
        predicate
    }
}

impl Request<AppResult<Vec<SubmissionResponse>>> for GetSubmissionsQuery {}

#[async_trait]
impl Validate for GetSubmissionsQuery {
    async fn validate(
        &self,
        _ctx: &RequestContext,
        _store: &SharedStore,
    ) -> Result<Vec<FieldError>, RepositoryError> {
        let mut errors = FieldErrors::new();
        errors.require_id("organisationId", self.organisation_id);
        errors.check(
            self.limit != Some(0),
            "limit",
            "'limit' must be greater than 0",
        );
        Ok(errors.into_vec())
    }
}

#[tracing::instrument(skip(store, ctx, query), fields(organisation_id = %query.organisation_id))]
pub async fn handle(
    store: SharedStore,
    ctx: RequestContext,
    query: GetSubmissionsQuery,
) -> AppResult<Vec<SubmissionResponse>> {
    let mut submissions = shared::queries::<Submission>(&store, &ctx)
        .get_all(query.predicate())
        .order_by_desc(col::CREATED);
    if let Some(limit) = query.limit {
        submissions = submissions.take(limit);
    }
    let submissions = submissions.to_list().await?;

    tracing::debug!(count = submissions.len(), "Loaded submissions");
    Ok(super::responses(&store, &ctx, &submissions).await?)
}
