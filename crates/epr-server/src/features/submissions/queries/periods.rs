//! Submission periods query
//!
//! Distinct periods the organisation has submitted against, most recently
//! used first.

use async_trait::async_trait;
use chrono::{Datelike, TimeZone, Utc};
use epr_common::types::SubmissionType;
use mediator::Request;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::context::RequestContext;
use crate::cqrs::Validate;
use crate::error::{AppError, AppResult, FieldError};
use crate::features::shared::{self, FieldErrors};
use crate::models::Submission;
use crate::repository::{col, Predicate, RepositoryError, SharedStore};

pub const INVALID_YEAR: &str = "INVALID_YEAR";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GetSubmissionPeriodsQuery {
    #[serde(default)]
    pub r#type: Option<SubmissionType>,
    #[serde(default)]
    pub compliance_scheme_id: Option<Uuid>,
    #[serde(default)]
    pub year: Option<i32>,
    #[serde(default)]
    pub organisation_id: Uuid,
}

impl Request<AppResult<Vec<String>>> for GetSubmissionPeriodsQuery {}

#[async_trait]
impl Validate for GetSubmissionPeriodsQuery {
    async fn validate(
        &self,
        _ctx: &RequestContext,
        _store: &SharedStore,
    ) -> Result<Vec<FieldError>, RepositoryError> {
        let mut errors = FieldErrors::new();
        errors.require_id("organisationId", self.organisation_id);
        Ok(errors.into_vec())
    }
}

/// `[Jan 1 year, Jan 1 year+1)` as a predicate on `created`
fn year_range(year: i32) -> AppResult<Predicate> {
    let bound = |y: i32| {
        Utc.with_ymd_and_hms(y, 1, 1, 0, 0, 0)
            .single()
            .ok_or_else(|| AppError::failure(INVALID_YEAR, format!("Year {year} is out of range")))
    };
    Ok(Predicate::ge(col::CREATED, bound(year)?).and(Predicate::lt(col::CREATED, bound(year + 1)?)))
}

#[tracing::instrument(skip(store, ctx, query), fields(year = ?query.year))]
pub async fn handle(
    store: SharedStore,
    ctx: RequestContext,
    query: GetSubmissionPeriodsQuery,
) -> AppResult<Vec<String>> {
    let mut predicate = Predicate::eq(col::ORGANISATION_ID, query.organisation_id);

    if let Some(year) = query.year {
        let current = Utc::now().year();
        if year > current {
            return Err(AppError::failure(
                INVALID_YEAR,
                format!("Year {year} is after the current year {current}"),
            ));
        }
        predicate = predicate.and(year_range(year)?);
    }
    if let Some(submission_type) = query.r#type {
        predicate = predicate.and(Predicate::eq(col::SUBMISSION_TYPE, submission_type.value()));
    }
    if let Some(scheme) = query.compliance_scheme_id {
        predicate = predicate.and(Predicate::eq(col::COMPLIANCE_SCHEME_ID, scheme));
    }

    let submissions = shared::queries::<Submission>(&store, &ctx)
        .get_all(predicate)
        .order_by_desc(col::CREATED)
        .to_list()
        .await?;

    let mut periods: Vec<String> = Vec::new();
    for submission in submissions {
        if !periods.contains(&submission.submission_period) {
            periods.push(submission.submission_period);
        }
    }
    Ok(periods)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::features::shared::test_helpers::{context, seed, store, submission};

    fn created_in(organisation_id: Uuid, period: &str, year: i32, month: u32) -> Submission {
        let mut submission = submission(organisation_id, SubmissionType::Producer);
        submission.submission_period = period.to_string();
        submission.created = Utc.with_ymd_and_hms(year, month, 1, 12, 0, 0).unwrap();
        submission
    }

    #[tokio::test]
    async fn test_future_year_is_a_failure() {
        let ctx = context(Uuid::new_v4());
        let query = GetSubmissionPeriodsQuery {
            year: Some(Utc::now().year() + 1),
            organisation_id: ctx.organisation_id,
            ..Default::default()
        };

        match handle(store(), ctx, query).await {
            Err(AppError::Failure { code, .. }) => assert_eq!(code, INVALID_YEAR),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_year_bounds_and_distinct_ordering() {
        let store = store();
        let ctx = context(Uuid::new_v4());
        let org = ctx.organisation_id;
        seed(
            &store,
            vec![
                created_in(org, "January to June 2023", 2023, 2).into(),
                created_in(org, "July to December 2023", 2023, 8).into(),
                created_in(org, "January to June 2023", 2023, 3).into(),
                created_in(org, "January to June 2022", 2022, 12).into(),
                created_in(org, "January to June 2024", 2024, 1).into(),
            ],
        )
        .await;

        let query = GetSubmissionPeriodsQuery {
            year: Some(2023),
            organisation_id: org,
            ..Default::default()
        };
        let periods = handle(store, ctx, query).await.unwrap();
        assert_eq!(periods, ["July to December 2023", "January to June 2023"]);
    }
}
