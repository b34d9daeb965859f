//! Event API routes
//!
//! - `POST /api/v1/submissions/:id/events` - Record an event against a submission
//! - `GET /api/v1/submissions/:id/events` - Events since the last sync
//! - `GET /api/v1/regulator-decisions/pom` - PoM decisions since the last sync
//! - `GET /api/v1/regulator-decisions/registration` - Registration decisions since the last sync

use axum::{extract::State, response::Response, routing::get, Router};
use serde_json::Value;
use uuid::Uuid;

use super::commands::{create, CreateEventCommand};
use super::queries::{
    regulator_decisions, submission_events, GetRegulatorPoMDecisionsQuery,
    GetRegulatorRegistrationDecisionsQuery, GetSubmissionEventsQuery, RegulatorDecisionResponse,
    SubmissionEventsResponse,
};
use crate::api::extract::{JsonBody, PathParams, QueryParams};
use crate::api::response::ApiResponse;
use crate::codec::decode_event;
use crate::context::RequestContext;
use crate::error::{AppError, AppResult};
use crate::features::AppState;

pub fn events_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/submissions/:id/events",
            get(get_submission_events).post(create_event),
        )
        .route("/regulator-decisions/pom", get(get_pom_decisions))
        .route(
            "/regulator-decisions/registration",
            get(get_registration_decisions),
        )
}

#[tracing::instrument(skip_all, fields(submission_id = %submission_id))]
async fn create_event(
    State(state): State<AppState>,
    ctx: RequestContext,
    PathParams(submission_id): PathParams<Uuid>,
    JsonBody(body): JsonBody<Value>,
) -> AppResult<Response> {
    let payload = decode_event(body)
        .map_err(AppError::from)
        .inspect_err(|e| {
            if e.is_unexpected() {
                tracing::error!(error = %e, "Unsupported event payload");
            } else {
                tracing::warn!(error = %e, "Rejected event payload");
            }
        })?;
    let command = CreateEventCommand {
        submission_id,
        user_id: ctx.user_id,
        payload,
    };

    let max_issues = state.max_issues_to_process;
    let response = state
        .pipeline
        .send(&ctx, command, |command| {
            create::handle(state.store(), ctx.clone(), command, max_issues)
        })
        .await?;
    Ok(ApiResponse::created(response))
}

#[tracing::instrument(skip_all, fields(submission_id = %submission_id))]
async fn get_submission_events(
    State(state): State<AppState>,
    ctx: RequestContext,
    PathParams(submission_id): PathParams<Uuid>,
    QueryParams(mut query): QueryParams<GetSubmissionEventsQuery>,
) -> AppResult<ApiResponse<SubmissionEventsResponse>> {
    query.submission_id = submission_id;

    let response = state
        .pipeline
        .send(&ctx, query, |query| {
            submission_events::handle(state.store(), ctx.clone(), query)
        })
        .await?;
    Ok(ApiResponse::success(response))
}

#[tracing::instrument(skip_all)]
async fn get_pom_decisions(
    State(state): State<AppState>,
    ctx: RequestContext,
    QueryParams(query): QueryParams<GetRegulatorPoMDecisionsQuery>,
) -> AppResult<ApiResponse<Vec<RegulatorDecisionResponse>>> {
    let response = state
        .pipeline
        .send(&ctx, query, |query| {
            regulator_decisions::handle_pom(state.store(), ctx.clone(), query)
        })
        .await?;
    Ok(ApiResponse::success(response))
}

#[tracing::instrument(skip_all)]
async fn get_registration_decisions(
    State(state): State<AppState>,
    ctx: RequestContext,
    QueryParams(query): QueryParams<GetRegulatorRegistrationDecisionsQuery>,
) -> AppResult<ApiResponse<Vec<RegulatorDecisionResponse>>> {
    let response = state
        .pipeline
        .send(&ctx, query, |query| {
            regulator_decisions::handle_registration(state.store(), ctx.clone(), query)
        })
        .await?;
    Ok(ApiResponse::success(response))
}
