//! Submission API routes
//!
//! - `POST /api/v1/submissions` - Create a submission
//! - `GET /api/v1/submissions` - List the organisation's submissions
//! - `GET /api/v1/submissions/periods` - Distinct submission periods
//! - `GET /api/v1/submissions/:id` - Get one submission
//! - `POST /api/v1/submissions/:id/submit` - Submit a scanned file
//! - `GET /api/v1/submissions/:id/uploadedfile/:fileId` - Uploaded file details
//! - `GET /api/v1/files/:fileId` - File details by file id
//! - `GET /api/v1/organisation-details` - Company details blob for a set

use axum::{
    extract::State,
    response::Response,
    routing::{get, post},
    Router,
};
use uuid::Uuid;

use super::commands::{create, submit, CreateSubmissionCommand, SubmitSubmissionCommand};
use super::enrichment::SubmissionResponse;
use super::queries::{
    file, get, list, organisation_details, periods, uploaded_file, GetOrganisationDetailsQuery,
    GetSubmissionFileQuery, GetSubmissionPeriodsQuery, GetSubmissionQuery, GetSubmissionsQuery,
    GetUploadedFileQuery, OrganisationDetailsResponse, SubmissionFileResponse,
    UploadedFileResponse,
};
use crate::api::extract::{JsonBody, PathParams, QueryParams};
use crate::api::response::ApiResponse;
use crate::context::RequestContext;
use crate::error::AppResult;
use crate::features::AppState;

// ============================================================================
// Router Configuration
// ============================================================================

pub fn submissions_routes() -> Router<AppState> {
    Router::new()
        .route("/submissions", post(create_submission).get(list_submissions))
        .route("/submissions/periods", get(get_submission_periods))
        .route("/submissions/:id", get(get_submission))
        .route("/submissions/:id/submit", post(submit_submission))
        .route(
            "/submissions/:id/uploadedfile/:fileId",
            get(get_uploaded_file),
        )
        .route("/files/:fileId", get(get_submission_file))
        .route("/organisation-details", get(get_organisation_details))
}

// ============================================================================
// Command Handlers
// ============================================================================

#[tracing::instrument(skip_all, fields(submission_id = %command.id))]
async fn create_submission(
    State(state): State<AppState>,
    ctx: RequestContext,
    JsonBody(mut command): JsonBody<CreateSubmissionCommand>,
) -> AppResult<Response> {
    command.organisation_id = ctx.organisation_id;
    command.user_id = ctx.user_id;

    let response = state
        .pipeline
        .send(&ctx, command, |command| {
            create::handle(state.store(), ctx.clone(), command)
        })
        .await?;
    Ok(ApiResponse::created(response))
}

#[tracing::instrument(skip_all, fields(submission_id = %id))]
async fn submit_submission(
    State(state): State<AppState>,
    ctx: RequestContext,
    PathParams(id): PathParams<Uuid>,
    JsonBody(mut command): JsonBody<SubmitSubmissionCommand>,
) -> AppResult<ApiResponse<()>> {
    command.submission_id = id;
    command.organisation_id = ctx.organisation_id;
    command.user_id = ctx.user_id;

    state
        .pipeline
        .send(&ctx, command, |command| {
            submit::handle(state.store(), ctx.clone(), command)
        })
        .await?;
    Ok(ApiResponse::success(()))
}

// ============================================================================
// Query Handlers
// ============================================================================

#[tracing::instrument(skip_all)]
async fn list_submissions(
    State(state): State<AppState>,
    ctx: RequestContext,
    QueryParams(mut query): QueryParams<GetSubmissionsQuery>,
) -> AppResult<ApiResponse<Vec<SubmissionResponse>>> {
    query.organisation_id = ctx.organisation_id;

    let response = state
        .pipeline
        .send(&ctx, query, |query| list::handle(state.store(), ctx.clone(), query))
        .await?;
    Ok(ApiResponse::success(response))
}

#[tracing::instrument(skip_all, fields(submission_id = %id))]
async fn get_submission(
    State(state): State<AppState>,
    ctx: RequestContext,
    PathParams(id): PathParams<Uuid>,
) -> AppResult<ApiResponse<SubmissionResponse>> {
    let query = GetSubmissionQuery {
        id,
        organisation_id: ctx.organisation_id,
    };

    let response = state
        .pipeline
        .send(&ctx, query, |query| get::handle(state.store(), ctx.clone(), query))
        .await?;
    Ok(ApiResponse::success(response))
}

#[tracing::instrument(skip_all)]
async fn get_submission_periods(
    State(state): State<AppState>,
    ctx: RequestContext,
    QueryParams(mut query): QueryParams<GetSubmissionPeriodsQuery>,
) -> AppResult<ApiResponse<Vec<String>>> {
    query.organisation_id = ctx.organisation_id;

    let response = state
        .pipeline
        .send(&ctx, query, |query| {
            periods::handle(state.store(), ctx.clone(), query)
        })
        .await?;
    Ok(ApiResponse::success(response))
}

#[tracing::instrument(skip_all, fields(file_id = %file_id))]
async fn get_submission_file(
    State(state): State<AppState>,
    ctx: RequestContext,
    PathParams(file_id): PathParams<Uuid>,
) -> AppResult<ApiResponse<SubmissionFileResponse>> {
    let query = GetSubmissionFileQuery { file_id };

    let response = state
        .pipeline
        .send(&ctx, query, |query| file::handle(state.store(), ctx.clone(), query))
        .await?;
    Ok(ApiResponse::success(response))
}

#[tracing::instrument(skip_all, fields(submission_id = %submission_id, file_id = %file_id))]
async fn get_uploaded_file(
    State(state): State<AppState>,
    ctx: RequestContext,
    PathParams((submission_id, file_id)): PathParams<(Uuid, Uuid)>,
) -> AppResult<ApiResponse<UploadedFileResponse>> {
    let query = GetUploadedFileQuery {
        submission_id,
        file_id,
    };

    let response = state
        .pipeline
        .send(&ctx, query, |query| {
            uploaded_file::handle(state.store(), ctx.clone(), query)
        })
        .await?;
    Ok(ApiResponse::success(response))
}

#[tracing::instrument(skip_all)]
async fn get_organisation_details(
    State(state): State<AppState>,
    ctx: RequestContext,
    QueryParams(query): QueryParams<GetOrganisationDetailsQuery>,
) -> AppResult<ApiResponse<OrganisationDetailsResponse>> {
    let response = state
        .pipeline
        .send(&ctx, query, |query| {
            organisation_details::handle(state.store(), ctx.clone(), query)
        })
        .await?;
    Ok(ApiResponse::success(response))
}
