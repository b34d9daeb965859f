//! Validation issue API routes
//!
//! - `GET /api/v1/submissions/:id/organisation-file-upload-errors`
//! - `GET /api/v1/submissions/:id/organisation-file-upload-warnings`

use axum::{extract::State, routing::get, Router};
use uuid::Uuid;

use super::queries::{errors, warnings, GetValidationErrorsQuery, GetValidationWarningsQuery};
use crate::api::extract::PathParams;
use crate::api::response::ApiResponse;
use crate::context::RequestContext;
use crate::error::AppResult;
use crate::features::AppState;
use crate::models::{ValidationError, ValidationWarning};

pub fn validation_issues_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/submissions/:id/organisation-file-upload-errors",
            get(get_validation_errors),
        )
        .route(
            "/submissions/:id/organisation-file-upload-warnings",
            get(get_validation_warnings),
        )
}

#[tracing::instrument(skip_all, fields(submission_id = %submission_id))]
async fn get_validation_errors(
    State(state): State<AppState>,
    ctx: RequestContext,
    PathParams(submission_id): PathParams<Uuid>,
) -> AppResult<ApiResponse<Vec<ValidationError>>> {
    let max_issues = state.max_issues_to_process;
    let response = state
        .pipeline
        .send(&ctx, GetValidationErrorsQuery { submission_id }, |query| {
            errors::handle(state.store(), ctx.clone(), query, max_issues)
        })
        .await?;
    Ok(ApiResponse::success(response))
}

#[tracing::instrument(skip_all, fields(submission_id = %submission_id))]
async fn get_validation_warnings(
    State(state): State<AppState>,
    ctx: RequestContext,
    PathParams(submission_id): PathParams<Uuid>,
) -> AppResult<ApiResponse<Vec<ValidationWarning>>> {
    let max_issues = state.max_issues_to_process;
    let response = state
        .pipeline
        .send(&ctx, GetValidationWarningsQuery { submission_id }, |query| {
            warnings::handle(state.store(), ctx.clone(), query, max_issues)
        })
        .await?;
    Ok(ApiResponse::success(response))
}
