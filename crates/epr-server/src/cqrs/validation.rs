use super::Validate;
use crate::context::RequestContext;
use crate::error::{AppError, AppResult};
use crate::repository::SharedStore;

/// Runs the request's rules and fails with every collected field error
pub async fn run<Req: Validate>(
    name: &'static str,
    request: &Req,
    ctx: &RequestContext,
    store: &SharedStore,
) -> AppResult<()> {
    let errors = request.validate(ctx, store).await.map_err(|e| {
        tracing::error!(request = name, error = %e, "Validation rules failed to run");
        AppError::Repository(e)
    })?;

    if errors.is_empty() {
        return Ok(());
    }

    tracing::info!(
        request = name,
        failures = errors.len(),
        errors = ?errors,
        "Request failed validation"
    );
    Err(AppError::Validation(errors))
}
