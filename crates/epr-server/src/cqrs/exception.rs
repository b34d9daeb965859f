use std::future::Future;
use std::panic::AssertUnwindSafe;

use futures::FutureExt;

use crate::error::AppResult;

/// Logs unexpected errors and panics, then lets them continue outward
pub async fn guard<Res, Fut>(name: &'static str, payload: &serde_json::Value, fut: Fut) -> AppResult<Res>
where
    Fut: Future<Output = AppResult<Res>>,
{
    match AssertUnwindSafe(fut).catch_unwind().await {
        Ok(Err(error)) if error.is_unexpected() => {
            tracing::error!(
                request = name,
                payload = %payload,
                error = %error,
                "Unhandled error while processing request"
            );
            Err(error)
        },
        Ok(result) => result,
        Err(panic) => {
            tracing::error!(
                request = name,
                payload = %payload,
                "Request handler panicked"
            );
            std::panic::resume_unwind(panic)
        },
    }
}
